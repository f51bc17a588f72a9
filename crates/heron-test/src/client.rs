//! Test client for in-memory request simulation.

use crate::error::TestError;
use crate::request::TestRequest;
use crate::response::TestResponse;
use heron::App;
use heron_core::ExecutionModel;
use http::Method;
use tokio::runtime::{Builder, Runtime};

/// Drives an [`App`] in memory, without a transport.
///
/// Requests run under the client's execution model: `Blocking` goes through
/// [`App::handle_blocking`], `Cooperative` drives [`App::handle`] on a
/// runtime owned by the client. Like any tokio runtime owner, the client
/// must be dropped outside async contexts.
///
/// # Example
///
/// ```
/// use heron::prelude::*;
/// use heron::http::Method;
/// use heron_test::TestClient;
///
/// let mut app = App::new();
/// app.add_route(
///     "/ping",
///     ResourceRoute::new(FnResource::new("ping").on(Method::GET, |_req, resp, _params| {
///         resp.set_text("pong");
///         Ok(())
///     })),
/// )
/// .unwrap();
///
/// let client = TestClient::new(app).unwrap();
/// let resp = client.get("/ping").unwrap();
/// resp.assert_status(200).assert_text("pong");
/// ```
pub struct TestClient {
    app: App,
    model: ExecutionModel,
    runtime: Runtime,
}

impl TestClient {
    /// Creates a client using the app's default execution model.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Runtime`] if the client runtime cannot be built.
    pub fn new(app: App) -> Result<Self, TestError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            model: app.execution_model(),
            app,
            runtime,
        })
    }

    /// Sets the execution model for subsequent requests.
    #[must_use]
    pub fn with_model(mut self, model: ExecutionModel) -> Self {
        self.model = model;
        self
    }

    /// Returns the execution model in use.
    #[must_use]
    pub fn model(&self) -> ExecutionModel {
        self.model
    }

    /// Returns the app under test.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Simulates a request with no headers or body.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Fault`] when the pipeline ends with an unhandled
    /// fault, or [`TestError::RequestBuild`] for an invalid path.
    pub fn simulate_request(&self, method: Method, path: &str) -> Result<TestResponse, TestError> {
        self.simulate(TestRequest::new(method, path))
    }

    /// Simulates a fully built request.
    ///
    /// Must not be called from inside an async runtime; use
    /// [`TestClient::simulate_async`] there.
    ///
    /// # Errors
    ///
    /// See [`TestClient::simulate_request`].
    pub fn simulate(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let mut req = request.build(self.model)?;
        let resp = match self.model {
            ExecutionModel::Blocking => self.app.handle_blocking(&mut req)?,
            ExecutionModel::Cooperative => self.runtime.block_on(self.app.handle(&mut req))?,
        };
        Ok(resp.into())
    }

    /// Simulates a request from async code.
    ///
    /// The request is still tagged with the client's execution model, so
    /// blocking-model stages run their sync forms.
    ///
    /// # Errors
    ///
    /// See [`TestClient::simulate_request`].
    pub async fn simulate_async(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let mut req = request.build(self.model)?;
        let resp = self.app.process(&mut req).await?;
        Ok(resp.into())
    }

    /// Simulates a GET request.
    ///
    /// # Errors
    ///
    /// See [`TestClient::simulate_request`].
    pub fn get(&self, path: &str) -> Result<TestResponse, TestError> {
        self.simulate_request(Method::GET, path)
    }

    /// Simulates a POST request.
    ///
    /// # Errors
    ///
    /// See [`TestClient::simulate_request`].
    pub fn post(&self, path: &str) -> Result<TestResponse, TestError> {
        self.simulate_request(Method::POST, path)
    }

    /// Simulates a PUT request.
    ///
    /// # Errors
    ///
    /// See [`TestClient::simulate_request`].
    pub fn put(&self, path: &str) -> Result<TestResponse, TestError> {
        self.simulate_request(Method::PUT, path)
    }

    /// Simulates a PATCH request.
    ///
    /// # Errors
    ///
    /// See [`TestClient::simulate_request`].
    pub fn patch(&self, path: &str) -> Result<TestResponse, TestError> {
        self.simulate_request(Method::PATCH, path)
    }

    /// Simulates a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`TestClient::simulate_request`].
    pub fn delete(&self, path: &str) -> Result<TestResponse, TestError> {
        self.simulate_request(Method::DELETE, path)
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("app", &self.app)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
