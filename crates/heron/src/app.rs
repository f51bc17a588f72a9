//! The application: middleware, routes and the two entry points that drive
//! the pipeline.

use crate::routes::RouteTable;
use crate::runtime;
use heron_config::{ConfigError, HeronConfig};
use heron_core::{
    ExecutionModel, HeronResult, HttpRequest, HttpResponse, Request, ResponseState,
};
use heron_middleware::{IntoMiddlewares, Pipeline, ResourceRoute};

/// A Heron application.
///
/// Setup methods take `&mut self`; serving takes `&self`, so middleware and
/// routes cannot change while requests are in flight.
///
/// # Example
///
/// ```
/// use heron::{App, FnMiddleware, FnResource, ResourceRoute};
/// use heron::http::{Method, Uri};
/// use heron::Request;
///
/// let mut app = App::new();
/// app.add_middleware(FnMiddleware::new("tag").on_response(|_req, resp, _res, _ok| {
///     resp.set_header("x-served-by", "heron")?;
///     Ok(())
/// }));
/// app.add_route(
///     "/hello/{name}",
///     ResourceRoute::new(FnResource::new("hello").on(Method::GET, |_req, resp, params| {
///         resp.set_text(format!("hello {}", params.get("name").unwrap_or("?")));
///         Ok(())
///     })),
/// )
/// .unwrap();
///
/// let mut req = Request::new(Method::GET, Uri::from_static("/hello/ada"));
/// let resp = app.handle_blocking(&mut req).unwrap();
/// assert_eq!(resp.text(), "hello ada");
/// assert_eq!(resp.header("x-served-by"), Some("heron"));
/// ```
#[derive(Debug, Default)]
pub struct App {
    pipeline: Pipeline,
    routes: RouteTable,
    execution_model: ExecutionModel,
}

impl App {
    /// Creates an application with no middleware or routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an application from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn from_config(config: &HeronConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut app = Self::new().with_execution_model(config.pipeline.execution_model);
        app.pipeline.set_fault_status(config.fault_status()?);
        tracing::debug!(
            service = %config.service_name,
            model = %app.execution_model,
            fault_status = %app.pipeline.fault_status(),
            "app configured"
        );
        Ok(app)
    }

    /// Sets the execution model callers use when they do not pick one.
    #[must_use]
    pub fn with_execution_model(mut self, model: ExecutionModel) -> Self {
        self.execution_model = model;
        self
    }

    /// Returns the default execution model.
    #[must_use]
    pub fn execution_model(&self) -> ExecutionModel {
        self.execution_model
    }

    /// Registers a middleware, or an ordered collection of middleware.
    pub fn add_middleware(&mut self, middleware: impl IntoMiddlewares) -> &mut Self {
        self.pipeline.chain_mut().add(middleware);
        self
    }

    /// Registers every middleware an iterator yields, in order.
    pub fn add_middlewares<I>(&mut self, middlewares: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: IntoMiddlewares,
    {
        self.pipeline.chain_mut().extend(middlewares);
        self
    }

    /// Registers a resource under a URI template such as `/items/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `HeronError::InvalidRoute` if the template is malformed or
    /// conflicts with one already registered.
    pub fn add_route(&mut self, template: &str, route: ResourceRoute) -> HeronResult<&mut Self> {
        self.routes.insert(template, route)?;
        Ok(self)
    }

    /// Returns the pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the route table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Runs the pipeline under whatever execution model `req` carries.
    pub async fn process(&self, req: &mut Request) -> HeronResult<ResponseState> {
        self.pipeline.process(req, &self.routes).await
    }

    /// Runs the pipeline under the cooperative model.
    pub async fn handle(&self, req: &mut Request) -> HeronResult<ResponseState> {
        req.context_mut().set_execution_model(ExecutionModel::Cooperative);
        self.process(req).await
    }

    /// Runs the pipeline under the blocking model, on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns the unhandled fault, or `HeronError::Internal` when called
    /// from inside an async runtime.
    pub fn handle_blocking(&self, req: &mut Request) -> HeronResult<ResponseState> {
        req.context_mut().set_execution_model(ExecutionModel::Blocking);
        runtime::block_on(self.process(req))?
    }

    /// Serves an HTTP request under the cooperative model.
    ///
    /// An unhandled fault becomes an empty response with the configured
    /// fault status.
    pub async fn respond(&self, req: HttpRequest) -> HttpResponse {
        let mut req = Request::from_http(req).await;
        req.context_mut().set_execution_model(ExecutionModel::Cooperative);
        let outcome = self.process(&mut req).await;
        self.finish(outcome)
    }

    /// Serves an HTTP request under the blocking model.
    ///
    /// # Errors
    ///
    /// Returns `HeronError::Internal` when called from inside an async
    /// runtime. Pipeline faults are converted as in [`App::respond`].
    pub fn respond_blocking(&self, req: HttpRequest) -> HeronResult<HttpResponse> {
        runtime::block_on(async {
            let mut req = Request::from_http(req).await;
            req.context_mut().set_execution_model(ExecutionModel::Blocking);
            let outcome = self.process(&mut req).await;
            self.finish(outcome)
        })
    }

    fn finish(&self, outcome: HeronResult<ResponseState>) -> HttpResponse {
        match outcome {
            Ok(resp) => resp.into_http(),
            Err(err) => {
                tracing::error!(error = %err, "request failed");
                let mut resp = ResponseState::new();
                resp.set_status(self.pipeline.fault_status().clone());
                resp.into_http()
            }
        }
    }
}
