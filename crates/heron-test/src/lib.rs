//! # Heron Test
//!
//! In-memory request simulation for Heron applications. Requests go through
//! the complete pipeline (middleware, hooks and responder) without a
//! transport, under either execution model.
//!
//! ## Example
//!
//! ```ignore
//! use heron_test::{TestClient, TestRequest};
//! use heron::ExecutionModel;
//!
//! #[test]
//! fn test_create_item() {
//!     let client = TestClient::new(app()).unwrap().with_model(ExecutionModel::Blocking);
//!
//!     let response = client
//!         .simulate(TestRequest::post("/items").text("widget"))
//!         .unwrap();
//!
//!     response.assert_status(201).assert_header("Location", "/items/1");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/heron-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::TestClient;
pub use error::TestError;
pub use request::TestRequest;
pub use response::TestResponse;
