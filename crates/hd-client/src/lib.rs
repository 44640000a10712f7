//! # hd-client
//!
//! Resource client for the Helpdeck API. Defines the error taxonomy, the
//! [`HelpdeskApi`] transport trait with its HTTP and in-memory
//! implementations, and the [`ResourceClient`] wrapper that attaches
//! session credentials and applies the session-expiry policy at the
//! transport boundary.

pub mod client;
pub mod error;
pub mod http;
pub mod mock;
pub mod transport;

pub use client::ResourceClient;
pub use error::{ApiError, ApiResult};
pub use http::HttpApi;
pub use mock::MockApi;
pub use transport::HelpdeskApi;
