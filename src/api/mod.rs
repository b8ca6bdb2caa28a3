mod client;
mod error;
mod http;
mod request;

pub use client::ApiClient;
pub use error::ApiError;
pub use http::HttpTransport;
pub use request::{ApiRequest, Part};

#[cfg(test)]
pub(crate) use client::fake::FakeTransport;
#[cfg(test)]
pub(crate) use request::Body;
