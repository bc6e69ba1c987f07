pub mod accounts;
pub mod client;
pub mod common;
pub mod error;
pub mod kafka_topics;
pub mod organization;
pub mod service_types;
pub mod test_helpers;

pub use client::{Client, ClientConfig, RetryConfig};
pub use common::{ApiErrorDetails, ApiErrorResponse, ApiQueryParams};
pub use error::ApiError;
