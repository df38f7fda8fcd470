//! Gateway REST API client.
//!
//! Wraps the gateway's `/data/api/v1` API: authentication, typed status
//! errors, transport retries, list pagination and streaming transfers.
//!
//! # Example
//!
//! ```no_run
//! use ignition_core::client::GatewayClient;
//! use ignition_core::config::ConnectionProfile;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let profile = ConnectionProfile {
//!     name: "dev".to_string(),
//!     url: "https://gateway:8043".to_string(),
//!     token: Some("key:secret".to_string()),
//!     username: None,
//!     password: None,
//!     verify_ssl: true,
//!     timeout_secs: 30,
//! };
//! let client = GatewayClient::new(&profile)?;
//! let info = client.get_json("/gateway-info", &[]).await?;
//! println!("{}", info["name"]);
//! # Ok(())
//! # }
//! ```

mod auth;
pub mod constants;
mod error;
mod gateway;
mod response;
mod retry;
mod transfer;

pub use auth::Credentials;
pub use error::GatewayError;
pub use gateway::{GatewayClient, Query, RequestBody, encode_segment, read_body};
pub use response::{ListResponse, PageMetadata, extract_items};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
pub use transfer::{PROJECT_ARCHIVE_CONTENT_TYPE, ProjectTransfer};
