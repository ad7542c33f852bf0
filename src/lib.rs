//! MSX SDK
//!
//! A Rust library for integrating with the MSX platform API.
//!
//! This SDK provides:
//! - Session handling: token acquisition from email/password and token validation
//! - Classification of response envelopes into success, API errors and unauthorized tokens
//! - Health queries, dataset upload and remote command execution
//! - Configuration resolved from defaults, `MSX_*` environment variables and explicit overrides
//!
//! The client is blocking and needs no async runtime.
//!
//! # Example
//!
//! ```no_run
//! use msx_sdk::{Identity, MsxClient, MsxError};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Explicit values win; anything missing comes from MSX_EMAIL / MSX_PASSWORD / MSX_TOKEN
//! let client = match MsxClient::new(Identity::from_credentials("a@b.com", "secret")) {
//!     Ok(client) => client,
//!     Err(MsxError::InvalidToken) => {
//!         eprintln!("Credentials rejected, log in again");
//!         return Ok(());
//!     }
//!     Err(e) => return Err(e.into()),
//! };
//!
//! let health = client.health()?;
//! println!("{} is {}", client.base_url(), health.status);
//!
//! let upload = client.datasets().add("train.csv", [("source", "nightly")])?;
//! println!("Uploaded to {}", upload.path);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod msx_api;

// Re-export commonly used types and functions
pub use config::{ConfigOverrides, Configuration};
pub use msx_api::{
    client::MsxClient,
    codec::{decode, decode_as, encode},
    commands::Commands,
    credentials::Identity,
    datasets::{DatasetUpload, Datasets},
    envelope::{classify, classify_error, Envelope},
    session::{Session, SessionState},
    types::{
        ApiError, ApiMessage, CommandOutput, Credentials, HealthStatus, MsxError, TokenResponse,
        UNAUTHORIZED_PHRASE,
    },
};
