/// MSX platform API integration module
///
/// This module provides the blocking API client and everything it needs to
/// open and use an organization-scoped session.
///
/// ## Session Flow
///
/// 1. The caller supplies an identity (email/password, token, or nothing)
/// 2. Missing fields are filled from `MSX_*` configuration
/// 3. Without a token, the client exchanges email/password at `/token`
/// 4. The token is confirmed at `/validate`
/// 5. The validated client is handed back; any failure aborts construction
pub mod client;
pub mod codec;
pub mod commands;
pub mod credentials;
pub mod datasets;
pub mod envelope;
pub mod session;
pub mod types;

pub use client::MsxClient;
pub use credentials::Identity;
pub use envelope::Envelope;
pub use session::{Session, SessionState};
pub use types::{ApiError, MsxError};
