use reqwest::blocking::RequestBuilder;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::config::Configuration;
use crate::msx_api::codec;
use crate::msx_api::commands::Commands;
use crate::msx_api::credentials::Identity;
use crate::msx_api::datasets::Datasets;
use crate::msx_api::envelope;
use crate::msx_api::session::{Session, SessionState};
use crate::msx_api::types::{ApiMessage, Credentials, HealthStatus, MsxError, TokenResponse};

/// HTTP client for the MSX platform API
///
/// Construction opens the session: it resolves an identity, creates the
/// connection pool, acquires a token when none was supplied and validates it.
/// A value of this type therefore always holds a validated session. To start
/// over with a new token, construct a new client.
///
/// The client is blocking and issues one request at a time; no Tokio runtime
/// is required by callers.
#[derive(Debug)]
pub struct MsxClient {
    config: Configuration,
    http: reqwest::blocking::Client,
    credentials: Option<Credentials>,
    session: Session,
}

impl MsxClient {
    /// Connect using configuration resolved from the environment
    ///
    /// Explicit fields of `identity` win over `MSX_EMAIL`, `MSX_PASSWORD`,
    /// `MSX_TOKEN` and `MSX_ORG_ID`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use msx_sdk::{Identity, MsxClient};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = MsxClient::new(Identity::from_credentials("a@b.com", "secret"))?;
    /// println!("Connected to organization {:?}", client.org_id());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(identity: Identity) -> Result<Self, MsxError> {
        Self::with_config(identity, Configuration::from_env()?)
    }

    /// Connect using an explicit configuration
    ///
    /// # Errors
    ///
    /// * [`MsxError::MissingCredentials`] if no token, email or password can be found
    /// * [`MsxError::InvalidToken`] if the platform rejects the token or credentials
    /// * [`MsxError::ApiResponse`] for any other error envelope
    /// * [`MsxError::MalformedResponse`] if a body is not valid JSON
    /// * [`MsxError::Transport`] if the platform cannot be reached
    ///
    /// # Example
    ///
    /// ```no_run
    /// use msx_sdk::config::{ConfigOverrides, Configuration};
    /// use msx_sdk::{Identity, MsxClient};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = Configuration::resolve(&ConfigOverrides {
    ///     base_url: Some("http://localhost:8080".to_string()),
    ///     ..Default::default()
    /// })?;
    /// let client = MsxClient::with_config(Identity::from_token("eyJhbGci..."), config)?;
    /// assert!(client.is_validated());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_config(identity: Identity, config: Configuration) -> Result<Self, MsxError> {
        let mut client = Self::unconnected(identity, config)?;

        if let Err(e) = client.connect() {
            tracing::error!("Error connecting to {}: {}", client.config.base_url, e);
            return Err(e);
        }

        tracing::info!(
            "Successfully connected to msx server: organization_id={}",
            client.session.organization_id().unwrap_or("<unknown>")
        );
        Ok(client)
    }

    /// Resolve the identity and create the connection pool without talking to the platform
    pub(crate) fn unconnected(identity: Identity, config: Configuration) -> Result<Self, MsxError> {
        let identity = identity.resolve(&config)?;

        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("msx-sdk/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                tracing::error!("Could not create connection pool: {}", e);
                MsxError::Transport(e)
            })?;

        tracing::debug!("Creating MsxClient with base URL: {}", config.base_url);

        Ok(Self {
            credentials: identity.credentials(),
            session: Session::new(identity.token, identity.organization_id),
            config,
            http,
        })
    }

    // ------------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------------

    /// Open the session: acquire a token if none is stored, then validate it
    ///
    /// Marks the session validated when the platform confirms the token.
    pub fn connect(&mut self) -> Result<ApiMessage, MsxError> {
        if !self.session.has_token() {
            tracing::debug!("Fetching token in connect");
            self.acquire_token()?;
        }
        // Credentials only ever feed the token request
        self.credentials = None;

        let message = self.validate_token()?;
        self.session.mark_validated();
        Ok(message)
    }

    /// Request a new token with the stored email and password
    ///
    /// The email and password are consumed by the request, whatever its
    /// outcome. On success the token and organization id are written into
    /// the session.
    ///
    /// # Errors
    ///
    /// Returns [`MsxError::MissingCredentials`] without sending anything if
    /// either the email or the password is missing. Error envelopes from the
    /// token endpoint are classified like every other endpoint's.
    pub fn acquire_token(&mut self) -> Result<TokenResponse, MsxError> {
        let credentials = self.credentials.take().ok_or_else(|| {
            MsxError::MissingCredentials(
                "email and password required to retrieve token.".to_string(),
            )
        })?;

        let url = self.url("/token");
        let headers = self.authenticated_headers(true, false)?;
        let body = codec::encode(&credentials)?;

        tracing::debug!(
            "Requesting token: url={}, email={}",
            url,
            credentials.email
        );

        let request = self.http.post(&url).headers(headers).body(body);
        drop(credentials);
        let raw = self.execute(request, "token")?;
        let token_response: TokenResponse = envelope::classify(&raw, Some("token"))?;

        tracing::debug!(
            "Token acquired: organization_id={}, token_length={}",
            token_response.organization_id,
            token_response.token.len()
        );

        self.session.store_token(token_response.clone());
        Ok(token_response)
    }

    /// Ask the platform to confirm the stored token
    pub fn validate_token(&self) -> Result<ApiMessage, MsxError> {
        let url = self.url("/validate");
        let headers = self.authenticated_headers(false, true)?;

        tracing::debug!("Validating token with: {}", url);

        let raw = self.execute(self.http.get(&url).headers(headers), "validate")?;
        envelope::classify_message(&raw).map_err(|e| {
            tracing::error!("Error validating: {}", e);
            e
        })
    }

    // ------------------------------------------------------------------------
    // Request helpers
    // ------------------------------------------------------------------------

    /// Headers for a platform request
    ///
    /// * `include_json` - add `Content-Type: application/json`
    /// * `include_token` - add `Authorization: Bearer <token>` with whatever
    ///   token is stored, even an empty one
    ///
    /// Validation of the session is not checked here; the connect sequence
    /// itself uses these headers before the token has been validated.
    pub fn authenticated_headers(
        &self,
        include_json: bool,
        include_token: bool,
    ) -> Result<HeaderMap, MsxError> {
        let mut headers = HeaderMap::new();

        if include_token {
            let token = self.session.token().unwrap_or_default();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        if include_json {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(headers)
    }

    /// Add the organization scoping header to `headers`
    ///
    /// The header name comes from [`Configuration::org_header`].
    ///
    /// # Errors
    ///
    /// Returns [`MsxError::MissingCredentials`] when the session has no
    /// organization id, which happens when connecting with a bare token and
    /// no `MSX_ORG_ID`.
    pub fn with_org_header(&self, mut headers: HeaderMap) -> Result<HeaderMap, MsxError> {
        let org_id = self.session.organization_id().ok_or_else(|| {
            MsxError::MissingCredentials(
                "organization id required for organization-scoped requests.".to_string(),
            )
        })?;

        let name = HeaderName::from_bytes(self.config.org_header.as_bytes())?;
        headers.insert(name, HeaderValue::from_str(org_id)?);
        Ok(headers)
    }

    /// Send a request and read the whole body
    ///
    /// HTTP status codes are logged but not interpreted; the body envelope
    /// decides success or failure.
    pub(crate) fn execute(&self, request: RequestBuilder, context: &str) -> Result<Vec<u8>, MsxError> {
        let response = request.send().map_err(|e| {
            tracing::error!("Failed to send {} request: {}", context, e);
            MsxError::Transport(e)
        })?;

        let status = response.status();
        tracing::debug!("Received {} response with status: {}", context, status);

        let body = response.bytes().map_err(|e| {
            tracing::error!("Failed to read {} response body: {}", context, e);
            MsxError::Transport(e)
        })?;

        Ok(body.to_vec())
    }

    pub(crate) fn holds_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    pub(crate) fn http(&self) -> &reqwest::blocking::Client {
        &self.http
    }

    // ------------------------------------------------------------------------
    // API calls
    // ------------------------------------------------------------------------

    /// Query the current health of the platform
    ///
    /// # Example
    ///
    /// ```no_run
    /// use msx_sdk::{Identity, MsxClient};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = MsxClient::new(Identity::from_credentials("a@b.com", "secret"))?;
    /// let health = client.health()?;
    /// println!("Platform status: {}", health.status);
    /// # Ok(())
    /// # }
    /// ```
    pub fn health(&self) -> Result<HealthStatus, MsxError> {
        let url = self.url("/health");
        let headers = self.with_org_header(self.authenticated_headers(false, true)?)?;

        tracing::debug!("Querying health from: {}", url);

        let raw = self.execute(self.http.get(&url).headers(headers), "health")?;
        envelope::classify(&raw, Some("health"))
    }

    /// Dataset operations
    pub fn datasets(&self) -> Datasets<'_> {
        Datasets::new(self)
    }

    /// Remote command execution
    pub fn commands(&self) -> Commands<'_> {
        Commands::new(self)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    pub fn org_id(&self) -> Option<&str> {
        self.session.organization_id()
    }

    pub fn is_validated(&self) -> bool {
        self.session.is_validated()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }
}
