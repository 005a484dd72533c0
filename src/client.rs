//! HamQTH XML API client implementation.

use crate::credentials::Credentials;
use crate::error::{HamQthError, Result};
use crate::response::{
    extract_error_message, extract_lookup_fields, extract_session_token, require_nonblank_text,
    ErrorClass, ErrorMatchers,
};
use crate::session::{SessionManager, SessionState};
use crate::transport::Transport;
use crate::types::LookupResult;
use crate::xml::parse_xml;
use crate::{
    DEFAULT_BASE_URL, DEFAULT_PROGRAM_NAME, DEFAULT_SESSION_LIFETIME_SECONDS,
    DEFAULT_TIMEOUT_SECONDS, DEFAULT_USER_AGENT,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Login query parameter carrying the username
pub const USERNAME_PARAM: &str = "u";
/// Login query parameter carrying the password
pub const PASSWORD_PARAM: &str = "p";
/// Lookup query parameter carrying the session id
pub const SESSION_PARAM: &str = "id";
/// Lookup query parameter carrying the call sign
pub const CALLSIGN_PARAM: &str = "callsign";
/// Lookup query parameter naming the calling program
pub const PROGRAM_PARAM: &str = "prg";

/// Configuration for the HamQTH client.
///
/// The defaults are the fixed HamQTH endpoints and limits; overriding them is
/// meant for pointing the client at a test server.
#[derive(Debug, Clone)]
pub struct HamQthClientConfig {
    /// Endpoint used to obtain a session id
    pub login_url: String,
    /// Endpoint used for call sign lookups
    pub lookup_url: String,
    /// Program name reported with each lookup
    pub program_name: String,
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// How long a session id is reused before logging in again
    pub session_lifetime_seconds: i64,
}

impl Default for HamQthClientConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_BASE_URL.to_string(),
            lookup_url: DEFAULT_BASE_URL.to_string(),
            program_name: DEFAULT_PROGRAM_NAME.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            session_lifetime_seconds: DEFAULT_SESSION_LIFETIME_SECONDS,
        }
    }
}

/// Outcome of a single lookup request that the client can act on
enum LookupReply {
    Record(BTreeMap<String, String>),
    SessionRejected,
}

/// HamQTH callbook client.
///
/// Holds one session for its whole lifetime and only logs in again when that
/// session expires or HamQTH rejects it.
pub struct HamQthClient {
    /// HTTP transport
    transport: Transport,
    /// HamQTH account
    credentials: Credentials,
    /// Parsed login endpoint
    login_url: Url,
    /// Parsed lookup endpoint
    lookup_url: Url,
    /// Client configuration
    config: HamQthClientConfig,
    /// Error message classification rules
    matchers: ErrorMatchers,
    /// Cached session
    session: SessionManager,
}

impl HamQthClient {
    /// Create a new client with default configuration
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(credentials, HamQthClientConfig::default())
    }

    /// Create a new client with credentials read from `HAMQTH_USER`/`HAMQTH_PASS`
    pub fn from_env() -> Result<Self> {
        Self::new(Credentials::from_env()?)
    }

    /// Create a new client with custom configuration
    pub fn with_config(credentials: Credentials, config: HamQthClientConfig) -> Result<Self> {
        let transport = Transport::new(
            Duration::from_secs(config.timeout_seconds),
            &config.user_agent,
        )?;
        let login_url = Url::parse(&config.login_url)?;
        let lookup_url = Url::parse(&config.lookup_url)?;
        let session = SessionManager::new(chrono::Duration::seconds(
            config.session_lifetime_seconds,
        ));

        Ok(Self {
            transport,
            credentials,
            login_url,
            lookup_url,
            config,
            matchers: ErrorMatchers::default(),
            session,
        })
    }

    /// Replace the rules used to recognize session and not-found errors
    pub fn with_error_matchers(mut self, matchers: ErrorMatchers) -> Self {
        self.matchers = matchers;
        self
    }

    /// Make sure a session exists, logging in if there is none yet
    pub async fn authenticate(&self) -> Result<()> {
        self.session_id().await.map(|_| ())
    }

    /// Check if an unexpired session is cached
    pub async fn is_authenticated(&self) -> bool {
        self.session.state().await == SessionState::Valid
    }

    /// Forget the cached session (the next lookup logs in again)
    pub async fn invalidate_session(&self) {
        self.session.invalidate().await;
    }

    /// Look up a call sign in the HamQTH callbook.
    ///
    /// The call sign is trimmed and upper-cased first. When HamQTH reports the
    /// session as invalid, the client logs in again and retries exactly once.
    pub async fn callbook_lookup(&self, call_sign: &str) -> Result<LookupResult> {
        let call_sign = require_nonblank_text(Some(call_sign), "call sign")?.to_uppercase();
        debug!("Looking up call sign: {}", call_sign);

        let token = self.session_id().await?;
        let fields = match self.request_lookup(&token, &call_sign).await? {
            LookupReply::Record(fields) => fields,
            LookupReply::SessionRejected => {
                warn!("HamQTH rejected the session, logging in again and retrying");
                self.session.invalidate_token(&token).await;
                let token = self.session_id().await?;

                match self.request_lookup(&token, &call_sign).await? {
                    LookupReply::Record(fields) => fields,
                    LookupReply::SessionRejected => {
                        return Err(HamQthError::unexpected_format(
                            "HamQTH rejected a freshly created session",
                        ));
                    }
                }
            }
        };

        info!("Successfully looked up call sign: {}", call_sign);
        Ok(LookupResult::from_fields(call_sign, &fields))
    }

    async fn session_id(&self) -> Result<String> {
        self.session.get_session_id(|| self.login()).await
    }

    /// Internal method to perform login
    async fn login(&self) -> Result<String> {
        info!("Logging in to HamQTH as {}", self.credentials.username());

        let params = [
            (USERNAME_PARAM, self.credentials.username()),
            (PASSWORD_PARAM, self.credentials.password()),
        ];
        let body = self.transport.http_get(&self.login_url, &params).await?;
        let root = parse_xml(&body)?;

        if let Some(error) = extract_error_message(&root) {
            warn!("HamQTH login rejected: {}", error);
            return Err(HamQthError::login_failed(error));
        }

        extract_session_token(&root).ok_or_else(|| {
            HamQthError::unexpected_format("login response did not contain a session id")
        })
    }

    /// Issue one lookup request and sort the response into record, rejected
    /// session, or a final error
    async fn request_lookup(&self, token: &str, call_sign: &str) -> Result<LookupReply> {
        let params = [
            (SESSION_PARAM, token),
            (CALLSIGN_PARAM, call_sign),
            (PROGRAM_PARAM, self.config.program_name.as_str()),
        ];
        let body = self.transport.http_get(&self.lookup_url, &params).await?;
        let root = parse_xml(&body)?;

        if let Some(message) = extract_error_message(&root) {
            debug!("HamQTH lookup error: {}", message);
            return match self.matchers.classify(&message) {
                ErrorClass::SessionExpired => Ok(LookupReply::SessionRejected),
                ErrorClass::NotFound => Err(HamQthError::not_found(call_sign)),
                ErrorClass::Other(message) => Err(HamQthError::unexpected_format(message)),
            };
        }

        extract_lookup_fields(&root)
            .map(LookupReply::Record)
            .ok_or_else(|| {
                HamQthError::unexpected_format("lookup response contained no search result")
            })
    }
}
