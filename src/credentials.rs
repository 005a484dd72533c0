//! HamQTH account credentials sourced from the process environment.

use crate::error::{HamQthError, Result};
use std::fmt;

/// Environment variable holding the HamQTH username
pub const ENV_HAMQTH_USER: &str = "HAMQTH_USER";

/// Environment variable holding the HamQTH password
pub const ENV_HAMQTH_PASS: &str = "HAMQTH_PASS";

/// A validated username/password pair.
///
/// Both values are trimmed and guaranteed non-blank.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Build credentials from explicit values, trimming surrounding whitespace
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Result<Self> {
        Self::from_values(Some(username.as_ref()), Some(password.as_ref()))
    }

    /// Read `HAMQTH_USER` and `HAMQTH_PASS` from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_source(|name| std::env::var(name).ok())
    }

    /// Read both values through `lookup`, which maps a variable name to its value
    pub fn from_source<F>(mut lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let username = lookup(ENV_HAMQTH_USER);
        let password = lookup(ENV_HAMQTH_PASS);
        Self::from_values(username.as_deref(), password.as_deref())
    }

    fn from_values(username: Option<&str>, password: Option<&str>) -> Result<Self> {
        let username = username.map(str::trim).unwrap_or_default();
        let password = password.map(str::trim).unwrap_or_default();

        if username.is_empty() || password.is_empty() {
            return Err(HamQthError::MissingCredentials {
                user_var: ENV_HAMQTH_USER,
                pass_var: ENV_HAMQTH_PASS,
            });
        }

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// The trimmed username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The trimmed password
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
