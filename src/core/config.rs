//! Connection parameters
//!
//! The access layer treats connection parameters as opaque: an address or
//! URL-like string plus optional credentials, passed through to the driver
//! at connect time. What the strings mean is entirely up to the driver.

use serde::{Deserialize, Serialize};

/// Parameters for establishing a backend connection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectParams {
    url: String,
    username: Option<String>,
    password: Option<String>,
}

impl ConnectParams {
    /// Create parameters for the given address/URL
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    /// Set the username
    pub fn with_username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password
    pub fn with_password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// The address/URL string
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The username, if set
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The password, if set
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}
