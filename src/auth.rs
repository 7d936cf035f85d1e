//! Dashboard authentication seam.
//!
//! The dashboard only needs a yes/no answer for a username/password pair,
//! so the capability is a single-method trait. The default implementation
//! compares against statically configured credentials; a real identity
//! provider can be dropped in behind the same trait.

use serde::Deserialize;

use crate::constants;

/// Login form fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Yes/no authentication capability for the dashboard.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> bool;
}

/// Checks credentials against a fixed pair.
pub struct StaticAuthenticator {
    username: String,
    password: String,
}

impl StaticAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Credentials from `SOULTALK_DASHBOARD_USER` / `SOULTALK_DASHBOARD_PASS`.
    pub fn from_env() -> Self {
        Self::new(
            constants::DASHBOARD_USERNAME.clone(),
            constants::DASHBOARD_PASSWORD.clone(),
        )
    }
}

impl Authenticator for StaticAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> bool {
        credentials.username == self.username && credentials.password == self.password
    }
}
