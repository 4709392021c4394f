//! Header-token authenticator.

use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use nodeboot_core::{Authenticator, BoxError};
use std::path::Path;

/// [`Authenticator`] presenting a pre-shared token.
///
/// The token does not depend on the request body; use it where the
/// controller accepts a provisioned bootstrap token.
#[derive(Clone)]
pub struct StaticTokenAuthenticator {
    token: String,
}

impl std::fmt::Debug for StaticTokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuthenticator")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl StaticTokenAuthenticator {
    /// Use `token` verbatim as the `Authorization` header value
    pub fn new(token: impl Into<String>) -> ProviderResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ProviderError::Token("token is empty".into()));
        }
        if token.contains(['\r', '\n']) {
            return Err(ProviderError::Token("token spans multiple lines".into()));
        }
        Ok(Self { token })
    }

    /// Read the token from a file, ignoring surrounding whitespace
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::new(content.trim())
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn create_token(&self, _body: &[u8]) -> Result<String, BoxError> {
        Ok(self.token.clone())
    }
}
