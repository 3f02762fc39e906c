//! Secret holder that zeroes its memory on drop

use std::fmt;
use zeroize::Zeroize;

/// Holds the catalog client secret
///
/// `Debug` never prints the contents, so a struct carrying one can be logged.
#[derive(Clone, Zeroize)]
pub struct SecureString {
    inner: Vec<u8>,
}

impl SecureString {
    pub fn new(s: impl Into<String>) -> Self {
        Self {
            inner: s.into().into_bytes(),
        }
    }

    /// Raw secret bytes, only for building the authorization header
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
