//! Credential handling for the catalog client-credentials grant

pub mod credentials;
pub mod secure_string;

pub use credentials::ClientCredentials;
pub use secure_string::SecureString;
