//! Signing errors.

use thiserror::Error;
use tixpass_core::PassError;

/// Error type for loading a signing identity or producing a signature.
#[derive(Debug, Error)]
pub enum SigningError {
    /// A required credential was not supplied.
    #[error("missing signing credential: {0}")]
    Missing(String),
    /// A certificate could not be parsed.
    #[error("invalid certificate: {0}")]
    Certificate(String),
    /// The private key could not be parsed or does not match.
    #[error("invalid private key: {0}")]
    Key(String),
    /// A credential was not valid base64 or PEM text.
    #[error("invalid credential encoding: {0}")]
    Encoding(String),
    /// The CMS structure could not be built or encoded.
    #[error("CMS signing failed: {0}")]
    Cms(String),
}

impl From<SigningError> for PassError {
    fn from(err: SigningError) -> Self {
        PassError::Signing(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = SigningError::Missing("PASS_CERT_PEM".to_string());
        assert_eq!(err.to_string(), "missing signing credential: PASS_CERT_PEM");
    }

    #[test]
    fn converts_to_pass_error() {
        let err: PassError = SigningError::Cms("boom".to_string()).into();
        assert_eq!(err, PassError::Signing("CMS signing failed: boom".to_string()));
    }
}
