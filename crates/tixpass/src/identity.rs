//! Signing identity: the pass certificate, its private key and the issuer
//! chain.
//!
//! An identity is loaded once at startup and shared read-only (behind an
//! `Arc`) by every pass generated afterwards.

use std::env;
use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use der::Encode;
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use tracing::debug;
use x509_cert::Certificate;

use crate::error::SigningError;

/// Environment variable holding the pass certificate (PEM or base64 of PEM).
pub const ENV_CERT: &str = "PASS_CERT_PEM";
/// Environment variable holding the private key (PEM or base64 of PEM).
pub const ENV_KEY: &str = "PASS_KEY_PEM";
/// Environment variable holding the issuer certificate (PEM or base64 of PEM).
pub const ENV_WWDR: &str = "WWDR_CERT_PEM";

/// File names looked up by [`SigningIdentity::from_dir`].
pub const DIR_CERT: &str = "pass.pem";
pub const DIR_KEY: &str = "key.pem";
pub const DIR_WWDR: &[&str] = &["wwdrg4.pem", "wwdr.pem"];

/// A pass signing identity.
pub struct SigningIdentity {
    certificate: Certificate,
    key: RsaPrivateKey,
    chain: Vec<Certificate>,
    pass_type_identifier: Option<String>,
    team_identifier: Option<String>,
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("pass_type_identifier", &self.pass_type_identifier)
            .field("team_identifier", &self.team_identifier)
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}

fn parse_certificates(pem: &str, what: &str) -> Result<Vec<Certificate>, SigningError> {
    let certs = Certificate::load_pem_chain(pem.as_bytes())
        .map_err(|e| SigningError::Certificate(format!("{what}: {e}")))?;
    if certs.is_empty() {
        return Err(SigningError::Certificate(format!("{what}: no certificate found")));
    }
    Ok(certs)
}

/// Parse an RSA private key in PKCS#8 or PKCS#1 PEM form.
fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, SigningError> {
    if pem.contains("BEGIN RSA PRIVATE KEY") {
        RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| SigningError::Key(e.to_string()))
    } else {
        RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| SigningError::Key(e.to_string()))
    }
}

/// String value of the first subject attribute with `oid`.
fn subject_attribute(certificate: &Certificate, oid: const_oid::ObjectIdentifier) -> Option<String> {
    certificate
        .tbs_certificate
        .subject
        .0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid == oid)
        .map(|atv| String::from_utf8_lossy(atv.value.value()).trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Decode a credential given either as PEM text or as base64 of PEM text.
pub fn decode_credential(value: &str) -> Result<String, SigningError> {
    let trimmed = value.trim();
    if trimmed.contains("-----BEGIN") {
        return Ok(trimmed.to_string());
    }
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| SigningError::Encoding(format!("not PEM and not base64: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| SigningError::Encoding("decoded credential is not text".to_string()))?;
    if !text.contains("-----BEGIN") {
        return Err(SigningError::Encoding(
            "decoded credential is not PEM".to_string(),
        ));
    }
    Ok(text)
}

fn read_pem(path: &Path) -> Result<String, SigningError> {
    fs::read_to_string(path)
        .map_err(|e| SigningError::Missing(format!("{}: {e}", path.display())))
}

impl SigningIdentity {
    /// Build an identity from PEM text.
    ///
    /// `chain_pem` may hold several certificates. The key must belong to the
    /// first certificate in `cert_pem`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if any input fails to parse, the chain is
    /// empty, or the key does not match the certificate.
    pub fn from_pem(cert_pem: &str, key_pem: &str, chain_pem: &str) -> Result<Self, SigningError> {
        let certificate = parse_certificates(cert_pem, "pass certificate")?.remove(0);
        let chain = parse_certificates(chain_pem, "issuer certificate")?;
        let key = parse_private_key(key_pem)?;

        let spki_der = certificate
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| SigningError::Certificate(e.to_string()))?;
        let cert_key = RsaPublicKey::from_public_key_der(&spki_der)
            .map_err(|e| SigningError::Certificate(format!("not an RSA certificate: {e}")))?;
        if cert_key != key.to_public_key() {
            return Err(SigningError::Key(
                "private key does not match the pass certificate".to_string(),
            ));
        }

        let pass_type_identifier = subject_attribute(&certificate, const_oid::db::rfc4519::UID);
        let team_identifier = subject_attribute(&certificate, const_oid::db::rfc4519::OU);
        debug!(
            pass_type_identifier = pass_type_identifier.as_deref().unwrap_or("-"),
            team_identifier = team_identifier.as_deref().unwrap_or("-"),
            chain = chain.len(),
            "loaded signing identity"
        );

        Ok(Self {
            certificate,
            key,
            chain,
            pass_type_identifier,
            team_identifier,
        })
    }

    /// Load an identity from three PEM files.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Missing`] if a file cannot be read, or any
    /// error of [`SigningIdentity::from_pem`].
    pub fn from_files(cert: &Path, key: &Path, wwdr: &Path) -> Result<Self, SigningError> {
        Self::from_pem(&read_pem(cert)?, &read_pem(key)?, &read_pem(wwdr)?)
    }

    /// Load an identity from a certificate directory holding `pass.pem`,
    /// `key.pem` and `wwdrg4.pem` (or `wwdr.pem`).
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Missing`] if a file is absent.
    pub fn from_dir(dir: &Path) -> Result<Self, SigningError> {
        let wwdr = DIR_WWDR
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                SigningError::Missing(format!(
                    "{}: none of {}",
                    dir.display(),
                    DIR_WWDR.join(", ")
                ))
            })?;
        Self::from_files(&dir.join(DIR_CERT), &dir.join(DIR_KEY), &wwdr)
    }

    /// Load an identity from `PASS_CERT_PEM`, `PASS_KEY_PEM` and
    /// `WWDR_CERT_PEM`.
    ///
    /// Returns `Ok(None)` when none of the variables is set.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Missing`] when only some are set, or a parse
    /// error for malformed values.
    pub fn from_env() -> Result<Option<Self>, SigningError> {
        let read = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self::from_values(read(ENV_CERT), read(ENV_KEY), read(ENV_WWDR))
    }

    /// Shared logic of [`SigningIdentity::from_env`], over already-read values.
    pub fn from_values(
        cert: Option<String>,
        key: Option<String>,
        wwdr: Option<String>,
    ) -> Result<Option<Self>, SigningError> {
        match (cert, key, wwdr) {
            (None, None, None) => Ok(None),
            (Some(cert), Some(key), Some(wwdr)) => Self::from_pem(
                &decode_credential(&cert)?,
                &decode_credential(&key)?,
                &decode_credential(&wwdr)?,
            )
            .map(Some),
            (cert, key, wwdr) => {
                let missing: Vec<&str> = [(ENV_CERT, cert.is_none()), (ENV_KEY, key.is_none()), (ENV_WWDR, wwdr.is_none())]
                    .into_iter()
                    .filter(|(_, absent)| *absent)
                    .map(|(name, _)| name)
                    .collect();
                Err(SigningError::Missing(missing.join(", ")))
            }
        }
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.key
    }

    /// Issuer certificates, nearest first.
    pub fn chain(&self) -> &[Certificate] {
        &self.chain
    }

    /// Pass type identifier from the certificate subject UID.
    pub fn pass_type_identifier(&self) -> Option<&str> {
        self.pass_type_identifier.as_deref()
    }

    /// Team identifier from the certificate subject OU.
    pub fn team_identifier(&self) -> Option<&str> {
        self.team_identifier.as_deref()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const PASS_PEM: &str = include_str!("../tests/fixtures/pass.pem");
    pub const KEY_PEM: &str = include_str!("../tests/fixtures/key.pem");
    pub const KEY_PKCS1_PEM: &str = include_str!("../tests/fixtures/key-pkcs1.pem");
    pub const WWDR_PEM: &str = include_str!("../tests/fixtures/wwdr.pem");

    pub fn identity() -> super::SigningIdentity {
        super::SigningIdentity::from_pem(PASS_PEM, KEY_PEM, WWDR_PEM).unwrap()
    }
}
