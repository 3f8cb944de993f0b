//! Detached CMS signatures over pass manifests.

use std::env;
use std::fmt;
use std::str::FromStr;

use cms::builder::{SignedDataBuilder, SignerInfoBuilder, create_signing_time_attribute};
use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::signed_data::{EncapsulatedContentInfo, SignerIdentifier};
use const_oid::AssociatedOid;
use der::Encode;
use rsa::pkcs1v15::{Signature, SigningKey};
use rsa::pkcs1v15::RsaSignatureAssociatedOid;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use spki::AlgorithmIdentifierOwned;
use tracing::debug;

use crate::error::SigningError;
use crate::identity::SigningIdentity;

/// Environment variable selecting the signature digest.
pub const ENV_DIGEST: &str = "PASS_SIGNATURE_DIGEST";

/// Digest algorithm used for the message digest and the RSA signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureDigest {
    Sha1,
    #[default]
    Sha256,
}

impl SignatureDigest {
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureDigest::Sha1 => "sha1",
            SignatureDigest::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for SignatureDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureDigest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(SignatureDigest::Sha1),
            "sha256" => Ok(SignatureDigest::Sha256),
            other => Err(format!("unknown signature digest '{other}'")),
        }
    }
}

/// Options for producing pass signatures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningOptions {
    pub digest: SignatureDigest,
}

impl SigningOptions {
    /// Read `PASS_SIGNATURE_DIGEST`, falling back to SHA-256 when it is unset
    /// or unrecognized.
    pub fn from_env() -> Self {
        let digest = env::var(ENV_DIGEST)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        Self { digest }
    }
}

/// Produce a DER-encoded detached CMS `SignedData` over `manifest`.
///
/// The encapsulated content is left empty. The signed attributes carry the
/// content type, the manifest digest and the signing time. The signer
/// certificate and the issuer chain are embedded.
///
/// # Errors
///
/// Returns [`SigningError::Cms`] if any part of the structure fails to
/// build or encode.
pub fn sign_manifest(
    identity: &SigningIdentity,
    manifest: &[u8],
    digest: SignatureDigest,
) -> Result<Vec<u8>, SigningError> {
    let der = match digest {
        SignatureDigest::Sha1 => sign_with::<Sha1>(identity, manifest)?,
        SignatureDigest::Sha256 => sign_with::<Sha256>(identity, manifest)?,
    };
    debug!(digest = %digest, bytes = der.len(), "signed manifest");
    Ok(der)
}

fn cms_error(err: impl fmt::Display) -> SigningError {
    SigningError::Cms(err.to_string())
}

fn sign_with<D>(identity: &SigningIdentity, manifest: &[u8]) -> Result<Vec<u8>, SigningError>
where
    D: Digest + AssociatedOid + RsaSignatureAssociatedOid,
{
    let message_digest = D::digest(manifest);
    let digest_algorithm = AlgorithmIdentifierOwned {
        oid: <D as AssociatedOid>::OID,
        parameters: None,
    };
    let content = EncapsulatedContentInfo {
        econtent_type: const_oid::db::rfc5911::ID_DATA,
        econtent: None,
    };

    let certificate = identity.certificate();
    let sid = SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
        issuer: certificate.tbs_certificate.issuer.clone(),
        serial_number: certificate.tbs_certificate.serial_number.clone(),
    });
    let signer = SigningKey::<D>::new(identity.private_key().clone());

    let mut signer_info = SignerInfoBuilder::new(
        &signer,
        sid,
        digest_algorithm.clone(),
        &content,
        Some(message_digest.as_slice()),
    )
    .map_err(cms_error)?;
    signer_info
        .add_signed_attribute(create_signing_time_attribute().map_err(cms_error)?)
        .map_err(cms_error)?;

    let mut builder = SignedDataBuilder::new(&content);
    builder
        .add_digest_algorithm(digest_algorithm)
        .map_err(cms_error)?
        .add_certificate(CertificateChoices::Certificate(certificate.clone()))
        .map_err(cms_error)?;
    for issuer in identity.chain() {
        builder
            .add_certificate(CertificateChoices::Certificate(issuer.clone()))
            .map_err(cms_error)?;
    }
    builder
        .add_signer_info::<_, Signature>(signer_info)
        .map_err(cms_error)?;

    builder.build().map_err(cms_error)?.to_der().map_err(cms_error)
}
