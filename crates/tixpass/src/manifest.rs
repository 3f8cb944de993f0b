//! The pass manifest: SHA-1 of every bundled file.

use std::collections::BTreeMap;

use sha1::{Digest, Sha1};
use tixpass_core::PassError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "signature";

/// Whether a bundle entry is covered by the manifest.
pub fn is_hashed(name: &str) -> bool {
    name != MANIFEST_FILE && name != SIGNATURE_FILE && !name.starts_with('.') && !name.contains("/.")
}

/// Lowercase hex SHA-1 of `bytes`.
pub fn sha1_hex(bytes: &[u8]) -> String {
    Sha1::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}

/// Map of hashed entry name to digest, in name order.
pub fn compute<'a>(files: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> BTreeMap<String, String> {
    files
        .into_iter()
        .filter(|(name, _)| is_hashed(name))
        .map(|(name, bytes)| (name.to_string(), sha1_hex(bytes)))
        .collect()
}

/// Serialize a manifest map as pretty-printed JSON.
pub fn to_json(manifest: &BTreeMap<String, String>) -> Result<Vec<u8>, PassError> {
    serde_json::to_vec_pretty(manifest).map_err(|e| PassError::Package(format!("manifest: {e}")))
}

/// A manifest entry that does not match the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestMismatch {
    /// Listed in the manifest but absent from the bundle.
    Missing(String),
    /// Present in the bundle but not listed.
    Unlisted(String),
    /// Listed with a different digest.
    Digest {
        name: String,
        expected: String,
        actual: String,
    },
}

impl std::fmt::Display for ManifestMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestMismatch::Missing(name) => write!(f, "{name}: listed but missing"),
            ManifestMismatch::Unlisted(name) => write!(f, "{name}: not listed in manifest"),
            ManifestMismatch::Digest {
                name,
                expected,
                actual,
            } => write!(f, "{name}: expected {expected}, found {actual}"),
        }
    }
}

/// Recompute digests for `files` and compare them with `manifest_json`.
///
/// Returns the mismatches in name order; an empty list means the manifest
/// is consistent with the files.
///
/// # Errors
///
/// Returns [`PassError::Package`] if the manifest is not a JSON object of
/// strings.
pub fn verify<'a>(
    manifest_json: &[u8],
    files: impl IntoIterator<Item = (&'a str, &'a [u8])>,
) -> Result<Vec<ManifestMismatch>, PassError> {
    let listed: BTreeMap<String, String> = serde_json::from_slice(manifest_json)
        .map_err(|e| PassError::Package(format!("manifest: {e}")))?;
    let actual = compute(files);

    let mut mismatches = Vec::new();
    for (name, expected) in &listed {
        match actual.get(name) {
            None => mismatches.push(ManifestMismatch::Missing(name.clone())),
            Some(digest) if !digest.eq_ignore_ascii_case(expected) => {
                mismatches.push(ManifestMismatch::Digest {
                    name: name.clone(),
                    expected: expected.clone(),
                    actual: digest.clone(),
                });
            }
            Some(_) => {}
        }
    }
    mismatches.extend(
        actual
            .keys()
            .filter(|name| !listed.contains_key(*name))
            .map(|name| ManifestMismatch::Unlisted(name.clone())),
    );
    mismatches.sort_by(|a, b| mismatch_name(a).cmp(mismatch_name(b)));
    Ok(mismatches)
}

fn mismatch_name(m: &ManifestMismatch) -> &str {
    match m {
        ManifestMismatch::Missing(name) | ManifestMismatch::Unlisted(name) => name,
        ManifestMismatch::Digest { name, .. } => name,
    }
}
