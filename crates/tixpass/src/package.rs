//! Pass bundles and `.pkpass` archive assembly.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use tixpass_core::PassError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::manifest::{self, MANIFEST_FILE, SIGNATURE_FILE};

pub const PASS_FILE: &str = "pass.json";

/// Files of one pass, keyed by archive name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassBundle {
    files: BTreeMap<String, Vec<u8>>,
}

impl PassBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File names in archive order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Compute the manifest over the current files and store it as
    /// `manifest.json`. Returns the manifest bytes.
    pub fn seal_manifest(&mut self) -> Result<Vec<u8>, PassError> {
        let json = manifest::to_json(&manifest::compute(self.files()))?;
        self.insert(MANIFEST_FILE, json.clone());
        Ok(json)
    }

    /// Attach a signature. An empty signature removes the entry.
    pub fn set_signature(&mut self, signature: Vec<u8>) {
        if signature.is_empty() {
            self.files.remove(SIGNATURE_FILE);
        } else {
            self.insert(SIGNATURE_FILE, signature);
        }
    }

    pub fn is_signed(&self) -> bool {
        self.contains(SIGNATURE_FILE)
    }

    /// Write the bundle as a deflate ZIP archive in memory.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::Package`] on any compression or write failure.
    pub fn to_pkpass(&self) -> Result<Vec<u8>, PassError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, bytes) in &self.files {
            writer.start_file(name.as_str(), options).map_err(package_error)?;
            writer.write_all(bytes).map_err(package_error)?;
        }
        let cursor = writer.finish().map_err(package_error)?;
        Ok(cursor.into_inner())
    }

    /// Read a `.pkpass` archive back into a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::Package`] if the bytes are not a readable ZIP.
    pub fn from_pkpass(bytes: &[u8]) -> Result<Self, PassError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(package_error)?;
        let mut bundle = Self::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(package_error)?;
            if entry.is_dir() {
                continue;
            }
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents).map_err(package_error)?;
            bundle.insert(entry.name().to_string(), contents);
        }
        Ok(bundle)
    }
}

fn package_error(err: impl std::fmt::Display) -> PassError {
    PassError::Package(err.to_string())
}
