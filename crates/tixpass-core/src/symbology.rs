//! Barcode symbologies and their wallet pass formats.
//!
//! [`Symbology`] names what a decoder actually found; [`PassBarcodeFormat`]
//! names what a wallet can render. [`Symbology::pass_format`] maps one to the
//! other and returns `None` for symbologies that cannot be embedded.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A barcode encoding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Symbology {
    Aztec,
    #[serde(rename = "PDF417")]
    Pdf417,
    #[serde(rename = "QRCODE")]
    QrCode,
    #[serde(rename = "DATAMATRIX")]
    DataMatrix,
    #[serde(rename = "CODE128")]
    Code128,
    #[serde(rename = "CODE39")]
    Code39,
    #[serde(rename = "CODE93")]
    Code93,
    #[serde(rename = "EAN13")]
    Ean13,
    #[serde(rename = "EAN8")]
    Ean8,
    UpcA,
    UpcE,
    Codabar,
    Itf,
}

impl Symbology {
    /// Every symbology, 2D first.
    pub const ALL: [Symbology; 13] = [
        Symbology::Aztec,
        Symbology::Pdf417,
        Symbology::QrCode,
        Symbology::DataMatrix,
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Codabar,
        Symbology::Itf,
    ];

    /// Linear symbologies, searched together as the last group.
    pub const LINEAR: [Symbology; 9] = [
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Codabar,
        Symbology::Itf,
    ];

    /// Returns the string tag for this symbology.
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbology::Aztec => "AZTEC",
            Symbology::Pdf417 => "PDF417",
            Symbology::QrCode => "QRCODE",
            Symbology::DataMatrix => "DATAMATRIX",
            Symbology::Code128 => "CODE128",
            Symbology::Code39 => "CODE39",
            Symbology::Code93 => "CODE93",
            Symbology::Ean13 => "EAN13",
            Symbology::Ean8 => "EAN8",
            Symbology::UpcA => "UPC_A",
            Symbology::UpcE => "UPC_E",
            Symbology::Codabar => "CODABAR",
            Symbology::Itf => "ITF",
        }
    }

    /// Human-readable name used in warnings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Symbology::Aztec => "Aztec",
            Symbology::Pdf417 => "PDF417",
            Symbology::QrCode => "QR",
            Symbology::DataMatrix => "Data Matrix",
            Symbology::Code128 => "Code 128",
            Symbology::Code39 => "Code 39",
            Symbology::Code93 => "Code 93",
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
            Symbology::Codabar => "Codabar",
            Symbology::Itf => "ITF",
        }
    }

    pub fn is_two_dimensional(&self) -> bool {
        matches!(
            self,
            Symbology::Aztec | Symbology::Pdf417 | Symbology::QrCode | Symbology::DataMatrix
        )
    }

    /// The wallet format this symbology is embedded as.
    ///
    /// Wallets render Code 128 as their only linear format, so every other
    /// linear symbology is re-encoded as Code 128 with the same message.
    /// Data Matrix has no wallet equivalent.
    pub fn pass_format(&self) -> Option<PassBarcodeFormat> {
        match self {
            Symbology::QrCode => Some(PassBarcodeFormat::Qr),
            Symbology::Pdf417 => Some(PassBarcodeFormat::Pdf417),
            Symbology::Aztec => Some(PassBarcodeFormat::Aztec),
            Symbology::DataMatrix => None,
            _ => Some(PassBarcodeFormat::Code128),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.pass_format().is_some()
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        let symbology = match normalized.as_str() {
            "AZTEC" => Symbology::Aztec,
            "PDF417" | "PDF_417" => Symbology::Pdf417,
            "QRCODE" | "QR_CODE" | "QR" => Symbology::QrCode,
            "DATAMATRIX" | "DATA_MATRIX" => Symbology::DataMatrix,
            "CODE128" | "CODE_128" => Symbology::Code128,
            "CODE39" | "CODE_39" => Symbology::Code39,
            "CODE93" | "CODE_93" => Symbology::Code93,
            "EAN13" | "EAN_13" => Symbology::Ean13,
            "EAN8" | "EAN_8" => Symbology::Ean8,
            "UPC_A" | "UPCA" => Symbology::UpcA,
            "UPC_E" | "UPCE" => Symbology::UpcE,
            "CODABAR" => Symbology::Codabar,
            "ITF" | "I25" => Symbology::Itf,
            _ => return Err(format!("unknown symbology: {s}")),
        };
        Ok(symbology)
    }
}

/// Barcode formats a wallet pass can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassBarcodeFormat {
    #[serde(rename = "PKBarcodeFormatQR")]
    Qr,
    #[serde(rename = "PKBarcodeFormatPDF417")]
    Pdf417,
    #[serde(rename = "PKBarcodeFormatAztec")]
    Aztec,
    #[serde(rename = "PKBarcodeFormatCode128")]
    Code128,
}

impl PassBarcodeFormat {
    pub const ALL: [PassBarcodeFormat; 4] = [
        PassBarcodeFormat::Qr,
        PassBarcodeFormat::Pdf417,
        PassBarcodeFormat::Aztec,
        PassBarcodeFormat::Code128,
    ];

    /// Returns the pass.json tag for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            PassBarcodeFormat::Qr => "PKBarcodeFormatQR",
            PassBarcodeFormat::Pdf417 => "PKBarcodeFormatPDF417",
            PassBarcodeFormat::Aztec => "PKBarcodeFormatAztec",
            PassBarcodeFormat::Code128 => "PKBarcodeFormatCode128",
        }
    }

    /// Parse a pass.json tag, returning `None` for unknown tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == tag)
    }
}

impl fmt::Display for PassBarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
