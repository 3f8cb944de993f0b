//! tixpass-scan: PDF access, page rasterization and barcode decoding.
//!
//! This crate reads ticket PDFs through a pluggable backend (lopdf by
//! default), walks their content streams, renders pages to grayscale with
//! tiny-skia, and decodes barcodes from embedded images or rendered pages.
//! It depends on tixpass-core for shared data types.

pub mod backend;
pub mod decoder;
pub mod detector;
pub mod enhance;
pub mod error;
pub mod handler;
pub mod images;
pub mod interpreter;
pub mod interpreter_state;
pub mod lopdf_backend;
pub mod raster;
pub mod tokenizer;

pub use backend::{PageBox, PdfBackend};
pub use decoder::{BarcodeDecoder, DecodedSymbol, RxingDecoder};
pub use detector::{EmbeddedImage, detect_in_image, page_images};
pub use error::ScanError;
pub use handler::{ContentHandler, ImageEvent, PathEvent};
pub use lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};
pub use raster::{RenderedPage, render_page};
pub use tixpass_core;
