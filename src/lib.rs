//! Screen OCR word extraction.
//!
//! A screenshot is run through several recognition passes (`strategy`), the word-level results of
//! every pass are pooled, and overlapping duplicates are collapsed to their most confident member
//! (`dedupe`). `overlay` maps the resulting boxes onto a scaled view for selection.

pub mod config;
pub mod dedupe;
pub mod error;
pub mod extractor;
pub mod job;
pub mod overlay;
pub mod preprocess;
pub mod recognizer;
pub mod strategy;
pub mod word;

pub use dedupe::{dedupe, overlap_ratio, DEDUP_THRESHOLD};
pub use error::{OcrError, OcrResult};
pub use extractor::{decode_image, filter_detections, Extractor};
pub use job::{Extraction, ExtractionJob, Job};
pub use recognizer::{tesseract::TesseractRecognizer, Exclusive, RecognitionConfig, Recognizer};
pub use strategy::{ImageVariant, Strategy, StrategySet};
pub use word::{RawDetection, WordBox, WORD_LEVEL};
