use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OcrError {
    /// The recognition backend is not installed or cannot be reached. Every pass fails alike.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// A single recognition call failed. Only the pass that issued it is affected.
    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    /// The input could not be interpreted as an image.
    #[error("Failed to decode image: {0}")]
    ImageDecodeFailed(String),
}

pub type OcrResult<T> = std::result::Result<T, OcrError>;
