use std::sync::{Arc, Mutex};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::{
    error::{OcrError, OcrResult},
    word::RawDetection,
};

pub mod tesseract;

/// Engine parameters for a single recognition pass.
///
/// `RecognitionConfig::default()` leaves everything up to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Page segmentation mode. `None` uses the engine's default layout analysis.
    pub psm: Option<i32>,
    /// Restrict recognised characters to this set.
    pub whitelist: Option<String>,
}

impl RecognitionConfig {
    pub fn psm(psm: i32) -> Self {
        Self {
            psm: Some(psm),
            whitelist: None,
        }
    }

    pub fn with_whitelist(mut self, whitelist: impl Into<String>) -> Self {
        self.whitelist = Some(whitelist.into());
        self
    }
}

/// An OCR backend.
pub trait Recognizer {
    fn name(&self) -> &'static str;

    /// Run the engine on `image` and return every detection it reports, unfiltered.
    ///
    /// - Returns `Err(OcrError::EngineUnavailable)` if the backend cannot be reached at all;
    /// - Returns `Err(OcrError::RecognitionFailed)` if this particular call failed.
    fn recognize(&self, image: &RgbImage, config: &RecognitionConfig)
        -> OcrResult<Vec<RawDetection>>;
}

impl<R: Recognizer + ?Sized> Recognizer for Arc<R> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn recognize(
        &self,
        image: &RgbImage,
        config: &RecognitionConfig,
    ) -> OcrResult<Vec<RawDetection>> {
        (**self).recognize(image, config)
    }
}

impl<R: Recognizer + ?Sized> Recognizer for &R {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn recognize(
        &self,
        image: &RgbImage,
        config: &RecognitionConfig,
    ) -> OcrResult<Vec<RawDetection>> {
        (**self).recognize(image, config)
    }
}

/// Serialises access to a recognizer that is not reentrant.
///
/// Only one `recognize` call runs at a time, no matter how many extractions share the wrapper.
pub struct Exclusive<R> {
    name: &'static str,
    slot: Mutex<R>,
}

impl<R: Recognizer> Exclusive<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            name: recognizer.name(),
            slot: Mutex::new(recognizer),
        }
    }
}

impl<R> Exclusive<R> {
    pub fn into_inner(self) -> R {
        self.slot
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R: Recognizer> Recognizer for Exclusive<R> {
    // Read without the slot so logging never waits on a running call.
    fn name(&self) -> &'static str {
        self.name
    }

    fn recognize(
        &self,
        image: &RgbImage,
        config: &RecognitionConfig,
    ) -> OcrResult<Vec<RawDetection>> {
        let recognizer = self.slot.lock().map_err(|_| {
            OcrError::RecognitionFailed("a previous recognition call panicked".to_owned())
        })?;
        recognizer.recognize(image, config)
    }
}
