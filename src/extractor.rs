use image::{DynamicImage, RgbImage};
use log::{debug, info, warn};

use crate::{
    dedupe::dedupe,
    error::{OcrError, OcrResult},
    preprocess::enhance,
    recognizer::Recognizer,
    strategy::{ImageVariant, Strategy, StrategySet},
    word::{RawDetection, WordBox},
};

/// Keep the word-level detections whose confidence is strictly above `min_confidence` and whose
/// text is not blank, in their original order.
pub fn filter_detections(detections: &[RawDetection], min_confidence: f32) -> Vec<WordBox> {
    detections
        .iter()
        .filter(|d| d.confidence > min_confidence)
        .filter_map(WordBox::from_detection)
        .collect()
}

/// Decode an encoded image (PNG, JPEG, ...) into an RGB raster.
pub fn decode_image(bytes: &[u8]) -> OcrResult<RgbImage> {
    let image =
        image::load_from_memory(bytes).map_err(|e| OcrError::ImageDecodeFailed(e.to_string()))?;
    Ok(image.to_rgb8())
}

/// Runs every pass of a `StrategySet` through a `Recognizer` and reduces the results to one
/// deduplicated list of words.
///
/// Holds no state between calls.
pub struct Extractor<R> {
    recognizer: R,
    strategies: StrategySet,
}

impl<R: Recognizer> Extractor<R> {
    pub fn new(recognizer: R, strategies: StrategySet) -> Self {
        Self {
            recognizer,
            strategies,
        }
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn strategies(&self) -> &StrategySet {
        &self.strategies
    }

    /// Extract the deduplicated word boxes from `image`, most confident first.
    ///
    /// Failing passes are logged and skipped, so an unavailable engine yields `Ok(vec![])`.
    /// Only an image without pixels is reported as an error.
    pub fn extract_words(
        &self,
        image: &RgbImage,
        min_confidence: f32,
    ) -> OcrResult<Vec<WordBox>> {
        let words = dedupe(self.collect_words(image, min_confidence)?);
        info!(
            "{}: extracted {} words ({} passes)",
            self.recognizer.name(),
            words.len(),
            self.strategies.len()
        );
        Ok(words)
    }

    pub fn extract_words_dynamic(
        &self,
        image: &DynamicImage,
        min_confidence: f32,
    ) -> OcrResult<Vec<WordBox>> {
        self.extract_words(&image.to_rgb8(), min_confidence)
    }

    pub fn extract_words_from_bytes(
        &self,
        bytes: &[u8],
        min_confidence: f32,
    ) -> OcrResult<Vec<WordBox>> {
        self.extract_words(&decode_image(bytes)?, min_confidence)
    }

    /// Run every pass and concatenate the filtered words in pass order, without deduplicating.
    pub fn collect_words(
        &self,
        image: &RgbImage,
        min_confidence: f32,
    ) -> OcrResult<Vec<WordBox>> {
        let mut words = Vec::new();
        self.run_passes(image, min_confidence, |_, pass| words.extend(pass))?;
        Ok(words)
    }

    /// Run every pass in order, handing each successful pass's filtered words to `on_pass` as soon
    /// as that pass finishes.
    pub fn run_passes(
        &self,
        image: &RgbImage,
        min_confidence: f32,
        mut on_pass: impl FnMut(&Strategy, Vec<WordBox>),
    ) -> OcrResult<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::ImageDecodeFailed(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let name = self.recognizer.name();
        let mut enhanced: Option<RgbImage> = None;
        let mut reported_unavailable = false;

        for strategy in self.strategies.iter() {
            let source = match strategy.variant {
                ImageVariant::Original => image,
                ImageVariant::Enhanced => &*enhanced.get_or_insert_with(|| enhance(image)),
            };

            match self.run_pass(strategy, source, min_confidence) {
                Ok(pass_words) => on_pass(strategy, pass_words),
                Err(OcrError::EngineUnavailable(reason)) if reported_unavailable => {
                    debug!("{name}: pass `{}` skipped: {reason}", strategy.name);
                }
                Err(OcrError::EngineUnavailable(reason)) => {
                    warn!("{name}: engine unavailable: {reason}");
                    reported_unavailable = true;
                }
                Err(e) => {
                    warn!("{name}: pass `{}` failed: {e}", strategy.name);
                }
            }
        }

        Ok(())
    }

    fn run_pass(
        &self,
        strategy: &Strategy,
        image: &RgbImage,
        min_confidence: f32,
    ) -> OcrResult<Vec<WordBox>> {
        let detections = self.recognizer.recognize(image, &strategy.recognition)?;
        let words = filter_detections(&detections, min_confidence);
        debug!(
            "{}: pass `{}` kept {} of {} detections",
            self.recognizer.name(),
            strategy.name,
            words.len(),
            detections.len()
        );
        Ok(words)
    }
}
