use std::collections::HashMap;

use image::{DynamicImage, RgbImage};
use rusty_tesseract::{Args, TessError};
use serde::{Deserialize, Serialize};

use crate::{
    error::{OcrError, OcrResult},
    word::RawDetection,
};

use super::{RecognitionConfig, Recognizer};

/// Recognizer backed by the `tesseract` executable.
#[derive(Debug, Default, Clone)]
pub struct TesseractRecognizer {
    config: TesseractConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TesseractConfig {
    pub lang: String,
    pub dpi: Option<i32>,
    pub oem: Option<i32>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            lang: "eng".to_owned(),
            dpi: Some(300),
            oem: Some(3),
        }
    }
}

impl TesseractRecognizer {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    fn args(&self, config: &RecognitionConfig) -> Args {
        let mut config_variables = HashMap::new();
        if let Some(whitelist) = &config.whitelist {
            config_variables.insert("tessedit_char_whitelist".to_owned(), whitelist.clone());
        }

        Args {
            lang: self.config.lang.clone(),
            config_variables,
            dpi: self.config.dpi,
            psm: config.psm,
            oem: self.config.oem,
        }
    }
}

impl Recognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(
        &self,
        image: &RgbImage,
        config: &RecognitionConfig,
    ) -> OcrResult<Vec<RawDetection>> {
        let tess_image =
            rusty_tesseract::Image::from_dynamic_image(&DynamicImage::ImageRgb8(image.clone()))
                .map_err(map_error)?;
        let output =
            rusty_tesseract::image_to_data(&tess_image, &self.args(config)).map_err(map_error)?;

        Ok(output
            .data
            .into_iter()
            .map(|row| RawDetection {
                level: row.level,
                text: row.text,
                left: row.left,
                top: row.top,
                width: row.width,
                height: row.height,
                confidence: row.conf,
            })
            .collect())
    }
}

fn map_error(error: TessError) -> OcrError {
    match error {
        TessError::TesseractNotFoundError => OcrError::EngineUnavailable(error.to_string()),
        other => OcrError::RecognitionFailed(other.to_string()),
    }
}
