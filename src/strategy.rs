use serde::{Deserialize, Serialize};

use crate::recognizer::RecognitionConfig;

/// Characters the whitelisted passes are allowed to produce.
pub const STANDARD_WHITELIST: &str = concat!(
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "abcdefghijklmnopqrstuvwxyz",
    "0123456789",
    ".,:;!?'\"()[]{}<>-_+=/\\@#$%&*",
);

// Tesseract page segmentation modes
pub const PSM_SINGLE_COLUMN: i32 = 4;
pub const PSM_UNIFORM_BLOCK: i32 = 6;
pub const PSM_SINGLE_LINE: i32 = 7;
pub const PSM_SINGLE_WORD: i32 = 8;
pub const PSM_SPARSE_TEXT: i32 = 11;
pub const PSM_SPARSE_TEXT_OSD: i32 = 12;

/// Which version of the screenshot a pass runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageVariant {
    Original,
    /// The output of `preprocess::enhance`.
    Enhanced,
}

/// One recognition pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub variant: ImageVariant,
    pub recognition: RecognitionConfig,
}

impl Strategy {
    pub fn new(
        name: impl Into<String>,
        variant: ImageVariant,
        recognition: RecognitionConfig,
    ) -> Self {
        Self {
            name: name.into(),
            variant,
            recognition,
        }
    }
}

/// The ordered list of passes an extraction runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySet {
    pub strategies: Vec<Strategy>,
}

impl StrategySet {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// A single pass with the engine's default settings.
    pub fn single(recognition: RecognitionConfig) -> Self {
        Self::new(vec![Strategy::new("default", ImageVariant::Original, recognition)])
    }

    pub fn needs_enhanced(&self) -> bool {
        self.strategies
            .iter()
            .any(|s| s.variant == ImageVariant::Enhanced)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.iter()
    }
}

impl Default for StrategySet {
    fn default() -> Self {
        let whitelisted =
            RecognitionConfig::psm(PSM_UNIFORM_BLOCK).with_whitelist(STANDARD_WHITELIST);

        let mut strategies = vec![
            Strategy::new("standard", ImageVariant::Original, whitelisted.clone()),
            Strategy::new("enhanced", ImageVariant::Enhanced, whitelisted),
        ];

        strategies.extend(
            [
                ("uniform_block", PSM_UNIFORM_BLOCK),
                ("single_column", PSM_SINGLE_COLUMN),
                ("single_line", PSM_SINGLE_LINE),
                ("single_word", PSM_SINGLE_WORD),
                ("sparse_text", PSM_SPARSE_TEXT),
                ("sparse_text_osd", PSM_SPARSE_TEXT_OSD),
            ]
            .into_iter()
            .map(|(name, psm)| {
                Strategy::new(name, ImageVariant::Original, RecognitionConfig::psm(psm))
            }),
        );

        Self::new(strategies)
    }
}
