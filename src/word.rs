use serde::{Deserialize, Serialize};

/// Hierarchy level the engine reports for single words (page = 1 ... word = 5).
pub const WORD_LEVEL: i32 = 5;

/// A single row reported by the recognition engine, unfiltered.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub level: i32,
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f32,
}

/// A recognised word and its bounds, in the source image's pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
}

impl WordBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> u64 {
        self.left as u64 + self.width as u64
    }

    pub fn bottom(&self) -> u64 {
        self.top as u64 + self.height as u64
    }

    /// Convert a raw detection into a `WordBox`.
    ///
    /// Returns `None` if the detection is not word level, has no text after trimming, or has
    /// negative offsets or a zero area.
    pub fn from_detection(detection: &RawDetection) -> Option<Self> {
        if detection.level != WORD_LEVEL {
            return None;
        }

        let text = detection.text.trim();
        if text.is_empty() {
            return None;
        }

        let left = u32::try_from(detection.left).ok()?;
        let top = u32::try_from(detection.top).ok()?;
        let width = u32::try_from(detection.width).ok().filter(|w| *w > 0)?;
        let height = u32::try_from(detection.height).ok().filter(|h| *h > 0)?;

        Some(Self {
            text: text.to_owned(),
            left,
            top,
            width,
            height,
            confidence: detection.confidence,
        })
    }
}
