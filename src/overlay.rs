//! Coordinate arithmetic for drawing word boxes over a scaled screenshot and for picking the boxes
//! a drag selection covers.

use serde::{Deserialize, Serialize};

use crate::word::WordBox;

/// Drag selections this small (in either direction) are treated as clicks and select nothing.
pub const MIN_SELECTION_EXTENT: i32 = 5;

/// An integer rectangle in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DisplayRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from two opposite corners given in any order (eg. a mouse drag).
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        let x = a.0.min(b.0);
        let y = a.1.min(b.1);
        Self::new(x, y, (a.0 - b.0).abs(), (a.1 - b.1).abs())
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether the two rectangles share some area. Rectangles that only touch do not intersect.
    pub fn intersects(&self, other: &DisplayRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// How a screenshot is fitted into a view: uniformly scaled to fit, then centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayLayout {
    pub scale: f64,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl DisplayLayout {
    /// Returns `None` if either the image or the view has no area.
    pub fn fit(
        image_width: u32,
        image_height: u32,
        view_width: u32,
        view_height: u32,
    ) -> Option<Self> {
        if image_width == 0 || image_height == 0 || view_width == 0 || view_height == 0 {
            return None;
        }

        let scale = (view_width as f64 / image_width as f64)
            .min(view_height as f64 / image_height as f64);

        let scaled_width = (image_width as f64 * scale) as i32;
        let scaled_height = (image_height as f64 * scale) as i32;

        Some(Self {
            scale,
            offset_x: (view_width as i32 - scaled_width) / 2,
            offset_y: (view_height as i32 - scaled_height) / 2,
        })
    }

    pub fn to_display(&self, word: &WordBox) -> DisplayRect {
        DisplayRect::new(
            (word.left as f64 * self.scale) as i32 + self.offset_x,
            (word.top as f64 * self.scale) as i32 + self.offset_y,
            (word.width as f64 * self.scale) as i32,
            (word.height as f64 * self.scale) as i32,
        )
    }
}

/// Indices of the words whose on-screen rectangle intersects `selection`.
pub fn select_in_rect(
    layout: &DisplayLayout,
    words: &[WordBox],
    selection: &DisplayRect,
) -> Vec<usize> {
    if selection.width <= MIN_SELECTION_EXTENT || selection.height <= MIN_SELECTION_EXTENT {
        return Vec::new();
    }

    words
        .iter()
        .enumerate()
        .filter(|(_, word)| layout.to_display(word).intersects(selection))
        .map(|(i, _)| i)
        .collect()
}

/// Indices of `words` sorted top to bottom, then left to right.
pub fn reading_order(words: &[WordBox]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..words.len()).collect();
    order.sort_by_key(|&i| (words[i].top, words[i].left));
    order
}

/// The text of the selected words joined by single spaces, in selection order.
pub fn selected_text(words: &[WordBox], selection: &[usize]) -> String {
    selection
        .iter()
        .filter_map(|&i| words.get(i))
        .map(|word| word.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
