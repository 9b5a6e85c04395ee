//! Supported output aspect ratios and closest-match snapping.
//!
//! The image synthesis capability only accepts a fixed set of ratios;
//! arbitrary client requests are snapped to the entry with the minimal
//! absolute difference.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// The fixed set of ratios the synthesis capability supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "4:3")]
    Classic,
    #[serde(rename = "3:4")]
    ClassicPortrait,
    #[serde(rename = "3:2")]
    Photo,
    #[serde(rename = "2:3")]
    PhotoPortrait,
}

impl AspectRatio {
    /// Every supported ratio. Order breaks ties in [`closest`](Self::closest).
    pub const ALL: [AspectRatio; 7] = [
        AspectRatio::Square,
        AspectRatio::Wide,
        AspectRatio::Tall,
        AspectRatio::Classic,
        AspectRatio::ClassicPortrait,
        AspectRatio::Photo,
        AspectRatio::PhotoPortrait,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Wide => "16:9",
            AspectRatio::Tall => "9:16",
            AspectRatio::Classic => "4:3",
            AspectRatio::ClassicPortrait => "3:4",
            AspectRatio::Photo => "3:2",
            AspectRatio::PhotoPortrait => "2:3",
        }
    }

    /// Width divided by height.
    pub fn value(&self) -> f64 {
        match self {
            AspectRatio::Square => 1.0,
            AspectRatio::Wide => 16.0 / 9.0,
            AspectRatio::Tall => 9.0 / 16.0,
            AspectRatio::Classic => 4.0 / 3.0,
            AspectRatio::ClassicPortrait => 3.0 / 4.0,
            AspectRatio::Photo => 3.0 / 2.0,
            AspectRatio::PhotoPortrait => 2.0 / 3.0,
        }
    }

    /// Snap an arbitrary width/height ratio to the closest supported
    /// entry (minimal absolute difference, first entry of
    /// [`AspectRatio::ALL`] on a tie). Non-finite or non-positive input
    /// falls back to square.
    pub fn closest(ratio: f64) -> AspectRatio {
        if !ratio.is_finite() || ratio <= 0.0 {
            return AspectRatio::Square;
        }
        let mut best = AspectRatio::ALL[0];
        let mut best_distance = (best.value() - ratio).abs();
        for candidate in &AspectRatio::ALL[1..] {
            let distance = (candidate.value() - ratio).abs();
            if distance < best_distance {
                best = *candidate;
                best_distance = distance;
            }
        }
        best
    }

    /// Parse a `"W:H"` string (e.g. `"21:9"`) and snap it to the closest
    /// supported ratio.
    pub fn snap_str(input: &str) -> Result<AspectRatio, CoreError> {
        let (width, height) = input.split_once(':').ok_or_else(|| {
            CoreError::Validation(format!(
                "Aspect ratio must be in W:H form, got \"{input}\""
            ))
        })?;
        let width: f64 = width.trim().parse().map_err(|_| {
            CoreError::Validation(format!("Invalid aspect ratio width in \"{input}\""))
        })?;
        let height: f64 = height.trim().parse().map_err(|_| {
            CoreError::Validation(format!("Invalid aspect ratio height in \"{input}\""))
        })?;
        if width <= 0.0 || height <= 0.0 {
            return Err(CoreError::Validation(format!(
                "Aspect ratio dimensions must be positive, got \"{input}\""
            )));
        }
        Ok(AspectRatio::closest(width / height))
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio::Square
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
