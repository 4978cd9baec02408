//! Splitting the image into one horizontal band per worker.

use std::ops::Range;

use crate::error::{OrchestratorError, Result};

/// The contiguous rows owned by the worker at `rank`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Band {
    /// 1-based, band 1 is the topmost.
    pub rank: usize,
    pub rows: Range<usize>,
}

impl Band {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Splits `height` rows into `workers` equal contiguous bands, top to bottom.
///
/// # Returns
/// An error if there are no workers or the height isn't a multiple of `workers`.
pub fn distribute(height: usize, workers: usize) -> Result<Vec<Band>> {
    if workers == 0 {
        return Err(OrchestratorError::InvalidConfig(
            "at least one worker is required".into(),
        ));
    }

    if height == 0 || height % workers != 0 {
        return Err(OrchestratorError::Indivisible { height, workers });
    }

    let size = height / workers;
    let bands = (0..workers)
        .map(|i| Band {
            rank: i + 1,
            rows: i * size..(i + 1) * size,
        })
        .collect();

    Ok(bands)
}
