//! A worker's band of the image.

use crate::{Result, WorkerErr};

/// The rows owned by one worker, along with the noisy values they started from.
///
/// Cells are stored row major. The original values are captured once at creation
/// and never change, they're the observation term of every energy evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    width: usize,
    cells: Vec<i32>,
    original: Box<[i32]>,
}

impl Partition {
    /// Creates a new `Partition` from its row major cells.
    ///
    /// # Arguments
    /// * `width` - The amount of columns of the image.
    /// * `cells` - The band's spins, row after row.
    ///
    /// # Returns
    /// An error if the band is empty or `cells` is not made of whole rows.
    pub fn new(width: usize, cells: Vec<i32>) -> Result<Self> {
        if width == 0 || cells.is_empty() || cells.len() % width != 0 {
            return Err(WorkerErr::MalformedBand {
                width,
                cells: cells.len(),
            });
        }

        let original = cells.clone().into_boxed_slice();
        Ok(Self {
            width,
            cells,
            original,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// The amount of rows in the band.
    pub fn rows(&self) -> usize {
        self.cells.len() / self.width
    }

    /// The current spin at row `y`, column `x`.
    #[inline]
    pub fn spin(&self, y: usize, x: usize) -> i32 {
        self.cells[y * self.width + x]
    }

    /// The observed spin at row `y`, column `x`.
    #[inline]
    pub fn original(&self, y: usize, x: usize) -> i32 {
        self.original[y * self.width + x]
    }

    /// Negates the spin at row `y`, column `x`.
    #[inline]
    pub fn flip(&mut self, y: usize, x: usize) {
        let cell = &mut self.cells[y * self.width + x];
        *cell = -*cell;
    }

    pub fn row(&self, y: usize) -> &[i32] {
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    pub fn first_row(&self) -> &[i32] {
        self.row(0)
    }

    pub fn last_row(&self) -> &[i32] {
        self.row(self.rows() - 1)
    }

    /// Iterates over the band's current rows, top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[i32]> {
        self.cells.chunks_exact(self.width)
    }

    /// Counts the cells whose spin differs from the observed one.
    pub fn changed_cells(&self) -> usize {
        self.cells
            .iter()
            .zip(self.original.iter())
            .filter(|(spin, original)| spin != original)
            .count()
    }
}
