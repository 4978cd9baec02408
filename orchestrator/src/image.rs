//! The binary image read from and written to disk.

use std::{
    fmt,
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use crate::error::{OrchestratorError, Result};

/// A grid of ±1 spins, stored row major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    cells: Vec<i32>,
}

impl Image {
    /// Creates a new `Image` from its row major cells.
    ///
    /// # Returns
    /// An error if the image is empty, ragged, or holds a value other than ±1.
    pub fn new(width: usize, cells: Vec<i32>) -> Result<Self> {
        if width == 0 || cells.is_empty() || cells.len() % width != 0 {
            return Err(OrchestratorError::MalformedInput {
                line: 0,
                detail: format!("{} cells don't make rows of {width}", cells.len()),
            });
        }

        if let Some(i) = cells.iter().position(|&s| s != 1 && s != -1) {
            return Err(OrchestratorError::MalformedInput {
                line: i / width + 1,
                detail: format!(
                    "column {} holds {}, expected 1 or -1",
                    i % width + 1,
                    cells[i]
                ),
            });
        }

        Ok(Self { width, cells })
    }

    /// Parses whitespace separated ±1 values, one image row per non empty line.
    ///
    /// # Returns
    /// An error naming the offending line if a row is ragged or a value is not ±1.
    pub fn parse(text: &str) -> Result<Self> {
        let mut width = None;
        let mut cells = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            let malformed = |detail: String| OrchestratorError::MalformedInput {
                line: line_no,
                detail,
            };

            let start = cells.len();
            for (col, token) in line.split_whitespace().enumerate() {
                let spin: i32 = token.parse().map_err(|_| {
                    malformed(format!("column {} is not an integer: '{token}'", col + 1))
                })?;

                if spin != 1 && spin != -1 {
                    return Err(malformed(format!(
                        "column {} holds {spin}, expected 1 or -1",
                        col + 1
                    )));
                }

                cells.push(spin);
            }

            let len = cells.len() - start;
            match (len, width) {
                (0, _) => {}
                (len, None) => width = Some(len),
                (len, Some(w)) if len != w => {
                    return Err(malformed(format!("row has {len} values, expected {w}")));
                }
                _ => {}
            }
        }

        let Some(width) = width else {
            return Err(OrchestratorError::MalformedInput {
                line: 0,
                detail: "the image is empty".into(),
            });
        };

        Ok(Self { width, cells })
    }

    /// Reads and parses the image at `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| OrchestratorError::InputRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&text)
    }

    /// Writes the image at `path`, one space separated row per line.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let output_err = |source| OrchestratorError::OutputWrite {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(output_err)?;
        let mut writer = BufWriter::new(file);
        write!(writer, "{self}").map_err(output_err)?;
        writer.flush().map_err(output_err)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.cells.len() / self.width
    }

    pub fn row(&self, y: usize) -> &[i32] {
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        self.cells.chunks_exact(self.width)
    }

    /// Counts the cells that differ from `other`'s.
    pub fn differences(&self, other: &Image) -> usize {
        self.cells
            .iter()
            .zip(&other.cells)
            .filter(|(a, b)| a != b)
            .count()
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for (x, spin) in row.iter().enumerate() {
                if x > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{spin}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
