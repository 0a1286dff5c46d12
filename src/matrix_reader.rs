//! Adjacency matrix and node coordinate readers.
//!
//! Both inputs are plain whitespace separated text. The adjacency file holds
//! one row of `0`/`1` tokens per line, the coordinates file one `x y` pair per
//! line. A blank line ends either file early.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// What exactly was wrong with an input file
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Malformation {
    #[error("file could not be read: {0}")]
    Unreadable(String),

    #[error("line {line} has {found} elements, line 0 has {expected}")]
    RaggedRow { line: usize, found: usize, expected: usize },

    #[error("line {line} contains '{token}', expected 0 or 1")]
    BadToken { line: usize, token: String },

    #[error("{rows} rows and {columns} columns, the matrix must be square")]
    NotSquare { rows: usize, columns: usize },

    #[error("line {line} has {found} elements, coordinates need exactly 2")]
    CoordinateArity { line: usize, found: usize },

    #[error("line {line} contains '{token}', which is not a number")]
    BadNumber { line: usize, token: String },
}

/// Errors raised while ingesting the topology inputs
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Malformed input '{}': {problem}", path.display())]
    MalformedInput { path: PathBuf, problem: Malformation },

    #[error("The number of lines in the coordinate file is {coordinates}, not equal to the adjacency matrix size {matrix}")]
    DimensionMismatch { coordinates: usize, matrix: usize },
}

/// Square boolean connectivity grid, `rows[i][j]` is true when i links to j
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdjacencyMatrix {
    rows: Vec<Vec<bool>>,
}

impl AdjacencyMatrix {
    /// Build a matrix from rows, checking that it is square
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, Malformation> {
        let dimension = rows.len();
        if let Some(row) = rows.iter().find(|row| row.len() != dimension) {
            return Err(Malformation::NotSquare { rows: dimension, columns: row.len() });
        }
        Ok(Self { rows })
    }

    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    pub fn is_set(&self, i: usize, j: usize) -> bool {
        self.rows[i][j]
    }

    /// Number of true entries over the whole grid
    pub fn count_set(&self) -> usize {
        self.rows.iter().map(|row| row.iter().filter(|&&cell| cell).count()).sum()
    }

    /// True when no entry on or below the diagonal is set
    pub fn is_strictly_upper_triangular(&self) -> bool {
        self.rows
            .iter()
            .enumerate()
            .all(|(i, row)| row[..=i].iter().all(|&cell| !cell))
    }

    /// Pairs (i, j) with i < j that are set in both directions
    pub fn mirrored_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for i in 0..self.dimension() {
            for j in (i + 1)..self.dimension() {
                if self.rows[i][j] && self.rows[j][i] {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}

impl fmt::Display for AdjacencyMatrix {
    /// Writes the token grid, one row per line
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let tokens: Vec<&str> = row.iter().map(|&cell| if cell { "1" } else { "0" }).collect();
            writeln!(f, "{}", tokens.join(" "))?;
        }
        Ok(())
    }
}

/// One (x, y) pair from the coordinates file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

/// Node coordinates in file order; entry i belongs to node i
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoordinateList {
    entries: Vec<Coordinate>,
}

impl CoordinateList {
    pub fn new(entries: Vec<Coordinate>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Coordinate> {
        self.entries.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> {
        self.entries.iter()
    }
}

fn read_input(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|e| InputError::MalformedInput {
        path: path.to_path_buf(),
        problem: Malformation::Unreadable(e.to_string()),
    })
}

/// Read an N x N adjacency matrix from `path`
pub fn read_adjacency_matrix(path: &Path) -> Result<AdjacencyMatrix, InputError> {
    let content = read_input(path)?;
    parse_adjacency_matrix(&content).map_err(|problem| InputError::MalformedInput {
        path: path.to_path_buf(),
        problem,
    })
}

/// Parse adjacency matrix text
pub fn parse_adjacency_matrix(content: &str) -> Result<AdjacencyMatrix, Malformation> {
    let mut rows: Vec<Vec<bool>> = Vec::new();
    let mut columns = 0;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            log::warn!("Ignoring blank row in the adjacency matrix: {}", line_no);
            break;
        }

        let mut row = Vec::new();
        for token in line.split_whitespace() {
            match token {
                "0" => row.push(false),
                "1" => row.push(true),
                other => {
                    return Err(Malformation::BadToken { line: line_no, token: other.to_string() });
                }
            }
        }

        if line_no == 0 {
            columns = row.len();
        }
        if row.len() != columns {
            log::error!(
                "Number of elements in line {}: {} not equal to number of elements in line 0: {}",
                line_no,
                row.len(),
                columns
            );
            return Err(Malformation::RaggedRow { line: line_no, found: row.len(), expected: columns });
        }
        rows.push(row);
    }

    if rows.len() != columns {
        log::error!("There are {} rows and {} columns.", rows.len(), columns);
        return Err(Malformation::NotSquare { rows: rows.len(), columns });
    }

    Ok(AdjacencyMatrix { rows })
}

/// Read a list of node coordinates from `path`
pub fn read_coordinates(path: &Path) -> Result<CoordinateList, InputError> {
    let content = read_input(path)?;
    parse_coordinates(&content).map_err(|problem| InputError::MalformedInput {
        path: path.to_path_buf(),
        problem,
    })
}

/// Parse coordinates text
pub fn parse_coordinates(content: &str) -> Result<CoordinateList, Malformation> {
    let mut entries = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            log::warn!("Ignoring blank row in the coordinates file: {}", line_no);
            break;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 2 {
            log::error!(
                "Number of elements at line#{} is {} which is not equal to 2 for node coordinates file",
                line_no,
                tokens.len()
            );
            return Err(Malformation::CoordinateArity { line: line_no, found: tokens.len() });
        }

        let mut values = [0.0f64; 2];
        for (slot, token) in values.iter_mut().zip(&tokens) {
            let bad_number = || Malformation::BadNumber {
                line: line_no,
                token: token.to_string(),
            };
            let value: f64 = token.parse().map_err(|_| bad_number())?;
            // "nan" and "inf" parse as f64 but are not positions
            if !value.is_finite() {
                return Err(bad_number());
            }
            *slot = value;
        }
        entries.push(Coordinate { x: values[0], y: values[1] });
    }

    Ok(CoordinateList { entries })
}

/// Coordinates and matrix must describe the same number of nodes
pub fn check_dimensions(matrix: &AdjacencyMatrix, coordinates: &CoordinateList) -> Result<(), InputError> {
    if matrix.dimension() != coordinates.len() {
        return Err(InputError::DimensionMismatch {
            coordinates: coordinates.len(),
            matrix: matrix.dimension(),
        });
    }
    Ok(())
}

/// Dump the matrix at debug level
pub fn log_matrix(description: &str, matrix: &AdjacencyMatrix) {
    log::debug!("**** Start {} ********", description);
    for line in matrix.to_string().lines() {
        log::debug!("{}", line);
    }
    log::debug!("**** End {} ********", description);
}

/// Dump the coordinates at debug level
pub fn log_coordinates(description: &str, coordinates: &CoordinateList) {
    log::debug!("**** Start {} ********", description);
    for coordinate in coordinates.iter() {
        log::debug!("{} {}", coordinate.x, coordinate.y);
    }
    log::debug!("**** End {} ********", description);
}
