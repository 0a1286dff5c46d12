//! Input consistency checks.
//!
//! None of these reject the input. They report shapes that are legal but
//! usually unintended, such as mirrored matrix entries that turn into parallel
//! links, so that they show up in the log before the topology is built.

use crate::matrix_reader::AdjacencyMatrix;

/// Findings of [`inspect_matrix`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatrixReport {
    /// Nodes whose diagonal entry is set
    pub self_loops: Vec<usize>,
    /// Pairs (i, j), i < j, set in both triangles
    pub mirrored_pairs: Vec<(usize, usize)>,
    /// Nodes with no set entry in their row or column
    pub isolated: Vec<usize>,
    /// Links the builder will create
    pub link_count: usize,
}

impl MatrixReport {
    pub fn is_clean(&self) -> bool {
        self.self_loops.is_empty() && self.mirrored_pairs.is_empty() && self.isolated.is_empty()
    }
}

/// Inspect an adjacency matrix and log anything suspicious
///
/// # Examples
/// ```
/// use topogen::matrix_reader::parse_adjacency_matrix;
/// use topogen::utils::validation::inspect_matrix;
///
/// let matrix = parse_adjacency_matrix("0 1\n1 0\n").unwrap();
/// let report = inspect_matrix(&matrix);
/// assert_eq!(report.mirrored_pairs, vec![(0, 1)]);
/// assert_eq!(report.link_count, 2);
/// ```
pub fn inspect_matrix(matrix: &AdjacencyMatrix) -> MatrixReport {
    let n = matrix.dimension();
    let self_loops: Vec<usize> = (0..n).filter(|&i| matrix.is_set(i, i)).collect();
    let isolated: Vec<usize> = (0..n)
        .filter(|&i| (0..n).all(|j| !matrix.is_set(i, j) && !matrix.is_set(j, i)))
        .collect();

    let report = MatrixReport {
        self_loops,
        mirrored_pairs: matrix.mirrored_pairs(),
        isolated,
        link_count: matrix.count_set(),
    };

    if !report.mirrored_pairs.is_empty() {
        log::warn!(
            "{} node pairs are set in both triangles of the adjacency matrix; each becomes two parallel links",
            report.mirrored_pairs.len()
        );
        for (i, j) in &report.mirrored_pairs {
            log::debug!("mirrored entry [{}][{}] and [{}][{}]", i, j, j, i);
        }
    }
    if !report.self_loops.is_empty() {
        log::warn!("Self loops on nodes {:?} will create links from a node to itself", report.self_loops);
    }
    if !report.isolated.is_empty() {
        log::warn!("Nodes {:?} have no links", report.isolated);
    }
    if report.is_clean() && !matrix.is_strictly_upper_triangular() {
        log::info!("Adjacency matrix uses the lower triangle; links follow the row node's role");
    }

    report
}
