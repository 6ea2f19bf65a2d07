//! Statistics output: three lines, verbatim format.

use std::fmt;

/// Summary statistics of the rank-error distribution over one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationReport {
    pub mean: f64,
    pub max: u64,
    pub variance: f64,
    pub n_get: usize,
}

impl RelaxationReport {
    /// Prints the three-line stdout contract exactly, including the spacing
    /// around the comma.
    pub fn print(&self) {
        println!("{self}");
    }
}

impl fmt::Display for RelaxationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mean_relaxation , {:.4}", self.mean)?;
        writeln!(f, "max_relaxation , {}", self.max)?;
        write!(f, "variance_relaxation , {:.4}", self.variance)
    }
}
