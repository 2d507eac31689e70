//! **unimodular** is a totally unimodular matrix recognition library.
//!
//! The central entry points are [`tu::test_totally_unimodular`], which decides
//! whether a sparse {-1,0,+1} matrix is totally unimodular and certifies the
//! answer with a [Seymour decomposition tree](seymour::Decomposition) or a
//! violating submatrix, and [`graphic::test_graphic_matrix`] /
//! [`network::test_network_matrix`], which decide whether a matrix is the
//! representation matrix of a (di)graph with respect to some spanning forest
//! and construct the realisation.
//!
//! The recognition pipeline follows Seymour's decomposition theorem: the
//! matrix is signed-checked ([`camion`]), split into 1-, 2- and 3-sums
//! ([`seymour`]), reduced by series-parallel operations
//! ([`series_parallel`]), and its leaves are tested for graphicness via an
//! incremental t-decomposition ([`graphic`]), cographicness, and the special
//! matroid R10.

pub mod camion;
pub mod graph;
pub mod graphic;
pub mod matrix;
pub mod network;
pub mod regular;
pub mod represent;
pub mod separation;
pub mod series_parallel;
pub mod seymour;
pub mod tu;
pub mod unionfind;

pub(crate) mod hereditary;
pub(crate) mod onesum;
pub(crate) mod scored;

use core::fmt;

pub use crate::matrix::{Matrix, Submatrix};
pub use crate::seymour::{Decomposition, NodeId, NodeKind, SeymourParams, SeymourStats};

/// A row or column of a matrix, used wherever rows and columns are mixed in
/// one index space (decomposition trees, separations, reduction logs).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    /// Row with the given index.
    Row(usize),
    /// Column with the given index.
    Column(usize),
}

impl Element {
    /// Returns the row index, if this is a row.
    #[inline]
    pub fn row(self) -> Option<usize> {
        match self {
            Element::Row(r) => Some(r),
            Element::Column(_) => None,
        }
    }

    /// Returns the column index, if this is a column.
    #[inline]
    pub fn column(self) -> Option<usize> {
        match self {
            Element::Row(_) => None,
            Element::Column(c) => Some(c),
        }
    }

    /// Returns `true` if this is a row.
    #[inline]
    pub fn is_row(self) -> bool {
        matches!(self, Element::Row(_))
    }

    /// The element of the transposed matrix.
    #[inline]
    pub fn transposed(self) -> Element {
        match self {
            Element::Row(r) => Element::Column(r),
            Element::Column(c) => Element::Row(c),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Element::Row(r) => write!(f, "r{}", r + 1),
            Element::Column(c) => write!(f, "c{}", c + 1),
        }
    }
}

/// Three-valued decision state used for regularity, graphicness and
/// cographicness of decomposition nodes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Decision {
    /// The property does not hold.
    No,
    /// Not determined yet.
    #[default]
    Unknown,
    /// The property holds.
    Yes,
}

impl Decision {
    /// Returns `true` if the decision is [`Decision::Yes`].
    #[inline]
    pub fn is_yes(self) -> bool {
        self == Decision::Yes
    }

    /// Returns `true` if the decision is [`Decision::No`].
    #[inline]
    pub fn is_no(self) -> bool {
        self == Decision::No
    }

    /// Returns `true` if the decision has been made either way.
    #[inline]
    pub fn is_decided(self) -> bool {
        self != Decision::Unknown
    }
}

/// Errors reported by the recognition algorithms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The input violates a documented precondition, e.g. a non-ternary
    /// entry where a ternary matrix is expected.
    InvalidInput(&'static str),
    /// A separation or forced decomposition strategy is inconsistent with
    /// the algebraic structure it claims.
    Structure(&'static str),
    /// Signed arithmetic overflowed where it could affect correctness.
    Overflow,
    /// The cooperative time limit was exceeded.
    Timeout,
    /// The instance requires a search variant that is not implemented.
    NotImplemented(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(what) => write!(f, "invalid input: {what}"),
            Error::Structure(what) => write!(f, "structure error: {what}"),
            Error::Overflow => f.write_str("arithmetic overflow"),
            Error::Timeout => f.write_str("time limit exceeded"),
            Error::NotImplemented(what) => write!(f, "not implemented: {what}"),
        }
    }
}

impl std::error::Error for Error {}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Cooperative deadline passed down through the decomposition driver.
///
/// Checked at well-defined points (before a series-parallel reduction,
/// before each graphicness test, between nested-minor extensions); work
/// between two checkpoints always runs to completion.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Deadline {
    end: Option<std::time::Instant>,
}

impl Deadline {
    pub(crate) fn new(limit: Option<std::time::Duration>) -> Self {
        Deadline {
            end: limit.map(|d| std::time::Instant::now() + d),
        }
    }

    pub(crate) fn check(&self) -> Result<()> {
        match self.end {
            Some(end) if std::time::Instant::now() > end => Err(Error::Timeout),
            _ => Ok(()),
        }
    }
}
