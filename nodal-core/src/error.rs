//! Error types for the nodal core library.
//!
//! Every failure in the core is a caller contract violation: invalid levels or
//! degrees, mismatched vector lengths, unknown enumerators or degenerate input.
//! None of them are transient, so none are retried.

use std::fmt;

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by flow-matrix transformations, assignments and scoring.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FlowsError {
    /// A distance type name did not match any known variant.
    #[error("unknown distance type `{provided}`; expected `geometric-mean` or `arithmetic-mean`")]
    InvalidDistanceType {
        /// Raw name supplied by the caller.
        provided: String,
    },
    /// A row-normalisation name did not match any known variant.
    #[error("unknown norm `{provided}`; expected `l1`, `l2` or `max`")]
    InvalidNorm {
        /// Raw name supplied by the caller.
        provided: String,
    },
    /// Indirect flows only exist for non-negative degrees.
    #[error("indirect flows make sense only for non-negative degrees (got {degree})")]
    InvalidDegree {
        /// The rejected degree.
        degree: i64,
    },
    /// The node-size vector does not match the matrix dimension.
    #[error("flow matrix has {nodes} rows but {sizes} node sizes were given")]
    NodeSizesMismatch {
        /// Number of rows in the flow matrix.
        nodes: usize,
        /// Number of node sizes supplied.
        sizes: usize,
    },
    /// Flow matrices must be square.
    #[error("flow matrix must be square (got {rows}x{cols})")]
    NonSquare {
        /// Number of rows supplied.
        rows: usize,
        /// Number of columns supplied.
        cols: usize,
    },
    /// The assignment does not cover every node of the flow matrix.
    #[error("assignment has {assignment} entries but the flow matrix has {nodes} nodes")]
    AssignmentLengthMismatch {
        /// Number of nodes in the flow matrix.
        nodes: usize,
        /// Length of the supplied assignment.
        assignment: usize,
    },
    /// An assignment referenced a center outside `0..len`.
    #[error("node {node} is assigned to center {center}, outside 0..{nodes}")]
    CenterOutOfRange {
        /// Node carrying the invalid center.
        node: usize,
        /// The invalid center index.
        center: usize,
        /// Number of nodes in the assignment.
        nodes: usize,
    },
    /// A matrix entry lies outside the declared shape.
    #[error("entry ({row}, {col}) lies outside a {rows}x{cols} matrix")]
    IndexOutOfBounds {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// Declared number of rows.
        rows: usize,
        /// Declared number of columns.
        cols: usize,
    },
    /// The operation requires at least one node.
    #[error("flow matrix contains no nodes")]
    EmptyFlows,
    /// A flow value was NaN or infinite.
    #[error("flow ({row}, {col}) is not finite")]
    NonFiniteFlow {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
    },
    /// Flows are magnitudes and may not be negative.
    #[error("flow ({row}, {col}) is negative ({value})")]
    NegativeFlow {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// The offending value.
        value: f64,
    },
}

define_error_codes! {
    /// Stable codes describing [`FlowsError`] variants.
    enum FlowsErrorCode for FlowsError {
        /// A distance type name did not match any known variant.
        InvalidDistanceType => InvalidDistanceType { .. } => "FLOWS_INVALID_DISTANCE_TYPE",
        /// A row-normalisation name did not match any known variant.
        InvalidNorm => InvalidNorm { .. } => "FLOWS_INVALID_NORM",
        /// Indirect flows were requested for a negative degree.
        InvalidDegree => InvalidDegree { .. } => "FLOWS_INVALID_DEGREE",
        /// The node-size vector does not match the matrix dimension.
        NodeSizesMismatch => NodeSizesMismatch { .. } => "FLOWS_NODE_SIZES_MISMATCH",
        /// Flow matrices must be square.
        NonSquare => NonSquare { .. } => "FLOWS_NON_SQUARE",
        /// The assignment does not cover every node.
        AssignmentLengthMismatch => AssignmentLengthMismatch { .. } => "FLOWS_ASSIGNMENT_LENGTH_MISMATCH",
        /// An assignment referenced a center outside its range.
        CenterOutOfRange => CenterOutOfRange { .. } => "FLOWS_CENTER_OUT_OF_RANGE",
        /// A matrix entry lies outside the declared shape.
        IndexOutOfBounds => IndexOutOfBounds { .. } => "FLOWS_INDEX_OUT_OF_BOUNDS",
        /// The operation requires at least one node.
        EmptyFlows => EmptyFlows => "FLOWS_EMPTY",
        /// A flow value was NaN or infinite.
        NonFiniteFlow => NonFiniteFlow { .. } => "FLOWS_NON_FINITE",
        /// A flow value was negative.
        NegativeFlow => NegativeFlow { .. } => "FLOWS_NEGATIVE",
    }
}

/// Error type produced when constructing or extending a [`crate::CenterDetector`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DetectorError {
    /// Hierarchy levels start at zero.
    #[error("center levels must be at least zero, got ({min_level}, {max_level})")]
    InvalidLevel {
        /// Lower bound requested by the caller.
        min_level: i64,
        /// Upper bound requested by the caller.
        max_level: i64,
    },
    /// The requested level has not been computed yet.
    #[error("level {level} has not been computed ({computed} levels cached)")]
    LevelNotComputed {
        /// The requested level.
        level: usize,
        /// Number of levels currently cached.
        computed: usize,
    },
    /// The detector needs at least one node.
    #[error("cannot detect centers in a flow matrix without nodes")]
    EmptyFlows,
    /// A configured threshold was negative or not finite.
    #[error("threshold `{parameter}` must be finite and non-negative (got {value})")]
    InvalidThreshold {
        /// Name of the offending builder parameter.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Levels supplied to seed the cache are inconsistent with the flows.
    #[error("seed level {level} is invalid: {reason}")]
    InvalidSeedLevels {
        /// Index of the first offending level.
        level: usize,
        /// Human-readable reason.
        reason: &'static str,
    },
    /// A flow transformation failed while computing a level.
    #[error("flow transformation failed: {error}")]
    Flows {
        #[source]
        /// Underlying flow error.
        error: FlowsError,
    },
}

impl From<FlowsError> for DetectorError {
    fn from(error: FlowsError) -> Self {
        Self::Flows { error }
    }
}

define_error_codes! {
    /// Stable codes describing [`DetectorError`] variants.
    enum DetectorErrorCode for DetectorError {
        /// Hierarchy levels start at zero.
        InvalidLevel => InvalidLevel { .. } => "DETECTOR_INVALID_LEVEL",
        /// The requested level has not been computed yet.
        LevelNotComputed => LevelNotComputed { .. } => "DETECTOR_LEVEL_NOT_COMPUTED",
        /// The detector needs at least one node.
        EmptyFlows => EmptyFlows => "DETECTOR_EMPTY_FLOWS",
        /// A configured threshold was negative or not finite.
        InvalidThreshold => InvalidThreshold { .. } => "DETECTOR_INVALID_THRESHOLD",
        /// Seed levels are inconsistent with the flows.
        InvalidSeedLevels => InvalidSeedLevels { .. } => "DETECTOR_INVALID_SEED_LEVELS",
        /// A flow transformation failed while computing a level.
        FlowsFailure => Flows { .. } => "DETECTOR_FLOWS_FAILURE",
    }
}

impl DetectorError {
    /// Retrieve the inner [`FlowsErrorCode`] when the error originated in a flow transformation.
    #[must_use]
    pub const fn flows_code(&self) -> Option<FlowsErrorCode> {
        match self {
            Self::Flows { error } => Some(error.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the flow primitives.
pub type FlowsResult<T> = core::result::Result<T, FlowsError>;

/// Convenient alias for results returned by the detector API.
pub type Result<T> = core::result::Result<T, DetectorError>;
