//! # Spline Error Types
//!
//! All errors that can occur while allocating, resizing or mutating splines.

use thiserror::Error;

use crate::spline::SplineEntity;

/// Which configured ceiling an allocation ran into.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityLimit {
    /// Maximum number of live splines.
    #[error("live spline count")]
    Splines,
    /// Maximum number of batches.
    #[error("batch count")]
    Batches,
    /// Control points a single batch can hold.
    #[error("batch size")]
    BatchSize,
}

/// A caller bug that would corrupt neighbouring splines if tolerated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The entity was never allocated or has been removed.
    #[error("unknown or removed spline {0}")]
    UnknownEntity(SplineEntity),

    /// The supplied control points do not fill the spline's range.
    #[error("spline {entity} holds {expected} control points, got {actual}")]
    ControlPointCountMismatch {
        /// The spline being written.
        entity: SplineEntity,
        /// Recorded `num_control_points`.
        expected: usize,
        /// Count implied by the write.
        actual: usize,
    },

    /// A spline needs a four point window for at least one segment.
    #[error("{requested} control points requested, at least {minimum} required")]
    TooFewControlPoints {
        /// Requested count.
        requested: usize,
        /// Smallest valid count.
        minimum: usize,
    },

    /// Sub-interval sampling divides by `vertices_per_segment - 1`.
    #[error("{requested} vertices per segment requested, at least {minimum} required")]
    TooFewVerticesPerSegment {
        /// Requested count.
        requested: usize,
        /// Smallest valid count.
        minimum: usize,
    },

    /// Two workers tried to write the same spline at the same time.
    #[error("concurrent write to spline {0}")]
    ConcurrentWrite(SplineEntity),

    /// An input record points outside the shared input array.
    #[error("input range {start}..{end} outside input of length {len}")]
    InputOutOfRange {
        /// First index read.
        start: usize,
        /// One past the last index read.
        end: usize,
        /// Length of the input array.
        len: usize,
    },

    /// Source and destination arrays differ in length.
    #[error("length mismatch: source {source_len}, destination {destination_len}")]
    LengthMismatch {
        /// Source length.
        source_len: usize,
        /// Destination length.
        destination_len: usize,
    },

    /// Output ranges of two splines overlap or are out of packing order.
    #[error("output range of slot {slot} starts at {start}, before previous end {previous_end}")]
    OverlappingOutput {
        /// Slot whose range is misplaced.
        slot: usize,
        /// Start of that slot's range.
        start: usize,
        /// End of the preceding slot's range.
        previous_end: usize,
    },
}

/// Errors that can occur in the spline engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplineError {
    /// A range could not be allocated under the configured limits.
    #[error("capacity exceeded: {limit} (requested {requested}, max {max})")]
    CapacityExceeded {
        /// The ceiling that was hit.
        limit: CapacityLimit,
        /// Amount requested.
        requested: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The caller broke a registry or buffer invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] InvariantViolation),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for spline operations.
pub type SplineResult<T> = Result<T, SplineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_converts_into_error() {
        let err: SplineError = InvariantViolation::TooFewControlPoints {
            requested: 3,
            minimum: 4,
        }
        .into();
        assert!(matches!(err, SplineError::InvariantViolation(_)));
        assert_eq!(
            err.to_string(),
            "invariant violation: 3 control points requested, at least 4 required"
        );
    }

    #[test]
    fn test_capacity_message() {
        let err = SplineError::CapacityExceeded {
            limit: CapacityLimit::Batches,
            requested: 5,
            max: 4,
        };
        assert_eq!(
            err.to_string(),
            "capacity exceeded: batch count (requested 5, max 4)"
        );
    }
}
