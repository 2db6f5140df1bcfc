//! Output range policy.
//!
//! Formats store their samples either as real numbers or as integer codes.
//! A preset's `out_range` must be declared in the same numeric domain:
//! `[0.0, 1.0]` for a float format, `[0, 1023]` for a 10-bit coded one.

use crate::ValueRange;

/// Numeric domain a format stores on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePolicy {
    /// Samples are written as real numbers; `out_range` must be float.
    FloatOnly,
    /// Samples are written as integer codes; `out_range` must be integer.
    IntegerCoded,
    /// No constraint.
    Any,
}

impl RangePolicy {
    /// Returns true if `range` is declared in the policy's domain.
    pub fn accepts(self, range: &ValueRange) -> bool {
        match self {
            RangePolicy::FloatOnly => range.is_float(),
            RangePolicy::IntegerCoded => range.is_int(),
            RangePolicy::Any => true,
        }
    }
}

/// What a backend does when `out_range` violates its [`RangePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSeverity {
    /// Abort the export before anything is written.
    Error,
    /// Log a warning and continue.
    Warn,
}
