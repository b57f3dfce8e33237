//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit the magnitude of a value to `limit` while preserving its sign.
///
/// Values whose magnitude does not exceed `limit` are returned unchanged.
/// `limit` is expected to be positive.
pub fn saturate<T>(value: T, limit: T) -> T
where
    T: Float,
{
    if value.abs() > limit {
        if value > T::zero() {
            limit
        } else {
            -limit
        }
    } else {
        value
    }
}
