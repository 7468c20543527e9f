//! Scalar bound shared by every generic item in the engine.

use scirs2_core::ndarray_ext::ScalarOperand;
use scirs2_core::numeric::{Float, FloatConst, FromPrimitive, NumAssign};
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Floating-point scalar the GCP engine is generic over (`f32` and `f64`).
pub trait GcpFloat:
    Float
    + FloatConst
    + FromPrimitive
    + NumAssign
    + ScalarOperand
    + Sum
    + Debug
    + Display
    + Send
    + Sync
    + 'static
{
    /// Convert an `f64` constant.
    fn of(x: f64) -> Self {
        <Self as FromPrimitive>::from_f64(x).unwrap_or_else(Self::nan)
    }

    /// Convert a count.
    fn of_usize(n: usize) -> Self {
        <Self as FromPrimitive>::from_usize(n).unwrap_or_else(Self::infinity)
    }
}

impl<T> GcpFloat for T where
    T: Float
        + FloatConst
        + FromPrimitive
        + NumAssign
        + ScalarOperand
        + Sum
        + Debug
        + Display
        + Send
        + Sync
        + 'static
{
}
