//! Error types for kernel operations

use std::fmt;

/// Errors raised by the Khatri-Rao and MTTKRP kernels
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Operand sizes disagree with what the operation requires
    DimensionMismatch {
        operation: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
        context: String,
    },

    /// Mode index outside `0..max_mode`
    InvalidMode {
        mode: usize,
        max_mode: usize,
        context: String,
    },

    /// Factor matrices with differing column counts
    RankMismatch {
        operation: String,
        expected_rank: usize,
        actual_rank: usize,
        factor_index: usize,
    },

    EmptyInput {
        operation: String,
        parameter: String,
    },

    /// A sampled coordinate that does not address an entry of the model
    CoordinateOutOfBounds {
        coordinate: Vec<usize>,
        shape: Vec<usize>,
    },

    OperationError { operation: String, message: String },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::DimensionMismatch {
                operation,
                expected,
                actual,
                context,
            } => write!(
                f,
                "{}: dimension mismatch - expected {:?}, got {:?}. {}",
                operation, expected, actual, context
            ),
            KernelError::InvalidMode {
                mode,
                max_mode,
                context,
            } => write!(
                f,
                "Invalid mode {}: must be < {}. {}",
                mode, max_mode, context
            ),
            KernelError::RankMismatch {
                operation,
                expected_rank,
                actual_rank,
                factor_index,
            } => write!(
                f,
                "{}: rank mismatch at factor {}: expected {} columns, got {}",
                operation, factor_index, expected_rank, actual_rank
            ),
            KernelError::EmptyInput {
                operation,
                parameter,
            } => write!(
                f,
                "{}: empty input not allowed for parameter '{}'",
                operation, parameter
            ),
            KernelError::CoordinateOutOfBounds { coordinate, shape } => write!(
                f,
                "coordinate {:?} is out of bounds for shape {:?}",
                coordinate, shape
            ),
            KernelError::OperationError { operation, message } => {
                write!(f, "{}: {}", operation, message)
            }
        }
    }
}

impl std::error::Error for KernelError {}

pub type KernelResult<T> = Result<T, KernelError>;

impl KernelError {
    pub fn dimension_mismatch(
        operation: impl Into<String>,
        expected: Vec<usize>,
        actual: Vec<usize>,
        context: impl Into<String>,
    ) -> Self {
        KernelError::DimensionMismatch {
            operation: operation.into(),
            expected,
            actual,
            context: context.into(),
        }
    }

    pub fn invalid_mode(mode: usize, max_mode: usize, context: impl Into<String>) -> Self {
        KernelError::InvalidMode {
            mode,
            max_mode,
            context: context.into(),
        }
    }

    pub fn rank_mismatch(
        operation: impl Into<String>,
        expected_rank: usize,
        actual_rank: usize,
        factor_index: usize,
    ) -> Self {
        KernelError::RankMismatch {
            operation: operation.into(),
            expected_rank,
            actual_rank,
            factor_index,
        }
    }

    pub fn empty_input(operation: impl Into<String>, parameter: impl Into<String>) -> Self {
        KernelError::EmptyInput {
            operation: operation.into(),
            parameter: parameter.into(),
        }
    }

    pub fn operation_error(operation: impl Into<String>, message: impl Into<String>) -> Self {
        KernelError::OperationError {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Check that every factor has the same number of columns and, when `shape` is
/// given, that factor `k` has `shape[k]` rows. Returns the shared column count.
pub(crate) fn check_factors<T>(
    operation: &str,
    factors: &[scirs2_core::ndarray_ext::ArrayView2<T>],
    shape: Option<&[usize]>,
) -> KernelResult<usize> {
    let first = factors
        .first()
        .ok_or_else(|| KernelError::empty_input(operation, "factors"))?;
    let rank = first.ncols();
    for (k, factor) in factors.iter().enumerate() {
        if factor.ncols() != rank {
            return Err(KernelError::rank_mismatch(
                operation,
                rank,
                factor.ncols(),
                k,
            ));
        }
    }
    if let Some(shape) = shape {
        if factors.len() != shape.len() {
            return Err(KernelError::dimension_mismatch(
                operation,
                vec![shape.len()],
                vec![factors.len()],
                "one factor matrix per tensor mode",
            ));
        }
        for (k, (factor, &size)) in factors.iter().zip(shape).enumerate() {
            if factor.nrows() != size {
                return Err(KernelError::dimension_mismatch(
                    operation,
                    vec![size, rank],
                    vec![factor.nrows(), factor.ncols()],
                    format!("factor {} must have one row per index of mode {}", k, k),
                ));
            }
        }
    }
    Ok(rank)
}
