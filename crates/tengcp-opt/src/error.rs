//! Error types for GCP fitting

use tengcp_kernels::KernelError;
use tengcp_sparse::CooError;
use thiserror::Error;

/// Errors raised while configuring or running a GCP fit
///
/// Every failure is raised before or instead of a result: a fit either returns
/// a complete `(fitted, initial, info)` triple or one of these.
#[derive(Error, Debug)]
pub enum GcpError {
    /// A single argument is malformed: data, rank, optimizer, objective or init
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Arguments that are individually valid but may not be combined
    #[error("Incompatible options: {0}")]
    IncompatibleOptions(String),

    /// Data values outside what the objective admits
    #[error("Domain error: {0}")]
    Domain(String),

    /// Shapes that must agree do not
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} ({context})")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        context: String,
    },

    /// Sampler or solver settings that cannot be honoured for this data
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-finite values produced during optimization
    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("Sparse tensor error: {0}")]
    Sparse(#[from] CooError),

    #[error("Tensor error: {0}")]
    Tensor(#[from] anyhow::Error),
}

pub type GcpResult<T> = Result<T, GcpError>;

impl GcpError {
    pub(crate) fn shape_mismatch(
        expected: &[usize],
        actual: &[usize],
        context: impl Into<String>,
    ) -> Self {
        GcpError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = GcpError::InvalidInput("unsupported init 'svd'".into());
        assert_eq!(err.to_string(), "Invalid input: unsupported init 'svd'");

        let err = GcpError::shape_mismatch(&[2, 2], &[3], "mask");
        assert_eq!(
            err.to_string(),
            "Shape mismatch: expected [2, 2], got [3] (mask)"
        );
    }

    #[test]
    fn test_from_kernel_error() {
        let err: GcpError = KernelError::invalid_mode(3, 2, "MTTKRP").into();
        assert!(matches!(err, GcpError::Kernel(_)));
    }
}
