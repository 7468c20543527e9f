//! Row-major coordinate helpers.
//!
//! Dense storage, the COO format and the samplers all need to move between a
//! coordinate tuple and its position in C order. These helpers are that single
//! definition.
//!
//! ```
//! use tengcp_core::ops::{ravel_index, unravel_index};
//!
//! let shape = [2, 3, 4];
//! let lin = ravel_index(&[1, 2, 3], &shape);
//! assert_eq!(lin, 23);
//! assert_eq!(unravel_index(lin, &shape), vec![1, 2, 3]);
//! ```

/// Linear (row-major) position of `index` within `shape`.
///
/// The caller guarantees `index` is in bounds.
pub fn ravel_index(index: &[usize], shape: &[usize]) -> usize {
    index
        .iter()
        .zip(shape)
        .fold(0, |linear, (&coord, &size)| linear * size + coord)
}

/// Number of entries of `shape`, or `None` when it does not fit in `usize`.
pub fn checked_numel(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &s| acc.checked_mul(s))
}

/// Coordinate tuple of the row-major position `linear` within `shape`.
pub fn unravel_index(linear: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    unravel_into(linear, shape, &mut index);
    index
}

/// Like [`unravel_index`] but writes into a caller-owned buffer.
pub fn unravel_into(linear: usize, shape: &[usize], index: &mut [usize]) {
    let mut remaining = linear;
    for d in (0..shape.len()).rev() {
        index[d] = remaining % shape[d];
        remaining /= shape[d];
    }
}

/// Whether `index` addresses an entry of `shape`.
pub fn in_bounds(index: &[usize], shape: &[usize]) -> bool {
    index.len() == shape.len() && index.iter().zip(shape).all(|(&i, &s)| i < s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ravel_row_major() {
        let shape = [2, 3];
        assert_eq!(ravel_index(&[0, 0], &shape), 0);
        assert_eq!(ravel_index(&[0, 2], &shape), 2);
        assert_eq!(ravel_index(&[1, 0], &shape), 3);
    }

    #[test]
    fn test_unravel_inverts_ravel() {
        let shape = [3, 1, 4];
        for lin in 0..12 {
            let idx = unravel_index(lin, &shape);
            assert_eq!(ravel_index(&idx, &shape), lin);
        }
    }

    #[test]
    fn test_checked_numel() {
        assert_eq!(checked_numel(&[2, 3, 4]), Some(24));
        assert_eq!(checked_numel(&[]), Some(1));
        assert_eq!(checked_numel(&[1 << 22, 1 << 22, 1 << 22]), None);
    }

    #[test]
    fn test_ravel_last_entry_of_huge_shape() {
        let shape = [usize::MAX / 2, 2];
        assert_eq!(ravel_index(&[usize::MAX / 2 - 1, 1], &shape), usize::MAX - 2);
    }

    #[test]
    fn test_in_bounds() {
        assert!(in_bounds(&[1, 2], &[2, 3]));
        assert!(!in_bounds(&[2, 0], &[2, 3]));
        assert!(!in_bounds(&[0], &[2, 3]));
    }
}
