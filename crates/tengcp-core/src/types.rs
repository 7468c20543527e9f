//! Shape and axis aliases shared across the workspace.

use smallvec::SmallVec;

/// Index of a tensor mode (0-based).
pub type Axis = usize;

/// CP rank: number of rank-one components in a Kruskal model.
pub type Rank = usize;

/// Tensor shape.
///
/// Stored inline for up to six modes, which covers every tensor the engine
/// fits in practice without a heap allocation.
///
/// # Examples
///
/// ```
/// use tengcp_core::Shape;
///
/// let shape: Shape = Shape::from_slice(&[2, 3, 4]);
/// assert_eq!(shape.iter().product::<usize>(), 24);
/// ```
pub type Shape = SmallVec<[usize; 6]>;

/// Number of entries a tensor of `shape` holds.
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}
