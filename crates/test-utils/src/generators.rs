//! Test data generators for synthetic radar grids.
//!
//! All value grids are row-major with `width` columns: the point at column
//! `x`, row `y` lives at index `x + y * width`.

/// Creates a grid where every point carries a distinct, decodable value.
///
/// Each cell value is `x * 1000 + y`, so a report line can be traced back to
/// the point that produced it.
///
/// # Example
///
/// ```
/// use test_utils::create_indexed_grid;
///
/// let grid = create_indexed_grid(3, 2);
/// assert_eq!(grid.len(), 6);
/// assert_eq!(grid[0], 0.0);    // x=0, y=0
/// assert_eq!(grid[1], 1000.0); // x=1, y=0
/// assert_eq!(grid[3], 1.0);    // x=0, y=1
/// ```
pub fn create_indexed_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push((x * 1000 + y) as f32);
        }
    }
    data
}

/// Creates a reflectivity-like grid where every `stride`-th point is a
/// valid echo and the rest carry the "no reading" value `-1.0`.
///
/// Valid echoes range over 0..60 dBZ.
pub fn create_sparse_echo_grid(width: usize, height: usize, stride: usize) -> Vec<f32> {
    let stride = stride.max(1);
    (0..width * height)
        .map(|i| {
            if i % stride == 0 {
                (i % 61) as f32
            } else {
                -1.0
            }
        })
        .collect()
}
