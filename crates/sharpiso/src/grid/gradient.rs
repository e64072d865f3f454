//! Finite-difference gradients on a unit-spaced grid.

use super::field::{check_len, validate_axis_size, GridError};

/// Per-vertex gradients by central differences.
///
/// Interior vertices use `(s[i+1] - s[i-1]) / 2`; boundary vertices fall back
/// to the one-sided difference toward the interior. Every axis must have at
/// least two vertices and `scalars` must hold one value per vertex.
pub fn central_difference_gradients(
    axis_size: [usize; 3],
    scalars: &[f64],
) -> Result<Vec<[f64; 3]>, GridError> {
    let n = validate_axis_size(axis_size)?;
    check_len("scalars", n, scalars.len())?;
    let [nx, ny, _] = axis_size;
    let inc = [1, nx, nx * ny];
    let mut gradients = vec![[0.0; 3]; scalars.len()];

    for (iv, g) in gradients.iter_mut().enumerate() {
        let coord = [iv % nx, (iv / nx) % ny, iv / (nx * ny)];
        for d in 0..3 {
            let c = coord[d];
            g[d] = if c == 0 {
                scalars[iv + inc[d]] - scalars[iv]
            } else if c + 1 == axis_size[d] {
                scalars[iv] - scalars[iv - inc[d]]
            } else {
                0.5 * (scalars[iv + inc[d]] - scalars[iv - inc[d]])
            };
        }
    }
    Ok(gradients)
}
