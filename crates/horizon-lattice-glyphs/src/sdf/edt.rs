//! Squared euclidean distance transform (Felzenszwalb and Huttenlocher).

/// Stand-in for an infinite squared distance.
pub(crate) const INF: f64 = 1e20;

/// Scratch buffers reused across transforms.
///
/// Sized for the longest row or column that will be transformed.
#[derive(Debug, Clone)]
pub(crate) struct EdtScratch {
    f: Vec<f64>,
    v: Vec<usize>,
    z: Vec<f64>,
}

impl EdtScratch {
    pub(crate) fn new(max_len: usize) -> Self {
        Self {
            f: vec![0.0; max_len],
            v: vec![0; max_len],
            z: vec![0.0; max_len + 1],
        }
    }
}

/// Transform the `width` x `height` window at (`x0`, `y0`) of a row-major grid
/// with rows `grid_width` long, in place.
///
/// Cells hold squared distances on input; `0` marks a feature and [`INF`]
/// marks background.
pub(crate) fn edt(
    grid: &mut [f64],
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
    grid_width: usize,
    scratch: &mut EdtScratch,
) {
    for x in x0..x0 + width {
        edt1d(grid, y0 * grid_width + x, grid_width, height, scratch);
    }
    for y in y0..y0 + height {
        edt1d(grid, y * grid_width + x0, 1, width, scratch);
    }
}

fn edt1d(grid: &mut [f64], offset: usize, stride: usize, length: usize, scratch: &mut EdtScratch) {
    if length == 0 {
        return;
    }
    let EdtScratch { f, v, z } = scratch;

    v[0] = 0;
    z[0] = -INF;
    z[1] = INF;
    f[0] = grid[offset];

    let mut k = 0usize;
    for q in 1..length {
        f[q] = grid[offset + q * stride];
        let mut s = intersection(f, v[k], q);
        while k > 0 && s <= z[k] {
            k -= 1;
            s = intersection(f, v[k], q);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = INF;
    }

    let mut k = 0usize;
    for q in 0..length {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let r = v[k];
        let qr = q as f64 - r as f64;
        grid[offset + q * stride] = f[r] + qr * qr;
    }
}

/// Where the parabolas rooted at `r` and `q` intersect.
#[inline]
fn intersection(f: &[f64], r: usize, q: usize) -> f64 {
    let (rf, qf) = (r as f64, q as f64);
    (f[q] - f[r] + qf * qf - rf * rf) / (qf - rf) / 2.0
}
