//! FastDTW
//!
//! Approximate dynamic time warping in linear time: the series are halved
//! recursively, the warp path found at the coarse resolution is projected back
//! and widened by `radius`, and full DTW runs only inside that window.
//! Point distance is the absolute value difference.

/// Warp path and accumulated cost between two value sequences
#[derive(Debug, Clone, PartialEq)]
pub struct WarpResult {
    pub distance: f64,
    /// Matched index pairs from `(0, 0)` to `(n - 1, m - 1)`
    pub path: Vec<(usize, usize)>,
    left_len: usize,
    right_len: usize,
}

impl WarpResult {
    /// Accumulated cost divided by the combined length of both inputs
    pub fn normalized_distance(&self) -> f64 {
        self.distance / (self.left_len + self.right_len) as f64
    }
}

/// Warp `left` onto `right`, `None` if either is empty
pub fn fast_dtw(left: &[f64], right: &[f64], radius: usize) -> Option<WarpResult> {
    if left.is_empty() || right.is_empty() {
        return None;
    }
    let (distance, path) = warp(left, right, radius);
    Some(WarpResult {
        distance,
        path,
        left_len: left.len(),
        right_len: right.len(),
    })
}

fn warp(left: &[f64], right: &[f64], radius: usize) -> (f64, Vec<(usize, usize)>) {
    let min_size = radius + 2;
    if left.len() <= min_size || right.len() <= min_size {
        return dtw(left, right, &Window::full(left.len(), right.len()));
    }

    let (_, coarse_path) = warp(&coarsen(left), &coarsen(right), radius);
    let window = Window::expand(&coarse_path, left.len(), right.len(), radius);
    let (distance, path) = dtw(left, right, &window);
    if distance.is_infinite() {
        // projected window lost connectivity
        return dtw(left, right, &Window::full(left.len(), right.len()));
    }
    (distance, path)
}

/// Halve the resolution by averaging adjacent pairs
fn coarsen(values: &[f64]) -> Vec<f64> {
    values
        .chunks(2)
        .map(|pair| pair.iter().sum::<f64>() / pair.len() as f64)
        .collect()
}

/// Inclusive column range allowed for each row
#[derive(Debug)]
struct Window {
    lo: Vec<usize>,
    hi: Vec<usize>,
}

impl Window {
    fn full(rows: usize, cols: usize) -> Self {
        Self {
            lo: vec![0; rows],
            hi: vec![cols - 1; rows],
        }
    }

    /// Project a coarse path onto the full resolution, widened by `radius`
    fn expand(coarse_path: &[(usize, usize)], rows: usize, cols: usize, radius: usize) -> Self {
        let mut lo = vec![usize::MAX; rows];
        let mut hi = vec![0; rows];

        for &(i, j) in coarse_path {
            let row_start = (2 * i).saturating_sub(2 * radius);
            let row_end = (2 * (i + radius) + 1).min(rows - 1);
            let col_start = (2 * j).saturating_sub(2 * radius);
            let col_end = (2 * (j + radius) + 1).min(cols - 1);
            for row in row_start..=row_end {
                lo[row] = lo[row].min(col_start);
                hi[row] = hi[row].max(col_end);
            }
        }

        lo[0] = 0;
        hi[rows - 1] = cols - 1;
        for row in 1..rows {
            if lo[row] == usize::MAX {
                lo[row] = hi[row - 1];
                hi[row] = hi[row - 1];
            }
            // keep a diagonal or vertical step into this row
            lo[row] = lo[row].min(hi[row - 1]);
            hi[row] = hi[row].max(lo[row]);
        }

        Self { lo, hi }
    }

    fn contains(&self, row: usize, col: usize) -> bool {
        col >= self.lo[row] && col <= self.hi[row]
    }
}

/// Cost matrix restricted to a window, stored row by row
struct CostMatrix<'w> {
    window: &'w Window,
    rows: Vec<Vec<f64>>,
}

impl<'w> CostMatrix<'w> {
    fn new(window: &'w Window) -> Self {
        let rows = window
            .lo
            .iter()
            .zip(&window.hi)
            .map(|(&lo, &hi)| vec![f64::INFINITY; hi - lo + 1])
            .collect();
        Self { window, rows }
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        if self.window.contains(row, col) {
            self.rows[row][col - self.window.lo[row]]
        } else {
            f64::INFINITY
        }
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        let offset = col - self.window.lo[row];
        self.rows[row][offset] = value;
    }
}

fn dtw(left: &[f64], right: &[f64], window: &Window) -> (f64, Vec<(usize, usize)>) {
    let mut cost = CostMatrix::new(window);

    for (i, &x) in left.iter().enumerate() {
        for j in window.lo[i]..=window.hi[i] {
            let best = if i == 0 && j == 0 {
                0.0
            } else {
                let diagonal = if i > 0 && j > 0 {
                    cost.get(i - 1, j - 1)
                } else {
                    f64::INFINITY
                };
                let up = if i > 0 { cost.get(i - 1, j) } else { f64::INFINITY };
                let left_cell = if j > 0 { cost.get(i, j - 1) } else { f64::INFINITY };
                diagonal.min(up).min(left_cell)
            };
            cost.set(i, j, (x - right[j]).abs() + best);
        }
    }

    let (mut i, mut j) = (left.len() - 1, right.len() - 1);
    let distance = cost.get(i, j);
    let mut path = vec![(i, j)];
    while i > 0 || j > 0 {
        (i, j) = if i == 0 {
            (0, j - 1)
        } else if j == 0 {
            (i - 1, 0)
        } else {
            let diagonal = cost.get(i - 1, j - 1);
            let up = cost.get(i - 1, j);
            let left_cell = cost.get(i, j - 1);
            if diagonal <= up && diagonal <= left_cell {
                (i - 1, j - 1)
            } else if up <= left_cell {
                (i - 1, j)
            } else {
                (i, j - 1)
            }
        };
        path.push((i, j));
    }
    path.reverse();

    (distance, path)
}
