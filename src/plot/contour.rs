//! Contour levels, colour limits and grid interpolation.

/// Finite values only.
fn finite(values: &[f32]) -> Vec<f64> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v as f64)
        .collect()
}

/// Minimum and maximum of the finite values.
pub fn data_range(values: &[f32]) -> Option<(f64, f64)> {
    let values = finite(values);
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    (!values.is_empty()).then_some((min, max))
}

/// Linear-interpolated percentile `p` in [0, 100] of the finite values.
pub fn percentile(values: &[f32], p: f64) -> Option<f64> {
    let mut values = finite(values);
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;

    Some(values[lo] + (values[hi] - values[lo]) * (rank - lo as f64))
}

/// Colour limits from the 2nd and 98th percentiles.
pub fn robust_limits(values: &[f32]) -> Option<(f64, f64)> {
    Some((percentile(values, 2.0)?, percentile(values, 98.0)?))
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;

    let nice = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|&n| fraction <= n + 1e-9)
        .unwrap_or(10.0);

    nice * magnitude
}

/// Round-numbered levels spanning `[min, max]` in about `target` steps.
pub fn nice_levels(min: f64, max: f64, target: usize) -> Vec<f64> {
    if !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    if (max - min).abs() < f64::EPSILON {
        return vec![min - 0.5, min + 0.5];
    }

    let step = nice_step((max - min) / target.max(1) as f64);
    let first = (min / step).floor();
    let last = (max / step).ceil();

    (0..=(last - first) as i64)
        .map(|k| (first + k as f64) * step)
        .collect()
}

/// Band of `value` among sorted `levels`: 0 below the first level,
/// `levels.len()` at or above the last.
pub fn band_index(levels: &[f64], value: f64) -> usize {
    levels.partition_point(|&level| level <= value)
}

/// Fractional position of `value` along a monotonic coordinate, clamped to its ends.
pub fn fractional_index(coords: &[f64], value: f64) -> f64 {
    let n = coords.len();
    if n < 2 {
        return 0.0;
    }

    let ascending = coords[n - 1] >= coords[0];
    let upper = if ascending {
        coords.partition_point(|&c| c < value)
    } else {
        coords.partition_point(|&c| c > value)
    };

    match upper {
        0 => 0.0,
        i if i >= n => (n - 1) as f64,
        i => {
            let (a, b) = (coords[i - 1], coords[i]);
            (i - 1) as f64 + if b == a { 0.0 } else { (value - a) / (b - a) }
        }
    }
}

/// Bilinear interpolation of a row-major `rows × cols` grid at fractional indices.
///
/// Returns NaN when any contributing corner is missing.
pub fn bilinear(grid: &ndarray::Array2<f32>, row: f64, col: f64) -> f64 {
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 {
        return f64::NAN;
    }

    let r0 = (row.floor() as usize).min(rows - 1);
    let c0 = (col.floor() as usize).min(cols - 1);
    let r1 = (r0 + 1).min(rows - 1);
    let c1 = (c0 + 1).min(cols - 1);
    let fr = (row - r0 as f64).clamp(0.0, 1.0);
    let fc = (col - c0 as f64).clamp(0.0, 1.0);

    let v = |r: usize, c: usize| grid[[r, c]] as f64;
    let top = v(r0, c0) * (1.0 - fc) + v(r0, c1) * fc;
    let bottom = v(r1, c0) * (1.0 - fc) + v(r1, c1) * fc;

    top * (1.0 - fr) + bottom * fr
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn should_choose_nice_levels() {
        let levels = nice_levels(-3.2, 17.9, 8);
        assert_eq!(levels.first(), Some(&-5.0));
        assert_eq!(levels.last(), Some(&20.0));
        assert_relative_eq!(levels[1] - levels[0], 5.0);
        assert_eq!(levels.len(), 6);

        let moisture = nice_levels(0.12, 0.41, 8);
        assert!(moisture[0] <= 0.12);
        assert!(*moisture.last().unwrap() >= 0.41);
        assert_relative_eq!(moisture[1] - moisture[0], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn should_widen_constant_field() {
        assert_eq!(nice_levels(2.0, 2.0, 8), vec![1.5, 2.5]);
        assert!(nice_levels(f64::NAN, 1.0, 8).is_empty());
    }

    #[test]
    fn should_assign_bands() {
        let levels = [0.0, 1.0, 2.0];
        assert_eq!(band_index(&levels, -0.5), 0);
        assert_eq!(band_index(&levels, 0.0), 1);
        assert_eq!(band_index(&levels, 1.5), 2);
        assert_eq!(band_index(&levels, 9.0), 3);
    }

    #[test]
    fn should_compute_percentiles_ignoring_nan() {
        let values = [f32::NAN, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&values, 50.0).unwrap(), 3.0);
        assert_relative_eq!(percentile(&values, 0.0).unwrap(), 1.0);
        assert_relative_eq!(percentile(&values, 25.0).unwrap(), 2.0);
        assert_eq!(data_range(&values), Some((1.0, 5.0)));
        assert!(percentile(&[f32::NAN], 50.0).is_none());

        let (lo, hi) = robust_limits(&values).unwrap();
        assert!(lo > 1.0 && hi < 5.0);
    }

    #[test]
    fn should_locate_fractional_index() {
        let ascending = [0.0, 10.0, 20.0];
        assert_relative_eq!(fractional_index(&ascending, 15.0), 1.5);
        assert_relative_eq!(fractional_index(&ascending, -5.0), 0.0);
        assert_relative_eq!(fractional_index(&ascending, 25.0), 2.0);

        let descending = [-0.01, -0.05, -0.25];
        assert_relative_eq!(fractional_index(&descending, -0.03), 0.5);
    }

    #[test]
    fn should_interpolate_bilinearly() {
        let grid = array![[0.0f32, 10.0], [20.0, 30.0]];
        assert_relative_eq!(bilinear(&grid, 0.5, 0.5), 15.0);
        assert_relative_eq!(bilinear(&grid, 1.0, 0.0), 20.0);
        assert_relative_eq!(bilinear(&grid, 1.0, 1.0), 30.0);

        let holes = array![[0.0f32, f32::NAN], [20.0, 30.0]];
        assert!(bilinear(&holes, 0.5, 0.5).is_nan());
    }
}
