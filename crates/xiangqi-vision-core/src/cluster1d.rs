//! Deterministic k-means on scalar observations.

use log::debug;

/// Cluster `values` into exactly `k` groups and return the centers in
/// ascending order.
///
/// Initialisation is farthest-point: the smallest value first, then
/// repeatedly the value farthest from every chosen center. Lloyd iterations
/// follow until assignments stop changing or `max_iters` is hit.
///
/// With `k` or fewer distinct values every value becomes its own center and
/// the remaining centers repeat the largest one, so the outermost centers are
/// still the extremes of the data.
///
/// Returns `None` when `k == 0` or there is no finite value.
pub fn kmeans_1d(values: &[f32], k: usize, max_iters: usize) -> Option<Vec<f32>> {
    if k == 0 {
        return None;
    }
    let mut finite: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    finite.sort_by(|a, b| a.total_cmp(b));
    let mut distinct = finite.clone();
    distinct.dedup();
    let largest = *distinct.last()?;
    if distinct.len() <= k {
        if distinct.len() < k {
            debug!(
                "kmeans_1d: {} distinct values for k = {k}, repeating {largest}",
                distinct.len()
            );
        }
        let mut centers = distinct;
        centers.resize(k, largest);
        return Some(centers);
    }

    let mut centers = Vec::with_capacity(k);
    centers.push(distinct[0]);
    while centers.len() < k {
        let next = distinct
            .iter()
            .copied()
            .map(|v| (v, nearest(&centers, v).1))
            .fold((f32::NAN, -1.0f32), |best, cand| {
                if cand.1 > best.1 {
                    cand
                } else {
                    best
                }
            });
        centers.push(next.0);
    }
    centers.sort_by(|a, b| a.total_cmp(b));

    let mut labels = vec![usize::MAX; finite.len()];
    for iter in 0..max_iters.max(1) {
        let mut changed = false;
        for (label, &v) in labels.iter_mut().zip(&finite) {
            let (c, _) = nearest(&centers, v);
            if *label != c {
                *label = c;
                changed = true;
            }
        }
        if !changed {
            debug!("kmeans_1d: converged after {iter} iterations");
            break;
        }

        let mut sums = vec![0.0f64; k];
        let mut counts = vec![0usize; k];
        for (&label, &v) in labels.iter().zip(&finite) {
            sums[label] += v as f64;
            counts[label] += 1;
        }
        for c in 0..k {
            // Empty clusters keep their previous center.
            if counts[c] > 0 {
                centers[c] = (sums[c] / counts[c] as f64) as f32;
            }
        }
    }

    centers.sort_by(|a, b| a.total_cmp(b));
    Some(centers)
}

/// Index of and distance to the closest center; ties go to the lower index.
fn nearest(centers: &[f32], v: f32) -> (usize, f32) {
    let mut best = (0usize, f32::INFINITY);
    for (i, &c) in centers.iter().enumerate() {
        let d = (v - c).abs();
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn recovers_well_separated_groups() {
        let mut values = Vec::new();
        for (i, base) in [10.0f32, 60.0, 110.0, 160.0].iter().enumerate() {
            // Uneven group sizes: a fragmented line contributes many endpoints.
            for j in 0..(2 + 3 * i) {
                values.push(base + (j % 3) as f32 - 1.0);
            }
        }
        let centers = kmeans_1d(&values, 4, 50).expect("centers");
        assert_eq!(centers.len(), 4);
        for (c, expected) in centers.iter().zip([10.0f32, 60.0, 110.0, 160.0]) {
            assert_abs_diff_eq!(*c, expected, epsilon = 1.0);
        }
        assert!(centers.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn too_few_distinct_values_repeat_the_largest() {
        let centers = kmeans_1d(&[7.0, 5.0, 5.0, 7.0], 4, 10).expect("centers");
        assert_eq!(centers, vec![5.0, 7.0, 7.0, 7.0]);
        assert_eq!(kmeans_1d(&[4.0, 4.0], 3, 10), Some(vec![4.0, 4.0, 4.0]));
    }

    #[test]
    fn no_usable_values_fails() {
        assert!(kmeans_1d(&[], 1, 10).is_none());
        assert!(kmeans_1d(&[f32::NAN, f32::INFINITY], 2, 10).is_none());
        assert!(kmeans_1d(&[1.0, 2.0], 0, 10).is_none());
    }

    #[test]
    fn k_equal_to_distinct_count_returns_the_values() {
        let centers = kmeans_1d(&[3.0, 1.0, 2.0, 3.0], 3, 10).expect("centers");
        assert_eq!(centers, vec![1.0, 2.0, 3.0]);
    }
}
