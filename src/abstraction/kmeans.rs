use rand::rngs::SmallRng;
use rand::Rng;
use rayon::iter::IndexedParallelIterator;
use rayon::iter::IntoParallelRefIterator;
use rayon::iter::ParallelIterator;

/// Lloyd's algorithm with kmeans++ seeding. deterministic given the rng
/// and the point order; assignment is data-parallel via rayon.
pub fn fit(points: &[Vec<f32>], k: usize, iterations: usize, rng: &mut SmallRng) -> Vec<Vec<f32>> {
    assert!(!points.is_empty(), "no points to cluster");
    let k = k.min(points.len());
    let mut centers = seed(points, k, rng);
    for _ in 0..iterations {
        let assignment = points
            .par_iter()
            .map(|p| nearest(&centers, p))
            .collect::<Vec<_>>();
        let mut sums = vec![vec![0f64; points[0].len()]; k];
        let mut counts = vec![0usize; k];
        for (point, &j) in points.iter().zip(assignment.iter()) {
            counts[j] += 1;
            for (s, x) in sums[j].iter_mut().zip(point.iter()) {
                *s += *x as f64;
            }
        }
        for (j, center) in centers.iter_mut().enumerate() {
            if counts[j] == 0 {
                // re-seed an empty cluster onto the point farthest from
                // its current center
                let lost = points
                    .par_iter()
                    .map(|p| distance(p, &center[..]))
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.partial_cmp(b).expect("not NaN"))
                    .map(|(i, _)| i)
                    .expect("points are nonempty");
                *center = points[lost].clone();
            } else {
                for (c, s) in center.iter_mut().zip(sums[j].iter()) {
                    *c = (*s / counts[j] as f64) as f32;
                }
            }
        }
    }
    centers
}

/// index of the nearest center
pub fn nearest(centers: &[Vec<f32>], point: &[f32]) -> usize {
    centers
        .iter()
        .enumerate()
        .map(|(i, c)| (i, distance(point, c)))
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).expect("not NaN"))
        .map(|(i, _)| i)
        .expect("at least one center")
}

fn distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// kmeans++: first center uniform, then proportional to squared
/// distance from the nearest chosen center
fn seed(points: &[Vec<f32>], k: usize, rng: &mut SmallRng) -> Vec<Vec<f32>> {
    let mut centers = vec![points[rng.random_range(0..points.len())].clone()];
    while centers.len() < k {
        let weights = points
            .par_iter()
            .map(|p| distance(p, &centers[nearest(&centers, p)]))
            .collect::<Vec<_>>();
        let total = weights.iter().sum::<f32>();
        if total <= 0.0 {
            centers.push(points[rng.random_range(0..points.len())].clone());
            continue;
        }
        let mut roll = rng.random::<f32>() * total;
        let mut chosen = points.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            roll -= w;
            if roll <= 0.0 {
                chosen = i;
                break;
            }
        }
        centers.push(points[chosen].clone());
    }
    centers
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn blobs() -> Vec<Vec<f32>> {
        // two well-separated clusters on a line
        (0..32)
            .map(|i| vec![if i % 2 == 0 { 0.0 } else { 10.0 } + (i % 4) as f32 * 0.01])
            .collect()
    }

    #[test]
    fn separates_obvious_clusters() {
        let points = blobs();
        let centers = fit(&points, 2, 16, &mut SmallRng::seed_from_u64(3));
        let mut means = centers.iter().map(|c| c[0]).collect::<Vec<_>>();
        means.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!(means[0] < 1.0, "low cluster at {}", means[0]);
        assert!(means[1] > 9.0, "high cluster at {}", means[1]);
    }

    #[test]
    fn deterministic_given_seed() {
        let points = blobs();
        let a = fit(&points, 4, 8, &mut SmallRng::seed_from_u64(9));
        let b = fit(&points, 4, 8, &mut SmallRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn caps_k_at_point_count() {
        let points = vec![vec![1.0], vec![2.0]];
        let centers = fit(&points, 8, 4, &mut SmallRng::seed_from_u64(1));
        assert_eq!(centers.len(), 2);
    }
}
