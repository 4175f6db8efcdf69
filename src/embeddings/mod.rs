pub mod provider;

pub use provider::{EmbeddingProvider, HashEmbedder};

/// Dimension of every vector the default provider produces.
pub const EMBEDDING_DIM: usize = 64;

/// Squared Euclidean (L2) distance between two vectors of equal length.
///
/// Not square-rooted, matching what a flat L2 index reports; ordering is the
/// same as for the true Euclidean distance.
pub fn squared_l2_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
}

/// Convert the distances of one knn result set into relative similarities.
///
/// Each score is `1 - distance / max`, where `max` is the largest distance in
/// this result set. When `max` is zero every score is zero. Scores are only
/// meaningful within a single query.
pub fn relative_similarities(distances: &[f32]) -> Vec<f32> {
    let max_distance = distances.iter().copied().fold(0.0_f32, f32::max);

    distances
        .iter()
        .map(|d| {
            if max_distance > 0.0 {
                1.0 - d / max_distance
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_l2_distance_identical_is_zero() {
        let v = vec![1.0, -2.0, 3.5];
        assert_eq!(squared_l2_distance(&v, &v), 0.0);
    }

    #[test]
    fn test_squared_l2_distance_is_not_rooted() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert!((squared_l2_distance(&a, &b) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_relative_similarities_farthest_is_zero() {
        let scores = relative_similarities(&[1.0, 2.0, 4.0]);
        assert!((scores[0] - 0.75).abs() < 1e-6);
        assert!((scores[1] - 0.5).abs() < 1e-6);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_relative_similarities_all_zero_distance() {
        let scores = relative_similarities(&[0.0, 0.0]);
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn test_relative_similarities_empty() {
        assert!(relative_similarities(&[]).is_empty());
    }
}
