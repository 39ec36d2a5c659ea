//! Vector math over unit-norm embeddings.

/// Norms below this are treated as zero.
const ZERO_NORM: f32 = 1e-10;

/// Compute L2 norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity of two unit-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    dot(a, b)
}

/// Cosine distance of two unit-norm vectors.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Scale to unit length. Zero vectors are returned unchanged.
pub fn normalized(mut v: Vec<f32>) -> Vec<f32> {
    let norm = l2_norm(&v);
    if norm > ZERO_NORM {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

/// Arithmetic mean of `vectors`, re-normalized to unit length.
///
/// Returns `None` for an empty input, mismatched dimensions, or a mean that is
/// numerically zero (e.g. two opposite vectors).
pub fn centroid<'a, I>(vectors: I) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut iter = vectors.into_iter();
    let first = iter.next()?;
    let mut sum = first.to_vec();
    let mut count = 1usize;

    for v in iter {
        if v.len() != sum.len() {
            return None;
        }
        sum.iter_mut().zip(v).for_each(|(s, x)| *s += x);
        count += 1;
    }

    let mean: Vec<f32> = sum.into_iter().map(|s| s / count as f32).collect();
    if l2_norm(&mean) <= ZERO_NORM {
        return None;
    }

    Some(normalized(mean))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_have_similarity_one() {
        let v = normalized(vec![0.3, 0.4, 0.5]);
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_distance(&[1.0, 0.0], &[0.0, 1.0]), 1.0);
    }

    #[test]
    fn test_normalized_has_unit_norm() {
        let v = normalized(vec![3.0, 4.0]);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_zero_vector() {
        assert_eq!(normalized(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_centroid_is_unit_mean() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let c = centroid([&a[..], &b[..]]).unwrap();
        let expected = 1.0 / 2f32.sqrt();
        assert!((c[0] - expected).abs() < 1e-6);
        assert!((c[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_centroid_of_single_vector() {
        let a = [0.0, 1.0, 0.0];
        assert_eq!(centroid([&a[..]]).unwrap(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_centroid_empty_and_zero() {
        let empty: Vec<&[f32]> = vec![];
        assert!(centroid(empty).is_none());

        let a = [1.0, 0.0];
        let b = [-1.0, 0.0];
        assert!(centroid([&a[..], &b[..]]).is_none());
    }

    #[test]
    fn test_centroid_dimension_mismatch() {
        let a = [1.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        assert!(centroid([&a[..], &b[..]]).is_none());
    }
}
