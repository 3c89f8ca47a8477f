//! Embedding vector utilities shared by the vector store backends.

use aerobrain_core::retrieval::SearchHit;

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm < 1e-10 {
        return v.to_vec();
    }
    v.iter().map(|x| (*x as f64 / norm) as f32).collect()
}

/// Euclidean distance between two vectors.
///
/// Returns `None` when the dimensions differ or either vector is empty.
pub fn l2_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum();
    Some(sum.sqrt() as f32)
}

/// Serialize an embedding vector to little-endian bytes.
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Inverse of [`embedding_to_blob`]; trailing partial values are ignored.
pub fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Sort hits by ascending distance and keep the closest `top_k`.
pub fn nearest(mut hits: Vec<SearchHit>, top_k: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(top_k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerobrain_core::DocumentMetadata;

    fn hit(content: &str, distance: f32) -> SearchHit {
        SearchHit {
            content: content.into(),
            metadata: DocumentMetadata::default(),
            distance,
        }
    }

    #[test]
    fn normalize_produces_unit_vector() {
        let n = normalize(&[3.0, 4.0]);
        assert!((n[0] - 0.6).abs() < 1e-6);
        assert!((n[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_zero_vector_is_noop() {
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn distance_between_normalized_vectors_is_bounded() {
        let a = normalize(&[1.0, 0.0]);
        let b = normalize(&[-1.0, 0.0]);
        assert!((l2_distance(&a, &b).unwrap() - 2.0).abs() < 1e-6);
        assert_eq!(l2_distance(&a, &a), Some(0.0));
    }

    #[test]
    fn distance_dimension_mismatch() {
        assert!(l2_distance(&[1.0], &[1.0, 2.0]).is_none());
        assert!(l2_distance(&[], &[]).is_none());
    }

    #[test]
    fn blob_roundtrip() {
        let v = vec![0.25, -1.5, 3.0];
        assert_eq!(blob_to_embedding(&embedding_to_blob(&v)), v);
    }

    #[test]
    fn nearest_orders_and_truncates() {
        let hits = vec![hit("far", 1.2), hit("near", 0.1), hit("mid", 0.5)];
        let top = nearest(hits, 2);
        let order: Vec<_> = top.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(order, ["near", "mid"]);
    }
}
