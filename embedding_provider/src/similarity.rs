/// Cosine similarity of two vectors.
///
/// Returns `0.0` when the dimensions differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0f64;
    let mut norm_a = 0f64;
    let mut norm_b = 0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Similarity of `query` against every vector in `others`, index-aligned.
pub fn cosine_similarities(query: &[f32], others: &[Vec<f32>]) -> Vec<f32> {
    others.iter().map(|v| cosine_similarity(query, v)).collect()
}
