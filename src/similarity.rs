//! Vector similarity helpers shared by indexing and search.

/// Cosine similarity `dot(a, b) / (|a| * |b|)`.
///
/// Returns 0.0 when either vector has zero magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x64 = f64::from(x);
        let y64 = f64::from(y);
        dot += x64 * y64;
        norm_a += x64 * x64;
        norm_b += y64 * y64;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Score every candidate against `query` and keep the `top_k` best, highest first.
///
/// The sort is stable, so equal scores keep candidate order.
pub fn rank_top_k<T, F>(query: &[f32], candidates: Vec<T>, top_k: usize, vector_of: F) -> Vec<(T, f32)>
where
    F: Fn(&T) -> Option<&[f32]>,
{
    let mut scored: Vec<(T, f32)> = candidates
        .into_iter()
        .map(|candidate| {
            let score = vector_of(&candidate)
                .map(|vector| cosine_similarity(query, vector))
                .unwrap_or(0.0);
            (candidate, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);
    scored
}
