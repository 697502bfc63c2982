//! Cosine similarity and ranking.

use crate::adr::AdrRecord;

/// An ADR matched by a query, with its score.
#[derive(Clone, Copy, Debug)]
pub struct SimilarityHit<'a> {
    /// Matched record.
    pub adr: &'a AdrRecord,
    /// Cosine similarity to the query.
    pub score: f64,
}

/// Cosine similarity computed in `f64`.
///
/// Returns 0 when the vectors differ in length or either has zero norm, so
/// ranking never sees NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank `records` against `query`: keep scores `>= threshold`, sort
/// descending (stable, so ties keep record order), and keep at most `top_k`.
pub fn rank<'a>(
    records: &'a [AdrRecord],
    query: &[f32],
    threshold: f64,
    top_k: usize,
) -> Vec<SimilarityHit<'a>> {
    let mut hits: Vec<SimilarityHit<'a>> = records
        .iter()
        .map(|adr| SimilarityHit {
            adr,
            score: cosine_similarity(query, &adr.embedding),
        })
        .filter(|hit| hit.score >= threshold)
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(top_k);
    hits
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    fn record(id: &str, embedding: Vec<f32>) -> AdrRecord {
        AdrRecord {
            id: id.into(),
            embedding,
            ..AdrRecord::default()
        }
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.3, -0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < EPSILON);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < EPSILON);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn rank_filters_sorts_and_truncates() {
        let records = vec![
            record("low", vec![0.0, 1.0]),
            record("high", vec![1.0, 0.0]),
            record("mid", vec![1.0, 1.0]),
        ];
        let hits = rank(&records, &[1.0, 0.0], 0.5, 10);
        let ids: Vec<&str> = hits.iter().map(|h| h.adr.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid"]);

        let hits = rank(&records, &[1.0, 0.0], 0.0, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].adr.id, "high");
    }

    #[test]
    fn rank_ties_keep_record_order() {
        let records = vec![
            record("a", vec![1.0, 0.0]),
            record("b", vec![2.0, 0.0]),
            record("c", vec![3.0, 0.0]),
        ];
        let hits = rank(&records, &[1.0, 0.0], 0.0, 3);
        let ids: Vec<&str> = hits.iter().map(|h| h.adr.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn zero_threshold_excludes_negative_scores() {
        let records = vec![record("neg", vec![-1.0, 0.0])];
        assert!(rank(&records, &[1.0, 0.0], 0.0, 3).is_empty());
    }

    fn vector(len: usize) -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(-100.0f32..100.0, len)
    }

    proptest! {
        #[test]
        fn cosine_is_symmetric((a, b) in (1usize..32).prop_flat_map(|n| (vector(n), vector(n)))) {
            let ab = cosine_similarity(&a, &b);
            let ba = cosine_similarity(&b, &a);
            prop_assert!(!ab.is_nan());
            prop_assert!((ab - ba).abs() < EPSILON);
            prop_assert!((-1.0 - EPSILON..=1.0 + EPSILON).contains(&ab));
        }

        #[test]
        fn ranking_is_ordered_and_bounded(
            embeddings in prop::collection::vec(vector(4), 0..20),
            query in vector(4),
            threshold in -1.0f64..1.0,
            top_k in 0usize..6,
        ) {
            let records: Vec<AdrRecord> = embeddings
                .into_iter()
                .enumerate()
                .map(|(i, e)| record(&i.to_string(), e))
                .collect();
            let hits = rank(&records, &query, threshold, top_k);
            prop_assert!(hits.len() <= top_k);
            prop_assert!(hits.iter().all(|h| h.score >= threshold));
            prop_assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }
}
