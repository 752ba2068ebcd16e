//! Exhaustive (brute-force) similarity scan.

use facehub_types::{Embedding, FeatureRecord};

/// Scan every record and return the one most similar to the query.
///
/// O(n * d). Ties on bitwise-equal similarity go to the lowest key, so the
/// result is deterministic regardless of enumeration order.
pub fn best_match<'a, I>(records: I, query: &Embedding) -> Option<(&'a FeatureRecord, f32)>
where
    I: IntoIterator<Item = &'a FeatureRecord>,
{
    let mut best: Option<(&FeatureRecord, f32)> = None;
    for record in records {
        let similarity = query.cosine_similarity(&record.vector);
        best = match best {
            None => Some((record, similarity)),
            Some((cur, cur_sim)) => {
                if similarity > cur_sim || (similarity == cur_sim && record.key < cur.key) {
                    Some((record, similarity))
                } else {
                    Some((cur, cur_sim))
                }
            }
        };
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use facehub_types::PrimaryKey;

    fn record(key: PrimaryKey, values: Vec<f32>) -> FeatureRecord {
        FeatureRecord::new(key, Embedding::new(values), None)
    }

    #[test]
    fn test_finds_most_similar() {
        let records = vec![
            record(1, vec![1.0, 0.0]),
            record(2, vec![0.0, 1.0]),
            record(3, vec![0.9, 0.1]),
        ];
        let query = Embedding::new(vec![1.0, 0.0]);

        let (best, sim) = best_match(&records, &query).unwrap();
        assert_eq!(best.key, 1);
        assert!((sim - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_tie_break_lowest_key() {
        // Identical vectors under different keys, inserted high key first
        let records = vec![
            record(7, vec![1.0, 0.0]),
            record(3, vec![1.0, 0.0]),
            record(5, vec![1.0, 0.0]),
        ];
        let query = Embedding::new(vec![1.0, 0.0]);

        let (best, _) = best_match(&records, &query).unwrap();
        assert_eq!(best.key, 3);
    }

    #[test]
    fn test_empty_yields_none() {
        let records: Vec<FeatureRecord> = Vec::new();
        let query = Embedding::new(vec![1.0, 0.0]);
        assert!(best_match(&records, &query).is_none());
    }
}
