//! Group-by accumulators and ordering helpers.
//!
//! The query modules bucket rows into ordered maps keyed by their group-by
//! columns and fold each bucket with the accumulators defined here. Every
//! derived ratio goes through [`percentage`] or [`MeanAccumulator::mean`],
//! which refuse to divide by zero.

use super::AnalysisError;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Running count and sum of one numeric column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    pub count: usize,
    pub sum: f64,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    /// Arithmetic mean; an empty accumulator is an invalid state.
    pub fn mean(&self) -> Result<f64, AnalysisError> {
        if self.count == 0 {
            return Err(AnalysisError::InvalidAggregationState(
                "mean of an empty group".to_string(),
            ));
        }
        Ok(self.sum / self.count as f64)
    }
}

impl FromIterator<f64> for MeanAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::default();
        for value in iter {
            acc.push(value);
        }
        acc
    }
}

/// `part / total * 100`.
pub fn percentage(part: usize, total: usize) -> Result<f64, AnalysisError> {
    if total == 0 {
        return Err(AnalysisError::InvalidAggregationState(format!(
            "percentage of {} over zero respondents",
            part
        )));
    }
    if part > total {
        return Err(AnalysisError::InvalidAggregationState(format!(
            "{} exceeds group size {}",
            part, total
        )));
    }
    Ok(part as f64 / total as f64 * 100.0)
}

/// Group keyed rows, keeping insertion order within each group.
pub fn group_rows<K, T, I>(rows: I) -> BTreeMap<K, Vec<T>>
where
    K: Ord,
    I: IntoIterator<Item = (K, T)>,
{
    let mut grouped: BTreeMap<K, Vec<T>> = BTreeMap::new();

    for (key, row) in rows {
        grouped.entry(key).or_default().push(row);
    }

    grouped
}

/// Order two finite floats from largest to smallest.
pub fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Keep the first `n` items.
pub fn top_n<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    items.truncate(n);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_accumulator() {
        let mut acc = MeanAccumulator::default();
        acc.push(100.0);
        acc.push(200.0);
        assert_eq!(acc.count, 2);
        assert_eq!(acc.mean().unwrap(), 150.0);

        let collected: MeanAccumulator = vec![1.0, 2.0, 6.0].into_iter().collect();
        assert_eq!(collected.mean().unwrap(), 3.0);
    }

    #[test]
    fn test_empty_mean_is_invalid() {
        assert!(matches!(
            MeanAccumulator::default().mean(),
            Err(AnalysisError::InvalidAggregationState(_))
        ));
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4).unwrap(), 25.0);
        assert_eq!(percentage(0, 3).unwrap(), 0.0);
        assert_eq!(percentage(3, 3).unwrap(), 100.0);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert!(matches!(
            percentage(0, 0),
            Err(AnalysisError::InvalidAggregationState(_))
        ));
        assert!(percentage(2, 1).is_err());
    }

    #[test]
    fn test_group_rows() {
        let rows = vec![("b", 5.0), ("a", 1.0), ("a", 3.0)];
        let grouped = group_rows(rows);

        let keys: Vec<_> = grouped.keys().copied().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(grouped["a"], vec![1.0, 3.0]);
        assert_eq!(grouped["b"], vec![5.0]);
    }

    #[test]
    fn test_descending() {
        let mut values = vec![1.0, 3.0, 2.0];
        values.sort_by(|a, b| descending(*a, *b));
        assert_eq!(values, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_top_n() {
        assert_eq!(top_n(vec![1, 2, 3], 2), vec![1, 2]);
        assert_eq!(top_n(vec![1], 5), vec![1]);
    }
}
