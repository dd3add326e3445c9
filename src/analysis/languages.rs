//! Language byte merging and percentage computation.

use crate::models::LanguageStats;
use std::collections::BTreeMap;

/// Round to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Convert a language → bytes map into percentage entries, largest first.
///
/// The byte total of the whole scope is computed first; percentages are
/// assigned in a second pass. Ties keep alphabetical order.
pub fn to_language_stats(bytes_by_language: &BTreeMap<String, u64>) -> Vec<LanguageStats> {
    let total: u64 = bytes_by_language.values().sum();

    let mut stats: Vec<LanguageStats> = bytes_by_language
        .iter()
        .map(|(language, &bytes)| LanguageStats {
            language: language.clone(),
            bytes,
            percentage: if total == 0 {
                0.0
            } else {
                round1(bytes as f64 / total as f64 * 100.0)
            },
        })
        .collect();

    stats.sort_by(|a, b| b.bytes.cmp(&a.bytes));
    stats
}

/// Running organization-wide language byte totals.
#[derive(Debug, Default)]
pub struct LanguageTotals {
    bytes: BTreeMap<String, u64>,
}

impl LanguageTotals {
    /// Add one repository's language bytes.
    pub fn add(&mut self, languages: &[LanguageStats]) {
        for lang in languages {
            *self.bytes.entry(lang.language.clone()).or_insert(0) += lang.bytes;
        }
    }

    /// Final percentage list.
    pub fn finish(&self) -> Vec<LanguageStats> {
        to_language_stats(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, u64)]) -> BTreeMap<String, u64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_percentages_sorted_by_bytes() {
        let stats = to_language_stats(&map(&[("JavaScript", 3000), ("Python", 5000)]));
        assert_eq!(stats[0].language, "Python");
        assert_eq!(stats[0].percentage, 62.5);
        assert_eq!(stats[1].language, "JavaScript");
        assert_eq!(stats[1].percentage, 37.5);
    }

    #[test]
    fn test_percentages_sum_to_about_hundred() {
        let stats = to_language_stats(&map(&[("A", 1), ("B", 1), ("C", 1)]));
        let sum: f64 = stats.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 0.5);
        assert_eq!(stats[0].percentage, 33.3);
    }

    #[test]
    fn test_empty_and_zero_bytes() {
        assert!(to_language_stats(&BTreeMap::new()).is_empty());
        let stats = to_language_stats(&map(&[("Empty", 0)]));
        assert_eq!(stats[0].percentage, 0.0);
    }

    #[test]
    fn test_totals_merge_across_repos() {
        let mut totals = LanguageTotals::default();
        totals.add(&to_language_stats(&map(&[("Rust", 600), ("Shell", 100)])));
        totals.add(&to_language_stats(&map(&[("Go", 200), ("Rust", 100)])));

        let merged = totals.finish();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].language, "Rust");
        assert_eq!(merged[0].bytes, 700);
        assert_eq!(merged[0].percentage, 70.0);
        assert_eq!(merged[1].language, "Go");
        assert_eq!(merged[2].language, "Shell");
    }
}
