//! Derived tables for the dashboard.
//!
//! Three independent aggregations over the prompt log: message counts per
//! time bucket, a prompt-length histogram, and the most frequent words.
//! Each is a pure function of its input; the caller reads the log once and
//! feeds the same records to all three.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::log_store::LogRecord;

/// Width of one prompt-length histogram bin, in characters.
const BIN_WIDTH: usize = 5;

/// How many words `top_words` returns by default.
pub const DEFAULT_TOP_WORDS: usize = 10;

/// Truncation resolution applied to timestamps before bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Minute,
    Hour,
    Date,
}

/// A truncated timestamp. Minute and hour buckets stay datetimes (seconds,
/// and for hours also minutes, zeroed); date buckets collapse to a calendar
/// date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BucketKey {
    Minute(NaiveDateTime),
    Hour(NaiveDateTime),
    Date(NaiveDate),
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Minute(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M")),
            BucketKey::Hour(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:00")),
            BucketKey::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl Granularity {
    fn bucket(self, ts: NaiveDateTime) -> BucketKey {
        match self {
            Granularity::Minute => BucketKey::Minute(ts.with_second(0).unwrap_or(ts)),
            Granularity::Hour => BucketKey::Hour(
                ts.with_second(0)
                    .and_then(|t| t.with_minute(0))
                    .unwrap_or(ts),
            ),
            Granularity::Date => BucketKey::Date(ts.date()),
        }
    }
}

/// One point of the message-count time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub key: String,
    pub count: u64,
}

/// One bar of the prompt-length histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthBin {
    pub label: String,
    pub count: u64,
}

/// One entry of the top-words table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Count records per time bucket at the given granularity.
///
/// Output is sparse (no zero-count buckets are synthesized) and ascending
/// by bucket key. Records whose timestamp does not parse are silently
/// excluded; a partially corrupt log still produces a chart.
pub fn message_counts(records: &[LogRecord], granularity: Granularity) -> Vec<TimeBucket> {
    let mut counts: BTreeMap<BucketKey, u64> = BTreeMap::new();
    for record in records {
        let Some(ts) = record.parse_timestamp() else {
            continue;
        };
        *counts.entry(granularity.bucket(ts)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(key, count)| TimeBucket {
            key: key.to_string(),
            count,
        })
        .collect()
}

/// Bucket texts by character length into fixed-width bins.
///
/// Bins are `[0,5)`, `[5,10)`, ... up through the bin containing the
/// longest text, labeled `1–5`, `6–10`, and so on. Intermediate empty bins
/// are kept so the bins partition the whole length range.
pub fn length_histogram(texts: &[String]) -> Vec<LengthBin> {
    let lengths: Vec<usize> = texts.iter().map(|t| t.chars().count()).collect();
    let Some(&max) = lengths.iter().max() else {
        return Vec::new();
    };
    let mut counts = vec![0u64; max / BIN_WIDTH + 1];
    for len in lengths {
        counts[len / BIN_WIDTH] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(bin, count)| {
            let lo = bin * BIN_WIDTH;
            LengthBin {
                label: format!("{}–{}", lo + 1, lo + BIN_WIDTH),
                count,
            }
        })
        .collect()
}

/// The `k` most frequent whitespace-separated tokens across all texts.
///
/// Tokens are compared by exact string equality; no case folding or
/// punctuation stripping. Ties are broken by first appearance across the
/// concatenation of the texts in order.
pub fn top_words(texts: &[String], k: usize) -> Vec<WordCount> {
    let mut counts: HashMap<&str, (u64, usize)> = HashMap::new();
    let mut next_rank = 0usize;
    for text in texts {
        for token in text.split_whitespace() {
            counts
                .entry(token)
                .and_modify(|entry| entry.0 += 1)
                .or_insert_with(|| {
                    next_rank += 1;
                    (1, next_rank)
                });
        }
    }
    let mut ranked: Vec<(&str, u64, usize)> = counts
        .into_iter()
        .map(|(word, (count, first_seen))| (word, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(k);
    ranked
        .into_iter()
        .map(|(word, count, _)| WordCount {
            word: word.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: &str, text: &str) -> LogRecord {
        LogRecord {
            timestamp: timestamp.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_minute_buckets() {
        let records = vec![
            record("2024-01-01 10:00:00", "hi there"),
            record("2024-01-01 10:00:30", "hi again friend"),
            record("2024-01-01 11:05:00", "bye"),
        ];
        let buckets = message_counts(&records, Granularity::Minute);
        assert_eq!(
            buckets,
            vec![
                TimeBucket { key: "2024-01-01 10:00".into(), count: 2 },
                TimeBucket { key: "2024-01-01 11:05".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_hour_and_date_buckets() {
        let records = vec![
            record("2024-01-01 10:00:00", "a"),
            record("2024-01-01 10:59:59", "b"),
            record("2024-01-02 00:00:01", "c"),
        ];
        let by_hour = message_counts(&records, Granularity::Hour);
        assert_eq!(
            by_hour,
            vec![
                TimeBucket { key: "2024-01-01 10:00".into(), count: 2 },
                TimeBucket { key: "2024-01-02 00:00".into(), count: 1 },
            ]
        );
        let by_date = message_counts(&records, Granularity::Date);
        assert_eq!(
            by_date,
            vec![
                TimeBucket { key: "2024-01-01".into(), count: 2 },
                TimeBucket { key: "2024-01-02".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_malformed_timestamps_are_skipped() {
        let records = vec![
            record("garbage", "still counts for words"),
            record("2024-01-01 10:00:00", "ok"),
        ];
        let buckets = message_counts(&records, Granularity::Minute);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 1);
    }

    #[test]
    fn test_bucket_counts_conserve_valid_records() {
        let records = vec![
            record("2024-03-05 08:01:02", "a"),
            record("2024-03-05 08:01:59", "b"),
            record("bad", "c"),
            record("2024-03-06 23:59:59", "d"),
        ];
        for granularity in [Granularity::Minute, Granularity::Hour, Granularity::Date] {
            let total: u64 = message_counts(&records, granularity)
                .iter()
                .map(|b| b.count)
                .sum();
            assert_eq!(total, 3, "{granularity:?}");
        }
    }

    #[test]
    fn test_empty_records_empty_output() {
        assert!(message_counts(&[], Granularity::Minute).is_empty());
        assert!(length_histogram(&[]).is_empty());
        assert!(top_words(&[], 10).is_empty());
    }

    #[test]
    fn test_length_histogram_bins_and_labels() {
        let texts = vec![
            "ab".to_string(),        // len 2 -> bin 1–5
            "hello".to_string(),     // len 5 -> bin 6–10
            "hello world".to_string(), // len 11 -> bin 11–15
        ];
        let bins = length_histogram(&texts);
        assert_eq!(
            bins,
            vec![
                LengthBin { label: "1–5".into(), count: 1 },
                LengthBin { label: "6–10".into(), count: 1 },
                LengthBin { label: "11–15".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_length_histogram_counts_sum_to_total() {
        let texts: Vec<String> = ["x", "four", "exactly25characterslong!!", "mid size"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let bins = length_histogram(&texts);
        let total: u64 = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, texts.len() as u64);
        // Longest text (25 chars) lands inside the last bin, not past it.
        assert_eq!(bins.last().unwrap().label, "26–30");
        assert_eq!(bins.last().unwrap().count, 1);
    }

    #[test]
    fn test_length_histogram_keeps_intermediate_empty_bins() {
        let texts = vec!["ab".to_string(), "a".repeat(12)];
        let bins = length_histogram(&texts);
        assert_eq!(bins.len(), 3);
        assert_eq!(bins[1].label, "6–10");
        assert_eq!(bins[1].count, 0);
    }

    #[test]
    fn test_top_words_ranking_and_ties() {
        let texts = vec![
            "hi there".to_string(),
            "hi again friend".to_string(),
            "bye".to_string(),
        ];
        let words = top_words(&texts, 2);
        assert_eq!(words[0], WordCount { word: "hi".into(), count: 2 });
        // All remaining words are count 1; "there" appeared first.
        assert_eq!(words[1], WordCount { word: "there".into(), count: 1 });
    }

    #[test]
    fn test_top_words_never_exceeds_k() {
        let texts = vec!["a b c d e f g h i j k l".to_string()];
        assert_eq!(top_words(&texts, 10).len(), 10);
        assert_eq!(top_words(&texts, 3).len(), 3);
    }

    #[test]
    fn test_top_words_exact_match_no_folding() {
        let texts = vec!["Hi hi Hi".to_string()];
        let words = top_words(&texts, 10);
        assert_eq!(words[0], WordCount { word: "Hi".into(), count: 2 });
        assert_eq!(words[1], WordCount { word: "hi".into(), count: 1 });
    }
}
