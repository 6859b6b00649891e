use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A dot-separated numeric version such as `1.12.3`.
///
/// Parsing is total: every segment that is not a plain non-negative integer
/// counts as `0`, and an all-digit segment too large for `u64` saturates at
/// `u64::MAX`. Comparison, equality and hashing pad the shorter version with
/// zero segments, so `1.2` and `1.2.0` are the same version. The original
/// text is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VersionString {
    raw: String,
    segments: Vec<u64>,
}

impl VersionString {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = parse_segments(&raw);
        Self { raw, segments }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// True iff `self` sorts strictly before `other`.
    #[must_use]
    pub fn is_older_than(&self, other: &Self) -> bool {
        compare_segments(&self.segments, &other.segments) == Ordering::Less
    }

    fn significant_segments(&self) -> &[u64] {
        let len = self
            .segments
            .iter()
            .rposition(|&segment| segment != 0)
            .map_or(0, |idx| idx + 1);
        &self.segments[..len]
    }
}

/// Segment-wise "strictly older" check between two versions.
#[must_use]
pub fn is_older(a: &VersionString, b: &VersionString) -> bool {
    a.is_older_than(b)
}

fn parse_segments(raw: &str) -> Vec<u64> {
    raw.trim().split('.').map(parse_segment).collect()
}

fn parse_segment(segment: &str) -> u64 {
    let segment = segment.trim();
    match segment.parse::<u64>() {
        Ok(value) => value,
        Err(_) if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) => u64::MAX,
        Err(_) => 0,
    }
}

fn compare_segments(left: &[u64], right: &[u64]) -> Ordering {
    let len = left.len().max(right.len());
    for idx in 0..len {
        let l = left.get(idx).copied().unwrap_or(0);
        let r = right.get(idx).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
    }
    Ordering::Equal
}

impl PartialEq for VersionString {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionString {}

impl PartialOrd for VersionString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionString {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_segments(&self.segments, &other.segments)
    }
}

impl Hash for VersionString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant_segments().hash(state);
    }
}

impl std::fmt::Display for VersionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<String> for VersionString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for VersionString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<VersionString> for String {
    fn from(value: VersionString) -> Self {
        value.raw
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{VersionString, is_older};

    fn older(a: &str, b: &str) -> bool {
        is_older(&VersionString::new(a), &VersionString::new(b))
    }

    #[test]
    fn test_version_comparison() {
        assert!(older("1.2", "1.2.1"));
        assert!(older("1.9.9", "2.0.0"));
        assert!(older("1.0.0", "1.0.1"));
        assert!(older("1.2.9", "1.12.0"));
        assert!(!older("2.0.0", "1.9.9"));
        assert!(!older("1.0.0", "1.0.0"));
        assert!(!older("1.12.0", "1.2.9"));
    }

    #[test]
    fn trailing_zero_segments_are_equivalent() {
        assert!(!older("1.2", "1.2.0"));
        assert!(!older("1.2.0", "1.2"));
        assert!(!older("1", "1.0.0.0"));
        assert_eq!(VersionString::new("1.2"), VersionString::new("1.2.0"));
    }

    #[test]
    fn malformed_segments_count_as_zero() {
        assert!(older("1.x.0", "1.0.1"));
        assert_eq!(VersionString::new("1.x.0"), VersionString::new("1.0.0"));
        assert_eq!(VersionString::new("").segments(), &[0]);
        assert_eq!(VersionString::new("1..3").segments(), &[1, 0, 3]);
        assert_eq!(VersionString::new("2.3-beta").segments(), &[2, 0]);
    }

    #[test]
    fn leading_v_makes_the_first_segment_zero() {
        assert!(older("v2.0.0", "1.0.0"));
        assert_eq!(VersionString::new("v2.1").segments(), &[0, 1]);
        assert_eq!(VersionString::new("v2.0.0").as_str(), "v2.0.0");
    }

    #[test]
    fn oversized_segments_saturate_instead_of_zeroing() {
        assert!(!older("1.18446744073709551616", "1.1"));
        assert!(older("1.1", "1.18446744073709551616"));
        assert_eq!(
            VersionString::new("1.99999999999999999999999").segments(),
            &[1, u64::MAX]
        );
        assert_eq!(VersionString::new("1.-5").segments(), &[1, 0]);
    }

    #[test]
    fn ordering_is_irreflexive_and_transitive() {
        let samples = [
            "0", "0.1", "1", "1.0.1", "1.2", "1.2.0", "1.x.3", "1.10", "2.0.0", "10.0",
        ];
        let versions: Vec<VersionString> = samples.iter().map(|s| VersionString::new(*s)).collect();

        for a in &versions {
            assert!(!is_older(a, a), "{a} must not be older than itself");
            for b in &versions {
                for c in &versions {
                    if is_older(a, b) && is_older(b, c) {
                        assert!(is_older(a, c), "{a} < {b} < {c} must imply {a} < {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn hashing_agrees_with_equality() {
        let set: HashSet<VersionString> = ["1.2", "1.2.0", "1.2.0.0"]
            .into_iter()
            .map(VersionString::from)
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn serializes_as_original_text() {
        let version = VersionString::new("1.10");
        let json = serde_json::to_string(&version).expect("version should serialize");
        assert_eq!(json, "\"1.10\"");

        let parsed: VersionString = serde_json::from_str("\"1.10.0\"").expect("version should parse");
        assert_eq!(parsed, version);
        assert_eq!(parsed.as_str(), "1.10.0");
    }
}
