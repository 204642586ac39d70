//! Version parsing, ordering, and version selectors.
//!
//! Ordering rules:
//! - Versions split into segments on `.` and `-` and at every digit/letter
//!   transition (`1.0rc1` is `1`, `0`, `rc`, `1`)
//! - Numeric segments compare as numbers
//! - Known qualifiers have a fixed order:
//!   `alpha` < `beta` < `milestone` < `rc` < `snapshot` < `""`/`ga`/`final` (release) < `sp`
//! - Unknown text compares case-insensitively, below numbers and below a release
//! - Missing trailing segments count as `0`/release, so `1.0 == 1.0.0`
//!
//! A [`VersionSelector`] is what a declaration asks for: an exact version, a
//! range (`[1.0,2.0)`), a prefix (`1.+`), or nothing at all.

use std::cmp::Ordering;
use std::fmt;

/// A parsed version with comparable segments.
#[derive(Debug, Clone)]
pub struct Version {
    pub original: String,
    segments: Vec<Segment>,
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Qualifier(QualifierKind),
    Text(String),
}

/// Well-known qualifiers with defined ordering.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum QualifierKind {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl Version {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.to_string(),
            segments: parse_segments(version),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.to_ascii_uppercase().ends_with("-SNAPSHOT")
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.segments.len().max(other.segments.len());
        for i in 0..max_len {
            let ord = compare_segments(self.segments.get(i), other.segments.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_segments(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(s), None) => compare_segment_to_empty(s),
        (None, Some(s)) => compare_segment_to_empty(s).reverse(),
        (Some(a), Some(b)) => compare_two_segments(a, b),
    }
}

fn compare_segment_to_empty(seg: &Segment) -> Ordering {
    match seg {
        Segment::Numeric(n) => n.cmp(&0),
        Segment::Qualifier(q) => q.cmp(&QualifierKind::Release),
        Segment::Text(_) => Ordering::Less,
    }
}

fn compare_two_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
        (Segment::Qualifier(a), Segment::Qualifier(b)) => a.cmp(b),
        (Segment::Numeric(_), _) => Ordering::Greater,
        (_, Segment::Numeric(_)) => Ordering::Less,
        (Segment::Text(a), Segment::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Segment::Qualifier(q), Segment::Text(_)) => {
            if *q >= QualifierKind::Release {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Segment::Text(_), Segment::Qualifier(q)) => {
            if *q >= QualifierKind::Release {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

fn parse_segments(version: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for ch in version.chars() {
        if ch == '.' || ch == '-' {
            if !current.is_empty() {
                segments.push(classify(&current));
                current.clear();
            }
            continue;
        }
        let transition = current
            .chars()
            .last()
            .is_some_and(|last| last.is_ascii_digit() != ch.is_ascii_digit());
        if transition {
            segments.push(classify(&current));
            current.clear();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        segments.push(classify(&current));
    }

    segments
}

fn classify(token: &str) -> Segment {
    if let Ok(n) = token.parse::<u64>() {
        return Segment::Numeric(n);
    }
    match token.to_lowercase().as_str() {
        "alpha" | "a" => Segment::Qualifier(QualifierKind::Alpha),
        "beta" | "b" => Segment::Qualifier(QualifierKind::Beta),
        "milestone" | "m" => Segment::Qualifier(QualifierKind::Milestone),
        "rc" | "cr" => Segment::Qualifier(QualifierKind::Rc),
        "snapshot" => Segment::Qualifier(QualifierKind::Snapshot),
        "ga" | "final" | "release" => Segment::Qualifier(QualifierKind::Release),
        "sp" => Segment::Qualifier(QualifierKind::Sp),
        _ => Segment::Text(token.to_string()),
    }
}

/// A version range expression.
///
/// Supports: `[1.0,2.0)`, `[1.0,]`, `(,2.0)`, `[1.0]` (exact).
#[derive(Debug, Clone)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

impl VersionRange {
    /// Parse a range string.
    ///
    /// Returns `None` for anything that is not a well-formed range, including
    /// bare versions and empty ranges such as `[2.0,1.0]`.
    pub fn parse(spec: &str) -> Option<Self> {
        let s = spec.trim();
        if s.len() < 2 || !(s.starts_with('[') || s.starts_with('(')) {
            return None;
        }
        if !(s.ends_with(']') || s.ends_with(')')) {
            return None;
        }

        let open_inclusive = s.starts_with('[');
        let close_inclusive = s.ends_with(']');
        let inner = &s[1..s.len() - 1];
        if inner.contains(['[', ']', '(', ')']) {
            return None;
        }

        let bound = |text: &str, inclusive: bool| {
            (!text.is_empty()).then(|| Bound {
                version: Version::parse(text),
                inclusive,
            })
        };

        let range = if let Some((lower, upper)) = inner.split_once(',') {
            if upper.contains(',') {
                return None;
            }
            VersionRange {
                lower: bound(lower.trim(), open_inclusive),
                upper: bound(upper.trim(), close_inclusive),
            }
        } else {
            // [1.0] means exactly 1.0
            let inner = inner.trim();
            if inner.is_empty() || !(open_inclusive && close_inclusive) {
                return None;
            }
            VersionRange {
                lower: bound(inner, true),
                upper: bound(inner, true),
            }
        };

        if let (Some(lower), Some(upper)) = (&range.lower, &range.upper) {
            match lower.version.cmp(&upper.version) {
                Ordering::Greater => return None,
                Ordering::Equal if !(lower.inclusive && upper.inclusive) => return None,
                _ => {}
            }
        }
        Some(range)
    }

    /// Check if a version satisfies this range.
    pub fn contains(&self, version: &Version) -> bool {
        if let Some(ref lower) = self.lower {
            let cmp = version.cmp(&lower.version);
            if lower.inclusive {
                if cmp == Ordering::Less {
                    return false;
                }
            } else if cmp != Ordering::Greater {
                return false;
            }
        }
        if let Some(ref upper) = self.upper {
            let cmp = version.cmp(&upper.version);
            if upper.inclusive {
                if cmp == Ordering::Greater {
                    return false;
                }
            } else if cmp != Ordering::Less {
                return false;
            }
        }
        true
    }
}

/// What a declaration asks for, parsed from its version string.
#[derive(Debug, Clone)]
pub enum VersionSelector {
    /// No version declared; accepts whatever other requests settle on.
    Unspecified,
    Exact(Version),
    Range(VersionRange),
    /// `1.+` accepts versions starting with `1.`; a bare `+` accepts anything.
    Prefix(String),
}

/// A version string that cannot be ordered against others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedVersion(pub String);

impl fmt::Display for MalformedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed version `{}`", self.0)
    }
}

impl VersionSelector {
    pub fn parse(version: Option<&str>) -> Result<Self, MalformedVersion> {
        let Some(raw) = version else {
            return Ok(VersionSelector::Unspecified);
        };
        let malformed = || MalformedVersion(raw.to_string());
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(malformed());
        }
        if raw.starts_with(['[', '(']) {
            return VersionRange::parse(raw)
                .map(VersionSelector::Range)
                .ok_or_else(malformed);
        }
        if raw.contains(['[', ']', '(', ')', ',']) {
            return Err(malformed());
        }
        if let Some(prefix) = raw.strip_suffix('+') {
            if prefix.contains('+') {
                return Err(malformed());
            }
            return Ok(VersionSelector::Prefix(prefix.to_string()));
        }
        Ok(VersionSelector::Exact(Version::parse(raw)))
    }

    /// Ranges and prefixes need the list of published versions to pick one.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, VersionSelector::Range(_) | VersionSelector::Prefix(_))
    }

    pub fn accepts(&self, version: &Version) -> bool {
        match self {
            VersionSelector::Unspecified => true,
            VersionSelector::Exact(v) => v == version,
            VersionSelector::Range(range) => range.contains(version),
            VersionSelector::Prefix(prefix) => version.original.starts_with(prefix.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_ordering() {
        assert!(Version::parse("1.0") < Version::parse("2.0"));
        assert!(Version::parse("1.9") < Version::parse("1.10"));
    }

    #[test]
    fn three_part_ordering() {
        let v1 = Version::parse("1.0.0");
        let v2 = Version::parse("1.0.1");
        let v3 = Version::parse("1.1.0");
        assert!(v1 < v2);
        assert!(v2 < v3);
    }

    #[test]
    fn qualifier_ordering() {
        let alpha = Version::parse("1.0-alpha");
        let beta = Version::parse("1.0-beta");
        let rc = Version::parse("1.0-rc");
        let release = Version::parse("1.0");
        let sp = Version::parse("1.0-sp");

        assert!(alpha < beta);
        assert!(beta < rc);
        assert!(rc < release);
        assert!(release < sp);
    }

    #[test]
    fn digit_letter_transitions_split() {
        assert!(Version::parse("1.0rc1") < Version::parse("1.0rc2"));
        assert!(Version::parse("1.0rc2") < Version::parse("1.0"));
        assert_eq!(Version::parse("1.0-rc-1"), Version::parse("1.0rc1"));
    }

    #[test]
    fn snapshot_before_release() {
        let snap = Version::parse("1.0-SNAPSHOT");
        assert!(snap.is_snapshot());
        assert!(snap < Version::parse("1.0"));
    }

    #[test]
    fn trailing_zeros_equal() {
        assert_eq!(Version::parse("1.0"), Version::parse("1.0.0"));
        assert_eq!(Version::parse("1.0-final"), Version::parse("1.0"));
    }

    #[test]
    fn unknown_text_sorts_below_numbers_and_release() {
        assert!(Version::parse("1.0.0-jre") < Version::parse("1.0.0"));
        assert!(Version::parse("31.0-jre") < Version::parse("32.0-jre"));
        assert!(Version::parse("1.0-Foo") == Version::parse("1.0-foo"));
    }

    #[test]
    fn version_range_inclusive() {
        let range = VersionRange::parse("[1.0,2.0]").unwrap();
        assert!(range.contains(&Version::parse("1.0")));
        assert!(range.contains(&Version::parse("1.5")));
        assert!(range.contains(&Version::parse("2.0")));
        assert!(!range.contains(&Version::parse("0.9")));
        assert!(!range.contains(&Version::parse("2.1")));
    }

    #[test]
    fn version_range_exclusive_upper() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        assert!(range.contains(&Version::parse("1.9.9")));
        assert!(!range.contains(&Version::parse("2.0")));
    }

    #[test]
    fn version_range_open_lower() {
        let range = VersionRange::parse("(,2.0)").unwrap();
        assert!(range.contains(&Version::parse("1.0")));
        assert!(!range.contains(&Version::parse("2.0")));
    }

    #[test]
    fn version_range_exact() {
        let range = VersionRange::parse("[1.5]").unwrap();
        assert!(range.contains(&Version::parse("1.5")));
        assert!(!range.contains(&Version::parse("1.6")));
    }

    #[test]
    fn malformed_ranges_rejected() {
        assert!(VersionRange::parse("1.0").is_none());
        assert!(VersionRange::parse("[").is_none());
        assert!(VersionRange::parse("[1.0,2.0").is_none());
        assert!(VersionRange::parse("[2.0,1.0]").is_none());
        assert!(VersionRange::parse("(1.0)").is_none());
        assert!(VersionRange::parse("[1,2,3]").is_none());
    }

    #[test]
    fn selector_parsing() {
        assert!(matches!(
            VersionSelector::parse(None),
            Ok(VersionSelector::Unspecified)
        ));
        assert!(matches!(
            VersionSelector::parse(Some("1.0")),
            Ok(VersionSelector::Exact(_))
        ));
        assert!(matches!(
            VersionSelector::parse(Some("[1.0,2.0)")),
            Ok(VersionSelector::Range(_))
        ));
        assert!(matches!(
            VersionSelector::parse(Some("1.+")),
            Ok(VersionSelector::Prefix(p)) if p == "1."
        ));
    }

    #[test]
    fn selector_malformed() {
        for raw in ["", "1 .0", "[1.0", "1.0]", "1,0", "1+2+"] {
            assert_eq!(
                VersionSelector::parse(Some(raw)).unwrap_err(),
                MalformedVersion(raw.to_string()),
                "{raw}"
            );
        }
    }

    #[test]
    fn selector_accepts() {
        let prefix = VersionSelector::parse(Some("1.+")).unwrap();
        assert!(prefix.accepts(&Version::parse("1.4")));
        assert!(!prefix.accepts(&Version::parse("2.0")));
        assert!(prefix.is_dynamic());

        let any = VersionSelector::parse(Some("+")).unwrap();
        assert!(any.accepts(&Version::parse("9.9")));

        let exact = VersionSelector::parse(Some("1.0")).unwrap();
        assert!(exact.accepts(&Version::parse("1.0.0")));
        assert!(!exact.is_dynamic());
    }

    #[test]
    fn display() {
        assert_eq!(Version::parse("1.8.0").to_string(), "1.8.0");
    }
}
