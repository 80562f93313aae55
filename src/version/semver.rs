//! npm-flavoured semver comparison
//!
//! Supports npm semver range specifications:
//! - `1.2.3`, `=1.2.3`, `v1.2.3` - exact match
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2.3`, `~>1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.2.x`, `1.x`, `1`, `*`, `""` - wildcards and partial versions
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - `>=1.0.0 <2.0.0` - comparator sets (AND)
//! - `^1.0.0 || ^2.0.0` - unions (OR)
//!
//! Every entry point returns [`VersionError`] instead of guessing when the
//! version or the range cannot be parsed.

use std::cmp::Ordering;

use semver::{BuildMetadata, Prerelease, Version};

use crate::version::error::VersionError;

/// Largest component npm accepts (`Number.MAX_SAFE_INTEGER`)
const MAX_COMPONENT: u64 = 9_007_199_254_740_991;

/// Returns true if `version` falls within `range`.
pub fn satisfies(version: &str, range: &str) -> Result<bool, VersionError> {
    let version = parse_version(version)?;
    let spec = VersionSpec::parse(range)?;
    Ok(spec.satisfies(&version))
}

/// Returns true if `version` is higher than every version `range` can match.
///
/// A version that satisfies the range, or a range without an upper bound,
/// is never exceeded.
pub fn greater_than_range(version: &str, range: &str) -> Result<bool, VersionError> {
    let version = parse_version(version)?;
    let spec = VersionSpec::parse(range)?;
    Ok(spec.is_exceeded_by(&version))
}

/// Strict ordering: returns true if `a` is greater than `b`.
pub fn greater_than(a: &str, b: &str) -> Result<bool, VersionError> {
    let a = parse_version(a)?;
    let b = parse_version(b)?;
    Ok(a.cmp_precedence(&b) == Ordering::Greater)
}

/// Parse a concrete version, accepting the `v` and `=` prefixes npm tolerates.
pub fn parse_version(version: &str) -> Result<Version, VersionError> {
    let trimmed = version.trim();
    let stripped = trimmed.trim_start_matches('=').trim_start_matches('v');
    Version::parse(stripped)
        .ok()
        .filter(|v| [v.major, v.minor, v.patch].iter().all(|&n| n <= MAX_COMPONENT))
        .ok_or_else(|| VersionError::InvalidVersion(version.to_string()))
}

/// Union of comparator sets (`||`), each set an intersection of ranges
#[derive(Debug)]
struct VersionSpec {
    sets: Vec<Vec<VersionRange>>,
}

impl VersionSpec {
    fn parse(spec: &str) -> Result<Self, VersionError> {
        let sets = spec
            .split("||")
            .map(|part| {
                Self::parse_set(part).ok_or_else(|| VersionError::InvalidRange(spec.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { sets })
    }

    /// Parse one space-separated comparator set, handling hyphen ranges
    /// and operators separated from their version by whitespace (`>= 1.2.3`).
    fn parse_set(set: &str) -> Option<Vec<VersionRange>> {
        let tokens: Vec<&str> = set.split_whitespace().collect();
        if tokens.is_empty() {
            return Some(vec![VersionRange::Any]);
        }

        let mut ranges = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if tokens.get(i + 1) == Some(&"-") {
                let to = tokens.get(i + 2)?;
                ranges.extend(VersionRange::parse_hyphen(tokens[i], to)?);
                i += 3;
                continue;
            }

            let token = tokens[i];
            if is_operator(token) {
                let version = tokens.get(i + 1)?;
                ranges.push(VersionRange::parse(&format!("{token}{version}"))?);
                i += 2;
            } else {
                ranges.push(VersionRange::parse(token)?);
                i += 1;
            }
        }

        Some(ranges)
    }

    fn satisfies(&self, version: &Version) -> bool {
        self.sets.iter().any(|set| set_satisfies(set, version))
    }

    fn is_exceeded_by(&self, version: &Version) -> bool {
        if self.satisfies(version) {
            return false;
        }

        self.sets.iter().all(|set| {
            let strip_prereleases = !version.pre.is_empty() && !admits_prerelease(set, version);
            set.iter()
                .map(VersionRange::upper_bound)
                .map(|bound| {
                    if strip_prereleases {
                        bound.below_prereleases()
                    } else {
                        bound
                    }
                })
                .reduce(Bound::tighter_upper)
                .is_some_and(|bound| bound.is_exceeded_by(version))
        })
    }
}

fn is_operator(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~'))
}

/// A pre-release version only matches a set that names a pre-release on
/// the same `major.minor.patch` tuple.
fn set_satisfies(set: &[VersionRange], version: &Version) -> bool {
    if !set.iter().all(|range| range.satisfies(version)) {
        return false;
    }

    version.pre.is_empty() || admits_prerelease(set, version)
}

fn admits_prerelease(set: &[VersionRange], version: &Version) -> bool {
    set.iter().filter_map(VersionRange::anchor).any(|anchor| {
        !anchor.pre.is_empty()
            && anchor.major == version.major
            && anchor.minor == version.minor
            && anchor.patch == version.patch
    })
}

/// One side of a range
#[derive(Debug, Clone, PartialEq)]
enum Bound {
    Unbounded,
    Inclusive(Version),
    Exclusive(Version),
}

impl Bound {
    fn admits_as_lower(&self, version: &Version) -> bool {
        match self {
            Bound::Unbounded => true,
            Bound::Inclusive(v) => version.cmp_precedence(v) != Ordering::Less,
            Bound::Exclusive(v) => version.cmp_precedence(v) == Ordering::Greater,
        }
    }

    fn admits_as_upper(&self, version: &Version) -> bool {
        match self {
            Bound::Unbounded => true,
            Bound::Inclusive(v) => version.cmp_precedence(v) != Ordering::Greater,
            Bound::Exclusive(v) => version.cmp_precedence(v) == Ordering::Less,
        }
    }

    fn is_exceeded_by(&self, version: &Version) -> bool {
        match self {
            Bound::Unbounded => false,
            _ => !self.admits_as_upper(version),
        }
    }

    /// `<X.Y.Z` as seen by a pre-release the set does not admit: `<X.Y.Z-0`
    fn below_prereleases(self) -> Bound {
        match self {
            Bound::Exclusive(v) if v.pre.is_empty() => {
                Bound::Exclusive(floor(v.major, v.minor, v.patch))
            }
            other => other,
        }
    }

    fn version(&self) -> Option<&Version> {
        match self {
            Bound::Unbounded => None,
            Bound::Inclusive(v) | Bound::Exclusive(v) => Some(v),
        }
    }

    /// The more restrictive of two upper bounds
    fn tighter_upper(self, other: Bound) -> Bound {
        let ordering = match (self.version(), other.version()) {
            (Some(a), Some(b)) => Some(a.cmp_precedence(b)),
            _ => None,
        };

        match ordering {
            None if matches!(self, Bound::Unbounded) => other,
            None => self,
            Some(Ordering::Less) => self,
            Some(Ordering::Greater) => other,
            Some(Ordering::Equal) if matches!(self, Bound::Exclusive(_)) => self,
            Some(Ordering::Equal) => other,
        }
    }
}

/// Represents a parsed npm version range
#[derive(Debug)]
enum VersionRange {
    /// Exact version match
    Exact(Version),
    /// Caret range: ^1.2.3 means >=1.2.3 <2.0.0 (or special cases for 0.x)
    Caret(Version),
    /// Tilde range: ~1.2.3 means >=1.2.3 <1.3.0
    Tilde(Version),
    /// Greater than or equal
    Gte(Version),
    /// Greater than
    Gt(Version),
    /// Less than or equal
    Lte(Version),
    /// Less than
    Lt(Version),
    /// Any version: * matches all versions
    Any,
    /// Wildcard major: 1.x means >=1.0.0 <2.0.0
    WildcardMajor(u64),
    /// Wildcard minor: 1.2.x means >=1.2.0 <1.3.0
    WildcardMinor(u64, u64),
}

impl VersionRange {
    /// Parse a single operator-prefixed range
    fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();

        if let Some(rest) = spec.strip_prefix(">=") {
            let p = Partial::parse(rest)?;
            Some(match p.major {
                None => VersionRange::Any,
                Some(_) => VersionRange::Gte(p.padded()),
            })
        } else if let Some(rest) = spec.strip_prefix("<=") {
            let p = Partial::parse(rest)?;
            Some(match (p.major, p.minor, p.patch) {
                (None, _, _) => VersionRange::Any,
                (Some(major), None, _) => VersionRange::Lt(floor(major + 1, 0, 0)),
                (Some(major), Some(minor), None) => VersionRange::Lt(floor(major, minor + 1, 0)),
                _ => VersionRange::Lte(p.padded()),
            })
        } else if let Some(rest) = spec.strip_prefix('>') {
            let p = Partial::parse(rest)?;
            Some(match (p.major, p.minor, p.patch) {
                (None, _, _) => VersionRange::Lt(floor(0, 0, 0)),
                (Some(major), None, _) => VersionRange::Gte(Version::new(major + 1, 0, 0)),
                (Some(major), Some(minor), None) => {
                    VersionRange::Gte(Version::new(major, minor + 1, 0))
                }
                _ => VersionRange::Gt(p.padded()),
            })
        } else if let Some(rest) = spec.strip_prefix('<') {
            let p = Partial::parse(rest)?;
            Some(match (p.major, p.minor, p.patch) {
                (None, _, _) => VersionRange::Lt(floor(0, 0, 0)),
                (Some(major), minor, None) => {
                    VersionRange::Lt(floor(major, minor.unwrap_or(0), 0))
                }
                _ => VersionRange::Lt(p.padded()),
            })
        } else if let Some(rest) = spec.strip_prefix('^') {
            let p = Partial::parse(rest)?;
            Some(match (p.major, p.minor, p.patch) {
                (None, _, _) => VersionRange::Any,
                (Some(major), None, _) => VersionRange::WildcardMajor(major),
                (Some(0), Some(0), None) => VersionRange::WildcardMinor(0, 0),
                _ => VersionRange::Caret(p.padded()),
            })
        } else if let Some(rest) = spec.strip_prefix("~>").or_else(|| spec.strip_prefix('~')) {
            let p = Partial::parse(rest)?;
            Some(match (p.major, p.minor) {
                (None, _) => VersionRange::Any,
                (Some(major), None) => VersionRange::WildcardMajor(major),
                _ => VersionRange::Tilde(p.padded()),
            })
        } else {
            let p = Partial::parse(spec)?;
            Some(match (p.major, p.minor, p.patch) {
                (None, _, _) => VersionRange::Any,
                (Some(major), None, _) => VersionRange::WildcardMajor(major),
                (Some(major), Some(minor), None) => VersionRange::WildcardMinor(major, minor),
                _ => VersionRange::Exact(p.padded()),
            })
        }
    }

    /// Parse hyphen range like "1.0.0 - 2.0.0" into its two comparators
    fn parse_hyphen(from: &str, to: &str) -> Option<Vec<Self>> {
        let from = Partial::parse(from)?;
        let to = Partial::parse(to)?;

        let mut ranges = Vec::new();
        if from.major.is_some() {
            ranges.push(VersionRange::Gte(from.padded()));
        }
        match (to.major, to.minor, to.patch) {
            (None, _, _) => {}
            (Some(major), None, _) => ranges.push(VersionRange::Lt(floor(major + 1, 0, 0))),
            (Some(major), Some(minor), None) => {
                ranges.push(VersionRange::Lt(floor(major, minor + 1, 0)))
            }
            _ => ranges.push(VersionRange::Lte(to.padded())),
        }

        if ranges.is_empty() {
            ranges.push(VersionRange::Any);
        }
        Some(ranges)
    }

    fn lower_bound(&self) -> Bound {
        match self {
            VersionRange::Exact(v)
            | VersionRange::Caret(v)
            | VersionRange::Tilde(v)
            | VersionRange::Gte(v) => Bound::Inclusive(v.clone()),
            VersionRange::Gt(v) => Bound::Exclusive(v.clone()),
            VersionRange::WildcardMajor(major) => Bound::Inclusive(Version::new(*major, 0, 0)),
            VersionRange::WildcardMinor(major, minor) => {
                Bound::Inclusive(Version::new(*major, *minor, 0))
            }
            VersionRange::Lte(_) | VersionRange::Lt(_) | VersionRange::Any => Bound::Unbounded,
        }
    }

    fn upper_bound(&self) -> Bound {
        match self {
            VersionRange::Exact(v) | VersionRange::Lte(v) => Bound::Inclusive(v.clone()),
            VersionRange::Lt(v) => Bound::Exclusive(v.clone()),
            // ^1.2.3 -> <2.0.0, ^0.2.3 -> <0.3.0, ^0.0.3 -> <0.0.4
            VersionRange::Caret(v) => Bound::Exclusive(match (v.major, v.minor) {
                (0, 0) => floor(0, 0, v.patch + 1),
                (0, minor) => floor(0, minor + 1, 0),
                (major, _) => floor(major + 1, 0, 0),
            }),
            VersionRange::Tilde(v) => Bound::Exclusive(floor(v.major, v.minor + 1, 0)),
            VersionRange::WildcardMajor(major) => Bound::Exclusive(floor(major + 1, 0, 0)),
            VersionRange::WildcardMinor(major, minor) => {
                Bound::Exclusive(floor(*major, minor + 1, 0))
            }
            VersionRange::Gte(_) | VersionRange::Gt(_) | VersionRange::Any => Bound::Unbounded,
        }
    }

    /// The version written by the user, used by the pre-release rule
    fn anchor(&self) -> Option<&Version> {
        match self {
            VersionRange::Exact(v)
            | VersionRange::Caret(v)
            | VersionRange::Tilde(v)
            | VersionRange::Gte(v)
            | VersionRange::Gt(v)
            | VersionRange::Lte(v)
            | VersionRange::Lt(v) => Some(v),
            VersionRange::Any | VersionRange::WildcardMajor(_) | VersionRange::WildcardMinor(..) => {
                None
            }
        }
    }

    fn satisfies(&self, version: &Version) -> bool {
        self.lower_bound().admits_as_lower(version) && self.upper_bound().admits_as_upper(version)
    }
}

/// The lowest possible version for a tuple, `x.y.z-0`
fn floor(major: u64, minor: u64, patch: u64) -> Version {
    Version {
        major,
        minor,
        patch,
        pre: Prerelease::new("0").unwrap_or(Prerelease::EMPTY),
        build: BuildMetadata::EMPTY,
    }
}

/// A possibly incomplete version such as `1`, `1.2`, `1.x` or `1.2.3-beta.1`
#[derive(Debug)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim().trim_start_matches('=').trim();
        let input = input.strip_prefix('v').unwrap_or(input);
        let input = input.split_once('+').map_or(input, |(core, _)| core);

        if input.is_empty() {
            return Some(Self::any());
        }

        let (core, pre) = match input.split_once('-') {
            Some((core, pre)) => (core, Prerelease::new(pre).ok()?),
            None => (input, Prerelease::EMPTY),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return None;
        }

        let mut numbers = [None; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if matches!(*part, "x" | "X" | "*") {
                break;
            }
            *slot = Some(part.parse::<u64>().ok().filter(|&n| n <= MAX_COMPONENT)?);
        }

        let [major, minor, patch] = numbers;
        if patch.is_none() && !pre.is_empty() {
            return None;
        }

        Some(Self {
            major,
            minor: major.and(minor),
            patch: major.and(minor).and(patch),
            pre,
        })
    }

    fn any() -> Self {
        Self {
            major: None,
            minor: None,
            patch: None,
            pre: Prerelease::EMPTY,
        }
    }

    /// Zero-pad missing components: `1.2` -> `1.2.0`
    fn padded(&self) -> Version {
        Version {
            major: self.major.unwrap_or(0),
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            pre: self.pre.clone(),
            build: BuildMetadata::EMPTY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // exact
    #[case("1.0.0", "1.0.0", true)]
    #[case("1.0.1", "1.0.0", false)]
    #[case("1.0.0", "=1.0.0", true)]
    #[case("1.0.0", "v1.0.0", true)]
    // caret
    #[case("1.2.3", "^1.2.3", true)]
    #[case("1.9.9", "^1.2.3", true)]
    #[case("1.2.2", "^1.2.3", false)]
    #[case("2.0.0", "^1.2.3", false)]
    #[case("0.2.9", "^0.2.3", true)]
    #[case("0.3.0", "^0.2.3", false)]
    #[case("0.0.3", "^0.0.3", true)]
    #[case("0.0.4", "^0.0.3", false)]
    #[case("0.0.9", "^0.0", true)]
    #[case("1.5.0", "^1", true)]
    // tilde
    #[case("1.2.9", "~1.2.3", true)]
    #[case("1.3.0", "~1.2.3", false)]
    #[case("1.9.0", "~1", true)]
    #[case("1.2.5", "~>1.2.0", true)]
    // comparison operators
    #[case("1.0.0", ">=1.0.0", true)]
    #[case("1.0.0", ">1.0.0", false)]
    #[case("1.3.0", ">1.2", true)]
    #[case("1.2.9", ">1.2", false)]
    #[case("1.2.9", "<=1.2", true)]
    #[case("1.3.0", "<=1.2", false)]
    #[case("0.9.0", "<1.0.0", true)]
    #[case("1.5.0", ">= 1.0.0", true)]
    // wildcards
    #[case("5.0.0", "*", true)]
    #[case("5.0.0", "", true)]
    #[case("5.0.0", "x", true)]
    #[case("1.9.0", "1.x", true)]
    #[case("2.0.0", "1.x", false)]
    #[case("1.2.7", "1.2.x", true)]
    #[case("1.3.0", "1.2.X", false)]
    #[case("1.2.0", "1.2", true)]
    #[case("1.8.0", "1", true)]
    // hyphen, AND, OR
    #[case("1.5.0", "1.0.0 - 2.0.0", true)]
    #[case("2.0.1", "1.0.0 - 2.0.0", false)]
    #[case("2.9.0", "1.0 - 2", true)]
    #[case("1.5.0", ">=1.0.0 <2.0.0", true)]
    #[case("2.0.0", ">=1.0.0 <2.0.0", false)]
    #[case("2.1.0", "^1.0.0 || ^2.0.0", true)]
    #[case("3.0.0", "^1.0.0 || ^2.0.0", false)]
    // pre-releases only match sets that name the same tuple
    #[case("2.0.0-beta.1", "^1.0.0", false)]
    #[case("2.0.0-beta.1", ">=1.0.0", false)]
    #[case("2.0.0-beta.2", "^2.0.0-beta.1", true)]
    #[case("2.0.1-beta.1", "^2.0.0-beta.1", false)]
    #[case("2.0.1", "^2.0.0-beta.1", true)]
    fn satisfies_follows_npm_range_semantics(
        #[case] version: &str,
        #[case] range: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(satisfies(version, range), Ok(expected));
    }

    #[rstest]
    #[case("2.0.0", "^1.0.0", true)]
    #[case("1.5.0", "^1.0.0", false)] // satisfies
    #[case("0.5.0", "^1.0.0", false)] // below the range
    #[case("2.0.0-beta.1", "^1.0.0", true)]
    #[case("1.3.0", "~1.2.0", true)]
    #[case("2.0.0", "<=2.0.0", false)]
    #[case("2.0.1", "<=2.0.0", true)]
    #[case("2.0.0", "<2.0.0", true)]
    #[case("9.0.0", ">=1.0.0", false)] // unbounded
    #[case("9.0.0", "*", false)]
    #[case("3.0.0", "^1.0.0 || ^2.0.0", true)]
    #[case("1.5.0", "^1.0.0 || ^2.0.0", false)]
    #[case("2.5.0", "^1.0.0 || >=3.0.0", false)] // between the sets
    #[case("1.0.1", "1.0.0", true)]
    #[case("2.1.0", ">=1.0.0 <2.0.0 || <=2.0.0", true)]
    // a pre-release of an excluded tuple is above the exclusive bound
    #[case("2.0.0-beta.1", "<2.0.0", true)]
    #[case("2.0.0-beta.1", ">=1.0.0 <2.0.0", true)]
    #[case("2.0.0-beta.1", "1.0.0 - 2.0.0", false)]
    #[case("2.0.0-beta.1", ">=2.0.0-alpha.1 <2.0.0", false)] // satisfies
    #[case("1.5.0-beta.1", ">=1.0.0 <2.0.0", false)]
    fn greater_than_range_requires_leaving_every_set(
        #[case] version: &str,
        #[case] range: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(greater_than_range(version, range), Ok(expected));
    }

    #[rstest]
    #[case("1.0.1", "1.0.0", true)]
    #[case("1.0.0", "1.0.0", false)]
    #[case("1.0.0", "1.0.1", false)]
    #[case("2.0.0", "2.0.0-beta.1", true)]
    #[case("2.0.0-beta.2", "2.0.0-beta.1", true)]
    #[case("v1.1.0", "1.0.0", true)]
    #[case("1.0.0+build.2", "1.0.0+build.1", false)]
    fn greater_than_is_strict(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(greater_than(a, b), Ok(expected));
    }

    #[rstest]
    #[case("not-a-version")]
    #[case("1.2")]
    #[case("")]
    #[case("18446744073709551615.0.0")]
    #[case("9007199254740992.0.0")]
    fn unparseable_version_is_reported(#[case] version: &str) {
        assert_eq!(
            satisfies(version, "^1.0.0"),
            Err(VersionError::InvalidVersion(version.to_string()))
        );
        assert!(greater_than(version, "1.0.0").is_err());
        assert!(greater_than("1.0.0", version).is_err());
    }

    #[rstest]
    #[case("latest")]
    #[case("file:../local")]
    #[case("github:user/repo")]
    #[case("^1.0.0 || garbage")]
    #[case(">=")]
    #[case("1.0.0 -")]
    #[case("^18446744073709551615.0.0")]
    #[case("18446744073709551615.x")]
    #[case("<=9007199254740992")]
    fn unparseable_range_is_reported(#[case] range: &str) {
        assert_eq!(
            satisfies("1.0.0", range),
            Err(VersionError::InvalidRange(range.to_string()))
        );
        assert!(greater_than_range("1.0.0", range).is_err());
    }
}
