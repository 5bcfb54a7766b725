use std::ops::RangeInclusive;

use super::ConfigId;
use crate::{LoaderErr, Result};

/// The worlds present in the simulations.
pub const WORLDS: RangeInclusive<usize> = 1..=4;

/// The particle counts present in the simulations.
pub const PARTICLES: RangeInclusive<usize> = 1..=6;

/// The goo counts present in the simulations.
pub const GOOS: RangeInclusive<usize> = 0..=5;

/// A bracket abbreviation such as `[1:2-1:6-0:]`, describing the cross product of a world,
/// particle and goo range. Every bound can be omitted and falls back to the domain's bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation {
    worlds: RangeInclusive<usize>,
    particles: RangeInclusive<usize>,
    goos: RangeInclusive<usize>,
}

impl Abbreviation {
    /// Parses an abbreviation.
    ///
    /// # Arguments
    /// * `s` - The abbreviation, brackets included.
    ///
    /// # Returns
    /// The parsed abbreviation, its ranges clamped to the domain, or an error if malformed.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || LoaderErr::InvalidAbbreviation(s.to_string());

        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(invalid)?;

        let parts: Vec<_> = inner.split('-').collect();
        let [worlds, particles, goos] = parts.as_slice() else {
            return Err(invalid());
        };

        Ok(Self {
            worlds: parse_range(worlds, WORLDS).ok_or_else(invalid)?,
            particles: parse_range(particles, PARTICLES).ok_or_else(invalid)?,
            goos: parse_range(goos, GOOS).ok_or_else(invalid)?,
        })
    }

    /// Expands the abbreviation into every configuration it describes.
    pub fn expand(&self) -> Vec<ConfigId> {
        let mut ids = Vec::new();

        for w in self.worlds.clone() {
            for p in self.particles.clone() {
                for g in self.goos.clone() {
                    ids.push(ConfigId::new(ConfigId::world_name(w), p, g));
                }
            }
        }

        ids
    }
}

/// Parses one `lo:hi` component, each side optional, or a single value meaning `lo == hi`.
fn parse_range(s: &str, domain: RangeInclusive<usize>) -> Option<RangeInclusive<usize>> {
    let (min, max) = (*domain.start(), *domain.end());

    let bound = |b: &str, default: usize| -> Option<usize> {
        let b = b.trim();
        if b.is_empty() {
            return Some(default);
        }
        b.parse::<usize>().ok().map(|v| v.clamp(min, max))
    };

    match s.split_once(':') {
        Some((lo, hi)) => Some(bound(lo, min)?..=bound(hi, max)?),
        None if s.trim().is_empty() => Some(domain),
        None => {
            let v = bound(s, min)?;
            Some(v..=v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(abbrev: &str) -> Vec<String> {
        Abbreviation::parse(abbrev)
            .unwrap()
            .expand()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn expands_cross_product() {
        assert_eq!(
            names("[1:2-1:1-0:0]"),
            ["worldm1_np=1_ng=0", "worldm2_np=1_ng=0"]
        );
    }

    #[test]
    fn omitted_bounds_use_domain() {
        let all = names("[:-:-:]");
        assert_eq!(all.len(), 4 * 6 * 6);

        let tail = names("[4:-6:-4:]");
        assert_eq!(tail, ["worldm4_np=6_ng=4", "worldm4_np=6_ng=5"]);
    }

    #[test]
    fn single_values_and_clamping() {
        assert_eq!(names("[3-2-1]"), ["worldm3_np=2_ng=1"]);
        assert_eq!(names("[9:9-1:1-0:0]"), ["worldm4_np=1_ng=0"]);
        assert_eq!(names("[-1-]").len(), 4 * 6);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(names("[2:1-1:1-0:0]").is_empty());
    }

    #[test]
    fn malformed_is_rejected() {
        for bad in ["1:2-1:1-0:0", "[1:2-1:1]", "[a-1-0]", "[1:2-1:1-0:0-0]"] {
            assert!(
                matches!(Abbreviation::parse(bad), Err(LoaderErr::InvalidAbbreviation(_))),
                "{bad} should be rejected"
            );
        }
    }
}
