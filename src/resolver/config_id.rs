use std::{
    cmp::Ordering,
    fmt::{self, Display},
    str::FromStr,
};

use crate::LoaderErr;

/// Identifier of a configuration: a world plus its particle and goo counts.
///
/// Displayed and parsed as `<world>_np=<particles>_ng=<goos>`, e.g. `worldm1_np=2_ng=0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigId {
    world: String,
    particles: usize,
    goos: usize,
    name: String,
}

impl ConfigId {
    /// Creates a new `ConfigId`.
    ///
    /// # Arguments
    /// * `world` - The world name, e.g. `worldm1`.
    /// * `particles` - The amount of particles in the configuration.
    /// * `goos` - The amount of goos in the configuration.
    pub fn new(world: impl Into<String>, particles: usize, goos: usize) -> Self {
        let world = world.into();
        let name = format!("{world}_np={particles}_ng={goos}");

        Self {
            world,
            particles,
            goos,
            name,
        }
    }

    /// Name of the `n`-th world.
    pub fn world_name(n: usize) -> String {
        format!("worldm{n}")
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    pub fn particles(&self) -> usize {
        self.particles
    }

    pub fn goos(&self) -> usize {
        self.goos
    }

    /// The identifier as a string, `<world>_np=<particles>_ng=<goos>`.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for ConfigId {
    type Err = LoaderErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LoaderErr::InvalidConfig(format!("malformed config identifier {s:?}"));

        let (world, rest) = s.split_once("_np=").ok_or_else(invalid)?;
        let (particles, goos) = rest.split_once("_ng=").ok_or_else(invalid)?;

        if world.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(
            world,
            particles.parse().map_err(|_| invalid())?,
            goos.parse().map_err(|_| invalid())?,
        ))
    }
}

// Ordered as the identifier strings are, so that sorting gives the same order as sorting names.
impl Ord for ConfigId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl PartialOrd for ConfigId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let id: ConfigId = "worldm1_np=2_ng=0".parse().unwrap();
        assert_eq!(id, ConfigId::new("worldm1", 2, 0));
        assert_eq!(id.to_string(), "worldm1_np=2_ng=0");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("worldm1".parse::<ConfigId>().is_err());
        assert!("worldm1_np=x_ng=0".parse::<ConfigId>().is_err());
        assert!("_np=1_ng=0".parse::<ConfigId>().is_err());
        assert!("worldm1_ng=0_np=1".parse::<ConfigId>().is_err());
    }

    #[test]
    fn orders_like_names() {
        let mut ids = vec![
            ConfigId::new("worldm2", 1, 0),
            ConfigId::new("worldm1", 10, 0),
            ConfigId::new("worldm1", 2, 3),
        ];
        ids.sort();

        let names: Vec<_> = ids.iter().map(ToString::to_string).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn prefix_worlds_order_like_names() {
        let short = ConfigId::new("worldm1", 1, 0);
        let long = ConfigId::new("worldm10", 1, 0);

        assert_eq!(short.cmp(&long), short.as_str().cmp(long.as_str()));
        assert_eq!(short.as_str(), "worldm1_np=1_ng=0");
    }
}
