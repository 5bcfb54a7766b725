mod abbrev;
mod config_id;

use std::collections::BTreeSet;

use log::{debug, info};
use rand::{Rng, seq::SliceRandom};

pub use abbrev::{Abbreviation, GOOS, PARTICLES, WORLDS};
pub use config_id::ConfigId;

use crate::{LoaderErr, Result};

/// One entry of a configuration specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSpec {
    Exact(ConfigId),
    World(String),
    Abbreviation(Abbreviation),
}

impl ConfigSpec {
    /// Classifies and parses a raw specification entry.
    ///
    /// Entries starting with `[` are abbreviations, entries containing `_np=` are exact
    /// identifiers and anything else is taken as a world name.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();

        if raw.starts_with('[') {
            Abbreviation::parse(raw).map(Self::Abbreviation)
        } else if raw.contains("_np=") {
            raw.parse().map(Self::Exact)
        } else if raw.is_empty() {
            Err(LoaderErr::InvalidConfig("empty config specification entry".into()))
        } else {
            Ok(Self::World(raw.to_string()))
        }
    }

    /// Inserts every available configuration matched by this entry into `out`.
    fn matches_into(&self, available: &BTreeSet<ConfigId>, out: &mut BTreeSet<ConfigId>) {
        let before = out.len();

        match self {
            Self::Exact(id) => {
                if available.contains(id) {
                    out.insert(id.clone());
                } else {
                    debug!("dropping {id}, not present in the dataset");
                }
            }
            Self::World(world) => {
                let matched = available
                    .iter()
                    .filter(|id| id.to_string().contains(world.as_str()))
                    .cloned();
                out.extend(matched);
            }
            Self::Abbreviation(abbrev) => {
                for id in abbrev.expand() {
                    if available.contains(&id) {
                        out.insert(id);
                    } else {
                        debug!("dropping {id}, not present in the dataset");
                    }
                }
            }
        }

        debug!("{self:?} matched {} new config(s)", out.len() - before);
    }
}

/// Resolves a raw configuration specification against the available configurations.
///
/// # Arguments
/// * `specified` - The raw entries, an empty list selects every available configuration.
/// * `available` - The configurations present in the dataset.
/// * `shuffle` - Whether to randomize the resulting order instead of sorting it.
/// * `rng` - A random number generator, only used when shuffling.
///
/// # Returns
/// The resolved configurations in the order they will be planned, or an error if an entry
/// is malformed or nothing requested is available.
pub fn resolve<R: Rng + ?Sized>(
    specified: &[String],
    available: &BTreeSet<ConfigId>,
    shuffle: bool,
    rng: &mut R,
) -> Result<Vec<ConfigId>> {
    let resolved = if specified.is_empty() {
        available.clone()
    } else {
        let mut resolved = BTreeSet::new();
        for raw in specified {
            ConfigSpec::parse(raw)?.matches_into(available, &mut resolved);
        }
        resolved
    };

    if resolved.is_empty() {
        return Err(LoaderErr::ConfigMismatch(format!(
            "none of {specified:?} is available among {} config(s)",
            available.len()
        )));
    }

    // BTreeSet iteration is already the lexicographic order.
    let mut ids: Vec<_> = resolved.into_iter().collect();
    if shuffle {
        ids.shuffle(rng);
    }

    info!("resolved {} config(s)", ids.len());
    Ok(ids)
}
