//! The configured resolution ladder.

use crate::error::{Error, Result};
use pulsemap_grid::MAX_RESOLUTION;
use std::str::FromStr;

/// The set of grid resolutions a deployment aggregates at.
///
/// Strictly ascending, non-empty, every level within `0..=15`. The finest
/// level is the *base* resolution: incremental writes land there, and the
/// rollup derives every coarser level from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionLadder {
    levels: Vec<u8>,
}

impl ResolutionLadder {
    pub fn new(levels: Vec<u8>) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::InvalidArgument("resolution ladder is empty".into()));
        }
        for pair in levels.windows(2) {
            if pair[0] >= pair[1] {
                return Err(Error::InvalidArgument(format!(
                    "resolution ladder must be strictly ascending, got {levels:?}"
                )));
            }
        }
        if let Some(&finest) = levels.last() {
            if finest > MAX_RESOLUTION {
                return Err(Error::InvalidArgument(format!(
                    "resolution {finest} exceeds maximum {MAX_RESOLUTION}"
                )));
            }
        }
        Ok(Self { levels })
    }

    /// The finest level; incremental aggregation writes here.
    pub fn base(&self) -> u8 {
        *self.levels.last().unwrap_or(&0)
    }

    /// All levels, coarse to fine.
    pub fn levels(&self) -> &[u8] {
        &self.levels
    }

    /// True if `res` is one of the configured levels.
    pub fn contains(&self, res: u8) -> bool {
        self.levels.contains(&res)
    }
}

impl FromStr for ResolutionLadder {
    type Err = Error;

    /// Parse a comma-separated level list, e.g. `"4,6,8"`.
    fn from_str(s: &str) -> Result<Self> {
        let levels = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u8>()
                    .map_err(|_| Error::InvalidArgument(format!("bad resolution {part:?}")))
            })
            .collect::<Result<Vec<u8>>>()?;
        Self::new(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ladder() {
        let ladder = ResolutionLadder::new(vec![4, 6, 8]).unwrap();
        assert_eq!(ladder.base(), 8);
        assert_eq!(ladder.levels(), &[4, 6, 8]);
        assert!(ladder.contains(6));
        assert!(!ladder.contains(5));
    }

    #[test]
    fn rejects_bad_ladders() {
        assert!(ResolutionLadder::new(vec![]).is_err());
        assert!(ResolutionLadder::new(vec![4, 4]).is_err());
        assert!(ResolutionLadder::new(vec![8, 4]).is_err());
        assert!(ResolutionLadder::new(vec![4, 16]).is_err());
    }

    #[test]
    fn parses_from_env_shape() {
        let ladder: ResolutionLadder = "4, 6, 8".parse().unwrap();
        assert_eq!(ladder.levels(), &[4, 6, 8]);
        assert!("".parse::<ResolutionLadder>().is_err());
        assert!("4,x".parse::<ResolutionLadder>().is_err());
    }
}
