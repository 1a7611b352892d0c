//! Recipient selection over the safe set

use crate::error::DeliveryError;
use rand::seq::SliceRandom;
use rand::Rng;
use relaygate_core::{NodeId, ReputationScore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Uniform draw over the safe set
    #[default]
    UniformRandom,

    /// First safe node in registry order
    FirstSafe,

    /// Highest score, ties by id ascending
    HighestScore,
}

impl SelectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionPolicy::UniformRandom => "uniform-random",
            SelectionPolicy::FirstSafe => "first-safe",
            SelectionPolicy::HighestScore => "highest-score",
        }
    }

    /// Pick one recipient; `None` only when `safe` is empty.
    ///
    /// `registry_order` drives `FirstSafe`; `scores` drives `HighestScore`.
    pub fn select<R: Rng + ?Sized>(
        &self,
        safe: &[NodeId],
        registry_order: &[NodeId],
        scores: &BTreeMap<NodeId, ReputationScore>,
        rng: &mut R,
    ) -> Option<NodeId> {
        if safe.is_empty() {
            return None;
        }

        match self {
            SelectionPolicy::UniformRandom => safe.choose(rng).cloned(),
            SelectionPolicy::FirstSafe => {
                let eligible: HashSet<&NodeId> = safe.iter().collect();
                registry_order
                    .iter()
                    .find(|id| eligible.contains(id))
                    .or_else(|| safe.first())
                    .cloned()
            }
            SelectionPolicy::HighestScore => safe
                .iter()
                .max_by(|a, b| {
                    let sa = scores.get(*a).copied().unwrap_or(0);
                    let sb = scores.get(*b).copied().unwrap_or(0);
                    sa.cmp(&sb).then_with(|| b.cmp(a))
                })
                .cloned(),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionPolicy {
    type Err = DeliveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform-random" => Ok(SelectionPolicy::UniformRandom),
            "first-safe" => Ok(SelectionPolicy::FirstSafe),
            "highest-score" => Ok(SelectionPolicy::HighestScore),
            other => Err(DeliveryError::configuration(format!(
                "unknown selection policy: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ids(names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|n| NodeId::new(*n)).collect()
    }

    #[test]
    fn test_empty_safe_set() {
        let mut rng = StdRng::seed_from_u64(0);
        for policy in [
            SelectionPolicy::UniformRandom,
            SelectionPolicy::FirstSafe,
            SelectionPolicy::HighestScore,
        ] {
            assert_eq!(policy.select(&[], &[], &BTreeMap::new(), &mut rng), None);
        }
    }

    #[test]
    fn test_uniform_random_stays_in_safe_set() {
        let mut rng = StdRng::seed_from_u64(1);
        let safe = ids(&["a", "b", "c"]);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let chosen = SelectionPolicy::UniformRandom
                .select(&safe, &[], &BTreeMap::new(), &mut rng)
                .unwrap();
            assert!(safe.contains(&chosen));
            seen.insert(chosen);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_first_safe_follows_registry_order() {
        let mut rng = StdRng::seed_from_u64(2);
        let registry = ids(&["z", "m", "a"]);
        let safe = ids(&["a", "m"]);
        let chosen = SelectionPolicy::FirstSafe
            .select(&safe, &registry, &BTreeMap::new(), &mut rng)
            .unwrap();
        assert_eq!(chosen, NodeId::new("m"));
    }

    #[test]
    fn test_highest_score_ties_by_id() {
        let mut rng = StdRng::seed_from_u64(3);
        let safe = ids(&["c", "b", "a"]);
        let mut scores = BTreeMap::new();
        scores.insert(NodeId::new("a"), 80);
        scores.insert(NodeId::new("b"), 92);
        scores.insert(NodeId::new("c"), 92);

        let chosen = SelectionPolicy::HighestScore
            .select(&safe, &[], &scores, &mut rng)
            .unwrap();
        assert_eq!(chosen, NodeId::new("b"));
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "first-safe".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::FirstSafe
        );
        assert!("round-robin".parse::<SelectionPolicy>().is_err());
        for policy in [
            SelectionPolicy::UniformRandom,
            SelectionPolicy::FirstSafe,
            SelectionPolicy::HighestScore,
        ] {
            assert_eq!(policy.to_string().parse::<SelectionPolicy>().unwrap(), policy);
        }
    }
}
