//! Strategies for picking the number of a synthetic concept id

use crate::ir::{Concept, IrNode};
use crate::printer::Printer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Synthetic id numbers are always below this bound
pub const SYNTHETIC_ID_RANGE: u32 = 10_000;

/// Picks the number of the synthetic id given to a concept
pub trait IdGenerator {
    /// Gets the next id number for the concept. Values outside of `0..SYNTHETIC_ID_RANGE` are
    /// wrapped by the caller.
    fn next_id(&mut self, concept: &Concept) -> u32;
}

impl<G: IdGenerator + ?Sized> IdGenerator for &mut G {
    fn next_id(&mut self, concept: &Concept) -> u32 {
        (**self).next_id(concept)
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Box<G> {
    fn next_id(&mut self, concept: &Concept) -> u32 {
        (**self).next_id(concept)
    }
}

/// Draws every id uniformly at random
#[derive(Debug, Clone)]
pub struct RandomIds {
    rng: StdRng,
}

impl RandomIds {
    /// Creates a generator seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a generator that repeats the same draws for the same seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RandomIds {
    fn next_id(&mut self, _concept: &Concept) -> u32 {
        self.rng.gen_range(0..SYNTHETIC_ID_RANGE)
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64 bit FNV-1a
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Derives the id from the FNV-1a hash of the concept as printed with the default [Printer].
///
/// The id only depends on the concept's text, so it is the same on every platform and toolchain.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentHashIds;

impl IdGenerator for ContentHashIds {
    fn next_id(&mut self, concept: &Concept) -> u32 {
        let printed = Printer::default().generate(&IrNode::Concept(concept.clone()));
        (fnv1a(printed.as_bytes()) % u64::from(SYNTHETIC_ID_RANGE)) as u32
    }
}

/// Counts up from a starting number, wrapping back to zero
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialIds {
    next: u32,
}

impl SequentialIds {
    pub fn starting_at(next: u32) -> Self {
        Self {
            next: next % SYNTHETIC_ID_RANGE,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, _concept: &Concept) -> u32 {
        let id = self.next;
        self.next = (self.next + 1) % SYNTHETIC_ID_RANGE;
        id
    }
}

/// Names one of the built in [IdGenerator]s
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum IdStrategy {
    #[default]
    Random,
    ContentHash,
    Sequential,
}

impl IdStrategy {
    /// Creates a fresh generator for this strategy
    pub fn generator(self) -> Box<dyn IdGenerator + Send> {
        match self {
            IdStrategy::Random => Box::new(RandomIds::new()),
            IdStrategy::ContentHash => Box::new(ContentHashIds),
            IdStrategy::Sequential => Box::new(SequentialIds::default()),
        }
    }
}

impl Display for IdStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IdStrategy::Random => write!(f, "random"),
            IdStrategy::ContentHash => write!(f, "hash"),
            IdStrategy::Sequential => write!(f, "sequential"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown id strategy {0:?}, expected one of random, hash or sequential")]
pub struct ParseIdStrategyError(String);

impl FromStr for IdStrategy {
    type Err = ParseIdStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(IdStrategy::Random),
            "hash" => Ok(IdStrategy::ContentHash),
            "sequential" => Ok(IdStrategy::Sequential),
            other => Err(ParseIdStrategyError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(id: &str) -> Concept {
        Concept::new(id, Some("thing".to_string()), [])
    }

    #[test]
    fn test_random_ids_in_range() {
        let mut ids = RandomIds::new();
        for _ in 0..1000 {
            assert!(ids.next_id(&concept("x")) < SYNTHETIC_ID_RANGE);
        }
    }

    #[test]
    fn test_seeded_random_ids_repeat() {
        let draw = |seed| {
            let mut ids = RandomIds::seeded(seed);
            (0..16).map(|_| ids.next_id(&concept("x"))).collect::<Vec<_>>()
        };
        assert_eq!(draw(7), draw(7));
    }

    #[test]
    fn test_content_hash_is_deterministic() {
        let mut ids = ContentHashIds;
        let first = ids.next_id(&concept("x1"));
        assert_eq!(first, ids.next_id(&concept("x1")));
        assert!(first < SYNTHETIC_ID_RANGE);
    }

    #[test]
    fn test_content_hash_is_pinned() {
        let mut ids = ContentHashIds;
        assert_eq!(ids.next_id(&concept("x1")), 6859);
        assert_eq!(ids.next_id(&concept("x2")), 3964);
        let with_child = Concept::new(
            "x1",
            Some("thing".to_string()),
            [IrNode::Relation(crate::ir::Named::new("near", []))],
        );
        assert_eq!(ids.next_id(&with_child), 3783);
    }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(b""), FNV_OFFSET_BASIS);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_sequential_wraps() {
        let mut ids = SequentialIds::starting_at(SYNTHETIC_ID_RANGE - 1);
        assert_eq!(ids.next_id(&concept("x")), SYNTHETIC_ID_RANGE - 1);
        assert_eq!(ids.next_id(&concept("x")), 0);
        assert_eq!(ids.next_id(&concept("x")), 1);
    }

    #[test]
    fn test_strategy_names() {
        for strategy in [
            IdStrategy::Random,
            IdStrategy::ContentHash,
            IdStrategy::Sequential,
        ] {
            assert_eq!(strategy.to_string().parse::<IdStrategy>().ok(), Some(strategy));
        }
        assert!("uuid".parse::<IdStrategy>().is_err());
    }
}
