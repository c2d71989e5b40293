//! Workload generator for deterministic simulation testing.
//!
//! This module generates random but reproducible request sequences against a
//! tree, including input that the tree's value domain must reject.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ops::Operation;
use crate::types::ValueDomain;

/// Configuration for workload generation.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Probability of generating malformed input (0.0 - 1.0).
    pub malformed_rate: f64,
    /// Probability of an insert.
    pub insert_rate: f64,
    /// Probability of a removal. Whatever is left over is searched.
    pub remove_rate: f64,
    /// Numeric values are drawn from `0..value_range`. Small ranges promote
    /// duplicate inserts and successful removals.
    pub value_range: i64,
    /// Size of the word pool for text trees.
    pub word_pool_size: usize,
    /// Maximum generated word length.
    pub max_word_length: usize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            malformed_rate: 0.0,
            insert_rate: 0.5,
            remove_rate: 0.3,
            value_range: 64,
            word_pool_size: 48,
            max_word_length: 6,
        }
    }
}

/// Ways raw input can fall outside a value domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformationType {
    /// Empty input.
    Empty,
    /// Letters where digits are expected.
    NonNumeric,
    /// A decimal fraction.
    Fractional,
    /// Digits that do not fit in an `i64`.
    Overflow,
}

impl MalformationType {
    /// All malformation types.
    pub const ALL: [Self; 4] = [
        Self::Empty,
        Self::NonNumeric,
        Self::Fractional,
        Self::Overflow,
    ];

    /// Whether input of this kind is invalid for `domain`.
    #[must_use]
    pub const fn applies_to(self, domain: ValueDomain) -> bool {
        match domain {
            ValueDomain::Numeric => true,
            ValueDomain::Lexical => matches!(self, Self::Empty),
        }
    }

    /// Raw input exhibiting this malformation.
    #[must_use]
    pub fn input(self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::NonNumeric => "twelve".to_string(),
            Self::Fractional => "4.5".to_string(),
            Self::Overflow => "99999999999999999999".to_string(),
        }
    }
}

/// One generated request: an operation plus its raw, unparsed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub operation: Operation,
    pub input: String,
    /// Set when the input was generated to be rejected.
    pub malformation: Option<MalformationType>,
}

/// Generator for random [`Request`]s.
///
/// This generator produces deterministic sequences of requests given the
/// same seed, enabling reproducible testing.
pub struct WorkloadGenerator {
    rng: StdRng,
    domain: ValueDomain,
    config: WorkloadConfig,
    /// Pool of words for text trees. Reuse promotes duplicates.
    word_pool: Vec<String>,
}

impl WorkloadGenerator {
    /// Create a new workload generator with the given seed.
    #[must_use]
    pub fn new(seed: u64, domain: ValueDomain) -> Self {
        Self::with_config(seed, domain, WorkloadConfig::default())
    }

    /// Create a new workload generator with custom configuration.
    #[must_use]
    pub fn with_config(seed: u64, domain: ValueDomain, config: WorkloadConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let max_len = config.max_word_length.max(1);
        let word_pool = (0..config.word_pool_size.max(1))
            .map(|_| {
                let len = rng.random_range(1..=max_len);
                (0..len)
                    .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
                    .collect()
            })
            .collect();

        Self {
            rng,
            domain,
            config,
            word_pool,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Generate the next request.
    ///
    /// This may generate well-formed or malformed input depending on the
    /// configuration.
    pub fn next_request(&mut self) -> Request {
        let should_malform = self.rng.random::<f64>() < self.config.malformed_rate;

        if should_malform {
            self.generate_malformed_request()
        } else {
            self.generate_wellformed_request()
        }
    }

    /// Generate a request whose input belongs to the domain.
    pub fn generate_wellformed_request(&mut self) -> Request {
        let operation = self.pick_operation();
        let input = match self.domain {
            ValueDomain::Numeric => self
                .rng
                .random_range(0..self.config.value_range.max(1))
                .to_string(),
            ValueDomain::Lexical => {
                let index = self.rng.random_range(0..self.word_pool.len());
                self.word_pool[index].clone()
            }
        };

        Request {
            operation,
            input,
            malformation: None,
        }
    }

    /// Generate a request whose input the domain must reject.
    pub fn generate_malformed_request(&mut self) -> Request {
        let candidates: Vec<MalformationType> = MalformationType::ALL
            .into_iter()
            .filter(|m| m.applies_to(self.domain))
            .collect();
        let malformation = candidates[self.rng.random_range(0..candidates.len())];
        let operation = self.pick_operation();

        Request {
            operation,
            input: malformation.input(),
            malformation: Some(malformation),
        }
    }

    /// A uniform draw in `0.0..1.0`, for callers sharing this generator's
    /// seed.
    pub fn chance(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// A uniform draw in `0..upper`. Returns 0 when `upper` is 0.
    pub fn below(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        self.rng.random_range(0..upper)
    }

    fn pick_operation(&mut self) -> Operation {
        let roll = self.rng.random::<f64>();
        if roll < self.config.insert_rate {
            Operation::Insert
        } else if roll < self.config.insert_rate + self.config.remove_rate {
            Operation::Remove
        } else {
            Operation::Search
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_deterministic() {
        let mut gen1 = WorkloadGenerator::new(42, ValueDomain::Numeric);
        let mut gen2 = WorkloadGenerator::new(42, ValueDomain::Numeric);

        for _ in 0..100 {
            assert_eq!(gen1.next_request(), gen2.next_request());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut gen1 = WorkloadGenerator::new(1, ValueDomain::Lexical);
        let mut gen2 = WorkloadGenerator::new(2, ValueDomain::Lexical);

        let a: Vec<Request> = (0..20).map(|_| gen1.next_request()).collect();
        let b: Vec<Request> = (0..20).map(|_| gen2.next_request()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wellformed_input_parses() {
        for domain in [ValueDomain::Numeric, ValueDomain::Lexical] {
            let mut generator = WorkloadGenerator::new(7, domain);
            for _ in 0..200 {
                let request = generator.generate_wellformed_request();
                assert!(request.malformation.is_none());
                assert!(
                    domain.parse(&request.input).is_ok(),
                    "{:?} should parse as {domain}",
                    request.input
                );
            }
        }
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        for domain in [ValueDomain::Numeric, ValueDomain::Lexical] {
            let mut generator = WorkloadGenerator::new(9, domain);
            for _ in 0..50 {
                let request = generator.generate_malformed_request();
                assert!(request.malformation.is_some());
                assert!(domain.parse(&request.input).is_err());
            }
        }
    }

    #[test]
    fn test_every_malformation_rejected_where_it_applies() {
        for malformation in MalformationType::ALL {
            for domain in [ValueDomain::Numeric, ValueDomain::Lexical] {
                if malformation.applies_to(domain) {
                    assert!(domain.parse(&malformation.input()).is_err());
                }
            }
        }
    }

    #[test]
    fn test_operation_mix() {
        let config = WorkloadConfig {
            insert_rate: 1.0,
            remove_rate: 0.0,
            ..WorkloadConfig::default()
        };
        let mut generator = WorkloadGenerator::with_config(3, ValueDomain::Numeric, config);
        for _ in 0..50 {
            assert_eq!(generator.next_request().operation, Operation::Insert);
        }
    }
}
