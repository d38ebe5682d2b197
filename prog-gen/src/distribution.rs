use rand::distributions;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Distribution {
    Uniform(usize, usize),
    Const(usize),
}

impl Distribution {
    pub fn new_uniform_inclusive(low: usize, high: usize) -> Distribution {
        assert!(low <= high);
        Distribution::Uniform(low, high)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match self {
            Distribution::Uniform(low, high) => {
                rng.sample(distributions::Uniform::new_inclusive(*low, *high))
            }
            Distribution::Const(value) => *value,
        }
    }

    pub fn min(&self) -> usize {
        match self {
            Distribution::Uniform(low, _) => *low,
            Distribution::Const(value) => *value,
        }
    }

    pub fn max(&self) -> usize {
        match self {
            Distribution::Uniform(_, high) => *high,
            Distribution::Const(value) => *value,
        }
    }

    pub fn none() -> Distribution {
        Distribution::Const(0)
    }
}
