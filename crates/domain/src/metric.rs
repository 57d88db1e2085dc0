use std::str::FromStr;

use derive_more::Display;

use crate::Set;

/// How a list of sets is reduced to a single performance value.
#[derive(Debug, Default, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    #[display("maxWeight")]
    MaxWeight,
    #[display("epley")]
    Epley,
}

impl FromStr for Method {
    type Err = MethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maxWeight" => Ok(Method::MaxWeight),
            "epley" => Ok(Method::Epley),
            _ => Err(MethodError::Unknown(s.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MethodError {
    #[error("Unknown metric method \"{0}\" (expected \"maxWeight\" or \"epley\")")]
    Unknown(String),
}

/// Estimated one-rep max: `weight * (1 + reps / 30)`.
#[must_use]
pub fn epley(weight: f32, reps: u32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let reps = reps as f32;
    weight * (1.0 + reps / 30.0)
}

/// Best value over all sets, or `None` if there are no sets.
#[must_use]
pub fn best_metric(sets: &[Set], method: Method) -> Option<f32> {
    sets.iter()
        .map(|set| set.contribution(method))
        .max_by(f32::total_cmp)
}

/// The first set reaching the maximum weight.
#[must_use]
pub fn best_set(sets: &[Set]) -> Option<&Set> {
    sets.iter().reduce(|best, set| {
        if set.weight_or_zero() > best.weight_or_zero() {
            set
        } else {
            best
        }
    })
}
