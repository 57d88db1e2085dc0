use crate::{Method, epley};

/// A single performed set.
///
/// Missing values are treated as zero in all calculations.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Set {
    pub weight: Option<f32>,
    pub reps: Option<u32>,
    pub rpe: Option<f32>,
}

impl Set {
    #[must_use]
    pub const fn new(weight: f32, reps: u32) -> Self {
        Self {
            weight: Some(weight),
            reps: Some(reps),
            rpe: None,
        }
    }

    #[must_use]
    pub fn weight_or_zero(&self) -> f32 {
        self.weight.unwrap_or_default()
    }

    #[must_use]
    pub fn reps_or_zero(&self) -> u32 {
        self.reps.unwrap_or_default()
    }

    #[must_use]
    pub fn is_single(&self) -> bool {
        self.reps == Some(1)
    }

    /// Value of this set under the given method.
    ///
    /// A single repetition is its own one-rep max and is never extrapolated.
    #[must_use]
    pub fn contribution(&self, method: Method) -> f32 {
        match method {
            Method::MaxWeight => self.weight_or_zero(),
            Method::Epley => {
                if self.is_single() {
                    self.weight_or_zero()
                } else {
                    epley(self.weight_or_zero(), self.reps_or_zero())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::max_weight(Set::new(80.0, 5), Method::MaxWeight, 80.0)]
    #[case::epley(Set::new(80.0, 5), Method::Epley, 93.333)]
    #[case::epley_single(Set::new(100.0, 1), Method::Epley, 100.0)]
    #[case::epley_zero_reps(Set::new(100.0, 0), Method::Epley, 100.0)]
    #[case::missing_weight(Set { weight: None, reps: Some(5), rpe: None }, Method::Epley, 0.0)]
    #[case::missing_reps(Set { weight: Some(60.0), reps: None, rpe: Some(8.0) }, Method::Epley, 60.0)]
    #[case::empty(Set::default(), Method::MaxWeight, 0.0)]
    fn test_set_contribution(#[case] set: Set, #[case] method: Method, #[case] expected: f32) {
        assert_approx_eq!(set.contribution(method), expected, 0.001);
    }

    #[test]
    fn test_set_is_single() {
        assert!(Set::new(100.0, 1).is_single());
        assert!(!Set::new(100.0, 2).is_single());
        assert!(!Set::default().is_single());
        assert_eq!(Set::default().weight_or_zero(), 0.0);
        assert_eq!(Set::default().reps_or_zero(), 0);
    }
}
