use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CENTS_PER_UNIT, Cents, Points, deserialize_amount};

/// How end-of-day spend turns into points, and what a redeemed point is worth.
///
/// Rates are whole currency units per point. A customer whose net daily spend is
/// strictly above `award_cutoff` earns at `premium_rate`, everyone else at `base_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
    /// Net daily spend above which the premium rate applies
    #[serde(deserialize_with = "deserialize_amount")]
    pub award_cutoff: Cents,
    /// Currency units per point at or below the cutoff
    pub base_rate: i64,
    /// Currency units per point above the cutoff
    pub premium_rate: i64,
    /// Amount one redeemed point takes off a purchase
    #[serde(deserialize_with = "deserialize_amount")]
    pub point_value: Cents,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            award_cutoff: 250 * CENTS_PER_UNIT,
            base_rate: 18,
            premium_rate: 17,
            point_value: CENTS_PER_UNIT,
        }
    }
}

impl RewardPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.base_rate <= 0 {
            return Err(PolicyError::NonPositiveRate("base_rate", self.base_rate));
        }
        if self.premium_rate <= 0 {
            return Err(PolicyError::NonPositiveRate(
                "premium_rate",
                self.premium_rate,
            ));
        }
        if self.point_value <= 0 {
            return Err(PolicyError::NonPositivePointValue(self.point_value));
        }
        if self.award_cutoff < 0 {
            return Err(PolicyError::NegativeCutoff(self.award_cutoff));
        }
        Ok(())
    }

    /// Currency units per point for a given net daily spend.
    pub fn rate_for(&self, spend: Cents) -> i64 {
        if spend > self.award_cutoff {
            self.premium_rate
        } else {
            self.base_rate
        }
    }

    /// Points earned for a day's net spend (floor division). Non-positive spend earns nothing.
    pub fn award_for(&self, spend: Cents) -> Points {
        if spend <= 0 {
            return 0;
        }
        spend / self.rate_for(spend).saturating_mul(CENTS_PER_UNIT)
    }

    /// Currency value of redeemed points.
    pub fn redemption_value(&self, points: Points) -> Cents {
        points.saturating_mul(self.point_value)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{0} must be positive, got {1}")]
    NonPositiveRate(&'static str, i64),

    #[error("point_value must be positive, got {0} cents")]
    NonPositivePointValue(Cents),

    #[error("award_cutoff must not be negative, got {0} cents")]
    NegativeCutoff(Cents),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.award_cutoff, 25000);
        assert_eq!(policy.base_rate, 18);
        assert_eq!(policy.premium_rate, 17);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_rate_boundary_is_strict() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.rate_for(25000), 18);
        assert_eq!(policy.rate_for(25001), 17);
        assert_eq!(policy.rate_for(25100), 17);
        assert_eq!(policy.rate_for(0), 18);
    }

    #[test]
    fn test_award_floors() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.award_for(25000), 13); // 250 / 18
        assert_eq!(policy.award_for(25100), 14); // 251 / 17
        assert_eq!(policy.award_for(15000), 8); // 150 / 18
        assert_eq!(policy.award_for(1799), 0);
        assert_eq!(policy.award_for(1800), 1);
    }

    #[test]
    fn test_award_ignores_non_positive_spend() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.award_for(0), 0);
        assert_eq!(policy.award_for(-5000), 0);
    }

    #[test]
    fn test_extreme_values_saturate() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.redemption_value(Points::MAX), Cents::MAX);
        assert_eq!(policy.award_for(Cents::MAX), Cents::MAX / 1700);

        let steep = RewardPolicy {
            premium_rate: i64::MAX,
            ..RewardPolicy::default()
        };
        assert_eq!(steep.award_for(Cents::MAX), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let policy = RewardPolicy {
            base_rate: 0,
            ..RewardPolicy::default()
        };
        assert_eq!(
            policy.validate(),
            Err(PolicyError::NonPositiveRate("base_rate", 0))
        );

        let policy = RewardPolicy {
            point_value: 0,
            ..RewardPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::NonPositivePointValue(0))
        ));
    }
}
