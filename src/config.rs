//! Settings for running a chain.

use crate::util::{DagmcError, Result};

/// How moves adapt their step sizes during burn-in
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TuningSettings {

    /// The acceptance rate moves are tuned toward
    pub target_acceptance: f64

}

impl Default for TuningSettings {
    fn default() -> Self {
        TuningSettings { target_acceptance: 0.44 }
    }
}

impl TuningSettings {

    pub fn with_target_acceptance(mut self, target: f64) -> Self {
        self.target_acceptance = target;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_acceptance > 0.0 && self.target_acceptance < 1.0 {
            Ok(())
        } else {
            Err(DagmcError::InvalidParameter(
                format!("target acceptance rate must be in (0, 1), got {}", self.target_acceptance)
            ))
        }
    }

}

/// Settings of an `Mcmc` chain
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct McmcSettings {

    /// The power applied to prior ratios
    pub prior_heat: f64,

    /// The power applied to likelihood ratios
    pub likelihood_heat: f64,

    /// The number of generations between tunes during burn-in
    pub tuning_interval: usize,

    /// Seed of the chain's random number generator; `None` seeds from entropy
    pub seed: Option<u64>,

    pub tuning: TuningSettings

}

impl Default for McmcSettings {
    fn default() -> Self {
        McmcSettings {
            prior_heat: 1.0,
            likelihood_heat: 1.0,
            tuning_interval: 100,
            seed: None,
            tuning: TuningSettings::default()
        }
    }
}

impl McmcSettings {

    pub fn with_prior_heat(mut self, heat: f64) -> Self {
        self.prior_heat = heat;
        self
    }

    pub fn with_likelihood_heat(mut self, heat: f64) -> Self {
        self.likelihood_heat = heat;
        self
    }

    pub fn with_tuning_interval(mut self, interval: usize) -> Self {
        self.tuning_interval = interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tuning(mut self, tuning: TuningSettings) -> Self {
        self.tuning = tuning;
        self
    }

    /// # Errors
    /// `InvalidParameter` for a heat that is negative or not finite, a zero tuning interval, or
    /// invalid tuning settings
    pub fn validate(&self) -> Result<()> {
        for &(name, heat) in &[("prior heat", self.prior_heat), ("likelihood heat", self.likelihood_heat)] {
            if !(heat.is_finite() && heat >= 0.0) {
                return Err(DagmcError::InvalidParameter(format!("{} must be finite and non-negative, got {}", name, heat)));
            }
        }

        if self.tuning_interval == 0 {
            return Err(DagmcError::InvalidParameter(String::from("tuning interval must be positive")));
        }

        self.tuning.validate()
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = McmcSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(1.0, settings.prior_heat);
        assert_eq!(1.0, settings.likelihood_heat);
        assert_eq!(0.44, settings.tuning.target_acceptance);
        assert_eq!(None, settings.seed);
    }

    #[test]
    fn builder() {
        let settings = McmcSettings::default()
            .with_prior_heat(0.5)
            .with_likelihood_heat(0.25)
            .with_tuning_interval(10)
            .with_seed(7)
            .with_tuning(TuningSettings::default().with_target_acceptance(0.3));

        assert!(settings.validate().is_ok());
        assert_eq!(0.5, settings.prior_heat);
        assert_eq!(0.25, settings.likelihood_heat);
        assert_eq!(10, settings.tuning_interval);
        assert_eq!(Some(7), settings.seed);
        assert_eq!(0.3, settings.tuning.target_acceptance);
    }

    #[test]
    fn invalid_settings() {
        assert!(McmcSettings::default().with_prior_heat(f64::NAN).validate().is_err());
        assert!(McmcSettings::default().with_likelihood_heat(-1.0).validate().is_err());
        assert!(McmcSettings::default().with_tuning_interval(0).validate().is_err());

        let tuning = TuningSettings::default().with_target_acceptance(1.0);
        assert!(tuning.validate().is_err());
        assert!(McmcSettings::default().with_tuning(tuning).validate().is_err());
        assert!(TuningSettings::default().with_target_acceptance(0.0).validate().is_err());
    }
}
