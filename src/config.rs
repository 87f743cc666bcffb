//! Pipeline configuration

use crate::error::{MarkovifyError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the next-action feature pipeline.
///
/// Built with the `with_*` methods and checked once by [`validate`] before
/// any data is touched, so misuse surfaces as a [`MarkovifyError::ConfigError`]
/// instead of a silently wrong dataset.
///
/// [`validate`]: MarkovifyConfig::validate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkovifyConfig {
    /// Markov order: number of consecutive events forming one training
    /// context. `order = 1` derives only the next-action label; higher
    /// orders add `order - 1` prior-action columns per row.
    pub order: usize,

    /// Fraction of whole sessions held out by the sampling stage, in
    /// `[0, 1]`. `0.0` disables sampling and keeps every session.
    pub subset: f64,

    /// Vocabulary bound for each TF-IDF text block.
    pub max_text_features: usize,

    /// Seed for session sampling and fold shuffling. `None` draws from
    /// entropy, making those stages non-deterministic.
    pub random_state: Option<u64>,
}

impl Default for MarkovifyConfig {
    fn default() -> Self {
        Self {
            order: 1,
            subset: 0.0,
            max_text_features: 100,
            random_state: None,
        }
    }
}

impl MarkovifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn with_subset(mut self, subset: f64) -> Self {
        self.subset = subset;
        self
    }

    pub fn with_max_text_features(mut self, max_text_features: usize) -> Self {
        self.max_text_features = max_text_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Rejects unusable settings before the first data pass.
    pub fn validate(&self) -> Result<()> {
        if self.order < 1 {
            return Err(MarkovifyError::ConfigError(format!(
                "order must be at least 1, got {}",
                self.order
            )));
        }
        if !self.subset.is_finite() || !(0.0..=1.0).contains(&self.subset) {
            return Err(MarkovifyError::ConfigError(format!(
                "subset must lie in [0, 1], got {}",
                self.subset
            )));
        }
        if self.max_text_features < 1 {
            return Err(MarkovifyError::ConfigError(
                "max_text_features must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of prior-action columns derived per row.
    pub fn lag_depth(&self) -> usize {
        self.order.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MarkovifyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.order, 1);
        assert_eq!(config.subset, 0.0);
        assert_eq!(config.max_text_features, 100);
        assert_eq!(config.lag_depth(), 0);
    }

    #[test]
    fn test_builder_methods() {
        let config = MarkovifyConfig::new()
            .with_order(3)
            .with_subset(0.25)
            .with_max_text_features(50)
            .with_random_state(42);
        assert!(config.validate().is_ok());
        assert_eq!(config.order, 3);
        assert_eq!(config.subset, 0.25);
        assert_eq!(config.max_text_features, 50);
        assert_eq!(config.random_state, Some(42));
        assert_eq!(config.lag_depth(), 2);
    }

    #[test]
    fn test_zero_order_is_rejected() {
        let config = MarkovifyConfig::new().with_order(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, MarkovifyError::ConfigError(_)));
    }

    #[test]
    fn test_out_of_range_subset_is_rejected() {
        for subset in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            let config = MarkovifyConfig::new().with_subset(subset);
            assert!(
                config.validate().is_err(),
                "subset {subset} should be rejected"
            );
        }
        assert!(MarkovifyConfig::new().with_subset(1.0).validate().is_ok());
    }

    #[test]
    fn test_zero_text_features_is_rejected() {
        let config = MarkovifyConfig::new().with_max_text_features(0);
        assert!(config.validate().is_err());
    }
}
