//! Staged next-action pipeline
//!
//! Raw inputs flow strictly loader -> device joiner -> history annotator ->
//! optional sampler -> sequence builder -> featurizer. [`Markovify`] owns
//! the configuration and the fitted featurizer state and exposes the whole
//! chain as a single call.

pub mod device;
pub mod featurize;
pub mod history;
pub mod loader;
pub mod sampling;
pub mod sequence;

pub use featurize::{FeatureSet, Featurizer};
pub use sequence::SequenceBuilder;

use crate::config::MarkovifyConfig;
use crate::error::Result;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// End-to-end next-action dataset builder.
///
/// Construction validates the configuration, so a `Markovify` value can
/// only exist with usable settings. The featurizer inside is fit by the
/// first [`run`]/[`run_frames`] call and reused by [`transform_frames`],
/// keeping later batches column-compatible with the first.
///
/// [`run`]: Markovify::run
/// [`run_frames`]: Markovify::run_frames
/// [`transform_frames`]: Markovify::transform_frames
#[derive(Debug)]
pub struct Markovify {
    config: MarkovifyConfig,
    featurizer: Featurizer,
}

impl Markovify {
    pub fn new(config: MarkovifyConfig) -> Result<Self> {
        config.validate()?;
        let featurizer = Featurizer::new(&config);
        Ok(Self { config, featurizer })
    }

    pub fn config(&self) -> &MarkovifyConfig {
        &self.config
    }

    pub fn featurizer(&self) -> &Featurizer {
        &self.featurizer
    }

    /// Builds the dataset from the two raw input files.
    pub fn run(&mut self, session_path: &Path, device_path: &Path) -> Result<FeatureSet> {
        let session = loader::load_sessions(session_path)?;
        let device = loader::load_devices(device_path)?;
        self.run_cleaned(session, &device)
    }

    /// Builds the dataset from already-loaded raw frames carrying the
    /// schema column names. Useful when the caller reads the files itself.
    pub fn run_frames(&mut self, session_raw: &DataFrame, device_raw: &DataFrame) -> Result<FeatureSet> {
        let session = loader::clean_sessions(session_raw)?;
        self.run_cleaned(session, device_raw)
    }

    /// Encodes a later batch with the featurizer state fitted by the first
    /// run. Sampling never applies here; inference batches are complete.
    pub fn transform_frames(
        &self,
        session_raw: &DataFrame,
        device_raw: &DataFrame,
    ) -> Result<FeatureSet> {
        let session = loader::clean_sessions(session_raw)?;
        let joined = device::join_devices(&session, device_raw)?;
        let annotated = history::annotate_prior_history(&joined)?;
        let sequenced = SequenceBuilder::new(self.config.order).build(&annotated)?;
        self.featurizer.transform(&sequenced)
    }

    fn run_cleaned(&mut self, session: DataFrame, device: &DataFrame) -> Result<FeatureSet> {
        debug!(rows = session.height(), "cleaned session table");
        let joined = device::join_devices(&session, device)?;
        let annotated = history::annotate_prior_history(&joined)?;

        let sampled = if self.config.subset > 0.0 {
            sampling::sample_sessions(&annotated, self.config.subset, self.config.random_state)?
        } else {
            annotated
        };

        let sequenced = SequenceBuilder::new(self.config.order).build(&sampled)?;
        let set = self.featurizer.fit_transform(&sequenced)?;
        info!(
            rows = set.n_rows(),
            features = set.n_features(),
            order = self.config.order,
            "built next-action dataset"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarkovifyError;

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = Markovify::new(MarkovifyConfig::new().with_order(0)).unwrap_err();
        assert!(matches!(err, MarkovifyError::ConfigError(_)));

        let err = Markovify::new(MarkovifyConfig::new().with_subset(2.0)).unwrap_err();
        assert!(matches!(err, MarkovifyError::ConfigError(_)));
    }

    #[test]
    fn test_new_accepts_valid_config() {
        let pipeline = Markovify::new(MarkovifyConfig::new().with_order(3)).unwrap();
        assert_eq!(pipeline.config().order, 3);
        assert!(!pipeline.featurizer().is_fitted());
    }
}
