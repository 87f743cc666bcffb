//! Markovify - session next-action feature pipeline
//!
//! This crate turns raw event-session logs (page views, cart actions,
//! purchases) and device metadata into a supervised-learning dataset for
//! predicting a user's next action:
//! - Loading and cleaning of the headerless session and device exports
//! - Device attribute normalization and composite-key join
//! - Prior-session history annotation and whole-session sampling
//! - Configurable-order lag/lead sequence features per session
//! - Indicator and TF-IDF encoding into a numeric feature matrix
//!
//! # Modules
//!
//! - [`pipeline`] - The staged pipeline and the [`Markovify`] entry point
//! - [`config`] - Pipeline configuration and validation
//! - [`schema`] - Fixed file layouts, event codes, device vocabularies
//! - [`text`] - TF-IDF vectorization for the free-text columns
//! - [`model`] - Classifier seam, baseline model, cross-validated scoring
//! - [`cli`] - Command-line interface
//! - [`error`] - Error types

// Core error handling
pub mod error;

// Configuration and fixed data contracts
pub mod config;
pub mod schema;

// Pipeline stages and orchestration
pub mod pipeline;

// Text features
pub mod text;

// Classifier seam and scoring
pub mod model;

// Command-line interface
pub mod cli;

pub use config::MarkovifyConfig;
pub use error::{MarkovifyError, Result};
pub use pipeline::{FeatureSet, Featurizer, Markovify, SequenceBuilder};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{MarkovifyError, Result};

    // Pipeline
    pub use crate::config::MarkovifyConfig;
    pub use crate::pipeline::{FeatureSet, Featurizer, Markovify, SequenceBuilder};

    // Text features
    pub use crate::text::{TextTokenizer, TfidfVectorizer};

    // Modeling
    pub use crate::model::{cross_val_accuracy, CVResults, Classifier, MajorityClass};
}
