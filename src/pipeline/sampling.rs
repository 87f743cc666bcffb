//! Whole-session sampling
//!
//! Subsampling operates on sessions, never on individual rows, so a sampled
//! dataset still contains only complete event sequences.

use crate::error::{MarkovifyError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use tracing::debug;

/// Keeps a held-out fraction of whole sessions.
///
/// Unique session ids are collected in first-appearance order, shuffled with
/// a ChaCha8 generator, and the first `ceil(fraction * n)` of them are
/// retained together with all their rows. A given seed always selects the
/// same sessions for the same input.
pub fn sample_sessions(
    df: &DataFrame,
    fraction: f64,
    random_state: Option<u64>,
) -> Result<DataFrame> {
    if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
        return Err(MarkovifyError::ConfigError(format!(
            "sample fraction must lie in [0, 1], got {fraction}"
        )));
    }

    let sessionid = df.column("sessionid")?.str()?;

    let mut unique: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for value in sessionid.into_iter().flatten() {
        if seen.insert(value) {
            unique.push(value);
        }
    }

    let mut rng = match random_state {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    unique.shuffle(&mut rng);

    let n_heldout = ((unique.len() as f64) * fraction).ceil() as usize;
    let n_heldout = n_heldout.min(unique.len());
    let heldout: HashSet<&str> = unique[..n_heldout].iter().copied().collect();

    let keep: Vec<bool> = (0..df.height())
        .map(|i| sessionid.get(i).is_some_and(|v| heldout.contains(v)))
        .collect();
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let sampled = df.filter(&mask)?;

    debug!(
        sessions = unique.len(),
        kept_sessions = n_heldout,
        rows = sampled.height(),
        "sampled held-out sessions"
    );
    Ok(sampled)
}
