//! Feature encoding
//!
//! Turns the sequence-builder output into a fixed-width numeric matrix:
//! indicator expansion for event types (current and lagged), day-of-week,
//! hour, and device attributes, plus three TF-IDF text blocks. Identifier,
//! timestamp, and raw categorical source columns never reach the matrix.

use crate::config::MarkovifyConfig;
use crate::error::{MarkovifyError, Result};
use crate::pipeline::sequence::SequenceBuilder;
use crate::schema::{
    AGENT_TYPES, BASELINE_DAY, BASELINE_EVENT, BASELINE_HOUR, DAY_NAMES, DEVICE_CATEGORIES,
    DEVICE_TYPES, EVENT_TYPES, HOURS_PER_DAY, OS_NAMES,
};
use crate::text::TfidfVectorizer;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Encoded dataset handed to downstream classifiers.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Row-major feature matrix, one row per valid event context.
    pub x: Array2<f64>,
    /// Next-action event codes, aligned with the matrix rows.
    pub y: Array1<i64>,
    /// Column labels for `x`, in column order.
    pub feature_names: Vec<String>,
}

impl FeatureSet {
    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

/// Stateful encoder from sequence rows to the numeric feature matrix.
///
/// The three text vectorizers are fit on the first batch and reused for
/// every later `transform`, so feature widths and column meanings stay
/// aligned across batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Featurizer {
    order: usize,
    referrer_tfidf: TfidfVectorizer,
    category_tfidf: TfidfVectorizer,
    page_tfidf: TfidfVectorizer,
    feature_names: Vec<String>,
    is_fitted: bool,
}

impl Featurizer {
    pub fn new(config: &MarkovifyConfig) -> Self {
        Self {
            order: config.order,
            referrer_tfidf: TfidfVectorizer::new(config.max_text_features),
            category_tfidf: TfidfVectorizer::new(config.max_text_features),
            page_tfidf: TfidfVectorizer::new(config.max_text_features),
            feature_names: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Column labels learned at fit time, empty before the first fit.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Fits the text vectorizers on this batch and encodes it.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<FeatureSet> {
        let referrer = string_column(df, "referrerurl")?;
        let category = string_column(df, "category")?;
        let pagetitle = string_column(df, "pagetitle")?;

        self.referrer_tfidf.fit(&referrer)?;
        self.category_tfidf.fit(&category)?;
        self.page_tfidf.fit(&pagetitle)?;
        self.is_fitted = true;

        let set = self.encode(df, &referrer, &category, &pagetitle)?;
        self.feature_names = set.feature_names.clone();
        Ok(set)
    }

    /// Encodes a later batch against the vectorizers fitted earlier. The
    /// output width always matches the fitted batch.
    pub fn transform(&self, df: &DataFrame) -> Result<FeatureSet> {
        if !self.is_fitted {
            return Err(MarkovifyError::NotFitted);
        }
        let referrer = string_column(df, "referrerurl")?;
        let category = string_column(df, "category")?;
        let pagetitle = string_column(df, "pagetitle")?;
        self.encode(df, &referrer, &category, &pagetitle)
    }

    fn encode(
        &self,
        df: &DataFrame,
        referrer: &[String],
        category: &[String],
        pagetitle: &[String],
    ) -> Result<FeatureSet> {
        let n = df.height();
        let eventtype = int_column(df, "eventtype")?;
        let dayofweek = int_column(df, "dayofweek")?;
        let hour = int_column(df, "hour")?;
        let nextaction = int_column(df, "nextaction")?;

        let lag_depth = self.order.saturating_sub(1);
        let mut lag_values: Vec<Vec<i64>> = Vec::with_capacity(lag_depth);
        for o in 1..=lag_depth {
            lag_values.push(int_column(df, &SequenceBuilder::lag_column(o))?);
        }

        let mut columns: Vec<(String, Vec<f64>)> = Vec::new();

        for name in ["quantity", "price"] {
            columns.push((name.to_string(), float_column(df, name)?));
        }
        for name in ["elapsedtime", "totalelapsedtime", "hist_ind"] {
            let values = int_column(df, name)?;
            columns.push((name.to_string(), values.iter().map(|&v| v as f64).collect()));
        }

        // event-type indicators for the current event and each lag, with the
        // baseline event and its lag variants left out
        for (code, name) in EVENT_TYPES {
            if name == BASELINE_EVENT {
                continue;
            }
            columns.push((name.to_string(), indicator(&eventtype, code)));
            for o in 1..=lag_depth {
                columns.push((format!("{name} {o}"), indicator(&lag_values[o - 1], code)));
            }
        }

        for (day, name) in DAY_NAMES.iter().enumerate() {
            if *name == BASELINE_DAY {
                continue;
            }
            columns.push((name.to_string(), indicator(&dayofweek, day as i64)));
        }

        for h in 0..HOURS_PER_DAY {
            if h == BASELINE_HOUR {
                continue;
            }
            columns.push((format!("Hour {h}"), indicator(&hour, h)));
        }

        // device groups keep their full vocabulary; Other and Unknown rows
        // encode as all-zero within each group
        device_group(&mut columns, df, "devicecategory", &DEVICE_CATEGORIES)?;
        device_group(&mut columns, df, "devicetype", &DEVICE_TYPES)?;
        device_group(&mut columns, df, "agenttype", &AGENT_TYPES)?;
        device_group(&mut columns, df, "os", &OS_NAMES)?;

        text_block(&mut columns, &self.referrer_tfidf, referrer)?;
        text_block(&mut columns, &self.category_tfidf, category)?;
        text_block(&mut columns, &self.page_tfidf, pagetitle)?;

        let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
        let data: Vec<&[f64]> = columns.iter().map(|(_, values)| values.as_slice()).collect();
        let x = Array2::from_shape_fn((n, names.len()), |(row, col)| data[col][row]);
        let y = Array1::from_vec(nextaction);

        debug!(rows = n, features = names.len(), "encoded feature matrix");
        Ok(FeatureSet {
            x,
            y,
            feature_names: names,
        })
    }
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let ca = df
        .column(name)
        .map_err(|_| MarkovifyError::ColumnNotFound(name.to_string()))?
        .str()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or("").to_string()).collect())
}

fn int_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let ca = df
        .column(name)
        .map_err(|_| MarkovifyError::ColumnNotFound(name.to_string()))?
        .i64()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(0)).collect())
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let ca = df
        .column(name)
        .map_err(|_| MarkovifyError::ColumnNotFound(name.to_string()))?
        .f64()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

fn indicator(values: &[i64], code: i64) -> Vec<f64> {
    values
        .iter()
        .map(|&v| if v == code { 1.0 } else { 0.0 })
        .collect()
}

fn device_group(
    columns: &mut Vec<(String, Vec<f64>)>,
    df: &DataFrame,
    source: &str,
    vocabulary: &[&str],
) -> Result<()> {
    let ca = df
        .column(source)
        .map_err(|_| MarkovifyError::ColumnNotFound(source.to_string()))?
        .str()?;
    for entry in vocabulary {
        let values: Vec<f64> = ca
            .into_iter()
            .map(|v| if v == Some(*entry) { 1.0 } else { 0.0 })
            .collect();
        columns.push((entry.to_string(), values));
    }
    Ok(())
}

fn text_block(
    columns: &mut Vec<(String, Vec<f64>)>,
    vectorizer: &TfidfVectorizer,
    documents: &[String],
) -> Result<()> {
    let matrix = vectorizer.transform(documents)?;
    for (idx, term) in vectorizer.feature_names().into_iter().enumerate() {
        columns.push((term, matrix.column(idx).to_vec()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequenced_frame() -> DataFrame {
        df!(
            "sessionid" => &["s1", "s1", "s2"],
            "createddate" => &[100i64, 110, 500],
            "eventtype" => &[3i64, 8, 1],
            "dayofweek" => &[1i64, 0, 5],
            "hour" => &[0i64, 13, 23],
            "nextaction" => &[1i64, 3, 6],
            "quantity" => &[1.0f64, 2.0, 0.0],
            "price" => &[9.99f64, 0.0, 5.0],
            "elapsedtime" => &[0i64, 10, 0],
            "totalelapsedtime" => &[0i64, 10, 0],
            "hist_ind" => &[0i64, 1, 0],
            "devicecategory" => &["iPhone", "Unknown", "Other"],
            "devicetype" => &["Smartphone", "Unknown", "Tablet"],
            "agenttype" => &["Mobile Browser", "Unknown", "Browser"],
            "os" => &["iOS", "Unknown", "Linux"],
            "referrerurl" => &["www.google.com", "", "www.google.com"],
            "category" => &["Shoes", "", "Hats"],
            "pagetitle" => &["Red Shoes Sale", "", "Winter Hats"],
        )
        .unwrap()
    }

    fn config() -> MarkovifyConfig {
        MarkovifyConfig::new()
    }

    fn col_index(set: &FeatureSet, name: &str) -> usize {
        set.feature_names
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("missing feature {name}"))
    }

    // fixed (non-text) width for order 1: 5 passthrough + 7 events +
    // 6 days + 23 hours + 19 device entries
    const FIXED_WIDTH: usize = 60;

    #[test]
    fn test_feature_names_exclude_baselines_and_sources() {
        let mut featurizer = Featurizer::new(&config());
        let set = featurizer.fit_transform(&sequenced_frame()).unwrap();

        for absent in [
            "Add to Watchlist",
            "Monday",
            "Hour 0",
            "sessionid",
            "createddate",
            "userid",
            "deviceid",
            "nextaction",
            "eventtype",
            "dayofweek",
            "hour",
            "devicecategory",
            "referrerurl",
            "category",
            "pagetitle",
        ] {
            assert!(
                !set.feature_names.contains(&absent.to_string()),
                "{absent} should not be a feature"
            );
        }

        for present in ["quantity", "price", "elapsedtime", "totalelapsedtime", "hist_ind"] {
            assert!(set.feature_names.contains(&present.to_string()));
        }
        for (_, name) in EVENT_TYPES {
            if name != BASELINE_EVENT {
                assert!(set.feature_names.contains(&name.to_string()));
            }
        }
        for name in DEVICE_CATEGORIES.iter().chain(&DEVICE_TYPES).chain(&AGENT_TYPES).chain(&OS_NAMES)
        {
            assert!(set.feature_names.contains(&name.to_string()));
        }
    }

    #[test]
    fn test_width_is_fixed_part_plus_text_vocabularies() {
        let mut featurizer = Featurizer::new(&config());
        let set = featurizer.fit_transform(&sequenced_frame()).unwrap();

        // referrer {www, google, com}, category {shoes, hats},
        // pagetitle {red, shoes, sale, winter, hats}
        assert_eq!(set.n_features(), FIXED_WIDTH + 3 + 2 + 5);
        assert_eq!(set.n_rows(), 3);
        assert_eq!(set.feature_names.len(), set.n_features());
    }

    #[test]
    fn test_indicator_values() {
        let mut featurizer = Featurizer::new(&config());
        let set = featurizer.fit_transform(&sequenced_frame()).unwrap();

        assert_eq!(set.x[[0, col_index(&set, "Add to Cart")]], 1.0);
        assert_eq!(set.x[[0, col_index(&set, "Page View")]], 0.0);
        assert_eq!(set.x[[2, col_index(&set, "Page View")]], 1.0);

        assert_eq!(set.x[[0, col_index(&set, "Tuesday")]], 1.0);
        assert_eq!(set.x[[2, col_index(&set, "Saturday")]], 1.0);
        assert_eq!(set.x[[1, col_index(&set, "Hour 13")]], 1.0);
        assert_eq!(set.x[[2, col_index(&set, "Hour 23")]], 1.0);

        assert_eq!(set.x[[0, col_index(&set, "iPhone")]], 1.0);
        assert_eq!(set.x[[0, col_index(&set, "Smartphone")]], 1.0);
        assert_eq!(set.x[[2, col_index(&set, "Tablet")]], 1.0);
        assert_eq!(set.x[[0, col_index(&set, "hist_ind")]], 0.0);
        assert_eq!(set.x[[1, col_index(&set, "hist_ind")]], 1.0);
    }

    #[test]
    fn test_baseline_event_row_has_all_zero_event_indicators() {
        let mut featurizer = Featurizer::new(&config());
        let set = featurizer.fit_transform(&sequenced_frame()).unwrap();

        // row 1 is the baseline "Add to Watchlist" event
        for (_, name) in EVENT_TYPES {
            if name == BASELINE_EVENT {
                continue;
            }
            assert_eq!(set.x[[1, col_index(&set, name)]], 0.0, "{name}");
        }
    }

    #[test]
    fn test_monday_and_hour_zero_rows_have_all_zero_group_indicators() {
        let mut featurizer = Featurizer::new(&config());
        let set = featurizer.fit_transform(&sequenced_frame()).unwrap();

        // row 1 falls on Monday, row 0 in hour 0
        for name in DAY_NAMES {
            if name != BASELINE_DAY {
                assert_eq!(set.x[[1, col_index(&set, name)]], 0.0, "{name}");
            }
        }
        for h in 1..HOURS_PER_DAY {
            assert_eq!(set.x[[0, col_index(&set, &format!("Hour {h}"))]], 0.0);
        }
    }

    #[test]
    fn test_unknown_and_other_devices_encode_all_zero() {
        let mut featurizer = Featurizer::new(&config());
        let set = featurizer.fit_transform(&sequenced_frame()).unwrap();

        // row 1 is Unknown (no device match), row 2 is Other
        for row in [1usize, 2] {
            for name in DEVICE_CATEGORIES {
                assert_eq!(set.x[[row, col_index(&set, name)]], 0.0, "row {row} {name}");
            }
        }
        for name in OS_NAMES {
            assert_eq!(set.x[[1, col_index(&set, name)]], 0.0);
        }
    }

    #[test]
    fn test_labels_are_nextaction_codes() {
        let mut featurizer = Featurizer::new(&config());
        let set = featurizer.fit_transform(&sequenced_frame()).unwrap();
        assert_eq!(set.y.to_vec(), vec![1, 3, 6]);
    }

    #[test]
    fn test_text_features_follow_document_content() {
        let mut featurizer = Featurizer::new(&config());
        let set = featurizer.fit_transform(&sequenced_frame()).unwrap();

        let google = col_index(&set, "google");
        assert!(set.x[[0, google]] > 0.0);
        assert_eq!(set.x[[1, google]], 0.0);
        assert!(set.x[[2, google]] > 0.0);
    }

    #[test]
    fn test_lag_variants_for_order_two() {
        let mut df = sequenced_frame();
        df.with_column(Column::new("1prioraction".into(), vec![1i64, 3, 8]))
            .unwrap();

        let mut featurizer = Featurizer::new(&config().with_order(2));
        let set = featurizer.fit_transform(&df).unwrap();

        assert!(set.feature_names.contains(&"Page View 1".to_string()));
        assert!(!set.feature_names.contains(&"Add to Watchlist 1".to_string()));
        assert_eq!(set.n_features(), FIXED_WIDTH + 7 + 3 + 2 + 5);

        assert_eq!(set.x[[0, col_index(&set, "Page View 1")]], 1.0);
        assert_eq!(set.x[[1, col_index(&set, "Add to Cart 1")]], 1.0);
        // row 2's lag is the baseline event: every lag indicator is zero
        for (_, name) in EVENT_TYPES {
            if name == BASELINE_EVENT {
                continue;
            }
            let idx = col_index(&set, &format!("{name} 1"));
            assert_eq!(set.x[[2, idx]], 0.0);
        }
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let featurizer = Featurizer::new(&config());
        let err = featurizer.transform(&sequenced_frame()).unwrap_err();
        assert!(matches!(err, MarkovifyError::NotFitted));
    }

    #[test]
    fn test_transform_keeps_width_on_unseen_text() {
        let mut featurizer = Featurizer::new(&config());
        let fitted = featurizer.fit_transform(&sequenced_frame()).unwrap();

        let mut later = sequenced_frame();
        later
            .with_column(Column::new(
                "pagetitle".into(),
                vec!["Completely Unrelated Words"; 3],
            ))
            .unwrap();
        let transformed = featurizer.transform(&later).unwrap();

        assert_eq!(transformed.n_features(), fitted.n_features());
        assert_eq!(transformed.feature_names, fitted.feature_names);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let df = sequenced_frame().drop("hist_ind").unwrap();
        let mut featurizer = Featurizer::new(&config());
        let err = featurizer.fit_transform(&df).unwrap_err();
        assert!(matches!(err, MarkovifyError::ColumnNotFound(_)));
    }
}
