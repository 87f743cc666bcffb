//! Raw file loading and cleaning
//!
//! Both inputs are headerless CSV exports, so columns are bound by position
//! against the layouts in [`crate::schema`]. Cleaning applies the null
//! policy, the hard row filter, and the derived time and URL fields in one
//! typed pass, leaving a table the later stages can consume without
//! re-parsing anything.

use crate::error::{MarkovifyError, Result};
use crate::schema::{DEVICE_COLUMNS, SESSION_COLUMNS, UNKNOWN};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Loads and cleans the raw session-event file.
///
/// Output columns: `sessionid`, `category`, `createddate` (epoch seconds),
/// `pagetitle`, `userid`, `providerid`, `productid`, `referrerurl` (host
/// only), `deviceid`, `eventtype`, `quantity`, `price`, plus the derived
/// `dayofweek` (0 = Monday) and `hour` (0..=23).
pub fn load_sessions(path: &Path) -> Result<DataFrame> {
    let raw = read_headerless_csv(path, &SESSION_COLUMNS)?;
    debug!(rows = raw.height(), path = %path.display(), "read session file");
    clean_sessions(&raw)
}

/// Loads the raw device file. Vocabulary normalization happens at the join.
pub fn load_devices(path: &Path) -> Result<DataFrame> {
    let raw = read_headerless_csv(path, &DEVICE_COLUMNS)?;
    debug!(rows = raw.height(), path = %path.display(), "read device file");
    Ok(raw)
}

fn read_headerless_csv(path: &Path, columns: &[&str]) -> Result<DataFrame> {
    let file = File::open(path)?;
    let parse_opts = CsvParseOptions::default().with_separator(b',');
    // Schema inference is skipped so every field arrives as a string and the
    // typed extraction below controls all parsing.
    let mut df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .with_parse_options(parse_opts)
        .into_reader_with_file_handle(file)
        .finish()?;

    if df.width() != columns.len() {
        return Err(MarkovifyError::DataError(format!(
            "expected {} columns in {}, found {}",
            columns.len(),
            path.display(),
            df.width()
        )));
    }
    df.set_column_names(columns.iter().copied())?;
    Ok(df)
}

/// Applies the session null policy and row filter to a schema-named raw
/// frame.
///
/// Rows missing any of `sessionid`, a parseable `createddate`, or a
/// parseable `eventtype` are dropped. Everything else is defaulted: empty
/// text for the free-text columns, `Unknown` for the identifier-like
/// columns, and zero for the numeric columns. Columns with no downstream
/// consumer are left behind here.
pub fn clean_sessions(raw: &DataFrame) -> Result<DataFrame> {
    let sessionid = raw.column("sessionid")?.str()?;
    let category = raw.column("category")?.str()?;
    let createddate = raw.column("createddate")?.str()?;
    let pagetitle = raw.column("pagetitle")?.str()?;
    let userid = raw.column("userid")?.str()?;
    let providerid = raw.column("providerid")?.str()?;
    let productid = raw.column("productid")?.str()?;
    let referrerurl = raw.column("referrerurl")?.str()?;
    let deviceid = raw.column("deviceid")?.str()?;
    let eventtype = raw.column("eventtype")?.str()?;
    let quantity = raw.column("quantity")?.str()?;
    let price = raw.column("price")?.str()?;

    let n = raw.height();
    let mut out_sessionid: Vec<String> = Vec::with_capacity(n);
    let mut out_category: Vec<String> = Vec::with_capacity(n);
    let mut out_createddate: Vec<i64> = Vec::with_capacity(n);
    let mut out_pagetitle: Vec<String> = Vec::with_capacity(n);
    let mut out_userid: Vec<String> = Vec::with_capacity(n);
    let mut out_providerid: Vec<String> = Vec::with_capacity(n);
    let mut out_productid: Vec<f64> = Vec::with_capacity(n);
    let mut out_referrerurl: Vec<String> = Vec::with_capacity(n);
    let mut out_deviceid: Vec<String> = Vec::with_capacity(n);
    let mut out_eventtype: Vec<i64> = Vec::with_capacity(n);
    let mut out_quantity: Vec<f64> = Vec::with_capacity(n);
    let mut out_price: Vec<f64> = Vec::with_capacity(n);
    let mut out_dayofweek: Vec<i64> = Vec::with_capacity(n);
    let mut out_hour: Vec<i64> = Vec::with_capacity(n);

    for i in 0..n {
        let sid = match sessionid.get(i) {
            Some(v) if !v.trim().is_empty() => v,
            _ => continue,
        };
        let ts = match createddate.get(i).and_then(parse_timestamp) {
            Some(ts) => ts,
            None => continue,
        };
        let event = match eventtype.get(i).and_then(parse_event_code) {
            Some(event) => event,
            None => continue,
        };

        out_sessionid.push(sid.to_string());
        out_category.push(text_or_empty(category.get(i)));
        out_createddate.push(ts.and_utc().timestamp());
        out_pagetitle.push(text_or_empty(pagetitle.get(i)));
        out_userid.push(text_or_empty(userid.get(i)));
        out_providerid.push(non_empty_or(providerid.get(i), UNKNOWN));
        out_productid.push(parse_f64_or_zero(productid.get(i)));
        out_referrerurl.push(referrer_host(referrerurl.get(i).unwrap_or("")));
        out_deviceid.push(non_empty_or(deviceid.get(i), UNKNOWN));
        out_eventtype.push(event);
        out_quantity.push(parse_f64_or_zero(quantity.get(i)));
        out_price.push(parse_f64_or_zero(price.get(i)));
        out_dayofweek.push(i64::from(ts.weekday().num_days_from_monday()));
        out_hour.push(i64::from(ts.hour()));
    }

    let dropped = n - out_sessionid.len();
    if dropped > 0 {
        debug!(dropped, "discarded rows missing sessionid, createddate, or eventtype");
    }

    DataFrame::new(vec![
        Column::new("sessionid".into(), out_sessionid),
        Column::new("category".into(), out_category),
        Column::new("createddate".into(), out_createddate),
        Column::new("pagetitle".into(), out_pagetitle),
        Column::new("userid".into(), out_userid),
        Column::new("providerid".into(), out_providerid),
        Column::new("productid".into(), out_productid),
        Column::new("referrerurl".into(), out_referrerurl),
        Column::new("deviceid".into(), out_deviceid),
        Column::new("eventtype".into(), out_eventtype),
        Column::new("quantity".into(), out_quantity),
        Column::new("price".into(), out_price),
        Column::new("dayofweek".into(), out_dayofweek),
        Column::new("hour".into(), out_hour),
    ])
    .map_err(Into::into)
}

/// Parses the timestamp formats seen in session exports: RFC 3339, naive
/// datetimes with either separator, and bare dates.
pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Event codes are exported as integers or as floats with a zero fraction.
fn parse_event_code(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(code) = value.parse::<i64>() {
        return Some(code);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f as i64)
}

fn text_or_empty(value: Option<&str>) -> String {
    value.unwrap_or("").to_string()
}

fn non_empty_or(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

fn parse_f64_or_zero(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

/// Reduces a referrer URL to its host. Unparseable or host-less values
/// reduce to the empty string, the same default as a missing referrer.
fn referrer_host(value: &str) -> String {
    url::Url::parse(value.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}
