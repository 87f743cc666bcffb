//! Prior-session history indicator
//!
//! Flags whether the user behind a session had already started an earlier
//! session in the same dataset. The flag is computed per session and then
//! joined back onto every event row of that session.

use crate::error::Result;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug)]
struct SessionStart {
    sessionid: String,
    userid: String,
    start: i64,
}

/// Adds a `hist_ind` column: 1 when the same user started a strictly
/// earlier session, 0 otherwise.
///
/// Two sessions of one user sharing the same start timestamp do not count
/// as history for each other; only a strictly earlier start does. A user's
/// first session always carries 0.
pub fn annotate_prior_history(df: &DataFrame) -> Result<DataFrame> {
    let sessionid = df.column("sessionid")?.str()?;
    let userid = df.column("userid")?.str()?;
    let createddate = df.column("createddate")?.i64()?;

    let mut starts: HashMap<(String, String), i64> = HashMap::new();
    for i in 0..df.height() {
        let key = (
            sessionid.get(i).unwrap_or("").to_string(),
            userid.get(i).unwrap_or("").to_string(),
        );
        let ts = createddate.get(i).unwrap_or(0);
        starts
            .entry(key)
            .and_modify(|t| {
                if ts < *t {
                    *t = ts;
                }
            })
            .or_insert(ts);
    }

    let mut ordered: Vec<SessionStart> = starts
        .into_iter()
        .map(|((sessionid, userid), start)| SessionStart {
            sessionid,
            userid,
            start,
        })
        .collect();
    ordered.sort_by(|a, b| {
        a.userid
            .cmp(&b.userid)
            .then(a.start.cmp(&b.start))
            .then(a.sessionid.cmp(&b.sessionid))
    });

    let mut flags: HashMap<(String, String), i64> = HashMap::with_capacity(ordered.len());
    for idx in 0..ordered.len() {
        let flag = if idx > 0 {
            let prev = &ordered[idx - 1];
            let cur = &ordered[idx];
            i64::from(prev.userid == cur.userid && prev.start < cur.start)
        } else {
            0
        };
        let cur = &ordered[idx];
        flags.insert((cur.sessionid.clone(), cur.userid.clone()), flag);
    }

    let hist: Vec<i64> = (0..df.height())
        .map(|i| {
            let key = (
                sessionid.get(i).unwrap_or("").to_string(),
                userid.get(i).unwrap_or("").to_string(),
            );
            flags.get(&key).copied().unwrap_or(0)
        })
        .collect();

    let with_history = hist.iter().filter(|&&f| f == 1).count();
    debug!(sessions = flags.len(), rows_with_history = with_history, "annotated prior history");

    let mut out = df.clone();
    out.with_column(Column::new("hist_ind".into(), hist))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist_values(df: &DataFrame) -> Vec<i64> {
        df.column("hist_ind")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_first_session_carries_zero_later_sessions_one() {
        let df = df!(
            "sessionid" => &["s1", "s1", "s2", "s2"],
            "userid" => &["u1", "u1", "u1", "u1"],
            "createddate" => &[100i64, 150, 300, 320],
        )
        .unwrap();

        let annotated = annotate_prior_history(&df).unwrap();
        assert_eq!(hist_values(&annotated), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_history_does_not_cross_users() {
        let df = df!(
            "sessionid" => &["s1", "s2", "s3"],
            "userid" => &["u1", "u2", "u2"],
            "createddate" => &[100i64, 200, 900],
        )
        .unwrap();

        let annotated = annotate_prior_history(&df).unwrap();
        // u2's first session ignores u1's earlier one
        assert_eq!(hist_values(&annotated), vec![0, 0, 1]);
    }

    #[test]
    fn test_session_start_is_earliest_event() {
        // s2's earliest event predates s1's, despite later rows
        let df = df!(
            "sessionid" => &["s1", "s2", "s2"],
            "userid" => &["u1", "u1", "u1"],
            "createddate" => &[500i64, 50, 800],
        )
        .unwrap();

        let annotated = annotate_prior_history(&df).unwrap();
        assert_eq!(hist_values(&annotated), vec![1, 0, 0]);
    }

    #[test]
    fn test_equal_starts_do_not_count_as_history() {
        let df = df!(
            "sessionid" => &["s1", "s2"],
            "userid" => &["u1", "u1"],
            "createddate" => &[100i64, 100],
        )
        .unwrap();

        let annotated = annotate_prior_history(&df).unwrap();
        assert_eq!(hist_values(&annotated), vec![0, 0]);
    }

    #[test]
    fn test_row_count_and_columns_preserved() {
        let df = df!(
            "sessionid" => &["s1", "s2"],
            "userid" => &["u1", "u2"],
            "createddate" => &[10i64, 20],
        )
        .unwrap();

        let annotated = annotate_prior_history(&df).unwrap();
        assert_eq!(annotated.height(), 2);
        assert_eq!(annotated.width(), 4);
    }
}
