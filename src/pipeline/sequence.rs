//! Per-session sequence construction
//!
//! The core of the pipeline: each session's events are sorted into a
//! chronological arena and swept once to derive elapsed time, the prior
//! `order - 1` action codes, and the next-action label. Rows without full
//! lag context or without a following event are dropped, so a session of
//! length `L` contributes `max(0, L - order)` rows.
//!
//! Sessions are independent, so they are processed in parallel and the
//! per-session frames merged once at the end.

use crate::error::Result;
use crate::schema::SENTINEL_EVENT;
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// One event inside a session's chronological arena. `row` points back at
/// the source row so the original columns can be carried over.
#[derive(Debug, Clone, Copy)]
struct Event {
    row: IdxSize,
    timestamp: i64,
    event_type: i64,
}

/// Derives the lag and lead training columns for every session.
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    order: usize,
}

impl SequenceBuilder {
    /// `order` is the Markov order, at least 1. Validated upstream by
    /// [`crate::config::MarkovifyConfig::validate`].
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    /// Column name of the `o`-th prior-action feature.
    pub fn lag_column(o: usize) -> String {
        format!("{o}prioraction")
    }

    fn lag_depth(&self) -> usize {
        self.order.saturating_sub(1)
    }

    /// Runs the sweep over every session and concatenates the surviving
    /// rows. The output keeps the input's full column set and appends
    /// `elapsedtime`, `totalelapsedtime`, the `1..order-1` prior-action
    /// columns, and `nextaction`.
    pub fn build(&self, df: &DataFrame) -> Result<DataFrame> {
        let sessions = partition_sessions(df)?;
        let n_sessions = sessions.len();

        let frames = sessions
            .into_par_iter()
            .map(|events| self.annotate_session(df, events))
            .collect::<Result<Vec<DataFrame>>>()?;

        // Zero-row seed fixes the output schema even when no session
        // survives the boundary filter.
        let mut out = self.annotate_session(df, Vec::new())?;
        for frame in &frames {
            out.vstack_mut(frame)?;
        }

        debug!(
            sessions = n_sessions,
            rows_in = df.height(),
            rows_out = out.height(),
            order = self.order,
            "built sequence features"
        );
        Ok(out)
    }

    /// Sweeps one chronologically sorted session and returns its surviving
    /// rows with the derived columns attached.
    fn annotate_session(&self, df: &DataFrame, events: Vec<Event>) -> Result<DataFrame> {
        let lag_depth = self.lag_depth();
        let len = events.len();

        let mut elapsed = vec![0i64; len];
        let mut total = vec![0i64; len];
        let mut lags = vec![vec![SENTINEL_EVENT; len]; lag_depth];
        let mut next = vec![SENTINEL_EVENT; len];

        for j in 0..len {
            if j > 0 {
                elapsed[j] = events[j].timestamp - events[j - 1].timestamp;
                total[j] = events[j].timestamp - events[0].timestamp;
            }
            for o in 1..=lag_depth {
                if j >= o {
                    lags[o - 1][j] = events[j - o].event_type;
                }
            }
            if j + 1 < len {
                next[j] = events[j + 1].event_type;
            }
        }

        let keep: Vec<usize> = (0..len)
            .filter(|&j| {
                next[j] != SENTINEL_EVENT && lags.iter().all(|lag| lag[j] != SENTINEL_EVENT)
            })
            .collect();
        let indices: Vec<IdxSize> = keep.iter().map(|&j| events[j].row).collect();

        let mut out = df.take(&IdxCa::from_vec("idx".into(), indices))?;
        out.with_column(Column::new("elapsedtime".into(), gather(&elapsed, &keep)))?;
        out.with_column(Column::new("totalelapsedtime".into(), gather(&total, &keep)))?;
        for o in 1..=lag_depth {
            out.with_column(Column::new(
                Self::lag_column(o).into(),
                gather(&lags[o - 1], &keep),
            ))?;
        }
        out.with_column(Column::new("nextaction".into(), gather(&next, &keep)))?;
        Ok(out)
    }
}

/// Groups rows by session id and sorts each group chronologically. Equal
/// timestamps keep their input order.
fn partition_sessions(df: &DataFrame) -> Result<Vec<Vec<Event>>> {
    let sessionid = df.column("sessionid")?.str()?;
    let createddate = df.column("createddate")?.i64()?;
    let eventtype = df.column("eventtype")?.i64()?;

    let mut slot_of: HashMap<&str, usize> = HashMap::new();
    let mut sessions: Vec<Vec<Event>> = Vec::new();

    for i in 0..df.height() {
        let sid = match sessionid.get(i) {
            Some(sid) => sid,
            None => continue,
        };
        let slot = *slot_of.entry(sid).or_insert_with(|| {
            sessions.push(Vec::new());
            sessions.len() - 1
        });
        sessions[slot].push(Event {
            row: i as IdxSize,
            timestamp: createddate.get(i).unwrap_or(0),
            event_type: eventtype.get(i).unwrap_or(SENTINEL_EVENT),
        });
    }

    for session in &mut sessions {
        session.sort_by_key(|e| (e.timestamp, e.row));
    }
    Ok(sessions)
}

fn gather(values: &[i64], keep: &[usize]) -> Vec<i64> {
    keep.iter().map(|&j| values[j]).collect()
}
