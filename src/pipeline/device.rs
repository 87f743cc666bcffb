//! Device attribute normalization and join
//!
//! Device records are keyed by the concatenation of `userid` and `deviceid`,
//! matching how the session rows reference them. The four kept attributes
//! are normalized against their closed vocabularies before the join, so
//! downstream encoding never sees free-form device strings.

use crate::error::Result;
use crate::schema::{AGENT_TYPES, DEVICE_CATEGORIES, DEVICE_TYPES, OS_NAMES, OTHER, UNKNOWN};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct DeviceAttrs {
    category: String,
    device_type: String,
    agent_type: String,
    os: String,
}

fn normalize(value: Option<&str>, vocabulary: &[&str]) -> String {
    match value {
        Some(v) if vocabulary.contains(&v) => v.to_string(),
        _ => OTHER.to_string(),
    }
}

/// Builds the key to attributes map from the raw device table. The first
/// record per key wins, so a duplicated device export can never multiply
/// session rows.
fn device_map(device: &DataFrame) -> Result<HashMap<String, DeviceAttrs>> {
    let userid = device.column("userid")?.str()?;
    let deviceid = device.column("deviceid")?.str()?;
    let category = device.column("devicecategory")?.str()?;
    let device_type = device.column("devicetype")?.str()?;
    let agent_type = device.column("agenttype")?.str()?;
    let os = device.column("os")?.str()?;

    let mut map: HashMap<String, DeviceAttrs> = HashMap::with_capacity(device.height());
    for i in 0..device.height() {
        let key = format!(
            "{}{}",
            userid.get(i).unwrap_or(""),
            deviceid.get(i).unwrap_or("")
        );
        map.entry(key).or_insert_with(|| DeviceAttrs {
            category: normalize(category.get(i), &DEVICE_CATEGORIES),
            device_type: normalize(device_type.get(i), &DEVICE_TYPES),
            agent_type: normalize(agent_type.get(i), &AGENT_TYPES),
            os: normalize(os.get(i), &OS_NAMES),
        });
    }
    Ok(map)
}

/// Left-joins device attributes onto every session row.
///
/// The output has exactly the input's rows plus four new columns:
/// `devicecategory`, `devicetype`, `agenttype`, `os`. Session rows with no
/// matching device record get `Unknown` in all four.
pub fn join_devices(session: &DataFrame, device: &DataFrame) -> Result<DataFrame> {
    let map = device_map(device)?;

    let userid = session.column("userid")?.str()?;
    let deviceid = session.column("deviceid")?.str()?;

    let n = session.height();
    let mut categories: Vec<String> = Vec::with_capacity(n);
    let mut device_types: Vec<String> = Vec::with_capacity(n);
    let mut agent_types: Vec<String> = Vec::with_capacity(n);
    let mut os_values: Vec<String> = Vec::with_capacity(n);
    let mut matched = 0usize;

    for i in 0..n {
        let key = format!(
            "{}{}",
            userid.get(i).unwrap_or(""),
            deviceid.get(i).unwrap_or("")
        );
        match map.get(&key) {
            Some(attrs) => {
                matched += 1;
                categories.push(attrs.category.clone());
                device_types.push(attrs.device_type.clone());
                agent_types.push(attrs.agent_type.clone());
                os_values.push(attrs.os.clone());
            }
            None => {
                categories.push(UNKNOWN.to_string());
                device_types.push(UNKNOWN.to_string());
                agent_types.push(UNKNOWN.to_string());
                os_values.push(UNKNOWN.to_string());
            }
        }
    }

    debug!(rows = n, matched, devices = map.len(), "joined device attributes");

    let mut out = session.clone();
    out.with_column(Column::new("devicecategory".into(), categories))?;
    out.with_column(Column::new("devicetype".into(), device_types))?;
    out.with_column(Column::new("agenttype".into(), agent_types))?;
    out.with_column(Column::new("os".into(), os_values))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_frame() -> DataFrame {
        df!(
            "sessionid" => &["s1", "s1", "s2"],
            "userid" => &["u1", "u1", "u2"],
            "deviceid" => &["d1", "d1", "d9"],
        )
        .unwrap()
    }

    fn device_frame() -> DataFrame {
        df!(
            "deviceid" => &["d1", "d1", "d2"],
            "devicecategory" => &["iPhone", "Mac", "Commodore 64"],
            "devicetype" => &["Smartphone", "Personal computer", "Toaster"],
            "agenttype" => &["Mobile Browser", "Browser", "Browser"],
            "os" => &["iOS", "OS X", "AmigaOS"],
            "userid" => &["u1", "u1", "u2"],
        )
        .unwrap()
    }

    #[test]
    fn test_join_preserves_row_count_and_adds_columns() {
        let joined = join_devices(&session_frame(), &device_frame()).unwrap();
        assert_eq!(joined.height(), 3);
        for name in ["devicecategory", "devicetype", "agenttype", "os"] {
            assert!(joined.column(name).is_ok(), "missing column {name}");
        }
    }

    #[test]
    fn test_join_first_record_wins_for_duplicate_keys() {
        let joined = join_devices(&session_frame(), &device_frame()).unwrap();
        let category = joined.column("devicecategory").unwrap().str().unwrap();
        assert_eq!(category.get(0), Some("iPhone"));
        assert_eq!(category.get(1), Some("iPhone"));
    }

    #[test]
    fn test_unmatched_rows_get_unknown() {
        let joined = join_devices(&session_frame(), &device_frame()).unwrap();
        for name in ["devicecategory", "devicetype", "agenttype", "os"] {
            let col = joined.column(name).unwrap().str().unwrap();
            assert_eq!(col.get(2), Some("Unknown"), "column {name}");
        }
    }

    #[test]
    fn test_out_of_vocabulary_attributes_become_other() {
        let session = df!(
            "sessionid" => &["s9"],
            "userid" => &["u2"],
            "deviceid" => &["d2"],
        )
        .unwrap();
        let joined = join_devices(&session, &device_frame()).unwrap();

        let category = joined.column("devicecategory").unwrap().str().unwrap();
        assert_eq!(category.get(0), Some("Other"));
        let os = joined.column("os").unwrap().str().unwrap();
        assert_eq!(os.get(0), Some("Other"));
        // in-vocabulary attributes on the same record survive
        let agent = joined.column("agenttype").unwrap().str().unwrap();
        assert_eq!(agent.get(0), Some("Browser"));
    }
}
