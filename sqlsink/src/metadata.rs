// SPDX-License-Identifier: AGPL-3.0-or-later

//! Maps a loosely typed log call onto the fixed columns of the log table.
//!
//! Metadata is expected to be a JSON object. A handful of keys are lifted into their own columns,
//! the rest is stored JSON encoded in the `meta` column:
//!
//! | key       | column       |
//! |-----------|--------------|
//! | `ip`      | `ip_address` |
//! | `session` | `session_id` |
//! | `route`   | `route`      |
//! | `query`   | `query`      |
//! | `body`    | `body`       |
//! | `host`    | `host`       |
//! | `url`     | `url`        |
//!
//! When the metadata contains a nested `meta` value only that one is stored, everything else which
//! was not lifted into a column is dropped.
use log::Level;
use serde_json::{Map, Value};

use crate::db::schema::{HOST_MAX_LEN, IP_ADDRESS_MAX_LEN, LEVEL_MAX_LEN, SESSION_ID_MAX_LEN};
use crate::db::NewLogRecord;
use crate::errors::SinkError;

/// Key of the nested metadata value.
pub(crate) const META_KEY: &str = "meta";

/// Lifted into `ip_address`.
pub(crate) const IP_KEY: &str = "ip";

/// Lifted into `session_id`.
pub(crate) const SESSION_KEY: &str = "session";

pub(crate) const ROUTE_KEY: &str = "route";

pub(crate) const QUERY_KEY: &str = "query";

pub(crate) const BODY_KEY: &str = "body";

pub(crate) const HOST_KEY: &str = "host";

pub(crate) const URL_KEY: &str = "url";

/// Turn any kind of metadata into an object.
///
/// Missing metadata becomes an empty object, everything which is not an object gets wrapped as
/// `{"meta": value}`.
pub fn normalize(metadata: Option<Value>) -> Map<String, Value> {
    match metadata {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(fields)) => fields,
        Some(value) => {
            let mut fields = Map::new();
            fields.insert(META_KEY.to_owned(), value);
            fields
        }
    }
}

/// Lower-case name of a level as it is stored in the `level` column.
pub fn level_name(level: Level) -> String {
    let name = level.as_str().to_lowercase();
    debug_assert!(name.len() <= LEVEL_MAX_LEN);
    name
}

/// Build the row values for one log call.
pub fn map_record(
    level: Level,
    message: &str,
    metadata: Option<Value>,
) -> Result<NewLogRecord, SinkError> {
    if message.is_empty() {
        return Err(SinkError::Validation("Log message is empty".into()));
    }

    let mut fields = normalize(metadata);

    let ip_address = take_bounded(&mut fields, IP_KEY, IP_ADDRESS_MAX_LEN)?;
    let session_id = take_bounded(&mut fields, SESSION_KEY, SESSION_ID_MAX_LEN)?;
    let host = take_bounded(&mut fields, HOST_KEY, HOST_MAX_LEN)?;
    let route = take_text(&mut fields, ROUTE_KEY);
    let query = take_text(&mut fields, QUERY_KEY);
    let body = take_text(&mut fields, BODY_KEY);
    let url = take_text(&mut fields, URL_KEY);

    let meta = match fields.remove(META_KEY) {
        Some(nested) if !nested.is_null() => Some(nested.to_string()),
        _ if fields.is_empty() => None,
        _ => Some(Value::Object(fields).to_string()),
    };

    Ok(NewLogRecord {
        level: level_name(level),
        msg: message.to_owned(),
        meta,
        ip_address,
        session_id,
        route,
        query,
        body,
        host,
        url,
    })
}

/// Remove a value which goes into a length limited column.
///
/// Numbers and booleans are accepted in their JSON text form, objects and arrays are rejected.
fn take_bounded(
    fields: &mut Map<String, Value>,
    key: &str,
    max_len: usize,
) -> Result<Option<String>, SinkError> {
    let text = match fields.remove(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) => text,
        Some(value @ Value::Number(_)) | Some(value @ Value::Bool(_)) => value.to_string(),
        Some(_) => {
            return Err(SinkError::Validation(format!(
                "Metadata field '{}' needs to be a string",
                key
            )))
        }
    };

    if text.chars().count() > max_len {
        return Err(SinkError::Validation(format!(
            "Metadata field '{}' is longer than {} characters",
            key, max_len
        )));
    }

    Ok(Some(text))
}

/// Remove a value which goes into a text column, strings are stored as they are and everything
/// else JSON encoded.
fn take_text(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(value) => Some(value.to_string()),
    }
}
