//! Structural validation of decoded datagrams.
//!
//! The checks mirror the packet schema: a packet is a map with `t` (an
//! unsigned 8-bit integer) and `h` (nil, absent, or a host map); a host is a
//! map with string `url` and `id`. Unknown keys are rejected. Business rules
//! such as URL syntax or id length are not checked here.

use serde_json::{Map, Value};

use msd_types::WireError;

/// Key holding the message type code.
pub const TYPE_KEY: &str = "t";
/// Key holding the optional host record.
pub const HOST_KEY: &str = "h";
/// Host key holding the endpoint URL.
pub const URL_KEY: &str = "url";
/// Host key holding the peer id.
pub const ID_KEY: &str = "id";

/// Check a decoded value against the packet schema.
pub fn validate_packet(value: &Value) -> Result<(), WireError> {
    let mut violations = Vec::new();
    check_packet(value, &mut violations);
    finish(violations)
}

/// Check a decoded value against the host schema.
pub fn validate_host(value: &Value) -> Result<(), WireError> {
    let mut violations = Vec::new();
    check_host(value, "", &mut violations);
    finish(violations)
}

fn finish(violations: Vec<String>) -> Result<(), WireError> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(WireError::Validation(violations))
    }
}

fn check_packet(value: &Value, violations: &mut Vec<String>) {
    let Some(map) = value.as_object() else {
        violations.push("packet is not a map".to_string());
        return;
    };

    match map.get(TYPE_KEY) {
        None => violations.push(format!("missing key '{TYPE_KEY}'")),
        Some(t) => {
            if !t.as_u64().is_some_and(|code| code <= u64::from(u8::MAX)) {
                violations.push(format!("'{TYPE_KEY}' is not a uint8: {t}"));
            }
        }
    }

    match map.get(HOST_KEY) {
        None | Some(Value::Null) => {}
        Some(host) => check_host(host, "h.", violations),
    }

    check_unknown_keys(map, &[TYPE_KEY, HOST_KEY], "", violations);
}

fn check_host(value: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(map) = value.as_object() else {
        match path.trim_end_matches('.') {
            "" => violations.push("host is not a map".to_string()),
            key => violations.push(format!("'{key}' host is not a map")),
        }
        return;
    };

    for key in [URL_KEY, ID_KEY] {
        match map.get(key) {
            Some(Value::String(_)) => {}
            Some(other) => violations.push(format!("'{path}{key}' is not a string: {other}")),
            None => violations.push(format!("missing key '{path}{key}'")),
        }
    }

    check_unknown_keys(map, &[URL_KEY, ID_KEY], path, violations);
}

fn check_unknown_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    path: &str,
    violations: &mut Vec<String>,
) {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            violations.push(format!("unexpected key '{path}{key}'"));
        }
    }
}
