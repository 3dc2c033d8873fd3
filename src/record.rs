//! Emptiness rules for the session-data sub-records of a command.
//!
//! An operator clears a session-data block by blanking its fields; the
//! block is then dropped from the record rather than stored as empty
//! strings the terminal would try to act on.

use serde_json::Value;

pub const SET_SESSION_DATA: &str = "set_session_data";
pub const REQUIRED_SESSION_DATA: &str = "required_session_data";
pub const NESTED_REQUIRED_SESSION_DATA: &str = "requiredSessionData";

fn is_blank_name(name: Option<&Value>) -> bool {
    match name {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(name)) => name.trim().is_empty(),
        Some(Value::Number(number)) => number.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

fn is_blank_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(value)) => value.is_empty(),
        Some(_) => false,
    }
}

fn is_unset_act(act: Option<&Value>) -> bool {
    match act {
        None | Some(Value::Null) => true,
        Some(Value::Number(number)) => number.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

/// `{name, value}` with a blank name and an absent/null/"" value.
pub fn is_requirement_empty(requirement: Option<&Value>) -> bool {
    match requirement {
        None | Some(Value::Null) => true,
        Some(Value::Object(fields)) => is_blank_name(fields.get("name")) && is_blank_value(fields.get("value")),
        Some(_) => false,
    }
}

pub fn is_set_session_data_empty(set_session_data: Option<&Value>) -> bool {
    match set_session_data {
        None | Some(Value::Null) => true,
        Some(Value::Object(fields)) => {
            is_blank_name(fields.get("name"))
                && is_blank_value(fields.get("value"))
                && is_requirement_empty(fields.get(NESTED_REQUIRED_SESSION_DATA))
                && is_unset_act(fields.get("requiredAct"))
        }
        Some(_) => false,
    }
}

/// Drops empty session-data blocks from a record in place. Returns whether
/// anything was removed. Non-object records are left alone.
pub fn prune_empty_session_data(record: &mut Value) -> bool {
    let Some(fields) = record.as_object_mut() else {
        return false;
    };
    let mut removed = false;

    if fields.contains_key(SET_SESSION_DATA) && is_set_session_data_empty(fields.get(SET_SESSION_DATA)) {
        fields.shift_remove(SET_SESSION_DATA);
        removed = true;
    }

    if fields.contains_key(REQUIRED_SESSION_DATA) && is_requirement_empty(fields.get(REQUIRED_SESSION_DATA)) {
        fields.shift_remove(REQUIRED_SESSION_DATA);
        removed = true;
    }

    if let Some(Value::Object(set_session_data)) = fields.get_mut(SET_SESSION_DATA) {
        if set_session_data.contains_key(NESTED_REQUIRED_SESSION_DATA)
            && is_requirement_empty(set_session_data.get(NESTED_REQUIRED_SESSION_DATA))
        {
            set_session_data.shift_remove(NESTED_REQUIRED_SESSION_DATA);
            removed = true;
        }
    }

    removed
}
