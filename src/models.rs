use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub const DEFAULT_COMMAND_KEY: &str = "command_name";
pub const DEFAULT_COMMAND_TEXT: &str = "displaying description of the terminal command...";

/// `{name, value}` pair the terminal session must already hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDataRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Session data a command writes when it runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_or")]
    pub required_act: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_session_data: Option<SessionDataRequirement>,
}

/// One terminal command definition as stored on disk.
///
/// Field names are the on-disk names. Fields this build does not know about
/// are carried in `extra` so a load/save cycle never drops them. Parsing
/// is what the service uses to check a record's shape, so it accepts the
/// loose forms the editor produces: a bare `terminal_num` integer and
/// blank strings in numeric inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    #[serde(default, deserialize_with = "one_or_many")]
    pub terminal_num: BTreeSet<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "blank_or")]
    pub require_act: Option<i64>,
    #[serde(default)]
    pub debug_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_or")]
    pub media_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_session_data: Option<SetSessionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_session_data: Option<SessionDataRequirement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CommandRecord {
    /// Record created by "add command" before the operator fills it in.
    pub fn placeholder() -> Self {
        Self {
            terminal_num: BTreeSet::from([1]),
            text: Some(DEFAULT_COMMAND_TEXT.to_string()),
            ..Self::default()
        }
    }

    /// Parses a stored or incoming record, rejecting wrongly typed fields.
    pub fn from_json(record: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(record)
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(i64),
        Many(BTreeSet<i64>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => BTreeSet::new(),
        Some(OneOrMany::One(value)) => BTreeSet::from([value]),
        Some(OneOrMany::Many(values)) => values,
    })
}

fn blank_or<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BlankOr<V> {
        Value(V),
        Text(String),
    }

    match Option::<BlankOr<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BlankOr::Value(value)) => Ok(Some(value)),
        Some(BlankOr::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(BlankOr::Text(text)) => Err(D::Error::custom(format!("expected a number, got '{}'", text))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOnePayload {
    pub key: String,
    pub object_data: Value,
    #[serde(default)]
    pub replace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPatchPayload {
    pub path: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchMode {
    #[default]
    Merge,
    Replace,
}

impl From<bool> for PatchMode {
    fn from(replace: bool) -> Self {
        if replace {
            Self::Replace
        } else {
            Self::Merge
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListShape {
    #[default]
    Map,
    List,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub shape: ListShape,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub message: String,
    pub key: String,
    pub command: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub command_count: usize,
}
