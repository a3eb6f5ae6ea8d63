use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::entity::datacenter;
use crate::error::AppError;
use crate::models::credentials::{CredentialField, Credentials};

/// A datacenter record as returned to callers. Sensitive credentials are the
/// stored ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datacenter {
    pub id: i32,
    pub group_id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<datacenter::Model> for Datacenter {
    fn from(m: datacenter::Model) -> Self {
        let credentials = m.credentials();
        Self {
            id: m.id,
            group_id: m.group_id,
            name: m.name,
            kind: m.r#type,
            credentials,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A decoded request body. Serves as the record for `set`, the lookup key for
/// `get`/`del`, and the filter for `find`.
///
/// `name` and `group_id` are `None` when the key was absent from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatacenterInput {
    pub id: i32,
    pub ids: Vec<i32>,
    pub name: Option<String>,
    pub names: Vec<String>,
    pub kind: Option<String>,
    pub group_id: Option<i32>,
    pub credentials: Credentials,
}

impl DatacenterInput {
    /// Decodes `body` leniently: fields of the wrong type are logged and left
    /// at their defaults, and a body that is not a JSON object decodes to the
    /// empty input.
    pub fn from_slice(body: &[u8]) -> Self {
        let mut input = Self::default();

        let map = match parse_object(body) {
            Ok(Some(map)) => map,
            Ok(None) => return input,
            Err(e) => {
                warn!(error = %e, "Invalid input");
                return input;
            }
        };

        if let Some(id) = read_id(&map, "id") {
            input.id = id;
        }
        input.ids = read_ids(&map);
        input.name = read_string(&map, "name");
        input.names = read_names(&map);
        input.kind = read_string(&map, "type");
        input.group_id = read_id(&map, "group_id");

        // Older clients nest credentials under a `credentials` object.
        let nested = match map.get("credentials") {
            Some(Value::Object(nested)) => Some(nested),
            Some(Value::Null) | None => None,
            Some(other) => {
                warn!(kind = json_kind(other), "Invalid input: credentials must be an object");
                None
            }
        };

        for field in CredentialField::ALL {
            let value = read_string(&map, field.as_str())
                .or_else(|| nested.and_then(|n| read_scalar(n, field.as_str())));
            if let Some(value) = value {
                *input.credentials.get_mut(field) = value;
            }
        }

        input
    }

    pub fn has_id(&self) -> bool {
        self.id != 0
    }

    /// Name if present and non-empty.
    pub fn lookup_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// `Ok(None)` for an empty body.
fn parse_object(body: &[u8]) -> Result<Option<Map<String, Value>>, AppError> {
    if body.trim_ascii().is_empty() {
        return Ok(None);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(other) => Err(AppError::MalformedInput(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(AppError::MalformedInput(e.to_string())),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_id(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok().and_then(|n| i32::try_from(n).ok()),
        _ => None,
    }
}

fn read_id(map: &Map<String, Value>, key: &str) -> Option<i32> {
    match map.get(key)? {
        Value::Null => None,
        v => {
            let id = parse_id(v);
            if id.is_none() {
                warn!(field = key, kind = json_kind(v), "Invalid input: expected a non-negative integer");
            }
            id
        }
    }
}

fn read_ids(map: &Map<String, Value>) -> Vec<i32> {
    match map.get("ids") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| {
                let id = parse_id(v);
                if id.is_none() {
                    warn!(value = %v, "Invalid input: skipping unparseable id");
                }
                id
            })
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!(field = "ids", kind = json_kind(other), "Invalid input: expected an array");
            Vec::new()
        }
    }
}

fn read_names(map: &Map<String, Value>) -> Vec<String> {
    match map.get("names") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                other => {
                    warn!(kind = json_kind(other), "Invalid input: skipping non-string name");
                    None
                }
            })
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!(field = "names", kind = json_kind(other), "Invalid input: expected an array");
            Vec::new()
        }
    }
}

fn read_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => {
            warn!(field = key, kind = json_kind(other), "Invalid input: expected a string");
            None
        }
    }
}

/// Like `read_string` but also accepts numbers and booleans, which the
/// open credential map allowed.
fn read_scalar(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => {
            warn!(field = key, kind = json_kind(other), "Invalid input: expected a scalar");
            None
        }
    }
}
