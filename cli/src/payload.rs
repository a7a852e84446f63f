//! Payload resolution
//!
//! Turns a raw invocation into one normalized [`CommandPayload`]: UI
//! invocations are synthesized from the parsed flags, everything else is read
//! as a single JSON object from standard input.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::errors::CommandError;

/// Normalized payload of one command invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPayload {
    body: Map<String, Value>,
}

impl CommandPayload {
    pub fn new(body: Map<String, Value>) -> Self {
        Self { body }
    }

    /// UI payload: `{"args": {"ui": true, ...flags}}`
    pub fn ui(flags: Map<String, Value>) -> Self {
        let mut args = flags;
        args.insert("ui".to_string(), Value::Bool(true));

        let mut body = Map::new();
        body.insert("args".to_string(), Value::Object(args));
        Self { body }
    }

    /// True iff `args.ui` is set
    pub fn is_ui(&self) -> bool {
        self.args()
            .and_then(|args| args.get("ui"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn args(&self) -> Option<&Map<String, Value>> {
        self.body.get("args").and_then(Value::as_object)
    }

    /// A string flag from `args`
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args()
            .and_then(|args| args.get(key))
            .and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// A non-empty string field
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Deserialize an optional field; `null` counts as absent
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CommandError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| CommandError::Validation(format!("Invalid '{}': {}", key, e))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.body
    }
}

/// Raw invocation as produced by the argument parser
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// `--ui` was given
    pub ui: bool,

    /// Flags that were actually present, e.g. `directory`
    pub flags: Map<String, Value>,
}

impl Invocation {
    pub fn new(ui: bool) -> Self {
        Self {
            ui,
            flags: Map::new(),
        }
    }

    /// Record a flag if it was supplied
    pub fn with_flag(mut self, key: &str, value: Option<impl Into<Value>>) -> Self {
        if let Some(value) = value {
            self.flags.insert(key.to_string(), value.into());
        }
        self
    }
}

/// Resolve an invocation into exactly one payload.
///
/// UI invocations never touch `input`. Otherwise the whole of `input` is read
/// and must parse as a single JSON object.
pub async fn resolve_payload<R>(invocation: Invocation, input: R) -> Result<CommandPayload, CommandError>
where
    R: AsyncRead + Unpin,
{
    if invocation.ui {
        debug!("UI invocation, skipping stdin");
        return Ok(CommandPayload::ui(invocation.flags));
    }

    let raw = read_all(input).await?;
    parse_payload(&raw)
}

async fn read_all<R: AsyncRead + Unpin>(mut input: R) -> Result<String, CommandError> {
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .await
        .map_err(|e| CommandError::Payload(format!("Unable to read standard input: {}", e)))?;
    Ok(raw)
}

fn parse_payload(raw: &str) -> Result<CommandPayload, CommandError> {
    if raw.trim().is_empty() {
        return Err(CommandError::Payload(
            "Expected a JSON payload on standard input".to_string(),
        ));
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(body)) => Ok(CommandPayload::new(body)),
        Ok(other) => Err(CommandError::Payload(format!(
            "Expected a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(CommandError::Payload(e.to_string())),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
