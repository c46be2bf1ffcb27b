//! Parameter schemas and argument validation.
//!
//! A schema is an ordered list of parameters. Validation turns the raw JSON
//! arguments sent by an agent into [`Arguments`]: defaults are applied,
//! omitted optionals stay absent, and loosely typed values are coerced.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn json_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Coerce `value` into this type, or `None` if it cannot be.
    fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ParamType::String, Value::String(_)) => Some(value.clone()),
            (ParamType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ParamType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (ParamType::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Some(json!(i))
                } else if let Some(u) = n.as_u64() {
                    Some(json!(u))
                } else {
                    // `as` saturates, so out-of-range floats are rejected first.
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
                        .map(|f| json!(f as i64))
                }
            }
            (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(|i| json!(i)),

            (ParamType::Number, Value::Number(_)) => Some(value.clone()),
            (ParamType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| json!(f)),

            (ParamType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ParamType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },

            (ParamType::Array, Value::Array(_)) => Some(value.clone()),
            (ParamType::Object, Value::Object(_)) => Some(value.clone()),
            _ => None,
        }
    }
}

/// Whether a parameter may be omitted, and what it becomes when it is.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional,
    Default(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub presence: Presence,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    params: Vec<ParameterSpec>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.push(name, param_type, description, Presence::Required)
    }

    pub fn optional(self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.push(name, param_type, description, Presence::Optional)
    }

    pub fn with_default(
        self,
        name: &str,
        param_type: ParamType,
        description: &str,
        default: Value,
    ) -> Self {
        self.push(name, param_type, description, Presence::Default(default))
    }

    fn push(mut self, name: &str, param_type: ParamType, description: &str, presence: Presence) -> Self {
        self.params.push(ParameterSpec {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            presence,
        });
        self
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Render as a JSON-Schema object, preserving parameter order.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(param.param_type.json_name()));
            if !param.description.is_empty() {
                prop.insert("description".into(), json!(param.description));
            }
            match &param.presence {
                Presence::Required => required.push(json!(param.name)),
                Presence::Default(default) => {
                    prop.insert("default".into(), default.clone());
                }
                Presence::Optional => {}
            }
            properties.insert(param.name.clone(), Value::Object(prop));
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Check `input` against the schema and normalize it.
    pub fn validate(&self, input: &Value) -> Result<Arguments, String> {
        let empty = Map::new();
        let provided = match input {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => return Err(format!("arguments must be an object, got {}", type_name(other))),
        };

        if let Some(unknown) = provided.keys().find(|key| self.get(key).is_none()) {
            return Err(format!("unknown argument '{unknown}'"));
        }

        let mut values = Map::new();
        for param in &self.params {
            let raw = provided.get(&param.name).filter(|v| !v.is_null());
            match (raw, &param.presence) {
                (Some(raw), _) => {
                    let coerced = param.param_type.coerce(raw).ok_or_else(|| {
                        format!(
                            "argument '{}' expects {}, got {}",
                            param.name,
                            param.param_type.json_name(),
                            type_name(raw)
                        )
                    })?;
                    values.insert(param.name.clone(), coerced);
                }
                (None, Presence::Required) => {
                    return Err(format!("missing required argument '{}'", param.name));
                }
                (None, Presence::Default(default)) => {
                    values.insert(param.name.clone(), default.clone());
                }
                (None, Presence::Optional) => {}
            }
        }

        Ok(Arguments { values })
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validated, normalized arguments for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Result<&str, String> {
        self.opt_str(name)
            .ok_or_else(|| format!("argument '{name}' is not set"))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Optional string, treating an empty string as absent.
    pub fn non_empty_str(&self, name: &str) -> Option<&str> {
        self.opt_str(name).filter(|s| !s.trim().is_empty())
    }

    pub fn u64(&self, name: &str) -> Result<u64, String> {
        self.values
            .get(name)
            .and_then(Value::as_u64)
            .ok_or_else(|| format!("argument '{name}' must be a non-negative integer"))
    }

    pub fn bool(&self, name: &str) -> Result<bool, String> {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| format!("argument '{name}' is not set"))
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
