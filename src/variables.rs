//! Template variables: their declaration in the boilerplate configuration and
//! their resolution against the values supplied on invocation.

use crate::error::{Error, Result};
use crate::prompt::Prompter;
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Default value of a variable.
///
/// `Undefined` means there is no default at all, which is different from a
/// default that is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VariableDefault {
    #[default]
    Undefined,
    Empty,
    Value(String),
}

impl VariableDefault {
    pub fn is_defined(&self) -> bool {
        !matches!(self, VariableDefault::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            VariableDefault::Undefined => None,
            VariableDefault::Empty => Some(""),
            VariableDefault::Value(value) => Some(value),
        }
    }
}

impl From<Option<String>> for VariableDefault {
    fn from(value: Option<String>) -> Self {
        match value {
            None => VariableDefault::Undefined,
            Some(value) if value.is_empty() => VariableDefault::Empty,
            Some(value) => VariableDefault::Value(value),
        }
    }
}

/// Declaration of one template variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    name: String,
    summary: Option<String>,
    default: VariableDefault,
    required: bool,
}

impl VariableSpec {
    /// Creates a required variable with no summary and no default.
    ///
    /// # Errors
    /// * `Error::InvalidConfig` if `name` is not a valid variable name
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !VARIABLE_NAME.is_match(&name) {
            return Err(Error::invalid_config(
                format!("template_variables.{name}"),
                format!("'{name}' is not a valid variable name"),
            ));
        }
        Ok(Self { name, summary: None, default: VariableDefault::Undefined, required: true })
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the default. A defined default always makes the variable optional.
    pub fn with_default(mut self, default: impl Into<VariableDefault>) -> Self {
        self.default = default.into();
        if self.default.is_defined() {
            self.required = false;
        }
        self
    }

    /// Sets the declared `required` flag. Ignored when a default is defined.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required && !self.default.is_defined();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn default(&self) -> &VariableDefault {
        &self.default
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Builds a variable from its configuration entry, validating each field
    /// on its own so errors name the offending field.
    pub fn from_value(name: &str, value: &Value) -> Result<Self> {
        let field = |key: &str| format!("template_variables.{name}.{key}");
        let spec = Self::new(name)?;

        let data = match value {
            Value::Object(data) => data,
            Value::Null => return Ok(spec),
            _ => {
                return Err(Error::invalid_config(
                    format!("template_variables.{name}"),
                    "variable declaration must be an object",
                ))
            }
        };

        let summary = match data.get("summary") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(Error::invalid_config(field("summary"), "must be a string")),
        };
        let required = match data.get("required") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(Error::invalid_config(field("required"), "must be a boolean")),
        };
        let default = match data.get("default") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(Error::invalid_config(field("default"), "must be a string")),
        };

        let mut spec = spec.with_default(default).with_required(required);
        spec.summary = summary;
        Ok(spec)
    }

    /// Serializes the fields that differ from their defaults.
    pub fn dump(&self) -> Value {
        let mut data = Map::new();
        if let Some(summary) = &self.summary {
            data.insert("summary".to_string(), Value::String(summary.clone()));
        }
        if let Some(default) = self.default.as_str() {
            data.insert("default".to_string(), Value::String(default.to_string()));
        } else if !self.required {
            data.insert("required".to_string(), Value::Bool(false));
        }
        Value::Object(data)
    }
}

/// Reconciles the supplied variables with the declared ones.
///
/// Supplied values always win. Declared variables that were not supplied take
/// their default; those without a default are prompted for. An optional
/// variable left blank is omitted from the result instead of being set to an
/// empty string. Required variables are asked for until a value is given.
///
/// # Errors
/// * `Error::ExtraVariables` listing every undeclared name when `allow_extra`
///   is false
/// * Prompt errors, including `Error::Interrupted`
pub fn resolve_variables(
    schema: &IndexMap<String, VariableSpec>,
    supplied: &[(String, String)],
    allow_extra: bool,
    prompt: &dyn Prompter,
) -> Result<IndexMap<String, String>> {
    let mut extra: Vec<String> = Vec::new();
    for (name, _) in supplied {
        if !schema.contains_key(name) && !extra.contains(name) {
            extra.push(name.clone());
        }
    }
    if !extra.is_empty() {
        if !allow_extra {
            return Err(Error::ExtraVariables { names: extra });
        }
        debug!("Passing through extra variables: {}", extra.join(", "));
    }

    let mut variables: IndexMap<String, String> = supplied.iter().cloned().collect();

    for (name, spec) in schema {
        if variables.contains_key(name) {
            continue;
        }
        if let Some(default) = spec.default().as_str() {
            debug!("Using default for variable '{name}'");
            variables.insert(name.clone(), default.to_string());
            continue;
        }

        if let Some(summary) = spec.summary() {
            prompt.summary(summary);
        }
        let value = loop {
            let value = prompt.input(name, !spec.is_required())?;
            if !value.is_empty() || !spec.is_required() {
                break value;
            }
        };

        if value.is_empty() {
            debug!("Optional variable '{name}' left blank, omitting it");
            continue;
        }
        variables.insert(name.clone(), value);
    }

    Ok(variables)
}
