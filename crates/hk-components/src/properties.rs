//! Typed access to a component's immutable configuration map.

use hk_core::AgentId;
use serde_json::{Map, Value};

use crate::error::{ComponentError, ComponentResult};

/// Raw property map as declared in the configuration.
pub type Properties = Map<String, Value>;

/// Reads typed values out of [`Properties`], attributing errors to an agent.
pub struct PropertyReader<'a> {
    agent: &'a AgentId,
    props: &'a Properties,
}

impl<'a> PropertyReader<'a> {
    pub fn new(agent: &'a AgentId, props: &'a Properties) -> Self {
        Self { agent, props }
    }

    fn invalid(&self, name: &str, reason: impl Into<String>) -> ComponentError {
        ComponentError::InvalidProperty {
            agent: self.agent.to_string(),
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    fn missing(&self, name: &str) -> ComponentError {
        ComponentError::MissingProperty {
            agent: self.agent.to_string(),
            name: name.to_string(),
        }
    }

    fn number(&self, name: &str, value: &Value) -> ComponentResult<f64> {
        let v = value
            .as_f64()
            .ok_or_else(|| self.invalid(name, format!("expected a number, got {value}")))?;
        if !v.is_finite() {
            return Err(self.invalid(name, "must be finite"));
        }
        Ok(v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    /// Required finite number.
    pub fn f64(&self, name: &str) -> ComponentResult<f64> {
        let value = self.props.get(name).ok_or_else(|| self.missing(name))?;
        self.number(name, value)
    }

    /// Optional finite number; present-but-malformed is still an error.
    pub fn f64_or(&self, name: &str, default: f64) -> ComponentResult<f64> {
        match self.props.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => self.number(name, value),
        }
    }

    /// Non-negative integer, optional.
    pub fn u64_opt(&self, name: &str) -> ComponentResult<Option<u64>> {
        match self.props.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.invalid(name, "expected a non-negative integer")),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> ComponentResult<bool> {
        match self.props.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.invalid(name, "expected a boolean")),
        }
    }

    pub fn str_opt(&self, name: &str) -> ComponentResult<Option<&'a str>> {
        match self.props.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.invalid(name, "expected a string")),
        }
    }

    pub fn f64_list_opt(&self, name: &str) -> ComponentResult<Option<Vec<f64>>> {
        match self.props.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| self.number(name, item))
                .collect::<ComponentResult<Vec<_>>>()
                .map(Some),
            Some(_) => Err(self.invalid(name, "expected a list of numbers")),
        }
    }

    pub fn string_list_opt(&self, name: &str) -> ComponentResult<Option<Vec<String>>> {
        match self.props.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(name, "expected a list of strings"))
                })
                .collect::<ComponentResult<Vec<_>>>()
                .map(Some),
            Some(_) => Err(self.invalid(name, "expected a list of strings")),
        }
    }

    /// Log (but accept) keys the component does not understand.
    pub fn warn_unknown(&self, known: &[&str]) {
        for key in self.props.keys() {
            if !known.contains(&key.as_str()) {
                tracing::warn!(agent = %self.agent, property = %key, "ignoring unknown property");
            }
        }
    }
}
