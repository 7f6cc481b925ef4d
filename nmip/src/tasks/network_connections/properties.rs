use serde_json::Value;

use crate::error::{NmipError, Result};

/// Nested `group -> key -> value` description of a NetworkManager
/// connection, e.g. `{"connection": {"id": "main", "type": "ethernet"}}`.
///
/// Groups and keys keep the order they were supplied in; that is also the
/// order they are written to the keyfile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionProperties {
    groups: Vec<(String, Vec<(String, String)>)>,
}

impl ConnectionProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the agent's JSON structure. Scalars are stringified, arrays
    /// become NetworkManager lists (`a;b;`).
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(groups) = value else {
            return Err(NmipError::InvalidProperties(format!(
                "expected an object of groups, got {}",
                kind(value)
            )));
        };

        let mut props = Self::new();
        for (group, entries) in groups {
            let Value::Object(entries) = entries else {
                return Err(NmipError::InvalidProperties(format!(
                    "group {} must be an object, got {}",
                    group,
                    kind(entries)
                )));
            };
            props.group_mut(group);
            for (key, value) in entries {
                let value = stringify(value).ok_or_else(|| {
                    NmipError::InvalidProperties(format!(
                        "{}.{} must be a scalar or list of scalars, got {}",
                        group,
                        key,
                        kind(value)
                    ))
                })?;
                props.set(group.as_str(), key.as_str(), value);
            }
        }
        Ok(props)
    }

    /// Set `group.key`, replacing an existing value in place.
    pub fn set(
        &mut self,
        group: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        let group: String = group.into();
        let key = key.into();
        let value = value.into();
        let entries = self.group_mut(&group);
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(g, _)| g == group)
            .and_then(|(_, entries)| entries.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v.as_str())
    }

    /// The connection identifier, `connection.id`.
    pub fn id(&self) -> Option<&str> {
        self.get("connection", "id")
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[(String, String)])> {
        self.groups
            .iter()
            .map(|(g, entries)| (g.as_str(), entries.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Render as keyfile text: a `[group]` header per group followed by
    /// `key=value` lines, groups separated by a blank line.
    pub fn to_keyfile(&self) -> String {
        let mut out = String::new();
        for (i, (group, entries)) in self.groups.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push('[');
            out.push_str(group);
            out.push_str("]\n");
            for (key, value) in entries {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                out.push('\n');
            }
        }
        out
    }

    fn group_mut(&mut self, group: &str) -> &mut Vec<(String, String)> {
        let idx = match self.groups.iter().position(|(g, _)| g == group) {
            Some(idx) => idx,
            None => {
                self.groups.push((group.to_string(), Vec::new()));
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx].1
    }
}

impl TryFrom<&Value> for ConnectionProperties {
    type Error = NmipError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_value(value)
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(items) => items.iter().try_fold(String::new(), |mut acc, item| {
            if item.is_array() {
                return None;
            }
            acc.push_str(&stringify(item)?);
            acc.push(';');
            Some(acc)
        }),
        Value::Object(_) => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
