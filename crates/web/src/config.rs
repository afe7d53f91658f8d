//! Structured configuration.
//!
//! A [`Configuration`] is a tree of JSON values addressed with dotted paths
//! such as `server.port`. The server reads its settings from the `server`
//! subtree through [`Configuration::server`].

use serde::Deserialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("`{path}` is not an object")]
    NotAnObject { path: String },

    #[error("invalid `{section}` section: {source}")]
    InvalidSection {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    root: Value,
}

impl Configuration {
    /// An empty configuration.
    pub fn new() -> Self {
        Self { root: Value::Object(Map::new()) }
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The value at a dotted path. Numeric segments index into arrays.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').filter(|key| !key.is_empty()).try_fold(&self.root, |value, key| match value {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => None,
        })
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }

    pub fn get_u16(&self, path: &str) -> Option<u16> {
        self.get(path).and_then(Value::as_u64).and_then(|n| u16::try_from(n).ok())
    }

    /// Stores `value` at a dotted path, creating missing objects on the way.
    ///
    /// Fails when a segment before the last one names something other than
    /// an object.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        let keys: Vec<&str> = path.split('.').filter(|key| !key.is_empty()).collect();
        let Some((last, parents)) = keys.split_last() else {
            self.root = value;
            return Ok(());
        };

        let mut node = &mut self.root;
        for (depth, key) in parents.iter().enumerate() {
            let Value::Object(map) = node else {
                return Err(ConfigError::NotAnObject { path: keys[..depth].join(".") });
            };
            node = map.entry(*key).or_insert_with(|| Value::Object(Map::new()));
        }

        match node {
            Value::Object(map) => {
                map.insert((*last).to_string(), value);
                Ok(())
            }
            _ => Err(ConfigError::NotAnObject { path: parents.join(".") }),
        }
    }

    /// Stores a textual value, inferring its type.
    pub fn set_raw(&mut self, path: &str, raw: &str) -> Result<(), ConfigError> {
        self.set(path, infer(raw))
    }

    /// The `server` section, with defaults for everything missing.
    pub fn server(&self) -> Result<ServerConfig, ConfigError> {
        match self.get("server") {
            None | Some(Value::Null) => Ok(ServerConfig::default()),
            Some(section) => ServerConfig::deserialize(section)
                .map_err(|source| ConfigError::InvalidSection { section: "server", source }),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Value> for Configuration {
    fn from(root: Value) -> Self {
        Self::from_value(root)
    }
}

/// Reads `null`, integers, floats, booleans and falls back to a string.
fn infer(raw: &str) -> Value {
    if matches!(raw, "null" | "NULL" | "nil" | "NIL") {
        return Value::Null;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Some(float) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(float);
    }
    match raw {
        "True" | "true" | "yes" => Value::Bool(true),
        "False" | "false" | "no" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub reuse_port: bool,
    pub log: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080, reuse_port: false, log: false }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn dotted_lookups() {
        let config = Configuration::from_value(json!({
            "server": {"host": "0.0.0.0", "port": 8081, "log": true},
            "upstreams": [{"name": "a"}, {"name": "b"}],
        }));

        assert_eq!(config.get_str("server.host"), Some("0.0.0.0"));
        assert_eq!(config.get_u16("server.port"), Some(8081));
        assert_eq!(config.get_i64("server.port"), Some(8081));
        assert_eq!(config.get_bool("server.log"), Some(true));
        assert_eq!(config.get_str("upstreams.1.name"), Some("b"));
        assert_eq!(config.get("upstreams.2"), None);
        assert_eq!(config.get("server.host.name"), None);
        assert_eq!(config.get_bool("server.host"), None);
    }

    #[test]
    fn set_creates_objects() {
        let mut config = Configuration::new();
        config.set("server.port", json!(9000)).unwrap();
        config.set("server.host", json!("localhost")).unwrap();
        assert_eq!(config.root(), &json!({"server": {"port": 9000, "host": "localhost"}}));

        let error = config.set("server.port.number", json!(1)).unwrap_err();
        assert!(matches!(error, ConfigError::NotAnObject { path } if path == "server.port"));
    }

    #[test]
    fn raw_values_are_inferred() {
        let mut config = Configuration::new();
        for (key, raw) in [("a", "null"), ("b", "NIL"), ("c", "42"), ("d", "1.5"), ("e", "yes"), ("f", "False"), ("g", "venice")] {
            config.set_raw(key, raw).unwrap();
        }

        assert_eq!(
            config.root(),
            &json!({"a": null, "b": null, "c": 42, "d": 1.5, "e": true, "f": false, "g": "venice"})
        );
        config.set_raw("h", "1").unwrap();
        assert_eq!(config.get("h"), Some(&json!(1)));
    }

    #[test]
    fn server_section() {
        assert_eq!(Configuration::new().server().unwrap(), ServerConfig::default());

        let config = Configuration::from_value(json!({"server": {"port": 8081, "reusePort": true}}));
        let server = config.server().unwrap();
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 8081);
        assert!(server.reuse_port);
        assert!(!server.log);

        let config = Configuration::from_value(json!({"server": {"port": "eighty"}}));
        assert!(matches!(config.server(), Err(ConfigError::InvalidSection { section: "server", .. })));
    }
}
