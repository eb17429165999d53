pub mod application;
pub mod job;
pub mod roadmap;
pub mod user;

/// Lenient deserializers for fields the web client sends in more than one shape.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Number, numeric string, empty string or null → `Option<f64>`.
    pub fn amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                if cleaned.is_empty() {
                    Ok(None)
                } else {
                    cleaned
                        .parse::<f64>()
                        .map(Some)
                        .map_err(|_| serde::de::Error::custom(format!("invalid amount '{s}'")))
                }
            }
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected a number or string, got {other}"
            ))),
        }
    }

    /// String or number → `Option<String>`; empty strings become `None`.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected a string, got {other}"
            ))),
        }
    }

    /// Array of strings or a comma-separated string → `Vec<String>`.
    pub fn list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()),
            Some(Value::Array(items)) => Ok(items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    _ => None,
                })
                .collect()),
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected a list, got {other}"
            ))),
        }
    }
}
