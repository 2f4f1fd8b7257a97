use serde::{Deserialize, Serialize};

use super::MetricError;

/// Value types a metric may carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Type tag for a metric value, as written to backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Int,
    Float,
    Str,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Str => "str",
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricValue {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            MetricValue::Int(_) => TypeTag::Int,
            MetricValue::Float(_) => TypeTag::Float,
            MetricValue::Str(_) => TypeTag::Str,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Int(v) => Some(*v as f64),
            MetricValue::Float(v) => Some(*v),
            MetricValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Infer a metric value from a JSON value
    ///
    /// Only integers, floats and strings are representable; anything else
    /// (null, bool, array, object) is rejected.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, MetricError> {
        match json {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(MetricValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(MetricValue::Float(f))
                } else {
                    Err(MetricError::UnsupportedType(n.to_string()))
                }
            }
            serde_json::Value::String(s) => Ok(MetricValue::Str(s.clone())),
            other => Err(MetricError::UnsupportedType(other.to_string())),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Str(v.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Str(v)
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{}", v),
            MetricValue::Float(v) => write!(f, "{}", v),
            MetricValue::Str(s) => write!(f, "{}", s),
        }
    }
}
