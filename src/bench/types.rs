use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Whether a configured body is attached to requests using this method.
    #[must_use]
    pub const fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "PATCH" => Ok(HttpMethod::Patch),
            _ => Err(ValidationError::InvalidMethod {
                value: s.to_owned(),
            }),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

impl Serialize for HttpMethod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse::<HttpMethod>().map_err(serde::de::Error::custom)
    }
}

/// How many requests may be in flight per connection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// Requests spread evenly: `ceil(total / connections)` per slot.
    #[default]
    Optimal,
    /// Every request is eligible at once, bounded only by the connection ceiling.
    Max,
}

impl PipelineMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PipelineMode::Optimal => "optimal",
            PipelineMode::Max => "max",
        }
    }

    /// In-flight cap for a run of `total` requests over `connections` slots.
    #[must_use]
    pub const fn cap(self, connections: usize, total: usize) -> usize {
        match self {
            PipelineMode::Optimal => {
                if connections == 0 {
                    total
                } else {
                    total.div_ceil(connections)
                }
            }
            PipelineMode::Max => total,
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimal" => Ok(PipelineMode::Optimal),
            "max" => Ok(PipelineMode::Max),
            _ => Err(ValidationError::InvalidPipelineMode {
                value: s.to_owned(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for PipelineMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse::<PipelineMode>().map_err(serde::de::Error::custom)
    }
}

/// Request payload, either raw bytes or url-encoded form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Raw(Bytes),
    Form(Vec<(String, String)>),
}

impl Body {
    #[must_use]
    pub fn raw<B>(bytes: B) -> Self
    where
        B: Into<Bytes>,
    {
        Body::Raw(bytes.into())
    }

    #[must_use]
    pub fn form<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Body::Form(
            fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Raw(bytes) => bytes.is_empty(),
            Body::Form(fields) => fields.is_empty(),
        }
    }
}
