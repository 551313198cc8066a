//! Shared types

use crate::error::BioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format requested from a remote service.
///
/// Drives the `Accept` header sent by the REST transport and the way the
/// body is decoded once it comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Xml,
    Json,
    #[default]
    Text,
    Binary,
}

impl ResponseFormat {
    /// Value of the `Accept` header for this format
    pub fn accept(self) -> &'static str {
        match self {
            ResponseFormat::Xml => "application/xml",
            ResponseFormat::Json => "application/json",
            ResponseFormat::Text => "text/plain",
            ResponseFormat::Binary => "*/*",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = BioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xml" => Ok(ResponseFormat::Xml),
            "json" => Ok(ResponseFormat::Json),
            "txt" | "text" => Ok(ResponseFormat::Text),
            "binary" | "bytes" => Ok(ResponseFormat::Binary),
            _ => Err(BioError::invalid_value("response format", s)),
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseFormat::Xml => write!(f, "xml"),
            ResponseFormat::Json => write!(f, "json"),
            ResponseFormat::Text => write!(f, "text"),
            ResponseFormat::Binary => write!(f, "binary"),
        }
    }
}

/// How a service is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Rest,
    Soap,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Rest => write!(f, "REST"),
            ServiceKind::Soap => write!(f, "SOAP"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_response_format_from_str() {
        assert_eq!("XML".parse::<ResponseFormat>().unwrap(), ResponseFormat::Xml);
        assert_eq!("json".parse::<ResponseFormat>().unwrap(), ResponseFormat::Json);
        assert_eq!("txt".parse::<ResponseFormat>().unwrap(), ResponseFormat::Text);
        assert!("yaml".parse::<ResponseFormat>().is_err());
    }

    #[test]
    fn test_accept_header() {
        assert_eq!(ResponseFormat::Json.accept(), "application/json");
        assert_eq!(ResponseFormat::default(), ResponseFormat::Text);
    }
}
