//! Error types for service calls
//!
//! Every operation either fully succeeds or returns a [`ServiceError`].
//! Parameter problems are reported before any request is sent; transport
//! and HTTP failures carry the offending URL.

use bioservices_common::BioError;
use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Longest response body kept in an [`ServiceError::Http`] error
pub const MAX_ERROR_BODY_LEN: usize = 4096;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// A parameter value is not one the remote API accepts
    #[error("Invalid value '{value}' for parameter '{name}'. Allowed values: {}", .allowed.join(", "))]
    InvalidParameter {
        name: String,
        value: String,
        allowed: Vec<String>,
    },

    /// A numeric parameter is outside the accepted range
    #[error("Parameter '{name}' is {value}, expected a value between {min} and {max}")]
    OutOfRange {
        name: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    /// The request could not be sent or the response could not be read
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status
    #[error("{url} returned HTTP {status}: {body}")]
    Http { url: String, status: u16, body: String },

    #[error("SOAP fault from {url}: [{code}] {message}")]
    SoapFault {
        url: String,
        code: String,
        message: String,
    },

    /// The service reported an error inside a successful response
    #[error("{service} reported an error: {message}")]
    Remote { service: String, message: String },

    /// An asynchronous remote job ended without results
    #[error("Job {job_id} on {service} ended with status {status}")]
    JobFailed {
        service: String,
        job_id: String,
        status: String,
    },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Tabular data error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The response did not have the expected shape
    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error(transparent)]
    Settings(#[from] BioError),
}

impl ServiceError {
    /// Create an invalid parameter error listing the accepted values
    pub fn invalid_parameter<S: AsRef<str>>(
        name: impl Into<String>,
        value: impl Into<String>,
        allowed: &[S],
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.into(),
            allowed: allowed.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an HTTP status error, keeping at most
    /// [`MAX_ERROR_BODY_LEN`] bytes of the body
    pub fn http(url: impl Into<String>, status: u16, body: &[u8]) -> Self {
        let mut body = String::from_utf8_lossy(body).into_owned();
        if body.len() > MAX_ERROR_BODY_LEN {
            let mut end = MAX_ERROR_BODY_LEN;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }
        Self::Http {
            url: url.into(),
            status,
            body,
        }
    }

    /// Create a remote error
    pub fn remote(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            service: service.into(),
            message: message.into(),
        }
    }

    /// HTTP status of the failed response, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server answered 404
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for errors raised before any request was sent
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::OutOfRange { .. } | Self::MissingParameter(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = ServiceError::invalid_parameter("format", "pdf", &["fasta", "tsv"]);
        assert_eq!(
            err.to_string(),
            "Invalid value 'pdf' for parameter 'format'. Allowed values: fasta, tsv"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_status_helpers() {
        let err = ServiceError::Http {
            url: "https://example.org/x".to_string(),
            status: 404,
            body: String::new(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_validation());
        assert_eq!(ServiceError::parse("x").status(), None);
    }

    #[test]
    fn test_http_body_is_truncated_on_char_boundary() {
        let body = "é".repeat(MAX_ERROR_BODY_LEN);
        let err = ServiceError::http("https://example.org/x", 500, body.as_bytes());
        match err {
            ServiceError::Http { body, status, .. } => {
                assert_eq!(status, 500);
                assert!(body.len() <= MAX_ERROR_BODY_LEN);
                assert!(body.chars().all(|c| c == 'é'));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
