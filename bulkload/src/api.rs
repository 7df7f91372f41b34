use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("domain count must be at least 1")]
    NoDomains,
    #[error("batch count must be at least 1")]
    EmptyBatch,
    #[error("thread count must be at least 1")]
    NoWorkers,
    #[error("request rates must be positive and finite (min {min_rps}, max {max_rps})")]
    InvalidRate { min_rps: f64, max_rps: f64 },
    #[error("max rate {max_rps} is below min rate {min_rps}")]
    InvertedRamp { min_rps: f64, max_rps: f64 },
}

/// Everything the store told us about a rejected request.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("{message} (status: {status_code:?}, code: {error_code:?}, type: {error_type:?}, request id: {request_id:?})")]
pub struct WriteFailure {
    pub message: String,
    pub status_code: Option<u16>,
    pub error_code: Option<String>,
    pub error_type: Option<String>,
    pub request_id: Option<String>,
    /// Raw response body, when the transport has one.
    pub body: Option<String>,
}

impl WriteFailure {
    pub fn new(message: impl Into<String>) -> Self {
        WriteFailure {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_error(mut self, code: impl Into<String>, kind: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self.error_type = Some(kind.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A batch that could not be written. Not retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Unknown when the write task itself died.
    pub domain: Option<String>,
    pub records: usize,
    pub failure: WriteFailure,
}
