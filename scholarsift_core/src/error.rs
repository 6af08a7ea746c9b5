// src/error.rs

/// Errors raised inside a single collector while talking to its source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FetchError {
    pub fn code_str(&self) -> &'static str {
        match self {
            FetchError::HttpRequest(e) if e.is_timeout() => "timeout",
            FetchError::HttpRequest(_) => "upstream_error",
            FetchError::Status(_) => "bad_status",
            FetchError::SerdeJson(_) | FetchError::Parse(_) => "parse_error",
            FetchError::Feed(_) => "feed_error",
            FetchError::InvalidUrl(_) => "invalid_url",
            FetchError::Internal(_) => "internal_error",
        }
    }
}

/// A collector invocation that produced no batch.
///
/// None of these are fatal for an aggregation run: the engine logs them and
/// carries on with the remaining collectors.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("collector '{collector}' timed out after {budget_ms}ms")]
    Timeout { collector: String, budget_ms: u64 },

    #[error("collector '{collector}' failed: {cause}")]
    Failure {
        collector: String,
        #[source]
        cause: FetchError,
    },

    /// Still queued for a concurrency slot when the run deadline passed.
    #[error("collector '{collector}' was not started before the run deadline")]
    NotStarted { collector: String },
}

impl CollectorError {
    pub fn timeout(collector: impl Into<String>, budget_ms: u64) -> Self {
        CollectorError::Timeout {
            collector: collector.into(),
            budget_ms,
        }
    }

    pub fn failure(collector: impl Into<String>, cause: FetchError) -> Self {
        CollectorError::Failure {
            collector: collector.into(),
            cause,
        }
    }

    pub fn not_started(collector: impl Into<String>) -> Self {
        CollectorError::NotStarted {
            collector: collector.into(),
        }
    }

    /// Name of the collector that failed.
    pub fn collector(&self) -> &str {
        match self {
            CollectorError::Timeout { collector, .. }
            | CollectorError::Failure { collector, .. }
            | CollectorError::NotStarted { collector } => collector,
        }
    }

    /// Human-readable cause without the collector prefix.
    pub fn cause(&self) -> String {
        match self {
            CollectorError::Timeout { budget_ms, .. } => format!("timeout after {}ms", budget_ms),
            CollectorError::Failure { cause, .. } => cause.to_string(),
            CollectorError::NotStarted { .. } => "not started before the run deadline".to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CollectorError::Timeout { .. })
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            CollectorError::Timeout { .. } => "timeout",
            CollectorError::Failure { cause, .. } => cause.code_str(),
            CollectorError::NotStarted { .. } => "not_started",
        }
    }
}

/// Errors that end an aggregation run without a result.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("aggregation run was cancelled")]
    Aborted,

    #[error("Internal error: {0}")]
    Internal(String),
}
