use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("URL '{url}' is missing a host.")]
    UrlMissingHost { url: String },
    #[error("Missing URL (set --url or provide it in config).")]
    MissingUrl,
    #[error("Invalid HTTP method '{value}'. Use GET, POST, PUT, DELETE, HEAD, or PATCH.")]
    InvalidMethod { value: String },
    #[error("Expected status {status} is in the 500 series, which is reserved for server errors.")]
    ReservedStatus { status: u16 },
    #[error("Minimum required connection count is 2 (got {connections}).")]
    TooFewConnections { connections: usize },
    #[error("Request count must be >= 100 (got {requests}).")]
    TooFewRequests { requests: usize },
    #[error("Request count ({requests}) must be >= connection count ({connections}).")]
    RequestsBelowConnections { requests: usize, connections: usize },
    #[error("Invalid pipeline mode '{value}'. Use \"optimal\" or \"max\".")]
    InvalidPipelineMode { value: String },
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Invalid form entry '{entry}'. Expected 'name=value'.")]
    InvalidFormEntryFormat { entry: String },
    #[error("Invalid form entry '{entry}'. Field name must not be empty.")]
    FormEntryNameEmpty { entry: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'. Use <number>[ms|s|m].")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration number in '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'. Use ms, s, or m.")]
    InvalidDurationUnit { unit: String },
    #[error("Invalid boolean '{value}'. Use true/false, yes/no, on/off or 1/0.")]
    InvalidBoolean { value: String },
    #[error("Cannot combine a raw body (--data) with form fields (--form).")]
    BodyFormConflict,
    #[error("Failed to build runtime: {reason}")]
    RuntimeBuildFailed { reason: String },
}
