/*!
 * Error types for the bubblefish application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The API refused to produce content for safety/policy reasons.
    /// Distinct from transport errors: retrying the same request will
    /// not succeed, the caller must change the request instead.
    #[error("Content filtered by the API: {0}")]
    ContentFiltered(String),
}

impl ProviderError {
    /// Whether this failure is a policy block rather than a transport problem
    pub fn is_content_filtered(&self) -> bool {
        matches!(self, Self::ContentFiltered(_))
    }
}

/// Validation failures when decoding a provider response into a page translation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Response body is empty or whitespace-only
    #[error("Empty API response")]
    EmptyResponse,

    /// Response is not decodable into the expected structured schema
    #[error("Response does not match the translation schema: {0}")]
    SchemaError(String),

    /// Number of translated entries differs from the number of requested fragments
    #[error("Translation count mismatch: expected {expected}, got {actual}")]
    CountMismatch {
        /// Fragment count in the request
        expected: usize,
        /// Entry count in the response
        actual: usize,
    },

    /// The response text is a safety/policy block notice rather than content
    #[error("Response signals a content filter block: {0}")]
    ContentFiltered(String),
}

/// Errors that can occur in the terminology dictionary.
///
/// A corrupt dictionary file is not an error here: loading falls back to
/// an empty in-memory dictionary and leaves the file untouched.
#[derive(Error, Debug)]
pub enum TerminologyError {
    /// Persisting the dictionary to disk failed
    #[error("Failed to persist terminology dictionary: {0}")]
    PersistFailed(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from response parsing
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error from the terminology store
    #[error("Terminology error: {0}")]
    Terminology(#[from] TerminologyError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
