//! Error taxonomy for the request pipeline.

use serde::Serialize;
use thiserror::Error;

use crate::i18n;

/// Rejected request input. Always maps to a client error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A valid positive integer city id is required.")]
    InvalidCityId,

    #[error("A non-empty search query is required.")]
    InvalidQuery,

    #[error("\"{0}\" is not a supported language.")]
    InvalidLanguage(String),

    #[error("City {0} does not exist.")]
    CityNotFound(i64),

    #[error("The query string could not be decoded.")]
    InvalidQueryString,
}

impl ValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidCityId | Self::CityNotFound(_) => "city_id",
            Self::InvalidQuery => "query",
            Self::InvalidLanguage(_) => "language",
            Self::InvalidQueryString => "query_string",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCityId => "invalid_city_id",
            Self::InvalidQuery => "invalid_query",
            Self::InvalidLanguage(_) => "invalid_language",
            Self::CityNotFound(_) => "city_not_found",
            Self::InvalidQueryString => "invalid_query_string",
        }
    }

    pub fn detail(&self) -> ValidationDetail {
        ValidationDetail {
            field: self.field(),
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Field-level payload returned to the client for a [`ValidationError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDetail {
    pub field: &'static str,
    pub code: &'static str,
    pub message: String,
}

/// The upstream provider could not be reached, timed out, or answered with a non-2xx status.
///
/// Every transport failure collapses into this one error so callers handle them uniformly.
#[derive(Debug, Clone, Error)]
#[error("upstream request for {resource} failed: {reason}")]
pub struct ExternalApiError {
    resource: String,
    reason: String,
}

impl ExternalApiError {
    pub fn new(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Identifier of the requested resource, e.g. `weather:2950159`.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// The upstream payload did not have the shape the transformer relies on.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("malformed upstream payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("upstream payload is missing {0}")]
    Missing(&'static str),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to encode cache value: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode cache value: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Everything a request can end in besides success.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    External(#[from] ExternalApiError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl ServiceError {
    /// Whether the failure is the caller's fault (400) rather than ours (500).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Text that is safe to show the client. Server-side failures never expose details.
    pub fn user_message(&self, language: &str) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::External(_) | Self::Transform(_) => i18n::try_again_later(language).to_string(),
        }
    }
}
