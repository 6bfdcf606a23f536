//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use sourcedeck_domain::SourcedeckError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SourcedeckError);

impl From<InfraError> for SourcedeckError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SourcedeckError> for InfraError {
    fn from(value: SourcedeckError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SourcedeckError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        if value.is_timeout() {
            return InfraError(SourcedeckError::Timeout("HTTP request timed out".into()));
        }

        if value.is_connect() {
            return InfraError(SourcedeckError::Network("HTTP connection failure".into()));
        }

        if let Some(status) = value.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return InfraError(match code {
                401 | 403 => SourcedeckError::Auth(message),
                404 => SourcedeckError::NotFound(message),
                400..=499 => SourcedeckError::InvalidInput(message),
                _ => SourcedeckError::Network(message),
            });
        }

        InfraError(SourcedeckError::Network(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
