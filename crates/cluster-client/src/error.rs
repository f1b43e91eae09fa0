//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API
///
/// Only `NotFound` is recoverable by the reconciler (it turns into a create);
/// every other variant is terminal for the current operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Object does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object already exists or the version token is stale (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Server rejected the request body (HTTP 400, 422)
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// Transport or authentication failure reaching the API
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Anything else
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ClientError {
    /// Classify an API status response by HTTP code
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            400 | 422 => Self::Invalid(message),
            401 | 403 => Self::Connectivity(message),
            _ => Self::Unexpected(format!("{code}: {message}")),
        }
    }

    /// Whether this error means the object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<kube::Error> for ClientError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => Self::from_status(response.code, response.message.clone()),
            kube::Error::SerdeError(e) => Self::Unexpected(e.to_string()),
            kube::Error::BuildRequest(e) => Self::Unexpected(e.to_string()),
            // Hyper, tower service, TLS and auth-provider failures
            other => Self::Connectivity(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_not_found() {
        let err = ClientError::from_status(404, "services \"nginx\" not found");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: services \"nginx\" not found");
    }

    #[test]
    fn test_from_status_conflict() {
        let err = ClientError::from_status(409, "the object has been modified");
        assert!(matches!(err, ClientError::Conflict(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_from_status_validation() {
        assert!(matches!(ClientError::from_status(422, "spec.clusterIP: field is immutable"), ClientError::Invalid(_)));
        assert!(matches!(ClientError::from_status(400, "bad request"), ClientError::Invalid(_)));
    }

    #[test]
    fn test_from_status_auth_is_connectivity() {
        assert!(matches!(ClientError::from_status(401, "Unauthorized"), ClientError::Connectivity(_)));
        assert!(matches!(ClientError::from_status(403, "Forbidden"), ClientError::Connectivity(_)));
    }

    #[test]
    fn test_from_status_other_keeps_code() {
        let err = ClientError::from_status(500, "etcdserver: request timed out");
        assert_eq!(err.to_string(), "Unexpected error: 500: etcdserver: request timed out");
    }
}
