use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Failure taxonomy for gateway calls.
///
/// `Validation` is reserved: the consumed endpoints do not currently return
/// non-404 4xx for well-formed requests, but the classification is part of
/// the contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Transport failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// 404 on a specific entity.
    #[error("not found")]
    NotFound,

    /// 5xx from the gateway.
    #[error("server error (status {0})")]
    Server(u16),

    /// 4xx other than 404.
    #[error("invalid request (status {status}): {message}")]
    Validation { status: u16, message: String },
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => Self::NotFound,
            500..=599 => Self::Server(status),
            _ => Self::Validation { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(ApiError::from_status(404, String::new()), ApiError::NotFound);
        assert_eq!(ApiError::from_status(500, String::new()), ApiError::Server(500));
        assert_eq!(ApiError::from_status(503, String::new()), ApiError::Server(503));
        assert_eq!(
            ApiError::from_status(400, "bad name".to_owned()),
            ApiError::Validation {
                status: 400,
                message: "bad name".to_owned()
            }
        );
    }
}
