//! Error handling for the trip engine

/// Catalog loading failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl CatalogError {
    /// Whether calling `load` again can succeed without the source changing
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CatalogError::Parse(_))
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(e: serde_yaml::Error) -> Self {
        CatalogError::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        CatalogError::Network(e.to_string())
    }
}

/// Add-on price cross-reference failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum CalculationError {
    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Arithmetic overflow in trip price")]
    Overflow,

    #[error("Calculation failed: {0}")]
    Failed(String),
}

/// Crate-level error type
#[derive(Debug, thiserror::Error)]
pub enum TripError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Calculation(#[from] CalculationError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TripError {
    /// User-facing message for this error. The detail goes to the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            TripError::Catalog(e) => {
                tracing::error!("Catalog error: {}", e);
                match e {
                    CatalogError::Parse(_) => "Trip data is malformed",
                    _ => "Failed to load trip data",
                }
            }
            TripError::Calculation(e) => {
                tracing::error!("Calculation error: {}", e);
                "Failed to calculate addon prices"
            }
            TripError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                "Configuration error"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, TripError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = TripError::from(CatalogError::Network("connection refused".to_string()));
        assert_eq!(err.user_message(), "Failed to load trip data");

        let err = TripError::from(CatalogError::Parse("bad indent".to_string()));
        assert_eq!(err.user_message(), "Trip data is malformed");

        let err = TripError::from(CalculationError::Overflow);
        assert_eq!(err.user_message(), "Failed to calculate addon prices");
    }

    #[test]
    fn test_retryable() {
        assert!(CatalogError::Network("timeout".to_string()).is_retryable());
        assert!(CatalogError::Status {
            status: 503,
            url: "http://x/trip-data.yml".to_string()
        }
        .is_retryable());
        assert!(!CatalogError::Parse("eof".to_string()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = CatalogError::Status {
            status: 404,
            url: "http://x/trip-data.yml".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("trip-data.yml"));

        let err = CalculationError::from(CatalogError::Parse("eof".to_string()));
        assert!(err.to_string().contains("eof"));
    }
}
