/// Structured error handling for swapdesk
///
/// One crate-wide error type with nested category enums. Quote errors carry
/// the user-facing message category so callers can surface a stable string
/// to the UI layer while keeping the raw provider payload for diagnostics.

// =============================================================================
// MAIN ERROR TYPE
// =============================================================================

#[derive(Debug, Clone)]
pub enum SwapdeskError {
    // Quote and transaction-build failures with user-facing categories
    Quote(QuoteError),

    // Network connectivity errors
    Network(NetworkError),

    // Configuration errors
    Configuration(ConfigurationError),

    // Data parsing & validation errors
    Data(DataError),
}

impl std::fmt::Display for SwapdeskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapdeskError::Quote(e) => write!(f, "Quote Error: {}", e),
            SwapdeskError::Network(e) => write!(f, "Network Error: {}", e),
            SwapdeskError::Configuration(e) => write!(f, "Configuration Error: {}", e),
            SwapdeskError::Data(e) => write!(f, "Data Error: {}", e),
        }
    }
}

impl std::error::Error for SwapdeskError {}

// =============================================================================
// QUOTE ERROR TYPES
// =============================================================================

/// Failures surfaced from the rate providers, normalized into the small set
/// of categories the UI layer understands.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteError {
    /// Requested chain has no configured provider; fatal to the request
    UnsupportedChain { provider: String, chain_id: u64 },
    /// Provider's estimated loss exceeds its maximum price impact
    PriceImpactTooHigh,
    /// No routes found with enough liquidity
    InsufficientLiquidity,
    /// Provider refused the order because the amount is below its minimum
    AmountTooSmall,
    /// Build-transaction step failed; never retried automatically
    TransactionBuild { provider: String, reason: String },
    /// Any unrecognized provider failure
    Generic { message: String },
}

impl QuoteError {
    /// Stable user-facing message for this category
    pub fn user_message(&self) -> &'static str {
        match self {
            QuoteError::UnsupportedChain { .. } => {
                "This network is not supported by the swap provider."
            }
            QuoteError::PriceImpactTooHigh => {
                "Price impact is higher than the allowed maximum. Try a lower amount or a different asset pair."
            }
            QuoteError::InsufficientLiquidity => {
                "There is not enough liquidity to route this swap. Try a lower amount."
            }
            QuoteError::AmountTooSmall => {
                "The amount is too small to be swapped. Try a higher amount."
            }
            QuoteError::TransactionBuild { .. } => {
                "There was an issue preparing the swap transaction."
            }
            QuoteError::Generic { .. } => {
                "There was an issue fetching data from the swap provider."
            }
        }
    }
}

impl std::fmt::Display for QuoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteError::UnsupportedChain { provider, chain_id } => {
                write!(f, "Chain {} is not supported by {}", chain_id, provider)
            }
            QuoteError::PriceImpactTooHigh => write!(f, "Price impact above maximum"),
            QuoteError::InsufficientLiquidity => write!(f, "Insufficient liquidity for route"),
            QuoteError::AmountTooSmall => write!(f, "Swap amount below provider minimum"),
            QuoteError::TransactionBuild { provider, reason } => {
                write!(f, "Transaction build via {} failed: {}", provider, reason)
            }
            QuoteError::Generic { message } => write!(f, "{}", message),
        }
    }
}

// =============================================================================
// NETWORK ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum NetworkError {
    RequestTimeout {
        endpoint: String,
        timeout_secs: u64,
    },
    HttpStatusError {
        endpoint: String,
        status: u16,
        body: Option<String>,
    },
    Generic {
        message: String,
    },
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::RequestTimeout {
                endpoint,
                timeout_secs,
            } => {
                write!(f, "Request to {} timed out after {}s", endpoint, timeout_secs)
            }
            NetworkError::HttpStatusError {
                endpoint,
                status,
                body,
            } => {
                write!(
                    f,
                    "HTTP {} from {}: {}",
                    status,
                    endpoint,
                    body.as_deref().unwrap_or("No body")
                )
            }
            NetworkError::Generic { message } => write!(f, "{}", message),
        }
    }
}

// =============================================================================
// CONFIGURATION ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum ConfigurationError {
    Generic { message: String },
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::Generic { message } => write!(f, "{}", message),
        }
    }
}

// =============================================================================
// DATA ERROR TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub enum DataError {
    ParseError {
        data_type: String,
        error: String,
    },
    InvalidAmount {
        amount: String,
        reason: String,
    },
    ValidationError {
        field: String,
        reason: String,
    },
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::ParseError { data_type, error } => {
                write!(f, "Failed to parse {}: {}", data_type, error)
            }
            DataError::InvalidAmount { amount, reason } => {
                write!(f, "Invalid amount '{}': {}", amount, reason)
            }
            DataError::ValidationError { field, reason } => {
                write!(f, "Validation failed for '{}': {}", field, reason)
            }
        }
    }
}

// =============================================================================
// CONVERSIONS FROM LIBRARY ERROR TYPES
// =============================================================================

impl From<QuoteError> for SwapdeskError {
    fn from(err: QuoteError) -> Self {
        SwapdeskError::Quote(err)
    }
}

impl From<reqwest::Error> for SwapdeskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return SwapdeskError::Network(NetworkError::RequestTimeout {
                endpoint: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                timeout_secs: 0,
            });
        }
        SwapdeskError::Network(NetworkError::Generic {
            message: format!("HTTP request failed: {}", err),
        })
    }
}

impl From<serde_json::Error> for SwapdeskError {
    fn from(err: serde_json::Error) -> Self {
        SwapdeskError::Data(DataError::ParseError {
            data_type: "JSON".to_string(),
            error: err.to_string(),
        })
    }
}

// =============================================================================
// STRUCTURED ERROR BUILDERS
// =============================================================================

impl SwapdeskError {
    /// Create an unsupported chain error for a provider
    pub fn unsupported_chain(provider: impl Into<String>, chain_id: u64) -> Self {
        SwapdeskError::Quote(QuoteError::UnsupportedChain {
            provider: provider.into(),
            chain_id,
        })
    }

    /// Create a transaction build error wrapping the underlying cause
    pub fn transaction_build(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        SwapdeskError::Quote(QuoteError::TransactionBuild {
            provider: provider.into(),
            reason: reason.into(),
        })
    }

    /// Create a network error
    pub fn network_error(message: impl Into<String>) -> Self {
        SwapdeskError::Network(NetworkError::Generic {
            message: message.into(),
        })
    }

    /// Create an HTTP status error with the response body kept for diagnostics
    pub fn http_status(endpoint: impl Into<String>, status: u16, body: Option<String>) -> Self {
        SwapdeskError::Network(NetworkError::HttpStatusError {
            endpoint: endpoint.into(),
            status,
            body,
        })
    }

    /// Create a parse error
    pub fn parse_error(data_type: impl Into<String>, error: impl Into<String>) -> Self {
        SwapdeskError::Data(DataError::ParseError {
            data_type: data_type.into(),
            error: error.into(),
        })
    }

    /// Create an invalid amount error
    pub fn invalid_amount(amount: impl Into<String>, reason: impl Into<String>) -> Self {
        SwapdeskError::Data(DataError::InvalidAmount {
            amount: amount.into(),
            reason: reason.into(),
        })
    }

    /// Create a validation error
    pub fn validation_error(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SwapdeskError::Data(DataError::ValidationError {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Create a configuration error
    pub fn configuration_error(message: impl Into<String>) -> Self {
        SwapdeskError::Configuration(ConfigurationError::Generic {
            message: message.into(),
        })
    }

    /// The user-facing message for this error, suitable for a swap panel
    pub fn user_message(&self) -> &'static str {
        match self {
            SwapdeskError::Quote(e) => e.user_message(),
            SwapdeskError::Network(_) => {
                "There was an issue fetching data from the swap provider."
            }
            SwapdeskError::Configuration(_) => "The swap service is misconfigured.",
            SwapdeskError::Data(_) => {
                "There was an issue fetching data from the swap provider."
            }
        }
    }
}
