// Failure taxonomy for a single provider check.

/// Which class of failure a provider produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The text or properties do not meet the provider's preconditions.
    InvalidInput,
    /// The provider failed internally. It is not dispatched to again.
    ProviderFault,
    /// The provider returned data that breaks the exchange contract.
    ProtocolViolation,
}

impl FailureKind {
    /// Whether the failing provider must be taken out of rotation.
    pub fn is_fatal(self) -> bool {
        matches!(self, FailureKind::ProviderFault)
    }
}

/// Error reported by (or about) one provider during a check.
///
/// A failure is local to the provider that produced it; the checker keeps
/// dispatching to the remaining providers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    /// Unsupported language, empty text or similar precondition failure.
    #[error("provider {provider} rejected the input: {detail}")]
    InvalidInput { provider: String, detail: String },

    /// The provider crashed or reported an internal error.
    #[error("provider {provider} failed: {detail}")]
    ProviderFault { provider: String, detail: String },

    /// The provider broke the exchange contract.
    #[error("provider {provider} violated the protocol: {detail}")]
    ProtocolViolation { provider: String, detail: String },

    /// The provider is not dispatched to because it faulted earlier.
    #[error("provider {provider} is disabled after an earlier fault")]
    Disabled { provider: String },
}

impl CheckError {
    pub fn invalid_input(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        CheckError::InvalidInput {
            provider: provider.into(),
            detail: detail.into(),
        }
    }

    pub fn fault(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        CheckError::ProviderFault {
            provider: provider.into(),
            detail: detail.into(),
        }
    }

    pub fn violation(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        CheckError::ProtocolViolation {
            provider: provider.into(),
            detail: detail.into(),
        }
    }

    /// Name of the provider this error belongs to.
    pub fn provider(&self) -> &str {
        match self {
            CheckError::InvalidInput { provider, .. }
            | CheckError::ProviderFault { provider, .. }
            | CheckError::ProtocolViolation { provider, .. }
            | CheckError::Disabled { provider } => provider,
        }
    }

    /// Failure class. A disabled provider counts as a fault.
    pub fn kind(&self) -> FailureKind {
        match self {
            CheckError::InvalidInput { .. } => FailureKind::InvalidInput,
            CheckError::ProviderFault { .. } | CheckError::Disabled { .. } => {
                FailureKind::ProviderFault
            }
            CheckError::ProtocolViolation { .. } => FailureKind::ProtocolViolation,
        }
    }
}
