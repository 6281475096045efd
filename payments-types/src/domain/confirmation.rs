//! Bank confirmation outcome.

/// What a bank said about a payment. Transient: informs the authorizer,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationOutcome {
    pub approved: bool,
    pub reason: Option<String>,
}

impl ConfirmationOutcome {
    pub fn approved() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }
}
