//! Card identifier domain model.

use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// Identifier of the card a balance is held against.
///
/// Guaranteed non-empty. The raw value is only exposed through
/// [`CardNumber::as_str`]; `Display` prints the masked form so card
/// numbers do not leak into logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardNumber(String);

impl CardNumber {
    /// Creates a card number, trimming surrounding whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, PaymentError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "Card number cannot be empty".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the full card number.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the card number with everything but the last four characters hidden.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}

impl std::fmt::Display for CardNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl TryFrom<String> for CardNumber {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CardNumber> for String {
    fn from(card: CardNumber) -> Self {
        card.0
    }
}

impl std::str::FromStr for CardNumber {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
