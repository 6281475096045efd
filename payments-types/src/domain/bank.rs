//! Banks and the routing table that decides whether a payment
//! needs external confirmation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PaymentError;

/// Banks the authorizer can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bank {
    #[serde(rename = "The Big Bank")]
    BigBank,
    #[serde(rename = "The Cashiers")]
    Cashiers,
    #[serde(rename = "Loaners")]
    Loaners,
}

impl Bank {
    /// All routable banks.
    pub const ALL: [Bank; 3] = [Bank::BigBank, Bank::Cashiers, Bank::Loaners];

    /// Display name used on the wire and in the ledger.
    pub fn name(&self) -> &'static str {
        match self {
            Bank::BigBank => "The Big Bank",
            Bank::Cashiers => "The Cashiers",
            Bank::Loaners => "Loaners",
        }
    }

    /// Short identifier accepted as an alternative to the display name.
    pub fn slug(&self) -> &'static str {
        match self {
            Bank::BigBank => "big-bank",
            Bank::Cashiers => "cashiers",
            Bank::Loaners => "loaners",
        }
    }

    /// Amounts strictly above this need confirmation from the bank.
    pub fn threshold(&self) -> i64 {
        match self {
            Bank::BigBank => 200,
            Bank::Cashiers | Bank::Loaners => 100,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Bank {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Bank::ALL
            .into_iter()
            .find(|bank| {
                bank.name().eq_ignore_ascii_case(needle) || bank.slug().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| PaymentError::UnsupportedBank {
                bank: s.to_string(),
            })
    }
}

/// Size label recorded with every ledger entry (audit/reporting only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Big,
}

impl SizeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Big => "big",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SizeClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(SizeClass::Small),
            "big" => Ok(SizeClass::Big),
            other => Err(format!("Unknown size class: {}", other)),
        }
    }
}

/// Which bank a payment goes to and whether that bank must confirm it.
///
/// Derived from `(bank, amount)`, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    pub bank: Bank,
    pub size_class: SizeClass,
}

impl RoutingDecision {
    /// Applies the routing table. An amount exactly at the threshold is small.
    pub fn route(bank: Bank, amount: i64) -> Self {
        let size_class = if amount > bank.threshold() {
            SizeClass::Big
        } else {
            SizeClass::Small
        };
        Self { bank, size_class }
    }

    /// Big payments are confirmed with the bank before anything is persisted.
    pub fn requires_confirmation(&self) -> bool {
        self.size_class == SizeClass::Big
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_names_and_slugs() {
        assert_eq!("The Big Bank".parse::<Bank>().unwrap(), Bank::BigBank);
        assert_eq!("the cashiers".parse::<Bank>().unwrap(), Bank::Cashiers);
        assert_eq!("Loaners".parse::<Bank>().unwrap(), Bank::Loaners);
        assert_eq!("big-bank".parse::<Bank>().unwrap(), Bank::BigBank);
        assert_eq!("CASHIERS".parse::<Bank>().unwrap(), Bank::Cashiers);
    }

    #[test]
    fn test_unknown_bank_is_unsupported() {
        let result = "Unsupported Bank".parse::<Bank>();
        assert!(matches!(
            result,
            Err(PaymentError::UnsupportedBank { bank }) if bank == "Unsupported Bank"
        ));
    }

    #[test]
    fn test_bank_serde_uses_display_name() {
        let json = serde_json::to_string(&Bank::BigBank).unwrap();
        assert_eq!(json, "\"The Big Bank\"");
        let parsed: Bank = serde_json::from_str("\"Loaners\"").unwrap();
        assert_eq!(parsed, Bank::Loaners);
    }

    #[test]
    fn test_big_bank_routing() {
        assert_eq!(
            RoutingDecision::route(Bank::BigBank, 150).size_class,
            SizeClass::Small
        );
        assert_eq!(
            RoutingDecision::route(Bank::BigBank, 201).size_class,
            SizeClass::Big
        );
        assert!(RoutingDecision::route(Bank::BigBank, 201).requires_confirmation());
    }

    #[test]
    fn test_cashiers_and_loaners_routing() {
        for bank in [Bank::Cashiers, Bank::Loaners] {
            assert_eq!(RoutingDecision::route(bank, 99).bank, bank);
            assert!(!RoutingDecision::route(bank, 99).requires_confirmation());
            assert!(RoutingDecision::route(bank, 101).requires_confirmation());
            // Between the two thresholds: big for these banks, small for Big Bank.
            assert!(RoutingDecision::route(bank, 150).requires_confirmation());
        }
    }

    // The boundary was inconsistent in earlier versions of this service
    // (one variant skipped the boundary amount entirely). It is pinned here:
    // exactly-at-threshold is small and never calls the bank.
    #[test]
    fn test_amount_at_threshold_is_small() {
        for bank in Bank::ALL {
            let decision = RoutingDecision::route(bank, bank.threshold());
            assert_eq!(decision.size_class, SizeClass::Small, "{}", bank);
            assert!(!decision.requires_confirmation());
        }
    }

    #[test]
    fn test_size_class_round_trip() {
        assert_eq!("big".parse::<SizeClass>().unwrap(), SizeClass::Big);
        assert_eq!(SizeClass::Small.to_string(), "small");
        assert!("medium".parse::<SizeClass>().is_err());
    }
}
