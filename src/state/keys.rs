//! Key codec
//!
//! Deterministic mapping from (object type, attributes) to world-state keys.
//!
//! Keys are composite: a NUL namespace marker, the object type, then each
//! attribute followed by a NUL terminator. Because attributes may not contain
//! NUL, no key is a prefix of another object's key and prefix ranges over
//! one account's transactions never pick up a different account whose id
//! merely starts with the same characters.

use crate::domain::{LedgerError, LedgerResult};

const SEPARATOR: char = '\u{0}';
const RANGE_END: char = '\u{1}';

const ACCOUNT_TYPE: &str = "account";
const TRANSACTION_TYPE: &str = "txn";

/// Stateless key builder
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyCodec;

impl KeyCodec {
    /// Reject identifiers that cannot be embedded in a composite key
    pub fn validate_identifier(field: &str, value: &str) -> LedgerResult<()> {
        if value.is_empty() {
            return Err(LedgerError::InvalidIdentifier(format!(
                "{field} must not be empty"
            )));
        }
        if value.contains(SEPARATOR) {
            return Err(LedgerError::InvalidIdentifier(format!(
                "{field} must not contain NUL characters"
            )));
        }
        Ok(())
    }

    fn composite(object_type: &str, attributes: &[&str]) -> String {
        let len = 2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>();
        let mut key = String::with_capacity(len);
        key.push(SEPARATOR);
        key.push_str(object_type);
        key.push(SEPARATOR);
        for attribute in attributes {
            key.push_str(attribute);
            key.push(SEPARATOR);
        }
        key
    }

    /// Key of an account record
    pub fn account(account_id: &str) -> String {
        Self::composite(ACCOUNT_TYPE, &[account_id])
    }

    /// Key of a transaction record
    pub fn transaction(account_id: &str, reference_number: &str) -> String {
        Self::composite(TRANSACTION_TYPE, &[account_id, reference_number])
    }

    /// Half-open range covering every account
    pub fn all_accounts() -> (String, String) {
        Self::prefix_range(Self::composite(ACCOUNT_TYPE, &[]))
    }

    /// Half-open range covering every transaction of one account
    pub fn account_transactions(account_id: &str) -> (String, String) {
        Self::prefix_range(Self::composite(TRANSACTION_TYPE, &[account_id]))
    }

    /// Half-open range covering every transaction
    pub fn all_transactions() -> (String, String) {
        Self::prefix_range(Self::composite(TRANSACTION_TYPE, &[]))
    }

    /// `[prefix, prefix')` where `prefix'` swaps the trailing NUL for `\u{1}`.
    fn prefix_range(prefix: String) -> (String, String) {
        let mut end = prefix.clone();
        end.pop();
        end.push(RANGE_END);
        (prefix, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_range(key: &str, range: &(String, String)) -> bool {
        key >= range.0.as_str() && key < range.1.as_str()
    }

    #[test]
    fn test_keys_are_deterministic() {
        assert_eq!(KeyCodec::account("A"), KeyCodec::account("A"));
        assert_eq!(KeyCodec::account("A"), "\u{0}account\u{0}A\u{0}");
        assert_eq!(
            KeyCodec::transaction("A", "r1"),
            "\u{0}txn\u{0}A\u{0}r1\u{0}"
        );
    }

    #[test]
    fn test_distinct_inputs_give_distinct_keys() {
        // Naive "A_B" + "_" + "C" concatenation would collide here
        assert_ne!(
            KeyCodec::transaction("A_B", "C"),
            KeyCodec::transaction("A", "B_C")
        );
        assert_ne!(KeyCodec::account("txn"), KeyCodec::transaction("", "txn"));
    }

    #[test]
    fn test_account_transaction_range_is_exact() {
        let range = KeyCodec::account_transactions("A");

        assert!(in_range(&KeyCodec::transaction("A", "r1"), &range));
        assert!(in_range(&KeyCodec::transaction("A", "zzzz"), &range));
        assert!(!in_range(&KeyCodec::transaction("AB", "r1"), &range));
        assert!(!in_range(&KeyCodec::transaction("B", "r1"), &range));
        assert!(!in_range(&KeyCodec::account("A"), &range));
    }

    #[test]
    fn test_namespace_ranges_do_not_overlap() {
        let accounts = KeyCodec::all_accounts();
        let transactions = KeyCodec::all_transactions();

        assert!(in_range(&KeyCodec::account("anything"), &accounts));
        assert!(!in_range(&KeyCodec::account("anything"), &transactions));
        assert!(in_range(&KeyCodec::transaction("A", "r"), &transactions));
        assert!(!in_range(&KeyCodec::transaction("A", "r"), &accounts));
    }

    #[test]
    fn test_validate_identifier() {
        assert!(KeyCodec::validate_identifier("account_id", "alice").is_ok());
        assert!(matches!(
            KeyCodec::validate_identifier("account_id", ""),
            Err(LedgerError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            KeyCodec::validate_identifier("reference_number", "a\u{0}b"),
            Err(LedgerError::InvalidIdentifier(_))
        ));
    }
}
