//! # Domain Value Objects
//!
//! Signer identities and the fixed owner set.

use super::errors::MultisigError;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::HashSet;

/// Sequential transaction id.
pub type TxId = u64;

/// An owner's identity.
pub type SignerId = Address;

/// The k-of-n approval policy. Fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSet {
    owners: Vec<SignerId>,
    threshold: usize,
}

impl OwnerSet {
    /// Validate and freeze an owner set.
    ///
    /// Rejects an empty set, duplicate or zero owners, and a threshold
    /// outside `1..=owners.len()`.
    pub fn new(owners: Vec<SignerId>, threshold: usize) -> Result<Self, MultisigError> {
        if owners.is_empty() {
            return Err(MultisigError::InvalidOwnerSet("no owners".into()));
        }
        if owners.iter().any(|o| *o == [0u8; 20]) {
            return Err(MultisigError::InvalidOwnerSet("zero address owner".into()));
        }
        let unique: HashSet<&SignerId> = owners.iter().collect();
        if unique.len() != owners.len() {
            return Err(MultisigError::InvalidOwnerSet("duplicate owner".into()));
        }
        if threshold == 0 || threshold > owners.len() {
            return Err(MultisigError::InvalidOwnerSet(format!(
                "threshold {} outside 1..={}",
                threshold,
                owners.len()
            )));
        }
        Ok(Self { owners, threshold })
    }

    /// Owners in declaration order.
    pub fn owners(&self) -> &[SignerId] {
        &self.owners
    }

    /// Confirmations required to execute.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of owners.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Membership test.
    pub fn contains(&self, signer: &SignerId) -> bool {
        self.owners.contains(signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_owner_set() {
        let set = OwnerSet::new(vec![[1u8; 20], [2u8; 20], [3u8; 20]], 2).unwrap();
        assert_eq!(set.threshold(), 2);
        assert!(set.contains(&[2u8; 20]));
        assert!(!set.contains(&[9u8; 20]));
    }

    #[test]
    fn test_rejects_bad_sets() {
        assert!(OwnerSet::new(vec![], 1).is_err());
        assert!(OwnerSet::new(vec![[1u8; 20], [1u8; 20]], 1).is_err());
        assert!(OwnerSet::new(vec![[1u8; 20]], 0).is_err());
        assert!(OwnerSet::new(vec![[1u8; 20]], 2).is_err());
        assert!(OwnerSet::new(vec![[0u8; 20]], 1).is_err());
    }
}
