//! # Accounts & the Account Store
//!
//! The transaction core does not own account persistence — it consumes an
//! [`AccountStore`] and mutates balances exclusively through additive
//! [`AccountDelta`] merges. This is the contract that makes the compensating
//! rollback in the state mutator exact: every delta has a precise inverse,
//! and applying a delta followed by its inverse is observationally a no-op.
//!
//! [`MemoryAccountStore`] is the in-process implementation used by tests and
//! the node selfcheck. A production deployment substitutes a database-backed
//! store behind the same trait; the pipeline neither knows nor cares.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ADDRESS_SUFFIX;
use crate::crypto::{sha256_array, SolisPublicKey};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by an account store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A merge would drive a balance below zero.
    #[error("merge would drive {field} of {address} negative (current {current}, delta {delta})")]
    NegativeBalance {
        address: String,
        field: &'static str,
        current: u64,
        delta: i128,
    },

    /// A merge would push a balance past `u64::MAX`.
    #[error("merge overflows {field} of {address} (current {current}, delta {delta})")]
    BalanceOverflow {
        address: String,
        field: &'static str,
        current: u64,
        delta: i128,
    },

    /// The backing storage failed.
    #[error("account store backend: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// The slice of account state the transaction core reads and mutates.
///
/// `balance` is authoritative, reflected after block inclusion; `u_balance`
/// is the tentative value tracking pool-admitted transactions. The
/// multisignature fields mirror the same confirmed/unconfirmed split.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Derived address, e.g. `58191285901858109S`.
    pub address: String,
    /// The account's registered public key. `None` until the first outgoing
    /// transaction reveals it.
    pub public_key: Option<SolisPublicKey>,
    /// Confirmed balance in lux.
    pub balance: u64,
    /// Unconfirmed balance in lux.
    pub u_balance: u64,
    /// Whether a second signing key is registered for this account.
    pub second_signature: bool,
    /// The registered second public key, when `second_signature` is set.
    pub second_public_key: Option<SolisPublicKey>,
    /// Confirmed multisignature co-signer public keys (lowercase hex).
    pub multisignatures: Vec<String>,
    /// Pending (unconfirmed) multisignature co-signer public keys.
    pub u_multisignatures: Vec<String>,
    /// Minimum number of co-signatures required once the multisignature
    /// group is confirmed.
    pub multimin: u32,
    /// Block id of the last merge that touched the confirmed balance.
    pub block_id: Option<String>,
    /// Round of the last confirmed-balance merge.
    pub round: Option<u64>,
}

impl Account {
    /// A fresh account at the given address with both balances set.
    pub fn with_balance(address: &str, balance: u64) -> Self {
        Self {
            address: address.to_string(),
            balance,
            u_balance: balance,
            ..Default::default()
        }
    }

    /// Returns `true` if the account has a confirmed multisignature group.
    pub fn is_multisignature(&self) -> bool {
        !self.multisignatures.is_empty()
    }
}

/// Derives the Solis address for a public key.
///
/// The address is the base-10 rendering of the first eight bytes of
/// SHA-256(public key) read as a little-endian u64, followed by the address
/// suffix character. The same digest-truncation scheme the transaction id
/// uses, applied to key material instead of transaction bytes.
pub fn address_from_public_key(public_key: &SolisPublicKey) -> String {
    let digest = sha256_array(public_key.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    format!("{}{}", u64::from_le_bytes(head), ADDRESS_SUFFIX)
}

// ---------------------------------------------------------------------------
// AccountDelta
// ---------------------------------------------------------------------------

/// An additive account update: the only way the pipeline mutates balances.
///
/// Balance fields are signed so that debit and credit are the same
/// operation. [`AccountDelta::inverted`] produces the exact compensating
/// delta for rollback.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountDelta {
    /// Signed change to the confirmed balance, in lux.
    pub balance: i128,
    /// Signed change to the unconfirmed balance, in lux.
    pub u_balance: i128,
    /// Block id to stamp onto the account, if any.
    pub block_id: Option<String>,
    /// Round to stamp onto the account, if any.
    pub round: Option<u64>,
}

impl AccountDelta {
    /// A delta touching only the confirmed balance, stamped with block
    /// provenance.
    pub fn confirmed(balance: i128, block_id: &str, round: u64) -> Self {
        Self {
            balance,
            u_balance: 0,
            block_id: Some(block_id.to_string()),
            round: Some(round),
        }
    }

    /// A delta touching only the unconfirmed balance.
    pub fn unconfirmed(u_balance: i128) -> Self {
        Self {
            u_balance,
            ..Default::default()
        }
    }

    /// The exact inverse of this delta's balance effects.
    ///
    /// Block provenance is carried along unchanged: a rollback merge stamps
    /// the same block id it is compensating for.
    pub fn inverted(&self) -> Self {
        Self {
            balance: -self.balance,
            u_balance: -self.u_balance,
            block_id: self.block_id.clone(),
            round: self.round,
        }
    }
}

// ---------------------------------------------------------------------------
// AccountStore
// ---------------------------------------------------------------------------

/// The account state store consumed by the transaction core.
///
/// `merge` is the serialization point for per-account mutation: for a given
/// address, concurrent merges must be applied atomically and in some total
/// order. The balance checks in the state mutator rely on this.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch an account by address. `None` if it has never been written.
    async fn get(&self, address: &str) -> Result<Option<Account>, StoreError>;

    /// Apply an additive delta to the account at `address`, creating the
    /// account if it does not exist, and return the updated state.
    ///
    /// Fails without any partial effect if the delta would drive a balance
    /// negative or past `u64::MAX`.
    async fn merge(&self, address: &str, delta: AccountDelta) -> Result<Account, StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryAccountStore
// ---------------------------------------------------------------------------

/// In-memory account store backed by a `HashMap` under a `parking_lot`
/// RwLock. The write lock is the per-account serialization point.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account directly, replacing any existing entry. Test and
    /// bootstrap convenience; the pipeline itself only merges.
    pub fn put(&self, account: Account) {
        self.accounts
            .write()
            .insert(account.address.clone(), account);
    }
}

/// Applies a signed delta to a u64 balance with both bounds checked.
fn apply_signed(
    address: &str,
    field: &'static str,
    current: u64,
    delta: i128,
) -> Result<u64, StoreError> {
    let next = current as i128 + delta;
    if next < 0 {
        return Err(StoreError::NegativeBalance {
            address: address.to_string(),
            field,
            current,
            delta,
        });
    }
    u64::try_from(next).map_err(|_| StoreError::BalanceOverflow {
        address: address.to_string(),
        field,
        current,
        delta,
    })
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get(&self, address: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().get(address).cloned())
    }

    async fn merge(&self, address: &str, delta: AccountDelta) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write();
        let account = accounts.entry(address.to_string()).or_insert_with(|| Account {
            address: address.to_string(),
            ..Default::default()
        });

        // Validate both fields before touching either, so a failed merge
        // leaves the account exactly as it was.
        let balance = apply_signed(address, "balance", account.balance, delta.balance)?;
        let u_balance = apply_signed(address, "u_balance", account.u_balance, delta.u_balance)?;

        account.balance = balance;
        account.u_balance = u_balance;
        if let Some(block_id) = delta.block_id {
            account.block_id = Some(block_id);
        }
        if let Some(round) = delta.round {
            account.round = Some(round);
        }

        Ok(account.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
