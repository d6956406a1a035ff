//! # Chain Configuration & Constants
//!
//! Every consensus-relevant magic number in Solis lives here. These values
//! define the identity of the network; changing any of them after launch is
//! a hard fork, whether you meant it to be or not.
//!
//! [`ChainParams`] bundles the subset that the transaction pipeline consumes
//! at runtime, so that tests and alternate networks can override values
//! without touching process-wide state.

// ---------------------------------------------------------------------------
// Supply & Denomination
// ---------------------------------------------------------------------------

/// Total token supply in lux, the smallest indivisible unit.
/// 100 million SOLIS at 8 decimal places. No transaction amount or fee may
/// exceed this value.
pub const TOTAL_SUPPLY: u64 = 10_000_000_000_000_000;

/// Number of decimal places between SOLIS and lux.
pub const AMOUNT_DECIMALS: u8 = 8;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// The single suffix character terminating every Solis address.
/// An address is the base-10 rendering of a u64 followed by this character,
/// e.g. `58191285901858109S`.
pub const ADDRESS_SUFFIX: char = 'S';

// ---------------------------------------------------------------------------
// Slots & Rounds
// ---------------------------------------------------------------------------

/// Chain epoch: 2025-01-01T00:00:00Z as Unix seconds. Transaction timestamps
/// count seconds since this instant, not since the Unix epoch.
pub const EPOCH_TIMESTAMP: i64 = 1_735_689_600;

/// Duration of one slot in seconds. One block is forged per slot.
pub const SLOT_INTERVAL: i64 = 10;

/// Number of forging delegates per round. Rounds are windows of this many
/// consecutive blocks over which delegate rewards are accounted.
pub const DELEGATES_PER_ROUND: u64 = 101;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Flat fee for a type-0 transfer, in lux (0.1 SOLIS).
pub const TRANSFER_FEE: u64 = 10_000_000;

// ---------------------------------------------------------------------------
// Genesis & Grandfathered Anomalies
// ---------------------------------------------------------------------------

/// Identifier of the genesis block. Transactions carrying this block id are
/// exempt from the balance check and the second-signature requirement.
pub const GENESIS_BLOCK_ID: &str = "11850977513252156769";

/// Transaction ids grandfathered from the sender-public-key check.
/// A handful of early-chain transactions were accepted with a public key
/// that no longer matches the sender account's stored key; rejecting them
/// retroactively would break replay from height 0.
pub const SENDER_PUBLIC_KEY_EXCEPTIONS: &[&str] =
    &["5676385569010367331", "9850029527813915297"];

// ---------------------------------------------------------------------------
// ChainParams
// ---------------------------------------------------------------------------

/// Runtime bundle of the chain parameters the transaction core consumes.
///
/// Constructed once at startup (usually via `Default`, which reads the
/// constants above) and carried inside the immutable
/// [`ChainContext`](crate::transaction::ChainContext). Tests override
/// individual fields to probe boundaries without redefining the network.
#[derive(Clone, Debug)]
pub struct ChainParams {
    /// Upper bound for amounts and fees, in lux.
    pub total_supply: u64,
    /// Forging delegates per round.
    pub delegates_per_round: u64,
    /// Genesis block identifier.
    pub genesis_block_id: String,
    /// Transaction ids exempt from the sender-public-key check.
    pub sender_public_key_exceptions: Vec<String>,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            total_supply: TOTAL_SUPPLY,
            delegates_per_round: DELEGATES_PER_ROUND,
            genesis_block_id: GENESIS_BLOCK_ID.to_string(),
            sender_public_key_exceptions: SENDER_PUBLIC_KEY_EXCEPTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ChainParams {
    /// Returns `true` if the given transaction id is on the grandfather list.
    pub fn is_exempt_transaction(&self, id: &str) -> bool {
        self.sender_public_key_exceptions.iter().any(|e| e == id)
    }
}

/// Formats a lux amount as a human-readable SOLIS string with 8 decimals.
/// Example: `10_000_000` -> `"0.10000000"`.
pub fn format_solis_amount(lux: u64) -> String {
    let divisor = 10u64.pow(AMOUNT_DECIMALS as u32);
    format!("{}.{:08}", lux / divisor, lux % divisor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_supply_fits_checked_arithmetic() {
        // amount + fee for two maximal values must not overflow u64,
        // otherwise the checked additions in apply() could never succeed
        // at the boundary the verifier permits.
        assert!(TOTAL_SUPPLY.checked_add(TOTAL_SUPPLY).is_some());
    }

    #[test]
    fn address_suffix_is_not_a_digit() {
        // Address parsing strips exactly one non-digit suffix character.
        assert!(!ADDRESS_SUFFIX.is_ascii_digit());
    }

    #[test]
    fn genesis_block_id_is_a_u64_decimal() {
        assert!(GENESIS_BLOCK_ID.parse::<u64>().is_ok());
    }

    #[test]
    fn exception_ids_are_u64_decimals() {
        for id in SENDER_PUBLIC_KEY_EXCEPTIONS {
            assert!(id.parse::<u64>().is_ok(), "bad exception id: {}", id);
        }
    }

    #[test]
    fn default_params_mirror_constants() {
        let params = ChainParams::default();
        assert_eq!(params.total_supply, TOTAL_SUPPLY);
        assert_eq!(params.delegates_per_round, DELEGATES_PER_ROUND);
        assert_eq!(params.genesis_block_id, GENESIS_BLOCK_ID);
        assert!(params.is_exempt_transaction(SENDER_PUBLIC_KEY_EXCEPTIONS[0]));
        assert!(!params.is_exempt_transaction("1"));
    }

    #[test]
    fn format_solis_amount_rounds_nothing() {
        assert_eq!(format_solis_amount(0), "0.00000000");
        assert_eq!(format_solis_amount(TRANSFER_FEE), "0.10000000");
        assert_eq!(format_solis_amount(123_456_789), "1.23456789");
    }
}
