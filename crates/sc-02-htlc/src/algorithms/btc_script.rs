//! BTC leg script construction.
//!
//! The lock is a P2SH output paying to:
//!
//! ```text
//! OP_IF
//!     OP_SHA256 <hash> OP_EQUALVERIFY <recipient> OP_CHECKSIG
//! OP_ELSE
//!     <locktime> OP_CHECKLOCKTIMEVERIFY OP_DROP <sender> OP_CHECKSIG
//! OP_ENDIF
//! ```

use crate::domain::HtlcError;
use bitcoin::opcodes::all::*;
use bitcoin::script::Builder;
use bitcoin::{Address, Network, PublicKey, ScriptBuf};
use shared_types::{ChainId, Hash, Timestamp};

/// Build the redeem script for a BTC lock.
pub fn build_htlc_script(
    hash: Hash,
    recipient: &PublicKey,
    sender: &PublicKey,
    locktime: Timestamp,
) -> Result<ScriptBuf, HtlcError> {
    let locktime = u32::try_from(locktime).map_err(|_| HtlcError::TimelockOutOfRange {
        chain: ChainId::Btc,
        timelock: locktime,
    })?;

    Ok(Builder::new()
        .push_opcode(OP_IF)
        .push_opcode(OP_SHA256)
        .push_slice(hash)
        .push_opcode(OP_EQUALVERIFY)
        .push_key(recipient)
        .push_opcode(OP_CHECKSIG)
        .push_opcode(OP_ELSE)
        .push_int(i64::from(locktime))
        .push_opcode(OP_CLTV)
        .push_opcode(OP_DROP)
        .push_key(sender)
        .push_opcode(OP_CHECKSIG)
        .push_opcode(OP_ENDIF)
        .into_script())
}

/// P2SH address of a redeem script.
pub fn escrow_address(script: &ScriptBuf, network: Network) -> Result<Address, HtlcError> {
    Address::p2sh(script, network)
        .map_err(|e| HtlcError::InvalidParticipant(format!("redeem script rejected: {}", e)))
}

/// P2PKH address owned by a key.
pub fn owner_address(key: &PublicKey, network: Network) -> Address {
    Address::p2pkh(key.pubkey_hash(), network)
}
