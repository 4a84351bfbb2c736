//! Contract types shared across the DelayCover contract boundary.
//!
//! Anything returned by one contract and consumed by another lives here so
//! that the caller-side client traits and the implementing contracts agree on
//! the wire representation.

use soroban_sdk::{contracttype, Address, Bytes, BytesN, String, Vec};

/// Immutable policy template. Created once by the protocol admin, never
/// mutated or deleted afterwards.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct Policy {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Confirmation delay (in blocks) at or above which a claim pays out.
    pub delay_threshold: u32,
    /// Premium rate in basis points of the coverage amount.
    pub premium_rate_bps: u32,
    /// Protocol fee in basis points, recorded for off-chain fee accounting.
    pub protocol_fee_bps: u32,
    /// Fixed payout per covered incident, in token smallest units.
    pub payout_amount: i128,
}

/// Lifecycle of a purchased coverage instance. Records are append-only:
/// the status advances but the coverage is never deleted.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoverageStatus {
    Active,
    Expired,
    Claimed,
}

/// A holder's paid instantiation of a policy for a bounded height range.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct Coverage {
    pub purchase_id: String,
    pub policy_id: String,
    pub holder: Address,
    pub coverage_amount: i128,
    pub premium_paid: i128,
    pub start_height: u32,
    pub end_height: u32,
    pub status: CoverageStatus,
}

/// A trusted oracle's signed record of a transaction's broadcast and
/// inclusion heights. Keyed by the 32-byte transaction hash; one per hash.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct Attestation {
    pub oracle: Address,
    pub broadcast_height: u32,
    pub inclusion_height: u32,
    pub delay_blocks: u32,
    /// Stored for off-chain audit against the oracle's registered public key.
    pub signature: Bytes,
}

/// Oracle registry entry.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct OracleInfo {
    pub name: String,
    pub public_key: BytesN<33>,
    pub active: bool,
}

/// Merkle inclusion proof for a transaction in a block's transaction set.
///
/// `hashes` are the sibling hashes from leaf to root, in internal
/// (little-endian) byte order as they appear in the block. Bit `i` of
/// `tx_index` selects the concatenation side at level `i`.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct MerkleProof {
    pub tx_index: u32,
    pub hashes: Vec<BytesN<32>>,
    pub tree_depth: u32,
}
