//! # Bitcoin SPV Proof Verification
//!
//! Reusable primitives for verifying that a transaction is included in a
//! Bitcoin block: double-SHA256 hashing, 80-byte header field extraction, and
//! pairwise Merkle accumulation ordered by the transaction's index bits.
//!
//! All hashes are in internal (little-endian) byte order as they appear in
//! the block. Header authenticity is out of scope here; callers anchor known
//! header hashes separately.

use crate::types::MerkleProof;
use soroban_sdk::{Bytes, BytesN, Env};

/// Length of a serialized Bitcoin block header.
pub const HEADER_LEN: u32 = 80;

/// Byte range of the merkle root within an 80-byte header.
const MERKLE_ROOT_START: u32 = 36;
const MERKLE_ROOT_END: u32 = 68;

/// Bitcoin's double SHA-256.
pub fn double_sha256(env: &Env, data: &Bytes) -> BytesN<32> {
    let first: BytesN<32> = env.crypto().sha256(data).into();
    env.crypto().sha256(&first.into()).into()
}

/// Transaction id of raw transaction bytes.
pub fn tx_id(env: &Env, tx_bytes: &Bytes) -> BytesN<32> {
    double_sha256(env, tx_bytes)
}

/// Block hash of a serialized header.
pub fn header_hash(env: &Env, header: &Bytes) -> BytesN<32> {
    double_sha256(env, header)
}

/// Extract the merkle root from an 80-byte block header.
///
/// Returns `None` if the header is not exactly 80 bytes.
pub fn header_merkle_root(env: &Env, header: &Bytes) -> Option<BytesN<32>> {
    if header.len() != HEADER_LEN {
        return None;
    }
    let slice = header.slice(MERKLE_ROOT_START..MERKLE_ROOT_END);
    let mut buf = [0u8; 32];
    slice.copy_into_slice(&mut buf);
    Some(BytesN::from_array(env, &buf))
}

/// Verify a Merkle inclusion proof for a transaction id against a root.
///
/// At each level the current hash and the sibling are concatenated — current
/// on the left when the corresponding bit of `tx_index` is zero, on the right
/// otherwise — and double-SHA256 hashed to produce the parent. The proof must
/// supply exactly `tree_depth` sibling hashes.
pub fn verify_inclusion(
    env: &Env,
    txid: &BytesN<32>,
    root: &BytesN<32>,
    proof: &MerkleProof,
) -> bool {
    if proof.hashes.len() != proof.tree_depth {
        return false;
    }

    let mut current = txid.clone();
    let mut index = proof.tx_index;

    for i in 0..proof.hashes.len() {
        let sibling = proof.hashes.get(i).unwrap();

        let mut combined = Bytes::new(env);
        if index & 1 == 0 {
            combined.append(&current.clone().into());
            combined.append(&sibling.clone().into());
        } else {
            combined.append(&sibling.clone().into());
            combined.append(&current.clone().into());
        }

        current = double_sha256(env, &combined);
        index >>= 1;
    }

    current == *root
}
