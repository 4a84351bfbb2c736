#![no_std]
//! # Delay Oracle / Verifier Contract
//!
//! Answers one question for the Claim Processor: how many blocks late was a
//! Bitcoin transaction? Two paths provide the answer:
//!
//! - **Attested**: a registered, active oracle submits a signed record of the
//!   transaction's broadcast and inclusion heights. Registration by the admin
//!   is the trust anchor; the signature is stored for off-chain audit and is
//!   not re-verified on-chain.
//! - **Trustless**: raw transaction bytes, an 80-byte block header, and a
//!   Merkle inclusion proof are checked against an admin-anchored header
//!   hash. Verification persists nothing.

use delaycover_common::spv;
use delaycover_common::types::{Attestation, MerkleProof, OracleInfo};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, Address, Bytes, BytesN, Env, String,
};

pub mod events;


#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum OracleError {
    /// Caller is not the admin, or the oracle is deactivated.
    Unauthorized = 1,
    /// An oracle is already registered under this identity.
    OracleExists = 2,
    /// No oracle is registered under this identity.
    OracleNotFound = 3,
    /// An attestation already exists for this transaction hash.
    AttestationExists = 4,
    /// Inclusion height precedes broadcast height.
    InvalidBlocks = 7,
}

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Admin,
    Oracle(Address),
    OracleCount,
    Attestation(BytesN<32>),
    AttestationCount,
    HeaderAnchor(u32),
}

#[contract]
pub struct DelayOracleContract;

#[contractimpl]
impl DelayOracleContract {
    pub fn initialize(env: Env, admin: Address) {
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::OracleCount, &0u32);
        env.storage()
            .instance()
            .set(&DataKey::AttestationCount, &0u64);
    }

    // ── Oracle registry ─────────────────────────────────────────────

    /// Register a trusted attestor. Admin only.
    ///
    /// The identity must be new; re-registering an address is rejected so a
    /// deactivated oracle cannot be silently replaced.
    pub fn register_oracle(
        env: Env,
        caller: Address,
        oracle: Address,
        name: String,
        public_key: BytesN<33>,
    ) -> Result<(), OracleError> {
        Self::require_admin(&env, &caller)?;

        let key = DataKey::Oracle(oracle.clone());
        if env.storage().instance().has(&key) {
            return Err(OracleError::OracleExists);
        }

        let info = OracleInfo {
            name,
            public_key,
            active: true,
        };
        env.storage().instance().set(&key, &info);

        let count: u32 = env.storage().instance().get(&DataKey::OracleCount).unwrap();
        env.storage()
            .instance()
            .set(&DataKey::OracleCount, &(count + 1));

        events::emit_oracle_registered(&env, &oracle, &info.name, &caller);
        Ok(())
    }

    /// Flip the active flag of a registered oracle. Admin only.
    pub fn update_oracle_status(
        env: Env,
        caller: Address,
        oracle: Address,
        active: bool,
    ) -> Result<(), OracleError> {
        Self::require_admin(&env, &caller)?;

        let key = DataKey::Oracle(oracle.clone());
        let mut info: OracleInfo = env
            .storage()
            .instance()
            .get(&key)
            .ok_or(OracleError::OracleNotFound)?;
        info.active = active;
        env.storage().instance().set(&key, &info);

        events::emit_oracle_status_updated(&env, &oracle, active, &caller);
        Ok(())
    }

    // ── Attestations ────────────────────────────────────────────────

    /// Record a delay attestation for a transaction hash.
    ///
    /// The submitter must be a registered, currently active oracle. Returns
    /// the computed delay in blocks.
    pub fn submit_attestation(
        env: Env,
        oracle: Address,
        tx_hash: BytesN<32>,
        broadcast_height: u32,
        inclusion_height: u32,
        signature: Bytes,
    ) -> Result<u32, OracleError> {
        oracle.require_auth();

        let info: OracleInfo = env
            .storage()
            .instance()
            .get(&DataKey::Oracle(oracle.clone()))
            .ok_or(OracleError::OracleNotFound)?;
        if !info.active {
            return Err(OracleError::Unauthorized);
        }
        if inclusion_height < broadcast_height {
            return Err(OracleError::InvalidBlocks);
        }

        let key = DataKey::Attestation(tx_hash.clone());
        if env.storage().instance().has(&key) {
            return Err(OracleError::AttestationExists);
        }

        let delay_blocks = inclusion_height - broadcast_height;
        let attestation = Attestation {
            oracle: oracle.clone(),
            broadcast_height,
            inclusion_height,
            delay_blocks,
            signature,
        };
        env.storage().instance().set(&key, &attestation);

        let count: u64 = env
            .storage()
            .instance()
            .get(&DataKey::AttestationCount)
            .unwrap();
        env.storage()
            .instance()
            .set(&DataKey::AttestationCount, &(count + 1));

        events::emit_attestation_submitted(&env, &tx_hash, &oracle, delay_blocks);
        Ok(delay_blocks)
    }

    /// Pure delay computation, same formula as `submit_attestation`.
    pub fn calculate_delay(
        _env: Env,
        broadcast_height: u32,
        inclusion_height: u32,
    ) -> Result<u32, OracleError> {
        if inclusion_height < broadcast_height {
            return Err(OracleError::InvalidBlocks);
        }
        Ok(inclusion_height - broadcast_height)
    }

    // ── Trustless verification ──────────────────────────────────────

    /// Anchor the authentic header hash for a Bitcoin block height.
    /// Admin only.
    ///
    /// This is the boundary with external header-chain tracking: headers
    /// supplied as claim evidence verify only against an anchored hash.
    pub fn anchor_block_header(
        env: Env,
        caller: Address,
        height: u32,
        header_hash: BytesN<32>,
    ) -> Result<(), OracleError> {
        Self::require_admin(&env, &caller)?;
        env.storage()
            .instance()
            .set(&DataKey::HeaderAnchor(height), &header_hash);
        events::emit_header_anchored(&env, height, &header_hash);
        Ok(())
    }

    /// Verify that `tx_bytes` is the transaction behind `tx_hash` and that it
    /// is included in the anchored block at `block_height`. Persists nothing.
    pub fn verify_btc_transaction(
        env: Env,
        tx_hash: BytesN<32>,
        block_height: u32,
        tx_bytes: Bytes,
        block_header: Bytes,
        proof: MerkleProof,
    ) -> bool {
        if tx_bytes.is_empty() {
            return false;
        }
        let root = match spv::header_merkle_root(&env, &block_header) {
            Some(root) => root,
            None => return false,
        };
        if spv::tx_id(&env, &tx_bytes) != tx_hash {
            return false;
        }

        let anchored: Option<BytesN<32>> = env
            .storage()
            .instance()
            .get(&DataKey::HeaderAnchor(block_height));
        match anchored {
            Some(hash) if hash == spv::header_hash(&env, &block_header) => {}
            _ => return false,
        }

        spv::verify_inclusion(&env, &tx_hash, &root, &proof)
    }

    // ── Read-only queries ───────────────────────────────────────────

    pub fn is_oracle(env: Env, oracle: Address) -> bool {
        env.storage().instance().has(&DataKey::Oracle(oracle))
    }

    pub fn get_oracle(env: Env, oracle: Address) -> Option<OracleInfo> {
        env.storage().instance().get(&DataKey::Oracle(oracle))
    }

    pub fn get_attestation(env: Env, tx_hash: BytesN<32>) -> Option<Attestation> {
        env.storage().instance().get(&DataKey::Attestation(tx_hash))
    }

    pub fn get_oracle_count(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::OracleCount)
            .unwrap_or(0)
    }

    pub fn get_attestation_count(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::AttestationCount)
            .unwrap_or(0)
    }

    pub fn get_header_anchor(env: Env, height: u32) -> Option<BytesN<32>> {
        env.storage().instance().get(&DataKey::HeaderAnchor(height))
    }

    pub fn get_admin(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("not initialized")
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn require_admin(env: &Env, caller: &Address) -> Result<(), OracleError> {
        caller.require_auth();
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("not initialized");
        if *caller != admin {
            return Err(OracleError::Unauthorized);
        }
        Ok(())
    }
}
