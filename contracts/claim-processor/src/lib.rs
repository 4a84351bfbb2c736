#![no_std]
//! # Claim Processor Contract
//!
//! Settlement pipeline for coverage claims. A holder submits evidence that a
//! covered Bitcoin transaction was delayed; the processor measures the delay
//! through the Delay Oracle, compares it against the policy threshold, and on
//! approval pays out from the Treasury and retires the coverage in the Policy
//! Manager. All three effects land in one invocation or none do.
//!
//! Two evidence paths:
//! - **Attested**: references an oracle attestation by transaction hash. If
//!   the attestation is already on file the claim settles at submission;
//!   otherwise it waits in `Pending` until `process_claim` finds one.
//! - **SPV**: carries raw transaction bytes, a block header, and a Merkle
//!   proof. Always submitted as `Pending` and settled by `process_claim`.
//!
//! One claim per coverage, ever. A rejected claim does not free the slot;
//! evidence is committed at submission.

use delaycover_common::spv;
use delaycover_common::types::{Attestation, Coverage, MerkleProof, Policy};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, Address, Bytes, BytesN, Env, String,
};

pub mod events;

#[cfg(test)]
mod test;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum ClaimError {
    /// Caller is not the admin, or the claimant does not hold the coverage.
    Unauthorized = 1,
    /// Referenced coverage or claim does not exist.
    NotFound = 3,
    /// Evidence is structurally invalid.
    InvalidProof = 4,
    /// A claim already exists for this coverage.
    DuplicateClaim = 5,
    /// Coverage is not active at submission time.
    CoverageNotActive = 8,
    /// The claim is not in a processable state.
    InvalidStatus = 10,
}

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Admin,
    PolicyManager,
    Oracle,
    Treasury,
    Claim(u64),
    ClaimCount,
    CoverageClaim(String),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

/// Evidence referencing an oracle attestation by transaction hash.
///
/// `delay_blocks` is the claimant's stated delay, kept for the record; the
/// oracle's attestation is authoritative when the claim is evaluated.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct AttestedEvidence {
    pub tx_hash: BytesN<32>,
    pub delay_blocks: u32,
}

/// Self-contained SPV evidence. The inclusion height is `block_height`; the
/// delay is measured against the claimant-stated `broadcast_height`.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct SpvEvidence {
    pub tx_bytes: Bytes,
    pub block_header: Bytes,
    pub block_height: u32,
    pub broadcast_height: u32,
    pub proof: MerkleProof,
}

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub enum ClaimEvidence {
    Attested(AttestedEvidence),
    Spv(SpvEvidence),
}

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct Claim {
    pub id: u64,
    pub coverage_id: String,
    pub claimant: Address,
    pub evidence: ClaimEvidence,
    pub status: ClaimStatus,
    pub payout_amount: i128,
    /// Set once the transaction hash has been confirmed by the oracle.
    pub verified_tx_hash: Option<BytesN<32>>,
    pub submitted_at: u32,
}

// ── Peer contract interfaces ────────────────────────────────────────

#[soroban_sdk::contractclient(name = "PolicyManagerClient")]
pub trait PolicyManagerInterface {
    fn get_policy(env: Env, id: String) -> Option<Policy>;
    fn get_coverage(env: Env, purchase_id: String) -> Option<Coverage>;
    fn is_coverage_active(env: Env, purchase_id: String) -> bool;
    fn mark_coverage_claimed(env: Env, caller: Address, purchase_id: String);
}

#[soroban_sdk::contractclient(name = "DelayOracleClient")]
pub trait DelayOracleInterface {
    fn get_attestation(env: Env, tx_hash: BytesN<32>) -> Option<Attestation>;
    fn verify_btc_transaction(
        env: Env,
        tx_hash: BytesN<32>,
        block_height: u32,
        tx_bytes: Bytes,
        block_header: Bytes,
        proof: MerkleProof,
    ) -> bool;
}

#[soroban_sdk::contractclient(name = "TreasuryClient")]
pub trait TreasuryInterface {
    fn payout_claim(
        env: Env,
        caller: Address,
        claim_id: u64,
        beneficiary: Address,
        amount: i128,
    ) -> i128;
}

#[contract]
pub struct ClaimProcessorContract;

#[contractimpl]
impl ClaimProcessorContract {
    pub fn initialize(
        env: Env,
        admin: Address,
        policy_manager: Address,
        oracle: Address,
        treasury: Address,
    ) {
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::PolicyManager, &policy_manager);
        env.storage().instance().set(&DataKey::Oracle, &oracle);
        env.storage().instance().set(&DataKey::Treasury, &treasury);
        env.storage().instance().set(&DataKey::ClaimCount, &0u64);
    }

    // ── Claim submission ────────────────────────────────────────────

    /// File a claim against an active coverage. Only the coverage holder may
    /// claim, and each coverage accepts exactly one claim.
    ///
    /// Attested evidence whose attestation is already on file settles
    /// immediately; everything else is stored `Pending`. Returns the claim id.
    pub fn submit_claim(
        env: Env,
        claimant: Address,
        coverage_id: String,
        evidence: ClaimEvidence,
    ) -> Result<u64, ClaimError> {
        claimant.require_auth();

        let policy_manager = PolicyManagerClient::new(&env, &Self::config(&env, DataKey::PolicyManager));
        let coverage = policy_manager
            .get_coverage(&coverage_id)
            .ok_or(ClaimError::NotFound)?;

        let slot = DataKey::CoverageClaim(coverage_id.clone());
        if env.storage().instance().has(&slot) {
            return Err(ClaimError::DuplicateClaim);
        }
        if !policy_manager.is_coverage_active(&coverage_id) {
            return Err(ClaimError::CoverageNotActive);
        }
        if claimant != coverage.holder {
            return Err(ClaimError::Unauthorized);
        }
        if let ClaimEvidence::Spv(ref spv_evidence) = evidence {
            if spv_evidence.tx_bytes.is_empty()
                || spv_evidence.block_header.len() != spv::HEADER_LEN
            {
                return Err(ClaimError::InvalidProof);
            }
        }

        let policy = policy_manager
            .get_policy(&coverage.policy_id)
            .ok_or(ClaimError::NotFound)?;

        let id: u64 = env
            .storage()
            .instance()
            .get::<_, u64>(&DataKey::ClaimCount)
            .unwrap()
            + 1;
        // payout_amount stays zero until the claim is actually paid.
        let mut claim = Claim {
            id,
            coverage_id: coverage_id.clone(),
            claimant: claimant.clone(),
            evidence,
            status: ClaimStatus::Pending,
            payout_amount: 0,
            verified_tx_hash: None,
            submitted_at: env.ledger().sequence(),
        };

        // Attested evidence with the attestation already on file settles now.
        if let ClaimEvidence::Attested(_) = claim.evidence {
            Self::evaluate(&env, &mut claim, &policy);
        }

        env.storage().instance().set(&DataKey::Claim(id), &claim);
        env.storage().instance().set(&slot, &id);
        env.storage().instance().set(&DataKey::ClaimCount, &id);

        events::emit_claim_submitted(&env, id, &coverage_id, &claimant);
        Ok(id)
    }

    // ── Claim settlement ────────────────────────────────────────────

    /// Evaluate a pending claim. Anyone may call.
    ///
    /// An attested claim whose attestation has not appeared yet stays
    /// `Pending` and may be processed again later. Every other outcome is
    /// terminal: `Rejected`, or `Paid` after the Treasury payout and the
    /// coverage retirement succeed together.
    pub fn process_claim(env: Env, claim_id: u64) -> Result<ClaimStatus, ClaimError> {
        let key = DataKey::Claim(claim_id);
        let mut claim: Claim = env
            .storage()
            .instance()
            .get(&key)
            .ok_or(ClaimError::NotFound)?;
        if claim.status != ClaimStatus::Pending {
            return Err(ClaimError::InvalidStatus);
        }

        let policy_manager = PolicyManagerClient::new(&env, &Self::config(&env, DataKey::PolicyManager));
        let coverage = policy_manager
            .get_coverage(&claim.coverage_id)
            .ok_or(ClaimError::NotFound)?;
        let policy = policy_manager
            .get_policy(&coverage.policy_id)
            .ok_or(ClaimError::NotFound)?;

        Self::evaluate(&env, &mut claim, &policy);
        env.storage().instance().set(&key, &claim);
        Ok(claim.status)
    }

    // ── Read-only queries ───────────────────────────────────────────

    pub fn get_claim(env: Env, claim_id: u64) -> Option<Claim> {
        env.storage().instance().get(&DataKey::Claim(claim_id))
    }

    pub fn get_claim_for_coverage(env: Env, coverage_id: String) -> Option<u64> {
        env.storage()
            .instance()
            .get(&DataKey::CoverageClaim(coverage_id))
    }

    pub fn get_claim_count(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::ClaimCount)
            .unwrap_or(0)
    }

    pub fn get_admin(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("not initialized")
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn config(env: &Env, key: DataKey) -> Address {
        env.storage().instance().get(&key).expect("not initialized")
    }

    /// Measure the delay behind `claim`'s evidence and advance its status.
    ///
    /// Leaves the claim `Pending` when an attested claim's attestation is
    /// missing. Otherwise settles: below-threshold or unverifiable evidence
    /// rejects; at or above threshold pays out and retires the coverage.
    fn evaluate(env: &Env, claim: &mut Claim, policy: &Policy) {
        let oracle = DelayOracleClient::new(env, &Self::config(env, DataKey::Oracle));

        let evidence = claim.evidence.clone();
        let delay_blocks = match &evidence {
            ClaimEvidence::Attested(attested) => {
                match oracle.get_attestation(&attested.tx_hash) {
                    Some(attestation) => {
                        claim.verified_tx_hash = Some(attested.tx_hash.clone());
                        attestation.delay_blocks
                    }
                    None => return,
                }
            }
            ClaimEvidence::Spv(spv_evidence) => {
                if spv_evidence.block_height < spv_evidence.broadcast_height {
                    return Self::reject(env, claim);
                }
                let tx_hash = spv::tx_id(env, &spv_evidence.tx_bytes);
                if !oracle.verify_btc_transaction(
                    &tx_hash,
                    &spv_evidence.block_height,
                    &spv_evidence.tx_bytes,
                    &spv_evidence.block_header,
                    &spv_evidence.proof,
                ) {
                    return Self::reject(env, claim);
                }
                claim.verified_tx_hash = Some(tx_hash);
                spv_evidence.block_height - spv_evidence.broadcast_height
            }
        };

        if delay_blocks < policy.delay_threshold {
            return Self::reject(env, claim);
        }

        claim.status = ClaimStatus::Approved;
        events::emit_claim_approved(env, claim.id, delay_blocks);

        let paid = TreasuryClient::new(env, &Self::config(env, DataKey::Treasury)).payout_claim(
            &env.current_contract_address(),
            &claim.id,
            &claim.claimant,
            &policy.payout_amount,
        );
        PolicyManagerClient::new(env, &Self::config(env, DataKey::PolicyManager))
            .mark_coverage_claimed(&env.current_contract_address(), &claim.coverage_id);

        claim.payout_amount = paid;
        claim.status = ClaimStatus::Paid;
        events::emit_claim_paid(env, claim.id, &claim.claimant, paid);
    }

    fn reject(env: &Env, claim: &mut Claim) {
        claim.status = ClaimStatus::Rejected;
        events::emit_claim_rejected(env, claim.id);
    }
}
