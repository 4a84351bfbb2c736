#![no_std]
//! # Policy Manager Contract
//!
//! Catalog of policy templates and purchased coverage instances. Policies are
//! created once by the admin and never mutated; coverage records are
//! append-only, advancing through `Active -> Claimed` (via the Claim
//! Processor) or `Active -> Expired` (lazily, by height).
//!
//! Premiums are routed to the Treasury inside the purchase invocation, so a
//! purchase that fails to reach the Treasury leaves no coverage behind.

use delaycover_common::types::{Coverage, CoverageStatus, Policy};
use soroban_sdk::{contract, contracterror, contractimpl, contracttype, Address, Env, String};

pub mod events;


/// Denominator for basis-point arithmetic.
const BPS_DENOMINATOR: i128 = 10_000;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum PolicyError {
    /// Caller is not authorized for this entry point.
    Unauthorized = 1,
    /// A policy already exists under this identifier.
    DuplicatePolicy = 2,
    /// Referenced policy or coverage does not exist.
    PolicyNotFound = 3,
    /// Amount, rate, or computed premium is out of range.
    InvalidAmount = 7,
    /// Coverage is not in the Active state.
    CoverageNotActive = 8,
    /// The purchase identifier has already been used.
    PurchaseExists = 9,
}

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Admin,
    Treasury,
    ClaimProcessor,
    Policy(String),
    Coverage(String),
    PolicyCount,
}

/// Treasury premium-receipt interface, invoked as a nested call during
/// purchase. A treasury error unwinds the whole purchase.
#[soroban_sdk::contractclient(name = "TreasuryClient")]
pub trait TreasuryInterface {
    fn receive_premium(env: Env, caller: Address, coverage_id: String, amount: i128, payer: Address);
}

#[contract]
pub struct PolicyManagerContract;

#[contractimpl]
impl PolicyManagerContract {
    pub fn initialize(env: Env, admin: Address, treasury: Address) {
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Treasury, &treasury);
        env.storage().instance().set(&DataKey::PolicyCount, &0u32);
    }

    /// Set the Claim Processor contract, the only caller allowed to mark
    /// coverage as claimed. Admin only.
    pub fn set_claim_processor(
        env: Env,
        caller: Address,
        claim_processor: Address,
    ) -> Result<(), PolicyError> {
        Self::require_admin(&env, &caller)?;
        env.storage()
            .instance()
            .set(&DataKey::ClaimProcessor, &claim_processor);
        Ok(())
    }

    // ── Policy catalog ──────────────────────────────────────────────

    /// Create an immutable policy template. Admin only.
    #[allow(clippy::too_many_arguments)]
    pub fn create_policy(
        env: Env,
        caller: Address,
        id: String,
        name: String,
        description: String,
        delay_threshold: u32,
        premium_rate_bps: u32,
        protocol_fee_bps: u32,
        payout_amount: i128,
    ) -> Result<(), PolicyError> {
        Self::require_admin(&env, &caller)?;

        let key = DataKey::Policy(id.clone());
        if env.storage().instance().has(&key) {
            return Err(PolicyError::DuplicatePolicy);
        }
        if payout_amount <= 0
            || premium_rate_bps > BPS_DENOMINATOR as u32
            || protocol_fee_bps > BPS_DENOMINATOR as u32
        {
            return Err(PolicyError::InvalidAmount);
        }

        let policy = Policy {
            id: id.clone(),
            name,
            description,
            delay_threshold,
            premium_rate_bps,
            protocol_fee_bps,
            payout_amount,
        };
        env.storage().instance().set(&key, &policy);

        let count: u32 = env.storage().instance().get(&DataKey::PolicyCount).unwrap();
        env.storage()
            .instance()
            .set(&DataKey::PolicyCount, &(count + 1));

        events::emit_policy_created(&env, &id, delay_threshold, payout_amount);
        Ok(())
    }

    // ── Coverage purchase ───────────────────────────────────────────

    /// Purchase coverage under a policy for `duration` blocks.
    ///
    /// The premium is `coverage_amount * premium_rate_bps / 10000` and is
    /// forwarded to the Treasury before the coverage record is written; both
    /// commit or neither does. Returns the purchase identifier.
    pub fn purchase_policy(
        env: Env,
        holder: Address,
        policy_id: String,
        coverage_amount: i128,
        duration: u32,
        purchase_id: String,
    ) -> Result<String, PolicyError> {
        holder.require_auth();

        let policy: Policy = env
            .storage()
            .instance()
            .get(&DataKey::Policy(policy_id.clone()))
            .ok_or(PolicyError::PolicyNotFound)?;

        if coverage_amount <= 0 {
            return Err(PolicyError::InvalidAmount);
        }
        let premium = coverage_amount * policy.premium_rate_bps as i128 / BPS_DENOMINATOR;
        if premium <= 0 {
            return Err(PolicyError::InvalidAmount);
        }

        let coverage_key = DataKey::Coverage(purchase_id.clone());
        if env.storage().instance().has(&coverage_key) {
            return Err(PolicyError::PurchaseExists);
        }

        let treasury: Address = env.storage().instance().get(&DataKey::Treasury).unwrap();
        TreasuryClient::new(&env, &treasury).receive_premium(
            &env.current_contract_address(),
            &purchase_id,
            &premium,
            &holder,
        );

        let start_height = env.ledger().sequence();
        let coverage = Coverage {
            purchase_id: purchase_id.clone(),
            policy_id,
            holder: holder.clone(),
            coverage_amount,
            premium_paid: premium,
            start_height,
            end_height: start_height + duration,
            status: CoverageStatus::Active,
        };
        env.storage().instance().set(&coverage_key, &coverage);

        events::emit_policy_purchased(&env, &purchase_id, &holder, coverage_amount, premium);
        Ok(purchase_id)
    }

    // ── Coverage lifecycle ──────────────────────────────────────────

    /// Mark a coverage instance as claimed. Only the configured Claim
    /// Processor may call; the coverage must currently be Active.
    pub fn mark_coverage_claimed(
        env: Env,
        caller: Address,
        purchase_id: String,
    ) -> Result<(), PolicyError> {
        caller.require_auth();
        let claim_processor: Option<Address> =
            env.storage().instance().get(&DataKey::ClaimProcessor);
        match claim_processor {
            Some(addr) if addr == caller => {}
            _ => return Err(PolicyError::Unauthorized),
        }

        let key = DataKey::Coverage(purchase_id.clone());
        let mut coverage: Coverage = env
            .storage()
            .instance()
            .get(&key)
            .ok_or(PolicyError::PolicyNotFound)?;
        if coverage.status != CoverageStatus::Active {
            return Err(PolicyError::CoverageNotActive);
        }

        coverage.status = CoverageStatus::Claimed;
        env.storage().instance().set(&key, &coverage);

        events::emit_coverage_claimed(&env, &purchase_id);
        Ok(())
    }

    /// Lazily expire a coverage whose height window has passed. Anyone may
    /// call; the record stays in place with status Expired.
    pub fn expire_coverage(env: Env, purchase_id: String) -> Result<(), PolicyError> {
        let key = DataKey::Coverage(purchase_id.clone());
        let mut coverage: Coverage = env
            .storage()
            .instance()
            .get(&key)
            .ok_or(PolicyError::PolicyNotFound)?;
        if coverage.status != CoverageStatus::Active
            || env.ledger().sequence() <= coverage.end_height
        {
            return Err(PolicyError::CoverageNotActive);
        }

        coverage.status = CoverageStatus::Expired;
        env.storage().instance().set(&key, &coverage);

        events::emit_coverage_expired(&env, &purchase_id);
        Ok(())
    }

    // ── Read-only queries ───────────────────────────────────────────

    pub fn get_policy(env: Env, id: String) -> Option<Policy> {
        env.storage().instance().get(&DataKey::Policy(id))
    }

    pub fn get_coverage(env: Env, purchase_id: String) -> Option<Coverage> {
        env.storage().instance().get(&DataKey::Coverage(purchase_id))
    }

    /// Active means the stored status is Active and the current height has
    /// not passed `end_height`, whether or not expiry has been materialized.
    pub fn is_coverage_active(env: Env, purchase_id: String) -> bool {
        match Self::get_coverage(env.clone(), purchase_id) {
            Some(coverage) => {
                coverage.status == CoverageStatus::Active
                    && env.ledger().sequence() <= coverage.end_height
            }
            None => false,
        }
    }

    pub fn get_policy_count(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::PolicyCount)
            .unwrap_or(0)
    }

    pub fn get_admin(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("not initialized")
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn require_admin(env: &Env, caller: &Address) -> Result<(), PolicyError> {
        caller.require_auth();
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("not initialized");
        if *caller != admin {
            return Err(PolicyError::Unauthorized);
        }
        Ok(())
    }
}
