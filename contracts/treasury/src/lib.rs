#![no_std]
//! # Settlement Treasury Contract
//!
//! Holds the pooled settlement funds of the DelayCover protocol and enforces
//! solvency and authorization invariants:
//! - `balance = total_funded - total_paid_out`, both counters monotonic
//! - payouts never exceed the balance; reserve-aware checks withhold a
//!   configurable fraction of the pool
//! - premiums are accepted only from the Policy Manager contract, payouts are
//!   triggered only by the Claim Processor contract
//!
//! Funds are held as a Stellar token balance at this contract's address; the
//! accounting counters in storage mirror every transfer in the same atomic
//! invocation.

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, token, Address, Env, String,
};

pub mod events;


/// Denominator for basis-point arithmetic.
const BPS_DENOMINATOR: i128 = 10_000;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum TreasuryError {
    /// Requested payout exceeds the current balance.
    InsufficientFunds = 1,
    /// Caller is not authorized for this entry point.
    Unauthorized = 6,
    /// Amount is zero, negative, or a ratio is out of range.
    InvalidAmount = 7,
}

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Admin,
    Token,
    PolicyManager,
    ClaimProcessor,
    AuthorizedFunder(Address),
    Balance,
    TotalFunded,
    TotalPaidOut,
    ReserveRatioBps,
}

#[contract]
pub struct TreasuryContract;

#[contractimpl]
impl TreasuryContract {
    /// Initialize the treasury with its admin and settlement token.
    ///
    /// The Policy Manager and Claim Processor identities are configured
    /// separately once those contracts are deployed.
    pub fn initialize(env: Env, admin: Address, token: Address) {
        if env.storage().instance().has(&DataKey::Admin) {
            panic!("already initialized");
        }
        admin.require_auth();

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Token, &token);
        env.storage().instance().set(&DataKey::Balance, &0i128);
        env.storage().instance().set(&DataKey::TotalFunded, &0i128);
        env.storage().instance().set(&DataKey::TotalPaidOut, &0i128);
        env.storage()
            .instance()
            .set(&DataKey::ReserveRatioBps, &0u32);
    }

    // ── Identity configuration ──────────────────────────────────────

    /// Set the Policy Manager contract, the only caller allowed to route
    /// premiums into the pool. Admin only.
    pub fn set_policy_manager(
        env: Env,
        caller: Address,
        policy_manager: Address,
    ) -> Result<(), TreasuryError> {
        Self::require_admin(&env, &caller)?;
        env.storage()
            .instance()
            .set(&DataKey::PolicyManager, &policy_manager);
        Ok(())
    }

    /// Set the Claim Processor contract, the only caller allowed to trigger
    /// payouts. Admin only.
    pub fn set_claim_processor(
        env: Env,
        caller: Address,
        claim_processor: Address,
    ) -> Result<(), TreasuryError> {
        Self::require_admin(&env, &caller)?;
        env.storage()
            .instance()
            .set(&DataKey::ClaimProcessor, &claim_processor);
        Ok(())
    }

    /// Allow an address to fund the pool alongside the admin. Admin only.
    pub fn add_authorized_funder(
        env: Env,
        caller: Address,
        funder: Address,
    ) -> Result<(), TreasuryError> {
        Self::require_admin(&env, &caller)?;
        env.storage()
            .instance()
            .set(&DataKey::AuthorizedFunder(funder), &());
        Ok(())
    }

    /// Remove an address from the authorized-funder set. Admin only.
    pub fn remove_authorized_funder(
        env: Env,
        caller: Address,
        funder: Address,
    ) -> Result<(), TreasuryError> {
        Self::require_admin(&env, &caller)?;
        env.storage()
            .instance()
            .remove(&DataKey::AuthorizedFunder(funder));
        Ok(())
    }

    /// Set the reserve ratio withheld from payout eligibility, in basis
    /// points (0-10000). Admin only.
    pub fn set_reserve_ratio(
        env: Env,
        caller: Address,
        reserve_ratio_bps: u32,
    ) -> Result<(), TreasuryError> {
        Self::require_admin(&env, &caller)?;
        if reserve_ratio_bps > BPS_DENOMINATOR as u32 {
            return Err(TreasuryError::InvalidAmount);
        }
        env.storage()
            .instance()
            .set(&DataKey::ReserveRatioBps, &reserve_ratio_bps);
        events::emit_reserve_ratio_set(&env, &caller, reserve_ratio_bps);
        Ok(())
    }

    // ── Mutating entry points ───────────────────────────────────────

    /// Deposit settlement funds into the pool.
    ///
    /// Callable by the admin or an authorized funder. Pulls `amount` of the
    /// settlement token from the funder and grows `balance` and
    /// `total_funded` together.
    pub fn fund_treasury(env: Env, funder: Address, amount: i128) -> Result<(), TreasuryError> {
        funder.require_auth();
        if !Self::is_funder(&env, &funder) {
            return Err(TreasuryError::Unauthorized);
        }
        if amount <= 0 {
            return Err(TreasuryError::InvalidAmount);
        }

        let balance = Self::credit(&env, amount);

        let token: Address = env.storage().instance().get(&DataKey::Token).unwrap();
        token::Client::new(&env, &token).transfer(
            &funder,
            &env.current_contract_address(),
            &amount,
        );

        events::emit_treasury_funded(&env, &funder, amount, balance);
        Ok(())
    }

    /// Accept a premium payment for a coverage purchase.
    ///
    /// `caller` must be the configured Policy Manager contract; the premium
    /// is pulled from `payer` and folded into the pool. Called as a nested
    /// invocation inside `purchase_policy`, so a failure here unwinds the
    /// whole purchase.
    pub fn receive_premium(
        env: Env,
        caller: Address,
        coverage_id: String,
        amount: i128,
        payer: Address,
    ) -> Result<(), TreasuryError> {
        Self::require_identity(&env, DataKey::PolicyManager, &caller)?;
        if amount <= 0 {
            return Err(TreasuryError::InvalidAmount);
        }

        let balance = Self::credit(&env, amount);

        let token: Address = env.storage().instance().get(&DataKey::Token).unwrap();
        token::Client::new(&env, &token).transfer(
            &payer,
            &env.current_contract_address(),
            &amount,
        );

        events::emit_premium_received(&env, &coverage_id, &payer, amount, balance);
        Ok(())
    }

    /// Release a claim payout to a beneficiary.
    ///
    /// `caller` must be the configured Claim Processor contract. The payout
    /// is bounded by the raw balance; reserve-aware screening is the caller's
    /// read-only concern. Returns the amount paid.
    pub fn payout_claim(
        env: Env,
        caller: Address,
        claim_id: u64,
        beneficiary: Address,
        amount: i128,
    ) -> Result<i128, TreasuryError> {
        Self::require_identity(&env, DataKey::ClaimProcessor, &caller)?;
        if amount <= 0 {
            return Err(TreasuryError::InvalidAmount);
        }

        let balance: i128 = env.storage().instance().get(&DataKey::Balance).unwrap();
        if amount > balance {
            return Err(TreasuryError::InsufficientFunds);
        }

        let paid_out: i128 = env.storage().instance().get(&DataKey::TotalPaidOut).unwrap();
        let new_balance = balance - amount;
        env.storage().instance().set(&DataKey::Balance, &new_balance);
        env.storage()
            .instance()
            .set(&DataKey::TotalPaidOut, &(paid_out + amount));

        let token: Address = env.storage().instance().get(&DataKey::Token).unwrap();
        token::Client::new(&env, &token).transfer(
            &env.current_contract_address(),
            &beneficiary,
            &amount,
        );

        events::emit_payout_made(&env, claim_id, &beneficiary, amount, new_balance);
        Ok(amount)
    }

    // ── Read-only queries ───────────────────────────────────────────

    /// True when `amount` does not exceed the raw balance.
    pub fn check_payout_sufficiency(env: Env, amount: i128) -> bool {
        let balance: i128 = env
            .storage()
            .instance()
            .get(&DataKey::Balance)
            .unwrap_or(0);
        amount <= balance
    }

    /// True when `amount` does not exceed the reserve-adjusted balance.
    pub fn check_payout_with_reserve(env: Env, amount: i128) -> bool {
        amount <= Self::get_available_for_payout(env)
    }

    /// `floor(balance * (10000 - reserve_ratio_bps) / 10000)`.
    pub fn get_available_for_payout(env: Env) -> i128 {
        let balance: i128 = env
            .storage()
            .instance()
            .get(&DataKey::Balance)
            .unwrap_or(0);
        let ratio: u32 = env
            .storage()
            .instance()
            .get(&DataKey::ReserveRatioBps)
            .unwrap_or(0);
        balance * (BPS_DENOMINATOR - ratio as i128) / BPS_DENOMINATOR
    }

    pub fn get_balance(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::Balance)
            .unwrap_or(0)
    }

    pub fn get_total_funded(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::TotalFunded)
            .unwrap_or(0)
    }

    pub fn get_total_paid_out(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::TotalPaidOut)
            .unwrap_or(0)
    }

    pub fn get_reserve_ratio(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::ReserveRatioBps)
            .unwrap_or(0)
    }

    pub fn get_admin(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("not initialized")
    }

    pub fn is_authorized_funder(env: Env, funder: Address) -> bool {
        Self::is_funder(&env, &funder)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn require_admin(env: &Env, caller: &Address) -> Result<(), TreasuryError> {
        caller.require_auth();
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("not initialized");
        if *caller != admin {
            return Err(TreasuryError::Unauthorized);
        }
        Ok(())
    }

    /// Authorization guard for entry points reserved to one configured
    /// contract identity.
    fn require_identity(env: &Env, key: DataKey, caller: &Address) -> Result<(), TreasuryError> {
        caller.require_auth();
        let expected: Option<Address> = env.storage().instance().get(&key);
        match expected {
            Some(addr) if addr == *caller => Ok(()),
            _ => Err(TreasuryError::Unauthorized),
        }
    }

    fn is_funder(env: &Env, funder: &Address) -> bool {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("not initialized");
        *funder == admin
            || env
                .storage()
                .instance()
                .has(&DataKey::AuthorizedFunder(funder.clone()))
    }

    /// Grow `balance` and `total_funded` together; returns the new balance.
    fn credit(env: &Env, amount: i128) -> i128 {
        let balance: i128 = env.storage().instance().get(&DataKey::Balance).unwrap();
        let funded: i128 = env.storage().instance().get(&DataKey::TotalFunded).unwrap();
        let new_balance = balance + amount;
        env.storage().instance().set(&DataKey::Balance, &new_balance);
        env.storage()
            .instance()
            .set(&DataKey::TotalFunded, &(funded + amount));
        new_balance
    }
}
