//! Event records emitted by the treasury, for off-chain indexing.

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct TreasuryFundedEvent {
    pub funder: Address,
    pub amount: i128,
    pub balance: i128,
}

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct PremiumReceivedEvent {
    pub coverage_id: String,
    pub payer: Address,
    pub amount: i128,
    pub balance: i128,
}

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct PayoutMadeEvent {
    pub claim_id: u64,
    pub beneficiary: Address,
    pub amount: i128,
    pub balance: i128,
}

pub fn emit_treasury_funded(env: &Env, funder: &Address, amount: i128, balance: i128) {
    let event = TreasuryFundedEvent {
        funder: funder.clone(),
        amount,
        balance,
    };
    env.events()
        .publish((symbol_short!("treasury"), symbol_short!("funded")), event);
}

pub fn emit_premium_received(
    env: &Env,
    coverage_id: &String,
    payer: &Address,
    amount: i128,
    balance: i128,
) {
    let event = PremiumReceivedEvent {
        coverage_id: coverage_id.clone(),
        payer: payer.clone(),
        amount,
        balance,
    };
    env.events()
        .publish((symbol_short!("treasury"), symbol_short!("premium")), event);
}

pub fn emit_payout_made(
    env: &Env,
    claim_id: u64,
    beneficiary: &Address,
    amount: i128,
    balance: i128,
) {
    let event = PayoutMadeEvent {
        claim_id,
        beneficiary: beneficiary.clone(),
        amount,
        balance,
    };
    env.events()
        .publish((symbol_short!("treasury"), symbol_short!("payout")), event);
}

pub fn emit_reserve_ratio_set(env: &Env, admin: &Address, reserve_ratio_bps: u32) {
    env.events().publish(
        (symbol_short!("treasury"), symbol_short!("reserve")),
        (admin.clone(), reserve_ratio_bps),
    );
}
