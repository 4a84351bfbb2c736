//! Event records emitted by the claim processor.

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct ClaimSubmittedEvent {
    pub claim_id: u64,
    pub coverage_id: String,
    pub claimant: Address,
}

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct ClaimPaidEvent {
    pub claim_id: u64,
    pub beneficiary: Address,
    pub amount: i128,
}

pub fn emit_claim_submitted(env: &Env, claim_id: u64, coverage_id: &String, claimant: &Address) {
    let event = ClaimSubmittedEvent {
        claim_id,
        coverage_id: coverage_id.clone(),
        claimant: claimant.clone(),
    };
    env.events()
        .publish((symbol_short!("claim"), symbol_short!("submit")), event);
}

pub fn emit_claim_approved(env: &Env, claim_id: u64, delay_blocks: u32) {
    env.events().publish(
        (symbol_short!("claim"), symbol_short!("approve")),
        (claim_id, delay_blocks),
    );
}

pub fn emit_claim_rejected(env: &Env, claim_id: u64) {
    env.events()
        .publish((symbol_short!("claim"), symbol_short!("reject")), claim_id);
}

pub fn emit_claim_paid(env: &Env, claim_id: u64, beneficiary: &Address, amount: i128) {
    let event = ClaimPaidEvent {
        claim_id,
        beneficiary: beneficiary.clone(),
        amount,
    };
    env.events()
        .publish((symbol_short!("claim"), symbol_short!("paid")), event);
}
