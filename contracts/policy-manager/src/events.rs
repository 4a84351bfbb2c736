//! Event records emitted by the policy manager.

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyCreatedEvent {
    pub policy_id: String,
    pub delay_threshold: u32,
    pub payout_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyPurchasedEvent {
    pub purchase_id: String,
    pub holder: Address,
    pub coverage_amount: i128,
    pub premium_paid: i128,
}

pub fn emit_policy_created(env: &Env, policy_id: &String, delay_threshold: u32, payout_amount: i128) {
    let event = PolicyCreatedEvent {
        policy_id: policy_id.clone(),
        delay_threshold,
        payout_amount,
    };
    env.events()
        .publish((symbol_short!("policy"), symbol_short!("created")), event);
}

pub fn emit_policy_purchased(
    env: &Env,
    purchase_id: &String,
    holder: &Address,
    coverage_amount: i128,
    premium_paid: i128,
) {
    let event = PolicyPurchasedEvent {
        purchase_id: purchase_id.clone(),
        holder: holder.clone(),
        coverage_amount,
        premium_paid,
    };
    env.events()
        .publish((symbol_short!("policy"), symbol_short!("purchase")), event);
}

pub fn emit_coverage_claimed(env: &Env, purchase_id: &String) {
    env.events().publish(
        (symbol_short!("coverage"), symbol_short!("claimed")),
        purchase_id.clone(),
    );
}

pub fn emit_coverage_expired(env: &Env, purchase_id: &String) {
    env.events().publish(
        (symbol_short!("coverage"), symbol_short!("expired")),
        purchase_id.clone(),
    );
}
