//! Event records emitted by the delay oracle.

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env, String};

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct OracleRegisteredEvent {
    pub oracle: Address,
    pub name: String,
    pub admin: Address,
}

#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct AttestationSubmittedEvent {
    pub tx_hash: BytesN<32>,
    pub oracle: Address,
    pub delay_blocks: u32,
}

pub fn emit_oracle_registered(env: &Env, oracle: &Address, name: &String, admin: &Address) {
    let event = OracleRegisteredEvent {
        oracle: oracle.clone(),
        name: name.clone(),
        admin: admin.clone(),
    };
    env.events()
        .publish((symbol_short!("oracle"), symbol_short!("register")), event);
}

pub fn emit_oracle_status_updated(env: &Env, oracle: &Address, active: bool, admin: &Address) {
    env.events().publish(
        (symbol_short!("oracle"), symbol_short!("status")),
        (oracle.clone(), active, admin.clone()),
    );
}

pub fn emit_attestation_submitted(
    env: &Env,
    tx_hash: &BytesN<32>,
    oracle: &Address,
    delay_blocks: u32,
) {
    let event = AttestationSubmittedEvent {
        tx_hash: tx_hash.clone(),
        oracle: oracle.clone(),
        delay_blocks,
    };
    env.events()
        .publish((symbol_short!("oracle"), symbol_short!("attest")), event);
}

pub fn emit_header_anchored(env: &Env, height: u32, header_hash: &BytesN<32>) {
    env.events().publish(
        (symbol_short!("oracle"), symbol_short!("anchor")),
        (height, header_hash.clone()),
    );
}
