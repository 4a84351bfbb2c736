#![cfg(test)]

use super::*;
use delaycover_common::spv;
use delaycover_common::types::CoverageStatus;
use delaycover_delay_oracle::{DelayOracleContract, DelayOracleContractClient};
use delaycover_policy_manager::{PolicyManagerContract, PolicyManagerContractClient};
use delaycover_treasury::{TreasuryContract, TreasuryContractClient};
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{token, Address, Bytes, BytesN, Env, String, Vec};

const PAYOUT: i128 = 1_000_000;

struct TestEnv {
    env: Env,
    client: ClaimProcessorContractClient<'static>,
    policy_manager: PolicyManagerContractClient<'static>,
    oracle: DelayOracleContractClient<'static>,
    treasury: TreasuryContractClient<'static>,
    token: token::Client<'static>,
    admin: Address,
    holder: Address,
    attestor: Address,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_pool(10_000_000)
    }

    /// Full protocol deployment: token, treasury seeded with `pool`, oracle
    /// with one registered attestor, a 6-block policy, and one active
    /// coverage ("coverage-1") held by `holder`.
    fn with_pool(pool: i128) -> Self {
        let env = Env::default();
        env.mock_all_auths();
        // Keep test-ledger entries alive past the coverage window so
        // advancing the sequence number doesn't archive contract instances.
        env.ledger().with_mut(|li| {
            li.min_temp_entry_ttl = 100_000;
            li.min_persistent_entry_ttl = 100_000;
            li.max_entry_ttl = 6_312_000;
        });

        let admin = Address::generate(&env);
        let token_contract = env.register_stellar_asset_contract_v2(admin.clone());
        let token_admin = token::StellarAssetClient::new(&env, &token_contract.address());
        let token = token::Client::new(&env, &token_contract.address());

        let treasury_id = env.register(TreasuryContract, ());
        let treasury = TreasuryContractClient::new(&env, &treasury_id);
        treasury.initialize(&admin, &token_contract.address());

        let oracle_id = env.register(DelayOracleContract, ());
        let oracle = DelayOracleContractClient::new(&env, &oracle_id);
        oracle.initialize(&admin);

        let policy_manager_id = env.register(PolicyManagerContract, ());
        let policy_manager = PolicyManagerContractClient::new(&env, &policy_manager_id);
        policy_manager.initialize(&admin, &treasury_id);

        let contract_id = env.register(ClaimProcessorContract, ());
        let client = ClaimProcessorContractClient::new(&env, &contract_id);
        client.initialize(&admin, &policy_manager_id, &oracle_id, &treasury_id);

        treasury.set_policy_manager(&admin, &policy_manager_id);
        treasury.set_claim_processor(&admin, &contract_id);
        policy_manager.set_claim_processor(&admin, &contract_id);

        let attestor = Address::generate(&env);
        oracle.register_oracle(
            &admin,
            &attestor,
            &String::from_str(&env, "block-watcher"),
            &BytesN::from_array(&env, &[2u8; 33]),
        );

        policy_manager.create_policy(
            &admin,
            &String::from_str(&env, "delay-6"),
            &String::from_str(&env, "Six Block Delay Cover"),
            &String::from_str(&env, "Pays out when confirmation lags 6+ blocks"),
            &6,
            &200,
            &50,
            &PAYOUT,
        );

        token_admin.mint(&admin, &pool);
        treasury.fund_treasury(&admin, &pool);

        let holder = Address::generate(&env);
        token_admin.mint(&holder, &1_000_000);
        policy_manager.purchase_policy(
            &holder,
            &String::from_str(&env, "delay-6"),
            &5_000_000,
            &10_000,
            &String::from_str(&env, "coverage-1"),
        );

        Self {
            env,
            client,
            policy_manager,
            oracle,
            treasury,
            token,
            admin,
            holder,
            attestor,
        }
    }

    fn coverage_id(&self) -> String {
        String::from_str(&self.env, "coverage-1")
    }

    fn attest(&self, tx_hash: &BytesN<32>, broadcast_height: u32, inclusion_height: u32) {
        self.oracle.submit_attestation(
            &self.attestor,
            tx_hash,
            &broadcast_height,
            &inclusion_height,
            &Bytes::from_slice(&self.env, &[9u8; 64]),
        );
    }

    fn attested(&self, tx_hash: &BytesN<32>, delay_blocks: u32) -> ClaimEvidence {
        ClaimEvidence::Attested(AttestedEvidence {
            tx_hash: tx_hash.clone(),
            delay_blocks,
        })
    }

    /// Anchor a two-transaction block at `height` containing `tx_bytes` at
    /// index 0, and return the matching SPV evidence.
    fn anchored_spv(
        &self,
        tx_bytes: &Bytes,
        height: u32,
        broadcast_height: u32,
    ) -> SpvEvidence {
        let txid = spv::tx_id(&self.env, tx_bytes);
        let sibling = BytesN::from_array(&self.env, &[7u8; 32]);

        let mut concat = Bytes::new(&self.env);
        concat.append(&txid.into());
        concat.append(&sibling.clone().into());
        let root = spv::double_sha256(&self.env, &concat);

        let mut raw = [0u8; 80];
        raw[36..68].copy_from_slice(&root.to_array());
        let header = Bytes::from_slice(&self.env, &raw);

        self.oracle
            .anchor_block_header(&self.admin, &height, &spv::header_hash(&self.env, &header));

        SpvEvidence {
            tx_bytes: tx_bytes.clone(),
            block_header: header,
            block_height: height,
            broadcast_height,
            proof: MerkleProof {
                tx_index: 0,
                hashes: Vec::from_array(&self.env, [sibling]),
                tree_depth: 1,
            },
        }
    }
}

fn tx_hash(env: &Env, val: u8) -> BytesN<32> {
    BytesN::from_array(env, &[val; 32])
}

#[test]
#[should_panic(expected = "already initialized")]
fn initialize_twice_panics() {
    let t = TestEnv::new();
    t.client.initialize(
        &t.admin,
        &Address::generate(&t.env),
        &Address::generate(&t.env),
        &Address::generate(&t.env),
    );
}

#[test]
fn attested_claim_settles_at_submit_when_attestation_exists() {
    let t = TestEnv::new();
    let hash = tx_hash(&t.env, 1);
    t.attest(&hash, 100, 150);

    let id = t
        .client
        .submit_claim(&t.holder, &t.coverage_id(), &t.attested(&hash, 50));

    let claim = t.client.get_claim(&id).unwrap();
    assert_eq!(claim.status, ClaimStatus::Paid);
    assert_eq!(claim.payout_amount, PAYOUT);
    assert_eq!(claim.verified_tx_hash, Some(hash));
    assert_eq!(t.client.get_claim_for_coverage(&t.coverage_id()), Some(id));

    // Pool was 10,000,000 + 100,000 premium, minus one payout.
    assert_eq!(t.treasury.get_balance(), 9_100_000);
    assert_eq!(t.treasury.get_total_paid_out(), PAYOUT);
    // Holder paid 100,000 premium from 1,000,000, then received the payout.
    assert_eq!(t.token.balance(&t.holder), 1_900_000);

    assert_eq!(
        t.policy_manager
            .get_coverage(&t.coverage_id())
            .unwrap()
            .status,
        CoverageStatus::Claimed
    );
    assert!(!t.policy_manager.is_coverage_active(&t.coverage_id()));
}

#[test]
fn attested_claim_waits_until_attestation_appears() {
    let t = TestEnv::new();
    let hash = tx_hash(&t.env, 1);

    let id = t
        .client
        .submit_claim(&t.holder, &t.coverage_id(), &t.attested(&hash, 60));
    let claim = t.client.get_claim(&id).unwrap();
    assert_eq!(claim.status, ClaimStatus::Pending);
    assert_eq!(claim.payout_amount, 0);

    // Still nothing on file; processing is a no-op.
    assert_eq!(t.client.process_claim(&id), ClaimStatus::Pending);
    assert_eq!(t.treasury.get_balance(), 10_100_000);

    t.attest(&hash, 200, 260);
    assert_eq!(t.client.process_claim(&id), ClaimStatus::Paid);
    assert_eq!(t.treasury.get_balance(), 9_100_000);
    assert_eq!(t.token.balance(&t.holder), 1_900_000);
}

#[test]
fn below_threshold_delay_is_rejected() {
    let t = TestEnv::new();
    let hash = tx_hash(&t.env, 1);
    t.attest(&hash, 100, 103);

    let id = t
        .client
        .submit_claim(&t.holder, &t.coverage_id(), &t.attested(&hash, 3));

    assert_eq!(t.client.get_claim(&id).unwrap().status, ClaimStatus::Rejected);
    assert_eq!(t.treasury.get_balance(), 10_100_000);
    assert!(t.policy_manager.is_coverage_active(&t.coverage_id()));

    // Rejection is terminal.
    assert_eq!(
        t.client.try_process_claim(&id),
        Err(Ok(ClaimError::InvalidStatus))
    );
}

#[test]
fn second_claim_for_same_coverage_is_rejected() {
    let t = TestEnv::new();
    let hash = tx_hash(&t.env, 1);
    t.attest(&hash, 100, 150);
    t.client
        .submit_claim(&t.holder, &t.coverage_id(), &t.attested(&hash, 50));

    assert_eq!(
        t.client
            .try_submit_claim(&t.holder, &t.coverage_id(), &t.attested(&tx_hash(&t.env, 2), 50)),
        Err(Ok(ClaimError::DuplicateClaim))
    );
    assert_eq!(t.client.get_claim_count(), 1);
}

#[test]
fn claim_on_unknown_coverage_fails() {
    let t = TestEnv::new();

    assert_eq!(
        t.client.try_submit_claim(
            &t.holder,
            &String::from_str(&t.env, "no-such-coverage"),
            &t.attested(&tx_hash(&t.env, 1), 50),
        ),
        Err(Ok(ClaimError::NotFound))
    );
}

#[test]
fn only_the_coverage_holder_may_claim() {
    let t = TestEnv::new();
    let stranger = Address::generate(&t.env);

    assert_eq!(
        t.client
            .try_submit_claim(&stranger, &t.coverage_id(), &t.attested(&tx_hash(&t.env, 1), 50)),
        Err(Ok(ClaimError::Unauthorized))
    );
}

#[test]
fn claim_on_expired_coverage_fails() {
    let t = TestEnv::new();
    let end = t
        .policy_manager
        .get_coverage(&t.coverage_id())
        .unwrap()
        .end_height;
    t.env.ledger().with_mut(|li| li.sequence_number = end + 1);

    assert_eq!(
        t.client
            .try_submit_claim(&t.holder, &t.coverage_id(), &t.attested(&tx_hash(&t.env, 1), 50)),
        Err(Ok(ClaimError::CoverageNotActive))
    );
}

#[test]
fn spv_claim_settles_through_processing() {
    let t = TestEnv::new();
    let tx_bytes = Bytes::from_slice(&t.env, &[0xAB; 100]);
    let evidence = t.anchored_spv(&tx_bytes, 840_000, 839_990);
    let txid = spv::tx_id(&t.env, &tx_bytes);

    let id = t.client.submit_claim(
        &t.holder,
        &t.coverage_id(),
        &ClaimEvidence::Spv(evidence),
    );
    assert_eq!(id, 1);
    // SPV evidence never settles at submission.
    assert_eq!(t.client.get_claim(&id).unwrap().status, ClaimStatus::Pending);

    assert_eq!(t.client.process_claim(&id), ClaimStatus::Paid);

    let claim = t.client.get_claim(&id).unwrap();
    assert_eq!(claim.verified_tx_hash, Some(txid));
    assert_eq!(claim.payout_amount, PAYOUT);
    assert_eq!(t.treasury.get_balance(), 9_100_000);
    assert_eq!(
        t.policy_manager
            .get_coverage(&t.coverage_id())
            .unwrap()
            .status,
        CoverageStatus::Claimed
    );
}

#[test]
fn spv_claim_with_tampered_proof_is_rejected() {
    let t = TestEnv::new();
    let tx_bytes = Bytes::from_slice(&t.env, &[0xAB; 100]);
    let mut evidence = t.anchored_spv(&tx_bytes, 840_000, 839_990);
    evidence.proof.hashes = Vec::from_array(&t.env, [tx_hash(&t.env, 0xEE)]);

    let id = t.client.submit_claim(
        &t.holder,
        &t.coverage_id(),
        &ClaimEvidence::Spv(evidence),
    );
    assert_eq!(t.client.process_claim(&id), ClaimStatus::Rejected);
    assert_eq!(t.client.get_claim(&id).unwrap().verified_tx_hash, None);
    assert_eq!(t.treasury.get_balance(), 10_100_000);
    assert!(t.policy_manager.is_coverage_active(&t.coverage_id()));
}

#[test]
fn malformed_spv_evidence_fails_at_submit() {
    let t = TestEnv::new();
    let empty_proof = MerkleProof {
        tx_index: 0,
        hashes: Vec::new(&t.env),
        tree_depth: 0,
    };

    // Empty transaction bytes.
    let evidence = SpvEvidence {
        tx_bytes: Bytes::new(&t.env),
        block_header: Bytes::from_slice(&t.env, &[0u8; 80]),
        block_height: 840_000,
        broadcast_height: 839_990,
        proof: empty_proof.clone(),
    };
    assert_eq!(
        t.client
            .try_submit_claim(&t.holder, &t.coverage_id(), &ClaimEvidence::Spv(evidence)),
        Err(Ok(ClaimError::InvalidProof))
    );

    // Truncated header.
    let evidence = SpvEvidence {
        tx_bytes: Bytes::from_slice(&t.env, &[0xAB; 100]),
        block_header: Bytes::from_slice(&t.env, &[0u8; 79]),
        block_height: 840_000,
        broadcast_height: 839_990,
        proof: empty_proof,
    };
    assert_eq!(
        t.client
            .try_submit_claim(&t.holder, &t.coverage_id(), &ClaimEvidence::Spv(evidence)),
        Err(Ok(ClaimError::InvalidProof))
    );

    // Nothing was recorded.
    assert_eq!(t.client.get_claim_count(), 0);
    assert_eq!(t.client.get_claim_for_coverage(&t.coverage_id()), None);
}

#[test]
fn spv_claim_with_inverted_heights_is_rejected() {
    let t = TestEnv::new();
    let tx_bytes = Bytes::from_slice(&t.env, &[0xAB; 100]);
    // Broadcast claimed after inclusion.
    let evidence = t.anchored_spv(&tx_bytes, 840_000, 840_010);

    let id = t.client.submit_claim(
        &t.holder,
        &t.coverage_id(),
        &ClaimEvidence::Spv(evidence),
    );
    assert_eq!(t.client.process_claim(&id), ClaimStatus::Rejected);
}

#[test]
fn underfunded_payout_unwinds_and_leaves_claim_pending() {
    let t = TestEnv::with_pool(500_000);
    let hash = tx_hash(&t.env, 1);

    let id = t
        .client
        .submit_claim(&t.holder, &t.coverage_id(), &t.attested(&hash, 50));
    t.attest(&hash, 100, 150);

    // Pool holds 600,000 against a 1,000,000 payout: the nested treasury
    // call fails and the whole settlement rolls back.
    assert!(t.client.try_process_claim(&id).is_err());
    assert_eq!(t.client.get_claim(&id).unwrap().status, ClaimStatus::Pending);
    assert_eq!(t.treasury.get_balance(), 600_000);
    assert!(t.policy_manager.is_coverage_active(&t.coverage_id()));

    // Topping up the pool lets the same claim settle.
    let token_admin = token::StellarAssetClient::new(&t.env, &t.token.address);
    token_admin.mint(&t.admin, &1_000_000);
    t.treasury.fund_treasury(&t.admin, &1_000_000);

    assert_eq!(t.client.process_claim(&id), ClaimStatus::Paid);
    assert_eq!(t.treasury.get_balance(), 600_000);
}

#[test]
fn processing_unknown_claim_fails() {
    let t = TestEnv::new();

    assert_eq!(
        t.client.try_process_claim(&99),
        Err(Ok(ClaimError::NotFound))
    );
}
