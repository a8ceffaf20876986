// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! Chain-work proof round trips against an in-memory chain: completeness, cropping and a set of
//! forgery attempts.

use glimmer_core::{
    blocks::{BlockHeader, ChainWorkProof, ChainWorkSource},
    common::{FixedHash, Height},
    consensus::ConsensusRules,
    merkle::{self, MemMmr, Mmr, ProofBuilder},
    proof_of_work::ProofOfWork,
};
use primitive_types::U256;
use tari_utilities::epoch_time::EpochTime;

/// An in-memory chain: headers plus the history MMR the tip's definition commits to (the MMR
/// holds every header but the tip).
struct MemChain {
    headers: Vec<BlockHeader>,
    history: MemMmr,
    root_live: FixedHash,
}

fn root_live() -> FixedHash {
    FixedHash::from([7u8; 32])
}

fn build_chain(n: u64, rules: &ConsensusRules) -> MemChain {
    assert!(n >= 1);
    let mut headers: Vec<BlockHeader> = Vec::new();
    let mut history = MemMmr::new();
    let mut chain_work = U256::zero();
    let mut prev_hash = FixedHash::zero();

    for i in 0..n {
        let difficulty = rules.start_difficulty;
        difficulty.add_to(&mut chain_work);

        let mut definition = history.root();
        merkle::interpret(&mut definition, &root_live(), true);

        let header = BlockHeader {
            height: rules.height_genesis + i,
            prev_hash,
            chain_work,
            definition,
            timestamp: EpochTime::from(i * rules.desired_rate_s),
            pow: ProofOfWork {
                difficulty,
                nonce: i,
                solution: vec![],
            },
        };
        prev_hash = header.hash();

        if i + 1 < n {
            history.append_leaf(&prev_hash);
        }
        headers.push(header);
    }

    MemChain {
        headers,
        history,
        root_live: root_live(),
    }
}

impl MemChain {
    fn tip(&self) -> BlockHeader {
        self.headers.last().unwrap().clone()
    }
}

impl ChainWorkSource for MemChain {
    fn state_at(&self, work: &U256) -> Option<BlockHeader> {
        self.headers
            .iter()
            .find(|h| {
                let lo = h.pow.difficulty.subtracted_from(&h.chain_work);
                *work >= lo && *work < h.chain_work
            })
            .cloned()
    }

    fn history_proof(&self, builder: &mut dyn ProofBuilder, height: Height) -> bool {
        self.history.get_proof(builder, height - 1)
    }
}

fn testing_rules() -> ConsensusRules {
    ConsensusRules::testing()
}

fn prove(chain: &MemChain, rules: &ConsensusRules) -> ChainWorkProof {
    ChainWorkProof::create(chain, chain.tip(), U256::zero(), chain.root_live, rules).expect("honest source")
}

#[test]
fn proofs_over_honest_chains_verify() {
    let rules = testing_rules();
    for n in [1u64, 2, 3, 5, 17, 64, 200] {
        let chain = build_chain(n, &rules);
        let proof = prove(&chain, &rules);

        assert!(!proof.states.is_empty());
        assert_eq!(proof.states[0], chain.tip());
        assert!(proof.is_valid(&rules), "chain of {} blocks", n);
    }
}

#[test]
fn short_chains_are_fully_enumerated() {
    let rules = testing_rules();
    // With uniform difficulty and fewer blocks than sample slots, every state is walked.
    let chain = build_chain(5, &rules);
    let proof = prove(&chain, &rules);
    assert_eq!(proof.states.len(), 5);
}

#[test]
fn cropping_to_a_higher_bound_preserves_validity() {
    let rules = testing_rules();
    let chain = build_chain(120, &rules);
    let full = prove(&chain, &rules);
    assert!(full.is_valid(&rules));

    // Raise the bound to the middle of the work axis and crop.
    let mut cropped = full.clone();
    cropped.lower_bound = chain.tip().chain_work / U256::from(2u64);
    assert!(cropped.crop(&rules));
    assert!(cropped.states.len() < full.states.len());
    assert!(cropped.is_valid(&rules));
}

#[test]
fn tampered_states_invalidate_the_proof() {
    let rules = testing_rules();
    // Long enough that the sampler skips states, so the proof carries MMR hashes too.
    let chain = build_chain(300, &rules);
    let proof = prove(&chain, &rules);
    assert!(proof.is_valid(&rules));

    // Rewriting any sampled state's timestamp breaks either the linkage or the MMR proof.
    let mut tampered = proof.clone();
    let idx = tampered.states.len() / 2;
    tampered.states[idx].timestamp = EpochTime::from(999_999);
    assert!(!tampered.is_valid(&rules));

    // Dropping a state desynchronizes the sampler replay.
    let mut tampered = proof.clone();
    tampered.states.remove(idx);
    assert!(!tampered.is_valid(&rules));

    if !proof.proof.hashes.is_empty() {
        // A different live root changes the definition the MMR root must fold to.
        let mut tampered = proof.clone();
        tampered.root_live = FixedHash::from([8u8; 32]);
        assert!(!tampered.is_valid(&rules));

        // Claimed-but-absent trailing work: stripping proof hashes must be caught.
        let mut tampered = proof;
        tampered.proof.hashes.pop();
        assert!(!tampered.is_valid(&rules));
    }
}

#[test]
fn suffix_coverage_is_mandatory() {
    let rules = testing_rules();
    let chain = build_chain(100, &rules);
    let full = prove(&chain, &rules);

    // A prover that stops half-way but still claims lower_bound = 0 cannot satisfy the sampler.
    let keep = full.states.len() / 2;
    let mut truncated = full;
    truncated.states.truncate(keep.max(2));
    truncated.proof.hashes.clear();
    assert!(!truncated.is_valid(&rules));
}

#[test]
fn partial_coverage_fails_across_transcripts() {
    // An attacker holding only the top half of the work axis cannot satisfy the sampler, no
    // matter which transcript the (remined) tip seeds.
    let rules = testing_rules();
    for seed in 0..10u64 {
        let mut chain = build_chain(100, &rules);
        let last = chain.headers.len() - 1;
        chain.headers[last].pow.nonce = 1000 + seed;

        let tip = chain.tip();
        let full = ChainWorkProof::create(&chain, tip, U256::zero(), chain.root_live, &rules).unwrap();

        let keep = (full.states.len() / 2).max(2);
        let mut partial = full;
        partial.states.truncate(keep);
        partial.proof.hashes.clear();
        assert!(!partial.is_valid(&rules), "seed {}", seed);
    }
}

#[test]
fn ancestry_proofs_verify_against_the_definition() {
    let rules = testing_rules();
    let chain = build_chain(30, &rules);
    let tip = chain.tip();

    for target in [1u64, 7, 15, 28] {
        let header = &chain.headers[(target - rules.height_genesis) as usize];
        let id = header.id();

        let mut hashes = Vec::new();
        assert!(chain
            .history
            .get_proof(&mut merkle::CollectProof::new(&mut hashes), target - rules.height_genesis));
        hashes.push(chain.root_live);

        assert!(tip.verify_state_proof(&id, &hashes, &rules), "height {}", target);

        // The same proof for a different claimed height must fail.
        let mut wrong = id.clone();
        wrong.height += 1;
        assert!(!tip.verify_state_proof(&wrong, &hashes, &rules));
    }
}
