// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! Consensus rules and the domain-separated hashing every consensus rule is expressed in.

mod hashing;
mod rules;

pub use hashing::{
    BlocksHashDomain,
    ConsensusHasher,
    ConsensusHashing,
    DomainSeparatedConsensusHasher,
    MerkleHashDomain,
    OracleHashDomain,
    RulesHashDomain,
    TransactionHashDomain,
};
pub use rules::ConsensusRules;
