// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! Builders for test transactions. These make no attempt to be economical with allocations; they
//! exist to produce well-formed (or deliberately malformed) ledger objects for the test suites.

use rand::rngs::OsRng;
use tari_crypto::keys::{PublicKey as PublicKeyTrait, SecretKey};

use crate::{
    crypto::{BlindingFactor, Commitment, CryptoFactories, PrivateKey, PublicKey, Signature},
    transactions::{
        transaction_components::{Input, Output, TxKernel},
        HeightRange,
        MicroGlim,
        Transaction,
        TxVectors,
    },
};

pub fn random_key() -> PrivateKey {
    PrivateKey::random(&mut OsRng)
}

/// A placeholder signature for kernels that are yet to be signed.
pub fn empty_signature() -> Signature {
    Signature::new(PublicKey::default(), PrivateKey::default())
}

/// Signs `kernel` with the excess key, scaled by the kernel's multiplier. The kernel must be
/// structurally complete (nested list final) since the hash covers it.
pub fn sign_kernel(kernel: &mut TxKernel, excess_key: &PrivateKey) {
    let hv = kernel.hash(None).expect("test kernels are well-formed");
    let signing_key = excess_key.clone() * PrivateKey::from(u64::from(kernel.multiplier) + 1);
    let nonce = random_key();
    kernel.signature = Signature::sign_raw(&signing_key, nonce, hv.as_slice()).expect("signing cannot fail");
}

/// Builds a signed kernel whose excess is `excess_key·G`.
pub fn create_test_kernel(
    excess_key: &PrivateKey,
    fee: MicroGlim,
    height: HeightRange,
    multiplier: u32,
    mut nested: Vec<TxKernel>,
) -> TxKernel {
    nested.sort();
    let mut kernel = TxKernel {
        excess: Commitment::from_public_key(&PublicKey::from_secret_key(excess_key)),
        multiplier,
        signature: empty_signature(),
        fee,
        height,
        hash_lock: None,
        nested,
    };
    sign_kernel(&mut kernel, excess_key);
    kernel
}

/// A spendable test UTXO: the blinding key and the input referencing its commitment.
pub fn create_test_input(value: MicroGlim, factories: &CryptoFactories) -> (Input, PrivateKey) {
    let k = random_key();
    let commitment = {
        use tari_crypto::commitment::HomomorphicCommitmentFactory;
        factories.commitment.commit_value(&k, value.as_u64())
    };
    (Input::new(commitment, 0), k)
}

/// Builds a balanced confidential transaction spending `input_values` into `output_values` with
/// the given fee. The caller must keep `Σ inputs = Σ outputs + fee`.
pub fn create_test_tx(input_values: &[u64], output_values: &[u64], fee: u64, factories: &CryptoFactories) -> Transaction {
    debug_assert_eq!(
        input_values.iter().sum::<u64>(),
        output_values.iter().sum::<u64>() + fee
    );

    let offset: BlindingFactor = random_key();
    let mut body = TxVectors::empty();

    let mut key_sum = PrivateKey::default();
    for v in input_values {
        let (input, k) = create_test_input(MicroGlim::from(*v), factories);
        key_sum = key_sum + k;
        body.add_input(input);
    }
    for v in output_values {
        let k = random_key();
        key_sum = key_sum - k.clone();
        body.add_output(Output::create(&k, MicroGlim::from(*v), false, 0, factories).expect("test output"));
    }

    // The kernel key balances the blinding components to zero.
    let excess_key = key_sum - offset.clone();
    body.add_kernel_out(create_test_kernel(
        &excess_key,
        MicroGlim::from(fee),
        HeightRange::default(),
        0,
        vec![],
    ));

    body.sort();
    Transaction::new(offset, body)
}
