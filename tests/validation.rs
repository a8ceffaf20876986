// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! End-to-end validator scenarios: block subsidy accounting, coinbase rules, stream ordering,
//! cut-through merging and multi-verifier sharding.

use std::sync::atomic::{AtomicBool, Ordering};

use glimmer_core::{
    blocks::{Body, BodyBase},
    consensus::ConsensusRules,
    crypto::{CryptoFactories, PrivateKey},
    transactions::{
        test_helpers::{create_test_kernel, create_test_tx, random_key},
        transaction_components::{Input, Output},
        HeightRange,
        MicroGlim,
        Transaction,
        TxBase,
        TxVectors,
        TxWriter,
    },
    validation::Context,
};

fn rules() -> ConsensusRules {
    ConsensusRules::default()
}

/// A block body holding a single coinbase output of `value`, declaring `subsidy`.
fn coinbase_body(value: u64, subsidy: u64, factories: &CryptoFactories) -> Body {
    let k = random_key();
    let output = Output::new_coinbase(&k, MicroGlim::from(value), factories).unwrap();

    let mut vectors = TxVectors::empty();
    vectors.add_output(output);
    vectors.sort();

    let mut base = BodyBase {
        base: TxBase {
            // The coinbase blinding must cancel against the offset.
            offset: PrivateKey::default() - k,
        },
        ..Default::default()
    };
    base.subsidy += MicroGlim::from(subsidy);

    Body { base, vectors }
}

#[test]
fn single_coinbase_block_is_valid() {
    let rules = rules();
    let factories = CryptoFactories::default();
    let body = coinbase_body(rules.coinbase_emission, rules.coinbase_emission, &factories);

    assert!(body.is_valid(&HeightRange::new(1, 1), true, &rules, &factories));
}

#[test]
fn coinbase_block_respects_emission_cap_when_subsidy_is_closed() {
    let rules = rules();
    let factories = CryptoFactories::default();
    let body = coinbase_body(rules.coinbase_emission, rules.coinbase_emission, &factories);

    assert!(body.is_valid(&HeightRange::new(1, 1), false, &rules, &factories));
}

#[test]
fn overspending_coinbase_block_is_rejected() {
    let rules = rules();
    let factories = CryptoFactories::default();

    // The declared subsidy no longer matches the minted value: the sum check fails.
    let body = coinbase_body(rules.coinbase_emission, rules.coinbase_emission + 1, &factories);
    assert!(!body.is_valid(&HeightRange::new(1, 1), true, &rules, &factories));

    // Minting over the emission schedule fails the subsidy bound even with a matching sum.
    let body = coinbase_body(rules.coinbase_emission + 1, rules.coinbase_emission + 1, &factories);
    assert!(!body.is_valid(&HeightRange::new(1, 1), false, &rules, &factories));
}

#[test]
fn twice_closed_subsidy_is_rejected() {
    let rules = rules();
    let factories = CryptoFactories::default();
    let mut body = coinbase_body(rules.coinbase_emission, rules.coinbase_emission, &factories);
    body.base.subsidy_closing = true;

    assert!(!body.is_valid(&HeightRange::new(1, 1), false, &rules, &factories));
}

#[test]
fn coinbase_in_a_transaction_is_rejected() {
    let rules = rules();
    let factories = CryptoFactories::default();

    let k = random_key();
    let output = Output::new_coinbase(&k, MicroGlim::from(rules.coinbase_emission), &factories).unwrap();
    let mut vectors = TxVectors::empty();
    vectors.add_output(output);
    vectors.sort();
    let tx = Transaction::new(PrivateKey::default() - k, vectors);

    let mut ctx = Context::new(&rules, &factories);
    assert!(!tx.is_valid(&mut ctx));
}

#[test]
fn balanced_transaction_is_valid() {
    let rules = rules();
    let factories = CryptoFactories::default();
    let tx = create_test_tx(&[500_000], &[290_000, 200_000], 10_000, &factories);

    let mut ctx = Context::new(&rules, &factories);
    assert!(tx.is_valid(&mut ctx));
    assert_eq!(ctx.fee.lo, 10_000);
}

#[test]
fn tampered_offset_breaks_the_balance() {
    let rules = rules();
    let factories = CryptoFactories::default();
    let mut tx = create_test_tx(&[100], &[90], 10, &factories);
    tx.base.offset = random_key();

    let mut ctx = Context::new(&rules, &factories);
    assert!(!tx.is_valid(&mut ctx));
}

#[test]
fn unsorted_inputs_are_rejected() {
    let rules = rules();
    let factories = CryptoFactories::default();

    let (a, _) = glimmer_core::transactions::test_helpers::create_test_input(MicroGlim::from(1), &factories);
    let (b, _) = glimmer_core::transactions::test_helpers::create_test_input(MicroGlim::from(2), &factories);
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };

    // Descending order; built unsorted on purpose.
    let vectors = TxVectors::new(vec![hi, lo], vec![], vec![], vec![]);
    let tx = Transaction::new(PrivateKey::default(), vectors);

    let mut ctx = Context::new(&rules, &factories);
    assert!(!ctx.validate_and_summarize(&tx.base, &mut tx.body.reader()));
}

#[test]
fn duplicated_inputs_are_rejected() {
    let rules = rules();
    let factories = CryptoFactories::default();

    let (a, _) = glimmer_core::transactions::test_helpers::create_test_input(MicroGlim::from(1), &factories);
    let vectors = TxVectors::new(vec![a.clone(), a], vec![], vec![], vec![]);
    let tx = Transaction::new(PrivateKey::default(), vectors);

    let mut ctx = Context::new(&rules, &factories);
    assert!(!ctx.validate_and_summarize(&tx.base, &mut tx.body.reader()));
}

#[test]
fn aborted_validation_returns_early() {
    let rules = rules();
    let factories = CryptoFactories::default();
    let tx = create_test_tx(&[100], &[90], 10, &factories);

    let stop = AtomicBool::new(true);
    let mut ctx = Context::new(&rules, &factories);
    ctx.abort = Some(&stop);
    assert!(!ctx.validate_and_summarize(&tx.base, &mut tx.body.reader()));

    stop.store(false, Ordering::Relaxed);
    let mut ctx = Context::new(&rules, &factories);
    ctx.abort = Some(&stop);
    assert!(ctx.validate_and_summarize(&tx.base, &mut tx.body.reader()));
}

#[test]
fn sharded_validation_agrees_with_single_verifier() {
    let rules = rules();
    let factories = CryptoFactories::default();
    let good = create_test_tx(&[600, 400], &[500, 300, 100], 100, &factories);
    let mut bad = create_test_tx(&[600], &[500], 100, &factories);
    bad.base.offset = random_key();

    for (tx, expected) in [(&good, true), (&bad, false)] {
        for n in 1u32..=8 {
            let mut contexts: Vec<Context> = (0..n)
                .map(|i| {
                    let mut ctx = Context::new(&rules, &factories);
                    ctx.verifiers = n;
                    ctx.verifier_index = i;
                    ctx
                })
                .collect();

            let mut streamed_ok = true;
            for ctx in contexts.iter_mut() {
                streamed_ok &= ctx.validate_and_summarize(&tx.base, &mut tx.body.reader());
            }
            assert!(streamed_ok, "streaming itself must pass for {} shards", n);

            let mut merged = contexts.remove(0);
            for ctx in &contexts {
                assert!(merged.merge(ctx));
            }
            assert_eq!(merged.is_valid_transaction(), expected, "{} shards", n);
        }
    }
}

#[test]
fn cut_through_cancels_intermediate_outputs() {
    let factories = CryptoFactories::default();

    // T1 creates A; T2 spends A into B. The merge must emit only B (plus both kernels).
    let k_a = random_key();
    let a = Output::create(&k_a, MicroGlim::from(50), false, 0, &factories).unwrap();
    let b = Output::create(&random_key(), MicroGlim::from(40), false, 0, &factories).unwrap();

    let mut t1 = TxVectors::empty();
    t1.add_output(a.clone());
    t1.add_kernel_out(create_test_kernel(
        &random_key(),
        MicroGlim::from(1),
        HeightRange::default(),
        0,
        vec![],
    ));
    t1.sort();

    let mut t2 = TxVectors::empty();
    t2.add_input(Input::from(&a));
    t2.add_output(b.clone());
    t2.add_kernel_out(create_test_kernel(
        &random_key(),
        MicroGlim::from(2),
        HeightRange::default(),
        0,
        vec![],
    ));
    t2.sort();

    let stop = AtomicBool::new(false);
    let mut merged = TxVectors::empty();
    assert!(merged.combine(&mut [&mut t1.reader(), &mut t2.reader()], &stop));

    assert!(merged.inputs().is_empty());
    assert_eq!(merged.outputs(), &[b]);
    assert_eq!(merged.kernels_out().len(), 2);
}

#[test]
fn combine_is_symmetric() {
    let factories = CryptoFactories::default();
    let t1 = create_test_tx(&[100], &[60, 30], 10, &factories);
    let t2 = create_test_tx(&[500], &[450], 50, &factories);

    let stop = AtomicBool::new(false);

    let mut ab = TxVectors::empty();
    assert!(ab.combine(&mut [&mut t1.body.reader(), &mut t2.body.reader()], &stop));
    let mut ba = TxVectors::empty();
    assert!(ba.combine(&mut [&mut t2.body.reader(), &mut t1.body.reader()], &stop));

    assert_eq!(ab, ba);
}

#[test]
fn combine_cancels_kernel_pairs_and_terminates() {
    let factories = CryptoFactories::default();

    // The same kernel appears as r1's input-kernel and r2's output-kernel; the pair must cancel
    // by advancing the *kernel* cursors, leaving the unrelated utxo streams intact.
    let kernel = create_test_kernel(&random_key(), MicroGlim::from(3), HeightRange::default(), 0, vec![]);
    let (x, _) = glimmer_core::transactions::test_helpers::create_test_input(MicroGlim::from(7), &factories);
    let y = Output::create(&random_key(), MicroGlim::from(9), false, 0, &factories).unwrap();

    let mut r1 = TxVectors::empty();
    r1.add_input(x.clone());
    r1.add_kernel_in(kernel.clone());
    r1.sort();

    let mut r2 = TxVectors::empty();
    r2.add_output(y.clone());
    r2.add_kernel_out(kernel);
    r2.sort();

    let stop = AtomicBool::new(false);
    let mut merged = TxVectors::empty();
    assert!(merged.combine(&mut [&mut r1.reader(), &mut r2.reader()], &stop));

    assert_eq!(merged.inputs(), &[x]);
    assert_eq!(merged.outputs(), &[y]);
    assert!(merged.kernels_in().is_empty());
    assert!(merged.kernels_out().is_empty());
}

#[test]
fn stopped_combine_reports_cancellation() {
    let factories = CryptoFactories::default();
    let t1 = create_test_tx(&[100], &[90], 10, &factories);

    let stop = AtomicBool::new(true);
    let mut merged = TxVectors::empty();
    assert!(!merged.combine(&mut [&mut t1.body.reader()], &stop));
}

#[test]
fn kernel_height_windows_narrow_the_transaction_range() {
    let rules = rules();
    let factories = CryptoFactories::default();

    let mut tx = create_test_tx(&[100], &[90], 10, &factories);
    let mut vectors = TxVectors::empty();
    for k in tx.body.kernels_out() {
        let mut k = k.clone();
        k.height = HeightRange::new(10, 20);
        vectors.add_kernel_out(k);
    }
    for i in tx.body.inputs() {
        vectors.add_input(i.clone());
    }
    for o in tx.body.outputs() {
        vectors.add_output(o.clone());
    }
    vectors.sort();
    tx.body = vectors;

    let mut ctx = Context::new(&rules, &factories);
    // The signature no longer matches the altered height window, so the stream fails; the
    // narrowing logic is observable through a freshly signed kernel instead.
    assert!(!ctx.validate_and_summarize(&tx.base, &mut tx.body.reader()));

    let excess = random_key();
    let mut vectors = TxVectors::empty();
    vectors.add_kernel_out(create_test_kernel(
        &excess,
        MicroGlim::zero(),
        HeightRange::new(10, 20),
        0,
        vec![],
    ));
    vectors.sort();
    let tx = Transaction::new(PrivateKey::default() - excess, vectors);

    let mut ctx = Context::new(&rules, &factories);
    assert!(ctx.validate_and_summarize(&tx.base, &mut tx.body.reader()));
    assert_eq!(ctx.height, HeightRange::new(10, 20));
}
