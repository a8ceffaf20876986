// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! Round trips through the five-stream block body container.

use std::sync::atomic::AtomicBool;

use glimmer_core::{
    blocks::{BlockHeader, BodyBase, BodyFileError, BodyFileRw},
    consensus::ConsensusRules,
    crypto::CryptoFactories,
    transactions::{test_helpers::create_test_tx, TxReader, TxVectors, TxWriter},
};

fn temp_prefix(tag: &str) -> String {
    let mut path = std::env::temp_dir();
    path.push(format!("glimmer_body_{}_{}_", tag, std::process::id()));
    path.to_string_lossy().into_owned()
}

fn cleanup(prefix: &str) {
    BodyFileRw::delete(prefix);
}

#[test]
fn body_streams_round_trip() {
    let rules = ConsensusRules::default();
    let factories = CryptoFactories::default();
    let prefix = temp_prefix("roundtrip");

    let tx = create_test_tx(&[1000, 500], &[800, 400], 300, &factories);
    let header = BlockHeader::default();
    let (seq_prefix, seq_element) = header.split_sequence();
    let body_base = BodyBase::default();

    {
        let mut writer = BodyFileRw::open(&prefix, false).unwrap();
        writer.put_start(&body_base, &seq_prefix, &rules).unwrap();
        writer.put_next_header(&seq_element).unwrap();
        writer.dump(&mut tx.body.reader());
        assert!(writer.io_error().is_none());
        writer.flush().unwrap();
    }

    let mut reader = BodyFileRw::open(&prefix, true).unwrap();
    let (read_base, read_prefix) = reader.get_start(&rules).unwrap();
    assert_eq!(read_base, body_base);
    assert_eq!(read_prefix, seq_prefix);
    assert_eq!(reader.get_next_header().unwrap(), Some(seq_element));
    assert_eq!(reader.get_next_header().unwrap(), None);

    let mut copy = TxVectors::empty();
    copy.dump(&mut reader);
    assert!(reader.io_error().is_none());
    assert_eq!(copy, tx.body);

    cleanup(&prefix);
}

#[test]
fn mismatched_rules_refuse_to_open() {
    let rules = ConsensusRules::default();
    let prefix = temp_prefix("rules");

    {
        let mut writer = BodyFileRw::open(&prefix, false).unwrap();
        writer
            .put_start(&BodyBase::default(), &BlockHeader::default().split_sequence().0, &rules)
            .unwrap();
        writer.flush().unwrap();
    }

    let other_rules = ConsensusRules::testing();
    let mut reader = BodyFileRw::open(&prefix, true).unwrap();
    assert!(matches!(
        reader.get_start(&other_rules),
        Err(BodyFileError::RulesMismatch)
    ));

    cleanup(&prefix);
}

#[test]
fn missing_streams_surface_io_errors() {
    let prefix = temp_prefix("missing");
    assert!(matches!(BodyFileRw::open(&prefix, true), Err(BodyFileError::Io(_))));
}

#[test]
fn containers_combine_with_cut_through() {
    let rules = ConsensusRules::default();
    let factories = CryptoFactories::default();
    let p1 = temp_prefix("src1");
    let p2 = temp_prefix("src2");
    let p_out = temp_prefix("merged");

    let t1 = create_test_tx(&[100], &[60, 30], 10, &factories);
    let t2 = create_test_tx(&[900], &[850], 50, &factories);
    let (seq_prefix, _) = BlockHeader::default().split_sequence();

    for (prefix, tx) in [(&p1, &t1), (&p2, &t2)] {
        let mut writer = BodyFileRw::open(prefix, false).unwrap();
        writer.put_start(&BodyBase::default(), &seq_prefix, &rules).unwrap();
        writer.dump(&mut tx.body.reader());
        assert!(writer.io_error().is_none());
        writer.flush().unwrap();
    }

    {
        let mut r1 = BodyFileRw::open(&p1, true).unwrap();
        let mut r2 = BodyFileRw::open(&p2, true).unwrap();
        let mut out = BodyFileRw::open(&p_out, false).unwrap();

        let stop = AtomicBool::new(false);
        assert!(out.combine_hdr(&mut r1, &mut r2, &rules, &stop).unwrap());

        r1.reset();
        r2.reset();
        assert!(out.combine(&mut [&mut r1, &mut r2], &stop));
        assert!(out.io_error().is_none());
        out.flush().unwrap();
    }

    // The file merge must agree with the in-memory merge.
    let mut expected = TxVectors::empty();
    let stop = AtomicBool::new(false);
    assert!(expected.combine(&mut [&mut t1.body.reader(), &mut t2.body.reader()], &stop));

    let mut merged_reader = BodyFileRw::open(&p_out, true).unwrap();
    let (merged_base, _) = merged_reader.get_start(&rules).unwrap();
    assert_eq!(merged_base, BodyBase::default());

    let mut merged = TxVectors::empty();
    merged.dump(&mut merged_reader);
    assert!(merged_reader.io_error().is_none());
    assert_eq!(merged, expected);

    cleanup(&p1);
    cleanup(&p2);
    cleanup(&p_out);
}

#[test]
fn auto_delete_removes_streams_on_drop() {
    let rules = ConsensusRules::default();
    let prefix = temp_prefix("autodel");

    {
        let mut writer = BodyFileRw::open(&prefix, false).unwrap();
        writer
            .put_start(&BodyBase::default(), &BlockHeader::default().split_sequence().0, &rules)
            .unwrap();
        writer.set_auto_delete(true);
    }

    assert!(matches!(BodyFileRw::open(&prefix, true), Err(BodyFileError::Io(_))));
}
