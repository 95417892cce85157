// Copyright (C) 2021 Andreas Doerr
// SPDX-License-Identifier: Apache-2.0

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Consistency proof unit tests

use codec::{Decode, Encode};

use super::{consistent_roots, index_consistency_proof, verify_consistency, ConsistencyProof};
use crate::{
    index,
    proof::{inclusion_proof, peak_hashes},
    Error, Hash, MerkleMountainRange, Sha256, VecStore,
};

fn leaf(e: u64) -> Hash {
    Hash::digest::<Sha256>(&index::mmr_index(e).to_be_bytes())
}

fn make_store(num_leaves: u64) -> VecStore {
    let mut mmr = MerkleMountainRange::<Sha256, VecStore>::new(0, VecStore::new());

    for e in 0..num_leaves {
        mmr.add_hashed_leaf(leaf(e)).unwrap();
    }

    VecStore {
        hashes: mmr.store().hashes.clone(),
    }
}

#[test]
fn seven_to_fifteen_works() {
    let store = make_store(8);

    let proof = index_consistency_proof(&store, 7, 15).unwrap();

    // the single peak of size 7 is node 6; its path in size 15 is node 13
    assert_eq!(proof.path, inclusion_proof(&store, 14, 6).unwrap());
    assert_eq!(proof.path.len(), 1);

    let peaks_a = peak_hashes(&store, 6).unwrap();
    let peaks_b = peak_hashes(&store, 14).unwrap();

    assert!(verify_consistency::<Sha256>(&proof, &peaks_a, &peaks_b).is_ok());
}

#[test]
fn adjacent_peaks_dedup_to_one_root() {
    let store = make_store(8);

    // size 11 has three peaks, all of which land under the single peak of
    // size 15
    let proof = index_consistency_proof(&store, 11, 15).unwrap();

    let peaks_a = peak_hashes(&store, 10).unwrap();
    let peaks_b = peak_hashes(&store, 14).unwrap();

    let segments: Vec<Vec<Hash>> = index::peaks(10)
        .iter()
        .map(|p| inclusion_proof(&store, 14, *p).unwrap())
        .collect();

    let roots = consistent_roots::<Sha256>(10, &peaks_a, &segments).unwrap();

    assert_eq!(roots, peaks_b);
    assert!(verify_consistency::<Sha256>(&proof, &peaks_a, &peaks_b).is_ok());
}

#[test]
fn same_size_is_consistent() {
    let store = make_store(7);

    let proof = index_consistency_proof(&store, 11, 11).unwrap();
    assert!(proof.path.is_empty());

    let peaks = peak_hashes(&store, 10).unwrap();

    assert!(verify_consistency::<Sha256>(&proof, &peaks, &peaks).is_ok());
}

#[test]
fn incomplete_sizes_fail() {
    let store = make_store(8);

    assert_eq!(
        index_consistency_proof(&store, 5, 15).err().unwrap(),
        Error::InvalidSize(5)
    );
    assert_eq!(
        index_consistency_proof(&store, 7, 12).err().unwrap(),
        Error::InvalidSize(12)
    );
    assert_eq!(
        index_consistency_proof(&store, 0, 15).err().unwrap(),
        Error::InvalidSize(0)
    );
}

#[test]
fn tampered_path_fails() {
    let store = make_store(8);

    let mut proof = index_consistency_proof(&store, 7, 15).unwrap();
    proof.path[0] = Hash::digest::<Sha256>(b"bogus");

    let peaks_a = peak_hashes(&store, 6).unwrap();
    let peaks_b = peak_hashes(&store, 14).unwrap();

    assert_eq!(
        verify_consistency::<Sha256>(&proof, &peaks_a, &peaks_b)
            .err()
            .unwrap(),
        Error::VerifyConsistencyFailed
    );
}

#[test]
fn forked_log_fails() {
    let store = make_store(8);

    // a fork: same sizes, different leaf content
    let mut forked = MerkleMountainRange::<Sha256, VecStore>::new(0, VecStore::new());
    for e in 0..8 {
        forked
            .add_hashed_leaf(Hash::digest::<Sha256>(&(e + 100u64).to_be_bytes()))
            .unwrap();
    }

    let proof = index_consistency_proof(forked.store(), 7, 15).unwrap();

    let peaks_a = peak_hashes(&store, 6).unwrap();
    let peaks_b = peak_hashes(forked.store(), 14).unwrap();

    assert_eq!(
        verify_consistency::<Sha256>(&proof, &peaks_a, &peaks_b)
            .err()
            .unwrap(),
        Error::VerifyConsistencyFailed
    );
}

#[test]
fn path_length_mismatch_fails() {
    let store = make_store(8);

    let mut proof = index_consistency_proof(&store, 7, 15).unwrap();
    proof.path.push(Hash::digest::<Sha256>(b"extra"));

    let peaks_a = peak_hashes(&store, 6).unwrap();
    let peaks_b = peak_hashes(&store, 14).unwrap();

    assert_eq!(
        verify_consistency::<Sha256>(&proof, &peaks_a, &peaks_b)
            .err()
            .unwrap(),
        Error::ProofLengthMismatch(1, 2)
    );
}

#[test]
fn peak_count_mismatch_fails() {
    let store = make_store(8);

    let proof = index_consistency_proof(&store, 7, 15).unwrap();

    let peaks_b = peak_hashes(&store, 14).unwrap();

    assert_eq!(
        verify_consistency::<Sha256>(&proof, &[], &peaks_b)
            .err()
            .unwrap(),
        Error::ProofLengthMismatch(1, 0)
    );
}

#[test]
fn proof_codec_roundtrip() {
    let store = make_store(8);

    let proof = index_consistency_proof(&store, 7, 15).unwrap();

    let encoded = proof.encode();
    let decoded = ConsistencyProof::decode(&mut &encoded[..]).unwrap();

    assert_eq!(proof, decoded);
    assert_eq!(decoded.mmr_size_a, 7);
    assert_eq!(decoded.mmr_size_b, 15);
}
