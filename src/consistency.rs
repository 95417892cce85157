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

//! Log-extension (consistency) proofs
//!
//! A consistency proof shows that a later log state extends an earlier one:
//! every peak of the earlier state is proven included in the later state,
//! against the later accumulator. The earlier peaks themselves are **not**
//! part of the payload; the verifier recovers them from a previously signed
//! state.

use codec::{Decode, Encode};
use digest::{consts::U32, Digest};
use scale_info::TypeInfo;

use crate::{
    index,
    proof::{included_root, inclusion_proof, inclusion_proof_path},
    Error, Hash, Result, Store, Vec,
};

#[cfg(test)]
#[path = "consistency_tests.rs"]
mod tests;

/// Proof that the MMR of `mmr_size_b` nodes extends the MMR of `mmr_size_a`
/// nodes.
///
/// `path` is the concatenation of one inclusion proof per peak of the
/// earlier state, in descending height peak order. The per-peak segment
/// boundaries are recomputed from index arithmetic alone, so the wire shape
/// stays flat.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct ConsistencyProof {
    pub mmr_size_a: u64,
    pub mmr_size_b: u64,
    pub path: Vec<Hash>,
}

/// Produce a consistency proof from the complete size `mmr_size_a` to the
/// complete size `mmr_size_b`.
pub fn index_consistency_proof<S: Store>(
    store: &S,
    mmr_size_a: u64,
    mmr_size_b: u64,
) -> Result<ConsistencyProof> {
    if mmr_size_a == 0 || index::peaks(mmr_size_a - 1).is_empty() {
        return Err(Error::InvalidSize(mmr_size_a));
    }
    if mmr_size_b == 0 || index::peaks(mmr_size_b - 1).is_empty() {
        return Err(Error::InvalidSize(mmr_size_b));
    }

    let mut path = Vec::new();

    for peak in index::peaks(mmr_size_a - 1) {
        path.extend(inclusion_proof(store, mmr_size_b - 1, peak)?);
    }

    Ok(ConsistencyProof {
        mmr_size_a,
        mmr_size_b,
        path,
    })
}

/// Reconstruct the peaks of the later state that commit the earlier state.
///
/// `peaks_a` are the trusted peak hashes of the MMR whose last node is
/// `last_index_a`, and `proofs` one inclusion path per peak. Adjacent peaks
/// of the earlier state frequently land under the same later peak, so
/// consecutive identical roots are deduplicated. The result is in
/// descending height order.
pub fn consistent_roots<D: Digest<OutputSize = U32>>(
    last_index_a: u64,
    peaks_a: &[Hash],
    proofs: &[Vec<Hash>],
) -> Result<Vec<Hash>> {
    let indices = index::peaks(last_index_a);

    if indices.len() != peaks_a.len() {
        return Err(Error::ProofLengthMismatch(indices.len(), peaks_a.len()));
    }
    if indices.len() != proofs.len() {
        return Err(Error::ProofLengthMismatch(indices.len(), proofs.len()));
    }

    let mut roots: Vec<Hash> = Vec::new();

    for ((i, peak), proof) in indices.iter().zip(peaks_a).zip(proofs) {
        // no u64-indexed MMR is deeper than 64 levels
        if proof.len() as u64 + index::index_height(*i) > 63 {
            return Err(Error::VerifyConsistencyFailed);
        }

        let root = included_root::<D>(*i, peak, proof);

        if roots.last() != Some(&root) {
            roots.push(root);
        }
    }

    Ok(roots)
}

/// Verify that the log state with peaks `peaks_b` extends the earlier state
/// with trusted peaks `peaks_a`.
///
/// Success implies every node hash of the earlier MMR appears at the same
/// position in the later MMR.
pub fn verify_consistency<D: Digest<OutputSize = U32>>(
    proof: &ConsistencyProof,
    peaks_a: &[Hash],
    peaks_b: &[Hash],
) -> Result<()> {
    let segments = split_path(proof)?;
    let proven = consistent_roots::<D>(proof.mmr_size_a - 1, peaks_a, &segments)?;

    if proven.is_empty() {
        return Err(Error::VerifyConsistencyFailed);
    }

    // both lists are in descending height order; scan them jointly
    let mut j = 0;

    for root in &proven {
        loop {
            if j == peaks_b.len() {
                return Err(Error::VerifyConsistencyFailed);
            }

            j += 1;

            if peaks_b[j - 1] == *root {
                break;
            }
        }
    }

    Ok(())
}

/// Split the flat proof path back into one segment per peak of the earlier
/// state. Segment lengths are pure index arithmetic over the two sizes.
fn split_path(proof: &ConsistencyProof) -> Result<Vec<Vec<Hash>>> {
    if proof.mmr_size_a == 0 || index::peaks(proof.mmr_size_a - 1).is_empty() {
        return Err(Error::InvalidSize(proof.mmr_size_a));
    }
    if proof.mmr_size_b == 0 || index::peaks(proof.mmr_size_b - 1).is_empty() {
        return Err(Error::InvalidSize(proof.mmr_size_b));
    }

    let peaks_a = index::peaks(proof.mmr_size_a - 1);

    let mut segments = Vec::with_capacity(peaks_a.len());
    let mut used = 0;

    for peak in peaks_a {
        let len = inclusion_proof_path(proof.mmr_size_b - 1, peak)?.len();

        if used + len > proof.path.len() {
            return Err(Error::ProofLengthMismatch(used + len, proof.path.len()));
        }

        segments.push(proof.path[used..used + len].to_vec());
        used += len;
    }

    if used != proof.path.len() {
        return Err(Error::ProofLengthMismatch(used, proof.path.len()));
    }

    Ok(segments)
}
