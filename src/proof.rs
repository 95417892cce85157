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

//! Inclusion proofs against the accumulator peaks

use codec::{Decode, Encode};
use digest::{consts::U32, Digest};
use scale_info::TypeInfo;

use crate::{hash::interior_hash, index, Error, Hash, Result, Store, Vec};

#[cfg(test)]
#[path = "proof_tests.rs"]
mod tests;

/// Inclusion proof for a single node of an MMR of `mmr_size` nodes.
///
/// `path` holds the sibling hashes from the proven node up to (but not
/// including) its local accumulator peak, lowest sibling first. A node that
/// is itself a peak has an empty path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct InclusionProof {
    pub mmr_size: u64,
    pub path: Vec<Hash>,
}

impl InclusionProof {
    /// Verify that `node_hash` is the node at index `i`, given the trusted
    /// accumulator `peaks` for an MMR of `mmr_size` nodes.
    pub fn verify<D: Digest<OutputSize = U32>>(
        &self,
        peaks: &[Hash],
        i: u64,
        node_hash: &Hash,
    ) -> Result<()> {
        verify_inclusion::<D>(peaks, self.mmr_size, i, node_hash, &self.path)
    }
}

/// Return the sibling indices an inclusion proof for node `i` consists of.
///
/// The walk ascends from `i` and stops as soon as the next sibling would lie
/// beyond `last_index`; at that point the current node is a local peak. A
/// node that is itself a peak yields an empty path.
pub fn inclusion_proof_path(last_index: u64, i: u64) -> Result<Vec<u64>> {
    if i > last_index {
        return Err(Error::OutOfRange(i, last_index));
    }

    let mut path = Vec::new();
    let mut i = i;
    let mut height = index::index_height(i);

    loop {
        let (sibling, next) = if index::index_height(i + 1) > height {
            // i is a right child, its sibling is on the left
            ((i + 1) - (2 << height), i + 1)
        } else {
            // i is a left child, its sibling is on the right
            (i + (2 << height) - 1, i + (2 << height))
        };

        if sibling > last_index {
            break;
        }

        path.push(sibling);
        i = next;
        height += 1;
    }

    Ok(path)
}

/// Return the inclusion proof for node `i` in the MMR whose last node is
/// `last_index`.
///
/// The path contains sibling hashes only; peaks are never part of a proof.
pub fn inclusion_proof<S: Store>(store: &S, last_index: u64, i: u64) -> Result<Vec<Hash>> {
    inclusion_proof_path(last_index, i)?
        .into_iter()
        .map(|sibling| store.get(sibling))
        .collect()
}

/// Return the accumulator peak hashes of the MMR whose last node is
/// `last_index`, in descending height order.
pub fn peak_hashes<S: Store>(store: &S, last_index: u64) -> Result<Vec<Hash>> {
    let peaks = index::peaks(last_index);

    if peaks.is_empty() {
        return Err(Error::InvalidSize(last_index + 1));
    }

    peaks.into_iter().map(|p| store.get(p)).collect()
}

/// Reconstruct the accumulator peak committing node `i` from `node_hash` and
/// the sibling hashes in `proof`.
///
/// At each step the sibling is on the left exactly when the height of the
/// next index exceeds the current height, i.e. when the current node is a
/// right child. The combine always commits the 1-based position of the
/// newly formed parent.
pub fn included_root<D: Digest<OutputSize = U32>>(
    i: u64,
    node_hash: &Hash,
    proof: &[Hash],
) -> Hash {
    let mut root = *node_hash;
    let mut i = i;
    let mut height = index::index_height(i);

    for sibling in proof {
        if index::index_height(i + 1) > height {
            // sibling is the left child, the current node the right
            i += 1;
            root = interior_hash::<D>(i + 1, sibling, &root);
        } else {
            // sibling is the right child, the current node the left
            i += 2 << height;
            root = interior_hash::<D>(i + 1, &root, sibling);
        }

        height += 1;
    }

    root
}

/// Verify that `node_hash` is the hash of node `i` in the MMR of `size`
/// nodes whose accumulator is `peaks`.
///
/// The peak committing the proven node is selected by [`index::peak_index`]
/// from the proof length plus the node height, then compared against the
/// reconstructed root.
pub fn verify_inclusion<D: Digest<OutputSize = U32>>(
    peaks: &[Hash],
    size: u64,
    i: u64,
    node_hash: &Hash,
    proof: &[Hash],
) -> Result<()> {
    if i >= size {
        return Err(Error::OutOfRange(i, size.saturating_sub(1)));
    }

    let d = proof.len() as u64 + index::index_height(i);

    // no u64-indexed MMR is deeper than 64 levels
    if d > 63 {
        return Err(Error::VerifyInclusionFailed);
    }

    let iacc = index::peak_index(index::leaf_count(size), d) as usize;

    if iacc >= peaks.len() {
        return Err(Error::AccumulatorOutOfRange(iacc, peaks.len()));
    }

    if included_root::<D>(i, node_hash, proof) == peaks[iacc] {
        Ok(())
    } else {
        Err(Error::VerifyInclusionFailed)
    }
}
