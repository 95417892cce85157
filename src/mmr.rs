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

use core::marker::PhantomData;

use digest::{consts::U32, Digest};

use crate::{
    consistency::{self, ConsistencyProof},
    hash::{interior_hash, ZERO_HASH},
    index, proof, Error, Hash, InclusionProof, Result, Store, Vec,
};

#[cfg(test)]
#[path = "mmr_tests.rs"]
mod tests;

/// Merkle-Mountain-Range (MMR) over an external node store.
///
/// Node indices are 0-based store locations; the equivalent 1-based value
/// `index + 1` is the postorder tree position committed by every interior
/// hash.
///
/// Leaves arrive already hashed; the MMR only combines them with the
/// position-committed interior rule. Appends must be serialized by the
/// caller, while proof generation is a pure function of the store snapshot
/// it observes.
pub struct MerkleMountainRange<D, S>
where
    D: Digest<OutputSize = U32>,
    S: Store,
{
    // total number of MMR nodes, i.e. MMR size
    size: u64,
    // backing store for the MMR
    store: S,
    // make rustc happy
    _marker: PhantomData<D>,
}

impl<D, S> MerkleMountainRange<D, S>
where
    D: Digest<OutputSize = U32>,
    S: Store,
{
    /// Return an MMR of `size` nodes on top of `store`.
    ///
    /// `size` is 0 for a fresh log. On restart after a torn append, the
    /// first complete size at or below the stored node count is the
    /// authoritative one; interior back-fill is idempotent to recompute.
    pub fn new(size: u64, store: S) -> Self {
        MerkleMountainRange {
            size,
            store,
            _marker: PhantomData,
        }
    }

    /// Append the pre-hashed leaf `leaf_hash` to the MMR.
    ///
    /// The leaf is written to the store, then interior nodes are back-filled
    /// while the just-appended node completes a sibling pair. Return the next
    /// append index, i.e. the new MMR size.
    ///
    /// After every successful call the MMR is in a complete state.
    pub fn add_hashed_leaf(&mut self, leaf_hash: Hash) -> Result<u64> {
        let mut i = self.store.append(leaf_hash)?;

        while index::index_height(i + 1) > index::index_height(i) {
            let height = index::index_height(i);

            let left = (i + 1) - (2 << height);
            let left_hash = self.store.get(left)?;
            let right_hash = self.store.get(i)?;

            // the new parent lands at index i + 1, position i + 2
            let parent = interior_hash::<D>(i + 2, &left_hash, &right_hash);
            i = self.store.append(parent)?;
        }

        self.size = i + 1;

        Ok(self.size)
    }

    /// Return the node hash at index `i`.
    pub fn node_hash(&self, i: u64) -> Result<Hash> {
        if i >= self.size {
            return Err(Error::OutOfRange(i, self.size.saturating_sub(1)));
        }

        self.store.get(i)
    }

    /// Return the accumulator peak hashes in descending height order.
    pub fn peak_hashes(&self) -> Result<Vec<Hash>> {
        if self.size == 0 {
            return Ok(Vec::new());
        }

        proof::peak_hashes(&self.store, self.size - 1)
    }

    /// Return an inclusion proof for the node at index `i`.
    pub fn inclusion_proof(&self, i: u64) -> Result<InclusionProof> {
        if self.size == 0 {
            return Err(Error::OutOfRange(i, 0));
        }

        Ok(InclusionProof {
            mmr_size: self.size,
            path: proof::inclusion_proof(&self.store, self.size - 1, i)?,
        })
    }

    /// Return a consistency proof extending the complete state of
    /// `mmr_size_a` nodes to the current size.
    pub fn consistency_proof(&self, mmr_size_a: u64) -> Result<ConsistencyProof> {
        consistency::index_consistency_proof(&self.store, mmr_size_a, self.size)
    }

    /// Fold all peaks right-to-left into a single legacy root hash.
    ///
    /// The descending accumulator is the canonical commitment; this fold is
    /// kept for artifacts signed over a single hash. Each combine commits
    /// the MMR size as its position.
    pub fn bagged_root(&self) -> Result<Hash> {
        let peaks = self.peak_hashes()?;

        let mut root = None;

        for p in peaks.into_iter().rev() {
            root = match root {
                None => Some(p),
                Some(r) => Some(interior_hash::<D>(self.size, &p, &r)),
            }
        }

        Ok(root.unwrap_or(ZERO_HASH))
    }

    /// Validate the MMR by re-calculating the hash of all interior nodes.
    ///
    /// Return `true` if the MMR is valid, or the index of the first node
    /// whose stored hash does not match the recomputed one.
    pub fn validate(&self) -> Result<bool> {
        for i in 0..self.size {
            let height = index::index_height(i);

            // interior nodes start at height 1
            if height > 0 {
                let left = i - (1 << height);
                let right = i - 1;

                let left_hash = self.store.get(left)?;
                let right_hash = self.store.get(right)?;

                let want = interior_hash::<D>(i + 1, &left_hash, &right_hash);

                if want != self.store.get(i)? {
                    return Err(Error::InvalidNodeHash(i));
                }
            }
        }

        Ok(true)
    }

    /// Return the MMR size, i.e. the total number of nodes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Return a reference to the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
