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

//! Key-indexed proofs within a chunk trie.
//!
//! Proofs descend from the chunk root by the target key's bits and carry
//! the sibling hash of every branch taken. An inclusion proof authenticates
//! `(key, ordinal, value)`; an exclusion proof authenticates the leaf the
//! target's bits lead to together with the fact that its key differs from
//! the target.

use codec::{Decode, Encode};
use digest::{consts::U32, Digest};
use scale_info::TypeInfo;

use crate::{
    hash::{branch_node_hash, leaf_node_hash},
    index,
    layout::{
        check_regions, LeafRecord, NodeKind, NodeRecord, LEAF_RECORD_SIZE, NODE_RECORD_SIZE,
        NO_REF,
    },
    trie::bit_at,
    Error, Hash, Result, Vec,
};

#[cfg(test)]
#[path = "trie_proof_tests.rs"]
mod tests;

/// Read-only view over a chunk's `leaf_table` / `node_store` regions.
pub struct ChunkView<'a> {
    leaf_table: &'a [u8],
    node_store: &'a [u8],
    capacity: u32,
}

impl<'a> ChunkView<'a> {
    pub fn new(leaf_table: &'a [u8], node_store: &'a [u8]) -> Result<Self> {
        let capacity = check_regions(leaf_table.len(), node_store.len())?;

        Ok(ChunkView {
            leaf_table,
            node_store,
            capacity,
        })
    }

    /// Chunk leaf capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Decode the node record at ref `r`.
    pub fn node(&self, r: u32) -> Result<NodeRecord> {
        let node_count = (self.node_store.len() / NODE_RECORD_SIZE) as u32;

        if r == NO_REF || r >= node_count {
            return Err(Error::MissingNode(r as u64));
        }

        let at = r as usize * NODE_RECORD_SIZE;
        NodeRecord::decode(&self.node_store[at..at + NODE_RECORD_SIZE])
    }

    /// Decode the leaf record at `ordinal`.
    pub fn leaf(&self, ordinal: u32) -> Result<LeafRecord> {
        if ordinal >= self.capacity {
            return Err(Error::InvalidLeafOrdinal(ordinal));
        }

        let at = ordinal as usize * LEAF_RECORD_SIZE;
        LeafRecord::decode(&self.leaf_table[at..at + LEAF_RECORD_SIZE])
    }
}

/// One branch step of a trie proof, ordered root to leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct TrieStep {
    /// True if the proven path descends into the right subtree here.
    pub right: bool,
    /// Crit-bit of the branch, MSB-first.
    pub bit: u8,
    /// Hash of the subtree the path does not descend into.
    pub sibling: Hash,
}

/// Proof that a key is present in a chunk, binding `(key, ordinal, value)`
/// to the chunk root hash.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct KeyInclusionProof {
    pub key: u64,
    pub leaf_ordinal: u32,
    pub value: [u8; 32],
    pub steps: Vec<TrieStep>,
}

impl KeyInclusionProof {
    /// Verify the proof against `root_hash`. On success return the
    /// authenticated leaf ordinal and value.
    pub fn verify<D: Digest<OutputSize = U32>>(&self, root_hash: &Hash) -> Result<(u32, [u8; 32])> {
        let root = fold_steps::<D>(self.key, self.leaf_ordinal, &self.value, &self.steps);

        if root == *root_hash {
            Ok((self.leaf_ordinal, self.value))
        } else {
            Err(Error::VerifyInclusionFailed)
        }
    }
}

/// Proof that `target` is absent from a chunk: the leaf its bits lead to
/// holds a different key.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct KeyExclusionProof {
    /// The absent key being proven.
    pub target: u64,
    /// The key actually encountered at the end of the descent.
    pub key: u64,
    pub leaf_ordinal: u32,
    pub value: [u8; 32],
    pub steps: Vec<TrieStep>,
}

impl KeyExclusionProof {
    /// Verify the proof against `root_hash`.
    ///
    /// Checks that the encountered leaf reconstructs the root, that its key
    /// differs from the target, and that every recorded direction is the one
    /// the target's own bits select.
    pub fn verify<D: Digest<OutputSize = U32>>(&self, root_hash: &Hash) -> Result<()> {
        if self.key == self.target {
            return Err(Error::KeyPresent(self.target));
        }

        for step in &self.steps {
            if step.right != (bit_at(self.target, step.bit) == 1) {
                return Err(Error::VerifyInclusionFailed);
            }
        }

        let root = fold_steps::<D>(self.key, self.leaf_ordinal, &self.value, &self.steps);

        if root == *root_hash {
            Ok(())
        } else {
            Err(Error::VerifyInclusionFailed)
        }
    }
}

/// Recompute the chunk root from a leaf and its root-to-leaf steps.
fn fold_steps<D: Digest<OutputSize = U32>>(
    key: u64,
    ordinal: u32,
    value: &[u8; 32],
    steps: &[TrieStep],
) -> Hash {
    let mut hash = leaf_node_hash::<D>(key, ordinal, value);

    for step in steps.iter().rev() {
        hash = if step.right {
            branch_node_hash::<D>(step.bit, &step.sibling, &hash)
        } else {
            branch_node_hash::<D>(step.bit, &hash, &step.sibling)
        };
    }

    hash
}

/// Descend from `root` following `target`'s bits, recording one step per
/// branch. Return the leaf record reached.
fn descend(view: &ChunkView<'_>, root: u32, target: u64) -> Result<(NodeRecord, Vec<TrieStep>)> {
    if root == NO_REF {
        return Err(Error::EmptyTrie);
    }

    let mut r = root;
    let mut steps = Vec::new();
    let mut last_bit: i16 = -1;

    loop {
        let record = view.node(r)?;

        match record.kind {
            NodeKind::Leaf => return Ok((record, steps)),
            NodeKind::Branch => {
                // bits strictly increase towards the leaves; anything else
                // is a corrupt store and would loop
                if i16::from(record.bit) <= last_bit {
                    return Err(Error::InvalidBranchBit(record.bit));
                }
                last_bit = i16::from(record.bit);

                if r == 0 || record.right_span > r - 1 {
                    return Err(Error::InvalidRightSpan(record.right_span));
                }

                let right = r - 1;
                let left = r - 1 - record.right_span;

                if bit_at(target, record.bit) == 1 {
                    steps.push(TrieStep {
                        right: true,
                        bit: record.bit,
                        sibling: view.node(left)?.hash,
                    });
                    r = right;
                } else {
                    steps.push(TrieStep {
                        right: false,
                        bit: record.bit,
                        sibling: view.node(right)?.hash,
                    });
                    r = left;
                }
            }
        }
    }
}

/// Produce an inclusion proof for `key` in the chunk rooted at `root`.
///
/// Fails with [`Error::KeyNotFound`] if the descent ends at a leaf holding
/// a different key.
pub fn prove_inclusion(view: &ChunkView<'_>, root: u32, key: u64) -> Result<KeyInclusionProof> {
    let (record, steps) = descend(view, root, key)?;
    let leaf = view.leaf(record.leaf_ordinal)?;

    if leaf.key != key {
        return Err(Error::KeyNotFound(key));
    }

    Ok(KeyInclusionProof {
        key,
        leaf_ordinal: record.leaf_ordinal,
        value: leaf.value,
        steps,
    })
}

/// Produce an exclusion proof for `target` in the chunk rooted at `root`.
///
/// Fails with [`Error::KeyPresent`] if the descent ends at a leaf holding
/// exactly `target`.
pub fn prove_exclusion(view: &ChunkView<'_>, root: u32, target: u64) -> Result<KeyExclusionProof> {
    let (record, steps) = descend(view, root, target)?;
    let leaf = view.leaf(record.leaf_ordinal)?;

    if leaf.key == target {
        return Err(Error::KeyPresent(target));
    }

    Ok(KeyExclusionProof {
        target,
        key: leaf.key,
        leaf_ordinal: record.leaf_ordinal,
        value: leaf.value,
        steps,
    })
}

/// Return the leaf ordinal of `key` in the chunk rooted at `root`.
pub fn key_leaf_ordinal(view: &ChunkView<'_>, root: u32, key: u64) -> Result<u32> {
    let (record, _) = descend(view, root, key)?;
    let leaf = view.leaf(record.leaf_ordinal)?;

    if leaf.key != key {
        return Err(Error::KeyNotFound(key));
    }

    Ok(record.leaf_ordinal)
}

/// Return the global MMR node index of `key`'s leaf.
///
/// `first_leaf_mmr_index` is the MMR index of the chunk's first leaf; the
/// chunk-local ordinal is bridged through the global leaf numbering.
pub fn key_mmr_index(
    view: &ChunkView<'_>,
    root: u32,
    key: u64,
    first_leaf_mmr_index: u64,
) -> Result<u64> {
    let ordinal = key_leaf_ordinal(view, root, key)?;

    Ok(index::mmr_index(
        index::leaf_index(first_leaf_mmr_index) + ordinal as u64,
    ))
}

/// Return the key stored at `ordinal` by direct leaf table lookup, or 0 when
/// `ordinal >= next_leaf`.
///
/// Presence of the leaf is authenticated externally; this is the unverified
/// fast path for callers that already trust the region.
pub fn leaf_ordinal_key(view: &ChunkView<'_>, ordinal: u32, next_leaf: u32) -> Result<u64> {
    if ordinal >= next_leaf {
        return Ok(0);
    }

    Ok(view.leaf(ordinal)?.key)
}
