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

//! Append-only crit-bit chunk trie builder.
//!
//! Keys are 64-bit identifiers inserted in strictly increasing order. The
//! builder maintains a right spine of open crit-bit frames; each insert
//! closes the frames whose bit lies below the new key's crit-bit, emitting
//! one postorder branch record per closed frame, then opens at most one new
//! frame. Node records are emitted in lock-step with the persistable
//! [`Frontier`], so a build can stop after any insert and resume later with
//! byte-identical results.

use core::marker::PhantomData;

use digest::{consts::U32, Digest};

use crate::{
    hash::{branch_node_hash, leaf_node_hash, ZERO_HASH},
    layout::{
        check_regions, Frame, Frontier, LeafRecord, NodeRecord, FRONTIER_SIZE, LEAF_RECORD_SIZE,
        MAX_FRAMES, NODE_RECORD_SIZE, NO_REF,
    },
    Error, Hash, Result,
};

#[cfg(test)]
#[path = "trie_tests.rs"]
mod tests;

/// Return bit `i` of `key`, MSB-first: bit 0 is the most significant bit.
/// `i` must be in `0..=63`.
pub fn bit_at(key: u64, i: u8) -> u8 {
    debug_assert!(i <= 63);

    ((key >> (63 - i)) & 1) as u8
}

/// Return the crit-bit of two distinct keys: the MSB-first index of the
/// first bit at which they disagree.
pub fn crit_bit(a: u64, b: u64) -> u8 {
    debug_assert_ne!(a, b);

    (a ^ b).leading_zeros() as u8
}

/// Append-only builder for a chunk trie over borrowed byte regions.
///
/// `leaf_table` holds one 128-byte [`LeafRecord`] per leaf, `node_store`
/// one 64-byte [`NodeRecord`] per trie node in postorder. The regions are
/// pre-allocated by the caller at the sizes given by
/// [`crate::layout::leaf_table_size`] and [`crate::layout::node_store_size`].
///
/// Inserts must be serialized by the caller; there is no internal locking.
pub struct TrieBuilder<'a, D>
where
    D: Digest<OutputSize = U32>,
{
    leaf_table: &'a mut [u8],
    node_store: &'a mut [u8],
    capacity: u32,
    state: Frontier,
    _marker: PhantomData<D>,
}

impl<'a, D> TrieBuilder<'a, D>
where
    D: Digest<OutputSize = U32>,
{
    /// Return a builder for an empty chunk.
    pub fn new(leaf_table: &'a mut [u8], node_store: &'a mut [u8]) -> Result<Self> {
        let capacity = check_regions(leaf_table.len(), node_store.len())?;

        Ok(TrieBuilder {
            leaf_table,
            node_store,
            capacity,
            state: Frontier::empty(),
            _marker: PhantomData,
        })
    }

    /// Resume a builder from a saved frontier block.
    ///
    /// An all-zero `frontier` resumes as an empty chunk. The regions must be
    /// the same ones (or byte-identical copies of the ones) the frontier was
    /// saved against.
    pub fn from_frontier(
        leaf_table: &'a mut [u8],
        node_store: &'a mut [u8],
        frontier: &[u8],
    ) -> Result<Self> {
        let capacity = check_regions(leaf_table.len(), node_store.len())?;
        let state = Frontier::decode(frontier)?;

        if state.next_leaf > capacity {
            return Err(Error::InvalidLeafOrdinal(state.next_leaf));
        }
        if state.next_ref as usize * NODE_RECORD_SIZE > node_store.len() {
            return Err(Error::NodeStoreBadSize(node_store.len()));
        }

        Ok(TrieBuilder {
            leaf_table,
            node_store,
            capacity,
            state,
            _marker: PhantomData,
        })
    }

    /// Insert `key` with the 32-byte `value`, returning the assigned leaf
    /// ordinal.
    ///
    /// Keys must be strictly increasing: an equal key fails with
    /// [`Error::DuplicateKey`], a smaller one with [`Error::OutOfOrderKey`].
    /// The leaf extra fields are zeroed; use [`Self::set_leaf_extra`] to
    /// fill them afterwards.
    pub fn insert_monotone(&mut self, key: u64, value: &[u8]) -> Result<u32> {
        if value.len() != 32 {
            return Err(Error::BadValueSize(value.len()));
        }
        if self.state.next_leaf >= self.capacity {
            return Err(Error::InvalidLeafOrdinal(self.state.next_leaf));
        }
        if self.state.next_leaf > 0 {
            if key < self.state.last_key {
                return Err(Error::OutOfOrderKey(key, self.state.last_key));
            }
            if key == self.state.last_key {
                return Err(Error::DuplicateKey(key));
            }
        }

        let ordinal = self.state.next_leaf;

        let mut value32 = [0u8; 32];
        value32.copy_from_slice(value);

        let record = LeafRecord::new(key, value32);
        let at = ordinal as usize * LEAF_RECORD_SIZE;
        self.leaf_table[at..at + LEAF_RECORD_SIZE].copy_from_slice(&record.encode());

        let leaf_hash = leaf_node_hash::<D>(key, ordinal, &value32);

        if ordinal > 0 {
            let crit = crit_bit(self.state.last_key, key);

            // close every frame splitting below the new crit-bit
            while self.state.depth > 0
                && self.state.frames[self.state.depth as usize - 1].bit > crit
            {
                self.close_top_frame()?;
            }

            // open a frame unless one at this crit-bit is already on top,
            // in which case the new leaf becomes its right subtree
            let depth = self.state.depth as usize;
            if depth == 0 || self.state.frames[depth - 1].bit < crit {
                if depth == MAX_FRAMES {
                    return Err(Error::InvalidBranchBit(crit));
                }

                self.state.frames[depth] = Frame {
                    bit: crit,
                    left: self.state.pending,
                };
                self.state.depth += 1;
            }
        }

        self.emit(NodeRecord::leaf(ordinal, leaf_hash))?;

        self.state.last_key = key;
        self.state.next_leaf = ordinal + 1;

        Ok(ordinal)
    }

    /// Close all open frames and return the root ref and root hash.
    ///
    /// An empty chunk finalizes to [`NO_REF`] and the zero hash.
    pub fn finalize(mut self) -> Result<(u32, Hash)> {
        if self.state.next_leaf == 0 {
            return Ok((NO_REF, ZERO_HASH));
        }

        while self.state.depth > 0 {
            self.close_top_frame()?;
        }

        let root = self.state.pending;
        let hash = self.node(root)?.hash;

        Ok((root, hash))
    }

    /// Serialize the frontier into `dst`, which must be exactly
    /// [`FRONTIER_SIZE`] bytes.
    ///
    /// The saved state resumes via [`Self::from_frontier`]; any interleaving
    /// of saves and resumes produces the same records and root hash as one
    /// uninterrupted build over the same keys.
    pub fn save_frontier(&self, dst: &mut [u8]) -> Result<()> {
        if dst.len() != FRONTIER_SIZE {
            return Err(Error::FrontierBadSize(dst.len()));
        }

        dst.copy_from_slice(&self.state.encode());

        Ok(())
    }

    /// Write the three uncommitted extra fields of the leaf at `ordinal`.
    ///
    /// Extras are auxiliary storage for the enclosing chunk layer; they are
    /// never part of the trie hash.
    pub fn set_leaf_extra(
        &mut self,
        ordinal: u32,
        extra1: &[u8; 24],
        extra2: &[u8; 32],
        extra3: &[u8; 32],
    ) -> Result<()> {
        if ordinal >= self.state.next_leaf {
            return Err(Error::InvalidLeafOrdinal(ordinal));
        }

        let at = ordinal as usize * LEAF_RECORD_SIZE;
        self.leaf_table[at + 40..at + 64].copy_from_slice(extra1);
        self.leaf_table[at + 64..at + 96].copy_from_slice(extra2);
        self.leaf_table[at + 96..at + 128].copy_from_slice(extra3);

        Ok(())
    }

    /// Number of accepted insertions so far.
    pub fn leaf_count(&self) -> u32 {
        self.state.next_leaf
    }

    /// Chunk leaf capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Last accepted key; meaningful once [`Self::leaf_count`] is non-zero.
    pub fn last_key(&self) -> u64 {
        self.state.last_key
    }

    /// Pop the top frame and emit the branch joining its left subtree with
    /// the pending right subtree.
    fn close_top_frame(&mut self) -> Result<()> {
        let frame = self.state.frames[self.state.depth as usize - 1];
        self.state.depth -= 1;

        let right = self.state.pending;
        let left = frame.left;

        if left >= right || right == NO_REF {
            return Err(Error::InvalidRightSpan(right));
        }

        let left_rec = self.node(left)?;
        let right_rec = self.node(right)?;

        let right_span = right_rec.subtree_size;
        let subtree_size = left_rec.subtree_size + right_span + 1;
        let hash = branch_node_hash::<D>(frame.bit, &left_rec.hash, &right_rec.hash);

        // ref geometry the record layout relies on
        let r = self.state.next_ref;
        if right != r - 1 || right_span > r - 1 || left != r - 1 - right_span {
            return Err(Error::InvalidRightSpan(right_span));
        }

        self.emit(NodeRecord::branch(frame.bit, right_span, subtree_size, hash))
    }

    /// Write `record` at the next node store ref and make it pending.
    fn emit(&mut self, record: NodeRecord) -> Result<()> {
        let r = self.state.next_ref;
        let at = r as usize * NODE_RECORD_SIZE;

        if at + NODE_RECORD_SIZE > self.node_store.len() {
            return Err(Error::NodeStoreBadSize(self.node_store.len()));
        }

        self.node_store[at..at + NODE_RECORD_SIZE].copy_from_slice(&record.encode());

        self.state.pending = r;
        self.state.next_ref = r + 1;

        Ok(())
    }

    /// Read back the node record at `r`.
    fn node(&self, r: u32) -> Result<NodeRecord> {
        if r == NO_REF || r >= self.state.next_ref {
            return Err(Error::MissingNode(r as u64));
        }

        let at = r as usize * NODE_RECORD_SIZE;
        NodeRecord::decode(&self.node_store[at..at + NODE_RECORD_SIZE])
    }
}
