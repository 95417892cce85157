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

//! Index arithmetic over the postorder node numbering.
//!
//! The MMR is the postorder flattening of an imaginary complete binary tree;
//! no tree is ever materialized. Node indices are 0-based, the equivalent
//! 1-based value `index + 1` is called a position. Heights of successive
//! positions follow the pattern `0, 0, 1, 0, 0, 1, 2, 0, ...`.
//!
//! All functions are pure, total and deterministic. An invalid (incomplete)
//! MMR size is signalled by an empty peak list rather than an error.

use crate::Vec;

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;

/// 64-bit all being binary ones: 0b1111111...1
const ALL_ONES: u64 = u64::MAX;

/// Return the peak bitmap of an MMR with `i` nodes together with the height
/// at which node `i` itself will be added.
///
/// The bitmap has bit `k` set iff the MMR has a peak at height `k`. It is
/// derived by greedily subtracting the largest perfect subtree (of size
/// `2^h - 1`) that still fits; whatever is left after a subtraction step is
/// the index of node `i` relative to the next, smaller subtree.
///
/// For example `peak_map_height(4)` returns `(0b11, 0)`: the MMR with four
/// nodes has peaks at heights 1 and 0, and node 4 is added at height 0.
pub fn peak_map_height(i: u64) -> (u64, u64) {
    if i == 0 {
        return (0, 0);
    }

    let mut i = i;
    let mut peak_size = ALL_ONES >> i.leading_zeros();
    let mut peak_map = 0;

    while peak_size != 0 {
        peak_map <<= 1;
        if i >= peak_size {
            i -= peak_size;
            peak_map |= 1;
        }
        peak_size >>= 1;
    }

    (peak_map, i)
}

/// Return the height of the node at index `i`.
pub fn index_height(i: u64) -> u64 {
    peak_map_height(i).1
}

/// Return the indices of all peaks of the MMR whose last node is `last_index`.
///
/// Peaks are listed in descending height order, i.e. the leftmost (highest)
/// peak first. If `last_index + 1` is not a complete MMR size, the result is
/// empty.
pub fn peaks(last_index: u64) -> Vec<u64> {
    let size = match last_index.checked_add(1) {
        Some(s) => s,
        None => return Vec::new(),
    };

    let mut peak_size = ALL_ONES >> size.leading_zeros();
    let mut nodes_left = size;
    let mut top = 0;
    let mut peaks = Vec::new();

    while peak_size != 0 {
        if nodes_left >= peak_size {
            top += peak_size;
            peaks.push(top - 1);
            nodes_left -= peak_size;
        }
        peak_size >>= 1;
    }

    // a left-over node means the size is not a complete one
    if nodes_left > 0 {
        return Vec::new();
    }

    peaks
}

/// Return the peak bitmap for an MMR of `size` nodes.
///
/// Bit `k` is set iff there is a peak at height `k`. The bitmap read as an
/// integer equals [`leaf_count`]`(size)`.
pub fn peaks_bitmap(size: u64) -> u64 {
    peak_map_height(size).0
}

/// Return the number of leaves in an MMR of `size` nodes.
///
/// When `size` is not a complete MMR size, this returns the leaf count of
/// the **largest complete size `<= size`**. Callers holding a raw node index
/// must go through [`leaf_index`] instead, which first rounds the index up
/// to its first complete size.
pub fn leaf_count(size: u64) -> u64 {
    peaks_bitmap(size)
}

/// Return the node index of leaf `e`.
///
/// Equivalent to `e + spur_sum(e)`: the leaf's own ordinal plus all the
/// interior nodes emitted before it.
pub fn mmr_index(e: u64) -> u64 {
    2 * e - e.count_ones() as u64
}

/// Return the spur height of leaf `e`: the number of interior nodes the
/// builder back-fills immediately after appending it.
pub fn spur_height(e: u64) -> u64 {
    (e + 1).trailing_zeros() as u64
}

/// Return the spur sum of leaf `e`: the total number of interior nodes
/// preceding its node index, i.e. `mmr_index(e) - e`.
pub fn spur_sum(e: u64) -> u64 {
    e - e.count_ones() as u64
}

/// Return the largest complete MMR size at or below `node_count`.
///
/// After a torn append the store may hold interior back-fill for a state
/// that was never completed; the size returned here is the authoritative
/// one to resume from.
pub fn complete_size(node_count: u64) -> u64 {
    let mut size = node_count;

    // at most one interior run separates two complete sizes
    while index_height(size) > 0 {
        size -= 1;
    }

    size
}

/// Return the smallest complete MMR size containing the node at index `i`.
pub fn first_mmr_size(i: u64) -> u64 {
    let mut i = i;
    let mut height = index_height(i);

    loop {
        let next = index_height(i + 1);
        if next > height {
            i += 1;
            height = next;
        } else {
            return i + 1;
        }
    }
}

/// Return the leaf index of the last leaf at or below node `i`.
///
/// For a leaf node this is the inverse of [`mmr_index`].
pub fn leaf_index(i: u64) -> u64 {
    leaf_count(first_mmr_size(i)) - 1
}

/// Return the accumulator peak index committing a proven node.
///
/// `d` is the length of the inclusion proof **plus** the height of the proven
/// node, so interior nodes select the same peak as the leaves below them.
/// The result indexes the descending-height peak array of the MMR whose leaf
/// count is `leaf_count`.
pub fn peak_index(leaf_count: u64, d: u64) -> u64 {
    let mask = if d >= 63 {
        ALL_ONES
    } else {
        (1 << (d + 1)) - 1
    };

    (leaf_count.count_ones() - (leaf_count & mask).count_ones()) as u64
}
