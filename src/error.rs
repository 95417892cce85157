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

//! Transparency log errors

use displaydoc::Display;

use crate::String;

/// All the ways the log core can fail.
///
/// Errors are surfaced, never retried and never swallowed. The only local
/// recovery in the crate is the "all-zero frontier block means empty"
/// convention in [`crate::layout::Frontier::decode`].
#[derive(Debug, Display, PartialEq, Eq, Clone)]
pub enum Error {
    /// MMR size {0} is not a complete size
    InvalidSize(u64),
    /// node index {0} exceeds last index {1}
    OutOfRange(u64, u64),
    /// expected {0} per-peak proofs, got {1}
    ProofLengthMismatch(usize, usize),
    /// accumulator peak index {0} exceeds peak count {1}
    AccumulatorOutOfRange(usize, usize),
    /// inclusion proof verification failed
    VerifyInclusionFailed,
    /// consistency proof verification failed
    VerifyConsistencyFailed,
    /// recomputed hash for node {0} differs from the stored one
    InvalidNodeHash(u64),
    /// key {0} is not greater than the last inserted key {1}
    OutOfOrderKey(u64, u64),
    /// key {0} was already inserted
    DuplicateKey(u64),
    /// leaf ordinal {0} is out of range
    InvalidLeafOrdinal(u32),
    /// branch crit-bit {0} is out of range
    InvalidBranchBit(u8),
    /// subtree size {0} violates the node record invariants
    InvalidSubtreeSize(u32),
    /// right span {0} violates the node record invariants
    InvalidRightSpan(u32),
    /// unknown node record kind {0}
    UnknownNodeKind(u8),
    /// key {0} is not in the chunk
    KeyNotFound(u64),
    /// key {0} is in the chunk
    KeyPresent(u64),
    /// chunk trie is empty
    EmptyTrie,
    /// value must be 32 bytes, got {0}
    BadValueSize(usize),
    /// hash must be 32 bytes, got {0}
    BadHashSize(usize),
    /// leaf table length {0} is not a whole number of 128-byte records
    LeafTableBadSize(usize),
    /// node store length {0} does not match the chunk leaf capacity
    NodeStoreBadSize(usize),
    /// frontier block length {0} is not the fixed frontier size
    FrontierBadSize(usize),
    /// frontier magic mismatch
    FrontierBadMagic,
    /// unsupported frontier version {0}
    FrontierBadVersion(u8),
    /// node {0} is missing from the store
    MissingNode(u64),
    /// storage error: `{0}`
    Storage(String),
}
