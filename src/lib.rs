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

//! Append-only transparency log core.
//!
//! Two authenticated data structures make up the crate:
//!
//! - A Merkle-Mountain-Range (MMR) over 64-bit node indices, with per-node
//!   inclusion proofs and log-extension (consistency) proofs. Interior node
//!   hashes commit their 1-based postorder position, so a single inclusion
//!   proof algebra serves both proof kinds.
//! - A crit-bit chunk trie over monotonically increasing 64-bit keys, built
//!   append-only into caller-provided byte regions, with a persistable
//!   frontier for resumable construction and key-indexed inclusion and
//!   exclusion proofs.
//!
//! The MMR consumes a two-operation [`Store`] adapter; the trie borrows
//! pre-allocated `leaf_table` and `node_store` regions. Hashing is generic
//! over any [`digest::Digest`] with a 32-byte output. SHA-256 is the
//! canonical choice and re-exported as [`Sha256`].

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
include!("std.rs");

#[cfg(not(feature = "std"))]
include!("no_std.rs");

pub use consistency::{
    consistent_roots, index_consistency_proof, verify_consistency, ConsistencyProof,
};
pub use error::Error;
pub use hash::{branch_node_hash, interior_hash, leaf_node_hash, Hash, ZERO_HASH};
pub use mmr::MerkleMountainRange;
pub use proof::{
    included_root, inclusion_proof, inclusion_proof_path, peak_hashes, verify_inclusion,
    InclusionProof,
};
pub use sha2::Sha256;
pub use store::{Store, VecStore};
pub use trie::{bit_at, crit_bit, TrieBuilder};
pub use trie_proof::{
    key_leaf_ordinal, key_mmr_index, leaf_ordinal_key, prove_exclusion, prove_inclusion,
    ChunkView, KeyExclusionProof, KeyInclusionProof, TrieStep,
};

mod consistency;
mod error;
mod hash;
pub mod index;
pub mod layout;
mod mmr;
mod proof;
mod store;
mod trie;
mod trie_proof;

/// Crate wide result type
pub type Result<T> = core::result::Result<T, Error>;
