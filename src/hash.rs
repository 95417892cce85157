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

//! Hash type and the position-committed preimages

use core::{
    cmp::min,
    convert::{AsRef, TryInto},
    fmt::{self, Write},
};

use codec::{Decode, Encode};
use digest::{consts::U32, Digest};
use scale_info::TypeInfo;

use crate::{layout, Error, Result, String};

#[cfg(test)]
#[path = "hash_tests.rs"]
mod tests;

macro_rules! to_hex {
    ($bytes:expr) => {{
        let mut s = String::with_capacity(64);

        for b in $bytes {
            write!(&mut s, "{:02x}", b)?
        }

        Ok(s)
    }};
}

/// A 32-byte node hash.
///
/// Leaf hashes are opaque to the core; the caller supplies them already
/// hashed. Interior hashes are always produced through the preimage helpers
/// below, which commit the node position (MMR) or the crit-bit (trie) into
/// the digest input.
#[derive(Copy, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
pub struct Hash([u8; 32]);

/// A hash consisting of all zeros.
pub const ZERO_HASH: Hash = Hash([0; 32]);

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const DISP_SIZE: usize = 12;

        let hex = to_hex!(&self.0)?;
        write!(f, "{}", &hex[..DISP_SIZE])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash {
    fn from(h: [u8; 32]) -> Hash {
        Hash(h)
    }
}

impl Default for Hash {
    fn default() -> Hash {
        ZERO_HASH
    }
}

impl Hash {
    /// 32 byte hash
    pub const LEN: usize = 32;

    /// Return a hash initialized from `v`.
    ///
    /// At most, up to [`Hash::LEN`] bytes will be copied from `v`. If `v` has less
    /// than [`Hash::LEN`] bytes, the hash will be padded with 0's from left to right.
    pub fn from_vec(v: &[u8]) -> Hash {
        let mut h = [0; Hash::LEN];
        let sz = min(v.len(), Hash::LEN);
        h[..sz].copy_from_slice(&v[..sz]);
        Hash(h)
    }

    /// Return a hash initialized from `v`, which must be exactly [`Hash::LEN`] bytes.
    pub fn from_slice(v: &[u8]) -> Result<Hash> {
        let h: [u8; 32] = v.try_into().map_err(|_| Error::BadHashSize(v.len()))?;
        Ok(Hash(h))
    }

    /// Hash `data` with `D` and return the digest.
    pub fn digest<D: Digest<OutputSize = U32>>(data: &[u8]) -> Hash {
        let mut h = D::new();
        h.update(data);
        Hash(h.finalize().into())
    }

    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Return the position-committed interior hash `H(pos || left || right)`.
///
/// `pos` is the 1-based postorder position of the parent node, encoded as
/// 8 big-endian bytes. Committing the position pins every interior node to
/// its place in the log, which is what lets a single inclusion proof algebra
/// serve both element and log-extension proofs.
pub fn interior_hash<D: Digest<OutputSize = U32>>(pos: u64, left: &Hash, right: &Hash) -> Hash {
    let mut h = D::new();
    h.update(pos.to_be_bytes());
    h.update(left);
    h.update(right);
    Hash(h.finalize().into())
}

/// Return the trie leaf hash `H(0x00 || key || ordinal || value)`.
///
/// `key` is 8 big-endian bytes, `ordinal` 4 big-endian bytes. The leaf extra
/// fields are never part of the preimage.
pub fn leaf_node_hash<D: Digest<OutputSize = U32>>(
    key: u64,
    ordinal: u32,
    value: &[u8; 32],
) -> Hash {
    let mut h = D::new();
    h.update([layout::KIND_LEAF]);
    h.update(key.to_be_bytes());
    h.update(ordinal.to_be_bytes());
    h.update(value);
    Hash(h.finalize().into())
}

/// Return the trie branch hash `H(0x01 || bit || left || right)`.
pub fn branch_node_hash<D: Digest<OutputSize = U32>>(bit: u8, left: &Hash, right: &Hash) -> Hash {
    let mut h = D::new();
    h.update([layout::KIND_BRANCH]);
    h.update([bit]);
    h.update(left);
    h.update(right);
    Hash(h.finalize().into())
}
