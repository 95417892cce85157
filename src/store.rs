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

//! Node storage adapter

use crate::{Error, Hash, Result, Vec};

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

/// The two-operation storage capability the log core consumes.
///
/// The core never names a backend; in-memory, file-backed and blob-backed
/// implementations all fit behind these two calls. Indices are assigned by
/// the store, strictly increasing and contiguous per log. A missing node is
/// fatal for proof generation and recoverable only by caller-level recovery.
pub trait Store {
    /// Return the node hash stored at `index`.
    fn get(&self, index: u64) -> Result<Hash>;

    /// Append `hash` as the next node. Return the index it was assigned.
    fn append(&mut self, hash: Hash) -> Result<u64>;
}

/// A grow-only in-memory [`Store`].
pub struct VecStore {
    /// MMR node hashes, leaves and interior nodes alike
    pub hashes: Vec<Hash>,
}

impl VecStore {
    pub fn new() -> Self {
        VecStore { hashes: Vec::new() }
    }

    /// Number of nodes in the store.
    pub fn len(&self) -> u64 {
        self.hashes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl Default for VecStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for VecStore {
    fn get(&self, index: u64) -> Result<Hash> {
        self.hashes
            .get(index as usize)
            .copied()
            .ok_or(Error::MissingNode(index))
    }

    fn append(&mut self, hash: Hash) -> Result<u64> {
        self.hashes.push(hash);
        Ok(self.hashes.len() as u64 - 1)
    }
}
