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

//! Byte layout unit tests

use hex_literal::hex;

use super::{
    leaf_capacity, leaf_table_size, node_store_size, Frame, Frontier, LeafRecord, NodeKind,
    NodeRecord, FRONTIER_SIZE, LEAF_RECORD_SIZE, MAX_FRAMES, NODE_RECORD_SIZE, NO_REF,
};
use crate::{Error, Hash};

#[test]
fn region_sizing_works() {
    assert_eq!(leaf_capacity(1), 1);
    assert_eq!(leaf_capacity(4), 8);
    assert_eq!(leaf_capacity(15), 16_384);

    assert_eq!(leaf_table_size(8), 8 * LEAF_RECORD_SIZE);
    assert_eq!(node_store_size(8), 15 * NODE_RECORD_SIZE);
    assert_eq!(node_store_size(1), NODE_RECORD_SIZE);
}

#[test]
fn node_record_roundtrip() {
    let hash = Hash::from(hex!(
        "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f"
    ));

    let leaf = NodeRecord::leaf(7, hash);
    let got = NodeRecord::decode(&leaf.encode()).unwrap();
    assert_eq!(leaf, got);
    assert_eq!(got.kind, NodeKind::Leaf);
    assert_eq!(got.subtree_size, 1);

    let branch = NodeRecord::branch(42, 3, 7, hash);
    let got = NodeRecord::decode(&branch.encode()).unwrap();
    assert_eq!(branch, got);
    assert_eq!(got.kind, NodeKind::Branch);
}

#[test]
fn node_record_layout_is_fixed() {
    let hash = Hash::from([0xaa; 32]);
    let buf = NodeRecord::branch(63, 1, 3, hash).encode();

    assert_eq!(buf[0], 0x01);
    assert_eq!(buf[1], 63);
    assert_eq!(&buf[4..8], &1u32.to_be_bytes());
    assert_eq!(&buf[8..12], &3u32.to_be_bytes());
    assert_eq!(&buf[12..16], &0u32.to_be_bytes());
    assert_eq!(&buf[16..32], &[0u8; 16]);
    assert_eq!(&buf[32..64], &[0xaa; 32]);
}

#[test]
fn node_record_decode_rejects_bad_records() {
    let hash = Hash::from([0u8; 32]);

    assert_eq!(
        NodeRecord::decode(&[0u8; 10]).err().unwrap(),
        Error::NodeStoreBadSize(10)
    );

    let mut buf = NodeRecord::leaf(0, hash).encode();
    buf[0] = 0x02;
    assert_eq!(
        NodeRecord::decode(&buf).err().unwrap(),
        Error::UnknownNodeKind(0x02)
    );

    // leaf with a right span
    let mut buf = NodeRecord::leaf(0, hash).encode();
    buf[4..8].copy_from_slice(&1u32.to_be_bytes());
    assert_eq!(
        NodeRecord::decode(&buf).err().unwrap(),
        Error::InvalidRightSpan(1)
    );

    // leaf with a subtree
    let mut buf = NodeRecord::leaf(0, hash).encode();
    buf[8..12].copy_from_slice(&2u32.to_be_bytes());
    assert_eq!(
        NodeRecord::decode(&buf).err().unwrap(),
        Error::InvalidSubtreeSize(2)
    );

    // branch bit out of range
    let mut buf = NodeRecord::branch(0, 1, 3, hash).encode();
    buf[1] = 64;
    assert_eq!(
        NodeRecord::decode(&buf).err().unwrap(),
        Error::InvalidBranchBit(64)
    );

    // branch without a right subtree
    let mut buf = NodeRecord::branch(0, 1, 3, hash).encode();
    buf[4..8].copy_from_slice(&0u32.to_be_bytes());
    assert_eq!(
        NodeRecord::decode(&buf).err().unwrap(),
        Error::InvalidRightSpan(0)
    );

    // branch smaller than two children plus itself
    let mut buf = NodeRecord::branch(0, 1, 3, hash).encode();
    buf[8..12].copy_from_slice(&2u32.to_be_bytes());
    assert_eq!(
        NodeRecord::decode(&buf).err().unwrap(),
        Error::InvalidSubtreeSize(2)
    );
}

#[test]
fn leaf_record_roundtrip() {
    let mut rec = LeafRecord::new(0xdead_beef_cafe_f00d, [3; 32]);

    let got = LeafRecord::decode(&rec.encode()).unwrap();
    assert_eq!(rec, got);
    assert_eq!(got.extra1, [0; 24]);

    rec.extra1 = [1; 24];
    rec.extra2 = [2; 32];
    rec.extra3 = [3; 32];

    let got = LeafRecord::decode(&rec.encode()).unwrap();
    assert_eq!(rec, got);
}

#[test]
fn leaf_record_layout_is_fixed() {
    let rec = LeafRecord::new(0x0102_0304_0506_0708, [9; 32]);
    let buf = rec.encode();

    assert_eq!(&buf[0..8], &hex!("0102030405060708"));
    assert_eq!(&buf[8..40], &[9; 32]);
    assert_eq!(&buf[40..128], &[0u8; 88][..]);

    assert_eq!(
        LeafRecord::decode(&buf[..64]).err().unwrap(),
        Error::LeafTableBadSize(64)
    );
}

#[test]
fn frontier_roundtrip() {
    let mut f = Frontier::empty();
    f.last_key = 77;
    f.pending = 12;
    f.next_ref = 13;
    f.depth = 2;
    f.next_leaf = 7;
    f.frames[0] = Frame { bit: 3, left: 4 };
    f.frames[1] = Frame { bit: 59, left: 11 };

    let buf = f.encode();

    assert_eq!(buf.len(), FRONTIER_SIZE);
    assert_eq!(&buf[0..4], b"FNT1");
    assert_eq!(buf[4], 1);
    assert_eq!(buf[5], 64);

    assert_eq!(Frontier::decode(&buf).unwrap(), f);
}

#[test]
fn zeroed_frontier_is_empty() {
    let f = Frontier::decode(&[0u8; FRONTIER_SIZE]).unwrap();

    assert_eq!(f, Frontier::empty());
    assert_eq!(f.pending, NO_REF);
    assert_eq!(f.next_leaf, 0);
    assert_eq!(f.depth, 0);
}

#[test]
fn frontier_decode_rejects_bad_blocks() {
    assert_eq!(
        Frontier::decode(&[0u8; 100]).err().unwrap(),
        Error::FrontierBadSize(100)
    );

    let mut buf = Frontier::empty().encode();
    buf[0] = b'X';
    assert_eq!(
        Frontier::decode(&buf).err().unwrap(),
        Error::FrontierBadMagic
    );

    let mut buf = Frontier::empty().encode();
    buf[4] = 2;
    assert_eq!(
        Frontier::decode(&buf).err().unwrap(),
        Error::FrontierBadVersion(2)
    );

    let mut buf = Frontier::empty().encode();
    buf[24] = MAX_FRAMES as u8 + 1;
    assert_eq!(
        Frontier::decode(&buf).err().unwrap(),
        Error::FrontierBadSize(MAX_FRAMES + 1)
    );

    // a live frame with an out-of-range bit
    let mut f = Frontier::empty();
    f.depth = 1;
    f.frames[0] = Frame { bit: 64, left: 0 };
    assert_eq!(
        Frontier::decode(&f.encode()).err().unwrap(),
        Error::InvalidBranchBit(64)
    );
}
