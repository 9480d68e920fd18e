// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::utils::{ordered::OrderedMap, util::IntegerExt};
use digest::Digest;
use rug::{integer::Order, Integer};
use std::marker::PhantomData;

/// Fiat-Shamir transcript.
///
/// Every appended integer contributes its minimal big-endian magnitude with no
/// separator, so the order of appends is part of the protocol.
pub struct ChallengeBuilder<H: Digest> {
    data: Vec<u8>,
    _hash: PhantomData<H>,
}

impl<H: Digest> Default for ChallengeBuilder<H> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            _hash: PhantomData,
        }
    }
}

impl<H: Digest> ChallengeBuilder<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn append(&mut self, value: &Integer) -> &mut Self {
        self.data.extend_from_slice(&value.to_transcript_bytes());
        self
    }

    pub fn append_all<'a, I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a Integer>,
    {
        for value in values {
            self.append(value);
        }
        self
    }

    /// Appends the values of `map` in insertion order. Keys are not hashed.
    pub fn append_map(&mut self, map: &OrderedMap<Integer>) -> &mut Self {
        self.append_all(map.values())
    }

    pub fn append_byte_list(&mut self, list: &[Vec<u8>]) -> &mut Self {
        for bytes in list {
            self.data.extend_from_slice(bytes);
        }
        self
    }

    /// Digest of everything appended so far. The transcript is cleared afterwards.
    pub fn build(&mut self) -> Vec<u8> {
        let digest = H::digest(&self.data).to_vec();
        self.data.clear();
        digest
    }

    /// [`build`](Self::build) read as a non-negative big-endian integer.
    pub fn build_with_hashing(&mut self) -> Integer {
        Integer::from_digits(self.build().as_slice(), Order::MsfBe)
    }
}
