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

use digest::Digest;
use rug::Integer;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Name of the hidden attribute carrying the holder's master secret.
pub const MASTER_SECRET_KEY: &str = "masterSecret";
/// Key of the delta commitment in a predicate proof's `t` map.
pub const DELTA: &str = "DELTA";
/// Number of squares in a delta decomposition.
pub const ITERATION: usize = 4;

/// Bit lengths of the CL credential protocol.
pub trait CLCiphersuite: Eq + 'static {
    type HashAlg: Digest;

    const LARGE_PRIME: u32; // NOTE: length of p and q, n is 2 * LARGE_PRIME bits
    const LARGE_MASTER_SECRET: u32;
    const LARGE_NONCE: u32;
    const LARGE_VPRIME: u32; // NOTE: blinding factor v' of the master secret commitment
    const LARGE_VPRIME_TILDE: u32;
    const LARGE_VPRIME_PRIME: u32; // NOTE: issuer-side v'' (LARGE_VPRIME + LARGE_VPRIME_PRIME covers a signature v)
    const LARGE_E_START: u32; // NOTE: e lies in [2^LARGE_E_START, 2^LARGE_E_START + 2^LARGE_E_END_RANGE]
    const LARGE_E_END_RANGE: u32;
    const LARGE_M_TILDE: u32;
    const LARGE_E_TILDE: u32;
    const LARGE_V_TILDE: u32;
    const LARGE_MVECT: u32;
    const LARGE_UTILDE: u32;
    const LARGE_RTILDE: u32;
    const LARGE_ALPHATILDE: u32;

    /// `2^LARGE_E_START`
    fn e_start_value() -> Integer {
        Integer::from(1) << Self::LARGE_E_START
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CL2048Sha256 {}

impl CLCiphersuite for CL2048Sha256 {
    type HashAlg = Sha256;

    const LARGE_PRIME: u32 = 1024;
    const LARGE_MASTER_SECRET: u32 = 256;
    const LARGE_NONCE: u32 = 80;
    const LARGE_VPRIME: u32 = 2 * Self::LARGE_PRIME + Self::LARGE_NONCE;
    const LARGE_VPRIME_TILDE: u32 = 673;
    const LARGE_VPRIME_PRIME: u32 = 2724;
    const LARGE_E_START: u32 = 596;
    const LARGE_E_END_RANGE: u32 = 119;
    const LARGE_M_TILDE: u32 = 593;
    const LARGE_E_TILDE: u32 = 456;
    const LARGE_V_TILDE: u32 = 3060;
    const LARGE_MVECT: u32 = 592;
    const LARGE_UTILDE: u32 = 592;
    const LARGE_RTILDE: u32 = 672;
    const LARGE_ALPHATILDE: u32 = 2787;
}
