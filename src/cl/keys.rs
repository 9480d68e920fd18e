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

use crate::{
    cl::{challenge::ChallengeBuilder, ciphersuites::CLCiphersuite, commitment::commitment},
    errors::Error,
    utils::{
        ordered::OrderedMap,
        util::{decimal, IntegerExt},
    },
};
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Issuer CL public key. `r` holds one base per attribute plus `masterSecret`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialPrimaryPublicKey {
    #[serde(with = "decimal")]
    pub n: Integer,
    #[serde(with = "decimal")]
    pub z: Integer,
    #[serde(with = "decimal")]
    pub s: Integer,
    pub r: OrderedMap<Integer>,
    #[serde(with = "decimal")]
    pub rctxt: Integer,
}

impl CredentialPrimaryPublicKey {
    pub fn new(
        n: Integer,
        z: Integer,
        s: Integer,
        r: OrderedMap<Integer>,
        rctxt: Integer,
    ) -> Self {
        Self { n, z, s, r, rctxt }
    }

    /// Base for `attr`, or [`Error::Null`] naming `group`.
    pub fn r_value(&self, attr: &str, group: &str) -> Result<&Integer, Error> {
        self.r.get(attr).ok_or_else(|| Error::null(attr, group))
    }
}

/// Proof that every base of a public key lies in the group generated by `s`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCorrectnessProof {
    #[serde(with = "decimal")]
    pub c: Integer,
    #[serde(with = "decimal")]
    pub xz_cap: Integer,
    #[serde(with = "decimal::map")]
    pub xr_cap: BTreeMap<String, Integer>,
}

/// Checks a [`KeyCorrectnessProof`] against `pk`.
///
/// # Description
/// Rebuilds `zCap = (z^-1)^c * s^xzCap` and, for every base of `r` in key order,
/// `rCap = (r^-1)^c * s^xrCap`, then recomputes `c' = H(z, r, zCap, rCap)`.
///
/// # Output
/// `Ok(c' == c)`, or an error when a base has no inverse or `xrCap` lacks an entry.
pub fn verify_key_correctness<CS: CLCiphersuite>(
    pk: &CredentialPrimaryPublicKey,
    proof: &KeyCorrectnessProof,
) -> Result<bool, Error> {
    let n = &pk.n;

    let z_inverse = pk.z.invert_checked(n, "z")?;
    let z_cap = commitment(&z_inverse, &proof.c, &pk.s, &proof.xz_cap, n)?;

    let mut r_cap = Vec::with_capacity(pk.r.len());
    for (attr, r) in pk.r.iter() {
        let r_inverse = r.invert_checked(n, &format!("r[{}]", attr))?;
        let xr_cap = proof
            .xr_cap
            .get(attr)
            .ok_or_else(|| Error::null(attr, "xrCap"))?;
        r_cap.push(commitment(&r_inverse, &proof.c, &pk.s, xr_cap, n)?);
    }

    let c = ChallengeBuilder::<CS::HashAlg>::new()
        .append(&pk.z)
        .append_map(&pk.r)
        .append(&z_cap)
        .append_all(r_cap.iter())
        .build_with_hashing();

    Ok(c == proof.c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::{ciphersuites::CL2048Sha256, issuer::IssuerKeyPair, test_keys::test_key_pair};

    fn check_key_correctness<CS: CLCiphersuite>(keys: &IssuerKeyPair) {
        let proof = keys.key_correctness_proof::<CS>().unwrap();
        assert!(verify_key_correctness::<CS>(keys.public_key(), &proof).unwrap());

        let mut wrong = proof.clone();
        wrong.c += 1;
        assert!(!verify_key_correctness::<CS>(keys.public_key(), &wrong).unwrap());

        let mut wrong = proof.clone();
        wrong.xz_cap -= 7;
        assert!(!verify_key_correctness::<CS>(keys.public_key(), &wrong).unwrap());

        let mut missing = proof;
        missing.xr_cap.remove("age");
        assert_eq!(
            verify_key_correctness::<CS>(keys.public_key(), &missing).unwrap_err(),
            Error::null("age", "xrCap")
        );
    }

    #[test]
    fn key_correctness_cl2048_sha256() {
        check_key_correctness::<CL2048Sha256>(&test_key_pair(&["name", "age"]));
    }

    #[test]
    fn public_key_json_keeps_r_order() {
        let keys = test_key_pair(&["name", "age"]);
        let json = serde_json::to_string(keys.public_key()).unwrap();
        let back: CredentialPrimaryPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back.r.keys().collect::<Vec<_>>(), vec!["name", "age", "masterSecret"]);
        assert_eq!(&back, keys.public_key());
    }
}
