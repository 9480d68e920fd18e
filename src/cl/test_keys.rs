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

//! Fixed 512-bit safe primes so unit tests do not pay for prime generation.

use crate::{
    cl::{blind::generate_credential_request, ciphersuites::CLCiphersuite, issuer::IssuerKeyPair},
    models::{
        credential::{AttributeValue, ZKPCredential},
        issue::{MasterSecretBlindingData, ZKPCredentialRequestMeta, ZKPCredentialSchema},
    },
    utils::random::{generate_master_secret, generate_nonce, random_bits},
};
use rug::Integer;
use std::collections::BTreeMap;

pub(crate) const P1: &str = "7695604624361457192754529257535735180505514092484849045903336480934465093674837458397357655332782650311581488542823139509812981822843853483315457214505423";
pub(crate) const P2: &str = "7536990893581759485414992759174395793761555853164437635947142526197875105955668280125878716149888824754672951988499327075776714932885491009653246443279739";

pub(crate) fn test_key_pair(attr_names: &[&str]) -> IssuerKeyPair {
    let p = Integer::from_str_radix(P1, 10).unwrap();
    let q = Integer::from_str_radix(P2, 10).unwrap();
    IssuerKeyPair::from_safe_primes(&p, &q, attr_names).unwrap()
}

pub(crate) fn test_schema(id: &str, attr_names: &[&str]) -> ZKPCredentialSchema {
    ZKPCredentialSchema {
        id: id.to_string(),
        name: "test".to_string(),
        version: "1.0".to_string(),
        attr_names: attr_names.iter().map(|s| s.to_string()).collect(),
        attr_types: Vec::new(),
        tag: "test".to_string(),
    }
}

/// Issues a credential over `values` under cred def `D1` and schema `S1`.
///
/// Returns the issuer keys, the credential as received (`v` still `v''`), the
/// holder's master secret and the request metadata needed to finish it.
pub(crate) fn issue_test_credential<CS: CLCiphersuite>(
    values: &[(&str, &str)],
) -> (IssuerKeyPair, ZKPCredential, Integer, ZKPCredentialRequestMeta) {
    let names: Vec<&str> = values.iter().map(|(k, _)| *k).collect();
    let keys = test_key_pair(&names);
    let offer = keys.credential_offer::<CS>("D1", "S1").unwrap();

    let ms = generate_master_secret::<CS>();
    let v_prime = random_bits(CS::LARGE_VPRIME);
    let prover_nonce = generate_nonce::<CS>();
    let request = generate_credential_request::<CS>(
        keys.public_key(),
        "did:example:alice",
        &ms,
        &offer,
        &prover_nonce,
        &v_prime,
    )
    .unwrap();

    let values: BTreeMap<String, AttributeValue> = values
        .iter()
        .map(|(k, v)| (k.to_string(), AttributeValue::new(*v)))
        .collect();
    let credential = keys
        .issue_credential::<CS>(&request, &offer.nonce, "cred-1", "S1", values)
        .unwrap();

    let meta = ZKPCredentialRequestMeta {
        master_secret_blinding_data: MasterSecretBlindingData { v_prime },
        nonce: prover_nonce,
        master_secret_name: "ms-1".to_string(),
    };
    (keys, credential, ms, meta)
}
