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
    cl::{
        challenge::ChallengeBuilder,
        ciphersuites::{CLCiphersuite, MASTER_SECRET_KEY},
        commitment::commitment,
        keys::CredentialPrimaryPublicKey,
    },
    errors::Error,
    models::issue::{ZKPCredentialOffer, ZKPCredentialRequest},
    utils::{
        random::random_bits,
        util::{decimal, IntegerExt},
    },
};
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Commitment `u = s^v' * r_ms^ms mod n` to the holder's master secret.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlindedCredentialSecrets {
    #[serde(with = "decimal")]
    pub u: Integer,
    pub hidden_attributes: Vec<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlindedCredentialSecretsCorrectnessProof {
    #[serde(with = "decimal")]
    pub c: Integer,
    #[serde(with = "decimal")]
    pub v_dash_cap: Integer,
    #[serde(with = "decimal::map")]
    pub m_caps: BTreeMap<String, Integer>,
}

pub fn generate_blinded_secrets(
    pk: &CredentialPrimaryPublicKey,
    master_secret: &Integer,
    v_prime: &Integer,
) -> Result<BlindedCredentialSecrets, Error> {
    let r_ms = pk.r_value(MASTER_SECRET_KEY, "credentialPublicKey.r")?;
    let u = commitment(&pk.s, v_prime, r_ms, master_secret, &pk.n)?;

    Ok(BlindedCredentialSecrets {
        u,
        hidden_attributes: vec![MASTER_SECRET_KEY.to_string()],
    })
}

/// Schnorr proof of knowledge of `(v', ms)` behind `u`, bound to the offer nonce.
///
/// # Description
/// `uTilde = s^vDashTilde * r_ms^mTilde mod n`, `c = H(u, uTilde, nonce)`,
/// `vDashCap = c*v' + vDashTilde` and `mCap = c*ms + mTilde`.
pub fn generate_blinded_secrets_proof<CS: CLCiphersuite>(
    pk: &CredentialPrimaryPublicKey,
    master_secret: &Integer,
    v_prime: &Integer,
    u: &Integer,
    offer_nonce: &Integer,
) -> Result<BlindedCredentialSecretsCorrectnessProof, Error> {
    let n = &pk.n;
    let r_ms = pk.r_value(MASTER_SECRET_KEY, "publicKey.r")?;

    let v_dash_tilde = random_bits(CS::LARGE_VPRIME_TILDE);
    let m_tilde = random_bits(CS::LARGE_M_TILDE);

    // uTilde = (s^vDashTilde mod n) * (r_ms^mTilde mod n) mod n, kept in [0, n)
    let u_tilde = (pk.s.pow_mod_checked(&v_dash_tilde, n, "s")?
        * r_ms.pow_mod_checked(&m_tilde, n, "r[masterSecret]")?)
    .modulo(n);

    let c = ChallengeBuilder::<CS::HashAlg>::new()
        .append(u)
        .append(&u_tilde)
        .append(offer_nonce)
        .build_with_hashing();

    let v_dash_cap = Integer::from(&c * v_prime) + v_dash_tilde;
    let m_cap = Integer::from(&c * master_secret) + m_tilde;

    let mut m_caps = BTreeMap::new();
    m_caps.insert(MASTER_SECRET_KEY.to_string(), m_cap);

    Ok(BlindedCredentialSecretsCorrectnessProof {
        c,
        v_dash_cap,
        m_caps,
    })
}

/// Builds the credential request for `offer`.
///
/// # Inputs
/// * `pk` - primary public key of the offered credential definition
/// * `prover_did` - DID of the holder
/// * `master_secret` - the holder's master secret
/// * `offer` - credential offer from the issuer
/// * `prover_nonce` - fresh nonce the issuer binds its signature proof to
/// * `v_prime` - blinding factor, kept by the holder until the credential arrives
pub fn generate_credential_request<CS: CLCiphersuite>(
    pk: &CredentialPrimaryPublicKey,
    prover_did: &str,
    master_secret: &Integer,
    offer: &ZKPCredentialOffer,
    prover_nonce: &Integer,
    v_prime: &Integer,
) -> Result<ZKPCredentialRequest, Error> {
    let blinded_ms = generate_blinded_secrets(pk, master_secret, v_prime)?;
    let blinded_ms_correctness_proof = generate_blinded_secrets_proof::<CS>(
        pk,
        master_secret,
        v_prime,
        &blinded_ms.u,
        &offer.nonce,
    )?;

    Ok(ZKPCredentialRequest {
        prover_did: prover_did.to_string(),
        cred_def_id: offer.cred_def_id.clone(),
        nonce: prover_nonce.clone(),
        blinded_ms,
        blinded_ms_correctness_proof,
    })
}
