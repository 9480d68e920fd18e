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
        challenge::ChallengeBuilder, ciphersuites::CLCiphersuite, commitment::commitment,
        keys::CredentialPrimaryPublicKey, values::CredentialValues,
    },
    errors::Error,
    models::{
        credential::{PrimaryCredentialSignature, SignatureCorrectnessProof, ZKPCredential},
        issue::ZKPCredentialRequestMeta,
    },
    utils::util::IntegerExt,
};
use rug::Integer;

/// Completes and verifies a freshly issued credential.
///
/// # Description
/// Unblinds the signature (`v = v'' + v'`, written back into `credential`), checks
/// the CL equation `z * (s^v * rctxt^m2 * prod r_i^m_i)^-1 == a^e mod n` and the
/// issuer's signature correctness proof `c == H(q, a, a^(c + se*e), nonce)`.
///
/// # Output
/// `Ok(())` or the first failed check. `credential.signature.p_credential.v` is
/// updated in either case, so callers keep the original when they need to retry.
pub fn verify_credential_signature<CS: CLCiphersuite>(
    pk: &CredentialPrimaryPublicKey,
    credential: &mut ZKPCredential,
    master_secret: &Integer,
    meta: &ZKPCredentialRequestMeta,
) -> Result<(), Error> {
    // v = v' + v''
    credential.signature.p_credential.v += &meta.master_secret_blinding_data.v_prime;

    let values = CredentialValues::for_signature(
        master_secret,
        credential
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), v.encoded().clone())),
    )?;

    let q = verify_primary_signature(pk, &credential.signature.p_credential, &values)?;
    verify_signature_correctness::<CS>(
        &credential.signature.p_credential,
        &credential.signature_correctness_proof,
        &q,
        &meta.nonce,
        &pk.n,
    )
}

/// Checks `q = z * sv^-1 == a^e mod n` and returns `q`.
pub fn verify_primary_signature(
    pk: &CredentialPrimaryPublicKey,
    signature: &PrimaryCredentialSignature,
    values: &CredentialValues,
) -> Result<Integer, Error> {
    let n = &pk.n;

    let mut sv = commitment(&pk.s, &signature.v, &pk.rctxt, &signature.m2, n)?;
    for (key, value) in values.iter() {
        let r = pk.r_value(key, "credentialPublicKey.r")?;
        sv = (sv * r.pow_mod_checked(&value.value, n, key)?).modulo(n);
    }

    if sv == 0 {
        return Err(Error::VerifySignatureCorrectnessProof);
    }

    let sv_inverse = sv.invert_checked(n, "sv")?;
    let q = (Integer::from(&pk.z * &sv_inverse)).modulo(n);
    let q_cap = signature.a.pow_mod_checked(&signature.e, n, "a")?;

    if q != q_cap {
        return Err(Error::compare("publicKey", "credential.CredentialSignature"));
    }
    Ok(q)
}

pub fn verify_signature_correctness<CS: CLCiphersuite>(
    signature: &PrimaryCredentialSignature,
    proof: &SignatureCorrectnessProof,
    q: &Integer,
    nonce: &Integer,
    n: &Integer,
) -> Result<(), Error> {
    // aCap = a^(c + se*e) mod n
    let exp = Integer::from(&proof.se * &signature.e) + &proof.c;
    let a_cap = signature.a.pow_mod_checked(&exp, n, "a")?;

    let c_cap = ChallengeBuilder::<CS::HashAlg>::new()
        .append(q)
        .append(&signature.a)
        .append(&a_cap)
        .append(nonce)
        .build_with_hashing();

    if c_cap != proof.c {
        return Err(Error::compare(
            "publicKey",
            "credential.signatureCorrectnessProof",
        ));
    }
    Ok(())
}
