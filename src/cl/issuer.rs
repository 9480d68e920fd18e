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
        keys::{CredentialPrimaryPublicKey, KeyCorrectnessProof},
    },
    errors::Error,
    models::{
        credential::{
            AttributeValue, CredentialSignature, PrimaryCredentialSignature,
            SignatureCorrectnessProof, ZKPCredential,
        },
        issue::{
            CredentialDefinitionValue, CredentialType, ZKPCredentialDefinition,
            ZKPCredentialOffer, ZKPCredentialRequest,
        },
    },
    utils::{
        ordered::OrderedMap,
        random::{generate_nonce, generate_qr, generate_x, random_bits, random_number, random_prime, random_safe_prime},
        util::IntegerExt,
    },
};
use log::debug;
use rug::Integer;
use std::collections::BTreeMap;

/// Issuer side of the CL credential protocol.
///
/// Holds the factorization of `n` through `p' = (p-1)/2` and `q' = (q-1)/2` and the
/// discrete logs of every public base in `s`.
#[derive(Clone, Debug)]
pub struct IssuerKeyPair {
    public_key: CredentialPrimaryPublicKey,
    p_prime: Integer,
    q_prime: Integer,
    xz: Integer,
    xr: OrderedMap<Integer>,
}

impl IssuerKeyPair {
    /// Key pair for safe primes `p` and `q` with one base per attribute of
    /// `attr_names` followed by the master secret base.
    pub fn from_safe_primes(p: &Integer, q: &Integer, attr_names: &[&str]) -> Result<Self, Error> {
        if attr_names.contains(&MASTER_SECRET_KEY) {
            return Err(Error::invalid_parameter("attrNames"));
        }

        let p_prime = Integer::from(p - 1u32) >> 1u32;
        let q_prime = Integer::from(q - 1u32) >> 1u32;
        let n = Integer::from(p * q);

        let s = generate_qr(&n)?;
        let xz = generate_x(&p_prime, &q_prime)?;
        let z = s.pow_mod_checked(&xz, &n, "s")?;

        let mut xr = OrderedMap::new();
        let mut r = OrderedMap::new();
        for attr in attr_names.iter().copied().chain(std::iter::once(MASTER_SECRET_KEY)) {
            let x = generate_x(&p_prime, &q_prime)?;
            r.insert(attr, s.pow_mod_checked(&x, &n, "s")?);
            if xr.insert(attr, x).is_some() {
                return Err(Error::DuplicateParameter {
                    name: attr.to_string(),
                });
            }
        }

        let xrctxt = generate_x(&p_prime, &q_prime)?;
        let rctxt = s.pow_mod_checked(&xrctxt, &n, "s")?;

        Ok(Self {
            public_key: CredentialPrimaryPublicKey::new(n, z, s, r, rctxt),
            p_prime,
            q_prime,
            xz,
            xr,
        })
    }

    /// Fresh key pair over two `LARGE_PRIME`-bit safe primes.
    pub fn generate<CS: CLCiphersuite>(attr_names: &[&str]) -> Result<Self, Error> {
        let (p, _) = random_safe_prime(CS::LARGE_PRIME);
        let (q, _) = random_safe_prime(CS::LARGE_PRIME);
        debug!("generated issuer safe primes of {} bits", CS::LARGE_PRIME);
        Self::from_safe_primes(&p, &q, attr_names)
    }

    pub fn public_key(&self) -> &CredentialPrimaryPublicKey {
        &self.public_key
    }

    fn group_order(&self) -> Integer {
        Integer::from(&self.p_prime * &self.q_prime)
    }

    /// Schnorr proof of knowledge of `log_s z` and every `log_s r_i`.
    pub fn key_correctness_proof<CS: CLCiphersuite>(&self) -> Result<KeyCorrectnessProof, Error> {
        let pk = &self.public_key;
        let n = &pk.n;

        let xz_tilde = generate_x(&self.p_prime, &self.q_prime)?;
        let z_tilde = pk.s.pow_mod_checked(&xz_tilde, n, "s")?;

        let mut xr_tilde = OrderedMap::new();
        let mut r_tilde = Vec::with_capacity(self.xr.len());
        for attr in self.xr.keys() {
            let x = generate_x(&self.p_prime, &self.q_prime)?;
            r_tilde.push(pk.s.pow_mod_checked(&x, n, "s")?);
            xr_tilde.insert(attr, x);
        }

        let c = ChallengeBuilder::<CS::HashAlg>::new()
            .append(&pk.z)
            .append_map(&pk.r)
            .append(&z_tilde)
            .append_all(r_tilde.iter())
            .build_with_hashing();

        let xz_cap = Integer::from(&c * &self.xz) + xz_tilde;
        let mut xr_cap = BTreeMap::new();
        for ((attr, x), (_, x_tilde)) in self.xr.iter().zip(xr_tilde.iter()) {
            xr_cap.insert(attr.to_string(), Integer::from(&c * x) + x_tilde);
        }

        Ok(KeyCorrectnessProof { c, xz_cap, xr_cap })
    }

    pub fn credential_definition(
        &self,
        id: impl Into<String>,
        schema_id: impl Into<String>,
        tag: impl Into<String>,
    ) -> ZKPCredentialDefinition {
        ZKPCredentialDefinition {
            id: id.into(),
            schema_id: schema_id.into(),
            ver: "1.0".to_string(),
            cred_type: CredentialType::Cl,
            value: CredentialDefinitionValue {
                primary: self.public_key.clone(),
            },
            tag: tag.into(),
        }
    }

    pub fn credential_offer<CS: CLCiphersuite>(
        &self,
        cred_def_id: impl Into<String>,
        schema_id: impl Into<String>,
    ) -> Result<ZKPCredentialOffer, Error> {
        Ok(ZKPCredentialOffer {
            cred_def_id: cred_def_id.into(),
            schema_id: schema_id.into(),
            key_correctness_proof: self.key_correctness_proof::<CS>()?,
            nonce: generate_nonce::<CS>(),
        })
    }

    /// Checks the holder's proof of knowledge behind the blinded master secret:
    /// `c == H(u, u^-c * s^vDashCap * r_ms^mCap, offer_nonce)`.
    pub fn verify_credential_request<CS: CLCiphersuite>(
        &self,
        request: &ZKPCredentialRequest,
        offer_nonce: &Integer,
    ) -> Result<(), Error> {
        let pk = &self.public_key;
        let n = &pk.n;
        let u = &request.blinded_ms.u;
        let proof = &request.blinded_ms_correctness_proof;

        let r_ms = pk.r_value(MASTER_SECRET_KEY, "publicKey.r")?;
        let m_cap = proof
            .m_caps
            .get(MASTER_SECRET_KEY)
            .ok_or_else(|| Error::null(MASTER_SECRET_KEY, "blindedMsCorrectnessProof.mCaps"))?;

        let minus_c = Integer::from(-&proof.c);
        let u_tilde = (u.pow_mod_checked(&minus_c, n, "u")?
            * pk.s.pow_mod_checked(&proof.v_dash_cap, n, "s")?
            * r_ms.pow_mod_checked(m_cap, n, "r[masterSecret]")?)
        .modulo(n);

        let c = ChallengeBuilder::<CS::HashAlg>::new()
            .append(u)
            .append(&u_tilde)
            .append(offer_nonce)
            .build_with_hashing();

        if c != proof.c {
            return Err(Error::VerifyBlindedSecretsCorrectnessProof);
        }
        Ok(())
    }

    /// Signs `values` together with the blinded master secret of `request`.
    ///
    /// # Description
    /// Picks `v''` and a prime `e` in `[2^LARGE_E_START, 2^LARGE_E_START + 2^LARGE_E_END_RANGE]`,
    /// derives `m2 = H(prover_did, credential_id)`, computes
    /// `Q = z * (u * s^v'' * rctxt^m2 * prod r_i^m_i)^-1` and `A = Q^(e^-1 mod p'q')`,
    /// then proves knowledge of `e^-1` bound to the holder nonce.
    ///
    /// # Output
    /// the issued [`ZKPCredential`], whose `v` is `v''` until the holder adds `v'`.
    pub fn issue_credential<CS: CLCiphersuite>(
        &self,
        request: &ZKPCredentialRequest,
        offer_nonce: &Integer,
        credential_id: impl Into<String>,
        schema_id: impl Into<String>,
        values: BTreeMap<String, AttributeValue>,
    ) -> Result<ZKPCredential, Error> {
        self.verify_credential_request::<CS>(request, offer_nonce)?;

        let credential_id = credential_id.into();
        let pk = &self.public_key;
        let n = &pk.n;
        let order = self.group_order();

        if values.contains_key(MASTER_SECRET_KEY) {
            return Err(Error::invalid_parameter(MASTER_SECRET_KEY));
        }

        let v = random_bits(CS::LARGE_VPRIME_PRIME);
        let e = random_prime(&CS::e_start_value(), CS::LARGE_E_END_RANGE, CS::LARGE_E_START + 1);
        let m2 = ChallengeBuilder::<CS::HashAlg>::new()
            .append_bytes(request.prover_did.as_bytes())
            .append_bytes(credential_id.as_bytes())
            .build_with_hashing();

        let mut rx = (pk.s.pow_mod_checked(&v, n, "s")?
            * &request.blinded_ms.u
            * pk.rctxt.pow_mod_checked(&m2, n, "rctxt")?)
        .modulo(n);
        for (key, value) in &values {
            let r = pk.r_value(key, "publicKey.r")?;
            rx = (rx * r.pow_mod_checked(value.encoded(), n, key)?).modulo(n);
        }

        let q = (Integer::from(&pk.z * &rx.invert_checked(n, "rx")?)).modulo(n);
        let e_inverse = e.invert_checked(&order, "e")?;
        let a = q.pow_mod_checked(&e_inverse, n, "q")?;

        // se = rr - c * e^-1 mod p'q'
        let rr = random_number(&Integer::from(&order - 1u32))?;
        let a_cap = q.pow_mod_checked(&rr, n, "q")?;
        let c = ChallengeBuilder::<CS::HashAlg>::new()
            .append(&q)
            .append(&a)
            .append(&a_cap)
            .append(&request.nonce)
            .build_with_hashing();
        let se = (rr - Integer::from(&c * &e_inverse)).modulo(&order);

        debug!("issued credential {} over {} attributes", credential_id, values.len());

        Ok(ZKPCredential {
            credential_id,
            schema_id: schema_id.into(),
            cred_def_id: request.cred_def_id.clone(),
            values,
            signature: CredentialSignature {
                p_credential: PrimaryCredentialSignature { a, e, m2, q, v },
            },
            signature_correctness_proof: SignatureCorrectnessProof { se, c },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cl::{blind::generate_credential_request, ciphersuites::CL2048Sha256, keys::verify_key_correctness, test_keys},
        utils::random::generate_master_secret,
    };

    fn request_for<CS: CLCiphersuite>(
        keys: &IssuerKeyPair,
        offer: &ZKPCredentialOffer,
    ) -> ZKPCredentialRequest {
        let ms = generate_master_secret::<CS>();
        let v_prime = random_bits(CS::LARGE_VPRIME);
        generate_credential_request::<CS>(
            keys.public_key(),
            "did:example:alice",
            &ms,
            offer,
            &generate_nonce::<CS>(),
            &v_prime,
        )
        .unwrap()
    }

    fn check_offer_and_request<CS: CLCiphersuite>() {
        let keys = test_keys::test_key_pair(&["name", "age"]);
        let offer = keys.credential_offer::<CS>("D1", "S1").unwrap();
        assert_eq!(offer.nonce.significant_bits(), CS::LARGE_NONCE);
        assert!(verify_key_correctness::<CS>(keys.public_key(), &offer.key_correctness_proof).unwrap());

        let request = request_for::<CS>(&keys, &offer);
        keys.verify_credential_request::<CS>(&request, &offer.nonce).unwrap();

        let other_nonce = Integer::from(&offer.nonce + 1u32);
        assert_eq!(
            keys.verify_credential_request::<CS>(&request, &other_nonce).unwrap_err(),
            Error::VerifyBlindedSecretsCorrectnessProof
        );
    }

    #[test]
    fn offer_and_request_cl2048_sha256() {
        check_offer_and_request::<CL2048Sha256>();
    }

    #[test]
    fn issued_signature_fields() {
        let (keys, credential, _, _) =
            test_keys::issue_test_credential::<CL2048Sha256>(&[("name", "Alice"), ("age", "30")]);
        let sig = credential.primary_signature();
        assert!(sig.e > CL2048Sha256::e_start_value());
        assert_eq!(sig.e.significant_bits(), CL2048Sha256::LARGE_E_START + 1);
        assert_eq!(sig.v.significant_bits(), CL2048Sha256::LARGE_VPRIME_PRIME);
        assert_eq!(credential.cred_def_id, "D1");
        assert!(sig.a < keys.public_key().n);
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let keys = test_keys::test_key_pair(&["name"]);
        let offer = keys.credential_offer::<CL2048Sha256>("D1", "S1").unwrap();
        let request = request_for::<CL2048Sha256>(&keys, &offer);
        let mut values = BTreeMap::new();
        values.insert("height".to_string(), AttributeValue::new("180"));
        let err = keys
            .issue_credential::<CL2048Sha256>(&request, &offer.nonce, "cred-1", "S1", values)
            .unwrap_err();
        assert_eq!(err, Error::null("height", "publicKey.r"));
    }

    #[test]
    fn master_secret_is_not_an_attribute_name() {
        let err = IssuerKeyPair::from_safe_primes(
            &Integer::from(23),
            &Integer::from(47),
            &["name", MASTER_SECRET_KEY],
        )
        .unwrap_err();
        assert_eq!(err, Error::invalid_parameter("attrNames"));
    }
}
