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
        keys::CredentialPrimaryPublicKey,
        range_proof::{finalize_ne_proof, init_ne_proof, PrimaryPredicateInequalityInitProof},
        values::CredentialValues,
    },
    errors::Error,
    models::{
        credential::PrimaryCredentialSignature,
        issue::ZKPCredentialSchema,
        zkproof::{AggregatedProof, Predicate, PrimaryEqualProof, PrimaryProof, SubProof},
    },
    utils::{random::random_bits, util::IntegerExt},
};
use rug::Integer;
use std::{
    collections::{BTreeMap, BTreeSet},
    marker::PhantomData,
};

/// Re-randomized signature: `A' = A * s^r`, `e' = e - 2^LARGE_E_START`, `v' = v - e*r`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AEVPrimes {
    pub a_prime: Integer,
    pub e_prime: Integer,
    pub v_prime: Integer,
}

pub fn create_aev_primes<CS: CLCiphersuite>(
    pk: &CredentialPrimaryPublicKey,
    signature: &PrimaryCredentialSignature,
) -> Result<AEVPrimes, Error> {
    let n = &pk.n;
    let r = random_bits(CS::LARGE_VPRIME);

    // A' = (s^r mod n) * (A mod n) mod n
    let a_prime = (pk.s.pow_mod_checked(&r, n, "s")? * signature.a.clone().modulo(n)).modulo(n);
    let e_prime = Integer::from(&signature.e - &CS::e_start_value());
    let v_prime = Integer::from(&signature.v - &Integer::from(&signature.e * &r));

    Ok(AEVPrimes {
        a_prime,
        e_prime,
        v_prime,
    })
}

/// Attributes the equality sub-proof keeps hidden: the schema attributes not
/// revealed, plus the master secret.
pub fn create_unrevealed_attributes(
    schema: &ZKPCredentialSchema,
    revealed_attr_names: &[String],
) -> BTreeSet<String> {
    let mut unrevealed: BTreeSet<String> = schema
        .attr_names
        .iter()
        .filter(|name| !revealed_attr_names.contains(name))
        .cloned()
        .collect();
    unrevealed.insert(MASTER_SECRET_KEY.to_string());
    unrevealed
}

/// Blinding values for the unrevealed attributes. The master secret reuses the
/// value shared by every credential of the proof.
pub fn generate_m_tilde<CS: CLCiphersuite>(
    unrevealed: &BTreeSet<String>,
    common_attributes: &BTreeMap<String, Integer>,
) -> BTreeMap<String, Integer> {
    let mut m_tilde = common_attributes.clone();
    for key in unrevealed {
        if key != MASTER_SECRET_KEY {
            m_tilde.insert(key.clone(), random_bits(CS::LARGE_MVECT));
        }
    }
    m_tilde
}

/// `A'^e * prod_{unrevealed} r_k^m_k * s^v * rctxt^m2 mod n`
pub fn calculate_t_equal(
    pk: &CredentialPrimaryPublicKey,
    a_prime: &Integer,
    e: &Integer,
    v: &Integer,
    m: &BTreeMap<String, Integer>,
    m2: &Integer,
    unrevealed: &BTreeSet<String>,
) -> Result<Integer, Error> {
    let n = &pk.n;
    let mut t = a_prime.pow_mod_checked(e, n, "aPrime")?;

    for key in unrevealed {
        let r = pk.r_value(key, "publicKey.r")?;
        let m_k = m.get(key).ok_or_else(|| Error::null(key, "mTilde"))?;
        t = (t * r.pow_mod_checked(m_k, n, key)?).modulo(n);
    }

    t = (t * pk.s.pow_mod_checked(v, n, "s")?).modulo(n);
    t = (t * pk.rctxt.pow_mod_checked(m2, n, "rctxt")?).modulo(n);
    Ok(t)
}

/// Prover state of the equality sub-proof before the challenge is known.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PrimaryEqualInitProof {
    pub a_prime: Integer,
    pub t: Integer,
    pub e_tilde: Integer,
    pub e_prime: Integer,
    pub v_tilde: Integer,
    pub v_prime: Integer,
    pub m_tilde: BTreeMap<String, Integer>,
    pub m2_tilde: Integer,
    pub m2: Integer,
}

pub fn init_eq_proof<CS: CLCiphersuite>(
    pk: &CredentialPrimaryPublicKey,
    unrevealed: &BTreeSet<String>,
    aev: AEVPrimes,
    m_tilde: BTreeMap<String, Integer>,
    m2: &Integer,
) -> Result<PrimaryEqualInitProof, Error> {
    let e_tilde = random_bits(CS::LARGE_E_TILDE);
    let v_tilde = random_bits(CS::LARGE_V_TILDE);
    let m2_tilde = random_bits(CS::LARGE_NONCE);

    let t = calculate_t_equal(pk, &aev.a_prime, &e_tilde, &v_tilde, &m_tilde, &m2_tilde, unrevealed)?;

    Ok(PrimaryEqualInitProof {
        a_prime: aev.a_prime,
        t,
        e_tilde,
        e_prime: aev.e_prime,
        v_tilde,
        v_prime: aev.v_prime,
        m_tilde,
        m2_tilde,
        m2: m2.clone(),
    })
}

/// Equality responses: `e = eTilde + c*e'`, `v = vTilde + c*v'`,
/// `m_k = c*m_k + mTilde_k` for hidden values and `m2 = c*m2 + m2Tilde`.
pub fn finalize_eq_proof(
    init: &PrimaryEqualInitProof,
    challenge: &Integer,
    values: &CredentialValues,
) -> Result<PrimaryEqualProof, Error> {
    let e = Integer::from(challenge * &init.e_prime) + &init.e_tilde;
    let v = Integer::from(challenge * &init.v_prime) + &init.v_tilde;

    let mut m = BTreeMap::new();
    let mut revealed_attrs = BTreeMap::new();
    for (key, value) in values.iter() {
        if value.is_hidden() {
            let m_tilde = init
                .m_tilde
                .get(key)
                .ok_or_else(|| Error::null(key, "eqInitProof.mTilde"))?;
            m.insert(key.to_string(), Integer::from(&value.value * challenge) + m_tilde);
        } else {
            revealed_attrs.insert(key.to_string(), value.value.clone());
        }
    }

    let m2 = Integer::from(&init.m2 * challenge) + &init.m2_tilde;

    Ok(PrimaryEqualProof {
        revealed_attrs,
        a_prime: init.a_prime.clone(),
        e,
        v,
        m,
        m2,
    })
}

/// Everything one credential contributes to a proof.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PrimaryInitProof {
    pub eq_proof: PrimaryEqualInitProof,
    pub ne_proofs: Vec<PrimaryPredicateInequalityInitProof>,
    pub credential_values: CredentialValues,
}

impl PrimaryInitProof {
    /// Builds the equality and predicate sub-proofs of one credential.
    ///
    /// # Inputs
    /// * `pk` - issuer public key of the credential
    /// * `signature` - the credential's primary signature
    /// * `schema` - schema of the credential
    /// * `credential_values` - encoded values, revealed ones marked known
    /// * `revealed_attr_names` - names of the revealed attributes
    /// * `predicates` - predicates over hidden attributes of this credential
    /// * `common_attributes` - blinding values shared across credentials
    pub fn new<CS: CLCiphersuite>(
        pk: &CredentialPrimaryPublicKey,
        signature: &PrimaryCredentialSignature,
        schema: &ZKPCredentialSchema,
        credential_values: CredentialValues,
        revealed_attr_names: &[String],
        predicates: &[Predicate],
        common_attributes: &BTreeMap<String, Integer>,
    ) -> Result<Self, Error> {
        let unrevealed = create_unrevealed_attributes(schema, revealed_attr_names);
        let m_tilde = generate_m_tilde::<CS>(&unrevealed, common_attributes);
        let aev = create_aev_primes::<CS>(pk, signature)?;
        let eq_proof = init_eq_proof::<CS>(pk, &unrevealed, aev, m_tilde, &signature.m2)?;

        let ne_proofs = predicates
            .iter()
            .map(|predicate| init_ne_proof::<CS>(pk, &eq_proof.m_tilde, &credential_values, predicate))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            eq_proof,
            ne_proofs,
            credential_values,
        })
    }

    /// `A'` followed by the five commitments of every predicate.
    pub fn common_values(&self) -> Vec<Integer> {
        let mut values = vec![self.eq_proof.a_prime.clone()];
        for ne in &self.ne_proofs {
            values.extend(ne.c_list.iter().cloned());
        }
        values
    }

    /// Equality `t` followed by the six tau values of every predicate.
    pub fn tau_values(&self) -> Vec<Integer> {
        let mut values = vec![self.eq_proof.t.clone()];
        for ne in &self.ne_proofs {
            values.extend(ne.tau_list.iter().cloned());
        }
        values
    }
}

/// Fiat-Shamir challenge over the tau list, the commitment list and the request nonce.
pub fn proof_challenge<CS: CLCiphersuite>(
    tau_list: &[Vec<u8>],
    c_list: &[Vec<u8>],
    nonce: &Integer,
) -> Integer {
    ChallengeBuilder::<CS::HashAlg>::new()
        .append_byte_list(tau_list)
        .append_byte_list(c_list)
        .append(nonce)
        .build_with_hashing()
}

/// Collects the sub-proofs of every credential and derives the common challenge.
pub struct ProofBuilder<CS: CLCiphersuite> {
    common_attributes: BTreeMap<String, Integer>,
    init_proofs: Vec<PrimaryInitProof>,
    c_list: Vec<Vec<u8>>,
    tau_list: Vec<Vec<u8>>,
    _cs: PhantomData<CS>,
}

impl<CS: CLCiphersuite> Default for ProofBuilder<CS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<CS: CLCiphersuite> ProofBuilder<CS> {
    pub fn new() -> Self {
        let mut common_attributes = BTreeMap::new();
        common_attributes.insert(MASTER_SECRET_KEY.to_string(), random_bits(CS::LARGE_MVECT));
        Self {
            common_attributes,
            init_proofs: Vec::new(),
            c_list: Vec::new(),
            tau_list: Vec::new(),
            _cs: PhantomData,
        }
    }

    pub fn common_attributes(&self) -> &BTreeMap<String, Integer> {
        &self.common_attributes
    }

    pub fn add_init_proof(&mut self, init_proof: PrimaryInitProof) {
        self.c_list
            .extend(init_proof.common_values().iter().map(|v| v.to_transcript_bytes()));
        self.tau_list
            .extend(init_proof.tau_values().iter().map(|v| v.to_transcript_bytes()));
        self.init_proofs.push(init_proof);
    }

    pub fn build(self, nonce: &Integer) -> Result<(Vec<SubProof>, AggregatedProof), Error> {
        let challenge = proof_challenge::<CS>(&self.tau_list, &self.c_list, nonce);

        let mut sub_proofs = Vec::with_capacity(self.init_proofs.len());
        for init_proof in &self.init_proofs {
            let eq_proof = finalize_eq_proof(&init_proof.eq_proof, &challenge, &init_proof.credential_values)?;
            let ne_proofs = init_proof
                .ne_proofs
                .iter()
                .map(|ne| finalize_ne_proof(ne, &eq_proof, &challenge))
                .collect::<Result<Vec<_>, _>>()?;
            sub_proofs.push(SubProof {
                primary_proof: PrimaryProof { eq_proof, ne_proofs },
            });
        }

        Ok((
            sub_proofs,
            AggregatedProof {
                c_hash: challenge,
                c_list: self.c_list,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::{ciphersuites::CL2048Sha256, test_keys::issue_test_credential};

    fn check_aev_primes_keep_the_signature_equation<CS: CLCiphersuite>() {
        let (keys, mut credential, _, meta) = issue_test_credential::<CS>(&[("name", "Alice")]);
        credential.signature.p_credential.v += &meta.master_secret_blinding_data.v_prime;
        let pk = keys.public_key();
        let sig = credential.primary_signature();
        let aev = create_aev_primes::<CS>(pk, sig).unwrap();

        // A'^(e' + 2^596) * s^v' == A^e * s^v
        let n = &pk.n;
        let e = Integer::from(&aev.e_prime + &CS::e_start_value());
        assert_eq!(e, sig.e);
        let lhs = (aev.a_prime.pow_mod_checked(&e, n, "a").unwrap()
            * pk.s.pow_mod_checked(&aev.v_prime, n, "s").unwrap())
        .modulo(n);
        let rhs = (sig.a.pow_mod_checked(&sig.e, n, "a").unwrap()
            * pk.s.pow_mod_checked(&sig.v, n, "s").unwrap())
        .modulo(n);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn aev_primes_cl2048_sha256() {
        check_aev_primes_keep_the_signature_equation::<CL2048Sha256>();
    }

    #[test]
    fn unrevealed_attributes_always_hold_the_master_secret() {
        let schema = crate::cl::test_keys::test_schema("S1", &["name", "age", "city"]);
        let unrevealed = create_unrevealed_attributes(&schema, &["name".to_string()]);
        assert_eq!(
            unrevealed.into_iter().collect::<Vec<_>>(),
            vec!["age".to_string(), "city".to_string(), MASTER_SECRET_KEY.to_string()]
        );
    }

    #[test]
    fn master_secret_blinding_is_shared() {
        let builder = ProofBuilder::<CL2048Sha256>::new();
        let mut unrevealed = BTreeSet::new();
        unrevealed.insert("age".to_string());
        unrevealed.insert(MASTER_SECRET_KEY.to_string());
        let first = generate_m_tilde::<CL2048Sha256>(&unrevealed, builder.common_attributes());
        let second = generate_m_tilde::<CL2048Sha256>(&unrevealed, builder.common_attributes());
        assert_eq!(first[MASTER_SECRET_KEY], second[MASTER_SECRET_KEY]);
        assert_ne!(first["age"], second["age"]);
        assert_eq!(first["age"].significant_bits(), 592);
    }
}
