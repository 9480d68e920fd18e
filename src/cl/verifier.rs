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
        ciphersuites::{CLCiphersuite, DELTA, ITERATION, MASTER_SECRET_KEY},
        keys::CredentialPrimaryPublicKey,
        proof::{calculate_t_equal, proof_challenge},
        range_proof::{calculate_t_not_equal, index_key},
    },
    errors::Error,
    models::{
        credential::AttributeValue,
        issue::ZKPCredentialSchema,
        proof_request::{restriction_values, ProofRequest, Restriction},
        zkproof::{Predicate, PrimaryEqualProof, PrimaryPredicateInequalityProof, ZKProof},
        ZKPProofParam,
    },
    utils::util::IntegerExt,
};
use log::debug;
use rug::Integer;
use std::collections::BTreeSet;

/// Verifies `proof` against the request it answers.
///
/// # Description
/// Checks that the requested proof covers every referent of `request`, that revealed
/// values match their encodings, then recomputes every tau value from the responses
/// and the common challenge `H(tau_list, c_list, nonce)`.
///
/// # Output
/// `Ok(true)` for a valid proof, `Ok(false)` for a well-formed proof that does not
/// verify, or an error when `param` lacks a referenced schema or credential definition.
pub fn verify_proof<CS: CLCiphersuite>(
    proof: &ZKProof,
    request: &ProofRequest,
    param: &ZKPProofParam,
) -> Result<bool, Error> {
    if proof.proofs.len() != proof.identifiers.len() {
        debug!("proof has {} sub-proofs for {} identifiers", proof.proofs.len(), proof.identifiers.len());
        return Ok(false);
    }
    if !check_requested_proof(proof, request) {
        return Ok(false);
    }

    let challenge = &proof.aggregated_proof.c_hash;
    let mut tau_list = Vec::new();
    let mut c_list = Vec::new();

    for (sub_proof, identifier) in proof.proofs.iter().zip(proof.identifiers.iter()) {
        let schema = param
            .schemas
            .get(&identifier.schema_id)
            .filter(|s| s.id == identifier.schema_id)
            .ok_or(Error::NotFoundSchemaFromProofParam)?;
        let cred_def = param
            .cre_defs
            .get(&identifier.cred_def_id)
            .filter(|d| d.id == identifier.cred_def_id)
            .ok_or(Error::NotFoundCredentialDefinitionFromProofParam)?;
        let pk = &cred_def.value.primary;
        let eq_proof = &sub_proof.primary_proof.eq_proof;

        if !covers_schema(schema, eq_proof) {
            debug!("equality proof does not cover schema {}", schema.id);
            return Ok(false);
        }

        c_list.push(eq_proof.a_prime.to_transcript_bytes());
        tau_list.push(verify_equality::<CS>(pk, eq_proof, challenge)?.to_transcript_bytes());

        for ne_proof in &sub_proof.primary_proof.ne_proofs {
            if eq_proof.m.get(&ne_proof.predicate.attr_name) != Some(&ne_proof.mj) {
                debug!("predicate on {} is not linked to the equality proof", ne_proof.predicate.attr_name);
                return Ok(false);
            }
            for key in (0..ITERATION).map(index_key).chain(std::iter::once(DELTA.to_string())) {
                let t = ne_proof
                    .t
                    .get(&key)
                    .ok_or_else(|| Error::null(format!("[{}]", key), "neProof.t"))?;
                c_list.push(t.to_transcript_bytes());
            }
            for tau in verify_ne_predicate(pk, ne_proof, challenge)? {
                tau_list.push(tau.to_transcript_bytes());
            }
        }
    }

    if c_list != proof.aggregated_proof.c_list {
        debug!("aggregated commitment list does not match the sub-proofs");
        return Ok(false);
    }

    let c_hash = proof_challenge::<CS>(&tau_list, &c_list, &request.nonce);
    Ok(c_hash == *challenge)
}

fn covers_schema(schema: &ZKPCredentialSchema, eq_proof: &PrimaryEqualProof) -> bool {
    let expected: BTreeSet<&str> = schema
        .attr_names
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(MASTER_SECRET_KEY))
        .collect();
    let proven: BTreeSet<&str> = eq_proof
        .revealed_attrs
        .keys()
        .chain(eq_proof.m.keys())
        .map(String::as_str)
        .collect();
    let disjoint = eq_proof.revealed_attrs.keys().all(|k| !eq_proof.m.contains_key(k));
    disjoint && expected == proven
}

fn issued_under(restrictions: &[Restriction], cred_def_id: &str) -> bool {
    let allowed = restriction_values(restrictions);
    allowed.is_empty() || allowed.contains(cred_def_id)
}

fn check_requested_proof(proof: &ZKProof, request: &ProofRequest) -> bool {
    let requested = &proof.requested_proof;

    for (key, info) in &request.requested_attributes {
        if let Some(revealed) = requested.revealed_attrs.get(key) {
            let (Some(sub_proof), Some(identifier)) = (
                proof.proofs.get(revealed.sub_proof_index),
                proof.identifiers.get(revealed.sub_proof_index),
            ) else {
                return false;
            };
            let (Some(raw), Some(encoded)) = (&revealed.raw, &revealed.encoded) else {
                return false;
            };
            let expected = AttributeValue::new(raw.as_str()).encoded().clone();
            if expected.to_string() != *encoded
                || sub_proof.primary_proof.eq_proof.revealed_attrs.get(&info.name) != Some(&expected)
                || !issued_under(&info.restrictions, &identifier.cred_def_id)
            {
                debug!("revealed attribute {} does not match its proof", key);
                return false;
            }
        } else if let Some(unrevealed) = requested.unrevealed_attrs.get(key) {
            let (Some(sub_proof), Some(identifier)) = (
                proof.proofs.get(unrevealed.sub_proof_index),
                proof.identifiers.get(unrevealed.sub_proof_index),
            ) else {
                return false;
            };
            if !sub_proof.primary_proof.eq_proof.m.contains_key(&info.name)
                || !issued_under(&info.restrictions, &identifier.cred_def_id)
            {
                debug!("unrevealed attribute {} is not hidden in its proof", key);
                return false;
            }
        } else if !(info.is_self_attested() && requested.self_attested_attrs.contains_key(key)) {
            debug!("requested attribute {} is missing from the proof", key);
            return false;
        }
    }

    for (key, info) in &request.requested_predicates {
        let Some(attribute) = requested.predicates.get(key) else {
            debug!("requested predicate {} is missing from the proof", key);
            return false;
        };
        let (Some(sub_proof), Some(identifier)) = (
            proof.proofs.get(attribute.sub_proof_index),
            proof.identifiers.get(attribute.sub_proof_index),
        ) else {
            return false;
        };
        let predicate = Predicate::new(info.p_type, info.p_value, info.name.clone());
        if !sub_proof
            .primary_proof
            .ne_proofs
            .iter()
            .any(|ne| ne.predicate == predicate)
            || !issued_under(&info.restrictions, &identifier.cred_def_id)
        {
            debug!("predicate {} is not proven by sub-proof {}", key, attribute.sub_proof_index);
            return false;
        }
    }

    true
}

/// Recomputes the equality tau `T = A'^e * prod r^m * s^v * rctxt^m2 * ((z / rar)^c)^-1`
/// where `rar = A'^(2^LARGE_E_START) * prod_{revealed} r^value`.
pub fn verify_equality<CS: CLCiphersuite>(
    pk: &CredentialPrimaryPublicKey,
    eq_proof: &PrimaryEqualProof,
    challenge: &Integer,
) -> Result<Integer, Error> {
    let n = &pk.n;
    let hidden: BTreeSet<String> = eq_proof.m.keys().cloned().collect();

    let t = calculate_t_equal(
        pk,
        &eq_proof.a_prime,
        &eq_proof.e,
        &eq_proof.v,
        &eq_proof.m,
        &eq_proof.m2,
        &hidden,
    )?;

    let mut rar = eq_proof
        .a_prime
        .pow_mod_checked(&CS::e_start_value(), n, "aPrime")?;
    for (attr, value) in &eq_proof.revealed_attrs {
        let r = pk.r_value(attr, "publicKey.r")?;
        rar = (rar * r.pow_mod_checked(value, n, attr)?).modulo(n);
    }

    // ((z * rar^-1)^c)^-1
    let z_over_rar = (Integer::from(&pk.z * &rar.invert_checked(n, "rar")?)).modulo(n);
    let divisor = z_over_rar
        .pow_mod_checked(challenge, n, "z")?
        .invert_checked(n, "z")?;

    Ok((t * divisor).modulo(n))
}

/// Recomputes the six tau values of a predicate sub-proof.
pub fn verify_ne_predicate(
    pk: &CredentialPrimaryPublicKey,
    ne_proof: &PrimaryPredicateInequalityProof,
    challenge: &Integer,
) -> Result<Vec<Integer>, Error> {
    let n = &pk.n;
    let predicate = &ne_proof.predicate;

    let mut tau_list = calculate_t_not_equal(
        pk,
        &ne_proof.u,
        &ne_proof.r,
        &ne_proof.mj,
        &ne_proof.alpha,
        &ne_proof.t,
        predicate.is_less(),
    )?;

    let t_of = |key: &str| {
        ne_proof
            .t
            .get(key)
            .ok_or_else(|| Error::null(format!("[{}]", key), "neProof.t"))
    };
    let inverse_pow = |base: &Integer| -> Result<Integer, Error> {
        base.pow_mod_checked(challenge, n, "t")?.invert_checked(n, "t")
    };

    for (i, tau) in tau_list.iter_mut().enumerate().take(ITERATION) {
        let divisor = inverse_pow(t_of(&index_key(i))?)?;
        *tau = Integer::from(&*tau * &divisor).modulo(n);
    }

    let t_delta = t_of(DELTA)?;
    let delta_pred = if predicate.is_less() {
        t_delta.invert_checked(n, "T[DELTA]")?
    } else {
        t_delta.clone()
    };

    // z^delta_prime * T_delta^(+-1) commits to the attribute itself
    let shifted = (pk.z.pow_mod_checked(&predicate.delta_prime(), n, "z")? * delta_pred).modulo(n);
    let divisor = inverse_pow(&shifted)?;
    tau_list[ITERATION] = Integer::from(&tau_list[ITERATION] * &divisor).modulo(n);

    let divisor = inverse_pow(t_delta)?;
    tau_list[ITERATION + 1] = Integer::from(&tau_list[ITERATION + 1] * &divisor).modulo(n);

    Ok(tau_list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cl::{
            ciphersuites::CL2048Sha256,
            proof::{PrimaryInitProof, ProofBuilder},
            signature::verify_credential_signature,
            test_keys::{issue_test_credential, test_schema},
            values::CredentialValues,
        },
        models::proof_request::PredicateType,
    };

    fn check_sub_proof_taus<CS: CLCiphersuite>() {
        let (keys, mut credential, ms, meta) =
            issue_test_credential::<CS>(&[("name", "Alice"), ("age", "30")]);
        verify_credential_signature::<CS>(keys.public_key(), &mut credential, &ms, &meta).unwrap();
        let pk = keys.public_key();
        let schema = test_schema("S1", &["name", "age"]);

        let mut values = CredentialValues::new();
        values.add_hidden(MASTER_SECRET_KEY, ms.clone()).unwrap();
        values.add_known("name", credential.values["name"].encoded().clone()).unwrap();
        values.add_hidden("age", credential.values["age"].encoded().clone()).unwrap();

        let predicate = Predicate::new(PredicateType::GE, 18, "age");
        let mut builder = ProofBuilder::<CS>::new();
        let init = PrimaryInitProof::new::<CS>(
            pk,
            credential.primary_signature(),
            &schema,
            values,
            &["name".to_string()],
            &[predicate],
            builder.common_attributes(),
        )
        .unwrap();
        let expected_taus = init.tau_values();
        builder.add_init_proof(init);
        let (sub_proofs, aggregated) = builder.build(&Integer::from(12345)).unwrap();

        let primary = &sub_proofs[0].primary_proof;
        let mut taus = vec![verify_equality::<CS>(pk, &primary.eq_proof, &aggregated.c_hash).unwrap()];
        taus.extend(verify_ne_predicate(pk, &primary.ne_proofs[0], &aggregated.c_hash).unwrap());
        assert_eq!(taus, expected_taus);

        let mut wrong = primary.eq_proof.clone();
        wrong.v += 1;
        assert_ne!(
            verify_equality::<CS>(pk, &wrong, &aggregated.c_hash).unwrap(),
            expected_taus[0]
        );
    }

    #[test]
    fn sub_proof_taus_cl2048_sha256() {
        check_sub_proof_taus::<CL2048Sha256>();
    }
}
