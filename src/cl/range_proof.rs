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
        ciphersuites::{CLCiphersuite, DELTA, ITERATION},
        commitment::commitment,
        keys::CredentialPrimaryPublicKey,
        values::CredentialValues,
    },
    errors::Error,
    models::zkproof::{Predicate, PrimaryEqualProof, PrimaryPredicateInequalityProof},
    utils::{random::random_bits, util::IntegerExt},
};
use rug::Integer;
use std::collections::BTreeMap;

fn isqrt(n: i64) -> i64 {
    let n = n as i128;
    let mut x = (n as f64).sqrt() as i128;
    while x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x as i64
}

fn is_square(n: i64) -> bool {
    let root = isqrt(n);
    root * root == n
}

/// Decomposes `delta` into `[a, b, c, d]` with `a^2 + b^2 + c^2 + d^2 == delta`.
///
/// # Description
/// Greedy search from the largest root of each term downwards, returning the first
/// exact decomposition. Every non-negative integer has one (Lagrange).
///
/// # Output
/// the four roots, or [`Error::InvalidParameter`] for a negative `delta`
pub fn four_squares(delta: i64) -> Result<[i64; ITERATION], Error> {
    if delta < 0 {
        return Err(Error::invalid_parameter("delta"));
    }

    for a in (0..=isqrt(delta)).rev() {
        let rest_a = delta - a * a;
        if rest_a == 0 {
            return Ok([a, 0, 0, 0]);
        }
        for b in (0..=isqrt(rest_a)).rev() {
            let rest_b = rest_a - b * b;
            if rest_b == 0 {
                return Ok([a, b, 0, 0]);
            }
            for c in (0..=isqrt(rest_b)).rev() {
                let rest_c = rest_b - c * c;
                if rest_c == 0 {
                    return Ok([a, b, c, 0]);
                }
                if is_square(rest_c) {
                    return Ok([a, b, c, isqrt(rest_c)]);
                }
            }
        }
    }

    // unreachable for delta >= 0
    Err(Error::invalid_parameter("delta"))
}

pub(crate) fn index_key(i: usize) -> String {
    i.to_string()
}

fn get<'a>(map: &'a BTreeMap<String, Integer>, key: &str, group: &str) -> Result<&'a Integer, Error> {
    map.get(key).ok_or_else(|| Error::null(format!("[{}]", key), group))
}

/// Prover state of one predicate sub-proof before the challenge is known.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PrimaryPredicateInequalityInitProof {
    pub c_list: Vec<Integer>,
    pub tau_list: Vec<Integer>,
    pub u: BTreeMap<String, Integer>,
    pub u_tilde: BTreeMap<String, Integer>,
    pub r: BTreeMap<String, Integer>,
    pub r_tilde: BTreeMap<String, Integer>,
    pub alpha_tilde: Integer,
    pub predicate: Predicate,
    pub t: BTreeMap<String, Integer>,
}

/// Commits to the four-squares decomposition of the predicate's delta.
///
/// # Inputs
/// * `pk` - issuer public key of the credential
/// * `m_tilde` - blinding values of the equality sub-proof, `m_tilde[attr]` links both
/// * `values` - encoded credential values, the predicate attribute must be an `i64`
/// * `predicate` - predicate to prove
pub fn init_ne_proof<CS: CLCiphersuite>(
    pk: &CredentialPrimaryPublicKey,
    m_tilde: &BTreeMap<String, Integer>,
    values: &CredentialValues,
    predicate: &Predicate,
) -> Result<PrimaryPredicateInequalityInitProof, Error> {
    let (z, s, n) = (&pk.z, &pk.s, &pk.n);

    let attr_value = values
        .get(&predicate.attr_name)
        .and_then(|v| v.value.to_i64())
        .ok_or_else(|| Error::null(&predicate.attr_name, "credValues"))?;

    let delta = predicate
        .delta(attr_value)
        .ok_or_else(|| Error::invalid_parameter("delta"))?;
    if delta < 0 {
        return Err(Error::NegativeDelta);
    }

    // delta = u0^2 + u1^2 + u2^2 + u3^2
    let u_list = four_squares(delta)?;

    let mut u = BTreeMap::new();
    let mut r = BTreeMap::new();
    let mut t = BTreeMap::new();
    let mut c_list = Vec::with_capacity(ITERATION + 1);

    for (i, u_i) in u_list.iter().enumerate() {
        let u_i = Integer::from(*u_i);
        let r_i = random_bits(CS::LARGE_VPRIME);
        // T_i = z^u_i * s^r_i
        let t_i = commitment(z, &u_i, s, &r_i, n)?;
        c_list.push(t_i.clone());
        u.insert(index_key(i), u_i);
        r.insert(index_key(i), r_i);
        t.insert(index_key(i), t_i);
    }

    let r_delta = random_bits(CS::LARGE_VPRIME);
    // T_delta = z^delta * s^r_delta
    let t_delta = commitment(z, &Integer::from(delta), s, &r_delta, n)?;
    c_list.push(t_delta.clone());
    r.insert(DELTA.to_string(), r_delta);
    t.insert(DELTA.to_string(), t_delta);

    let mut u_tilde = BTreeMap::new();
    let mut r_tilde = BTreeMap::new();
    for i in 0..ITERATION {
        u_tilde.insert(index_key(i), random_bits(CS::LARGE_UTILDE));
        r_tilde.insert(index_key(i), random_bits(CS::LARGE_RTILDE));
    }
    r_tilde.insert(DELTA.to_string(), random_bits(CS::LARGE_RTILDE));
    let alpha_tilde = random_bits(CS::LARGE_ALPHATILDE);

    let mj = m_tilde
        .get(&predicate.attr_name)
        .ok_or_else(|| Error::null(&predicate.attr_name, "eqProof.mTilde"))?;

    let tau_list = calculate_t_not_equal(
        pk,
        &u_tilde,
        &r_tilde,
        mj,
        &alpha_tilde,
        &t,
        predicate.is_less(),
    )?;

    Ok(PrimaryPredicateInequalityInitProof {
        c_list,
        tau_list,
        u,
        u_tilde,
        r,
        r_tilde,
        alpha_tilde,
        predicate: predicate.clone(),
        t,
    })
}

/// The six tau values of a predicate sub-proof.
///
/// # Description
/// `z^u_i * s^r_i` for `i` in `0..4`, then `z^mj * s^(+-r_delta)` (negated for
/// `LE`/`LT`), then `Q = s^alpha * prod T_i^u_i`. The same function serves the
/// prover (with tilde values) and the verifier (with responses).
pub fn calculate_t_not_equal(
    pk: &CredentialPrimaryPublicKey,
    u: &BTreeMap<String, Integer>,
    r: &BTreeMap<String, Integer>,
    mj: &Integer,
    alpha: &Integer,
    t: &BTreeMap<String, Integer>,
    is_less: bool,
) -> Result<Vec<Integer>, Error> {
    let (z, s, n) = (&pk.z, &pk.s, &pk.n);
    let mut tau_list = Vec::with_capacity(ITERATION + 2);

    for i in 0..ITERATION {
        let key = index_key(i);
        let u_i = get(u, &key, "u")?;
        let r_i = get(r, &key, "r")?;
        tau_list.push(commitment(z, u_i, s, r_i, n)?);
    }

    let mut r_delta = get(r, DELTA, "r")?.clone();
    if is_less {
        r_delta = -r_delta;
    }
    tau_list.push(commitment(z, mj, s, &r_delta, n)?);

    let mut q = Integer::from(1);
    for i in 0..ITERATION {
        let key = index_key(i);
        let t_i = get(t, &key, "t")?;
        let u_i = get(u, &key, "u")?;
        q = (q * t_i.pow_mod_checked(u_i, n, "t")?).modulo(n);
    }
    q = (q * s.pow_mod_checked(alpha, n, "s")?).modulo(n);
    tau_list.push(q);

    Ok(tau_list)
}

/// Responses of a predicate sub-proof for `challenge`.
///
/// # Description
/// `u_i = c*u_i + uTilde_i`, `r_i = c*r_i + rTilde_i` (also for `DELTA`) and
/// `alpha = c*(r_delta - sum u_i*r_i) + alphaTilde`. `mj` is copied from the
/// equality sub-proof of the same credential.
pub fn finalize_ne_proof(
    init: &PrimaryPredicateInequalityInitProof,
    eq_proof: &PrimaryEqualProof,
    challenge: &Integer,
) -> Result<PrimaryPredicateInequalityProof, Error> {
    let mut u = BTreeMap::new();
    let mut r = BTreeMap::new();
    let mut ur = Integer::new();

    for i in 0..ITERATION {
        let key = index_key(i);
        let cur_u = get(&init.u, &key, "neInitProof.u")?;
        let cur_r = get(&init.r, &key, "neInitProof.r")?;
        let u_tilde = get(&init.u_tilde, &key, "neInitProof.uTilde")?;
        let r_tilde = get(&init.r_tilde, &key, "neInitProof.rTilde")?;

        u.insert(key.clone(), Integer::from(challenge * cur_u) + u_tilde);
        r.insert(key, Integer::from(challenge * cur_r) + r_tilde);
        ur += Integer::from(cur_u * cur_r);
    }

    let r_delta = get(&init.r, DELTA, "neInitProof.r")?;
    let r_delta_tilde = get(&init.r_tilde, DELTA, "neInitProof.rTilde")?;
    r.insert(
        DELTA.to_string(),
        Integer::from(challenge * r_delta) + r_delta_tilde,
    );

    // alpha = (r_delta - sum u_i*r_i) * c + alphaTilde
    let alpha = (Integer::from(r_delta - &ur) * challenge) + &init.alpha_tilde;

    let mj = eq_proof
        .m
        .get(&init.predicate.attr_name)
        .ok_or_else(|| Error::null(&init.predicate.attr_name, "eqProof.m"))?
        .clone();

    Ok(PrimaryPredicateInequalityProof {
        u,
        r,
        t: init.t.clone(),
        mj,
        alpha,
        predicate: init.predicate.clone(),
    })
}
