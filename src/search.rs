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
    errors::Error,
    models::{
        credential::ZKPCredential,
        proof_request::{restriction_values, PredicateType, ProofRequest},
        referent::{AttrReferent, AvailableReferent, SubReferent, UserReferent},
        zkproof::Predicate,
    },
    utils::{message::is_numeric, ordered::OrderedMap},
};
use std::collections::{BTreeMap, BTreeSet};

/// A credential-backed attribute of a proof request.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InnerRequestedAttribute {
    pub cred_def_ids: BTreeSet<String>,
    pub referent_name: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InnerRequestedPredicate {
    pub cred_def_ids: BTreeSet<String>,
    pub referent_name: String,
    pub p_type: PredicateType,
    pub p_value: i64,
}

/// Splits the requested attributes into self-attested referents and
/// credential-backed ones keyed by referent key.
pub fn requested_attributes(
    request: &ProofRequest,
) -> (Vec<AttrReferent>, BTreeMap<String, InnerRequestedAttribute>) {
    let mut self_attested = Vec::new();
    let mut requested = BTreeMap::new();

    for (key, info) in &request.requested_attributes {
        let cred_def_ids = restriction_values(&info.restrictions);
        if cred_def_ids.is_empty() {
            self_attested.push(AttrReferent {
                key: key.clone(),
                name: info.name.clone(),
                check_revealed: true,
                referent: Vec::new(),
            });
        } else {
            requested.insert(
                key.clone(),
                InnerRequestedAttribute {
                    cred_def_ids,
                    referent_name: info.name.clone(),
                },
            );
        }
    }

    (self_attested, requested)
}

pub fn requested_predicates(
    request: &ProofRequest,
) -> Result<BTreeMap<String, InnerRequestedPredicate>, Error> {
    let mut requested = BTreeMap::new();
    for (key, info) in &request.requested_predicates {
        let cred_def_ids = restriction_values(&info.restrictions);
        if cred_def_ids.is_empty() {
            return Err(Error::PredicateMustHaveRestrictions);
        }
        requested.insert(
            key.clone(),
            InnerRequestedPredicate {
                cred_def_ids,
                referent_name: info.name.clone(),
                p_type: info.p_type,
                p_value: info.p_value,
            },
        );
    }
    Ok(requested)
}

fn sub_referent(credential: &ZKPCredential, raw: &str) -> SubReferent {
    SubReferent {
        raw: raw.to_string(),
        cred_id: credential.credential_id.clone(),
        cred_def_id: credential.cred_def_id.clone(),
        schema_id: credential.schema_id.clone(),
    }
}

/// Candidates for every credential-backed attribute: credentials issued under an
/// allowed credential definition that carry a value for the attribute.
pub fn available_referents(
    requested: &BTreeMap<String, InnerRequestedAttribute>,
    credentials: &[ZKPCredential],
) -> Result<Vec<AttrReferent>, Error> {
    let mut referents = Vec::with_capacity(requested.len());

    for (key, attribute) in requested {
        let candidates: Vec<SubReferent> = credentials
            .iter()
            .filter(|c| attribute.cred_def_ids.contains(&c.cred_def_id))
            .filter_map(|c| {
                c.values
                    .get(&attribute.referent_name)
                    .map(|v| sub_referent(c, v.raw()))
            })
            .collect();

        if candidates.is_empty() {
            return Err(Error::NotFoundAvailableRequestAttribute);
        }
        referents.push(AttrReferent {
            key: key.clone(),
            name: attribute.referent_name.clone(),
            check_revealed: true,
            referent: candidates,
        });
    }

    Ok(referents)
}

/// Candidates for every predicate: credentials issued under an allowed credential
/// definition whose value is an integer satisfying the comparison.
pub fn predicate_referents(
    requested: &BTreeMap<String, InnerRequestedPredicate>,
    credentials: &[ZKPCredential],
) -> Result<Vec<AttrReferent>, Error> {
    let mut referents = Vec::with_capacity(requested.len());

    for (key, predicate) in requested {
        let candidates: Vec<SubReferent> = credentials
            .iter()
            .filter(|c| predicate.cred_def_ids.contains(&c.cred_def_id))
            .filter_map(|c| {
                let raw = c.values.get(&predicate.referent_name)?.raw();
                if !is_numeric(raw) {
                    return None;
                }
                let value = raw.parse::<i64>().ok()?;
                predicate
                    .p_type
                    .holds(value, predicate.p_value)
                    .then(|| sub_referent(c, raw))
            })
            .collect();

        if candidates.is_empty() {
            return Err(Error::NotFoundAvailablePredicateAttribute);
        }
        referents.push(AttrReferent {
            key: key.clone(),
            name: predicate.referent_name.clone(),
            check_revealed: false,
            referent: candidates,
        });
    }

    Ok(referents)
}

/// Every way `credentials` can answer `request`.
pub fn search_referents(
    request: &ProofRequest,
    credentials: &[ZKPCredential],
) -> Result<AvailableReferent, Error> {
    let (self_attr_referent, attributes) = requested_attributes(request);
    let predicates = requested_predicates(request)?;

    Ok(AvailableReferent {
        self_attr_referent,
        attr_referent: available_referents(&attributes, credentials)?,
        predicate_referent: predicate_referents(&predicates, credentials)?,
    })
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProveAttribute {
    pub attr_name: String,
    pub referent_key: String,
    pub is_revealed: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProvePredicate {
    pub referent_key: String,
    pub predicate: Predicate,
}

/// What one credential has to prove.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ProveCredential {
    pub attributes: Vec<ProveAttribute>,
    pub predicates: Vec<ProvePredicate>,
}

/// Selected referents grouped per credential, credentials in order of first use.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ProveCredentials {
    pub self_attested: BTreeMap<String, String>,
    pub credentials: OrderedMap<ProveCredential>,
}

/// Checks the holder's selection against `request` and groups it per credential.
///
/// # Description
/// Credential-backed attributes need a credential id and the requested attribute
/// name, self-attested attributes need a non-empty raw value and no credential, and
/// predicates need a credential id. Every credential-backed attribute and every
/// predicate of `request` must be selected, each referent key at most once.
///
/// # Output
/// the [`ProveCredentials`] or the first violation found.
pub fn resolve_prove_credentials(
    request: &ProofRequest,
    selected: &[UserReferent],
) -> Result<ProveCredentials, Error> {
    let mut prove = ProveCredentials::default();
    let mut attr_counter = request
        .requested_attributes
        .values()
        .filter(|info| !info.is_self_attested())
        .count();
    let mut predicate_counter = request.requested_predicates.len();
    let mut answered = BTreeSet::new();

    for referent in selected {
        if !answered.insert(referent.referent_key.as_str()) {
            return Err(Error::Duplicated {
                detail: format!("referent {}", referent.referent_key),
            });
        }
        if let Some(info) = request.requested_attributes.get(&referent.referent_key) {
            match &referent.cred_id {
                Some(cred_id) => {
                    if info.is_self_attested() {
                        return Err(Error::InvalidSelfAttributeReferent);
                    }
                    if info.name != referent.referent_name {
                        return Err(Error::InvalidAttributeReferentName);
                    }
                    prove
                        .credentials
                        .entry_or_default(cred_id)
                        .attributes
                        .push(ProveAttribute {
                            attr_name: referent.referent_name.clone(),
                            referent_key: referent.referent_key.clone(),
                            is_revealed: referent.is_revealed,
                        });
                    attr_counter = attr_counter.saturating_sub(1);
                }
                None => {
                    if !info.is_self_attested() {
                        return Err(Error::InvalidAttributeReferentName);
                    }
                    if referent.raw.is_empty() {
                        return Err(Error::InvalidSelfAttributeReferent);
                    }
                    prove
                        .self_attested
                        .insert(referent.referent_key.clone(), referent.raw.clone());
                }
            }
        } else if let Some(info) = request.requested_predicates.get(&referent.referent_key) {
            let cred_id = referent
                .cred_id
                .as_ref()
                .ok_or(Error::InvalidSelfAttributeReferent)?;
            prove
                .credentials
                .entry_or_default(cred_id)
                .predicates
                .push(ProvePredicate {
                    referent_key: referent.referent_key.clone(),
                    predicate: Predicate::new(info.p_type, info.p_value, info.name.clone()),
                });
            predicate_counter = predicate_counter.saturating_sub(1);
        } else {
            return Err(Error::InvalidReferentKey);
        }
    }

    if attr_counter > 0 || predicate_counter > 0 {
        return Err(Error::InsufficientProofRequestReferents);
    }
    Ok(prove)
}
