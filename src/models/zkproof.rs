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

use crate::{models::proof_request::PredicateType, utils::util::decimal};
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZKProof {
    pub proofs: Vec<SubProof>,
    pub aggregated_proof: AggregatedProof,
    pub requested_proof: RequestedProof,
    pub identifiers: Vec<Identifier>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubProof {
    pub primary_proof: PrimaryProof,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryProof {
    pub eq_proof: PrimaryEqualProof,
    pub ne_proofs: Vec<PrimaryPredicateInequalityProof>,
}

/// Responses of the equality sub-proof.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryEqualProof {
    #[serde(with = "decimal::map")]
    pub revealed_attrs: BTreeMap<String, Integer>,
    #[serde(with = "decimal")]
    pub a_prime: Integer,
    #[serde(with = "decimal")]
    pub e: Integer,
    #[serde(with = "decimal")]
    pub v: Integer,
    #[serde(with = "decimal::map")]
    pub m: BTreeMap<String, Integer>,
    #[serde(with = "decimal")]
    pub m2: Integer,
}

/// Responses of one predicate sub-proof. `u`, `r` and `t` are keyed `"0"`..`"3"`,
/// `r` and `t` also carry `"DELTA"`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryPredicateInequalityProof {
    #[serde(with = "decimal::map")]
    pub u: BTreeMap<String, Integer>,
    #[serde(with = "decimal::map")]
    pub r: BTreeMap<String, Integer>,
    #[serde(with = "decimal::map")]
    pub t: BTreeMap<String, Integer>,
    #[serde(with = "decimal")]
    pub mj: Integer,
    #[serde(with = "decimal")]
    pub alpha: Integer,
    pub predicate: Predicate,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedProof {
    #[serde(with = "decimal")]
    pub c_hash: Integer,
    pub c_list: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedProof {
    pub self_attested_attrs: BTreeMap<String, String>,
    pub predicates: BTreeMap<String, RequestedAttribute>,
    pub revealed_attrs: BTreeMap<String, RequestedAttribute>,
    pub unrevealed_attrs: BTreeMap<String, RequestedAttribute>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedAttribute {
    pub sub_proof_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded: Option<String>,
}

impl RequestedAttribute {
    pub fn hidden(sub_proof_index: usize) -> Self {
        Self {
            sub_proof_index,
            raw: None,
            encoded: None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub cred_def_id: String,
    pub schema_id: String,
}

/// `attr_name <p_type> p_value` over a hidden attribute.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Predicate {
    pub p_type: PredicateType,
    pub p_value: i64,
    pub attr_name: String,
}

impl Predicate {
    pub fn new(p_type: PredicateType, p_value: i64, attr_name: impl Into<String>) -> Self {
        Self {
            p_type,
            p_value,
            attr_name: attr_name.into(),
        }
    }

    /// Difference proven non-negative. `None` on overflow.
    pub fn delta(&self, attr_value: i64) -> Option<i64> {
        let p = self.p_value;
        match self.p_type {
            PredicateType::GE => attr_value.checked_sub(p),
            PredicateType::GT => attr_value.checked_sub(p)?.checked_sub(1),
            PredicateType::LE => p.checked_sub(attr_value),
            PredicateType::LT => p.checked_sub(attr_value)?.checked_sub(1),
        }
    }

    /// Public shift such that `z^delta_prime * T_delta^(+-1)` commits to the attribute.
    pub fn delta_prime(&self) -> Integer {
        let p = Integer::from(self.p_value);
        match self.p_type {
            PredicateType::GE | PredicateType::LE => p,
            PredicateType::GT => p + 1u32,
            PredicateType::LT => p - 1u32,
        }
    }

    pub fn is_less(&self) -> bool {
        matches!(self.p_type, PredicateType::LE | PredicateType::LT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_per_predicate_type() {
        assert_eq!(Predicate::new(PredicateType::GE, 18, "age").delta(30), Some(12));
        assert_eq!(Predicate::new(PredicateType::GT, 18, "age").delta(30), Some(11));
        assert_eq!(Predicate::new(PredicateType::LE, 65, "age").delta(30), Some(35));
        assert_eq!(Predicate::new(PredicateType::LT, 65, "age").delta(30), Some(34));
        assert_eq!(Predicate::new(PredicateType::GE, 18, "age").delta(17), Some(-1));
        assert_eq!(Predicate::new(PredicateType::GE, i64::MIN, "age").delta(1), None);
    }

    #[test]
    fn delta_prime_and_direction() {
        for (p_type, expected, less) in [
            (PredicateType::GE, 18, false),
            (PredicateType::GT, 19, false),
            (PredicateType::LE, 18, true),
            (PredicateType::LT, 17, true),
        ] {
            let predicate = Predicate::new(p_type, 18, "age");
            assert_eq!(predicate.delta_prime(), expected);
            assert_eq!(predicate.is_less(), less);
        }
    }

    #[test]
    fn hidden_attribute_omits_values() {
        let json = serde_json::to_string(&RequestedAttribute::hidden(2)).unwrap();
        assert_eq!(json, r#"{"subProofIndex":2}"#);
    }
}
