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

use crate::utils::util::decimal;
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum PredicateType {
    GE,
    LE,
    GT,
    LT,
}

impl PredicateType {
    /// Whether `value` satisfies `value <op> threshold`.
    pub fn holds(&self, value: i64, threshold: i64) -> bool {
        match self {
            PredicateType::GE => value >= threshold,
            PredicateType::LE => value <= threshold,
            PredicateType::GT => value > threshold,
            PredicateType::LT => value < threshold,
        }
    }
}

pub type Restriction = BTreeMap<String, String>;

/// Union of every value in a restriction list, i.e. the acceptable credential definition ids.
pub fn restriction_values(restrictions: &[Restriction]) -> BTreeSet<String> {
    restrictions
        .iter()
        .flat_map(|r| r.values().cloned())
        .collect()
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

impl AttributeInfo {
    pub fn is_self_attested(&self) -> bool {
        restriction_values(&self.restrictions).is_empty()
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredicateInfo {
    pub name: String,
    pub p_type: PredicateType,
    pub p_value: i64,
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    pub name: String,
    pub version: String,
    #[serde(with = "decimal")]
    pub nonce: Integer,
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, AttributeInfo>,
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, PredicateInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_comparisons() {
        assert!(PredicateType::GE.holds(18, 18));
        assert!(!PredicateType::GT.holds(18, 18));
        assert!(PredicateType::LE.holds(17, 18));
        assert!(!PredicateType::LT.holds(18, 18));
    }

    #[test]
    fn restrictions_flatten_to_values() {
        let request: ProofRequest = serde_json::from_str(
            r#"{
                "name": "age check",
                "version": "1.0",
                "nonce": "1234567890",
                "requestedAttributes": {
                    "attr1": {"name": "name", "restrictions": [{"credDefId": "A"}, {"credDefId": "B"}]},
                    "attr2": {"name": "nickname", "restrictions": []}
                },
                "requestedPredicates": {
                    "pred1": {"name": "age", "pType": "GE", "pValue": 18, "restrictions": [{"credDefId": "A"}]}
                }
            }"#,
        )
        .unwrap();

        let attr1 = &request.requested_attributes["attr1"];
        assert_eq!(
            restriction_values(&attr1.restrictions).into_iter().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string()]
        );
        assert!(request.requested_attributes["attr2"].is_self_attested());
        assert_eq!(request.requested_predicates["pred1"].p_type, PredicateType::GE);
        assert_eq!(request.nonce, 1234567890u64);
    }
}
