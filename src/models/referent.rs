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

use crate::errors::Error;
use serde::{Deserialize, Serialize};

/// Candidates for every referent of a proof request.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableReferent {
    pub self_attr_referent: Vec<AttrReferent>,
    pub attr_referent: Vec<AttrReferent>,
    pub predicate_referent: Vec<AttrReferent>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttrReferent {
    pub key: String,
    pub name: String,
    pub check_revealed: bool,
    pub referent: Vec<SubReferent>,
}

/// A stored credential able to fill one referent.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubReferent {
    pub raw: String,
    pub cred_id: String,
    pub cred_def_id: String,
    pub schema_id: String,
}

/// The holder's choice for one referent key.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReferent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_id: Option<String>,
    pub raw: String,
    pub referent_key: String,
    pub referent_name: String,
    pub is_revealed: bool,
}

impl UserReferent {
    /// Self-attested value, always revealed and backed by no credential.
    pub fn self_attested(
        raw: impl Into<String>,
        referent_key: impl Into<String>,
        referent_name: impl Into<String>,
    ) -> Self {
        Self {
            cred_id: None,
            raw: raw.into(),
            referent_key: referent_key.into(),
            referent_name: referent_name.into(),
            is_revealed: true,
        }
    }

    pub fn from_sub_referent(
        sub_referent: &SubReferent,
        referent_key: impl Into<String>,
        referent_name: impl Into<String>,
        is_revealed: bool,
    ) -> Self {
        Self {
            cred_id: Some(sub_referent.cred_id.clone()),
            raw: sub_referent.raw.clone(),
            referent_key: referent_key.into(),
            referent_name: referent_name.into(),
            is_revealed,
        }
    }

    /// Picks the `index`-th candidate of `attr_referent`.
    pub fn from_attr_referent(
        attr_referent: &AttrReferent,
        index: usize,
        is_revealed: bool,
    ) -> Result<Self, Error> {
        let sub = attr_referent
            .referent
            .get(index)
            .ok_or_else(|| Error::invalid_parameter("selectedIndex out of range"))?;
        Ok(Self::from_sub_referent(
            sub,
            attr_referent.key.clone(),
            attr_referent.name.clone(),
            is_revealed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr_referent() -> AttrReferent {
        AttrReferent {
            key: "attr1".into(),
            name: "name".into(),
            check_revealed: true,
            referent: vec![SubReferent {
                raw: "Alice".into(),
                cred_id: "cred-1".into(),
                cred_def_id: "D1".into(),
                schema_id: "S1".into(),
            }],
        }
    }

    #[test]
    fn select_by_index() {
        let selected = UserReferent::from_attr_referent(&attr_referent(), 0, true).unwrap();
        assert_eq!(selected.cred_id.as_deref(), Some("cred-1"));
        assert_eq!(selected.raw, "Alice");
        assert_eq!(selected.referent_key, "attr1");
        assert_eq!(selected.referent_name, "name");

        assert_eq!(
            UserReferent::from_attr_referent(&attr_referent(), 1, true).unwrap_err(),
            Error::invalid_parameter("selectedIndex out of range")
        );
    }

    #[test]
    fn self_attested_is_revealed() {
        let selected = UserReferent::self_attested("blue", "attr9", "color");
        assert!(selected.is_revealed);
        assert!(selected.cred_id.is_none());
    }
}
