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

pub mod credential;
pub mod issue;
pub mod proof_request;
pub mod referent;
pub mod zkproof;

use issue::{ZKPCredentialDefinition, ZKPCredentialSchema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schemas and credential definitions referenced by the credentials of a proof,
/// keyed by their ids.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZKPProofParam {
    pub schemas: BTreeMap<String, ZKPCredentialSchema>,
    pub cre_defs: BTreeMap<String, ZKPCredentialDefinition>,
}
