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

#![allow(dead_code)]

use rug::Integer;
use std::collections::BTreeMap;
use zkcred::{
    cl::{ciphersuites::CL2048Sha256, issuer::IssuerKeyPair},
    models::{
        credential::{AttributeValue, ZKPCredential},
        issue::{ZKPCredentialDefinition, ZKPCredentialRequestMeta, ZKPCredentialSchema},
        proof_request::Restriction,
        ZKPProofParam,
    },
    storage::{MemoryStorage, ZKPInfo, ZKPMeta},
    ZKPManager,
};

pub type Manager = ZKPManager<MemoryStorage<ZKPMeta, ZKPInfo>>;

// 512-bit safe primes
const P1: &str = "7695604624361457192754529257535735180505514092484849045903336480934465093674837458397357655332782650311581488542823139509812981822843853483315457214505423";
const P2: &str = "7536990893581759485414992759174395793761555853164437635947142526197875105955668280125878716149888824754672951988499327075776714932885491009653246443279739";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn manager() -> Manager {
    init_logger();
    ZKPManager::in_memory("wallet").unwrap()
}

pub struct Issuer {
    pub keys: IssuerKeyPair,
    pub schema: ZKPCredentialSchema,
    pub cred_def: ZKPCredentialDefinition,
}

impl Issuer {
    pub fn new(cred_def_id: &str, schema_id: &str, attr_names: &[&str]) -> Self {
        let p = Integer::from_str_radix(P1, 10).unwrap();
        let q = Integer::from_str_radix(P2, 10).unwrap();
        let keys = IssuerKeyPair::from_safe_primes(&p, &q, attr_names).unwrap();
        let schema = ZKPCredentialSchema {
            id: schema_id.to_string(),
            name: "identity".to_string(),
            version: "1.0".to_string(),
            attr_names: attr_names.iter().map(|s| s.to_string()).collect(),
            attr_types: Vec::new(),
            tag: "test".to_string(),
        };
        let cred_def = keys.credential_definition(cred_def_id, schema_id, "test");
        Self {
            keys,
            schema,
            cred_def,
        }
    }

    /// Runs offer, request and issuance against `manager` without storing the result.
    pub fn issue(
        &self,
        manager: &Manager,
        credential_id: &str,
        values: &[(&str, &str)],
    ) -> (ZKPCredentialRequestMeta, ZKPCredential) {
        let offer = self
            .keys
            .credential_offer::<CL2048Sha256>(&self.cred_def.id, &self.schema.id)
            .unwrap();
        let container = manager
            .create_credential_request("did:example:alice", self.keys.public_key(), &offer)
            .unwrap();
        let values: BTreeMap<String, AttributeValue> = values
            .iter()
            .map(|(k, v)| (k.to_string(), AttributeValue::new(*v)))
            .collect();
        let credential = self
            .keys
            .issue_credential::<CL2048Sha256>(
                &container.credential_request,
                &offer.nonce,
                credential_id,
                &self.schema.id,
                values,
            )
            .unwrap();
        (container.credential_request_meta, credential)
    }

    pub fn issue_and_store(&self, manager: &mut Manager, credential_id: &str, values: &[(&str, &str)]) {
        let (meta, credential) = self.issue(manager, credential_id, values);
        manager
            .verify_and_store_credential(&meta, self.keys.public_key(), &credential)
            .unwrap();
    }
}

pub fn proof_param(issuers: &[&Issuer]) -> ZKPProofParam {
    let mut param = ZKPProofParam::default();
    for issuer in issuers {
        param
            .schemas
            .insert(issuer.schema.id.clone(), issuer.schema.clone());
        param
            .cre_defs
            .insert(issuer.cred_def.id.clone(), issuer.cred_def.clone());
    }
    param
}

pub fn restricted_to(cred_def_ids: &[&str]) -> Vec<Restriction> {
    cred_def_ids
        .iter()
        .map(|id| {
            let mut restriction = Restriction::new();
            restriction.insert("credDefId".to_string(), id.to_string());
            restriction
        })
        .collect()
}
