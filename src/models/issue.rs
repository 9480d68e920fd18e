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
        blind::{BlindedCredentialSecrets, BlindedCredentialSecretsCorrectnessProof},
        keys::{CredentialPrimaryPublicKey, KeyCorrectnessProof},
    },
    utils::util::decimal,
};
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZKPCredentialSchema {
    pub id: String,
    pub name: String,
    pub version: String,
    pub attr_names: Vec<String>,
    pub attr_types: Vec<AttributeType>,
    pub tag: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AttributeType {
    pub namespace: Namespace,
    pub items: Vec<AttributeDef>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Namespace {
    pub id: String,
    pub name: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AttributeDef {
    pub label: String,
    pub caption: String,
    #[serde(rename = "type")]
    pub value_type: AttributeValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i18n: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum AttributeValueType {
    String,
    Number,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CredentialType {
    #[serde(rename = "CL")]
    Cl,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZKPCredentialDefinition {
    pub id: String,
    pub schema_id: String,
    pub ver: String,
    #[serde(rename = "type")]
    pub cred_type: CredentialType,
    pub value: CredentialDefinitionValue,
    pub tag: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CredentialDefinitionValue {
    pub primary: CredentialPrimaryPublicKey,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZKPCredentialOffer {
    pub cred_def_id: String,
    pub schema_id: String,
    pub key_correctness_proof: KeyCorrectnessProof,
    #[serde(with = "decimal")]
    pub nonce: Integer,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZKPCredentialRequest {
    #[serde(rename = "proverDID")]
    pub prover_did: String,
    pub cred_def_id: String,
    #[serde(with = "decimal")]
    pub nonce: Integer,
    pub blinded_ms: BlindedCredentialSecrets,
    pub blinded_ms_correctness_proof: BlindedCredentialSecretsCorrectnessProof,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterSecretBlindingData {
    #[serde(with = "decimal")]
    pub v_prime: Integer,
}

/// Prover state kept between a credential request and the issued credential.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZKPCredentialRequestMeta {
    #[serde(rename = "masterSecretBlidingData")]
    pub master_secret_blinding_data: MasterSecretBlindingData,
    #[serde(with = "decimal")]
    pub nonce: Integer,
    pub master_secret_name: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZKPCredentialRequestContainer {
    pub credential_request: ZKPCredentialRequest,
    pub credential_request_meta: ZKPCredentialRequestMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_json_uses_wallet_names() {
        let json = r#"{
            "id": "did:example:schema:1",
            "name": "profile",
            "version": "1.0",
            "attrNames": ["name", "age"],
            "attrTypes": [{
                "namespace": {"id": "org.example", "name": "Example"},
                "items": [
                    {"label": "name", "caption": "Name", "type": "String"},
                    {"label": "age", "caption": "Age", "type": "Number", "i18n": {"ko": "나이"}}
                ]
            }],
            "tag": "v1"
        }"#;
        let schema: ZKPCredentialSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.attr_names, vec!["name", "age"]);
        assert_eq!(schema.attr_types[0].items[1].value_type, AttributeValueType::Number);
        assert!(schema.attr_types[0].namespace.reference.is_none());

        let out = serde_json::to_string(&schema).unwrap();
        assert!(out.contains(r#""attrNames":["name","age"]"#));
        assert!(!out.contains("ref"));
    }

    #[test]
    fn request_meta_keeps_historical_field_name() {
        let meta = ZKPCredentialRequestMeta {
            master_secret_blinding_data: MasterSecretBlindingData {
                v_prime: Integer::from(5),
            },
            nonce: Integer::from(6),
            master_secret_name: "ms".into(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(
            json,
            r#"{"masterSecretBlidingData":{"vPrime":"5"},"nonce":"6","masterSecretName":"ms"}"#
        );
        assert_eq!(serde_json::from_str::<ZKPCredentialRequestMeta>(&json).unwrap(), meta);
    }
}
