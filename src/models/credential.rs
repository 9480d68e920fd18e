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
    cl::ciphersuites::CL2048Sha256,
    utils::{message::map_attribute_to_integer, util::decimal},
};
use log::warn;
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw attribute value together with its signed integer encoding.
///
/// `encoded` is always derived from `raw`. A stored encoding that disagrees is
/// replaced when the value is read back.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(from = "StoredAttributeValue")]
pub struct AttributeValue {
    #[serde(with = "decimal")]
    encoded: Integer,
    raw: String,
}

#[derive(Deserialize)]
struct StoredAttributeValue {
    #[serde(default)]
    encoded: Option<String>,
    raw: String,
}

impl From<StoredAttributeValue> for AttributeValue {
    fn from(stored: StoredAttributeValue) -> Self {
        let value = AttributeValue::new(stored.raw);
        if let Some(encoded) = stored.encoded {
            if encoded != value.encoded.to_string() {
                warn!(
                    "stored encoding {} of attribute value does not match its raw value, using {}",
                    encoded, value.encoded
                );
            }
        }
        value
    }
}

impl AttributeValue {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            encoded: map_attribute_to_integer::<CL2048Sha256>(&raw),
            raw,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn encoded(&self) -> &Integer {
        &self.encoded
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryCredentialSignature {
    #[serde(with = "decimal")]
    pub a: Integer,
    #[serde(with = "decimal")]
    pub e: Integer,
    #[serde(with = "decimal")]
    pub m2: Integer,
    #[serde(with = "decimal")]
    pub q: Integer,
    #[serde(with = "decimal")]
    pub v: Integer,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSignature {
    pub p_credential: PrimaryCredentialSignature,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureCorrectnessProof {
    #[serde(with = "decimal")]
    pub se: Integer,
    #[serde(with = "decimal")]
    pub c: Integer,
}

/// A CL credential as held by the wallet.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZKPCredential {
    pub credential_id: String,
    pub schema_id: String,
    pub cred_def_id: String,
    pub values: BTreeMap<String, AttributeValue>,
    pub signature: CredentialSignature,
    pub signature_correctness_proof: SignatureCorrectnessProof,
}

impl ZKPCredential {
    pub fn primary_signature(&self) -> &PrimaryCredentialSignature {
        &self.signature.p_credential
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterSecret {
    pub master_secret_id: String,
    #[serde(with = "decimal")]
    pub master_secret: Integer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_follows_raw_value() {
        let numeric = AttributeValue::new("12345");
        assert_eq!(*numeric.encoded(), 12345);

        let text = AttributeValue::new("hello");
        assert_eq!(
            text.encoded().to_string(),
            "20329878786436204988385760252021328656300425018755239228739303522659023427620"
        );
    }

    #[test]
    fn stale_encoding_is_rederived() {
        let value: AttributeValue =
            serde_json::from_str(r#"{"encoded":"1","raw":"12345"}"#).unwrap();
        assert_eq!(*value.encoded(), 12345);

        let value: AttributeValue = serde_json::from_str(r#"{"raw":"30"}"#).unwrap();
        assert_eq!(*value.encoded(), 30);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"encoded":"30","raw":"30"}"#
        );
    }

    #[test]
    fn master_secret_json() {
        let ms = MasterSecret {
            master_secret_id: "ms-1".into(),
            master_secret: Integer::from(42),
        };
        let json = serde_json::to_string(&ms).unwrap();
        assert_eq!(json, r#"{"masterSecretId":"ms-1","masterSecret":"42"}"#);
    }
}
