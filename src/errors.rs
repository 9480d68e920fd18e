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

use thiserror::Error;

/// Coarse classification of [`Error`] variants.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ErrorKind {
    InvalidParameter,
    DuplicateParameter,
    NotFound,
    ProofRequestStructure,
    CryptoVerification,
    Duplicated,
    Storage,
    Serialization,
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum StorageError {
    #[error("Invalid parameter: {name}")]
    InvalidParameter { name: String },
    #[error("Duplicated parameter: {name}")]
    DuplicateParameter { name: String },
    #[error("Item {id} is duplicated with the one in wallet")]
    ItemDuplicated { id: String },
    #[error("No items saved")]
    NoItemsSaved,
    #[error("No items to remove")]
    NoItemsToRemove,
}

impl StorageError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "05001",
            Self::DuplicateParameter { .. } => "05002",
            Self::ItemDuplicated { .. } => "05003",
            Self::NoItemsSaved => "05004",
            Self::NoItemsToRemove => "05005",
        }
    }
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid parameter: {name}")]
    InvalidParameter { name: String },
    #[error("Duplicated parameter: {name}")]
    DuplicateParameter { name: String },

    #[error("Value by key {value} not found in {group}")]
    Null { value: String, group: String },
    #[error("Delta must be positive")]
    NegativeDelta,
    #[error("Big Number compare failed {lhs} and {rhs}")]
    BigNumberCompare { lhs: String, rhs: String },
    #[error("Failed to inverse {value}")]
    Inverse { value: String },

    #[error("Master secret not found")]
    MasterSecretNotFound,

    #[error("Failed to verify signature correctness proof")]
    VerifySignatureCorrectnessProof,
    #[error("Failed to verify blinded secrets correctness proof")]
    VerifyBlindedSecretsCorrectnessProof,

    #[error("Credential not found in storage")]
    NotFoundCredentialStored,
    #[error("Credential not found by identifiers in storage")]
    NotFoundCredentialByIdentifiers,

    #[error("Proof request's predicate must have restrictions")]
    PredicateMustHaveRestrictions,
    #[error("Not found available request attribute")]
    NotFoundAvailableRequestAttribute,
    #[error("Not found available predicate attribute")]
    NotFoundAvailablePredicateAttribute,

    #[error("Invalid referent key")]
    InvalidReferentKey,
    #[error("Invalid self attribute referent")]
    InvalidSelfAttributeReferent,
    #[error("Invalid attribute referent name")]
    InvalidAttributeReferentName,
    #[error("Invalid predicate referent name")]
    InvalidPredicateReferentName,
    #[error("Insufficient referents for proof request")]
    InsufficientProofRequestReferents,
    #[error("{detail} is duplicated")]
    Duplicated { detail: String },
    #[error("Not found schema from proof param")]
    NotFoundSchemaFromProofParam,
    #[error("Not found credential definition from proof param")]
    NotFoundCredentialDefinitionFromProofParam,

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
    #[error("Error during (de)serialization")]
    Serialization(String),
}

impl Error {
    pub(crate) fn null(value: impl Into<String>, group: impl Into<String>) -> Self {
        Self::Null {
            value: value.into(),
            group: group.into(),
        }
    }

    pub(crate) fn invalid_parameter(name: impl Into<String>) -> Self {
        Self::InvalidParameter { name: name.into() }
    }

    pub(crate) fn compare(lhs: impl Into<String>, rhs: impl Into<String>) -> Self {
        Self::BigNumberCompare {
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    pub(crate) fn inverse(value: impl Into<String>) -> Self {
        Self::Inverse {
            value: value.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::DuplicateParameter { .. } => ErrorKind::DuplicateParameter,
            Self::Null { .. }
            | Self::MasterSecretNotFound
            | Self::NotFoundCredentialStored
            | Self::NotFoundCredentialByIdentifiers
            | Self::NotFoundAvailableRequestAttribute
            | Self::NotFoundAvailablePredicateAttribute
            | Self::NotFoundSchemaFromProofParam
            | Self::NotFoundCredentialDefinitionFromProofParam => ErrorKind::NotFound,
            Self::PredicateMustHaveRestrictions
            | Self::InvalidReferentKey
            | Self::InvalidSelfAttributeReferent
            | Self::InvalidAttributeReferentName
            | Self::InvalidPredicateReferentName
            | Self::InsufficientProofRequestReferents => ErrorKind::ProofRequestStructure,
            Self::NegativeDelta
            | Self::BigNumberCompare { .. }
            | Self::Inverse { .. }
            | Self::VerifySignatureCorrectnessProof
            | Self::VerifyBlindedSecretsCorrectnessProof => ErrorKind::CryptoVerification,
            Self::Duplicated { .. } => ErrorKind::Duplicated,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Wallet error code, e.g. `04102` for a failed big number comparison.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "00001",
            Self::DuplicateParameter { .. } => "00002",
            Self::Null { .. } => "04100",
            Self::NegativeDelta => "04101",
            Self::BigNumberCompare { .. } => "04102",
            Self::Inverse { .. } => "04103",
            Self::MasterSecretNotFound => "04200",
            Self::VerifySignatureCorrectnessProof => "04300",
            Self::VerifyBlindedSecretsCorrectnessProof => "04301",
            Self::NotFoundCredentialStored => "04400",
            Self::NotFoundCredentialByIdentifiers => "04401",
            Self::PredicateMustHaveRestrictions => "04500",
            Self::NotFoundAvailableRequestAttribute => "04501",
            Self::NotFoundAvailablePredicateAttribute => "04502",
            Self::InvalidReferentKey => "04600",
            Self::InvalidSelfAttributeReferent => "04601",
            Self::InvalidAttributeReferentName => "04602",
            Self::InvalidPredicateReferentName => "04603",
            Self::InsufficientProofRequestReferents => "04604",
            Self::Duplicated { .. } => "04605",
            Self::NotFoundSchemaFromProofParam => "04606",
            Self::NotFoundCredentialDefinitionFromProofParam => "04607",
            Self::Storage(inner) => inner.code(),
            Self::Serialization(_) => "04900",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_wrapped() {
        let err: Error = StorageError::ItemDuplicated { id: "cred-1".into() }.into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.code(), "05003");
    }

    #[test]
    fn crypto_failures_share_a_kind() {
        assert_eq!(Error::compare("a", "b").kind(), ErrorKind::CryptoVerification);
        assert_eq!(Error::inverse("sv").kind(), ErrorKind::CryptoVerification);
        assert_eq!(Error::NegativeDelta.kind(), ErrorKind::CryptoVerification);
        assert_eq!(
            Error::InsufficientProofRequestReferents.kind(),
            ErrorKind::ProofRequestStructure
        );
    }

    #[test]
    fn null_carries_context() {
        let err = Error::null("masterSecret", "publicKey.r");
        assert_eq!(err.to_string(), "Value by key masterSecret not found in publicKey.r");
        assert_eq!(err.code(), "04100");
    }
}
