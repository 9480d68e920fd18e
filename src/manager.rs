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
        blind::generate_credential_request,
        ciphersuites::{CL2048Sha256, CLCiphersuite, MASTER_SECRET_KEY},
        keys::{verify_key_correctness, CredentialPrimaryPublicKey},
        proof::{PrimaryInitProof, ProofBuilder},
        signature::verify_credential_signature,
        values::CredentialValues,
    },
    errors::Error,
    models::{
        credential::{MasterSecret, ZKPCredential},
        issue::{
            MasterSecretBlindingData, ZKPCredentialOffer, ZKPCredentialRequestContainer,
            ZKPCredentialRequestMeta,
        },
        proof_request::ProofRequest,
        referent::{AvailableReferent, UserReferent},
        zkproof::{Identifier, RequestedAttribute, RequestedProof, ZKProof},
        ZKPProofParam,
    },
    search::{resolve_prove_credentials, search_referents, ProveCredential},
    storage::{MemoryStorage, Storage, ZKPInfo, ZKPMeta, ZKPStoredCategory},
    utils::random::{generate_master_secret, generate_nonce, random_bits, random_uuid},
};
use log::{debug, warn};
use std::{collections::BTreeSet, marker::PhantomData};

/// Holder-side wallet engine over a [`Storage`] of [`ZKPMeta`]/[`ZKPInfo`] records.
///
/// The store always holds exactly one master secret once the manager exists.
pub struct ZKPManager<S, CS = CL2048Sha256> {
    storage: S,
    _cs: PhantomData<CS>,
}

impl<CS: CLCiphersuite> ZKPManager<MemoryStorage<ZKPMeta, ZKPInfo>, CS> {
    /// Manager over a fresh in-memory store called `name`.
    pub fn in_memory(name: &str) -> Result<Self, Error> {
        Self::new(MemoryStorage::new(name)?)
    }
}

fn check_identifiers(identifiers: &[String]) -> Result<(), Error> {
    if identifiers.is_empty() {
        return Err(Error::invalid_parameter("identifiers"));
    }
    let unique: BTreeSet<&String> = identifiers.iter().collect();
    if unique.len() != identifiers.len() {
        return Err(Error::DuplicateParameter {
            name: "identifiers".to_string(),
        });
    }
    Ok(())
}

impl<S, CS> ZKPManager<S, CS>
where
    S: Storage<ZKPMeta, ZKPInfo>,
    CS: CLCiphersuite,
{
    /// Takes ownership of `storage`, creating the master secret if the store is empty.
    pub fn new(storage: S) -> Result<Self, Error> {
        let mut manager = Self {
            storage,
            _cs: PhantomData,
        };
        if !manager.storage.is_saved() {
            manager.create_master_secret()?;
        }
        Ok(manager)
    }

    fn create_master_secret(&mut self) -> Result<(), Error> {
        let ms = MasterSecret {
            master_secret_id: random_uuid(),
            master_secret: generate_master_secret::<CS>(),
        };
        let (meta, info) = ZKPInfo::master_secret(&ms)?;
        self.storage.add_item(meta, info)?;
        debug!("created master secret {}", ms.master_secret_id);
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Removes every stored item and starts over with a new master secret.
    pub fn reset(&mut self) -> Result<(), Error> {
        if self.storage.is_saved() {
            self.storage.remove_all_items()?;
        }
        self.create_master_secret()
    }

    pub fn load_master_secret(&self) -> Result<MasterSecret, Error> {
        self.storage
            .get_all_items()?
            .into_iter()
            .find(|info| info.category == ZKPStoredCategory::MasterSecret)
            .ok_or(Error::MasterSecretNotFound)?
            .decode()
    }

    pub fn get_all_credential_metas(&self) -> Result<Vec<ZKPMeta>, Error> {
        Ok(self
            .storage
            .get_all_metas()?
            .into_iter()
            .filter(|meta| meta.category == ZKPStoredCategory::Credential)
            .collect())
    }

    pub fn is_any_credentials_saved(&self) -> bool {
        self.get_all_credential_metas()
            .map(|metas| !metas.is_empty())
            .unwrap_or(false)
    }

    /// Builds a credential request for `offer`, blinding the wallet's master secret.
    ///
    /// # Description
    /// Rejects the offer when its key correctness proof does not hold for `public_key`.
    /// The returned metadata carries `v'` and must be handed back unchanged to
    /// [`ZKPManager::verify_and_store_credential`].
    pub fn create_credential_request(
        &self,
        prover_did: &str,
        public_key: &CredentialPrimaryPublicKey,
        offer: &ZKPCredentialOffer,
    ) -> Result<ZKPCredentialRequestContainer, Error> {
        if prover_did.is_empty() {
            return Err(Error::invalid_parameter("proverDID"));
        }
        if !verify_key_correctness::<CS>(public_key, &offer.key_correctness_proof)? {
            return Err(Error::compare("credentialPublicKey", "keyCorrectnessProof"));
        }

        let ms = self.load_master_secret()?;
        let prover_nonce = generate_nonce::<CS>();
        let v_prime = random_bits(CS::LARGE_VPRIME);

        let credential_request = generate_credential_request::<CS>(
            public_key,
            prover_did,
            &ms.master_secret,
            offer,
            &prover_nonce,
            &v_prime,
        )?;
        debug!("created credential request for {}", offer.cred_def_id);

        Ok(ZKPCredentialRequestContainer {
            credential_request,
            credential_request_meta: ZKPCredentialRequestMeta {
                master_secret_blinding_data: MasterSecretBlindingData { v_prime },
                nonce: prover_nonce,
                master_secret_name: ms.master_secret_id,
            },
        })
    }

    /// Completes `credential` with `meta`, verifies it and stores it.
    ///
    /// Nothing is written when any check fails.
    pub fn verify_and_store_credential(
        &mut self,
        meta: &ZKPCredentialRequestMeta,
        public_key: &CredentialPrimaryPublicKey,
        credential: &ZKPCredential,
    ) -> Result<(), Error> {
        let ms = self.load_master_secret()?;
        if ms.master_secret_id != meta.master_secret_name {
            return Err(Error::MasterSecretNotFound);
        }

        let mut completed = credential.clone();
        if let Err(err) =
            verify_credential_signature::<CS>(public_key, &mut completed, &ms.master_secret, meta)
        {
            warn!("credential {} rejected: {}", credential.credential_id, err);
            return Err(err);
        }

        let (item_meta, info) = ZKPInfo::credential(&completed, &ms.master_secret_id)?;
        self.storage.add_item(item_meta, info)?;
        debug!("stored credential {}", completed.credential_id);
        Ok(())
    }

    pub fn get_all_credentials(&self) -> Result<Vec<ZKPCredential>, Error> {
        let credentials = self
            .storage
            .get_all_items()?
            .into_iter()
            .filter(|info| info.category == ZKPStoredCategory::Credential)
            .map(|info| info.decode())
            .collect::<Result<Vec<ZKPCredential>, _>>()?;

        if credentials.is_empty() {
            return Err(Error::NotFoundCredentialStored);
        }
        Ok(credentials)
    }

    /// Credentials for `identifiers`, in the same order. Every id must be stored.
    pub fn get_credentials(&self, identifiers: &[String]) -> Result<Vec<ZKPCredential>, Error> {
        check_identifiers(identifiers)?;
        let credentials = self
            .storage
            .get_items(identifiers)?
            .into_iter()
            .filter(|info| info.category == ZKPStoredCategory::Credential)
            .map(|info| info.decode())
            .collect::<Result<Vec<ZKPCredential>, _>>()?;

        if credentials.len() != identifiers.len() {
            return Err(Error::NotFoundCredentialByIdentifiers);
        }
        Ok(credentials)
    }

    pub fn remove_all_credentials(&mut self) -> Result<(), Error> {
        let ids: Vec<String> = self
            .get_all_credential_metas()?
            .into_iter()
            .map(|meta| meta.id)
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        self.storage.remove_items(&ids)
    }

    pub fn remove_credentials(&mut self, identifiers: &[String]) -> Result<(), Error> {
        check_identifiers(identifiers)?;
        let stored: BTreeSet<String> = self
            .get_all_credential_metas()?
            .into_iter()
            .map(|meta| meta.id)
            .collect();
        if !identifiers.iter().all(|id| stored.contains(id)) {
            return Err(Error::NotFoundCredentialByIdentifiers);
        }
        self.storage.remove_items(identifiers)
    }

    pub fn search_credentials(&self, request: &ProofRequest) -> Result<AvailableReferent, Error> {
        let credentials = self.get_all_credentials()?;
        search_referents(request, &credentials)
    }

    /// Proves `request` with the holder's `selected` referents.
    ///
    /// # Description
    /// Credentials enter the proof in order of first use among `selected`. Each one
    /// contributes an equality sub-proof (revealed attributes known, the rest and the
    /// master secret hidden) and one inequality sub-proof per predicate. The master
    /// secret blinding is shared, so the verifier learns that all credentials belong
    /// to the same holder.
    ///
    /// # Output
    /// the [`ZKProof`], or an error when the selection does not fit `request` or
    /// `param` lacks a schema or credential definition.
    pub fn create_proof(
        &self,
        request: &ProofRequest,
        selected: &[UserReferent],
        param: &ZKPProofParam,
    ) -> Result<ZKProof, Error> {
        let ms = self.load_master_secret()?;
        let prove = resolve_prove_credentials(request, selected)?;

        let cred_ids: Vec<String> = prove.credentials.keys().map(str::to_string).collect();
        let credentials = if cred_ids.is_empty() {
            Vec::new()
        } else {
            self.get_credentials(&cred_ids)?
        };

        let mut requested_proof = RequestedProof {
            self_attested_attrs: prove.self_attested.clone(),
            ..Default::default()
        };
        let mut identifiers = Vec::with_capacity(credentials.len());
        let mut builder = ProofBuilder::<CS>::new();

        for (index, (credential, (_, prove_credential))) in
            credentials.iter().zip(prove.credentials.iter()).enumerate()
        {
            let schema = param
                .schemas
                .get(&credential.schema_id)
                .filter(|s| s.id == credential.schema_id)
                .ok_or(Error::NotFoundSchemaFromProofParam)?;
            let cred_def = param
                .cre_defs
                .get(&credential.cred_def_id)
                .filter(|d| d.id == credential.cred_def_id)
                .ok_or(Error::NotFoundCredentialDefinitionFromProofParam)?;

            let (values, revealed_attr_names) = Self::credential_values(
                &ms,
                credential,
                prove_credential,
                index,
                &mut requested_proof,
            )?;
            let predicates: Vec<_> = prove_credential
                .predicates
                .iter()
                .map(|p| p.predicate.clone())
                .collect();

            let init_proof = PrimaryInitProof::new::<CS>(
                &cred_def.value.primary,
                credential.primary_signature(),
                schema,
                values,
                &revealed_attr_names,
                &predicates,
                builder.common_attributes(),
            )?;
            builder.add_init_proof(init_proof);

            identifiers.push(Identifier {
                cred_def_id: credential.cred_def_id.clone(),
                schema_id: credential.schema_id.clone(),
            });
        }

        let (proofs, aggregated_proof) = builder.build(&request.nonce)?;
        debug!(
            "created proof {} over {} credentials",
            request.name,
            identifiers.len()
        );

        Ok(ZKProof {
            proofs,
            aggregated_proof,
            requested_proof,
            identifiers,
        })
    }

    /// Marks the values of one credential for its equality sub-proof and records the
    /// matching entries of the requested proof.
    fn credential_values(
        ms: &MasterSecret,
        credential: &ZKPCredential,
        prove: &ProveCredential,
        index: usize,
        requested_proof: &mut RequestedProof,
    ) -> Result<(CredentialValues, Vec<String>), Error> {
        let mut values = CredentialValues::new();
        values.add_hidden(MASTER_SECRET_KEY, ms.master_secret.clone())?;
        let mut revealed_attr_names = Vec::new();

        for attribute in &prove.attributes {
            let value = credential
                .values
                .get(&attribute.attr_name)
                .ok_or(Error::InvalidAttributeReferentName)?;

            let existing = values.get(&attribute.attr_name).map(|v| v.is_hidden());
            match (existing, attribute.is_revealed) {
                (None, true) => {
                    values.add_known(&attribute.attr_name, value.encoded().clone())?;
                    revealed_attr_names.push(attribute.attr_name.clone());
                }
                (None, false) => values.add_hidden(&attribute.attr_name, value.encoded().clone())?,
                (Some(hidden), revealed) if hidden == !revealed => {}
                (Some(_), _) => {
                    return Err(Error::Duplicated {
                        detail: attribute.attr_name.clone(),
                    })
                }
            }

            let entry = if attribute.is_revealed {
                RequestedAttribute {
                    sub_proof_index: index,
                    raw: Some(value.raw().to_string()),
                    encoded: Some(value.encoded().to_string()),
                }
            } else {
                RequestedAttribute::hidden(index)
            };
            let target = if attribute.is_revealed {
                &mut requested_proof.revealed_attrs
            } else {
                &mut requested_proof.unrevealed_attrs
            };
            target.insert(attribute.referent_key.clone(), entry);
        }

        for predicate in &prove.predicates {
            let name = &predicate.predicate.attr_name;
            let value = credential
                .values
                .get(name)
                .ok_or(Error::InvalidPredicateReferentName)?;
            // a revealed attribute cannot back a predicate
            if !values.get(name).map_or(false, |v| v.is_hidden()) {
                values.add_hidden(name, value.encoded().clone())?;
            }
            requested_proof
                .predicates
                .insert(predicate.referent_key.clone(), RequestedAttribute::hidden(index));
        }

        for (name, value) in &credential.values {
            if values.get(name).is_none() {
                values.add_hidden(name, value.encoded().clone())?;
            }
        }

        Ok((values, revealed_attr_names))
    }
}
