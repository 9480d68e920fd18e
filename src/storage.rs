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
    errors::{Error, StorageError},
    models::credential::{MasterSecret, ZKPCredential},
    utils::util::to_canonical_json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::BTreeSet, marker::PhantomData};

/// Metadata stored next to every item, at least its unique id.
pub trait ItemMeta {
    fn id(&self) -> &str;
}

/// Key-value store of `(meta, item)` pairs, ids unique per store.
pub trait Storage<M: ItemMeta, T> {
    /// Fails with [`StorageError::ItemDuplicated`] if `meta.id()` is already stored.
    fn add_item(&mut self, meta: M, item: T) -> Result<(), Error>;

    fn get_all_items(&self) -> Result<Vec<T>, Error>;

    fn get_all_metas(&self) -> Result<Vec<M>, Error>;

    /// Items for `ids`, in the order of `ids`. Unknown ids are skipped.
    fn get_items(&self, ids: &[String]) -> Result<Vec<T>, Error>;

    /// Fails with [`StorageError::NoItemsToRemove`] if any id is unknown, in which
    /// case nothing is removed.
    fn remove_items(&mut self, ids: &[String]) -> Result<(), Error>;

    fn remove_all_items(&mut self) -> Result<(), Error>;

    /// Whether at least one item is stored.
    fn is_saved(&self) -> bool;
}

pub(crate) fn check_identifiers(ids: &[String]) -> Result<(), StorageError> {
    if ids.is_empty() {
        return Err(StorageError::InvalidParameter {
            name: "ids".to_string(),
        });
    }
    let unique: BTreeSet<&String> = ids.iter().collect();
    if unique.len() != ids.len() {
        return Err(StorageError::DuplicateParameter {
            name: "ids".to_string(),
        });
    }
    Ok(())
}

/// In-memory [`Storage`] keeping each item as canonical JSON, in insertion order.
#[derive(Clone, Debug)]
pub struct MemoryStorage<M, T> {
    name: String,
    entries: Vec<(M, String)>,
    _item: PhantomData<T>,
}

impl<M, T> MemoryStorage<M, T> {
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.is_empty() {
            return Err(StorageError::InvalidParameter {
                name: "name".to_string(),
            }
            .into());
        }
        Ok(Self {
            name: name.to_string(),
            entries: Vec::new(),
            _item: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<M, T> Storage<M, T> for MemoryStorage<M, T>
where
    M: ItemMeta + Clone,
    T: Serialize + DeserializeOwned,
{
    fn add_item(&mut self, meta: M, item: T) -> Result<(), Error> {
        if self.entries.iter().any(|(m, _)| m.id() == meta.id()) {
            return Err(StorageError::ItemDuplicated {
                id: meta.id().to_string(),
            }
            .into());
        }
        let payload = to_canonical_json(&item)?;
        self.entries.push((meta, payload));
        Ok(())
    }

    fn get_all_items(&self) -> Result<Vec<T>, Error> {
        self.entries
            .iter()
            .map(|(_, payload)| serde_json::from_str(payload).map_err(Error::from))
            .collect()
    }

    fn get_all_metas(&self) -> Result<Vec<M>, Error> {
        Ok(self.entries.iter().map(|(m, _)| m.clone()).collect())
    }

    fn get_items(&self, ids: &[String]) -> Result<Vec<T>, Error> {
        check_identifiers(ids)?;
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some((_, payload)) = self.entries.iter().find(|(m, _)| m.id() == id) {
                items.push(serde_json::from_str(payload)?);
            }
        }
        Ok(items)
    }

    fn remove_items(&mut self, ids: &[String]) -> Result<(), Error> {
        check_identifiers(ids)?;
        let all_present = ids
            .iter()
            .all(|id| self.entries.iter().any(|(m, _)| m.id() == id));
        if !all_present {
            return Err(StorageError::NoItemsToRemove.into());
        }
        self.entries.retain(|(m, _)| !ids.iter().any(|id| id == m.id()));
        Ok(())
    }

    fn remove_all_items(&mut self) -> Result<(), Error> {
        if self.entries.is_empty() {
            return Err(StorageError::NoItemsSaved.into());
        }
        self.entries.clear();
        Ok(())
    }

    fn is_saved(&self) -> bool {
        !self.entries.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZKPStoredCategory {
    MasterSecret,
    Credential,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ZKPMeta {
    pub id: String,
    pub category: ZKPStoredCategory,
}

impl ItemMeta for ZKPMeta {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Stored wallet record. `value` is the JSON of a [`MasterSecret`] or a [`ZKPCredential`].
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZKPInfo {
    pub id: String,
    pub ms_id: String,
    pub category: ZKPStoredCategory,
    pub value: serde_json::Value,
}

impl ZKPInfo {
    pub fn master_secret(ms: &MasterSecret) -> Result<(ZKPMeta, Self), Error> {
        Self::record(
            &ms.master_secret_id,
            &ms.master_secret_id,
            ZKPStoredCategory::MasterSecret,
            ms,
        )
    }

    pub fn credential(credential: &ZKPCredential, ms_id: &str) -> Result<(ZKPMeta, Self), Error> {
        Self::record(
            &credential.credential_id,
            ms_id,
            ZKPStoredCategory::Credential,
            credential,
        )
    }

    fn record<V: Serialize>(
        id: &str,
        ms_id: &str,
        category: ZKPStoredCategory,
        value: &V,
    ) -> Result<(ZKPMeta, Self), Error> {
        let meta = ZKPMeta {
            id: id.to_string(),
            category,
        };
        let info = Self {
            id: id.to_string(),
            ms_id: ms_id.to_string(),
            category,
            value: serde_json::to_value(value)?,
        };
        Ok((meta, info))
    }

    pub fn decode<V: DeserializeOwned>(&self) -> Result<V, Error> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rug::Integer;

    fn ms(id: &str) -> MasterSecret {
        MasterSecret {
            master_secret_id: id.to_string(),
            master_secret: Integer::from(42),
        }
    }

    fn store() -> MemoryStorage<ZKPMeta, ZKPInfo> {
        let mut store = MemoryStorage::new("wallet").unwrap();
        for id in ["ms-1", "ms-2", "ms-3"] {
            let (meta, info) = ZKPInfo::master_secret(&ms(id)).unwrap();
            store.add_item(meta, info).unwrap();
        }
        store
    }

    #[test]
    fn name_must_not_be_empty() {
        let err = MemoryStorage::<ZKPMeta, ZKPInfo>::new("").unwrap_err();
        assert_eq!(err.code(), "05001");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut store = store();
        let (meta, info) = ZKPInfo::master_secret(&ms("ms-2")).unwrap();
        assert_eq!(
            store.add_item(meta, info).unwrap_err(),
            Error::Storage(StorageError::ItemDuplicated { id: "ms-2".into() })
        );
        assert_eq!(store.get_all_items().unwrap().len(), 3);
    }

    #[test]
    fn items_follow_requested_order() {
        let store = store();
        let ids = vec!["ms-3".to_string(), "missing".to_string(), "ms-1".to_string()];
        let items = store.get_items(&ids).unwrap();
        let got: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(got, vec!["ms-3", "ms-1"]);
        assert_eq!(items[0].decode::<MasterSecret>().unwrap(), ms("ms-3"));

        let dup = vec!["ms-1".to_string(), "ms-1".to_string()];
        assert_eq!(store.get_items(&dup).unwrap_err().code(), "05002");
        assert_eq!(store.get_items(&[]).unwrap_err().code(), "05001");
    }

    #[test]
    fn removal_is_all_or_nothing() {
        let mut store = store();
        let ids = vec!["ms-1".to_string(), "missing".to_string()];
        assert_eq!(
            store.remove_items(&ids).unwrap_err(),
            Error::Storage(StorageError::NoItemsToRemove)
        );
        assert_eq!(store.get_all_metas().unwrap().len(), 3);

        store.remove_items(&["ms-1".to_string()]).unwrap();
        assert_eq!(store.get_all_metas().unwrap().len(), 2);

        store.remove_all_items().unwrap();
        assert!(!store.is_saved());
        assert_eq!(
            store.remove_all_items().unwrap_err(),
            Error::Storage(StorageError::NoItemsSaved)
        );
    }

    #[test]
    fn record_json_uses_wallet_field_names() {
        let (_, info) = ZKPInfo::master_secret(&ms("ms-1")).unwrap();
        let json = to_canonical_json(&info).unwrap();
        assert_eq!(
            json,
            r#"{"category":"masterSecret","id":"ms-1","msId":"ms-1","value":{"masterSecret":"42","masterSecretId":"ms-1"}}"#
        );
    }
}
