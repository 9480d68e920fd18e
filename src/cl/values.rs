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

use crate::{cl::ciphersuites::MASTER_SECRET_KEY, errors::Error, utils::ordered::OrderedMap};
use rug::Integer;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AttributeVisibility {
    Known,
    Hidden,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CredentialValue {
    pub visibility: AttributeVisibility,
    pub value: Integer,
}

impl CredentialValue {
    pub fn is_hidden(&self) -> bool {
        self.visibility == AttributeVisibility::Hidden
    }
}

/// Encoded attribute values of one credential, each marked known or hidden.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CredentialValues {
    values: OrderedMap<CredentialValue>,
}

impl CredentialValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hidden(&mut self, key: &str, value: Integer) -> Result<(), Error> {
        self.add(key, AttributeVisibility::Hidden, value)
    }

    pub fn add_known(&mut self, key: &str, value: Integer) -> Result<(), Error> {
        self.add(key, AttributeVisibility::Known, value)
    }

    fn add(&mut self, key: &str, visibility: AttributeVisibility, value: Integer) -> Result<(), Error> {
        if self.values.contains_key(key) {
            return Err(Error::Duplicated {
                detail: key.to_string(),
            });
        }
        self.values.insert(key, CredentialValue { visibility, value });
        Ok(())
    }

    /// Values of an issued credential as seen by the signature check: the master
    /// secret is hidden, every attribute is known.
    pub fn for_signature<'a, I>(master_secret: &Integer, attributes: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (&'a str, Integer)>,
    {
        let mut values = Self::new();
        values.add_hidden(MASTER_SECRET_KEY, master_secret.clone())?;
        for (key, value) in attributes {
            values.add_known(key, value)?;
        }
        Ok(values)
    }

    pub fn get(&self, key: &str) -> Option<&CredentialValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CredentialValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut values = CredentialValues::new();
        values.add_hidden(MASTER_SECRET_KEY, Integer::from(1)).unwrap();
        values.add_known("age", Integer::from(30)).unwrap();
        assert_eq!(
            values.add_hidden("age", Integer::from(31)).unwrap_err(),
            Error::Duplicated { detail: "age".into() }
        );
        assert!(values.get(MASTER_SECRET_KEY).unwrap().is_hidden());
        assert!(!values.get("age").unwrap().is_hidden());
    }

    #[test]
    fn signature_values_hide_only_the_master_secret() {
        let attrs = vec![("name", Integer::from(7)), ("age", Integer::from(30))];
        let values = CredentialValues::for_signature(&Integer::from(99), attrs).unwrap();
        assert_eq!(values.len(), 3);
        let hidden: Vec<&str> = values.iter().filter(|(_, v)| v.is_hidden()).map(|(k, _)| k).collect();
        assert_eq!(hidden, vec![MASTER_SECRET_KEY]);

        let clash = vec![(MASTER_SECRET_KEY, Integer::from(1))];
        assert!(CredentialValues::for_signature(&Integer::from(99), clash).is_err());
    }
}
