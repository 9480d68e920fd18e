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
use rug::{integer::Order, Integer};
use serde::Serialize;

pub trait IntegerExt {
    /// Minimal big-endian magnitude. Zero is the empty string and a negative
    /// value is prefixed by a `0x01` sign byte.
    fn to_transcript_bytes(&self) -> Vec<u8>;

    fn from_decimal(value: &str) -> Result<Integer, Error>;

    /// `self^exp mod n`, accepting negative exponents when `self` is invertible.
    fn pow_mod_checked(&self, exp: &Integer, n: &Integer, name: &str) -> Result<Integer, Error>;

    fn invert_checked(&self, n: &Integer, name: &str) -> Result<Integer, Error>;

    /// Least non-negative residue modulo a positive `n`.
    fn modulo(&self, n: &Integer) -> Integer;
}

impl IntegerExt for Integer {
    fn to_transcript_bytes(&self) -> Vec<u8> {
        let magnitude = self.to_digits::<u8>(Order::MsfBe);
        if *self < 0 {
            let mut bytes = Vec::with_capacity(magnitude.len() + 1);
            bytes.push(1u8);
            bytes.extend_from_slice(&magnitude);
            bytes
        } else {
            magnitude
        }
    }

    fn from_decimal(value: &str) -> Result<Integer, Error> {
        Integer::from_str_radix(value, 10)
            .map_err(|_| Error::Serialization(format!("'{}' is not a decimal integer", value)))
    }

    fn pow_mod_checked(&self, exp: &Integer, n: &Integer, name: &str) -> Result<Integer, Error> {
        self.pow_mod_ref(exp, n)
            .map(Integer::from)
            .ok_or_else(|| Error::inverse(name))
    }

    fn invert_checked(&self, n: &Integer, name: &str) -> Result<Integer, Error> {
        self.invert_ref(n)
            .map(Integer::from)
            .ok_or_else(|| Error::inverse(name))
    }

    fn modulo(&self, n: &Integer) -> Integer {
        let mut r = Integer::from(self % n);
        if r < 0 {
            r += n;
        }
        r
    }
}

/// Sorted-key JSON encoding used for stored payloads.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

/// Serde adapters encoding [`Integer`] values as decimal strings.
pub mod decimal {
    use super::IntegerExt;
    use rug::Integer;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Integer, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Integer, D::Error> {
        let s = String::deserialize(deserializer)?;
        Integer::from_decimal(&s).map_err(D::Error::custom)
    }

    pub mod map {
        use rug::Integer;
        use serde::{ser::SerializeMap, de::Error as _, Deserialize, Deserializer, Serializer};
        use std::collections::BTreeMap;

        use crate::utils::util::IntegerExt;

        pub fn serialize<S: Serializer>(
            value: &BTreeMap<String, Integer>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(value.len()))?;
            for (k, v) in value {
                map.serialize_entry(k, &v.to_string())?;
            }
            map.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<BTreeMap<String, Integer>, D::Error> {
            let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
            raw.into_iter()
                .map(|(k, v)| Integer::from_decimal(&v).map(|i| (k, i)))
                .collect::<Result<_, _>>()
                .map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Holder {
        #[serde(with = "decimal")]
        value: Integer,
        #[serde(with = "decimal::map")]
        values: BTreeMap<String, Integer>,
    }

    #[test]
    fn transcript_bytes_are_minimal() {
        assert_eq!(Integer::from(0).to_transcript_bytes(), Vec::<u8>::new());
        assert_eq!(Integer::from(1).to_transcript_bytes(), vec![1u8]);
        assert_eq!(Integer::from(256).to_transcript_bytes(), vec![1u8, 0]);
        assert_eq!(Integer::from(-256).to_transcript_bytes(), vec![1u8, 1, 0]);
    }

    #[test]
    fn integers_travel_as_decimal_strings() {
        let mut values = BTreeMap::new();
        values.insert("b".to_string(), Integer::from(7));
        let holder = Holder {
            value: Integer::from_str_radix("123456789012345678901234567890", 10).unwrap(),
            values,
        };
        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"value":"123456789012345678901234567890","values":{"b":"7"}}"#);
        assert_eq!(serde_json::from_str::<Holder>(&json).unwrap(), holder);
        assert!(serde_json::from_str::<Holder>(r#"{"value":"12a","values":{}}"#).is_err());
    }

    #[test]
    fn negative_exponent_needs_inverse() {
        let n = Integer::from(15);
        let r = Integer::from(2).pow_mod_checked(&Integer::from(-1), &n, "2").unwrap();
        assert_eq!(r, 8);
        let err = Integer::from(3).pow_mod_checked(&Integer::from(-1), &n, "3").unwrap_err();
        assert_eq!(err, Error::inverse("3"));
    }

    #[test]
    fn modulo_is_non_negative() {
        let n = Integer::from(7);
        assert_eq!(Integer::from(-2).modulo(&n), 5);
        assert_eq!(Integer::from(-14).modulo(&n), 0);
        assert_eq!(Integer::from(23).modulo(&n), 2);
    }

    #[test]
    fn canonical_json_sorts_keys() {
        #[derive(Serialize)]
        struct Unsorted {
            z: u8,
            a: u8,
        }
        assert_eq!(to_canonical_json(&Unsorted { z: 1, a: 2 }).unwrap(), r#"{"a":2,"z":1}"#);
    }
}
