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

use crate::cl::ciphersuites::CLCiphersuite;
use digest::Digest;
use rug::{integer::Order, Integer};

/// A raw value is numeric when it is non-empty and made only of ASCII digits.
/// Signs, spaces and decimal points make it a plain string.
pub fn is_numeric(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Maps a raw attribute value to the integer signed by the issuer.
///
/// # Description
/// Numeric values are taken as base-10 integers (`"007"` encodes to `7`), any
/// other value is hashed with the ciphersuite digest and read big-endian.
///
/// # Output
/// the encoded [`Integer`]
pub fn map_attribute_to_integer<CS: CLCiphersuite>(raw: &str) -> Integer {
    if is_numeric(raw) {
        if let Ok(value) = Integer::from_str_radix(raw, 10) {
            return value;
        }
    }
    map_message_to_integer_as_hash::<CS>(raw.as_bytes())
}

pub fn map_message_to_integer_as_hash<CS: CLCiphersuite>(data: &[u8]) -> Integer {
    let digest = <CS::HashAlg as Digest>::digest(data);
    Integer::from_digits(digest.as_slice(), Order::MsfBe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::ciphersuites::CL2048Sha256;

    fn encode_attribute(raw: &str) -> String {
        map_attribute_to_integer::<CL2048Sha256>(raw).to_string()
    }

    #[test]
    fn numeric_values_keep_their_number() {
        assert_eq!(encode_attribute("12345"), "12345");
        assert_eq!(encode_attribute("007"), "7");
        assert_eq!(encode_attribute("0"), "0");
    }

    #[test]
    fn strings_are_hashed() {
        assert_eq!(
            encode_attribute("hello"),
            "20329878786436204988385760252021328656300425018755239228739303522659023427620"
        );
        assert_eq!(
            encode_attribute("Alice"),
            "27034640024117331033063128044004318218486816931520886405535659934417438781507"
        );
    }

    #[test]
    fn signs_and_blanks_are_not_numeric() {
        assert!(!is_numeric(""));
        assert!(!is_numeric("-5"));
        assert!(!is_numeric("+5"));
        assert!(!is_numeric("1.5"));
        assert!(!is_numeric(" 12"));
        assert_ne!(encode_attribute("-5"), "-5");
    }

    #[test]
    fn empty_value_is_hashed() {
        // sha256("") read big-endian, never zero
        assert_eq!(
            encode_attribute(""),
            "102987336249554097029535212322581322789799900648198034993379397001115665086549"
        );
    }
}
