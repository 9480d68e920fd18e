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

use crate::{errors::Error, utils::util::IntegerExt};
use rug::Integer;

/// Pedersen commitment `z^z_exp * s^s_exp mod n`.
///
/// # Inputs
/// * `z`, `s` - bases
/// * `z_exp`, `s_exp` - exponents, negative values require the base to be invertible
/// * `n` - modulus
///
/// # Output
/// the commitment in `[0, n)`, or [`Error::Inverse`]
pub fn commitment(
    z: &Integer,
    z_exp: &Integer,
    s: &Integer,
    s_exp: &Integer,
    n: &Integer,
) -> Result<Integer, Error> {
    let z_mod = z.pow_mod_checked(z_exp, n, "commitment base z")?;
    let s_mod = s.pow_mod_checked(s_exp, n, "commitment base s")?;
    Ok((z_mod * s_mod).modulo(n))
}

/// Left-to-right square-and-multiply `base^exponent mod modulus` for a non-negative exponent.
pub fn mod_pow(base: &Integer, exponent: &Integer, modulus: &Integer) -> Integer {
    let base = base.modulo(modulus);
    let mut result = Integer::from(1);
    for bit in (0..exponent.significant_bits()).rev() {
        result = Integer::from(result.square_ref()).modulo(modulus);
        if exponent.get_bit(bit) {
            result = (result * &base).modulo(modulus);
        }
    }
    result.modulo(modulus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_matches_pow_mod() {
        let n = Integer::from(1009u32 * 1013u32);
        let z = Integer::from(123456);
        let s = Integer::from(654321);
        let c = commitment(&z, &Integer::from(77), &s, &Integer::from(1234), &n).unwrap();
        let expected = (Integer::from(z.pow_mod_ref(&Integer::from(77), &n).unwrap())
            * Integer::from(s.pow_mod_ref(&Integer::from(1234), &n).unwrap()))
            % &n;
        assert_eq!(c, expected);
    }

    #[test]
    fn negative_exponent_inverts_the_base() {
        let n = Integer::from(1009u32 * 1013u32);
        let z = Integer::from(5);
        let forward = commitment(&z, &Integer::from(3), &z, &Integer::from(0), &n).unwrap();
        let back = commitment(&z, &Integer::from(-3), &z, &Integer::from(0), &n).unwrap();
        assert_eq!((forward * back) % &n, 1);

        let not_unit = Integer::from(1009);
        assert!(matches!(
            commitment(&not_unit, &Integer::from(-1), &z, &Integer::from(1), &n),
            Err(Error::Inverse { .. })
        ));
    }

    #[test]
    fn square_and_multiply() {
        let n = Integer::from(1_000_000_007u64);
        for (b, e) in [(2u64, 0u64), (2, 10), (3, 200), (999_999_999, 12345)] {
            let expected = Integer::from(b).pow_mod(&Integer::from(e), &n).unwrap();
            assert_eq!(mod_pow(&Integer::from(b), &Integer::from(e), &n), expected);
        }
        assert_eq!(mod_pow(&Integer::from(-2), &Integer::from(3), &Integer::from(7)), 6);
    }
}
