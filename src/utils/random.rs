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

use crate::{cl::ciphersuites::CLCiphersuite, errors::Error, utils::util::IntegerExt};
use rand::RngCore;
use rug::{
    integer::{IsPrime, Order},
    Integer,
};

/// Rejection sampling budget of [`random_in_range`].
pub const MAX_ITERATIONS: usize = 1000;

/// Random integer of exactly `bits` significant bits (the top bit is always set).
/// `bits == 0` yields zero.
pub fn random_bits(bits: u32) -> Integer {
    if bits == 0 {
        return Integer::new();
    }

    let n_bytes = ((bits + 7) / 8) as usize;
    let mut buf = vec![0u8; n_bytes];
    rand::thread_rng().fill_bytes(&mut buf);

    let mut value = Integer::from_digits(buf.as_slice(), Order::MsfBe);
    value.keep_bits_mut(bits);
    value.set_bit(bits - 1, true);
    value
}

/// Uniform-ish integer in `[min, max]`.
///
/// # Description
/// When `min` is wider than half of `max` the range is shifted to start at zero.
/// Otherwise candidates as wide as `max` are drawn up to [`MAX_ITERATIONS`] times;
/// if none lands in range, a value one bit narrower than `max - min` is offset by `min`.
///
/// # Output
/// an [`Integer`] or [`Error::InvalidParameter`] when a bound is negative or `min > max`.
pub fn random_in_range(min: &Integer, max: &Integer) -> Result<Integer, Error> {
    if *min < 0 {
        return Err(Error::invalid_parameter("min"));
    }
    if *max < 0 {
        return Err(Error::invalid_parameter("max"));
    }
    if min > max {
        return Err(Error::invalid_parameter("'MIN' may not be greater than 'MAX'"));
    }
    if min == max {
        return Ok(min.clone());
    }

    if min.significant_bits() > max.significant_bits() / 2 {
        let shifted = Integer::from(max - min);
        return Ok(random_in_range(&Integer::new(), &shifted)? + min);
    }

    let width = max.significant_bits();
    for _ in 0..MAX_ITERATIONS {
        let x = random_bits(width);
        if &x >= min && &x <= max {
            return Ok(x);
        }
    }

    let span = Integer::from(max - min).significant_bits();
    Ok(random_bits(span.saturating_sub(1)) + min)
}

/// `random_in_range(0, max)`
pub fn random_number(max: &Integer) -> Result<Integer, Error> {
    random_in_range(&Integer::new(), max)
}

/// Miller-Rabin repetitions used by [`random_prime`] for a candidate of `max_bits`.
pub fn prime_certainty(max_bits: u32) -> u32 {
    if max_bits <= 1024 {
        80
    } else {
        96 + 16 * (max_bits - 1) / 1024
    }
}

/// Random prime `start + offset` where `offset` is an odd `interval_bits`-wide value
/// and the result fits in `max_bits`.
pub fn random_prime(start: &Integer, interval_bits: u32, max_bits: u32) -> Integer {
    let certainty = prime_certainty(max_bits);

    loop {
        let mut offset = random_bits(interval_bits);
        offset.set_bit(0, true);

        let candidate = Integer::from(start + &offset);
        if candidate.significant_bits() > max_bits {
            continue;
        }

        if candidate.is_probably_prime(certainty) != IsPrime::No {
            return candidate;
        }
    }
}

/// Random safe prime `p = 2p' + 1` of `bits` bits. Returns `(p, p')`.
pub fn random_safe_prime(bits: u32) -> (Integer, Integer) {
    let certainty = prime_certainty(bits);
    loop {
        let mut p_prime = random_bits(bits - 1);
        p_prime.next_prime_mut();
        let p = Integer::from(&p_prime << 1) + 1u32;
        if p.significant_bits() == bits && p.is_probably_prime(certainty) != IsPrime::No {
            return (p, p_prime);
        }
    }
}

/// Random element in `[4, p*q - 1]`.
pub fn generate_x(p: &Integer, q: &Integer) -> Result<Integer, Error> {
    let upper = Integer::from(p * q) - 3u32;
    Ok(random_in_range(&Integer::from(2), &upper)? + 2u32)
}

/// Random quadratic residue modulo `n`.
pub fn generate_qr(n: &Integer) -> Result<Integer, Error> {
    let x = random_number(n)?;
    Ok(x.square().modulo(n))
}

pub fn generate_nonce<CS: CLCiphersuite>() -> Integer {
    random_bits(CS::LARGE_NONCE)
}

pub fn generate_master_secret<CS: CLCiphersuite>() -> Integer {
    random_bits(CS::LARGE_MASTER_SECRET)
}

/// Random identifier formatted as a version 4 UUID.
pub fn random_uuid() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
