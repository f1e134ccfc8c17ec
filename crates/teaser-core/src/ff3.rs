//! FF3 format-preserving encryption, radix 10 (NIST SP 800-38G)
//!
//! Eight Feistel rounds over a digit string split into halves of
//! `u = ceil(n / 2)` and `v = n - u` digits. The round function is AES-128
//! under the byte-reversed key, fed `W xor i || NUM(rev(B))` and read back
//! reversed. The 64-bit tweak is split into `TL || TR`; even rounds use `TR`.
//!
//! Digits are passed around as `u8` values in `0..=9`, most significant first.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;
use zeroize::Zeroize;

use crate::error::CodeError;
use crate::kdf::{DerivedKey, CIPHER_KEY_LEN, TWEAK_LEN};

const RADIX: u128 = 10;
const ROUNDS: u8 = 8;
const BLOCK_LEN: usize = 16;

/// Smallest length whose domain reaches one million values.
pub const MIN_LEN: usize = 6;
/// `2 * floor(96 / log2(10))`: each half must fit the 96-bit slot of `P`.
pub const MAX_LEN: usize = 56;

pub struct Ff3 {
    aes: Aes128,
    tweak: [u8; TWEAK_LEN],
}

impl Ff3 {
    pub fn new(key: &[u8; CIPHER_KEY_LEN], tweak: &[u8; TWEAK_LEN]) -> Self {
        let mut reversed = *key;
        reversed.reverse();
        let aes = Aes128::new(GenericArray::from_slice(&reversed));
        reversed.zeroize();
        Self { aes, tweak: *tweak }
    }

    pub fn from_derived(key: &DerivedKey) -> Self {
        Self::new(&key.cipher_key, &key.tweak)
    }

    pub fn encrypt(&self, digits: &[u8]) -> Result<Vec<u8>, CodeError> {
        check_digits(digits)?;
        let n = digits.len();
        let u = (n + 1) / 2;
        let v = n - u;
        let mut a = digits[..u].to_vec();
        let mut b = digits[u..].to_vec();

        for round in 0..ROUNDS {
            let (m, w) = self.round_params(round, u, v);
            let y = self.round_value(round, w, &b);
            let modulus = RADIX.pow(m as u32);
            let c = (num_rev(&a) + y % modulus) % modulus;
            a = std::mem::replace(&mut b, str_rev(c, m));
        }

        a.extend_from_slice(&b);
        Ok(a)
    }

    pub fn decrypt(&self, digits: &[u8]) -> Result<Vec<u8>, CodeError> {
        check_digits(digits)?;
        let n = digits.len();
        let u = (n + 1) / 2;
        let v = n - u;
        let mut a = digits[..u].to_vec();
        let mut b = digits[u..].to_vec();

        for round in (0..ROUNDS).rev() {
            let (m, w) = self.round_params(round, u, v);
            let y = self.round_value(round, w, &a);
            let modulus = RADIX.pow(m as u32);
            let c = (num_rev(&b) + modulus - y % modulus) % modulus;
            b = std::mem::replace(&mut a, str_rev(c, m));
        }

        a.extend_from_slice(&b);
        Ok(a)
    }

    fn round_params(&self, round: u8, u: usize, v: usize) -> (usize, &[u8]) {
        let (tl, tr) = self.tweak.split_at(TWEAK_LEN / 2);
        if round % 2 == 0 {
            (u, tr)
        } else {
            (v, tl)
        }
    }

    fn round_value(&self, round: u8, w: &[u8], half: &[u8]) -> u128 {
        let mut p = [0u8; BLOCK_LEN];
        p[..4].copy_from_slice(w);
        p[3] ^= round;
        // NUM(rev(B)) < 10^28 < 2^96, so the top four bytes are always zero.
        let num = num_rev(half).to_be_bytes();
        p[4..].copy_from_slice(&num[4..]);
        p.reverse();

        let mut block = GenericArray::clone_from_slice(&p);
        self.aes.encrypt_block(&mut block);
        let mut s = [0u8; BLOCK_LEN];
        s.copy_from_slice(&block);
        s.reverse();
        u128::from_be_bytes(s)
    }
}

fn check_digits(digits: &[u8]) -> Result<(), CodeError> {
    if !(MIN_LEN..=MAX_LEN).contains(&digits.len()) {
        return Err(CodeError::UnsupportedLength(digits.len()));
    }
    if digits.iter().any(|d| u128::from(*d) >= RADIX) {
        return Err(CodeError::Validation("digit out of range".into()));
    }
    Ok(())
}

/// Value of the reversed digit string: `digits[0]` is the least significant.
fn num_rev(digits: &[u8]) -> u128 {
    digits
        .iter()
        .rev()
        .fold(0u128, |acc, d| acc * RADIX + u128::from(*d))
}

/// `m` digits of `value`, least significant first.
fn str_rev(mut value: u128, m: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(m);
    for _ in 0..m {
        out.push((value % RADIX) as u8);
        value /= RADIX;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits(s: &str) -> Vec<u8> {
        s.bytes().map(|b| b - b'0').collect()
    }

    fn render(d: &[u8]) -> String {
        d.iter().map(|x| char::from(b'0' + x)).collect()
    }

    fn cipher(key_hex: &str, tweak_hex: &str) -> Ff3 {
        let key: [u8; 16] = hex::decode(key_hex).unwrap().try_into().unwrap();
        let tweak: [u8; 8] = hex::decode(tweak_hex).unwrap().try_into().unwrap();
        Ff3::new(&key, &tweak)
    }

    #[test]
    fn nist_sample_1() {
        let c = cipher("EF4359D8D580AA4F7F036D6F04FC6A94", "D8E7920AFA330A73");
        let ct = c.encrypt(&digits("890121234567890000")).unwrap();
        assert_eq!(render(&ct), "750918814058654607");
        assert_eq!(render(&c.decrypt(&ct).unwrap()), "890121234567890000");
    }

    #[test]
    fn nist_sample_2() {
        let c = cipher("EF4359D8D580AA4F7F036D6F04FC6A94", "9A768A92F60E12D8");
        let ct = c.encrypt(&digits("890121234567890000")).unwrap();
        assert_eq!(render(&ct), "018989839189395384");
        assert_eq!(render(&c.decrypt(&ct).unwrap()), "890121234567890000");
    }

    #[test]
    fn odd_length_round_trips() {
        let c = cipher("00112233445566778899aabbccddeeff", "0001020304050607");
        let pt = digits("1234567");
        let ct = c.encrypt(&pt).unwrap();
        assert_eq!(ct.len(), 7);
        assert_eq!(c.decrypt(&ct).unwrap(), pt);
    }

    #[test]
    fn rejects_short_domain() {
        let c = cipher("00112233445566778899aabbccddeeff", "0001020304050607");
        assert_eq!(
            c.encrypt(&digits("12345")).unwrap_err(),
            CodeError::UnsupportedLength(5)
        );
    }

    #[test]
    fn reversed_numbering_helpers() {
        assert_eq!(num_rev(&[1, 2, 3]), 321);
        assert_eq!(str_rev(321, 5), vec![1, 2, 3, 0, 0]);
    }
}
