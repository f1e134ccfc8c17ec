//! Key derivation
//!
//! One master secret per recipient yields the two FF3 inputs. Each comes from
//! its own HMAC-SHA256 invocation under a distinct context label, so knowing
//! the tweak reveals nothing useful about the cipher key.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

pub const CIPHER_KEY_LEN: usize = 16;
pub const TWEAK_LEN: usize = 8;

const KEY_CONTEXT: &[u8] = b"FF3_KEY_DERIVATION_CONTEXT";
const TWEAK_CONTEXT: &[u8] = b"FF3_TWEAK_DERIVATION_CONTEXT";

/// FF3 key material derived from a master secret. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct DerivedKey {
    pub cipher_key: [u8; CIPHER_KEY_LEN],
    pub tweak: [u8; TWEAK_LEN],
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey").finish_non_exhaustive()
    }
}

fn hmac_sha256(key: &[u8], context: &[u8]) -> [u8; 32] {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(context);
    mac.finalize().into_bytes().into()
}

/// Split `master` into a 16-byte cipher key and an 8-byte tweak.
pub fn derive(master: &[u8]) -> DerivedKey {
    let key_hash = hmac_sha256(master, KEY_CONTEXT);
    let tweak_hash = hmac_sha256(master, TWEAK_CONTEXT);

    let mut cipher_key = [0u8; CIPHER_KEY_LEN];
    cipher_key.copy_from_slice(&key_hash[..CIPHER_KEY_LEN]);
    let mut tweak = [0u8; TWEAK_LEN];
    tweak.copy_from_slice(&tweak_hash[..TWEAK_LEN]);

    DerivedKey { cipher_key, tweak }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = derive(b"farmer-secret-001");
        let b = derive(b"farmer-secret-001");
        assert_eq!(a, b);
    }

    #[test]
    fn key_and_tweak_are_separated() {
        let secrets: [&[u8]; 5] = [b"", b"a", b"farmer-secret-001", &[0u8; 64], &[0xff; 7]];
        for secret in secrets {
            let derived = derive(secret);
            assert_ne!(&derived.cipher_key[..TWEAK_LEN], &derived.tweak[..]);
        }
    }

    #[test]
    fn different_secrets_give_different_material() {
        let a = derive(b"secret-a");
        let b = derive(b"secret-b");
        assert_ne!(a.cipher_key, b.cipher_key);
        assert_ne!(a.tweak, b.tweak);
    }

    #[test]
    fn matches_plain_hmac_truncation() {
        let derived = derive(b"key");
        let full = hmac_sha256(b"key", b"FF3_KEY_DERIVATION_CONTEXT");
        assert_eq!(&derived.cipher_key[..], &full[..16]);
    }
}
