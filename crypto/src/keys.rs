//! Key generation and key-id derivation.

use crate::hash::hash256;
use meridian_types::{KeyId, KeyPair, PrivateKey, PublicKey};
use secp256k1::{Secp256k1, SecretKey};

/// Generate a fresh random key pair.
pub fn generate_keypair() -> KeyPair {
    let secret = SecretKey::new(&mut rand::thread_rng());
    keypair_from_secret(secret)
}

/// Derive a key pair deterministically from a 32-byte seed.
///
/// Intended for tests and tooling; the seed is hashed until it lands in the
/// secp256k1 scalar range.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    let mut candidate = *seed;
    loop {
        if let Ok(secret) = SecretKey::from_slice(&candidate) {
            return keypair_from_secret(secret);
        }
        candidate = *hash256(&candidate).as_bytes();
    }
}

/// Compute the public key for a private key.
pub fn public_from_private(private: &PrivateKey) -> Option<PublicKey> {
    let secret = SecretKey::from_slice(&private.0).ok()?;
    let public = secret.public_key(&Secp256k1::signing_only());
    Some(PublicKey(public.serialize()))
}

/// The 20-byte key id of a public key: the first 20 bytes of the double
/// SHA-256 of its compressed encoding. Payout scripts and vote-UTXO binding
/// both work in terms of key ids.
pub fn key_id(public: &PublicKey) -> KeyId {
    let digest = hash256(public.as_bytes());
    let mut id = [0u8; 20];
    id.copy_from_slice(&digest.as_bytes()[..20]);
    KeyId(id)
}

fn keypair_from_secret(secret: SecretKey) -> KeyPair {
    let public = secret.public_key(&Secp256k1::signing_only());
    KeyPair {
        public: PublicKey(public.serialize()),
        private: PrivateKey(secret.secret_bytes()),
    }
}
