//! Cryptographic primitives for the Meridian protocol.
//!
//! - **Double SHA-256** for hashing (txids, block hashes, governance records)
//! - **secp256k1 compact recoverable ECDSA** for vote signatures — the
//!   signer's public key is recovered from the signature itself
//! - Bech32 payout addresses with the `mrd` prefix

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::{
    decode_address, encode_address, script_for_address, validate_address, AddressError,
};
pub use hash::{hash256, hash256_multi, hash_block, hash_transaction, HashWriter};
pub use keys::{generate_keypair, key_id, keypair_from_seed, public_from_private};
pub use sign::{recover_compact, sign_compact};
