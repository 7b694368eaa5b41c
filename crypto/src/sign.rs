//! Compact recoverable ECDSA signatures.
//!
//! Votes carry a 65-byte compact signature: one header byte encoding the
//! recovery id, then the 64-byte r‖s pair. Verification recovers the public
//! key from the signature and message, so no key travels on the wire.

use meridian_types::{CompactSignature, Hash256, PrivateKey, PublicKey};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, SecretKey};

/// Header offset for compact signatures over compressed public keys.
const COMPACT_HEADER_COMPRESSED: u8 = 31;

/// Sign a 32-byte message hash, producing a compact recoverable signature.
///
/// Returns `None` if the private key is invalid.
pub fn sign_compact(msg: &Hash256, private: &PrivateKey) -> Option<CompactSignature> {
    let secret = SecretKey::from_slice(&private.0).ok()?;
    let message = Message::from_digest(*msg.as_bytes());
    let secp = Secp256k1::signing_only();
    let (rec_id, data) = secp
        .sign_ecdsa_recoverable(&message, &secret)
        .serialize_compact();

    let mut out = [0u8; 65];
    out[0] = COMPACT_HEADER_COMPRESSED + rec_id.to_i32() as u8;
    out[1..].copy_from_slice(&data);
    Some(CompactSignature(out))
}

/// Recover the public key that produced a compact signature over `msg`.
///
/// Returns `None` for malformed signatures (bad length, header out of range,
/// or a point that does not recover).
pub fn recover_compact(msg: &Hash256, signature: &[u8]) -> Option<PublicKey> {
    let sig: &[u8; 65] = signature.try_into().ok()?;
    let header = sig[0];
    if !(27..=34).contains(&header) {
        return None;
    }
    let rec_id = RecoveryId::from_i32(((header - 27) & 0x03) as i32).ok()?;
    let recoverable = RecoverableSignature::from_compact(&sig[1..], rec_id).ok()?;

    let message = Message::from_digest(*msg.as_bytes());
    let secp = Secp256k1::verification_only();
    let public = secp.recover_ecdsa(&message, &recoverable).ok()?;
    Some(PublicKey(public.serialize()))
}
