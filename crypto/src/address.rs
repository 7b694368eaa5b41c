//! Payout address encoding.
//!
//! Meridian addresses are bech32m strings with the `mrd` prefix whose data
//! part is the 20-byte key id of the destination key.

use bech32::{FromBase32, ToBase32, Variant};
use meridian_types::{KeyId, Script};
use thiserror::Error;

/// Human-readable prefix for Meridian addresses.
pub const ADDRESS_HRP: &str = "mrd";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("not a bech32 string: {0}")]
    Bech32(String),

    #[error("wrong address prefix {0:?}")]
    WrongPrefix(String),

    #[error("wrong bech32 variant")]
    WrongVariant,

    #[error("address payload is not 20 bytes")]
    BadLength,
}

/// Encode a key id as a Meridian address.
pub fn encode_address(keyid: &KeyId) -> String {
    bech32::encode(ADDRESS_HRP, keyid.as_bytes().to_base32(), Variant::Bech32m)
        .expect("hrp is static and valid")
}

/// Decode a Meridian address into its key id.
pub fn decode_address(address: &str) -> Result<KeyId, AddressError> {
    let (hrp, data, variant) =
        bech32::decode(address).map_err(|e| AddressError::Bech32(e.to_string()))?;
    if hrp != ADDRESS_HRP {
        return Err(AddressError::WrongPrefix(hrp));
    }
    if variant != Variant::Bech32m {
        return Err(AddressError::WrongVariant);
    }
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| AddressError::Bech32(e.to_string()))?;
    let keyid: [u8; 20] = bytes.try_into().map_err(|_| AddressError::BadLength)?;
    Ok(KeyId(keyid))
}

/// True if the string parses as a valid Meridian address.
pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

/// The payout script for an address.
pub fn script_for_address(address: &str) -> Result<Script, AddressError> {
    let keyid = decode_address(address)?;
    Ok(Script::pay_to_key_hash(&keyid))
}
