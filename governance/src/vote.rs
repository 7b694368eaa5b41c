//! Votes on treasury proposals.
//!
//! A vote is cast on behalf of a UTXO: the UTXO's value is the voting
//! weight and its controlling key must sign the vote. Two hashes matter:
//! the identity hash excludes the answer so a changed vote replaces the
//! original record, and the signature hash includes the answer plus the
//! vin-hash replay binding.

use crate::codec::{RecordType, NETWORK_VERSION};
use meridian_chain::TxProvider;
use meridian_crypto::{hash256, key_id, recover_compact, sign_compact, HashWriter};
use meridian_types::encode::put_var_bytes;
use meridian_types::{
    Amount, ConsensusParams, Cursor, DecodeError, Encodable, Hash256, KeyId, Outpoint, PrivateKey,
    PublicKey, TxIn,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Size of the truncated prevout hash carried in every vote.
pub const VIN_HASH_SIZE: usize = 12;

/// The answer a vote gives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoteType {
    No = 0,
    Yes = 1,
    Abstain = 2,
}

impl VoteType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::No),
            1 => Some(Self::Yes),
            2 => Some(Self::Abstain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Yes => "yes",
            Self::Abstain => "abstain",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown vote type")]
pub struct UnknownVoteType;

impl FromStr for VoteType {
    type Err = UnknownVoteType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "no" => Ok(Self::No),
            "yes" => Ok(Self::Yes),
            "abstain" => Ok(Self::Abstain),
            _ => Err(UnknownVoteType),
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The truncated hash of a carrier-transaction prevout.
///
/// Every vote names one of its transaction's own inputs this way; a vote
/// copied into a foreign transaction fails the binding and is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VinHash(pub [u8; VIN_HASH_SIZE]);

/// Compute the vin hash of a prevout: the first 12 bytes of its hash.
pub fn vin_hash(prevout: &Outpoint) -> VinHash {
    let digest = hash256(&prevout.encode());
    let mut out = [0u8; VIN_HASH_SIZE];
    out.copy_from_slice(&digest.as_bytes()[..VIN_HASH_SIZE]);
    VinHash(out)
}

/// Why a vote failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VoteError {
    #[error("bad vote network version {0}")]
    BadVersion(u8),

    #[error("bad vote record type {0}")]
    BadType(u8),

    #[error("vote utxo value {0} is below the minimum")]
    DustAmount(Amount),

    #[error("vote utxo is unknown or not a standard single-key output")]
    UnknownUtxo,

    #[error("recovered pubkey does not control the vote utxo")]
    KeyMismatch,

    #[error("vin hash does not match any input of the carrier transaction")]
    ReplayMismatch,
}

/// A vote on a proposal.
///
/// The first seven fields travel on chain; the rest are derived during
/// extraction and never serialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub version: u8,
    pub record_type: u8,
    /// Identity hash of the proposal being voted on.
    pub proposal: Hash256,
    pub vote: VoteType,
    /// The UTXO this vote speaks for. Its value is the vote's weight.
    pub utxo: Outpoint,
    pub vin_hash: VinHash,
    /// Compact recoverable signature over [`Vote::sig_hash`].
    pub signature: Vec<u8>,

    /// Public key recovered from the signature.
    pub pubkey: Option<PublicKey>,
    /// Outpoint of the carrier `OP_RETURN` output (not the voting UTXO).
    pub outpoint: Outpoint,
    /// Time of the block carrying the vote.
    pub time: i64,
    /// Value of the voting UTXO.
    pub amount: Amount,
    /// Key id controlling the voting UTXO.
    pub keyid: KeyId,
    /// Height of the block carrying the vote.
    pub block_number: i32,
    /// Height at which the voting UTXO was spent; 0 while unspent.
    pub spent_block: i32,
    /// Hash of the transaction that spent the voting UTXO.
    pub spent_txhash: Hash256,
}

impl Vote {
    pub fn new(proposal: Hash256, vote: VoteType, utxo: Outpoint, vin_hash: VinHash) -> Self {
        Self {
            version: NETWORK_VERSION,
            record_type: RecordType::Vote as u8,
            proposal,
            vote,
            utxo,
            vin_hash,
            signature: Vec::new(),
            pubkey: None,
            outpoint: Outpoint::default(),
            time: 0,
            amount: Amount::ZERO,
            keyid: KeyId::default(),
            block_number: 0,
            spent_block: 0,
            spent_txhash: Hash256::ZERO,
        }
    }

    pub fn is_null(&self) -> bool {
        self.utxo == Outpoint::default()
    }

    /// The vote's identity hash. The answer is deliberately excluded so a
    /// changed vote lands on the same record.
    pub fn hash(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write(&[self.version, self.record_type])
            .write_encodable(&self.proposal)
            .write_encodable(&self.utxo);
        w.finish()
    }

    /// The hash the signature commits to: identity fields plus the answer
    /// and the anti-replay vin hash.
    pub fn sig_hash(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write(&[self.version, self.record_type])
            .write_encodable(&self.proposal)
            .write(&[self.vote as u8])
            .write_encodable(&self.utxo)
            .write(&self.vin_hash.0);
        w.finish()
    }

    /// Sign the vote with the key controlling its UTXO. Returns false if
    /// signing or self-recovery fails.
    pub fn sign(&mut self, key: &PrivateKey) -> bool {
        self.signature.clear();
        let Some(sig) = sign_compact(&self.sig_hash(), key) else {
            return false;
        };
        self.signature = sig.to_vec();
        self.pubkey = recover_compact(&self.sig_hash(), &self.signature);
        self.pubkey.is_some()
    }

    pub fn decode(cur: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        let version = cur.get_u8()?;
        let record_type = cur.get_u8()?;
        let proposal = cur.get_hash256()?;
        let vote_byte = cur.get_u8()?;
        let utxo = cur.get_outpoint()?;
        let vin = VinHash(cur.get_array::<VIN_HASH_SIZE>()?);
        let signature = cur.get_var_bytes()?;

        // An out-of-range answer cannot construct the closed enum.
        let vote = VoteType::from_u8(vote_byte).ok_or(DecodeError::InvalidValue("vote type"))?;

        let mut v = Self::new(proposal, vote, utxo, vin);
        v.version = version;
        v.record_type = record_type;
        v.signature = signature;
        v.pubkey = recover_compact(&v.sig_hash(), &v.signature);
        Ok(v)
    }

    /// Resolve the voting UTXO through the node's transaction index,
    /// filling in the vote's weight and controlling key id.
    pub fn resolve_utxo(&mut self, tx_provider: &dyn TxProvider) {
        let Some(tx) = tx_provider.get_transaction(&self.utxo.txid) else {
            return;
        };
        let Some(out) = tx.vout.get(self.utxo.vout as usize) else {
            return;
        };
        let Some(keyid) = out.script_pubkey.extract_destination() else {
            return;
        };
        self.keyid = keyid;
        self.amount = out.value;
    }

    /// Structural validation: envelope, weight, and the binding between the
    /// recovered signing key and the UTXO's controlling key.
    pub fn validate(&self, params: &ConsensusParams) -> Result<(), VoteError> {
        if self.version != NETWORK_VERSION {
            return Err(VoteError::BadVersion(self.version));
        }
        if self.record_type != RecordType::Vote as u8 {
            return Err(VoteError::BadType(self.record_type));
        }
        if self.amount < params.vote_min_utxo_amount {
            return Err(VoteError::DustAmount(self.amount));
        }
        if self.keyid.is_null() {
            return Err(VoteError::UnknownUtxo);
        }
        match &self.pubkey {
            Some(pubkey) if key_id(pubkey) == self.keyid => Ok(()),
            _ => Err(VoteError::KeyMismatch),
        }
    }

    /// Full validation including the anti-replay binding: the vote's vin
    /// hash must match one of the carrier transaction's prevouts.
    pub fn validate_in_tx(
        &self,
        vin_hashes: &HashSet<VinHash>,
        params: &ConsensusParams,
    ) -> Result<(), VoteError> {
        self.validate(params)?;
        if !vin_hashes.contains(&self.vin_hash) {
            return Err(VoteError::ReplayMismatch);
        }
        Ok(())
    }

    /// Mark the voting UTXO spent at the given block by the given tx.
    pub fn spend(&mut self, block: i32, txhash: Hash256) {
        self.spent_block = block;
        self.spent_txhash = txhash;
    }

    /// Clear the spent marker if it matches the given block and tx exactly.
    pub fn unspend(&mut self, block: i32, txhash: Hash256) -> bool {
        if self.spent_block == block && self.spent_txhash == txhash {
            self.spent_block = 0;
            self.spent_txhash = Hash256::ZERO;
            return true;
        }
        false
    }

    pub fn is_spent(&self) -> bool {
        self.spent_block > 0
    }

    /// True if the input's scriptSig reveals a public key with the same key
    /// id as this vote's signer.
    pub fn matches_vin_pubkey(&self, vin: &TxIn) -> bool {
        let Some(vote_key) = &self.pubkey else {
            return false;
        };
        for op in vin.script_sig.ops() {
            if op.data.len() == 33 {
                let mut raw = [0u8; 33];
                raw.copy_from_slice(op.data);
                return key_id(&PublicKey(raw)) == key_id(vote_key);
            }
        }
        false
    }
}

/// If the output carries a vote record, decode it. Wallet-side helper for
/// locating a wallet's own votes.
pub fn vote_in_txout(txout: &meridian_types::TxOut) -> Option<Vote> {
    let payload = crate::codec::governance_payload(&txout.script_pubkey)?;
    let envelope = crate::codec::Envelope::decode(payload).ok()?;
    if !envelope.is_valid()
        || crate::codec::RecordType::from_u8(envelope.record_type)
            != Some(crate::codec::RecordType::Vote)
    {
        return None;
    }
    Vote::decode(&mut Cursor::new(payload)).ok()
}

impl Encodable for Vote {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.push(self.version);
        out.push(self.record_type);
        self.proposal.encode_to(out);
        out.push(self.vote as u8);
        self.utxo.encode_to(out);
        out.extend_from_slice(&self.vin_hash.0);
        put_var_bytes(out, &self.signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_crypto::keypair_from_seed;

    fn prevout() -> Outpoint {
        Outpoint::new(Hash256::new([3u8; 32]), 1)
    }

    fn signed_vote(vote_type: VoteType) -> Vote {
        let kp = keypair_from_seed(&[2u8; 32]);
        let mut vote = Vote::new(
            Hash256::new([0xaa; 32]),
            vote_type,
            Outpoint::new(Hash256::new([0xbb; 32]), 0),
            vin_hash(&prevout()),
        );
        assert!(vote.sign(&kp.private));
        vote
    }

    #[test]
    fn vote_type_strings() {
        assert_eq!("YES".parse::<VoteType>(), Ok(VoteType::Yes));
        assert_eq!("no".parse::<VoteType>(), Ok(VoteType::No));
        assert_eq!("Abstain".parse::<VoteType>(), Ok(VoteType::Abstain));
        assert_eq!("maybe".parse::<VoteType>(), Err(UnknownVoteType));
        assert_eq!(VoteType::Yes.as_str(), "yes");
    }

    #[test]
    fn vin_hash_is_stable_truncation() {
        let h = vin_hash(&prevout());
        let full = hash256(&prevout().encode());
        assert_eq!(&h.0[..], &full.as_bytes()[..VIN_HASH_SIZE]);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let vote = signed_vote(VoteType::Yes);
        let bytes = vote.encode();
        let mut cur = Cursor::new(&bytes);
        let decoded = Vote::decode(&mut cur).unwrap();
        assert_eq!(decoded.hash(), vote.hash());
        assert_eq!(decoded.sig_hash(), vote.sig_hash());
        assert_eq!(decoded.pubkey, vote.pubkey);
        assert_eq!(decoded.vote, VoteType::Yes);
    }

    #[test]
    fn decode_rejects_out_of_range_answer() {
        let vote = signed_vote(VoteType::Yes);
        let mut bytes = vote.encode();
        bytes[34] = 9; // the answer byte follows version, type, proposal
        let mut cur = Cursor::new(&bytes);
        assert!(Vote::decode(&mut cur).is_err());
    }

    #[test]
    fn identity_hash_ignores_answer() {
        let yes = signed_vote(VoteType::Yes);
        let no = signed_vote(VoteType::No);
        assert_eq!(yes.hash(), no.hash());
        assert_ne!(yes.sig_hash(), no.sig_hash());
    }

    #[test]
    fn recovered_pubkey_matches_signer() {
        let kp = keypair_from_seed(&[2u8; 32]);
        let vote = signed_vote(VoteType::Abstain);
        assert_eq!(vote.pubkey, Some(kp.public));
    }

    #[test]
    fn tampered_answer_recovers_wrong_key() {
        let kp = keypair_from_seed(&[2u8; 32]);
        let mut vote = signed_vote(VoteType::Yes);
        vote.vote = VoteType::No; // sig_hash changes under the signature
        let recovered = recover_compact(&vote.sig_hash(), &vote.signature);
        assert_ne!(recovered, Some(kp.public));
    }

    #[test]
    fn replay_binding() {
        let params = ConsensusParams::regtest();
        let kp = keypair_from_seed(&[2u8; 32]);
        let mut vote = signed_vote(VoteType::Yes);
        vote.amount = Amount::from_coins(1);
        vote.keyid = key_id(&kp.public);

        let mut hashes = HashSet::new();
        hashes.insert(vin_hash(&prevout()));
        assert_eq!(vote.validate_in_tx(&hashes, &params), Ok(()));

        let foreign: HashSet<VinHash> =
            [vin_hash(&Outpoint::new(Hash256::new([9; 32]), 0))].into();
        assert_eq!(
            vote.validate_in_tx(&foreign, &params),
            Err(VoteError::ReplayMismatch)
        );
    }

    #[test]
    fn dust_vote_rejected() {
        let params = ConsensusParams::regtest();
        let kp = keypair_from_seed(&[2u8; 32]);
        let mut vote = signed_vote(VoteType::Yes);
        vote.keyid = key_id(&kp.public);
        vote.amount = Amount::new(Amount::COIN - 1);
        assert_eq!(
            vote.validate(&params),
            Err(VoteError::DustAmount(vote.amount))
        );
    }

    #[test]
    fn key_mismatch_rejected() {
        let params = ConsensusParams::regtest();
        let other = keypair_from_seed(&[7u8; 32]);
        let mut vote = signed_vote(VoteType::Yes);
        vote.amount = Amount::from_coins(1);
        vote.keyid = key_id(&other.public); // utxo owned by someone else
        assert_eq!(vote.validate(&params), Err(VoteError::KeyMismatch));
    }

    #[test]
    fn vote_in_txout_finds_votes_only() {
        use meridian_types::{Script, TxOut};
        let vote = signed_vote(VoteType::Yes);
        let carrier = TxOut::new(Amount::ZERO, Script::op_return(&vote.encode()));
        let found = vote_in_txout(&carrier).unwrap();
        assert_eq!(found.hash(), vote.hash());

        let plain = TxOut::new(
            Amount::from_coins(1),
            Script::pay_to_key_hash(&KeyId([1; 20])),
        );
        assert!(vote_in_txout(&plain).is_none());
    }

    #[test]
    fn spend_and_unspend_are_exact() {
        let mut vote = signed_vote(VoteType::Yes);
        assert!(!vote.is_spent());
        vote.spend(180, Hash256::new([1; 32]));
        assert!(vote.is_spent());

        // Wrong height or tx leaves the marker alone.
        assert!(!vote.unspend(181, Hash256::new([1; 32])));
        assert!(!vote.unspend(180, Hash256::new([2; 32])));
        assert!(vote.is_spent());

        assert!(vote.unspend(180, Hash256::new([1; 32])));
        assert!(!vote.is_spent());
    }
}
