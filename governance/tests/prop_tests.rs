use proptest::prelude::*;

use meridian_crypto::keypair_from_seed;
use meridian_governance::{vin_hash, Proposal, Vote, VoteType};
use meridian_types::{Amount, Cursor, Encodable, Hash256, Outpoint};

fn vote_type() -> impl Strategy<Value = VoteType> {
    prop_oneof![
        Just(VoteType::No),
        Just(VoteType::Yes),
        Just(VoteType::Abstain),
    ]
}

proptest! {
    /// Encode∘decode is identity on proposals (hash and all fields).
    #[test]
    fn proposal_roundtrip(
        superblock in 0i32..1_000_000,
        amount in 0i64..=21_000_000 * Amount::COIN,
        name in "[a-zA-Z0-9_][a-zA-Z0-9_\\- ]{0,18}[a-zA-Z0-9_]",
        url in "[ -~]{0,24}",
        description in "[ -~]{0,24}",
    ) {
        let proposal = Proposal::new(
            name.clone(),
            superblock,
            Amount::new(amount),
            "mrd1qqqsyqcyq5rqwzqfpg9scrgwpugpzysn7xqmr9",
            url.clone(),
            description.clone(),
        );
        let bytes = proposal.encode();
        let mut cur = Cursor::new(&bytes);
        let decoded = Proposal::decode(&mut cur).unwrap();
        prop_assert!(cur.is_empty());
        prop_assert_eq!(decoded.hash(), proposal.hash());
        prop_assert_eq!(decoded.name, name);
        prop_assert_eq!(decoded.url, url);
        prop_assert_eq!(decoded.description, description);
        prop_assert_eq!(decoded.superblock, superblock);
        prop_assert_eq!(decoded.amount, Amount::new(amount));
    }

    /// Encode∘decode is identity on signed votes, and the decoded record
    /// recovers the same signer.
    #[test]
    fn vote_roundtrip(
        seed in any::<[u8; 32]>(),
        proposal in any::<[u8; 32]>(),
        answer in vote_type(),
        utxo_txid in any::<[u8; 32]>(),
        utxo_vout in any::<u32>(),
        prevout_txid in any::<[u8; 32]>(),
    ) {
        let keys = keypair_from_seed(&seed);
        let prevout = Outpoint::new(Hash256::new(prevout_txid), 0);
        let mut vote = Vote::new(
            Hash256::new(proposal),
            answer,
            Outpoint::new(Hash256::new(utxo_txid), utxo_vout),
            vin_hash(&prevout),
        );
        prop_assert!(vote.sign(&keys.private));

        let bytes = vote.encode();
        let mut cur = Cursor::new(&bytes);
        let decoded = Vote::decode(&mut cur).unwrap();
        prop_assert!(cur.is_empty());
        prop_assert_eq!(decoded.hash(), vote.hash());
        prop_assert_eq!(decoded.sig_hash(), vote.sig_hash());
        prop_assert_eq!(decoded.vote, answer);
        prop_assert_eq!(decoded.pubkey, Some(keys.public));
    }

    /// The identity hash never depends on the answer; the signature hash
    /// always does.
    #[test]
    fn identity_excludes_answer(
        proposal in any::<[u8; 32]>(),
        utxo_txid in any::<[u8; 32]>(),
        a in vote_type(),
        b in vote_type(),
    ) {
        let utxo = Outpoint::new(Hash256::new(utxo_txid), 0);
        let vh = vin_hash(&utxo);
        let va = Vote::new(Hash256::new(proposal), a, utxo, vh);
        let vb = Vote::new(Hash256::new(proposal), b, utxo, vh);
        prop_assert_eq!(va.hash(), vb.hash());
        prop_assert_eq!(va.sig_hash() == vb.sig_hash(), a == b);
    }

    /// Truncating a serialized vote always fails to decode.
    #[test]
    fn truncated_vote_rejected(cut in 1usize..80) {
        let keys = keypair_from_seed(&[1; 32]);
        let mut vote = Vote::new(
            Hash256::new([2; 32]),
            VoteType::Yes,
            Outpoint::new(Hash256::new([3; 32]), 0),
            vin_hash(&Outpoint::new(Hash256::new([4; 32]), 1)),
        );
        prop_assert!(vote.sign(&keys.private));
        let bytes = vote.encode();
        prop_assume!(cut < bytes.len());
        let mut cur = Cursor::new(&bytes[..bytes.len() - cut]);
        prop_assert!(Vote::decode(&mut cur).is_err());
    }
}
