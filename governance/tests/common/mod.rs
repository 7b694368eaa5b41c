//! Shared test fixture: an in-memory network with funded voters.

use meridian_chain::{BlockIndex, ChainView, MemoryChain};
use meridian_crypto::{encode_address, hash_transaction, key_id, keypair_from_seed};
use meridian_governance::{vin_hash, Governance, Proposal, Vote, VoteType};
use meridian_types::{
    Amount, ConsensusParams, Encodable, Hash256, KeyPair, Outpoint, Script, Transaction, TxIn,
    TxOut,
};
use std::sync::Arc;

/// A wallet holding one voting UTXO and spare fee UTXOs for carrier
/// transactions.
pub struct Voter {
    pub keys: KeyPair,
    pub vote_utxo: Outpoint,
    pub fee_utxos: Vec<Outpoint>,
    next_fee: usize,
}

impl Voter {
    pub fn take_fee(&mut self) -> Outpoint {
        let fee = self.fee_utxos[self.next_fee];
        self.next_fee += 1;
        fee
    }
}

pub struct TestNet {
    pub chain: Arc<MemoryChain>,
    pub gov: Arc<Governance>,
    pub params: ConsensusParams,
}

pub fn block_time(height: i32) -> i64 {
    1_000_000 + height as i64 * 10
}

/// Best-effort tracing init so `RUST_LOG` works under `cargo test`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a network with the engine registered as a validation listener.
pub fn setup(params: ConsensusParams) -> TestNet {
    let chain = Arc::new(MemoryChain::new());
    let gov = Arc::new(Governance::new(
        params.clone(),
        chain.clone(),
        chain.clone(),
        chain.clone(),
    ));
    chain.register_listener(gov.clone());
    TestNet { chain, gov, params }
}

/// Build a network whose engine is NOT listening; blocks only touch the
/// chain state. Used to stage a chain for the historical loader.
pub fn setup_detached(params: ConsensusParams) -> TestNet {
    let chain = Arc::new(MemoryChain::new());
    let gov = Arc::new(Governance::new(
        params.clone(),
        chain.clone(),
        chain.clone(),
        chain.clone(),
    ));
    TestNet { chain, gov, params }
}

impl TestNet {
    /// Connect a block carrying the given transactions at the next height.
    pub fn connect(&self, vtx: Vec<Transaction>) -> BlockIndex {
        let height = self.chain.height() + 1;
        self.chain.connect_block(meridian_types::Block {
            time: block_time(height),
            vtx,
            ..Default::default()
        })
    }

    /// Connect empty blocks until the chain tip reaches `height`.
    pub fn advance_to(&self, height: i32) {
        while self.chain.height() < height {
            self.connect(Vec::new());
        }
    }

    /// Fund `n` voters in one block: each gets a voting UTXO of
    /// `vote_coins` and two 1-coin fee UTXOs.
    pub fn fund_voters(&self, n: usize, vote_coins: i64) -> Vec<Voter> {
        let mut voters = Vec::with_capacity(n);
        let mut vtx = Vec::new();
        for i in 0..n {
            let keys = keypair_from_seed(&[i as u8 + 10; 32]);
            let script = Script::pay_to_key_hash(&key_id(&keys.public));
            let tx = Transaction {
                vin: vec![TxIn::new(Outpoint::NULL)],
                vout: vec![
                    TxOut::new(Amount::from_coins(vote_coins), script.clone()),
                    TxOut::new(Amount::from_coins(1), script.clone()),
                    TxOut::new(Amount::from_coins(1), script),
                ],
                ..Default::default()
            };
            let txid = hash_transaction(&tx);
            voters.push(Voter {
                keys,
                vote_utxo: Outpoint::new(txid, 0),
                fee_utxos: vec![Outpoint::new(txid, 1), Outpoint::new(txid, 2)],
                next_fee: 0,
            });
            vtx.push(tx);
        }
        self.connect(vtx);
        voters
    }

    /// One extra funded outpoint for submitting proposals.
    pub fn fund_outpoint(&self) -> Outpoint {
        let keys = keypair_from_seed(&[99; 32]);
        let tx = Transaction {
            vin: vec![TxIn::new(Outpoint::NULL)],
            vout: vec![TxOut::new(
                Amount::from_coins(1),
                Script::pay_to_key_hash(&key_id(&keys.public)),
            )],
            // Distinct txid for every funding block.
            lock_time: (self.chain.height() + 1) as u32,
            ..Default::default()
        };
        let txid = hash_transaction(&tx);
        self.connect(vec![tx]);
        Outpoint::new(txid, 0)
    }
}

/// A payout address for proposals.
pub fn payout_address(seed: u8) -> String {
    encode_address(&key_id(&keypair_from_seed(&[seed; 32]).public))
}

pub fn proposal(name: &str, superblock: i32, coins: i64, address_seed: u8) -> Proposal {
    Proposal::new(
        name,
        superblock,
        Amount::from_coins(coins),
        payout_address(address_seed),
        "",
        "",
    )
}

/// A transaction carrying one proposal record.
pub fn proposal_tx(proposal: &Proposal, funding: Outpoint) -> Transaction {
    Transaction {
        vin: vec![TxIn::new(funding)],
        vout: vec![TxOut::new(
            Amount::ZERO,
            Script::op_return(&proposal.encode()),
        )],
        ..Default::default()
    }
}

/// A transaction carrying one signed vote per `(proposal, answer)` pair,
/// all cast by `voter` and funded from one of its fee UTXOs.
pub fn vote_tx(voter: &mut Voter, ballots: &[(Hash256, VoteType)]) -> Transaction {
    let fee = voter.take_fee();
    let mut vout = Vec::new();
    for (proposal, answer) in ballots {
        let mut vote = Vote::new(*proposal, *answer, voter.vote_utxo, vin_hash(&fee));
        assert!(vote.sign(&voter.keys.private));
        vout.push(TxOut::new(Amount::ZERO, Script::op_return(&vote.encode())));
    }
    Transaction {
        vin: vec![TxIn::new(fee)],
        vout,
        ..Default::default()
    }
}

/// A plain transaction spending `outpoint` to an anonymous destination.
pub fn spend_tx(outpoint: Outpoint) -> Transaction {
    Transaction {
        vin: vec![TxIn::new(outpoint)],
        vout: vec![TxOut::new(
            Amount::from_coins(1),
            Script::pay_to_key_hash(&meridian_types::KeyId([0xee; 20])),
        )],
        ..Default::default()
    }
}
