//! Historical governance load.
//!
//! Executed once at node startup: rebuilds the full governance state by
//! scanning every block from the activation height to the tip. The scan is
//! sharded across worker threads in two phases — extract everything, then
//! reconcile each vote's spend status — because a vote and its proposal may
//! land in different shards.

use crate::engine::Governance;
use crate::error::GovernanceError;
use crate::vote::Vote;
use meridian_chain::ChainView;
use meridian_crypto::hash_transaction;
use meridian_types::{Hash256, Outpoint};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use tracing::info;

impl Governance {
    /// Rebuild the governance state from the chain.
    ///
    /// `n_threads` of 0 uses the available core count. The scan aborts on
    /// the first block read failure or when `shutdown` is raised; callers
    /// should [`reset`](Governance::reset) on error rather than trust
    /// partial state.
    pub fn load_governance_data<C>(
        &self,
        chain: &C,
        n_threads: usize,
        shutdown: &AtomicBool,
    ) -> Result<(), GovernanceError>
    where
        C: ChainView + Sync,
    {
        let activation = self.params().governance_activation_height;
        let tip = chain.height();
        // Nothing to load on a fresh chain or before activation.
        if tip <= 0 || tip < activation {
            return Ok(());
        }

        let cores = if n_threads == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            n_threads
        };

        // Every prevout spent anywhere on the chain, for phase 2's
        // vote-spend reconciliation.
        let spent_prevouts: Mutex<HashMap<Outpoint, (Hash256, i32)>> = Mutex::new(HashMap::new());
        let failed = AtomicBool::new(false);
        let fail_reason: Mutex<String> = Mutex::new(String::new());

        // Phase 1: shard the height range and extract records from every
        // block. Proposal-existence and spent-UTXO checks are disabled;
        // the tie-break rules still apply and commute across shards.
        let total_blocks = tip - activation;
        let slice = total_blocks / cores as i32;
        info!(from = activation, to = tip, cores, "loading governance data");

        thread::scope(|scope| {
            for k in 0..cores {
                let start = activation + k as i32 * slice;
                let end = if k == cores - 1 { tip + 1 } else { start + slice };
                let spent_prevouts = &spent_prevouts;
                let failed = &failed;
                let fail_reason = &fail_reason;
                scope.spawn(move || {
                    for height in start..end {
                        if shutdown.load(Ordering::Relaxed) {
                            failed.store(true, Ordering::Relaxed);
                            return;
                        }
                        let Some(index) = chain.block_index(height) else {
                            failed.store(true, Ordering::Relaxed);
                            append_reason(
                                fail_reason,
                                &format!("failed to read block index for block {height}"),
                            );
                            return;
                        };
                        let block = match chain.read_block(&index) {
                            Ok(block) => block,
                            Err(err) => {
                                failed.store(true, Ordering::Relaxed);
                                append_reason(
                                    fail_reason,
                                    &format!("failed to read block {height}: {err}"),
                                );
                                return;
                            }
                        };

                        {
                            let mut spent = spent_prevouts
                                .lock()
                                .expect("loader prevout map lock poisoned");
                            for tx in &block.vtx {
                                let txid = hash_transaction(tx);
                                for vin in &tx.vin {
                                    if !vin.prevout.is_null() {
                                        spent.insert(vin.prevout, (txid, height));
                                    }
                                }
                            }
                        }

                        self.process_block(&block, &index, false);
                    }
                });
            }
        });

        if failed.load(Ordering::Relaxed) {
            return Err(load_failure(shutdown, &fail_reason));
        }

        // Phase 2: reconcile. Every extracted vote either has a proposal
        // from an earlier block — then its spend status is settled against
        // the chain-wide prevout map — or it is an orphan and dropped.
        let snapshot: Vec<Vote> = {
            let state = self.lock();
            state.votes().cloned().collect()
        };
        if snapshot.is_empty() {
            return Ok(());
        }

        let spent_prevouts = spent_prevouts
            .into_inner()
            .expect("loader prevout map lock poisoned");
        let chunk_size = snapshot.len().div_ceil(cores);

        thread::scope(|scope| {
            for chunk in snapshot.chunks(chunk_size) {
                let spent_prevouts = &spent_prevouts;
                let failed = &failed;
                scope.spawn(move || {
                    for vote in chunk {
                        if shutdown.load(Ordering::Relaxed) {
                            failed.store(true, Ordering::Relaxed);
                            return;
                        }
                        let proposal = self.get_proposal(&vote.proposal);
                        match proposal {
                            Some(p) if p.block_number < vote.block_number => {
                                let mut vote = vote.clone();
                                if let Some((txid, height)) = spent_prevouts.get(&vote.utxo) {
                                    if *height <= p.superblock {
                                        vote.spend(*height, *txid);
                                    }
                                }
                                self.lock().add_vote(vote);
                            }
                            _ => {
                                // No proposal, or the proposal arrived at or
                                // after the vote: the vote never counted.
                                self.lock().remove_vote(&vote.hash());
                            }
                        }
                    }
                });
            }
        });

        if failed.load(Ordering::Relaxed) {
            return Err(load_failure(shutdown, &fail_reason));
        }

        let state = self.lock();
        info!(
            proposals = state.proposals().count(),
            votes = state.votes().count(),
            "governance data loaded"
        );
        Ok(())
    }
}

fn append_reason(fail_reason: &Mutex<String>, reason: &str) {
    let mut guard = fail_reason.lock().expect("loader reason lock poisoned");
    guard.push_str(reason);
    guard.push('\n');
}

fn load_failure(shutdown: &AtomicBool, fail_reason: &Mutex<String>) -> GovernanceError {
    if shutdown.load(Ordering::Relaxed) {
        return GovernanceError::Shutdown;
    }
    GovernanceError::Io(
        fail_reason
            .lock()
            .expect("loader reason lock poisoned")
            .clone(),
    )
}
