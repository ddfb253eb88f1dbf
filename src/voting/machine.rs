//! The peer consensus-voting machine (spec.md §4.6): candidate refresh,
//! parallel polling with a per-query deadline, and leader election.

use std::collections::HashMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::{watch, RwLock};

use crate::config::VotingConfig;
use crate::time::Clock;
use crate::traits::{BlockStore, PeerTransport};
use crate::types::PeerId;

use super::candidate::{Candidate, RegisterEntry};

/// `Starting -> Polling <-> Voting -> Polling`, terminal `Stopping`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MachineState {
    Starting,
    Polling,
    Voting,
    Stopping,
}

#[derive(Default)]
pub struct VotingState {
    pub registry: FxHashMap<PeerId, RegisterEntry>,
    pub candidates: FxHashMap<PeerId, Candidate>,
    pub elected_height: Option<u64>,
    pub elected_peer_id: Option<PeerId>,
    /// Set when the largest agreeing bucket does not match local history,
    /// signalling a fork to the surrounding layer (spec.md §4.6).
    pub fork_detected: bool,
}

pub struct VotingMachine {
    state: RwLock<VotingState>,
    machine_state: RwLock<MachineState>,
    config: VotingConfig,
    clock: Arc<dyn Clock>,
    transport: Arc<dyn PeerTransport>,
    block_store: Arc<dyn BlockStore>,
    self_id: PeerId,
}

impl VotingMachine {
    pub fn new(
        config: VotingConfig,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn PeerTransport>,
        block_store: Arc<dyn BlockStore>,
        self_id: PeerId,
    ) -> Self {
        Self {
            state: RwLock::new(VotingState::default()),
            machine_state: RwLock::new(MachineState::Starting),
            config,
            clock,
            transport,
            block_store,
            self_id,
        }
    }

    pub async fn machine_state(&self) -> MachineState {
        *self.machine_state.read().await
    }

    pub async fn elected_height(&self) -> Option<u64> {
        self.state.read().await.elected_height
    }

    pub async fn elected_peer_id(&self) -> Option<PeerId> {
        self.state.read().await.elected_peer_id.clone()
    }

    pub async fn fork_detected(&self) -> bool {
        self.state.read().await.fork_detected
    }

    pub async fn register_peer(&self, peer_id: PeerId, addr: String) {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        state.registry.insert(
            peer_id.clone(),
            RegisterEntry {
                registered: true,
                register_time: now,
            },
        );
        state.candidates.insert(peer_id.clone(), Candidate::new(peer_id, addr));
    }

    pub async fn unregister_peer(&self, peer_id: &PeerId) {
        let mut state = self.state.write().await;
        if let Some(entry) = state.registry.get_mut(peer_id) {
            entry.registered = false;
        }
        state.candidates.remove(peer_id);
    }

    /// Rebuild the candidate list from the peer register, excluding self
    /// and peers unregistered or whose registration has expired
    /// (spec.md §4.6 "Candidate refresh").
    pub async fn refresh_candidates(&self) {
        let now = self.clock.now();
        let expire = self.config.register_expire_time;
        let mut state = self.state.write().await;

        let expired_or_gone: Vec<PeerId> = state
            .registry
            .iter()
            .filter(|(peer_id, entry)| {
                *peer_id == &self.self_id
                    || !entry.registered
                    || entry.register_time + expire < now
            })
            .map(|(peer_id, _)| peer_id.clone())
            .collect();

        for peer_id in expired_or_gone {
            state.candidates.remove(&peer_id);
        }
    }

    /// Poll every current candidate in parallel, each bounded by the
    /// per-query deadline; a failure just leaves that candidate's metrics
    /// stale this cycle (spec.md §4.6 "Polling"). Step 2 queries the digest
    /// at the REMOTE height just reported, matching
    /// `original_source/p2p/metricsVoting.go`'s `RemoteDigestOfHeight(id,
    /// height)` call with the height from `QueryBlockHeight` — not the
    /// local height, despite the candidate field's name (see DESIGN.md).
    pub async fn poll_cycle(&self) {
        let local_height = self.block_store.height();
        let peer_ids: Vec<PeerId> = {
            let state = self.state.read().await;
            state.candidates.keys().cloned().collect()
        };

        let mut joins = Vec::with_capacity(peer_ids.len());
        for peer_id in peer_ids {
            let transport = Arc::clone(&self.transport);
            let timeout = self.config.voting_query_timeout;
            joins.push(tokio::spawn(async move {
                let result = tokio::time::timeout(timeout, async {
                    let remote_height = transport.query_block_height(&peer_id).await?;
                    let digest = transport
                        .remote_digest_of_height(&peer_id, remote_height)
                        .await?;
                    Some((remote_height, digest))
                })
                .await;
                (peer_id, result.ok().flatten())
            }));
        }

        let now = self.clock.now();
        let mut state = self.state.write().await;
        for join in joins {
            match join.await {
                Ok((peer_id, Some((remote_height, digest)))) => {
                    if let Some(candidate) = state.candidates.get_mut(&peer_id) {
                        candidate.remote_height = Some(remote_height);
                        candidate.local_height_at_query = Some(local_height);
                        candidate.remote_digest_at_local_height = Some(digest);
                        candidate.last_response_time = Some(now);
                    }
                }
                Ok((peer_id, None)) => {
                    log::debug!("voting: peer {peer_id} query failed or timed out this cycle");
                }
                Err(join_err) => {
                    log::warn!("voting: candidate poll task panicked: {join_err}");
                }
            }
        }
    }

    /// Leader election (spec.md §4.6 "Election rule"): group candidates by
    /// the digest they reported at the local height; within the bucket
    /// whose digest matches local history, pick the highest remote height,
    /// tie-broken by most recent response then lexicographic peer id. If
    /// no bucket matches local history, elect the largest bucket overall
    /// and flag a fork.
    pub async fn elect(&self, local_digest_at_local_height: [u8; 32]) {
        let mut state = self.state.write().await;

        let mut buckets: HashMap<[u8; 32], Vec<Candidate>> = HashMap::new();
        for candidate in state.candidates.values() {
            if let Some(digest) = candidate.remote_digest_at_local_height {
                buckets.entry(digest).or_default().push(candidate.clone());
            }
        }

        if buckets.is_empty() {
            state.elected_height = None;
            state.elected_peer_id = None;
            state.fork_detected = false;
            return;
        }

        let matching_bucket = buckets.get(&local_digest_at_local_height);
        let (winning_bucket, fork) = match matching_bucket {
            Some(bucket) => (bucket.clone(), false),
            None => {
                let largest = buckets
                    .values()
                    .max_by_key(|bucket| bucket.len())
                    .cloned()
                    .unwrap_or_default();
                (largest, true)
            }
        };

        let winner = winning_bucket.into_iter().max_by(|a, b| {
            a.remote_height
                .cmp(&b.remote_height)
                .then_with(|| a.last_response_time.cmp(&b.last_response_time))
                .then_with(|| a.peer_id.cmp(&b.peer_id))
        });

        state.fork_detected = fork;
        match winner {
            Some(candidate) => {
                state.elected_height = candidate.remote_height;
                state.elected_peer_id = Some(candidate.peer_id);
            }
            None => {
                state.elected_height = None;
                state.elected_peer_id = None;
            }
        }
    }

    /// Drive the `Starting -> Polling <-> Voting -> Polling` cycle until
    /// `shutdown` fires, at which point the machine moves to `Stopping`
    /// and returns.
    pub async fn run(&self, local_digest_fn: impl Fn(u64) -> Option<[u8; 32]>, mut shutdown: watch::Receiver<bool>) {
        *self.machine_state.write().await = MachineState::Polling;
        let mut ticker = tokio::time::interval(self.config.voting_cycle_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh_candidates().await;
                    *self.machine_state.write().await = MachineState::Polling;
                    self.poll_cycle().await;

                    *self.machine_state.write().await = MachineState::Voting;
                    let local_height = self.block_store.height();
                    if let Some(digest) = local_digest_fn(local_height) {
                        self.elect(digest).await;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        *self.machine_state.write().await = MachineState::Stopping;
                        return;
                    }
                }
            }
        }
    }
}
