// Copyright 2024. The Hypergolix Contributors
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! `PersistenceCore`: orchestrates Doorman → Enforcer → Lawyer → Bookie →
//! Librarian → Undertaker → Postman for every ingest. Owns the four leaf
//! components exclusively (spec §9 "no cycles"); collaborators above (Oracle,
//! Gao, Privateer) hold only a shared reference to this type.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bookie::Bookie;
use crate::config::CoreConfig;
use crate::doorman::Doorman;
use crate::enforcer::Enforcer;
use crate::error::Result;
use crate::ghid::Ghid;
use crate::lawyer::Lawyer;
use crate::librarian::{DurableCache, Librarian};
use crate::postman::{Callback, Postman};
use crate::primitives::Parsed;
use crate::remote::Salmonator;
use crate::undertaker::Undertaker;

const LOG_TARGET: &str = "hypergolix::persistence";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Ingested(Ghid),
    AlreadyPresent(Ghid),
}

impl IngestOutcome {
    pub fn ghid(&self) -> Ghid {
        match self {
            IngestOutcome::Ingested(g) | IngestOutcome::AlreadyPresent(g) => *g,
        }
    }
}

struct CoreState<C: DurableCache> {
    librarian: Librarian<C>,
    bookie: Bookie,
    postman: Postman,
}

/// The transactional ingest pipeline plus subscription and query surface. Cheaply
/// cloneable (`Clone` via `Arc`-wrapped state) so `Gao`/`Oracle` instances can
/// share one core without borrowing lifetimes across await points.
pub struct PersistenceCore<C: DurableCache, R: crate::remote::RemotePeer = NullRemote> {
    state: Arc<Mutex<CoreState<C>>>,
    doorman: Doorman,
    enforcer: Enforcer,
    lawyer: Lawyer,
    undertaker: Undertaker,
    upstream: Option<Arc<Salmonator<R>>>,
    config: CoreConfig,
}

impl<C: DurableCache> PersistenceCore<C, NullRemote> {
    pub fn new(librarian: Librarian<C>, config: CoreConfig) -> Self {
        PersistenceCore {
            state: Arc::new(Mutex::new(CoreState {
                librarian,
                bookie: Bookie::new(),
                postman: Postman::new(),
            })),
            doorman: Doorman::new(),
            enforcer: Enforcer::new(config.max_history_len),
            lawyer: Lawyer::new(),
            undertaker: Undertaker::new(),
            upstream: None,
            config,
        }
    }
}

impl<C: DurableCache, R: crate::remote::RemotePeer> PersistenceCore<C, R> {
    pub fn with_upstream(librarian: Librarian<C>, config: CoreConfig, upstream: R) -> Self {
        PersistenceCore {
            state: Arc::new(Mutex::new(CoreState {
                librarian,
                bookie: Bookie::new(),
                postman: Postman::new(),
            })),
            doorman: Doorman::new(),
            enforcer: Enforcer::new(config.max_history_len),
            lawyer: Lawyer::new(),
            undertaker: Undertaker::new(),
            upstream: Some(Arc::new(Salmonator::new(upstream))),
            config,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Restore the Librarian and rebuild Bookie accounting from durable storage.
    /// Unlike `Librarian::restore`, this also replays each restored primitive
    /// through `Bookie::apply` so accounting indices match persisted content.
    pub async fn restore(&self) -> Result<usize> {
        let mut state = self.state.lock().await;
        let restored = state.librarian.restore()?;
        let lites: Vec<Parsed> = state.librarian.all_lites().cloned().collect();
        for lite in &lites {
            state.bookie.apply(lite);
        }
        Ok(restored)
    }

    /// Ingest a packed primitive through the full pipeline. Transactional: any
    /// failure leaves the Librarian and Bookie unchanged.
    pub async fn ingest(&self, packed: Vec<u8>, from_upstream: bool) -> Result<IngestOutcome> {
        let mut state = self.state.lock().await;

        let lite = self.doorman.inspect(&packed, &state.librarian)?;
        self.enforcer.validate(&lite)?;
        self.lawyer.validate(&lite, &state.librarian, &state.bookie)?;

        let ghid = lite.ghid();
        if state.librarian.has(&ghid) {
            tracing::trace!(target: LOG_TARGET, %ghid, "ingest: already present");
            return Ok(IngestOutcome::AlreadyPresent(ghid));
        }

        let superseded = state.bookie.apply(&lite);
        state.librarian.store(lite.clone(), packed.clone())?;
        self.undertaker.triage(&lite, superseded, &mut state.librarian, &mut state.bookie)?;
        state.postman.notify(&lite);

        tracing::debug!(target: LOG_TARGET, %ghid, kind = ?lite.kind(), "ingested");
        drop(state);

        if !from_upstream {
            if let Some(upstream) = &self.upstream {
                upstream.push_upstream(packed).await;
            }
        }

        Ok(IngestOutcome::Ingested(ghid))
    }

    pub async fn retrieve(&self, ghid: &Ghid) -> Result<Vec<u8>> {
        self.state.lock().await.librarian.retrieve(ghid)
    }

    pub async fn summarize(&self, ghid: &Ghid) -> Result<Parsed> {
        self.state.lock().await.librarian.summarize(ghid).map(|lite| lite.clone())
    }

    pub async fn has(&self, ghid: &Ghid) -> bool {
        self.state.lock().await.librarian.has(ghid)
    }

    pub async fn current_frame(&self, dynamic_ghid: &Ghid) -> Option<Ghid> {
        self.state.lock().await.bookie.current_frame(dynamic_ghid)
    }

    /// The container ghid targeted by `dynamic_ghid`'s current frame, if any.
    pub async fn current_frame_target(&self, dynamic_ghid: &Ghid) -> Option<Ghid> {
        let state = self.state.lock().await;
        let frame_ghid = state.bookie.current_frame(dynamic_ghid)?;
        match state.librarian.summarize(&frame_ghid) {
            Ok(Parsed::Gobd(g)) => Some(g.target),
            _ => None,
        }
    }

    pub async fn is_debound(&self, ghid: &Ghid) -> bool {
        self.state.lock().await.bookie.is_debound(ghid)
    }

    pub async fn subscribe(&self, ghid: Ghid, callback: Callback) {
        self.state.lock().await.postman.subscribe(ghid, callback);
    }

    pub async fn unsubscribe(&self, ghid: &Ghid, callback: &Callback) {
        self.state.lock().await.postman.unsubscribe(ghid, callback);
    }
}

/// A `RemotePeer` that is never actually reached — the default type parameter for
/// cores constructed with `PersistenceCore::new`, which carry no upstream.
pub enum NullRemote {}

#[async_trait::async_trait]
impl crate::remote::RemotePeer for NullRemote {
    async fn publish(&self, _packed: Vec<u8>) -> Result<()> {
        match *self {}
    }
    async fn get(&self, _ghid: Ghid) -> Result<Vec<u8>> {
        match *self {}
    }
    async fn subscribe(&self, _ghid: Ghid) -> Result<()> {
        match *self {}
    }
    async fn unsubscribe(&self, _ghid: Ghid) -> Result<()> {
        match *self {}
    }
    async fn query_bindings(&self, _ghid: Ghid) -> Result<Vec<Ghid>> {
        match *self {}
    }
    async fn query_debindings(&self, _ghid: Ghid) -> Result<Vec<Ghid>> {
        match *self {}
    }
    async fn disconnect(&self) -> Result<()> {
        match *self {}
    }
}
