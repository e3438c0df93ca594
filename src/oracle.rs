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

//! The Oracle: registry of live `Gao`s keyed by stable ghid, wiring each one's
//! Postman subscription to its `pull`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex as AsyncMutex;

use crate::error::{HypergolixError, Result};
use crate::gao::Gao;
use crate::ghid::Ghid;
use crate::ghid_proxy::GhidProxier;
use crate::golix::GolixCore;
use crate::librarian::DurableCache;
use crate::persistence::PersistenceCore;
use crate::privateer::{Privateer, Secret};
use crate::remote::RemotePeer;

const LOG_TARGET: &str = "hypergolix::oracle";

/// Registry of `Gao`s keyed by their stable ghid, with get-or-create semantics
/// over the shared `PersistenceCore` and `Privateer`.
pub struct Oracle<C: DurableCache, R: RemotePeer> {
    core: Arc<PersistenceCore<C, R>>,
    golix: Arc<GolixCore>,
    privateer: Arc<StdMutex<Privateer>>,
    objects: AsyncMutex<HashMap<Ghid, Arc<Gao<C, R>>>>,
}

impl<C: DurableCache + 'static, R: RemotePeer + 'static> Oracle<C, R> {
    pub fn new(core: Arc<PersistenceCore<C, R>>, golix: Arc<GolixCore>) -> Self {
        Oracle {
            core,
            golix,
            privateer: Arc::new(StdMutex::new(Privateer::new())),
            objects: AsyncMutex::new(HashMap::new()),
        }
    }

    /// Create, push, subscribe to, and register a brand-new dynamic object.
    pub async fn create_dynamic(
        self: &Arc<Self>,
        legroom: usize,
        master_secret: Option<Secret>,
        initial_state: Vec<u8>,
    ) -> Result<Arc<Gao<C, R>>> {
        let gao = Arc::new(Gao::new_dynamic(
            self.core.clone(),
            self.golix.clone(),
            self.privateer.clone(),
            legroom,
            master_secret,
        ));
        gao.push(initial_state).await?;
        let ghid = gao.ghid().await.expect("push just assigned a ghid");

        {
            let mut objects = self.objects.lock().await;
            objects.insert(ghid, gao.clone());
        }
        self.subscribe(ghid, gao.clone());
        tracing::debug!(target: LOG_TARGET, %ghid, "created dynamic object");
        Ok(gao)
    }

    /// Wrap an already-known static container, registering it for hold/delete.
    pub async fn adopt_static(self: &Arc<Self>, container_ghid: Ghid) -> Arc<Gao<C, R>> {
        let gao = Arc::new(Gao::new_static(
            self.core.clone(),
            self.golix.clone(),
            self.privateer.clone(),
            container_ghid,
        ));
        let mut objects = self.objects.lock().await;
        objects.insert(container_ghid, gao.clone());
        gao
    }

    /// Look up an already-registered object, or resolve `ghid` to its backing
    /// container and hand back a fresh static wrapper for it.
    pub async fn get_or_resolve(self: &Arc<Self>, ghid: Ghid) -> Result<Arc<Gao<C, R>>> {
        if let Some(gao) = self.objects.lock().await.get(&ghid).cloned() {
            return Ok(gao);
        }
        if !self.core.has(&ghid).await {
            return Err(HypergolixError::NotFound(ghid));
        }
        let target = GhidProxier::resolve(&self.core, ghid).await;
        Ok(self.adopt_static(target).await)
    }

    fn subscribe(self: &Arc<Self>, ghid: Ghid, gao: Arc<Gao<C, R>>) {
        let core = self.core.clone();
        let callback: crate::postman::Callback = Arc::new(move |notification_ghid| {
            let gao = gao.clone();
            tokio::spawn(async move {
                if let Err(e) = gao.pull(notification_ghid).await {
                    tracing::warn!(target: LOG_TARGET, %notification_ghid, error = %e, "pull failed");
                }
            });
        });
        tokio::spawn(async move {
            core.subscribe(ghid, callback).await;
        });
    }

    pub async fn forget(&self, ghid: &Ghid) {
        self.objects.lock().await.remove(ghid);
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::CoreConfig;
    use crate::golix::Identity;
    use crate::librarian::{Librarian, MemoryCache};
    use crate::persistence::NullRemote;

    fn new_oracle() -> Arc<Oracle<MemoryCache, NullRemote>> {
        let core = Arc::new(PersistenceCore::new(Librarian::new(MemoryCache::new()), CoreConfig::default()));
        Arc::new(Oracle::new(core, Arc::new(GolixCore::new(Identity::generate()))))
    }

    #[tokio::test]
    async fn create_dynamic_registers_and_is_retrievable() {
        let oracle = new_oracle();
        oracle.core.ingest(oracle.golix.make_gidc().1, false).await.unwrap();

        let gao = oracle.create_dynamic(7, None, b"v1".to_vec()).await.unwrap();
        let ghid = gao.ghid().await.unwrap();
        assert_eq!(oracle.len().await, 1);

        let fetched = oracle.get_or_resolve(ghid).await.unwrap();
        assert_eq!(fetched.state().await, b"v1".to_vec());
    }

    #[tokio::test]
    async fn get_or_resolve_unknown_ghid_fails() {
        let oracle = new_oracle();
        let err = oracle.get_or_resolve(Ghid::derive(b"nowhere")).await.unwrap_err();
        assert!(matches!(err, HypergolixError::NotFound(_)));
    }

    #[tokio::test]
    async fn adopt_static_wraps_an_existing_container() {
        let oracle = new_oracle();
        oracle.core.ingest(oracle.golix.make_gidc().1, false).await.unwrap();

        let (container, packed) = oracle.golix.make_container(b"frozen", &Secret::new_random());
        oracle.core.ingest(packed, false).await.unwrap();

        let gao = oracle.adopt_static(container.ghid).await;
        assert_eq!(gao.ghid().await, Some(container.ghid));
    }
}
