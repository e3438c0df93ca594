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

//! The remote peer protocol the core consumes (§6.2) and the `Salmonator`-style
//! upstream collaborator `PersistenceCore::ingest` calls on local-origin publishes.
//! Neither commits the crate to a transport or wire framing.

use async_trait::async_trait;

use crate::error::Result;
use crate::ghid::Ghid;

/// A minimal request/response protocol to an upstream or peer node. The core
/// implements both sides: as a server for other peers' requests, and as a client
/// against its own configured upstream.
#[async_trait]
pub trait RemotePeer: Send + Sync {
    async fn publish(&self, packed: Vec<u8>) -> Result<()>;
    async fn get(&self, ghid: Ghid) -> Result<Vec<u8>>;
    async fn subscribe(&self, ghid: Ghid) -> Result<()>;
    async fn unsubscribe(&self, ghid: Ghid) -> Result<()>;
    async fn query_bindings(&self, ghid: Ghid) -> Result<Vec<Ghid>>;
    async fn query_debindings(&self, ghid: Ghid) -> Result<Vec<Ghid>>;
    async fn disconnect(&self) -> Result<()>;
}

/// Pushes locally-originated ingests upstream and fetches on-demand during pulls.
/// A thin collaborator over `RemotePeer`; failures here are logged, not
/// propagated, since the local ingest they follow has already durably succeeded
/// (spec §4.8: `Salmonator.push_upstream(packed)` is explicitly "optional").
pub struct Salmonator<R: RemotePeer> {
    upstream: R,
}

const LOG_TARGET: &str = "hypergolix::remote";

impl<R: RemotePeer> Salmonator<R> {
    pub fn new(upstream: R) -> Self {
        Salmonator { upstream }
    }

    pub async fn push_upstream(&self, packed: Vec<u8>) {
        if let Err(e) = self.upstream.publish(packed).await {
            tracing::warn!(target: LOG_TARGET, error = %e, "upstream push failed, continuing locally");
        }
    }

    pub async fn fetch(&self, ghid: Ghid) -> Result<Vec<u8>> {
        self.upstream.get(ghid).await
    }
}
