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

//! The Golix-Aware Object: binds a persistence primitive, a privateer secret, and
//! an in-memory payload into push (publish) / pull (reconcile) semantics.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex as AsyncMutex;

use crate::error::{HypergolixError, Result};
use crate::ghid::Ghid;
use crate::golix::GolixCore;
use crate::librarian::DurableCache;
use crate::persistence::PersistenceCore;
use crate::primitives::lite::GobdLite;
use crate::primitives::Parsed;
use crate::privateer::{Privateer, Secret};
use crate::remote::RemotePeer;

const LOG_TARGET: &str = "hypergolix::gao";

/// Stats returned from a healing pull, mirroring the teacher's practice of
/// returning small result structs from internal operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealStats {
    pub frames_healed: usize,
    pub legroom: usize,
}

struct GaoInner {
    ghid: Option<Ghid>,
    dynamic: bool,
    author: Ghid,
    legroom: usize,
    frame_history: VecDeque<Ghid>,
    target_history: VecDeque<Option<Ghid>>,
    is_alive: bool,
    state: Vec<u8>,
    master_secret: Option<Secret>,
    held_bindings: Vec<Ghid>,
}

/// Cancellation-safe finalizer: runs `Privateer::abandon` on drop unless
/// explicitly disarmed, matching the teacher's RAII scope-guard convention for
/// stage/commit pairs instead of manual `try`/`catch`.
struct StageGuard<'p> {
    privateer: &'p StdMutex<Privateer>,
    ghid: Ghid,
    disarmed: bool,
}

impl<'p> StageGuard<'p> {
    fn new(privateer: &'p StdMutex<Privateer>, ghid: Ghid) -> Self {
        StageGuard { privateer, ghid, disarmed: false }
    }

    fn disarm(mut self) {
        self.disarmed = true;
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        if !self.disarmed {
            tracing::debug!(target: LOG_TARGET, ghid = %self.ghid, "staged secret abandoned on unwind");
            self.privateer.lock().expect("privateer mutex poisoned").abandon(self.ghid);
        }
    }
}

/// Per-object logic: push new frame, pull update, heal ratchet, freeze, hold,
/// delete. Push and pull on a single `Gao` are serialized by `inner` (spec §5
/// "ordering guarantees").
pub struct Gao<C: DurableCache, R: RemotePeer> {
    core: Arc<PersistenceCore<C, R>>,
    golix: Arc<GolixCore>,
    privateer: Arc<StdMutex<Privateer>>,
    inner: AsyncMutex<GaoInner>,
}

impl<C: DurableCache, R: RemotePeer> Gao<C, R> {
    /// Register a not-yet-pushed dynamic object. `ghid` becomes known only after
    /// the first successful `push`.
    pub fn new_dynamic(
        core: Arc<PersistenceCore<C, R>>,
        golix: Arc<GolixCore>,
        privateer: Arc<StdMutex<Privateer>>,
        legroom: usize,
        master_secret: Option<Secret>,
    ) -> Self {
        let author = golix.identity().ghid();
        Gao {
            core,
            golix,
            privateer,
            inner: AsyncMutex::new(GaoInner {
                ghid: None,
                dynamic: true,
                author,
                legroom,
                frame_history: VecDeque::new(),
                target_history: VecDeque::new(),
                is_alive: true,
                state: Vec::new(),
                master_secret,
                held_bindings: Vec::new(),
            }),
        }
    }

    /// Wrap an already-published static container (a `Geoc`) for hold/delete.
    pub fn new_static(
        core: Arc<PersistenceCore<C, R>>,
        golix: Arc<GolixCore>,
        privateer: Arc<StdMutex<Privateer>>,
        container_ghid: Ghid,
    ) -> Self {
        let author = golix.identity().ghid();
        Gao {
            core,
            golix,
            privateer,
            inner: AsyncMutex::new(GaoInner {
                ghid: Some(container_ghid),
                dynamic: false,
                author,
                legroom: 0,
                frame_history: VecDeque::new(),
                target_history: VecDeque::new(),
                is_alive: true,
                state: Vec::new(),
                master_secret: None,
                held_bindings: Vec::new(),
            }),
        }
    }

    pub async fn ghid(&self) -> Option<Ghid> {
        self.inner.lock().await.ghid
    }

    pub async fn is_alive(&self) -> bool {
        self.inner.lock().await.is_alive
    }

    pub async fn state(&self) -> Vec<u8> {
        self.inner.lock().await.state.clone()
    }

    /// Publish `new_state` as the next frame of a dynamic chain.
    pub async fn push(&self, new_state: Vec<u8>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.dynamic {
            return Err(HypergolixError::LocallyImmutable(inner.ghid.unwrap_or(self.golix.identity().ghid())));
        }
        if !inner.is_alive {
            return Err(HypergolixError::DeadObject(inner.ghid.unwrap_or(self.golix.identity().ghid())));
        }

        let previous_frame = inner.frame_history.front().copied();
        let previous_container = inner.target_history.front().copied().flatten();

        let base_secret = match (&inner.master_secret, previous_container) {
            (Some(master), _) => master.clone(),
            (None, Some(prev_container)) => {
                let privateer = self.privateer.lock().expect("privateer mutex poisoned");
                privateer.get(prev_container).cloned().ok_or(HypergolixError::SecretMissing(prev_container))?
            },
            (None, None) => Secret::new_random(),
        };
        let next_secret = match previous_frame {
            Some(prev_frame) => base_secret.ratchet(prev_frame),
            None => base_secret,
        };

        let (container, container_packed) = self.golix.make_container(&new_state, &next_secret);

        {
            let mut privateer = self.privateer.lock().expect("privateer mutex poisoned");
            privateer.stage(container.ghid, next_secret.clone())?;
        }
        let guard = StageGuard::new(&self.privateer, container.ghid);

        let history: Vec<Ghid> = inner.frame_history.iter().take(inner.legroom).copied().collect();
        let (frame, frame_packed) = self.golix.make_binding_dynamic(container.ghid, inner.ghid, history);

        let result = async {
            self.core.ingest(container_packed, false).await?;
            self.core.ingest(frame_packed, false).await?;
            Ok::<(), HypergolixError>(())
        }
        .await;

        match result {
            Ok(()) => {
                {
                    let mut privateer = self.privateer.lock().expect("privateer mutex poisoned");
                    privateer.commit(container.ghid, inner.master_secret.is_some());
                }
                guard.disarm();
                inner.ghid = Some(frame.dynamic_ghid);
                inner.frame_history.push_front(frame.ghid);
                if inner.frame_history.len() > inner.legroom.max(1) {
                    inner.frame_history.pop_back();
                }
                inner.target_history.push_front(Some(container.ghid));
                if inner.target_history.len() > inner.legroom.max(1) {
                    inner.target_history.pop_back();
                }
                inner.state = new_state;
                Ok(())
            },
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, error = %e, "push failed, reconciling from upstream");
                drop(guard);
                Err(e)
            },
        }
    }

    /// Construct a static binding retaining the current container independently.
    pub async fn freeze(&self) -> Result<Ghid> {
        let mut inner = self.inner.lock().await;
        if !inner.dynamic {
            return Err(HypergolixError::LocallyImmutable(inner.ghid.unwrap_or(self.golix.identity().ghid())));
        }
        let container_ghid = inner
            .target_history
            .front()
            .copied()
            .flatten()
            .ok_or_else(|| HypergolixError::Internal("freeze before any push".to_string()))?;
        let (gobs, packed) = self.golix.make_binding_static(container_ghid);
        self.core.ingest(packed, false).await?;
        inner.held_bindings.push(gobs.ghid);
        Ok(container_ghid)
    }

    /// Retain this object's own stable ghid under our authorship.
    pub async fn hold(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let target = inner.ghid.ok_or_else(|| HypergolixError::Internal("hold before any push".to_string()))?;
        let (gobs, packed) = self.golix.make_binding_static(target);
        self.core.ingest(packed, false).await?;
        inner.held_bindings.push(gobs.ghid);
        Ok(())
    }

    /// Retract this object (dynamic) or every binding we authored against it
    /// (static). Idempotent: deleting an already-dead object is a no-op.
    pub async fn delete(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.is_alive {
            return Ok(());
        }
        let target = match inner.ghid {
            Some(g) => g,
            None => return Ok(()),
        };
        if inner.dynamic {
            let (_gdxx, packed) = self.golix.make_debind(target);
            self.core.ingest(packed, false).await?;
        } else {
            for binding in inner.held_bindings.clone() {
                let (_gdxx, packed) = self.golix.make_debind(binding);
                self.core.ingest(packed, false).await?;
            }
        }
        inner.is_alive = false;
        Ok(())
    }

    /// Reconcile against a Postman notification for this object's stable ghid.
    pub async fn pull(&self, notification_ghid: Ghid) -> Result<HealStats> {
        let mut inner = self.inner.lock().await;

        if inner.frame_history.contains(&notification_ghid) {
            return Ok(HealStats { frames_healed: 0, legroom: inner.legroom });
        }

        let my_ghid = match inner.ghid {
            Some(g) => g,
            None => return Err(HypergolixError::NotFound(notification_ghid)),
        };

        let summary = self.core.summarize(&notification_ghid).await?;
        match summary {
            Parsed::Gdxx(g) if g.target == my_ghid => {
                inner.is_alive = false;
                Ok(HealStats { frames_healed: 0, legroom: inner.legroom })
            },
            Parsed::Gobd(frame) if frame.dynamic_ghid == my_ghid => {
                let old_front_frame = inner.frame_history.front().copied();
                let old_front_container = inner.target_history.front().copied().flatten();

                let stats = self.advance_history(&mut inner, &frame)?;
                let salts = self.missed_salts(old_front_frame, &frame, stats.frames_healed);

                let base_secret = match (&inner.master_secret, old_front_container) {
                    (Some(master), _) => master.clone(),
                    (None, Some(prev_container)) => {
                        let privateer = self.privateer.lock().expect("privateer mutex poisoned");
                        privateer.get(prev_container).cloned().ok_or(HypergolixError::SecretMissing(prev_container))?
                    },
                    (None, None) => return Err(HypergolixError::SecretMissing(frame.target)),
                };
                let secret = {
                    let privateer = self.privateer.lock().expect("privateer mutex poisoned");
                    privateer.heal(&base_secret, &salts, inner.legroom, my_ghid)?
                };

                let packed = self.core.retrieve(&frame.target).await?;
                let container = match crate::golix::unpack(&packed)? {
                    crate::primitives::Primitive::Geoc(g) => g,
                    _ => return Err(HypergolixError::MalformedObject("expected Geoc".to_string())),
                };
                let plaintext = match self.golix.open_container(&container, &secret) {
                    Ok(p) => p,
                    Err(e) => {
                        let mut privateer = self.privateer.lock().expect("privateer mutex poisoned");
                        privateer.abandon(frame.target);
                        return Err(e);
                    },
                };
                {
                    let mut privateer = self.privateer.lock().expect("privateer mutex poisoned");
                    privateer.stage(frame.target, secret)?;
                    privateer.commit(frame.target, inner.master_secret.is_some());
                }
                inner.state = plaintext;
                tracing::debug!(target: LOG_TARGET, ghid = %my_ghid, frames_healed = stats.frames_healed, "pulled");
                Ok(stats)
            },
            _ => Err(HypergolixError::MalformedObject(format!(
                "notification {notification_ghid} is not a frame or debinding of {my_ghid}"
            ))),
        }
    }

    /// The §4.11 history-advancement algorithm: find the offset at which the new
    /// frame's history rejoins ours, resize to the new legroom, and splice in the
    /// frames we missed.
    fn advance_history(&self, inner: &mut GaoInner, new_frame: &GobdLite) -> Result<HealStats> {
        let old_front = inner.frame_history.front().copied();
        let new_history = &new_frame.history;

        let offset = match old_front {
            None => 0,
            Some(front) => match new_history.iter().position(|g| *g == front) {
                Some(o) => o,
                None => {
                    return Err(HypergolixError::RatchetError {
                        ghid: new_frame.dynamic_ghid,
                        missed: new_history.len() + 1,
                        legroom: inner.legroom,
                    })
                },
            },
        };

        if offset > inner.legroom {
            return Err(HypergolixError::RatchetError {
                ghid: new_frame.dynamic_ghid,
                missed: offset,
                legroom: inner.legroom,
            });
        }

        // Adopt the sender's legroom now that the offset has been validated against
        // our own, so we don't infer offsets against a history we've already dropped.
        inner.legroom = new_history.len();

        for i in (0..offset).rev() {
            inner.frame_history.push_front(new_history[i]);
            inner.target_history.push_front(None);
        }
        inner.frame_history.push_front(new_frame.ghid);
        inner.target_history.push_front(Some(new_frame.target));

        let cap = inner.legroom.max(1);
        while inner.frame_history.len() > cap {
            inner.frame_history.pop_back();
        }
        while inner.target_history.len() > cap {
            inner.target_history.pop_back();
        }

        Ok(HealStats { frames_healed: offset, legroom: inner.legroom })
    }

    /// The frame ghids to ratchet across, oldest first, to recover `new_frame`'s
    /// secret starting from whatever secret we last held (`old_front_frame`'s).
    /// With no prior frame at all (a fresh subscription backed only by a master
    /// secret), falls back to ratcheting across the whole of `new_frame.history`.
    fn missed_salts(&self, old_front_frame: Option<Ghid>, new_frame: &GobdLite, offset: usize) -> Vec<Ghid> {
        let bound = offset.min(new_frame.history.len());
        match old_front_frame {
            Some(prev) => {
                let mut salts = Vec::with_capacity(bound + 1);
                salts.push(prev);
                salts.extend(new_frame.history[..bound].iter().rev().copied());
                salts
            },
            None => new_frame.history.iter().rev().copied().collect(),
        }
    }
}
