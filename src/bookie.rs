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

//! The Bookie: binding accounting. Mutated only inside `PersistenceCore::ingest`,
//! which runs on the single core loop (spec §5); no internal locking.

use std::collections::{HashMap, HashSet};

use crate::ghid::Ghid;
use crate::primitives::Parsed;

/// The accounting indices from spec §3.4, plus `dynamic_targets` tracking each
/// dynamic chain's current frame target for `has_live_binding`.
#[derive(Default)]
pub struct Bookie {
    bindings_static: HashMap<Ghid, HashSet<Ghid>>,
    bindings_dynamic: HashMap<Ghid, Ghid>,
    /// `dynamic_ghid -> current frame's target`, kept alongside `bindings_dynamic`
    /// (which tracks the frame's own ghid) so `has_live_binding` can check retention
    /// against the container a chain's current frame actually targets.
    dynamic_targets: HashMap<Ghid, Ghid>,
    debound_by: HashMap<Ghid, HashSet<Ghid>>,
    requests_for: HashMap<Ghid, HashSet<Ghid>>,
}

impl Bookie {
    pub fn new() -> Self {
        Bookie::default()
    }

    /// Apply the accounting effect of a newly-ingested primitive. Returns the
    /// previous current frame ghid of a dynamic binding, if this ingest superseded
    /// one — the caller (Undertaker) uses this to triage the old frame's target.
    pub fn apply(&mut self, lite: &Parsed) -> Option<Ghid> {
        match lite {
            Parsed::Gobs(g) => {
                self.bindings_static.entry(g.target).or_default().insert(g.ghid);
                None
            },
            Parsed::Gobd(g) => {
                let previous = self.bindings_dynamic.insert(g.dynamic_ghid, g.ghid);
                self.dynamic_targets.insert(g.dynamic_ghid, g.target);
                previous
            },
            Parsed::Gdxx(g) => {
                self.debound_by.entry(g.target).or_default().insert(g.ghid);
                None
            },
            Parsed::Garq(g) => {
                self.requests_for.entry(g.recipient).or_default().insert(g.ghid);
                None
            },
            Parsed::Gidc(_) | Parsed::Geoc(_) => None,
        }
    }

    /// Remove all bookkeeping for a ghid that the Undertaker has GC'd. Static
    /// bindings and debindings are removed from their target's index; dynamic
    /// frames are removed only if they are still the index's current frame for
    /// their chain (stale frames were already replaced by `apply`).
    pub fn forget(&mut self, lite: &Parsed) {
        match lite {
            Parsed::Gobs(g) => {
                if let Some(set) = self.bindings_static.get_mut(&g.target) {
                    set.remove(&g.ghid);
                    if set.is_empty() {
                        self.bindings_static.remove(&g.target);
                    }
                }
            },
            Parsed::Gdxx(g) => {
                if let Some(set) = self.debound_by.get_mut(&g.target) {
                    set.remove(&g.ghid);
                    if set.is_empty() {
                        self.debound_by.remove(&g.target);
                    }
                }
            },
            Parsed::Garq(g) => {
                if let Some(set) = self.requests_for.get_mut(&g.recipient) {
                    set.remove(&g.ghid);
                    if set.is_empty() {
                        self.requests_for.remove(&g.recipient);
                    }
                }
            },
            Parsed::Gobd(g) => {
                if self.bindings_dynamic.get(&g.dynamic_ghid) == Some(&g.ghid) {
                    self.bindings_dynamic.remove(&g.dynamic_ghid);
                    self.dynamic_targets.remove(&g.dynamic_ghid);
                }
            },
            Parsed::Gidc(_) | Parsed::Geoc(_) => {},
        }
    }

    pub fn is_debound(&self, ghid: &Ghid) -> bool {
        self.debound_by.get(ghid).map(|s| !s.is_empty()).unwrap_or(false)
    }

    pub fn binders(&self, target: &Ghid) -> HashSet<Ghid> {
        self.bindings_static.get(target).cloned().unwrap_or_default()
    }

    pub fn debinders(&self, target: &Ghid) -> HashSet<Ghid> {
        self.debound_by.get(target).cloned().unwrap_or_default()
    }

    pub fn requests(&self, recipient: &Ghid) -> HashSet<Ghid> {
        self.requests_for.get(recipient).cloned().unwrap_or_default()
    }

    pub fn current_frame(&self, dynamic_ghid: &Ghid) -> Option<Ghid> {
        self.bindings_dynamic.get(dynamic_ghid).copied()
    }

    /// Is `target` retained by any live static binding or a dynamic chain's current
    /// frame? Used by Undertaker to decide orphan status.
    pub fn has_live_binding(&self, target: &Ghid) -> bool {
        let statically_bound = self
            .bindings_static
            .get(target)
            .map(|binders| binders.iter().any(|b| !self.is_debound(b)))
            .unwrap_or(false);
        let dynamically_bound = self.dynamic_targets.values().any(|t| t == target);
        statically_bound || dynamically_bound
    }
}
