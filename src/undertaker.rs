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

//! The Undertaker: garbage collection of content orphaned by the ingest that
//! just completed. Runs after `Bookie::apply` and `Librarian::store`, before
//! `Postman::notify`.

use crate::bookie::Bookie;
use crate::error::Result;
use crate::ghid::Ghid;
use crate::librarian::{DurableCache, Librarian};
use crate::primitives::lite::{GdxxLite, GobdLite};
use crate::primitives::Parsed;

const LOG_TARGET: &str = "hypergolix::undertaker";

pub struct Undertaker;

impl Undertaker {
    pub fn new() -> Self {
        Undertaker
    }

    /// Triage the ingest of `lite` for orphaned content. `superseded_frame` is the
    /// previous current-frame ghid Bookie reports was just replaced, if `lite` is a
    /// `Gobd`. Returns the ghids actually removed from the Librarian.
    pub fn triage<C: DurableCache>(
        &self,
        lite: &Parsed,
        superseded_frame: Option<Ghid>,
        librarian: &mut Librarian<C>,
        bookie: &mut Bookie,
    ) -> Result<Vec<Ghid>> {
        let mut removed = Vec::new();
        match lite {
            Parsed::Gobd(_) => {
                if let Some(prev_frame) = superseded_frame {
                    if let Some(Parsed::Gobd(GobdLite { target, .. })) = librarian.summarize(&prev_frame).ok().cloned() {
                        self.maybe_collect(target, librarian, bookie, &mut removed)?;
                    }
                }
            },
            Parsed::Gdxx(GdxxLite { target, .. }) => {
                if librarian.has(target) {
                    let target_lite = librarian.summarize(target)?.clone();
                    if matches!(target_lite, Parsed::Gdxx(_)) {
                        // Debindings are permanent records; debinding one has no cascade.
                        return Ok(removed);
                    }
                    librarian.abandon(target)?;
                    bookie.forget(&target_lite);
                    removed.push(*target);
                    log::debug!(target: LOG_TARGET, "collected debound {target}");

                    if let Some(inner_target) = target_lite.target() {
                        self.maybe_collect(inner_target, librarian, bookie, &mut removed)?;
                    }
                }
            },
            _ => {},
        }
        Ok(removed)
    }

    fn maybe_collect<C: DurableCache>(
        &self,
        candidate: Ghid,
        librarian: &mut Librarian<C>,
        bookie: &Bookie,
        removed: &mut Vec<Ghid>,
    ) -> Result<()> {
        if !librarian.has(&candidate) {
            return Ok(());
        }
        if bookie.has_live_binding(&candidate) {
            return Ok(());
        }
        if !bookie.requests(&candidate).is_empty() {
            return Ok(());
        }
        librarian.abandon(&candidate)?;
        removed.push(candidate);
        log::debug!(target: LOG_TARGET, "collected orphaned content {candidate}");
        Ok(())
    }
}

impl Default for Undertaker {
    fn default() -> Self {
        Undertaker::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ghid::Ghid;
    use crate::librarian::MemoryCache;
    use crate::primitives::lite::GobsLite;

    #[test]
    fn debinding_a_static_binding_orphans_its_container() {
        let mut lib = Librarian::new(MemoryCache::new());
        let mut bookie = Bookie::new();
        let author = Ghid::derive(b"author");
        let container = Ghid::derive(b"container");
        let gobs_ghid = Ghid::derive(b"gobs");

        lib.store(
            Parsed::Geoc(crate::primitives::lite::GeocLite { ghid: container, author }),
            b"geoc".to_vec(),
        )
        .unwrap();
        let gobs = Parsed::Gobs(GobsLite {
            ghid: gobs_ghid,
            author,
            target: container,
        });
        bookie.apply(&gobs);
        lib.store(gobs, b"gobs".to_vec()).unwrap();

        let gdxx = Parsed::Gdxx(GdxxLite {
            ghid: Ghid::derive(b"gdxx"),
            author,
            target: gobs_ghid,
        });
        bookie.apply(&gdxx);

        let undertaker = Undertaker::new();
        let removed = undertaker.triage(&gdxx, None, &mut lib, &mut bookie).unwrap();
        assert!(removed.contains(&gobs_ghid));
        assert!(removed.contains(&container));
        assert!(!lib.has(&gobs_ghid));
        assert!(!lib.has(&container));
    }

    #[test]
    fn container_retained_if_still_bound_by_another_binding() {
        let mut lib = Librarian::new(MemoryCache::new());
        let mut bookie = Bookie::new();
        let author = Ghid::derive(b"author");
        let container = Ghid::derive(b"container");

        let gobs1_ghid = Ghid::derive(b"gobs1");
        let gobs2_ghid = Ghid::derive(b"gobs2");
        let gobs1 = Parsed::Gobs(GobsLite { ghid: gobs1_ghid, author, target: container });
        let gobs2 = Parsed::Gobs(GobsLite { ghid: gobs2_ghid, author, target: container });
        bookie.apply(&gobs1);
        bookie.apply(&gobs2);
        lib.store(gobs1.clone(), b"gobs1".to_vec()).unwrap();
        lib.store(gobs2, b"gobs2".to_vec()).unwrap();
        lib.store(
            Parsed::Geoc(crate::primitives::lite::GeocLite { ghid: container, author }),
            b"geoc".to_vec(),
        )
        .unwrap();

        let gdxx = Parsed::Gdxx(GdxxLite {
            ghid: Ghid::derive(b"gdxx"),
            author,
            target: gobs1_ghid,
        });
        bookie.apply(&gdxx);

        let undertaker = Undertaker::new();
        let removed = undertaker.triage(&gdxx, None, &mut lib, &mut bookie).unwrap();
        assert!(removed.contains(&gobs1_ghid));
        assert!(!removed.contains(&container));
        assert!(lib.has(&container));
    }

    #[test]
    fn superseded_dynamic_frame_orphans_previous_container() {
        let mut lib = Librarian::new(MemoryCache::new());
        let mut bookie = Bookie::new();
        let author = Ghid::derive(b"author");
        let dynamic = Ghid::derive(b"dynamic");
        let c1 = Ghid::derive(b"c1");
        let c2 = Ghid::derive(b"c2");

        let f1 = GobdLite {
            ghid: Ghid::derive(b"f1"),
            dynamic_ghid: dynamic,
            author,
            target: c1,
            history: vec![],
        };
        bookie.apply(&Parsed::Gobd(f1.clone()));
        lib.store(Parsed::Gobd(f1.clone()), b"f1".to_vec()).unwrap();
        lib.store(
            Parsed::Geoc(crate::primitives::lite::GeocLite { ghid: c1, author }),
            b"c1".to_vec(),
        )
        .unwrap();

        let f2 = GobdLite {
            ghid: Ghid::derive(b"f2"),
            dynamic_ghid: dynamic,
            author,
            target: c2,
            history: vec![f1.ghid],
        };
        let superseded = bookie.apply(&Parsed::Gobd(f2.clone()));
        lib.store(Parsed::Gobd(f2.clone()), b"f2".to_vec()).unwrap();

        let undertaker = Undertaker::new();
        let removed = undertaker
            .triage(&Parsed::Gobd(f2), superseded, &mut lib, &mut bookie)
            .unwrap();
        assert!(removed.contains(&c1));
        assert!(!lib.has(&c1));
        assert!(lib.has(&f1.ghid), "the superseded frame record itself is retained for reorder tolerance");
    }
}
