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

//! Cross-reference checks against the Librarian and Bookie. Runs after the
//! Enforcer; the last gate before a primitive is allowed to mutate accounting
//! state.

use crate::bookie::Bookie;
use crate::error::{HypergolixError, Result};
use crate::ghid::Ghid;
use crate::librarian::{DurableCache, Librarian};
use crate::primitives::Parsed;

pub struct Lawyer;

impl Lawyer {
    pub fn new() -> Self {
        Lawyer
    }

    pub fn validate<C: DurableCache>(&self, lite: &Parsed, librarian: &Librarian<C>, bookie: &Bookie) -> Result<()> {
        match lite {
            Parsed::Gidc(_) => Ok(()),
            Parsed::Geoc(g) => require_known_party(librarian, &g.author),
            Parsed::Gobs(g) => require_known_party(librarian, &g.author),
            Parsed::Gobd(g) => {
                require_known_party(librarian, &g.author)?;
                if bookie.is_debound(&g.dynamic_ghid) {
                    return Err(HypergolixError::AlreadyDebound(g.dynamic_ghid));
                }
                validate_history_alignment(g, librarian, bookie)
            },
            Parsed::Gdxx(g) => {
                if !librarian.has(&g.target) {
                    return Err(HypergolixError::UnknownParty(g.target));
                }
                let target_author = librarian
                    .summarize(&g.target)
                    .ok()
                    .and_then(|lite| lite.author())
                    .ok_or(HypergolixError::UnknownParty(g.target))?;
                if target_author != g.author {
                    return Err(HypergolixError::InconsistentAuthor {
                        debinder: g.author,
                        binder: target_author,
                    });
                }
                Ok(())
            },
            Parsed::Garq(g) => require_known_party(librarian, &g.recipient),
        }
    }
}

impl Default for Lawyer {
    fn default() -> Self {
        Lawyer::new()
    }
}

fn require_known_party<C: DurableCache>(librarian: &Librarian<C>, ghid: &Ghid) -> Result<()> {
    match librarian.summarize(ghid) {
        Ok(Parsed::Gidc(_)) => Ok(()),
        _ => Err(HypergolixError::UnknownParty(*ghid)),
    }
}

fn validate_history_alignment<C: DurableCache>(
    frame: &crate::primitives::lite::GobdLite,
    librarian: &Librarian<C>,
    bookie: &Bookie,
) -> Result<()> {
    let current = bookie.current_frame(&frame.dynamic_ghid);
    match frame.history.first() {
        None => {
            if current.is_some() {
                Err(HypergolixError::FrameReplay(frame.ghid))
            } else {
                Ok(())
            }
        },
        Some(prev) => {
            if current == Some(*prev) {
                Ok(())
            } else if librarian.has(prev) {
                // Reorder tolerance: prev is a historical frame already known, superseded
                // by a later frame we have already ingested.
                Ok(())
            } else {
                Err(HypergolixError::FrameReplay(frame.ghid))
            }
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::librarian::MemoryCache;
    use crate::primitives::lite::{GdxxLite, GidcLite, GobdLite, GobsLite};

    fn gidc(ghid: Ghid) -> Parsed {
        Parsed::Gidc(GidcLite {
            ghid,
            signing_public_key: [0u8; 32],
            encryption_public_key: [0u8; 32],
        })
    }

    #[test]
    fn gobs_with_known_author_is_accepted() {
        let mut lib = Librarian::new(MemoryCache::new());
        let author = Ghid::derive(b"author");
        lib.store(gidc(author), b"gidc".to_vec()).unwrap();
        let bookie = Bookie::new();
        let lawyer = Lawyer::new();
        let gobs = Parsed::Gobs(GobsLite {
            ghid: Ghid::derive(b"gobs"),
            author,
            target: Ghid::derive(b"target"),
        });
        assert!(lawyer.validate(&gobs, &lib, &bookie).is_ok());
    }

    #[test]
    fn gobs_with_unknown_author_is_rejected() {
        let lib = Librarian::new(MemoryCache::new());
        let bookie = Bookie::new();
        let lawyer = Lawyer::new();
        let gobs = Parsed::Gobs(GobsLite {
            ghid: Ghid::derive(b"gobs"),
            author: Ghid::derive(b"author"),
            target: Ghid::derive(b"target"),
        });
        let err = lawyer.validate(&gobs, &lib, &bookie).unwrap_err();
        assert!(matches!(err, HypergolixError::UnknownParty(_)));
    }

    #[test]
    fn gdxx_must_match_target_author() {
        let mut lib = Librarian::new(MemoryCache::new());
        let author = Ghid::derive(b"author");
        let attacker = Ghid::derive(b"attacker");
        lib.store(gidc(author), b"gidc".to_vec()).unwrap();
        lib.store(gidc(attacker), b"gidc2".to_vec()).unwrap();
        let gobs_ghid = Ghid::derive(b"gobs");
        lib.store(
            Parsed::Gobs(GobsLite {
                ghid: gobs_ghid,
                author,
                target: Ghid::derive(b"target"),
            }),
            b"gobs-packed".to_vec(),
        )
        .unwrap();
        let bookie = Bookie::new();
        let lawyer = Lawyer::new();
        let fraud = Parsed::Gdxx(GdxxLite {
            ghid: Ghid::derive(b"gdxx"),
            author: attacker,
            target: gobs_ghid,
        });
        let err = lawyer.validate(&fraud, &lib, &bookie).unwrap_err();
        assert!(matches!(err, HypergolixError::InconsistentAuthor { .. }));

        let legit = Parsed::Gdxx(GdxxLite {
            ghid: Ghid::derive(b"gdxx2"),
            author,
            target: gobs_ghid,
        });
        assert!(lawyer.validate(&legit, &lib, &bookie).is_ok());
    }

    #[test]
    fn frame_replay_is_rejected() {
        let mut lib = Librarian::new(MemoryCache::new());
        let author = Ghid::derive(b"author");
        lib.store(gidc(author), b"gidc".to_vec()).unwrap();
        let mut bookie = Bookie::new();
        let dynamic = Ghid::derive(b"dyn");
        let f1 = GobdLite {
            ghid: Ghid::derive(b"f1"),
            dynamic_ghid: dynamic,
            author,
            target: Ghid::derive(b"c1"),
            history: vec![],
        };
        bookie.apply(&Parsed::Gobd(f1.clone()));
        let f2 = GobdLite {
            ghid: Ghid::derive(b"f2"),
            dynamic_ghid: dynamic,
            author,
            target: Ghid::derive(b"c2"),
            history: vec![f1.ghid],
        };
        bookie.apply(&Parsed::Gobd(f2.clone()));

        let lawyer = Lawyer::new();
        let replay = Parsed::Gobd(f1);
        let err = lawyer.validate(&replay, &lib, &bookie).unwrap_err();
        assert!(matches!(err, HypergolixError::FrameReplay(_)));
    }

    #[test]
    fn garq_to_unknown_recipient_is_rejected() {
        let lib = Librarian::new(MemoryCache::new());
        let bookie = Bookie::new();
        let lawyer = Lawyer::new();
        let garq = Parsed::Garq(crate::primitives::lite::GarqLite {
            ghid: Ghid::derive(b"garq"),
            author: Ghid::derive(b"author"),
            recipient: Ghid::derive(b"ghost"),
        });
        let err = lawyer.validate(&garq, &lib, &bookie).unwrap_err();
        assert!(matches!(err, HypergolixError::UnknownParty(_)));
    }
}
