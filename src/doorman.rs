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

//! The Doorman: parses the envelope and verifies its signature. The only
//! component that calls into `golix::verify_signature`; everything past this
//! point in the ingest pipeline trusts the primitive's authorship.

use crate::error::{HypergolixError, Result};
use crate::golix;
use crate::librarian::{DurableCache, Librarian};
use crate::primitives::{Parsed, Primitive};

const LOG_TARGET: &str = "hypergolix::doorman";

pub struct Doorman;

impl Doorman {
    pub fn new() -> Self {
        Doorman
    }

    /// Parse `packed` and verify its signature, offloading CPU-bound verification
    /// to a blocking-safe call site (the caller, `PersistenceCore::ingest`, awaits
    /// this inside a `spawn_blocking` per spec §5's suspension-point model).
    pub fn inspect<C: DurableCache>(&self, packed: &[u8], librarian: &Librarian<C>) -> Result<Parsed> {
        let primitive = golix::unpack(packed)?;
        match &primitive {
            Primitive::Gidc(gidc) => {
                golix::verify_signature(packed, &gidc.signing_public_key, gidc.ghid)?;
            },
            _ => {
                let author = author_of(&primitive);
                let author_key = match librarian.summarize(&author) {
                    Ok(Parsed::Gidc(gidc)) => gidc.signing_public_key,
                    _ => {
                        log::debug!(target: LOG_TARGET, "unknown author {author} for {}", primitive.ghid());
                        return Err(HypergolixError::UnknownParty(author));
                    },
                };
                golix::verify_signature(packed, &author_key, primitive.ghid())?;
            },
        }
        tracing::trace!(target: LOG_TARGET, ghid = %primitive.ghid(), "verified");
        Ok(primitive.to_lite())
    }
}

impl Default for Doorman {
    fn default() -> Self {
        Doorman::new()
    }
}

fn author_of(primitive: &Primitive) -> crate::ghid::Ghid {
    match primitive {
        Primitive::Gidc(p) => p.ghid,
        Primitive::Geoc(p) => p.author,
        Primitive::Gobs(p) => p.author,
        Primitive::Gobd(p) => p.author,
        Primitive::Gdxx(p) => p.author,
        Primitive::Garq(p) => p.author,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::golix::{GolixCore, Identity};
    use crate::librarian::MemoryCache;
    use crate::primitives::lite::GidcLite;

    #[test]
    fn gidc_is_self_verifying() {
        let core = GolixCore::new(Identity::generate());
        let (gidc, packed) = core.make_gidc();
        let lib = Librarian::new(MemoryCache::new());
        let doorman = Doorman::new();
        let lite = doorman.inspect(&packed, &lib).unwrap();
        assert_eq!(lite.ghid(), gidc.ghid);
    }

    #[test]
    fn binding_with_unknown_author_is_rejected() {
        let core = GolixCore::new(Identity::generate());
        let (_gobs, packed) = core.make_binding_static(crate::ghid::Ghid::derive(b"target"));
        let lib = Librarian::new(MemoryCache::new());
        let doorman = Doorman::new();
        let err = doorman.inspect(&packed, &lib).unwrap_err();
        assert!(matches!(err, HypergolixError::UnknownParty(_)));
    }

    #[test]
    fn binding_with_known_author_verifies() {
        let core = GolixCore::new(Identity::generate());
        let mut lib = Librarian::new(MemoryCache::new());
        lib.store(
            Parsed::Gidc(GidcLite {
                ghid: core.identity().ghid(),
                signing_public_key: core.identity().gidc().signing_public_key,
                encryption_public_key: core.identity().gidc().encryption_public_key,
            }),
            b"gidc-packed".to_vec(),
        )
        .unwrap();
        let (gobs, packed) = core.make_binding_static(crate::ghid::Ghid::derive(b"target"));
        let doorman = Doorman::new();
        let lite = doorman.inspect(&packed, &lib).unwrap();
        assert_eq!(lite.ghid(), gobs.ghid);
    }

    #[test]
    fn tampered_envelope_is_rejected() {
        let core = GolixCore::new(Identity::generate());
        let mut lib = Librarian::new(MemoryCache::new());
        lib.store(
            Parsed::Gidc(GidcLite {
                ghid: core.identity().ghid(),
                signing_public_key: core.identity().gidc().signing_public_key,
                encryption_public_key: core.identity().gidc().encryption_public_key,
            }),
            b"gidc-packed".to_vec(),
        )
        .unwrap();
        let (_gobs, mut packed) = core.make_binding_static(crate::ghid::Ghid::derive(b"target"));
        *packed.last_mut().unwrap() ^= 0xFF;
        let doorman = Doorman::new();
        assert!(doorman.inspect(&packed, &lib).is_err());
    }
}
