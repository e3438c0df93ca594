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

//! The Librarian: a content-addressed, durable `ghid -> (packed, lite)` map.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HypergolixError, Result};
use crate::ghid::Ghid;
use crate::golix;
use crate::primitives::{Parsed, Primitive};

const LOG_TARGET: &str = "hypergolix::librarian";

/// A durable byte-string store keyed by ghid. Any crash-safe key-value mapping
/// satisfies this; the Librarian above it owns the parse/re-parse discipline.
pub trait DurableCache: Send + Sync {
    fn get(&self, ghid: &Ghid) -> Result<Option<Vec<u8>>>;
    fn put(&mut self, ghid: &Ghid, bytes: &[u8]) -> Result<()>;
    fn remove(&mut self, ghid: &Ghid) -> Result<()>;
    /// All ghids currently present, for `restore()`.
    fn list(&self) -> Result<Vec<Ghid>>;
}

/// An in-memory `DurableCache`, the default test fixture (mirrors the teacher's
/// `TempDatabase`/`create_mem_db` pattern for exercising storage logic without disk
/// I/O).
#[derive(Default)]
pub struct MemoryCache {
    records: HashMap<Ghid, Vec<u8>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache::default()
    }
}

impl DurableCache for MemoryCache {
    fn get(&self, ghid: &Ghid) -> Result<Option<Vec<u8>>> {
        Ok(self.records.get(ghid).cloned())
    }

    fn put(&mut self, ghid: &Ghid, bytes: &[u8]) -> Result<()> {
        self.records.insert(*ghid, bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, ghid: &Ghid) -> Result<()> {
        self.records.remove(ghid);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Ghid>> {
        Ok(self.records.keys().copied().collect())
    }
}

/// A file-per-ghid `DurableCache`, one realization of spec §6.3: `filename =
/// hex(ghid)`, write-atomicity via temp-file-and-rename.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| HypergolixError::internal("FileCache::open", e))?;
        Ok(FileCache { root })
    }

    fn path_for(&self, ghid: &Ghid) -> PathBuf {
        self.root.join(ghid.to_hex())
    }

    fn tmp_path_for(&self, ghid: &Ghid) -> PathBuf {
        self.root.join(format!("{}.tmp", ghid.to_hex()))
    }
}

impl DurableCache for FileCache {
    fn get(&self, ghid: &Ghid) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(ghid)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HypergolixError::internal("FileCache::get", e)),
        }
    }

    fn put(&mut self, ghid: &Ghid, bytes: &[u8]) -> Result<()> {
        let tmp = self.tmp_path_for(ghid);
        fs::write(&tmp, bytes).map_err(|e| HypergolixError::internal("FileCache::put", e))?;
        fs::rename(&tmp, self.path_for(ghid)).map_err(|e| HypergolixError::internal("FileCache::put", e))?;
        Ok(())
    }

    fn remove(&mut self, ghid: &Ghid) -> Result<()> {
        match fs::remove_file(self.path_for(ghid)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HypergolixError::internal("FileCache::remove", e)),
        }
    }

    fn list(&self) -> Result<Vec<Ghid>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| HypergolixError::internal("FileCache::list", e))? {
            let entry = entry.map_err(|e| HypergolixError::internal("FileCache::list", e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(".tmp") {
                continue;
            }
            if let Ok(bytes) = hex::decode(name.as_ref()) {
                if let Some(ghid) = Ghid::from_bytes(&bytes) {
                    out.push(ghid);
                }
            }
        }
        Ok(out)
    }
}

fn path_log(root: &Path) -> String {
    root.display().to_string()
}

/// In-memory index over the durable cache: `ghid -> lite`. Populated incrementally
/// by `store()` and rebuilt wholesale by `restore()`.
pub struct Librarian<C: DurableCache> {
    cache: C,
    lites: HashMap<Ghid, Parsed>,
}

impl<C: DurableCache> Librarian<C> {
    pub fn new(cache: C) -> Self {
        Librarian {
            cache,
            lites: HashMap::new(),
        }
    }

    /// Idempotent insert: if `ghid` is already present, `packed` must match
    /// byte-for-byte.
    pub fn store(&mut self, lite: Parsed, packed: Vec<u8>) -> Result<()> {
        let ghid = lite.ghid();
        if let Some(existing) = self.cache.get(&ghid)? {
            if existing != packed {
                return Err(HypergolixError::internal(
                    "Librarian::store",
                    format!("ghid {ghid} already present with different contents"),
                ));
            }
            return Ok(());
        }
        self.cache.put(&ghid, &packed)?;
        self.lites.insert(ghid, lite);
        tracing::trace!(target: LOG_TARGET, %ghid, "stored record");
        Ok(())
    }

    pub fn has(&self, ghid: &Ghid) -> bool {
        self.lites.contains_key(ghid)
    }

    pub fn retrieve(&self, ghid: &Ghid) -> Result<Vec<u8>> {
        self.cache
            .get(ghid)?
            .ok_or_else(|| HypergolixError::NotFound(*ghid))
    }

    pub fn summarize(&self, ghid: &Ghid) -> Result<&Parsed> {
        self.lites.get(ghid).ok_or_else(|| HypergolixError::NotFound(*ghid))
    }

    pub fn abandon(&mut self, ghid: &Ghid) -> Result<()> {
        self.cache.remove(ghid)?;
        self.lites.remove(ghid);
        tracing::trace!(target: LOG_TARGET, %ghid, "abandoned record");
        Ok(())
    }

    pub fn all_ghids(&self) -> impl Iterator<Item = &Ghid> {
        self.lites.keys()
    }

    pub fn all_lites(&self) -> impl Iterator<Item = &Parsed> {
        self.lites.values()
    }

    /// All static bindings targeting `target_ghid`. A convenience mirroring
    /// `Bookie::binders`, computed directly off the parsed index so callers that
    /// only hold a `Librarian` reference don't need a `Bookie` too.
    pub fn bind_status(&self, target_ghid: &Ghid) -> HashSet<Ghid> {
        self.lites
            .values()
            .filter_map(|lite| match lite {
                Parsed::Gobs(g) if g.target == *target_ghid => Some(g.ghid),
                _ => None,
            })
            .collect()
    }

    /// Re-parse every record in the underlying cache, discarding any that fail to
    /// parse or verify (a partially-written record). Returns the number of records
    /// restored.
    ///
    /// Two passes: the first parses every record and collects each `Gidc`'s signing
    /// key, since a binding's author may sort after the binding itself in the
    /// cache's listing order; the second verifies every record's signature against
    /// its author's key, mirroring `Doorman::inspect`.
    pub fn restore(&mut self) -> Result<usize> {
        self.lites.clear();
        let ghids = self.cache.list()?;
        let mut discarded = HashSet::new();
        let mut parsed = HashMap::new();
        let mut signers = HashMap::new();

        for ghid in ghids {
            let packed = match self.cache.get(&ghid)? {
                Some(bytes) => bytes,
                None => continue,
            };
            match golix::unpack(&packed) {
                Ok(primitive) => {
                    if primitive.ghid() != ghid {
                        tracing::warn!(target: LOG_TARGET, %ghid, "discarding record: ghid mismatch on restore");
                        discarded.insert(ghid);
                        continue;
                    }
                    if let Primitive::Gidc(gidc) = &primitive {
                        signers.insert(gidc.ghid, gidc.signing_public_key);
                    }
                    parsed.insert(ghid, (primitive, packed));
                },
                Err(e) => {
                    tracing::warn!(target: LOG_TARGET, %ghid, error = %e, "discarding unparsable record on restore");
                    discarded.insert(ghid);
                },
            }
        }

        let mut restored = 0usize;
        for (ghid, (primitive, packed)) in &parsed {
            let lite = primitive.to_lite();
            let author = lite.author().expect("every primitive has an author");
            let signing_key = match signers.get(&author) {
                Some(key) => key,
                None => {
                    tracing::warn!(target: LOG_TARGET, %ghid, %author, "discarding record: unknown author on restore");
                    discarded.insert(*ghid);
                    continue;
                },
            };
            if golix::verify_signature(packed, signing_key, *ghid).is_err() {
                tracing::warn!(target: LOG_TARGET, %ghid, "discarding record: signature verification failed on restore");
                discarded.insert(*ghid);
                continue;
            }
            self.lites.insert(*ghid, lite);
            restored += 1;
        }

        for ghid in discarded {
            let _ = self.cache.remove(&ghid);
        }
        tracing::info!(target: LOG_TARGET, restored, "restored librarian from durable cache");
        Ok(restored)
    }
}

impl Librarian<FileCache> {
    pub fn open_file_backed(root: impl Into<PathBuf> + Clone) -> Result<Self> {
        tracing::debug!(target: LOG_TARGET, root = %path_log(&root.clone().into()), "opening file-backed librarian");
        Ok(Librarian::new(FileCache::open(root)?))
    }
}
