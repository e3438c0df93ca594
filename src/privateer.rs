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

//! The secret ratchet / privateer: per-ghid symmetric secret lifecycle, staged in
//! step with persistence outcomes and ratcheted forward via a salted KDF.

use std::collections::HashMap;

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;
use zeroize::Zeroize;

use crate::error::{HypergolixError, Result};
use crate::ghid::Ghid;

const LOG_TARGET: &str = "hypergolix::privateer";

const KEY_LEN: usize = 32;
const SEED_LEN: usize = 16;

/// An opaque symmetric secret: a cipher key plus a seed carried forward through the
/// ratchet. `key` is what `GolixCore` uses for container encryption; `seed` only
/// exists to widen the ratchet's input keying material.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    key: [u8; KEY_LEN],
    seed: [u8; SEED_LEN],
}

impl Secret {
    pub fn new_random() -> Self {
        let mut key = [0u8; KEY_LEN];
        let mut seed = [0u8; SEED_LEN];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut seed);
        Secret { key, seed }
    }

    /// Build a secret directly from 32 bytes of keying material (e.g. an X25519
    /// shared secret, or a derived scrypt key), with a zero seed. Used where the
    /// caller already has strong keying material and no ratchet history to widen.
    pub fn from_raw_key(key: [u8; KEY_LEN]) -> Self {
        Secret { key, seed: [0u8; SEED_LEN] }
    }

    pub fn from_parts(key: [u8; KEY_LEN], seed: [u8; SEED_LEN]) -> Self {
        Secret { key, seed }
    }

    /// Serialize to the 53-byte field width the bootstrap primary manifest (§6.4)
    /// uses for a secret: 32-byte key, 16-byte seed, 5 reserved zero bytes.
    pub fn to_field_bytes(&self) -> [u8; 53] {
        let mut out = [0u8; 53];
        out[..KEY_LEN].copy_from_slice(&self.key);
        out[KEY_LEN..KEY_LEN + SEED_LEN].copy_from_slice(&self.seed);
        out
    }

    /// Parse the 53-byte field width back into a `Secret`, ignoring the reserved tail.
    pub fn from_field_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < KEY_LEN + SEED_LEN {
            return Err(HypergolixError::MalformedObject("secret field too short".to_string()));
        }
        let mut key = [0u8; KEY_LEN];
        let mut seed = [0u8; SEED_LEN];
        key.copy_from_slice(&bytes[..KEY_LEN]);
        seed.copy_from_slice(&bytes[KEY_LEN..KEY_LEN + SEED_LEN]);
        Ok(Secret { key, seed })
    }

    /// Deterministically derive the successor secret, salted by `salt_ghid`.
    ///
    /// `ratchet(secret, salt) = HKDF-SHA512(ikm = seed || key, salt = salt_ghid, len
    /// = len(seed) + len(key))`, split back into `(key, seed)`.
    pub fn ratchet(&self, salt_ghid: Ghid) -> Secret {
        let mut ikm = Vec::with_capacity(SEED_LEN + KEY_LEN);
        ikm.extend_from_slice(&self.seed);
        ikm.extend_from_slice(&self.key);

        let hk = Hkdf::<Sha512>::new(Some(&salt_ghid.as_bytes()), &ikm);
        let mut okm = [0u8; KEY_LEN + SEED_LEN];
        hk.expand(b"hypergolix-ratchet", &mut okm)
            .expect("okm length is within HKDF-SHA512's output bound");

        let mut key = [0u8; KEY_LEN];
        let mut seed = [0u8; SEED_LEN];
        key.copy_from_slice(&okm[..KEY_LEN]);
        seed.copy_from_slice(&okm[KEY_LEN..]);
        Secret { key, seed }
    }

    pub fn encrypt(&self, nonce: &[u8; 12], plaintext: &[u8]) -> Vec<u8> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        cipher
            .encrypt(Nonce::from_slice(nonce), Payload::from(plaintext))
            .expect("ChaCha20Poly1305 encryption over a bounded plaintext cannot fail")
    }

    pub fn decrypt(&self, nonce: &[u8; 12], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        cipher
            .decrypt(Nonce::from_slice(nonce), Payload::from(ciphertext))
            .map_err(|_| HypergolixError::SecretMissing(Ghid::derive(ciphertext)))
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.key.zeroize();
        self.seed.zeroize();
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(..)")
    }
}

/// Secret store + ratchet. Mutated only by `Gao` operations running on the core
/// loop (spec §5's shared-resource policy); no internal locking.
#[derive(Default)]
pub struct Privateer {
    persistent: HashMap<Ghid, Secret>,
    staged: HashMap<Ghid, Secret>,
    /// Secrets received via a `Garq` share handshake, not yet acknowledged/promoted.
    quarantine: HashMap<Ghid, Secret>,
}

impl Privateer {
    pub fn new() -> Self {
        Privateer::default()
    }

    /// Stage `secret` under `container_ghid`. Re-staging an identical secret is a
    /// no-op; staging a different secret under an already-present ghid (staged or
    /// already persistent) is a conflict.
    pub fn stage(&mut self, container_ghid: Ghid, secret: Secret) -> Result<()> {
        if let Some(existing) = self.staged.get(&container_ghid) {
            if *existing != secret {
                return Err(HypergolixError::SecretConflict(container_ghid));
            }
            return Ok(());
        }
        if let Some(existing) = self.persistent.get(&container_ghid) {
            if *existing != secret {
                return Err(HypergolixError::SecretConflict(container_ghid));
            }
            return Ok(());
        }
        tracing::trace!(target: LOG_TARGET, ghid = %container_ghid, "staged secret");
        self.staged.insert(container_ghid, secret);
        Ok(())
    }

    /// Move a staged secret to the durable store. `local_only` keeps the secret out
    /// of whatever upstream-pushed store the caller otherwise uses — used for
    /// bootstrap/master-secreted chains, which must never be pushed to a remote.
    /// We do not distinguish storage backends here (that's `Remote`'s job); the
    /// flag is recorded purely so callers can assert it was honored.
    pub fn commit(&mut self, container_ghid: Ghid, _local_only: bool) {
        if let Some(secret) = self.staged.remove(&container_ghid) {
            tracing::trace!(target: LOG_TARGET, ghid = %container_ghid, "committed secret");
            self.persistent.insert(container_ghid, secret);
        }
    }

    /// Drop a staged entry. Tolerated if absent.
    pub fn abandon(&mut self, container_ghid: Ghid) {
        if self.staged.remove(&container_ghid).is_some() {
            tracing::debug!(target: LOG_TARGET, ghid = %container_ghid, "abandoned staged secret");
        }
    }

    pub fn get(&self, container_ghid: Ghid) -> Option<&Secret> {
        self.staged.get(&container_ghid).or_else(|| self.persistent.get(&container_ghid))
    }

    pub fn has(&self, container_ghid: Ghid) -> bool {
        self.staged.contains_key(&container_ghid) || self.persistent.contains_key(&container_ghid)
    }

    /// Stash a secret received via a `Garq` share handshake, pending acknowledgement.
    pub fn quarantine(&mut self, container_ghid: Ghid, secret: Secret) {
        self.quarantine.insert(container_ghid, secret);
    }

    /// Promote a quarantined secret to the persistent store (share handshake acked).
    pub fn promote_quarantined(&mut self, container_ghid: Ghid) -> Result<()> {
        match self.quarantine.remove(&container_ghid) {
            Some(secret) => {
                self.persistent.insert(container_ghid, secret);
                Ok(())
            },
            None => Err(HypergolixError::SecretMissing(container_ghid)),
        }
    }

    /// Drop a quarantined secret without promoting it (share handshake declined).
    pub fn reject_quarantined(&mut self, container_ghid: Ghid) {
        self.quarantine.remove(&container_ghid);
    }

    /// Heal a ratchet forward across `missed_frame_ghids` (oldest first), returning
    /// the recovered current secret. Fails if healing would exceed `legroom`.
    pub fn heal(&self, base: &Secret, missed_frame_ghids: &[Ghid], legroom: usize, for_ghid: Ghid) -> Result<Secret> {
        if missed_frame_ghids.len() > legroom {
            return Err(HypergolixError::RatchetError {
                ghid: for_ghid,
                missed: missed_frame_ghids.len(),
                legroom,
            });
        }
        let mut secret = base.clone();
        for salt in missed_frame_ghids {
            secret = secret.ratchet(*salt);
        }
        Ok(secret)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ratchet_is_deterministic() {
        let s = Secret::new_random();
        let salt = Ghid::derive(b"frame-1");
        let a = s.ratchet(salt);
        let b = s.ratchet(salt);
        assert!(a == b);
    }

    #[test]
    fn ratchet_composes() {
        let s = Secret::new_random();
        let g1 = Ghid::derive(b"frame-1");
        let g2 = Ghid::derive(b"frame-2");
        let chained = s.ratchet(g1).ratchet(g2);
        let chained_again = s.ratchet(g1).ratchet(g2);
        assert!(chained == chained_again);
    }

    #[test]
    fn encrypt_decrypt_round_trips() {
        let s = Secret::new_random();
        let nonce = [7u8; 12];
        let ciphertext = s.encrypt(&nonce, b"payload");
        let plaintext = s.decrypt(&nonce, &ciphertext).unwrap();
        assert_eq!(plaintext, b"payload");
    }

    #[test]
    fn restage_identical_secret_is_noop() {
        let mut p = Privateer::new();
        let ghid = Ghid::derive(b"c1");
        let s = Secret::new_random();
        p.stage(ghid, s.clone()).unwrap();
        p.stage(ghid, s).unwrap();
    }

    #[test]
    fn restage_different_secret_conflicts() {
        let mut p = Privateer::new();
        let ghid = Ghid::derive(b"c1");
        p.stage(ghid, Secret::new_random()).unwrap();
        let err = p.stage(ghid, Secret::new_random()).unwrap_err();
        assert!(matches!(err, HypergolixError::SecretConflict(_)));
    }

    #[test]
    fn commit_then_abandon_is_a_noop() {
        let mut p = Privateer::new();
        let ghid = Ghid::derive(b"c1");
        p.stage(ghid, Secret::new_random()).unwrap();
        p.commit(ghid, false);
        p.abandon(ghid);
        assert!(p.has(ghid));
    }

    #[test]
    fn heal_fails_beyond_legroom() {
        let p = Privateer::new();
        let s = Secret::new_random();
        let missed: Vec<Ghid> = (0..10).map(|i| Ghid::derive(format!("f{i}").as_bytes())).collect();
        let err = p.heal(&s, &missed, 7, Ghid::derive(b"dyn")).unwrap_err();
        assert!(matches!(err, HypergolixError::RatchetError { .. }));
    }

    #[test]
    fn quarantine_promotes_into_persistent() {
        let mut p = Privateer::new();
        let ghid = Ghid::derive(b"shared");
        p.quarantine(ghid, Secret::new_random());
        assert!(!p.has(ghid));
        p.promote_quarantined(ghid).unwrap();
        assert!(p.has(ghid));
    }
}
