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

//! The account bootstrap chain (§6.4): a fixed-layout primary manifest, keyed by
//! password via scrypt, naming the dynamic chains a multi-application account shares
//! -- identity, persistent secrets, quarantine secrets, and a secondary manifest of
//! well-known string keys to ghids.

use std::collections::BTreeMap;

use rand::rngs::OsRng;
use rand::RngCore;
use scrypt::{scrypt, Params};

use crate::error::{HypergolixError, Result};
use crate::ghid::{Ghid, GHID_LEN};
use crate::privateer::Secret;

const LOG_TARGET: &str = "hypergolix::bootstrap";

const SCRYPT_LOG_N: u8 = 15;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const SCRYPT_DK_LEN: usize = 48;

const SECRET_LEN: usize = 53;
const FIELD_LEN: usize = GHID_LEN + SECRET_LEN;
const PADDING_MIN: usize = 1024;
const PADDING_MAX: usize = 9215;

/// The four dynamic-chain/master-secret pairs named by the primary manifest.
#[derive(Clone)]
pub struct PrimaryManifest {
    pub identity_ghid: Ghid,
    pub identity_secret: Secret,
    pub persistent_ghid: Ghid,
    pub persistent_secret: Secret,
    pub quarantine_ghid: Ghid,
    pub quarantine_secret: Secret,
    pub secondary_ghid: Ghid,
    pub secondary_secret: Secret,
}

/// A well-known secondary-manifest key, giving out-of-scope collaborators a typed
/// way to look up their bootstrap ghids instead of inventing their own registry.
pub struct SecondaryManifestKey;

impl SecondaryManifestKey {
    pub const ROLODEX_PENDING: &'static str = "rolodex.pending";
    pub const DISPATCH_TOKENS: &'static str = "dispatch.tokens";
    pub const IPC_INCOMING: &'static str = "ipc.incoming";
}

/// The secondary manifest: a mapping from well-known string keys to ghids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecondaryManifest {
    entries: BTreeMap<String, Ghid>,
}

impl SecondaryManifest {
    pub fn new() -> Self {
        SecondaryManifest::default()
    }

    pub fn set(&mut self, key: &str, ghid: Ghid) {
        self.entries.insert(key.to_string(), ghid);
    }

    pub fn get(&self, key: &str) -> Option<Ghid> {
        self.entries.get(key).copied()
    }

    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(&self.entries).expect("BTreeMap<String, Ghid> serialization is infallible")
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let entries: BTreeMap<String, Ghid> =
            bincode::deserialize(bytes).map_err(|e| HypergolixError::MalformedObject(e.to_string()))?;
        Ok(SecondaryManifest { entries })
    }
}

/// Derive the primary manifest's root secret from a password, salted by the
/// account's `user_id` dynamic ghid, per spec §6.4's scrypt(password, salt=user_id,
/// dkLen=48, N=2^15, r=8, p=1) rule.
pub fn derive_primary_secret(password: &[u8], user_id: Ghid) -> Result<Secret> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, SCRYPT_DK_LEN)
        .map_err(|e| HypergolixError::internal("bootstrap::derive_primary_secret", e))?;
    let mut output = [0u8; SCRYPT_DK_LEN];
    scrypt(password, &user_id.as_bytes(), &params, &mut output)
        .map_err(|e| HypergolixError::internal("bootstrap::derive_primary_secret", e))?;

    let mut key = [0u8; 32];
    let mut seed = [0u8; 16];
    key.copy_from_slice(&output[..32]);
    seed.copy_from_slice(&output[32..48]);
    tracing::debug!(target: LOG_TARGET, %user_id, "derived primary manifest secret");
    Ok(Secret::from_parts(key, seed))
}

/// Pack a `PrimaryManifest` into the fixed-layout byte string that goes inside the
/// primary manifest's GEOC, with `[1024, 9215)` bytes of random padding appended.
pub fn encode_primary_manifest(manifest: &PrimaryManifest) -> Vec<u8> {
    let mut out = Vec::with_capacity(FIELD_LEN * 4 + PADDING_MAX);
    write_field(&mut out, manifest.identity_ghid, &manifest.identity_secret);
    write_field(&mut out, manifest.persistent_ghid, &manifest.persistent_secret);
    write_field(&mut out, manifest.quarantine_ghid, &manifest.quarantine_secret);
    write_field(&mut out, manifest.secondary_ghid, &manifest.secondary_secret);

    let padding_len = PADDING_MIN + (OsRng.next_u32() as usize % (PADDING_MAX - PADDING_MIN));
    let mut padding = vec![0u8; padding_len];
    OsRng.fill_bytes(&mut padding);
    out.extend_from_slice(&padding);
    out
}

/// Parse the fixed-layout fields back out of a primary manifest byte string.
/// Trailing padding is ignored.
pub fn decode_primary_manifest(bytes: &[u8]) -> Result<PrimaryManifest> {
    if bytes.len() < FIELD_LEN * 4 {
        return Err(HypergolixError::MalformedObject("primary manifest too short".to_string()));
    }
    let mut offset = 0;
    let (identity_ghid, identity_secret) = read_field(bytes, &mut offset)?;
    let (persistent_ghid, persistent_secret) = read_field(bytes, &mut offset)?;
    let (quarantine_ghid, quarantine_secret) = read_field(bytes, &mut offset)?;
    let (secondary_ghid, secondary_secret) = read_field(bytes, &mut offset)?;

    Ok(PrimaryManifest {
        identity_ghid,
        identity_secret,
        persistent_ghid,
        persistent_secret,
        quarantine_ghid,
        quarantine_secret,
        secondary_ghid,
        secondary_secret,
    })
}

fn write_field(out: &mut Vec<u8>, ghid: Ghid, secret: &Secret) {
    out.extend_from_slice(&ghid.as_bytes());
    out.extend_from_slice(&secret.to_field_bytes());
}

fn read_field(bytes: &[u8], offset: &mut usize) -> Result<(Ghid, Secret)> {
    let ghid_bytes = &bytes[*offset..*offset + GHID_LEN];
    let ghid = Ghid::from_bytes(ghid_bytes).ok_or_else(|| HypergolixError::MalformedObject("bad ghid field".to_string()))?;
    *offset += GHID_LEN;

    let secret_bytes = &bytes[*offset..*offset + SECRET_LEN];
    let secret = Secret::from_field_bytes(secret_bytes)?;
    *offset += SECRET_LEN;

    Ok((ghid, secret))
}
