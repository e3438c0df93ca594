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

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

/// Number of bytes in a ghid's address portion (a SHA-512 digest).
pub const GHID_ADDRESS_LEN: usize = 64;
/// Total packed length of a ghid: one algorithm byte plus the address.
pub const GHID_LEN: usize = GHID_ADDRESS_LEN + 1;

/// The hash algorithm used to derive a ghid's address from a canonical packing.
///
/// Only one variant exists today; the byte is carried so a future algorithm can be
/// introduced without changing the wire width of a ghid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GhidAlgo {
    Sha512 = 1,
}

impl GhidAlgo {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(GhidAlgo::Sha512),
            _ => None,
        }
    }
}

/// A 65-byte typed identifier: one algorithm byte plus a 64-byte digest of a
/// canonical packing. Equality is byte equality; ordering is a deterministic
/// lexicographic comparison suitable for use as a map key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ghid {
    algo: GhidAlgo,
    address: [u8; GHID_ADDRESS_LEN],
}

impl Ghid {
    /// Derive a ghid by hashing `canonical_bytes` with the given algorithm.
    pub fn derive(canonical_bytes: &[u8]) -> Self {
        Self::derive_with(GhidAlgo::Sha512, canonical_bytes)
    }

    pub fn derive_with(algo: GhidAlgo, canonical_bytes: &[u8]) -> Self {
        match algo {
            GhidAlgo::Sha512 => {
                let mut hasher = Sha512::new();
                hasher.update(canonical_bytes);
                let digest = hasher.finalize();
                let mut address = [0u8; GHID_ADDRESS_LEN];
                address.copy_from_slice(&digest);
                Ghid { algo, address }
            },
        }
    }

    pub fn algo(&self) -> GhidAlgo {
        self.algo
    }

    pub fn as_bytes(&self) -> [u8; GHID_LEN] {
        let mut out = [0u8; GHID_LEN];
        out[0] = self.algo as u8;
        out[1..].copy_from_slice(&self.address);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != GHID_LEN {
            return None;
        }
        let algo = GhidAlgo::from_byte(bytes[0])?;
        let mut address = [0u8; GHID_ADDRESS_LEN];
        address.copy_from_slice(&bytes[1..]);
        Some(Ghid { algo, address })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl fmt::Debug for Ghid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ghid({}..)", &self.to_hex()[..12])
    }
}

impl fmt::Display for Ghid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}
