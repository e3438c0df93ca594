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

//! The five Golix primitive kinds and their "lite" (parsed-summary) forms.
//!
//! The source system tested primitive kind with runtime type checks; here the kinds
//! are a tagged union (`Parsed`) matched exhaustively at every ingest step.

pub mod lite;

pub use lite::{GarqLite, GdxxLite, GeocLite, GidcLite, GobdLite, GobsLite, Parsed};

use serde::{Deserialize, Serialize};

use crate::ghid::Ghid;

/// Maximum number of prior frame ghids a `Gobd` may carry in its history.
pub const DEFAULT_MAX_HISTORY: usize = 7;

/// Golix identity container: publishes a party's public keys. Self-addressing and
/// self-validating (its own signature is checked against its own embedded key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gidc {
    pub ghid: Ghid,
    pub signing_public_key: [u8; 32],
    pub encryption_public_key: [u8; 32],
}

/// Golix encrypted object container: opaque ciphertext, recoverable only with the
/// matching symmetric secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geoc {
    pub ghid: Ghid,
    pub author: Ghid,
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

/// Golix static binding: a hold on `target`, preventing its GC until debound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gobs {
    pub ghid: Ghid,
    pub author: Ghid,
    pub target: Ghid,
}

/// Golix dynamic binding frame: a single frame of a mutable chain. `ghid` is unique
/// per frame; `dynamic_ghid` is the stable identity of the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gobd {
    pub ghid: Ghid,
    pub dynamic_ghid: Ghid,
    pub author: Ghid,
    pub target: Ghid,
    /// Newest-first, bounded by the enforcer's configured maximum.
    pub history: Vec<Ghid>,
}

/// Golix debinding: retracts a prior binding or request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gdxx {
    pub ghid: Ghid,
    pub author: Ghid,
    pub target: Ghid,
}

/// Golix asymmetric request: an authenticated, encrypted message to a recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Garq {
    pub ghid: Ghid,
    pub author: Ghid,
    pub recipient: Ghid,
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

/// A primitive together with its envelope signature, the unit that crosses the
/// Doorman boundary. `Gidc` carries no separate signature field here because its
/// self-signature lives inside the packed envelope produced by `golix::wire`.
#[derive(Debug, Clone)]
pub enum Primitive {
    Gidc(Gidc),
    Geoc(Geoc),
    Gobs(Gobs),
    Gobd(Gobd),
    Gdxx(Gdxx),
    Garq(Garq),
}

impl Primitive {
    pub fn ghid(&self) -> Ghid {
        match self {
            Primitive::Gidc(p) => p.ghid,
            Primitive::Geoc(p) => p.ghid,
            Primitive::Gobs(p) => p.ghid,
            Primitive::Gobd(p) => p.ghid,
            Primitive::Gdxx(p) => p.ghid,
            Primitive::Garq(p) => p.ghid,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Gidc(_) => PrimitiveKind::Gidc,
            Primitive::Geoc(_) => PrimitiveKind::Geoc,
            Primitive::Gobs(_) => PrimitiveKind::Gobs,
            Primitive::Gobd(_) => PrimitiveKind::Gobd,
            Primitive::Gdxx(_) => PrimitiveKind::Gdxx,
            Primitive::Garq(_) => PrimitiveKind::Garq,
        }
    }

    pub fn to_lite(&self) -> Parsed {
        match self {
            Primitive::Gidc(p) => Parsed::Gidc(lite::GidcLite {
                ghid: p.ghid,
                signing_public_key: p.signing_public_key,
                encryption_public_key: p.encryption_public_key,
            }),
            Primitive::Geoc(p) => Parsed::Geoc(lite::GeocLite {
                ghid: p.ghid,
                author: p.author,
            }),
            Primitive::Gobs(p) => Parsed::Gobs(lite::GobsLite {
                ghid: p.ghid,
                author: p.author,
                target: p.target,
            }),
            Primitive::Gobd(p) => Parsed::Gobd(lite::GobdLite {
                ghid: p.ghid,
                dynamic_ghid: p.dynamic_ghid,
                author: p.author,
                target: p.target,
                history: p.history.clone(),
            }),
            Primitive::Gdxx(p) => Parsed::Gdxx(lite::GdxxLite {
                ghid: p.ghid,
                author: p.author,
                target: p.target,
            }),
            Primitive::Garq(p) => Parsed::Garq(lite::GarqLite {
                ghid: p.ghid,
                author: p.author,
                recipient: p.recipient,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Gidc,
    Geoc,
    Gobs,
    Gobd,
    Gdxx,
    Garq,
}
