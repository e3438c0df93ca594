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

use serde::{Deserialize, Serialize};

use crate::ghid::Ghid;
use crate::primitives::PrimitiveKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GidcLite {
    pub ghid: Ghid,
    pub signing_public_key: [u8; 32],
    pub encryption_public_key: [u8; 32],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocLite {
    pub ghid: Ghid,
    pub author: Ghid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GobsLite {
    pub ghid: Ghid,
    pub author: Ghid,
    pub target: Ghid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GobdLite {
    pub ghid: Ghid,
    pub dynamic_ghid: Ghid,
    pub author: Ghid,
    pub target: Ghid,
    pub history: Vec<Ghid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GdxxLite {
    pub ghid: Ghid,
    pub author: Ghid,
    pub target: Ghid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarqLite {
    pub ghid: Ghid,
    pub author: Ghid,
    pub recipient: Ghid,
}

/// The parsed, cheap-to-clone summary of any primitive, independent of its packed
/// bytes. This is what the Librarian indexes under each ghid and what Enforcer/
/// Lawyer/Bookie operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Parsed {
    Gidc(GidcLite),
    Geoc(GeocLite),
    Gobs(GobsLite),
    Gobd(GobdLite),
    Gdxx(GdxxLite),
    Garq(GarqLite),
}

impl Parsed {
    pub fn ghid(&self) -> Ghid {
        match self {
            Parsed::Gidc(p) => p.ghid,
            Parsed::Geoc(p) => p.ghid,
            Parsed::Gobs(p) => p.ghid,
            Parsed::Gobd(p) => p.ghid,
            Parsed::Gdxx(p) => p.ghid,
            Parsed::Garq(p) => p.ghid,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Parsed::Gidc(_) => PrimitiveKind::Gidc,
            Parsed::Geoc(_) => PrimitiveKind::Geoc,
            Parsed::Gobs(_) => PrimitiveKind::Gobs,
            Parsed::Gobd(_) => PrimitiveKind::Gobd,
            Parsed::Gdxx(_) => PrimitiveKind::Gdxx,
            Parsed::Garq(_) => PrimitiveKind::Garq,
        }
    }

    /// The author ghid, for every kind except `Gidc` (which is self-authored).
    pub fn author(&self) -> Option<Ghid> {
        match self {
            Parsed::Gidc(p) => Some(p.ghid),
            Parsed::Geoc(p) => Some(p.author),
            Parsed::Gobs(p) => Some(p.author),
            Parsed::Gobd(p) => Some(p.author),
            Parsed::Gdxx(p) => Some(p.author),
            Parsed::Garq(p) => Some(p.author),
        }
    }

    /// The target ghid this primitive holds or retracts, if any.
    pub fn target(&self) -> Option<Ghid> {
        match self {
            Parsed::Gobs(p) => Some(p.target),
            Parsed::Gobd(p) => Some(p.target),
            Parsed::Gdxx(p) => Some(p.target),
            _ => None,
        }
    }
}
