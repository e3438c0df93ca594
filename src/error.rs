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

use thiserror::Error;

use crate::ghid::Ghid;

/// The single error type surfaced to callers above the `GolixCore` layer.
///
/// Internal, bug-class failures are logged at their origin and re-surfaced here as
/// [`HypergolixError::Internal`]; everything else carries enough context for a caller
/// to react without leaking cryptographic material or file paths.
#[derive(Debug, Error)]
pub enum HypergolixError {
    #[error("object failed to parse or violated shape constraints: {0}")]
    MalformedObject(String),

    #[error("signature verification failed for ghid {0}")]
    InvalidSignature(Ghid),

    #[error("reference to an unknown party: {0}")]
    UnknownParty(Ghid),

    #[error("inconsistent author: debinder {debinder} != binder {binder}")]
    InconsistentAuthor { debinder: Ghid, binder: Ghid },

    #[error("target {0} already has a live debinding")]
    AlreadyDebound(Ghid),

    #[error("dynamic frame history does not align with current state for {0}")]
    FrameReplay(Ghid),

    #[error("ghid not found: {0}")]
    NotFound(Ghid),

    #[error("conflicting secret staged for {0}")]
    SecretConflict(Ghid),

    #[error("no secret available to decrypt {0}")]
    SecretMissing(Ghid),

    #[error("ratchet could not heal {ghid}: missed {missed} frames, legroom {legroom}")]
    RatchetError { ghid: Ghid, missed: usize, legroom: usize },

    #[error("operation attempted on dead object {0}")]
    DeadObject(Ghid),

    #[error("mutation attempted on a static object or by a non-owner: {0}")]
    LocallyImmutable(Ghid),

    #[error("internal error")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, HypergolixError>;

impl HypergolixError {
    /// Wrap any lower-level, non-domain error as a bug-class `Internal` error, logging the
    /// original detail at the call site per the ambient logging convention.
    pub fn internal<E: std::fmt::Display>(context: &'static str, err: E) -> Self {
        tracing::error!(target: "hypergolix::error", "{context}: {err}");
        HypergolixError::Internal(context.to_string())
    }
}
