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

//! Structural shape checks on a freshly-parsed primitive, with no cross-reference
//! into the Librarian or Bookie. Runs immediately after the Doorman in the ingest
//! pipeline.

use crate::error::{HypergolixError, Result};
use crate::primitives::Parsed;

const LOG_TARGET: &str = "hypergolix::enforcer";

pub struct Enforcer {
    max_history_len: usize,
}

impl Enforcer {
    pub fn new(max_history_len: usize) -> Self {
        Enforcer { max_history_len }
    }

    /// Checks shape only; never consults the Librarian or Bookie.
    pub fn validate(&self, lite: &Parsed) -> Result<()> {
        if let Parsed::Gobd(g) = lite {
            if g.history.len() > self.max_history_len {
                log::warn!(
                    target: LOG_TARGET,
                    "rejecting {}: history length {} exceeds max {}",
                    g.ghid,
                    g.history.len(),
                    self.max_history_len
                );
                return Err(HypergolixError::MalformedObject(format!(
                    "dynamic frame history length {} exceeds maximum {}",
                    g.history.len(),
                    self.max_history_len
                )));
            }
        }
        Ok(())
    }
}
