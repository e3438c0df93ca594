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

//! Construction-time configuration for `PersistenceCore`. No global mutable state
//! (spec §9): every tunable lives here and is threaded in explicitly.

use crate::primitives::DEFAULT_MAX_HISTORY;

/// Tunables for a `PersistenceCore` instance and the `Gao`s it backs.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Enforcer's maximum accepted `Gobd.history` length.
    pub max_history_len: usize,
    /// Default legroom assigned to newly-registered `Gao`s.
    pub default_legroom: usize,
    /// Upper bound on concurrently in-flight offloaded crypto/KDF tasks.
    pub worker_pool_size: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            max_history_len: DEFAULT_MAX_HISTORY,
            default_legroom: DEFAULT_MAX_HISTORY,
            worker_pool_size: 4,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_matches_spec_default_history_bound() {
        let config = CoreConfig::default();
        assert_eq!(config.max_history_len, 7);
        assert_eq!(config.default_legroom, 7);
    }
}
