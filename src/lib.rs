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

//! Hypergolix core: a content-addressed object store and sharing runtime built atop
//! the Golix cryptographic primitive suite. Agents publish, mutate, retain, debind,
//! and share binary objects through a persistence pipeline that enforces binding and
//! debinding accounting rules and cryptographic validity; a bootstrap chain lets
//! multiple applications per agent share one account state.
//!
//! [`PersistenceCore`] owns the ingest pipeline (Doorman → Enforcer → Lawyer → Bookie
//! → Librarian → Undertaker → Postman). [`Oracle`] and [`Gao`] sit above it, giving
//! callers a push/pull object model instead of raw packed primitives. [`bootstrap`]
//! covers the password-derived account manifest that ties a user's dynamic chains
//! together across applications.

pub mod bookie;
pub mod bootstrap;
pub mod config;
pub mod doorman;
pub mod enforcer;
pub mod error;
pub mod gao;
pub mod ghid;
pub mod ghid_proxy;
pub mod golix;
pub mod lawyer;
pub mod librarian;
pub mod oracle;
pub mod persistence;
pub mod postman;
pub mod primitives;
pub mod privateer;
pub mod remote;
pub mod undertaker;

pub use config::CoreConfig;
pub use error::{HypergolixError, Result};
pub use gao::{Gao, HealStats};
pub use ghid::Ghid;
pub use ghid_proxy::GhidProxier;
pub use golix::{GolixCore, Identity};
pub use oracle::Oracle;
pub use persistence::{IngestOutcome, NullRemote, PersistenceCore};
pub use privateer::{Privateer, Secret};
