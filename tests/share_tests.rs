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

//! Share roundtrip (spec scenario 6): agent A shares a container with agent B via a
//! `GARQ` carrying the container's ghid and secret; B stages the secret, fetches and
//! decrypts the container, then A retracts the original share request.

use hypergolix_core::config::CoreConfig;
use hypergolix_core::error::HypergolixError;
use hypergolix_core::ghid::{Ghid, GHID_LEN};
use hypergolix_core::golix::{self, GolixCore, Identity};
use hypergolix_core::librarian::{Librarian, MemoryCache};
use hypergolix_core::persistence::NullRemote;
use hypergolix_core::primitives::Primitive;
use hypergolix_core::privateer::{Privateer, Secret};
use hypergolix_core::PersistenceCore;

fn new_core() -> PersistenceCore<MemoryCache, NullRemote> {
    PersistenceCore::new(Librarian::new(MemoryCache::new()), CoreConfig::default())
}

fn share_payload(container_ghid: Ghid, secret: &Secret) -> Vec<u8> {
    let mut payload = Vec::with_capacity(GHID_LEN + 53);
    payload.extend_from_slice(&container_ghid.as_bytes());
    payload.extend_from_slice(&secret.to_field_bytes());
    payload
}

fn parse_share_payload(payload: &[u8]) -> (Ghid, Secret) {
    let ghid = Ghid::from_bytes(&payload[..GHID_LEN]).unwrap();
    let secret = Secret::from_field_bytes(&payload[GHID_LEN..]).unwrap();
    (ghid, secret)
}

#[tokio::test]
async fn share_roundtrip_delivers_a_decryptable_container_and_retracts_cleanly() {
    let core = new_core();
    let alice = GolixCore::new(Identity::generate());
    let bob = GolixCore::new(Identity::generate());
    core.ingest(alice.make_gidc().1, false).await.unwrap();
    core.ingest(bob.make_gidc().1, false).await.unwrap();

    let secret = Secret::new_random();
    let (container, container_packed) = alice.make_container(b"shared payload", &secret);
    core.ingest(container_packed, false).await.unwrap();

    // Alice constructs a GARQ to Bob carrying (container ghid, secret).
    let payload = share_payload(container.ghid, &secret);
    let (share_request, share_packed) = alice.make_request(bob.identity().gidc(), &payload);
    let outcome = core.ingest(share_packed, false).await.unwrap();
    let _ = outcome;

    // Bob, subscribed to his own ghid, is notified and ingests/opens the GARQ.
    let delivered = core.summarize(&share_request.ghid).await.unwrap();
    assert_eq!(delivered.ghid(), share_request.ghid);

    let garq_packed = core.retrieve(&share_request.ghid).await.unwrap();
    let garq = match golix::unpack(&garq_packed).unwrap() {
        Primitive::Garq(g) => g,
        _ => panic!("expected Garq"),
    };
    let opened = bob.open_request(&garq, alice.identity().gidc()).unwrap();
    let (shared_ghid, shared_secret) = parse_share_payload(&opened);
    assert_eq!(shared_ghid, container.ghid);

    // Bob stages the secret, fetches the container, and decrypts it.
    let mut bob_privateer = Privateer::new();
    bob_privateer.quarantine(shared_ghid, shared_secret);
    bob_privateer.promote_quarantined(shared_ghid).unwrap();
    let recovered_secret = bob_privateer.get(shared_ghid).unwrap();

    let container_packed = core.retrieve(&container.ghid).await.unwrap();
    let geoc = match golix::unpack(&container_packed).unwrap() {
        Primitive::Geoc(g) => g,
        _ => panic!("expected Geoc"),
    };
    let plaintext = bob.open_container(&geoc, recovered_secret).unwrap();
    assert_eq!(plaintext, b"shared payload".to_vec());

    // Bob acks by sharing a GARQ back to Alice, and Alice retracts her original
    // share request now that it has been acknowledged.
    let (_ack, ack_packed) = bob.make_request(alice.identity().gidc(), b"ack");
    core.ingest(ack_packed, false).await.unwrap();

    let (_retract, retract_packed) = alice.make_debind(share_request.ghid);
    core.ingest(retract_packed, false).await.unwrap();
    assert!(!core.has(&share_request.ghid).await);
}

#[tokio::test]
async fn garq_to_a_recipient_without_a_known_gidc_is_rejected() {
    let core = new_core();
    let alice = GolixCore::new(Identity::generate());
    core.ingest(alice.make_gidc().1, false).await.unwrap();

    let ghost = GolixCore::new(Identity::generate());
    let (_request, packed) = alice.make_request(ghost.identity().gidc(), b"hello?");
    let err = core.ingest(packed, false).await.unwrap_err();
    assert!(matches!(err, HypergolixError::UnknownParty(_)));
}
