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

//! Account bootstrap restore (spec scenario 5): derive the primary manifest's root
//! secret from a password and user id, pack/unpack the manifest, and recover every
//! secret an account's dynamic chains need from a prior session.

use hypergolix_core::bootstrap::{decode_primary_manifest, derive_primary_secret, encode_primary_manifest, PrimaryManifest, SecondaryManifest, SecondaryManifestKey};
use hypergolix_core::ghid::Ghid;
use hypergolix_core::privateer::{Privateer, Secret};

#[test]
fn bootstrap_restore_recovers_every_account_secret() {
    let user_id = Ghid::derive(b"alice-account");
    let password = b"correct horse battery staple";

    // A prior session: derive the root secret, build and persist the manifest.
    let primary_secret = derive_primary_secret(password, user_id).unwrap();
    let manifest = PrimaryManifest {
        identity_ghid: Ghid::derive(b"identity-chain"),
        identity_secret: primary_secret.ratchet(Ghid::derive(b"identity-chain")),
        persistent_ghid: Ghid::derive(b"persistent-chain"),
        persistent_secret: primary_secret.ratchet(Ghid::derive(b"persistent-chain")),
        quarantine_ghid: Ghid::derive(b"quarantine-chain"),
        quarantine_secret: primary_secret.ratchet(Ghid::derive(b"quarantine-chain")),
        secondary_ghid: Ghid::derive(b"secondary-chain"),
        secondary_secret: primary_secret.ratchet(Ghid::derive(b"secondary-chain")),
    };
    let persisted = encode_primary_manifest(&manifest);

    // A new session: recompute the root secret from (password, user_id) alone and
    // restore the manifest from durable storage.
    let restored_root = derive_primary_secret(password, user_id).unwrap();
    assert!(restored_root == primary_secret);

    let restored = decode_primary_manifest(&persisted).unwrap();
    assert_eq!(restored.identity_ghid, manifest.identity_ghid);
    assert_eq!(restored.persistent_ghid, manifest.persistent_ghid);
    assert_eq!(restored.quarantine_ghid, manifest.quarantine_ghid);
    assert_eq!(restored.secondary_ghid, manifest.secondary_ghid);

    // The Privateer's persistent store, once seeded from the restored manifest,
    // holds every secret needed to decrypt the account's dynamic objects.
    let mut privateer = Privateer::new();
    privateer.stage(restored.identity_ghid, restored.identity_secret).unwrap();
    privateer.commit(restored.identity_ghid, true);
    privateer.stage(restored.persistent_ghid, restored.persistent_secret).unwrap();
    privateer.commit(restored.persistent_ghid, true);
    privateer.stage(restored.quarantine_ghid, restored.quarantine_secret).unwrap();
    privateer.commit(restored.quarantine_ghid, true);
    privateer.stage(restored.secondary_ghid, restored.secondary_secret).unwrap();
    privateer.commit(restored.secondary_ghid, true);

    assert!(privateer.has(manifest.identity_ghid));
    assert!(privateer.has(manifest.persistent_ghid));
    assert!(privateer.has(manifest.quarantine_ghid));
    assert!(privateer.has(manifest.secondary_ghid));
}

#[test]
fn wrong_password_derives_a_different_root_secret() {
    let user_id = Ghid::derive(b"alice-account");
    let right = derive_primary_secret(b"correct horse battery staple", user_id).unwrap();
    let wrong = derive_primary_secret(b"wrong guess", user_id).unwrap();
    assert!(right != wrong);
}

#[test]
fn secondary_manifest_survives_the_restore_round_trip() {
    let mut secondary = SecondaryManifest::new();
    secondary.set(SecondaryManifestKey::ROLODEX_PENDING, Ghid::derive(b"pending-share"));
    secondary.set(SecondaryManifestKey::DISPATCH_TOKENS, Ghid::derive(b"tokens"));

    let encoded = secondary.encode();
    let restored = SecondaryManifest::decode(&encoded).unwrap();
    assert_eq!(restored.get(SecondaryManifestKey::ROLODEX_PENDING), secondary.get(SecondaryManifestKey::ROLODEX_PENDING));
    assert_eq!(restored.get(SecondaryManifestKey::IPC_INCOMING), None);
}

#[test]
fn primary_manifest_padding_falls_within_the_configured_range() {
    let manifest = PrimaryManifest {
        identity_ghid: Ghid::derive(b"a"),
        identity_secret: Secret::new_random(),
        persistent_ghid: Ghid::derive(b"b"),
        persistent_secret: Secret::new_random(),
        quarantine_ghid: Ghid::derive(b"c"),
        quarantine_secret: Secret::new_random(),
        secondary_ghid: Ghid::derive(b"d"),
        secondary_secret: Secret::new_random(),
    };
    let encoded = encode_primary_manifest(&manifest);
    let field_total = (65 + 53) * 4;
    let padding_len = encoded.len() - field_total;
    assert!((1024..9215).contains(&padding_len), "padding length {padding_len} out of spec range");
}
