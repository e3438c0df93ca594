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

//! `GolixCore`: a thin wrapper around an agent's identity that makes, verifies, and
//! opens Golix primitives. The wire serialization here is a self-contained stand-in
//! for the real Golix library (out of scope per spec §1) — it produces the packed
//! byte strings and parsed fields the rest of the core depends on, nothing more.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as XPublicKey, StaticSecret as XStaticSecret};

use crate::error::{HypergolixError, Result};
use crate::ghid::Ghid;
use crate::primitives::{Garq, Gdxx, Geoc, Gidc, Gobd, Gobs, Primitive};
use crate::privateer::Secret;

const LOG_TARGET: &str = "hypergolix::golix";

#[derive(Serialize, Deserialize)]
enum WireBody {
    Gidc {
        signing_public_key: [u8; 32],
        encryption_public_key: [u8; 32],
    },
    Geoc {
        author: Ghid,
        nonce: [u8; 12],
        ciphertext: Vec<u8>,
    },
    Gobs {
        author: Ghid,
        target: Ghid,
    },
    Gobd {
        dynamic_ghid: Ghid,
        author: Ghid,
        target: Ghid,
        history: Vec<Ghid>,
    },
    Gdxx {
        author: Ghid,
        target: Ghid,
    },
    Garq {
        author: Ghid,
        recipient: Ghid,
        nonce: [u8; 12],
        ciphertext: Vec<u8>,
    },
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    body: WireBody,
    signature: [u8; 64],
}

fn canonical_body_bytes(body: &WireBody) -> Vec<u8> {
    bincode::serialize(body).expect("WireBody serialization is infallible")
}

/// A party's long-lived cryptographic material: an ed25519 signing keypair for
/// authorship/authentication and an x25519 keypair for `Garq` key agreement.
pub struct Identity {
    ghid: Ghid,
    signing_key: SigningKey,
    encryption_key: XStaticSecret,
    gidc: Gidc,
}

impl Identity {
    /// Generate a fresh identity and its self-signed `Gidc`.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let encryption_key = XStaticSecret::random_from_rng(OsRng);
        let verifying_key = signing_key.verifying_key();
        let encryption_public_key = XPublicKey::from(&encryption_key);

        let body = WireBody::Gidc {
            signing_public_key: verifying_key.to_bytes(),
            encryption_public_key: encryption_public_key.to_bytes(),
        };
        let body_bytes = canonical_body_bytes(&body);
        let ghid = Ghid::derive(&body_bytes);

        let gidc = Gidc {
            ghid,
            signing_public_key: verifying_key.to_bytes(),
            encryption_public_key: encryption_public_key.to_bytes(),
        };

        tracing::debug!(target: LOG_TARGET, %ghid, "generated new identity");

        Identity {
            ghid,
            signing_key,
            encryption_key,
            gidc,
        }
    }

    pub fn ghid(&self) -> Ghid {
        self.ghid
    }

    pub fn gidc(&self) -> &Gidc {
        &self.gidc
    }

    fn sign(&self, body_bytes: &[u8]) -> Signature {
        self.signing_key.sign(body_bytes)
    }
}

/// Thin wrapper delegating primitive construction, opening, and verification to the
/// identity's crypto material. Every other component reaches the Golix primitive
/// suite only through this type.
pub struct GolixCore {
    identity: Identity,
}

impl GolixCore {
    pub fn new(identity: Identity) -> Self {
        GolixCore { identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The self-signed `Gidc` packed envelope for this identity, suitable for
    /// publishing via `PersistenceCore::ingest`.
    pub fn make_gidc(&self) -> (Gidc, Vec<u8>) {
        let body = WireBody::Gidc {
            signing_public_key: self.identity.gidc.signing_public_key,
            encryption_public_key: self.identity.gidc.encryption_public_key,
        };
        let body_bytes = canonical_body_bytes(&body);
        let signature = self.identity.sign(&body_bytes);
        let packed = bincode::serialize(&Envelope {
            body,
            signature: signature.to_bytes(),
        })
        .expect("Envelope serialization is infallible");
        (self.identity.gidc.clone(), packed)
    }

    pub fn make_container(&self, plaintext: &[u8], secret: &Secret) -> (Geoc, Vec<u8>) {
        let mut nonce = [0u8; 12];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = secret.encrypt(&nonce, plaintext);
        let author = self.identity.ghid;

        let body = WireBody::Geoc {
            author,
            nonce,
            ciphertext: ciphertext.clone(),
        };
        let (ghid, packed) = self.sign_and_pack(body);
        (
            Geoc {
                ghid,
                author,
                nonce,
                ciphertext,
            },
            packed,
        )
    }

    pub fn make_binding_static(&self, target: Ghid) -> (Gobs, Vec<u8>) {
        let author = self.identity.ghid;
        let body = WireBody::Gobs { author, target };
        let (ghid, packed) = self.sign_and_pack(body);
        (Gobs { ghid, author, target }, packed)
    }

    /// Construct the next dynamic binding frame. When `dynamic_ghid` is `None` this is
    /// the genesis frame: by convention the genesis frame's own ghid becomes the
    /// dynamic chain's permanent identity, so the body is packed twice — once to
    /// learn what the frame's ghid would be, once with that ghid folded in as
    /// `dynamic_ghid`.
    pub fn make_binding_dynamic(&self, target: Ghid, dynamic_ghid: Option<Ghid>, history: Vec<Ghid>) -> (Gobd, Vec<u8>) {
        let author = self.identity.ghid;
        let dynamic_ghid = dynamic_ghid.unwrap_or_else(|| {
            // Genesis frame: its own ghid becomes the dynamic chain's permanent identity,
            // so we need to know that ghid before we can fold it into the signed body.
            let provisional = WireBody::Gobd {
                dynamic_ghid: Ghid::derive(&[]),
                author,
                target,
                history: history.clone(),
            };
            Ghid::derive(&canonical_body_bytes(&provisional))
        });

        let body = WireBody::Gobd {
            dynamic_ghid,
            author,
            target,
            history: history.clone(),
        };
        let (ghid, packed) = self.sign_and_pack(body);
        (
            Gobd {
                ghid,
                dynamic_ghid,
                author,
                target,
                history,
            },
            packed,
        )
    }

    pub fn make_debind(&self, target: Ghid) -> (Gdxx, Vec<u8>) {
        let author = self.identity.ghid;
        let body = WireBody::Gdxx { author, target };
        let (ghid, packed) = self.sign_and_pack(body);
        (Gdxx { ghid, author, target }, packed)
    }

    pub fn make_request(&self, recipient: &Gidc, payload: &[u8]) -> (Garq, Vec<u8>) {
        let recipient_pub = XPublicKey::from(recipient.encryption_public_key);
        let shared = self.identity.encryption_key.diffie_hellman(&recipient_pub);
        let secret = Secret::from_raw_key(*shared.as_bytes());

        let mut nonce = [0u8; 12];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = secret.encrypt(&nonce, payload);
        let author = self.identity.ghid;
        let recipient_ghid = recipient.ghid;

        let body = WireBody::Garq {
            author,
            recipient: recipient_ghid,
            nonce,
            ciphertext: ciphertext.clone(),
        };
        let (ghid, packed) = self.sign_and_pack(body);
        (
            Garq {
                ghid,
                author,
                recipient: recipient_ghid,
                nonce,
                ciphertext,
            },
            packed,
        )
    }

    /// Recover the plaintext payload of a `Garq` addressed to this identity.
    pub fn open_request(&self, garq: &Garq, sender: &Gidc) -> Result<Vec<u8>> {
        let sender_pub = XPublicKey::from(sender.encryption_public_key);
        let shared = self.identity.encryption_key.diffie_hellman(&sender_pub);
        let secret = Secret::from_raw_key(*shared.as_bytes());
        secret.decrypt(&garq.nonce, &garq.ciphertext)
    }

    pub fn open_container(&self, geoc: &Geoc, secret: &Secret) -> Result<Vec<u8>> {
        secret.decrypt(&geoc.nonce, &geoc.ciphertext)
    }

    fn sign_and_pack(&self, body: WireBody) -> (Ghid, Vec<u8>) {
        let body_bytes = canonical_body_bytes(&body);
        let ghid = Ghid::derive(&body_bytes);
        let signature = self.identity.sign(&body_bytes);
        let packed = bincode::serialize(&Envelope {
            body,
            signature: signature.to_bytes(),
        })
        .expect("Envelope serialization is infallible");
        (ghid, packed)
    }
}

/// Parse `packed` into a `Primitive`, without checking its signature. Used by
/// `Doorman` (which checks the signature separately, once it can resolve the
/// author) and by tests that want to inspect an envelope's shape.
pub fn unpack(packed: &[u8]) -> Result<Primitive> {
    let envelope: Envelope =
        bincode::deserialize(packed).map_err(|e| HypergolixError::MalformedObject(e.to_string()))?;
    let body_bytes = canonical_body_bytes(&envelope.body);
    let ghid = Ghid::derive(&body_bytes);
    Ok(match envelope.body {
        WireBody::Gidc {
            signing_public_key,
            encryption_public_key,
        } => Primitive::Gidc(Gidc {
            ghid,
            signing_public_key,
            encryption_public_key,
        }),
        WireBody::Geoc { author, nonce, ciphertext } => Primitive::Geoc(Geoc {
            ghid,
            author,
            nonce,
            ciphertext,
        }),
        WireBody::Gobs { author, target } => Primitive::Gobs(Gobs { ghid, author, target }),
        WireBody::Gobd {
            dynamic_ghid,
            author,
            target,
            history,
        } => Primitive::Gobd(Gobd {
            ghid,
            dynamic_ghid,
            author,
            target,
            history,
        }),
        WireBody::Gdxx { author, target } => Primitive::Gdxx(Gdxx { ghid, author, target }),
        WireBody::Garq {
            author,
            recipient,
            nonce,
            ciphertext,
        } => Primitive::Garq(Garq {
            ghid,
            author,
            recipient,
            nonce,
            ciphertext,
        }),
    })
}

/// Verify `packed`'s envelope signature against `signing_public_key`. Returns
/// `Ok(())` on success, `InvalidSignature` otherwise.
pub fn verify_signature(packed: &[u8], signing_public_key: &[u8; 32], ghid_for_error: Ghid) -> Result<()> {
    let envelope: Envelope =
        bincode::deserialize(packed).map_err(|e| HypergolixError::MalformedObject(e.to_string()))?;
    let body_bytes = canonical_body_bytes(&envelope.body);
    let verifying_key = VerifyingKey::from_bytes(signing_public_key)
        .map_err(|e| HypergolixError::MalformedObject(e.to_string()))?;
    let signature = Signature::from_bytes(&envelope.signature);
    verifying_key
        .verify(&body_bytes, &signature)
        .map_err(|_| HypergolixError::InvalidSignature(ghid_for_error))
}
