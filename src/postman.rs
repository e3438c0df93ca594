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

//! The Postman: subscription bookkeeping and fan-out. `notify` is called once per
//! completed ingest, after the Undertaker has triaged GC.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ghid::Ghid;
use crate::primitives::Parsed;

const LOG_TARGET: &str = "hypergolix::postman";

/// A subscriber callback. Boxed so `Postman` can hold a heterogeneous set of
/// subscribers (closures, channel senders) behind one type.
pub type Callback = Arc<dyn Fn(Ghid) + Send + Sync>;

#[derive(Default)]
pub struct Postman {
    subscribers: HashMap<Ghid, Vec<Callback>>,
}

impl Postman {
    pub fn new() -> Self {
        Postman::default()
    }

    pub fn subscribe(&mut self, ghid: Ghid, callback: Callback) {
        self.subscribers.entry(ghid).or_default().push(callback);
        tracing::trace!(target: LOG_TARGET, %ghid, "subscribed");
    }

    /// Removes every subscriber registered for `ghid`. `Callback`s are compared by
    /// pointer identity (`Arc::ptr_eq`), matching the teacher's convention of
    /// identity-based callback deregistration over attempting closure equality.
    pub fn unsubscribe(&mut self, ghid: &Ghid, callback: &Callback) {
        if let Some(list) = self.subscribers.get_mut(ghid) {
            list.retain(|existing| !Arc::ptr_eq(existing, callback));
            if list.is_empty() {
                self.subscribers.remove(ghid);
            }
        }
    }

    /// Fan out the effect of a just-ingested primitive to every relevant
    /// subscription: the dynamic ghid on a new frame, the debound target on a
    /// debinding, the recipient on a request. Copy-on-iterate so a callback that
    /// subscribes/unsubscribes mid-dispatch cannot corrupt the iteration.
    pub fn notify(&self, lite: &Parsed) {
        let targets = notify_targets(lite);
        for target in targets {
            if let Some(list) = self.subscribers.get(&target) {
                let snapshot = list.clone();
                for callback in snapshot {
                    callback(lite.ghid());
                }
            }
        }
    }
}

fn notify_targets(lite: &Parsed) -> Vec<Ghid> {
    match lite {
        Parsed::Gobd(g) => vec![g.dynamic_ghid],
        Parsed::Gdxx(g) => vec![g.target],
        Parsed::Garq(g) => vec![g.recipient],
        _ => vec![],
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::primitives::lite::{GarqLite, GdxxLite, GobdLite};

    #[test]
    fn subscriber_fires_on_new_dynamic_frame() {
        let mut postman = Postman::new();
        let dynamic = Ghid::derive(b"dynamic");
        let received: Arc<Mutex<Vec<Ghid>>> = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        let callback: Callback = Arc::new(move |ghid| received_clone.lock().unwrap().push(ghid));
        postman.subscribe(dynamic, callback);

        let frame = Parsed::Gobd(GobdLite {
            ghid: Ghid::derive(b"frame"),
            dynamic_ghid: dynamic,
            author: Ghid::derive(b"author"),
            target: Ghid::derive(b"target"),
            history: vec![],
        });
        postman.notify(&frame);
        assert_eq!(received.lock().unwrap().as_slice(), &[frame.ghid()]);
    }

    #[test]
    fn unsubscribe_stops_further_notifications() {
        let mut postman = Postman::new();
        let dynamic = Ghid::derive(b"dynamic");
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let callback: Callback = Arc::new(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        postman.subscribe(dynamic, callback.clone());
        postman.unsubscribe(&dynamic, &callback);

        let frame = Parsed::Gobd(GobdLite {
            ghid: Ghid::derive(b"frame"),
            dynamic_ghid: dynamic,
            author: Ghid::derive(b"author"),
            target: Ghid::derive(b"target"),
            history: vec![],
        });
        postman.notify(&frame);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn debinding_notifies_subscribers_of_its_target() {
        let mut postman = Postman::new();
        let target = Ghid::derive(b"target");
        let received: Arc<Mutex<Vec<Ghid>>> = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        postman.subscribe(target, Arc::new(move |ghid| received_clone.lock().unwrap().push(ghid)));

        let gdxx = Parsed::Gdxx(GdxxLite {
            ghid: Ghid::derive(b"gdxx"),
            author: Ghid::derive(b"author"),
            target,
        });
        postman.notify(&gdxx);
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn garq_notifies_recipient_subscribers() {
        let mut postman = Postman::new();
        let recipient = Ghid::derive(b"recipient");
        let received: Arc<Mutex<Vec<Ghid>>> = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        postman.subscribe(recipient, Arc::new(move |ghid| received_clone.lock().unwrap().push(ghid)));

        let garq = Parsed::Garq(GarqLite {
            ghid: Ghid::derive(b"garq"),
            author: Ghid::derive(b"author"),
            recipient,
        });
        postman.notify(&garq);
        assert_eq!(received.lock().unwrap().len(), 1);
    }
}
