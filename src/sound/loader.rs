//! Background fetching of sound pack selections.
//!
//! Pack files are read on a worker thread and handed back over a channel.
//! Results from every selection share one channel, so a superseded fetch
//! still arrives and is then discarded by its generation.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use super::{AssetSource, FetchedPack, SelectionTicket};

/// Runs [`SelectionTicket::fetch`] off the main thread.
pub struct PackLoader {
    source: Arc<dyn AssetSource>,
    sender: Sender<FetchedPack>,
    receiver: Receiver<FetchedPack>,
    in_flight: usize,
}

impl PackLoader {
    /// Creates a loader reading from `source`.
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        let (sender, receiver) = channel();
        Self {
            source,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Shared asset source.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn AssetSource> {
        &self.source
    }

    /// Starts fetching a selection in the background.
    pub fn start(&mut self, ticket: SelectionTicket) {
        let sender = self.sender.clone();
        let source = Arc::clone(&self.source);
        self.in_flight += 1;

        tracing::debug!(pack = ticket.pack_id(), generation = ticket.generation(), "Fetching sound pack");

        thread::spawn(move || {
            let fetched = ticket.fetch(source.as_ref());
            // The loader may be gone if the app is shutting down.
            let _ = sender.send(fetched);
        });
    }

    /// Returns the next finished fetch, if one is ready.
    pub fn poll(&mut self) -> Option<FetchedPack> {
        match self.receiver.try_recv() {
            Ok(fetched) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(fetched)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// True while any fetch has not been polled yet.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}
