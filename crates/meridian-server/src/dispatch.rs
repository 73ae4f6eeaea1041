//! Per-recipient composition and outbound queueing.
//!
//! The broadcaster is the only place where a [`ChangeSet`] meets the
//! transport: it runs `build` once per connected observer, encodes the
//! result, and pushes the bytes onto an outbound queue the transport task
//! drains. Observers for whom the set composes to nothing are skipped
//! without a queue entry.

use tokio::sync::mpsc;
use tracing::debug;

use meridian_protocol::wire::{self, WireError};
use meridian_protocol::Message;
use meridian_sync::{ChangeSet, Observer};

use crate::view::PlayerView;

/// Channel IDs for different message classes
pub mod channel_id {
    /// State sync - must arrive in order
    pub const UPDATES: u8 = 0;
    /// Errors and notifications - reliable but order less critical
    pub const NOTIFY: u8 = 1;
}

/// One encoded payload awaiting transmission.
#[derive(Clone, Debug)]
pub struct Outbound {
    pub client_id: u64,
    pub channel: u8,
    pub bytes: Vec<u8>,
}

/// Errors while composing or queueing outbound payloads
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("outbound queue closed")]
    QueueClosed,
}

/// Fans a change set out to every connected observer.
pub struct Broadcaster {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Broadcaster {
    /// Create a broadcaster plus the receiving end the transport drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (Self { outbound }, rx)
    }

    /// Compose and enqueue the set for every recipient. Returns how many
    /// payloads were queued; recipients with nothing to learn cost nothing.
    pub fn broadcast<'a>(
        &self,
        set: &ChangeSet,
        recipients: impl IntoIterator<Item = (u64, &'a PlayerView)>,
    ) -> Result<usize, DispatchError> {
        let mut sent = 0;
        for (client_id, view) in recipients {
            if let Some(payload) = self.send_to(set, client_id, view)? {
                debug!(
                    client = client_id,
                    observer = view.id().0,
                    channel = payload.channel,
                    bytes = payload.bytes.len(),
                    hash = format_args!("{:016x}", wire::hash_bytes_fnv1a64(&payload.bytes)),
                    "queued outbound payload"
                );
                sent += 1;
            }
        }
        Ok(sent)
    }

    /// Compose for one recipient and enqueue if anything survives.
    fn send_to(
        &self,
        set: &ChangeSet,
        client_id: u64,
        view: &PlayerView,
    ) -> Result<Option<Outbound>, DispatchError> {
        let Some(message) = set.build(view) else {
            return Ok(None);
        };
        let channel = channel_for(&message);
        let bytes = wire::serialize_message(&message)?;
        let payload = Outbound {
            client_id,
            channel,
            bytes,
        };
        self.outbound
            .send(payload.clone())
            .map_err(|_| DispatchError::QueueClosed)?;
        Ok(Some(payload))
    }
}

/// Errors ride the notification channel; everything else is ordered state.
fn channel_for(message: &Message) -> u8 {
    match message {
        Message::Error { .. } => channel_id::NOTIFY,
        _ => channel_id::UPDATES,
    }
}
