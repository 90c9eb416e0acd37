use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

pub const EVENT_STREAM: &str = "event-stream";
pub const DISPLAY_CHANGES: &str = "display-changes";
pub const DEVICE_COMMANDS: &str = "device-commands";
pub const GATEWAY_COMMANDS: &str = "gateway-commands";

/// In-process broadcast channel with an explicit subscriber list.
///
/// Every live subscriber receives every published message, in publish order. Publishing never
/// blocks, subscribers that went away are pruned on the next publish.
#[derive(Debug)]
pub struct Bus<T> {
    name: &'static str,
    subscribers: Mutex<Vec<UnboundedSender<T>>>,
}

impl<T> Bus<T>
where
    T: Clone + Debug,
{
    pub fn new(name: &'static str) -> Self {
        Bus {
            name,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn subscribe(&self) -> UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Returns the number of subscribers the message was handed to.
    pub fn publish(&self, message: T) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|subscriber| subscriber.send(message.clone()).is_ok());

        trace!(channel = self.name, subscribers = subscribers.len(), "📣 Published {:?}", message);
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().iter().filter(|subscriber| !subscriber.is_closed()).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UnboundedSender<T>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
