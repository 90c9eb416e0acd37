mod listen;
mod server_sent_event;

pub use listen::listen;
pub use server_sent_event::{EventBuffer, ServerSentEvent};
