mod channel;
mod envelope;
mod error;
mod host;
mod link;
mod router;

pub use channel::{Port, channel_pair};
pub use envelope::{Envelope, ToolDescriptor, ToolOutcome};
pub use error::LinkError;
pub use host::RecordHost;
pub use link::{LinkEvent, RecordLink};
pub use router::ToolRouter;
