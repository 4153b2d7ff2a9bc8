pub mod channel;
pub mod monitor;
pub mod session;

pub use channel::{ChannelError, ChannelUpdate, ProgressChannel, ProgressTransport, WsTransport};
pub use monitor::{GenerationMonitor, MonitorUpdate};
pub use session::{GenerationPhase, GenerationSession, LogEntry};
