pub mod listener;
pub mod record;

pub use listener::{Listener, UdpListener};
pub use record::{DecodeError, RawRecord};
