mod base;
pub mod packet;
pub mod socketio;

pub use base::{PostSource, Subscription, SNAPSHOT_BUFFER};
