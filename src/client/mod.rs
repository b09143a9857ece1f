pub mod events;
pub mod session;

pub use events::{BackendInfo, EventCollector, EventHandler, SessionEvent};
pub use session::ProxySession;
