//! The NIP-01 relay endpoint.
//!
//! - `SubscriptionRegistry`: open subscriptions, read by the poller
//! - `LiveDispatcher`: fans poller notes out to every session
//! - `Session`: answers one client's messages

mod dispatcher;
mod registry;
mod session;

pub use dispatcher::{LIVE_BROADCAST_CAPACITY, LiveDispatcher};
pub use registry::{ConnectionId, SubscriptionRegistry};
pub use session::{BLOCKED_EVENT_MESSAGE, Session, handle_socket};
