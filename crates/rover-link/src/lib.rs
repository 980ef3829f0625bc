//! Transports for the command core, in both deployment shapes.
//!
//! * **Hub mode** ([`HubServer`] + [`ClientRegistry`]): the vehicle hosts a
//!   WebSocket relay; controller and viewer apps connect inbound, frames are
//!   relayed between the two roles and simultaneously fed into the command
//!   queue.
//! * **Client mode** ([`Uplink`]): the vehicle dials out to a central hub and
//!   reconnects with exponential [`Backoff`] when the link drops.
//!
//! Both shapes reduce to the same seam: every received frame is pushed into
//! the [`CommandSink`][rover_core::CommandSink] of the dispatcher queue.

pub mod registry;
pub mod server;
pub mod uplink;

pub use registry::{ClientRegistry, Role, SharedRegistry};
pub use server::HubServer;
pub use uplink::{Backoff, Uplink};
