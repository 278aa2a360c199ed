//! HTTP surfaces of the responder and the forwarder

pub mod forwarder;
pub mod health;
pub mod middleware;
pub mod responder;
pub mod router;
pub mod state;
pub mod types;

pub use router::{create_forwarder_router, create_responder_router};
pub use state::{ForwarderState, ResponderState};
