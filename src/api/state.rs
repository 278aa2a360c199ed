//! Router state for the two servers

use std::sync::Arc;

use crate::infrastructure::relay::RelayService;
use crate::infrastructure::services::ResponderService;

#[derive(Debug, Clone)]
pub struct ResponderState {
    pub responder: Arc<ResponderService>,
}

impl ResponderState {
    pub fn new(responder: Arc<ResponderService>) -> Self {
        Self { responder }
    }
}

#[derive(Debug, Clone)]
pub struct ForwarderState {
    pub relay: Arc<RelayService>,
}

impl ForwarderState {
    pub fn new(relay: Arc<RelayService>) -> Self {
        Self { relay }
    }
}
