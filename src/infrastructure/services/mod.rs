//! Infrastructure services

mod responder_service;

pub use responder_service::ResponderService;
