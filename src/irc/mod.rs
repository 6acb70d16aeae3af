//! Chat protocol layer: line parsing, transport, rate-limited sending, and the
//! connector state machine.

pub mod connection;
pub mod manager;
pub mod parser;
pub mod queue;
pub mod transport;
