//! Command layer: message events, subscriber actions, the command table, and
//! dispatch.

pub mod action;
pub mod commands;
pub mod event;
pub mod handler;
