//! Agent coordination components

pub mod intake;
pub mod queue;
pub mod registration;
