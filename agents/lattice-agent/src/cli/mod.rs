//! CLI support modules

pub mod config;
