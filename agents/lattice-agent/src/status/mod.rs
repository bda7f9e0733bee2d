//! Host status reporting

pub mod host;
pub mod report;
pub mod reporter;
