//! Library components of the registry dataset CLI.

pub mod extract;
pub mod logging;
