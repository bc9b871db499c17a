//! I/O for the partitioning engine: the remote group gateway and
//! configuration files.

pub mod config;
pub mod gateway;
