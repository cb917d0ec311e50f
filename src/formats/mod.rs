//! On-disk formats of containers.

pub mod lines;
