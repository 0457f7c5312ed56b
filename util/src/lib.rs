//! Pieces shared between the zwlink crates and binary.

pub mod build;
mod macros;
