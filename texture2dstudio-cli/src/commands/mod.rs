//! CLI subcommands.

pub mod common;
pub mod compress;
pub mod decompress;
pub mod inspect;
