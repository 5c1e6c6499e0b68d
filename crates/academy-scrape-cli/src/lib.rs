//! Library half of the `academy-scrape` binary: config resolution, the
//! single-source commands, and terminal rendering.

pub mod commands;
pub mod config;
pub mod display;
