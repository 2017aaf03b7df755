//! Command-line front end for the shop testing library.

pub mod args;
mod commands;
pub mod entry;
pub mod events;
mod productinfo;
