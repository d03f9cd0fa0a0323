// src/cli/handlers/mod.rs

// One module per command.

pub mod announce;
pub mod check;
pub mod column;
pub mod commons;
pub mod env;
pub mod export;
pub mod group;
pub mod import;
pub mod link;
pub mod matrix;
pub mod open;
pub mod service;
pub mod status;
pub mod title;
pub mod visibility;
