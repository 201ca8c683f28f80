pub mod admin;
pub mod cache;
pub mod catalog;
pub mod codes;
pub mod collate;
pub mod config;
pub mod error;
pub mod grouping;
pub mod io;
pub mod model;
pub mod order;
pub mod seed;
pub mod tasks;

pub use error::{IntakeError, Result};
