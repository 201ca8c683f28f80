//! Core library for the retail-intake command line application.
//!
//! The library exposes the data-shaping helpers behind order intake and
//! reference-data administration. Readers and writers live under
//! [`retail::intake::io`], typed records inside [`retail::intake::model`],
//! category and store-list normalization in [`retail::intake::grouping`], the
//! master code directory and duplicate report under [`retail::intake::codes`],
//! and the memoized loaders in [`retail::intake::cache`] and
//! [`retail::intake::catalog`].

pub mod retail;

pub use retail::intake::{
    IntakeError, Result, admin, cache, catalog, codes, collate, config, error, grouping, io, model,
    order, seed, tasks,
};
