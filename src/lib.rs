//! Downloads one volume window of a manga from the content api and packs
//! its pages into a single cbz/cbr/zip archive.

pub mod archive;
pub mod client;
pub mod config;
pub mod limiter;
pub mod loader;
pub mod pool;
pub mod requests;

pub use requests::{Error, Result};
