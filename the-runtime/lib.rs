//! Runtime services for calculator hosts: settings on disk, the OS clipboard
//! and environment probing.

pub mod clipboard;
pub mod config;
pub mod env;

pub use crate::{
  clipboard::SystemClipboard,
  config::FileConfig,
};
