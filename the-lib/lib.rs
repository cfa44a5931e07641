use smartstring::{LazyCompact, SmartString};

pub mod clipboard;
pub mod document;
pub mod selection;
pub mod transaction;

pub type Tendril = SmartString<LazyCompact>;
