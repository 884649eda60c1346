//! Persistence Module
//!
//! Text model format: codec, load/save and load configuration.

mod codec;
mod config;
mod progress;
mod text;

pub use codec::{format_entry, parse_line, write_entry};
pub use config::{DimensionPolicy, LoadConfig};
pub use progress::Progress;
pub use text::{count_lines, load, load_with, save, LoadReport};
