//! Type definitions shared by the store, engines and CLI

mod engine;
pub mod key_path;
mod payload;

pub use engine::{split_engine_dir_name, EngineMount, EngineType};
pub use payload::{Payload, RawEncoding, RawEntry, RunOptions, DEFAULT_CHUNK_SIZE};
