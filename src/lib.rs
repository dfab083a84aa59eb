// Library surface for the binary, headless integration tests and reuse.
pub mod app_dirs;
pub mod config;
pub mod history;
pub mod key_stats;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod text_generator;
