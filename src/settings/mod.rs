//! Configuration of an upload session: options, loading and caller callbacks

pub mod callbacks;
pub mod file_settings;
pub mod session_config;
