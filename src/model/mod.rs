//! This module provides common objects used throughout the entire application

pub mod error;
pub mod file_descriptor;
pub mod file_queue;
pub mod progress_event;
pub mod run_state;
pub mod upload_response;
