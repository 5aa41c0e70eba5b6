//! # Upload Queue Library
//!
//! This library provides a sequential file uploader: a queue of selected
//! files is posted one at a time to an HTTP endpoint, with progress reporting,
//! per-file outcome classification and cancellation of the current file.
//!
//! The library is primarily used by the upload-queue binary, but the
//! [`services::uploader::initialize`] entry point can be embedded in any
//! tokio application that provides its own [`services::page::Page`].

#![forbid(unsafe_code)]

pub mod model;
pub mod services;
pub mod settings;
pub mod utils;
