// src/lib.rs

//! quakemap: live earthquake and tsunami map client library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod services;
pub mod utils;
