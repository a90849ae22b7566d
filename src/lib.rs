// src/lib.rs

pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod services;
