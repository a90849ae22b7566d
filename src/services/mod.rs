// src/services/mod.rs
pub mod analysis;
pub mod narrative;
pub mod treasury;
