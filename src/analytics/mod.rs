// src/analytics/mod.rs
pub mod exact;
