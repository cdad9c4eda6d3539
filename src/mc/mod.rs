// src/mc/mod.rs
pub mod ensemble;
