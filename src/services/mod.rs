// src/services/mod.rs

pub mod draft;
pub mod submission;
