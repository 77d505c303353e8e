// src/models/mod.rs

pub mod attempt;
pub mod draft;
pub mod quiz;
