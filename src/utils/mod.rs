// src/utils/mod.rs

pub mod client_ip;
pub mod jwt;
