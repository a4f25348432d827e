// src/models/mod.rs
pub mod credential;
pub mod did;
pub mod presentation;
pub mod proof;
pub mod report;
