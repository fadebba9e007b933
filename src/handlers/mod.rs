// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod comments;
pub mod favorites;
pub mod notebooks;
pub mod notes;
pub mod profile;
pub mod questions;
pub mod simulados;
pub mod study_plan;
pub mod syllabus;
pub mod theories;
