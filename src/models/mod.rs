// src/models/mod.rs

pub mod calendar;
pub mod comment;
pub mod favorite;
pub mod filters;
pub mod note;
pub mod notebook;
pub mod question;
pub mod simulado;
pub mod syllabus;
pub mod theory;
pub mod user;
