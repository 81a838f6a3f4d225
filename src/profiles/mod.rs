// src/profiles/mod.rs

pub mod models;
pub mod service;

#[cfg(test)]
mod tests;

pub use models::{NewProfile, Profile, ProfileChanges};
pub use service::ProfileService;
