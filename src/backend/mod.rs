// src/backend/mod.rs
//! # Backend Module
//!
//! Client for the hosted Backend-as-a-Service. Three surfaces, matching what
//! the service exposes:
//! - auth provider (password/OAuth sign-in, sign-up, session refresh)
//! - row-level table API (equality filters, at-most-one reads, upserts)
//! - file storage (avatar uploads, public URLs)
//!
//! Each surface is a trait so the session manager and data services can be
//! driven by in-memory fakes in tests; [`HostedBackend`] is the one HTTP
//! implementation.

pub mod api;
pub mod hosted;
pub mod models;

pub use api::{AuthApi, GalleryApi, ProfileApi, StorageApi};
pub use hosted::HostedBackend;
pub use models::{AuthSession, AuthUser, SignUpOutcome, UserMetadata};
