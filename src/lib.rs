// src/lib.rs
//! # gallery-client
//!
//! Async client for the video gallery service. The hosted backend (auth
//! provider, row-level table API, file storage) is an external system reached
//! over HTTP; this crate owns everything stateful on the client side:
//!
//! - the session lifecycle (sign-in/sign-up/sign-out, pushed auth events,
//!   periodic token refresh) run on a single owned task
//! - profile fetch-or-create with its rate-limit window
//! - the OAuth callback return leg
//! - gallery/video data access, validation and in-memory browsing
//! - an in-process event bus replacing page-level DOM events

pub mod backend;
pub mod common;
pub mod events;
pub mod profiles;
pub mod session;
pub mod videos;

pub use backend::HostedBackend;
pub use common::{BackendConfig, Error};
pub use events::{AppEvent, EventBus};
pub use session::{SessionHandle, SessionManager, SessionState};
