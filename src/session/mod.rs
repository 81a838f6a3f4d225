// src/session/mod.rs
//! # Session Module
//!
//! Owns the "who is logged in and what is their profile" view for the whole
//! application. One task per manager serializes everything that can change
//! that view: initialization, provider-pushed auth events, the periodic
//! token-refresh check and explicit operations. Views hold a cloneable
//! [`SessionHandle`] instead of reading ambient global state.

pub mod callback;
pub mod manager;
pub mod models;


pub use callback::{handle_auth_callback, CallbackConfig, CallbackOutcome};
pub use manager::{SessionHandle, SessionManager};
pub use models::SessionState;
