//! Session Management Module
//!
//! Maps opaque session tokens to accounts. The token is all the client holds;
//! identity and role live server-side behind a [`gatehouse_core::SessionStore`].

pub mod manager;
pub mod storage;
pub mod types;

pub use manager::SessionManager;
pub use storage::MemorySessionStore;
pub use types::*;
