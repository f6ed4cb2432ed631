//! Gatehouse Core - shared data structures and trait definitions
//!
//! Everything the authentication layer and its front-ends agree on lives here:
//! the user model, the storage contracts, errors, configuration and logging.

pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
