//! Authentication state for Coregate.
//!
//! This crate owns the single authoritative [`AuthState`](coregate_model::AuthState)
//! of the application:
//!
//! 1. **Store** ([`SessionStore`]): holds the state, notifies observers,
//!    and performs the one-time initial session lookup.
//! 2. **Bridge** ([`EventBridge`]): relays provider events into the store
//!    for as long as it is attached.
//!
//! # How it fits in the stack
//!
//! ```text
//! Guard / Flow / Facade (above)  ← read the state, observe transitions
//!     ↕
//! Session Layer (this crate)     ← owns AuthState
//!     ↕
//! Provider Layer (below)         ← initial lookup + pushed events
//! ```
//!
//! Only two things ever write the state: the initializer (once) and the
//! bridge. Everything else reads.

mod bridge;
mod config;
mod store;

pub use bridge::EventBridge;
pub use config::StoreConfig;
pub use store::{Observer, ObserverId, SessionStore};
