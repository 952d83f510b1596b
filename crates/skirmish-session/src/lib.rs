//! Player identities for Skirmish.
//!
//! Every request that seats a player (create a room, join a room) first
//! turns "this connection, calling itself Alice" into a process-unique
//! name. [`PlayerRegistry`] owns that mapping.
//!
//! # How it fits in the stack
//!
//! ```text
//! Controller (above)  ← asks for a name, records which room it sits in
//!     ↕
//! Identity layer (this crate)  ← connection → unique name
//!     ↕
//! Transport (below)  ← provides ConnectionId
//! ```

mod error;
mod identity;
mod registry;

pub use error::SessionError;
pub use identity::Identity;
pub use registry::PlayerRegistry;
