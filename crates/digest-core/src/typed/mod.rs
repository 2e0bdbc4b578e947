//! Typed - 型付き Job API
//!
//! Job names are bound to payload types at compile time, so a handler can only
//! be registered for the payload it understands.

pub mod handler;
pub mod registry;
pub mod task;

pub use self::handler::{DynHandler, Handler, TypedHandler};
pub use self::registry::{RegistryError, TypedRegistry};
pub use self::task::{RunPayload, SendDigest, Task};
