//! Room registry implementations.
//!
//! The domain defines the `RoomRegistry` trait; rooms and use cases depend on
//! the trait, never on this module (dependency inversion).

pub mod inmemory;

pub use inmemory::{InMemoryRoomRegistry, RegistryConfig};
