//! Infrastructure layer: registry storage, session transport and DTOs.

pub mod dto;
pub mod registry;
pub mod session;
