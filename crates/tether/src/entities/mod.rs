//! A small entity component store, used as the host object model.
//!
//! Entities are generational handles. Components live in per-type vectors, indexed by the entity
//! index, and are type-erased behind [`TypeId`](std::any::TypeId) keys. A deleted entity's
//! handle stays invalid forever, even once its slot gets reused, which is what lets the identity
//! registry detect owners that went away without unregistering.

use crate::{
    host::{Capability, ObjectHandle},
    id::InstanceId,
};
use std::{any::Any, num::NonZeroU32};

#[doc(inline)]
pub use builder::*;
mod builder;

#[doc(inline)]
pub use components::*;
mod components;

#[doc(inline)]
pub use universe::*;
mod universe;

/// An entity handle. It's very cheap to copy (2x32-bit values)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    /// The entity's index within the universe entity set.
    pub index: u32,
    /// The entity's generation number. It's unique across the entire universe.
    pub generation: NonZeroU32,
}

impl ObjectHandle for Entity {
    fn instance_id(&self) -> InstanceId {
        // Generations are never reused within a universe
        InstanceId(self.generation.get() as u64)
    }
}

/// Marker trait for components.
pub trait Component: Any + Send + Sync {}

impl<T: Component> Capability for T {}
