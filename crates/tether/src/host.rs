//! The narrow interface Tether needs from the host object model.
//!
//! The registry never owns objects. It stores handles, and asks the host whether a handle still
//! points at a live object and whether that object exposes a given capability. The crate ships
//! one implementation of [`ObjectModel`] in [`crate::entities`], but any engine can provide its
//! own.

use crate::id::InstanceId;
use std::{any::Any, fmt::Debug, hash::Hash};

/// A cheap, copyable handle to a host object.
pub trait ObjectHandle: Copy + Eq + Hash + Debug + 'static {
    /// Returns the per-process instance id of the object this handle points at.
    fn instance_id(&self) -> InstanceId;
}

/// Marker trait for typed views an object may expose.
pub trait Capability: Any {}

/// The host's object model, as seen by the registry.
pub trait ObjectModel {
    type Handle: ObjectHandle;

    /// Checks whether `handle` still refers to a live object.
    fn is_live(&self, handle: Self::Handle) -> bool;

    /// Views the object as capability `C`, if it's live and supports it.
    fn capability<C: Capability>(&self, handle: Self::Handle) -> Option<&C>;
}
