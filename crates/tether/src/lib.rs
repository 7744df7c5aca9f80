//! # Tether
//! Persistent object identity for scene graphs.
//!
//! An [`IdentityComponent`] gives an object a stable [`Identifier`] that survives reloads,
//! renames and moves. A [`CrossSceneRef`] stores a copy of such an identifier and resolves it
//! back to the live object through the [`IdentityRegistry`], even when the object lives in
//! another scene, or in a scene that isn't loaded yet.
//!
//! The core ([`id`], [`registry`], [`component`], [`reference`]) only talks to the host engine
//! through the traits in [`host`]. The [`entities`] and [`scene`] modules provide one such host,
//! and [`authoring`] implements the editor-side operations on top of it.

pub mod authoring;
pub mod component;
pub mod config;
pub mod entities;
pub mod host;
pub mod id;
pub mod reference;
pub mod registry;
pub mod scene;

pub use component::{Assignment, AuthoringContext, IdentityComponent};
pub use config::{RegistryConfig, TetherConfig, UnregisterPolicy};
pub use host::{Capability, ObjectHandle, ObjectModel};
pub use id::{Identifier, InstanceId};
pub use reference::{CrossSceneRef, TargetInfo};
pub use registry::IdentityRegistry;
pub use scene::{SceneDescription, SceneError, SceneId, SceneManager};
