//! The identity component
//!
//! Attached to an object, it owns that object's persistent [`Identifier`] and keeps the
//! [`IdentityRegistry`] up to date as the object activates and deactivates.
//!
//! Most of the logic here runs at authoring time. Whenever the host revalidates the authored
//! representation of an object (creation, duplication, revert, explicit reset) it calls
//! [`IdentityComponent::validate`], which decides whether to keep the current identifier, mint
//! a new one or restore the previously authored one.

use crate::{
    host::ObjectHandle,
    id::{Identifier, InstanceId},
    registry::IdentityRegistry,
};
use log::*;
use serde::{Deserialize, Serialize};

/// Execution order of the identity component's activation hook. It runs before every other
/// hook on the same object, so anything activating later can already resolve it.
pub const IDENTITY_EXECUTION_ORDER: i32 = i32::MIN;

/// Inspector message shown instead of the identifier on templates.
pub const TEMPLATE_HELP: &str = "All instances of this template will have a persistent identifier";

/// The context an authored object is validated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthoringContext {
    /// Whether the object is placed in a scene (as opposed to a template that only gets
    /// instantiated later).
    pub is_instance: bool,
    /// Whether the object's scene finished loading. While a scene is still being deserialized,
    /// an unfamiliar instance id means "loaded again", not "duplicated".
    pub scene_loaded: bool,
}

/// What [`IdentityComponent::validate`] did to the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The object is a template, so the identifier was cleared.
    Cleared,
    /// The existing identifier was kept.
    Kept,
    /// The identifier was empty and a fresh one was minted.
    Minted,
    /// The object turned out to be a duplicate and got a fresh identifier.
    Reminted,
    /// The identifier was emptied by a revert and the authored value was put back.
    Restored,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityComponent {
    value: Identifier,

    #[serde(skip)]
    authored_value: Identifier,
    #[serde(skip)]
    last_instance: Option<InstanceId>,
}

impl IdentityComponent {
    /// Creates a component holding `value`, as if deserialized from authored data.
    pub fn new(value: impl Into<Identifier>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    /// The currently owned identifier.
    #[inline]
    pub fn value(&self) -> &Identifier {
        &self.value
    }

    /// Overwrites the persisted field in place, the way the host does when deserializing or
    /// reverting. Authoring caches are left untouched.
    pub fn apply_serialized(&mut self, value: impl Into<Identifier>) {
        self.value = value.into();
    }

    /// Takes the current value as authored for `owner`, without validating it. Hosts that load
    /// objects without running validation call this, so that later resets and reverts have
    /// something to go back to.
    pub fn adopt<H: ObjectHandle>(&mut self, owner: H) {
        self.authored_value = self.value.clone();
        self.last_instance = Some(owner.instance_id());
    }

    /// Activation hook. Calling it repeatedly for the same owner is harmless.
    pub fn activate<H: ObjectHandle>(&self, owner: H, registry: &mut IdentityRegistry<H>) {
        registry.register(&self.value, owner);
    }

    /// Deactivation hook. Whether an entry overwritten by a colliding owner gets removed is
    /// decided by the registry's [`UnregisterPolicy`](crate::config::UnregisterPolicy).
    pub fn deactivate<H: ObjectHandle>(&self, owner: H, registry: &mut IdentityRegistry<H>) {
        if !self.value.is_empty() {
            registry.unregister_owned(&self.value, owner);
        }
    }

    /// Revalidates the authored identifier.
    ///
    ///  1. Templates never carry an identifier.
    ///  2. An instance id different from the last one seen, on an already loaded scene, means
    ///     the object was duplicated and the copied identifier has to go. A component that was
    ///     never seen before is not a duplicate.
    ///  3. An identifier emptied by a revert is restored from the last authored value.
    ///  4. An empty identifier gets a freshly minted one.
    ///
    /// The result is cached for the next validation and written into the registry. A replaced
    /// identifier is unregistered if `owner` was the one holding it.
    pub fn validate<H: ObjectHandle>(
        &mut self,
        context: &AuthoringContext,
        owner: H,
        registry: &mut IdentityRegistry<H>,
    ) -> Assignment {
        let instance = owner.instance_id();
        let previous = self.value.clone();

        let assignment = if context.is_instance {
            let assignment = if self.is_duplicate(context, instance) {
                debug!("{owner:?} is a duplicate of `{}`", self.value);
                self.value = Identifier::generate();
                Assignment::Reminted
            } else if self.is_reverted() {
                self.value = self.authored_value.clone();
                Assignment::Restored
            } else if self.value.is_empty() {
                self.value = Identifier::generate();
                Assignment::Minted
            } else {
                Assignment::Kept
            };

            // Editor-time only, duplicates are fine here
            registry.register(&self.value, owner);
            assignment
        } else {
            self.value.clear();
            Assignment::Cleared
        };

        if previous != self.value && registry.owner_of(&previous) == Some(owner) {
            registry.unregister(&previous);
        }

        trace!("Validated {owner:?}: {assignment:?} `{}`", self.value);

        self.authored_value = self.value.clone();
        self.last_instance = Some(instance);
        assignment
    }

    /// Explicit reset, the same as a fresh validation.
    pub fn reset<H: ObjectHandle>(
        &mut self,
        context: &AuthoringContext,
        owner: H,
        registry: &mut IdentityRegistry<H>,
    ) -> Assignment {
        self.validate(context, owner, registry)
    }

    /// Text shown by the component's inspector.
    pub fn inspector_text(&self, is_instance: bool) -> String {
        if is_instance {
            self.value.to_string()
        } else {
            TEMPLATE_HELP.to_owned()
        }
    }

    fn is_duplicate(&self, context: &AuthoringContext, instance: InstanceId) -> bool {
        context.scene_loaded
            && !self.value.is_empty()
            && self.last_instance.is_some_and(|last| last != instance)
    }

    fn is_reverted(&self) -> bool {
        self.value.is_empty() && !self.authored_value.is_empty()
    }
}
