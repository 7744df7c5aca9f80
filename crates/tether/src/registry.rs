//! The identity registry
//!
//! Maps identifiers to the object currently owning them. Identity components insert themselves
//! when they activate and remove themselves when they deactivate; everything else only reads.
//!
//! The registry is an explicitly owned value, not a global. A host keeps one per session (the
//! [`crate::scene::SceneManager`] owns one) and passes it to whoever needs to resolve.
//!
//! ## Collisions
//! Loading the same scene content twice produces two live objects with the same identifier.
//! This isn't treated as an error: the later registration wins, and lookups return that owner
//! until the registry is modified again. What happens when one of the colliding owners
//! deactivates is decided by [`UnregisterPolicy`].

use crate::{
    config::{RegistryConfig, UnregisterPolicy},
    host::{Capability, ObjectHandle, ObjectModel},
    id::Identifier,
};
use ahash::AHashMap;
use log::*;

pub struct IdentityRegistry<H: ObjectHandle> {
    entries: AHashMap<Identifier, H>,
    config: RegistryConfig,
}

impl<H: ObjectHandle> Default for IdentityRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ObjectHandle> IdentityRegistry<H> {
    /// Creates an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entries: AHashMap::default(),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Inserts or overwrites the owner of `id`.
    ///
    /// Returns the previously registered owner, if it was a different handle. Registering the
    /// same `(id, owner)` pair again is a no-op. Empty identifiers are ignored.
    pub fn register(&mut self, id: &Identifier, owner: H) -> Option<H> {
        if id.is_empty() {
            trace!("Ignoring registration of an empty identifier for {owner:?}");
            return None;
        }

        match self.entries.insert(id.clone(), owner) {
            Some(previous) if previous != owner => {
                warn!("Identifier `{id}` is now owned by {owner:?}, replacing {previous:?}");
                Some(previous)
            }
            Some(_) => None,
            None => {
                trace!("Registered `{id}` -> {owner:?}");
                None
            }
        }
    }

    /// Removes the entry for `id`, whoever owns it. Unknown identifiers are ignored.
    pub fn unregister(&mut self, id: &Identifier) -> Option<H> {
        let removed = self.entries.remove(id);
        if let Some(owner) = removed {
            trace!("Unregistered `{id}` (was {owner:?})");
        }
        removed
    }

    /// Removal on behalf of a deactivating `owner`, following the configured
    /// [`UnregisterPolicy`]. Returns whether an entry was removed.
    pub fn unregister_owned(&mut self, id: &Identifier, owner: H) -> bool {
        match self.entries.get(id) {
            None => false,
            Some(&current) if current == owner => self.unregister(id).is_some(),
            Some(&current) => match self.config.unregister_policy {
                UnregisterPolicy::OwnerChecked => {
                    debug!(
                        "Keeping `{id}` registered to {current:?}, {owner:?} is no longer its owner"
                    );
                    false
                }
                UnregisterPolicy::Unconditional => {
                    debug!("Removing `{id}` registered to {current:?} on behalf of {owner:?}");
                    self.unregister(id).is_some()
                }
            },
        }
    }

    /// Returns the registered owner of `id`, without checking whether it's still alive.
    pub fn owner_of(&self, id: &Identifier) -> Option<H> {
        self.entries.get(id).copied()
    }

    /// Returns the live owner of `id`.
    ///
    /// Entries pointing at objects that died without deactivating (abrupt teardown) are treated
    /// as absent.
    pub fn resolve<M>(&self, id: &Identifier, model: &M) -> Option<H>
    where
        M: ObjectModel<Handle = H>,
    {
        if id.is_empty() {
            return None;
        }

        self.entries
            .get(id)
            .copied()
            .filter(|&owner| model.is_live(owner))
    }

    /// Resolves `id` and views its owner as capability `C`.
    pub fn resolve_as<'m, C, M>(&self, id: &Identifier, model: &'m M) -> Option<&'m C>
    where
        C: Capability,
        M: ObjectModel<Handle = H>,
    {
        let owner = self.resolve(id, model)?;
        model.capability::<C>(owner)
    }

    /// Drops every entry whose owner is no longer live, returning how many were removed.
    pub fn purge_stale<M>(&mut self, model: &M) -> usize
    where
        M: ObjectModel<Handle = H>,
    {
        let before = self.entries.len();
        self.entries.retain(|_, owner| model.is_live(*owner));

        let purged = before - self.entries.len();
        if purged != 0 {
            debug!("Purged {purged} stale identity registry entries");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, H)> {
        self.entries.iter().map(|(id, &owner)| (id, owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Component, Entity, Name, Universe};

    struct Door;
    impl Component for Door {}

    fn setup() -> (Universe, IdentityRegistry<Entity>) {
        (Universe::new(), IdentityRegistry::new())
    }

    #[test]
    fn resolve_round_trip() {
        let (mut universe, mut registry) = setup();
        let id = Identifier::from("abc-1");
        let door = universe.create_entity();

        assert_eq!(registry.resolve(&id, &universe), None);

        registry.register(&id, door);
        assert_eq!(registry.resolve(&id, &universe), Some(door));

        registry.unregister(&id);
        assert_eq!(registry.resolve(&id, &universe), None);

        // Removing twice is fine
        assert_eq!(registry.unregister(&id), None);
    }

    #[test]
    fn empty_identifier_never_resolves() {
        let (mut universe, mut registry) = setup();
        let entity = universe.create_entity();

        assert_eq!(registry.register(&Identifier::empty(), entity), None);
        assert!(registry.is_empty());
        assert_eq!(registry.resolve(&Identifier::empty(), &universe), None);
    }

    #[test]
    fn stale_owner_resolves_to_none() {
        let (mut universe, mut registry) = setup();
        let id = Identifier::from("abc-1");
        let door = universe.create_entity();
        registry.register(&id, door);

        // Deleted without unregistering
        universe.delete_entity(door);
        assert_eq!(registry.owner_of(&id), Some(door));
        assert_eq!(registry.resolve(&id, &universe), None);

        // A recycled slot must not resurrect the entry
        let recycled = universe.create_entity();
        assert_eq!(recycled.index, door.index);
        assert_eq!(registry.resolve(&id, &universe), None);

        assert_eq!(registry.purge_stale(&universe), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn registration_is_idempotent() {
        let (mut universe, mut registry) = setup();
        let id = Identifier::from("abc-1");
        let door = universe.create_entity();

        assert_eq!(registry.register(&id, door), None);
        let once: Vec<_> = registry.iter().map(|(id, owner)| (id.clone(), owner)).collect();

        assert_eq!(registry.register(&id, door), None);
        let twice: Vec<_> = registry.iter().map(|(id, owner)| (id.clone(), owner)).collect();

        assert_eq!(once, twice);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn resolve_as_checks_capability() {
        let (mut universe, mut registry) = setup();
        let id = Identifier::from("abc-1");
        let door = universe.create_entity();
        universe.set_component(door, Door);
        registry.register(&id, door);

        assert!(registry.resolve_as::<Door, _>(&id, &universe).is_some());
        assert!(registry.resolve_as::<Name, _>(&id, &universe).is_none());
    }

    #[test]
    fn collision_resolves_to_last_registered() {
        let (mut universe, mut registry) = setup();
        let id = Identifier::from("abc-1");
        let first = universe.create_entity();
        let second = universe.create_entity();

        registry.register(&id, first);
        assert_eq!(registry.register(&id, second), Some(first));

        for _ in 0..3 {
            assert_eq!(registry.resolve(&id, &universe), Some(second));
        }
    }

    #[test]
    fn owner_checked_unregister_keeps_colliding_owner() {
        let (mut universe, mut registry) = setup();
        let id = Identifier::from("abc-1");
        let first = universe.create_entity();
        let second = universe.create_entity();

        registry.register(&id, first);
        registry.register(&id, second);

        // The overwritten owner leaves, the current one stays resolvable
        assert!(!registry.unregister_owned(&id, first));
        assert_eq!(registry.resolve(&id, &universe), Some(second));

        // The current owner leaves
        assert!(registry.unregister_owned(&id, second));
        assert_eq!(registry.resolve(&id, &universe), None);
    }

    #[test]
    fn unconditional_unregister_removes_colliding_owner() {
        let mut universe = Universe::new();
        let mut registry = IdentityRegistry::with_config(RegistryConfig {
            unregister_policy: UnregisterPolicy::Unconditional,
        });
        let id = Identifier::from("abc-1");
        let first = universe.create_entity();
        let second = universe.create_entity();

        registry.register(&id, first);
        registry.register(&id, second);

        assert!(registry.unregister_owned(&id, first));
        assert_eq!(registry.resolve(&id, &universe), None);

        // Nothing left to remove
        assert!(!registry.unregister_owned(&id, second));
    }
}
