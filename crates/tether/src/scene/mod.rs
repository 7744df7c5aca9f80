//! # Scenes
//! The scene manager plays the part of the host engine: it loads scene descriptions into a
//! [`Universe`], drives the activation lifecycle of their objects and owns the session's
//! [`IdentityRegistry`].
//!
//! Activation runs in passes. Every registered [`Behaviour`] type gets one pass over all objects
//! of the scene, in [`Behaviour::EXECUTION_ORDER`]. The identity component goes first, so by the
//! time any other behaviour activates, every object of the scene is already resolvable.
//! Deactivation runs the same passes backwards.
//!
//! With authoring enabled, objects are also validated the way an editor would: loading mints
//! identifiers for objects that lack one and strips them from templates, and the editing
//! operations ([`SceneManager::spawn`], [`SceneManager::duplicate`], [`SceneManager::revert`],
//! [`SceneManager::reset`]) are meant to be used.

use crate::{
    component::{Assignment, AuthoringContext, IdentityComponent},
    config::RegistryConfig,
    entities::{Component, Entity, Name, Universe},
    host::Capability,
    id::Identifier,
    reference::{CrossSceneRef, TargetInfo},
    registry::IdentityRegistry,
};
use log::*;
use smallvec::SmallVec;
use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};
use tether_utils::{Pool, PoolHandle};
use thiserror::Error;

#[doc(inline)]
pub use behaviour::{Behaviour, LifecycleContext, Links};
mod behaviour;
use behaviour::Hook;

#[doc(inline)]
pub use description::*;
mod description;

/// Handle to a loaded scene. Stays invalid once the scene is unloaded.
pub type SceneId = PoolHandle;

/// Marks the scene an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneMember(pub SceneId);

impl Component for SceneMember {}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("the scene is not loaded")]
    NotLoaded,
    #[error("scene `{}` is already loaded", path.display())]
    AlreadyLoaded { path: PathBuf },
    #[error("the reference doesn't know which scene its target lives in")]
    UnknownScene,
    #[error("the entity doesn't exist or has no identity component")]
    InvalidEntity,
    #[error("couldn't parse the scene description: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("couldn't write the scene description: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("couldn't access the scene file")]
    Io(#[from] io::Error),
}

struct SceneRecord {
    name: String,
    path: Option<PathBuf>,
    is_instance: bool,
    entities: Vec<Entity>,
    loaded: bool,
    dirty: bool,
}

pub struct SceneManager {
    universe: Universe,
    registry: IdentityRegistry<Entity>,
    scenes: Pool<SceneRecord>,
    hooks: SmallVec<[Hook; 4]>,
    authoring: bool,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl SceneManager {
    /// Creates a runtime scene manager. Objects are loaded exactly as authored.
    pub fn new(config: RegistryConfig) -> Self {
        let mut manager = Self {
            universe: Universe::new(),
            registry: IdentityRegistry::with_config(config),
            scenes: Pool::new(),
            hooks: SmallVec::new(),
            authoring: false,
        };

        manager.register_behaviour::<IdentityComponent>();
        manager.register_behaviour::<Links>();
        manager
    }

    /// Creates a scene manager that validates identities like an editor does.
    pub fn authoring(config: RegistryConfig) -> Self {
        Self {
            authoring: true,
            ..Self::new(config)
        }
    }

    /// Installs the lifecycle hooks of `T`. Registering the same type twice does nothing.
    pub fn register_behaviour<T: Behaviour>(&mut self) {
        let hook = Hook::of::<T>();
        if self.hooks.iter().any(|h| h.type_id == hook.type_id) {
            return;
        }

        trace!("Registering behaviour {} (order {})", hook.label, hook.order);

        // Stable with respect to registration order for equal priorities
        let position = self.hooks.partition_point(|h| h.order <= hook.order);
        self.hooks.insert(position, hook);
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn universe_mut(&mut self) -> &mut Universe {
        &mut self.universe
    }

    pub fn registry(&self) -> &IdentityRegistry<Entity> {
        &self.registry
    }

    pub fn is_authoring(&self) -> bool {
        self.authoring
    }

    /// Loads a scene and activates all of its objects.
    ///
    /// The same content may be loaded more than once; the copies then share identifiers, and the
    /// one loaded last is what references resolve to.
    pub fn load(&mut self, description: SceneDescription) -> SceneId {
        let is_instance = description.is_instance();
        let SceneDescription {
            name, path, objects, ..
        } = description;

        info!("Loading scene `{name}` ({} objects)", objects.len());

        let scene = self.scenes.allocate(SceneRecord {
            name,
            path,
            is_instance,
            entities: Vec::with_capacity(objects.len()),
            loaded: false,
            dirty: false,
        });

        let mut entities = Vec::with_capacity(objects.len());
        for object in objects {
            let mut builder = self
                .universe
                .build_entity()
                .with_name(object.name)
                .with_component(SceneMember(scene))
                .with_component(IdentityComponent::new(object.id));

            if !object.links.is_empty() {
                builder = builder.with_component(Links::new(object.links));
            }

            entities.push(builder.finish());
        }

        if self.authoring {
            // Still deserializing, so nothing here can be a duplicate
            let context = AuthoringContext {
                is_instance,
                scene_loaded: false,
            };
            for &entity in &entities {
                self.validate(entity, &context);
            }
        } else {
            for &entity in &entities {
                if let Some(identity) = self.universe.get_component_mut::<IdentityComponent>(entity)
                {
                    identity.adopt(entity);
                }
            }
        }

        let record = self.scenes.get_mut(scene);
        record.entities = entities.clone();
        record.loaded = true;

        self.activate(&entities);
        scene
    }

    /// Deactivates and deletes every object of the scene.
    pub fn unload(&mut self, scene: SceneId) -> Result<(), SceneError> {
        let entities = self.scene_record(scene)?.entities.clone();
        self.deactivate(&entities);
        self.drop_scene(scene, &entities);
        Ok(())
    }

    /// Deletes every object of the scene without running any deactivation hooks, like an abrupt
    /// shutdown would. Registry entries of its objects are left behind as stale.
    pub fn teardown(&mut self, scene: SceneId) -> Result<(), SceneError> {
        let entities = self.scene_record(scene)?.entities.clone();
        warn!("Tearing down {scene:?} without deactivating its objects");
        self.drop_scene(scene, &entities);
        Ok(())
    }

    fn drop_scene(&mut self, scene: SceneId, entities: &[Entity]) {
        for &entity in entities {
            if self.universe.validate_entity(entity) {
                self.universe.delete_entity(entity);
            }
        }

        if let Some(record) = self.scenes.deallocate(scene) {
            info!("Unloaded scene `{}`", record.name);
        }
    }

    fn activate(&mut self, entities: &[Entity]) {
        for hook in &self.hooks {
            for &entity in entities {
                (hook.activate)(&mut self.universe, &mut self.registry, entity);
            }
        }
    }

    fn deactivate(&mut self, entities: &[Entity]) {
        for hook in self.hooks.iter().rev() {
            for &entity in entities.iter().rev() {
                (hook.deactivate)(&mut self.universe, &mut self.registry, entity);
            }
        }
    }

    fn scene_record(&self, scene: SceneId) -> Result<&SceneRecord, SceneError> {
        self.scenes.try_get(scene).ok_or(SceneError::NotLoaded)
    }

    fn validate(&mut self, entity: Entity, context: &AuthoringContext) -> Option<Assignment> {
        let identity = self
            .universe
            .get_component_mut::<IdentityComponent>(entity)?;
        Some(identity.validate(context, entity, &mut self.registry))
    }

    /// The authoring context of an entity, derived from its scene.
    pub fn authoring_context(&self, entity: Entity) -> Option<AuthoringContext> {
        let record = self.scenes.try_get(self.scene_of(entity)?)?;
        Some(AuthoringContext {
            is_instance: record.is_instance,
            scene_loaded: record.loaded,
        })
    }

    /// Creates a new object with an identity component in a loaded scene, and activates it. The
    /// identifier is only minted with authoring enabled.
    pub fn spawn(&mut self, scene: SceneId, name: &str) -> Result<Entity, SceneError> {
        self.scene_record(scene)?;

        let entity = self
            .universe
            .build_entity()
            .with_name(name)
            .with_component(SceneMember(scene))
            .with_component(IdentityComponent::default())
            .finish();

        self.attach(scene, entity);
        Ok(entity)
    }

    /// Copies an object with everything it carries. With authoring enabled the copy gets a fresh
    /// identifier; otherwise it collides with the original, like a runtime instantiation would.
    pub fn duplicate(&mut self, entity: Entity) -> Result<Entity, SceneError> {
        let scene = self.scene_of(entity).ok_or(SceneError::InvalidEntity)?;
        let identity = self
            .universe
            .get_component::<IdentityComponent>(entity)
            .cloned()
            .ok_or(SceneError::InvalidEntity)?;
        let name = self
            .universe
            .get_component::<Name>(entity)
            .cloned()
            .unwrap_or_default();
        let links = self.universe.get_component::<Links>(entity).cloned();

        let mut builder = self
            .universe
            .build_entity()
            .with_component(name)
            .with_component(SceneMember(scene))
            .with_component(identity);
        if let Some(links) = links {
            builder = builder.with_component(links);
        }
        let copy = builder.finish();

        self.attach(scene, copy);
        Ok(copy)
    }

    fn attach(&mut self, scene: SceneId, entity: Entity) {
        if self.authoring {
            if let Some(context) = self.authoring_context(entity) {
                self.validate(entity, &context);
            }
        }

        let record = self.scenes.get_mut(scene);
        record.entities.push(entity);
        record.dirty = true;

        self.activate(&[entity]);
    }

    /// Deactivates and deletes a single object.
    pub fn destroy(&mut self, entity: Entity) -> Result<(), SceneError> {
        let scene = self.scene_of(entity).ok_or(SceneError::InvalidEntity)?;
        self.deactivate(&[entity]);
        self.universe.delete_entity(entity);

        let record = self.scenes.get_mut(scene);
        record.entities.retain(|&e| e != entity);
        record.dirty = true;
        Ok(())
    }

    /// Discards live edits of the object's identity, going back to the authored template. Since
    /// templates hold no identifier, this restores the last authored one.
    pub fn revert(&mut self, entity: Entity) -> Result<Assignment, SceneError> {
        self.revalidate(entity, |identity| {
            identity.apply_serialized(Identifier::empty())
        })
    }

    /// Explicit reset of the object's identity component.
    pub fn reset(&mut self, entity: Entity) -> Result<Assignment, SceneError> {
        self.revalidate(entity, |_| {})
    }

    fn revalidate(
        &mut self,
        entity: Entity,
        edit: impl FnOnce(&mut IdentityComponent),
    ) -> Result<Assignment, SceneError> {
        let context = self
            .authoring_context(entity)
            .ok_or(SceneError::InvalidEntity)?;
        let identity = self
            .universe
            .get_component_mut::<IdentityComponent>(entity)
            .ok_or(SceneError::InvalidEntity)?;

        edit(&mut *identity);
        Ok(identity.validate(&context, entity, &mut self.registry))
    }

    /// Resolves a reference and views the target as capability `C`.
    pub fn resolve<C: Capability>(&self, reference: &CrossSceneRef) -> Option<&C> {
        reference.get(&self.registry, &self.universe)
    }

    /// Resolves a reference to the target entity.
    pub fn resolve_entity(&self, reference: &CrossSceneRef) -> Option<Entity> {
        reference.resolve(&self.registry, &self.universe)
    }

    /// Collects what a reference needs to know to point at `entity`. Objects without a usable
    /// identifier can't be targeted.
    pub fn target_info(&self, entity: Entity) -> Option<TargetInfo> {
        let identity = self.universe.get_component::<IdentityComponent>(entity)?;
        if identity.value().is_empty() {
            return None;
        }

        let record = self.scenes.try_get(self.scene_of(entity)?)?;
        Some(TargetInfo {
            guid: identity.value().clone(),
            display_name: self
                .universe
                .get_component::<Name>(entity)
                .map(|name| name.0.clone())
                .unwrap_or_default(),
            scene_name: record.name.clone(),
            scene_path: record.path.clone(),
        })
    }

    /// The scene a live entity belongs to.
    pub fn scene_of(&self, entity: Entity) -> Option<SceneId> {
        let SceneMember(scene) = *self.universe.get_component::<SceneMember>(entity)?;
        self.scenes.is_valid(scene).then_some(scene)
    }

    pub fn find_scene_by_path(&self, path: &Path) -> Option<SceneId> {
        self.scenes
            .iter()
            .find(|(_, record)| record.path.as_deref() == Some(path))
            .map(|(scene, _)| scene)
    }

    pub fn find_scene_by_name(&self, name: &str) -> Option<SceneId> {
        self.scenes
            .iter()
            .find(|(_, record)| record.name == name)
            .map(|(scene, _)| scene)
    }

    pub fn is_loaded(&self, scene: SceneId) -> bool {
        self.scenes
            .try_get(scene)
            .map(|record| record.loaded)
            .unwrap_or(false)
    }

    pub fn scene_name(&self, scene: SceneId) -> Option<&str> {
        Some(self.scenes.try_get(scene)?.name.as_str())
    }

    pub fn scene_path(&self, scene: SceneId) -> Option<&Path> {
        self.scenes.try_get(scene)?.path.as_deref()
    }

    pub fn scene_entities(&self, scene: SceneId) -> &[Entity] {
        self.scenes
            .try_get(scene)
            .map(|record| record.entities.as_slice())
            .unwrap_or_default()
    }

    /// Whether the scene has edits that weren't saved yet.
    pub fn is_dirty(&self, scene: SceneId) -> bool {
        self.scenes
            .try_get(scene)
            .map(|record| record.dirty)
            .unwrap_or(false)
    }

    pub fn set_dirty(&mut self, scene: SceneId, dirty: bool) {
        if let Some(record) = self.scenes.try_get_mut(scene) {
            record.dirty = dirty;
        }
    }

    pub fn loaded_scenes(&self) -> impl Iterator<Item = SceneId> + '_ {
        self.scenes
            .iter()
            .filter(|(_, record)| record.loaded)
            .map(|(scene, _)| scene)
    }

    /// Captures the scene's current authored state, with every reference's hints refreshed.
    pub fn snapshot(&self, scene: SceneId) -> Result<SceneDescription, SceneError> {
        let record = self.scene_record(scene)?;

        let objects = record
            .entities
            .iter()
            .map(|&entity| {
                let links: BTreeMap<String, CrossSceneRef> = self
                    .universe
                    .get_component::<Links>(entity)
                    .map(|links| {
                        links
                            .references
                            .iter()
                            .map(|(field, reference)| {
                                (field.clone(), self.refreshed(reference))
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                ObjectDescription {
                    name: self
                        .universe
                        .get_component::<Name>(entity)
                        .map(|name| name.0.clone())
                        .unwrap_or_default(),
                    id: self
                        .universe
                        .get_component::<IdentityComponent>(entity)
                        .map(|identity| identity.value().clone())
                        .unwrap_or_default(),
                    links,
                }
            })
            .collect();

        Ok(SceneDescription {
            name: record.name.clone(),
            path: record.path.clone(),
            template: !record.is_instance && record.path.is_some(),
            objects,
        })
    }

    /// Hints are derived data: recompute them from the live target when it's around.
    fn refreshed(&self, reference: &CrossSceneRef) -> CrossSceneRef {
        let mut reference = reference.clone();
        if let Some(target) = self
            .resolve_entity(&reference)
            .and_then(|entity| self.target_info(entity))
        {
            reference.set_value(Some(target));
        }
        reference.before_serialize();
        reference
    }
}
