//! Cross-scene references
//!
//! A [`CrossSceneRef`] is a weak reference by value: it stores a copy of the target's
//! identifier and resolves it through the [`IdentityRegistry`] on every access. The target
//! may live in another scene, may not be loaded yet, or may have been renamed or moved since
//! the reference was authored; none of that matters as long as its identifier stays the same.
//!
//! The origin scene name and the display name stored next to the identifier are only hints for
//! diagnostics and editors. Resolution never looks at them.

use crate::{
    host::{Capability, ObjectModel},
    id::Identifier,
    registry::IdentityRegistry,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the authoring layer knows about a picked target object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub guid: Identifier,
    pub display_name: String,
    pub scene_name: String,
    /// Path of the scene asset holding the target. `None` for scenes that were never saved.
    pub scene_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossSceneRef {
    guid: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scene: Option<String>,

    // Authoring data, derived from the target whenever it's around
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scene_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    display_name: String,
}

impl CrossSceneRef {
    /// Creates a reference to `guid`, with no hints.
    pub fn new(guid: impl Into<Identifier>) -> Self {
        Self {
            guid: guid.into(),
            ..Default::default()
        }
    }

    /// Returns the target viewed as capability `C`, if it's currently live and supports it.
    ///
    /// This is a single registry lookup and has no side effects, so it's fine to call it every
    /// frame.
    pub fn get<'m, C, M>(
        &self,
        registry: &IdentityRegistry<M::Handle>,
        model: &'m M,
    ) -> Option<&'m C>
    where
        C: Capability,
        M: ObjectModel,
    {
        registry.resolve_as::<C, M>(&self.guid, model)
    }

    /// Same as [`CrossSceneRef::get`], in the boolean-returning form.
    pub fn try_get<'m, C, M>(
        &self,
        registry: &IdentityRegistry<M::Handle>,
        model: &'m M,
        value: &mut Option<&'m C>,
    ) -> bool
    where
        C: Capability,
        M: ObjectModel,
    {
        *value = self.get(registry, model);
        value.is_some()
    }

    /// Resolves the target's handle, without asking for any capability.
    pub fn resolve<M: ObjectModel>(
        &self,
        registry: &IdentityRegistry<M::Handle>,
        model: &M,
    ) -> Option<M::Handle> {
        registry.resolve(&self.guid, model)
    }

    pub fn guid(&self) -> &Identifier {
        &self.guid
    }

    /// Name of the scene the target lived in when the reference was authored.
    pub fn scene(&self) -> Option<&str> {
        self.scene.as_deref()
    }

    pub fn scene_path(&self) -> Option<&Path> {
        self.scene_path.as_deref()
    }

    /// Cached display name of the target.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Whether the reference names a target at all.
    pub fn is_set(&self) -> bool {
        !self.guid.is_empty()
    }

    /// Points the reference at `target`, or clears it on [`None`]. This is the only way the
    /// stored fields ever change.
    pub fn set_value(&mut self, target: Option<TargetInfo>) {
        *self = match target {
            Some(target) => Self {
                guid: target.guid,
                scene: Some(target.scene_name),
                scene_path: target.scene_path,
                display_name: target.display_name,
            },
            None => Self::default(),
        };
    }

    /// Hook run right before the host serializes the reference: the stored scene name is
    /// recomputed from the scene asset. Without a known asset the stored name is kept.
    pub fn before_serialize(&mut self) {
        if let Some(stem) = self.scene_path.as_deref().and_then(Path::file_stem) {
            self.scene = Some(stem.to_string_lossy().into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        component::IdentityComponent,
        entities::{Component, Entity, Name, Universe},
    };

    #[derive(Debug, PartialEq)]
    struct Lamp(u32);
    impl Component for Lamp {}

    fn target(guid: &str) -> TargetInfo {
        TargetInfo {
            guid: guid.into(),
            display_name: "Lamp".into(),
            scene_name: "Level02".into(),
            scene_path: Some("scenes/Level02.toml".into()),
        }
    }

    #[test]
    fn end_to_end_resolution() {
        let mut universe = Universe::new();
        let mut registry = IdentityRegistry::<Entity>::new();

        let identity = IdentityComponent::new("abc-1");
        let a = universe
            .build_entity()
            .with_component(identity.clone())
            .with_component(Lamp(7))
            .finish();

        let reference = CrossSceneRef::new("abc-1");
        assert!(reference.get::<Lamp, _>(&registry, &universe).is_none());

        identity.activate(a, &mut registry);
        assert_eq!(
            reference.get::<Lamp, _>(&registry, &universe),
            Some(&Lamp(7))
        );

        identity.deactivate(a, &mut registry);
        assert!(reference.get::<Lamp, _>(&registry, &universe).is_none());
    }

    #[test]
    fn hints_are_ignored_by_resolution() {
        let mut universe = Universe::new();
        let mut registry = IdentityRegistry::<Entity>::new();
        let a = universe
            .build_entity()
            .with_name("Renamed lamp")
            .with_component(Lamp(1))
            .finish();
        registry.register(&"abc-1".into(), a);

        let mut reference = CrossSceneRef::default();
        reference.set_value(Some(TargetInfo {
            display_name: "Old name".into(),
            scene_name: "SomewhereElse".into(),
            scene_path: Some("scenes/SomewhereElse.toml".into()),
            ..target("abc-1")
        }));

        let mut lamp = None;
        assert!(reference.try_get::<Lamp, _>(&registry, &universe, &mut lamp));
        assert_eq!(lamp, Some(&Lamp(1)));
        assert_eq!(reference.resolve(&registry, &universe), Some(a));

        // Capability the target doesn't expose
        let mut missing: Option<&IdentityComponent> = None;
        assert!(!reference.try_get(&registry, &universe, &mut missing));
        assert!(reference.get::<Name, _>(&registry, &universe).is_some());
    }

    #[test]
    fn set_value_and_clear() {
        let mut reference = CrossSceneRef::default();
        assert!(!reference.is_set());

        reference.set_value(Some(target("abc-1")));
        assert!(reference.is_set());
        assert_eq!(reference.guid().as_str(), "abc-1");
        assert_eq!(reference.scene(), Some("Level02"));
        assert_eq!(reference.display_name(), "Lamp");
        assert_eq!(
            reference.scene_path(),
            Some(Path::new("scenes/Level02.toml"))
        );

        reference.set_value(None);
        assert_eq!(reference, CrossSceneRef::default());
    }

    #[test]
    fn scene_name_follows_scene_asset() {
        let mut reference = CrossSceneRef::default();
        reference.set_value(Some(TargetInfo {
            scene_name: "Stale".into(),
            ..target("abc-1")
        }));

        reference.before_serialize();
        assert_eq!(reference.scene(), Some("Level02"));
    }

    #[test]
    fn scene_name_kept_without_scene_asset() {
        let mut reference = CrossSceneRef::default();
        reference.set_value(Some(TargetInfo {
            scene_path: None,
            ..target("abc-1")
        }));

        reference.before_serialize();
        assert_eq!(reference.scene(), Some("Level02"));
    }

    #[test]
    fn persisted_shape() {
        let text = r#"
            guid = "abc-1"
            scene = "Level02"
        "#;
        let reference: CrossSceneRef = toml::from_str(text).unwrap();
        assert_eq!(reference.guid().as_str(), "abc-1");
        assert_eq!(reference.scene(), Some("Level02"));
        assert_eq!(reference.scene_path(), None);
        assert_eq!(reference.display_name(), "");
    }
}
