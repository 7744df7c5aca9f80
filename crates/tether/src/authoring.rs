//! Editor-side operations on references
//!
//! Everything an editor needs to present and edit a [`CrossSceneRef`], without any actual UI:
//! the label of the reference field, which context actions are available, what to highlight
//! when the field is clicked, and how picked or dropped objects become the reference's target.

use crate::{
    entities::{Entity, Name},
    reference::CrossSceneRef,
    scene::{SceneDescription, SceneError, SceneId, SceneManager},
};
use log::*;
use std::path::{Path, PathBuf};

/// How the target of a reference is referred to in labels.
pub const TARGET_KIND: &str = "Identity Component";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceStatus {
    /// The reference doesn't point anywhere.
    None,
    /// The target should be resolvable, but isn't.
    Missing,
    /// The target's scene isn't loaded. Holds the cached display name.
    Unloaded(String),
    /// The target is live. Holds its current display name.
    Resolved(String),
}

impl ReferenceStatus {
    /// Unloaded targets are usually drawn dimmed.
    pub fn is_dimmed(&self) -> bool {
        matches!(self, Self::Unloaded(_))
    }
}

pub fn reference_status(reference: &CrossSceneRef, manager: &SceneManager) -> ReferenceStatus {
    if !reference.is_set() {
        return ReferenceStatus::None;
    }

    if let Some(target) = manager.resolve_entity(reference) {
        let name = manager
            .universe()
            .get_component::<Name>(target)
            .map(|name| name.0.clone())
            .unwrap_or_else(|| reference.display_name().to_owned());
        return ReferenceStatus::Resolved(name);
    }

    match reference.scene_path() {
        Some(path) if loaded_scene(manager, path).is_none() => {
            ReferenceStatus::Unloaded(reference.display_name().to_owned())
        }
        _ => ReferenceStatus::Missing,
    }
}

/// Text of a reference field, e.g. `"Lamp (Identity Component)"`.
pub fn reference_label(reference: &CrossSceneRef, manager: &SceneManager) -> String {
    match reference_status(reference, manager) {
        ReferenceStatus::None => format!("None ({TARGET_KIND})"),
        ReferenceStatus::Missing => format!("Missing ({TARGET_KIND})"),
        ReferenceStatus::Unloaded(name) | ReferenceStatus::Resolved(name) => {
            format!("{name} ({TARGET_KIND})")
        }
    }
}

fn loaded_scene(manager: &SceneManager, path: &Path) -> Option<SceneId> {
    manager
        .find_scene_by_path(path)
        .filter(|&scene| manager.is_loaded(scene))
}

pub fn can_copy_id(reference: &CrossSceneRef) -> bool {
    reference.is_set()
}

/// The target's scene is known and not loaded.
pub fn can_open_scene(reference: &CrossSceneRef, manager: &SceneManager) -> bool {
    reference
        .scene_path()
        .is_some_and(|path| loaded_scene(manager, path).is_none())
}

/// The target's scene is loaded, has no unsaved changes, and isn't the only scene the
/// referencing objects (`holders`) live in.
pub fn can_close_scene(
    reference: &CrossSceneRef,
    manager: &SceneManager,
    holders: &[Entity],
) -> bool {
    let Some(scene) = reference
        .scene_path()
        .and_then(|path| loaded_scene(manager, path))
    else {
        return false;
    };

    if manager.is_dirty(scene) {
        return false;
    }

    !holders
        .iter()
        .all(|&holder| manager.scene_of(holder) == Some(scene))
}

/// Where scene descriptions come from when an editor opens a scene.
pub trait SceneSource {
    fn read(&self, path: &Path) -> Result<SceneDescription, SceneError>;
}

/// Reads scenes from a directory on disk. Scene paths are relative to `root`.
#[derive(Debug, Clone)]
pub struct FsSceneSource {
    pub root: PathBuf,
}

impl SceneSource for FsSceneSource {
    fn read(&self, path: &Path) -> Result<SceneDescription, SceneError> {
        let mut description = SceneDescription::load(self.root.join(path))?;
        if !description.template {
            description.path = Some(path.to_owned());
        }
        Ok(description)
    }
}

/// Loads the scene the reference's target lives in.
pub fn open_scene(
    reference: &CrossSceneRef,
    manager: &mut SceneManager,
    source: &impl SceneSource,
) -> Result<SceneId, SceneError> {
    let path = reference.scene_path().ok_or(SceneError::UnknownScene)?;
    if loaded_scene(manager, path).is_some() {
        return Err(SceneError::AlreadyLoaded {
            path: path.to_owned(),
        });
    }

    debug!("Opening {} for `{}`", path.display(), reference.guid());
    Ok(manager.load(source.read(path)?))
}

/// Unloads the scene the reference's target lives in.
pub fn close_scene(
    reference: &CrossSceneRef,
    manager: &mut SceneManager,
) -> Result<(), SceneError> {
    let path = reference.scene_path().ok_or(SceneError::UnknownScene)?;
    let scene = loaded_scene(manager, path).ok_or(SceneError::NotLoaded)?;
    manager.unload(scene)
}

/// What an editor should do when the reference field is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingTarget {
    /// Highlight the live target.
    Object(Entity),
    /// Make the live target the current selection.
    Select(Entity),
    /// Highlight the asset of the target's scene.
    SceneAsset(PathBuf),
    /// Open the target's scene, then highlight the target. See [`open_and_ping`].
    OpenScene(PathBuf),
    Nothing,
}

/// A single click highlights the target, or its scene asset while the scene isn't loaded. A
/// double click selects the target instead, or asks for its scene to be opened.
pub fn ping(reference: &CrossSceneRef, manager: &SceneManager, double_click: bool) -> PingTarget {
    if let Some(target) = manager.resolve_entity(reference) {
        if double_click {
            PingTarget::Select(target)
        } else {
            PingTarget::Object(target)
        }
    } else if let Some(path) = reference.scene_path() {
        if double_click && loaded_scene(manager, path).is_none() {
            PingTarget::OpenScene(path.to_owned())
        } else {
            PingTarget::SceneAsset(path.to_owned())
        }
    } else {
        PingTarget::Nothing
    }
}

/// Carries out [`PingTarget::OpenScene`]: loads the target's scene and returns what to highlight
/// once it's live.
pub fn open_and_ping(
    reference: &CrossSceneRef,
    manager: &mut SceneManager,
    source: &impl SceneSource,
) -> Result<PingTarget, SceneError> {
    open_scene(reference, manager, source)?;
    Ok(ping(reference, manager, false))
}

/// Picks the object a drag-and-drop or picker selection should point the reference at: the last
/// candidate with a usable identity.
pub fn pick_target(candidates: &[Entity], manager: &SceneManager) -> Option<Entity> {
    candidates
        .iter()
        .rev()
        .copied()
        .find(|&candidate| manager.target_info(candidate).is_some())
}

/// Points `reference` at `target`, or clears it on [`None`]. Targets without a usable identity
/// are rejected and leave the reference untouched.
pub fn assign(
    reference: &mut CrossSceneRef,
    manager: &SceneManager,
    target: Option<Entity>,
) -> bool {
    match target {
        Some(entity) => match manager.target_info(entity) {
            Some(info) => {
                reference.set_value(Some(info));
                true
            }
            None => false,
        },
        None => {
            reference.set_value(None);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::RegistryConfig,
        scene::{ObjectDescription, SceneDescription},
    };
    use ahash::AHashMap;

    struct MemorySource(AHashMap<PathBuf, SceneDescription>);

    impl SceneSource for MemorySource {
        fn read(&self, path: &Path) -> Result<SceneDescription, SceneError> {
            self.0.get(path).cloned().ok_or_else(|| {
                SceneError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such scene",
                ))
            })
        }
    }

    fn level02() -> SceneDescription {
        SceneDescription {
            name: "Level02".into(),
            path: Some("scenes/Level02.toml".into()),
            template: false,
            objects: vec![ObjectDescription {
                name: "Lamp".into(),
                id: "abc-1".into(),
                links: Default::default(),
            }],
        }
    }

    fn level01() -> SceneDescription {
        SceneDescription {
            name: "Level01".into(),
            path: Some("scenes/Level01.toml".into()),
            template: false,
            objects: vec![ObjectDescription {
                name: "Switch".into(),
                ..Default::default()
            }],
        }
    }

    /// A manager with both levels loaded, and a reference pointing at the lamp.
    fn setup() -> (SceneManager, CrossSceneRef, Entity) {
        let mut manager = SceneManager::authoring(RegistryConfig::default());
        let level01 = manager.load(level01());
        let level02 = manager.load(level02());
        let switch = manager.scene_entities(level01)[0];
        let lamp = manager.scene_entities(level02)[0];

        let mut reference = CrossSceneRef::default();
        assert!(assign(&mut reference, &manager, Some(lamp)));
        (manager, reference, switch)
    }

    #[test]
    fn labels() {
        let (mut manager, reference, _) = setup();
        assert_eq!(
            reference_label(&CrossSceneRef::default(), &manager),
            "None (Identity Component)"
        );
        assert_eq!(
            reference_label(&reference, &manager),
            "Lamp (Identity Component)"
        );

        close_scene(&reference, &mut manager).unwrap();
        let status = reference_status(&reference, &manager);
        assert_eq!(status, ReferenceStatus::Unloaded("Lamp".into()));
        assert!(status.is_dimmed());

        // Known identifier, but the scene it supposedly lives in is loaded and lacks it
        let mut stale = reference.clone();
        stale.set_value(Some(crate::reference::TargetInfo {
            guid: "gone".into(),
            display_name: "Ghost".into(),
            scene_name: "Level01".into(),
            scene_path: Some("scenes/Level01.toml".into()),
        }));
        assert_eq!(
            reference_label(&stale, &manager),
            "Missing (Identity Component)"
        );
    }

    #[test]
    fn resolved_label_uses_live_name() {
        let (mut manager, reference, _) = setup();
        let lamp = manager.resolve_entity(&reference).unwrap();
        manager.universe_mut().set_component(lamp, Name::new("Ceiling lamp"));

        assert_eq!(
            reference_status(&reference, &manager),
            ReferenceStatus::Resolved("Ceiling lamp".into())
        );
    }

    #[test]
    fn scene_actions() {
        let (mut manager, reference, switch) = setup();
        let source = MemorySource(AHashMap::from_iter([(
            PathBuf::from("scenes/Level02.toml"),
            level02(),
        )]));

        assert!(can_copy_id(&reference));
        assert!(!can_copy_id(&CrossSceneRef::default()));

        assert!(!can_open_scene(&reference, &manager));
        assert!(can_close_scene(&reference, &manager, &[switch]));
        assert!(matches!(
            open_scene(&reference, &mut manager, &source),
            Err(SceneError::AlreadyLoaded { .. })
        ));

        close_scene(&reference, &mut manager).unwrap();
        assert!(can_open_scene(&reference, &manager));
        assert!(!can_close_scene(&reference, &manager, &[switch]));
        assert!(manager.resolve_entity(&reference).is_none());

        open_scene(&reference, &mut manager, &source).unwrap();
        assert!(manager.resolve_entity(&reference).is_some());
    }

    #[test]
    fn closing_is_denied_for_dirty_or_sole_scene() {
        let (mut manager, reference, _) = setup();
        let level02 = manager
            .find_scene_by_path(Path::new("scenes/Level02.toml"))
            .unwrap();
        let lamp = manager.resolve_entity(&reference).unwrap();

        // A reference held by an object of the target's own scene
        assert!(!can_close_scene(&reference, &manager, &[lamp]));

        manager.set_dirty(level02, true);
        assert!(!can_close_scene(&reference, &manager, &[]));
    }

    #[test]
    fn ping_falls_back_to_scene_asset() {
        let (mut manager, reference, _) = setup();
        let lamp = manager.resolve_entity(&reference).unwrap();
        assert_eq!(ping(&reference, &manager, false), PingTarget::Object(lamp));

        close_scene(&reference, &mut manager).unwrap();
        assert_eq!(
            ping(&reference, &manager, false),
            PingTarget::SceneAsset("scenes/Level02.toml".into())
        );
        assert_eq!(
            ping(&CrossSceneRef::default(), &manager, false),
            PingTarget::Nothing
        );
    }

    #[test]
    fn double_click_selects_or_opens() {
        let (mut manager, reference, _) = setup();
        let source = MemorySource(AHashMap::from_iter([(
            PathBuf::from("scenes/Level02.toml"),
            level02(),
        )]));
        let lamp = manager.resolve_entity(&reference).unwrap();
        assert_eq!(ping(&reference, &manager, true), PingTarget::Select(lamp));

        close_scene(&reference, &mut manager).unwrap();
        assert_eq!(
            ping(&reference, &manager, true),
            PingTarget::OpenScene("scenes/Level02.toml".into())
        );

        let PingTarget::Object(reopened) = open_and_ping(&reference, &mut manager, &source).unwrap()
        else {
            panic!("expected the reopened lamp to be pinged");
        };
        assert_eq!(manager.resolve_entity(&reference), Some(reopened));
        assert_eq!(
            ping(&CrossSceneRef::default(), &manager, true),
            PingTarget::Nothing
        );
    }

    #[test]
    fn picking_and_assigning() {
        let (mut manager, mut reference, switch) = setup();
        let lamp = manager.resolve_entity(&reference).unwrap();
        let plain = manager.universe_mut().create_entity();

        assert_eq!(pick_target(&[switch, lamp, plain], &manager), Some(lamp));
        assert_eq!(pick_target(&[plain], &manager), None);

        // Objects without identity are rejected
        assert!(!assign(&mut reference, &manager, Some(plain)));
        assert_eq!(reference.display_name(), "Lamp");

        assert!(assign(&mut reference, &manager, Some(switch)));
        assert_eq!(reference.scene(), Some("Level01"));
        assert_eq!(manager.resolve_entity(&reference), Some(switch));

        assert!(assign(&mut reference, &manager, None));
        assert!(!reference.is_set());
    }
}
