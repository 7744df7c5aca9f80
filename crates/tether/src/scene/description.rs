use super::SceneError;
use crate::{id::Identifier, reference::CrossSceneRef};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

/// Authored contents of a scene file.
///
/// ```toml
/// name = "Level01"
/// path = "scenes/Level01.toml"
///
/// [[objects]]
/// name = "Switch"
/// id = "5b0e1f0c-3c1a-4a57-9a55-0e7a9c1f3d11"
///
/// [objects.links]
/// target = { guid = "abc-1", scene = "Level02" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub name: String,
    /// Path of the scene asset. Scenes without one are treated as templates: their objects are
    /// never instantiated as-is, so they carry no identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Marks a template explicitly, even if it was read from a file.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub template: bool,
    #[serde(default)]
    pub objects: Vec<ObjectDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Identifier::is_empty")]
    pub id: Identifier,
    /// Named references held by the object.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, CrossSceneRef>,
}

impl SceneDescription {
    pub fn from_toml_str(text: &str) -> Result<Self, SceneError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a scene description from disk. If the file doesn't name its own path, the path it
    /// was read from is used.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let mut description = Self::from_toml_str(&fs::read_to_string(path)?)?;
        if description.path.is_none() && !description.template {
            description.path = Some(path.to_owned());
        }
        Ok(description)
    }

    pub fn to_toml_string(&self) -> Result<String, SceneError> {
        Ok(toml::to_string(self)?)
    }

    /// Whether objects of this scene are placed instances rather than template definitions.
    pub fn is_instance(&self) -> bool {
        !self.template && self.path.is_some()
    }
}
