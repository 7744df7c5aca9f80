use clap::Args;
use std::path::PathBuf;
use tether::{
    authoring::{reference_label, reference_status, ReferenceStatus},
    entities::Name,
    scene::Links,
    SceneDescription, SceneManager,
};
use tether_utils::{ok, AnyResult, AnyhowResultExt};

#[derive(Args)]
pub struct CheckCommand {
    /// Scene files to load, in order
    #[clap(required = true)]
    pub scenes: Vec<PathBuf>,
    /// Configuration file
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Name of a scene to unload once the first report is printed
    #[clap(long)]
    pub unload: Option<String>,
}

impl crate::Command for CheckCommand {
    fn run(self) -> AnyResult {
        let config = crate::load_config(self.config.as_deref())?;
        let mut manager = SceneManager::new(config.registry);

        for path in &self.scenes {
            let description = SceneDescription::load(path)
                .otherwise_with(|| format!("couldn't load scene {}", path.display()))?;
            manager.load(description);
        }

        report(&manager);

        if let Some(name) = self.unload {
            let scene = manager
                .find_scene_by_name(&name)
                .otherwise_with(|| format!("scene `{name}` isn't loaded"))?;
            manager.unload(scene)?;

            println!(" : After unloading {name}...");
            report(&manager);
        }

        ok()
    }
}

/// Prints the status of every reference held by the loaded scenes.
fn report(manager: &SceneManager) {
    let mut total = 0;
    let mut resolved = 0;

    for scene in manager.loaded_scenes() {
        println!(" : {}", manager.scene_name(scene).unwrap_or_default());

        for &entity in manager.scene_entities(scene) {
            let Some(links) = manager.universe().get_component::<Links>(entity) else {
                continue;
            };
            let object = manager
                .universe()
                .get_component::<Name>(entity)
                .map(Name::as_str)
                .unwrap_or("(unnamed)");

            for (field, reference) in &links.references {
                total += 1;
                if let ReferenceStatus::Resolved(_) = reference_status(reference, manager) {
                    resolved += 1;
                }

                println!(
                    "  - {object}.{field}: {}",
                    reference_label(reference, manager)
                );
            }
        }
    }

    println!(" : {resolved} of {total} references resolved");
}
