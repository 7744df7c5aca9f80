use clap::Args;
use std::path::PathBuf;
use tether::{entities::Name, IdentityComponent, SceneDescription, SceneManager};
use tether_utils::{ok, AnyResult, AnyhowResultExt};

#[derive(Args)]
pub struct InspectCommand {
    /// Scene file to inspect
    pub scene: PathBuf,
    /// Configuration file
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Print the scene back out as TOML, with missing identifiers filled in
    #[clap(long)]
    pub emit: bool,
}

impl crate::Command for InspectCommand {
    fn run(self) -> AnyResult {
        let config = crate::load_config(self.config.as_deref())?;
        let description = SceneDescription::load(&self.scene)
            .otherwise_with(|| format!("couldn't load scene {}", self.scene.display()))?;
        let is_instance = description.is_instance();

        // Authoring mode, so objects without an identifier get one
        let mut manager = SceneManager::authoring(config.registry);
        let scene = manager.load(description);

        if self.emit {
            print!("{}", manager.snapshot(scene)?.to_toml_string()?);
            return ok();
        }

        println!(" : {}", manager.scene_name(scene).unwrap_or_default());
        for &entity in manager.scene_entities(scene) {
            let universe = manager.universe();
            let name = universe
                .get_component::<Name>(entity)
                .map(Name::as_str)
                .unwrap_or("(unnamed)");
            let text = universe
                .get_component::<IdentityComponent>(entity)
                .map(|identity| identity.inspector_text(is_instance))
                .unwrap_or_default();

            println!("  - {name}: {text}");
        }

        ok()
    }
}
