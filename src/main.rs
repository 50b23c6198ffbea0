use clap::Parser;
use mesh_batcher::store::{JsonAssetStore, JsonSceneStore};
use mesh_batcher::{BatchSettings, MeshBatcher};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "mesh-batcher",
    about = "Merge static meshes of scene units into batched meshes",
    long_about = "Discovers scene units under a project directory, merges their static \
                  render nodes by shadow mode and material, writes the merged meshes next \
                  to each unit and saves the edited scenes."
)]
struct Args {
    /// Project directory the search folders are relative to.
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Batch settings file (JSON). Defaults to `batch_settings.json` in the project.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Only report the bins each unit would produce.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    mesh_batcher::init_logging();
    let args = Args::parse();

    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(|| args.project.join("batch_settings.json"));
    let batcher = MeshBatcher::new(BatchSettings::load_from_path(settings_path));

    let mut scenes = JsonSceneStore::new(args.project.clone());
    let result = if args.dry_run {
        batcher.plan_all(&mut scenes)
    } else {
        let mut assets = JsonAssetStore::new(args.project.clone());
        batcher.run_all(&mut scenes, &mut assets)
    };

    match result {
        Ok(report) if report.has_failures() => {
            log::error!("{} scene unit(s) failed", report.failed());
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Batching aborted: {}", err);
            ExitCode::FAILURE
        }
    }
}
