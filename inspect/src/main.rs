//! Load an XNALara model and print what was found in it.

mod summary;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;
use xnamesh_core::mesh::PackOptions;
use xnamesh_core::params::ParamsDirectory;
use xnamesh_core::{LoaderOptions, ModelError, ModelLoader};

use summary::ModelSummary;

/// xnamesh model inspector arguments.
#[derive(Parser, Debug)]
#[command(
    name = "xnamesh-inspect",
    about = "Inspect XNALara / XPS models",
    long_about = "Loads a .mesh, .xps or .mesh.ascii file and prints its bones and meshes.\n\n\
        EXAMPLES:\n\
          # Plain summary\n\
          xnamesh-inspect hero/generic_item.mesh\n\
        \n\
          # With model parameters and packed vertex arrays, as JSON\n\
          xnamesh-inspect hero.xps --params params --pack --json",
    version
)]
struct Args {
    /// Model file to load.
    path: PathBuf,

    /// Model the inspected file is an item of; text items share its bones.
    #[arg(long)]
    parent: Option<PathBuf>,

    /// Directory with <name>.modelparams.json files.
    #[arg(long)]
    params: Option<PathBuf>,

    /// JSON file with "loader" and "pack" option objects.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replace tangents stored in the file with computed ones.
    #[arg(long)]
    recompute_tangents: bool,

    /// Also pack the meshes into vertex arrays.
    #[arg(long)]
    pack: bool,

    /// Pack without quantizing normals, tangents, texcoords and weights.
    #[arg(long, requires = "pack")]
    no_quantize: bool,

    /// Print JSON instead of a text report.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    loader: LoaderOptions,
    pack: PackOptions,
}

impl Config {
    fn read(path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn run(args: Args) -> Result<(), ModelError> {
    let config = match &args.config {
        Some(path) => Config::read(path)?,
        None => Config::default(),
    };

    let mut loader_options = config.loader;
    if args.recompute_tangents {
        loader_options = loader_options.with_recompute_tangents(true);
    }
    let loader = match &args.params {
        Some(dir) => ModelLoader::new(ParamsDirectory::new(dir)),
        None => ModelLoader::default(),
    }
    .with_options(loader_options);

    let model = match &args.parent {
        Some(parent) => {
            let parent = loader.load_path(parent)?;
            loader.load_path_with_parent(&args.path, &parent)?
        }
        None => loader.load_path(&args.path)?,
    };

    let pack = args.pack.then(|| {
        let mut options = config.pack;
        if args.no_quantize {
            options = options.with_quantization(false);
        }
        options
    });
    let summary = ModelSummary::new(&model, pack);

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize summary: {e}"),
        }
    } else {
        summary.print();
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let path = args.path.clone();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Failed to load {}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}
