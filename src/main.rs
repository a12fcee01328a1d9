use std::path::PathBuf;

use anyhow::Result;
use clap::*;

use commander::PackageGbl;
use metadata::ResolveMetadata;
use project::Project;
use step::Step;

mod commander;
mod env;
mod locate;
mod metadata;
mod parse;
mod project;
mod shell;
mod step;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: SubCommands,
}

#[derive(Subcommand)]
enum SubCommands {
    /// Run as a Simplicity Studio post-build step
    Postbuild(PostbuildArgs),
    /// Package an already-built firmware binary
    Manual(ManualArgs),
}

#[derive(Args, Debug)]
struct PostbuildArgs {
    /// Simplicity Studio project file
    project_file: PathBuf,
    /// Build directory, as passed by Studio (`build_dir:<path>`)
    build_dir: String,
}

#[derive(Args, Debug)]
struct ManualArgs {
    /// Firmware binary to package
    out_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut project = match cli.command {
        SubCommands::Postbuild(args) => {
            Project::from_postbuild(&args.project_file, &args.build_dir)?
        }
        SubCommands::Manual(args) => Project::from_out_file(&args.out_file)?,
    };

    let mut steps: Vec<Box<dyn Step>> = vec![
        ResolveMetadata::new_boxed(),
        PackageGbl::new_boxed(env::commander_search_path()),
    ];

    for step in &mut steps {
        step.run(&mut project)?;
    }

    Ok(())
}
