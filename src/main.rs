//! bindery - build EPUB files from a JSON recipe

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use bindery::recipe::Recipe;

#[derive(Parser)]
#[command(name = "bindery")]
#[command(version, about = "Build EPUB 3 files from a JSON recipe", long_about = None)]
#[command(after_help = "EXAMPLES:
    bindery book.json book.epub    Build book.epub from book.json")]
struct Cli {
    /// Recipe describing metadata, sections, and media
    #[arg(value_name = "RECIPE")]
    recipe: PathBuf,

    /// Output EPUB file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match build(&cli.recipe, &cli.output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn build(recipe_path: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let recipe = Recipe::from_path(recipe_path)?;
    let base = recipe_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let epub = recipe.build(base)?;
    epub.write(output)?;
    Ok(())
}
