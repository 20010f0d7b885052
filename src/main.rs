use clap::Parser;
use std::path::PathBuf;
use stela::build::build_site;
use stela::config::Config;
use stela::logging::init_logging;

/// Builds a blog published from a headless CMS into a static site.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The directory from which to look for `stela.yaml`, walking upward.
    #[arg(short = 'C', long, default_value = ".")]
    directory: PathBuf,

    /// The directory into which the site is rendered.
    #[arg(short, long, default_value = "public")]
    output: PathBuf,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    // The search for `stela.yaml` needs an absolute path to walk past the
    // invocation directory.
    let config = Config::from_directory(&cli.directory.canonicalize()?, &cli.output)?;
    build_site(config)?;
    Ok(())
}
