use clap::{Parser, Subcommand};
use inkstone::build::{BuildOptions, build_site};
use inkstone::cache;
use inkstone::config::{ConfigLoader, TomlConfigLoader, stock_config_toml};
use inkstone::content::{ContentParser, MarkdownContentParser, validate_unique_slugs};
use inkstone::fs::{FileSystem, RealFileSystem};
use inkstone::output;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inkstone")]
#[command(about = "Incremental static site generator")]
#[command(long_about = "\
Incremental static site generator

Markdown files under content/ become HTML pages, tags and categories
become listing pages, recent posts become an RSS feed, and files under
static/ are minified, fingerprinted, and copied through.

Site structure:

  my-site/
  ├── config.toml                  # Site config (optional)
  ├── content/
  │   ├── about.md                 # Ordinary page → /about.html
  │   └── posts/
  │       └── 2024-01-01-hello.md  # Dated post → /posts/hello.html
  ├── layouts/
  │   ├── default.html             # Fallback layout
  │   └── post.html                # Picked by 'layout: post' frontmatter
  └── static/
      └── css/app.css              # Minified + fingerprinted

Repeated builds are incremental: pages whose sources are unchanged since
the last build are skipped, except that any layout change rebuilds
everything. Use --full to force a cold build.

Run 'inkstone gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site directory
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into the output directory
    Build {
        /// Include draft pages
        #[arg(long)]
        drafts: bool,
        /// Ignore the build cache and rebuild everything
        #[arg(long)]
        full: bool,
        /// Print per-step diagnostics
        #[arg(long)]
        verbose: bool,
    },
    /// Parse and validate content without writing output
    Check,
    /// Remove the output directory and the build cache
    Clean,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            drafts,
            full,
            verbose,
        } => {
            let options = BuildOptions {
                include_drafts: drafts,
                verbose,
                incremental: !full,
            };
            let summary = build_site(&cli.site, &options)?;
            output::print_build_summary(&summary);
        }
        Command::Check => {
            let mut config = TomlConfigLoader.load(&cli.site)?;
            if config.site_path.is_none() {
                config.site_path = Some(cli.site.clone());
            }
            let parsed = MarkdownContentParser.parse_content(&config.content_dir())?;
            validate_unique_slugs(&parsed.pages)?;
            let drafts = parsed.pages.iter().filter(|p| p.draft).count();
            output::print_check_output(parsed.pages.len(), drafts);
        }
        Command::Clean => {
            let mut config = TomlConfigLoader.load(&cli.site)?;
            if config.site_path.is_none() {
                config.site_path = Some(cli.site.clone());
            }
            let output_dir = config.output_dir();
            RealFileSystem.remove_all(&output_dir)?;
            let manifest = cache::manifest_path(&cli.site);
            if manifest.exists() {
                std::fs::remove_file(&manifest)?;
            }
            println!("Removed {}", output_dir.display());
        }
        Command::GenConfig => {
            print!("{}", stock_config_toml());
        }
    }

    Ok(())
}
