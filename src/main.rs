//! repo-banner - GitHub repository banner generator

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use repo_banner::github::parse_repo_path;
use repo_banner::{
    AppConfig, BannerBuilder, BannerData, BuildOptions, Builder, ColorScheme, ConfigLoader,
    Rasterizer, Registry, Result, logging,
};

#[derive(Parser)]
#[command(name = "repo-banner")]
#[command(version, about = "Generate PNG banners for GitHub repository social previews", long_about = None)]
#[command(after_help = "EXAMPLES:
    repo-banner generate numtide/treefmt                Write banner.png
    repo-banner generate numtide/treefmt --svg -o b.svg Write the SVG instead
    repo-banner render --name demo --stars 42           Build offline from explicit data
    repo-banner init-config                             Write banner-generator.toml")]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// GitHub API token (overrides config and GITHUB_TOKEN)
    #[arg(long, global = true, value_name = "TOKEN")]
    token: Option<String>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors and warnings
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a banner for a GitHub repository
    Generate {
        /// Repository as owner/repo
        #[arg(value_name = "OWNER/REPO")]
        repo: String,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Generate a banner from explicit data, without network access
    Render {
        /// Repository name
        #[arg(long)]
        name: String,

        /// Repository owner
        #[arg(long, default_value = "")]
        owner: String,

        /// Repository description
        #[arg(long, default_value = "")]
        description: String,

        /// Primary language
        #[arg(long, default_value = "")]
        language: String,

        /// Star count
        #[arg(long, default_value_t = 0)]
        stars: u64,

        /// Fork count
        #[arg(long, default_value_t = 0)]
        forks: u64,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// List registered font families
    Fonts,
    /// Write a default configuration file
    InitConfig {
        /// Destination
        #[arg(value_name = "PATH", default_value = "banner-generator.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Output file [default: banner.png, or banner.svg with --svg]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Omit stars, forks and language
    #[arg(long)]
    no_stats: bool,

    /// Use the dark color scheme
    #[arg(long)]
    dark: bool,

    /// Write SVG instead of PNG
    #[arg(long)]
    svg: bool,
}

impl OutputArgs {
    fn options(&self) -> BuildOptions {
        BuildOptions {
            no_stats: self.no_stats,
            dark_mode: self.dark,
        }
    }

    fn path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None if self.svg => PathBuf::from("banner.svg"),
            None => PathBuf::from("banner.png"),
        }
    }

    fn wants_svg(&self) -> bool {
        self.svg
            || self
                .output
                .as_ref()
                .and_then(|p| p.extension())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::level(cli.verbose, cli.quiet));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::InitConfig { path, force } => init_config(path, *force, cli.quiet),
        Command::Fonts => {
            let config = load_config(cli)?;
            list_fonts(&Registry::with_config_or_default(&config.fonts.fonts_dir));
            Ok(())
        }
        Command::Generate { repo, output } => {
            let config = load_config(cli)?;
            let (owner, name) = parse_repo_path(repo)?;

            if !cli.quiet {
                println!("Fetching repository data for {owner}/{name}...");
            }
            let client = config.github.client();
            let data: BannerData = client
                .repository(owner, name, config.github.request_timeout())?
                .into();

            if !cli.quiet {
                println!("Generating banner for: {}", data.repo_name);
                if !data.description.is_empty() {
                    println!("Description: {}", data.description);
                }
            }
            write_banner(&config, &data, output, cli.quiet)?;

            if !cli.quiet {
                println!();
                println!("To set as social preview, go to:");
                println!("  https://github.com/{owner}/{name}/settings");
                println!("Then scroll to 'Social preview' and click 'Edit' to upload the generated PNG.");
            }
            Ok(())
        }
        Command::Render {
            name,
            owner,
            description,
            language,
            stars,
            forks,
            output,
        } => {
            let config = load_config(cli)?;
            let data = BannerData::new(owner.as_str(), name.as_str())
                .with_description(description.as_str())
                .with_language(language.as_str())
                .with_stats(*stars, *forks);
            write_banner(&config, &data, output, cli.quiet)
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = ConfigLoader::new().load(cli.config.as_deref())?;
    if let Some(token) = &cli.token {
        config.github.token = token.clone();
    }
    Ok(config)
}

fn write_banner(config: &AppConfig, data: &BannerData, args: &OutputArgs, quiet: bool) -> Result<()> {
    let registry = Arc::new(Registry::with_config_or_default(&config.fonts.fonts_dir));
    let kind = config.banner.builder;
    let template = config.locate_template(kind)?;
    info!(builder = %kind, template = %template.display(), "building banner");

    // A standalone file can only use an explicitly hosted font endpoint
    let base_url = (config.fonts.enable_web_fonts && !config.fonts.web_fonts_base_url.is_empty())
        .then_some(config.fonts.web_fonts_base_url.as_str());
    let builder = BannerBuilder::open(kind, registry, &template, base_url)?;
    let svg = builder.build(data, &args.options())?;

    let path = args.path();
    let bytes = if args.wants_svg() {
        svg.into_bytes()
    } else {
        if !quiet {
            println!("Converting SVG to PNG...");
        }
        let scheme = if args.dark {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        };
        Rasterizer::new(Duration::from_secs(config.banner.render_timeout_secs))
            .rasterize(svg.as_bytes(), scheme)?
    };

    std::fs::write(&path, bytes)?;
    if !quiet {
        println!("Banner saved to: {}", path.display());
    }
    Ok(())
}

fn list_fonts(registry: &Registry) {
    println!("Font directory: {}", registry.base_dir().display());
    for family in registry.families() {
        let Some(font) = registry.font(family) else {
            continue;
        };
        println!("{family} ({})", font.name);

        let aliases = registry.aliases_of(family);
        if !aliases.is_empty() {
            println!("  aliases: {}", aliases.join(", "));
        }
        for (format, path) in &font.variants {
            println!("  {format}: {}", path.display());
        }
    }
}

fn init_config(path: &Path, force: bool, quiet: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(repo_banner::Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    AppConfig::default().save(path)?;
    if !quiet {
        println!("Wrote default configuration to {}", path.display());
    }
    Ok(())
}
