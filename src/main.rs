use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use territory_gate::config::DataPaths;
use territory_gate::policy::PolicyFile;
use territory_gate::region::source;
use territory_gate::{PermissionEngine, RegionCatalog};

/// Territory Gate — regional distribution rights engine
///
/// Decides whether a distributor may operate in a country, state, or city.
/// Region codes are composite: `IN`, `KA-IN`, `BLR-KA-IN`.
///
/// Examples:
///   territory check DISTRIBUTOR1 BLR-KA-IN
///   territory region KA-IN
///   territory grant DISTRIBUTOR1 --include US --include IN --exclude KA-IN
///   territory grant DISTRIBUTOR2 --parent DISTRIBUTOR1 --exclude TN-IN
///   territory serve --port 8080
#[derive(Parser)]
#[command(name = "territory", version, about, long_about = None)]
struct Cli {
    /// Region table (CSV with header). Defaults to ~/.territory/regions.csv.
    #[arg(long, global = true)]
    regions: Option<PathBuf>,

    /// Distributor policy (JSON). Defaults to ~/.territory/policy.json.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a distributor may operate in a location.
    Check {
        distributor: String,
        location: String,
    },

    /// Show a region and its ancestor chain.
    Region { code: String },

    /// Add a distributor or extend its rules in the policy file.
    Grant {
        distributor: String,

        /// Parent distributor, consulted when this one has no matching rule.
        #[arg(long)]
        parent: Option<String>,

        /// Region code to include. Repeatable.
        #[arg(long = "include", short = 'i')]
        include: Vec<String>,

        /// Region code to exclude. Repeatable.
        #[arg(long = "exclude", short = 'x')]
        exclude: Vec<String>,
    },

    /// Serve the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let paths = DataPaths::resolve(cli.regions, cli.policy);

    match cli.command {
        Command::Check { distributor, location } => {
            let engine = load_engine(&paths)?;
            let decision = engine.explain(&distributor, &location);
            let verdict = if decision.allowed { "ALLOW" } else { "DENY" };
            println!("{} {} {} ({})", verdict, distributor, location, decision.reason);
            Ok(if decision.allowed { ExitCode::SUCCESS } else { ExitCode::from(2) })
        }

        Command::Region { code } => {
            let catalog = load_catalog(&paths)?;
            let Some(region) = catalog.lookup(&code) else {
                bail!("Region not found: '{}'", code);
            };
            println!("{} — {} ({})", region.code, region.name, region.level);
            for ancestor in catalog.ancestors_of(&code).skip(1) {
                println!("  ↑ {} — {} ({})", ancestor.code, ancestor.name, ancestor.level);
            }
            for child in catalog.children_of(&code) {
                println!("  ↓ {} — {}", child.code, child.name);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Grant { distributor, parent, include, exclude } => {
            let catalog = load_catalog(&paths)?;
            let mut policy = PolicyFile::load_from(&paths.policy)
                .with_context(|| format!("loading {}", paths.policy.display()))?;
            policy.upsert(&distributor, parent.as_deref(), &include, &exclude)?;

            // Validate the whole policy against the catalog before writing it.
            let mut engine = PermissionEngine::with_catalog(catalog);
            let reports = policy.apply(&mut engine)?;
            let skipped: usize = reports.iter().map(|r| r.skipped.len()).sum();
            if skipped > 0 {
                eprintln!("  Warning: {} unknown region code(s) ignored", skipped);
            }

            policy
                .save_to(&paths.policy)
                .with_context(|| format!("saving {}", paths.policy.display()))?;
            println!("Saved {} ({} distributors)", paths.policy.display(), policy.distributors.len());
            Ok(ExitCode::SUCCESS)
        }

        Command::Serve { host, port } => {
            let engine = load_engine(&paths)?;
            let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
            runtime
                .block_on(territory_gate::server::start(engine, &host, port))
                .with_context(|| format!("serving on {}:{}", host, port))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_catalog(paths: &DataPaths) -> anyhow::Result<RegionCatalog> {
    let mut catalog = RegionCatalog::new();
    source::load_path(&mut catalog, &paths.regions)?;
    Ok(catalog)
}

fn load_engine(paths: &DataPaths) -> anyhow::Result<PermissionEngine> {
    let mut engine = PermissionEngine::with_catalog(load_catalog(paths)?);
    let policy = PolicyFile::load_from(&paths.policy)
        .with_context(|| format!("loading {}", paths.policy.display()))?;
    policy.apply(&mut engine)?;
    Ok(engine)
}
