mod manifest;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use log::debug;

use swag_core::{ApiDocs, SpecError};

use manifest::{MANIFEST_FILE_NAME, Manifest};

#[derive(Parser)]
#[command(name = "swag", about = "Swagger/OpenAPI document builder", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a document and print it as JSON
    Dump {
        /// Path to the route manifest
        #[arg(short, long, default_value = MANIFEST_FILE_NAME)]
        manifest: PathBuf,

        /// Document to assemble (defaults to the first configured one)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List configured documents and routes
    List {
        /// Path to the route manifest
        #[arg(short, long, default_value = MANIFEST_FILE_NAME)]
        manifest: PathBuf,
    },

    /// Validate a JSON payload against a schema declared by a route
    Validate {
        /// Path to the route manifest
        #[arg(short, long, default_value = MANIFEST_FILE_NAME)]
        manifest: PathBuf,

        /// Schema id to validate against
        #[arg(short, long)]
        schema: String,

        /// JSON file holding the payload
        data: PathBuf,
    },

    /// Initialize a new swag manifest
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dump {
            manifest,
            endpoint,
            output,
        } => cmd_dump(&manifest, endpoint, output),

        Commands::List { manifest } => cmd_list(&manifest),

        Commands::Validate {
            manifest,
            schema,
            data,
        } => cmd_validate(&manifest, &schema, &data),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "swag", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load_docs(path: &Path) -> Result<ApiDocs> {
    let manifest = Manifest::load(path)?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    debug!("resolving manifest paths against {}", base.display());
    manifest.into_docs(base)
}

fn cmd_dump(manifest: &Path, endpoint: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let docs = load_docs(manifest)?;
    let endpoint = match endpoint {
        Some(endpoint) => endpoint,
        None => docs
            .document_names()
            .into_iter()
            .next()
            .context("no documents configured")?,
    };

    let document = match docs.assemble(&endpoint) {
        Ok(document) => document,
        Err(SpecError::UnknownDocument { name, available }) => anyhow::bail!(
            "can't find specs by endpoint {name}, check your config\nPossible values for endpoint are: {}",
            available.join(", ")
        ),
        Err(e) => return Err(e).with_context(|| format!("failed to assemble {endpoint}")),
    };

    let json = serde_json::to_string_pretty(document.as_ref())?;
    match output {
        Some(path) => {
            fs::write(&path, json + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} to {}", endpoint, path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_list(manifest: &Path) -> Result<()> {
    let docs = load_docs(manifest)?;

    println!("Documents:");
    for spec in &docs.config().specs {
        println!("  {} -> {}", spec.endpoint, spec.route);
    }

    println!("Routes:");
    for route in docs.routes().routes() {
        let methods: Vec<&str> = route.methods.iter().map(|m| m.as_str()).collect();
        println!("  {:<30} {:<20} {}", route.rule, route.endpoint, methods.join(","));
    }
    Ok(())
}

fn cmd_validate(manifest: &Path, schema: &str, data: &Path) -> Result<()> {
    let docs = load_docs(manifest)?;
    let content = fs::read_to_string(data)
        .with_context(|| format!("failed to read {}", data.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", data.display()))?;

    docs.validate(schema, &payload)
        .with_context(|| format!("{} does not match {schema}", data.display()))?;
    eprintln!("{} is valid against {schema}", data.display());
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let manifest_path = PathBuf::from(MANIFEST_FILE_NAME);

    if manifest_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            manifest_path.display()
        );
    }

    fs::write(&manifest_path, manifest::default_manifest_content())?;
    eprintln!("Created {}", manifest_path.display());
    Ok(())
}
