//! viewc - render a view arch from the command line
//!
//! Usage:
//!   cargo run --features cli --bin viewc -- \
//!     --arch config/views/partner_form.xml \
//!     --model config/models/partner.yaml
//!
//! `attrs` conditions are left dynamic (the domain grammar is evaluated by
//! the client), so the output shows exactly what a client would receive.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use view_arch::{ConfigLoader, KeepDynamic, ModelFields, ProcessorConfig, RecordContext, ViewProcessor};

/// Render a view arch with canonical field names and modifiers
#[derive(Parser, Debug)]
#[command(name = "viewc")]
#[command(about = "Render a view arch with canonical field names and modifiers")]
struct Args {
    /// View arch XML file
    #[arg(long, short = 'a')]
    arch: PathBuf,

    /// Model definition YAML file
    #[arg(long, short = 'm')]
    model: PathBuf,

    /// Processor config YAML file (defaults to the config directory's view_arch.yaml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Render modifiers on containers and drop attrs, as sent to web clients
    #[arg(long, conflicts_with = "config")]
    client: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = if args.client {
        ProcessorConfig::client()
    } else if let Some(path) = &args.config {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        ProcessorConfig::from_yaml(&content)?
    } else {
        ConfigLoader::from_env().load_processor_config()?
    };

    let fields = ModelFields::from_yaml_file(&args.model)
        .with_context(|| format!("loading model {}", args.model.display()))?;
    let arch = std::fs::read_to_string(&args.arch)
        .with_context(|| format!("reading arch {}", args.arch.display()))?;

    let processor = ViewProcessor::new(&fields, &fields, &KeepDynamic).with_config(config);
    let rendered = processor
        .process(&arch, &RecordContext::new())
        .with_context(|| format!("processing {}", args.arch.display()))?;

    println!("{}", rendered);
    Ok(())
}
