pub mod cli;
pub mod config;
pub mod error;
pub mod header;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};

pub use config::GeneratorConfig;
pub use error::{BindgenError, Result};
pub use processor::GenerationReport;

use header::HeaderSource;
use model::ParsedApi;
use parser::SignatureParser;
use processor::overrides::OverrideRegistry;
use writer::Generator;

/// Inputs of one generation run besides the config and override table.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub root: PathBuf,
    pub output: PathBuf,
    /// Forwarded to the AST parser after the root's own search directories.
    pub include_paths: Vec<PathBuf>,
    pub force_fallback: bool,
    /// Where to write the parsed API as JSON, if anywhere.
    pub dump_ir: Option<PathBuf>,
}

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_tracing();

    // 1. ── Configure ──────────────────────────────────────────────────
    let config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("Loading config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };

    let mut overrides = OverrideRegistry::builtin(&config);
    if let Some(path) = &args.overrides {
        overrides
            .load_json(path)
            .with_context(|| format!("Loading overrides {}", path.display()))?;
    }

    let options = Options {
        root: args.root,
        output: args.output,
        include_paths: args.include,
        force_fallback: args.fallback_parser,
        dump_ir: args.dump_ir,
    };

    // 2. ── Parse, filter, write ───────────────────────────────────────
    let report = generate_gem(&options, &config, &overrides)
        .with_context(|| format!("Generating bindings from {}", options.root.display()))?;

    // 3. ── Report ─────────────────────────────────────────────────────
    print_summary(&report, &options.output);
    Ok(())
}

/// Installs a stderr fmt subscriber filtered by `RUST_LOG`, default `info`.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

/// Full pipeline: list headers under `options.root`, parse them, filter,
/// and publish the gem tree at `options.output`.
pub fn generate_gem(
    options: &Options,
    config: &GeneratorConfig,
    overrides: &OverrideRegistry,
) -> Result<GenerationReport> {
    if !options.root.is_dir() {
        return Err(BindgenError::HeaderNotFound(options.root.clone()));
    }

    let source = HeaderSource::new(&options.root);
    let headers = source.list_headers();
    if headers.is_empty() {
        warn!(root = %options.root.display(), "no headers under src/ or include/");
    }

    let mut include_paths = source.include_dirs();
    include_paths.extend(options.include_paths.iter().cloned());
    let parser = parser::select_parser(&include_paths, options.force_fallback);

    let api = extract_api(parser.as_ref(), &headers)?;
    info!(
        headers = headers.len(),
        classes = api.classes.len(),
        enums = api.enums.len(),
        parser = parser.name(),
        "headers parsed"
    );

    if let Some(path) = &options.dump_ir {
        dump_ir(&api, path)?;
    }

    Generator::new(config, overrides).generate(&api.classes, &api.enums, &options.output)
}

/// Runs `parser` over every header. The first failure aborts.
pub fn extract_api(parser: &dyn SignatureParser, headers: &[PathBuf]) -> Result<ParsedApi> {
    let mut api = ParsedApi::default();
    for header in headers {
        let classes = parser.extract_classes(header)?;
        let enums = parser.extract_enums(header)?;
        debug!(
            header = %header.display(),
            classes = classes.len(),
            enums = enums.len(),
            "extracted"
        );
        api.classes.extend(classes);
        api.enums.extend(enums);
    }
    Ok(api)
}

fn dump_ir(api: &ParsedApi, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| BindgenError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, api).map_err(|e| BindgenError::io(path, e.into()))?;
    writer.flush().map_err(|e| BindgenError::io(path, e))?;
    info!(path = %path.display(), "wrote parsed API");
    Ok(())
}

fn print_summary(report: &GenerationReport, output: &Path) {
    println!(
        "{}: {} methods bound ({} with custom native code), {} unsupported ({} rescued by override), {} skipped, {} duplicates",
        output.display(),
        report.bound_count(),
        report.overridden_count,
        report.filtered_count,
        report.rescued_count,
        report.skipped_count,
        report.duplicate_count
    );
    for c in &report.name_collisions {
        println!(
            "  name collision: {}#{}({}) dropped, {} already taken by ({})",
            c.class,
            c.method,
            c.dropped.join(", "),
            c.symbol,
            c.kept.join(", ")
        );
    }
    for s in &report.shadowed {
        println!(
            "  shadowed: {}#{} (arity {}) hidden by arity {}",
            s.class, s.method, s.arity, s.winner_arity
        );
    }
}
