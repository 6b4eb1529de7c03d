use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate mruby/c bindings from C++ headers")]
pub struct Cli {
    /// Library checkout; headers are read from its src/ and include/
    pub root: PathBuf,
    /// Output directory for the generated gem (replaced atomically)
    pub output: PathBuf,
    /// Extra include directory for the AST parser (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    pub include: Vec<PathBuf>,
    /// JSON generator config
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// JSON override file merged over the built-in table
    #[arg(long, value_name = "FILE")]
    pub overrides: Option<PathBuf>,
    /// Use the regex parser even if libclang is available
    #[arg(long)]
    pub fallback_parser: bool,
    /// Write the parsed classes and enums as JSON
    #[arg(long, value_name = "FILE")]
    pub dump_ir: Option<PathBuf>,
}
