//! Header → `ClassInfo` extraction.
//!
//! Two implementations sit behind [`SignatureParser`]: an AST walker over
//! libclang (cargo feature `libclang`, loaded at runtime) and a regex
//! fallback. [`select_parser`] picks one at startup; nothing downstream can
//! tell which one ran.

pub mod fallback;
#[cfg(feature = "libclang")]
pub mod libclang;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::model::{ClassInfo, EnumInfo};

pub trait SignatureParser {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Every class/struct definition in the header, with its public methods.
    fn extract_classes(&self, header: &Path) -> Result<Vec<ClassInfo>>;

    /// Enums declared outside any class.
    fn extract_enums(&self, header: &Path) -> Result<Vec<EnumInfo>>;
}

/// Returns the AST parser when it is compiled in and libclang loads,
/// the regex fallback otherwise.
pub fn select_parser(include_paths: &[PathBuf], force_fallback: bool) -> Box<dyn SignatureParser> {
    if force_fallback {
        info!("using regex fallback parser (forced)");
        return Box::new(fallback::RegexParser::new());
    }

    match ast_parser(include_paths) {
        Ok(parser) => {
            info!(parser = parser.name(), "using AST parser");
            parser
        }
        Err(e) => {
            warn!("{e}; falling back to regex parser");
            Box::new(fallback::RegexParser::new())
        }
    }
}

#[cfg(feature = "libclang")]
fn ast_parser(include_paths: &[PathBuf]) -> Result<Box<dyn SignatureParser>> {
    Ok(Box::new(libclang::ClangParser::new(include_paths)?))
}

#[cfg(not(feature = "libclang"))]
fn ast_parser(_include_paths: &[PathBuf]) -> Result<Box<dyn SignatureParser>> {
    Err(crate::error::BindgenError::ParseUnavailable(
        "built without the `libclang` feature".to_string(),
    ))
}
