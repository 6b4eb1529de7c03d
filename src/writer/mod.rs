//! Turns a [`BindingPlan`] into a gem tree on disk.
//!
//! Everything is written into a temporary directory beside `output_dir`
//! and renamed into place at the end, so a failed run leaves any previous
//! output untouched.

pub mod build;
pub mod c;
pub mod cpp;
pub mod docs;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::{BindgenError, Result};
use crate::model::{ClassInfo, EnumInfo};
use crate::processor::overrides::OverrideRegistry;
use crate::processor::{self, BindingPlan, GenerationReport};

/// Relative paths of every generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub mrbgem: PathBuf,
    pub readme: PathBuf,
    pub bindings: PathBuf,
    pub mrblib: PathBuf,
    pub wrapper: PathBuf,
    pub cmake: PathBuf,
}

impl OutputLayout {
    pub fn new(config: &GeneratorConfig) -> Self {
        let lib = &config.library_name;
        let port = Path::new("ports").join(&config.port);
        Self {
            mrbgem: PathBuf::from("mrbgem.rake"),
            readme: PathBuf::from("README.md"),
            bindings: Path::new("src").join(format!("{lib}.c")),
            mrblib: Path::new("mrblib").join(format!("{lib}.rb")),
            wrapper: port.join(format!("{lib}_wrapper.cpp")),
            cmake: port.join("CMakeLists.txt"),
        }
    }

    pub fn files(&self) -> [&Path; 6] {
        [
            &self.mrbgem,
            &self.readme,
            &self.bindings,
            &self.mrblib,
            &self.wrapper,
            &self.cmake,
        ]
    }
}

pub struct Generator<'a> {
    config: &'a GeneratorConfig,
    overrides: &'a OverrideRegistry,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a GeneratorConfig, overrides: &'a OverrideRegistry) -> Self {
        Self { config, overrides }
    }

    /// Filters `classes`, writes the gem tree and publishes it at `output_dir`.
    pub fn generate(
        &self,
        classes: &[ClassInfo],
        enums: &[EnumInfo],
        output_dir: &Path,
    ) -> Result<GenerationReport> {
        let plan = processor::run(classes, enums, self.overrides);
        info!(
            generated = plan.report.generated_count,
            filtered = plan.report.filtered_count,
            rescued = plan.report.rescued_count,
            skipped = plan.report.skipped_count,
            overridden = plan.report.overridden_count,
            "binding plan ready"
        );

        let parent = parent_dir(output_dir);
        fs::create_dir_all(parent).map_err(|e| BindgenError::io(parent, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".mrbc-bindgen-")
            .tempdir_in(parent)
            .map_err(|e| BindgenError::io(parent, e))?;
        debug!(staging = %staging.path().display(), "writing into staging directory");

        self.write_tree(&plan, staging.path())?;
        publish(&staging, output_dir, parent)?;

        info!(output = %output_dir.display(), "gem tree published");
        Ok(plan.report)
    }

    fn write_tree(&self, plan: &BindingPlan, root: &Path) -> Result<()> {
        let layout = OutputLayout::new(self.config);
        for file in layout.files() {
            if let Some(dir) = file.parent() {
                let dir = root.join(dir);
                fs::create_dir_all(&dir).map_err(|e| BindgenError::io(&dir, e))?;
            }
        }

        let at = |rel: &Path| root.join(rel);
        let (config, overrides) = (self.config, self.overrides);

        write_file(&at(&layout.mrbgem), |p| build::emit_mrbgem(config, p))?;
        write_file(&at(&layout.bindings), |p| c::emit(plan, config, overrides, p))?;
        write_file(&at(&layout.wrapper), |p| cpp::emit(plan, config, overrides, p))?;
        write_file(&at(&layout.cmake), |p| build::emit_cmake(config, p))?;
        write_file(&at(&layout.readme), |p| docs::emit_readme(plan, config, p))?;
        write_file(&at(&layout.mrblib), |p| docs::emit_mrblib(plan, config, p))?;
        Ok(())
    }
}

fn write_file(path: &Path, emit: impl FnOnce(&Path) -> io::Result<()>) -> Result<()> {
    emit(path).map_err(|e| BindgenError::io(path, e))?;
    debug!(path = %path.display(), "wrote");
    Ok(())
}

fn parent_dir(output_dir: &Path) -> &Path {
    match output_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Renames the staged tree onto `output_dir`. A previous tree is first moved
/// into a throwaway directory and restored if the final rename fails.
fn publish(staging: &TempDir, output_dir: &Path, parent: &Path) -> Result<()> {
    if !output_dir.exists() {
        return fs::rename(staging.path(), output_dir).map_err(|e| BindgenError::io(output_dir, e));
    }

    let trash = tempfile::Builder::new()
        .prefix(".mrbc-bindgen-old-")
        .tempdir_in(parent)
        .map_err(|e| BindgenError::io(parent, e))?;
    let previous = trash.path().join("previous");

    fs::rename(output_dir, &previous).map_err(|e| BindgenError::io(output_dir, e))?;
    if let Err(e) = fs::rename(staging.path(), output_dir) {
        let _ = fs::rename(&previous, output_dir);
        return Err(BindgenError::io(output_dir, e));
    }
    Ok(())
}
