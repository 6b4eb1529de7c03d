//! Build descriptors: `mrbgem.rake` and the ESP-IDF component `CMakeLists.txt`.

use std::fs;
use std::io;
use std::path::Path;

use crate::config::GeneratorConfig;

pub fn emit_mrbgem(config: &GeneratorConfig, path: &Path) -> io::Result<()> {
    fs::write(path, render_mrbgem(config))
}

pub fn emit_cmake(config: &GeneratorConfig, path: &Path) -> io::Result<()> {
    fs::write(path, render_cmake(config))
}

pub fn render_mrbgem(config: &GeneratorConfig) -> String {
    format!(
        "MRuby::Gem::Specification.new('{gem}') do |spec|\n  spec.license = '{license}'\n  spec.author  = '{author}'\n  spec.summary = '{name} bindings for PicoRuby'\nend\n",
        gem = config.gem_name,
        license = config.license,
        author = config.author,
        name = config.vendor_display_name(),
    )
}

/// The component lives in `ports/<port>/`, two levels below the gem root.
pub fn render_cmake(config: &GeneratorConfig) -> String {
    let lib = &config.library_name;
    let sdk = &config.sdk_component;
    format!(
        r#"idf_component_register(
  SRCS
    "{lib}_wrapper.cpp"
    "../../src/{lib}.c"
  INCLUDE_DIRS
    "."
  REQUIRES
    {sdk}
)

target_link_libraries(${{COMPONENT_LIB}} PUBLIC
  {sdk}
)
"#
    )
}
