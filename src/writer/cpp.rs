//! Native side of the binding: `ports/<port>/<lib>_wrapper.cpp`.
//!
//! Defines every canonical symbol the C bindings declare, forwarding to the
//! vendor object. Override code is copied in as-is.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::config::GeneratorConfig;
use crate::model::{ClassInfo, MethodInfo};
use crate::processor::BindingPlan;
use crate::processor::naming;
use crate::processor::overrides::OverrideRegistry;
use crate::processor::types::{self, TypeCategory};

pub fn emit(
    plan: &BindingPlan,
    config: &GeneratorConfig,
    overrides: &OverrideRegistry,
    path: &Path,
) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    render(plan, config, overrides, &mut out)?;
    out.flush()
}

pub fn render(
    plan: &BindingPlan,
    config: &GeneratorConfig,
    overrides: &OverrideRegistry,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "// {} native wrapper for mruby/c.", config.vendor_display_name())?;
    writeln!(out, "// Auto-generated by mrbc-bindgen. DO NOT EDIT.\n")?;
    writeln!(out, "#include <{}>\n", config.vendor_header)?;
    writeln!(out, "extern \"C\" {{\n")?;

    for class in &plan.classes {
        if class.methods.is_empty() {
            continue;
        }
        writeln!(out, "// {}\n", class.name)?;
        for method in &class.methods {
            match overrides.native_wrapper_for(&class.name, method) {
                Some(code) => writeln!(out, "{}", code.trim_end())?,
                None => write_forwarder(out, config, class, method)?,
            }
            writeln!(out)?;
        }
    }

    writeln!(out, "}} // extern \"C\"")?;
    Ok(())
}

fn write_forwarder(
    out: &mut impl Write,
    config: &GeneratorConfig,
    class: &ClassInfo,
    method: &MethodInfo,
) -> io::Result<()> {
    writeln!(
        out,
        "{} {}({}) {{",
        types::native_return_type(&method.return_type),
        naming::canonical_name(&config.vendor_prefix, &class.name, method),
        naming::parameter_list(method)
    )?;

    let receiver = if method.is_static {
        format!("{}::", class.name)
    } else {
        format!("{}.", config.accessor_for(&class.name))
    };
    let call = format!(
        "{receiver}{}({})",
        method.name,
        naming::call_argument_list(method)
    );

    match types::classify(&method.return_type) {
        TypeCategory::Void => writeln!(out, "  {call};")?,
        TypeCategory::PrimitiveBool => writeln!(out, "  return {call} ? 1 : 0;")?,
        _ => writeln!(out, "  return {call};")?,
    }
    writeln!(out, "}}")
}
