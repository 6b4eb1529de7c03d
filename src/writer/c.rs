//! mruby/c side of the binding: `src/<lib>.c`.
//!
//! One static VM wrapper per retained method. Each wrapper pulls its
//! arguments off the VM stack, calls the canonical `extern` implemented by
//! the native wrapper, and stores the result. The gem init function
//! registers every wrapper under the method's source name.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::config::GeneratorConfig;
use crate::model::{ClassInfo, MethodInfo};
use crate::processor::BindingPlan;
use crate::processor::naming;
use crate::processor::overrides::OverrideRegistry;
use crate::processor::types::{self, ArgStrategy, ReturnStrategy};

/// Identifiers the wrapper signature and body already use.
const RESERVED_LOCALS: &[&str] = &["vm", "v", "argc", "result", "array", "item", "i"];

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

/// One VM-facing function and where it is registered.
struct Registration<'a> {
    class: &'a ClassInfo,
    method: &'a MethodInfo,
    vm_symbol: String,
    /// Statement body supplied by an override, replacing the generic one.
    custom_body: Option<String>,
}

pub fn render(
    plan: &BindingPlan,
    config: &GeneratorConfig,
    overrides: &OverrideRegistry,
    out: &mut impl Write,
) -> io::Result<()> {
    let registrations = plan_registrations(plan, config, overrides);
    let bound: Vec<&ClassInfo> = plan.classes.iter().filter(|c| !c.methods.is_empty()).collect();

    writeln!(out, "/*")?;
    writeln!(out, " * {} bindings for mruby/c.", config.vendor_display_name())?;
    writeln!(out, " * Auto-generated by mrbc-bindgen. DO NOT EDIT.")?;
    writeln!(out, " */\n")?;
    writeln!(out, "#include <stdbool.h>")?;
    writeln!(out, "#include <stddef.h>")?;
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out, "#include <mrubyc.h>\n")?;

    for class in &bound {
        writeln!(out, "static mrbc_class *{};", class_var(class))?;
    }
    writeln!(out)?;

    // Overridden methods declare their own externs inside the body.
    for reg in registrations.iter().filter(|r| r.custom_body.is_none()) {
        writeln!(
            out,
            "extern {} {}({});",
            types::native_return_type(&reg.method.return_type),
            naming::canonical_name(&config.vendor_prefix, &reg.class.name, reg.method),
            naming::parameter_list(reg.method)
        )?;
    }
    writeln!(out)?;

    for reg in &registrations {
        writeln!(
            out,
            "static void {}(mrbc_vm *vm, mrbc_value *v, int argc) {{",
            reg.vm_symbol
        )?;
        match &reg.custom_body {
            Some(body) => write!(out, "{body}")?,
            None => write_generic_body(out, config, reg)?,
        }
        writeln!(out, "}}\n")?;
    }

    writeln!(out, "void {}(mrbc_vm *vm) {{", config.gem_init_symbol())?;
    for class in &bound {
        writeln!(
            out,
            "  {} = mrbc_define_class(vm, \"{}\", mrbc_class_object);",
            class_var(class),
            naming::vm_class_name(&class.name)
        )?;
    }
    for reg in &registrations {
        writeln!(
            out,
            "  mrbc_define_method(vm, {}, \"{}\", {});",
            class_var(reg.class),
            reg.method.name,
            reg.vm_symbol
        )?;
    }
    writeln!(out, "}}")?;

    Ok(())
}

fn class_var(class: &ClassInfo) -> String {
    format!("c_{}", class.name)
}

fn plan_registrations<'a>(
    plan: &'a BindingPlan,
    config: &GeneratorConfig,
    overrides: &OverrideRegistry,
) -> Vec<Registration<'a>> {
    let mut symbols = VmSymbols::new(&config.vm_prefix);
    let mut registrations = Vec::new();

    for class in &plan.classes {
        for method in &class.methods {
            registrations.push(Registration {
                class,
                method,
                vm_symbol: symbols.claim(&class.name, method),
                custom_body: overrides.binding_for(&class.name, method),
            });
        }
    }
    registrations
}

/// Hands out VM wrapper symbols that are unique within one file.
struct VmSymbols<'a> {
    prefix: &'a str,
    used: HashSet<String>,
}

impl<'a> VmSymbols<'a> {
    fn new(prefix: &'a str) -> Self {
        Self {
            prefix,
            used: HashSet::new(),
        }
    }

    /// `{prefix}_{method}_{arity}`, then the class-qualified form, then a
    /// numeric suffix on the class-qualified form.
    fn claim(&mut self, class_name: &str, method: &MethodInfo) -> String {
        let plain = naming::vm_wrapper_name(self.prefix, method);
        if self.used.insert(plain.clone()) {
            return plain;
        }

        let qualified = format!(
            "{}_{}_{}_{}",
            self.prefix,
            class_name.to_lowercase(),
            method.name.to_lowercase(),
            method.arity()
        );
        let mut candidate = qualified.clone();
        let mut n = 2;
        while !self.used.insert(candidate.clone()) {
            candidate = format!("{qualified}_{n}");
            n += 1;
        }
        candidate
    }
}

fn write_generic_body(out: &mut impl Write, config: &GeneratorConfig, reg: &Registration<'_>) -> io::Result<()> {
    let method = reg.method;
    let locals = local_names(method);

    for (idx, (param, local)) in method.parameters.iter().zip(&locals).enumerate() {
        let storage = types::c_storage_type(&param.ty);
        let value = ArgStrategy::for_type(&param.ty).extract(&storage, idx + 1);
        writeln!(out, "  {storage} {local} = {value};")?;
    }

    let call = format!(
        "{}({})",
        naming::canonical_name(&config.vendor_prefix, &reg.class.name, method),
        locals.join(", ")
    );

    match ReturnStrategy::for_type(&method.return_type) {
        ReturnStrategy::Nil => {
            writeln!(out, "  {call};")?;
            writeln!(out, "  {}", ReturnStrategy::Nil.set(""))?;
        }
        strategy => {
            writeln!(out, "  {} result = {call};", types::c_storage_type(&method.return_type))?;
            writeln!(out, "  {}", strategy.set("result"))?;
        }
    }
    Ok(())
}

/// Sanitized parameter names, renamed where they would collide with the
/// wrapper's own identifiers.
/// Parameter names as C locals: a name that shadows a wrapper local gets
/// an `_arg` suffix, numbered if a sibling parameter already owns it.
fn local_names(method: &MethodInfo) -> Vec<String> {
    let names = naming::parameter_names(method);
    let mut taken: HashSet<String> = names.iter().cloned().collect();

    names
        .into_iter()
        .map(|name| {
            if !RESERVED_LOCALS.contains(&name.as_str()) {
                return name;
            }
            let mut candidate = format!("{name}_arg");
            let mut n = 2;
            while taken.contains(&candidate) {
                candidate = format!("{name}_arg{n}");
                n += 1;
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}
