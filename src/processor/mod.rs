//! The functional core: decides which parsed methods get bound and how.
//!
//! Nothing in here touches the filesystem. `run` prunes the parsed classes
//! down to what the writers should emit and tallies what was dropped.
pub mod naming;
pub mod overrides;
pub mod types;

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{ClassInfo, EnumInfo, MethodInfo};
use overrides::OverrideRegistry;

/// Read-only input for the writers.
#[derive(Debug, Clone)]
pub struct BindingPlan {
    /// Same classes, same order, with unbindable methods removed.
    pub classes: Vec<ClassInfo>,
    /// File-level enums, exposed as VM constants.
    pub enums: Vec<EnumInfo>,
    pub report: GenerationReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Methods with an unsupported return or parameter type. Those an
    /// override rescues are still bound and also counted in `rescued_count`.
    pub filtered_count: usize,
    /// Methods with a fully supported signature that will be bound.
    pub generated_count: usize,
    /// Unsupported methods bound anyway because an override supplies both
    /// the native wrapper and the VM binding.
    pub rescued_count: usize,
    /// Methods dropped by a `Skip` override.
    pub skipped_count: usize,
    /// Repeated declarations of a signature already seen in the same class,
    /// e.g. const and non-const overloads or a class parsed from two headers.
    pub duplicate_count: usize,
    /// Retained methods whose native wrapper comes from an override.
    pub overridden_count: usize,
    /// Distinct signatures that normalize to the same canonical symbol as
    /// an earlier overload; the later one is dropped.
    pub name_collisions: Vec<NameCollision>,
    /// Registrations replaced by a later method of the same name.
    pub shadowed: Vec<ShadowedMethod>,
}

impl GenerationReport {
    /// Methods that end up in the generated artifacts.
    pub fn bound_count(&self) -> usize {
        self.generated_count + self.rescued_count
    }
}

/// Two overloads whose parameter types differ but whose canonical names do
/// not, e.g. `print(char)` and `print(const char*)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    pub class: String,
    pub method: String,
    pub symbol: String,
    /// Raw parameter types of the overload that kept the symbol.
    pub kept: Vec<String>,
    /// Raw parameter types of the overload that was dropped.
    pub dropped: Vec<String>,
}

/// A method whose VM registration is overwritten, because mruby/c binds
/// methods by name and a later overload reuses the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShadowedMethod {
    pub class: String,
    pub method: String,
    pub arity: usize,
    /// Arity of the overload that stays reachable.
    pub winner_arity: usize,
}

/// Runs the filter pass and returns the plan the writers consume.
pub fn run(classes: &[ClassInfo], enums: &[EnumInfo], overrides: &OverrideRegistry) -> BindingPlan {
    let mut report = GenerationReport::default();

    let classes: Vec<ClassInfo> = merge_classes(classes, &mut report)
        .into_iter()
        .map(|class| {
            let methods = class
                .methods
                .into_iter()
                .filter(|method| keep_method(&class.name, method, overrides, &mut report))
                .collect();
            ClassInfo { methods, ..class }
        })
        .collect();

    for class in &classes {
        report.shadowed.extend(find_shadowed(class));
    }
    for s in &report.shadowed {
        warn!(
            class = %s.class,
            method = %s.method,
            arity = s.arity,
            winner_arity = s.winner_arity,
            "overload unreachable from the VM: a later registration of the same name wins"
        );
    }

    BindingPlan {
        classes,
        enums: enums.to_vec(),
        report,
    }
}

/// First `(type, category)` in the signature that cannot be bound.
pub fn first_unsupported(method: &MethodInfo) -> Option<(&str, types::TypeCategory)> {
    method
        .signature_types()
        .map(|ty| (ty, types::classify(ty)))
        .find(|(_, category)| category.is_unsupported())
}

/// Folds classes of the same name together and drops repeated signatures.
/// Two methods with one canonical name would define the same native
/// symbol, so only the first is kept. Identical raw parameter types are a
/// plain duplicate; anything else is a collision and is reported.
fn merge_classes(classes: &[ClassInfo], report: &mut GenerationReport) -> Vec<ClassInfo> {
    let mut merged: Vec<ClassInfo> = Vec::new();
    let mut seen: HashMap<(String, String), Vec<String>> = HashMap::new();

    for class in classes {
        let idx = match merged.iter().position(|c| c.name == class.name) {
            Some(idx) => idx,
            None => {
                merged.push(ClassInfo {
                    name: class.name.clone(),
                    methods: Vec::new(),
                    enums: class.enums.clone(),
                });
                merged.len() - 1
            }
        };

        for method in &class.methods {
            let symbol = naming::canonical_name("", &class.name, method);
            let types = raw_parameter_types(method);

            match seen.get(&(class.name.clone(), symbol.clone())) {
                None => {
                    seen.insert((class.name.clone(), symbol), types);
                    merged[idx].methods.push(method.clone());
                }
                Some(kept) if *kept == types => {
                    debug!(class = %class.name, method = %method.name, "duplicate signature dropped");
                    report.duplicate_count += 1;
                }
                Some(kept) => {
                    warn!(
                        class = %class.name,
                        method = %method.name,
                        kept = %kept.join(", "),
                        dropped = %types.join(", "),
                        "overload dropped: its canonical name collides with an earlier overload"
                    );
                    report.name_collisions.push(NameCollision {
                        class: class.name.clone(),
                        method: method.name.clone(),
                        symbol: symbol.trim_start_matches('_').to_string(),
                        kept: kept.clone(),
                        dropped: types,
                    });
                }
            }
        }
    }

    merged
}

/// Parameter types with whitespace squeezed, so `const char *` and
/// `const char*` compare equal.
fn raw_parameter_types(method: &MethodInfo) -> Vec<String> {
    method
        .parameters
        .iter()
        .map(|p| p.ty.split_whitespace().collect::<Vec<_>>().join(" ").replace(" *", "*").replace(" &", "&"))
        .collect()
}

fn keep_method(
    class_name: &str,
    method: &MethodInfo,
    overrides: &OverrideRegistry,
    report: &mut GenerationReport,
) -> bool {
    if let Some(reason) = overrides.skip_reason(class_name, &method.name) {
        debug!(class = class_name, method = %method.name, reason, "skipped by override");
        report.skipped_count += 1;
        return false;
    }

    let custom_native = overrides.native_wrapper_for(class_name, method).is_some();

    match first_unsupported(method) {
        None => {
            report.generated_count += 1;
            if custom_native {
                report.overridden_count += 1;
            }
            true
        }
        // An unsupported signature survives only when the override owns
        // both sides of the linkage for this exact overload.
        Some(_) if custom_native && overrides.binding_for(class_name, method).is_some() => {
            debug!(class = class_name, method = %method.name, "unsupported signature bound by override");
            report.filtered_count += 1;
            report.rescued_count += 1;
            report.overridden_count += 1;
            true
        }
        Some((ty, category)) => {
            debug!(
                class = class_name,
                method = %method.name,
                ty,
                category = category.describe(),
                "filtered unsupported method"
            );
            report.filtered_count += 1;
            false
        }
    }
}

fn find_shadowed(class: &ClassInfo) -> Vec<ShadowedMethod> {
    let mut shadowed = Vec::new();
    for (idx, method) in class.methods.iter().enumerate() {
        let winner = class.methods[idx + 1..]
            .iter()
            .rev()
            .find(|later| later.name == method.name);
        if let Some(winner) = winner {
            shadowed.push(ShadowedMethod {
                class: class.name.clone(),
                method: method.name.clone(),
                arity: method.arity(),
                winner_arity: winner.arity(),
            });
        }
    }
    shadowed
}
