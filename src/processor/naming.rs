//! Naming authority.
//!
//! Every generator that emits a native symbol or a parameter list goes
//! through these functions. The `extern` declarations in the C bindings and
//! the definitions in the C++ wrapper are produced independently, so they
//! only link if both sides derive names here.

use crate::model::MethodInfo;

/// Returns `name` when it is usable as a C identifier, `param_{index}`
/// otherwise. Depends only on the parameter itself and its position.
pub fn sanitize_parameter_name(name: Option<&str>, index: usize) -> String {
    match name {
        Some(name) if !name.is_empty() && !has_invalid_chars(name) => name.to_string(),
        _ => format!("param_{index}"),
    }
}

fn has_invalid_chars(name: &str) -> bool {
    name.chars()
        .any(|c| c.is_whitespace() || matches!(c, '.' | '-' | '>' | '[' | ']' | '(' | ')'))
}

/// Turns a type spelling into an identifier fragment:
/// `const m5::rtc_time_t&` becomes `m5_rtc_time_t`.
pub fn normalize_type_for_naming(ty: &str) -> String {
    let ty = ty.trim();
    let ty = ty
        .strip_prefix("const")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .unwrap_or(ty);
    let ty = ty.trim_end_matches(|c: char| c == '&' || c == '*' || c.is_whitespace());

    let compact: String = ty.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .replace("::", "_")
        .replace(['<', '>', ','], "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

/// `{prefix}_{class}_{method}_{signature}` with everything lowercased.
/// Zero-parameter methods always end in `_void`.
pub fn canonical_name(prefix: &str, class_name: &str, method: &MethodInfo) -> String {
    let base = format!(
        "{prefix}_{}_{}",
        class_name.to_lowercase(),
        method.name.to_lowercase()
    );

    if method.parameters.is_empty() {
        return format!("{base}_void");
    }

    let signature = method
        .parameters
        .iter()
        .map(|p| normalize_type_for_naming(&p.ty))
        .collect::<Vec<_>>()
        .join("_");

    format!("{base}_{signature}")
}

/// `void`, or `"{raw_type} {sanitized_name}"` pairs joined by `, `.
pub fn parameter_list(method: &MethodInfo) -> String {
    if method.parameters.is_empty() {
        return "void".to_string();
    }

    method
        .parameters
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            format!(
                "{} {}",
                p.ty.trim(),
                sanitize_parameter_name(p.name.as_deref(), idx)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sanitized names only, for call sites.
pub fn call_argument_list(method: &MethodInfo) -> String {
    parameter_names(method).join(", ")
}

pub fn parameter_names(method: &MethodInfo) -> Vec<String> {
    method
        .parameters
        .iter()
        .enumerate()
        .map(|(idx, p)| sanitize_parameter_name(p.name.as_deref(), idx))
        .collect()
}

/// Base symbol of the VM-callable wrapper: `{vm_prefix}_{method}_{arity}`.
/// Arity lives here and not in the canonical name, so overloads of one
/// method get separate wrappers.
pub fn vm_wrapper_name(vm_prefix: &str, method: &MethodInfo) -> String {
    format!("{vm_prefix}_{}_{}", method.name.to_lowercase(), method.arity())
}

/// Class name as the VM sees it. Ruby constants must start uppercase.
pub fn vm_class_name(class_name: &str) -> String {
    let mut chars = class_name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
