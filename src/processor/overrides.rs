//! Hand-written escape hatches for methods the generic rules cannot bind.
//!
//! Entries are keyed by `"{class}::{method}"` lowercased, so one entry covers
//! every overload of a method. Custom entries receive the full `MethodInfo`
//! and return `None` for overloads they do not want, which sends those
//! overloads back to generic generation.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::{BindgenError, Result};
use crate::model::MethodInfo;

/// Produces code for one overload, or declines it.
pub type CodeGen = Box<dyn Fn(&MethodInfo) -> Option<String>>;

pub enum OverrideAction {
    /// Drop every overload of the method.
    Skip { reason: String },
    /// `native_wrapper` yields C++ emitted verbatim into the wrapper source.
    /// `binding` yields the statement body of the mruby/c wrapper function.
    Custom {
        native_wrapper: CodeGen,
        binding: CodeGen,
    },
}

impl fmt::Debug for OverrideAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideAction::Skip { reason } => f.debug_struct("Skip").field("reason", reason).finish(),
            OverrideAction::Custom { .. } => f.write_str("Custom { .. }"),
        }
    }
}

#[derive(Debug, Default)]
pub struct OverrideRegistry {
    entries: HashMap<String, OverrideAction>,
}

fn normalize_key(class_name: &str, method_name: &str) -> String {
    format!("{class_name}::{method_name}").to_lowercase()
}

impl OverrideRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds or replaces the entry for `class_name::method_name`.
    pub fn insert(&mut self, class_name: &str, method_name: &str, action: OverrideAction) {
        self.entries.insert(normalize_key(class_name, method_name), action);
    }

    pub fn has_override(&self, class_name: &str, method_name: &str) -> bool {
        self.entries.contains_key(&normalize_key(class_name, method_name))
    }

    pub fn action_for(&self, class_name: &str, method_name: &str) -> Option<&OverrideAction> {
        self.entries.get(&normalize_key(class_name, method_name))
    }

    pub fn skip_reason(&self, class_name: &str, method_name: &str) -> Option<&str> {
        match self.action_for(class_name, method_name) {
            Some(OverrideAction::Skip { reason }) => Some(reason),
            _ => None,
        }
    }

    pub fn native_wrapper_for(&self, class_name: &str, method: &MethodInfo) -> Option<String> {
        match self.action_for(class_name, &method.name) {
            Some(OverrideAction::Custom { native_wrapper, .. }) => native_wrapper(method),
            _ => None,
        }
    }

    pub fn binding_for(&self, class_name: &str, method: &MethodInfo) -> Option<String> {
        match self.action_for(class_name, &method.name) {
            Some(OverrideAction::Custom { binding, .. }) => binding(method),
            _ => None,
        }
    }

    /// Merges entries from a JSON override file over the current table.
    pub fn load_json(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path).map_err(|e| BindgenError::io(path, e))?;
        self.merge_json(&text).map_err(|message| BindgenError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn merge_json(&mut self, text: &str) -> std::result::Result<(), String> {
        let file: OverrideFile = serde_json::from_str(text).map_err(|e| e.to_string())?;

        for spec in file.overrides {
            match spec {
                OverrideSpec::Skip {
                    class,
                    method,
                    reason,
                } => {
                    debug!(%class, %method, "override file: skip");
                    self.insert(&class, &method, OverrideAction::Skip { reason });
                }
                OverrideSpec::Custom {
                    class,
                    method,
                    arity,
                    native_wrapper,
                    binding,
                } => {
                    debug!(%class, %method, ?arity, "override file: custom");
                    let accepts = move |m: &MethodInfo| arity.is_none_or(|n| m.arity() == n);
                    self.insert(
                        &class,
                        &method,
                        OverrideAction::Custom {
                            native_wrapper: Box::new(move |m| {
                                accepts(m).then(|| native_wrapper.clone())
                            }),
                            binding: Box::new(move |m| {
                                binding.clone().filter(|_| accepts(m))
                            }),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    /// The M5Unified table.
    pub fn builtin(config: &GeneratorConfig) -> Self {
        let mut registry = Self::empty();
        let prefix = config.vendor_prefix.as_str();

        let skips = [
            (
                "M5Unified",
                "dsp",
                "Multiple overloads with malformed parameter types. Use begin(config) instead.",
            ),
            ("M5Unified", "addDisplay", "Takes M5GFX& (object reference)"),
            ("Log_Class", "setDisplay", "Takes M5GFX& (object reference)"),
            ("RTC_Base", "getTime", "Returns rtc_time_t& (struct reference)"),
            ("RTC_Base", "getDate", "Returns rtc_date_t& (struct reference)"),
            ("RTC_Base", "getDateTime", "Returns rtc_datetime_t& (struct reference)"),
            ("RTC_Base", "setTime", "Takes rtc_time_t& (struct reference)"),
            ("RTC_Base", "setDate", "Takes rtc_date_t& (struct reference)"),
            ("RTC_Base", "setDateTime", "Takes rtc_datetime_t& (struct reference)"),
        ];
        for (class, method, reason) in skips {
            registry.insert(
                class,
                method,
                OverrideAction::Skip {
                    reason: reason.to_string(),
                },
            );
        }

        registry.insert("M5Unified", "begin", begin_override(prefix, &config.accessor_for("M5Unified")));
        registry.insert("LED_Class", "setAllColor", set_all_color_override(prefix, &config.accessor_for("LED_Class")));
        registry.insert("LED_Class", "setColor", set_color_override(prefix, &config.accessor_for("LED_Class")));

        let imu = config.accessor_for("IMU_Class");
        for (method, axes) in [
            ("getAccel", ["ax", "ay", "az"]),
            ("getGyro", ["gx", "gy", "gz"]),
            ("getMag", ["mx", "my", "mz"]),
        ] {
            registry.insert("IMU_Class", method, imu_vector_override(prefix, &imu, method, axes));
        }

        let rtc = config.accessor_for("RTC_Class");
        registry.insert(
            "RTC_Class",
            "getTime",
            rtc_array_override(
                prefix,
                &rtc,
                "getTime",
                "int8_t",
                "rtc_time_t time",
                &[("hours", "time.hours"), ("minutes", "time.minutes"), ("seconds", "time.seconds")],
            ),
        );
        registry.insert(
            "RTC_Class",
            "getDate",
            rtc_array_override(
                prefix,
                &rtc,
                "getDate",
                "int16_t",
                "rtc_date_t date",
                &[
                    ("year", "date.year"),
                    ("month", "date.month"),
                    ("date", "date.date"),
                    ("weekday", "date.weekDay"),
                ],
            ),
        );
        registry.insert(
            "RTC_Class",
            "getDateTime",
            rtc_array_override(
                prefix,
                &rtc,
                "getDateTime",
                "int16_t",
                "rtc_datetime_t dt",
                &[
                    ("year", "dt.date.year"),
                    ("month", "dt.date.month"),
                    ("date", "dt.date.date"),
                    ("weekday", "dt.date.weekDay"),
                    ("hours", "dt.time.hours"),
                    ("minutes", "dt.time.minutes"),
                    ("seconds", "dt.time.seconds"),
                ],
            ),
        );

        registry
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverrideFile {
    overrides: Vec<OverrideSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum OverrideSpec {
    Skip {
        class: String,
        method: String,
        reason: String,
    },
    Custom {
        class: String,
        method: String,
        #[serde(default)]
        arity: Option<usize>,
        native_wrapper: String,
        #[serde(default)]
        binding: Option<String>,
    },
}

// ── built-in custom entries ─────────────────────────────────────────────

/// `begin()` uses the default config; `begin(config_t)` falls through.
fn begin_override(prefix: &str, accessor: &str) -> OverrideAction {
    let native = format!(
        "extern \"C\" void {prefix}_m5unified_begin_void(void) {{\n  {accessor}.begin();\n}}\n"
    );
    OverrideAction::Custom {
        native_wrapper: Box::new(move |m| m.parameters.is_empty().then(|| native.clone())),
        binding: Box::new(|_| None),
    }
}

fn takes_rgb_color(m: &MethodInfo) -> bool {
    m.parameters.iter().any(|p| p.ty.contains("RGBColor"))
}

/// `setAllColor(const RGBColor&)` is exposed as `setAllColor(rgb888)`.
fn set_all_color_override(prefix: &str, accessor: &str) -> OverrideAction {
    let symbol = format!("{prefix}_led_class_setallcolor_uint32");
    let native = format!(
        "extern \"C\" void {symbol}(uint32_t rgb888) {{\n  {accessor}.setAllColor(rgb888);\n}}\n"
    );
    let binding = format!(
        "  extern void {symbol}(uint32_t rgb888);\n  uint32_t rgb888 = GET_INT_ARG(1);\n  {symbol}(rgb888);\n  SET_NIL_RETURN();\n"
    );
    OverrideAction::Custom {
        native_wrapper: Box::new(move |m| (m.arity() == 1 && takes_rgb_color(m)).then(|| native.clone())),
        binding: Box::new(move |m| (m.arity() == 1 && takes_rgb_color(m)).then(|| binding.clone())),
    }
}

/// `setColor(size_t, const RGBColor&)` is exposed as `setColor(index, rgb888)`.
fn set_color_override(prefix: &str, accessor: &str) -> OverrideAction {
    let symbol = format!("{prefix}_led_class_setcolor_size_t_uint32");
    let native = format!(
        "extern \"C\" void {symbol}(size_t index, uint32_t rgb888) {{\n  {accessor}.setColor(index, rgb888);\n}}\n"
    );
    let binding = format!(
        "  extern void {symbol}(size_t index, uint32_t rgb888);\n  size_t index = GET_INT_ARG(1);\n  uint32_t rgb888 = GET_INT_ARG(2);\n  {symbol}(index, rgb888);\n  SET_NIL_RETURN();\n"
    );
    OverrideAction::Custom {
        native_wrapper: Box::new(move |m| (m.arity() == 2 && takes_rgb_color(m)).then(|| native.clone())),
        binding: Box::new(move |m| (m.arity() == 2 && takes_rgb_color(m)).then(|| binding.clone())),
    }
}

/// `getAccel(float*, float*, float*)` and friends return `[x, y, z]` or nil.
fn imu_vector_override(prefix: &str, accessor: &str, method: &str, axes: [&str; 3]) -> OverrideAction {
    let symbol = format!("{prefix}_imu_class_{}_array", method.to_lowercase());
    let [a, b, c] = axes;
    let native = format!(
        "extern \"C\" int {symbol}(float* result) {{\n  float {a}, {b}, {c};\n  if ({accessor}.{method}(&{a}, &{b}, &{c})) {{\n    result[0] = {a};\n    result[1] = {b};\n    result[2] = {c};\n    return 1;\n  }}\n  return 0;\n}}\n"
    );
    let binding = format!(
        "  extern int {symbol}(float* result);\n  float result[3];\n  if ({symbol}(result)) {{\n    mrbc_value array = mrbc_array_new(vm, 3);\n    for (int i = 0; i < 3; i++) {{\n      mrbc_value item = mrbc_float_value(vm, result[i]);\n      mrbc_array_set(&array, i, &item);\n    }}\n    SET_RETURN(array);\n  }} else {{\n    SET_NIL_RETURN();\n  }}\n"
    );
    OverrideAction::Custom {
        native_wrapper: Box::new(move |m| (m.arity() == 3).then(|| native.clone())),
        binding: Box::new(move |m| (m.arity() == 3).then(|| binding.clone())),
    }
}

/// Zero-argument RTC getters that return a struct by value become integer
/// arrays in field order.
fn rtc_array_override(
    prefix: &str,
    accessor: &str,
    method: &str,
    element: &str,
    local: &str,
    fields: &[(&str, &str)],
) -> OverrideAction {
    let symbol = format!("{prefix}_rtc_class_{}_array", method.to_lowercase());
    let len = fields.len();

    let mut native = format!(
        "extern \"C\" int {symbol}({element}* result) {{\n  {local} = {accessor}.{method}();\n"
    );
    for (i, (_, expr)) in fields.iter().enumerate() {
        native.push_str(&format!("  result[{i}] = {expr};\n"));
    }
    native.push_str(&format!("  return {len};\n}}\n"));

    let binding = format!(
        "  extern int {symbol}({element}* result);\n  {element} result[{len}];\n  if ({symbol}(result)) {{\n    mrbc_value array = mrbc_array_new(vm, {len});\n    for (int i = 0; i < {len}; i++) {{\n      mrbc_value item = mrbc_integer_value(result[i]);\n      mrbc_array_set(&array, i, &item);\n    }}\n    SET_RETURN(array);\n  }} else {{\n    SET_NIL_RETURN();\n  }}\n"
    );

    OverrideAction::Custom {
        native_wrapper: Box::new(move |m| m.parameters.is_empty().then(|| native.clone())),
        binding: Box::new(move |m| m.parameters.is_empty().then(|| binding.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParameterInfo;

    fn registry() -> OverrideRegistry {
        OverrideRegistry::builtin(&GeneratorConfig::default())
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let r = registry();
        assert!(r.has_override("led_class", "SETALLCOLOR"));
        assert!(r.has_override("LED_Class", "setAllColor"));
        assert!(!r.has_override("LED_Class", "setBrightness"));
    }

    #[test]
    fn skip_entries_report_a_reason() {
        let r = registry();
        assert!(r.skip_reason("M5Unified", "addDisplay").unwrap().contains("M5GFX"));
        assert!(matches!(r.action_for("m5unified", "dsp"), Some(OverrideAction::Skip { .. })));
        assert_eq!(r.skip_reason("LED_Class", "setAllColor"), None);
    }

    #[test]
    fn custom_entries_discriminate_by_overload() {
        let r = registry();
        let default_begin = MethodInfo::new("begin", "void", vec![]);
        let config_begin = MethodInfo::new("begin", "void", vec![ParameterInfo::new("config_t", "cfg")]);

        let code = r.native_wrapper_for("M5Unified", &default_begin).unwrap();
        assert!(code.contains("m5unified_m5unified_begin_void(void)"));
        assert!(code.contains("M5.begin();"));
        assert_eq!(r.native_wrapper_for("M5Unified", &config_begin), None);
        assert_eq!(r.binding_for("M5Unified", &default_begin), None);
    }

    #[test]
    fn imu_override_only_claims_the_output_pointer_overload() {
        let r = registry();
        let floats = MethodInfo::new(
            "getAccel",
            "bool",
            ["ax", "ay", "az"].iter().map(|n| ParameterInfo::new("float*", *n)).collect(),
        );
        let native = r.native_wrapper_for("IMU_Class", &floats).unwrap();
        assert!(native.contains("M5.Imu.getAccel(&ax, &ay, &az)"));
        let binding = r.binding_for("IMU_Class", &floats).unwrap();
        assert!(binding.contains("mrbc_array_new(vm, 3)"));

        let no_args = MethodInfo::new("getAccel", "bool", vec![]);
        assert_eq!(r.native_wrapper_for("IMU_Class", &no_args), None);
    }

    #[test]
    fn json_entries_merge_over_builtins() {
        let mut r = registry();
        r.merge_json(
            r#"{
                "overrides": [
                    { "class": "Speaker_Class", "method": "tone", "action": "skip", "reason": "timing" },
                    { "class": "LED_Class", "method": "setAllColor", "action": "custom",
                      "arity": 1, "native_wrapper": "/* custom */" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(r.skip_reason("speaker_class", "TONE"), Some("timing"));

        let one = MethodInfo::new("setAllColor", "void", vec![ParameterInfo::new("uint32_t", "c")]);
        let two = MethodInfo::new(
            "setAllColor",
            "void",
            vec![ParameterInfo::new("uint8_t", "r"), ParameterInfo::new("uint8_t", "g")],
        );
        assert_eq!(r.native_wrapper_for("LED_Class", &one).as_deref(), Some("/* custom */"));
        assert_eq!(r.binding_for("LED_Class", &one), None);
        assert_eq!(r.native_wrapper_for("LED_Class", &two), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut r = OverrideRegistry::empty();
        assert!(r.merge_json(r#"{ "overrides": [ { "action": "explode" } ] }"#).is_err());
        assert!(r.is_empty());
    }
}
