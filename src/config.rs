//! Vendor-specific knobs for the generated gem.
//!
//! Defaults target M5Unified on ESP32. A JSON file can override any subset
//! of the fields; missing fields keep their defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{BindgenError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Prefix of every canonical `extern "C"` symbol.
    pub vendor_prefix: String,
    /// Prefix of the static VM-callable wrapper functions.
    pub vm_prefix: String,
    /// mrbgem name, e.g. `picoruby-m5unified`.
    pub gem_name: String,
    /// Base name of the generated source files (`src/{name}.c` ...).
    pub library_name: String,
    /// Header the native wrapper includes.
    pub vendor_header: String,
    /// ESP-IDF component the wrapper links against.
    pub sdk_component: String,
    /// Hardware port subdirectory under `ports/`.
    pub port: String,
    /// Global object through which vendor methods are reached.
    pub vendor_object: String,
    /// Class name → C++ expression for classes not reachable as
    /// `{vendor_object}.{class}`.
    pub accessors: BTreeMap<String, String>,
    pub license: String,
    pub author: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let accessors = [
            ("M5Unified", "M5"),
            ("LED_Class", "M5.Led"),
            ("IMU_Class", "M5.Imu"),
            ("RTC_Class", "M5.Rtc"),
            ("Power_Class", "M5.Power"),
            ("Speaker_Class", "M5.Speaker"),
            ("Mic_Class", "M5.Mic"),
            ("Touch_Class", "M5.Touch"),
            ("Log_Class", "M5.Log"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            vendor_prefix: "m5unified".into(),
            vm_prefix: "mrbc_m5".into(),
            gem_name: "picoruby-m5unified".into(),
            library_name: "m5unified".into(),
            vendor_header: "M5Unified.h".into(),
            sdk_component: "m5unified".into(),
            port: "esp32".into(),
            vendor_object: "M5".into(),
            accessors,
            license: "MIT".into(),
            author: "mrbc-bindgen".into(),
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| BindgenError::io(path, e))?;
        Self::from_json(&text).map_err(|message| BindgenError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// C++ expression that reaches an instance of `class_name`.
    pub fn accessor_for(&self, class_name: &str) -> String {
        self.accessors
            .get(class_name)
            .cloned()
            .unwrap_or_else(|| format!("{}.{}", self.vendor_object, class_name))
    }

    /// Library name as written in prose: the vendor header without extension.
    pub fn vendor_display_name(&self) -> &str {
        self.vendor_header
            .rsplit_once('.')
            .map_or(self.vendor_header.as_str(), |(stem, _)| stem)
    }

    /// Symbol of the gem init function mruby/c calls at boot.
    pub fn gem_init_symbol(&self) -> String {
        format!("mrbc_mrbgem_{}_gem_init", self.gem_name.replace('-', "_"))
    }
}
