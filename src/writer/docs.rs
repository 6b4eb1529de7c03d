//! `README.md` and the Ruby-side stub `mrblib/<lib>.rb`.
//!
//! The stub reopens each bound class to hold its enum constants; file-level
//! enums become top-level constants. Scoped enum members are prefixed with
//! the enum name since they would otherwise collide across enums.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use crate::config::GeneratorConfig;
use crate::model::EnumInfo;
use crate::processor::BindingPlan;
use crate::processor::naming;

pub fn emit_readme(plan: &BindingPlan, config: &GeneratorConfig, path: &Path) -> io::Result<()> {
    fs::write(path, render_readme(plan, config))
}

pub fn emit_mrblib(plan: &BindingPlan, config: &GeneratorConfig, path: &Path) -> io::Result<()> {
    fs::write(path, render_mrblib(plan, config))
}

pub fn render_readme(plan: &BindingPlan, config: &GeneratorConfig) -> String {
    let name = config.vendor_display_name();
    let mut s = format!("# {}\n\n{name} bindings for PicoRuby.\n\n## Classes\n\n", config.gem_name);

    for class in plan.classes.iter().filter(|c| !c.methods.is_empty()) {
        let _ = writeln!(s, "- {} ({} methods)", naming::vm_class_name(&class.name), class.methods.len());
    }

    let enum_count = plan.enums.len() + plan.classes.iter().map(|c| c.enums.len()).sum::<usize>();
    if enum_count > 0 {
        s.push_str("\n## Enums\n\n");
        for e in &plan.enums {
            let _ = writeln!(s, "- {}", e.name);
        }
        for class in &plan.classes {
            for e in &class.enums {
                let _ = writeln!(s, "- {}::{}", class.name, e.name);
            }
        }
    }

    let _ = write!(s, "\n## License\n\n{}\n", config.license);
    s
}

pub fn render_mrblib(plan: &BindingPlan, config: &GeneratorConfig) -> String {
    let mut s = format!(
        "# {} Ruby bindings\n# Auto-generated by mrbc-bindgen\n",
        config.vendor_display_name()
    );

    for e in &plan.enums {
        s.push('\n');
        write_constants(&mut s, e, "");
    }

    for class in &plan.classes {
        if class.methods.is_empty() && class.enums.is_empty() {
            continue;
        }
        let _ = write!(s, "\n# Class: {}\n", class.name);
        if class.enums.is_empty() {
            continue;
        }
        let _ = writeln!(s, "class {}", naming::vm_class_name(&class.name));
        for (idx, e) in class.enums.iter().enumerate() {
            if idx > 0 {
                s.push('\n');
            }
            write_constants(&mut s, e, "  ");
        }
        s.push_str("end\n");
    }

    s
}

fn write_constants(s: &mut String, e: &EnumInfo, indent: &str) {
    let _ = writeln!(s, "{indent}# enum {}", e.name);
    for value in &e.values {
        let Some(v) = value.value else {
            continue;
        };
        let Some(name) = constant_name(e, &value.name) else {
            continue;
        };
        let _ = writeln!(s, "{indent}{name} = {v}");
    }
}

/// Upper-cased Ruby constant, or `None` if it cannot start with a letter.
fn constant_name(e: &EnumInfo, member: &str) -> Option<String> {
    let name = if e.is_scoped {
        format!("{}_{}", e.name, member)
    } else {
        member.to_string()
    };
    name.starts_with(|c: char| c.is_ascii_alphabetic())
        .then(|| name.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassInfo, EnumValue, MethodInfo};
    use crate::processor::{self, overrides::OverrideRegistry};
    use pretty_assertions::assert_eq;

    fn value(name: &str, value: Option<i64>) -> EnumValue {
        EnumValue {
            name: name.to_string(),
            value,
        }
    }

    fn plan() -> BindingPlan {
        let mut button = ClassInfo::new("Button_Class").with_methods(vec![MethodInfo::new("isPressed", "bool", vec![])]);
        button.enums.push(EnumInfo {
            name: "button_state_t".into(),
            values: vec![value("state_nochange", Some(0)), value("state_clicked", Some(1))],
            is_scoped: false,
        });
        let board = EnumInfo {
            name: "board_t".into(),
            values: vec![
                value("board_unknown", Some(0)),
                value("board_M5Stack", Some(16)),
                value("computed", None),
            ],
            is_scoped: true,
        };
        processor::run(&[button], &[board], &OverrideRegistry::empty())
    }

    #[test]
    fn mrblib_holds_enum_constants() {
        let rb = render_mrblib(&plan(), &GeneratorConfig::default());
        assert_eq!(
            rb,
            "# M5Unified Ruby bindings\n# Auto-generated by mrbc-bindgen\n\n# enum board_t\nBOARD_T_BOARD_UNKNOWN = 0\nBOARD_T_BOARD_M5STACK = 16\n\n# Class: Button_Class\nclass Button_Class\n  # enum button_state_t\n  STATE_NOCHANGE = 0\n  STATE_CLICKED = 1\nend\n"
        );
    }

    #[test]
    fn readme_lists_classes_and_enums() {
        let md = render_readme(&plan(), &GeneratorConfig::default());
        assert!(md.starts_with("# picoruby-m5unified\n\nM5Unified bindings for PicoRuby.\n"));
        assert!(md.contains("- Button_Class (1 methods)\n"));
        assert!(md.contains("- board_t\n"));
        assert!(md.contains("- Button_Class::button_state_t\n"));
        assert!(md.ends_with("## License\n\nMIT\n"));
    }

    #[test]
    fn constants_must_start_with_a_letter() {
        let e = EnumInfo {
            name: "x".into(),
            values: vec![],
            is_scoped: false,
        };
        assert_eq!(constant_name(&e, "_hidden"), None);
        assert_eq!(constant_name(&e, "on"), Some("ON".to_string()));
    }
}
