//! AST parser over libclang, loaded at runtime.

use std::path::{Path, PathBuf};

use clang::{Accessibility, Clang, Entity, EntityKind, Index};
use tracing::debug;

use crate::error::{BindgenError, Result};
use crate::model::{ClassInfo, EnumInfo, EnumValue, MethodInfo, ParameterInfo};
use crate::parser::SignatureParser;

/// Holds the process-wide libclang instance for the whole run.
pub struct ClangParser {
    clang: Clang,
    args: Vec<String>,
}

impl ClangParser {
    pub fn new(include_paths: &[PathBuf]) -> Result<Self> {
        let clang = Clang::new().map_err(BindgenError::ParseUnavailable)?;

        let mut args = vec!["-x".to_string(), "c++".to_string(), "-std=c++17".to_string()];
        args.extend(include_paths.iter().map(|p| format!("-I{}", p.display())));

        Ok(Self { clang, args })
    }

    fn with_root<T>(&self, header: &Path, f: impl FnOnce(Entity<'_>) -> T) -> Result<T> {
        if !header.exists() {
            return Err(BindgenError::HeaderNotFound(header.to_path_buf()));
        }

        let index = Index::new(&self.clang, false, false);
        let unit = index
            .parser(header)
            .arguments(&self.args)
            .skip_function_bodies(true)
            .parse()
            .map_err(|e| BindgenError::Parse {
                path: header.to_path_buf(),
                message: e.to_string(),
            })?;

        debug!(header = %header.display(), "parsed translation unit");
        Ok(f(unit.get_entity()))
    }
}

impl SignatureParser for ClangParser {
    fn name(&self) -> &'static str {
        "libclang"
    }

    fn extract_classes(&self, header: &Path) -> Result<Vec<ClassInfo>> {
        self.with_root(header, |root| {
            let mut classes = Vec::new();
            collect_classes(root, &mut classes);
            classes
        })
    }

    fn extract_enums(&self, header: &Path) -> Result<Vec<EnumInfo>> {
        self.with_root(header, |root| {
            let mut enums = Vec::new();
            collect_file_enums(root, &mut enums);
            enums
        })
    }
}

/// Class and struct definitions from the header itself, descending into
/// namespaces but not into included files.
fn collect_classes(parent: Entity<'_>, out: &mut Vec<ClassInfo>) {
    for child in parent.get_children() {
        if !child.is_in_main_file() {
            continue;
        }
        match child.get_kind() {
            EntityKind::Namespace => collect_classes(child, out),
            EntityKind::ClassDecl | EntityKind::StructDecl if child.is_definition() => {
                let Some(name) = child.get_name() else {
                    continue;
                };
                out.push(ClassInfo {
                    name,
                    methods: methods_of(child),
                    enums: enums_in(child),
                });
            }
            _ => {}
        }
    }
}

fn collect_file_enums(parent: Entity<'_>, out: &mut Vec<EnumInfo>) {
    for child in parent.get_children() {
        if !child.is_in_main_file() {
            continue;
        }
        match child.get_kind() {
            EntityKind::Namespace => collect_file_enums(child, out),
            EntityKind::EnumDecl => out.extend(enum_info(child)),
            _ => {}
        }
    }
}

/// Public methods, plus those whose access libclang could not resolve.
fn methods_of(class: Entity<'_>) -> Vec<MethodInfo> {
    class
        .get_children()
        .into_iter()
        .filter(|c| c.get_kind() == EntityKind::Method)
        .filter(|c| matches!(c.get_accessibility(), None | Some(Accessibility::Public)))
        .filter_map(|method| {
            let name = method.get_name()?;
            let return_type = method.get_result_type()?.get_display_name();
            let parameters = method
                .get_arguments()
                .unwrap_or_default()
                .into_iter()
                .map(|arg| ParameterInfo {
                    ty: arg.get_type().map(|t| t.get_display_name()).unwrap_or_default(),
                    name: arg.get_name(),
                })
                .collect();

            Some(MethodInfo {
                name,
                return_type,
                parameters,
                is_static: method.is_static_method(),
            })
        })
        .collect()
}

fn enums_in(class: Entity<'_>) -> Vec<EnumInfo> {
    class
        .get_children()
        .into_iter()
        .filter(|c| c.get_kind() == EntityKind::EnumDecl)
        .filter_map(enum_info)
        .collect()
}

fn enum_info(decl: Entity<'_>) -> Option<EnumInfo> {
    let name = decl.get_name()?;
    let values = decl
        .get_children()
        .into_iter()
        .filter(|c| c.get_kind() == EntityKind::EnumConstantDecl)
        .filter_map(|c| {
            Some(EnumValue {
                name: c.get_name()?,
                value: c.get_enum_constant_value().map(|(signed, _)| signed),
            })
        })
        .collect();

    Some(EnumInfo {
        name,
        values,
        is_scoped: decl.is_scoped(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = r#"
        namespace m5 {
        enum board_t { board_unknown, board_M5Stack = 16, board_Core2 };

        class LED_Class {
        public:
          void begin(void);
          void setBrightness(int brightness);
          static bool isEnabled();
          enum class mode_t { off, on };
        private:
          void reset();
        };

        struct Point { float getX() const; };
        }
    "#;

    // libclang allows one live `Clang` per process, so everything is checked
    // from a single test. Without a loadable libclang there is nothing to test.
    #[test]
    fn extracts_public_shapes_like_the_regex_parser() {
        let Ok(parser) = ClangParser::new(&[]) else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("LED_Class.h");
        fs::write(&header, HEADER).unwrap();

        let classes = parser.extract_classes(&header).unwrap();
        let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["LED_Class", "Point"]);

        let led = &classes[0];
        let sigs: Vec<_> = led
            .methods
            .iter()
            .map(|m| (m.return_type.as_str(), m.name.as_str(), m.arity(), m.is_static))
            .collect();
        assert_eq!(
            sigs,
            vec![
                ("void", "begin", 0, false),
                ("void", "setBrightness", 1, false),
                ("bool", "isEnabled", 0, true),
            ]
        );
        assert_eq!(led.methods[1].parameters, vec![ParameterInfo::new("int", "brightness")]);
        assert_eq!(led.enums.len(), 1);
        assert_eq!(led.enums[0].name, "mode_t");
        assert!(led.enums[0].is_scoped);

        assert_eq!(classes[1].methods[0].return_type, "float");
        assert_eq!(classes[1].methods[0].name, "getX");

        let enums = parser.extract_enums(&header).unwrap();
        assert_eq!(enums.len(), 1);
        let values: Vec<_> = enums[0].values.iter().map(|v| (v.name.as_str(), v.value)).collect();
        assert_eq!(
            values,
            vec![("board_unknown", Some(0)), ("board_M5Stack", Some(16)), ("board_Core2", Some(17))]
        );
        assert!(!enums[0].is_scoped);

        let err = parser.extract_classes(&dir.path().join("Gone.h")).unwrap_err();
        assert!(matches!(err, BindgenError::HeaderNotFound(_)));
    }
}
