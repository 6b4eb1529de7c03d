//! Regex parser, used when libclang is not available.
//!
//! It only understands single-line `RET NAME(PARAMS);` declarations inside
//! `class|struct NAME { ... }` blocks, and a class body ends at its first
//! closing brace. Templates, multi-line signatures and macro-generated
//! declarations are not seen at all. Access specifiers are ignored, so
//! private methods are reported too.

use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::header::read_header;
use crate::model::{ClassInfo, EnumInfo, EnumValue, MethodInfo, ParameterInfo};
use crate::parser::SignatureParser;

static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//[^\n]*").unwrap());

static CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(enum\s+)?(?:class|struct)\s+(\w+)(?:\s+final)?\s*(?::[^{;]*)?\{([^}]*)\}").unwrap()
});

static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(static\s+)?((?:const\s+)?(?:(?:unsigned|signed)\s+)?(?:(?:long|short)\s+)*\w+(?:::\w+)*)(\s*[*&]+\s*|\s+)(\w+)\s*\(([^)]*)\)\s*(?:const\s*)?(?:override\s*)?(?:=\s*0\s*)?;",
    )
    .unwrap()
});

static ENUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\benum\s+(class\s+|struct\s+)?(\w+)\s*(?::\s*[\w:\s]+?)?\s*\{([^}]*)\}").unwrap()
});

/// Words the method pattern can mistake for a return type.
const NOT_A_TYPE: &[&str] = &[
    "return", "delete", "new", "else", "throw", "case", "goto", "using", "typedef", "friend",
    "explicit", "virtual", "inline", "operator", "public", "private", "protected",
];

#[derive(Debug, Default)]
pub struct RegexParser;

impl RegexParser {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureParser for RegexParser {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn extract_classes(&self, header: &Path) -> Result<Vec<ClassInfo>> {
        let source = read_header(header)?;
        Ok(parse_source(&source).0)
    }

    fn extract_enums(&self, header: &Path) -> Result<Vec<EnumInfo>> {
        let source = read_header(header)?;
        Ok(parse_source(&source).1)
    }
}

/// Classes (with their nested enums) and file-level enums in `source`.
pub fn parse_source(source: &str) -> (Vec<ClassInfo>, Vec<EnumInfo>) {
    let source = strip_comments(source);

    let mut classes = Vec::new();
    let mut spans: Vec<Range<usize>> = Vec::new();

    for caps in CLASS.captures_iter(&source) {
        if caps.get(1).is_some() {
            continue; // `enum class`
        }
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let name = &caps[2];
        let body = &caps[3];

        let methods = parse_methods(body);
        if methods.is_empty() && body.contains('(') {
            debug!(class = name, "no declarations recognised in class body");
        }

        classes.push(ClassInfo {
            name: name.to_string(),
            methods,
            enums: Vec::new(),
        });
        spans.push(whole);
    }

    let mut file_enums = Vec::new();
    for caps in ENUM.captures_iter(&source) {
        let start = caps.get(0).map_or(0, |m| m.start());
        let info = EnumInfo {
            name: caps[2].to_string(),
            values: parse_enum_values(&caps[3]),
            is_scoped: caps.get(1).is_some(),
        };

        match spans.iter().position(|span| span.contains(&start)) {
            Some(idx) => classes[idx].enums.push(info),
            None => file_enums.push(info),
        }
    }

    let multi_line = source
        .lines()
        .filter(|l| l.matches('(').count() > l.matches(')').count())
        .count();
    if multi_line > 0 {
        warn!(lines = multi_line, "multi-line declarations are invisible to the regex parser");
    }

    (classes, file_enums)
}

fn strip_comments(source: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(source, " ");
    LINE_COMMENT.replace_all(&without_blocks, "").into_owned()
}

fn parse_methods(body: &str) -> Vec<MethodInfo> {
    METHOD
        .captures_iter(body)
        .filter_map(|caps| {
            let base = caps[2].trim();
            if NOT_A_TYPE.contains(&base) {
                return None;
            }
            // `char *name(` binds the pointer to the name; move it onto the type.
            let return_type = format!("{base}{}", caps[3].trim());
            Some(MethodInfo {
                name: caps[4].to_string(),
                return_type,
                parameters: parse_parameters(&caps[5]),
                is_static: caps.get(1).is_some(),
            })
        })
        .collect()
}

/// `int x, const char* name = "a"` → `[(int, x), (const char*, name)]`.
/// An array parameter `uint8_t buf[4]` decays to `(uint8_t*, buf)`.
pub fn parse_parameters(list: &str) -> Vec<ParameterInfo> {
    let list = list.trim();
    if list.is_empty() || list == "void" {
        return Vec::new();
    }

    split_top_level(list)
        .into_iter()
        .filter_map(|param| {
            let decl = param.split('=').next().unwrap_or("").trim();
            if decl.is_empty() {
                return None;
            }

            let tokens: Vec<&str> = decl.split_whitespace().collect();
            let Some((last, leading)) = tokens.split_last() else {
                return None;
            };
            if leading.is_empty() {
                return Some(ParameterInfo::unnamed(*last));
            }

            let mut ty = leading.join(" ");
            let mut name = last.trim_start_matches(|c: char| {
                if c == '*' || c == '&' {
                    ty.push(c);
                    true
                } else {
                    false
                }
            });
            if let Some((base, _extent)) = name.split_once('[') {
                name = base;
                ty.push('*');
            }

            Some(if name.is_empty() {
                ParameterInfo::unnamed(ty)
            } else {
                ParameterInfo::new(ty, name)
            })
        })
        .collect()
}

/// Splits on commas that are not inside `<...>` or `(...)`.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

fn parse_enum_values(body: &str) -> Vec<EnumValue> {
    let mut values: Vec<EnumValue> = Vec::new();
    let mut next = Some(0i64);

    for item in body.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (name, init) = match item.split_once('=') {
            Some((name, init)) => (name.trim(), Some(init.trim())),
            None => (item, None),
        };
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }

        let value = match init {
            None => next,
            Some(expr) => parse_int(expr).or_else(|| {
                values.iter().find(|v| v.name == expr).and_then(|v| v.value)
            }),
        };
        next = value.and_then(|v| v.checked_add(1));
        values.push(EnumValue {
            name: name.to_string(),
            value,
        });
    }

    values
}

fn parse_int(expr: &str) -> Option<i64> {
    let (negative, digits) = match expr.strip_prefix('-') {
        Some(rest) => (true, rest.trim()),
        None => (false, expr),
    };
    let digits = digits.trim_end_matches(['u', 'U', 'l', 'L']);
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindgenError;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_classes_methods_and_parameters() {
        let src = r#"
            // LED control
            class LED_Class : public Base {
            public:
              void begin(void);
              void setBrightness(uint8_t brightness);
              const char* getName() const;
              static bool isEnabled();
              void setColor(size_t index, const RGBColor &color);
            };
        "#;

        let (classes, enums) = parse_source(src);
        assert!(enums.is_empty());
        assert_eq!(classes.len(), 1);

        let led = &classes[0];
        assert_eq!(led.name, "LED_Class");
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
                ("const char*", "getName", 0, false),
                ("bool", "isEnabled", 0, true),
                ("void", "setColor", 2, false),
            ]
        );
        assert_eq!(
            led.methods[4].parameters,
            vec![
                ParameterInfo::new("size_t", "index"),
                ParameterInfo::new("const RGBColor&", "color"),
            ]
        );
    }

    #[test]
    fn parameters_split_on_whitespace_and_commas() {
        assert_eq!(
            parse_parameters("int x, char *text, uint32_t, bool flag = true"),
            vec![
                ParameterInfo::new("int", "x"),
                ParameterInfo::new("char*", "text"),
                ParameterInfo::unnamed("uint32_t"),
                ParameterInfo::new("bool", "flag"),
            ]
        );
        assert_eq!(
            parse_parameters("std::map<int, int> table, int n"),
            vec![
                ParameterInfo::new("std::map<int, int>", "table"),
                ParameterInfo::new("int", "n"),
            ]
        );
        assert!(parse_parameters(" void ").is_empty());
    }

    #[test]
    fn pointer_marks_and_multi_word_types_stay_on_the_type() {
        let src = r#"
            class Clock_Class {
            public:
              const char *getName();
              unsigned long long micros();
              long long int offset();
              void fill(uint8_t buf[4], size_t len);
            };
        "#;

        let (classes, _) = parse_source(src);
        let sigs: Vec<_> = classes[0]
            .methods
            .iter()
            .map(|m| (m.return_type.as_str(), m.name.as_str()))
            .collect();
        assert_eq!(
            sigs,
            vec![
                ("const char*", "getName"),
                ("unsigned long long", "micros"),
                ("long long int", "offset"),
                ("void", "fill"),
            ]
        );
        assert_eq!(
            classes[0].methods[3].parameters,
            vec![
                ParameterInfo::new("uint8_t*", "buf"),
                ParameterInfo::new("size_t", "len"),
            ]
        );
    }

    #[test]
    fn statements_in_inline_bodies_are_not_methods() {
        let src = "struct Counter { int get() { return value(1); } };";
        let (classes, _) = parse_source(src);
        let names: Vec<_> = classes[0].methods.iter().map(|m| m.name.as_str()).collect();
        assert!(!names.contains(&"value"));
    }

    #[test]
    fn enum_class_is_not_a_class() {
        let src = "enum class Mode { A, B };\nstruct Point { int getX(); };";
        let (classes, enums) = parse_source(src);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "Point");
        assert_eq!(enums.len(), 1);
        assert!(enums[0].is_scoped);
    }

    #[test]
    fn enum_values_are_resolved_when_possible() {
        let src = "enum board_t : uint8_t { board_unknown, board_M5Stack = 0x10, board_Core2, alias = board_M5Stack, odd = FOO(1) };";
        let (_, enums) = parse_source(src);
        let values: Vec<_> = enums[0].values.iter().map(|v| (v.name.as_str(), v.value)).collect();
        assert_eq!(
            values,
            vec![
                ("board_unknown", Some(0)),
                ("board_M5Stack", Some(16)),
                ("board_Core2", Some(17)),
                ("alias", Some(16)),
                ("odd", None),
            ]
        );
    }

    #[test]
    fn nested_enums_attach_to_their_class() {
        let src = "class Button_Class { enum state_t { none, pressed }; bool isPressed(); };";
        let (classes, file_enums) = parse_source(src);
        assert!(file_enums.is_empty());
        assert_eq!(classes[0].enums.len(), 1);
        assert_eq!(classes[0].enums[0].name, "state_t");
    }

    #[test]
    fn missing_header_is_reported() {
        let err = RegexParser::new()
            .extract_classes(Path::new("/definitely/not/here.h"))
            .unwrap_err();
        assert!(matches!(err, BindgenError::HeaderNotFound(_)));
    }
}
