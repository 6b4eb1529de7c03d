//! Type classifier: decides which C++ type spellings can cross the mruby/c
//! boundary and how.
//!
//! Everything here is a pure function of the raw type string. The processor
//! only asks whether a type is unsupported; the emitters ask for the
//! marshalling strategies of types that passed.

/// Outcome of classifying one raw type spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Void,
    PrimitiveInt,
    PrimitiveFloat,
    PrimitiveBool,
    CString,
    UnsupportedObjectRef,
    UnsupportedStructRef,
    UnsupportedFunctionPointer,
    UnsupportedTemplate,
    UnsupportedRvalueRef,
    UnsupportedPointerArray,
    UnsupportedMalformed,
    /// Any other pointer or reference; travels through the VM as an integer.
    OpaquePointer,
}

impl TypeCategory {
    pub fn is_unsupported(self) -> bool {
        matches!(
            self,
            TypeCategory::UnsupportedObjectRef
                | TypeCategory::UnsupportedStructRef
                | TypeCategory::UnsupportedFunctionPointer
                | TypeCategory::UnsupportedTemplate
                | TypeCategory::UnsupportedRvalueRef
                | TypeCategory::UnsupportedPointerArray
                | TypeCategory::UnsupportedMalformed
        )
    }

    /// Short human description used in filter logs.
    pub fn describe(self) -> &'static str {
        match self {
            TypeCategory::Void => "void",
            TypeCategory::PrimitiveInt => "integer",
            TypeCategory::PrimitiveFloat => "float",
            TypeCategory::PrimitiveBool => "bool",
            TypeCategory::CString => "C string",
            TypeCategory::UnsupportedObjectRef => "object reference",
            TypeCategory::UnsupportedStructRef => "struct reference",
            TypeCategory::UnsupportedFunctionPointer => "function pointer",
            TypeCategory::UnsupportedTemplate => "template",
            TypeCategory::UnsupportedRvalueRef => "rvalue reference",
            TypeCategory::UnsupportedPointerArray => "pointer to numeric array",
            TypeCategory::UnsupportedMalformed => "malformed type",
            TypeCategory::OpaquePointer => "opaque pointer",
        }
    }
}

/// Vendor classes that do not follow the `M5*` / `*_Class` / `*_Base` naming.
const KNOWN_VENDOR_CLASSES: &[&str] = &["LGFX_Device", "LGFX_Sprite", "LovyanGFX", "Stream", "Print"];

/// Plain structs that do not follow the `*_t` naming.
const KNOWN_STRUCTS: &[&str] = &["RGBColor", "tm", "timeval"];

const INTEGER_TYPES: &[&str] = &[
    "char",
    "signed char",
    "unsigned char",
    "short",
    "unsigned short",
    "int",
    "unsigned",
    "unsigned int",
    "long",
    "unsigned long",
    "long long",
    "unsigned long long",
    "size_t",
    "ssize_t",
    "intptr_t",
    "uintptr_t",
];

/// Classifies a raw type spelling. First matching rule wins.
pub fn classify(raw: &str) -> TypeCategory {
    let ty = squash(raw);

    if ty.contains('.') || ty.contains("->") {
        return TypeCategory::UnsupportedMalformed;
    }
    if ty.contains("(*") {
        return TypeCategory::UnsupportedFunctionPointer;
    }
    if ty.ends_with("&&") {
        return TypeCategory::UnsupportedRvalueRef;
    }
    if ty.contains('<') && ty.contains('>') {
        return TypeCategory::UnsupportedTemplate;
    }

    let bare = strip_const(&ty);

    if let Some(base) = bare.strip_suffix('&') {
        let name = last_segment(strip_const(base));
        if is_vendor_object(name) {
            return TypeCategory::UnsupportedObjectRef;
        }
        if is_pod_struct(name) {
            return TypeCategory::UnsupportedStructRef;
        }
    }

    if let Some(element) = bare.strip_suffix('*') {
        let element = strip_const(element);
        if is_numeric(element) {
            return TypeCategory::UnsupportedPointerArray;
        }
    }

    let normalized = normalize(raw);
    match normalized.as_str() {
        "void" => TypeCategory::Void,
        "bool" => TypeCategory::PrimitiveBool,
        "float" | "double" => TypeCategory::PrimitiveFloat,
        "char*" => TypeCategory::CString,
        t if is_integer(t) => TypeCategory::PrimitiveInt,
        t if t.ends_with('*') || bare.ends_with('&') => TypeCategory::OpaquePointer,
        _ => TypeCategory::PrimitiveInt,
    }
}

/// True when `raw` cannot cross the VM boundary without an override.
pub fn is_unsupported(raw: &str) -> bool {
    classify(raw).is_unsupported()
}

/// `const` and a trailing `&` removed, whitespace before sigils squashed:
/// `const char *` becomes `char*`, `const int&` becomes `int`.
pub fn normalize(raw: &str) -> String {
    let ty = squash(raw);
    let ty = strip_const(&ty);
    let ty = ty.strip_suffix('&').unwrap_or(ty);
    strip_const(ty).to_string()
}

/// How an argument is pulled off the mruby/c stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgStrategy {
    Int,
    Float,
    String,
    Bool,
    Pointer,
}

impl ArgStrategy {
    pub fn for_type(raw: &str) -> Self {
        match classify(raw) {
            TypeCategory::PrimitiveFloat => ArgStrategy::Float,
            TypeCategory::CString => ArgStrategy::String,
            TypeCategory::PrimitiveBool => ArgStrategy::Bool,
            TypeCategory::OpaquePointer => ArgStrategy::Pointer,
            _ => ArgStrategy::Int,
        }
    }

    /// C expression reading stack slot `index` (1-based) as `c_type`.
    pub fn extract(self, c_type: &str, index: usize) -> String {
        match self {
            ArgStrategy::Int => format!("GET_INT_ARG({index})"),
            ArgStrategy::Float => format!("GET_FLOAT_ARG({index})"),
            ArgStrategy::String => format!("(const char *)GET_STRING_ARG({index})"),
            ArgStrategy::Bool => format!("(v[{index}].tt == MRBC_TT_TRUE) ? 1 : 0"),
            ArgStrategy::Pointer => format!("({c_type})(intptr_t)GET_INT_ARG({index})"),
        }
    }
}

/// How a native result is handed back to the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnStrategy {
    Nil,
    Bool,
    Int,
    Float,
    String,
    Pointer,
}

impl ReturnStrategy {
    pub fn for_type(raw: &str) -> Self {
        match classify(raw) {
            TypeCategory::Void => ReturnStrategy::Nil,
            TypeCategory::PrimitiveBool => ReturnStrategy::Bool,
            TypeCategory::PrimitiveFloat => ReturnStrategy::Float,
            TypeCategory::CString => ReturnStrategy::String,
            TypeCategory::OpaquePointer => ReturnStrategy::Pointer,
            _ => ReturnStrategy::Int,
        }
    }

    /// Statement that stores `value` as the method result.
    pub fn set(self, value: &str) -> String {
        match self {
            ReturnStrategy::Nil => "SET_NIL_RETURN();".to_string(),
            ReturnStrategy::Bool => format!("SET_BOOL_RETURN({value});"),
            ReturnStrategy::Int => format!("SET_INT_RETURN({value});"),
            ReturnStrategy::Float => format!("SET_FLOAT_RETURN({value});"),
            ReturnStrategy::String => {
                format!("SET_RETURN(mrbc_string_new_cstr(vm, {value}));")
            }
            ReturnStrategy::Pointer => format!("SET_INT_RETURN((mrbc_int_t)(intptr_t){value});"),
        }
    }
}

/// Type of the local that holds an argument or result in the C binding.
pub fn c_storage_type(raw: &str) -> String {
    match classify(raw) {
        TypeCategory::PrimitiveBool => "int".to_string(),
        TypeCategory::PrimitiveInt | TypeCategory::PrimitiveFloat => normalize(raw),
        TypeCategory::CString => "const char*".to_string(),
        _ => raw.trim().to_string(),
    }
}

/// Return type used on the native C boundary; `bool` travels as `int` and
/// numbers are returned by value.
pub fn native_return_type(raw: &str) -> String {
    match classify(raw) {
        TypeCategory::PrimitiveBool => "int".to_string(),
        TypeCategory::PrimitiveInt | TypeCategory::PrimitiveFloat => normalize(raw),
        _ => raw.trim().to_string(),
    }
}

fn squash(raw: &str) -> String {
    let words: Vec<&str> = raw.split_whitespace().collect();
    words
        .join(" ")
        .replace(" *", "*")
        .replace(" &", "&")
}

fn strip_const(ty: &str) -> &str {
    let ty = ty.trim();
    let ty = ty.strip_prefix("const ").unwrap_or(ty);
    ty.strip_suffix(" const").unwrap_or(ty).trim()
}

fn last_segment(ty: &str) -> &str {
    ty.rsplit("::").next().unwrap_or(ty)
}

fn is_vendor_object(name: &str) -> bool {
    name.starts_with("M5")
        || name.starts_with("LGFX")
        || name.ends_with("_Class")
        || name.ends_with("_Base")
        || KNOWN_VENDOR_CLASSES.contains(&name)
}

fn is_pod_struct(name: &str) -> bool {
    (name.ends_with("_t") && !is_integer(name)) || KNOWN_STRUCTS.contains(&name)
}

fn is_integer(ty: &str) -> bool {
    let ty = last_segment(ty);
    INTEGER_TYPES.contains(&ty) || is_fixed_width(ty)
}

/// `int8_t` .. `uint64_t`, including the `_fast` / `_least` families.
fn is_fixed_width(ty: &str) -> bool {
    let Some(rest) = ty.strip_suffix("_t") else {
        return false;
    };
    let rest = rest.strip_prefix('u').unwrap_or(rest);
    let Some(rest) = rest.strip_prefix("int") else {
        return false;
    };
    let width = rest
        .strip_prefix("_fast")
        .or_else(|| rest.strip_prefix("_least"))
        .unwrap_or(rest);
    matches!(width, "8" | "16" | "32" | "64")
}

fn is_numeric(element: &str) -> bool {
    element != "char"
        && (is_integer(element) || matches!(element, "float" | "double" | "bool"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_table() {
        let unsupported = [
            "M5GFX&",
            "rtc_time_t&",
            "void (*)(int)",
            "Type&&",
            "std::function<void()>",
            "cfg.atom_display",
            "const uint8_t*",
        ];
        for ty in unsupported {
            assert!(is_unsupported(ty), "{ty} should be unsupported");
        }

        for ty in ["int", "float", "bool", "char*", "size_t"] {
            assert!(!is_unsupported(ty), "{ty} should be supported");
        }
    }

    #[test]
    fn rule_order_decides_the_variant() {
        use TypeCategory::*;
        let cases = [
            ("cfg->display", UnsupportedMalformed),
            ("void (*callback)(int)", UnsupportedFunctionPointer),
            ("std::string&&", UnsupportedRvalueRef),
            ("CustomTemplate<int>", UnsupportedTemplate),
            ("const m5::M5GFX &", UnsupportedObjectRef),
            ("LED_Class&", UnsupportedObjectRef),
            ("RTC_Base&", UnsupportedObjectRef),
            ("const RGBColor&", UnsupportedStructRef),
            ("m5::rtc_date_t&", UnsupportedStructRef),
            ("float*", UnsupportedPointerArray),
            ("int16_t *", UnsupportedPointerArray),
        ];
        for (ty, expected) in cases {
            assert_eq!(classify(ty), expected, "{ty}");
        }
    }

    #[test]
    fn supported_categories() {
        use TypeCategory::*;
        let cases = [
            ("void", Void),
            ("const int", PrimitiveInt),
            ("int&", PrimitiveInt),
            ("uint32_t&", PrimitiveInt),
            ("int_fast8_t", PrimitiveInt),
            ("unsigned long", PrimitiveInt),
            ("m5::board_t", PrimitiveInt),
            ("double", PrimitiveFloat),
            ("const bool&", PrimitiveBool),
            ("const char *", CString),
            ("char*", CString),
            ("void*", OpaquePointer),
            ("Foo*", OpaquePointer),
            ("Foo&", OpaquePointer),
        ];
        for (ty, expected) in cases {
            assert_eq!(classify(ty), expected, "{ty}");
        }
    }

    #[test]
    fn bool_is_int_on_the_native_boundary() {
        assert_eq!(native_return_type("bool"), "int");
        assert_eq!(c_storage_type("bool"), "int");
        assert_eq!(ReturnStrategy::for_type("bool").set("result"), "SET_BOOL_RETURN(result);");
        assert_eq!(ArgStrategy::for_type("bool"), ArgStrategy::Bool);
    }

    #[test]
    fn marshalling_strategies() {
        assert_eq!(ArgStrategy::for_type("uint8_t").extract("uint8_t", 1), "GET_INT_ARG(1)");
        assert_eq!(ArgStrategy::for_type("double").extract("double", 2), "GET_FLOAT_ARG(2)");
        assert_eq!(
            ArgStrategy::for_type("const char*").extract("const char*", 1),
            "(const char *)GET_STRING_ARG(1)"
        );
        assert_eq!(
            ArgStrategy::for_type("Foo*").extract("Foo*", 3),
            "(Foo*)(intptr_t)GET_INT_ARG(3)"
        );
        assert_eq!(ReturnStrategy::for_type("void").set("x"), "SET_NIL_RETURN();");
        assert_eq!(ReturnStrategy::for_type("float").set("x"), "SET_FLOAT_RETURN(x);");
        assert_eq!(
            ReturnStrategy::for_type("const char*").set("x"),
            "SET_RETURN(mrbc_string_new_cstr(vm, x));"
        );
        assert_eq!(c_storage_type("const char*"), "const char*");
        assert_eq!(c_storage_type("const float"), "float");
        assert_eq!(c_storage_type("uint16_t"), "uint16_t");
        assert_eq!(c_storage_type("const int32_t&"), "int32_t");
        assert_eq!(native_return_type("const uint8_t"), "uint8_t");
    }
}
