//! Value-level coercion rules of the subject language.
//!
//! Everything here is pure: given literal payloads, compute what the host
//! runtime would compute. Division by zero, `NaN` arithmetic and mixed-type
//! comparisons are defined outcomes, never errors.
//!
//! [`constant_value`] is the gate into this module: it decides whether an
//! already-simplified node counts as a compile-time constant at all.

use crush_ast::{LitValue, Node, NodeArena, NodeId, UnaryOp};
use std::cmp::Ordering;

/// Extract the constant value of a node, if it has one.
///
/// Recognized shapes, and nothing else:
/// - any literal (number, string, boolean, regex, null, undefined)
/// - the identifier literally named `undefined`
/// - a unary `-` whose *direct* operand is a literal
///
/// The unary-minus rule deliberately does not recurse: `-(-1)` is not a
/// constant here, only a literal argument is recognized. Broadening this
/// would change observable folding coverage, so it stays narrow.
pub fn constant_value(arena: &NodeArena, id: NodeId) -> Option<LitValue> {
    match arena.get(id) {
        Node::Literal(value) => Some(value.clone()),
        Node::Identifier { name } if name == "undefined" => Some(LitValue::Undefined),
        Node::Unary {
            op: UnaryOp::Minus,
            argument,
        } => match arena.get(*argument) {
            Node::Literal(value) => Some(LitValue::Num(-to_number(value))),
            _ => None,
        },
        _ => None,
    }
}

/// Numeric coercion (`ToNumber`).
pub fn to_number(value: &LitValue) -> f64 {
    match value {
        LitValue::Num(n) => *n,
        LitValue::Str(s) => string_to_number(s),
        LitValue::Bool(true) => 1.0,
        LitValue::Bool(false) => 0.0,
        LitValue::Null => 0.0,
        LitValue::Undefined => f64::NAN,
        LitValue::Regex { .. } => f64::NAN,
    }
}

/// String-to-number coercion: trimmed, empty means zero, radix prefixes are
/// honored, anything unparseable is `NaN`.
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u128::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
    }
    if let Some(oct) = t.strip_prefix("0o").or_else(|| t.strip_prefix("0O")) {
        return u128::from_str_radix(oct, 8).map_or(f64::NAN, |v| v as f64);
    }
    if let Some(bin) = t.strip_prefix("0b").or_else(|| t.strip_prefix("0B")) {
        return u128::from_str_radix(bin, 2).map_or(f64::NAN, |v| v as f64);
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Rust's float parser accepts spellings like "inf" and "nan" that the
    // subject language does not.
    if t.eq_ignore_ascii_case("inf")
        || t.eq_ignore_ascii_case("+inf")
        || t.eq_ignore_ascii_case("-inf")
        || t.eq_ignore_ascii_case("infinity")
        || t.eq_ignore_ascii_case("+infinity")
        || t.eq_ignore_ascii_case("-infinity")
        || t.eq_ignore_ascii_case("nan")
    {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// String coercion (`ToString`).
pub fn to_js_string(value: &LitValue) -> String {
    match value {
        LitValue::Num(n) => format_number(*n),
        LitValue::Str(s) => s.clone(),
        LitValue::Bool(true) => "true".to_string(),
        LitValue::Bool(false) => "false".to_string(),
        LitValue::Null => "null".to_string(),
        LitValue::Undefined => "undefined".to_string(),
        LitValue::Regex { pattern, flags } => format!("/{pattern}/{flags}"),
    }
}

/// Number-to-string per the subject language: `NaN`, signed `Infinity`,
/// integer values without a fraction, negative zero as plain `0`, and
/// exponential notation once the magnitude leaves the plain-decimal range
/// (at least 1e21, or below 1e-6).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n < 0.0 { "-Infinity" } else { "Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        // Rust prints `1e21`; the subject language prints `1e+21` (negative
        // exponents already carry their sign).
        let s = format!("{n:e}");
        return match s.find('e') {
            Some(i) if !s[i + 1..].starts_with('-') => {
                format!("{}e+{}", &s[..i], &s[i + 1..])
            }
            _ => s,
        };
    }
    // Shortest round-trip formatting; prints integral values without `.0`.
    format!("{n}")
}

/// Boolean coercion (`ToBoolean`).
pub fn is_truthy(value: &LitValue) -> bool {
    match value {
        LitValue::Num(n) => *n != 0.0 && !n.is_nan(),
        LitValue::Str(s) => !s.is_empty(),
        LitValue::Bool(b) => *b,
        LitValue::Null | LitValue::Undefined => false,
        LitValue::Regex { .. } => true,
    }
}

/// String-like values: strings themselves and regex objects, whose
/// `ToPrimitive` is their `/pattern/flags` text.
fn is_stringy(value: &LitValue) -> bool {
    matches!(value, LitValue::Str(_) | LitValue::Regex { .. })
}

/// Native `+`: concatenation if either side is string-like, numeric sum
/// otherwise. The caller picks the literal kind from the result variant.
pub fn add_values(left: &LitValue, right: &LitValue) -> LitValue {
    if is_stringy(left) || is_stringy(right) {
        let mut s = to_js_string(left);
        s.push_str(&to_js_string(right));
        LitValue::Str(s)
    } else {
        LitValue::Num(to_number(left) + to_number(right))
    }
}

/// Abstract (coercing) equality.
pub fn loose_eq(left: &LitValue, right: &LitValue) -> bool {
    use LitValue::*;
    match (left, right) {
        (Null, Null) | (Undefined, Undefined) => true,
        (Null, Undefined) | (Undefined, Null) => true,
        (Null, _) | (_, Null) | (Undefined, _) | (_, Undefined) => false,
        // Two regex values are distinct objects; never equal to each other.
        (Regex { .. }, Regex { .. }) => false,
        (Bool(b), other) => loose_eq(&Num(if *b { 1.0 } else { 0.0 }), other),
        (other, Bool(b)) => loose_eq(other, &Num(if *b { 1.0 } else { 0.0 })),
        (Num(x), Num(y)) => x == y,
        (Str(x), Str(y)) => x == y,
        (Num(x), Str(s)) | (Str(s), Num(x)) => *x == string_to_number(s),
        (Str(s), r @ Regex { .. }) | (r @ Regex { .. }, Str(s)) => *s == to_js_string(r),
        (Num(x), r @ Regex { .. }) | (r @ Regex { .. }, Num(x)) => {
            *x == string_to_number(&to_js_string(r))
        }
    }
}

/// Strict (type-and-value) equality. `NaN` is unequal to itself; two regex
/// values are distinct objects and never strictly equal.
pub fn strict_eq(left: &LitValue, right: &LitValue) -> bool {
    use LitValue::*;
    match (left, right) {
        (Num(x), Num(y)) => x == y,
        (Str(x), Str(y)) => x == y,
        (Bool(x), Bool(y)) => x == y,
        (Null, Null) | (Undefined, Undefined) => true,
        _ => false,
    }
}

/// Relational comparison: lexicographic when both sides are string-like,
/// numeric otherwise. `None` means an incomparable (`NaN`) operand, which
/// makes every relational operator false.
///
/// String ordering is over UTF-16 code units, the way the subject language
/// compares; for astral characters that differs from code-point order.
pub fn relational(left: &LitValue, right: &LitValue) -> Option<Ordering> {
    if is_stringy(left) && is_stringy(right) {
        let l = to_js_string(left);
        let r = to_js_string(right);
        Some(l.encode_utf16().cmp(r.encode_utf16()))
    } else {
        to_number(left).partial_cmp(&to_number(right))
    }
}
