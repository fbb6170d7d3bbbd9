//! Builtin functions and value semantics
//!
//! Everything the evaluator needs beyond the AST walk itself: conversions,
//! operators, property lookup, the handful of language intrinsics (`Error`,
//! `Math`, `JSON`, `Object`, `Array`) and array/string methods.
//!
//! Builtins are plain enum values so they can be bound to receivers
//! (`Val::Func { func, bindings }`) and compared.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::errors::{self, ErrorInfo};
use super::expressions::{call_value, Abrupt};
use super::json::{val_to_json_within, JsonError};
use super::types::ast::ArithOp;
use super::types::{Fault, Val};
use super::vm::Runtime;

/* ===================== Builtin Function Types ===================== */

/// Builtin function identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    // Module loading
    Require,
    // Error constructors
    ErrorCtor,
    TypeErrorCtor,
    RangeErrorCtor,
    ReferenceErrorCtor,
    SyntaxErrorCtor,
    // Conversions
    StringCtor,
    NumberCtor,
    BooleanCtor,
    IsNaN,
    // Math functions
    MathFloor,
    MathCeil,
    MathAbs,
    MathRound,
    MathMax,
    MathMin,
    MathPow,
    MathSqrt,
    // Object / Array / JSON statics
    ObjectKeys,
    ObjectValues,
    ObjectEntries,
    ObjectAssign,
    ArrayIsArray,
    JsonStringify,
    JsonParse,
    // Array methods (binding 0 is the receiver)
    ArrayConcat,
    ArrayJoin,
    ArrayMap,
    ArrayFilter,
    ArrayForEach,
    ArrayReduce,
    ArrayFind,
    ArrayFindIndex,
    ArraySome,
    ArrayEvery,
    ArrayIncludes,
    ArrayIndexOf,
    ArraySlice,
    ArrayPush,
    ArrayPop,
    ArrayReverse,
    // String methods (binding 0 is the receiver)
    StrToUpperCase,
    StrToLowerCase,
    StrTrim,
    StrIncludes,
    StrStartsWith,
    StrEndsWith,
    StrIndexOf,
    StrSlice,
    StrSplit,
    StrRepeat,
    StrReplace,
}

impl Builtin {
    /// Name shown when the function is printed
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Require => "require",
            Builtin::ErrorCtor => "Error",
            Builtin::TypeErrorCtor => "TypeError",
            Builtin::RangeErrorCtor => "RangeError",
            Builtin::ReferenceErrorCtor => "ReferenceError",
            Builtin::SyntaxErrorCtor => "SyntaxError",
            Builtin::StringCtor => "String",
            Builtin::NumberCtor => "Number",
            Builtin::BooleanCtor => "Boolean",
            Builtin::IsNaN => "isNaN",
            Builtin::MathFloor => "floor",
            Builtin::MathCeil => "ceil",
            Builtin::MathAbs => "abs",
            Builtin::MathRound => "round",
            Builtin::MathMax => "max",
            Builtin::MathMin => "min",
            Builtin::MathPow => "pow",
            Builtin::MathSqrt => "sqrt",
            Builtin::ObjectKeys => "keys",
            Builtin::ObjectValues => "values",
            Builtin::ObjectEntries => "entries",
            Builtin::ObjectAssign => "assign",
            Builtin::ArrayIsArray => "isArray",
            Builtin::JsonStringify => "stringify",
            Builtin::JsonParse => "parse",
            Builtin::ArrayConcat => "concat",
            Builtin::ArrayJoin => "join",
            Builtin::ArrayMap => "map",
            Builtin::ArrayFilter => "filter",
            Builtin::ArrayForEach => "forEach",
            Builtin::ArrayReduce => "reduce",
            Builtin::ArrayFind => "find",
            Builtin::ArrayFindIndex => "findIndex",
            Builtin::ArraySome => "some",
            Builtin::ArrayEvery => "every",
            Builtin::ArrayIncludes | Builtin::StrIncludes => "includes",
            Builtin::ArrayIndexOf | Builtin::StrIndexOf => "indexOf",
            Builtin::ArraySlice | Builtin::StrSlice => "slice",
            Builtin::ArrayPush => "push",
            Builtin::ArrayPop => "pop",
            Builtin::ArrayReverse => "reverse",
            Builtin::StrToUpperCase => "toUpperCase",
            Builtin::StrToLowerCase => "toLowerCase",
            Builtin::StrTrim => "trim",
            Builtin::StrStartsWith => "startsWith",
            Builtin::StrEndsWith => "endsWith",
            Builtin::StrSplit => "split",
            Builtin::StrRepeat => "repeat",
            Builtin::StrReplace => "replace",
        }
    }

    /// Error constructors produce an error code when called or `new`-ed
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Builtin::ErrorCtor => Some(errors::ERROR),
            Builtin::TypeErrorCtor => Some(errors::TYPE_ERROR),
            Builtin::RangeErrorCtor => Some(errors::RANGE_ERROR),
            Builtin::ReferenceErrorCtor => Some(errors::REFERENCE_ERROR),
            Builtin::SyntaxErrorCtor => Some(errors::SYNTAX_ERROR),
            _ => None,
        }
    }
}

fn func(builtin: Builtin) -> Val {
    Val::Func {
        func: builtin,
        bindings: vec![],
    }
}

fn method(builtin: Builtin, receiver: &Val) -> Val {
    Val::Func {
        func: builtin,
        bindings: vec![receiver.clone()],
    }
}

fn namespace(entries: &[(&str, Builtin)]) -> Val {
    Val::obj(
        entries
            .iter()
            .map(|(name, builtin)| (name.to_string(), func(*builtin)))
            .collect(),
    )
}

/// Language intrinsics visible to every program
///
/// These are pure: none of them reach outside the running program.
pub fn intrinsics() -> Vec<(&'static str, Val)> {
    let mut math = namespace(&[
        ("floor", Builtin::MathFloor),
        ("ceil", Builtin::MathCeil),
        ("abs", Builtin::MathAbs),
        ("round", Builtin::MathRound),
        ("max", Builtin::MathMax),
        ("min", Builtin::MathMin),
        ("pow", Builtin::MathPow),
        ("sqrt", Builtin::MathSqrt),
    ]);
    if let Val::Obj(map) = &mut math {
        map.borrow_mut()
            .insert("PI".to_string(), Val::Num(std::f64::consts::PI));
    }

    vec![
        ("undefined", Val::Undefined),
        ("NaN", Val::Num(f64::NAN)),
        ("Infinity", Val::Num(f64::INFINITY)),
        ("Error", func(Builtin::ErrorCtor)),
        ("TypeError", func(Builtin::TypeErrorCtor)),
        ("RangeError", func(Builtin::RangeErrorCtor)),
        ("ReferenceError", func(Builtin::ReferenceErrorCtor)),
        ("SyntaxError", func(Builtin::SyntaxErrorCtor)),
        ("String", func(Builtin::StringCtor)),
        ("Number", func(Builtin::NumberCtor)),
        ("Boolean", func(Builtin::BooleanCtor)),
        ("isNaN", func(Builtin::IsNaN)),
        ("Math", math),
        (
            "Object",
            namespace(&[
                ("keys", Builtin::ObjectKeys),
                ("values", Builtin::ObjectValues),
                ("entries", Builtin::ObjectEntries),
                ("assign", Builtin::ObjectAssign),
            ]),
        ),
        ("Array", namespace(&[("isArray", Builtin::ArrayIsArray)])),
        (
            "JSON",
            namespace(&[
                ("stringify", Builtin::JsonStringify),
                ("parse", Builtin::JsonParse),
            ]),
        ),
    ]
}

/* ===================== Builtin Dispatcher ===================== */

/// Call a builtin function with arguments (bound receiver first)
pub fn call_builtin(func: Builtin, args: &[Val], rt: &mut Runtime) -> Result<Val, Abrupt> {
    let max_length = rt.limits.max_length;
    let result = match func {
        Builtin::Require => require(args, rt),
        Builtin::ErrorCtor => construct_error(errors::ERROR, args),
        Builtin::TypeErrorCtor => construct_error(errors::TYPE_ERROR, args),
        Builtin::RangeErrorCtor => construct_error(errors::RANGE_ERROR, args),
        Builtin::ReferenceErrorCtor => construct_error(errors::REFERENCE_ERROR, args),
        Builtin::SyntaxErrorCtor => construct_error(errors::SYNTAX_ERROR, args),
        Builtin::StringCtor => Ok(Val::Str(args.first().map(to_string).unwrap_or_default())),
        Builtin::NumberCtor => Ok(Val::Num(args.first().map(to_number).unwrap_or(0.0))),
        Builtin::BooleanCtor => Ok(Val::Bool(args.first().is_some_and(Val::is_truthy))),
        Builtin::IsNaN => Ok(Val::Bool(arg(args, 0).map_or(true, |v| to_number(v).is_nan()))),
        // Math functions are pure
        Builtin::MathFloor => math1(args, f64::floor),
        Builtin::MathCeil => math1(args, f64::ceil),
        Builtin::MathAbs => math1(args, f64::abs),
        Builtin::MathRound => math1(args, |n| (n + 0.5).floor()),
        Builtin::MathSqrt => math1(args, f64::sqrt),
        Builtin::MathPow => Ok(Val::Num(
            num_arg(args, 0).powf(num_arg(args, 1)),
        )),
        Builtin::MathMax => Ok(Val::Num(args.iter().map(to_number).fold(
            f64::NEG_INFINITY,
            |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(n) },
        ))),
        Builtin::MathMin => Ok(Val::Num(args.iter().map(to_number).fold(
            f64::INFINITY,
            |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.min(n) },
        ))),
        Builtin::ObjectKeys => Ok(Val::list(
            entries_of(arg(args, 0))?
                .into_iter()
                .map(|(k, _)| Val::Str(k))
                .collect(),
        )),
        Builtin::ObjectValues => Ok(Val::list(
            entries_of(arg(args, 0))?
                .into_iter()
                .map(|(_, v)| v)
                .collect(),
        )),
        Builtin::ObjectEntries => Ok(Val::list(
            entries_of(arg(args, 0))?
                .into_iter()
                .map(|(k, v)| Val::list(vec![Val::Str(k), v]))
                .collect(),
        )),
        Builtin::ObjectAssign => object_assign(args, max_length),
        Builtin::ArrayIsArray => Ok(Val::Bool(matches!(arg(args, 0), Some(Val::List(_))))),
        Builtin::JsonStringify => json_stringify(args, max_length),
        Builtin::JsonParse => json_parse(args),
        // Array methods
        Builtin::ArrayConcat => array_concat(args),
        Builtin::ArrayJoin => array_join(args, max_length),
        Builtin::ArrayMap
        | Builtin::ArrayFilter
        | Builtin::ArrayForEach
        | Builtin::ArrayFind
        | Builtin::ArrayFindIndex
        | Builtin::ArraySome
        | Builtin::ArrayEvery => array_iterate(func, args, rt),
        Builtin::ArrayReduce => array_reduce(args, rt),
        Builtin::ArrayIncludes => {
            let (items, rest) = receiver_list(args)?;
            let needle = rest.first().cloned().unwrap_or(Val::Undefined);
            Ok(Val::Bool(items.iter().any(|v| same_value_zero(v, &needle))))
        }
        Builtin::ArrayIndexOf => {
            let (items, rest) = receiver_list(args)?;
            let needle = rest.first().cloned().unwrap_or(Val::Undefined);
            let idx = items.iter().position(|v| strict_eq(v, &needle));
            Ok(Val::Num(idx.map_or(-1.0, |i| i as f64)))
        }
        Builtin::ArraySlice => {
            let (items, rest) = receiver_list(args)?;
            let (start, end) = slice_bounds(items.len(), rest);
            Ok(Val::list(items[start..end.max(start)].to_vec()))
        }
        Builtin::ArrayPush => {
            let Some(Val::List(list)) = args.first() else {
                return Err(ErrorInfo::type_error("push called on non-array").into());
            };
            let mut items = list.borrow_mut();
            check_array_length(items.len().saturating_add(args.len() - 1), max_length)?;
            items.extend(args[1..].iter().cloned());
            Ok(Val::Num(items.len() as f64))
        }
        Builtin::ArrayPop => {
            let Some(Val::List(list)) = args.first() else {
                return Err(ErrorInfo::type_error("pop called on non-array").into());
            };
            let popped = list.borrow_mut().pop();
            Ok(popped.unwrap_or(Val::Undefined))
        }
        Builtin::ArrayReverse => {
            let Some(receiver @ Val::List(list)) = args.first() else {
                return Err(ErrorInfo::type_error("reverse called on non-array").into());
            };
            list.borrow_mut().reverse();
            Ok(receiver.clone())
        }
        // String methods
        Builtin::StrToUpperCase => string_method(args, |s, _| Ok(Val::Str(s.to_uppercase()))),
        Builtin::StrToLowerCase => string_method(args, |s, _| Ok(Val::Str(s.to_lowercase()))),
        Builtin::StrTrim => string_method(args, |s, _| Ok(Val::Str(s.trim().to_string()))),
        Builtin::StrIncludes => {
            string_method(args, |s, rest| Ok(Val::Bool(s.contains(&str_arg(rest, 0)))))
        }
        Builtin::StrStartsWith => {
            string_method(args, |s, rest| Ok(Val::Bool(s.starts_with(&str_arg(rest, 0)))))
        }
        Builtin::StrEndsWith => {
            string_method(args, |s, rest| Ok(Val::Bool(s.ends_with(&str_arg(rest, 0)))))
        }
        Builtin::StrIndexOf => string_method(args, |s, rest| {
            let needle = str_arg(rest, 0);
            Ok(Val::Num(match s.find(&needle) {
                Some(byte_idx) => s[..byte_idx].chars().count() as f64,
                None => -1.0,
            }))
        }),
        Builtin::StrSlice => string_method(args, |s, rest| {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(chars.len(), rest);
            Ok(Val::Str(chars[start..end.max(start)].iter().collect()))
        }),
        Builtin::StrSplit => string_method(args, |s, rest| {
            let parts: Vec<Val> = match rest.first() {
                None | Some(Val::Undefined) => vec![Val::str(s)],
                Some(sep) => {
                    let sep = to_string(sep);
                    if sep.is_empty() {
                        s.chars().map(|c| Val::Str(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Val::str).collect()
                    }
                }
            };
            Ok(Val::list(parts))
        }),
        Builtin::StrRepeat => string_method(args, |s, rest| {
            let count = rest.first().map(to_number).unwrap_or(0.0);
            if count < 0.0 || count.is_infinite() {
                return Err(ErrorInfo::new(
                    errors::RANGE_ERROR,
                    format!("Invalid count value: {}", number_to_string(count)),
                ));
            }
            // NaN and fractions truncate toward zero
            let count = if count.is_nan() { 0 } else { count as usize };
            if count == 0 || s.is_empty() {
                return Ok(Val::str(""));
            }
            let total = s.len().checked_mul(count).unwrap_or(usize::MAX);
            check_string_length(total, max_length)?;
            Ok(Val::Str(s.repeat(count)))
        }),
        Builtin::StrReplace => string_method(args, |s, rest| {
            let pattern = str_arg(rest, 0);
            let replacement = str_arg(rest, 1);
            Ok(Val::Str(s.replacen(&pattern, &replacement, 1)))
        }),
    }?;

    match &result {
        Val::Str(s) => check_string_length(s.len(), max_length)?,
        Val::List(items) => check_array_length(items.borrow().len(), max_length)?,
        _ => {}
    }
    Ok(result)
}

fn construct_error(code: &'static str, args: &[Val]) -> Result<Val, Abrupt> {
    let message = match args.first() {
        None | Some(Val::Undefined) => String::new(),
        Some(v) => to_string(v),
    };
    Ok(Val::Error(ErrorInfo::new(code, message)))
}

/* ===================== Length Limits ===================== */

/// Arrays are indexed by 32-bit lengths, whatever the configured cap
const MAX_ARRAY_LENGTH: usize = u32::MAX as usize;

pub fn check_array_length(len: usize, max_length: usize) -> Result<(), ErrorInfo> {
    if len >= MAX_ARRAY_LENGTH || len > max_length {
        return Err(ErrorInfo::new(errors::RANGE_ERROR, "Invalid array length"));
    }
    Ok(())
}

/// `len` is in bytes
pub fn check_string_length(len: usize, max_length: usize) -> Result<(), ErrorInfo> {
    if len > max_length {
        return Err(ErrorInfo::new(errors::RANGE_ERROR, "Invalid string length"));
    }
    Ok(())
}

/* ===================== Module Loading ===================== */

/// `require(specifier)` - the only way a program reaches outside itself
fn require(args: &[Val], rt: &mut Runtime) -> Result<Val, Abrupt> {
    let Some(Val::Str(specifier)) = args.first() else {
        return Err(ErrorInfo::type_error("The \"id\" argument must be of type string").into());
    };

    match rt.resolver.resolve(specifier) {
        // Programs get their own copy so they cannot write through to the scope
        Ok(value) => Ok(value.deep_clone()),
        Err(err) => Err(Abrupt::Fault(Fault::UnresolvedImport {
            specifier: err.specifier,
        })),
    }
}

/* ===================== Conversions ===================== */

/// Format a number the way the language prints it
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if !(1e-6..1e21).contains(&abs) {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        };
    }
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// ToString conversion
pub fn to_string(val: &Val) -> String {
    match val {
        Val::Undefined => "undefined".to_string(),
        Val::Null => "null".to_string(),
        Val::Bool(b) => b.to_string(),
        Val::Num(n) => number_to_string(*n),
        Val::Str(s) => s.clone(),
        Val::List(items) => items
            .borrow()
            .iter()
            .map(|v| if v.is_nullish() { String::new() } else { to_string(v) })
            .collect::<Vec<_>>()
            .join(","),
        Val::Obj(_) => "[object Object]".to_string(),
        Val::Error(err) => err.to_string(),
        Val::Func { func, .. } => format!("function {}() {{ [native code] }}", func.name()),
        Val::Closure(closure) => format!("function {}() {{ [code] }}", closure.name()),
        Val::Native(native) => format!("function {}() {{ [native code] }}", native.name()),
    }
}

/// ToNumber conversion
pub fn to_number(val: &Val) -> f64 {
    match val {
        Val::Undefined => f64::NAN,
        Val::Null => 0.0,
        Val::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Val::Num(n) => *n,
        Val::Str(s) => string_to_number(s),
        Val::List(_) => string_to_number(&to_string(val)),
        _ => f64::NAN,
    }
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let numeric = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Key used for property lookup from a computed index
pub fn property_key(val: &Val) -> String {
    to_string(val)
}

/* ===================== Operators ===================== */

/// Apply an eager binary operator
pub fn arith(op: ArithOp, left: &Val, right: &Val) -> Val {
    match op {
        ArithOp::Add => add(left, right),
        ArithOp::Sub => Val::Num(to_number(left) - to_number(right)),
        ArithOp::Mul => Val::Num(to_number(left) * to_number(right)),
        ArithOp::Div => Val::Num(to_number(left) / to_number(right)),
        ArithOp::Mod => Val::Num(to_number(left) % to_number(right)),
        ArithOp::StrictEq => Val::Bool(strict_eq(left, right)),
        ArithOp::StrictNe => Val::Bool(!strict_eq(left, right)),
        ArithOp::Eq => Val::Bool(loose_eq(left, right)),
        ArithOp::Ne => Val::Bool(!loose_eq(left, right)),
        ArithOp::Lt => Val::Bool(compare(left, right) == Some(Ordering::Less)),
        ArithOp::Gt => Val::Bool(compare(left, right) == Some(Ordering::Greater)),
        ArithOp::Lte => Val::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        ArithOp::Gte => Val::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    }
}

fn add(left: &Val, right: &Val) -> Val {
    let is_stringy = |v: &Val| matches!(v, Val::Str(_) | Val::List(_) | Val::Obj(_) | Val::Error(_));
    if is_stringy(left) || is_stringy(right) {
        Val::Str(format!("{}{}", to_string(left), to_string(right)))
    } else {
        Val::Num(to_number(left) + to_number(right))
    }
}

/// `===`
pub fn strict_eq(left: &Val, right: &Val) -> bool {
    match (left, right) {
        (Val::Undefined, Val::Undefined) | (Val::Null, Val::Null) => true,
        (Val::Bool(a), Val::Bool(b)) => a == b,
        (Val::Num(a), Val::Num(b)) => a == b,
        (Val::Str(a), Val::Str(b)) => a == b,
        (Val::Error(a), Val::Error(b)) => a == b,
        _ => left.same_ref(right),
    }
}

/// `==`
pub fn loose_eq(left: &Val, right: &Val) -> bool {
    match (left, right) {
        (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
        (Val::Num(_), Val::Str(_)) | (Val::Str(_), Val::Num(_)) => {
            to_number(left) == to_number(right)
        }
        (Val::Bool(b), other) | (other, Val::Bool(b)) => {
            loose_eq(&Val::Num(if *b { 1.0 } else { 0.0 }), other)
        }
        (Val::List(_) | Val::Obj(_), Val::Str(_) | Val::Num(_)) => {
            loose_eq(&Val::Str(to_string(left)), right)
        }
        (Val::Str(_) | Val::Num(_), Val::List(_) | Val::Obj(_)) => {
            loose_eq(left, &Val::Str(to_string(right)))
        }
        _ => strict_eq(left, right),
    }
}

/// `includes` equality: like `===` but NaN equals NaN
fn same_value_zero(left: &Val, right: &Val) -> bool {
    match (left, right) {
        (Val::Num(a), Val::Num(b)) if a.is_nan() && b.is_nan() => true,
        _ => strict_eq(left, right),
    }
}

fn compare(left: &Val, right: &Val) -> Option<Ordering> {
    match (left, right) {
        (Val::Str(a), Val::Str(b)) => Some(a.cmp(b)),
        _ => to_number(left).partial_cmp(&to_number(right)),
    }
}

/* ===================== Property Access ===================== */

/// Read `obj[key]`
pub fn get_property(obj: &Val, key: &str) -> Result<Val, ErrorInfo> {
    match obj {
        Val::Undefined | Val::Null => Err(ErrorInfo::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            to_string(obj),
            key
        ))),
        Val::Obj(map) => Ok(map.borrow().get(key).cloned().unwrap_or(Val::Undefined)),
        Val::List(items) => {
            if key == "length" {
                return Ok(Val::Num(items.borrow().len() as f64));
            }
            if let Ok(idx) = key.parse::<usize>() {
                return Ok(items.borrow().get(idx).cloned().unwrap_or(Val::Undefined));
            }
            let builtin = match key {
                "concat" => Builtin::ArrayConcat,
                "join" => Builtin::ArrayJoin,
                "map" => Builtin::ArrayMap,
                "filter" => Builtin::ArrayFilter,
                "forEach" => Builtin::ArrayForEach,
                "reduce" => Builtin::ArrayReduce,
                "find" => Builtin::ArrayFind,
                "findIndex" => Builtin::ArrayFindIndex,
                "some" => Builtin::ArraySome,
                "every" => Builtin::ArrayEvery,
                "includes" => Builtin::ArrayIncludes,
                "indexOf" => Builtin::ArrayIndexOf,
                "slice" => Builtin::ArraySlice,
                "push" => Builtin::ArrayPush,
                "pop" => Builtin::ArrayPop,
                "reverse" => Builtin::ArrayReverse,
                _ => return Ok(Val::Undefined),
            };
            Ok(method(builtin, obj))
        }
        Val::Str(s) => {
            if key == "length" {
                return Ok(Val::Num(s.chars().count() as f64));
            }
            if let Ok(idx) = key.parse::<usize>() {
                return Ok(s
                    .chars()
                    .nth(idx)
                    .map(|c| Val::Str(c.to_string()))
                    .unwrap_or(Val::Undefined));
            }
            let builtin = match key {
                "toUpperCase" => Builtin::StrToUpperCase,
                "toLowerCase" => Builtin::StrToLowerCase,
                "trim" => Builtin::StrTrim,
                "includes" => Builtin::StrIncludes,
                "startsWith" => Builtin::StrStartsWith,
                "endsWith" => Builtin::StrEndsWith,
                "indexOf" => Builtin::StrIndexOf,
                "slice" => Builtin::StrSlice,
                "split" => Builtin::StrSplit,
                "repeat" => Builtin::StrRepeat,
                "replace" => Builtin::StrReplace,
                _ => return Ok(Val::Undefined),
            };
            Ok(method(builtin, obj))
        }
        Val::Error(err) => Ok(match key {
            "message" => Val::Str(err.message.clone()),
            "name" | "code" => Val::Str(err.code.clone()),
            _ => Val::Undefined,
        }),
        Val::Func { func, .. } if key == "name" => Ok(Val::str(func.name())),
        Val::Closure(closure) if key == "name" => Ok(Val::str(closure.name())),
        Val::Native(native) if key == "name" => Ok(Val::str(native.name())),
        _ => Ok(Val::Undefined),
    }
}

/// Read `obj[index]` where the index is an evaluated value
pub fn get_index(obj: &Val, index: &Val) -> Result<Val, ErrorInfo> {
    if let (Val::List(items), Val::Num(n)) = (obj, index) {
        if *n >= 0.0 && n.fract() == 0.0 {
            return Ok(items
                .borrow()
                .get(*n as usize)
                .cloned()
                .unwrap_or(Val::Undefined));
        }
    }
    get_property(obj, &property_key(index))
}

/// Write `obj[key] = value`
pub fn set_property(
    obj: &Val,
    key: &str,
    value: Val,
    max_length: usize,
) -> Result<(), ErrorInfo> {
    match obj {
        Val::Obj(map) => {
            map.borrow_mut().insert(key.to_string(), value);
            Ok(())
        }
        Val::List(items) => {
            let mut items = items.borrow_mut();
            if key == "length" {
                let len = to_number(&value);
                if !(0.0..MAX_ARRAY_LENGTH as f64).contains(&len) || len.fract() != 0.0 {
                    return Err(ErrorInfo::new(errors::RANGE_ERROR, "Invalid array length"));
                }
                let len = len as usize;
                check_array_length(len, max_length)?;
                items.resize(len, Val::Undefined);
                return Ok(());
            }
            match key.parse::<usize>() {
                Ok(idx) => {
                    if idx >= items.len() {
                        let len = idx
                            .checked_add(1)
                            .ok_or_else(|| ErrorInfo::new(errors::RANGE_ERROR, "Invalid array length"))?;
                        check_array_length(len, max_length)?;
                        items.resize(len, Val::Undefined);
                    }
                    items[idx] = value;
                    Ok(())
                }
                Err(_) => Err(ErrorInfo::type_error(format!(
                    "Cannot create property '{}' on array",
                    key
                ))),
            }
        }
        Val::Undefined | Val::Null => Err(ErrorInfo::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            to_string(obj),
            key
        ))),
        other => Err(ErrorInfo::type_error(format!(
            "Cannot create property '{}' on {} '{}'",
            key,
            other.type_of(),
            to_string(other)
        ))),
    }
}

/* ===================== Helpers ===================== */

fn arg(args: &[Val], idx: usize) -> Option<&Val> {
    args.get(idx)
}

fn num_arg(args: &[Val], idx: usize) -> f64 {
    args.get(idx).map(to_number).unwrap_or(f64::NAN)
}

fn str_arg(args: &[Val], idx: usize) -> String {
    args.get(idx).map(to_string).unwrap_or_else(|| "undefined".to_string())
}

fn math1(args: &[Val], f: impl Fn(f64) -> f64) -> Result<Val, Abrupt> {
    Ok(Val::Num(f(num_arg(args, 0))))
}

/// Resolve `slice(start, end)` arguments against a length
fn slice_bounds(len: usize, rest: &[Val]) -> (usize, usize) {
    let resolve = |v: Option<&Val>, default: usize| -> usize {
        match v {
            None | Some(Val::Undefined) => default,
            Some(v) => {
                let n = to_number(v);
                if n.is_nan() {
                    0
                } else if n < 0.0 {
                    (len as f64 + n).max(0.0) as usize
                } else {
                    (n as usize).min(len)
                }
            }
        }
    };
    (resolve(rest.first(), 0), resolve(rest.get(1), len))
}

fn receiver_list(args: &[Val]) -> Result<(Vec<Val>, &[Val]), Abrupt> {
    match args.split_first() {
        Some((Val::List(items), rest)) => Ok((items.borrow().clone(), rest)),
        _ => Err(ErrorInfo::type_error("Array method called on non-array").into()),
    }
}

fn string_method(
    args: &[Val],
    f: impl FnOnce(&str, &[Val]) -> Result<Val, ErrorInfo>,
) -> Result<Val, Abrupt> {
    match args.split_first() {
        Some((Val::Str(s), rest)) => f(s, rest).map_err(Abrupt::from),
        _ => Err(ErrorInfo::type_error("String method called on non-string").into()),
    }
}

fn entries_of(val: Option<&Val>) -> Result<Vec<(String, Val)>, Abrupt> {
    match val {
        Some(Val::Obj(map)) => Ok(map
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()),
        Some(Val::List(items)) => Ok(items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect()),
        Some(Val::Str(s)) => Ok(s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Val::Str(c.to_string())))
            .collect()),
        None | Some(Val::Undefined) | Some(Val::Null) => Err(ErrorInfo::type_error(
            "Cannot convert undefined or null to object",
        )
        .into()),
        Some(_) => Ok(vec![]),
    }
}

fn object_assign(args: &[Val], max_length: usize) -> Result<Val, Abrupt> {
    let Some((target, sources)) = args.split_first() else {
        return Err(ErrorInfo::type_error("Cannot convert undefined or null to object").into());
    };
    for source in sources {
        if source.is_nullish() {
            continue;
        }
        for (key, value) in entries_of(Some(source))? {
            set_property(target, &key, value, max_length)?;
        }
    }
    Ok(target.clone())
}

fn json_stringify(args: &[Val], max_length: usize) -> Result<Val, Abrupt> {
    let value = args.first().cloned().unwrap_or(Val::Undefined);
    if matches!(value, Val::Undefined) || value.is_callable() {
        return Ok(Val::Undefined);
    }
    let json = val_to_json_within(&value, max_length).map_err(|e| match e {
        JsonError::TooLarge => ErrorInfo::new(errors::RANGE_ERROR, "Invalid string length"),
        other => ErrorInfo::type_error(other.to_string()),
    })?;
    let indent = args.get(2).map(to_number).unwrap_or(0.0);
    let text = if indent >= 1.0 {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    }
    .map_err(|e| ErrorInfo::type_error(e.to_string()))?;
    Ok(Val::Str(text))
}

fn json_parse(args: &[Val]) -> Result<Val, Abrupt> {
    let text = str_arg(args, 0);
    let json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| ErrorInfo::new(errors::SYNTAX_ERROR, e.to_string()))?;
    super::json::json_to_val(&json)
        .map_err(|e| Abrupt::from(ErrorInfo::new(errors::SYNTAX_ERROR, e.to_string())))
}

fn array_concat(args: &[Val]) -> Result<Val, Abrupt> {
    let (mut items, rest) = receiver_list(args)?;
    for extra in rest {
        match extra {
            Val::List(more) => items.extend(more.borrow().iter().cloned()),
            other => items.push(other.clone()),
        }
    }
    Ok(Val::list(items))
}

fn array_join(args: &[Val], max_length: usize) -> Result<Val, Abrupt> {
    let (items, rest) = receiver_list(args)?;
    let sep = match rest.first() {
        None | Some(Val::Undefined) => ",".to_string(),
        Some(v) => to_string(v),
    };
    let mut joined = String::new();
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            check_string_length(joined.len() + sep.len(), max_length)?;
            joined.push_str(&sep);
        }
        if !item.is_nullish() {
            let part = to_string(item);
            check_string_length(joined.len() + part.len(), max_length)?;
            joined.push_str(&part);
        }
    }
    Ok(Val::Str(joined))
}

/// Callback-driven array methods share one loop
fn array_iterate(func: Builtin, args: &[Val], rt: &mut Runtime) -> Result<Val, Abrupt> {
    let (items, rest) = receiver_list(args)?;
    let callback = rest.first().cloned().unwrap_or(Val::Undefined);
    if !callback.is_callable() {
        return Err(ErrorInfo::type_error(format!(
            "{} is not a function",
            to_string(&callback)
        ))
        .into());
    }

    let mut mapped = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let result = call_value(
            &callback,
            vec![item.clone(), Val::Num(idx as f64)],
            rt,
            "callback",
        )?;
        match func {
            Builtin::ArrayMap => mapped.push(result),
            Builtin::ArrayFilter if result.is_truthy() => mapped.push(item.clone()),
            Builtin::ArrayFind if result.is_truthy() => return Ok(item.clone()),
            Builtin::ArrayFindIndex if result.is_truthy() => return Ok(Val::Num(idx as f64)),
            Builtin::ArraySome if result.is_truthy() => return Ok(Val::Bool(true)),
            Builtin::ArrayEvery if !result.is_truthy() => return Ok(Val::Bool(false)),
            _ => {}
        }
    }

    Ok(match func {
        Builtin::ArrayMap | Builtin::ArrayFilter => Val::list(mapped),
        Builtin::ArrayFind | Builtin::ArrayForEach => Val::Undefined,
        Builtin::ArrayFindIndex => Val::Num(-1.0),
        Builtin::ArraySome => Val::Bool(false),
        _ => Val::Bool(true),
    })
}

fn array_reduce(args: &[Val], rt: &mut Runtime) -> Result<Val, Abrupt> {
    let (items, rest) = receiver_list(args)?;
    let callback = rest.first().cloned().unwrap_or(Val::Undefined);
    let mut iter = items.into_iter().enumerate();

    let mut acc = match rest.get(1) {
        Some(initial) => initial.clone(),
        None => match iter.next() {
            Some((_, first)) => first,
            None => {
                return Err(
                    ErrorInfo::type_error("Reduce of empty array with no initial value").into(),
                )
            }
        },
    };

    for (idx, item) in iter {
        acc = call_value(
            &callback,
            vec![acc, item, Val::Num(idx as f64)],
            rt,
            "callback",
        )?;
    }
    Ok(acc)
}

/// Convenience for building objects from Rust code
pub fn obj_from<I, K>(entries: I) -> Val
where
    I: IntoIterator<Item = (K, Val)>,
    K: Into<String>,
{
    Val::obj(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(2.0), "2");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_add_concatenates_strings() {
        let v = arith(ArithOp::Add, &Val::str("a"), &Val::Num(1.0));
        assert_eq!(v, Val::str("a1"));

        let v = arith(ArithOp::Add, &Val::Num(1.0), &Val::Bool(true));
        assert_eq!(v, Val::Num(2.0));
    }

    #[test]
    fn test_equality_rules() {
        assert!(loose_eq(&Val::Null, &Val::Undefined));
        assert!(!strict_eq(&Val::Null, &Val::Undefined));
        assert!(loose_eq(&Val::Num(1.0), &Val::str("1")));
        assert!(!strict_eq(&Val::Num(f64::NAN), &Val::Num(f64::NAN)));

        let a = Val::list(vec![]);
        let b = Val::list(vec![]);
        assert!(strict_eq(&a, &a.clone()));
        assert!(!strict_eq(&a, &b));
    }

    #[test]
    fn test_to_number_rejects_words() {
        assert!(to_number(&Val::str("inf")).is_nan());
        assert_eq!(to_number(&Val::str(" 42 ")), 42.0);
        assert_eq!(to_number(&Val::str("")), 0.0);
        assert_eq!(to_number(&Val::str("0x10")), 16.0);
    }

    #[test]
    fn test_property_read_on_null() {
        let err = get_property(&Val::Null, "x").unwrap_err();
        assert_eq!(err.code, errors::TYPE_ERROR);
        assert_eq!(err.message, "Cannot read properties of null (reading 'x')");
    }

    #[test]
    fn test_set_property_extends_list() {
        let list = Val::list(vec![Val::Num(1.0)]);
        set_property(&list, "2", Val::Num(3.0), 16).unwrap();
        assert_eq!(
            list,
            Val::list(vec![Val::Num(1.0), Val::Undefined, Val::Num(3.0)])
        );
    }

    #[test]
    fn test_set_property_rejects_out_of_range_index() {
        let list = Val::list(vec![]);
        for key in ["18446744073709551615", "4294967295", "16"] {
            let err = set_property(&list, key, Val::Num(1.0), 16).unwrap_err();
            assert_eq!(err.code, errors::RANGE_ERROR);
            assert_eq!(err.message, "Invalid array length");
        }
        assert_eq!(list, Val::list(vec![]));
    }
}
