//! Native implementations for the VM.
//!
//! This module contains the arithmetic/comparison helpers behind the
//! `BINARY_*`, `UNARY_*` and `COMPARE_OP` instructions, and the bodies of
//! the builtins reachable through `CALL_FUNCTION`.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::match_same_arms)]

use std::cmp::Ordering;

use bitquest_foundation::{
    ArithmeticFault, Builtin, Error, IterState, RangeValue, Result, Value, format_float,
};

use super::host::Host;
use crate::opcode::CompareOp;

/// Longest string a script may build with `+` or `*`, in bytes.
const MAX_STRING_LEN: usize = 1 << 20;

// =============================================================================
// Arithmetic and Comparison Helpers
// =============================================================================

fn unsupported(op: &'static str, a: &Value, b: &Value) -> Error {
    Error::arithmetic(ArithmeticFault::UnsupportedOperands {
        op,
        left: a.value_type(),
        right: b.value_type(),
    })
}

fn overflow(op: &'static str) -> Error {
    Error::arithmetic(ArithmeticFault::Overflow { op })
}

fn division_by_zero() -> Error {
    Error::arithmetic(ArithmeticFault::DivisionByZero)
}

/// Applies a float operation, promoting ints; anything else is unsupported.
fn float_op(
    op: &'static str,
    a: &Value,
    b: &Value,
    f: impl FnOnce(f64, f64) -> f64,
) -> Result<Value> {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => Ok(Value::Float(f(x, y))),
        _ => Err(unsupported(op, a, b)),
    }
}

/// Adds two values. Strings concatenate.
pub(crate) fn add_values(a: Value, b: Value) -> Result<Value> {
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => {
            x.checked_add(*y).map(Value::Int).ok_or_else(|| overflow("+"))
        }
        (Value::Str(x), Value::Str(y)) => {
            if x.len() + y.len() > MAX_STRING_LEN {
                return Err(overflow("+"));
            }
            Ok(Value::from(format!("{x}{y}")))
        }
        _ => float_op("+", &a, &b, |x, y| x + y),
    }
}

/// Subtracts two values.
pub(crate) fn sub_values(a: Value, b: Value) -> Result<Value> {
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => {
            x.checked_sub(*y).map(Value::Int).ok_or_else(|| overflow("-"))
        }
        _ => float_op("-", &a, &b, |x, y| x - y),
    }
}

/// Multiplies two values. A string times an int repeats the string.
pub(crate) fn mul_values(a: Value, b: Value) -> Result<Value> {
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => {
            x.checked_mul(*y).map(Value::Int).ok_or_else(|| overflow("*"))
        }
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => repeat_str(s, *n),
        _ => float_op("*", &a, &b, |x, y| x * y),
    }
}

fn repeat_str(s: &str, count: i64) -> Result<Value> {
    let Ok(count) = usize::try_from(count) else {
        // Negative counts give the empty string.
        return Ok(Value::from(""));
    };
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_STRING_LEN => Ok(Value::from(s.repeat(count))),
        _ => Err(overflow("*")),
    }
}

/// Divides two values; the result is always a float.
pub(crate) fn true_div_values(a: Value, b: Value) -> Result<Value> {
    match (a.as_number(), b.as_number()) {
        (Some(_), Some(y)) if y == 0.0 => Err(division_by_zero()),
        (Some(x), Some(y)) => Ok(Value::Float(x / y)),
        _ => Err(unsupported("/", &a, &b)),
    }
}

/// Divides two values, rounding toward negative infinity.
pub(crate) fn floor_div_values(a: Value, b: Value) -> Result<Value> {
    match (&a, &b) {
        (Value::Int(_), Value::Int(0)) => Err(division_by_zero()),
        (Value::Int(x), Value::Int(y)) => {
            let q = x.checked_div(*y).ok_or_else(|| overflow("//"))?;
            let adjust = x % y != 0 && ((*x < 0) != (*y < 0));
            Ok(Value::Int(if adjust { q - 1 } else { q }))
        }
        _ => match (a.as_number(), b.as_number()) {
            (Some(_), Some(y)) if y == 0.0 => Err(division_by_zero()),
            (Some(x), Some(y)) => Ok(Value::Float((x / y).floor())),
            _ => Err(unsupported("//", &a, &b)),
        },
    }
}

/// Remainder whose sign follows the divisor.
pub(crate) fn mod_values(a: Value, b: Value) -> Result<Value> {
    match (&a, &b) {
        (Value::Int(_), Value::Int(0)) => Err(division_by_zero()),
        (Value::Int(x), Value::Int(y)) => {
            let r = x.wrapping_rem(*y);
            let r = if r != 0 && ((r < 0) != (*y < 0)) { r + y } else { r };
            Ok(Value::Int(r))
        }
        _ => match (a.as_number(), b.as_number()) {
            (Some(_), Some(y)) if y == 0.0 => Err(division_by_zero()),
            (Some(x), Some(y)) => {
                let r = x % y;
                let r = if r == 0.0 {
                    0.0_f64.copysign(y)
                } else if (r < 0.0) != (y < 0.0) {
                    r + y
                } else {
                    r
                };
                Ok(Value::Float(r))
            }
            _ => Err(unsupported("%", &a, &b)),
        },
    }
}

/// Negates a value.
pub(crate) fn neg_value(a: Value) -> Result<Value> {
    match a {
        Value::Int(x) => x.checked_neg().map(Value::Int).ok_or_else(|| overflow("-")),
        Value::Float(x) => Ok(Value::Float(-x)),
        _ => Err(Error::arithmetic(ArithmeticFault::UnsupportedOperand {
            op: "-",
            operand: a.value_type(),
        })),
    }
}

/// Compares two values.
///
/// Equality is defined for every pair; ordering only for number/number and
/// str/str. Ordering against NaN is false.
pub(crate) fn compare_values(op: CompareOp, a: Value, b: Value) -> Result<Value> {
    match op {
        CompareOp::Eq => Ok(Value::Bool(a == b)),
        CompareOp::Ne => Ok(Value::Bool(a != b)),
        _ => match a.partial_cmp(&b) {
            Some(ordering) => Ok(Value::Bool(op.matches(ordering))),
            None if a.value_type().is_numeric() && b.value_type().is_numeric() => {
                Ok(Value::Bool(false))
            }
            None => Err(unsupported(op.symbol(), &a, &b)),
        },
    }
}

// =============================================================================
// Builtins
// =============================================================================

/// Invokes a builtin with already-evaluated arguments.
pub(crate) fn call_builtin(
    builtin: Builtin,
    args: &[Value],
    host: &mut dyn Host,
) -> Result<Value> {
    let arity = builtin.arity();
    if !arity.accepts(args.len()) {
        return Err(Error::arity_mismatch(builtin.name(), arity, args.len()));
    }

    match builtin {
        Builtin::Print => native_print(args, host),
        Builtin::Input => native_input(args, host),
        Builtin::Abs => native_abs(arg(args, 0)?),
        Builtin::Min => native_extreme(Builtin::Min, args, Ordering::Less),
        Builtin::Max => native_extreme(Builtin::Max, args, Ordering::Greater),
        Builtin::Len => native_len(arg(args, 0)?),
        Builtin::Str => Ok(Value::from(arg(args, 0)?.to_string())),
        Builtin::Int => native_int(arg(args, 0)?),
        Builtin::Float => native_float(arg(args, 0)?),
        Builtin::Round => native_round(arg(args, 0)?, args.get(1)),
        Builtin::Range => native_range(args),
    }
}

fn arg(args: &[Value], index: usize) -> Result<&Value> {
    args.get(index)
        .ok_or_else(|| Error::internal("builtin called with too few arguments"))
}

/// `print(*values)`: one host message, arguments joined by spaces.
fn native_print(args: &[Value], host: &mut dyn Host) -> Result<Value> {
    let message = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    host.print(&message);
    Ok(Value::None)
}

/// `input(prompt="")`: a line of text from the host.
fn native_input(args: &[Value], host: &mut dyn Host) -> Result<Value> {
    let prompt = args.first().map(ToString::to_string).unwrap_or_default();
    host.input(&prompt).map(Value::from)
}

fn native_abs(x: &Value) -> Result<Value> {
    match x {
        Value::Int(n) => n.checked_abs().map(Value::Int).ok_or_else(|| overflow("abs")),
        Value::Float(n) => Ok(Value::Float(n.abs())),
        other => Err(Error::type_mismatch("a number", other.value_type())),
    }
}

/// `min`/`max` over the arguments, or over the items of a single iterable.
/// Ties keep the earliest item.
fn native_extreme(builtin: Builtin, args: &[Value], want: Ordering) -> Result<Value> {
    if let [single] = args {
        return match single {
            Value::Range(r) => range_extreme(builtin, *r, want),
            Value::Str(s) => {
                let mut iter = IterState::chars(s.clone());
                let mut items = Vec::new();
                while let Some(item) = iter.advance() {
                    items.push(item);
                }
                fold_extreme(builtin, items, want)
            }
            other => Err(Error::type_mismatch(
                "an iterable (range or str)",
                other.value_type(),
            )),
        };
    }
    fold_extreme(builtin, args.to_vec(), want)
}

fn range_extreme(builtin: Builtin, range: RangeValue, want: Ordering) -> Result<Value> {
    if range.is_empty() {
        return Err(Error::invalid_argument(builtin.name(), "arg is an empty sequence"));
    }
    let first = i128::from(range.start);
    let last = first + (range.len() as i128 - 1) * i128::from(range.step);
    let pick = match want {
        Ordering::Less => first.min(last),
        _ => first.max(last),
    };
    i64::try_from(pick)
        .map(Value::Int)
        .map_err(|_| Error::internal("range bound out of i64"))
}

fn fold_extreme(builtin: Builtin, items: Vec<Value>, want: Ordering) -> Result<Value> {
    let mut items = items.into_iter();
    let Some(mut best) = items.next() else {
        return Err(Error::invalid_argument(builtin.name(), "arg is an empty sequence"));
    };
    let symbol = if want == Ordering::Less { "<" } else { ">" };
    for item in items {
        match item.partial_cmp(&best) {
            Some(ordering) if ordering == want => best = item,
            Some(_) => {}
            None if item.value_type().is_numeric() && best.value_type().is_numeric() => {}
            None => return Err(unsupported(symbol, &item, &best)),
        }
    }
    Ok(best)
}

fn native_len(x: &Value) -> Result<Value> {
    let len = match x {
        Value::Str(s) => s.chars().count(),
        Value::Range(r) => r.len(),
        other => return Err(Error::type_mismatch("a str or range", other.value_type())),
    };
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| overflow("len"))
}

fn native_int(x: &Value) -> Result<Value> {
    match x {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => float_to_int(Builtin::Int, f.trunc()),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            Error::invalid_argument(
                Builtin::Int.name(),
                format!("invalid literal for int(): {}", x.repr()),
            )
        }),
        other => Err(Error::type_mismatch("a number or str", other.value_type())),
    }
}

fn native_float(x: &Value) -> Result<Value> {
    match x {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Bool(b) => Ok(Value::Float(f64::from(u8::from(*b)))),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            Error::invalid_argument(
                Builtin::Float.name(),
                format!("could not convert string to float: {}", x.repr()),
            )
        }),
        other => Err(Error::type_mismatch("a number or str", other.value_type())),
    }
}

/// Converts an already-integral float to an int.
fn float_to_int(builtin: Builtin, f: f64) -> Result<Value> {
    if !f.is_finite() {
        return Err(Error::invalid_argument(
            builtin.name(),
            format!("cannot convert float {} to integer", format_float(f)),
        ));
    }
    // i64::MIN is exactly representable; i64::MAX rounds up to 2^63.
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(overflow(builtin.name()));
    }
    Ok(Value::Int(f as i64))
}

/// `round(x)` rounds half to even and returns an int; `round(x, n)` keeps
/// the type of `x`.
fn native_round(x: &Value, digits: Option<&Value>) -> Result<Value> {
    let digits = match digits {
        None | Some(Value::None) => None,
        Some(Value::Int(n)) => Some(*n),
        Some(other) => return Err(Error::type_mismatch("an integer", other.value_type())),
    };
    match (x, digits) {
        (Value::Int(n), None) => Ok(Value::Int(*n)),
        (Value::Int(n), Some(d)) => round_int(*n, d),
        (Value::Float(f), None) => float_to_int(Builtin::Round, f.round_ties_even()),
        (Value::Float(f), Some(d)) => Ok(Value::Float(round_float(*f, d))),
        (other, _) => Err(Error::type_mismatch("a number", other.value_type())),
    }
}

fn round_float(f: f64, digits: i64) -> f64 {
    if !f.is_finite() {
        return f;
    }
    let digits = digits.clamp(-400, 400) as i32;
    let scale = 10f64.powi(digits);
    let scaled = f * scale;
    if !scaled.is_finite() {
        return f;
    }
    let rounded = scaled.round_ties_even() / scale;
    if rounded.is_finite() { rounded } else { f }
}

fn round_int(n: i64, digits: i64) -> Result<Value> {
    if digits >= 0 {
        return Ok(Value::Int(n));
    }
    let Some(p) = u32::try_from(digits.unsigned_abs())
        .ok()
        .and_then(|k| 10i128.checked_pow(k))
    else {
        return Ok(Value::Int(0));
    };
    let n = i128::from(n);
    let mut q = n.div_euclid(p);
    let twice = 2 * n.rem_euclid(p);
    if twice > p || (twice == p && q % 2 != 0) {
        q += 1;
    }
    i64::try_from(q * p)
        .map(Value::Int)
        .map_err(|_| overflow("round"))
}

fn native_range(args: &[Value]) -> Result<Value> {
    let mut bounds = [0i64; 3];
    for (slot, value) in bounds.iter_mut().zip(args) {
        *slot = value
            .as_int()
            .ok_or_else(|| Error::type_mismatch("an integer", value.value_type()))?;
    }
    let (start, stop, step) = match args.len() {
        1 => (0, bounds[0], 1),
        2 => (bounds[0], bounds[1], 1),
        _ => (bounds[0], bounds[1], bounds[2]),
    };
    RangeValue::new(start, stop, step)
        .map(Value::Range)
        .ok_or_else(|| Error::invalid_argument(Builtin::Range.name(), "step must not be zero"))
}
