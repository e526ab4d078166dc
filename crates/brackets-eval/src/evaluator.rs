//! Expression evaluator.

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use crate::value::{self, number, stringify, to_number};
use brackets_types::expr::{BinOp, Expr, TemplatePart, UnaryOp};
use serde_json::Value;
use std::cmp::Ordering;

/// Evaluates expressions against a borrowed environment.
pub struct Evaluator<'env> {
    env: &'env Environment,
}

impl<'env> Evaluator<'env> {
    pub fn new(env: &'env Environment) -> Self {
        Self { env }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a Value.
    pub fn eval(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Number(n) => Ok(number(*n)),
            Expr::Str(s) => Ok(Value::String(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null | Expr::Undefined => Ok(Value::Null),

            Expr::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(text) => out.push_str(text),
                        TemplatePart::Expr(inner) => out.push_str(&stringify(&self.eval(inner)?)),
                    }
                }
                Ok(Value::String(out))
            }
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Array),

            Expr::Identifier(name) => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),

            Expr::Member { object, property } => {
                let object = self.eval(object)?;
                Ok(property_of(&object, property))
            }
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                Ok(index_of(&object, &index))
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                let receiver = self.eval(object)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                call_method(&receiver, method, &args)
            }

            Expr::Unary { op, operand } => self.eval_unary(*op, operand),
            Expr::Binary { left, op, right } => self.eval_binary(left, *op, right),
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if value::is_truthy(&self.eval(cond)?) {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
        }
    }

    fn eval_unary(&self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        if op == UnaryOp::TypeOf {
            // `typeof missing` is not an error.
            if let Expr::Identifier(name) = operand {
                if self.env.get(name).is_none() {
                    return Ok(Value::String("undefined".into()));
                }
            }
            if matches!(operand, Expr::Undefined) {
                return Ok(Value::String("undefined".into()));
            }
        }
        let value = self.eval(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value::is_truthy(&value)),
            UnaryOp::Neg => number(-to_number(&value)),
            UnaryOp::Plus => number(to_number(&value)),
            UnaryOp::TypeOf => Value::String(value::type_of(&value).into()),
        })
    }

    fn eval_binary(&self, left: &Expr, op: BinOp, right: &Expr) -> EvalResult<Value> {
        // Short-circuiting operators yield an operand, not a boolean.
        match op {
            BinOp::And => {
                let l = self.eval(left)?;
                return if value::is_truthy(&l) { self.eval(right) } else { Ok(l) };
            }
            BinOp::Or => {
                let l = self.eval(left)?;
                return if value::is_truthy(&l) { Ok(l) } else { self.eval(right) };
            }
            BinOp::Coalesce => {
                let l = self.eval(left)?;
                return if l.is_null() { self.eval(right) } else { Ok(l) };
            }
            _ => {}
        }

        let l = self.eval(left)?;
        let r = self.eval(right)?;
        Ok(match op {
            BinOp::Add => value::add(&l, &r),
            BinOp::Sub => number(to_number(&l) - to_number(&r)),
            BinOp::Mul => number(to_number(&l) * to_number(&r)),
            BinOp::Div => number(to_number(&l) / to_number(&r)),
            BinOp::Mod => number(to_number(&l) % to_number(&r)),
            BinOp::Less => Value::Bool(value::compare(&l, &r) == Some(Ordering::Less)),
            BinOp::LessEq => Value::Bool(matches!(
                value::compare(&l, &r),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinOp::Greater => Value::Bool(value::compare(&l, &r) == Some(Ordering::Greater)),
            BinOp::GreaterEq => Value::Bool(matches!(
                value::compare(&l, &r),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            BinOp::LooseEq => Value::Bool(value::loose_equals(&l, &r)),
            BinOp::LooseNotEq => Value::Bool(!value::loose_equals(&l, &r)),
            BinOp::StrictEq => Value::Bool(value::strict_equals(&l, &r)),
            BinOp::StrictNotEq => Value::Bool(!value::strict_equals(&l, &r)),
            BinOp::And | BinOp::Or | BinOp::Coalesce => Value::Null,
        })
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Property access
// ══════════════════════════════════════════════════════════════════════════

/// `object.property`. Missing properties and reads on `null` yield `null`.
pub fn property_of(object: &Value, property: &str) -> Value {
    match (object, property) {
        (Value::String(s), "length") => Value::from(s.chars().count()),
        (Value::Array(items), "length") => Value::from(items.len()),
        (Value::Array(items), key) => key
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Value::Null),
        (Value::Object(map), key) => map.get(key).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// `object[index]`.
pub fn index_of(object: &Value, index: &Value) -> Value {
    match (object, index) {
        (Value::Array(items), Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0)
            .and_then(|f| items.get(f as usize))
            .cloned()
            .unwrap_or(Value::Null),
        (Value::String(s), Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0)
            .and_then(|f| s.chars().nth(f as usize))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null),
        _ => property_of(object, &stringify(index)),
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Built-in methods
// ══════════════════════════════════════════════════════════════════════════

fn call_method(receiver: &Value, method: &str, args: &[Value]) -> EvalResult<Value> {
    if method == "toString" {
        return Ok(Value::String(stringify(receiver)));
    }
    match receiver {
        Value::String(s) => string_method(s, method, args),
        Value::Array(items) => array_method(items, method, args),
        Value::Number(n) if method == "toFixed" => {
            let digits = args.first().map(to_number).unwrap_or(0.0).clamp(0.0, 100.0) as usize;
            Ok(Value::String(format!(
                "{:.*}",
                digits,
                n.as_f64().unwrap_or(f64::NAN)
            )))
        }
        other => Err(unknown_method(other, method)),
    }
}

fn unknown_method(receiver: &Value, method: &str) -> EvalError {
    EvalError::UnknownMethod {
        method: method.to_string(),
        type_name: value::type_name(receiver),
    }
}

fn arg_string(args: &[Value], i: usize) -> String {
    args.get(i).map(stringify).unwrap_or_else(|| "undefined".into())
}

/// Resolve a JavaScript `slice` bound against `len`.
fn slice_bound(arg: Option<&Value>, len: usize, default: usize) -> usize {
    match arg {
        None | Some(Value::Null) => default,
        Some(v) => {
            let n = to_number(v);
            if n.is_nan() {
                0
            } else if n < 0.0 {
                len.saturating_sub((-n) as usize)
            } else {
                (n as usize).min(len)
            }
        }
    }
}

fn string_method(s: &str, method: &str, args: &[Value]) -> EvalResult<Value> {
    let result = match method {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "includes" => Value::Bool(s.contains(&arg_string(args, 0))),
        "startsWith" => Value::Bool(s.starts_with(&arg_string(args, 0))),
        "endsWith" => Value::Bool(s.ends_with(&arg_string(args, 0))),
        "indexOf" => {
            let needle = arg_string(args, 0);
            match s.find(&needle) {
                Some(byte) => Value::from(s[..byte].chars().count()),
                None => Value::from(-1),
            }
        }
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let start = slice_bound(args.first(), chars.len(), 0);
            let end = slice_bound(args.get(1), chars.len(), chars.len());
            let slice = if start < end { &chars[start..end] } else { &[][..] };
            Value::String(slice.iter().collect())
        }
        "split" => {
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::Null) => vec![Value::String(s.to_string())],
                Some(sep) => {
                    let sep = stringify(sep);
                    if sep.is_empty() {
                        s.chars().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(|p| Value::String(p.to_string())).collect()
                    }
                }
            };
            Value::Array(parts)
        }
        _ => return Err(unknown_method(&Value::String(s.to_string()), method)),
    };
    Ok(result)
}

fn array_method(items: &[Value], method: &str, args: &[Value]) -> EvalResult<Value> {
    let needle = args.first().cloned().unwrap_or(Value::Null);
    let result = match method {
        "includes" => Value::Bool(items.iter().any(|item| value::strict_equals(item, &needle))),
        "indexOf" => items
            .iter()
            .position(|item| value::strict_equals(item, &needle))
            .map(Value::from)
            .unwrap_or_else(|| Value::from(-1)),
        "join" => {
            let sep = match args.first() {
                None | Some(Value::Null) => ",".to_string(),
                Some(sep) => stringify(sep),
            };
            Value::String(
                items
                    .iter()
                    .map(|item| if item.is_null() { String::new() } else { stringify(item) })
                    .collect::<Vec<_>>()
                    .join(&sep),
            )
        }
        "slice" => {
            let start = slice_bound(args.first(), items.len(), 0);
            let end = slice_bound(args.get(1), items.len(), items.len());
            let slice = if start < end { &items[start..end] } else { &[][..] };
            Value::Array(slice.to_vec())
        }
        _ => return Err(unknown_method(&Value::Array(Vec::new()), method)),
    };
    Ok(result)
}
