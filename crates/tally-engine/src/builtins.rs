//! Built-in native functions and their metadata.
//!
//! Conventions:
//! - Operator functions are registered under their symbol (`+`, `^`, ...)
//!   so resolved operator chains evaluate without extra wiring.
//! - Named functions are ALL CAPS (e.g. `SUM`, `AVG`).
//! - NULL counts as 0 in arithmetic, like an empty spreadsheet cell.
//! - If you add a built-in, list it in `BUILTINS` and register it in
//!   `register_builtins`.

use rand::Rng;
use std::cmp::Ordering;

use crate::engine::{Graph, Value};
use crate::error::FunctionError;

pub struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "+",
        description: "Sum of numbers, or concatenation if any argument is text",
    },
    Builtin {
        name: "-",
        description: "Negation (one argument) or subtraction (two)",
    },
    Builtin {
        name: "*",
        description: "Product of numbers",
    },
    Builtin {
        name: "/",
        description: "Division",
    },
    Builtin {
        name: "%",
        description: "Remainder",
    },
    Builtin {
        name: "^",
        description: "Exponentiation",
    },
    Builtin {
        name: "|",
        description: "Logical or",
    },
    Builtin {
        name: "&",
        description: "Logical and",
    },
    Builtin {
        name: "!",
        description: "Logical not",
    },
    Builtin {
        name: "==",
        description: "Equality",
    },
    Builtin {
        name: "<",
        description: "Less than (numbers or text)",
    },
    Builtin {
        name: ">",
        description: "Greater than (numbers or text)",
    },
    Builtin {
        name: "SUM",
        description: "Sum of numeric arguments",
    },
    Builtin {
        name: "AVG",
        description: "Mean of numeric arguments",
    },
    Builtin {
        name: "MIN",
        description: "Smallest numeric argument",
    },
    Builtin {
        name: "MAX",
        description: "Largest numeric argument",
    },
    Builtin {
        name: "ABS",
        description: "Absolute value",
    },
    Builtin {
        name: "ROUND",
        description: "Round to the given number of decimals (default 0)",
    },
    Builtin {
        name: "IF",
        description: "IF(cond, then, else): pick a value by truthiness",
    },
    Builtin {
        name: "LEN",
        description: "Length of a text value in characters",
    },
    Builtin {
        name: "CONCAT",
        description: "Join values as text",
    },
    Builtin {
        name: "RAND",
        description: "Random number in [0, 1)",
    },
];

type FnResult = Result<Value, FunctionError>;

fn to_number(value: &Value) -> Result<f64, FunctionError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Null => Ok(0.0),
        other => Err(FunctionError::Type {
            expected: "number",
            found: other.type_name(),
        }),
    }
}

fn to_numbers(args: &[Value]) -> Result<Vec<f64>, FunctionError> {
    args.iter().map(to_number).collect()
}

fn arity(args: &[Value], expected: usize) -> Result<(), FunctionError> {
    if args.len() != expected {
        return Err(FunctionError::Arity {
            expected: expected.to_string(),
            found: args.len(),
        });
    }
    Ok(())
}

fn binary(args: &[Value]) -> Result<(f64, f64), FunctionError> {
    arity(args, 2)?;
    Ok((to_number(&args[0])?, to_number(&args[1])?))
}

fn plus(_: &Graph, args: &[Value]) -> FnResult {
    if args.iter().any(|v| matches!(v, Value::Str(_))) {
        return concat(args);
    }
    Ok(Value::Number(to_numbers(args)?.into_iter().sum()))
}

fn minus(_: &Graph, args: &[Value]) -> FnResult {
    match args {
        [x] => Ok(Value::Number(-to_number(x)?)),
        [a, b] => Ok(Value::Number(to_number(a)? - to_number(b)?)),
        _ => Err(FunctionError::Arity {
            expected: "1 or 2".to_string(),
            found: args.len(),
        }),
    }
}

fn divide(_: &Graph, args: &[Value]) -> FnResult {
    let (a, b) = binary(args)?;
    if b == 0.0 {
        return Err(FunctionError::Domain("division by zero".to_string()));
    }
    Ok(Value::Number(a / b))
}

fn remainder(_: &Graph, args: &[Value]) -> FnResult {
    let (a, b) = binary(args)?;
    if b == 0.0 {
        return Err(FunctionError::Domain("remainder by zero".to_string()));
    }
    Ok(Value::Number(a % b))
}

fn compare(args: &[Value]) -> Result<Ordering, FunctionError> {
    arity(args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (a, b) => {
            let (a, b) = (to_number(a)?, to_number(b)?);
            a.partial_cmp(&b)
                .ok_or_else(|| FunctionError::Domain("cannot compare NaN".to_string()))
        }
    }
}

fn concat(args: &[Value]) -> FnResult {
    let text: String = args
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| v.to_string())
        .collect();
    Ok(Value::Str(text))
}

fn fold_nonempty(args: &[Value], f: fn(f64, f64) -> f64) -> FnResult {
    let nums = to_numbers(args)?;
    let mut iter = nums.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| FunctionError::Domain("no values".to_string()))?;
    Ok(Value::Number(iter.fold(first, f)))
}

/// Register every built-in on `graph`. Existing registrations with the same
/// names are replaced.
pub fn register_builtins(graph: &mut Graph) {
    graph.register_function("+", plus);
    graph.register_function("-", minus);
    graph.register_function("*", |_, args| {
        Ok(Value::Number(to_numbers(args)?.into_iter().product()))
    });
    graph.register_function("/", divide);
    graph.register_function("%", remainder);
    graph.register_function("^", |_, args| {
        let (a, b) = binary(args)?;
        Ok(Value::Number(a.powf(b)))
    });

    graph.register_function("|", |_, args| {
        Ok(Value::Bool(args.iter().any(Value::is_truthy)))
    });
    graph.register_function("&", |_, args| {
        Ok(Value::Bool(args.iter().all(Value::is_truthy)))
    });
    graph.register_function("!", |_, args| {
        arity(args, 1)?;
        Ok(Value::Bool(!args[0].is_truthy()))
    });

    graph.register_function("==", |_, args| {
        arity(args, 2)?;
        Ok(Value::Bool(args[0] == args[1]))
    });
    graph.register_function("<", |_, args| {
        Ok(Value::Bool(compare(args)? == Ordering::Less))
    });
    graph.register_function(">", |_, args| {
        Ok(Value::Bool(compare(args)? == Ordering::Greater))
    });

    graph.register_function("SUM", |_, args| {
        Ok(Value::Number(to_numbers(args)?.into_iter().sum()))
    });
    graph.register_function("AVG", |_, args| {
        let nums = to_numbers(args)?;
        if nums.is_empty() {
            return Err(FunctionError::Domain("no values".to_string()));
        }
        Ok(Value::Number(nums.iter().sum::<f64>() / nums.len() as f64))
    });
    graph.register_function("MIN", |_, args| fold_nonempty(args, f64::min));
    graph.register_function("MAX", |_, args| fold_nonempty(args, f64::max));
    graph.register_function("ABS", |_, args| {
        arity(args, 1)?;
        Ok(Value::Number(to_number(&args[0])?.abs()))
    });
    graph.register_function("ROUND", |_, args| {
        let (x, digits) = match args {
            [x] => (to_number(x)?, 0.0),
            [x, d] => (to_number(x)?, to_number(d)?),
            _ => {
                return Err(FunctionError::Arity {
                    expected: "1 or 2".to_string(),
                    found: args.len(),
                });
            }
        };
        let scale = 10f64.powi(digits as i32);
        Ok(Value::Number((x * scale).round() / scale))
    });
    graph.register_function("IF", |_, args| match args {
        [cond, then] => Ok(if cond.is_truthy() { then.clone() } else { Value::Null }),
        [cond, then, otherwise] => Ok(if cond.is_truthy() {
            then.clone()
        } else {
            otherwise.clone()
        }),
        _ => Err(FunctionError::Arity {
            expected: "2 or 3".to_string(),
            found: args.len(),
        }),
    });
    graph.register_function("LEN", |_, args| {
        arity(args, 1)?;
        match &args[0] {
            Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
            other => Err(FunctionError::Type {
                expected: "string",
                found: other.type_name(),
            }),
        }
    });
    graph.register_function("CONCAT", |_, args| concat(args));
    graph.register_function("RAND", |_, args| {
        arity(args, 0)?;
        Ok(Value::Number(rand::thread_rng().r#gen()))
    });
}
