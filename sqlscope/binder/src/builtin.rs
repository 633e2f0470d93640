//! Functions available in every scope unless a scope shadows them.

use itertools::Itertools;
use sqlscope_common::value::{CellValue, ExpressionValue};
use sqlscope_common::value_info::{AtomType, ValueInfo};
use tracing::trace;

use crate::bound::{BoundExpr, BoundFunction};
use crate::error::{BindError, BindResult};

/// Looks up a built-in function, checking the number of arguments.
///
/// Returns `Ok(None)` if no built-in function is called `name`.
pub(crate) fn lookup(name: &str, args: &[BoundExpr]) -> BindResult<Option<BoundFunction>> {
    let function = match name {
        "lower" => {
            check_arity(name, args, "1", |n| n == 1)?;
            BoundFunction::new(
                |args, _| map_string(args, |s| s.to_lowercase()),
                ValueInfo::atom(AtomType::String),
            )
        }
        "upper" => {
            check_arity(name, args, "1", |n| n == 1)?;
            BoundFunction::new(
                |args, _| map_string(args, |s| s.to_uppercase()),
                ValueInfo::atom(AtomType::String),
            )
        }
        "length" => {
            check_arity(name, args, "1", |n| n == 1)?;
            BoundFunction::new(|args, _| length(args), ValueInfo::atom(AtomType::Integer))
        }
        "coalesce" => {
            check_arity(name, args, "at least 1", |n| n >= 1)?;
            let result_info = args
                .iter()
                .map(|arg| arg.info.clone())
                .all_equal_value()
                .unwrap_or_else(|_| ValueInfo::any());
            BoundFunction::new(
                |args, _| {
                    args.iter()
                        .find(|arg| !arg.is_null())
                        .cloned()
                        .unwrap_or_default()
                },
                result_info,
            )
        }
        "latest_timestamp" => {
            check_arity(name, args, "1", |n| n == 1)?;
            BoundFunction::new(
                |args, _| {
                    let Some(arg) = args.first() else {
                        return ExpressionValue::empty();
                    };
                    let ts = arg.timestamp();
                    ExpressionValue::atom(ts, ts)
                },
                ValueInfo::atom(AtomType::Timestamp),
            )
        }
        _ => return Ok(None),
    };
    trace!(name, arity = args.len(), "resolved builtin function");
    Ok(Some(function))
}

fn check_arity(
    name: &str,
    args: &[BoundExpr],
    expected: &'static str,
    accepts: impl Fn(usize) -> bool,
) -> BindResult<()> {
    if accepts(args.len()) {
        Ok(())
    } else {
        Err(BindError::IncorrectArguments {
            function: name.into(),
            expected,
            actual: args.len(),
        })
    }
}

/// Applies `f` to a string atom. Anything else yields null at the argument's timestamp.
fn map_string(args: &[ExpressionValue], f: impl Fn(&str) -> String) -> ExpressionValue {
    let Some(arg) = args.first() else {
        return ExpressionValue::empty();
    };
    let ts = arg.timestamp();
    match arg.as_atom().and_then(CellValue::try_as_string) {
        Some(s) => ExpressionValue::atom(f(s.as_str()), ts),
        None => ExpressionValue::atom(CellValue::Null, ts),
    }
}

fn length(args: &[ExpressionValue]) -> ExpressionValue {
    let Some(arg) = args.first() else {
        return ExpressionValue::empty();
    };
    let ts = arg.timestamp();
    let len = match arg {
        ExpressionValue::Row(entries) => entries.len(),
        ExpressionValue::Atom { value, .. } => match value.try_as_string() {
            Some(s) => s.chars().count(),
            None => return ExpressionValue::atom(CellValue::Null, ts),
        },
    };
    ExpressionValue::atom(len as i64, ts)
}

#[cfg(test)]
mod tests {
    use sqlscope_common::timestamp::Timestamp;
    use sqlscope_context::row_scope::RowScope;

    use super::*;

    fn constant(value: impl Into<CellValue>) -> BoundExpr {
        let value = value.into();
        BoundExpr::constant(
            ExpressionValue::atom(value, Timestamp::NegativeInfinity),
            ValueInfo::any(),
        )
    }

    fn call(name: &str, args: &[ExpressionValue]) -> ExpressionValue {
        let bound: Vec<_> = args.iter().map(|_| constant(CellValue::Null)).collect();
        let function = lookup(name, &bound).unwrap().unwrap();
        function.call(args, &RowScope::Empty)
    }

    fn atom(value: impl Into<CellValue>) -> ExpressionValue {
        ExpressionValue::atom(value, Timestamp::NegativeInfinity)
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(call("lower", &[atom("AbC")]), atom("abc"));
        assert_eq!(call("upper", &[atom("AbC")]), atom("ABC"));
        assert_eq!(call("length", &[atom("héllo")]), atom(5i64));
        assert!(call("lower", &[atom(1)]).is_null());
    }

    #[test]
    fn test_missing_arguments_yield_empty() {
        for name in ["lower", "upper", "length", "latest_timestamp"] {
            let function = lookup(name, &[constant(CellValue::Null)]).unwrap().unwrap();
            assert_eq!(function.call(&[], &RowScope::Empty), ExpressionValue::empty());
        }
    }

    #[test]
    fn test_length_of_row() {
        let row = ExpressionValue::row([("a".into(), atom(1)), ("b".into(), atom(2))]);
        assert_eq!(call("length", &[row]), atom(2i64));
        assert!(call("length", &[atom(true)]).is_null());
    }

    #[test]
    fn test_coalesce() {
        assert_eq!(
            call("coalesce", &[ExpressionValue::empty(), atom(2), atom(3)]),
            atom(2)
        );
        assert!(call("coalesce", &[ExpressionValue::empty()]).is_null());
    }

    #[test]
    fn test_unknown_and_arity() {
        assert!(lookup("nope", &[]).unwrap().is_none());
        let err = lookup("lower", &[]).unwrap_err();
        insta::assert_snapshot!(
            err,
            @"incorrect number of arguments for function lower: expected 1, got 0"
        );
    }

    #[test]
    fn test_coalesce_result_info() {
        let integer = || BoundExpr::constant(atom(1), ValueInfo::atom(AtomType::Integer));
        let same = [integer(), integer()];
        let info = lookup("coalesce", &same).unwrap().unwrap().result_info;
        assert_eq!(*info, ValueInfo::Atom(AtomType::Integer));

        let mixed = [integer(), constant(2)];
        let info = lookup("coalesce", &mixed).unwrap().unwrap().result_info;
        assert_eq!(*info, ValueInfo::Any);
    }
}
