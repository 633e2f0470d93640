use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use sqlscope_binder::binder::Binder;
use sqlscope_binder::bound::{ColumnGetter, KeepFn};
use sqlscope_binder::error::BindError;
use sqlscope_binder::expr::Expr;
use sqlscope_binder::scope::{
    BindingScope, COLUMN_NAME, ColumnExprScope, ExtractScope, ParamScope, ReadThroughScope,
    TableScope, VALUE_TIMESTAMP, WhenScope,
};
use sqlscope_catalog::config::DatasetConfig;
use sqlscope_catalog::memory::MemoryCatalog;
use sqlscope_catalog::memory::dataset::MemoryDataset;
use sqlscope_catalog::provider::DatasetRef;
use sqlscope_common::path::Path;
use sqlscope_common::timestamp::Timestamp;
use sqlscope_common::value::{Cell, ExpressionValue, VariableFilter};
use sqlscope_common::value_info::{
    AtomType, ColumnSparsity, KnownColumn, RowValueInfo, SchemaCompleteness, ValueInfo,
};
use sqlscope_context::function::{ColumnFunction, ColumnFunctionRegistry};
use sqlscope_context::row_scope::RowScope;
use sqlscope_context::session::SessionContext;

fn ts(millis: i64) -> Timestamp {
    Timestamp::from_millis(millis).unwrap()
}

fn dataset() -> DatasetRef {
    let config = DatasetConfig::new(
        "memory",
        json!({
            "columns": ["name", "score"],
            "rows": [["Ada", 3], ["Grace", 5]],
            "timestamp": 1000,
        }),
    )
    .with_id("people");
    Arc::new(MemoryDataset::from_config(&config).unwrap())
}

fn session() -> SessionContext {
    let catalog = MemoryCatalog::new().with_dataset(dataset());
    let mut functions = ColumnFunctionRegistry::new();
    functions.register(ColumnFunction::new("tagged", |column, args| {
        let tag = args
            .first()
            .and_then(|arg| arg.as_atom())
            .map(|value| value.to_string())
            .unwrap_or_default();
        ExpressionValue::atom(format!("{tag}:{column}"), Timestamp::NegativeInfinity)
    }));
    SessionContext::new(Arc::new(catalog)).with_column_functions(functions)
}

fn table_scope() -> TableScope {
    TableScope::from_dataset(session(), &dataset())
}

fn rows() -> Vec<ExpressionValue> {
    dataset()
        .rows()
        .unwrap()
        .into_iter()
        .map(|row| row.value)
        .collect()
}

fn resolve_through(outer: &dyn BindingScope, layers: usize, path: &Path) -> ColumnGetter {
    if layers == 0 {
        return outer.resolve_column("", path).unwrap();
    }
    let scope = ReadThroughScope::new(outer).unwrap();
    resolve_through(&scope, layers - 1, path)
}

fn evaluate_through(getter: &ColumnGetter, outer: &RowScope<'_>, layers: usize) -> ExpressionValue {
    if layers == 0 {
        return getter.get(outer, VariableFilter::AnyOne);
    }
    let layer = RowScope::read_through(outer);
    evaluate_through(getter, &layer, layers - 1)
}

#[test]
fn test_pivoting_identity() {
    let root = table_scope();
    let path = Path::parse("name");
    let direct = root.resolve_column("", &path).unwrap();
    for row in rows() {
        let table = RowScope::table(&row);
        let expected = direct.get(&table, VariableFilter::AnyOne);
        for layers in [1, 2, 5] {
            let getter = resolve_through(&root, layers, &path);
            assert_eq!(evaluate_through(&getter, &table, layers), expected);
        }
    }
}

#[test]
fn test_constant_arguments_are_not_rebound() {
    let root = table_scope();
    let scope = ReadThroughScope::new(&root).unwrap();
    let binder = Binder::new(&scope);

    let constant = binder
        .bind(&Expr::function("lower", vec![Expr::constant("ABC")]))
        .unwrap();
    assert_eq!(scope.rebind_count(), 0);

    let mixed = binder
        .bind(&Expr::function(
            "coalesce",
            vec![Expr::column("name"), Expr::constant("nobody")],
        ))
        .unwrap();
    assert_eq!(scope.rebind_count(), 1);

    let row = &rows()[0];
    let table = RowScope::table(row);
    let layer = RowScope::read_through(&table);
    assert_eq!(
        mixed.evaluate(&layer),
        ExpressionValue::atom("Ada", ts(1000))
    );

    // Without row data the call is forwarded with the empty context.
    assert_eq!(
        constant.evaluate(&RowScope::Empty),
        ExpressionValue::atom("abc", Timestamp::NegativeInfinity)
    );
}

#[test]
fn test_absent_function_is_not_an_error() {
    let root = table_scope();
    let scope = ReadThroughScope::new(&root).unwrap();
    let found = scope.resolve_function("", "frobnicate", &[], &scope).unwrap();
    assert!(found.is_none());

    let err = Binder::new(&scope)
        .bind(&Expr::function("frobnicate", vec![]))
        .unwrap_err();
    assert!(matches!(err, BindError::UnknownFunction { name } if name == "frobnicate"));
}

#[test]
fn test_errors_pass_through_unchanged() {
    let root = table_scope();
    let scope = ReadThroughScope::new(&root).unwrap();
    let err = scope
        .resolve_column("", &Path::parse("missing"))
        .unwrap_err();
    insta::assert_snapshot!(err, @"column `missing` not found in table `people`");
}

#[test]
fn test_recording_through_binder() {
    let root = ParamScope::default();
    let scope = ExtractScope::recording(&root).unwrap();
    let binder = Binder::new(&scope);
    for name in ["a", "b", "a"] {
        binder.bind(&Expr::column(name)).unwrap();
    }
    assert_eq!(
        scope.inferred_inputs(),
        [Path::parse("a"), Path::parse("b")]
    );
    assert!(!scope.wildcards_seen());

    scope.infer_input();
    let info = scope.input_info().unwrap();
    assert!(info.is_closed());
    insta::assert_snapshot!(info, @"{a?: any, b?: any}");
}

#[test]
fn test_wildcard_makes_inferred_shape_open() {
    let root = ParamScope::default();
    let scope = ExtractScope::recording(&root).unwrap();
    let binder = Binder::new(&scope);
    binder.bind(&Expr::column("a")).unwrap();
    binder.bind(&Expr::prefixed_wildcard("b")).unwrap();
    assert!(scope.wildcards_seen());

    scope.infer_input();
    let info = scope.input_info().unwrap();
    assert_eq!(info.schema_completeness(), SchemaCompleteness::Open);
    insta::assert_snapshot!(info, @"{a?: any, ...}");
}

#[test]
fn test_column_expression_rejections() {
    let root = table_scope();
    let scope = ColumnExprScope::new(&root).unwrap();

    let err = scope
        .resolve_column("", &Path::parse("name"))
        .unwrap_err();
    insta::assert_snapshot!(err, @"cannot read column `name` inside a column expression");
    assert!(matches!(
        scope.resolve_column("people", &Path::parse("x.y")),
        Err(BindError::ColumnInColumnExpr(_))
    ));

    let keep: KeepFn = Arc::new(|path: &Path| Some(path.clone()));
    assert!(matches!(
        scope.resolve_all_columns("", keep),
        Err(BindError::WildcardInColumnExpr)
    ));

    let err = scope
        .resolve_table_name(&Path::parse("people.name"))
        .unwrap_err();
    insta::assert_snapshot!(
        err,
        @"cannot resolve table name of `people.name.*` inside a column expression"
    );

    // A prefixed wildcard asks for the table name first.
    let err = Binder::new(&scope)
        .bind(&Expr::prefixed_wildcard("people"))
        .unwrap_err();
    assert!(matches!(err, BindError::TableNameInColumnExpr(_)));
}

#[test]
fn test_column_expression_functions() {
    let root = table_scope();
    let scope = ColumnExprScope::new(&root).unwrap();
    let binder = Binder::new(&scope);
    let column = Path::parse("address.city");
    let layer = RowScope::column(&column);

    let name = binder
        .bind(&Expr::function(COLUMN_NAME, vec![Expr::constant(1)]))
        .unwrap();
    assert_eq!(
        name.evaluate(&layer),
        ExpressionValue::atom("address.city", Timestamp::NegativeInfinity)
    );

    let tagged = binder
        .bind(&Expr::function("tagged", vec![Expr::constant("t")]))
        .unwrap();
    assert_eq!(*tagged.info, ValueInfo::Atom(AtomType::String));
    assert_eq!(
        tagged.evaluate(&layer),
        ExpressionValue::atom("\"t\":address.city", Timestamp::NegativeInfinity)
    );

    let upper = binder
        .bind(&Expr::function(
            "upper",
            vec![Expr::function(COLUMN_NAME, vec![])],
        ))
        .unwrap();
    assert_eq!(
        upper.evaluate(&layer),
        ExpressionValue::atom("ADDRESS.CITY", Timestamp::NegativeInfinity)
    );

    let err = binder
        .bind(&Expr::function("frobnicate", vec![]))
        .unwrap_err();
    insta::assert_snapshot!(err, @"unknown function: frobnicate");
}

#[test]
fn test_when_scope_timestamp() {
    let root = table_scope();
    let scope = WhenScope::new(&root).unwrap();
    let binder = Binder::new(&scope);

    let name = binder.bind(&Expr::column("name")).unwrap();
    let lower = binder
        .bind(&Expr::function("lower", vec![Expr::column("name")]))
        .unwrap();
    assert!(!scope.is_tuple_dependent());
    assert_eq!(scope.rebind_count(), 1);

    let stamp = binder
        .bind(&Expr::function(VALUE_TIMESTAMP, vec![]))
        .unwrap();
    assert!(scope.is_tuple_dependent());

    let row = &rows()[1];
    let table = RowScope::table(row);
    let layer = RowScope::when(&table, ts(2500));
    assert_eq!(name.evaluate(&layer), ExpressionValue::atom("Grace", ts(1000)));
    assert_eq!(lower.evaluate(&layer), ExpressionValue::atom("grace", ts(1000)));
    assert_eq!(stamp.evaluate(&layer), ExpressionValue::atom(ts(2500), ts(2500)));
}

#[test]
fn test_closed_wildcard_rename_and_drop() {
    let info = ValueInfo::Row(RowValueInfo::new(
        ["x", "y", "z"]
            .into_iter()
            .map(|c| KnownColumn::new(c, ValueInfo::any(), ColumnSparsity::Dense))
            .collect(),
        SchemaCompleteness::Closed,
    ));
    let root = ParamScope::default();
    let extract = ExtractScope::new(&root, &info).unwrap();
    let outer = ReadThroughScope::new(&extract).unwrap();

    let keep: KeepFn = Arc::new(|path: &Path| {
        (path == &Path::parse("x")).then(|| Path::parse("x2"))
    });
    let output = outer.resolve_all_columns("", keep).unwrap();
    insta::assert_snapshot!(output.info, @"{x2: any}");

    let t = ts(7);
    let input = ExpressionValue::row([
        ("x".into(), ExpressionValue::atom(1, t)),
        ("y".into(), ExpressionValue::atom(2, t)),
        ("z".into(), ExpressionValue::atom(3, t)),
    ]);
    let inner = RowScope::extract(&input);
    let layer = RowScope::read_through(&inner);
    assert_eq!(
        output.get(&layer, VariableFilter::AnyOne),
        [Cell::new("x2", 1, t)]
    );
}

#[test]
fn test_extract_missing_column_diagnostic() {
    let root = ParamScope::default();
    let info = ValueInfo::Row(RowValueInfo::new(
        vec![KnownColumn::new(
            "x",
            ValueInfo::any(),
            ColumnSparsity::Sparse,
        )],
        SchemaCompleteness::Closed,
    ));
    let scope = ExtractScope::new(&root, &info).unwrap();
    let err = Binder::new(&scope).bind(&Expr::column("y")).unwrap_err();
    let BindError::ColumnNotFoundInExtract { path, input_info } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(path, &Path::parse("y"));
    assert_eq!(input_info.known_columns().len(), 1);
    insta::assert_snapshot!(err, @"column `y` not found in extraction input {x?: any}");

    let err = Binder::new(&scope)
        .bind(&Expr::qualified_column("t", "x"))
        .unwrap_err();
    assert!(matches!(err, BindError::TableNameInExtract(table) if table == "t"));
}

#[test]
fn test_parameter_passthrough() {
    let root = ParamScope::default();
    let scope = ReadThroughScope::new(&root).unwrap();
    let limit = Binder::new(&scope).bind(&Expr::parameter("limit")).unwrap();
    assert_eq!(*limit.info, ValueInfo::Any);

    let params = HashMap::from([(
        "limit".to_string(),
        ExpressionValue::atom(10, Timestamp::NegativeInfinity),
    )]);
    let lookup = |name: &str| params.get(name).cloned().unwrap_or_default();
    let inner = RowScope::params(&lookup);
    let layer = RowScope::read_through(&inner);
    assert_eq!(
        limit.evaluate(&layer),
        ExpressionValue::atom(10, Timestamp::NegativeInfinity)
    );
}

#[test]
fn test_parameters_unreachable_in_column_expression() {
    let root = ParamScope::default();
    let scope = ColumnExprScope::new(&root).unwrap();
    assert!(matches!(
        scope.resolve_bound_parameter("limit"),
        Err(BindError::Unsupported(_))
    ));
}

#[test]
fn test_concurrent_evaluation() {
    let root = table_scope();
    let scope = ReadThroughScope::new(&root).unwrap();
    let bound = Binder::new(&scope)
        .bind(&Expr::function("upper", vec![Expr::column("name")]))
        .unwrap();
    let rows = rows();

    std::thread::scope(|s| {
        let handles: Vec<_> = rows
            .iter()
            .map(|row| {
                let bound = &bound;
                s.spawn(move || {
                    let table = RowScope::table(row);
                    let layer = RowScope::read_through(&table);
                    (0..100)
                        .map(|_| bound.evaluate(&layer))
                        .last()
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            results,
            [
                ExpressionValue::atom("ADA", ts(1000)),
                ExpressionValue::atom("GRACE", ts(1000)),
            ]
        );
    });
}

#[test]
fn test_nesting_depth_limit() {
    let mut session = session();
    session.options.max_depth(2);
    let root = TableScope::from_dataset(session, &dataset());
    let first = ReadThroughScope::new(&root).unwrap();
    let second = WhenScope::new(&first).unwrap();
    assert_eq!(second.depth(), 2);
    let err = ExtractScope::recording(&second).unwrap_err();
    insta::assert_snapshot!(err, @"scope nesting depth 3 exceeds the limit of 2");
}

#[test]
fn test_dataset_resolution_is_forwarded() {
    let root = table_scope();
    let read_through = ReadThroughScope::new(&root).unwrap();
    let column_expr = ColumnExprScope::new(&read_through).unwrap();
    let extract = ExtractScope::recording(&column_expr).unwrap();

    assert_eq!(extract.resolve_dataset("people").unwrap().name(), "people");
    assert!(matches!(
        extract.resolve_dataset("nobody"),
        Err(BindError::DatasetNotFound(_))
    ));

    let config: DatasetConfig = serde_json::from_value(json!({
        "type": "memory",
        "id": "inline",
        "params": { "columns": ["k"], "rows": [[1], [2], [3]] },
    }))
    .unwrap();
    let inline = extract.resolve_dataset_from_config(&config).unwrap();
    assert_eq!(inline.name(), "inline");
    assert_eq!(inline.rows().unwrap().len(), 3);

    let ragged = DatasetConfig::new("memory", json!({ "columns": ["k"], "rows": [[1, 2]] }));
    assert!(matches!(
        read_through.resolve_dataset_from_config(&ragged),
        Err(BindError::Catalog(_))
    ));

    let root = ParamScope::default();
    assert!(matches!(
        root.resolve_dataset("people"),
        Err(BindError::Unsupported(_))
    ));
}

#[test]
#[should_panic(expected = "row scope layer mismatch")]
fn test_layer_mismatch_is_fatal() {
    let root = table_scope();
    let scope = ReadThroughScope::new(&root).unwrap();
    let name = Binder::new(&scope).bind(&Expr::column("name")).unwrap();
    let row = &rows()[0];
    name.evaluate(&RowScope::table(row));
}
