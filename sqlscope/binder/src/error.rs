use miette::Diagnostic;
use smol_str::SmolStr;
use sqlscope_catalog::error::CatalogError;
use sqlscope_common::error::NotImplemented;
use sqlscope_common::path::Path;
use sqlscope_common::value_info::RowValueInfo;
use thiserror::Error;

/// Errors raised while binding an expression. All of them abort the bind pass and are meant
/// to be reported back to whoever submitted the query.
#[derive(Debug, Error, Diagnostic)]
pub enum BindError {
    #[error("unknown function: {name}")]
    UnknownFunction { name: SmolStr },

    #[error("cannot read column `{0}` inside a column expression")]
    #[diagnostic(help("use columnName() to refer to the current column"))]
    ColumnInColumnExpr(Path),

    #[error("cannot use a wildcard inside a column expression")]
    WildcardInColumnExpr,

    #[error("cannot resolve table name of `{0}.*` inside a column expression")]
    TableNameInColumnExpr(Path),

    #[error("cannot use table name `{0}` inside an extraction")]
    TableNameInExtract(SmolStr),

    #[error("column `{path}` not found in extraction input {input_info}")]
    #[diagnostic(help("the input shape is closed, so only its declared columns can be read"))]
    ColumnNotFoundInExtract {
        path: Path,
        input_info: RowValueInfo,
    },

    #[error("column `{path}` not found in table `{table}`")]
    ColumnNotFound { table: SmolStr, path: Path },

    #[error("table not found: {0}")]
    TableNotFound(SmolStr),

    #[error("dataset not found: {0}")]
    DatasetNotFound(SmolStr),

    #[error(
        "incorrect number of arguments for function {function}: expected {expected}, got {actual}"
    )]
    IncorrectArguments {
        function: SmolStr,
        expected: &'static str,
        actual: usize,
    },

    #[error("{0} is not supported in this context")]
    Unsupported(String),

    #[error("scope nesting depth {depth} exceeds the limit of {max}")]
    NestingTooDeep { depth: usize, max: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    NotImplemented(#[from] NotImplemented),
}

pub type BindResult<T> = std::result::Result<T, BindError>;
