use std::collections::HashMap;
use std::sync::Arc;

use smol_str::SmolStr;
use sqlscope_catalog::config::DatasetConfig;
use sqlscope_catalog::provider::DatasetRef;
use sqlscope_common::path::Path;
use sqlscope_common::value_info::{KnownColumn, RowValueInfo, SchemaCompleteness, ValueInfo};
use sqlscope_context::function::ColumnFunctionRef;
use sqlscope_context::options::BindOptions;
use sqlscope_context::session::SessionContext;
use tracing::debug;

use super::{BindingScope, collect_kept, collect_renamed};
use crate::bound::{AllColumnsOutput, ColumnGetter, KeepFn};
use crate::error::{BindError, BindResult};

/// The root scope of a query over a single table. Rows are read from the
/// [`RowScope::Table`] layer at evaluation time.
///
/// [`RowScope::Table`]: sqlscope_context::row_scope::RowScope::Table
#[derive(Debug)]
pub struct TableScope {
    session: SessionContext,
    table: SmolStr,
    info: RowValueInfo,
}

impl TableScope {
    pub fn new(session: SessionContext, table: impl Into<SmolStr>, info: RowValueInfo) -> Self {
        let table = table.into();
        debug!(%table, shape = %info, "entering table scope");
        Self {
            session,
            table,
            info,
        }
    }

    pub fn from_dataset(session: SessionContext, dataset: &DatasetRef) -> Self {
        Self::new(session, dataset.name(), dataset.row_info().clone())
    }

    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[inline]
    pub fn row_info(&self) -> &RowValueInfo {
        &self.info
    }

    #[inline]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn check_table(&self, table: &str) -> BindResult<()> {
        if table.is_empty() || table == self.table {
            Ok(())
        } else {
            Err(BindError::TableNotFound(table.into()))
        }
    }
}

impl BindingScope for TableScope {
    #[inline]
    fn depth(&self) -> usize {
        0
    }

    #[inline]
    fn options(&self) -> &BindOptions {
        &self.session.options
    }

    fn resolve_column_function(&self, name: &str) -> Option<ColumnFunctionRef> {
        self.session.column_functions().get(name)
    }

    fn resolve_column(&self, table: &str, path: &Path) -> BindResult<ColumnGetter> {
        assert!(!path.is_empty(), "column path must not be empty");
        self.check_table(table)?;
        let info = match self.info.find_nested_column(path) {
            Some(info) => info,
            None if !self.info.is_closed() || path.len() > 1 => ValueInfo::any(),
            None => {
                return Err(BindError::ColumnNotFound {
                    table: self.table.clone(),
                    path: path.clone(),
                });
            }
        };
        let path = path.clone();
        Ok(ColumnGetter::new(
            move |scope, filter| scope.as_table().row.get_nested_column(&path, filter),
            info,
        ))
    }

    fn resolve_all_columns(&self, table: &str, keep: KeepFn) -> BindResult<AllColumnsOutput> {
        self.check_table(table)?;
        if !self.info.is_closed() {
            return Ok(AllColumnsOutput::new(
                move |scope, _| collect_kept(scope.as_table().row, &keep),
                ValueInfo::unknown_row(),
            ));
        }
        let mut renames = HashMap::new();
        let mut columns = Vec::new();
        for column in self.info.known_columns() {
            if let Some(renamed) = keep(&column.path) {
                renames.insert(column.path.clone(), renamed.clone());
                columns.push(KnownColumn {
                    path: renamed,
                    ..column.clone()
                });
            }
        }
        Ok(AllColumnsOutput::new(
            move |scope, _| collect_renamed(scope.as_table().row, &renames),
            Arc::new(ValueInfo::Row(RowValueInfo::new(
                columns,
                SchemaCompleteness::Closed,
            ))),
        ))
    }

    fn resolve_dataset(&self, name: &str) -> BindResult<DatasetRef> {
        self.session
            .catalog()
            .get_dataset(name)?
            .ok_or_else(|| BindError::DatasetNotFound(name.into()))
    }

    fn resolve_dataset_from_config(&self, config: &DatasetConfig) -> BindResult<DatasetRef> {
        Ok(self.session.catalog().create_dataset(config)?)
    }

    fn resolve_table_name(&self, full: &Path) -> BindResult<(Path, SmolStr)> {
        match full.head() {
            Some(head) if *head == self.table => Ok((full.tail(), self.table.clone())),
            _ => Ok((full.clone(), SmolStr::default())),
        }
    }
}
