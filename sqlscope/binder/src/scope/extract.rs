use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use smol_str::SmolStr;
use sqlscope_catalog::config::DatasetConfig;
use sqlscope_catalog::provider::DatasetRef;
use sqlscope_common::path::Path;
use sqlscope_common::value_info::{
    ColumnSparsity, KnownColumn, RowValueInfo, SchemaCompleteness, ValueInfo, ValueInfoRef,
};
use sqlscope_context::function::ColumnFunctionRef;
use sqlscope_context::options::BindOptions;
use tracing::{debug, trace};

use super::{BindingScope, collect_kept, collect_renamed, nested_depth};
use crate::bound::{AllColumnsOutput, BoundExpr, BoundFunction, ColumnGetter, KeepFn};
use crate::error::{BindError, BindResult};

#[derive(Debug)]
enum ExtractState {
    /// The input shape is unknown; every column asked for is written down.
    Recording {
        inferred: Vec<Path>,
        seen: HashSet<Path>,
        wildcards: bool,
    },
    Resolved(Arc<RowValueInfo>),
}

/// Binds expressions that pick fields out of a single structured value, found in the
/// [`RowScope::Extract`] layer at evaluation time.
///
/// When the shape of the value is known up front, references are checked against it. When
/// it is not, the scope starts out recording: each column it is asked for is remembered, and
/// [`ExtractScope::infer_input`] later turns those into a declared shape.
///
/// [`RowScope::Extract`]: sqlscope_context::row_scope::RowScope::Extract
#[derive(Debug)]
pub struct ExtractScope<'a> {
    outer: &'a dyn BindingScope,
    depth: usize,
    state: RefCell<ExtractState>,
}

impl<'a> ExtractScope<'a> {
    /// Creates a scope over a value of known shape.
    pub fn new(outer: &'a dyn BindingScope, input_info: &ValueInfo) -> BindResult<Self> {
        let depth = nested_depth(outer)?;
        debug!(depth, input = %input_info, "entering extract scope");
        Ok(Self {
            outer,
            depth,
            state: RefCell::new(ExtractState::Resolved(Arc::new(input_info.to_row()))),
        })
    }

    /// Creates a scope over a value whose shape is inferred from what is read out of it.
    pub fn recording(outer: &'a dyn BindingScope) -> BindResult<Self> {
        let depth = nested_depth(outer)?;
        debug!(depth, "entering extract scope in recording mode");
        Ok(Self {
            outer,
            depth,
            state: RefCell::new(ExtractState::Recording {
                inferred: Vec::new(),
                seen: HashSet::new(),
                wildcards: false,
            }),
        })
    }

    /// Turns the recorded columns into the declared input shape.
    ///
    /// Every recorded path becomes a sparse column of unknown type. The shape is open if a
    /// wildcard was expanded while recording, since it may match columns never named.
    ///
    /// # Panics
    /// Panics if the input shape is already known.
    pub fn infer_input(&self) {
        let mut state = self.state.borrow_mut();
        let ExtractState::Recording {
            inferred,
            wildcards,
            ..
        } = &mut *state
        else {
            panic!("input of extract scope inferred twice");
        };
        let completeness = if *wildcards {
            SchemaCompleteness::Open
        } else {
            SchemaCompleteness::Closed
        };
        let columns = inferred
            .drain(..)
            .map(|path| KnownColumn::new(path, ValueInfo::any(), ColumnSparsity::Sparse))
            .collect();
        let info = RowValueInfo::new(columns, completeness);
        debug!(depth = self.depth, input = %info, "inferred extract input");
        *state = ExtractState::Resolved(Arc::new(info));
    }

    /// The columns recorded so far, in the order they were first asked for.
    pub fn inferred_inputs(&self) -> Vec<Path> {
        match &*self.state.borrow() {
            ExtractState::Recording { inferred, .. } => inferred.clone(),
            ExtractState::Resolved(_) => Vec::new(),
        }
    }

    /// Whether a wildcard was expanded while recording.
    pub fn wildcards_seen(&self) -> bool {
        matches!(
            &*self.state.borrow(),
            ExtractState::Recording { wildcards: true, .. }
        )
    }

    /// The declared input shape, once known.
    pub fn input_info(&self) -> Option<Arc<RowValueInfo>> {
        match &*self.state.borrow() {
            ExtractState::Recording { .. } => None,
            ExtractState::Resolved(info) => Some(info.clone()),
        }
    }
}

fn navigate(path: &Path, info: ValueInfoRef) -> ColumnGetter {
    let path = path.clone();
    ColumnGetter::new(
        move |scope, filter| scope.as_extract().input.get_nested_column(&path, filter),
        info,
    )
}

impl BindingScope for ExtractScope<'_> {
    #[inline]
    fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    fn options(&self) -> &BindOptions {
        self.outer.options()
    }

    #[inline]
    fn resolve_function(
        &self,
        table: &str,
        name: &str,
        args: &[BoundExpr],
        arg_scope: &dyn BindingScope,
    ) -> BindResult<Option<BoundFunction>> {
        self.outer.resolve_function(table, name, args, arg_scope)
    }

    #[inline]
    fn resolve_column_function(&self, name: &str) -> Option<ColumnFunctionRef> {
        self.outer.resolve_column_function(name)
    }

    fn resolve_column(&self, table: &str, path: &Path) -> BindResult<ColumnGetter> {
        assert!(!path.is_empty(), "column path must not be empty");
        if !table.is_empty() {
            return Err(BindError::TableNameInExtract(table.into()));
        }
        let mut state = self.state.borrow_mut();
        let info = match &mut *state {
            ExtractState::Recording { inferred, seen, .. } => {
                if seen.insert(path.clone()) {
                    trace!(%path, "recording extract input");
                    inferred.push(path.clone());
                }
                return Ok(navigate(path, ValueInfo::any()));
            }
            ExtractState::Resolved(info) => info,
        };
        if let Some(found) = info.find_nested_column(path) {
            return Ok(navigate(path, found));
        }
        // A deeper path may still live inside a column of unknown type.
        if !info.is_closed() || path.len() > 1 {
            return Ok(navigate(path, ValueInfo::any()));
        }
        Err(BindError::ColumnNotFoundInExtract {
            path: path.clone(),
            input_info: (**info).clone(),
        })
    }

    fn resolve_all_columns(&self, _table: &str, keep: KeepFn) -> BindResult<AllColumnsOutput> {
        let mut state = self.state.borrow_mut();
        let info = match &mut *state {
            ExtractState::Recording { wildcards, .. } => {
                *wildcards = true;
                None
            }
            ExtractState::Resolved(info) if !info.is_closed() => None,
            ExtractState::Resolved(info) => Some(info.clone()),
        };

        let Some(info) = info else {
            return Ok(AllColumnsOutput::new(
                move |scope, _| collect_kept(scope.as_extract().input, &keep),
                ValueInfo::unknown_row(),
            ));
        };

        // The shape is closed, so the set of columns to keep is settled now rather than for
        // every row.
        let mut renames = HashMap::new();
        let mut columns = Vec::new();
        for column in info.known_columns() {
            let Some(renamed) = keep(&column.path) else {
                continue;
            };
            renames.insert(column.path.clone(), renamed.clone());
            columns.push(KnownColumn {
                path: renamed,
                ..column.clone()
            });
        }
        Ok(AllColumnsOutput::new(
            move |scope, _| collect_renamed(scope.as_extract().input, &renames),
            Arc::new(ValueInfo::Row(RowValueInfo::new(
                columns,
                SchemaCompleteness::Closed,
            ))),
        ))
    }

    #[inline]
    fn resolve_dataset(&self, name: &str) -> BindResult<DatasetRef> {
        self.outer.resolve_dataset(name)
    }

    #[inline]
    fn resolve_dataset_from_config(&self, config: &DatasetConfig) -> BindResult<DatasetRef> {
        self.outer.resolve_dataset_from_config(config)
    }

    #[inline]
    fn resolve_table_name(&self, full: &Path) -> BindResult<(Path, SmolStr)> {
        self.outer.resolve_table_name(full)
    }
}
