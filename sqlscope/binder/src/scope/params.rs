use smol_str::SmolStr;
use sqlscope_common::value_info::ValueInfo;
use sqlscope_context::options::BindOptions;

use super::BindingScope;
use crate::bound::ColumnGetter;
use crate::error::BindResult;

/// A root scope where only query parameters are free. Values come from the lookup carried by
/// the [`RowScope::Params`] layer at evaluation time.
///
/// [`RowScope::Params`]: sqlscope_context::row_scope::RowScope::Params
#[derive(Debug, Default)]
pub struct ParamScope {
    options: BindOptions,
}

impl ParamScope {
    pub fn new(options: BindOptions) -> Self {
        Self { options }
    }
}

impl BindingScope for ParamScope {
    #[inline]
    fn depth(&self) -> usize {
        0
    }

    #[inline]
    fn options(&self) -> &BindOptions {
        &self.options
    }

    fn resolve_bound_parameter(&self, name: &str) -> BindResult<ColumnGetter> {
        let name = SmolStr::from(name);
        Ok(ColumnGetter::new(
            move |scope, _| (scope.as_params().params)(name.as_str()),
            ValueInfo::any(),
        ))
    }
}
