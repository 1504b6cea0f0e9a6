//! Column names of an edge table.

/// Names of the columns holding one incoming flow per row.
///
/// Code columns and the flow column are required. Name columns are optional
/// and ignored when absent from the schema.
///
/// # Examples
/// ```
/// use nodal_providers_parquet::FlowColumns;
///
/// let columns = FlowColumns::default().with_flow("commuters");
/// assert_eq!(columns.flow(), "commuters");
/// assert_eq!(columns.target_code(), "target_code");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowColumns {
    target_code: String,
    target_name: String,
    source_code: String,
    source_name: String,
    flow: String,
}

impl Default for FlowColumns {
    fn default() -> Self {
        Self {
            target_code: "target_code".to_owned(),
            target_name: "target_name".to_owned(),
            source_code: "source_code".to_owned(),
            source_name: "source_name".to_owned(),
            flow: "flow".to_owned(),
        }
    }
}

impl FlowColumns {
    /// Overrides the column holding the receiving node's code.
    #[must_use]
    pub fn with_target_code(mut self, column: impl Into<String>) -> Self {
        self.target_code = column.into();
        self
    }

    /// Overrides the column holding the receiving node's name.
    #[must_use]
    pub fn with_target_name(mut self, column: impl Into<String>) -> Self {
        self.target_name = column.into();
        self
    }

    /// Overrides the column holding the emitting node's code.
    #[must_use]
    pub fn with_source_code(mut self, column: impl Into<String>) -> Self {
        self.source_code = column.into();
        self
    }

    /// Overrides the column holding the emitting node's name.
    #[must_use]
    pub fn with_source_name(mut self, column: impl Into<String>) -> Self {
        self.source_name = column.into();
        self
    }

    /// Overrides the column holding the flow.
    #[must_use]
    pub fn with_flow(mut self, column: impl Into<String>) -> Self {
        self.flow = column.into();
        self
    }

    /// Column holding the receiving node's code.
    #[must_use]
    pub fn target_code(&self) -> &str {
        &self.target_code
    }

    /// Column holding the receiving node's name.
    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Column holding the emitting node's code.
    #[must_use]
    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    /// Column holding the emitting node's name.
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Column holding the flow.
    #[must_use]
    pub fn flow(&self) -> &str {
        &self.flow
    }

    pub(crate) fn all(&self) -> [&str; 5] {
        [
            &self.target_code,
            &self.target_name,
            &self.source_code,
            &self.source_name,
            &self.flow,
        ]
    }
}
