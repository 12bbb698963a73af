use std::fmt;

/// A `::`-separated constant path such as `Outer::Inner::Widget`.
///
/// Used to look up a constant by path from the top-level scope.
///
/// # Examples
///
/// ```
/// use corundum_core::QualifiedName;
///
/// let widget = QualifiedName::parse("Ui::Widget");
/// assert_eq!(widget.simple_name(), "Widget");
/// assert_eq!(widget.to_string(), "Ui::Widget");
///
/// // A leading `::` marks an absolute path but names the same constant.
/// assert_eq!(QualifiedName::parse("::Ui::Widget"), widget);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    /// Parse a `::`-separated path. Empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split("::")
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// The last segment, or `""` for an empty path.
    pub fn simple_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

impl From<&str> for QualifiedName {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}
