//! Object space configuration.

/// Settings applied when an [`ObjectSpace`](crate::ObjectSpace) boots.
///
/// # Example
///
/// ```
/// use corundum_registry::{ObjectSpace, SpaceConfig};
///
/// let config = SpaceConfig::default()
///     .with_kernel_name(None)
///     .with_initial_stubs(["to_s", "inspect"]);
/// let space = ObjectSpace::with_config(config);
/// assert!(space.builtins().kernel.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceConfig {
    /// Name of the universal root class.
    pub root_name: String,
    /// Name of the default superclass and top-level lexical scope.
    pub object_name: String,
    /// Name of the class of every module.
    pub module_name: String,
    /// Name of the class of every class.
    pub class_name: String,
    /// Module included into the object class at boot, if any.
    pub kernel_name: Option<String>,
    /// Selectors stubbed on the root class at boot.
    pub initial_stubs: Vec<String>,
    /// Use folded per-type dispatch tables for ordinary sends. When disabled,
    /// every send walks the ancestor chain instead.
    pub dispatch_tables: bool,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            root_name: "BasicObject".to_string(),
            object_name: "Object".to_string(),
            module_name: "Module".to_string(),
            class_name: "Class".to_string(),
            kernel_name: Some("Kernel".to_string()),
            initial_stubs: Vec::new(),
            dispatch_tables: true,
        }
    }
}

impl SpaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    pub fn with_object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = name.into();
        self
    }

    pub fn with_kernel_name(mut self, name: Option<&str>) -> Self {
        self.kernel_name = name.map(str::to_string);
        self
    }

    pub fn with_initial_stubs<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial_stubs = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dispatch_tables(mut self, enabled: bool) -> Self {
        self.dispatch_tables = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SpaceConfig::new();
        assert_eq!(config.root_name, "BasicObject");
        assert_eq!(config.kernel_name.as_deref(), Some("Kernel"));
        assert!(config.dispatch_tables);
        assert!(config.initial_stubs.is_empty());
    }

    #[test]
    fn builder_chain() {
        let config = SpaceConfig::new()
            .with_root_name("Root")
            .with_object_name("Obj")
            .with_dispatch_tables(false)
            .with_initial_stubs(["a", "b"]);
        assert_eq!(config.root_name, "Root");
        assert_eq!(config.object_name, "Obj");
        assert!(!config.dispatch_tables);
        assert_eq!(config.initial_stubs, vec!["a".to_string(), "b".to_string()]);
    }
}
