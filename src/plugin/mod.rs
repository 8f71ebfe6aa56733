//! Plugin registration and resolution.
//!
//! Topology generators and test cases are selected by name from
//! configuration. Each plugin module is registered up front in a
//! [`PluginPackage`] together with its entry point, so unknown names are
//! rejected at startup and resolution never depends on member ordering.
//!
//! A module is expected to expose exactly one entry point. Modules with no
//! entry point or with several of them fail resolution with a dedicated
//! error rather than picking one arbitrarily.

use std::collections::BTreeMap;
use std::fmt;

/// Errors raised while locating or resolving a plugin
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("No module named '{namespace}.{name}'")]
    ModuleNotFound { namespace: String, name: String },
    #[error("Plugin module '{0}' does not define an entry point")]
    NoEntryPoint(String),
    #[error("Plugin module '{module}' defines {count} entry points ({names}), expected exactly one")]
    AmbiguousEntryPoint {
        module: String,
        count: usize,
        names: String,
    },
    #[error("Plugin module '{namespace}.{name}' is already registered")]
    DuplicateModule { namespace: String, name: String },
}

/// Failure reported by a plugin while it is being invoked.
///
/// `Contract` means the plugin was called with, or produced, something that
/// does not fit the expected plugin interface. `Runtime` is any other
/// failure inside an otherwise well-formed plugin.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PluginFault {
    #[error("contract violation: {0}")]
    Contract(String),
    #[error("{0}")]
    Runtime(String),
}

impl PluginFault {
    pub fn contract<S: Into<String>>(msg: S) -> Self {
        PluginFault::Contract(msg.into())
    }

    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        PluginFault::Runtime(msg.into())
    }
}

/// Constructor for a plugin entry point
pub type Factory<T> = Box<dyn Fn() -> Box<T> + Send + Sync>;

/// A named entry point inside a plugin module
pub struct EntryPoint<T: ?Sized> {
    pub name: String,
    tag: Option<String>,
    factory: Factory<T>,
}

impl<T: ?Sized> EntryPoint<T> {
    /// Create a fresh plugin instance
    pub fn instantiate(&self) -> Box<T> {
        (self.factory)()
    }

    /// Tag declared at registration, readable without instantiating
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

impl<T: ?Sized> fmt::Debug for EntryPoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish()
    }
}

/// A plugin module: a name plus the entry points it declares
pub struct PluginModule<T: ?Sized> {
    pub name: String,
    entry_points: Vec<EntryPoint<T>>,
}

impl<T: ?Sized> PluginModule<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_points: Vec::new(),
        }
    }

    /// Declare an entry point, keeping declaration order
    pub fn with_entry_point<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<T> + Send + Sync + 'static,
    {
        self.entry_points.push(EntryPoint {
            name: name.into(),
            tag: None,
            factory: Box::new(factory),
        });
        self
    }

    /// Declare an entry point carrying a tag, e.g. a test case trigger
    pub fn with_tagged_entry_point<F>(
        mut self,
        name: impl Into<String>,
        tag: impl Into<String>,
        factory: F,
    ) -> Self
    where
        F: Fn() -> Box<T> + Send + Sync + 'static,
    {
        self.entry_points.push(EntryPoint {
            name: name.into(),
            tag: Some(tag.into()),
            factory: Box::new(factory),
        });
        self
    }

    pub fn entry_points(&self) -> &[EntryPoint<T>] {
        &self.entry_points
    }
}

impl<T: ?Sized> fmt::Debug for PluginModule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginModule")
            .field("name", &self.name)
            .field("entry_points", &self.entry_points)
            .finish()
    }
}

/// Resolve the single entry point of a module
pub fn resolve<T: ?Sized>(module: &PluginModule<T>) -> Result<&EntryPoint<T>, PluginError> {
    match module.entry_points.as_slice() {
        [] => Err(PluginError::NoEntryPoint(module.name.clone())),
        [entry] => Ok(entry),
        many => Err(PluginError::AmbiguousEntryPoint {
            module: module.name.clone(),
            count: many.len(),
            names: many
                .iter()
                .map(|e| e.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// A namespace of plugin modules, e.g. `internal_network` or `test_cases`
pub struct PluginPackage<T: ?Sized> {
    namespace: String,
    modules: BTreeMap<String, PluginModule<T>>,
}

impl<T: ?Sized> PluginPackage<T> {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            modules: BTreeMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register a module under its name
    pub fn register(&mut self, module: PluginModule<T>) -> Result<(), PluginError> {
        if self.modules.contains_key(&module.name) {
            return Err(PluginError::DuplicateModule {
                namespace: self.namespace.clone(),
                name: module.name.clone(),
            });
        }
        log::debug!("Registered plugin module {}.{}", self.namespace, module.name);
        self.modules.insert(module.name.clone(), module);
        Ok(())
    }

    /// Look up a module by name
    pub fn load_module(&self, name: &str) -> Result<&PluginModule<T>, PluginError> {
        self.modules
            .get(name)
            .ok_or_else(|| PluginError::ModuleNotFound {
                namespace: self.namespace.clone(),
                name: name.to_string(),
            })
    }

    /// Look up a module and resolve its entry point in one step
    pub fn resolve(&self, name: &str) -> Result<&EntryPoint<T>, PluginError> {
        resolve(self.load_module(name)?)
    }

    /// Check that a configured name refers to a resolvable module
    pub fn ensure_registered(&self, name: &str) -> Result<(), PluginError> {
        self.resolve(name).map(|_| ())
    }

    /// Modules in discovery order (sorted by name)
    pub fn modules(&self) -> impl Iterator<Item = &PluginModule<T>> {
        self.modules.values()
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<T: ?Sized> fmt::Debug for PluginPackage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginPackage")
            .field("namespace", &self.namespace)
            .field("modules", &self.module_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
    }

    struct Hello;
    impl Greeter for Hello {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    struct Bye;
    impl Greeter for Bye {
        fn greet(&self) -> String {
            "bye".to_string()
        }
    }

    fn package() -> PluginPackage<dyn Greeter> {
        let mut package = PluginPackage::new("greeters");
        package
            .register(PluginModule::<dyn Greeter>::new("hello").with_entry_point("Hello", || Box::new(Hello)))
            .unwrap();
        package
            .register(
                PluginModule::<dyn Greeter>::new("both")
                    .with_entry_point("Hello", || Box::new(Hello))
                    .with_entry_point("Bye", || Box::new(Bye)),
            )
            .unwrap();
        package.register(PluginModule::<dyn Greeter>::new("empty")).unwrap();
        package
    }

    #[test]
    fn test_resolve_single_entry_point() {
        let package = package();
        let entry = package.resolve("hello").unwrap();
        assert_eq!(entry.name, "Hello");
        assert_eq!(entry.instantiate().greet(), "hello");
    }

    #[test]
    fn test_resolve_without_entry_point_fails() {
        let package = package();
        let err = package.resolve("empty").unwrap_err();
        assert!(matches!(err, PluginError::NoEntryPoint(ref m) if m == "empty"));
    }

    #[test]
    fn test_resolve_with_several_entry_points_fails() {
        let package = package();
        let err = package.resolve("both").unwrap_err();
        match err {
            PluginError::AmbiguousEntryPoint { module, count, names } => {
                assert_eq!(module, "both");
                assert_eq!(count, 2);
                assert_eq!(names, "Hello, Bye");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tagged_entry_point() {
        let module = PluginModule::<dyn Greeter>::new("bye")
            .with_tagged_entry_point("Bye", "farewell", || Box::new(Bye));
        let entry = resolve(&module).unwrap();
        assert_eq!(entry.tag(), Some("farewell"));
        assert_eq!(entry.instantiate().greet(), "bye");

        let package = package();
        assert_eq!(package.resolve("hello").unwrap().tag(), None);
    }

    #[test]
    fn test_load_missing_module() {
        let package = package();
        let err = package.load_module("nope").unwrap_err();
        assert_eq!(err.to_string(), "No module named 'greeters.nope'");
        assert!(package.ensure_registered("nope").is_err());
        assert!(package.ensure_registered("hello").is_ok());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut package = package();
        let err = package
            .register(PluginModule::<dyn Greeter>::new("hello").with_entry_point("Bye", || Box::new(Bye)))
            .unwrap_err();
        assert!(matches!(err, PluginError::DuplicateModule { .. }));
        assert_eq!(package.len(), 3);
    }

    #[test]
    fn test_modules_are_sorted_by_name() {
        let package = package();
        assert_eq!(package.module_names(), vec!["both", "empty", "hello"]);
    }
}
