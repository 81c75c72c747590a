//! Execution contexts
//!
//! A [`ValidationContext`] is the per-node state of one validation run: the
//! value being validated, its container, the node's own [`PropertyPath`],
//! the shared data map, the selector, the async flag and a handle to the
//! root failure sink.
//!
//! Contexts form a tree. Children are produced by
//! [`ValidationContext::clone_for_child`] (nested objects, same path) and
//! [`ValidationContext::clone_for_collection_element`] (fresh path). Every
//! child shares the shared data map and the root sink with its parent but
//! owns its path.
//!
//! A [`PropertyContext`] is the property-scoped view a worker receives. It
//! reads the property value lazily and at most once.

use crate::config::ValidatorConfig;
use crate::failure::{MessageFormatter, ValidationFailure, ValidationResult};
use crate::path::PropertyPath;
use crate::rule::{ElementMetadata, MessageSource, Rule};
use crate::selector::{DefaultSelector, RuleSelector};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

// ============================================================================
// SHARED DATA
// ============================================================================

/// Side-channel map shared by every context of one run.
///
/// Safe to write from concurrently validated branches.
#[derive(Debug, Clone, Default)]
pub struct SharedData {
    entries: Arc<DashMap<String, Value>>,
}

impl SharedData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Returns a copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    /// Atomically updates the value under `key`, starting from `default`
    /// when the key is absent.
    pub fn update(&self, key: impl Into<String>, default: Value, f: impl FnOnce(&mut Value)) {
        let mut entry = self.entries.entry(key.into()).or_insert(default);
        f(entry.value_mut());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for SharedData {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let data = Self::new();
        for (key, value) in iter {
            data.insert(key, value);
        }
        data
    }
}

// ============================================================================
// FAILURE SINK
// ============================================================================

#[derive(Debug, Default)]
struct SinkScope {
    added: AtomicUsize,
    parent: Option<Arc<SinkScope>>,
}

/// Handle to the root failure list.
///
/// Each scope counts the failures appended through it and through every
/// scope derived from it, so a branch can tell whether it produced
/// failures without re-reading the list.
#[derive(Debug, Clone, Default)]
pub struct FailureSink {
    failures: Arc<Mutex<Vec<ValidationFailure>>>,
    scope: Arc<SinkScope>,
}

impl FailureSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a failure to the root list.
    pub fn push(&self, failure: ValidationFailure) {
        self.failures.lock().push(failure);
        let mut scope = Some(&self.scope);
        while let Some(current) = scope {
            current.added.fetch_add(1, Ordering::AcqRel);
            scope = current.parent.as_ref();
        }
    }

    /// Derives a handle whose counter starts at zero.
    #[must_use]
    pub fn scoped(&self) -> Self {
        Self {
            failures: Arc::clone(&self.failures),
            scope: Arc::new(SinkScope {
                added: AtomicUsize::new(0),
                parent: Some(Arc::clone(&self.scope)),
            }),
        }
    }

    /// Failures appended through this scope and its descendants.
    #[must_use]
    pub fn added(&self) -> usize {
        self.scope.added.load(Ordering::Acquire)
    }

    /// Total failures in the root list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the root list.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ValidationFailure> {
        self.failures.lock().clone()
    }

    pub(crate) fn take(&self) -> Vec<ValidationFailure> {
        std::mem::take(&mut *self.failures.lock())
    }
}

// ============================================================================
// VALIDATION CONTEXT
// ============================================================================

/// Where a context sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// Created by the root validator.
    Root,
    /// Created for a nested object.
    Child,
    /// Created for one element of a collection.
    CollectionElement,
}

/// Per-node state of one validation run.
#[derive(Clone)]
pub struct ValidationContext {
    model: Arc<Value>,
    container: Option<Arc<Value>>,
    path: PropertyPath,
    shared: SharedData,
    selector: Arc<dyn RuleSelector>,
    is_async: bool,
    sink: FailureSink,
    kind: ContextKind,
}

impl ValidationContext {
    /// Creates a root context with the default selector and empty shared data.
    pub fn new(instance: Value) -> Self {
        Self::root(
            Arc::new(instance),
            Arc::new(DefaultSelector),
            SharedData::new(),
            false,
        )
    }

    pub(crate) fn root(
        instance: Arc<Value>,
        selector: Arc<dyn RuleSelector>,
        shared: SharedData,
        is_async: bool,
    ) -> Self {
        Self {
            container: Some(Arc::clone(&instance)),
            model: instance,
            path: PropertyPath::new(),
            shared,
            selector,
            is_async,
            sink: FailureSink::new(),
            kind: ContextKind::Root,
        }
    }

    /// Derives a context for validating a nested object.
    ///
    /// The child starts from a copy of this context's path.
    #[must_use]
    pub fn clone_for_child(&self, instance: Arc<Value>) -> Self {
        Self {
            container: Some(Arc::clone(&self.model)),
            model: instance,
            path: self.path.clone(),
            shared: self.shared.clone(),
            selector: Arc::clone(&self.selector),
            is_async: self.is_async,
            sink: self.sink.scoped(),
            kind: ContextKind::Child,
        }
    }

    /// Derives a context for validating one collection element.
    ///
    /// The child starts with an empty path. The caller appends the property
    /// and index segments before using it.
    #[must_use]
    pub fn clone_for_collection_element(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            container: self.container.clone(),
            path: PropertyPath::new(),
            shared: self.shared.clone(),
            selector: Arc::clone(&self.selector),
            is_async: self.is_async,
            sink: self.sink.scoped(),
            kind: ContextKind::CollectionElement,
        }
    }

    /// The value validated at this node.
    #[must_use]
    pub fn model(&self) -> &Value {
        &self.model
    }

    pub(crate) fn shared_model(&self) -> &Arc<Value> {
        &self.model
    }

    /// The nearest enclosing object.
    #[must_use]
    pub fn container(&self) -> Option<&Value> {
        self.container.as_deref()
    }

    #[must_use]
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    pub fn path_mut(&mut self) -> &mut PropertyPath {
        &mut self.path
    }

    #[must_use]
    pub fn shared(&self) -> &SharedData {
        &self.shared
    }

    #[must_use]
    pub fn selector(&self) -> &dyn RuleSelector {
        self.selector.as_ref()
    }

    /// True when the run was started through an async entry point.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    #[must_use]
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    #[must_use]
    pub fn is_child(&self) -> bool {
        self.kind != ContextKind::Root
    }

    #[must_use]
    pub fn is_collection_element(&self) -> bool {
        self.kind == ContextKind::CollectionElement
    }

    /// Appends a failure to the root sink.
    pub fn add_failure(&self, failure: ValidationFailure) {
        self.sink.push(failure);
    }

    /// Failures added through this context and its descendants.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.sink.added()
    }

    #[must_use]
    pub fn sink(&self) -> &FailureSink {
        &self.sink
    }

    pub(crate) fn into_result(self) -> ValidationResult {
        ValidationResult::new(self.sink.take())
    }
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("kind", &self.kind)
            .field("path", &self.path.to_string())
            .field("is_async", &self.is_async)
            .field("failures", &self.sink.added())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// PROPERTY CONTEXT
// ============================================================================

/// Property-scoped view handed to workers.
pub struct PropertyContext<'a> {
    parent: &'a ValidationContext,
    rule: &'a Rule,
    metadata: &'a ElementMetadata,
    property_name: String,
    value: OnceLock<Value>,
    has_failures: AtomicBool,
}

impl<'a> PropertyContext<'a> {
    /// Creates a view whose value is read from the parent model on demand.
    pub(crate) fn new(
        parent: &'a ValidationContext,
        rule: &'a Rule,
        metadata: &'a ElementMetadata,
        property_name: String,
    ) -> Self {
        Self {
            parent,
            rule,
            metadata,
            property_name,
            value: OnceLock::new(),
            has_failures: AtomicBool::new(false),
        }
    }

    /// Creates a view over an already known value.
    pub(crate) fn with_value(
        parent: &'a ValidationContext,
        rule: &'a Rule,
        metadata: &'a ElementMetadata,
        property_name: String,
        value: Value,
    ) -> Self {
        let context = Self::new(parent, rule, metadata, property_name);
        let _ = context.value.set(value);
        context
    }

    /// The property value. The accessor and transformer run at most once.
    pub fn value(&self) -> &Value {
        self.value
            .get_or_init(|| self.rule.read_value(self.parent.model()))
    }

    /// The object that owns the property.
    #[must_use]
    pub fn container(&self) -> &Value {
        self.parent.model()
    }

    #[must_use]
    pub fn parent(&self) -> &'a ValidationContext {
        self.parent
    }

    #[must_use]
    pub fn rule(&self) -> &'a Rule {
        self.rule
    }

    #[must_use]
    pub fn metadata(&self) -> &'a ElementMetadata {
        self.metadata
    }

    /// Rendered path of the property.
    #[must_use]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Display name, resolved on each call.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.rule.display_name(self.container())
    }

    #[must_use]
    pub fn shared(&self) -> &SharedData {
        self.parent.shared()
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.parent.is_async()
    }

    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        self.rule.config()
    }

    /// Appends a failure and marks this view as failed.
    pub fn add_failure(&self, failure: ValidationFailure) {
        self.has_failures.store(true, Ordering::Release);
        self.parent.add_failure(failure);
    }

    /// True if a failure was added through this view.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.has_failures.load(Ordering::Acquire)
    }

    /// Builds a failure for a failing leaf, applying the element metadata
    /// and the rule's message builder.
    #[must_use]
    pub fn create_failure(
        &self,
        default_code: &str,
        default_template: &str,
        mut formatter: MessageFormatter,
    ) -> ValidationFailure {
        formatter.append_property_name(&self.display_name());
        formatter.append_property_value(self.value());

        let template = match self.metadata.message() {
            Some(MessageSource::Static(text)) => text.clone(),
            Some(MessageSource::Dynamic(build)) => build(self),
            None => default_template.to_owned(),
        };

        let message = match self.rule.message_builder() {
            Some(builder) => builder(&MessageContext {
                property: self,
                formatter: &formatter,
                template: &template,
            }),
            None => formatter.build_message(&template),
        };

        let code = match self.metadata.error_code() {
            Some(code) => code.to_owned(),
            None => self.config().resolve_error_code(default_code),
        };

        let mut failure = ValidationFailure::new(self.property_name.clone(), message)
            .with_attempted_value(self.value().clone())
            .with_severity(self.metadata.severity())
            .with_error_code(code);

        if let Some(provider) = self.metadata.custom_state() {
            failure = failure.with_custom_state(provider(self));
        }

        failure.with_placeholders(formatter.into_placeholders())
    }
}

impl fmt::Debug for PropertyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyContext")
            .field("property_name", &self.property_name)
            .field("value", &self.value.get())
            .field("has_failures", &self.has_failures())
            .finish_non_exhaustive()
    }
}

/// Inputs available to a rule's message builder.
pub struct MessageContext<'a> {
    pub property: &'a PropertyContext<'a>,
    pub formatter: &'a MessageFormatter,
    pub template: &'a str,
}

impl MessageContext<'_> {
    /// The message the engine would have produced without a builder.
    #[must_use]
    pub fn default_message(&self) -> String {
        self.formatter.build_message(self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sink_scopes_count_upwards() {
        let root = FailureSink::new();
        let child = root.scoped();
        let grandchild = child.scoped();
        let sibling = root.scoped();

        grandchild.push(ValidationFailure::new("a", "x"));
        sibling.push(ValidationFailure::new("b", "y"));

        assert_eq!(grandchild.added(), 1);
        assert_eq!(child.added(), 1);
        assert_eq!(sibling.added(), 1);
        assert_eq!(root.added(), 2);
        assert_eq!(root.len(), 2);
    }

    #[test]
    fn test_child_context_copies_path() {
        let mut root = ValidationContext::new(json!({"Address": {"Zip": ""}}));
        root.path_mut().push_name("Customer");

        let mut child = root.clone_for_child(Arc::new(json!({"Zip": ""})));
        child.path_mut().push_name("Address");

        assert_eq!(root.path().to_string(), "Customer");
        assert_eq!(child.path().to_string(), "Customer.Address");
        assert_eq!(child.kind(), ContextKind::Child);
        assert_eq!(child.container(), Some(&json!({"Address": {"Zip": ""}})));
    }

    #[test]
    fn test_collection_element_context_starts_empty() {
        let mut root = ValidationContext::new(json!({"Items": [1, 2]}));
        root.path_mut().push_name("Order");

        let element = root.clone_for_collection_element();
        assert!(element.path().is_empty());
        assert!(element.is_collection_element());
        assert_eq!(element.model(), root.model());
    }

    #[test]
    fn test_shared_data_is_shared_across_clones() {
        let root = ValidationContext::new(json!({}));
        let child = root.clone_for_child(Arc::new(json!({})));
        let element = child.clone_for_collection_element();

        element.shared().insert("seen", json!(1));
        assert_eq!(root.shared().get("seen"), Some(json!(1)));

        root.shared()
            .update("count", json!(0), |v| *v = json!(v.as_i64().unwrap_or(0) + 5));
        assert_eq!(child.shared().get("count"), Some(json!(5)));
    }

    #[test]
    fn test_failures_reach_root_sink() {
        let root = ValidationContext::new(json!({}));
        let child = root.clone_for_child(Arc::new(json!({})));
        child.add_failure(ValidationFailure::new("x", "bad"));

        assert_eq!(child.failure_count(), 1);
        assert_eq!(root.failure_count(), 1);
        assert_eq!(root.into_result().failures().len(), 1);
    }
}
