//! Layered, lazily-resolved metadata.
//!
//! Metadata is an insertion-ordered mapping from string keys to
//! [`MetaValue`]s, optionally stacked on a lower-precedence parent layer:
//! document metadata shadows pipeline/global settings, which shadow engine
//! defaults. Values are either concrete JSON values or *deferred* functions
//! of the currently executing context, re-evaluated on every read.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use docmill_shared::path::PathValue;
use docmill_shared::{DocmillError, Result};

use crate::context::ExecutionContext;

// ---------------------------------------------------------------------------
// MetaValue
// ---------------------------------------------------------------------------

/// A deferred metadata value: a function of the active execution context.
pub type DeferredFn = Arc<dyn Fn(&ExecutionContext) -> Result<Value> + Send + Sync>;

/// A metadata entry value.
///
/// Deferred values resolve through an explicit [`MetaValue::resolve`] call,
/// never implicitly on plain dictionary access, and are not memoized: their
/// result can depend on engine-wide state current at read time.
/// A deferred value that reads its own key during resolution recurses
/// without detection; keeping deferred values acyclic is the caller's
/// responsibility.
#[derive(Clone)]
pub enum MetaValue {
    Concrete(Value),
    Deferred(DeferredFn),
}

impl MetaValue {
    /// Wrap a deferred computation.
    pub fn deferred(
        f: impl Fn(&ExecutionContext) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::Deferred(Arc::new(f))
    }

    /// Resolve against the active context. Concrete values return a copy;
    /// deferred values are invoked fresh on every call.
    pub fn resolve(&self, ctx: &ExecutionContext) -> Result<Value> {
        match self {
            Self::Concrete(value) => Ok(value.clone()),
            Self::Deferred(f) => f(ctx),
        }
    }

    /// The concrete value, if this entry is not deferred.
    pub fn as_concrete(&self) -> Option<&Value> {
        match self {
            Self::Concrete(value) => Some(value),
            Self::Deferred(_) => None,
        }
    }
}

impl fmt::Debug for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(value) => f.debug_tuple("Concrete").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<Value> for MetaValue {
    fn from(value: Value) -> Self {
        Self::Concrete(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Concrete(Value::String(value.to_string()))
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Concrete(Value::String(value))
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Concrete(Value::Bool(value))
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        Self::Concrete(Value::from(value))
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Concrete(Value::from(value))
    }
}

impl From<&PathValue> for MetaValue {
    fn from(value: &PathValue) -> Self {
        Self::Concrete(Value::String(value.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Type conversions
// ---------------------------------------------------------------------------

/// Conversion from a resolved metadata value into a requested type.
///
/// `from_value` returns `None` when no conversion applies for the stored
/// value; typed accessors turn that into a `Conversion` error rather than a
/// silent default. Defaults apply only when the key itself is absent.
pub trait FromMetaValue: Sized {
    /// Type name reported in conversion errors.
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromMetaValue for Value {
    const TYPE_NAME: &'static str = "value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromMetaValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl FromMetaValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().and_then(|i| match i {
                0 => Some(false),
                1 => Some(true),
                _ => None,
            }),
            _ => None,
        }
    }
}

impl FromMetaValue for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromMetaValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromMetaValue for PathValue {
    const TYPE_NAME: &'static str = "path";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(PathValue::new(s)),
            _ => None,
        }
    }
}

impl<T: FromMetaValue> FromMetaValue for Vec<T> {
    const TYPE_NAME: &'static str = "list";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.iter().map(T::from_value).collect(),
            // a scalar converts to a one-element list
            other => T::from_value(other).map(|item| vec![item]),
        }
    }
}

/// Short name of a JSON value's shape, for conversion error messages.
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Insertion-ordered key/value store with layered lookup.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entries: Vec<(String, MetaValue)>,
    index: HashMap<String, usize>,
    parent: Option<Arc<Metadata>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty layer shadowing `parent`.
    pub fn with_parent(parent: Arc<Metadata>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<MetaValue>,
    {
        let mut metadata = Self::new();
        for (key, value) in pairs {
            metadata.set(key, value);
        }
        metadata
    }

    /// Insert or replace an entry in this layer. Replacing keeps the key's
    /// original insertion position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Look up a key, walking layers from this one down to the deepest.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        if let Some(&slot) = self.index.get(key) {
            return Some(&self.entries[slot].1);
        }
        self.parent.as_deref().and_then(|parent| parent.get(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Distinct keys visible through all layers.
    pub fn len(&self) -> usize {
        self.iter().len()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().is_empty()
    }

    /// Enumerate entries: deepest-layer keys first in their insertion order,
    /// values taken from the highest-precedence layer that defines them,
    /// then keys introduced by upper layers in their own order.
    pub fn iter(&self) -> Vec<(&str, &MetaValue)> {
        let mut layers: Vec<&Metadata> = Vec::new();
        let mut current = Some(self);
        while let Some(layer) = current {
            layers.push(layer);
            current = layer.parent.as_deref();
        }

        let mut order: Vec<&str> = Vec::new();
        let mut visible: HashMap<&str, &MetaValue> = HashMap::new();
        for layer in layers.iter().rev() {
            for (key, value) in &layer.entries {
                if !visible.contains_key(key.as_str()) {
                    order.push(key.as_str());
                }
                visible.insert(key.as_str(), value);
            }
        }
        order.into_iter().map(|key| (key, visible[key])).collect()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.iter().into_iter().map(|(key, _)| key).collect()
    }

    /// Merge law: every key in `changes` takes the new value, every other
    /// visible key carries forward unchanged, and `self` is untouched.
    pub fn with_changes<K, V>(&self, changes: impl IntoIterator<Item = (K, V)>) -> Metadata
    where
        K: Into<String>,
        V: Into<MetaValue>,
    {
        let mut merged = self.clone();
        for (key, value) in changes {
            merged.set(key, value);
        }
        merged
    }

    // -----------------------------------------------------------------------
    // Typed accessors
    // -----------------------------------------------------------------------

    /// Resolve a key to its concrete value, invoking deferred entries.
    pub fn get_value(&self, key: &str, ctx: &ExecutionContext) -> Result<Option<Value>> {
        match self.get(key) {
            Some(value) => value.resolve(ctx).map(Some),
            None => Ok(None),
        }
    }

    /// Resolve and convert. The default is returned only when the key is
    /// absent; a present value that cannot convert is a `Conversion` error.
    pub fn get_as<T: FromMetaValue>(
        &self,
        key: &str,
        default: T,
        ctx: &ExecutionContext,
    ) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(entry) => {
                let value = entry.resolve(ctx)?;
                T::from_value(&value).ok_or_else(|| {
                    DocmillError::conversion(key, value_kind(&value), T::TYPE_NAME)
                })
            }
        }
    }

    pub fn get_str(&self, key: &str, default: &str, ctx: &ExecutionContext) -> Result<String> {
        self.get_as(key, default.to_string(), ctx)
    }

    pub fn get_bool(&self, key: &str, default: bool, ctx: &ExecutionContext) -> Result<bool> {
        self.get_as(key, default, ctx)
    }

    /// Typed list accessor; an absent key yields an empty list and a scalar
    /// value is promoted to a one-element list.
    pub fn get_list<T: FromMetaValue>(
        &self,
        key: &str,
        ctx: &ExecutionContext,
    ) -> Result<Vec<T>> {
        self.get_as(key, Vec::new(), ctx)
    }
}
