use std::fmt;
use std::sync::Arc;

/// A reactive attribute value: either a constant or a closure re-evaluated on every read.
///
/// Readers must call [`SignalValue::get`] each time they need the value; nothing is memoized.
pub enum SignalValue<T> {
    /// Fixed value.
    Value(T),
    /// Value computed on demand.
    Computed(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T: Clone> SignalValue<T> {
    pub fn computed(f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self::Computed(Arc::new(f))
    }

    pub fn get(&self) -> T {
        match self {
            Self::Value(v) => v.clone(),
            Self::Computed(f) => f(),
        }
    }
}

impl<T: Clone> Clone for SignalValue<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(v) => Self::Value(v.clone()),
            Self::Computed(f) => Self::Computed(Arc::clone(f)),
        }
    }
}

impl<T: Default> Default for SignalValue<T> {
    fn default() -> Self {
        Self::Value(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for SignalValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<T> From<T> for SignalValue<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for SignalValue<String> {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}
