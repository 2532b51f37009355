//! Observable objects.
//!
//! An [`Object`] is a named bag of properties that raises before-change and
//! after-change notifications, as far as its [`TypeCapability`] allows.
//! Setting a property to the value it already holds raises nothing.
//!
//! A change is stored atomically and announced afterwards: before-change
//! handlers receive the value being replaced, after-change handlers the new
//! one.
//!
//! Handlers registered with an empty property name are notified for every
//! property, mirroring the any-property path sentinel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tether_ir::{NotificationMode, TypeCapability};

use crate::stream::Stream;
use crate::subscription::Subscription;
use crate::value::Value;

/// Shared handle to an [`Object`].
pub type ObjectRef = Arc<Object>;

type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

struct Handler {
    id: u64,
    mode: NotificationMode,
    property: String,
    callback: Callback,
}

pub struct Object {
    type_name: String,
    capability: TypeCapability,
    properties: Mutex<FxHashMap<String, Value>>,
    handlers: Mutex<Vec<Handler>>,
    next_handler: AtomicU64,
}

impl Object {
    pub fn new(type_name: impl Into<String>, capability: TypeCapability) -> ObjectRef {
        Arc::new(Object {
            type_name: type_name.into(),
            capability,
            properties: Mutex::new(FxHashMap::default()),
            handlers: Mutex::new(Vec::new()),
            next_handler: AtomicU64::new(0),
        })
    }

    /// An object that never raises notifications.
    pub fn inert(type_name: impl Into<String>) -> ObjectRef {
        Self::new(type_name, TypeCapability::default())
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn capability(&self) -> TypeCapability {
        self.capability
    }

    /// Set a property without raising notifications.
    pub fn init(&self, property: &str, value: impl Into<Value>) {
        self.properties.lock().insert(property.to_owned(), value.into());
    }

    /// Current value of `property`; [`Value::Null`] if never set.
    pub fn get(&self, property: &str) -> Value {
        self.properties
            .lock()
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    /// Assign `property`, raising before/after notifications if the value
    /// changes. Returns whether it changed.
    pub fn set(&self, property: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let old = {
            let mut properties = self.properties.lock();
            let old = properties.get(property).cloned().unwrap_or_default();
            if old == value {
                return false;
            }
            properties.insert(property.to_owned(), value.clone());
            old
        };
        tracing::trace!(object = %self.type_name, property, ?value, "property set");
        self.notify(NotificationMode::BeforeChange, property, &old);
        self.notify(NotificationMode::AfterChange, property, &value);
        true
    }

    fn notify(&self, mode: NotificationMode, property: &str, value: &Value) {
        if !self.capability.supports(mode) {
            return;
        }
        let callbacks: Vec<Callback> = self
            .handlers
            .lock()
            .iter()
            .filter(|h| h.mode == mode && (h.property.is_empty() || h.property == property))
            .map(|h| Arc::clone(&h.callback))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }

    /// Register `callback` for changes of `property` (any property if
    /// empty). The callback receives the old value for
    /// [`NotificationMode::BeforeChange`] and the new one otherwise. The
    /// registration lives until the subscription is disposed.
    pub fn on_change(
        self: &Arc<Self>,
        mode: NotificationMode,
        property: &str,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_handler.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().push(Handler {
            id,
            mode,
            property: property.to_owned(),
            callback: Arc::new(callback),
        });

        let weak: Weak<Object> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(object) = weak.upgrade() {
                object.handlers.lock().retain(|h| h.id != id);
            }
        })
    }

    /// Number of live change registrations.
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// What a watch of `property` reports: the property value, or the
    /// object itself for the any-property sentinel.
    pub fn read(self: &Arc<Self>, property: &str) -> Value {
        if property.is_empty() {
            Value::Object(Arc::clone(self))
        } else {
            self.get(property)
        }
    }

    /// Current value of `property`, then one value per `mode` notification.
    pub fn watch(self: &Arc<Self>, property: &str, mode: NotificationMode) -> Stream<Value> {
        let weak = Arc::downgrade(self);
        let property: Arc<str> = Arc::from(property);
        Stream::new(move |observer| {
            let Some(object) = weak.upgrade() else {
                return Subscription::empty();
            };

            let target = Weak::clone(&weak);
            let name = Arc::clone(&property);
            let notify = Arc::clone(&observer);
            let registration = object.on_change(mode, &property, move |value| {
                if !name.is_empty() {
                    notify(value.clone());
                } else if let Some(object) = target.upgrade() {
                    notify(Value::Object(object));
                }
            });

            observer(object.read(&property));
            registration
        })
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .field("handlers", &self.handler_count())
            .finish_non_exhaustive()
    }
}
