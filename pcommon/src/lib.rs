//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use pcommon::{MessageId, MetadataMap, SamplingOptions};
//!
//! let id = MessageId::from("message-1");
//! let mut metadata = MetadataMap::new();
//! metadata.insert("origin".to_string(), "editor".to_string());
//!
//! let options = SamplingOptions::default().with_temperature(0.3);
//! assert_eq!(id.as_str(), "message-1");
//! assert_eq!(options.temperature, Some(0.3));
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use pcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Shared metadata and message identifier newtypes.
    //!
    //! ```rust
    //! use pcommon::MessageId;
    //!
    //! let fixed = MessageId::new("message-42");
    //! let fresh = MessageId::generate();
    //!
    //! assert_eq!(fixed.to_string(), "message-42");
    //! assert_ne!(fresh, fixed);
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    pub type MetadataMap = HashMap<String, String>;

    /// Opaque identifier that stays stable for the lifetime of a message.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct MessageId(String);

    impl MessageId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        /// Creates a fresh random identifier.
        pub fn generate() -> Self {
            Self(uuid::Uuid::new_v4().to_string())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for MessageId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for MessageId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for MessageId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod model {
    //! Shared sampling settings used by request types.
    //!
    //! ```rust
    //! use pcommon::SamplingOptions;
    //!
    //! let options = SamplingOptions::default()
    //!     .with_temperature(0.2)
    //!     .with_top_p(0.9);
    //!
    //! assert_eq!(options.temperature, Some(0.2));
    //! assert_eq!(options.top_p, Some(0.9));
    //! ```

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct SamplingOptions {
        pub temperature: Option<f32>,
        pub top_p: Option<f32>,
    }

    impl SamplingOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_top_p(mut self, top_p: f32) -> Self {
            self.top_p = Some(top_p);
            self
        }

        pub fn is_empty(&self) -> bool {
            self.temperature.is_none() && self.top_p.is_none()
        }
    }
}

pub mod registry {
    //! Insertion-ordered registry map used by mixins and function catalogs.
    //!
    //! ```rust
    //! use pcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("beta".to_string(), 2_u32);
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! assert_eq!(registry.keys().collect::<Vec<_>>(), ["beta", "alpha"]);
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    /// Keyed map that iterates in insertion order.
    ///
    /// Replacing the value of an existing key keeps its original position; removing a key
    /// keeps the relative order of everything else.
    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        order: Vec<K>,
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                order: Vec::new(),
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash + Clone,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            let previous = self.items.insert(key.clone(), value);
            if previous.is_none() {
                self.order.push(key);
            }

            previous
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get_mut(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            let removed = self.items.remove(key)?;
            self.order
                .retain(|existing| <K as Borrow<Q>>::borrow(existing) != key);
            Some(removed)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn keys(&self) -> impl Iterator<Item = &K> {
            self.order.iter()
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.iter().map(|(_, value)| value)
        }

        pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
            self.order
                .iter()
                .filter_map(|key| self.items.get(key).map(|value| (key, value)))
        }

        pub fn clear(&mut self) {
            self.order.clear();
            self.items.clear();
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use context::{MessageId, MetadataMap};
pub use future::BoxFuture;
pub use model::SamplingOptions;
pub use registry::Registry;
