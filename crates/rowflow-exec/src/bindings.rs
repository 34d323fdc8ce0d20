//! Per-run mapping from source names to renewable sources.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rowflow_core::source::RenewableSource;

/// Source bindings for one run. Cheap to clone; sources are shared by `Arc`.
#[derive(Clone, Default)]
pub struct Bindings {
    sources: HashMap<String, Arc<dyn RenewableSource>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style bind. A later bind of the same name replaces the earlier.
    pub fn bind<S: RenewableSource + 'static>(mut self, name: impl Into<String>, source: S) -> Self {
        self.insert(name, Arc::new(source));
        self
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        source: Arc<dyn RenewableSource>,
    ) -> Option<Arc<dyn RenewableSource>> {
        self.sources.insert(name.into(), source)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn RenewableSource>> {
        self.sources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings").field("names", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowflow_core::record;
    use rowflow_core::source::InMemorySource;
    use rowflow_core::types::Record;

    #[test]
    fn test_bind_and_lookup() {
        let b = Bindings::new()
            .bind("docs", InMemorySource::new(vec![record! {"x" => 1}]))
            .bind("empty", Vec::<Record>::new);
        assert_eq!(b.names(), vec!["docs", "empty"]);
        assert!(b.contains("docs"));
        assert_eq!(b.get("docs").unwrap().open().unwrap().count(), 1);
        assert_eq!(b.get("empty").unwrap().open().unwrap().count(), 0);
        assert!(b.get("missing").is_none());
    }
}
