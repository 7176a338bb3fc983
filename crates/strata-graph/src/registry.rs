use std::collections::HashMap;

use parking_lot::RwLock;

use crate::ids::TypeId;

/// Name-keyed allocator of type identities.
///
/// Every qualified name maps to exactly one [`TypeId`], no matter how many
/// threads ask for it first. The linker later decides whether the node behind
/// an id is a stub or an imported class; the id itself never changes.
#[derive(Debug, Default)]
pub struct StubRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_name: HashMap<String, TypeId>,
    names: Vec<String>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, name: &str) -> TypeId {
        if let Some(id) = self.inner.read().by_name.get(name) {
            return *id;
        }

        let mut inner = self.inner.write();
        // Another thread may have published the name between the two locks.
        if let Some(id) = inner.by_name.get(name) {
            return *id;
        }
        let id = TypeId::from_idx(inner.names.len());
        inner.names.push(name.to_string());
        inner.by_name.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, name: &str) -> Option<TypeId> {
        self.inner.read().by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.read().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names in id order, plus the name index.
    pub(crate) fn into_parts(self) -> (Vec<String>, HashMap<String, TypeId>) {
        let inner = self.inner.into_inner();
        (inner.names, inner.by_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_id_per_name() {
        let registry = StubRegistry::new();
        assert!(registry.is_empty());
        let a = registry.get_or_create("com.example.A");
        let b = registry.get_or_create("com.example.B");
        assert_ne!(a, b);
        assert_eq!(registry.get_or_create("com.example.A"), a);
        assert_eq!(registry.get("com.example.B"), Some(b));
        assert_eq!(registry.get("com.example.C"), None);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn concurrent_creation_converges() {
        let registry = StubRegistry::new();
        let names: Vec<String> = (0..64).map(|i| format!("com.example.T{i}")).collect();

        let results: Vec<Vec<TypeId>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        names
                            .iter()
                            .map(|name| registry.get_or_create(name))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for ids in &results[1..] {
            assert_eq!(ids, &results[0]);
        }
        assert_eq!(registry.len(), names.len());
    }
}
