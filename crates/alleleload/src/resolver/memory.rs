use super::{normalize_jnumber, Lookup, ReferenceResolver};
use crate::domain::Vocabulary;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolver over a fixed in-memory registry
///
/// Used for preview runs against exported reference data and for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResolver {
    entries: HashMap<Lookup, i64>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(mut self, mgi_id: &str, key: i64) -> Self {
        self.insert(Lookup::Marker(mgi_id.to_string()), key);
        self
    }

    pub fn with_term(mut self, vocabulary: Vocabulary, term: &str, key: i64) -> Self {
        self.insert(Lookup::Term(vocabulary, term.to_string()), key);
        self
    }

    pub fn with_strain(mut self, strain: &str, key: i64) -> Self {
        self.insert(Lookup::Strain(strain.to_string()), key);
        self
    }

    pub fn with_user(mut self, login: &str, key: i64) -> Self {
        self.insert(Lookup::User(login.to_string()), key);
        self
    }

    /// Register a reference; `jnumber` may be given with or without `J:`
    pub fn with_reference(mut self, jnumber: &str, key: i64) -> Self {
        let jnum = normalize_jnumber(jnumber).unwrap_or_else(|| jnumber.to_string());
        self.insert(Lookup::Reference(jnum), key);
        self
    }

    pub fn with_mutant_cell_line(mut self, name: &str, key: i64) -> Self {
        self.insert(Lookup::MutantCellLine(name.to_string()), key);
        self
    }

    pub fn insert(&mut self, lookup: Lookup, key: i64) {
        self.entries.insert(lookup, key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ReferenceResolver for InMemoryResolver {
    async fn lookup(&mut self, lookup: &Lookup) -> Result<Option<i64>> {
        Ok(self.entries.get(lookup).copied())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_values_resolve() {
        let mut resolver = InMemoryResolver::new()
            .with_marker("MGI:001", 10)
            .with_term(Vocabulary::AlleleType, "Targeted", 847116)
            .with_strain("C57BL/6J", 40)
            .with_user("jdoe", 1001)
            .with_mutant_cell_line("ES123", 77);

        assert_eq!(resolver.len(), 5);
        assert_eq!(resolver.resolve_marker("MGI:001").await.unwrap(), Some(10));
        assert_eq!(
            resolver
                .resolve_term(Vocabulary::AlleleType, "Targeted")
                .await
                .unwrap(),
            Some(847116)
        );
        assert_eq!(resolver.resolve_strain("C57BL/6J").await.unwrap(), Some(40));
        assert_eq!(resolver.resolve_user("jdoe").await.unwrap(), Some(1001));
        assert_eq!(resolver.resolve_mutant_cell_line("ES123").await.unwrap(), Some(77));
    }

    #[tokio::test]
    async fn test_terms_are_scoped_by_vocabulary() {
        let mut resolver =
            InMemoryResolver::new().with_term(Vocabulary::AlleleStatus, "Approved", 1);
        assert_eq!(
            resolver
                .resolve_term(Vocabulary::AlleleType, "Approved")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_unknown_values_are_not_found() {
        let mut resolver = InMemoryResolver::new();
        assert!(resolver.is_empty());
        assert_eq!(resolver.resolve_marker("MGI:999").await.unwrap(), None);
        assert_eq!(resolver.resolve_user("nobody").await.unwrap(), None);
    }
}
