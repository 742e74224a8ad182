//! Reference resolution
//!
//! Maps the human-readable values of an input line (marker IDs, vocabulary
//! terms, strain names, logins, J numbers, cell line names) to database keys.
//!
//! Every resolution returns `Ok(Some(key))`, `Ok(None)` when the value is not
//! registered, or `Err` when the lookup itself could not run. Only the last
//! is fatal; a miss is reported to the caller, which decides what it means
//! for the line.

mod memory;
mod postgres;

pub use memory::InMemoryResolver;
pub use postgres::PgResolver;

use crate::domain::Vocabulary;
use crate::error::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

/// A single lookup against the reference data
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// Preferred MGI accession ID of a marker
    Marker(String),
    Term(Vocabulary, String),
    Strain(String),
    /// Curator login
    User(String),
    /// Normalized `J:nnnn` ID
    Reference(String),
    /// Mutant cell line with a derivation
    MutantCellLine(String),
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookup::Marker(id) => write!(f, "marker '{}'", id),
            Lookup::Term(vocab, term) => write!(f, "{} term '{}'", vocab, term),
            Lookup::Strain(name) => write!(f, "strain '{}'", name),
            Lookup::User(login) => write!(f, "user '{}'", login),
            Lookup::Reference(jnum) => write!(f, "reference '{}'", jnum),
            Lookup::MutantCellLine(name) => write!(f, "mutant cell line '{}'", name),
        }
    }
}

/// Normalize a J number to its `J:nnnn` form
///
/// Accepts `J:1234` or a bare `1234`. Anything else yields `None`.
pub fn normalize_jnumber(value: &str) -> Option<String> {
    let value = value.trim();
    let digits = value.strip_prefix("J:").unwrap_or(value);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(format!("J:{}", digits))
}

/// Source of reference data keys
///
/// Implementors provide [`ReferenceResolver::lookup`]; the typed methods
/// build the lookup and write the outcome to the diagnostics log.
#[async_trait]
pub trait ReferenceResolver: Send {
    /// Run one lookup
    async fn lookup(&mut self, lookup: &Lookup) -> Result<Option<i64>>;

    async fn resolve_marker(&mut self, mgi_id: &str) -> Result<Option<i64>> {
        logged(self, Lookup::Marker(mgi_id.to_string())).await
    }

    async fn resolve_term(&mut self, vocabulary: Vocabulary, term: &str) -> Result<Option<i64>> {
        logged(self, Lookup::Term(vocabulary, term.to_string())).await
    }

    async fn resolve_strain(&mut self, strain: &str) -> Result<Option<i64>> {
        logged(self, Lookup::Strain(strain.to_string())).await
    }

    async fn resolve_user(&mut self, login: &str) -> Result<Option<i64>> {
        logged(self, Lookup::User(login.to_string())).await
    }

    async fn resolve_reference(&mut self, jnumber: &str) -> Result<Option<i64>> {
        match normalize_jnumber(jnumber) {
            Some(jnum) => logged(self, Lookup::Reference(jnum)).await,
            None => {
                warn!(value = jnumber, "Not a J number");
                Ok(None)
            },
        }
    }

    async fn resolve_mutant_cell_line(&mut self, name: &str) -> Result<Option<i64>> {
        logged(self, Lookup::MutantCellLine(name.to_string())).await
    }
}

async fn logged<R>(resolver: &mut R, lookup: Lookup) -> Result<Option<i64>>
where
    R: ReferenceResolver + ?Sized,
{
    let key = resolver.lookup(&lookup).await?;
    match key {
        Some(key) => debug!(%lookup, key, "Resolved"),
        None => warn!(%lookup, "Not found"),
    }
    Ok(key)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_jnumber() {
        assert_eq!(normalize_jnumber("J:5000").as_deref(), Some("J:5000"));
        assert_eq!(normalize_jnumber("5000").as_deref(), Some("J:5000"));
        assert_eq!(normalize_jnumber(" J:12 ").as_deref(), Some("J:12"));
        assert_eq!(normalize_jnumber("J:"), None);
        assert_eq!(normalize_jnumber("J:12a"), None);
        assert_eq!(normalize_jnumber("MGI:12"), None);
        assert_eq!(normalize_jnumber(""), None);
    }

    #[tokio::test]
    async fn test_resolve_reference_accepts_both_forms() {
        let mut resolver = InMemoryResolver::new().with_reference("J:5000", 500);
        assert_eq!(resolver.resolve_reference("J:5000").await.unwrap(), Some(500));
        assert_eq!(resolver.resolve_reference("5000").await.unwrap(), Some(500));
        assert_eq!(resolver.resolve_reference("Original").await.unwrap(), None);
    }

    #[test]
    fn test_lookup_display() {
        let lookup = Lookup::Term(Vocabulary::AlleleStatus, "Approved".to_string());
        assert_eq!(lookup.to_string(), "Allele Status term 'Approved'");
    }
}
