//! Key sequencing
//!
//! New rows need primary keys and every new allele needs a public accession
//! number. The loader reads the current maximum of each key space once, at
//! startup, and from then on hands out keys from process memory. Nothing is
//! written back until the end-of-run accession-max update, so the loader
//! assumes it is the only writer to the target tables while it runs.

use crate::domain::MGI_PREFIX;
use crate::error::{AlleleLoadError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, info};

/// An independent sequence of generated keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySpace {
    /// `ALL_Allele._Allele_key`
    Allele,
    /// `ALL_Marker_Assoc._Assoc_key`
    MarkerAssoc,
    /// `MGI_Reference_Assoc._Assoc_key`
    ReferenceAssoc,
    /// `ACC_Accession._Accession_key`
    Accession,
    /// `MGI_Note._Note_key`
    Note,
    /// `ALL_Allele_CellLine._Assoc_key`
    CellLineAssoc,
    /// Numeric part of `MGI:` accession IDs (`ACC_AccessionMax`)
    AccessionNumber,
}

impl KeySpace {
    pub const ALL: [KeySpace; 7] = [
        KeySpace::Allele,
        KeySpace::MarkerAssoc,
        KeySpace::ReferenceAssoc,
        KeySpace::Accession,
        KeySpace::Note,
        KeySpace::CellLineAssoc,
        KeySpace::AccessionNumber,
    ];

    fn index(self) -> usize {
        match self {
            KeySpace::Allele => 0,
            KeySpace::MarkerAssoc => 1,
            KeySpace::ReferenceAssoc => 2,
            KeySpace::Accession => 3,
            KeySpace::Note => 4,
            KeySpace::CellLineAssoc => 5,
            KeySpace::AccessionNumber => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeySpace::Allele => "allele",
            KeySpace::MarkerAssoc => "marker association",
            KeySpace::ReferenceAssoc => "reference association",
            KeySpace::Accession => "accession",
            KeySpace::Note => "note",
            KeySpace::CellLineAssoc => "cell line association",
            KeySpace::AccessionNumber => "accession number",
        }
    }
}

impl std::fmt::Display for KeySpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory counters for every key space
///
/// Each counter holds the next key to hand out. Only [`KeyState::next_key`]
/// moves a counter, and it only moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyState {
    next: [i64; 7],
}

impl Default for KeyState {
    fn default() -> Self {
        Self { next: [1; 7] }
    }
}

impl KeyState {
    /// Set the next key of one space (builder style)
    pub fn with_next(mut self, space: KeySpace, next: i64) -> Self {
        self.next[space.index()] = next;
        self
    }

    /// Return the current counter for `space` and advance it
    pub fn next_key(&mut self, space: KeySpace) -> i64 {
        let slot = &mut self.next[space.index()];
        let key = *slot;
        *slot += 1;
        key
    }

    /// The key the next call to [`KeyState::next_key`] would return
    pub fn peek(&self, space: KeySpace) -> i64 {
        self.next[space.index()]
    }
}

/// Source of the persisted maximum of each key space
#[async_trait]
pub trait KeySource: Send {
    /// Current maximum, or `None` when the store has no value for the space
    async fn max_key(&mut self, space: KeySpace) -> Result<Option<i64>>;
}

/// Fixed maxima, used for fixtures and dry runs
#[async_trait]
impl KeySource for HashMap<KeySpace, i64> {
    async fn max_key(&mut self, space: KeySpace) -> Result<Option<i64>> {
        Ok(self.get(&space).copied())
    }
}

/// Read the persisted maxima once and build the run's key state
///
/// Every space must report a maximum. A failed query or a missing value is
/// fatal: the run must not start with guessed keys.
pub async fn initialize_keys<S>(source: &mut S) -> Result<KeyState>
where
    S: KeySource + ?Sized,
{
    let mut state = KeyState::default();

    for space in KeySpace::ALL {
        let max = source
            .max_key(space)
            .await
            .map_err(|e| AlleleLoadError::key_init(space, e.to_string()))?
            .ok_or_else(|| AlleleLoadError::key_init(space, "no current maximum found"))?;

        state = state.with_next(space, max + 1);
        debug!(space = %space, next = max + 1, "Key space initialized");
    }

    info!(
        allele = state.peek(KeySpace::Allele),
        accession_number = state.peek(KeySpace::AccessionNumber),
        "Key state initialized"
    );

    Ok(state)
}

/// Reads key maxima from the MGI PostgreSQL schema
pub struct PgKeySource {
    pool: PgPool,
    prefix: String,
}

impl PgKeySource {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            prefix: MGI_PREFIX.to_string(),
        }
    }

    fn max_query(space: KeySpace) -> Option<&'static str> {
        match space {
            KeySpace::Allele => Some("SELECT MAX(_allele_key)::bigint FROM all_allele"),
            KeySpace::MarkerAssoc => Some("SELECT MAX(_assoc_key)::bigint FROM all_marker_assoc"),
            KeySpace::ReferenceAssoc => {
                Some("SELECT MAX(_assoc_key)::bigint FROM mgi_reference_assoc")
            },
            KeySpace::Accession => Some("SELECT MAX(_accession_key)::bigint FROM acc_accession"),
            KeySpace::Note => Some("SELECT MAX(_note_key)::bigint FROM mgi_note"),
            KeySpace::CellLineAssoc => {
                Some("SELECT MAX(_assoc_key)::bigint FROM all_allele_cellline")
            },
            KeySpace::AccessionNumber => None,
        }
    }
}

#[async_trait]
impl KeySource for PgKeySource {
    async fn max_key(&mut self, space: KeySpace) -> Result<Option<i64>> {
        let max = match Self::max_query(space) {
            Some(sql) => {
                debug!(space = %space, sql, "Querying key maximum");
                sqlx::query_scalar::<_, Option<i64>>(sql)
                    .fetch_one(&self.pool)
                    .await?
            },
            None => {
                debug!(space = %space, prefix = %self.prefix, "Querying accession maximum");
                sqlx::query_scalar::<_, Option<i64>>(
                    "SELECT maxnumericpart::bigint FROM acc_accessionmax WHERE prefixpart = $1",
                )
                .bind(self.prefix.as_str())
                .fetch_optional(&self.pool)
                .await?
                .flatten()
            },
        };

        Ok(max)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn maxima() -> HashMap<KeySpace, i64> {
        HashMap::from([
            (KeySpace::Allele, 1000),
            (KeySpace::MarkerAssoc, 2000),
            (KeySpace::ReferenceAssoc, 3000),
            (KeySpace::Accession, 4000),
            (KeySpace::Note, 5000),
            (KeySpace::CellLineAssoc, 6000),
            (KeySpace::AccessionNumber, 7000),
        ])
    }

    #[test]
    fn test_next_key_post_increments() {
        let mut keys = KeyState::default().with_next(KeySpace::Allele, 10);
        assert_eq!(keys.next_key(KeySpace::Allele), 10);
        assert_eq!(keys.next_key(KeySpace::Allele), 11);
        assert_eq!(keys.peek(KeySpace::Allele), 12);
    }

    #[test]
    fn test_key_spaces_are_independent() {
        let mut keys = KeyState::default()
            .with_next(KeySpace::Allele, 10)
            .with_next(KeySpace::Note, 50);
        keys.next_key(KeySpace::Allele);
        keys.next_key(KeySpace::Allele);
        assert_eq!(keys.peek(KeySpace::Note), 50);
        assert_eq!(keys.peek(KeySpace::MarkerAssoc), 1);
    }

    #[tokio::test]
    async fn test_initialize_keys_starts_after_maximum() {
        let mut source = maxima();
        let keys = initialize_keys(&mut source).await.unwrap();
        assert_eq!(keys.peek(KeySpace::Allele), 1001);
        assert_eq!(keys.peek(KeySpace::MarkerAssoc), 2001);
        assert_eq!(keys.peek(KeySpace::ReferenceAssoc), 3001);
        assert_eq!(keys.peek(KeySpace::Accession), 4001);
        assert_eq!(keys.peek(KeySpace::Note), 5001);
        assert_eq!(keys.peek(KeySpace::CellLineAssoc), 6001);
        assert_eq!(keys.peek(KeySpace::AccessionNumber), 7001);
    }

    #[tokio::test]
    async fn test_initialize_keys_missing_space_is_fatal() {
        let mut source = maxima();
        source.remove(&KeySpace::AccessionNumber);
        let err = initialize_keys(&mut source).await.unwrap_err();
        assert!(matches!(
            err,
            AlleleLoadError::KeyInit {
                space: KeySpace::AccessionNumber,
                ..
            }
        ));
    }
}
