use super::{Lookup, ReferenceResolver};
use crate::domain::LOGICAL_DB_MGI;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;

/// `_MGIType_key` of a Marker
const MGI_TYPE_MARKER: i64 = 2;

/// Resolver backed by the MGI PostgreSQL schema
///
/// Outcomes, misses included, are cached for the life of the resolver. Input
/// files repeat the same vocabulary terms, strains and creators on nearly
/// every line.
pub struct PgResolver {
    pool: PgPool,
    cache: HashMap<Lookup, Option<i64>>,
}

impl PgResolver {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: HashMap::new(),
        }
    }

    /// Number of cached outcomes
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    async fn fetch(&self, lookup: &Lookup) -> Result<Option<i64>> {
        let key = match lookup {
            Lookup::Marker(mgi_id) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT _object_key::bigint FROM acc_accession
                    WHERE accid = $1
                      AND _mgitype_key = $2
                      AND _logicaldb_key = $3
                      AND preferred = 1
                    LIMIT 1
                    "#,
                )
                .bind(mgi_id.as_str())
                .bind(MGI_TYPE_MARKER)
                .bind(LOGICAL_DB_MGI)
                .fetch_optional(&self.pool)
                .await?
            },
            Lookup::Term(vocabulary, term) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT _term_key::bigint FROM voc_term WHERE _vocab_key = $1 AND term = $2 LIMIT 1",
                )
                .bind(vocabulary.key())
                .bind(term.as_str())
                .fetch_optional(&self.pool)
                .await?
            },
            Lookup::Strain(strain) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT _strain_key::bigint FROM prb_strain WHERE strain = $1 LIMIT 1",
                )
                .bind(strain.as_str())
                .fetch_optional(&self.pool)
                .await?
            },
            Lookup::User(login) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT _user_key::bigint FROM mgi_user WHERE login = $1 LIMIT 1",
                )
                .bind(login.as_str())
                .fetch_optional(&self.pool)
                .await?
            },
            Lookup::Reference(jnum) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT _refs_key::bigint FROM bib_citation_cache WHERE jnumid = $1 LIMIT 1",
                )
                .bind(jnum.as_str())
                .fetch_optional(&self.pool)
                .await?
            },
            Lookup::MutantCellLine(name) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT _cellline_key::bigint FROM all_cellline
                    WHERE ismutant = 1
                      AND _derivation_key IS NOT NULL
                      AND cellline = $1
                    ORDER BY _cellline_key DESC
                    LIMIT 1
                    "#,
                )
                .bind(name.as_str())
                .fetch_optional(&self.pool)
                .await?
            },
        };

        Ok(key)
    }
}

#[async_trait]
impl ReferenceResolver for PgResolver {
    async fn lookup(&mut self, lookup: &Lookup) -> Result<Option<i64>> {
        if let Some(cached) = self.cache.get(lookup) {
            return Ok(*cached);
        }

        debug!(%lookup, "Querying reference data");
        let key = self.fetch(lookup).await?;
        self.cache.insert(lookup.clone(), key);

        Ok(key)
    }
}
