//! Expiration queries
//!
//! Each query fetches a fresh chain and reports whether any certificate in it,
//! in the order the peer sent them, matches the query's condition. An empty
//! chain matches nothing.

use crate::checks::chain::{default_fetcher, ChainFetcher};
use crate::models::CertificateChain;
use crate::utils::{Query, QueryError};
use chrono::{DateTime, Utc};
use tracing::debug;

impl ChainFetcher {
    /// Whether any certificate presented by `address` has already expired
    pub async fn is_expired(&self, address: &str) -> Result<bool, QueryError> {
        self.query(address, Query::IsExpired, |chain| chain.any_expired())
            .await
    }

    /// Whether any certificate presented by `address` expires in fewer than
    /// `days` whole days
    ///
    /// Negative thresholds are allowed and only match certificates that
    /// expired more than `|days|` days ago.
    pub async fn expires_within_days(&self, address: &str, days: i64) -> Result<bool, QueryError> {
        self.query(address, Query::ExpiresWithinDays, |chain| {
            chain.any_expires_within_days(days)
        })
        .await
    }

    /// Whether any certificate presented by `address` expires strictly before `date`
    pub async fn expires_before_date(
        &self,
        address: &str,
        date: DateTime<Utc>,
    ) -> Result<bool, QueryError> {
        self.query(address, Query::ExpiresBeforeDate, |chain| {
            chain.any_expires_before(date)
        })
        .await
    }

    async fn query<F>(&self, address: &str, query: Query, predicate: F) -> Result<bool, QueryError>
    where
        F: FnOnce(&CertificateChain) -> bool,
    {
        let chain = self
            .fetch_chain(address)
            .await
            .map_err(|source| QueryError { query, source })?;

        let matched = predicate(&chain);
        debug!("{} for {}: {}", query, address, matched);
        Ok(matched)
    }
}

/// Whether any certificate presented by `address` has already expired
pub async fn is_expired(address: &str) -> Result<bool, QueryError> {
    default_fetcher().is_expired(address).await
}

/// Whether any certificate presented by `address` expires in fewer than `days` days
pub async fn expires_within_days(address: &str, days: i64) -> Result<bool, QueryError> {
    default_fetcher().expires_within_days(address, days).await
}

/// Whether any certificate presented by `address` expires strictly before `date`
pub async fn expires_before_date(address: &str, date: DateTime<Utc>) -> Result<bool, QueryError> {
    default_fetcher().expires_before_date(address, date).await
}
