use sqlx::Row;

use casevalue_core::domain::case::{CaseId, HistoricalCase};

use super::{HistoricalCaseRepository, RepositoryError};
use crate::DbPool;

pub struct SqlHistoricalCaseRepository {
    pool: DbPool,
}

impl SqlHistoricalCaseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_case(row: &sqlx::sqlite::SqliteRow) -> Result<HistoricalCase, RepositoryError> {
    let text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get::<Option<String>, _>(column)
            .map(Option::unwrap_or_default)
            .map_err(|e| RepositoryError::Decode(e.to_string()))
    };
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(HistoricalCase {
        id: CaseId(id),
        category: text("category")?,
        venue: text("venue")?,
        surgery: text("surgery")?,
        injuries: text("injuries")?,
        liability_pct: text("liability_pct")?,
        policy_limit: text("policy_limit")?,
        settlement: text("settlement")?,
        accident_type: text("accident_type")?,
        injection: text("injection")?,
    })
}

#[async_trait::async_trait]
impl HistoricalCaseRepository for SqlHistoricalCaseRepository {
    async fn list_all(&self) -> Result<Vec<HistoricalCase>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, category, venue, surgery, injuries, liability_pct, policy_limit,
                    settlement, accident_type, injection
             FROM historical_case ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_case).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &CaseId) -> Result<Option<HistoricalCase>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, category, venue, surgery, injuries, liability_pct, policy_limit,
                    settlement, accident_type, injection
             FROM historical_case WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_case(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, case: HistoricalCase) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO historical_case (id, category, venue, surgery, injuries, liability_pct,
                                          policy_limit, settlement, accident_type, injection)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 category = excluded.category,
                 venue = excluded.venue,
                 surgery = excluded.surgery,
                 injuries = excluded.injuries,
                 liability_pct = excluded.liability_pct,
                 policy_limit = excluded.policy_limit,
                 settlement = excluded.settlement,
                 accident_type = excluded.accident_type,
                 injection = excluded.injection,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
        )
        .bind(case.id.0)
        .bind(&case.category)
        .bind(&case.venue)
        .bind(&case.surgery)
        .bind(&case.injuries)
        .bind(&case.liability_pct)
        .bind(&case.policy_limit)
        .bind(&case.settlement)
        .bind(&case.accident_type)
        .bind(&case.injection)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM historical_case").fetch_one(&self.pool).await?;
        u64::try_from(count).map_err(|e| RepositoryError::Decode(e.to_string()))
    }
}
