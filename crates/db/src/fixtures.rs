use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Rows the seeded corpus must contain verbatim.
const SEED_CASES: &[SeedCaseContract] = &[
    SeedCaseContract { id: 1, venue: "Los Angeles", settlement: "$850,000" },
    SeedCaseContract { id: 2, venue: "Los Angeles", settlement: "$45,000" },
    SeedCaseContract { id: 3, venue: "Los Angeles", settlement: "$275,000" },
    SeedCaseContract { id: 4, venue: "Fresno", settlement: "$30,000" },
    SeedCaseContract { id: 5, venue: "Fresno", settlement: "$410,000" },
    SeedCaseContract { id: 6, venue: "Orange", settlement: "$95,000" },
    SeedCaseContract { id: 7, venue: "Orange", settlement: "$180,000" },
    SeedCaseContract { id: 8, venue: "Kern", settlement: "$22,500" },
    SeedCaseContract { id: 9, venue: "San Diego", settlement: "Confidential" },
    SeedCaseContract { id: 10, venue: "Los Angeles", settlement: "$15,000" },
    SeedCaseContract { id: 11, venue: "San Diego", settlement: "$60,000" },
    SeedCaseContract { id: 12, venue: "Fresno", settlement: "$92,500 (policy tender)" },
];

/// Deterministic corpus of resolved claims for demos and end-to-end tests.
///
/// Several rows deliberately carry free-text settlements (`Confidential`,
/// trailing notes) so the valuation path exercises its lenient parsing.
pub struct DemoCorpus;

impl DemoCorpus {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_corpus.sql");

    /// Loads the corpus. Re-running replaces the seeded rows in place.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult { cases_seeded: SEED_CASES.iter().map(|case| case.id).collect() })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let quoted_ids = sql_array_from_ids(SEED_CASES.iter().map(|case| case.id));
        let expected_total = SEED_CASES.len() as i64;
        let existing_total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM historical_case WHERE id IN {quoted_ids}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("demo-case-count".to_string(), existing_total == expected_total));

        for case in SEED_CASES {
            let matches: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM historical_case WHERE id = ?1 AND venue = ?2 AND settlement = ?3)",
            )
            .bind(case.id)
            .bind(case.venue)
            .bind(case.settlement)
            .fetch_one(pool)
            .await?;
            checks.push((format!("demo-case-{}", case.id), matches == 1));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the seeded rows, leaving any other cases untouched.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let quoted_ids = sql_array_from_ids(SEED_CASES.iter().map(|case| case.id));
        sqlx::query(&format!("DELETE FROM historical_case WHERE id IN {quoted_ids}"))
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedCaseContract {
    id: i64,
    venue: &'static str,
    settlement: &'static str,
}

fn sql_array_from_ids(ids: impl Iterator<Item = i64>) -> String {
    let joined = ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",");
    format!("({joined})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub cases_seeded: Vec<i64>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

#[cfg(test)]
mod tests {
    use casevalue_core::domain::case::CaseId;

    use super::DemoCorpus;
    use crate::repositories::{HistoricalCaseRepository, SqlHistoricalCaseRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn demo_corpus_loads_and_verifies() {
        let pool = setup().await;

        let seeded = DemoCorpus::load(&pool).await.expect("load demo corpus");
        assert_eq!(seeded.cases_seeded.len(), 12);

        let verification = DemoCorpus::verify(&pool).await.expect("verify demo corpus");
        assert!(verification.all_present, "failed checks: {:?}", verification.checks);
    }

    #[tokio::test]
    async fn reloading_is_idempotent() {
        let pool = setup().await;
        DemoCorpus::load(&pool).await.expect("first load");
        DemoCorpus::load(&pool).await.expect("second load");

        let repo = SqlHistoricalCaseRepository::new(pool);
        assert_eq!(repo.count().await.expect("count"), 12);
        let tender = repo.find_by_id(&CaseId(12)).await.expect("find").expect("case 12");
        assert_eq!(tender.settlement_amount(), Some(92_500.into()));
    }

    #[tokio::test]
    async fn verification_fails_before_seeding_and_after_clean() {
        let pool = setup().await;
        let before = DemoCorpus::verify(&pool).await.expect("verify empty");
        assert!(!before.all_present);

        DemoCorpus::load(&pool).await.expect("load");
        DemoCorpus::clean(&pool).await.expect("clean");
        let after = DemoCorpus::verify(&pool).await.expect("verify cleaned");
        assert!(!after.all_present);
    }
}
