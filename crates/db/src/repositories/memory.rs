use std::collections::BTreeMap;

use tokio::sync::RwLock;

use casevalue_core::domain::case::{CaseId, HistoricalCase};

use super::{HistoricalCaseRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryHistoricalCaseRepository {
    cases: RwLock<BTreeMap<CaseId, HistoricalCase>>,
}

impl InMemoryHistoricalCaseRepository {
    pub fn with_cases(cases: impl IntoIterator<Item = HistoricalCase>) -> Self {
        Self { cases: RwLock::new(cases.into_iter().map(|case| (case.id, case)).collect()) }
    }
}

#[async_trait::async_trait]
impl HistoricalCaseRepository for InMemoryHistoricalCaseRepository {
    async fn list_all(&self) -> Result<Vec<HistoricalCase>, RepositoryError> {
        let cases = self.cases.read().await;
        Ok(cases.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &CaseId) -> Result<Option<HistoricalCase>, RepositoryError> {
        let cases = self.cases.read().await;
        Ok(cases.get(id).cloned())
    }

    async fn save(&self, case: HistoricalCase) -> Result<(), RepositoryError> {
        let mut cases = self.cases.write().await;
        cases.insert(case.id, case);
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let cases = self.cases.read().await;
        Ok(cases.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use casevalue_core::domain::case::{CaseId, HistoricalCase};

    use crate::repositories::{HistoricalCaseRepository, InMemoryHistoricalCaseRepository};

    fn case(id: i64, settlement: &str) -> HistoricalCase {
        HistoricalCase {
            id: CaseId(id),
            venue: "Fresno".to_string(),
            settlement: settlement.to_string(),
            ..HistoricalCase::default()
        }
    }

    #[tokio::test]
    async fn in_memory_case_repo_round_trip() {
        let repo = InMemoryHistoricalCaseRepository::default();
        let case = case(4, "$40,000");

        repo.save(case.clone()).await.expect("save case");
        let found = repo.find_by_id(&case.id).await.expect("find case");

        assert_eq!(found, Some(case));
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn list_all_is_ordered_by_id_like_the_sql_repository() {
        let repo = InMemoryHistoricalCaseRepository::with_cases([
            case(9, "$9,000"),
            case(2, "$2,000"),
            case(5, "$5,000"),
        ]);

        let ids = repo
            .list_all()
            .await
            .expect("list cases")
            .into_iter()
            .map(|case| case.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![CaseId(2), CaseId(5), CaseId(9)]);
    }
}
