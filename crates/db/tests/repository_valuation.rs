use casevalue_core::domain::case::{CaseId, HistoricalCase, QueryCase};
use casevalue_core::domain::valuation::AggregationPolicy;
use casevalue_core::valuation::{ValuationEngine, ValuationRequest};
use casevalue_db::repositories::{HistoricalCaseRepository, InMemoryHistoricalCaseRepository};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).single().expect("valid timestamp")
}

fn case(id: i64, venue: &str, surgery: &str, settlement: &str, limit: &str) -> HistoricalCase {
    HistoricalCase {
        id: CaseId(id),
        category: "auto".to_string(),
        venue: venue.to_string(),
        surgery: surgery.to_string(),
        injuries: "cervical strain".to_string(),
        liability_pct: "100%".to_string(),
        policy_limit: limit.to_string(),
        settlement: settlement.to_string(),
        accident_type: "Rear-end".to_string(),
        injection: "none".to_string(),
    }
}

fn repository() -> InMemoryHistoricalCaseRepository {
    InMemoryHistoricalCaseRepository::with_cases([
        case(1, "Fresno", "none", "$60,000", "$100,000"),
        case(2, "Fresno", "none", "$80,000", "$100,000"),
        case(3, "Fresno", "none", "$100,000", "$250,000"),
        case(4, "Kern", "Discectomy", "$240,000", "$500,000"),
        case(5, "Kern", "none", "$40,000", "$50,000"),
        case(6, "Orange", "none", "withdrawn", "$100,000"),
    ])
}

fn request(policy: AggregationPolicy) -> ValuationRequest {
    let query = QueryCase {
        venue: "Fresno".to_string(),
        surgery: "none".to_string(),
        injuries: "cervical strain".to_string(),
        liability_pct: "100%".to_string(),
        accident_type: "Rear-end".to_string(),
        policy_limit: "$100,000".to_string(),
        ..QueryCase::default()
    };
    ValuationRequest::new(query, policy, now())
}

#[tokio::test]
async fn valuation_sources_resolve_back_to_stored_cases() {
    let repo = repository();
    let corpus = repo.list_all().await.expect("list cases");

    let result = ValuationEngine::default()
        .value_case(&request(AggregationPolicy::RangeMedian), &corpus)
        .expect("valuation should succeed");
    assert_eq!(result.evaluator_amount, Decimal::from(80_000));
    assert_eq!(result.source_case_ids, vec![CaseId(2)]);

    let source = repo
        .find_by_id(&result.source_case_ids[0])
        .await
        .expect("find source case")
        .expect("source case is stored");
    assert_eq!(source.settlement_amount(), Some(result.evaluator_amount));
}

#[tokio::test]
async fn saved_cases_join_the_next_valuation() {
    let repo = repository();
    let engine = ValuationEngine::default();

    repo.save(case(7, "Fresno", "none", "$90,000", "$100,000")).await.expect("save case 7");
    repo.save(case(8, "Fresno", "none", "$95,000", "$100,000")).await.expect("save case 8");
    assert_eq!(repo.count().await.expect("count"), 8);

    let corpus = repo.list_all().await.expect("list cases");
    let result = engine
        .value_case(&request(AggregationPolicy::RangeMedian), &corpus)
        .expect("valuation should succeed");

    // Sorted settlements 40k, 60k, 80k, 90k, 95k, 100k, 240k; median 90k.
    assert_eq!(result.evaluator_amount, Decimal::from(90_000));
    assert_eq!(result.source_case_ids, vec![CaseId(7)]);
    assert_eq!(result.comparable_count, 8);

    let weighted = engine
        .value_case(&request(AggregationPolicy::WeightedMean), &corpus)
        .expect("weighted valuation should succeed");
    assert_eq!(weighted.source_case_ids.len(), 7);
    assert_eq!(
        engine.weight_learner().cached().map(|weights| weights.sample_size),
        Some(7)
    );
}
