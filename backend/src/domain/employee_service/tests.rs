//! Tests for the employee facade.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::EmployeeGatewayError;
use crate::test_support::employee;
use crate::test_support::employee_gateway::ScriptedGateway;
use crate::test_support::resilience::instant_pipeline;

struct Harness {
    facade: EmployeeFacade,
    gateway: Arc<ScriptedGateway>,
    cache: Arc<IdempotencyCache>,
}

fn harness(gateway: ScriptedGateway) -> Harness {
    let gateway = Arc::new(gateway);
    let cache = Arc::new(IdempotencyCache::new(Arc::new(DefaultClock)));
    let facade = EmployeeFacade::new(
        Arc::clone(&gateway) as Arc<dyn EmployeeGateway>,
        Arc::new(instant_pipeline(3)),
        Arc::clone(&cache),
    );
    Harness {
        facade,
        gateway,
        cache,
    }
}

#[fixture]
fn cancel() -> CancellationToken {
    CancellationToken::new()
}

#[fixture]
fn staff() -> Vec<EmployeeRecord> {
    vec![
        employee("1", "Ada Lovelace", 5000),
        employee("2", "Grace Hopper", 7000),
    ]
}

fn input(name: &str) -> EmployeeInput {
    EmployeeInput::new(name, 4200, 29, "Analyst").expect("valid input")
}

fn key(raw: &str) -> IdempotencyKey {
    IdempotencyKey::new(raw).expect("valid key")
}

fn transient() -> EmployeeGatewayError {
    EmployeeGatewayError::transient("status 503")
}

#[rstest]
#[tokio::test]
async fn get_all_returns_upstream_list(cancel: CancellationToken, staff: Vec<EmployeeRecord>) {
    let h = harness(ScriptedGateway::new().push_list(Ok(staff.clone())));

    let employees = h.facade.get_all(&cancel).await.expect("list succeeds");

    assert_eq!(employees, staff);
}

#[rstest]
#[tokio::test]
async fn get_all_falls_back_to_single_placeholder(cancel: CancellationToken) {
    let h = harness(
        ScriptedGateway::new()
            .push_list(Err(transient()))
            .push_list(Err(transient()))
            .push_list(Err(transient())),
    );

    let employees = h.facade.get_all(&cancel).await.expect("list degrades");

    assert_eq!(employees, vec![EmployeeRecord::fallback()]);
    assert_eq!(h.gateway.calls().list, 3);
}

#[rstest]
#[tokio::test]
async fn get_by_id_surfaces_not_found(cancel: CancellationToken) {
    let h = harness(
        ScriptedGateway::new().push_get(Err(EmployeeGatewayError::not_found("no employee 9"))),
    );

    let error = h
        .facade
        .get_by_id("9", &cancel)
        .await
        .expect_err("not found is not masked");

    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(h.gateway.calls().get, vec!["9".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn get_by_id_falls_back_on_rate_limit(cancel: CancellationToken) {
    let h = harness(ScriptedGateway::new().push_get(Err(EmployeeGatewayError::rate_limited("429"))));

    let lookup = h.facade.get_by_id("9", &cancel).await.expect("read degrades");

    assert_eq!(lookup, EmployeeLookup::Employee(EmployeeRecord::fallback()));
}

#[rstest]
#[case(" HIGHESTSALARY ")]
#[case("highestSalary")]
#[tokio::test]
async fn reserved_identifier_routes_to_highest_salary(
    cancel: CancellationToken,
    staff: Vec<EmployeeRecord>,
    #[case] id: &str,
) {
    let h = harness(ScriptedGateway::new().push_list(Ok(staff)));

    let lookup = h.facade.get_by_id(id, &cancel).await.expect("aggregate");

    assert_eq!(lookup, EmployeeLookup::HighestSalary(7000));
    assert!(h.gateway.calls().get.is_empty(), "no lookup by id happens");
}

#[rstest]
#[tokio::test]
async fn reserved_identifier_routes_to_top_earners(
    cancel: CancellationToken,
    staff: Vec<EmployeeRecord>,
) {
    let h = harness(ScriptedGateway::new().push_list(Ok(staff)));

    let lookup = h
        .facade
        .get_by_id("topTenHighestEarningEmployeeNames", &cancel)
        .await
        .expect("aggregate");

    assert_eq!(
        lookup,
        EmployeeLookup::TopEarnerNames(vec!["Grace Hopper".to_owned(), "Ada Lovelace".to_owned()])
    );
}

#[rstest]
#[tokio::test]
async fn top_ten_names_caps_at_ten(cancel: CancellationToken) {
    let many = (1..=12_u64)
        .map(|index| employee(&index.to_string(), &format!("E{index}"), index * 100))
        .collect::<Vec<_>>();
    let h = harness(ScriptedGateway::new().push_list(Ok(many)));

    let names = h.facade.top_ten_names(&cancel).await.expect("names");

    assert_eq!(names.len(), TOP_EARNER_LIMIT);
    assert_eq!(names.first().map(String::as_str), Some("E12"));
}

#[rstest]
#[tokio::test]
async fn highest_salary_of_empty_snapshot_fails(cancel: CancellationToken) {
    let h = harness(ScriptedGateway::new().push_list(Ok(Vec::new())));

    let error = h.facade.highest_salary(&cancel).await.expect_err("empty");

    assert_eq!(error.code(), ErrorCode::EmptyCollection);
}

#[rstest]
#[tokio::test]
async fn search_without_match_is_not_found(cancel: CancellationToken, staff: Vec<EmployeeRecord>) {
    let h = harness(ScriptedGateway::new().push_list(Ok(staff)));

    let error = h
        .facade
        .search_by_name("knuth", &cancel)
        .await
        .expect_err("no match");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn search_matches_fragment_case_insensitively(
    cancel: CancellationToken,
    staff: Vec<EmployeeRecord>,
) {
    let h = harness(ScriptedGateway::new().push_list(Ok(staff)));

    let matches = h.facade.search_by_name("HOP", &cancel).await.expect("match");

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "Grace Hopper");
}

#[rstest]
#[tokio::test]
async fn repeated_create_with_same_key_replays_cached_record(cancel: CancellationToken) {
    let created = employee("42", "Ada Lovelace", 4200);
    let h = harness(ScriptedGateway::new().push_create(Ok(created.clone())));

    let first = h
        .facade
        .create(key("k-1"), input("Ada Lovelace"), &cancel)
        .await
        .expect("create");
    let second = h
        .facade
        .create(key("k-1"), input("Somebody Else"), &cancel)
        .await
        .expect("replay");

    assert_eq!(first, created);
    assert_eq!(second, created);
    assert_eq!(h.gateway.calls().create.len(), 1, "second call skips upstream");
}

#[rstest]
#[tokio::test]
async fn create_forwards_the_key_on_every_attempt(cancel: CancellationToken) {
    let h = harness(
        ScriptedGateway::new()
            .push_create(Err(transient()))
            .push_create(Ok(employee("7", "Ada Lovelace", 4200))),
    );

    h.facade
        .create(key("k-2"), input("Ada Lovelace"), &cancel)
        .await
        .expect("create");

    let keys = h
        .gateway
        .calls()
        .create
        .into_iter()
        .map(|(_, key)| key)
        .collect::<Vec<_>>();
    assert_eq!(keys, vec![Some("k-2".to_owned()), Some("k-2".to_owned())]);
}

#[rstest]
#[tokio::test]
async fn failed_create_returns_and_caches_pending_record(cancel: CancellationToken) {
    let h = harness(ScriptedGateway::new());

    let record = h
        .facade
        .create(key("k-3"), input("Ada Lovelace"), &cancel)
        .await
        .expect("create degrades");

    assert!(record.is_degraded());
    assert_eq!(record.name, "Ada Lovelace (pending)");
    assert_eq!((record.salary, record.age), (4200, 29));
    assert_eq!(h.cache.lookup(&key("k-3")), Some(record));
    assert_eq!(h.gateway.calls().create.len(), 3);
}

#[rstest]
#[tokio::test]
async fn cancelled_create_is_not_cached() {
    let h = harness(ScriptedGateway::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let error = h
        .facade
        .create(key("k-4"), input("Ada Lovelace"), &cancel)
        .await
        .expect_err("cancelled");

    assert_eq!(error.code(), ErrorCode::Cancelled);
    assert!(h.cache.is_empty());
}

#[rstest]
#[tokio::test]
async fn delete_removes_by_name_and_returns_it(cancel: CancellationToken) {
    let h = harness(
        ScriptedGateway::new()
            .push_get(Ok(employee("5", "Grace Hopper", 7000)))
            .push_delete(Ok(true)),
    );

    let name = h.facade.delete_by_id("5", &cancel).await.expect("delete");

    assert_eq!(name, "Grace Hopper");
    assert_eq!(h.gateway.calls().delete, vec!["Grace Hopper".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn delete_returning_false_is_a_failure(cancel: CancellationToken) {
    let h = harness(
        ScriptedGateway::new()
            .push_get(Ok(employee("5", "Grace Hopper", 7000)))
            .push_delete(Ok(false)),
    );

    let error = h
        .facade
        .delete_by_id("5", &cancel)
        .await
        .expect_err("false is not success");

    assert_eq!(error.code(), ErrorCode::DeleteReturnedFalse);
}

#[rstest]
#[tokio::test]
async fn delete_of_missing_employee_is_not_found(cancel: CancellationToken) {
    let h = harness(ScriptedGateway::new().push_get(Err(EmployeeGatewayError::not_found("gone"))));

    let error = h.facade.delete_by_id("5", &cancel).await.expect_err("missing");

    assert_eq!(error.code(), ErrorCode::NotFound);
    assert!(h.gateway.calls().delete.is_empty());
}

#[rstest]
#[tokio::test]
async fn delete_never_targets_the_fallback_record(cancel: CancellationToken) {
    let h = harness(ScriptedGateway::new());

    let error = h.facade.delete_by_id("5", &cancel).await.expect_err("degraded");

    assert_eq!(error.code(), ErrorCode::TransientUpstream);
    assert!(h.gateway.calls().delete.is_empty());
}

#[rstest]
#[tokio::test]
async fn delete_propagates_write_failures(cancel: CancellationToken) {
    let h = harness(
        ScriptedGateway::new()
            .push_get(Ok(employee("5", "Grace Hopper", 7000)))
            .push_delete(Err(EmployeeGatewayError::rate_limited("429"))),
    );

    let error = h.facade.delete_by_id("5", &cancel).await.expect_err("limited");

    assert_eq!(error.code(), ErrorCode::RateLimited);
}
