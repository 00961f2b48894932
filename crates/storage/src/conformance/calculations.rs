use std::future::Future;

use serde_json::json;
use uuid::Uuid;

use abacus_core::CalculationRecord;

use super::{at_minute, make_calculation, TestResult};
use crate::{CalculationStore, StorageError};

pub(super) async fn run_calculation_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "calculations",
        "inserted_calculation_readable",
        inserted_calculation_readable(factory).await,
    ));
    results.push(TestResult::from_result(
        "calculations",
        "duplicate_id_rejected",
        duplicate_id_rejected(factory).await,
    ));
    results.push(TestResult::from_result(
        "calculations",
        "foreign_owner_cannot_read",
        foreign_owner_cannot_read(factory).await,
    ));
    results.push(TestResult::from_result(
        "calculations",
        "list_is_owner_scoped_and_oldest_first",
        list_is_owner_scoped_and_oldest_first(factory).await,
    ));
    results.push(TestResult::from_result(
        "calculations",
        "list_empty_for_unknown_owner",
        list_empty_for_unknown_owner(factory).await,
    ));
    results.push(TestResult::from_result(
        "calculations",
        "update_replaces_inputs_and_result",
        update_replaces_inputs_and_result(factory).await,
    ));
    results.push(TestResult::from_result(
        "calculations",
        "update_missing_not_found",
        update_missing_not_found(factory).await,
    ));
    results.push(TestResult::from_result(
        "calculations",
        "update_cannot_change_operation",
        update_cannot_change_operation(factory).await,
    ));
    results.push(TestResult::from_result(
        "calculations",
        "delete_removes_record",
        delete_removes_record(factory).await,
    ));
    results.push(TestResult::from_result(
        "calculations",
        "foreign_owner_cannot_delete",
        foreign_owner_cannot_delete(factory).await,
    ));

    results
}

// ── 1. insert then get returns an identical record ──────────────────────────

async fn inserted_calculation_readable<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let owner = Uuid::new_v4();
    let rec = make_calculation(owner, "addition", json!([1, 2]), 0)?;
    s.insert_calculation(rec.clone())
        .await
        .map_err(|e| format!("insert failed: {}", e))?;
    let read = s
        .get_calculation(owner, rec.id())
        .await
        .map_err(|e| format!("get failed: {}", e))?;
    if read != rec {
        return Err(format!("expected {:?}, got {:?}", rec, read));
    }
    Ok(())
}

// ── 2. inserting the same id twice fails ────────────────────────────────────

async fn duplicate_id_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_calculation(Uuid::new_v4(), "power", json!([2, 8]), 0)?;
    s.insert_calculation(rec.clone())
        .await
        .map_err(|e| format!("first insert failed: {}", e))?;
    match s.insert_calculation(rec.clone()).await {
        Err(StorageError::CalculationExists { id }) if id == rec.id() => Ok(()),
        other => Err(format!("expected CalculationExists, got {:?}", other)),
    }
}

// ── 3. another user's record looks missing ──────────────────────────────────

async fn foreign_owner_cannot_read<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_calculation(Uuid::new_v4(), "modulus", json!([10, 3]), 0)?;
    s.insert_calculation(rec.clone())
        .await
        .map_err(|e| format!("insert failed: {}", e))?;
    match s.get_calculation(Uuid::new_v4(), rec.id()).await {
        Err(StorageError::CalculationNotFound { id }) if id == rec.id() => Ok(()),
        other => Err(format!("expected CalculationNotFound, got {:?}", other)),
    }
}

// ── 4. list returns only the owner's records, ascending created_at ──────────

async fn list_is_owner_scoped_and_oldest_first<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    let newest = make_calculation(owner, "addition", json!([1, 1]), 30)?;
    let oldest = make_calculation(owner, "subtraction", json!([5, 1]), 10)?;
    let middle = make_calculation(owner, "division", json!([8, 2]), 20)?;
    let foreign = make_calculation(other, "addition", json!([9, 9]), 15)?;

    for rec in [&newest, &oldest, &middle, &foreign] {
        s.insert_calculation((*rec).clone())
            .await
            .map_err(|e| format!("insert failed: {}", e))?;
    }

    let listed = s
        .list_calculations(owner)
        .await
        .map_err(|e| format!("list failed: {}", e))?;
    let ids: Vec<Uuid> = listed.iter().map(|r| r.id()).collect();
    let expected = vec![oldest.id(), middle.id(), newest.id()];
    if ids != expected {
        return Err(format!("expected order {:?}, got {:?}", expected, ids));
    }
    Ok(())
}

// ── 5. list for an owner with nothing stored is empty ───────────────────────

async fn list_empty_for_unknown_owner<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.list_calculations(Uuid::new_v4()).await {
        Ok(v) if v.is_empty() => Ok(()),
        other => Err(format!("expected empty list, got {:?}", other)),
    }
}

// ── 6. update persists the recomputed record ────────────────────────────────

async fn update_replaces_inputs_and_result<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let owner = Uuid::new_v4();
    let mut rec = make_calculation(owner, "multiplication", json!([2, 3]), 0)?;
    s.insert_calculation(rec.clone())
        .await
        .map_err(|e| format!("insert failed: {}", e))?;

    rec.replace_inputs(&json!([4, 5]), at_minute(5))
        .map_err(|e| format!("replace_inputs failed: {}", e))?;
    s.update_calculation(rec.clone())
        .await
        .map_err(|e| format!("update failed: {}", e))?;

    let read = s
        .get_calculation(owner, rec.id())
        .await
        .map_err(|e| format!("get failed: {}", e))?;
    if read.result() != Some(20.0) {
        return Err(format!("expected result 20.0, got {:?}", read.result()));
    }
    if read.updated_at() != at_minute(5) {
        return Err(format!("expected updated_at bumped, got {:?}", read.updated_at()));
    }
    Ok(())
}

// ── 7. updating a record that was never stored fails ────────────────────────

async fn update_missing_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_calculation(Uuid::new_v4(), "addition", json!([1, 2]), 0)?;
    match s.update_calculation(rec.clone()).await {
        Err(StorageError::CalculationNotFound { id }) if id == rec.id() => Ok(()),
        other => Err(format!("expected CalculationNotFound, got {:?}", other)),
    }
}

// ── 8. a copy with a different operation is refused ─────────────────────────

async fn update_cannot_change_operation<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let owner = Uuid::new_v4();
    let rec = make_calculation(owner, "addition", json!([1, 2]), 0)?;
    s.insert_calculation(rec.clone())
        .await
        .map_err(|e| format!("insert failed: {}", e))?;

    let mut value = serde_json::to_value(&rec).map_err(|e| e.to_string())?;
    value["type"] = json!("subtraction");
    let tampered: CalculationRecord =
        serde_json::from_value(value).map_err(|e| format!("tamper failed: {}", e))?;
    match s.update_calculation(tampered).await {
        Err(StorageError::ImmutableField { field: "operation", .. }) => {}
        other => return Err(format!("expected ImmutableField(operation), got {:?}", other)),
    }
    let read = s
        .get_calculation(owner, rec.id())
        .await
        .map_err(|e| format!("get failed: {}", e))?;
    if read != rec {
        return Err(format!("stored record changed: {:?}", read));
    }
    Ok(())
}

// ── 9. delete then get returns not found ────────────────────────────────────

async fn delete_removes_record<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let owner = Uuid::new_v4();
    let rec = make_calculation(owner, "exponentiation", json!([2, 3]), 0)?;
    s.insert_calculation(rec.clone())
        .await
        .map_err(|e| format!("insert failed: {}", e))?;
    s.delete_calculation(owner, rec.id())
        .await
        .map_err(|e| format!("delete failed: {}", e))?;
    match s.get_calculation(owner, rec.id()).await {
        Err(StorageError::CalculationNotFound { .. }) => {}
        other => return Err(format!("expected CalculationNotFound after delete, got {:?}", other)),
    }
    match s.delete_calculation(owner, rec.id()).await {
        Err(StorageError::CalculationNotFound { .. }) => Ok(()),
        other => Err(format!("expected second delete to fail, got {:?}", other)),
    }
}

// ── 10. another user cannot delete the record ────────────────────────────────

async fn foreign_owner_cannot_delete<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let owner = Uuid::new_v4();
    let rec = make_calculation(owner, "addition", json!([3, 4]), 0)?;
    s.insert_calculation(rec.clone())
        .await
        .map_err(|e| format!("insert failed: {}", e))?;
    match s.delete_calculation(Uuid::new_v4(), rec.id()).await {
        Err(StorageError::CalculationNotFound { .. }) => {}
        other => return Err(format!("expected CalculationNotFound, got {:?}", other)),
    }
    s.get_calculation(owner, rec.id())
        .await
        .map(|_| ())
        .map_err(|e| format!("record vanished after foreign delete: {}", e))
}
