use std::future::Future;

use uuid::Uuid;

use super::{at_minute, make_user, TestResult};
use crate::{CalculationStore, StorageError};

pub(super) async fn run_user_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "users",
        "inserted_user_readable_by_id",
        inserted_user_readable_by_id(factory).await,
    ));
    results.push(TestResult::from_result(
        "users",
        "duplicate_username_rejected",
        duplicate_username_rejected(factory).await,
    ));
    results.push(TestResult::from_result(
        "users",
        "duplicate_email_rejected",
        duplicate_email_rejected(factory).await,
    ));
    results.push(TestResult::from_result(
        "users",
        "find_by_username_or_email",
        find_by_username_or_email(factory).await,
    ));
    results.push(TestResult::from_result(
        "users",
        "find_unknown_login_is_none",
        find_unknown_login_is_none(factory).await,
    ));
    results.push(TestResult::from_result(
        "users",
        "get_unknown_user_not_found",
        get_unknown_user_not_found(factory).await,
    ));
    results.push(TestResult::from_result(
        "users",
        "record_login_sets_timestamp",
        record_login_sets_timestamp(factory).await,
    ));

    results
}

// ── 1. insert then get_user returns the same record ──────────────────────────

async fn inserted_user_readable_by_id<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let user = make_user("alice", "alice@example.com");
    s.insert_user(user.clone())
        .await
        .map_err(|e| format!("insert_user failed: {}", e))?;
    let read = s
        .get_user(user.id)
        .await
        .map_err(|e| format!("get_user failed: {}", e))?;
    if read != user {
        return Err(format!("expected {:?}, got {:?}", user, read));
    }
    Ok(())
}

// ── 2. a second user with the same username is rejected ─────────────────────

async fn duplicate_username_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.insert_user(make_user("bob", "bob@example.com"))
        .await
        .map_err(|e| format!("first insert failed: {}", e))?;
    match s.insert_user(make_user("bob", "other@example.com")).await {
        Err(StorageError::UserExists) => Ok(()),
        other => Err(format!("expected UserExists, got {:?}", other)),
    }
}

// ── 3. a second user with the same email is rejected ────────────────────────

async fn duplicate_email_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.insert_user(make_user("carol", "carol@example.com"))
        .await
        .map_err(|e| format!("first insert failed: {}", e))?;
    match s.insert_user(make_user("carol2", "carol@example.com")).await {
        Err(StorageError::UserExists) => Ok(()),
        other => Err(format!("expected UserExists, got {:?}", other)),
    }
}

// ── 4. login lookup matches username and email ──────────────────────────────

async fn find_by_username_or_email<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let user = make_user("dave", "dave@example.com");
    s.insert_user(user.clone())
        .await
        .map_err(|e| format!("insert_user failed: {}", e))?;

    for login in ["dave", "dave@example.com"] {
        let found = s
            .find_user_by_login(login)
            .await
            .map_err(|e| format!("find_user_by_login({}) failed: {}", login, e))?;
        match found {
            Some(u) if u.id == user.id => {}
            other => return Err(format!("login {:?}: expected dave, got {:?}", login, other)),
        }
    }
    Ok(())
}

// ── 5. unknown login is Ok(None), not an error ──────────────────────────────

async fn find_unknown_login_is_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.find_user_by_login("nobody").await {
        Ok(None) => Ok(()),
        other => Err(format!("expected Ok(None), got {:?}", other)),
    }
}

// ── 6. get_user on empty store returns UserNotFound with the id ─────────────

async fn get_unknown_user_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = Uuid::new_v4();
    match s.get_user(id).await {
        Err(StorageError::UserNotFound { id: got }) if got == id => Ok(()),
        other => Err(format!("expected UserNotFound({}), got {:?}", id, other)),
    }
}

// ── 7. record_login stamps last_login ───────────────────────────────────────

async fn record_login_sets_timestamp<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let user = make_user("erin", "erin@example.com");
    s.insert_user(user.clone())
        .await
        .map_err(|e| format!("insert_user failed: {}", e))?;
    let at = at_minute(42);
    s.record_login(user.id, at)
        .await
        .map_err(|e| format!("record_login failed: {}", e))?;
    let read = s
        .get_user(user.id)
        .await
        .map_err(|e| format!("get_user failed: {}", e))?;
    if read.last_login != Some(at) {
        return Err(format!("expected last_login {:?}, got {:?}", at, read.last_login));
    }
    Ok(())
}
