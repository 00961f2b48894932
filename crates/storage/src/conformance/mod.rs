//! Conformance test suite for `CalculationStore` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! `CalculationStore` implementation can run to verify correctness. The
//! suite covers:
//!
//! - **Users**: insertion, duplicate detection, lookup by username/email,
//!   login stamping
//! - **Calculations**: insert/get/list/update/delete, owner scoping,
//!   ordering, immutable fields, correct error variants
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty storage instance for each test:
//!
//! ```ignore
//! use abacus_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn sqlite_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_sqlite_store().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod calculations;
mod users;

use std::fmt;
use std::future::Future;

use serde_json::json;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use abacus_core::CalculationRecord;

use crate::record::UserRecord;
use crate::CalculationStore;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category ("users" or "calculations").
    pub category: String,
    /// Test name (e.g. "duplicate_username_rejected").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in self.results.iter().filter(|r| !r.passed) {
            writeln!(
                f,
                "  FAIL [{}/{}]: {}",
                r.category,
                r.name,
                r.message.as_deref().unwrap_or("(no message)")
            )?;
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// storage instance, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: CalculationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(users::run_user_tests(&factory).await);
    results.extend(calculations::run_calculation_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: record constructors with sensible defaults ──────────────────────

fn base_time() -> OffsetDateTime {
    // 2025-01-01T00:00:00Z
    OffsetDateTime::from_unix_timestamp(1_735_689_600).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

fn at_minute(minute: i64) -> OffsetDateTime {
    base_time() + Duration::minutes(minute)
}

fn make_user(username: &str, email: &str) -> UserRecord {
    UserRecord {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        password_hash: "$2b$12$not-a-real-hash".to_string(),
        is_active: true,
        is_verified: false,
        created_at: base_time(),
        updated_at: base_time(),
        last_login: None,
    }
}

fn make_calculation(
    owner: Uuid,
    kind: &str,
    inputs: serde_json::Value,
    minute: i64,
) -> Result<CalculationRecord, String> {
    CalculationRecord::create(owner, &json!(kind), &inputs, at_minute(minute))
        .map_err(|e| format!("fixture calculation failed: {}", e))
}
