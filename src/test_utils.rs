//! Shared test utilities for the submission engine.
//!
//! This module provides common helper functions for setting up test databases
//! and creating centers, quarters and reports with sensible defaults.

use crate::{
    core::context::{Authorizer, Capability, EmailContext, Notifier},
    core::reporting::{attach_to_global_report, find_or_create_draft_report},
    entities::{center, quarter, stats_report},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a date, panicking on invalid input. Named for the reporting weekday the tests use.
#[allow(clippy::unwrap_used)]
pub fn friday(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates a test center.
///
/// # Defaults
/// * `abbreviation`: first three letters of `name`, upper-cased
pub async fn create_test_center(
    db: &DatabaseConnection,
    name: &str,
    is_active: bool,
) -> Result<center::Model> {
    center::ActiveModel {
        name: Set(name.to_string()),
        abbreviation: Set(name.chars().take(3).collect::<String>().to_uppercase()),
        is_active: Set(is_active),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates the fully scheduled quarter most tests report in.
///
/// # Defaults
/// * weekends: 2026-08-21 to 2026-11-13
/// * classrooms: 2026-09-11, 2026-10-09, 2026-10-30
pub async fn create_test_quarter(db: &DatabaseConnection) -> Result<quarter::Model> {
    quarter::ActiveModel {
        t1_distinction: Set("Relatedness".to_string()),
        year: Set(2026),
        start_weekend_date: Set(Some(friday(2026, 8, 21))),
        classroom1_date: Set(Some(friday(2026, 9, 11))),
        classroom2_date: Set(Some(friday(2026, 10, 9))),
        classroom3_date: Set(Some(friday(2026, 10, 30))),
        end_weekend_date: Set(Some(friday(2026, 11, 13))),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates the following quarter with its weekends but no classroom dates.
pub async fn create_unconfigured_quarter(db: &DatabaseConnection) -> Result<quarter::Model> {
    quarter::ActiveModel {
        t1_distinction: Set("Possibility".to_string()),
        year: Set(2026),
        start_weekend_date: Set(Some(friday(2026, 11, 20))),
        classroom1_date: Set(None),
        classroom2_date: Set(None),
        classroom3_date: Set(None),
        end_weekend_date: Set(Some(friday(2027, 2, 12))),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a locked report for `date` and makes it the official one.
pub async fn link_official_report(
    db: &DatabaseConnection,
    center_id: i64,
    quarter_id: i64,
    date: NaiveDate,
) -> Result<stats_report::Model> {
    let draft = find_or_create_draft_report(db, center_id, date, quarter_id, Utc::now()).await?;
    let mut active: stats_report::ActiveModel = draft.into();
    active.validated = Set(true);
    active.locked = Set(true);
    active.submitted_at = Set(Some(Utc::now()));
    let report = active.update(db).await?;
    attach_to_global_report(db, &report).await?;
    Ok(report)
}

/// Grants every capability.
#[derive(Debug, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn can(&self, _capability: Capability, _center_id: i64) -> bool {
        true
    }
}

/// Grants only the listed capabilities.
#[derive(Debug, Clone, Copy)]
pub struct Allow(pub &'static [Capability]);

impl Authorizer for Allow {
    fn can(&self, capability: Capability, _center_id: i64) -> bool {
        self.0.contains(&capability)
    }
}

/// Records every notification it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    /// Report id and email context of each send
    pub sent: Mutex<Vec<(i64, EmailContext)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    #[allow(clippy::unwrap_used)]
    async fn send(&self, report: &stats_report::Model, email: &EmailContext) -> Result<()> {
        self.sent.lock().unwrap().push((report.id, email.clone()));
        Ok(())
    }
}

/// Fails every send.
#[derive(Debug, Clone, Copy)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _report: &stats_report::Model, _email: &EmailContext) -> Result<()> {
        Err(Error::Notification {
            message: "mail relay unavailable".to_string(),
        })
    }
}
