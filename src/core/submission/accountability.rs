//! Accountability holder assignments.
//!
//! A mapping says who holds an accountability for a center between two dates (both
//! inclusive). Submitting a week assigns the accountabilities named in the submission
//! from the reporting date until the quarter's closing weekend plus a grace period,
//! and ends whatever mapping another holder had for the same accountability.

use crate::entities::{AccountabilityMapping, accountability_mapping, quarter};
use crate::errors::Result;
use chrono::{Duration, NaiveDate};
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*};
use std::collections::BTreeSet;
use tracing::debug;

/// One accountability and who should hold it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Assignment {
    /// Accountability name
    pub accountability: String,
    /// [`accountability_mapping::HOLDER_TEAM_MEMBER`] or
    /// [`accountability_mapping::HOLDER_PROGRAM_LEADER`]
    pub holder_kind: &'static str,
    /// Holder id
    pub holder_id: i64,
}

/// Counts of mapping rows touched by [`apply_assignments`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountabilityChanges {
    /// Mappings created
    pub started: usize,
    /// Mappings of the same holder whose end date moved
    pub extended: usize,
    /// Mappings ended because someone else took over or the holder gave it up
    pub ended: usize,
}

/// Last day new mappings stay in effect.
#[must_use]
pub fn mapping_end(quarter: &quarter::Model, reporting_date: NaiveDate, grace_days: i64) -> NaiveDate {
    quarter
        .end_weekend_date
        .unwrap_or(reporting_date)
        .max(reporting_date)
        + Duration::days(grace_days)
}

/// Mappings of a center in effect on `date`.
pub async fn active_mappings<C>(
    db: &C,
    center_id: i64,
    date: NaiveDate,
) -> Result<Vec<accountability_mapping::Model>>
where
    C: ConnectionTrait,
{
    AccountabilityMapping::find()
        .filter(accountability_mapping::Column::CenterId.eq(center_id))
        .filter(accountability_mapping::Column::StartsAt.lte(date))
        .filter(accountability_mapping::Column::EndsAt.gte(date))
        .order_by_asc(accountability_mapping::Column::Accountability)
        .order_by_asc(accountability_mapping::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Accountabilities a holder has on `date`, sorted.
#[must_use]
pub fn held_by(mappings: &[accountability_mapping::Model], holder_kind: &str, holder_id: i64) -> Vec<String> {
    let held: BTreeSet<String> = mappings
        .iter()
        .filter(|mapping| mapping.holder_kind == holder_kind && mapping.holder_id == holder_id)
        .map(|mapping| mapping.accountability.clone())
        .collect();
    held.into_iter().collect()
}

async fn end_mapping<C>(db: &C, mapping: accountability_mapping::Model, last_day: NaiveDate) -> Result<()>
where
    C: ConnectionTrait,
{
    debug!(
        mapping_id = mapping.id,
        accountability = %mapping.accountability,
        holder_id = mapping.holder_id,
        "Ending accountability mapping"
    );
    let mut active_model: accountability_mapping::ActiveModel = mapping.into();
    active_model.ends_at = Set(last_day);
    active_model.update(db).await?;
    Ok(())
}

/// Makes `assignments` the holders from `reporting_date` to `ends_at`.
///
/// `released` lists holders whose complete accountability list was submitted: any
/// mapping they hold that is not among the assignments is ended as well.
pub async fn apply_assignments<C>(
    db: &C,
    center_id: i64,
    reporting_date: NaiveDate,
    ends_at: NaiveDate,
    assignments: &[Assignment],
    released: &[(&'static str, i64)],
) -> Result<AccountabilityChanges>
where
    C: ConnectionTrait,
{
    let mut changes = AccountabilityChanges::default();
    let day_before = reporting_date - Duration::days(1);
    let current = active_mappings(db, center_id, reporting_date).await?;

    let wanted: BTreeSet<(&str, &str, i64)> = assignments
        .iter()
        .map(|a| (a.accountability.as_str(), a.holder_kind, a.holder_id))
        .collect();
    let assigned: BTreeSet<&str> = wanted.iter().map(|(name, _, _)| *name).collect();

    let mut kept = BTreeSet::new();
    for mapping in current {
        let key = (
            mapping.accountability.as_str(),
            mapping.holder_kind.as_str(),
            mapping.holder_id,
        );
        if wanted.contains(&key) {
            kept.insert((mapping.accountability.clone(), mapping.holder_kind.clone(), mapping.holder_id));
            if mapping.ends_at != ends_at {
                let mut active_model: accountability_mapping::ActiveModel = mapping.into();
                active_model.ends_at = Set(ends_at);
                active_model.update(db).await?;
                changes.extended += 1;
            }
            continue;
        }

        let replaced = assigned.contains(mapping.accountability.as_str());
        let given_up = released
            .iter()
            .any(|(kind, id)| mapping.holder_kind == *kind && mapping.holder_id == *id);
        if replaced || given_up {
            end_mapping(db, mapping, day_before).await?;
            changes.ended += 1;
        }
    }

    for assignment in assignments {
        let key = (
            assignment.accountability.clone(),
            assignment.holder_kind.to_string(),
            assignment.holder_id,
        );
        if kept.contains(&key) {
            continue;
        }
        accountability_mapping::ActiveModel {
            center_id: Set(center_id),
            accountability: Set(assignment.accountability.clone()),
            holder_kind: Set(assignment.holder_kind.to_string()),
            holder_id: Set(assignment.holder_id),
            starts_at: Set(reporting_date),
            ends_at: Set(ends_at),
            ..Default::default()
        }
        .insert(db)
        .await?;
        kept.insert(key);
        changes.started += 1;
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::accountability_mapping::{HOLDER_PROGRAM_LEADER, HOLDER_TEAM_MEMBER};
    use crate::test_utils::{create_test_center, create_test_quarter, friday, setup_test_db};

    fn assign(accountability: &str, holder_kind: &'static str, holder_id: i64) -> Assignment {
        Assignment {
            accountability: accountability.to_string(),
            holder_kind,
            holder_id,
        }
    }

    #[tokio::test]
    async fn test_mapping_end_adds_grace_days() -> Result<()> {
        let db = setup_test_db().await?;
        let quarter = create_test_quarter(&db).await?;
        assert_eq!(mapping_end(&quarter, friday(2026, 10, 16), 7), friday(2026, 11, 20));
        Ok(())
    }

    #[tokio::test]
    async fn test_new_holder_replaces_previous_one() -> Result<()> {
        let db = setup_test_db().await?;
        let center = create_test_center(&db, "Springfield", true).await?;
        let first_week = friday(2026, 10, 9);
        let second_week = friday(2026, 10, 16);
        let ends_at = friday(2026, 11, 20);

        let changes = apply_assignments(
            &db,
            center.id,
            first_week,
            ends_at,
            &[assign("t1tl", HOLDER_TEAM_MEMBER, 1)],
            &[],
        )
        .await?;
        assert_eq!(changes.started, 1);

        let changes = apply_assignments(
            &db,
            center.id,
            second_week,
            ends_at,
            &[assign("t1tl", HOLDER_TEAM_MEMBER, 2)],
            &[],
        )
        .await?;
        assert_eq!(changes.started, 1);
        assert_eq!(changes.ended, 1);

        let before = active_mappings(&db, center.id, first_week).await?;
        assert_eq!(held_by(&before, HOLDER_TEAM_MEMBER, 1), vec!["t1tl".to_string()]);

        let after = active_mappings(&db, center.id, second_week).await?;
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].holder_id, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_reassigning_same_holder_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let center = create_test_center(&db, "Springfield", true).await?;
        let week = friday(2026, 10, 16);
        let ends_at = friday(2026, 11, 20);
        let assignments = [assign("programManager", HOLDER_PROGRAM_LEADER, 5)];

        apply_assignments(&db, center.id, week, ends_at, &assignments, &[]).await?;
        let changes = apply_assignments(&db, center.id, week, ends_at, &assignments, &[]).await?;

        assert_eq!(changes, AccountabilityChanges::default());
        assert_eq!(active_mappings(&db, center.id, week).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_released_holder_loses_unlisted_accountabilities() -> Result<()> {
        let db = setup_test_db().await?;
        let center = create_test_center(&db, "Springfield", true).await?;
        let ends_at = friday(2026, 11, 20);

        apply_assignments(
            &db,
            center.id,
            friday(2026, 10, 9),
            ends_at,
            &[
                assign("t1tl", HOLDER_TEAM_MEMBER, 1),
                assign("cap", HOLDER_TEAM_MEMBER, 1),
            ],
            &[],
        )
        .await?;

        let week = friday(2026, 10, 16);
        let changes = apply_assignments(
            &db,
            center.id,
            week,
            ends_at,
            &[assign("cap", HOLDER_TEAM_MEMBER, 1)],
            &[(HOLDER_TEAM_MEMBER, 1)],
        )
        .await?;
        assert_eq!(changes.ended, 1);

        let mappings = active_mappings(&db, center.id, week).await?;
        assert_eq!(held_by(&mappings, HOLDER_TEAM_MEMBER, 1), vec!["cap".to_string()]);
        Ok(())
    }
}
