//! Scoreboard edit windows for a quarter.
//!
//! Every reporting week of a quarter carries a [`WeekLock`] saying whether its promises
//! and actuals may still be edited. Defaults depend on where the week sits relative to
//! the "as of" reporting date; explicit overrides are stored as the `scoreboardLock`
//! setting scoped to (center, quarter).

use crate::entities::{Setting, setting};
use crate::errors::{Error, Result};
use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, Set, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{Value as Json, json};
use std::collections::BTreeMap;
use tracing::debug;

/// Setting name under which overrides are persisted.
pub const SCOREBOARD_LOCK_SETTING: &str = "scoreboardLock";

/// Edit permissions for one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekLock {
    /// Promises may be changed
    pub edit_promise: bool,
    /// Actuals may be changed
    pub edit_actual: bool,
}

impl WeekLock {
    /// Default permissions for `week` when reporting as of `as_of`.
    ///
    /// The current and future weeks accept promises; the current and past weeks accept
    /// actuals.
    #[must_use]
    pub fn default_for(week: NaiveDate, as_of: NaiveDate) -> Self {
        Self {
            edit_promise: week >= as_of,
            edit_actual: week <= as_of,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeekLockEntry {
    week: NaiveDate,
    #[serde(flatten)]
    lock: WeekLock,
}

/// Edit permissions for every reporting week of a quarter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardLockQuarter {
    /// Center the locks apply to
    pub center_id: i64,
    /// Quarter the locks apply to
    pub quarter_id: i64,
    as_of: NaiveDate,
    weeks: BTreeMap<NaiveDate, WeekLock>,
}

impl ScoreboardLockQuarter {
    /// Builds default locks for `reporting_dates` as of `as_of`.
    #[must_use]
    pub fn new(center_id: i64, quarter_id: i64, reporting_dates: &[NaiveDate], as_of: NaiveDate) -> Self {
        let weeks = reporting_dates
            .iter()
            .map(|week| (*week, WeekLock::default_for(*week, as_of)))
            .collect();
        Self {
            center_id,
            quarter_id,
            as_of,
            weeks,
        }
    }

    /// Permissions for `week`, falling back to the default for unknown weeks.
    #[must_use]
    pub fn get(&self, week: NaiveDate) -> WeekLock {
        self.weeks
            .get(&week)
            .copied()
            .unwrap_or_else(|| WeekLock::default_for(week, self.as_of))
    }

    /// Overrides the permissions for `week`.
    pub fn set(&mut self, week: NaiveDate, lock: WeekLock) {
        self.weeks.insert(week, lock);
    }

    /// Weeks and their permissions in date order.
    pub fn weeks(&self) -> impl Iterator<Item = (NaiveDate, WeekLock)> + '_ {
        self.weeks.iter().map(|(week, lock)| (*week, *lock))
    }

    /// Serialized form stored in the settings table.
    #[must_use]
    pub fn to_json(&self) -> Json {
        let entries: Vec<WeekLockEntry> = self
            .weeks
            .iter()
            .map(|(week, lock)| WeekLockEntry {
                week: *week,
                lock: *lock,
            })
            .collect();
        json!({ "reportingDates": entries })
    }

    /// Applies stored overrides on top of the current permissions.
    pub fn apply_json(&mut self, stored: &Json) -> Result<()> {
        let Some(entries) = stored.get("reportingDates") else {
            return Err(Error::Config {
                message: format!("{SCOREBOARD_LOCK_SETTING} setting has no reportingDates"),
            });
        };
        let entries: Vec<WeekLockEntry> = serde_json::from_value(entries.clone())?;
        for entry in entries {
            self.weeks.insert(entry.week, entry.lock);
        }
        Ok(())
    }

    /// Loads the locks for a quarter: defaults first, then any stored overrides.
    pub async fn load<C>(
        db: &C,
        center_id: i64,
        quarter_id: i64,
        reporting_dates: &[NaiveDate],
        as_of: NaiveDate,
    ) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        let mut locks = Self::new(center_id, quarter_id, reporting_dates, as_of);
        if let Some(stored) = find_setting(db, center_id, quarter_id).await? {
            debug!(center_id, quarter_id, "Applying stored scoreboard locks");
            let value: Json = serde_json::from_str(&stored.value)?;
            locks.apply_json(&value)?;
        }
        Ok(locks)
    }

    /// Stores the current permissions as the quarter's overrides.
    pub async fn save<C>(&self, db: &C) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let value = self.to_json().to_string();
        let now = Utc::now();

        if let Some(existing) = find_setting(db, self.center_id, self.quarter_id).await? {
            let mut active_model: setting::ActiveModel = existing.into();
            active_model.value = Set(value);
            active_model.updated_at = Set(now);
            active_model.update(db).await?;
        } else {
            let new_setting = setting::ActiveModel {
                center_id: Set(Some(self.center_id)),
                quarter_id: Set(Some(self.quarter_id)),
                name: Set(SCOREBOARD_LOCK_SETTING.to_string()),
                value: Set(value),
                updated_at: Set(now),
                ..Default::default()
            };
            new_setting.insert(db).await?;
        }
        Ok(())
    }
}

async fn find_setting<C>(db: &C, center_id: i64, quarter_id: i64) -> Result<Option<setting::Model>>
where
    C: ConnectionTrait,
{
    Setting::find()
        .filter(setting::Column::Name.eq(SCOREBOARD_LOCK_SETTING))
        .filter(setting::Column::CenterId.eq(center_id))
        .filter(setting::Column::QuarterId.eq(quarter_id))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn fridays() -> Vec<NaiveDate> {
        [2, 9, 16, 23]
            .into_iter()
            .map(|day| NaiveDate::from_ymd_opt(2026, 10, day).unwrap())
            .collect()
    }

    #[test]
    fn test_defaults_follow_as_of_date() {
        let weeks = fridays();
        let locks = ScoreboardLockQuarter::new(1, 1, &weeks, weeks[1]);

        assert_eq!(
            locks.get(weeks[0]),
            WeekLock {
                edit_promise: false,
                edit_actual: true
            }
        );
        assert_eq!(
            locks.get(weeks[1]),
            WeekLock {
                edit_promise: true,
                edit_actual: true
            }
        );
        assert_eq!(
            locks.get(weeks[3]),
            WeekLock {
                edit_promise: true,
                edit_actual: false
            }
        );
    }

    #[test]
    fn test_json_round_trip_uses_camel_case() {
        let weeks = fridays();
        let locks = ScoreboardLockQuarter::new(1, 1, &weeks, weeks[2]);
        let json = locks.to_json();
        assert_eq!(json["reportingDates"][0]["week"], Json::from("2026-10-02"));
        assert_eq!(json["reportingDates"][0]["editPromise"], Json::from(false));

        let mut other = ScoreboardLockQuarter::new(1, 1, &weeks, weeks[0]);
        other.apply_json(&json).unwrap();
        assert_eq!(other.get(weeks[0]), locks.get(weeks[0]));
        assert_eq!(other.get(weeks[3]), locks.get(weeks[3]));
    }

    #[tokio::test]
    async fn test_saved_overrides_are_loaded() -> Result<()> {
        let db = setup_test_db().await?;
        let weeks = fridays();

        let mut locks = ScoreboardLockQuarter::new(4, 9, &weeks, weeks[3]);
        locks.set(
            weeks[0],
            WeekLock {
                edit_promise: true,
                edit_actual: true,
            },
        );
        locks.save(&db).await?;
        // Saving twice updates the same row
        locks.save(&db).await?;
        assert_eq!(Setting::find().count(&db).await?, 1);

        let loaded = ScoreboardLockQuarter::load(&db, 4, 9, &weeks, weeks[3]).await?;
        assert!(loaded.get(weeks[0]).edit_promise);
        assert!(!loaded.get(weeks[1]).edit_promise);

        let other_center = ScoreboardLockQuarter::load(&db, 5, 9, &weeks, weeks[3]).await?;
        assert!(!other_center.get(weeks[0]).edit_promise);
        Ok(())
    }
}
