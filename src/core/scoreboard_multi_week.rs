//! Scoreboards of every reporting week of a quarter, ordered by week.

use crate::core::scoreboard::{Game, Scoreboard, ValueKind};
use crate::entities::{CenterStatsData, center_stats_data};
use crate::errors::Result;
use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, QueryOrder, prelude::*};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use tracing::debug;

/// Week-ordered scoreboards. Weeks are created on first access and never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreboardMultiWeek {
    weeks: BTreeMap<NaiveDate, Scoreboard>,
}

impl ScoreboardMultiWeek {
    /// An empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection with a blank scoreboard for every date.
    #[must_use]
    pub fn for_dates(dates: &[NaiveDate]) -> Self {
        let mut multi = Self::new();
        for date in dates {
            multi.ensure_week(*date);
        }
        multi
    }

    /// The scoreboard for `week`, created blank when missing.
    pub fn ensure_week(&mut self, week: NaiveDate) -> &mut Scoreboard {
        self.weeks.entry(week).or_insert_with(Scoreboard::blank)
    }

    /// The scoreboard for `week` if it exists.
    #[must_use]
    pub fn get(&self, week: NaiveDate) -> Option<&Scoreboard> {
        self.weeks.get(&week)
    }

    /// Weeks in ascending order with their scoreboards.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &Scoreboard)> + '_ {
        self.weeks.iter().map(|(week, scoreboard)| (*week, scoreboard))
    }

    /// Weeks in ascending order.
    pub fn weeks(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.weeks.keys().copied()
    }

    /// Number of weeks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    /// Whether no week exists yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    /// Copies persisted scoreboard rows into the matching weeks.
    pub fn apply_rows(&mut self, rows: &[center_stats_data::Model]) {
        for row in rows {
            let kind = match row.kind.as_str() {
                center_stats_data::KIND_PROMISE => ValueKind::Promise,
                center_stats_data::KIND_ACTUAL => ValueKind::Actual,
                center_stats_data::KIND_ORIGINAL => ValueKind::Original,
                other => {
                    debug!(row_id = row.id, kind = other, "Skipping scoreboard row of unknown kind");
                    continue;
                }
            };
            let scoreboard = self.ensure_week(row.week_date);
            for game in Game::ALL {
                scoreboard.set_value(game, kind, row_value(row, game));
            }
        }
    }

    /// Loads the rows persisted by `report_id` on top of blank weeks for `dates`.
    pub async fn load_for_report<C>(db: &C, report_id: i64, dates: &[NaiveDate]) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        let rows = CenterStatsData::find()
            .filter(center_stats_data::Column::StatsReportId.eq(report_id))
            .order_by_asc(center_stats_data::Column::WeekDate)
            .all(db)
            .await?;
        let mut multi = Self::for_dates(dates);
        multi.apply_rows(&rows);
        Ok(multi)
    }

    /// JSON object keyed by `YYYY-MM-DD`.
    #[must_use]
    pub fn to_json(&self) -> Json {
        let object: Map<String, Json> = self
            .weeks
            .iter()
            .map(|(week, scoreboard)| (week.format("%Y-%m-%d").to_string(), scoreboard.to_json()))
            .collect();
        Json::Object(object)
    }
}

/// Value of `game` in a persisted row.
#[must_use]
pub const fn row_value(row: &center_stats_data::Model, game: Game) -> Option<i64> {
    match game {
        Game::Cap => row.cap,
        Game::Cpc => row.cpc,
        Game::T1x => row.t1x,
        Game::T2x => row.t2x,
        Game::Gitw => row.gitw,
        Game::Lf => row.lf,
    }
}
