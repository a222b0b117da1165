//! Quarter entity - A reporting quarter and its milestone dates.
//!
//! Every milestone is nullable so that a quarter can exist before it has been scheduled.
//! Submissions are refused until all milestones are configured.

use chrono::{Datelike, Duration, Weekday};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Quarter database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quarters")]
pub struct Model {
    /// Unique identifier for the quarter
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Distinction name (e.g., "Relatedness")
    pub t1_distinction: String,
    /// Calendar year the quarter starts in
    pub year: i32,
    /// Friday of the weekend that opens the quarter
    pub start_weekend_date: Option<Date>,
    /// First classroom date
    pub classroom1_date: Option<Date>,
    /// Second classroom date
    pub classroom2_date: Option<Date>,
    /// Third classroom date
    pub classroom3_date: Option<Date>,
    /// Friday of the weekend that closes the quarter
    pub end_weekend_date: Option<Date>,
}

impl Model {
    /// True when every milestone date has been set.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.start_weekend_date.is_some()
            && self.classroom1_date.is_some()
            && self.classroom2_date.is_some()
            && self.classroom3_date.is_some()
            && self.end_weekend_date.is_some()
    }

    /// Reporting dates of the quarter, in order.
    ///
    /// The first report is due one week after the opening weekend and the last one on the
    /// closing weekend. Returns an empty list for unconfigured quarters.
    #[must_use]
    pub fn reporting_dates(&self, weekday: Weekday) -> Vec<Date> {
        let (Some(start), Some(end)) = (self.start_weekend_date, self.end_weekend_date) else {
            return Vec::new();
        };
        let mut week = start + Duration::days(7);
        while week.weekday() != weekday {
            week += Duration::days(1);
        }
        let mut dates = Vec::new();
        while week <= end {
            dates.push(week);
            week += Duration::days(7);
        }
        dates
    }

    /// Whether `date` falls on one of the classroom weeks.
    #[must_use]
    pub fn is_classroom_week(&self, date: Date) -> bool {
        [self.classroom1_date, self.classroom2_date, self.classroom3_date]
            .into_iter()
            .flatten()
            .any(|classroom| classroom == date)
    }
}

/// `Quarter` has no navigable relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
