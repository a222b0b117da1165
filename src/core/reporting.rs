//! Reporting calendar and report lookups.
//!
//! Resolves which quarter a reporting date belongs to, which report is official for a
//! center-week, and creates the draft report that collects a week's stash activity.

use crate::entities::{
    Center, GlobalReport, GlobalReportLink, Quarter, StatsReport, center, global_report,
    global_report_link, quarter, stats_report,
};
use crate::errors::{Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use sea_orm::{ConnectionTrait, QueryOrder, QuerySelect, Set, prelude::*};
use tracing::info;

/// Fails with [`Error::BadRequest`] unless `date` falls on `weekday`.
pub fn require_reporting_weekday(date: NaiveDate, weekday: Weekday) -> Result<()> {
    if date.weekday() == weekday {
        Ok(())
    } else {
        Err(Error::bad_request(format!(
            "Reporting date {date} is a {}, expected a {weekday}",
            date.weekday()
        )))
    }
}

/// Loads a center and requires it to be active.
pub async fn get_active_center<C>(db: &C, center_id: i64) -> Result<center::Model>
where
    C: ConnectionTrait,
{
    let center = Center::find_by_id(center_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "center",
            id: center_id,
        })?;
    if !center.is_active {
        return Err(Error::bad_request(format!(
            "Center {} is not active",
            center.name
        )));
    }
    Ok(center)
}

/// The quarter whose reporting weeks include `date`.
pub async fn quarter_for_date<C>(db: &C, date: NaiveDate) -> Result<Option<quarter::Model>>
where
    C: ConnectionTrait,
{
    Quarter::find()
        .filter(quarter::Column::StartWeekendDate.lt(date))
        .filter(quarter::Column::EndWeekendDate.gte(date))
        .order_by_desc(quarter::Column::StartWeekendDate)
        .one(db)
        .await
        .map_err(Into::into)
}

/// The quarter for `date`, required to have every milestone configured.
pub async fn require_configured_quarter<C>(db: &C, date: NaiveDate) -> Result<quarter::Model>
where
    C: ConnectionTrait,
{
    let quarter = quarter_for_date(db, date)
        .await?
        .ok_or_else(|| Error::bad_request(format!("No quarter covers reporting date {date}")))?;
    if !quarter.is_configured() {
        return Err(Error::bad_request(format!(
            "Quarter {} {} is missing milestone dates",
            quarter.t1_distinction, quarter.year
        )));
    }
    Ok(quarter)
}

/// Up to `count` quarters starting after `quarter`, in order.
pub async fn following_quarters<C>(
    db: &C,
    quarter: &quarter::Model,
    count: u64,
) -> Result<Vec<quarter::Model>>
where
    C: ConnectionTrait,
{
    let Some(start) = quarter.start_weekend_date else {
        return Ok(Vec::new());
    };
    Quarter::find()
        .filter(quarter::Column::StartWeekendDate.gt(start))
        .order_by_asc(quarter::Column::StartWeekendDate)
        .limit(count)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The official report of a center for `reporting_date`, if one was submitted.
pub async fn official_report<C>(
    db: &C,
    center_id: i64,
    reporting_date: NaiveDate,
) -> Result<Option<stats_report::Model>>
where
    C: ConnectionTrait,
{
    let Some(global) = GlobalReport::find()
        .filter(global_report::Column::ReportingDate.eq(reporting_date))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    let Some(link) = GlobalReportLink::find()
        .filter(global_report_link::Column::GlobalReportId.eq(global.id))
        .filter(global_report_link::Column::CenterId.eq(center_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    StatsReport::find_by_id(link.stats_report_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// The most recent official report of a center strictly before `reporting_date`.
pub async fn last_official_report<C>(
    db: &C,
    center_id: i64,
    reporting_date: NaiveDate,
) -> Result<Option<stats_report::Model>>
where
    C: ConnectionTrait,
{
    let links = GlobalReportLink::find()
        .filter(global_report_link::Column::CenterId.eq(center_id))
        .find_also_related(GlobalReport)
        .all(db)
        .await?;

    let latest = links
        .into_iter()
        .filter_map(|(link, global)| global.map(|global| (global.reporting_date, link)))
        .filter(|(date, _)| *date < reporting_date)
        .max_by_key(|(date, _)| *date);

    match latest {
        Some((_, link)) => StatsReport::find_by_id(link.stats_report_id)
            .one(db)
            .await
            .map_err(Into::into),
        None => Ok(None),
    }
}

/// The unlocked draft report for a center-week, if stash activity created one.
pub async fn find_draft_report<C>(
    db: &C,
    center_id: i64,
    reporting_date: NaiveDate,
) -> Result<Option<stats_report::Model>>
where
    C: ConnectionTrait,
{
    StatsReport::find()
        .filter(stats_report::Column::CenterId.eq(center_id))
        .filter(stats_report::Column::ReportingDate.eq(reporting_date))
        .filter(stats_report::Column::Locked.eq(false))
        .order_by_desc(stats_report::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// The unlocked draft report for a center-week, created when missing.
pub async fn find_or_create_draft_report<C>(
    db: &C,
    center_id: i64,
    reporting_date: NaiveDate,
    quarter_id: i64,
    now: DateTime<Utc>,
) -> Result<stats_report::Model>
where
    C: ConnectionTrait,
{
    if let Some(report) = find_draft_report(db, center_id, reporting_date).await? {
        return Ok(report);
    }

    info!(center_id, %reporting_date, "Creating draft report");
    let report = stats_report::ActiveModel {
        center_id: Set(center_id),
        reporting_date: Set(reporting_date),
        quarter_id: Set(quarter_id),
        validated: Set(false),
        locked: Set(false),
        submitted_at: Set(None),
        submitted_by: Set(None),
        comment: Set(None),
        validation_messages: Set(None),
        created_at: Set(now),
        ..Default::default()
    };
    report.insert(db).await.map_err(Into::into)
}

/// Links `report` as the official one for its center-week, replacing any earlier link.
pub async fn attach_to_global_report<C>(db: &C, report: &stats_report::Model) -> Result<i64>
where
    C: ConnectionTrait,
{
    let global = match GlobalReport::find()
        .filter(global_report::Column::ReportingDate.eq(report.reporting_date))
        .one(db)
        .await?
    {
        Some(global) => global,
        None => {
            global_report::ActiveModel {
                reporting_date: Set(report.reporting_date),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    GlobalReportLink::delete_many()
        .filter(global_report_link::Column::GlobalReportId.eq(global.id))
        .filter(global_report_link::Column::CenterId.eq(report.center_id))
        .exec(db)
        .await?;

    global_report_link::ActiveModel {
        global_report_id: Set(global.id),
        stats_report_id: Set(report.id),
        center_id: Set(report.center_id),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(global.id)
}
