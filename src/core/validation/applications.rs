use super::{
    EntityRef, GroupValidator, Tracked, ValidationContext, ValidationGroup, ValidationMessage,
    display_name, missing_required,
};
use crate::core::parser_domain::Domain;
use std::collections::BTreeSet;

const GROUP: ValidationGroup = ValidationGroup::Applications;

/// Lifecycle dates in the order an application moves through them.
const LIFECYCLE: [(&str, &str); 4] = [
    ("reg_date", "registration"),
    ("app_out_date", "application out"),
    ("app_in_date", "application in"),
    ("appr_date", "approval"),
];

/// Checks team applications.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationValidator;

impl GroupValidator for ApplicationValidator {
    type Item = Domain;

    fn group(&self) -> ValidationGroup {
        GROUP
    }

    fn validate(&self, app: &Domain, ctx: &ValidationContext) -> Vec<ValidationMessage> {
        let mut messages = missing_required(app, GROUP, "APP_MISSING_FIELD");
        let name = display_name(app);
        let id = app.id();

        if let Some(year) = app.int("team_year").filter(|year| !matches!(year, 1 | 2)) {
            messages.push(ValidationMessage::error(
                "APP_INVALID_TEAM_YEAR",
                EntityRef::field(GROUP, id, "team_year"),
                format!("{name} has team year {year}; expected 1 or 2"),
            ));
        }

        if app.date("reg_date").is_some_and(|reg_date| reg_date > ctx.reporting_date) {
            messages.push(ValidationMessage::error(
                "APP_REG_DATE_IN_FUTURE",
                EntityRef::field(GROUP, id, "reg_date"),
                format!("{name} has a registration date after {}", ctx.reporting_date),
            ));
        }

        messages.extend(lifecycle_order(app, &name));

        let withdrawn = app.date("wd_date").is_some();
        if withdrawn != app.int("withdraw_code_id").is_some() {
            messages.push(ValidationMessage::error(
                "APP_WITHDRAW_INCONSISTENT",
                EntityRef::field(GROUP, id, "withdraw_code_id"),
                format!("{name} needs both a withdraw date and a withdraw reason"),
            ));
        }

        if app.date("appr_date").is_some() && !withdrawn && ctx.after_classroom2() {
            for (field, label) in [("travel", "travel"), ("room", "room")] {
                if !app.flag(field) {
                    messages.push(ValidationMessage::warning(
                        "APP_TRAVEL_ROOM_MISSING",
                        EntityRef::field(GROUP, id, field),
                        format!("{name} has no {label} booked after classroom 2"),
                    ));
                }
            }
        }

        messages
    }
}

/// Each set date must not precede an earlier stage, and every earlier stage must be set.
fn lifecycle_order(app: &Domain, name: &str) -> Vec<ValidationMessage> {
    let mut messages = Vec::new();
    for window in LIFECYCLE.windows(2) {
        let [(earlier, earlier_label), (later, later_label)] = [window[0], window[1]];
        let Some(later_date) = app.date(later) else {
            continue;
        };
        match app.date(earlier) {
            None => messages.push(ValidationMessage::error(
                "APP_MISSING_EARLIER_DATE",
                EntityRef::field(GROUP, app.id(), earlier),
                format!("{name} has an {later_label} date but no {earlier_label} date"),
            )),
            Some(earlier_date) if later_date < earlier_date => {
                messages.push(ValidationMessage::error(
                    "APP_DATE_ORDER",
                    EntityRef::field(GROUP, app.id(), later),
                    format!("{name} has an {later_label} date before the {earlier_label} date"),
                ));
            }
            Some(_) => {}
        }
    }
    messages
}

/// Applications committed to a pending team member that this submission does not create.
pub(crate) fn unknown_committed_members(
    applications: &[Tracked<Domain>],
    pending_member_ids: &BTreeSet<i64>,
) -> Vec<ValidationMessage> {
    applications
        .iter()
        .filter_map(|app| {
            let member = app
                .value
                .int("committed_team_member_id")
                .filter(|id| *id < 0 && !pending_member_ids.contains(id))?;
            Some(ValidationMessage::error(
                "APP_COMMITTED_MEMBER_UNKNOWN",
                EntityRef::field(GROUP, app.value.id(), "committed_team_member_id"),
                format!(
                    "{} is committed to team member {member}, who is not part of this submission",
                    display_name(&app.value)
                ),
            ))
        })
        .collect()
}
