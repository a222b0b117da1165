use super::{
    EntityRef, GroupValidator, Tracked, ValidationContext, ValidationGroup, ValidationMessage,
    display_name, missing_required,
};
use crate::core::parser_domain::Domain;
use std::collections::BTreeMap;

const GROUP: ValidationGroup = ValidationGroup::TeamMembers;

/// Whether a team member has left the team (withdrawn or transferred out).
#[must_use]
pub fn has_left(member: &Domain) -> bool {
    member.int("withdraw_code_id").is_some() || member.flag("xfer_out")
}

/// Checks team members.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamMemberValidator;

impl GroupValidator for TeamMemberValidator {
    type Item = Domain;

    fn group(&self) -> ValidationGroup {
        GROUP
    }

    fn validate(&self, member: &Domain, ctx: &ValidationContext) -> Vec<ValidationMessage> {
        let mut messages = missing_required(member, GROUP, "TEAM_MISSING_FIELD");
        let name = display_name(member);
        let id = member.id();

        if let Some(year) = member.int("team_year").filter(|year| !matches!(year, 1 | 2)) {
            messages.push(ValidationMessage::error(
                "TEAM_INVALID_TEAM_YEAR",
                EntityRef::field(GROUP, id, "team_year"),
                format!("{name} has team year {year}; expected 1 or 2"),
            ));
        }

        if member.int("withdraw_code_id").is_some() && member.flag("xfer_out") {
            messages.push(ValidationMessage::error(
                "TEAM_WITHDRAW_AND_TRANSFER",
                EntityRef::field(GROUP, id, "xfer_out"),
                format!("{name} cannot be both withdrawn and transferred out"),
            ));
        }

        if !has_left(member) && member.bool("gitw").is_none() {
            messages.push(ValidationMessage::error(
                "TEAM_GITW_MISSING",
                EntityRef::field(GROUP, id, "gitw"),
                format!("{name} has no GITW value"),
            ));
        }

        if member.int("tdo").is_some_and(|tdo| tdo < 0) {
            messages.push(ValidationMessage::error(
                "TEAM_TDO_NEGATIVE",
                EntityRef::field(GROUP, id, "tdo"),
                format!("{name} has a negative TDO count"),
            ));
        }

        if !has_left(member) && ctx.after_classroom2() {
            for field in ["travel", "room"] {
                if !member.flag(field) {
                    messages.push(ValidationMessage::warning(
                        "TEAM_TRAVEL_ROOM_MISSING",
                        EntityRef::field(GROUP, id, field),
                        format!("{name} has no {field} booked after classroom 2"),
                    ));
                }
            }
        }

        messages
    }
}

/// One error per claimant when several team members hold the same accountability.
pub(crate) fn duplicate_accountabilities(members: &[Tracked<Domain>]) -> Vec<ValidationMessage> {
    let mut claims: BTreeMap<&str, Vec<&Domain>> = BTreeMap::new();
    for member in members {
        for name in member.value.list("accountabilities") {
            claims.entry(name.as_str()).or_default().push(&member.value);
        }
    }

    claims
        .into_iter()
        .filter(|(_, holders)| holders.len() > 1)
        .flat_map(|(accountability, holders)| {
            let names = holders
                .iter()
                .map(|holder| display_name(holder))
                .collect::<Vec<_>>()
                .join(", ");
            holders.into_iter().map(move |holder| {
                ValidationMessage::error(
                    "TEAM_DUPLICATE_ACCOUNTABILITY",
                    EntityRef::field(GROUP, holder.id(), "accountabilities"),
                    format!("{accountability} is claimed by more than one team member: {names}"),
                )
            })
        })
        .collect()
}
