//! Actual values computed from the submitted roster rather than entered by hand.

use crate::core::parser_domain::Domain;
use crate::core::validation::program_leaders::{CLASSROOM_LEADER, PROGRAM_MANAGER};
use crate::core::validation::team_members::has_left;
use chrono::{DateTime, Utc};

/// The TDO promise: full attendance is always intended.
pub const PROMISE_TDO: i64 = 100;

/// Roll-ups stored with the reporting week's actual row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivedActuals {
    /// Percent of eligible team members who did a TDO
    pub tdo: i64,
    /// Program manager attends the weekend (0/1)
    pub program_manager_attending_weekend: Option<i64>,
    /// Classroom leader attends the weekend (0/1)
    pub classroom_leader_attending_weekend: Option<i64>,
}

/// Percent of eligible members with a TDO, rounded half up; 0 without eligible members.
///
/// Members who withdrew or transferred out are not eligible.
#[must_use]
pub fn tdo_percent<'a, I>(members: I) -> i64
where
    I: IntoIterator<Item = &'a Domain>,
{
    let (eligible, doing) = members
        .into_iter()
        .filter(|member| !has_left(member))
        .fold((0_i64, 0_i64), |(eligible, doing), member| {
            let did_tdo = member.int("tdo").is_some_and(|tdo| tdo > 0);
            (eligible + 1, doing + i64::from(did_tdo))
        });
    if eligible == 0 {
        return 0;
    }
    (200 * doing + eligible) / (2 * eligible)
}

/// Weekend attendance of the leader holding `role`.
///
/// Among several leaders for the same role, the one stashed most recently wins; leaders
/// that were not stashed this week rank below any stashed one.
#[must_use]
pub fn attending_weekend<'a, I>(leaders: I, role: &str) -> Option<i64>
where
    I: IntoIterator<Item = (&'a Domain, Option<DateTime<Utc>>)>,
{
    leaders
        .into_iter()
        .filter(|(leader, _)| leader.str("accountability") == Some(role))
        .max_by_key(|(_, stashed_at)| *stashed_at)
        .map(|(leader, _)| i64::from(leader.flag("attending_weekend")))
}

/// Computes every derived value for the reporting week.
#[must_use]
pub fn derive<'a, M, L>(members: M, leaders: L) -> DerivedActuals
where
    M: IntoIterator<Item = &'a Domain>,
    L: IntoIterator<Item = (&'a Domain, Option<DateTime<Utc>>)> + Clone,
{
    DerivedActuals {
        tdo: tdo_percent(members),
        program_manager_attending_weekend: attending_weekend(leaders.clone(), PROGRAM_MANAGER),
        classroom_leader_attending_weekend: attending_weekend(leaders, CLASSROOM_LEADER),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::domains::{PROGRAM_LEADER, TEAM_MEMBER};
    use crate::core::parser_domain::ParseMode;
    use chrono::Duration;
    use serde_json::{Value as Json, json};

    fn member(data: &Json) -> Domain {
        Domain::from_json(&TEAM_MEMBER, data, ParseMode::Lenient).unwrap()
    }

    fn leader(role: &str, attending: bool) -> Domain {
        Domain::from_json(
            &PROGRAM_LEADER,
            &json!({ "accountability": role, "attending_weekend": attending }),
            ParseMode::Lenient,
        )
        .unwrap()
    }

    #[test]
    fn test_tdo_excludes_members_who_left() {
        let members = [
            member(&json!({ "tdo": 1 })),
            member(&json!({ "tdo": 2 })),
            member(&json!({ "tdo": 0 })),
            member(&json!({ "tdo": 1, "withdraw_code_id": 4 })),
            member(&json!({ "xfer_out": true })),
        ];
        // 2 of 3 eligible
        assert_eq!(tdo_percent(&members), 67);
    }

    #[test]
    fn test_tdo_without_eligible_members_is_zero() {
        assert_eq!(tdo_percent(std::iter::empty()), 0);
        assert_eq!(tdo_percent(&[member(&json!({ "xfer_out": true, "tdo": 1 }))]), 0);
    }

    #[test]
    fn test_tdo_is_not_affected_by_bool_shim() {
        assert_eq!(tdo_percent(&[member(&json!({ "tdo": true }))]), 100);
        assert_eq!(tdo_percent(&[member(&json!({ "tdo": false }))]), 0);
    }

    #[test]
    fn test_most_recently_stashed_leader_wins() {
        let now = Utc::now();
        let earlier = leader(PROGRAM_MANAGER, true);
        let later = leader(PROGRAM_MANAGER, false);
        let unstashed = leader(PROGRAM_MANAGER, true);
        let classroom = leader(CLASSROOM_LEADER, true);

        let leaders = vec![
            (&later, Some(now)),
            (&earlier, Some(now - Duration::minutes(5))),
            (&unstashed, None),
            (&classroom, None),
        ];
        let derived = derive(&[member(&json!({ "tdo": 1 }))], leaders);

        assert_eq!(derived.tdo, 100);
        assert_eq!(derived.program_manager_attending_weekend, Some(0));
        assert_eq!(derived.classroom_leader_attending_weekend, Some(1));
    }

    #[test]
    fn test_missing_role_has_no_flag() {
        let only_classroom = leader(CLASSROOM_LEADER, false);
        assert_eq!(attending_weekend([(&only_classroom, None)], PROGRAM_MANAGER), None);
    }
}
