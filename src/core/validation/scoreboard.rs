use super::{
    EntityRef, GroupValidator, ScoreboardWeek, ValidationContext, ValidationGroup,
    ValidationMessage,
};
use crate::core::scoreboard::{Game, META_PROMISE_CHANGE_IGNORED, ValueKind};
use crate::core::stash::week_storage_id;
use serde_json::Value as Json;

const GROUP: ValidationGroup = ValidationGroup::Scoreboard;

/// Checks scoreboard weeks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreboardValidator;

fn missing(week: &ScoreboardWeek, kind: ValueKind, code: &str) -> Vec<ValidationMessage> {
    Game::ALL
        .into_iter()
        .filter(|game| week.scoreboard.value(*game, kind).is_none())
        .map(|game| {
            ValidationMessage::error(
                code,
                EntityRef::field(
                    GROUP,
                    Some(week_storage_id(week.week)),
                    &format!("{}.{}", kind.key(), game.key()),
                ),
                format!("{} {} for {} is missing", game.key(), kind.key(), week.week),
            )
        })
        .collect()
}

impl GroupValidator for ScoreboardValidator {
    type Item = ScoreboardWeek;

    fn group(&self) -> ValidationGroup {
        GROUP
    }

    fn validate(&self, week: &ScoreboardWeek, ctx: &ValidationContext) -> Vec<ValidationMessage> {
        let mut messages = Vec::new();
        let id = Some(week_storage_id(week.week));

        if week.week >= ctx.reporting_date {
            messages.extend(missing(week, ValueKind::Promise, "SCOREBOARD_PROMISE_MISSING"));
        }
        if week.week == ctx.reporting_date {
            messages.extend(missing(week, ValueKind::Actual, "SCOREBOARD_ACTUAL_MISSING"));
        }

        for kind in [ValueKind::Promise, ValueKind::Actual] {
            if let Some(value) = week
                .scoreboard
                .value(Game::Gitw, kind)
                .filter(|value| !(0..=100).contains(value))
            {
                messages.push(ValidationMessage::error(
                    "SCOREBOARD_GITW_OUT_OF_RANGE",
                    EntityRef::field(GROUP, id, &format!("{}.gitw", kind.key())),
                    format!("gitw {} for {} is {value}; expected 0 to 100", kind.key(), week.week),
                ));
            }
        }

        if week.scoreboard.meta(META_PROMISE_CHANGE_IGNORED) == Some(&Json::Bool(true)) {
            messages.push(ValidationMessage::warning(
                "SCOREBOARD_PROMISE_LOCKED",
                EntityRef::entity(GROUP, id),
                format!("promises for {} are locked; the change was ignored", week.week),
            ));
        }

        messages
    }

    fn is_due(&self, week: &ScoreboardWeek, ctx: &ValidationContext) -> bool {
        week.week == ctx.reporting_date
    }

    fn stale_message(&self, week: &ScoreboardWeek, _ctx: &ValidationContext) -> Option<ValidationMessage> {
        Some(ValidationMessage::error(
            "SCOREBOARD_NOT_UPDATED",
            EntityRef::entity(GROUP, Some(week_storage_id(week.week))),
            format!("scoreboard for {} was not updated this week", week.week),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoreboard::Scoreboard;
    use crate::core::validation::test_support::context;
    use crate::core::validation::{SubmissionView, Tracked, validate_submission};
    use crate::test_utils::friday;

    fn full_week(week: chrono::NaiveDate) -> ScoreboardWeek {
        let mut scoreboard = Scoreboard::blank();
        for game in Game::ALL {
            scoreboard.set_value(game, ValueKind::Promise, Some(10));
            scoreboard.set_value(game, ValueKind::Actual, Some(8));
        }
        ScoreboardWeek { week, scoreboard }
    }

    fn ids(messages: &[ValidationMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_reporting_week_requires_all_values() {
        let ctx = context();
        let mut week = full_week(ctx.reporting_date);
        week.scoreboard.set_value(Game::Lf, ValueKind::Actual, None);

        let messages = ScoreboardValidator.validate(&week, &ctx);
        assert_eq!(ids(&messages), vec!["SCOREBOARD_ACTUAL_MISSING"]);
        assert_eq!(messages[0].reference.field.as_deref(), Some("actual.lf"));
        assert_eq!(messages[0].reference.id, Some(20_261_016));
    }

    #[test]
    fn test_future_weeks_require_promises_only() {
        let mut week = ScoreboardWeek {
            week: friday(2026, 10, 23),
            scoreboard: Scoreboard::blank(),
        };
        let messages = ScoreboardValidator.validate(&week, &context());
        assert_eq!(messages.len(), 6);
        assert!(messages.iter().all(|m| m.id == "SCOREBOARD_PROMISE_MISSING"));

        week = full_week(friday(2026, 10, 23));
        week.scoreboard.set_value(Game::Gitw, ValueKind::Promise, Some(120));
        assert_eq!(
            ids(&ScoreboardValidator.validate(&week, &context())),
            vec!["SCOREBOARD_GITW_OUT_OF_RANGE"]
        );
    }

    #[test]
    fn test_past_weeks_need_nothing() {
        let week = ScoreboardWeek {
            week: friday(2026, 10, 2),
            scoreboard: Scoreboard::blank(),
        };
        assert!(ScoreboardValidator.validate(&week, &context()).is_empty());
    }

    #[test]
    fn test_ignored_promise_change_warns() {
        let mut week = full_week(friday(2026, 10, 2));
        week.scoreboard
            .set_meta(META_PROMISE_CHANGE_IGNORED, Json::Bool(true));
        let messages = ScoreboardValidator.validate(&week, &context());
        assert_eq!(ids(&messages), vec!["SCOREBOARD_PROMISE_LOCKED"]);
        assert!(!messages[0].is_error());
    }

    #[test]
    fn test_unchanged_reporting_week_is_stale() {
        let ctx = context();
        let view = SubmissionView {
            scoreboard: vec![
                Tracked {
                    value: full_week(friday(2026, 10, 9)),
                    changed: false,
                },
                Tracked {
                    value: full_week(ctx.reporting_date),
                    changed: false,
                },
            ],
            ..SubmissionView::default()
        };

        let result = validate_submission(&view, &ctx);
        assert!(!result.valid);
        assert_eq!(
            ids(result.group(ValidationGroup::Scoreboard)),
            vec!["SCOREBOARD_NOT_UPDATED"]
        );
    }

    #[test]
    fn test_changed_reporting_week_is_not_stale() {
        let ctx = context();
        let view = SubmissionView {
            scoreboard: vec![Tracked {
                value: full_week(ctx.reporting_date),
                changed: true,
            }],
            ..SubmissionView::default()
        };
        assert!(validate_submission(&view, &ctx).valid);
    }
}
