use super::{
    EntityRef, GroupValidator, ValidationContext, ValidationGroup, ValidationMessage, display_name,
    missing_required,
};
use crate::core::parser_domain::Domain;

const GROUP: ValidationGroup = ValidationGroup::ProgramLeaders;

/// Program manager accountability.
pub const PROGRAM_MANAGER: &str = "programManager";
/// Classroom leader accountability.
pub const CLASSROOM_LEADER: &str = "classroomLeader";

/// Checks program leaders.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramLeaderValidator;

impl GroupValidator for ProgramLeaderValidator {
    type Item = Domain;

    fn group(&self) -> ValidationGroup {
        GROUP
    }

    fn validate(&self, leader: &Domain, _ctx: &ValidationContext) -> Vec<ValidationMessage> {
        let mut messages = missing_required(leader, GROUP, "PL_MISSING_FIELD");
        let name = display_name(leader);

        if let Some(accountability) = leader
            .str("accountability")
            .filter(|value| ![PROGRAM_MANAGER, CLASSROOM_LEADER].contains(value))
        {
            messages.push(ValidationMessage::error(
                "PL_INVALID_ACCOUNTABILITY",
                EntityRef::field(GROUP, leader.id(), "accountability"),
                format!("{name} has unknown accountability '{accountability}'"),
            ));
        }

        if leader.str("email").is_none() {
            messages.push(ValidationMessage::warning(
                "PL_EMAIL_MISSING",
                EntityRef::field(GROUP, leader.id(), "email"),
                format!("{name} has no email address"),
            ));
        }

        messages
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::domains::PROGRAM_LEADER;
    use crate::core::parser_domain::ParseMode;
    use crate::core::validation::test_support::context;
    use serde_json::json;

    fn ids(messages: &[ValidationMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_complete_leader_passes() {
        let leader = Domain::from_json(
            &PROGRAM_LEADER,
            &json!({
                "accountability": "programManager",
                "first_name": "Alan",
                "last_name": "Turing",
                "email": "alan@example.org",
                "attending_weekend": false,
            }),
            ParseMode::Lenient,
        )
        .unwrap();
        assert!(ProgramLeaderValidator.validate(&leader, &context()).is_empty());
    }

    #[test]
    fn test_attending_weekend_required_and_email_warning() {
        let leader = Domain::from_json(
            &PROGRAM_LEADER,
            &json!({
                "accountability": "classroomLeader",
                "first_name": "Alan",
                "last_name": "Turing",
            }),
            ParseMode::Lenient,
        )
        .unwrap();
        let messages = ProgramLeaderValidator.validate(&leader, &context());
        assert_eq!(ids(&messages), vec!["PL_MISSING_FIELD", "PL_EMAIL_MISSING"]);
        assert!(messages[0].is_error());
        assert!(!messages[1].is_error());
    }

    #[test]
    fn test_unknown_accountability() {
        let leader = Domain::from_json(
            &PROGRAM_LEADER,
            &json!({
                "accountability": "treasurer",
                "first_name": "Alan",
                "last_name": "Turing",
                "email": "alan@example.org",
                "attending_weekend": true,
            }),
            ParseMode::Lenient,
        )
        .unwrap();
        assert_eq!(
            ids(&ProgramLeaderValidator.validate(&leader, &context())),
            vec!["PL_INVALID_ACCOUNTABILITY"]
        );
    }
}
