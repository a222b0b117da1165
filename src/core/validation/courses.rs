use super::{
    EntityRef, GroupValidator, ValidationContext, ValidationGroup, ValidationMessage,
    missing_required,
};
use crate::core::parser_domain::{Domain, FieldKind};

const GROUP: ValidationGroup = ValidationGroup::Courses;

/// Recognized course types.
pub const COURSE_TYPES: [&str; 2] = ["CAP", "CPC"];

/// Checks courses.
#[derive(Debug, Clone, Copy, Default)]
pub struct CourseValidator;

fn label(course: &Domain) -> String {
    match (course.str("course_type"), course.date("start_date")) {
        (Some(kind), Some(start)) => format!("{kind} course on {start}"),
        _ => format!("course #{}", course.id().unwrap_or_default()),
    }
}

impl GroupValidator for CourseValidator {
    type Item = Domain;

    fn group(&self) -> ValidationGroup {
        GROUP
    }

    fn validate(&self, course: &Domain, ctx: &ValidationContext) -> Vec<ValidationMessage> {
        let mut messages = missing_required(course, GROUP, "COURSE_MISSING_FIELD");
        let name = label(course);
        let id = course.id();

        if let Some(kind) = course
            .str("course_type")
            .filter(|kind| !COURSE_TYPES.contains(kind))
        {
            messages.push(ValidationMessage::error(
                "COURSE_INVALID_TYPE",
                EntityRef::field(GROUP, id, "course_type"),
                format!("{name} has unknown type '{kind}'"),
            ));
        }

        for spec in course
            .schema()
            .fields
            .iter()
            .filter(|spec| spec.kind == FieldKind::Int && spec.name != "id")
        {
            if course.int(spec.name).is_some_and(|count| count < 0) {
                messages.push(ValidationMessage::error(
                    "COURSE_NEGATIVE_COUNT",
                    EntityRef::field(GROUP, id, spec.name),
                    format!("{name} has a negative {}", spec.name.replace('_', " ")),
                ));
            }
        }

        for (starts, ter) in [
            ("current_standard_starts", "current_ter"),
            ("quarter_start_standard_starts", "quarter_start_ter"),
        ] {
            if course.int(starts).unwrap_or(0) > course.int(ter).unwrap_or(0) {
                messages.push(ValidationMessage::error(
                    "COURSE_SS_EXCEEDS_TER",
                    EntityRef::field(GROUP, id, starts),
                    format!("{name} has more standard starts than total registrations"),
                ));
            }
        }

        let started = course
            .date("start_date")
            .is_some_and(|start| start <= ctx.reporting_date);
        if started {
            match course.int("completed_standard_starts") {
                None => messages.push(ValidationMessage::error(
                    "COURSE_COMPLETED_SS_MISSING",
                    EntityRef::field(GROUP, id, "completed_standard_starts"),
                    format!("{name} has run but has no completed standard starts"),
                )),
                Some(completed) if completed > course.int("current_standard_starts").unwrap_or(0) => {
                    messages.push(ValidationMessage::error(
                        "COURSE_COMPLETED_SS_EXCEEDS",
                        EntityRef::field(GROUP, id, "completed_standard_starts"),
                        format!("{name} has more completed than current standard starts"),
                    ));
                }
                Some(_) => {}
            }
        }

        if course
            .int("guests_attended")
            .zip(course.int("guests_confirmed"))
            .is_some_and(|(attended, confirmed)| attended > confirmed)
        {
            messages.push(ValidationMessage::warning(
                "COURSE_GUESTS_ATTENDED_EXCEEDS",
                EntityRef::field(GROUP, id, "guests_attended"),
                format!("{name} has more guests attended than confirmed"),
            ));
        }

        messages
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::domains::COURSE;
    use crate::core::parser_domain::ParseMode;
    use crate::core::validation::test_support::context;
    use serde_json::{Value as Json, json};

    fn course(extra: &Json) -> Domain {
        let mut input = json!({
            "id": 7,
            "course_type": "CAP",
            "location": "Main hall",
            "start_date": "2026-10-31",
            "current_ter": 20,
            "current_standard_starts": 18,
            "quarter_start_ter": 5,
            "quarter_start_standard_starts": 5,
        });
        if let (Some(base), Some(extra)) = (input.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        Domain::from_json(&COURSE, &input, ParseMode::Lenient).unwrap()
    }

    fn ids(messages: &[ValidationMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_upcoming_course_passes() {
        assert!(CourseValidator.validate(&course(&json!({})), &context()).is_empty());
    }

    #[test]
    fn test_standard_starts_cannot_exceed_ter() {
        let messages = CourseValidator.validate(&course(&json!({ "current_standard_starts": 21 })), &context());
        assert_eq!(ids(&messages), vec!["COURSE_SS_EXCEEDS_TER"]);
    }

    #[test]
    fn test_started_course_needs_completed_starts() {
        let started = course(&json!({ "start_date": "2026-10-10" }));
        assert_eq!(
            ids(&CourseValidator.validate(&started, &context())),
            vec!["COURSE_COMPLETED_SS_MISSING"]
        );

        let over = course(&json!({ "start_date": "2026-10-10", "completed_standard_starts": 19 }));
        assert_eq!(
            ids(&CourseValidator.validate(&over, &context())),
            vec!["COURSE_COMPLETED_SS_EXCEEDS"]
        );
    }

    #[test]
    fn test_invalid_type_and_negative_count() {
        let messages = CourseValidator.validate(
            &course(&json!({ "course_type": "GUEST", "potentials": -2 })),
            &context(),
        );
        assert_eq!(ids(&messages), vec!["COURSE_INVALID_TYPE", "COURSE_NEGATIVE_COUNT"]);
    }

    #[test]
    fn test_guest_overflow_is_a_warning() {
        let messages = CourseValidator.validate(
            &course(&json!({ "guests_confirmed": 3, "guests_attended": 5 })),
            &context(),
        );
        assert_eq!(ids(&messages), vec!["COURSE_GUESTS_ATTENDED_EXCEEDS"]);
        assert!(!messages[0].is_error());
    }
}
