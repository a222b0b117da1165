//! Schemas of the stashable entity types.
//!
//! Field names match the column names of the owning tables so that
//! [`Domain::fill_model`](crate::core::parser_domain::Domain::fill_model) can address
//! columns directly.

use crate::core::parser_domain::{FieldKind as K, FieldOwner as O, FieldSpec as F, Schema};

/// Team members: identity in `team_members`, weekly values in `team_member_data`.
pub static TEAM_MEMBER: Schema = Schema {
    name: "team_member",
    fields: &[
        F::new("id", O::Virtual, K::Int),
        F::new("first_name", O::Entity, K::Str).required(),
        F::new("last_name", O::Entity, K::Str).required(),
        F::new("team_year", O::Entity, K::Int).required(),
        F::new("incoming_quarter_id", O::Entity, K::Ref),
        F::new("at_weekend", O::Data, K::Bool),
        F::new("xfer_in", O::Data, K::Bool),
        F::new("xfer_out", O::Data, K::Bool),
        F::new("ctw", O::Data, K::Bool),
        F::new("withdraw_code_id", O::Data, K::Ref),
        F::new("travel", O::Data, K::Bool),
        F::new("room", O::Data, K::Bool),
        F::new("gitw", O::Data, K::Bool),
        F::new("tdo", O::Data, K::Int).zero_fill(),
        F::new("is_reviewer", O::Data, K::Bool),
        F::new("comment", O::Data, K::Str),
        F::new("accountabilities", O::Virtual, K::StrList),
    ],
};

/// Applications: identity in `applications`, lifecycle dates in `application_data`.
pub static APPLICATION: Schema = Schema {
    name: "application",
    fields: &[
        F::new("id", O::Virtual, K::Int),
        F::new("first_name", O::Entity, K::Str).required(),
        F::new("last_name", O::Entity, K::Str).required(),
        F::new("team_year", O::Entity, K::Int).required(),
        F::new("reg_date", O::Entity, K::Date).required(),
        F::new("incoming_quarter_id", O::Entity, K::Ref),
        F::new("is_reviewer", O::Entity, K::Bool),
        F::new("app_out_date", O::Data, K::Date),
        F::new("app_in_date", O::Data, K::Date),
        F::new("appr_date", O::Data, K::Date),
        F::new("wd_date", O::Data, K::Date),
        F::new("withdraw_code_id", O::Data, K::Ref),
        F::new("committed_team_member_id", O::Data, K::Ref).required(),
        F::new("travel", O::Data, K::Bool),
        F::new("room", O::Data, K::Bool),
        F::new("comment", O::Data, K::Str),
    ],
};

/// Courses: identity in `courses`, weekly counts in `course_data`.
pub static COURSE: Schema = Schema {
    name: "course",
    fields: &[
        F::new("id", O::Virtual, K::Int),
        F::new("course_type", O::Entity, K::Str).required(),
        F::new("location", O::Entity, K::Str).required(),
        F::new("start_date", O::Entity, K::Date).required(),
        F::new("quarter_start_ter", O::Data, K::Int).zero_fill(),
        F::new("quarter_start_standard_starts", O::Data, K::Int).zero_fill(),
        F::new("quarter_start_xfer", O::Data, K::Int).zero_fill(),
        F::new("current_ter", O::Data, K::Int).zero_fill(),
        F::new("current_standard_starts", O::Data, K::Int).zero_fill(),
        F::new("current_xfer", O::Data, K::Int).zero_fill(),
        F::new("completed_standard_starts", O::Data, K::Int),
        F::new("potentials", O::Data, K::Int).zero_fill(),
        F::new("registrations", O::Data, K::Int).zero_fill(),
        F::new("guests_promised", O::Data, K::Int),
        F::new("guests_invited", O::Data, K::Int),
        F::new("guests_confirmed", O::Data, K::Int),
        F::new("guests_attended", O::Data, K::Int),
        F::new("comment", O::Data, K::Str),
    ],
};

/// Program leaders live entirely in `program_leaders`.
pub static PROGRAM_LEADER: Schema = Schema {
    name: "program_leader",
    fields: &[
        F::new("id", O::Virtual, K::Int),
        F::new("accountability", O::Entity, K::Str).required(),
        F::new("first_name", O::Entity, K::Str).required(),
        F::new("last_name", O::Entity, K::Str).required(),
        F::new("phone", O::Entity, K::Str),
        F::new("email", O::Entity, K::Str),
        F::new("attending_weekend", O::Entity, K::Bool).required(),
    ],
};
