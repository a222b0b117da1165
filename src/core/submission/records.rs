//! Uniform access to the identity and weekly tables of stashable entities.

use crate::entities::{
    Application, ApplicationData, Course, CourseData, ProgramLeader, TeamMember, TeamMemberData,
    application, application_data, course, course_data, program_leader, team_member,
    team_member_data,
};
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, EntityTrait, Set};

/// A table holding the stable identity of an entity, owned by a center.
pub trait IdentityRecord: EntityTrait {
    /// Active model of the table
    type Active: ActiveModelTrait<Entity = Self> + ActiveModelBehavior + Send + From<Self::Model>;

    /// Name used in errors and logs.
    const LABEL: &'static str;

    /// Primary key column.
    fn id_column() -> Self::Column;
    /// Owning center column.
    fn center_column() -> Self::Column;
    /// A new row for `center_id` with nothing else set.
    fn blank(center_id: i64) -> Self::Active;
    /// Primary key of a row.
    fn id(model: &Self::Model) -> i64;
    /// Owning center of a row.
    fn center_id(model: &Self::Model) -> i64;
}

/// A table holding one row per entity and report.
pub trait WeeklyRecord: EntityTrait {
    /// Active model of the table
    type Active: ActiveModelTrait<Entity = Self> + ActiveModelBehavior + Send + From<Self::Model>;

    /// Report column.
    fn report_column() -> Self::Column;
    /// A new row linking `entity_id` to `report_id`.
    fn blank(report_id: i64, entity_id: i64) -> Self::Active;
    /// Entity the row describes.
    fn entity_id(model: &Self::Model) -> i64;
}

macro_rules! identity_record {
    ($entity:ty, $module:ident, $label:literal) => {
        impl IdentityRecord for $entity {
            type Active = $module::ActiveModel;

            const LABEL: &'static str = $label;

            fn id_column() -> Self::Column {
                $module::Column::Id
            }

            fn center_column() -> Self::Column {
                $module::Column::CenterId
            }

            fn blank(center_id: i64) -> Self::Active {
                $module::ActiveModel {
                    center_id: Set(center_id),
                    ..Default::default()
                }
            }

            fn id(model: &Self::Model) -> i64 {
                model.id
            }

            fn center_id(model: &Self::Model) -> i64 {
                model.center_id
            }
        }
    };
}

macro_rules! weekly_record {
    ($entity:ty, $module:ident, $link:ident) => {
        impl WeeklyRecord for $entity {
            type Active = $module::ActiveModel;

            fn report_column() -> Self::Column {
                $module::Column::StatsReportId
            }

            fn blank(report_id: i64, entity_id: i64) -> Self::Active {
                $module::ActiveModel {
                    stats_report_id: Set(report_id),
                    $link: Set(entity_id),
                    ..Default::default()
                }
            }

            fn entity_id(model: &Self::Model) -> i64 {
                model.$link
            }
        }
    };
}

identity_record!(TeamMember, team_member, "team_member");
identity_record!(Application, application, "application");
identity_record!(Course, course, "course");
identity_record!(ProgramLeader, program_leader, "program_leader");

weekly_record!(TeamMemberData, team_member_data, team_member_id);
weekly_record!(ApplicationData, application_data, application_id);
weekly_record!(CourseData, course_data, course_id);
