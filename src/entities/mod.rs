//! Entity module - Contains all SeaORM entity definitions for the database.
//! Identity tables (`team_member`, `application`, `course`) carry what stays stable
//! across weeks; the matching `*_data` tables carry one row per report.

pub mod accountability_mapping;
pub mod application;
pub mod application_data;
pub mod center;
pub mod center_stats_data;
pub mod course;
pub mod course_data;
pub mod global_report;
pub mod global_report_link;
pub mod program_leader;
pub mod quarter;
pub mod setting;
pub mod stats_report;
pub mod submission_data;
pub mod team_member;
pub mod team_member_data;

// Re-export specific types to avoid conflicts
pub use accountability_mapping::{
    Entity as AccountabilityMapping, Model as AccountabilityMappingModel,
};
pub use application::{Entity as Application, Model as ApplicationModel};
pub use application_data::{Entity as ApplicationData, Model as ApplicationDataModel};
pub use center::{Entity as Center, Model as CenterModel};
pub use center_stats_data::{Entity as CenterStatsData, Model as CenterStatsDataModel};
pub use course::{Entity as Course, Model as CourseModel};
pub use course_data::{Entity as CourseData, Model as CourseDataModel};
pub use global_report::{Entity as GlobalReport, Model as GlobalReportModel};
pub use global_report_link::{Entity as GlobalReportLink, Model as GlobalReportLinkModel};
pub use program_leader::{Entity as ProgramLeader, Model as ProgramLeaderModel};
pub use quarter::{Entity as Quarter, Model as QuarterModel};
pub use setting::{Entity as Setting, Model as SettingModel};
pub use stats_report::{Entity as StatsReport, Model as StatsReportModel};
pub use submission_data::{Entity as SubmissionData, Model as SubmissionDataModel};
pub use team_member::{Entity as TeamMember, Model as TeamMemberModel};
pub use team_member_data::{Entity as TeamMemberData, Model as TeamMemberDataModel};
