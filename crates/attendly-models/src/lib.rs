//! # Attendly Models
//!
//! Domain models and DTOs for the Attendly API: database rows, request and
//! response bodies, query parameters and the typed identifiers that tie them
//! together.
//!
//! # Modules
//!
//! - [`ids`]: newtype identifiers over `Uuid`
//! - [`users`]: identities and the role tag
//! - [`catalog`]: courses, groups, teachers, subjects, periods, students
//! - [`schedule`]: weekly timetable slots and rosters
//! - [`attendance`]: ledger records, marking and amendments
//! - [`leave_requests`]: absence requests and propagation summaries
//! - [`statistics`]: dashboard and report shapes
//! - [`notifications`]: in-app notifications

pub mod attendance;
pub mod auth;
pub mod catalog;
pub mod ids;
pub mod leave_requests;
pub mod notifications;
pub mod schedule;
pub mod statistics;
pub mod users;

pub use auth::{Claims, LoginRequest, LoginResponse, LoginUser};

pub use ids::{
    AttendanceId, AuditEntryId, CourseId, GroupId, LeaveRequestId, NotificationId, ScheduleSlotId,
    StudentId, SubjectId, TeacherId, TimeSlotId, UserId,
};

pub use users::{AssignRoleDto, Role, RoleAssignmentResponse, User, UserCredentials};

pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use leave_requests::{LeaveRequest, LeaveStatus, LeaveType};
pub use schedule::{ScheduleSlot, ScheduleSlotDetail, Weekday};
