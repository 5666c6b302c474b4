use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use attendly_core::pagination::{PaginationMeta, PaginationParams};
use attendly_models::attendance::{
    AmendAttendanceDto, AmendManyDto, AmendManyOutcome, AmendOutcome, AttendanceAuditEntry,
    AttendanceRecord, AttendanceRecordDetail, AttendanceStatus, BulkMarkDto, BulkMarkOutcome,
    MarkEntry, PaginatedAttendanceResponse,
};
use attendly_models::auth::{LoginRequest, LoginResponse, LoginUser};
use attendly_models::catalog::{
    Course, Group, PaginatedStudentsResponse, Student, Subject, Teacher, TimeSlot,
};
use attendly_models::leave_requests::{
    CreateLeaveRequestDto, DecideLeaveRequestDto, LeaveDecisionResponse, LeaveRequest,
    LeaveStatus, LeaveType, PropagationSummary,
};
use attendly_models::notifications::{
    MarkAllReadResponse, Notification, NotificationKind, PaginatedNotificationsResponse,
};
use attendly_models::schedule::{
    LessonInfo, RosterEntry, RosterResponse, ScheduleSlot, ScheduleSlotDetail,
    SlotActivationResponse, UpsertScheduleSlotDto, Weekday,
};
use attendly_models::statistics::{
    AbsentStudent, ChildSummary, DashboardResponse, GroupStat, InstitutionTotals, StatsReport,
    StatusBreakdown, TrendPoint,
};
use attendly_models::users::{
    AssignRoleDto, ChangePasswordDto, ChangeUsernameDto, MessageResponse, PaginatedUsersResponse,
    Role, RoleAssignmentResponse, UpdateProfileDto, User, UserProfile,
};

use crate::modules::auth::MeResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::get_me,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::assign_role,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::update_profile,
        crate::modules::users::controller::change_password,
        crate::modules::users::controller::change_username,
        crate::modules::catalog::controller::get_courses,
        crate::modules::catalog::controller::get_groups,
        crate::modules::catalog::controller::get_subjects,
        crate::modules::catalog::controller::get_teachers,
        crate::modules::catalog::controller::get_time_slots,
        crate::modules::catalog::controller::get_students,
        crate::modules::schedule::controller::get_schedule,
        crate::modules::schedule::controller::get_my_schedule,
        crate::modules::schedule::controller::get_today_schedule,
        crate::modules::schedule::controller::get_schedule_slot,
        crate::modules::schedule::controller::create_schedule_slot,
        crate::modules::schedule::controller::update_schedule_slot,
        crate::modules::schedule::controller::retire_schedule_slot,
        crate::modules::schedule::controller::reactivate_schedule_slot,
        crate::modules::schedule::controller::get_roster,
        crate::modules::attendance::controller::mark_bulk_attendance,
        crate::modules::attendance::controller::amend_attendance,
        crate::modules::attendance::controller::amend_many_attendance,
        crate::modules::attendance::controller::get_attendance_history,
        crate::modules::attendance::controller::get_attendance,
        crate::modules::attendance::controller::get_attendance_audit,
        crate::modules::leave_requests::controller::create_leave_request,
        crate::modules::leave_requests::controller::get_leave_requests,
        crate::modules::leave_requests::controller::get_leave_request,
        crate::modules::leave_requests::controller::decide_leave_request,
        crate::modules::statistics::controller::get_stats,
        crate::modules::statistics::controller::get_dashboard,
        crate::modules::statistics::controller::get_group_stats,
        crate::modules::notifications::controller::get_notifications,
        crate::modules::notifications::controller::mark_notification_read,
        crate::modules::notifications::controller::mark_all_notifications_read,
        crate::modules::notifications::controller::delete_notification,
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            LoginUser,
            MeResponse,
            User,
            Role,
            AssignRoleDto,
            RoleAssignmentResponse,
            PaginatedUsersResponse,
            UserProfile,
            UpdateProfileDto,
            ChangePasswordDto,
            ChangeUsernameDto,
            MessageResponse,
            Course,
            Group,
            Subject,
            Teacher,
            TimeSlot,
            Student,
            PaginatedStudentsResponse,
            Weekday,
            ScheduleSlot,
            ScheduleSlotDetail,
            UpsertScheduleSlotDto,
            SlotActivationResponse,
            RosterEntry,
            LessonInfo,
            RosterResponse,
            AttendanceStatus,
            AttendanceRecord,
            AttendanceRecordDetail,
            MarkEntry,
            BulkMarkDto,
            BulkMarkOutcome,
            AmendAttendanceDto,
            AmendOutcome,
            AmendManyDto,
            AmendManyOutcome,
            AttendanceAuditEntry,
            PaginatedAttendanceResponse,
            LeaveStatus,
            LeaveType,
            LeaveRequest,
            CreateLeaveRequestDto,
            DecideLeaveRequestDto,
            PropagationSummary,
            LeaveDecisionResponse,
            StatusBreakdown,
            TrendPoint,
            GroupStat,
            AbsentStudent,
            StatsReport,
            InstitutionTotals,
            ChildSummary,
            DashboardResponse,
            NotificationKind,
            Notification,
            PaginatedNotificationsResponse,
            MarkAllReadResponse,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login and the caller's identity"),
        (name = "Users", description = "Identities and role assignment"),
        (name = "Catalog", description = "Courses, groups, subjects, teachers, periods and students"),
        (name = "Schedule", description = "Weekly timetable and lesson rosters"),
        (name = "Attendance", description = "Attendance ledger, amendments and audit trail"),
        (name = "Leave Requests", description = "Absence requests and their propagation to the ledger"),
        (name = "Statistics", description = "Attendance reports and dashboards"),
        (name = "Notifications", description = "In-app notifications")
    ),
    info(
        title = "Attendly API",
        version = "0.1.0",
        description = "Attendance tracking for universities: timetable, ledger, leave requests and statistics.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
