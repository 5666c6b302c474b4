use attendly::middleware::auth::AuthUser;
use attendly::middleware::role::{STAFF_ROLES, check_any_role, check_role};
use attendly_models::{Claims, Role};

fn auth_user(role: Option<&str>) -> AuthUser {
    AuthUser(Claims {
        sub: "00000000-0000-0000-0000-000000000000".to_string(),
        username: "someone".to_string(),
        role: role.map(str::to_string),
        exp: 9999999999,
        iat: 1234567890,
    })
}

#[test]
fn test_check_role_exact_match() {
    for role in Role::ALL {
        assert!(check_role(&auth_user(Some(role.as_str())), role).is_ok());
    }
}

#[test]
fn test_check_role_no_match() {
    assert!(check_role(&auth_user(Some("student")), Role::Admin).is_err());
    assert!(check_role(&auth_user(Some("teacher")), Role::Manager).is_err());
    assert!(check_role(&auth_user(Some("parent")), Role::Student).is_err());
}

#[test]
fn test_staff_roles_pass_staff_check() {
    assert!(check_any_role(&auth_user(Some("admin")), &STAFF_ROLES).is_ok());
    assert!(check_any_role(&auth_user(Some("manager")), &STAFF_ROLES).is_ok());
    assert!(check_any_role(&auth_user(Some("teacher")), &STAFF_ROLES).is_err());
    assert!(check_any_role(&auth_user(Some("parent")), &STAFF_ROLES).is_err());
}

#[test]
fn test_missing_or_unknown_role_never_passes() {
    let err = check_any_role(&auth_user(None), &Role::ALL).unwrap_err();
    assert_eq!(err.status.as_u16(), 403);

    let err = check_any_role(&auth_user(Some("system_admin")), &Role::ALL).unwrap_err();
    assert_eq!(err.status.as_u16(), 403);
}

#[test]
fn test_check_any_role_empty_list() {
    assert!(check_any_role(&auth_user(Some("admin")), &[]).is_err());
}

#[test]
fn test_role_is_parsed_from_claims() {
    let user = auth_user(Some("Teacher"));
    assert_eq!(user.role(), Some(Role::Teacher));
    assert_eq!(user.username(), "someone");
    assert!(user.user_id().is_ok());
}
