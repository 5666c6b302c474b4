use attendly::modules::attendance::planning::authorize_amend;
use attendly::policy::{LinkedChild, Profile};
use attendly_models::{GroupId, Role, StudentId, SubjectId, TeacherId, UserId};

fn teacher(teacher_id: TeacherId, subjects: Vec<SubjectId>) -> Profile {
    Profile::Teacher {
        user_id: UserId::new(),
        teacher_id,
        subject_ids: subjects,
    }
}

#[test]
fn test_teacher_cannot_amend_foreign_subject() {
    let own = SubjectId::new();
    let foreign = SubjectId::new();
    let profile = teacher(TeacherId::new(), vec![own]);

    let err = authorize_amend(&profile, foreign, Some(TeacherId::new())).unwrap_err();
    assert_eq!(err.status.as_u16(), 403);
}

#[test]
fn test_admin_and_manager_may_amend_anything() {
    for role in [Role::Admin, Role::Manager] {
        let profile = Profile::AdminOrManager {
            user_id: UserId::new(),
            role,
        };
        assert!(authorize_amend(&profile, SubjectId::new(), None).is_ok());
    }
}

#[test]
fn test_teacher_may_amend_owned_subject_or_own_slot() {
    let teacher_id = TeacherId::new();
    let own = SubjectId::new();
    let profile = teacher(teacher_id, vec![own]);

    assert!(authorize_amend(&profile, own, None).is_ok());
    // Substitute instructor of a slot whose subject belongs to someone else
    assert!(authorize_amend(&profile, SubjectId::new(), Some(teacher_id)).is_ok());
}

#[test]
fn test_students_parents_and_unassigned_cannot_amend() {
    let subject = SubjectId::new();
    let profiles = [
        Profile::Student {
            user_id: UserId::new(),
            student_id: StudentId::new(),
            group_id: Some(GroupId::new()),
        },
        Profile::Parent {
            user_id: UserId::new(),
            children: vec![LinkedChild {
                student_id: StudentId::new(),
                group_id: None,
                full_name: "Child".to_string(),
            }],
        },
        Profile::Unassigned {
            user_id: UserId::new(),
        },
    ];

    for profile in profiles {
        let err = authorize_amend(&profile, subject, None).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
    }
}
