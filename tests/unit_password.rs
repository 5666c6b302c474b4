use attendly_core::password::{hash_password, verify_password};

#[test]
fn test_hash_is_not_the_password() {
    let hash = hash_password("lecture-hall-7").unwrap();
    assert!(!hash.is_empty());
    assert_ne!(hash, "lecture-hall-7");
    assert!(hash.starts_with("$2"));
}

#[test]
fn test_verify_accepts_only_the_original() {
    let hash = hash_password("Password123").unwrap();

    assert!(verify_password("Password123", &hash).unwrap());
    assert!(!verify_password("password123", &hash).unwrap());
    assert!(!verify_password("PASSWORD123", &hash).unwrap());
    assert!(!verify_password("", &hash).unwrap());
}

#[test]
fn test_same_password_gets_fresh_salt() {
    let first = hash_password("samepassword").unwrap();
    let second = hash_password("samepassword").unwrap();

    assert_ne!(first, second);
    assert!(verify_password("samepassword", &first).unwrap());
    assert!(verify_password("samepassword", &second).unwrap());
}

#[test]
fn test_non_ascii_passwords() {
    for password in ["p@ssw0rd!#$%^&*()", "құпиясөз", "пароль密码"] {
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash).unwrap());
    }
}

#[test]
fn test_verify_against_invalid_hash_is_an_error() {
    let err = verify_password("anything", "not_a_valid_bcrypt_hash").unwrap_err();
    assert!(err.is_server_error());
}
