use attendly_auth::{create_access_token, verify_token};
use attendly_config::JwtConfig;
use attendly_models::Role;
use uuid::Uuid;

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
    }
}

#[test]
fn test_create_access_token_success() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(Uuid::new_v4(), "aida", Some("student"), &jwt_config);

    assert!(token.is_ok());
    assert!(!token.unwrap().is_empty());
}

#[test]
fn test_token_carries_each_role() {
    let jwt_config = get_test_jwt_config();

    for role in Role::ALL {
        let token =
            create_access_token(Uuid::new_v4(), "someone", Some(role.as_str()), &jwt_config)
                .unwrap();
        let claims = verify_token(&token, &jwt_config).unwrap();
        assert_eq!(claims.role.as_deref(), Some(role.as_str()));
    }
}

#[test]
fn test_token_without_role() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_access_token(user_id, "newcomer", None, &jwt_config).unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.username, "newcomer");
    assert_eq!(claims.role, None);
}

#[test]
fn test_verify_token_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(Uuid::new_v4(), "aida", Some("student"), &jwt_config).unwrap();

    let wrong_jwt_config = JwtConfig {
        secret: "different_secret_key".to_string(),
        access_token_expiry: 3600,
    };

    let err = verify_token(&token, &wrong_jwt_config).unwrap_err();
    assert_eq!(err.status.as_u16(), 401);
}

#[test]
fn test_verify_token_malformed() {
    let jwt_config = get_test_jwt_config();
    let malformed_tokens = [
        "",
        "invalid.token.here",
        "not.enough.parts",
        "too.many.parts.here.extra",
        "!!!.invalid.chars",
        "header.payload.",
        ".payload.signature",
    ];

    for token in malformed_tokens {
        assert!(verify_token(token, &jwt_config).is_err());
    }
}

#[test]
fn test_token_expiry_is_set() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(Uuid::new_v4(), "aida", None, &jwt_config).unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert!(claims.exp > claims.iat);
    assert_eq!(
        claims.exp - claims.iat,
        jwt_config.access_token_expiry as usize
    );
}

#[test]
fn test_different_users_get_different_tokens() {
    let jwt_config = get_test_jwt_config();
    let user_id1 = Uuid::new_v4();
    let user_id2 = Uuid::new_v4();

    let token1 = create_access_token(user_id1, "first", Some("teacher"), &jwt_config).unwrap();
    let token2 = create_access_token(user_id2, "second", Some("teacher"), &jwt_config).unwrap();
    assert_ne!(token1, token2);

    let claims1 = verify_token(&token1, &jwt_config).unwrap();
    let claims2 = verify_token(&token2, &jwt_config).unwrap();
    assert_eq!(claims1.sub, user_id1.to_string());
    assert_eq!(claims2.sub, user_id2.to_string());
    assert_eq!(claims1.username, "first");
    assert_eq!(claims2.username, "second");
}
