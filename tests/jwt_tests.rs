//! JWT 服务测试
//!
//! 测试令牌签发、验证、过期与篡改

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, TimeZone, Utc};
use member_portal::auth::{AuthError, IssueClaims, JwtService, Role};
use proptest::prelude::*;

const SECRET: &[u8] = b"test_secret_key_32_characters_long!";
const OTHER_SECRET: &[u8] = b"another_secret_key_32_characters_long";

fn service(secret: &[u8]) -> JwtService {
    JwtService::new(secret, Duration::seconds(3600)).expect("valid jwt service")
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Admin), Just(Role::User), Just(Role::Teacher)]
}

#[test]
fn test_issue_and_verify_with_clock() {
    let jwt = service(SECRET);
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let identity = IssueClaims::new("42", Role::Admin, "a@b.com");

    let token = jwt.issue_at(&identity, t0).unwrap();

    let claims = jwt.verify_at(&token, t0 + Duration::seconds(10)).unwrap();
    assert_eq!(claims.identity(), identity);
    assert_eq!(claims.iat, t0.timestamp());
    assert_eq!(claims.exp, t0.timestamp() + 3600);

    assert!(jwt.verify_at(&token, t0 + Duration::seconds(3599)).is_ok());
    assert_eq!(
        jwt.verify_at(&token, t0 + Duration::seconds(3600)),
        Err(AuthError::ExpiredToken)
    );
    assert_eq!(
        jwt.verify_at(&token, t0 + Duration::seconds(3601)),
        Err(AuthError::ExpiredToken)
    );
}

#[test]
fn test_wrong_key_rejected() {
    let token = service(SECRET)
        .issue(&IssueClaims::new("42", Role::User, "u@b.com"))
        .unwrap();

    assert_eq!(
        service(OTHER_SECRET).verify(&token),
        Err(AuthError::SignatureInvalid)
    );
}

#[test]
fn test_any_single_character_change_rejected() {
    let jwt = service(SECRET);
    let token = jwt
        .issue(&IssueClaims::new("42", Role::Teacher, "t@b.com"))
        .unwrap();

    for (index, ch) in token.char_indices() {
        if ch == '.' {
            continue;
        }

        let replacement = if ch == 'A' { 'B' } else { 'A' };
        let mut tampered = token.clone();
        tampered.replace_range(index..index + 1, &replacement.to_string());

        assert!(
            jwt.verify(&tampered).is_err(),
            "tampered token accepted at position {}",
            index
        );
    }
}

#[test]
fn test_malformed_tokens() {
    let jwt = service(SECRET);

    for token in ["", "abc", "a.b", "a.b.c", "...", "not.a.token.at.all"] {
        assert!(jwt.verify(token).is_err(), "accepted {:?}", token);
    }
    assert_eq!(jwt.verify("a.b.c"), Err(AuthError::MalformedToken));
}

#[test]
fn test_wire_format() {
    let jwt = service(SECRET);
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let token = jwt
        .issue_at(&IssueClaims::new("42", Role::Admin, "a@b.com"), t0)
        .unwrap();

    let segments: Vec<&str> = token.split('.').collect();
    assert_eq!(segments.len(), 3);

    let header: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[0]).unwrap()).unwrap();
    assert_eq!(header["alg"], "HS256");
    assert_eq!(header["typ"], "JWT");

    let payload: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[1]).unwrap()).unwrap();
    assert_eq!(payload["sub"], "42");
    assert_eq!(payload["role"], "admin");
    assert_eq!(payload["email"], "a@b.com");
    assert_eq!(payload["iat"], t0.timestamp());
    assert_eq!(payload["exp"], t0.timestamp() + 3600);
}

#[test]
fn test_unknown_role_in_payload_rejected() {
    // 使用相同密钥签名，但角色不在枚举中
    let claims = serde_json::json!({
        "sub": "42",
        "role": "superuser",
        "email": "a@b.com",
        "iat": Utc::now().timestamp(),
        "exp": Utc::now().timestamp() + 3600,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET),
    )
    .unwrap();

    assert_eq!(service(SECRET).verify(&token), Err(AuthError::MalformedToken));
}

#[test]
fn test_empty_subject_rejected() {
    let jwt = service(SECRET);
    assert!(matches!(
        jwt.issue(&IssueClaims::new("  ", Role::User, "u@b.com")),
        Err(AuthError::InvalidClaims(_))
    ));
}

#[test]
fn test_short_secret_rejected() {
    assert!(JwtService::new(b"short", Duration::seconds(3600)).is_err());
    assert!(JwtService::new(SECRET, Duration::zero()).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn issued_tokens_verify_to_same_identity(
        subject in "[A-Za-z0-9-]{1,36}",
        role in role_strategy(),
        email in "[a-z]{1,12}@[a-z]{1,8}\\.com",
    ) {
        let jwt = service(SECRET);
        let identity = IssueClaims::new(subject, role, email);

        let token = jwt.issue(&identity).unwrap();
        let claims = jwt.verify(&token).unwrap();

        prop_assert_eq!(claims.identity(), identity);
        prop_assert_eq!(claims.exp - claims.iat, 3600);
    }
}
