use tabletop_api::config::TokenSettings;
use tabletop_api::error::ApiError;
use tabletop_api::usecase::admin::{SeedAdminInput, SeedAdminUseCase};
use tabletop_api::usecase::auth::{
    ChangePasswordInput, ChangePasswordUseCase, ClientMeta, FirstTimePasswordInput,
    FirstTimePasswordUseCase, LoginInput, LoginOutput, LoginUseCase, LogoutAllUseCase,
    RefreshUseCase, RevokeSessionUseCase,
};
use tabletop_api::usecase::auth_context::ResolveAuthContextUseCase;
use tabletop_domain::role::{MerchantRole, UserRole};
use tabletop_domain::session::SessionStatus;
use tabletop_testing::auth::TEST_JWT_SECRET;

use crate::helpers::{MemoryStore, STRONG_PASSWORD, auth_context};

fn tokens() -> TokenSettings {
    TokenSettings::with_secret(TEST_JWT_SECRET)
}

async fn login(store: &MemoryStore, email: &str, password: &str) -> Result<LoginOutput, ApiError> {
    let usecase = LoginUseCase {
        users: store.clone(),
        sessions: store.clone(),
        tokens: tokens(),
    };
    usecase
        .execute(LoginInput {
            email: email.to_owned(),
            password: password.to_owned(),
            client: ClientMeta::default(),
        })
        .await
}

// ── Login ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_login_and_store_tokens_on_session() {
    let store = MemoryStore::new();
    let merchant = store.seed_merchant("KOPI01");
    let owner = store.seed_user(
        "Olive",
        "olive@kopi.co",
        UserRole::MerchantOwner,
        Some(STRONG_PASSWORD),
    );
    store.link_user(owner.id, merchant.id, MerchantRole::Owner);

    let out = login(&store, "  Olive@Kopi.co ", STRONG_PASSWORD).await.unwrap();

    assert_eq!(out.user.id, owner.id);
    assert_eq!(out.merchant.map(|m| m.merchant_id), Some(merchant.id));
    assert!(!out.must_change_password);

    let session = store.session(out.session.id);
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.token, out.tokens.access_token.token);
    assert_eq!(session.refresh_token, out.tokens.refresh_token.token);
    assert!(store.user(owner.id).last_login_at.is_some());
}

#[tokio::test]
async fn should_leave_no_session_when_token_write_fails() {
    let store = MemoryStore::new();
    store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    store.tables().fail_session_tokens = true;

    let result = login(&store, "ada@example.com", STRONG_PASSWORD).await;
    assert!(
        matches!(result, Err(ApiError::Internal(_))),
        "expected Internal, got {result:?}"
    );
    assert!(store.tables().sessions.is_empty());

    store.tables().fail_session_tokens = false;
    let out = login(&store, "ada@example.com", STRONG_PASSWORD).await.unwrap();
    assert!(!store.session(out.session.id).token.is_empty());
}

#[tokio::test]
async fn should_reject_wrong_password() {
    let store = MemoryStore::new();
    store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));

    let result = login(&store, "ada@example.com", "Wrong1234").await;
    assert!(
        matches!(result, Err(ApiError::InvalidCredentials)),
        "expected InvalidCredentials, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_unknown_email_like_wrong_password() {
    let store = MemoryStore::new();

    let result = login(&store, "nobody@example.com", STRONG_PASSWORD).await;
    assert!(
        matches!(result, Err(ApiError::InvalidCredentials)),
        "expected InvalidCredentials, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_disabled_account_after_password_check() {
    let store = MemoryStore::new();
    let user = store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    store.tables().users.iter_mut().for_each(|u| {
        if u.id == user.id {
            u.is_active = false;
        }
    });

    let result = login(&store, "ada@example.com", "Wrong1234").await;
    assert!(matches!(result, Err(ApiError::InvalidCredentials)));

    let result = login(&store, "ada@example.com", STRONG_PASSWORD).await;
    assert!(
        matches!(result, Err(ApiError::AccountDisabled)),
        "expected AccountDisabled, got {result:?}"
    );
}

#[tokio::test]
async fn should_not_let_customer_use_console_login() {
    let store = MemoryStore::new();
    store.seed_user("Cass", "cass@example.com", UserRole::Customer, Some(STRONG_PASSWORD));

    let result = login(&store, "cass@example.com", STRONG_PASSWORD).await;
    assert!(
        matches!(result, Err(ApiError::InvalidCredentials)),
        "expected InvalidCredentials, got {result:?}"
    );
}

#[tokio::test]
async fn should_require_email_and_password() {
    let store = MemoryStore::new();

    let result = login(&store, "", STRONG_PASSWORD).await;
    assert!(matches!(result, Err(ApiError::Validation(_))));

    let result = login(&store, "ada@example.com", "   ").await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

// ── Refresh ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_rotate_token_pair_on_refresh() {
    let store = MemoryStore::new();
    store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    let out = login(&store, "ada@example.com", STRONG_PASSWORD).await.unwrap();
    let old_refresh = out.tokens.refresh_token.token.clone();

    let usecase = RefreshUseCase {
        users: store.clone(),
        sessions: store.clone(),
        tokens: tokens(),
    };
    let pair = usecase.execute(&old_refresh).await.unwrap();

    assert_ne!(pair.refresh_token.token, old_refresh);
    let session = store.session(out.session.id);
    assert_eq!(session.token, pair.access_token.token);
    assert_eq!(session.refresh_token, pair.refresh_token.token);

    let result = usecase.execute(&old_refresh).await;
    assert!(
        matches!(result, Err(ApiError::InvalidRefreshToken)),
        "expected InvalidRefreshToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_refresh_on_revoked_session() {
    let store = MemoryStore::new();
    let user = store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    let out = login(&store, "ada@example.com", STRONG_PASSWORD).await.unwrap();

    LogoutAllUseCase {
        sessions: store.clone(),
    }
    .execute(&auth_context(&user, out.session.id))
    .await
    .unwrap();

    let usecase = RefreshUseCase {
        users: store.clone(),
        sessions: store.clone(),
        tokens: tokens(),
    };
    let result = usecase.execute(&out.tokens.refresh_token.token).await;
    assert!(
        matches!(result, Err(ApiError::SessionRevoked)),
        "expected SessionRevoked, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_access_token_used_as_refresh_token() {
    let store = MemoryStore::new();
    store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    let out = login(&store, "ada@example.com", STRONG_PASSWORD).await.unwrap();

    let usecase = RefreshUseCase {
        users: store.clone(),
        sessions: store.clone(),
        tokens: tokens(),
    };
    let result = usecase.execute(&out.tokens.access_token.token).await;
    assert!(
        matches!(result, Err(ApiError::InvalidRefreshToken)),
        "expected InvalidRefreshToken, got {result:?}"
    );
}

// ── Auth context ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_resolve_context_until_session_is_revoked() {
    let store = MemoryStore::new();
    let user = store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    let out = login(&store, "ada@example.com", STRONG_PASSWORD).await.unwrap();
    let token = out.tokens.access_token.token.clone();

    let resolve = ResolveAuthContextUseCase {
        sessions: store.clone(),
        users: store.clone(),
        access_secret: TEST_JWT_SECRET.to_owned(),
    };
    let ctx = resolve.execute(&token).await.unwrap();
    assert_eq!(ctx.user_id, user.id);
    assert_eq!(ctx.session_id, out.session.id);
    assert_eq!(ctx.role, UserRole::SuperAdmin);

    RevokeSessionUseCase {
        sessions: store.clone(),
    }
    .execute(&ctx, out.session.id)
    .await
    .unwrap();

    let result = resolve.execute(&token).await;
    assert!(
        matches!(result, Err(ApiError::SessionRevoked)),
        "expected SessionRevoked, got {result:?}"
    );
}

#[tokio::test]
async fn should_not_revoke_session_of_another_user() {
    let store = MemoryStore::new();
    let ada = store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    store.seed_user("Bo", "bo@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    let bo_login = login(&store, "bo@example.com", STRONG_PASSWORD).await.unwrap();

    let result = RevokeSessionUseCase {
        sessions: store.clone(),
    }
    .execute(&auth_context(&ada, 999), bo_login.session.id)
    .await;
    assert!(
        matches!(result, Err(ApiError::SessionNotFound)),
        "expected SessionNotFound, got {result:?}"
    );
    assert_eq!(store.session(bo_login.session.id).status, SessionStatus::Active);
}

// ── Passwords ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_change_password_and_revoke_other_sessions() {
    let store = MemoryStore::new();
    let user = store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    let first = login(&store, "ada@example.com", STRONG_PASSWORD).await.unwrap();
    let second = login(&store, "ada@example.com", STRONG_PASSWORD).await.unwrap();

    let usecase = ChangePasswordUseCase {
        users: store.clone(),
        sessions: store.clone(),
    };
    usecase
        .execute(
            &auth_context(&user, first.session.id),
            ChangePasswordInput {
                current_password: STRONG_PASSWORD.to_owned(),
                new_password: "Fresher456".to_owned(),
            },
        )
        .await
        .unwrap();

    assert_eq!(store.session(first.session.id).status, SessionStatus::Active);
    assert_eq!(store.session(second.session.id).status, SessionStatus::Revoked);
    assert!(login(&store, "ada@example.com", "Fresher456").await.is_ok());
    assert!(matches!(
        login(&store, "ada@example.com", STRONG_PASSWORD).await,
        Err(ApiError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn should_reject_weak_new_password() {
    let store = MemoryStore::new();
    let user = store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));

    let result = ChangePasswordUseCase {
        users: store.clone(),
        sessions: store.clone(),
    }
    .execute(
        &auth_context(&user, 1),
        ChangePasswordInput {
            current_password: STRONG_PASSWORD.to_owned(),
            new_password: "short".to_owned(),
        },
    )
    .await;
    assert!(
        matches!(result, Err(ApiError::WeakPassword)),
        "expected WeakPassword, got {result:?}"
    );
}

#[tokio::test]
async fn should_replace_temporary_password_and_sign_in() {
    let store = MemoryStore::new();
    let owner = store.seed_user("Olive", "olive@kopi.co", UserRole::MerchantOwner, Some("Temp0rary"));
    store.tables().users.iter_mut().for_each(|u| {
        if u.id == owner.id {
            u.must_change_password = true;
        }
    });

    let usecase = FirstTimePasswordUseCase {
        users: store.clone(),
        sessions: store.clone(),
        tokens: tokens(),
    };
    let out = usecase
        .execute(FirstTimePasswordInput {
            email: "olive@kopi.co".to_owned(),
            temp_password: "Temp0rary".to_owned(),
            new_password: STRONG_PASSWORD.to_owned(),
            client: ClientMeta::default(),
        })
        .await
        .unwrap();

    assert_eq!(out.user.id, owner.id);
    assert!(!out.must_change_password);
    assert!(!store.user(owner.id).must_change_password);
    assert!(login(&store, "olive@kopi.co", STRONG_PASSWORD).await.is_ok());
}

#[tokio::test]
async fn should_reject_wrong_temporary_password() {
    let store = MemoryStore::new();
    store.seed_user("Olive", "olive@kopi.co", UserRole::MerchantOwner, Some("Temp0rary"));

    let result = FirstTimePasswordUseCase {
        users: store.clone(),
        sessions: store.clone(),
        tokens: tokens(),
    }
    .execute(FirstTimePasswordInput {
        email: "olive@kopi.co".to_owned(),
        temp_password: "Guess1234".to_owned(),
        new_password: STRONG_PASSWORD.to_owned(),
        client: ClientMeta::default(),
    })
    .await;
    assert!(
        matches!(result, Err(ApiError::InvalidCredentials)),
        "expected InvalidCredentials, got {result:?}"
    );
}

// ── SeedAdmin ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_seed_super_admin_once() {
    let store = MemoryStore::new();
    let usecase = SeedAdminUseCase {
        users: store.clone(),
    };
    let input = || SeedAdminInput {
        email: "Root@Example.com".to_owned(),
        password: STRONG_PASSWORD.to_owned(),
        name: "Root".to_owned(),
    };

    let (admin, created) = usecase.execute(input()).await.unwrap();
    assert!(created);
    assert_eq!(admin.email, "root@example.com");
    assert_eq!(admin.role, UserRole::SuperAdmin);
    assert!(!admin.must_change_password);

    let (again, created) = usecase.execute(input()).await.unwrap();
    assert!(!created);
    assert_eq!(again.id, admin.id);
    assert_eq!(store.tables().users.len(), 1);

    assert!(login(&store, "root@example.com", STRONG_PASSWORD).await.is_ok());
}
