use rust_decimal::Decimal;

use tabletop_api::config::TokenSettings;
use tabletop_api::domain::types::UserPatch;
use tabletop_api::error::ApiError;
use tabletop_api::infra::password::verify_password;
use tabletop_api::usecase::admin::{
    CreateMerchantInput, CreateMerchantUseCase, DeleteUserUseCase, ListUsersUseCase,
    ToggleMerchantUseCase, UpdateUserUseCase,
};
use tabletop_api::usecase::auth::{ClientMeta, LoginInput, LoginUseCase};
use tabletop_domain::pagination::PageRequest;
use tabletop_domain::role::{MerchantRole, UserRole};
use tabletop_domain::session::SessionStatus;
use tabletop_testing::auth::TEST_JWT_SECRET;

use crate::helpers::{MemoryStore, STRONG_PASSWORD, auth_context};

fn merchant_input(code: &str, owner_email: &str) -> CreateMerchantInput {
    CreateMerchantInput {
        code: code.to_owned(),
        name: "Kopi Corner".to_owned(),
        description: None,
        address: None,
        phone: None,
        email: None,
        currency: None,
        tax_rate: Some(Decimal::new(10, 2)),
        tax_included: None,
        service_charge_rate: None,
        owner_name: "Olive".to_owned(),
        owner_email: owner_email.to_owned(),
        owner_phone: None,
    }
}

// ── CreateMerchant ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_merchant_with_owner_and_temp_password() {
    let store = MemoryStore::new();
    let usecase = CreateMerchantUseCase {
        merchants: store.clone(),
        users: store.clone(),
    };

    let out = usecase
        .execute(merchant_input("kopi01", "Olive@Kopi.co"))
        .await
        .unwrap();

    assert_eq!(out.merchant.code, "KOPI01");
    assert!(out.merchant.is_active);
    assert_eq!(out.merchant.tax_rate, Decimal::new(10, 2));
    assert_eq!(out.owner.email, "olive@kopi.co");
    assert_eq!(out.owner.role, UserRole::MerchantOwner);
    assert!(out.owner.must_change_password);

    let hash = out.owner.password_hash.as_deref().unwrap();
    assert!(verify_password(&out.temp_password, hash));

    let links = store.tables().merchant_links.clone();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].0, out.owner.id);
    assert_eq!(links[0].1.merchant_id, out.merchant.id);
    assert_eq!(links[0].1.role, MerchantRole::Owner);
}

#[tokio::test]
async fn should_flag_first_login_of_new_owner() {
    let store = MemoryStore::new();
    let out = CreateMerchantUseCase {
        merchants: store.clone(),
        users: store.clone(),
    }
    .execute(merchant_input("KOPI01", "olive@kopi.co"))
    .await
    .unwrap();

    let login = LoginUseCase {
        users: store.clone(),
        sessions: store.clone(),
        tokens: TokenSettings::with_secret(TEST_JWT_SECRET),
    }
    .execute(LoginInput {
        email: "olive@kopi.co".to_owned(),
        password: out.temp_password,
        client: ClientMeta::default(),
    })
    .await
    .unwrap();

    assert!(login.must_change_password);
    assert_eq!(login.merchant.map(|m| m.merchant_id), Some(out.merchant.id));
}

#[tokio::test]
async fn should_reject_duplicate_merchant_code() {
    let store = MemoryStore::new();
    store.seed_merchant("KOPI01");

    let result = CreateMerchantUseCase {
        merchants: store.clone(),
        users: store.clone(),
    }
    .execute(merchant_input("kopi01", "olive@kopi.co"))
    .await;
    assert!(
        matches!(result, Err(ApiError::MerchantCodeExists)),
        "expected MerchantCodeExists, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_owner_email_already_in_use() {
    let store = MemoryStore::new();
    store.seed_user("Olive", "olive@kopi.co", UserRole::Customer, None);

    let result = CreateMerchantUseCase {
        merchants: store.clone(),
        users: store.clone(),
    }
    .execute(merchant_input("KOPI01", "olive@kopi.co"))
    .await;
    assert!(
        matches!(result, Err(ApiError::EmailExists)),
        "expected EmailExists, got {result:?}"
    );
    assert!(store.tables().merchants.is_empty());
}

#[tokio::test]
async fn should_reject_malformed_merchant_code() {
    let store = MemoryStore::new();

    let result = CreateMerchantUseCase {
        merchants: store.clone(),
        users: store.clone(),
    }
    .execute(merchant_input("k!", "olive@kopi.co"))
    .await;
    assert!(
        matches!(result, Err(ApiError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}

// ── ToggleMerchant ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_flip_merchant_active_flag() {
    let store = MemoryStore::new();
    let merchant = store.seed_merchant("KOPI01");
    let usecase = ToggleMerchantUseCase {
        merchants: store.clone(),
    };

    let off = usecase.execute(merchant.id).await.unwrap();
    assert!(!off.is_active);
    let on = usecase.execute(merchant.id).await.unwrap();
    assert!(on.is_active);
}

#[tokio::test]
async fn should_return_not_found_when_toggling_unknown_merchant() {
    let store = MemoryStore::new();

    let result = ToggleMerchantUseCase {
        merchants: store.clone(),
    }
    .execute(404)
    .await;
    assert!(matches!(result, Err(ApiError::MerchantNotFound)));
}

// ── Users ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_filter_users_by_role_and_paginate() {
    let store = MemoryStore::new();
    for i in 0..3 {
        store.seed_user("Cust", &format!("c{i}@example.com"), UserRole::Customer, None);
    }
    store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, None);

    let page = ListUsersUseCase {
        users: store.clone(),
    }
    .execute(Some(UserRole::Customer), PageRequest::new(Some(1), Some(2)))
    .await
    .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.meta.total, 3);
    assert_eq!(page.meta.total_pages, 2);
    assert!(page.items.iter().all(|u| u.role == UserRole::Customer));
}

#[tokio::test]
async fn should_reject_email_taken_by_another_user() {
    let store = MemoryStore::new();
    let ada = store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, None);
    store.seed_user("Bo", "bo@example.com", UserRole::MerchantStaff, None);

    let result = UpdateUserUseCase {
        users: store.clone(),
    }
    .execute(
        ada.id,
        UserPatch {
            email: Some("BO@example.com".to_owned()),
            ..Default::default()
        },
    )
    .await;
    assert!(
        matches!(result, Err(ApiError::EmailExists)),
        "expected EmailExists, got {result:?}"
    );
}

#[tokio::test]
async fn should_deactivate_user_and_revoke_sessions_on_delete() {
    let store = MemoryStore::new();
    let admin = store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    let staff = store.seed_user("Bo", "bo@example.com", UserRole::SuperAdmin, Some(STRONG_PASSWORD));
    let bo = LoginUseCase {
        users: store.clone(),
        sessions: store.clone(),
        tokens: TokenSettings::with_secret(TEST_JWT_SECRET),
    }
    .execute(LoginInput {
        email: "bo@example.com".to_owned(),
        password: STRONG_PASSWORD.to_owned(),
        client: ClientMeta::default(),
    })
    .await
    .unwrap();

    DeleteUserUseCase {
        users: store.clone(),
        sessions: store.clone(),
    }
    .execute(&auth_context(&admin, 1), staff.id)
    .await
    .unwrap();

    assert!(!store.user(staff.id).is_active);
    assert_eq!(store.session(bo.session.id).status, SessionStatus::Revoked);
}

#[tokio::test]
async fn should_not_let_admin_delete_themself() {
    let store = MemoryStore::new();
    let admin = store.seed_user("Ada", "ada@example.com", UserRole::SuperAdmin, None);

    let result = DeleteUserUseCase {
        users: store.clone(),
        sessions: store.clone(),
    }
    .execute(&auth_context(&admin, 1), admin.id)
    .await;
    assert!(
        matches!(result, Err(ApiError::Validation(_))),
        "expected Validation, got {result:?}"
    );
    assert!(store.user(admin.id).is_active);
}
