use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
    sea_query::Expr,
};

use tabletop_api_schema::{merchant_users, merchants, user_sessions, users};
use tabletop_domain::pagination::PageRequest;
use tabletop_domain::role::{MerchantRole, UserRole};
use tabletop_domain::session::SessionStatus;

use crate::domain::repository::{MerchantRepository, SessionRepository, UserRepository};
use crate::domain::types::{
    Merchant, MerchantLink, MerchantPatch, NewMerchant, NewSession, NewUser, Session,
    SessionTokens, User, UserPatch,
};
use crate::error::ApiError;

/// Map a unique-constraint violation to `conflict`, anything else to an internal error.
pub(crate) fn conflict_or_internal(err: DbErr, conflict: ApiError, context: &'static str) -> ApiError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => conflict,
        _ => ApiError::Internal(anyhow::Error::new(err).context(context)),
    }
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model).transpose()?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model).transpose()?)
    }

    async fn create(&self, user: &NewUser) -> Result<User, ApiError> {
        let model = new_user_model(user, Utc::now())
            .insert(&self.db)
            .await
            .map_err(|e| conflict_or_internal(e, ApiError::EmailExists, "create user"))?;
        Ok(user_from_model(model)?)
    }

    async fn update(&self, id: i64, patch: &UserPatch) -> Result<User, ApiError> {
        let mut am = users::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(name) = &patch.name {
            am.name = Set(name.clone());
        }
        if let Some(email) = &patch.email {
            am.email = Set(email.clone());
        }
        if let Some(phone) = &patch.phone {
            am.phone = Set(Some(phone.clone()));
        }
        if let Some(role) = patch.role {
            am.role = Set(role.as_str().to_owned());
        }
        if let Some(is_active) = patch.is_active {
            am.is_active = Set(is_active);
        }
        am.updated_at = Set(Utc::now());
        let model = am
            .update(&self.db)
            .await
            .map_err(|e| conflict_or_internal(e, ApiError::EmailExists, "update user"))?;
        Ok(user_from_model(model)?)
    }

    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id),
            password_hash: Set(Some(password_hash.to_owned())),
            must_change_password: Set(must_change_password),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update user password")?;
        Ok(())
    }

    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id),
            last_login_at: Set(Some(at)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("touch last login")?;
        Ok(())
    }

    async fn list(
        &self,
        role: Option<UserRole>,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ApiError> {
        let page = page.clamped();
        let mut query = users::Entity::find();
        if let Some(role) = role {
            query = query.filter(users::Column::Role.eq(role.as_str()));
        }
        let total = query
            .clone()
            .count(&self.db)
            .await
            .context("count users")?;
        let models = query
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .offset(page.offset())
            .limit(u64::from(page.limit))
            .all(&self.db)
            .await
            .context("list users")?;
        let users = models
            .into_iter()
            .map(user_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((users, total))
    }

    async fn merchant_link(&self, user_id: i64) -> Result<Option<MerchantLink>, ApiError> {
        let model = merchant_users::Entity::find()
            .filter(merchant_users::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .context("find merchant link")?;
        let link = model
            .map(|m| -> anyhow::Result<MerchantLink> {
                Ok(MerchantLink {
                    merchant_id: m.merchant_id,
                    role: m.role.parse()?,
                })
            })
            .transpose()?;
        Ok(link)
    }
}

fn new_user_model(user: &NewUser, now: DateTime<Utc>) -> users::ActiveModel {
    users::ActiveModel {
        name: Set(user.name.clone()),
        email: Set(user.email.clone()),
        phone: Set(user.phone.clone()),
        password_hash: Set(user.password_hash.clone()),
        role: Set(user.role.as_str().to_owned()),
        is_active: Set(true),
        must_change_password: Set(user.must_change_password),
        last_login_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

fn user_from_model(model: users::Model) -> anyhow::Result<User> {
    Ok(User {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        password_hash: model.password_hash,
        role: model.role.parse()?,
        is_active: model.is_active,
        must_change_password: model.must_change_password,
        last_login_at: model.last_login_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Session repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSessionRepository {
    pub db: DatabaseConnection,
}

impl SessionRepository for DbSessionRepository {
    async fn create<T, F>(&self, session: &NewSession, sign: F) -> Result<(Session, T), ApiError>
    where
        T: Send,
        F: FnOnce(i64) -> Result<(SessionTokens, T), ApiError> + Send,
    {
        let now = Utc::now();
        // Dropping the transaction without a commit rolls the insert back.
        let txn = self.db.begin().await.context("begin session transaction")?;
        let model = user_sessions::ActiveModel {
            user_id: Set(session.user_id),
            token: Set(String::new()),
            refresh_token: Set(String::new()),
            status: Set(SessionStatus::Active.as_str().to_owned()),
            device_info: Set(session.device_info.clone()),
            ip_address: Set(session.ip_address.clone()),
            expires_at: Set(session.expires_at),
            last_activity_at: Set(now),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("create session")?;

        let (tokens, issued) = sign(model.id)?;
        let mut am: user_sessions::ActiveModel = model.into();
        am.token = Set(tokens.token);
        am.refresh_token = Set(tokens.refresh_token);
        let model = am.update(&txn).await.context("store session tokens")?;
        txn.commit().await.context("commit session")?;
        Ok((session_from_model(model)?, issued))
    }

    async fn set_tokens(
        &self,
        id: i64,
        token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        user_sessions::ActiveModel {
            id: Set(id),
            token: Set(token.to_owned()),
            refresh_token: Set(refresh_token.to_owned()),
            expires_at: Set(expires_at),
            last_activity_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set session tokens")?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Session>, ApiError> {
        let model = user_sessions::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find session by id")?;
        Ok(model.map(session_from_model).transpose()?)
    }

    async fn touch(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError> {
        user_sessions::Entity::update_many()
            .col_expr(user_sessions::Column::LastActivityAt, Expr::value(at))
            .filter(user_sessions::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("touch session")?;
        Ok(())
    }

    async fn list_active(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>, ApiError> {
        let models = user_sessions::Entity::find()
            .filter(user_sessions::Column::UserId.eq(user_id))
            .filter(user_sessions::Column::Status.eq(SessionStatus::Active.as_str()))
            .filter(user_sessions::Column::ExpiresAt.gt(now))
            .order_by_desc(user_sessions::Column::LastActivityAt)
            .all(&self.db)
            .await
            .context("list active sessions")?;
        let sessions = models
            .into_iter()
            .map(session_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    async fn revoke(&self, id: i64) -> Result<bool, ApiError> {
        let result = user_sessions::Entity::update_many()
            .col_expr(
                user_sessions::Column::Status,
                Expr::value(SessionStatus::Revoked.as_str()),
            )
            .filter(user_sessions::Column::Id.eq(id))
            .filter(user_sessions::Column::Status.eq(SessionStatus::Active.as_str()))
            .exec(&self.db)
            .await
            .context("revoke session")?;
        Ok(result.rows_affected > 0)
    }

    async fn revoke_all(&self, user_id: i64, keep: Option<i64>) -> Result<u64, ApiError> {
        let mut query = user_sessions::Entity::update_many()
            .col_expr(
                user_sessions::Column::Status,
                Expr::value(SessionStatus::Revoked.as_str()),
            )
            .filter(user_sessions::Column::UserId.eq(user_id))
            .filter(user_sessions::Column::Status.eq(SessionStatus::Active.as_str()));
        if let Some(keep) = keep {
            query = query.filter(user_sessions::Column::Id.ne(keep));
        }
        let result = query
            .exec(&self.db)
            .await
            .context("revoke user sessions")?;
        Ok(result.rows_affected)
    }
}

fn session_from_model(model: user_sessions::Model) -> anyhow::Result<Session> {
    Ok(Session {
        id: model.id,
        user_id: model.user_id,
        token: model.token,
        refresh_token: model.refresh_token,
        status: model.status.parse()?,
        device_info: model.device_info,
        ip_address: model.ip_address,
        expires_at: model.expires_at,
        last_activity_at: model.last_activity_at,
        created_at: model.created_at,
    })
}

// ── Merchant repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbMerchantRepository {
    pub db: DatabaseConnection,
}

impl MerchantRepository for DbMerchantRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<Merchant>, ApiError> {
        let mut query = merchants::Entity::find();
        if active_only {
            query = query.filter(merchants::Column::IsActive.eq(true));
        }
        let models = query
            .order_by_desc(merchants::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list merchants")?;
        Ok(models.into_iter().map(merchant_from_model).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Merchant>, ApiError> {
        let model = merchants::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find merchant by id")?;
        Ok(model.map(merchant_from_model))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Merchant>, ApiError> {
        let model = merchants::Entity::find()
            .filter(merchants::Column::Code.eq(code))
            .one(&self.db)
            .await
            .context("find merchant by code")?;
        Ok(model.map(merchant_from_model))
    }

    async fn create_with_owner(
        &self,
        merchant: &NewMerchant,
        owner: &NewUser,
    ) -> Result<(Merchant, User), ApiError> {
        let (merchant_model, owner_model) = self
            .db
            .transaction::<_, (merchants::Model, users::Model), DbErr>(|txn| {
                let merchant = merchant.clone();
                let owner = owner.clone();
                Box::pin(async move {
                    let now = Utc::now();
                    let merchant_model = merchants::ActiveModel {
                        code: Set(merchant.code),
                        name: Set(merchant.name),
                        description: Set(merchant.description),
                        address: Set(merchant.address),
                        phone: Set(merchant.phone),
                        email: Set(merchant.email),
                        currency: Set(merchant.currency),
                        tax_rate: Set(merchant.tax_rate),
                        tax_included: Set(merchant.tax_included),
                        service_charge_rate: Set(merchant.service_charge_rate),
                        is_active: Set(true),
                        is_open: Set(true),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let owner_model = new_user_model(&owner, now).insert(txn).await?;

                    merchant_users::ActiveModel {
                        merchant_id: Set(merchant_model.id),
                        user_id: Set(owner_model.id),
                        role: Set(MerchantRole::Owner.as_str().to_owned()),
                        created_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok((merchant_model, owner_model))
                })
            })
            .await
            .context("create merchant with owner")?;
        Ok((merchant_from_model(merchant_model), user_from_model(owner_model)?))
    }

    async fn update(&self, id: i64, patch: &MerchantPatch) -> Result<Merchant, ApiError> {
        let mut am = merchants::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(code) = &patch.code {
            am.code = Set(code.clone());
        }
        if let Some(name) = &patch.name {
            am.name = Set(name.clone());
        }
        if let Some(description) = &patch.description {
            am.description = Set(Some(description.clone()));
        }
        if let Some(address) = &patch.address {
            am.address = Set(Some(address.clone()));
        }
        if let Some(phone) = &patch.phone {
            am.phone = Set(Some(phone.clone()));
        }
        if let Some(email) = &patch.email {
            am.email = Set(Some(email.clone()));
        }
        if let Some(currency) = &patch.currency {
            am.currency = Set(currency.clone());
        }
        if let Some(tax_rate) = patch.tax_rate {
            am.tax_rate = Set(tax_rate);
        }
        if let Some(tax_included) = patch.tax_included {
            am.tax_included = Set(tax_included);
        }
        if let Some(rate) = patch.service_charge_rate {
            am.service_charge_rate = Set(rate);
        }
        am.updated_at = Set(Utc::now());
        let model = am
            .update(&self.db)
            .await
            .map_err(|e| conflict_or_internal(e, ApiError::MerchantCodeExists, "update merchant"))?;
        Ok(merchant_from_model(model))
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<Merchant, ApiError> {
        let model = merchants::ActiveModel {
            id: Set(id),
            is_active: Set(is_active),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set merchant active")?;
        Ok(merchant_from_model(model))
    }

    async fn set_open(&self, id: i64, is_open: bool) -> Result<Merchant, ApiError> {
        let model = merchants::ActiveModel {
            id: Set(id),
            is_open: Set(is_open),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set merchant open")?;
        Ok(merchant_from_model(model))
    }
}

fn merchant_from_model(model: merchants::Model) -> Merchant {
    Merchant {
        id: model.id,
        code: model.code,
        name: model.name,
        description: model.description,
        address: model.address,
        phone: model.phone,
        email: model.email,
        currency: model.currency,
        tax_rate: model.tax_rate,
        tax_included: model.tax_included,
        service_charge_rate: model.service_charge_rate,
        is_active: model.is_active,
        is_open: model.is_open,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
