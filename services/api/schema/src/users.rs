use sea_orm::entity::prelude::*;

/// Platform account: super admins, merchant owners/staff and storefront customers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    /// argon2 PHC string; `None` for customers, who never sign in with a password.
    pub password_hash: Option<String>,
    /// `SUPER_ADMIN`, `MERCHANT_OWNER`, `MERCHANT_STAFF` or `CUSTOMER`.
    pub role: String,
    pub is_active: bool,
    pub must_change_password: bool,
    pub last_login_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_sessions::Entity")]
    UserSessions,
    #[sea_orm(has_one = "super::merchant_users::Entity")]
    MerchantUsers,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::user_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSessions.def()
    }
}

impl Related<super::merchant_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MerchantUsers.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
