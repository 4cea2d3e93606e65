use sea_orm::entity::prelude::*;

/// Tenant restaurant.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "merchants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: String,
    /// Percent.
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub tax_rate: Decimal,
    pub tax_included: bool,
    /// Percent.
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub service_charge_rate: Decimal,
    pub is_active: bool,
    pub is_open: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::merchant_users::Entity")]
    MerchantUsers,
    #[sea_orm(has_many = "super::menu_categories::Entity")]
    MenuCategories,
    #[sea_orm(has_many = "super::menus::Entity")]
    Menus,
    #[sea_orm(has_many = "super::addon_categories::Entity")]
    AddonCategories,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::merchant_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MerchantUsers.def()
    }
}

impl Related<super::menu_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuCategories.def()
    }
}

impl Related<super::menus::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Menus.def()
    }
}

impl Related<super::addon_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AddonCategories.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
