use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "menus")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub merchant_id: i64,
    /// Primary category; the full set lives in `menu_category_items`.
    pub category_id: Option<i64>,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub promo_price: Option<Decimal>,
    pub is_promo: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
    pub is_active: bool,
    pub track_stock: bool,
    pub stock_qty: Option<i32>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::merchants::Entity",
        from = "Column::MerchantId",
        to = "super::merchants::Column::Id",
        on_delete = "Cascade"
    )]
    Merchants,
    #[sea_orm(has_many = "super::menu_category_items::Entity")]
    MenuCategoryItems,
    #[sea_orm(has_many = "super::menu_addon_categories::Entity")]
    MenuAddonCategories,
}

impl Related<super::merchants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Merchants.def()
    }
}

impl Related<super::menu_category_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuCategoryItems.def()
    }
}

impl Related<super::menu_addon_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuAddonCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
