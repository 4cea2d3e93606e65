use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "addon_categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub merchant_id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub min_selection: i32,
    pub max_selection: Option<i32>,
    pub is_active: bool,
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
    #[sea_orm(has_many = "super::addon_items::Entity")]
    AddonItems,
    #[sea_orm(has_many = "super::menu_addon_categories::Entity")]
    MenuAddonCategories,
}

impl Related<super::merchants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Merchants.def()
    }
}

impl Related<super::addon_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AddonItems.def()
    }
}

impl Related<super::menu_addon_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuAddonCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
