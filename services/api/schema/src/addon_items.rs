use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "addon_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub addon_category_id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
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
        belongs_to = "super::addon_categories::Entity",
        from = "Column::AddonCategoryId",
        to = "super::addon_categories::Column::Id",
        on_delete = "Cascade"
    )]
    AddonCategories,
}

impl Related<super::addon_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AddonCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
