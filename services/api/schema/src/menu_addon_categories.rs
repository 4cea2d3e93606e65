use sea_orm::entity::prelude::*;

/// Addon category offered on a menu.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "menu_addon_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub menu_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub addon_category_id: i64,
    pub is_required: bool,
    pub display_order: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::menus::Entity",
        from = "Column::MenuId",
        to = "super::menus::Column::Id",
        on_delete = "Cascade"
    )]
    Menus,
    #[sea_orm(
        belongs_to = "super::addon_categories::Entity",
        from = "Column::AddonCategoryId",
        to = "super::addon_categories::Column::Id",
        on_delete = "Cascade"
    )]
    AddonCategories,
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

impl ActiveModelBehavior for ActiveModel {}
