use sea_orm::entity::prelude::*;

/// Many-to-many link between menus and categories.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "menu_category_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub menu_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: i64,
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
        belongs_to = "super::menu_categories::Entity",
        from = "Column::CategoryId",
        to = "super::menu_categories::Column::Id",
        on_delete = "Cascade"
    )]
    MenuCategories,
}

impl Related<super::menus::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Menus.def()
    }
}

impl Related<super::menu_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
