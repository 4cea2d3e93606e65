use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MenuCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MenuCategories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MenuCategories::MerchantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MenuCategories::Name).string().not_null())
                    .col(ColumnDef::new(MenuCategories::Description).text())
                    .col(
                        ColumnDef::new(MenuCategories::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MenuCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(MenuCategories::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(MenuCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MenuCategories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MenuCategories::Table, MenuCategories::MerchantId)
                            .to(Merchants::Table, Merchants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Menus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Menus::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Menus::MerchantId).big_integer().not_null())
                    .col(ColumnDef::new(Menus::CategoryId).big_integer())
                    .col(ColumnDef::new(Menus::Name).string().not_null())
                    .col(ColumnDef::new(Menus::Description).text())
                    .col(ColumnDef::new(Menus::Price).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Menus::PromoPrice).decimal_len(12, 2))
                    .col(
                        ColumnDef::new(Menus::IsPromo)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Menus::ImageUrl).text())
                    .col(
                        ColumnDef::new(Menus::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Menus::TrackStock)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Menus::StockQty).integer())
                    .col(ColumnDef::new(Menus::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Menus::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Menus::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Menus::Table, Menus::MerchantId)
                            .to(Merchants::Table, Merchants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Menus::Table, Menus::CategoryId)
                            .to(MenuCategories::Table, MenuCategories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Menus::Table)
                    .col(Menus::MerchantId)
                    .name("idx_menus_merchant_id")
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MenuCategoryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MenuCategoryItems::MenuId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MenuCategoryItems::CategoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MenuCategoryItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(MenuCategoryItems::MenuId)
                            .col(MenuCategoryItems::CategoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MenuCategoryItems::Table, MenuCategoryItems::MenuId)
                            .to(Menus::Table, Menus::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MenuCategoryItems::Table, MenuCategoryItems::CategoryId)
                            .to(MenuCategories::Table, MenuCategories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AddonCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AddonCategories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AddonCategories::MerchantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AddonCategories::Name).string().not_null())
                    .col(ColumnDef::new(AddonCategories::Description).text())
                    .col(
                        ColumnDef::new(AddonCategories::MinSelection)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(AddonCategories::MaxSelection).integer())
                    .col(
                        ColumnDef::new(AddonCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(AddonCategories::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AddonCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AddonCategories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AddonCategories::Table, AddonCategories::MerchantId)
                            .to(Merchants::Table, Merchants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AddonItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AddonItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AddonItems::AddonCategoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AddonItems::Name).string().not_null())
                    .col(ColumnDef::new(AddonItems::Description).text())
                    .col(
                        ColumnDef::new(AddonItems::Price)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AddonItems::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AddonItems::TrackStock)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(AddonItems::StockQty).integer())
                    .col(ColumnDef::new(AddonItems::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AddonItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AddonItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AddonItems::Table, AddonItems::AddonCategoryId)
                            .to(AddonCategories::Table, AddonCategories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MenuAddonCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MenuAddonCategories::MenuId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MenuAddonCategories::AddonCategoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MenuAddonCategories::IsRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(MenuAddonCategories::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MenuAddonCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(MenuAddonCategories::MenuId)
                            .col(MenuAddonCategories::AddonCategoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MenuAddonCategories::Table, MenuAddonCategories::MenuId)
                            .to(Menus::Table, Menus::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                MenuAddonCategories::Table,
                                MenuAddonCategories::AddonCategoryId,
                            )
                            .to(AddonCategories::Table, AddonCategories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MenuAddonCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AddonItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AddonCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MenuCategoryItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Menus::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MenuCategories::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MenuCategories {
    Table,
    Id,
    MerchantId,
    Name,
    Description,
    SortOrder,
    IsActive,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Menus {
    Table,
    Id,
    MerchantId,
    CategoryId,
    Name,
    Description,
    Price,
    PromoPrice,
    IsPromo,
    ImageUrl,
    IsActive,
    TrackStock,
    StockQty,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum MenuCategoryItems {
    Table,
    MenuId,
    CategoryId,
    CreatedAt,
}

#[derive(Iden)]
enum AddonCategories {
    Table,
    Id,
    MerchantId,
    Name,
    Description,
    MinSelection,
    MaxSelection,
    IsActive,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AddonItems {
    Table,
    Id,
    AddonCategoryId,
    Name,
    Description,
    Price,
    IsActive,
    TrackStock,
    StockQty,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum MenuAddonCategories {
    Table,
    MenuId,
    AddonCategoryId,
    IsRequired,
    DisplayOrder,
    CreatedAt,
}

#[derive(Iden)]
enum Merchants {
    Table,
    Id,
}
