use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Merchants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Merchants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Merchants::Code)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Merchants::Name).string().not_null())
                    .col(ColumnDef::new(Merchants::Description).text())
                    .col(ColumnDef::new(Merchants::Address).text())
                    .col(ColumnDef::new(Merchants::Phone).string())
                    .col(ColumnDef::new(Merchants::Email).string())
                    .col(
                        ColumnDef::new(Merchants::Currency)
                            .string_len(3)
                            .not_null()
                            .default("AUD"),
                    )
                    .col(
                        ColumnDef::new(Merchants::TaxRate)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Merchants::TaxIncluded)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Merchants::ServiceChargeRate)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Merchants::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Merchants::IsOpen)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Merchants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Merchants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MerchantUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MerchantUsers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MerchantUsers::MerchantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MerchantUsers::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(MerchantUsers::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(MerchantUsers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MerchantUsers::Table, MerchantUsers::MerchantId)
                            .to(Merchants::Table, Merchants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MerchantUsers::Table, MerchantUsers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(MerchantUsers::Table)
                    .col(MerchantUsers::MerchantId)
                    .name("idx_merchant_users_merchant_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MerchantUsers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Merchants::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Merchants {
    Table,
    Id,
    Code,
    Name,
    Description,
    Address,
    Phone,
    Email,
    Currency,
    TaxRate,
    TaxIncluded,
    ServiceChargeRate,
    IsActive,
    IsOpen,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum MerchantUsers {
    Table,
    Id,
    MerchantId,
    UserId,
    Role,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
