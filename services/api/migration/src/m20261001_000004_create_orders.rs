use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::MerchantId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::CustomerId).big_integer())
                    .col(
                        ColumnDef::new(Orders::OrderNumber)
                            .string_len(40)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::OrderType).string_len(16).not_null())
                    .col(ColumnDef::new(Orders::TableNumber).string_len(32))
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Orders::CustomerName).string().not_null())
                    .col(ColumnDef::new(Orders::CustomerEmail).string().not_null())
                    .col(ColumnDef::new(Orders::CustomerPhone).string())
                    .col(ColumnDef::new(Orders::Notes).text())
                    .col(ColumnDef::new(Orders::Subtotal).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Orders::TaxAmount).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Orders::ServiceFeeAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::TotalAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::PlacedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Orders::CompletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Orders::Table, Orders::MerchantId)
                            .to(Merchants::Table, Merchants::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Orders::Table, Orders::CustomerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Orders::Table)
                    .col(Orders::MerchantId)
                    .col(Orders::Status)
                    .name("idx_orders_merchant_id_status")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Orders::Table)
                    .col(Orders::CustomerId)
                    .name("idx_orders_customer_id")
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderItems::OrderId).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::MenuId).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::MenuName).string().not_null())
                    .col(
                        ColumnDef::new(OrderItems::UnitPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(OrderItems::Subtotal)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItems::Notes).text())
                    .col(
                        ColumnDef::new(OrderItems::StockTaken)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItemAddons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItemAddons::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrderItemAddons::OrderItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItemAddons::AddonItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItemAddons::AddonName).string().not_null())
                    .col(
                        ColumnDef::new(OrderItemAddons::UnitPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItemAddons::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItemAddons::Subtotal)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItemAddons::StockTaken)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(OrderItemAddons::Table, OrderItemAddons::OrderItemId)
                            .to(OrderItems::Table, OrderItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderStatusHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderStatusHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrderStatusHistory::OrderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderStatusHistory::FromStatus).string_len(16))
                    .col(
                        ColumnDef::new(OrderStatusHistory::ToStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderStatusHistory::Note).text())
                    .col(ColumnDef::new(OrderStatusHistory::ChangedByUserId).big_integer())
                    .col(
                        ColumnDef::new(OrderStatusHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(OrderStatusHistory::Table, OrderStatusHistory::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(OrderStatusHistory::Table)
                    .col(OrderStatusHistory::OrderId)
                    .name("idx_order_status_history_order_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderStatusHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderItemAddons::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    MerchantId,
    CustomerId,
    OrderNumber,
    OrderType,
    TableNumber,
    Status,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    Notes,
    Subtotal,
    TaxAmount,
    ServiceFeeAmount,
    TotalAmount,
    PlacedAt,
    UpdatedAt,
    CompletedAt,
}

#[derive(Iden)]
enum OrderItems {
    Table,
    Id,
    OrderId,
    MenuId,
    MenuName,
    UnitPrice,
    Quantity,
    Subtotal,
    Notes,
    StockTaken,
}

#[derive(Iden)]
enum OrderItemAddons {
    Table,
    Id,
    OrderItemId,
    AddonItemId,
    AddonName,
    UnitPrice,
    Quantity,
    Subtotal,
    StockTaken,
}

#[derive(Iden)]
enum OrderStatusHistory {
    Table,
    Id,
    OrderId,
    FromStatus,
    ToStatus,
    Note,
    ChangedByUserId,
    CreatedAt,
}

#[derive(Iden)]
enum Merchants {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
