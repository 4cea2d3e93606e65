use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionError,
    TransactionTrait, sea_query::Expr,
};

use tabletop_api_schema::{
    addon_items, menus, order_item_addons, order_items, order_status_history, orders,
};
use tabletop_domain::order::OrderStatus;
use tabletop_domain::pagination::PageRequest;

use crate::domain::repository::OrderRepository;
use crate::domain::types::{
    NewOrder, Order, OrderDetail, OrderItem, OrderItemAddon, RevenueEntry, StatusChange,
    StatusUpdate,
};
use crate::error::ApiError;

/// Failure inside an order transaction.
#[derive(Debug, thiserror::Error)]
enum OrderTxError {
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error("insufficient stock for {0}")]
    OutOfStock(String),
    #[error("order status changed concurrently")]
    StatusChanged,
}

fn tx_error(err: TransactionError<OrderTxError>, context: &'static str) -> OrderTxError {
    match err {
        TransactionError::Connection(e) => OrderTxError::Db(e),
        TransactionError::Transaction(e) => {
            if let OrderTxError::Db(ref db) = e {
                tracing::debug!(error = %db, context, "order transaction failed");
            }
            e
        }
    }
}

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

impl OrderRepository for DbOrderRepository {
    async fn create(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let order = order.clone();
        let result = self
            .db
            .transaction::<_, orders::Model, OrderTxError>(|txn| {
                Box::pin(async move {
                    let model = orders::ActiveModel {
                        merchant_id: Set(order.merchant_id),
                        customer_id: Set(order.customer_id),
                        order_number: Set(order.order_number.clone()),
                        order_type: Set(order.order_type.as_str().to_owned()),
                        table_number: Set(order.table_number.clone()),
                        status: Set(OrderStatus::Pending.as_str().to_owned()),
                        customer_name: Set(order.customer_name.clone()),
                        customer_email: Set(order.customer_email.clone()),
                        customer_phone: Set(order.customer_phone.clone()),
                        notes: Set(order.notes.clone()),
                        subtotal: Set(order.totals.subtotal),
                        tax_amount: Set(order.totals.tax_amount),
                        service_fee_amount: Set(order.totals.service_fee_amount),
                        total_amount: Set(order.totals.total_amount),
                        placed_at: Set(order.placed_at),
                        updated_at: Set(order.placed_at),
                        completed_at: Set(None),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    for item in &order.items {
                        let quantity = i32::try_from(item.quantity).unwrap_or(i32::MAX);
                        if item.track_stock {
                            take_menu_stock(txn, item.menu_id, quantity, &item.menu_name).await?;
                        }
                        let item_model = order_items::ActiveModel {
                            order_id: Set(model.id),
                            menu_id: Set(item.menu_id),
                            menu_name: Set(item.menu_name.clone()),
                            unit_price: Set(item.unit_price),
                            quantity: Set(quantity),
                            subtotal: Set(item.subtotal),
                            notes: Set(item.notes.clone()),
                            stock_taken: Set(item.track_stock),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;

                        for addon in &item.addons {
                            let addon_quantity = i32::try_from(addon.quantity).unwrap_or(i32::MAX);
                            if addon.track_stock {
                                take_addon_stock(
                                    txn,
                                    addon.addon_item_id,
                                    addon_quantity,
                                    &addon.addon_name,
                                )
                                .await?;
                            }
                            order_item_addons::ActiveModel {
                                order_item_id: Set(item_model.id),
                                addon_item_id: Set(addon.addon_item_id),
                                addon_name: Set(addon.addon_name.clone()),
                                unit_price: Set(addon.unit_price),
                                quantity: Set(addon_quantity),
                                subtotal: Set(addon.subtotal),
                                stock_taken: Set(addon.track_stock),
                                ..Default::default()
                            }
                            .insert(txn)
                            .await?;
                        }
                    }

                    order_status_history::ActiveModel {
                        order_id: Set(model.id),
                        from_status: Set(None),
                        to_status: Set(OrderStatus::Pending.as_str().to_owned()),
                        note: Set(Some("Order placed".to_owned())),
                        changed_by_user_id: Set(None),
                        created_at: Set(order.placed_at),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(model)
                })
            })
            .await;

        match result.map_err(|e| tx_error(e, "create order")) {
            Ok(model) => Ok(order_from_model(model)?),
            Err(OrderTxError::OutOfStock(name)) => Err(ApiError::InsufficientStock(name)),
            // `orders.order_number` is the only unique index an order insert can hit.
            Err(OrderTxError::Db(e))
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                Err(ApiError::OrderNumberTaken)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create order").into()),
        }
    }

    async fn find_by_number(&self, order_number: &str) -> Result<Option<OrderDetail>, ApiError> {
        let model = orders::Entity::find()
            .filter(orders::Column::OrderNumber.eq(order_number))
            .one(&self.db)
            .await
            .context("find order by number")?;
        match model {
            Some(model) => Ok(Some(self.load_detail(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_for_merchant(
        &self,
        merchant_id: i64,
        id: i64,
    ) -> Result<Option<OrderDetail>, ApiError> {
        let model = orders::Entity::find_by_id(id)
            .filter(orders::Column::MerchantId.eq(merchant_id))
            .one(&self.db)
            .await
            .context("find merchant order")?;
        match model {
            Some(model) => Ok(Some(self.load_detail(model).await?)),
            None => Ok(None),
        }
    }

    async fn list_for_merchant(
        &self,
        merchant_id: i64,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64), ApiError> {
        let page = page.clamped();
        let mut query = orders::Entity::find().filter(orders::Column::MerchantId.eq(merchant_id));
        if let Some(status) = status {
            query = query.filter(orders::Column::Status.eq(status.as_str()));
        }
        let total = query
            .clone()
            .count(&self.db)
            .await
            .context("count merchant orders")?;
        let models = query
            .order_by_desc(orders::Column::PlacedAt)
            .order_by_desc(orders::Column::Id)
            .offset(page.offset())
            .limit(u64::from(page.limit))
            .all(&self.db)
            .await
            .context("list merchant orders")?;
        let orders = models
            .into_iter()
            .map(order_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((orders, total))
    }

    async fn list_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, ApiError> {
        let models = orders::Entity::find()
            .filter(orders::Column::CustomerId.eq(customer_id))
            .order_by_desc(orders::Column::PlacedAt)
            .order_by_desc(orders::Column::Id)
            .all(&self.db)
            .await
            .context("list customer orders")?;
        let orders = models
            .into_iter()
            .map(order_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(orders)
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<Order, ApiError> {
        let update = update.clone();
        let (from, to) = (update.from, update.to);
        let result = self
            .db
            .transaction::<_, orders::Model, OrderTxError>(|txn| {
                Box::pin(async move {
                    let mut query = orders::Entity::update_many()
                        .col_expr(orders::Column::Status, Expr::value(update.to.as_str()))
                        .col_expr(orders::Column::UpdatedAt, Expr::value(update.at))
                        .filter(orders::Column::Id.eq(update.order_id))
                        .filter(orders::Column::Status.eq(update.from.as_str()));
                    if update.to == OrderStatus::Completed {
                        query = query.col_expr(orders::Column::CompletedAt, Expr::value(update.at));
                    }
                    let changed = query.exec(txn).await?;
                    if changed.rows_affected == 0 {
                        return Err(OrderTxError::StatusChanged);
                    }

                    order_status_history::ActiveModel {
                        order_id: Set(update.order_id),
                        from_status: Set(Some(update.from.as_str().to_owned())),
                        to_status: Set(update.to.as_str().to_owned()),
                        note: Set(update.note.clone()),
                        changed_by_user_id: Set(Some(update.changed_by)),
                        created_at: Set(update.at),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    if update.to == OrderStatus::Cancelled {
                        restore_stock(txn, update.order_id).await?;
                    }

                    let model = orders::Entity::find_by_id(update.order_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| DbErr::RecordNotFound("order".to_owned()))?;
                    Ok(model)
                })
            })
            .await;

        match result.map_err(|e| tx_error(e, "update order status")) {
            Ok(model) => Ok(order_from_model(model)?),
            Err(OrderTxError::StatusChanged) => Err(ApiError::InvalidStatusTransition {
                from: from.to_string(),
                to: to.to_string(),
            }),
            Err(e) => Err(anyhow::Error::new(e).context("update order status").into()),
        }
    }

    async fn completed_between(
        &self,
        merchant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RevenueEntry>, ApiError> {
        let models = orders::Entity::find()
            .filter(orders::Column::MerchantId.eq(merchant_id))
            .filter(orders::Column::Status.eq(OrderStatus::Completed.as_str()))
            .filter(orders::Column::PlacedAt.between(from, to))
            .order_by_asc(orders::Column::PlacedAt)
            .all(&self.db)
            .await
            .context("list completed orders")?;
        Ok(models
            .into_iter()
            .map(|m| RevenueEntry {
                placed_at: m.placed_at,
                total_amount: m.total_amount,
            })
            .collect())
    }
}

impl DbOrderRepository {
    async fn load_detail(&self, model: orders::Model) -> Result<OrderDetail, ApiError> {
        let item_models = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(model.id))
            .order_by_asc(order_items::Column::Id)
            .all(&self.db)
            .await
            .context("list order items")?;

        let item_ids: Vec<i64> = item_models.iter().map(|i| i.id).collect();
        let addon_models = if item_ids.is_empty() {
            vec![]
        } else {
            order_item_addons::Entity::find()
                .filter(order_item_addons::Column::OrderItemId.is_in(item_ids))
                .order_by_asc(order_item_addons::Column::Id)
                .all(&self.db)
                .await
                .context("list order item addons")?
        };

        let history_models = order_status_history::Entity::find()
            .filter(order_status_history::Column::OrderId.eq(model.id))
            .order_by_asc(order_status_history::Column::CreatedAt)
            .order_by_asc(order_status_history::Column::Id)
            .all(&self.db)
            .await
            .context("list order status history")?;

        let items = item_models
            .into_iter()
            .map(|item| OrderItem {
                addons: addon_models
                    .iter()
                    .filter(|a| a.order_item_id == item.id)
                    .map(|a| OrderItemAddon {
                        id: a.id,
                        order_item_id: a.order_item_id,
                        addon_item_id: a.addon_item_id,
                        addon_name: a.addon_name.clone(),
                        unit_price: a.unit_price,
                        quantity: a.quantity,
                        subtotal: a.subtotal,
                        stock_taken: a.stock_taken,
                    })
                    .collect(),
                id: item.id,
                order_id: item.order_id,
                menu_id: item.menu_id,
                menu_name: item.menu_name,
                unit_price: item.unit_price,
                quantity: item.quantity,
                subtotal: item.subtotal,
                notes: item.notes,
                stock_taken: item.stock_taken,
            })
            .collect();

        let history = history_models
            .into_iter()
            .map(status_change_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(OrderDetail {
            order: order_from_model(model)?,
            items,
            history,
        })
    }
}

/// `stock_qty = stock_qty - n` only while at least `n` remain.
async fn take_menu_stock<C: ConnectionTrait>(
    conn: &C,
    menu_id: i64,
    quantity: i32,
    name: &str,
) -> Result<(), OrderTxError> {
    let result = menus::Entity::update_many()
        .col_expr(
            menus::Column::StockQty,
            Expr::col(menus::Column::StockQty).sub(quantity),
        )
        .filter(menus::Column::Id.eq(menu_id))
        .filter(menus::Column::StockQty.gte(quantity))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(OrderTxError::OutOfStock(name.to_owned()));
    }
    Ok(())
}

async fn take_addon_stock<C: ConnectionTrait>(
    conn: &C,
    addon_item_id: i64,
    quantity: i32,
    name: &str,
) -> Result<(), OrderTxError> {
    let result = addon_items::Entity::update_many()
        .col_expr(
            addon_items::Column::StockQty,
            Expr::col(addon_items::Column::StockQty).sub(quantity),
        )
        .filter(addon_items::Column::Id.eq(addon_item_id))
        .filter(addon_items::Column::StockQty.gte(quantity))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(OrderTxError::OutOfStock(name.to_owned()));
    }
    Ok(())
}

/// Give back the stock a cancelled order took. Lines placed while tracking was off
/// took nothing and are skipped, whatever the tracking flag says now.
async fn restore_stock<C: ConnectionTrait>(conn: &C, order_id: i64) -> Result<(), DbErr> {
    let items = order_items::Entity::find()
        .filter(order_items::Column::OrderId.eq(order_id))
        .all(conn)
        .await?;
    for item in items.iter().filter(|i| i.stock_taken) {
        menus::Entity::update_many()
            .col_expr(
                menus::Column::StockQty,
                Expr::col(menus::Column::StockQty).add(item.quantity),
            )
            .filter(menus::Column::Id.eq(item.menu_id))
            .filter(menus::Column::StockQty.is_not_null())
            .exec(conn)
            .await?;
    }

    let item_ids: Vec<i64> = items.iter().map(|i| i.id).collect();
    if item_ids.is_empty() {
        return Ok(());
    }
    let addons = order_item_addons::Entity::find()
        .filter(order_item_addons::Column::OrderItemId.is_in(item_ids))
        .filter(order_item_addons::Column::StockTaken.eq(true))
        .all(conn)
        .await?;
    for addon in &addons {
        addon_items::Entity::update_many()
            .col_expr(
                addon_items::Column::StockQty,
                Expr::col(addon_items::Column::StockQty).add(addon.quantity),
            )
            .filter(addon_items::Column::Id.eq(addon.addon_item_id))
            .filter(addon_items::Column::StockQty.is_not_null())
            .exec(conn)
            .await?;
    }
    Ok(())
}

fn order_from_model(model: orders::Model) -> anyhow::Result<Order> {
    Ok(Order {
        id: model.id,
        merchant_id: model.merchant_id,
        customer_id: model.customer_id,
        order_number: model.order_number,
        order_type: model.order_type.parse()?,
        table_number: model.table_number,
        status: model.status.parse()?,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        notes: model.notes,
        subtotal: model.subtotal,
        tax_amount: model.tax_amount,
        service_fee_amount: model.service_fee_amount,
        total_amount: model.total_amount,
        placed_at: model.placed_at,
        updated_at: model.updated_at,
        completed_at: model.completed_at,
    })
}

fn status_change_from_model(model: order_status_history::Model) -> anyhow::Result<StatusChange> {
    Ok(StatusChange {
        id: model.id,
        order_id: model.order_id,
        from_status: model.from_status.map(|s| s.parse()).transpose()?,
        to_status: model.to_status.parse()?,
        note: model.note,
        changed_by_user_id: model.changed_by_user_id,
        created_at: model.created_at,
    })
}
