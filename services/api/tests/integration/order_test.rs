use tabletop_api::domain::types::OrderDetail;
use tabletop_api::error::ApiError;
use tabletop_api::usecase::auth_context::MerchantScope;
use tabletop_api::usecase::customer::CustomerOrdersUseCase;
use tabletop_api::usecase::order::{
    GetMerchantOrderUseCase, GetOrderByNumberUseCase, ListMerchantOrdersUseCase, OrderLineInput,
    PlaceOrderInput, PlaceOrderUseCase, UpdateOrderStatusUseCase,
};
use tabletop_api::usecase::revenue::{RevenueData, RevenueKind, RevenueQuery, RevenueUseCase};
use tabletop_domain::order::{OrderStatus, OrderType};
use tabletop_domain::pagination::PageRequest;
use tabletop_domain::role::UserRole;

use crate::helpers::{MemoryStore, merchant_fixture, money, staff_scope};

fn line(menu_id: i64, quantity: i64, selected_addons: Vec<i64>) -> OrderLineInput {
    OrderLineInput {
        menu_id,
        quantity,
        selected_addons,
        notes: None,
    }
}

fn order_input(code: &str, items: Vec<OrderLineInput>) -> PlaceOrderInput {
    PlaceOrderInput {
        merchant_code: code.to_owned(),
        order_type: OrderType::Takeaway.as_str().to_owned(),
        table_number: None,
        customer_name: "Cass".to_owned(),
        customer_email: "cass@example.com".to_owned(),
        customer_phone: None,
        notes: None,
        items,
    }
}

async fn place(store: &MemoryStore, input: PlaceOrderInput) -> Result<OrderDetail, ApiError> {
    PlaceOrderUseCase {
        merchants: store.clone(),
        menus: store.clone(),
        addons: store.clone(),
        users: store.clone(),
        orders: store.clone(),
    }
    .execute(input)
    .await
}

async fn set_status(
    store: &MemoryStore,
    scope: &MerchantScope,
    order_id: i64,
    status: OrderStatus,
) -> Result<(), ApiError> {
    UpdateOrderStatusUseCase {
        orders: store.clone(),
    }
    .execute(scope, order_id, status, None)
    .await
    .map(|_| ())
}

/// Latte (promo 4.00, optional milk addon) and Toast (5.00) at a 10% tax, 5% service merchant.
struct Cafe {
    store: MemoryStore,
    scope: MerchantScope,
    merchant_id: i64,
    latte: i64,
    toast: i64,
    milk: i64,
    oat: i64,
}

fn cafe(tax_included: bool) -> Cafe {
    let store = MemoryStore::new();
    let fixture = merchant_fixture(&store, "KOPI01");
    let merchant_id = fixture.merchant.id;
    store.update_merchant_row(merchant_id, |m| {
        m.tax_rate = money("10");
        m.tax_included = tax_included;
        m.service_charge_rate = money("5");
    });

    let latte = store.seed_menu(merchant_id, "Latte", "4.50");
    store.update_menu_row(latte.id, |m| {
        m.promo_price = Some(money("4.00"));
        m.is_promo = true;
    });
    let toast = store.seed_menu(merchant_id, "Toast", "5.00");
    let milk = store.seed_addon_category(merchant_id, "Milk", 0, Some(1));
    let oat = store.seed_addon_item(milk.id, "Oat", "0.80");
    store.seed_link(latte.id, milk.id, false);

    Cafe {
        store,
        scope: fixture.scope,
        merchant_id,
        latte: latte.id,
        toast: toast.id,
        milk: milk.id,
        oat: oat.id,
    }
}

// ── Pricing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_price_order_with_promo_addons_tax_and_service_fee() {
    let c = cafe(false);

    let detail = place(
        &c.store,
        order_input(
            "kopi01",
            vec![line(c.latte, 2, vec![c.oat]), line(c.toast, 1, vec![])],
        ),
    )
    .await
    .unwrap();

    let order = &detail.order;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal, money("14.60"));
    assert_eq!(order.tax_amount, money("1.46"));
    assert_eq!(order.service_fee_amount, money("0.73"));
    assert_eq!(order.total_amount, money("16.79"));

    let latte = detail.items.iter().find(|i| i.menu_id == c.latte).unwrap();
    assert_eq!(latte.unit_price, money("4.00"));
    assert_eq!(latte.subtotal, money("9.60"));
    assert_eq!(latte.addons.len(), 1);
    assert_eq!(latte.addons[0].quantity, 2);
    assert_eq!(latte.addons[0].subtotal, money("1.60"));

    assert_eq!(detail.history.len(), 1);
    assert_eq!(detail.history[0].from_status, None);
    assert_eq!(detail.history[0].to_status, OrderStatus::Pending);
}

#[tokio::test]
async fn should_extract_included_tax_without_adding_it() {
    let c = cafe(true);

    let detail = place(
        &c.store,
        order_input(
            "KOPI01",
            vec![line(c.latte, 2, vec![c.oat]), line(c.toast, 1, vec![])],
        ),
    )
    .await
    .unwrap();

    assert_eq!(detail.order.subtotal, money("14.60"));
    assert_eq!(detail.order.tax_amount, money("1.33"));
    assert_eq!(detail.order.total_amount, money("15.33"));
}

#[tokio::test]
async fn should_ignore_repeated_addon_ids() {
    let c = cafe(false);

    let detail = place(
        &c.store,
        order_input("KOPI01", vec![line(c.latte, 1, vec![c.oat, c.oat])]),
    )
    .await
    .unwrap();

    assert_eq!(detail.items[0].addons.len(), 1);
    assert_eq!(detail.items[0].subtotal, money("4.80"));
}

#[tokio::test]
async fn should_assign_merchant_prefixed_order_number() {
    let c = cafe(false);

    let detail = place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])]))
        .await
        .unwrap();

    let number = &detail.order.order_number;
    let parts: Vec<&str> = number.split('-').collect();
    assert_eq!(parts.len(), 3, "unexpected order number {number}");
    assert_eq!(parts[0], "KOPI01");
    assert_eq!(parts[1].len(), 6);
    assert_eq!(parts[2].len(), 6);
    assert!(parts[2].chars().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit()));

    let found = GetOrderByNumberUseCase {
        orders: c.store.clone(),
    }
    .execute(number)
    .await
    .unwrap();
    assert_eq!(found.order.id, detail.order.id);
}

#[tokio::test]
async fn should_retry_order_number_taken_by_concurrent_insert() {
    let c = cafe(false);
    c.store.tables().order_number_collisions = 2;

    let detail = place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])]))
        .await
        .unwrap();
    assert!(detail.order.order_number.starts_with("KOPI01-"));
    assert_eq!(c.store.order_count(), 1);
}

#[tokio::test]
async fn should_give_up_after_repeated_order_number_collisions() {
    let c = cafe(false);
    c.store.tables().order_number_collisions = 3;

    let result = place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])])).await;
    assert!(
        matches!(result, Err(ApiError::Internal(_))),
        "expected Internal, got {result:?}"
    );
    assert_eq!(c.store.order_count(), 0);
}

// ── Checkout validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_checkout_at_closed_or_inactive_merchant() {
    let c = cafe(false);

    c.store.update_merchant_row(c.merchant_id, |m| m.is_open = false);
    let result = place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])])).await;
    assert!(matches!(result, Err(ApiError::MerchantClosed)), "got {result:?}");

    c.store.update_merchant_row(c.merchant_id, |m| m.is_active = false);
    let result = place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])])).await;
    assert!(matches!(result, Err(ApiError::MerchantInactive)), "got {result:?}");

    let result = place(&c.store, order_input("NOPE99", vec![line(c.toast, 1, vec![])])).await;
    assert!(matches!(result, Err(ApiError::MerchantInactive)), "got {result:?}");
    assert_eq!(c.store.order_count(), 0);
}

#[tokio::test]
async fn should_validate_order_shape() {
    let c = cafe(false);

    let result = place(&c.store, order_input("KOPI01", vec![])).await;
    assert!(matches!(result, Err(ApiError::Validation(_))), "got {result:?}");

    let result = place(&c.store, order_input("KOPI01", vec![line(c.toast, 0, vec![])])).await;
    assert!(matches!(result, Err(ApiError::Validation(_))), "got {result:?}");

    let result = place(&c.store, order_input("KOPI01", vec![line(c.toast, 100, vec![])])).await;
    assert!(matches!(result, Err(ApiError::Validation(_))), "got {result:?}");

    let mut input = order_input("KOPI01", vec![line(c.toast, 1, vec![])]);
    input.order_type = "DELIVERY".to_owned();
    let result = place(&c.store, input).await;
    assert!(matches!(result, Err(ApiError::Validation(_))), "got {result:?}");

    let mut input = order_input("KOPI01", vec![line(c.toast, 1, vec![])]);
    input.customer_email = "not-an-email".to_owned();
    let result = place(&c.store, input).await;
    assert!(matches!(result, Err(ApiError::InvalidEmail)), "got {result:?}");
}

#[tokio::test]
async fn should_reject_menu_of_another_merchant() {
    let c = cafe(false);
    let other = merchant_fixture(&c.store, "TACO01");
    let taco = c.store.seed_menu(other.merchant.id, "Al Pastor", "6.00");

    let result = place(&c.store, order_input("KOPI01", vec![line(taco.id, 1, vec![])])).await;
    assert!(
        matches!(result, Err(ApiError::MenuNotAvailable(id)) if id == taco.id),
        "got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_addon_not_offered_on_menu() {
    let c = cafe(false);

    let result = place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![c.oat])])).await;
    assert!(
        matches!(result, Err(ApiError::AddonNotAvailable(id)) if id == c.oat),
        "got {result:?}"
    );
}

#[tokio::test]
async fn should_enforce_required_addon_selection() {
    let c = cafe(false);
    c.store.tables().addon_links.iter_mut().for_each(|l| {
        if l.addon_category_id == c.milk {
            l.is_required = true;
        }
    });

    let result = place(&c.store, order_input("KOPI01", vec![line(c.latte, 1, vec![])])).await;
    assert!(
        matches!(&result, Err(ApiError::AddonSelectionInvalid(name)) if name == "Milk"),
        "got {result:?}"
    );

    let skim = c.store.seed_addon_item(c.milk, "Skim", "0.00");
    let result = place(
        &c.store,
        order_input("KOPI01", vec![line(c.latte, 1, vec![c.oat, skim.id])]),
    )
    .await;
    assert!(
        matches!(&result, Err(ApiError::AddonSelectionInvalid(name)) if name == "Milk"),
        "got {result:?}"
    );
}

// ── Customers ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_register_customer_at_checkout_and_list_their_orders() {
    let c = cafe(false);

    let first = place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])]))
        .await
        .unwrap();
    let second = place(&c.store, order_input("KOPI01", vec![line(c.latte, 1, vec![])]))
        .await
        .unwrap();

    let customer = c.store.user_by_email("cass@example.com").unwrap();
    assert_eq!(customer.role, UserRole::Customer);
    assert!(customer.password_hash.is_none());
    assert_eq!(first.order.customer_id, Some(customer.id));
    assert_eq!(second.order.customer_id, Some(customer.id));

    let orders = CustomerOrdersUseCase {
        orders: c.store.clone(),
    }
    .execute(customer.id)
    .await
    .unwrap();
    assert_eq!(orders.len(), 2);
}

#[tokio::test]
async fn should_place_staff_email_order_as_guest() {
    let c = cafe(false);
    let mut input = order_input("KOPI01", vec![line(c.toast, 1, vec![])]);
    input.customer_email = "owner@kopi01.example.com".to_owned();

    let detail = place(&c.store, input).await.unwrap();
    assert_eq!(detail.order.customer_id, None);
    assert_eq!(detail.order.customer_email, "owner@kopi01.example.com");
}

// ── Stock ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_order_beyond_stock_without_side_effects() {
    let c = cafe(false);
    c.store.update_menu_row(c.toast, |m| {
        m.track_stock = true;
        m.stock_qty = Some(5);
    });
    c.store.update_menu_row(c.latte, |m| {
        m.track_stock = true;
        m.stock_qty = Some(1);
    });

    let result = place(
        &c.store,
        order_input(
            "KOPI01",
            vec![line(c.toast, 2, vec![]), line(c.latte, 2, vec![])],
        ),
    )
    .await;
    assert!(
        matches!(&result, Err(ApiError::InsufficientStock(name)) if name == "Latte"),
        "got {result:?}"
    );
    assert_eq!(c.store.menu(c.toast).stock_qty, Some(5));
    assert_eq!(c.store.menu(c.latte).stock_qty, Some(1));
    assert_eq!(c.store.order_count(), 0);
}

#[tokio::test]
async fn should_decrement_and_restore_stock_on_cancel() {
    let c = cafe(false);
    c.store.update_menu_row(c.latte, |m| {
        m.track_stock = true;
        m.stock_qty = Some(5);
    });
    c.store.update_addon_item_row(c.oat, |i| {
        i.track_stock = true;
        i.stock_qty = Some(4);
    });

    let detail = place(&c.store, order_input("KOPI01", vec![line(c.latte, 3, vec![c.oat])]))
        .await
        .unwrap();
    assert_eq!(c.store.menu(c.latte).stock_qty, Some(2));
    assert_eq!(c.store.addon_item(c.oat).stock_qty, Some(1));

    set_status(&c.store, &c.scope, detail.order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(c.store.menu(c.latte).stock_qty, Some(5));
    assert_eq!(c.store.addon_item(c.oat).stock_qty, Some(4));
}

#[tokio::test]
async fn should_only_restore_stock_the_order_took() {
    let c = cafe(false);
    c.store.update_menu_row(c.latte, |m| {
        m.track_stock = true;
        m.stock_qty = Some(5);
    });

    let detail = place(
        &c.store,
        order_input(
            "KOPI01",
            vec![line(c.latte, 1, vec![c.oat]), line(c.toast, 3, vec![])],
        ),
    )
    .await
    .unwrap();
    assert_eq!(c.store.menu(c.latte).stock_qty, Some(4));

    // Tracking switched on after the order was placed.
    c.store.update_menu_row(c.toast, |m| {
        m.track_stock = true;
        m.stock_qty = Some(10);
    });
    c.store.update_addon_item_row(c.oat, |i| {
        i.track_stock = true;
        i.stock_qty = Some(6);
    });

    set_status(&c.store, &c.scope, detail.order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(c.store.menu(c.latte).stock_qty, Some(5));
    assert_eq!(c.store.menu(c.toast).stock_qty, Some(10));
    assert_eq!(c.store.addon_item(c.oat).stock_qty, Some(6));
}

// ── Status lifecycle ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_walk_order_through_lifecycle() {
    let c = cafe(false);
    let staff = staff_scope(&c.store, c.merchant_id);
    let detail = place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])]))
        .await
        .unwrap();
    let id = detail.order.id;

    let result = set_status(&c.store, &staff, id, OrderStatus::Ready).await;
    assert!(
        matches!(result, Err(ApiError::InvalidStatusTransition { .. })),
        "got {result:?}"
    );

    for status in [
        OrderStatus::Accepted,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ] {
        set_status(&c.store, &staff, id, status).await.unwrap();
    }

    let detail = GetMerchantOrderUseCase {
        orders: c.store.clone(),
    }
    .execute(&staff, id)
    .await
    .unwrap();
    assert_eq!(detail.order.status, OrderStatus::Completed);
    assert!(detail.order.completed_at.is_some());
    assert_eq!(detail.history.len(), 5);
    assert_eq!(detail.history[4].from_status, Some(OrderStatus::Ready));
    assert_eq!(detail.history[4].changed_by_user_id, Some(staff.ctx.user_id));

    let result = set_status(&c.store, &staff, id, OrderStatus::Cancelled).await;
    assert!(
        matches!(result, Err(ApiError::InvalidStatusTransition { .. })),
        "got {result:?}"
    );
}

#[tokio::test]
async fn should_not_touch_orders_of_another_merchant() {
    let c = cafe(false);
    let other = merchant_fixture(&c.store, "TACO01");
    let detail = place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])]))
        .await
        .unwrap();

    let result = set_status(&c.store, &other.scope, detail.order.id, OrderStatus::Accepted).await;
    assert!(matches!(result, Err(ApiError::OrderNotFound)), "got {result:?}");

    let page = ListMerchantOrdersUseCase {
        orders: c.store.clone(),
    }
    .execute(&other.scope, None, PageRequest::default())
    .await
    .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.meta.total, 0);
}

#[tokio::test]
async fn should_filter_merchant_orders_by_status() {
    let c = cafe(false);
    let first = place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])]))
        .await
        .unwrap();
    place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])]))
        .await
        .unwrap();
    set_status(&c.store, &c.scope, first.order.id, OrderStatus::Accepted)
        .await
        .unwrap();

    let usecase = ListMerchantOrdersUseCase {
        orders: c.store.clone(),
    };
    let accepted = usecase
        .execute(&c.scope, Some(OrderStatus::Accepted), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(accepted.meta.total, 1);
    assert_eq!(accepted.items[0].id, first.order.id);

    let all = usecase
        .execute(&c.scope, None, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.meta.total, 2);
}

// ── Revenue ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_count_only_completed_orders_in_revenue() {
    let c = cafe(false);
    let done = place(&c.store, order_input("KOPI01", vec![line(c.toast, 2, vec![])]))
        .await
        .unwrap();
    place(&c.store, order_input("KOPI01", vec![line(c.toast, 1, vec![])]))
        .await
        .unwrap();
    for status in [
        OrderStatus::Accepted,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ] {
        set_status(&c.store, &c.scope, done.order.id, status).await.unwrap();
    }

    let usecase = RevenueUseCase {
        orders: c.store.clone(),
    };
    let report = usecase
        .execute(&c.scope, RevenueQuery::default())
        .await
        .unwrap();
    match report.data {
        RevenueData::Total(totals) => {
            assert_eq!(totals.total_orders, 1);
            assert_eq!(totals.total_revenue, done.order.total_amount);
            assert_eq!(totals.average_order_value, done.order.total_amount);
        }
        other => panic!("expected total report, got {other:?}"),
    }

    let report = usecase
        .execute(
            &c.scope,
            RevenueQuery {
                kind: RevenueKind::Daily,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    match report.data {
        RevenueData::Daily(days) => {
            assert_eq!(days.len(), 1);
            assert_eq!(days[0].date, done.order.placed_at.date_naive());
            assert_eq!(days[0].total_orders, 1);
        }
        other => panic!("expected daily report, got {other:?}"),
    }
}

#[tokio::test]
async fn should_report_revenue_from_tax_included_totals() {
    let c = cafe(true);
    let toasts = place(&c.store, order_input("KOPI01", vec![line(c.toast, 2, vec![])]))
        .await
        .unwrap();
    let latte = place(&c.store, order_input("KOPI01", vec![line(c.latte, 1, vec![])]))
        .await
        .unwrap();
    // 10.00 + 5% service, tax contained in the price
    assert_eq!(toasts.order.tax_amount, money("0.91"));
    assert_eq!(toasts.order.total_amount, money("10.50"));
    assert_eq!(latte.order.total_amount, money("4.20"));

    for id in [toasts.order.id, latte.order.id] {
        for status in [
            OrderStatus::Accepted,
            OrderStatus::InProgress,
            OrderStatus::Ready,
            OrderStatus::Completed,
        ] {
            set_status(&c.store, &c.scope, id, status).await.unwrap();
        }
    }

    let report = RevenueUseCase {
        orders: c.store.clone(),
    }
    .execute(&c.scope, RevenueQuery::default())
    .await
    .unwrap();
    match report.data {
        RevenueData::Total(totals) => {
            assert_eq!(totals.total_orders, 2);
            assert_eq!(totals.total_revenue, money("14.70"));
            assert_eq!(totals.average_order_value, money("7.35"));
        }
        other => panic!("expected total report, got {other:?}"),
    }
}
