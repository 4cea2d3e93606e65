use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;

use tabletop_core::health::healthz;
use tabletop_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    admin::{
        create_merchant, delete_user, get_merchant, get_user, list_merchants, list_users,
        toggle_merchant, update_merchant, update_user,
    },
    auth::{
        change_password, first_time_password, first_time_password_change, list_sessions, login,
        logout, logout_all, me, refresh, revoke_session,
    },
    catalog::{
        addon_category_relationships, create_addon_category, create_addon_item, create_category,
        create_menu, delete_addon_category, delete_addon_item, delete_category, delete_menu,
        get_menu, link_addon_category, list_addon_categories, list_addon_items, list_categories,
        list_menus, replace_menu_categories, unlink_addon_category, update_addon_category,
        update_addon_item, update_category, update_menu,
    },
    health::readyz,
    merchant::{get_profile, revenue, toggle_open, update_profile},
    orders::{get_order, list_orders, update_order_status},
    public::{
        customer_login, customer_orders, order_by_number, place_order, public_categories,
        public_menus, public_merchant,
    },
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Auth
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/logout-all", post(logout_all))
        .route("/api/auth/me", get(me))
        .route("/api/auth/sessions", get(list_sessions))
        .route("/api/auth/sessions/{session_id}", delete(revoke_session))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/first-time-password", post(first_time_password))
        .route(
            "/api/auth/first-time-password-change",
            post(first_time_password_change),
        )
        // Super admin
        .route("/api/admin/merchants", get(list_merchants))
        .route("/api/admin/merchants", post(create_merchant))
        .route("/api/admin/merchants/{id}", get(get_merchant))
        .route("/api/admin/merchants/{id}", put(update_merchant))
        .route("/api/admin/merchants/{id}/toggle", post(toggle_merchant))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}", get(get_user))
        .route("/api/admin/users/{id}", put(update_user))
        .route("/api/admin/users/{id}", delete(delete_user))
        // Merchant profile
        .route("/api/merchant/profile", get(get_profile))
        .route("/api/merchant/profile", put(update_profile))
        .route("/api/merchant/toggle-open", put(toggle_open))
        // Categories
        .route("/api/merchant/categories", get(list_categories))
        .route("/api/merchant/categories", post(create_category))
        .route("/api/merchant/categories/{id}", put(update_category))
        .route("/api/merchant/categories/{id}", delete(delete_category))
        // Menus
        .route("/api/merchant/menu", get(list_menus))
        .route("/api/merchant/menu", post(create_menu))
        .route("/api/merchant/menu/{id}", get(get_menu))
        .route("/api/merchant/menu/{id}", put(update_menu))
        .route("/api/merchant/menu/{id}", delete(delete_menu))
        .route(
            "/api/merchant/menu/{id}/categories",
            put(replace_menu_categories),
        )
        .route(
            "/api/merchant/menu/{id}/addon-categories",
            post(link_addon_category),
        )
        .route(
            "/api/merchant/menu/{id}/addon-categories/{addon_category_id}",
            delete(unlink_addon_category),
        )
        // Addon categories
        .route("/api/merchant/addon-categories", get(list_addon_categories))
        .route("/api/merchant/addon-categories", post(create_addon_category))
        .route(
            "/api/merchant/addon-categories/{id}",
            put(update_addon_category),
        )
        .route(
            "/api/merchant/addon-categories/{id}",
            delete(delete_addon_category),
        )
        .route(
            "/api/merchant/addon-categories/{id}/relationships",
            get(addon_category_relationships),
        )
        // Addon items
        .route("/api/merchant/addon-items", get(list_addon_items))
        .route("/api/merchant/addon-items", post(create_addon_item))
        .route("/api/merchant/addon-items/{id}", put(update_addon_item))
        .route("/api/merchant/addon-items/{id}", delete(delete_addon_item))
        // Orders
        .route("/api/merchant/orders", get(list_orders))
        .route("/api/merchant/orders/{id}", get(get_order))
        .route("/api/merchant/orders/{id}/status", put(update_order_status))
        // Revenue
        .route("/api/merchant/revenue", get(revenue))
        // Storefront
        .route("/api/public/auth/customer-login", post(customer_login))
        .route("/api/public/merchants/{code}", get(public_merchant))
        .route(
            "/api/public/merchants/{code}/categories",
            get(public_categories),
        )
        .route("/api/public/merchants/{code}/menus", get(public_menus))
        .route("/api/public/orders", post(place_order))
        .route("/api/public/orders/{order_number}", get(order_by_number))
        .route("/api/customer/orders", get(customer_orders))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
}
