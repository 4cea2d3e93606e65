//! sea-orm entities for the Tabletop API database.

pub mod addon_categories;
pub mod addon_items;
pub mod menu_addon_categories;
pub mod menu_categories;
pub mod menu_category_items;
pub mod menus;
pub mod merchant_users;
pub mod merchants;
pub mod order_item_addons;
pub mod order_items;
pub mod order_status_history;
pub mod orders;
pub mod user_sessions;
pub mod users;
