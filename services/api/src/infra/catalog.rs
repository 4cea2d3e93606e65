use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait, sea_query::OnConflict,
};

use tabletop_api_schema::{
    addon_categories, addon_items, menu_addon_categories, menu_categories, menu_category_items,
    menus,
};

use crate::domain::repository::{AddonRepository, CategoryRepository, MenuRepository};
use crate::domain::types::{
    AddonCategory, AddonCategoryPatch, AddonItem, AddonItemPatch, CategoryPatch, Menu,
    MenuAddonLink, MenuCategory, MenuPatch, NewAddonCategory, NewAddonItem, NewCategory, NewMenu,
};
use crate::error::ApiError;

// ── Category repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCategoryRepository {
    pub db: DatabaseConnection,
}

impl CategoryRepository for DbCategoryRepository {
    async fn list(
        &self,
        merchant_id: i64,
        active_only: bool,
    ) -> Result<Vec<MenuCategory>, ApiError> {
        let mut query = menu_categories::Entity::find()
            .filter(menu_categories::Column::MerchantId.eq(merchant_id))
            .filter(menu_categories::Column::DeletedAt.is_null());
        if active_only {
            query = query.filter(menu_categories::Column::IsActive.eq(true));
        }
        let models = query
            .order_by_asc(menu_categories::Column::SortOrder)
            .order_by_asc(menu_categories::Column::Name)
            .all(&self.db)
            .await
            .context("list menu categories")?;
        Ok(models.into_iter().map(category_from_model).collect())
    }

    async fn find(&self, merchant_id: i64, id: i64) -> Result<Option<MenuCategory>, ApiError> {
        let model = menu_categories::Entity::find_by_id(id)
            .filter(menu_categories::Column::MerchantId.eq(merchant_id))
            .filter(menu_categories::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find menu category")?;
        Ok(model.map(category_from_model))
    }

    async fn find_many(
        &self,
        merchant_id: i64,
        ids: &[i64],
    ) -> Result<Vec<MenuCategory>, ApiError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let models = menu_categories::Entity::find()
            .filter(menu_categories::Column::Id.is_in(ids.iter().copied()))
            .filter(menu_categories::Column::MerchantId.eq(merchant_id))
            .filter(menu_categories::Column::DeletedAt.is_null())
            .all(&self.db)
            .await
            .context("find menu categories")?;
        Ok(models.into_iter().map(category_from_model).collect())
    }

    async fn create(
        &self,
        merchant_id: i64,
        category: &NewCategory,
    ) -> Result<MenuCategory, ApiError> {
        let now = Utc::now();
        let model = menu_categories::ActiveModel {
            merchant_id: Set(merchant_id),
            name: Set(category.name.clone()),
            description: Set(category.description.clone()),
            sort_order: Set(category.sort_order),
            is_active: Set(true),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("create menu category")?;
        Ok(category_from_model(model))
    }

    async fn update(&self, id: i64, patch: &CategoryPatch) -> Result<MenuCategory, ApiError> {
        let mut am = menu_categories::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(name) = &patch.name {
            am.name = Set(name.clone());
        }
        if let Some(description) = &patch.description {
            am.description = Set(Some(description.clone()));
        }
        if let Some(sort_order) = patch.sort_order {
            am.sort_order = Set(sort_order);
        }
        if let Some(is_active) = patch.is_active {
            am.is_active = Set(is_active);
        }
        am.updated_at = Set(Utc::now());
        let model = am
            .update(&self.db)
            .await
            .context("update menu category")?;
        Ok(category_from_model(model))
    }

    async fn soft_delete(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError> {
        menu_categories::ActiveModel {
            id: Set(id),
            deleted_at: Set(Some(at)),
            updated_at: Set(at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("soft delete menu category")?;
        Ok(())
    }
}

fn category_from_model(model: menu_categories::Model) -> MenuCategory {
    MenuCategory {
        id: model.id,
        merchant_id: model.merchant_id,
        name: model.name,
        description: model.description,
        sort_order: model.sort_order,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Menu repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbMenuRepository {
    pub db: DatabaseConnection,
}

impl MenuRepository for DbMenuRepository {
    async fn list(&self, merchant_id: i64, active_only: bool) -> Result<Vec<Menu>, ApiError> {
        let mut query = menus::Entity::find()
            .filter(menus::Column::MerchantId.eq(merchant_id))
            .filter(menus::Column::DeletedAt.is_null());
        if active_only {
            query = query.filter(menus::Column::IsActive.eq(true));
        }
        let models = query
            .order_by_asc(menus::Column::Name)
            .all(&self.db)
            .await
            .context("list menus")?;
        Ok(models.into_iter().map(menu_from_model).collect())
    }

    async fn find(&self, merchant_id: i64, id: i64) -> Result<Option<Menu>, ApiError> {
        let model = menus::Entity::find_by_id(id)
            .filter(menus::Column::MerchantId.eq(merchant_id))
            .filter(menus::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find menu")?;
        Ok(model.map(menu_from_model))
    }

    async fn find_many(&self, merchant_id: i64, ids: &[i64]) -> Result<Vec<Menu>, ApiError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let models = menus::Entity::find()
            .filter(menus::Column::Id.is_in(ids.iter().copied()))
            .filter(menus::Column::MerchantId.eq(merchant_id))
            .filter(menus::Column::DeletedAt.is_null())
            .all(&self.db)
            .await
            .context("find menus")?;
        Ok(models.into_iter().map(menu_from_model).collect())
    }

    async fn create(&self, merchant_id: i64, menu: &NewMenu) -> Result<Menu, ApiError> {
        let now = Utc::now();
        let model = menus::ActiveModel {
            merchant_id: Set(merchant_id),
            category_id: Set(menu.category_id),
            name: Set(menu.name.clone()),
            description: Set(menu.description.clone()),
            price: Set(menu.price),
            promo_price: Set(menu.promo_price),
            is_promo: Set(menu.is_promo),
            image_url: Set(menu.image_url.clone()),
            is_active: Set(true),
            track_stock: Set(menu.track_stock),
            stock_qty: Set(menu.stock_qty),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("create menu")?;
        Ok(menu_from_model(model))
    }

    async fn update(&self, id: i64, patch: &MenuPatch) -> Result<Menu, ApiError> {
        let mut am = menus::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(category_id) = patch.category_id {
            am.category_id = Set(Some(category_id));
        }
        if let Some(name) = &patch.name {
            am.name = Set(name.clone());
        }
        if let Some(description) = &patch.description {
            am.description = Set(Some(description.clone()));
        }
        if let Some(price) = patch.price {
            am.price = Set(price);
        }
        if let Some(promo_price) = patch.promo_price {
            am.promo_price = Set(Some(promo_price));
        }
        if let Some(is_promo) = patch.is_promo {
            am.is_promo = Set(is_promo);
        }
        if let Some(image_url) = &patch.image_url {
            am.image_url = Set(Some(image_url.clone()));
        }
        if let Some(is_active) = patch.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(track_stock) = patch.track_stock {
            am.track_stock = Set(track_stock);
        }
        if let Some(stock_qty) = patch.stock_qty {
            am.stock_qty = Set(Some(stock_qty));
        }
        am.updated_at = Set(Utc::now());
        let model = am.update(&self.db).await.context("update menu")?;
        Ok(menu_from_model(model))
    }

    async fn soft_delete(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError> {
        menus::ActiveModel {
            id: Set(id),
            deleted_at: Set(Some(at)),
            updated_at: Set(at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("soft delete menu")?;
        Ok(())
    }

    async fn category_links(&self, menu_ids: &[i64]) -> Result<Vec<(i64, i64)>, ApiError> {
        if menu_ids.is_empty() {
            return Ok(vec![]);
        }
        let models = menu_category_items::Entity::find()
            .filter(menu_category_items::Column::MenuId.is_in(menu_ids.iter().copied()))
            .all(&self.db)
            .await
            .context("list menu category links")?;
        Ok(models
            .into_iter()
            .map(|m| (m.menu_id, m.category_id))
            .collect())
    }

    async fn replace_categories(
        &self,
        menu_id: i64,
        category_ids: &[i64],
    ) -> Result<(), ApiError> {
        let category_ids = category_ids.to_vec();
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    menu_category_items::Entity::delete_many()
                        .filter(menu_category_items::Column::MenuId.eq(menu_id))
                        .exec(txn)
                        .await?;

                    let now = Utc::now();
                    for category_id in category_ids {
                        menu_category_items::ActiveModel {
                            menu_id: Set(menu_id),
                            category_id: Set(category_id),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await?;
                    }
                    Ok(())
                })
            })
            .await
            .context("replace menu categories")?;
        Ok(())
    }

    async fn addon_links(&self, menu_ids: &[i64]) -> Result<Vec<MenuAddonLink>, ApiError> {
        if menu_ids.is_empty() {
            return Ok(vec![]);
        }
        let models = menu_addon_categories::Entity::find()
            .filter(menu_addon_categories::Column::MenuId.is_in(menu_ids.iter().copied()))
            .order_by_asc(menu_addon_categories::Column::DisplayOrder)
            .all(&self.db)
            .await
            .context("list menu addon links")?;
        Ok(models.into_iter().map(addon_link_from_model).collect())
    }

    async fn addon_category_links(
        &self,
        addon_category_id: i64,
    ) -> Result<Vec<MenuAddonLink>, ApiError> {
        let models = menu_addon_categories::Entity::find()
            .filter(menu_addon_categories::Column::AddonCategoryId.eq(addon_category_id))
            .order_by_asc(menu_addon_categories::Column::DisplayOrder)
            .all(&self.db)
            .await
            .context("list addon category links")?;
        Ok(models.into_iter().map(addon_link_from_model).collect())
    }

    async fn link_addon_category(&self, link: &MenuAddonLink) -> Result<(), ApiError> {
        let model = menu_addon_categories::ActiveModel {
            menu_id: Set(link.menu_id),
            addon_category_id: Set(link.addon_category_id),
            is_required: Set(link.is_required),
            display_order: Set(link.display_order),
            created_at: Set(Utc::now()),
        };
        menu_addon_categories::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    menu_addon_categories::Column::MenuId,
                    menu_addon_categories::Column::AddonCategoryId,
                ])
                .update_columns([
                    menu_addon_categories::Column::IsRequired,
                    menu_addon_categories::Column::DisplayOrder,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("link addon category")?;
        Ok(())
    }

    async fn unlink_addon_category(
        &self,
        menu_id: i64,
        addon_category_id: i64,
    ) -> Result<bool, ApiError> {
        let result = menu_addon_categories::Entity::delete_many()
            .filter(menu_addon_categories::Column::MenuId.eq(menu_id))
            .filter(menu_addon_categories::Column::AddonCategoryId.eq(addon_category_id))
            .exec(&self.db)
            .await
            .context("unlink addon category")?;
        Ok(result.rows_affected > 0)
    }
}

fn menu_from_model(model: menus::Model) -> Menu {
    Menu {
        id: model.id,
        merchant_id: model.merchant_id,
        category_id: model.category_id,
        name: model.name,
        description: model.description,
        price: model.price,
        promo_price: model.promo_price,
        is_promo: model.is_promo,
        image_url: model.image_url,
        is_active: model.is_active,
        track_stock: model.track_stock,
        stock_qty: model.stock_qty,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn addon_link_from_model(model: menu_addon_categories::Model) -> MenuAddonLink {
    MenuAddonLink {
        menu_id: model.menu_id,
        addon_category_id: model.addon_category_id,
        is_required: model.is_required,
        display_order: model.display_order,
    }
}

// ── Addon repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAddonRepository {
    pub db: DatabaseConnection,
}

impl AddonRepository for DbAddonRepository {
    async fn list_categories(&self, merchant_id: i64) -> Result<Vec<AddonCategory>, ApiError> {
        let models = addon_categories::Entity::find()
            .filter(addon_categories::Column::MerchantId.eq(merchant_id))
            .filter(addon_categories::Column::DeletedAt.is_null())
            .order_by_asc(addon_categories::Column::Name)
            .all(&self.db)
            .await
            .context("list addon categories")?;
        Ok(models.into_iter().map(addon_category_from_model).collect())
    }

    async fn find_category(
        &self,
        merchant_id: i64,
        id: i64,
    ) -> Result<Option<AddonCategory>, ApiError> {
        let model = addon_categories::Entity::find_by_id(id)
            .filter(addon_categories::Column::MerchantId.eq(merchant_id))
            .filter(addon_categories::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find addon category")?;
        Ok(model.map(addon_category_from_model))
    }

    async fn find_categories(
        &self,
        merchant_id: i64,
        ids: &[i64],
    ) -> Result<Vec<AddonCategory>, ApiError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let models = addon_categories::Entity::find()
            .filter(addon_categories::Column::Id.is_in(ids.iter().copied()))
            .filter(addon_categories::Column::MerchantId.eq(merchant_id))
            .filter(addon_categories::Column::DeletedAt.is_null())
            .all(&self.db)
            .await
            .context("find addon categories")?;
        Ok(models.into_iter().map(addon_category_from_model).collect())
    }

    async fn create_category(
        &self,
        merchant_id: i64,
        category: &NewAddonCategory,
    ) -> Result<AddonCategory, ApiError> {
        let now = Utc::now();
        let model = addon_categories::ActiveModel {
            merchant_id: Set(merchant_id),
            name: Set(category.name.clone()),
            description: Set(category.description.clone()),
            min_selection: Set(category.min_selection),
            max_selection: Set(category.max_selection),
            is_active: Set(true),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("create addon category")?;
        Ok(addon_category_from_model(model))
    }

    async fn update_category(
        &self,
        id: i64,
        patch: &AddonCategoryPatch,
    ) -> Result<AddonCategory, ApiError> {
        let mut am = addon_categories::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(name) = &patch.name {
            am.name = Set(name.clone());
        }
        if let Some(description) = &patch.description {
            am.description = Set(Some(description.clone()));
        }
        if let Some(min_selection) = patch.min_selection {
            am.min_selection = Set(min_selection);
        }
        if let Some(max_selection) = patch.max_selection {
            am.max_selection = Set(max_selection);
        }
        if let Some(is_active) = patch.is_active {
            am.is_active = Set(is_active);
        }
        am.updated_at = Set(Utc::now());
        let model = am
            .update(&self.db)
            .await
            .context("update addon category")?;
        Ok(addon_category_from_model(model))
    }

    async fn soft_delete_category(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError> {
        addon_categories::ActiveModel {
            id: Set(id),
            deleted_at: Set(Some(at)),
            updated_at: Set(at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("soft delete addon category")?;
        Ok(())
    }

    async fn items_by_categories(
        &self,
        category_ids: &[i64],
    ) -> Result<Vec<AddonItem>, ApiError> {
        if category_ids.is_empty() {
            return Ok(vec![]);
        }
        let models = addon_items::Entity::find()
            .filter(addon_items::Column::AddonCategoryId.is_in(category_ids.iter().copied()))
            .filter(addon_items::Column::DeletedAt.is_null())
            .order_by_asc(addon_items::Column::Name)
            .all(&self.db)
            .await
            .context("list addon items")?;
        Ok(models.into_iter().map(addon_item_from_model).collect())
    }

    async fn find_item(&self, id: i64) -> Result<Option<AddonItem>, ApiError> {
        let model = addon_items::Entity::find_by_id(id)
            .filter(addon_items::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find addon item")?;
        Ok(model.map(addon_item_from_model))
    }

    async fn create_item(&self, item: &NewAddonItem) -> Result<AddonItem, ApiError> {
        let now = Utc::now();
        let model = addon_items::ActiveModel {
            addon_category_id: Set(item.addon_category_id),
            name: Set(item.name.clone()),
            description: Set(item.description.clone()),
            price: Set(item.price),
            is_active: Set(true),
            track_stock: Set(item.track_stock),
            stock_qty: Set(item.stock_qty),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("create addon item")?;
        Ok(addon_item_from_model(model))
    }

    async fn update_item(&self, id: i64, patch: &AddonItemPatch) -> Result<AddonItem, ApiError> {
        let mut am = addon_items::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(name) = &patch.name {
            am.name = Set(name.clone());
        }
        if let Some(description) = &patch.description {
            am.description = Set(Some(description.clone()));
        }
        if let Some(price) = patch.price {
            am.price = Set(price);
        }
        if let Some(is_active) = patch.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(track_stock) = patch.track_stock {
            am.track_stock = Set(track_stock);
        }
        if let Some(stock_qty) = patch.stock_qty {
            am.stock_qty = Set(Some(stock_qty));
        }
        am.updated_at = Set(Utc::now());
        let model = am.update(&self.db).await.context("update addon item")?;
        Ok(addon_item_from_model(model))
    }

    async fn soft_delete_item(&self, id: i64, at: DateTime<Utc>) -> Result<(), ApiError> {
        addon_items::ActiveModel {
            id: Set(id),
            deleted_at: Set(Some(at)),
            updated_at: Set(at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("soft delete addon item")?;
        Ok(())
    }
}

fn addon_category_from_model(model: addon_categories::Model) -> AddonCategory {
    AddonCategory {
        id: model.id,
        merchant_id: model.merchant_id,
        name: model.name,
        description: model.description,
        min_selection: model.min_selection,
        max_selection: model.max_selection,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn addon_item_from_model(model: addon_items::Model) -> AddonItem {
    AddonItem {
        id: model.id,
        addon_category_id: model.addon_category_id,
        name: model.name,
        description: model.description,
        price: model.price,
        is_active: model.is_active,
        track_stock: model.track_stock,
        stock_qty: model.stock_qty,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
