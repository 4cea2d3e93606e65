use std::collections::BTreeSet;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use tabletop_domain::catalog::selection_bounds_are_valid;
use tabletop_domain::merchant::normalize_merchant_code;

use crate::domain::repository::{
    AddonRepository, CategoryRepository, MenuRepository, MerchantRepository,
};
use crate::domain::types::{
    AddonCategory, AddonCategoryPatch, AddonItem, AddonItemPatch, CategoryPatch, Menu,
    MenuAddonLink, MenuCategory, MenuPatch, Merchant, NewAddonCategory, NewAddonItem, NewCategory,
    NewMenu,
};
use crate::error::ApiError;
use crate::usecase::auth_context::MerchantScope;

fn check_name(name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    Ok(trimmed.to_owned())
}

fn check_price(field: &str, price: Option<Decimal>) -> Result<(), ApiError> {
    match price {
        Some(p) if p < Decimal::ZERO => {
            Err(ApiError::validation(format!("{field} must not be negative")))
        }
        _ => Ok(()),
    }
}

fn check_stock(stock_qty: Option<i32>) -> Result<(), ApiError> {
    match stock_qty {
        Some(q) if q < 0 => Err(ApiError::validation("stockQty must not be negative")),
        _ => Ok(()),
    }
}

fn check_selection(min_selection: i32, max_selection: Option<i32>) -> Result<(), ApiError> {
    if selection_bounds_are_valid(min_selection, max_selection) {
        Ok(())
    } else {
        Err(ApiError::validation(
            "minSelection must not be negative or exceed maxSelection",
        ))
    }
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

async fn require_menu<R: MenuRepository>(
    menus: &R,
    scope: &MerchantScope,
    id: i64,
) -> Result<Menu, ApiError> {
    menus
        .find(scope.merchant_id, id)
        .await?
        .ok_or(ApiError::MenuNotFound)
}

async fn require_addon_category<A: AddonRepository>(
    addons: &A,
    scope: &MerchantScope,
    id: i64,
) -> Result<AddonCategory, ApiError> {
    addons
        .find_category(scope.merchant_id, id)
        .await?
        .ok_or(ApiError::AddonCategoryNotFound)
}

/// Addon items are addressed by id alone; ownership goes through their category.
async fn require_addon_item<A: AddonRepository>(
    addons: &A,
    scope: &MerchantScope,
    id: i64,
) -> Result<AddonItem, ApiError> {
    let item = addons.find_item(id).await?.ok_or(ApiError::AddonItemNotFound)?;
    addons
        .find_category(scope.merchant_id, item.addon_category_id)
        .await?
        .ok_or(ApiError::AddonItemNotFound)?;
    Ok(item)
}

/// All ids must name categories of this merchant.
async fn require_categories<C: CategoryRepository>(
    categories: &C,
    scope: &MerchantScope,
    ids: &[i64],
) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = categories.find_many(scope.merchant_id, ids).await?;
    if found.len() != ids.len() {
        return Err(ApiError::validation(
            "one or more categories do not belong to this merchant",
        ));
    }
    Ok(())
}

// ── Categories ───────────────────────────────────────────────────────────────

pub struct ListCategoriesUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> ListCategoriesUseCase<C> {
    pub async fn execute(&self, scope: &MerchantScope) -> Result<Vec<MenuCategory>, ApiError> {
        self.categories.list(scope.merchant_id, false).await
    }
}

pub struct CreateCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> CreateCategoryUseCase<C> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        mut input: NewCategory,
    ) -> Result<MenuCategory, ApiError> {
        input.name = check_name(&input.name)?;
        let category = self.categories.create(scope.merchant_id, &input).await?;
        info!(merchant_id = scope.merchant_id, category_id = category.id, "category created");
        Ok(category)
    }
}

pub struct UpdateCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> UpdateCategoryUseCase<C> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        id: i64,
        mut patch: CategoryPatch,
    ) -> Result<MenuCategory, ApiError> {
        self.categories
            .find(scope.merchant_id, id)
            .await?
            .ok_or(ApiError::CategoryNotFound)?;
        if let Some(name) = patch.name.take() {
            patch.name = Some(check_name(&name)?);
        }
        self.categories.update(id, &patch).await
    }
}

pub struct DeleteCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> DeleteCategoryUseCase<C> {
    pub async fn execute(&self, scope: &MerchantScope, id: i64) -> Result<(), ApiError> {
        self.categories
            .find(scope.merchant_id, id)
            .await?
            .ok_or(ApiError::CategoryNotFound)?;
        self.categories.soft_delete(id, Utc::now()).await?;
        info!(merchant_id = scope.merchant_id, category_id = id, "category deleted");
        Ok(())
    }
}

// ── Menus ────────────────────────────────────────────────────────────────────

/// Menu with its category set and addon-category links.
#[derive(Debug, Clone)]
pub struct MenuView {
    pub menu: Menu,
    pub category_ids: Vec<i64>,
    pub addon_links: Vec<MenuAddonLink>,
}

async fn menu_views<R: MenuRepository>(menus: &R, list: Vec<Menu>) -> Result<Vec<MenuView>, ApiError> {
    let ids: Vec<i64> = list.iter().map(|m| m.id).collect();
    let category_links = menus.category_links(&ids).await?;
    let addon_links = menus.addon_links(&ids).await?;
    Ok(list
        .into_iter()
        .map(|menu| MenuView {
            category_ids: category_links
                .iter()
                .filter(|(menu_id, _)| *menu_id == menu.id)
                .map(|(_, category_id)| *category_id)
                .collect(),
            addon_links: addon_links
                .iter()
                .filter(|l| l.menu_id == menu.id)
                .copied()
                .collect(),
            menu,
        })
        .collect())
}

pub struct ListMenusUseCase<R: MenuRepository> {
    pub menus: R,
}

impl<R: MenuRepository> ListMenusUseCase<R> {
    pub async fn execute(&self, scope: &MerchantScope) -> Result<Vec<MenuView>, ApiError> {
        let list = self.menus.list(scope.merchant_id, false).await?;
        menu_views(&self.menus, list).await
    }
}

pub struct GetMenuUseCase<R: MenuRepository> {
    pub menus: R,
}

impl<R: MenuRepository> GetMenuUseCase<R> {
    pub async fn execute(&self, scope: &MerchantScope, id: i64) -> Result<MenuView, ApiError> {
        let menu = require_menu(&self.menus, scope, id).await?;
        let mut views = menu_views(&self.menus, vec![menu]).await?;
        views.pop().ok_or(ApiError::MenuNotFound)
    }
}

pub struct CreateMenuInput {
    pub menu: NewMenu,
    /// Extra categories besides the primary `menu.category_id`.
    pub category_ids: Vec<i64>,
}

pub struct CreateMenuUseCase<R: MenuRepository, C: CategoryRepository> {
    pub menus: R,
    pub categories: C,
}

impl<R: MenuRepository, C: CategoryRepository> CreateMenuUseCase<R, C> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        input: CreateMenuInput,
    ) -> Result<MenuView, ApiError> {
        let mut menu = input.menu;
        menu.name = check_name(&menu.name)?;
        check_price("price", Some(menu.price))?;
        check_price("promoPrice", menu.promo_price)?;
        check_stock(menu.stock_qty)?;

        let mut category_ids = input.category_ids;
        category_ids.extend(menu.category_id);
        let category_ids = dedup(&category_ids);
        require_categories(&self.categories, scope, &category_ids).await?;

        let created = self.menus.create(scope.merchant_id, &menu).await?;
        if !category_ids.is_empty() {
            self.menus
                .replace_categories(created.id, &category_ids)
                .await?;
        }
        info!(merchant_id = scope.merchant_id, menu_id = created.id, "menu created");

        Ok(MenuView {
            menu: created,
            category_ids,
            addon_links: vec![],
        })
    }
}

pub struct UpdateMenuUseCase<R: MenuRepository, C: CategoryRepository> {
    pub menus: R,
    pub categories: C,
}

impl<R: MenuRepository, C: CategoryRepository> UpdateMenuUseCase<R, C> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        id: i64,
        mut patch: MenuPatch,
    ) -> Result<Menu, ApiError> {
        require_menu(&self.menus, scope, id).await?;
        if let Some(name) = patch.name.take() {
            patch.name = Some(check_name(&name)?);
        }
        check_price("price", patch.price)?;
        check_price("promoPrice", patch.promo_price)?;
        check_stock(patch.stock_qty)?;
        if let Some(category_id) = patch.category_id {
            require_categories(&self.categories, scope, &[category_id]).await?;
        }
        self.menus.update(id, &patch).await
    }
}

pub struct DeleteMenuUseCase<R: MenuRepository> {
    pub menus: R,
}

impl<R: MenuRepository> DeleteMenuUseCase<R> {
    pub async fn execute(&self, scope: &MerchantScope, id: i64) -> Result<(), ApiError> {
        require_menu(&self.menus, scope, id).await?;
        self.menus.soft_delete(id, Utc::now()).await?;
        info!(merchant_id = scope.merchant_id, menu_id = id, "menu deleted");
        Ok(())
    }
}

pub struct ReplaceMenuCategoriesUseCase<R: MenuRepository, C: CategoryRepository> {
    pub menus: R,
    pub categories: C,
}

impl<R: MenuRepository, C: CategoryRepository> ReplaceMenuCategoriesUseCase<R, C> {
    /// Returns the new category set.
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        menu_id: i64,
        category_ids: &[i64],
    ) -> Result<Vec<MenuCategory>, ApiError> {
        require_menu(&self.menus, scope, menu_id).await?;
        let ids = dedup(category_ids);
        require_categories(&self.categories, scope, &ids).await?;
        self.menus.replace_categories(menu_id, &ids).await?;
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.categories.find_many(scope.merchant_id, &ids).await
    }
}

pub struct LinkAddonCategoryUseCase<R: MenuRepository, A: AddonRepository> {
    pub menus: R,
    pub addons: A,
}

impl<R: MenuRepository, A: AddonRepository> LinkAddonCategoryUseCase<R, A> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        link: MenuAddonLink,
    ) -> Result<MenuAddonLink, ApiError> {
        require_menu(&self.menus, scope, link.menu_id).await?;
        require_addon_category(&self.addons, scope, link.addon_category_id).await?;
        self.menus.link_addon_category(&link).await?;
        Ok(link)
    }
}

pub struct UnlinkAddonCategoryUseCase<R: MenuRepository> {
    pub menus: R,
}

impl<R: MenuRepository> UnlinkAddonCategoryUseCase<R> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        menu_id: i64,
        addon_category_id: i64,
    ) -> Result<(), ApiError> {
        require_menu(&self.menus, scope, menu_id).await?;
        if !self
            .menus
            .unlink_addon_category(menu_id, addon_category_id)
            .await?
        {
            return Err(ApiError::AddonCategoryNotFound);
        }
        Ok(())
    }
}

// ── Addon categories ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AddonCategoryView {
    pub category: AddonCategory,
    pub items: Vec<AddonItem>,
}

pub struct ListAddonCategoriesUseCase<A: AddonRepository> {
    pub addons: A,
}

impl<A: AddonRepository> ListAddonCategoriesUseCase<A> {
    pub async fn execute(&self, scope: &MerchantScope) -> Result<Vec<AddonCategoryView>, ApiError> {
        let categories = self.addons.list_categories(scope.merchant_id).await?;
        let ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
        let items = self.addons.items_by_categories(&ids).await?;
        Ok(categories
            .into_iter()
            .map(|category| AddonCategoryView {
                items: items
                    .iter()
                    .filter(|i| i.addon_category_id == category.id)
                    .cloned()
                    .collect(),
                category,
            })
            .collect())
    }
}

pub struct CreateAddonCategoryUseCase<A: AddonRepository> {
    pub addons: A,
}

impl<A: AddonRepository> CreateAddonCategoryUseCase<A> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        mut input: NewAddonCategory,
    ) -> Result<AddonCategory, ApiError> {
        input.name = check_name(&input.name)?;
        check_selection(input.min_selection, input.max_selection)?;
        let category = self
            .addons
            .create_category(scope.merchant_id, &input)
            .await?;
        info!(
            merchant_id = scope.merchant_id,
            addon_category_id = category.id,
            "addon category created"
        );
        Ok(category)
    }
}

pub struct UpdateAddonCategoryUseCase<A: AddonRepository> {
    pub addons: A,
}

impl<A: AddonRepository> UpdateAddonCategoryUseCase<A> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        id: i64,
        mut patch: AddonCategoryPatch,
    ) -> Result<AddonCategory, ApiError> {
        let current = require_addon_category(&self.addons, scope, id).await?;
        if let Some(name) = patch.name.take() {
            patch.name = Some(check_name(&name)?);
        }
        check_selection(
            patch.min_selection.unwrap_or(current.min_selection),
            patch.max_selection.unwrap_or(current.max_selection),
        )?;
        self.addons.update_category(id, &patch).await
    }
}

pub struct DeleteAddonCategoryUseCase<A: AddonRepository> {
    pub addons: A,
}

impl<A: AddonRepository> DeleteAddonCategoryUseCase<A> {
    pub async fn execute(&self, scope: &MerchantScope, id: i64) -> Result<(), ApiError> {
        require_addon_category(&self.addons, scope, id).await?;
        self.addons.soft_delete_category(id, Utc::now()).await?;
        info!(merchant_id = scope.merchant_id, addon_category_id = id, "addon category deleted");
        Ok(())
    }
}

/// Menus using an addon category, in link display order.
#[derive(Debug, Clone)]
pub struct AddonCategoryRelationships {
    pub category: AddonCategory,
    pub menus: Vec<(MenuAddonLink, Menu)>,
}

pub struct AddonCategoryRelationshipsUseCase<A: AddonRepository, R: MenuRepository> {
    pub addons: A,
    pub menus: R,
}

impl<A: AddonRepository, R: MenuRepository> AddonCategoryRelationshipsUseCase<A, R> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        id: i64,
    ) -> Result<AddonCategoryRelationships, ApiError> {
        let category = require_addon_category(&self.addons, scope, id).await?;
        let links = self.menus.addon_category_links(id).await?;
        let menu_ids: Vec<i64> = links.iter().map(|l| l.menu_id).collect();
        let menus = if menu_ids.is_empty() {
            vec![]
        } else {
            self.menus.find_many(scope.merchant_id, &menu_ids).await?
        };
        let menus = links
            .into_iter()
            .filter_map(|link| {
                menus
                    .iter()
                    .find(|m| m.id == link.menu_id)
                    .map(|m| (link, m.clone()))
            })
            .collect();
        Ok(AddonCategoryRelationships { category, menus })
    }
}

// ── Addon items ──────────────────────────────────────────────────────────────

pub struct ListAddonItemsUseCase<A: AddonRepository> {
    pub addons: A,
}

impl<A: AddonRepository> ListAddonItemsUseCase<A> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        category_id: Option<i64>,
    ) -> Result<Vec<AddonItem>, ApiError> {
        let ids = match category_id {
            Some(id) => vec![require_addon_category(&self.addons, scope, id).await?.id],
            None => self
                .addons
                .list_categories(scope.merchant_id)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect(),
        };
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.addons.items_by_categories(&ids).await
    }
}

pub struct CreateAddonItemUseCase<A: AddonRepository> {
    pub addons: A,
}

impl<A: AddonRepository> CreateAddonItemUseCase<A> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        mut input: NewAddonItem,
    ) -> Result<AddonItem, ApiError> {
        input.name = check_name(&input.name)?;
        check_price("price", Some(input.price))?;
        check_stock(input.stock_qty)?;
        require_addon_category(&self.addons, scope, input.addon_category_id).await?;
        let item = self.addons.create_item(&input).await?;
        info!(
            merchant_id = scope.merchant_id,
            addon_item_id = item.id,
            "addon item created"
        );
        Ok(item)
    }
}

pub struct UpdateAddonItemUseCase<A: AddonRepository> {
    pub addons: A,
}

impl<A: AddonRepository> UpdateAddonItemUseCase<A> {
    pub async fn execute(
        &self,
        scope: &MerchantScope,
        id: i64,
        mut patch: AddonItemPatch,
    ) -> Result<AddonItem, ApiError> {
        require_addon_item(&self.addons, scope, id).await?;
        if let Some(name) = patch.name.take() {
            patch.name = Some(check_name(&name)?);
        }
        check_price("price", patch.price)?;
        check_stock(patch.stock_qty)?;
        self.addons.update_item(id, &patch).await
    }
}

pub struct DeleteAddonItemUseCase<A: AddonRepository> {
    pub addons: A,
}

impl<A: AddonRepository> DeleteAddonItemUseCase<A> {
    pub async fn execute(&self, scope: &MerchantScope, id: i64) -> Result<(), ApiError> {
        require_addon_item(&self.addons, scope, id).await?;
        self.addons.soft_delete_item(id, Utc::now()).await?;
        Ok(())
    }
}

// ── Storefront ───────────────────────────────────────────────────────────────

/// Active merchant looked up by its public code.
pub(crate) async fn find_public_merchant<M: MerchantRepository>(
    merchants: &M,
    code: &str,
) -> Result<Merchant, ApiError> {
    let code = normalize_merchant_code(code).ok_or(ApiError::MerchantNotFound)?;
    merchants
        .find_by_code(&code)
        .await?
        .filter(|m| m.is_active)
        .ok_or(ApiError::MerchantNotFound)
}

pub struct PublicMerchantUseCase<M: MerchantRepository> {
    pub merchants: M,
}

impl<M: MerchantRepository> PublicMerchantUseCase<M> {
    pub async fn execute(&self, code: &str) -> Result<Merchant, ApiError> {
        find_public_merchant(&self.merchants, code).await
    }
}

pub struct PublicCategoriesUseCase<M: MerchantRepository, C: CategoryRepository> {
    pub merchants: M,
    pub categories: C,
}

impl<M: MerchantRepository, C: CategoryRepository> PublicCategoriesUseCase<M, C> {
    pub async fn execute(&self, code: &str) -> Result<Vec<MenuCategory>, ApiError> {
        let merchant = find_public_merchant(&self.merchants, code).await?;
        self.categories.list(merchant.id, true).await
    }
}

/// Addon category offered on a storefront menu, with its active items.
#[derive(Debug, Clone)]
pub struct PublicAddonGroup {
    pub link: MenuAddonLink,
    pub category: AddonCategory,
    pub items: Vec<AddonItem>,
}

#[derive(Debug, Clone)]
pub struct PublicMenu {
    pub menu: Menu,
    pub category_ids: Vec<i64>,
    pub addon_groups: Vec<PublicAddonGroup>,
}

/// Menu belongs to a category through its primary category or the many-to-many set.
pub(crate) fn menu_in_category(menu: &Menu, category_ids: &[i64], category: i64) -> bool {
    menu.category_id == Some(category) || category_ids.contains(&category)
}

pub struct PublicMenusUseCase<M: MerchantRepository, R: MenuRepository, A: AddonRepository> {
    pub merchants: M,
    pub menus: R,
    pub addons: A,
}

impl<M: MerchantRepository, R: MenuRepository, A: AddonRepository> PublicMenusUseCase<M, R, A> {
    pub async fn execute(
        &self,
        code: &str,
        category: Option<i64>,
    ) -> Result<Vec<PublicMenu>, ApiError> {
        let merchant = find_public_merchant(&self.merchants, code).await?;
        let views = menu_views(&self.menus, self.menus.list(merchant.id, true).await?).await?;
        let views: Vec<MenuView> = match category {
            Some(c) => views
                .into_iter()
                .filter(|v| menu_in_category(&v.menu, &v.category_ids, c))
                .collect(),
            None => views,
        };

        let addon_category_ids = dedup(
            &views
                .iter()
                .flat_map(|v| v.addon_links.iter().map(|l| l.addon_category_id))
                .collect::<Vec<_>>(),
        );
        let (addon_categories, items) = if addon_category_ids.is_empty() {
            (vec![], vec![])
        } else {
            let categories: Vec<AddonCategory> = self
                .addons
                .find_categories(merchant.id, &addon_category_ids)
                .await?
                .into_iter()
                .filter(|c| c.is_active)
                .collect();
            let ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
            let items: Vec<AddonItem> = if ids.is_empty() {
                vec![]
            } else {
                self.addons
                    .items_by_categories(&ids)
                    .await?
                    .into_iter()
                    .filter(|i| i.is_active)
                    .collect()
            };
            (categories, items)
        };

        Ok(views
            .into_iter()
            .map(|view| PublicMenu {
                addon_groups: view
                    .addon_links
                    .iter()
                    .filter_map(|link| {
                        let category = addon_categories
                            .iter()
                            .find(|c| c.id == link.addon_category_id)?;
                        Some(PublicAddonGroup {
                            link: *link,
                            category: category.clone(),
                            items: items
                                .iter()
                                .filter(|i| i.addon_category_id == category.id)
                                .cloned()
                                .collect(),
                        })
                    })
                    .collect(),
                menu: view.menu,
                category_ids: view.category_ids,
            })
            .collect())
    }
}
