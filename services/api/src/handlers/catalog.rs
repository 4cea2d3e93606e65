use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tabletop_core::envelope::ApiResponse;

use crate::domain::types::{
    AddonCategoryPatch, AddonItemPatch, CategoryPatch, MenuAddonLink, MenuPatch,
    NewAddonCategory, NewAddonItem, NewCategory, NewMenu,
};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, MerchantStaff};
use crate::handlers::views::{
    AddonCategoryResponse, AddonItemResponse, AddonLinkResponse, CategoryResponse,
    MenuDetailResponse, MenuResponse,
};
use crate::state::AppState;
use crate::usecase::catalog::{
    AddonCategoryRelationshipsUseCase, CreateAddonCategoryUseCase, CreateAddonItemUseCase,
    CreateCategoryUseCase, CreateMenuInput, CreateMenuUseCase, DeleteAddonCategoryUseCase,
    DeleteAddonItemUseCase, DeleteCategoryUseCase, DeleteMenuUseCase, GetMenuUseCase,
    LinkAddonCategoryUseCase, ListAddonCategoriesUseCase, ListAddonItemsUseCase,
    ListCategoriesUseCase, ListMenusUseCase, ReplaceMenuCategoriesUseCase,
    UnlinkAddonCategoryUseCase, UpdateAddonCategoryUseCase, UpdateAddonItemUseCase,
    UpdateCategoryUseCase, UpdateMenuUseCase,
};

// ── GET /api/merchant/categories ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryResponse>,
}

pub async fn list_categories(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
) -> Result<ApiResponse<CategoriesResponse>, ApiError> {
    let usecase = ListCategoriesUseCase {
        categories: state.category_repo(),
    };
    let categories = usecase
        .execute(&scope)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok(
        CategoriesResponse { categories },
        "Categories retrieved",
    ))
}

// ── POST /api/merchant/categories ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

pub async fn create_category(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateCategoryRequest>,
) -> Result<ApiResponse<CategoryResponse>, ApiError> {
    let usecase = CreateCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase
        .execute(
            &scope,
            NewCategory {
                name: body.name,
                description: body.description,
                sort_order: body.sort_order.unwrap_or(0),
            },
        )
        .await?;
    Ok(ApiResponse::created(category.into(), "Category created"))
}

// ── PUT /api/merchant/categories/{id} ────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

pub async fn update_category(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateCategoryRequest>,
) -> Result<ApiResponse<CategoryResponse>, ApiError> {
    let usecase = UpdateCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase
        .execute(
            &scope,
            id,
            CategoryPatch {
                name: body.name,
                description: body.description,
                sort_order: body.sort_order,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(ApiResponse::ok(category.into(), "Category updated"))
}

// ── DELETE /api/merchant/categories/{id} ─────────────────────────────────────

pub async fn delete_category(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    let usecase = DeleteCategoryUseCase {
        categories: state.category_repo(),
    };
    usecase.execute(&scope, id).await?;
    Ok(ApiResponse::ok((), "Category deleted"))
}

// ── GET /api/merchant/menu ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MenusResponse {
    pub menus: Vec<MenuDetailResponse>,
}

pub async fn list_menus(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
) -> Result<ApiResponse<MenusResponse>, ApiError> {
    let usecase = ListMenusUseCase {
        menus: state.menu_repo(),
    };
    let menus = usecase
        .execute(&scope)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok(MenusResponse { menus }, "Menus retrieved"))
}

// ── POST /api/merchant/menu ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuRequest {
    #[serde(default, deserialize_with = "tabletop_core::serde::id_from_str_or_int_opt")]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "tabletop_core::serde::ids_from_str_or_int")]
    pub category_ids: Vec<i64>,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub promo_price: Option<Decimal>,
    pub is_promo: Option<bool>,
    pub image_url: Option<String>,
    pub track_stock: Option<bool>,
    pub stock_qty: Option<i32>,
}

pub async fn create_menu(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateMenuRequest>,
) -> Result<ApiResponse<MenuDetailResponse>, ApiError> {
    let usecase = CreateMenuUseCase {
        menus: state.menu_repo(),
        categories: state.category_repo(),
    };
    let view = usecase
        .execute(
            &scope,
            CreateMenuInput {
                menu: NewMenu {
                    category_id: body.category_id,
                    name: body.name,
                    description: body.description,
                    price: body.price,
                    promo_price: body.promo_price,
                    is_promo: body.is_promo.unwrap_or(false),
                    image_url: body.image_url,
                    track_stock: body.track_stock.unwrap_or(false),
                    stock_qty: body.stock_qty,
                },
                category_ids: body.category_ids,
            },
        )
        .await?;
    Ok(ApiResponse::created(view.into(), "Menu created"))
}

// ── GET /api/merchant/menu/{id} ──────────────────────────────────────────────

pub async fn get_menu(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<MenuDetailResponse>, ApiError> {
    let usecase = GetMenuUseCase {
        menus: state.menu_repo(),
    };
    let view = usecase.execute(&scope, id).await?;
    Ok(ApiResponse::ok(view.into(), "Menu retrieved"))
}

// ── PUT /api/merchant/menu/{id} ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuRequest {
    #[serde(default, deserialize_with = "tabletop_core::serde::id_from_str_or_int_opt")]
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub promo_price: Option<Decimal>,
    pub is_promo: Option<bool>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
    pub track_stock: Option<bool>,
    pub stock_qty: Option<i32>,
}

pub async fn update_menu(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateMenuRequest>,
) -> Result<ApiResponse<MenuResponse>, ApiError> {
    let usecase = UpdateMenuUseCase {
        menus: state.menu_repo(),
        categories: state.category_repo(),
    };
    let menu = usecase
        .execute(
            &scope,
            id,
            MenuPatch {
                category_id: body.category_id,
                name: body.name,
                description: body.description,
                price: body.price,
                promo_price: body.promo_price,
                is_promo: body.is_promo,
                image_url: body.image_url,
                is_active: body.is_active,
                track_stock: body.track_stock,
                stock_qty: body.stock_qty,
            },
        )
        .await?;
    Ok(ApiResponse::ok(menu.into(), "Menu updated"))
}

// ── DELETE /api/merchant/menu/{id} ───────────────────────────────────────────

pub async fn delete_menu(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    let usecase = DeleteMenuUseCase {
        menus: state.menu_repo(),
    };
    usecase.execute(&scope, id).await?;
    Ok(ApiResponse::ok((), "Menu deleted"))
}

// ── PUT /api/merchant/menu/{id}/categories ───────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceMenuCategoriesRequest {
    #[serde(deserialize_with = "tabletop_core::serde::ids_from_str_or_int")]
    pub category_ids: Vec<i64>,
}

pub async fn replace_menu_categories(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<ReplaceMenuCategoriesRequest>,
) -> Result<ApiResponse<CategoriesResponse>, ApiError> {
    let usecase = ReplaceMenuCategoriesUseCase {
        menus: state.menu_repo(),
        categories: state.category_repo(),
    };
    let categories = usecase
        .execute(&scope, id, &body.category_ids)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok(
        CategoriesResponse { categories },
        "Menu categories updated",
    ))
}

// ── POST /api/merchant/menu/{id}/addon-categories ────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAddonCategoryRequest {
    #[serde(deserialize_with = "tabletop_core::serde::id_from_str_or_int")]
    pub addon_category_id: i64,
    pub is_required: Option<bool>,
    pub display_order: Option<i32>,
}

pub async fn link_addon_category(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<LinkAddonCategoryRequest>,
) -> Result<ApiResponse<AddonLinkResponse>, ApiError> {
    let usecase = LinkAddonCategoryUseCase {
        menus: state.menu_repo(),
        addons: state.addon_repo(),
    };
    let link = usecase
        .execute(
            &scope,
            MenuAddonLink {
                menu_id: id,
                addon_category_id: body.addon_category_id,
                is_required: body.is_required.unwrap_or(false),
                display_order: body.display_order.unwrap_or(0),
            },
        )
        .await?;
    Ok(ApiResponse::created(link.into(), "Addon category linked"))
}

// ── DELETE /api/merchant/menu/{id}/addon-categories/{addonCategoryId} ────────

pub async fn unlink_addon_category(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath((id, addon_category_id)): ApiPath<(i64, i64)>,
) -> Result<ApiResponse<()>, ApiError> {
    let usecase = UnlinkAddonCategoryUseCase {
        menus: state.menu_repo(),
    };
    usecase.execute(&scope, id, addon_category_id).await?;
    Ok(ApiResponse::ok((), "Addon category unlinked"))
}

// ── GET /api/merchant/addon-categories ───────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonCategoriesResponse {
    pub addon_categories: Vec<AddonCategoryResponse>,
}

pub async fn list_addon_categories(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
) -> Result<ApiResponse<AddonCategoriesResponse>, ApiError> {
    let usecase = ListAddonCategoriesUseCase {
        addons: state.addon_repo(),
    };
    let addon_categories = usecase
        .execute(&scope)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok(
        AddonCategoriesResponse { addon_categories },
        "Addon categories retrieved",
    ))
}

// ── POST /api/merchant/addon-categories ──────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddonCategoryRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub min_selection: Option<i32>,
    pub max_selection: Option<i32>,
}

pub async fn create_addon_category(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateAddonCategoryRequest>,
) -> Result<ApiResponse<AddonCategoryResponse>, ApiError> {
    let usecase = CreateAddonCategoryUseCase {
        addons: state.addon_repo(),
    };
    let category = usecase
        .execute(
            &scope,
            NewAddonCategory {
                name: body.name,
                description: body.description,
                min_selection: body.min_selection.unwrap_or(0),
                max_selection: body.max_selection,
            },
        )
        .await?;
    Ok(ApiResponse::created(
        category.into(),
        "Addon category created",
    ))
}

// ── PUT /api/merchant/addon-categories/{id} ──────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddonCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub min_selection: Option<i32>,
    #[serde(default, deserialize_with = "tabletop_core::serde::nullable")]
    pub max_selection: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

pub async fn update_addon_category(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateAddonCategoryRequest>,
) -> Result<ApiResponse<AddonCategoryResponse>, ApiError> {
    let usecase = UpdateAddonCategoryUseCase {
        addons: state.addon_repo(),
    };
    let category = usecase
        .execute(
            &scope,
            id,
            AddonCategoryPatch {
                name: body.name,
                description: body.description,
                min_selection: body.min_selection,
                max_selection: body.max_selection,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(ApiResponse::ok(category.into(), "Addon category updated"))
}

// ── DELETE /api/merchant/addon-categories/{id} ───────────────────────────────

pub async fn delete_addon_category(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    let usecase = DeleteAddonCategoryUseCase {
        addons: state.addon_repo(),
    };
    usecase.execute(&scope, id).await?;
    Ok(ApiResponse::ok((), "Addon category deleted"))
}

// ── GET /api/merchant/addon-categories/{id}/relationships ────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedMenuResponse {
    #[serde(flatten)]
    pub menu: MenuResponse,
    pub is_required: bool,
    pub display_order: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipsResponse {
    pub addon_category: AddonCategoryResponse,
    pub menus: Vec<LinkedMenuResponse>,
}

pub async fn addon_category_relationships(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<RelationshipsResponse>, ApiError> {
    let usecase = AddonCategoryRelationshipsUseCase {
        addons: state.addon_repo(),
        menus: state.menu_repo(),
    };
    let out = usecase.execute(&scope, id).await?;
    let menus = out
        .menus
        .into_iter()
        .map(|(link, menu)| LinkedMenuResponse {
            menu: menu.into(),
            is_required: link.is_required,
            display_order: link.display_order,
        })
        .collect();
    Ok(ApiResponse::ok(
        RelationshipsResponse {
            addon_category: out.category.into(),
            menus,
        },
        "Addon category relationships retrieved",
    ))
}

// ── GET /api/merchant/addon-items ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAddonItemsQuery {
    pub category_id: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonItemsResponse {
    pub addon_items: Vec<AddonItemResponse>,
}

pub async fn list_addon_items(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListAddonItemsQuery>,
) -> Result<ApiResponse<AddonItemsResponse>, ApiError> {
    let usecase = ListAddonItemsUseCase {
        addons: state.addon_repo(),
    };
    let addon_items = usecase
        .execute(&scope, query.category_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok(
        AddonItemsResponse { addon_items },
        "Addon items retrieved",
    ))
}

// ── POST /api/merchant/addon-items ───────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddonItemRequest {
    #[serde(deserialize_with = "tabletop_core::serde::id_from_str_or_int")]
    pub addon_category_id: i64,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub track_stock: Option<bool>,
    pub stock_qty: Option<i32>,
}

pub async fn create_addon_item(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateAddonItemRequest>,
) -> Result<ApiResponse<AddonItemResponse>, ApiError> {
    let usecase = CreateAddonItemUseCase {
        addons: state.addon_repo(),
    };
    let item = usecase
        .execute(
            &scope,
            NewAddonItem {
                addon_category_id: body.addon_category_id,
                name: body.name,
                description: body.description,
                price: body.price.unwrap_or(Decimal::ZERO),
                track_stock: body.track_stock.unwrap_or(false),
                stock_qty: body.stock_qty,
            },
        )
        .await?;
    Ok(ApiResponse::created(item.into(), "Addon item created"))
}

// ── PUT /api/merchant/addon-items/{id} ───────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddonItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
    pub track_stock: Option<bool>,
    pub stock_qty: Option<i32>,
}

pub async fn update_addon_item(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateAddonItemRequest>,
) -> Result<ApiResponse<AddonItemResponse>, ApiError> {
    let usecase = UpdateAddonItemUseCase {
        addons: state.addon_repo(),
    };
    let item = usecase
        .execute(
            &scope,
            id,
            AddonItemPatch {
                name: body.name,
                description: body.description,
                price: body.price,
                is_active: body.is_active,
                track_stock: body.track_stock,
                stock_qty: body.stock_qty,
            },
        )
        .await?;
    Ok(ApiResponse::ok(item.into(), "Addon item updated"))
}

// ── DELETE /api/merchant/addon-items/{id} ────────────────────────────────────

pub async fn delete_addon_item(
    MerchantStaff(scope): MerchantStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    let usecase = DeleteAddonItemUseCase {
        addons: state.addon_repo(),
    };
    usecase.execute(&scope, id).await?;
    Ok(ApiResponse::ok((), "Addon item deleted"))
}
