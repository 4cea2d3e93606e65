use sea_orm::DatabaseConnection;

use crate::config::TokenSettings;
use crate::infra::catalog::{DbAddonRepository, DbCategoryRepository, DbMenuRepository};
use crate::infra::db::{DbMerchantRepository, DbSessionRepository, DbUserRepository};
use crate::infra::orders::DbOrderRepository;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub tokens: TokenSettings,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_repo(&self) -> DbSessionRepository {
        DbSessionRepository {
            db: self.db.clone(),
        }
    }

    pub fn merchant_repo(&self) -> DbMerchantRepository {
        DbMerchantRepository {
            db: self.db.clone(),
        }
    }

    pub fn category_repo(&self) -> DbCategoryRepository {
        DbCategoryRepository {
            db: self.db.clone(),
        }
    }

    pub fn menu_repo(&self) -> DbMenuRepository {
        DbMenuRepository {
            db: self.db.clone(),
        }
    }

    pub fn addon_repo(&self) -> DbAddonRepository {
        DbAddonRepository {
            db: self.db.clone(),
        }
    }

    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }
}
