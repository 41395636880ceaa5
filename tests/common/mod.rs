use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use stockroom_api::{
    auth::{policy, AuthUser},
    entities::{category, item, user},
    events::{Event, EventSender},
    migrator::Migrator,
};

/// Fresh in-memory database with all migrations applied
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");
    Arc::new(db)
}

/// Event channel for tests. The receiver must stay alive for the duration
/// of the test so service-side sends do not fail.
pub fn event_channel() -> (Arc<EventSender>, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(64);
    (Arc::new(EventSender::new(tx)), rx)
}

pub fn auth_user_with_role(role: &str) -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        username: format!("{}-user", role),
        role: role.to_string(),
        permissions: policy::permissions_for_role(role),
    }
}

pub async fn seed_category(db: &DatabaseConnection, name: &str) -> category::Model {
    category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed category")
}

pub async fn seed_item(
    db: &DatabaseConnection,
    category_id: Uuid,
    sku: &str,
    quantity: i32,
) -> item::Model {
    let status = if quantity == 0 {
        item::ItemStatus::OutOfStock
    } else {
        item::ItemStatus::Available
    };

    item::ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set(sku.to_string()),
        barcode: Set(None),
        name: Set(format!("Item {}", sku)),
        description: Set(None),
        category_id: Set(category_id),
        subcategory_id: Set(None),
        supplier_id: Set(None),
        cost_price: Set(dec!(2.50)),
        selling_price: Set(dec!(5.00)),
        quantity: Set(quantity),
        min_stock_level: Set(5),
        max_stock_level: Set(100),
        status: Set(status.as_str().to_string()),
        location: Set(None),
        shelf: Set(None),
        last_restocked: Set(None),
        created_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed item")
}

pub async fn seed_user(db: &DatabaseConnection, username: &str, role: &str) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set("not-a-real-hash".to_string()),
        role: Set(role.to_string()),
        department_id: Set(None),
        phone: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed user")
}

/// AuthUser matching a seeded user row
pub fn auth_user_for(user: &user::Model) -> AuthUser {
    AuthUser {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role.clone(),
        permissions: policy::permissions_for_role(&user.role),
    }
}
