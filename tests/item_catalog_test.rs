mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{event_channel, seed_category, setup_db};
use stockroom_api::{
    errors::ServiceError,
    services::items::{CreateItemInput, ItemService, UpdateItemInput},
};

fn new_item(category_id: Uuid, sku: &str, barcode: Option<&str>) -> CreateItemInput {
    CreateItemInput {
        sku: sku.to_string(),
        barcode: barcode.map(str::to_string),
        name: format!("Item {}", sku),
        description: None,
        category_id,
        subcategory_id: None,
        supplier_id: None,
        cost_price: dec!(1.00),
        selling_price: dec!(2.00),
        min_stock_level: 5,
        max_stock_level: 50,
        location: None,
        shelf: None,
    }
}

#[tokio::test]
async fn barcodes_are_unique_across_items() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = ItemService::new(db.clone(), sender);

    let category = seed_category(&db, "Hardware").await;
    service
        .create(None, new_item(category.id, "BOLT", Some("4006381333931")))
        .await
        .expect("first item");

    let err = service
        .create(None, new_item(category.id, "NUT", Some("4006381333931")))
        .await
        .expect_err("same barcode");
    assert_matches!(err, ServiceError::Conflict(_));

    // No barcode at all is always fine
    service
        .create(None, new_item(category.id, "WASHER", None))
        .await
        .expect("barcode-less item");
}

#[tokio::test]
async fn updating_to_an_in_use_barcode_is_rejected() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = ItemService::new(db.clone(), sender);

    let category = seed_category(&db, "Hardware").await;
    let bolt = service
        .create(None, new_item(category.id, "BOLT", Some("4006381333931")))
        .await
        .unwrap();
    let nut = service
        .create(None, new_item(category.id, "NUT", Some("5012345678900")))
        .await
        .unwrap();

    let err = service
        .update(
            nut.id,
            UpdateItemInput {
                barcode: Some(Some("4006381333931".to_string())),
                ..Default::default()
            },
        )
        .await
        .expect_err("barcode belongs to another item");
    assert_matches!(err, ServiceError::Conflict(_));

    // Re-sending an item's own barcode is not a conflict
    let unchanged = service
        .update(
            bolt.id,
            UpdateItemInput {
                barcode: Some(Some("4006381333931".to_string())),
                name: Some("Hex bolt".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("own barcode");
    assert_eq!(unchanged.barcode.as_deref(), Some("4006381333931"));
    assert_eq!(unchanged.name, "Hex bolt");
}
