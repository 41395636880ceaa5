mod common;

use assert_matches::assert_matches;
use sea_orm::EntityTrait;
use uuid::Uuid;

use common::{auth_user_for, event_channel, seed_category, seed_item, seed_user, setup_db};
use stockroom_api::{
    entities::{
        item,
        item_request::RequestStatus,
        stock_transaction::{self, TransactionKind},
    },
    errors::ServiceError,
    services::requests::{CreateRequestInput, RequestLine, RequestService},
};

fn line(item_id: Uuid, quantity: i32) -> RequestLine {
    RequestLine { item_id, quantity }
}

fn request_input(lines: Vec<RequestLine>) -> CreateRequestInput {
    CreateRequestInput {
        department_id: None,
        event_id: None,
        notes: None,
        lines,
    }
}

#[tokio::test]
async fn submitted_requests_start_pending_with_their_lines() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = RequestService::new(db.clone(), sender);

    let category = seed_category(&db, "Office").await;
    let pens = seed_item(&db, category.id, "PEN", 50).await;
    let pads = seed_item(&db, category.id, "PAD", 30).await;

    let requester = seed_user(&db, "alex", "staff").await;
    let created = service
        .create(
            &auth_user_for(&requester),
            request_input(vec![line(pens.id, 5), line(pads.id, 2)]),
        )
        .await
        .expect("request should be created");

    assert_eq!(created.request.status(), Some(RequestStatus::Pending));
    assert_eq!(created.request.requester_id, requester.id);
    assert_eq!(created.lines.len(), 2);
    assert!(created.request.approved_by.is_none());
    assert!(created.request.fulfilled_at.is_none());
}

#[tokio::test]
async fn malformed_requests_are_rejected_up_front() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = RequestService::new(db.clone(), sender);

    let category = seed_category(&db, "Office").await;
    let pens = seed_item(&db, category.id, "PEN", 50).await;
    let requester = seed_user(&db, "alex", "staff").await;
    let actor = auth_user_for(&requester);

    let err = service
        .create(&actor, request_input(vec![]))
        .await
        .expect_err("empty line list");
    assert_matches!(err, ServiceError::InvalidInput(_));

    let err = service
        .create(&actor, request_input(vec![line(pens.id, 0)]))
        .await
        .expect_err("non-positive quantity");
    assert_matches!(err, ServiceError::InvalidInput(_));

    let err = service
        .create(&actor, request_input(vec![line(pens.id, 1), line(pens.id, 2)]))
        .await
        .expect_err("duplicate item");
    assert_matches!(err, ServiceError::InvalidInput(_));

    let err = service
        .create(&actor, request_input(vec![line(Uuid::new_v4(), 1)]))
        .await
        .expect_err("unknown item");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn approval_stamps_the_approver() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = RequestService::new(db.clone(), sender);

    let category = seed_category(&db, "Office").await;
    let pens = seed_item(&db, category.id, "PEN", 50).await;
    let requester = seed_user(&db, "alex", "staff").await;
    let manager = seed_user(&db, "morgan", "manager").await;

    let created = service
        .create(
            &auth_user_for(&requester),
            request_input(vec![line(pens.id, 5)]),
        )
        .await
        .unwrap();

    let approved = service
        .approve(&auth_user_for(&manager), created.request.id)
        .await
        .expect("manager can approve");

    assert_eq!(approved.status(), Some(RequestStatus::Approved));
    assert_eq!(approved.approved_by, Some(manager.id));
    assert!(approved.approved_at.is_some());
}

#[tokio::test]
async fn rejection_is_terminal() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = RequestService::new(db.clone(), sender);

    let category = seed_category(&db, "Office").await;
    let pens = seed_item(&db, category.id, "PEN", 50).await;
    let requester = seed_user(&db, "alex", "staff").await;
    let manager = seed_user(&db, "morgan", "manager").await;
    let manager_auth = auth_user_for(&manager);

    let created = service
        .create(
            &auth_user_for(&requester),
            request_input(vec![line(pens.id, 5)]),
        )
        .await
        .unwrap();

    let rejected = service
        .reject(&manager_auth, created.request.id)
        .await
        .expect("manager can reject");
    assert_eq!(rejected.status(), Some(RequestStatus::Rejected));

    let err = service
        .approve(&manager_auth, created.request.id)
        .await
        .expect_err("rejected requests cannot be approved");
    assert_matches!(err, ServiceError::InvalidTransition(_));

    let err = service
        .fulfill(&manager_auth, created.request.id)
        .await
        .expect_err("rejected requests cannot be fulfilled");
    assert_matches!(err, ServiceError::InvalidTransition(_));
}

#[tokio::test]
async fn fulfillment_debits_every_line() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = RequestService::new(db.clone(), sender);

    let category = seed_category(&db, "Office").await;
    let pens = seed_item(&db, category.id, "PEN", 50).await;
    let pads = seed_item(&db, category.id, "PAD", 30).await;
    let requester = seed_user(&db, "alex", "staff").await;
    let manager = seed_user(&db, "morgan", "manager").await;
    let manager_auth = auth_user_for(&manager);

    let created = service
        .create(
            &auth_user_for(&requester),
            request_input(vec![line(pens.id, 5), line(pads.id, 2)]),
        )
        .await
        .unwrap();

    service.approve(&manager_auth, created.request.id).await.unwrap();
    let fulfilled = service
        .fulfill(&manager_auth, created.request.id)
        .await
        .expect("fulfillment should succeed");

    assert_eq!(fulfilled.request.status(), Some(RequestStatus::Fulfilled));
    assert!(fulfilled.request.fulfilled_at.is_some());

    let pens_after = item::Entity::find_by_id(pens.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let pads_after = item::Entity::find_by_id(pads.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pens_after.quantity, 45);
    assert_eq!(pads_after.quantity, 28);

    // One outbound ledger row per line, tagged with the request
    let ledger_rows = stock_transaction::Entity::find()
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(ledger_rows.len(), 2);
    for row in &ledger_rows {
        assert_eq!(row.kind(), Some(TransactionKind::Out));
        assert_eq!(
            row.reference.as_deref(),
            Some(format!("request:{}", created.request.id).as_str())
        );
    }
}

#[tokio::test]
async fn fulfillment_rolls_back_entirely_when_one_line_cannot_be_covered() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = RequestService::new(db.clone(), sender);

    let category = seed_category(&db, "Office").await;
    let pens = seed_item(&db, category.id, "PEN", 50).await;
    let pads = seed_item(&db, category.id, "PAD", 1).await;
    let requester = seed_user(&db, "alex", "staff").await;
    let manager = seed_user(&db, "morgan", "manager").await;
    let manager_auth = auth_user_for(&manager);

    let created = service
        .create(
            &auth_user_for(&requester),
            request_input(vec![line(pens.id, 5), line(pads.id, 3)]),
        )
        .await
        .unwrap();

    service.approve(&manager_auth, created.request.id).await.unwrap();
    let err = service
        .fulfill(&manager_auth, created.request.id)
        .await
        .expect_err("second line overdraws");
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // Nothing moved, including the line that could have been covered
    let pens_after = item::Entity::find_by_id(pens.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pens_after.quantity, 50);

    let reloaded = service.get(created.request.id).await.unwrap();
    assert_eq!(reloaded.request.status(), Some(RequestStatus::Approved));
    assert!(reloaded.request.fulfilled_at.is_none());
}

#[tokio::test]
async fn pending_requests_cannot_be_fulfilled_directly() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = RequestService::new(db.clone(), sender);

    let category = seed_category(&db, "Office").await;
    let pens = seed_item(&db, category.id, "PEN", 50).await;
    let requester = seed_user(&db, "alex", "staff").await;
    let manager = seed_user(&db, "morgan", "manager").await;

    let created = service
        .create(
            &auth_user_for(&requester),
            request_input(vec![line(pens.id, 5)]),
        )
        .await
        .unwrap();

    let err = service
        .fulfill(&auth_user_for(&manager), created.request.id)
        .await
        .expect_err("approval must come first");
    assert_matches!(err, ServiceError::InvalidTransition(_));
}

#[tokio::test]
async fn viewers_cannot_decide_or_fulfill() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = RequestService::new(db.clone(), sender);

    let category = seed_category(&db, "Office").await;
    let pens = seed_item(&db, category.id, "PEN", 50).await;
    let requester = seed_user(&db, "alex", "staff").await;
    let viewer = seed_user(&db, "casey", "viewer").await;
    let viewer_auth = auth_user_for(&viewer);

    let created = service
        .create(
            &auth_user_for(&requester),
            request_input(vec![line(pens.id, 5)]),
        )
        .await
        .unwrap();

    let err = service
        .approve(&viewer_auth, created.request.id)
        .await
        .expect_err("viewers cannot approve");
    assert_matches!(err, ServiceError::Forbidden(_));

    let err = service
        .fulfill(&viewer_auth, created.request.id)
        .await
        .expect_err("viewers cannot fulfill");
    assert_matches!(err, ServiceError::Forbidden(_));

    let untouched = service.get(created.request.id).await.unwrap();
    assert_eq!(untouched.request.status(), Some(RequestStatus::Pending));
}

#[tokio::test]
async fn listing_filters_by_status() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let service = RequestService::new(db.clone(), sender);

    let category = seed_category(&db, "Office").await;
    let pens = seed_item(&db, category.id, "PEN", 50).await;
    let requester = seed_user(&db, "alex", "staff").await;
    let manager = seed_user(&db, "morgan", "manager").await;
    let requester_auth = auth_user_for(&requester);

    let first = service
        .create(&requester_auth, request_input(vec![line(pens.id, 1)]))
        .await
        .unwrap();
    service
        .create(&requester_auth, request_input(vec![line(pens.id, 2)]))
        .await
        .unwrap();

    service
        .approve(&auth_user_for(&manager), first.request.id)
        .await
        .unwrap();

    let (pending, pending_total) = service
        .list(Some(RequestStatus::Pending), 1, 10)
        .await
        .unwrap();
    assert_eq!(pending_total, 1);
    assert_eq!(pending.len(), 1);

    let (all, all_total) = service.list(None, 1, 10).await.unwrap();
    assert_eq!(all_total, 2);
    assert_eq!(all.len(), 2);
}
