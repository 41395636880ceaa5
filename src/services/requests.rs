use crate::{
    auth::{
        policy::{self, Action, ResourceKind},
        AuthUser,
    },
    db::DbPool,
    entities::{
        item,
        item_request::{self, RequestStatus},
        requested_item,
        stock_transaction::TransactionKind,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_ledger::{apply_in_txn, StockInput},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// One line of a new request
#[derive(Debug, Clone)]
pub struct RequestLine {
    pub item_id: Uuid,
    pub quantity: i32,
}

/// Input for creating an item request
#[derive(Debug, Clone)]
pub struct CreateRequestInput {
    pub department_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub notes: Option<String>,
    pub lines: Vec<RequestLine>,
}

/// A request header together with its lines
#[derive(Debug, Clone)]
pub struct RequestWithLines {
    pub request: item_request::Model,
    pub lines: Vec<requested_item::Model>,
}

/// Item request workflow: submit, approve or reject, then fulfill.
/// Fulfillment debits stock for every line in one transaction.
pub struct RequestService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl RequestService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Submits a new request in the pending state
    pub async fn create(
        &self,
        requester: &AuthUser,
        input: CreateRequestInput,
    ) -> Result<RequestWithLines, ServiceError> {
        if input.lines.is_empty() {
            return Err(ServiceError::InvalidInput(
                "A request needs at least one line".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for line in &input.lines {
            if line.quantity <= 0 {
                return Err(ServiceError::InvalidInput(
                    "Requested quantity must be positive".to_string(),
                ));
            }
            if !seen.insert(line.item_id) {
                return Err(ServiceError::InvalidInput(format!(
                    "Item {} appears more than once",
                    line.item_id
                )));
            }
        }

        let requester_id = requester.user_id;
        let result = self
            .db
            .transaction::<_, RequestWithLines, ServiceError>(move |txn| {
                Box::pin(async move {
                    for line in &input.lines {
                        let exists = item::Entity::find_by_id(line.item_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                        if exists.is_none() {
                            return Err(ServiceError::NotFound(format!(
                                "Item {} not found",
                                line.item_id
                            )));
                        }
                    }

                    let request = item_request::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        requester_id: Set(requester_id),
                        department_id: Set(input.department_id),
                        event_id: Set(input.event_id),
                        status: Set(RequestStatus::Pending.as_str().to_string()),
                        notes: Set(input.notes.clone()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut lines = Vec::with_capacity(input.lines.len());
                    for line in &input.lines {
                        let row = requested_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            request_id: Set(request.id),
                            item_id: Set(line.item_id),
                            quantity: Set(line.quantity),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        lines.push(row);
                    }

                    Ok(RequestWithLines { request, lines })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(request_id = %result.request.id, lines = result.lines.len(), "item request submitted");

        self.event_sender
            .send(Event::RequestSubmitted(result.request.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(result)
    }

    /// Fetches a request with its lines
    pub async fn get(&self, request_id: Uuid) -> Result<RequestWithLines, ServiceError> {
        let db = self.db.as_ref();

        let request = item_request::Entity::find_by_id(request_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {} not found", request_id)))?;

        let lines = requested_item::Entity::find()
            .filter(requested_item::Column::RequestId.eq(request_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(RequestWithLines { request, lines })
    }

    /// Lists requests, newest first, optionally filtered by status
    pub async fn list(
        &self,
        status: Option<RequestStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<item_request::Model>, u64), ServiceError> {
        let mut query = item_request::Entity::find();
        if let Some(status) = status {
            query = query.filter(item_request::Column::Status.eq(status.as_str()));
        }

        let paginator = query
            .order_by_desc(item_request::Column::CreatedAt)
            .paginate(self.db.as_ref(), per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((rows, total))
    }

    /// Approves a pending request, stamping who decided and when
    pub async fn approve(
        &self,
        actor: &AuthUser,
        request_id: Uuid,
    ) -> Result<item_request::Model, ServiceError> {
        policy::authorize(actor, Action::Approve, ResourceKind::Requests)?;

        let approved = self
            .transition(request_id, RequestStatus::Approved, actor.user_id)
            .await?;

        self.event_sender
            .send(Event::RequestApproved {
                request_id,
                approver: actor.user_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(approved)
    }

    /// Rejects a pending request
    pub async fn reject(
        &self,
        actor: &AuthUser,
        request_id: Uuid,
    ) -> Result<item_request::Model, ServiceError> {
        policy::authorize(actor, Action::Approve, ResourceKind::Requests)?;

        let rejected = self
            .transition(request_id, RequestStatus::Rejected, actor.user_id)
            .await?;

        self.event_sender
            .send(Event::RequestRejected {
                request_id,
                approver: actor.user_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(rejected)
    }

    async fn transition(
        &self,
        request_id: Uuid,
        target: RequestStatus,
        decided_by: Uuid,
    ) -> Result<item_request::Model, ServiceError> {
        self.db
            .transaction::<_, item_request::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let request = item_request::Entity::find_by_id(request_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Request {} not found", request_id))
                        })?;

                    let current = request.status().ok_or_else(|| {
                        ServiceError::InternalError(format!(
                            "Request {} has unknown status {}",
                            request_id, request.status
                        ))
                    })?;

                    if !current.can_transition_to(target) {
                        return Err(ServiceError::InvalidTransition(format!(
                            "Cannot move request from {} to {}",
                            current.as_str(),
                            target.as_str()
                        )));
                    }

                    let mut active: item_request::ActiveModel = request.into();
                    active.status = Set(target.as_str().to_string());
                    active.approved_by = Set(Some(decided_by));
                    active.approved_at = Set(Some(Utc::now()));

                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })
    }

    /// Fulfills an approved request, debiting stock for every line. Either
    /// every line is debited or the request stays approved untouched.
    pub async fn fulfill(
        &self,
        actor: &AuthUser,
        request_id: Uuid,
    ) -> Result<RequestWithLines, ServiceError> {
        policy::authorize(actor, Action::Fulfill, ResourceKind::Requests)?;

        let actor_id = actor.user_id;
        type FulfillOutcome = (
            RequestWithLines,
            Vec<(crate::entities::stock_transaction::Model, item::Model)>,
        );

        let (result, movements) = self
            .db
            .transaction::<_, FulfillOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let request = item_request::Entity::find_by_id(request_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Request {} not found", request_id))
                        })?;

                    let current = request.status().ok_or_else(|| {
                        ServiceError::InternalError(format!(
                            "Request {} has unknown status {}",
                            request_id, request.status
                        ))
                    })?;

                    if !current.can_transition_to(RequestStatus::Fulfilled) {
                        return Err(ServiceError::InvalidTransition(format!(
                            "Cannot fulfill a request in the {} state",
                            current.as_str()
                        )));
                    }

                    let lines = requested_item::Entity::find()
                        .filter(requested_item::Column::RequestId.eq(request_id))
                        .order_by_asc(requested_item::Column::Id)
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let mut movements = Vec::with_capacity(lines.len());
                    for line in &lines {
                        let input = StockInput {
                            kind: TransactionKind::Out,
                            quantity: line.quantity,
                            notes: None,
                            reference: Some(format!("request:{}", request_id)),
                            event_id: request.event_id,
                            created_by: actor_id,
                        };
                        let movement = apply_in_txn(txn, line.item_id, &input).await?;
                        movements.push(movement);
                    }

                    let mut active: item_request::ActiveModel = request.into();
                    active.status = Set(RequestStatus::Fulfilled.as_str().to_string());
                    active.fulfilled_at = Set(Some(Utc::now()));
                    let updated = active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok((
                        RequestWithLines {
                            request: updated,
                            lines,
                        },
                        movements,
                    ))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            request_id = %request_id,
            lines = result.lines.len(),
            "item request fulfilled"
        );

        for (ledger_row, updated_item) in &movements {
            self.event_sender
                .send(Event::StockApplied {
                    item_id: updated_item.id,
                    transaction_id: ledger_row.id,
                    kind: ledger_row.kind.clone(),
                    previous_quantity: ledger_row.previous_quantity,
                    new_quantity: ledger_row.new_quantity,
                })
                .await
                .map_err(ServiceError::EventError)?;

            if updated_item.is_low_stock() {
                self.event_sender
                    .send(Event::LowStock {
                        item_id: updated_item.id,
                        quantity: updated_item.quantity,
                        min_stock_level: updated_item.min_stock_level,
                    })
                    .await
                    .map_err(ServiceError::EventError)?;
            }
        }

        self.event_sender
            .send(Event::RequestFulfilled {
                request_id,
                lines: result.lines.len(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(result)
    }
}
