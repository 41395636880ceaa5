use crate::{db::DbPool, entities::event, errors::ServiceError};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateEventInput {
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateEventInput {
    pub name: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
}

/// Occasions that requests and stock movements can be attributed to
pub struct EventService {
    db: Arc<DbPool>,
}

impl EventService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateEventInput) -> Result<event::Model, ServiceError> {
        if input.ends_on < input.starts_on {
            return Err(ServiceError::InvalidInput(
                "Event cannot end before it starts".to_string(),
            ));
        }

        event::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            starts_on: Set(input.starts_on),
            ends_on: Set(input.ends_on),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)
    }

    pub async fn update(
        &self,
        event_id: Uuid,
        input: UpdateEventInput,
    ) -> Result<event::Model, ServiceError> {
        let db = self.db.as_ref();

        let existing = event::Entity::find_by_id(event_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Event {} not found", event_id)))?;

        let starts_on = input.starts_on.unwrap_or(existing.starts_on);
        let ends_on = input.ends_on.unwrap_or(existing.ends_on);
        if ends_on < starts_on {
            return Err(ServiceError::InvalidInput(
                "Event cannot end before it starts".to_string(),
            ));
        }

        let mut active: event::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        active.starts_on = Set(starts_on);
        active.ends_on = Set(ends_on);
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }

        active.update(db).await.map_err(ServiceError::db_error)
    }

    pub async fn delete(&self, event_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db.as_ref();

        let existing = event::Entity::find_by_id(event_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Event {} not found", event_id)))?;

        event::Entity::delete_by_id(existing.id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(())
    }

    pub async fn get(&self, event_id: Uuid) -> Result<event::Model, ServiceError> {
        event::Entity::find_by_id(event_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Event {} not found", event_id)))
    }

    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<event::Model>, u64), ServiceError> {
        let paginator = event::Entity::find()
            .order_by_desc(event::Column::StartsOn)
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
}
