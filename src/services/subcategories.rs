use crate::{
    db::DbPool,
    entities::{category, subcategory},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateSubcategoryInput {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSubcategoryInput {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

pub struct SubcategoryService {
    db: Arc<DbPool>,
}

impl SubcategoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        input: CreateSubcategoryInput,
    ) -> Result<subcategory::Model, ServiceError> {
        let db = self.db.as_ref();

        let parent = category::Entity::find_by_id(input.category_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if parent.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                input.category_id
            )));
        }

        // Name is unique within the parent category only
        let duplicate = subcategory::Entity::find()
            .filter(subcategory::Column::CategoryId.eq(input.category_id))
            .filter(subcategory::Column::Name.eq(input.name.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Subcategory {} already exists in this category",
                input.name
            )));
        }

        subcategory::ActiveModel {
            id: Set(Uuid::new_v4()),
            category_id: Set(input.category_id),
            name: Set(input.name),
            description: Set(input.description),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)
    }

    pub async fn update(
        &self,
        subcategory_id: Uuid,
        input: UpdateSubcategoryInput,
    ) -> Result<subcategory::Model, ServiceError> {
        let db = self.db.as_ref();

        let existing = subcategory::Entity::find_by_id(subcategory_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Subcategory {} not found", subcategory_id))
            })?;

        if let Some(new_name) = &input.name {
            if *new_name != existing.name {
                let duplicate = subcategory::Entity::find()
                    .filter(subcategory::Column::CategoryId.eq(existing.category_id))
                    .filter(subcategory::Column::Name.eq(new_name.clone()))
                    .one(db)
                    .await
                    .map_err(ServiceError::db_error)?;
                if duplicate.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Subcategory {} already exists in this category",
                        new_name
                    )));
                }
            }
        }

        let mut active: subcategory::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }

        active.update(db).await.map_err(ServiceError::db_error)
    }

    pub async fn delete(&self, subcategory_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db.as_ref();

        let existing = subcategory::Entity::find_by_id(subcategory_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Subcategory {} not found", subcategory_id))
            })?;

        subcategory::Entity::delete_by_id(existing.id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(())
    }

    pub async fn get(&self, subcategory_id: Uuid) -> Result<subcategory::Model, ServiceError> {
        subcategory::Entity::find_by_id(subcategory_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Subcategory {} not found", subcategory_id))
            })
    }

    pub async fn list(
        &self,
        category_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<subcategory::Model>, u64), ServiceError> {
        let mut query = subcategory::Entity::find();
        if let Some(category_id) = category_id {
            query = query.filter(subcategory::Column::CategoryId.eq(category_id));
        }

        let paginator = query
            .order_by_asc(subcategory::Column::Name)
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
