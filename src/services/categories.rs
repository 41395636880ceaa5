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
pub struct CreateCategoryInput {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

pub struct CategoryService {
    db: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateCategoryInput) -> Result<category::Model, ServiceError> {
        let db = self.db.as_ref();

        let duplicate = category::Entity::find()
            .filter(category::Column::Name.eq(input.name.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category {} already exists",
                input.name
            )));
        }

        category::ActiveModel {
            id: Set(Uuid::new_v4()),
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
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        let db = self.db.as_ref();

        let existing = category::Entity::find_by_id(category_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;

        if let Some(new_name) = &input.name {
            if *new_name != existing.name {
                let duplicate = category::Entity::find()
                    .filter(category::Column::Name.eq(new_name.clone()))
                    .one(db)
                    .await
                    .map_err(ServiceError::db_error)?;
                if duplicate.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Category {} already exists",
                        new_name
                    )));
                }
            }
        }

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }

        active.update(db).await.map_err(ServiceError::db_error)
    }

    pub async fn delete(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db.as_ref();

        let existing = category::Entity::find_by_id(category_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;

        // Items and subcategories cascade with the category
        category::Entity::delete_by_id(existing.id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(())
    }

    pub async fn get(&self, category_id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(category_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<category::Model>, u64), ServiceError> {
        let paginator = category::Entity::find()
            .order_by_asc(category::Column::Name)
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

    /// Subcategories of one category, alphabetical
    pub async fn subcategories(
        &self,
        category_id: Uuid,
    ) -> Result<Vec<subcategory::Model>, ServiceError> {
        self.get(category_id).await?;

        subcategory::Entity::find()
            .filter(subcategory::Column::CategoryId.eq(category_id))
            .order_by_asc(subcategory::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
