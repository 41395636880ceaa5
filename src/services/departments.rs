use crate::{db::DbPool, entities::department, errors::ServiceError};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateDepartmentInput {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDepartmentInput {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

pub struct DepartmentService {
    db: Arc<DbPool>,
}

impl DepartmentService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        input: CreateDepartmentInput,
    ) -> Result<department::Model, ServiceError> {
        let db = self.db.as_ref();

        let duplicate = department::Entity::find()
            .filter(department::Column::Name.eq(input.name.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Department {} already exists",
                input.name
            )));
        }

        department::ActiveModel {
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
        department_id: Uuid,
        input: UpdateDepartmentInput,
    ) -> Result<department::Model, ServiceError> {
        let db = self.db.as_ref();

        let existing = department::Entity::find_by_id(department_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Department {} not found", department_id))
            })?;

        if let Some(new_name) = &input.name {
            if *new_name != existing.name {
                let duplicate = department::Entity::find()
                    .filter(department::Column::Name.eq(new_name.clone()))
                    .one(db)
                    .await
                    .map_err(ServiceError::db_error)?;
                if duplicate.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Department {} already exists",
                        new_name
                    )));
                }
            }
        }

        let mut active: department::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }

        active.update(db).await.map_err(ServiceError::db_error)
    }

    pub async fn delete(&self, department_id: Uuid) -> Result<(), ServiceError> {
        let db = self.db.as_ref();

        let existing = department::Entity::find_by_id(department_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Department {} not found", department_id))
            })?;

        department::Entity::delete_by_id(existing.id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(())
    }

    pub async fn get(&self, department_id: Uuid) -> Result<department::Model, ServiceError> {
        department::Entity::find_by_id(department_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Department {} not found", department_id))
            })
    }

    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<department::Model>, u64), ServiceError> {
        let paginator = department::Entity::find()
            .order_by_asc(department::Column::Name)
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
