//! Repositories for tasks and categories.
//!
//! Every operation is filtered by the owning user id; non-owned rows behave
//! exactly like missing rows. Listing supports the same filter/pagination
//! surface the REST API exposes.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension, ToSql};
use uuid::Uuid;

use taskdeck_core::error::TaskdeckError;
use taskdeck_core::types::{Category, Task, TaskPriority, TaskStatus};

use crate::db::Database;
use crate::repository::{epoch_to_datetime, parse_uuid};

/// Maximum accepted title length, matching the API contract.
const MAX_TITLE_LEN: usize = 255;

/// Maximum accepted category name length.
const MAX_NAME_LEN: usize = 100;

/// Fields for creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

impl Default for NewTask {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            category_id: None,
            due_date: None,
        }
    }
}

/// Partial update for a task. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

/// Optional filters for task listing.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<Uuid>,
}

/// Fields for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update for a category. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Repository for tasks, scoped per call by the owning user id.
pub struct TaskRepository {
    db: Arc<Database>,
}

impl TaskRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new task owned by the given user.
    ///
    /// The title must be non-empty after trimming and at most 255
    /// characters; both the REST surface and the chat gateway rely on this
    /// validation living here.
    pub fn create(&self, user_id: Uuid, new_task: NewTask) -> Result<Task, TaskdeckError> {
        let title = new_task.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskdeckError::Validation(
                "title must not be empty".to_string(),
            ));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(TaskdeckError::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }

        let id = Uuid::new_v4();
        let now = Utc::now().timestamp();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, user_id, category_id, title, description, status,
                                    priority, due_date, completed_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9, ?9)",
                rusqlite::params![
                    id.to_string(),
                    user_id.to_string(),
                    new_task.category_id.map(|c| c.to_string()),
                    title,
                    new_task.description,
                    new_task.status.as_str(),
                    new_task.priority.as_str(),
                    new_task.due_date.map(|d| d.to_string()),
                    now,
                ],
            )
            .map_err(|e| TaskdeckError::Storage(format!("Failed to create task: {}", e)))?;

            tracing::info!(task_id = %id, user_id = %user_id, "Task created");

            Ok(Task {
                id,
                user_id,
                category_id: new_task.category_id,
                title,
                description: new_task.description,
                status: new_task.status,
                priority: new_task.priority,
                due_date: new_task.due_date,
                completed_at: None,
                created_at: epoch_to_datetime(now),
                updated_at: epoch_to_datetime(now),
            })
        })
    }

    /// Get a task by id with ownership check.
    pub fn find_for_user(
        &self,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Task>, TaskdeckError> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("{} WHERE id = ?1 AND user_id = ?2", SELECT_TASK),
                    rusqlite::params![task_id.to_string(), user_id.to_string()],
                    |row| Ok(row_to_task(row)),
                )
                .optional()
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            match row {
                Some(task) => Ok(Some(task?)),
                None => Ok(None),
            }
        })
    }

    /// List tasks for a user with optional filters and pagination.
    ///
    /// Returns the page of tasks (most recently created first) and the
    /// total count matching the filters.
    pub fn list_for_user(
        &self,
        user_id: Uuid,
        filter: &TaskFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Task>, u64), TaskdeckError> {
        let mut clauses = String::from("user_id = ?1");
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.to_string())];

        if let Some(status) = filter.status {
            params.push(Box::new(status.as_str().to_string()));
            clauses.push_str(&format!(" AND status = ?{}", params.len()));
        }
        if let Some(priority) = filter.priority {
            params.push(Box::new(priority.as_str().to_string()));
            clauses.push_str(&format!(" AND priority = ?{}", params.len()));
        }
        if let Some(category_id) = filter.category_id {
            params.push(Box::new(category_id.to_string()));
            clauses.push_str(&format!(" AND category_id = ?{}", params.len()));
        }

        self.db.with_conn(|conn| {
            let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

            let total: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM tasks WHERE {}", clauses),
                    param_refs.as_slice(),
                    |row| row.get(0),
                )
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            let mut stmt = conn
                .prepare(&format!(
                    "{} WHERE {} ORDER BY created_at DESC, rowid DESC LIMIT ?{} OFFSET ?{}",
                    SELECT_TASK,
                    clauses,
                    params.len() + 1,
                    params.len() + 2,
                ))
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            let limit_sql = limit as i64;
            let offset_sql = offset as i64;
            let mut page_refs = param_refs;
            page_refs.push(&limit_sql);
            page_refs.push(&offset_sql);

            let rows = stmt
                .query_map(page_refs.as_slice(), |row| Ok(row_to_task(row)))
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            let mut tasks = Vec::new();
            for row in rows {
                let task = row.map_err(|e| TaskdeckError::Storage(e.to_string()))??;
                tasks.push(task);
            }

            tracing::info!(
                user_id = %user_id,
                returned = tasks.len(),
                total,
                "Listed tasks"
            );

            Ok((tasks, total as u64))
        })
    }

    /// The user's most recently created tasks, up to `limit`.
    pub fn list_recent(&self, user_id: Uuid, limit: u64) -> Result<Vec<Task>, TaskdeckError> {
        let (tasks, _) = self.list_for_user(user_id, &TaskFilter::default(), limit, 0)?;
        Ok(tasks)
    }

    /// Partially update a task with ownership check.
    ///
    /// Stamps `updated_at`; sets `completed_at` when the status transitions
    /// into completed. Returns `None` for non-existent or non-owned ids.
    pub fn update(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Task>, TaskdeckError> {
        let Some(mut task) = self.find_for_user(task_id, user_id)? else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(TaskdeckError::Validation(
                    "title must not be empty".to_string(),
                ));
            }
            if title.chars().count() > MAX_TITLE_LEN {
                return Err(TaskdeckError::Validation(format!(
                    "title must be at most {} characters",
                    MAX_TITLE_LEN
                )));
            }
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        let now = Utc::now().timestamp();
        if let Some(status) = patch.status {
            if status == TaskStatus::Completed && task.status != TaskStatus::Completed {
                task.completed_at = Some(epoch_to_datetime(now));
            }
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(category_id) = patch.category_id {
            task.category_id = Some(category_id);
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }

        task.updated_at = epoch_to_datetime(now);

        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE tasks
                 SET category_id = ?1, title = ?2, description = ?3, status = ?4,
                     priority = ?5, due_date = ?6, completed_at = ?7, updated_at = ?8
                 WHERE id = ?9 AND user_id = ?10",
                rusqlite::params![
                    task.category_id.map(|c| c.to_string()),
                    task.title,
                    task.description,
                    task.status.as_str(),
                    task.priority.as_str(),
                    task.due_date.map(|d| d.to_string()),
                    task.completed_at.map(|t| t.timestamp()),
                    now,
                    task_id.to_string(),
                    user_id.to_string(),
                ],
            )
            .map_err(|e| TaskdeckError::Storage(format!("Failed to update task: {}", e)))?;

            tracing::info!(task_id = %task_id, user_id = %user_id, "Task updated");
            Ok(Some(task))
        })
    }

    /// Delete a task with ownership check. Returns whether a row was removed.
    pub fn delete(&self, task_id: Uuid, user_id: Uuid) -> Result<bool, TaskdeckError> {
        self.db.with_conn(|conn| {
            let affected = conn
                .execute(
                    "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
                    rusqlite::params![task_id.to_string(), user_id.to_string()],
                )
                .map_err(|e| TaskdeckError::Storage(format!("Failed to delete task: {}", e)))?;

            if affected > 0 {
                tracing::info!(task_id = %task_id, user_id = %user_id, "Task deleted");
            }
            Ok(affected > 0)
        })
    }
}

/// Repository for categories, scoped per call by the owning user id.
pub struct CategoryRepository {
    db: Arc<Database>,
}

impl CategoryRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new category owned by the given user.
    pub fn create(
        &self,
        user_id: Uuid,
        new_category: NewCategory,
    ) -> Result<Category, TaskdeckError> {
        let name = new_category.name.trim().to_string();
        if name.is_empty() {
            return Err(TaskdeckError::Validation(
                "name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(TaskdeckError::Validation(format!(
                "name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }

        let id = Uuid::new_v4();
        let now = Utc::now().timestamp();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO categories (id, user_id, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![
                    id.to_string(),
                    user_id.to_string(),
                    name,
                    new_category.description,
                    now,
                ],
            )
            .map_err(|e| TaskdeckError::Storage(format!("Failed to create category: {}", e)))?;

            tracing::info!(category_id = %id, user_id = %user_id, "Category created");

            Ok(Category {
                id,
                user_id,
                name,
                description: new_category.description,
                created_at: epoch_to_datetime(now),
                updated_at: epoch_to_datetime(now),
            })
        })
    }

    /// Get a category by id with ownership check.
    pub fn find_for_user(
        &self,
        category_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Category>, TaskdeckError> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, name, description, created_at, updated_at
                     FROM categories WHERE id = ?1 AND user_id = ?2",
                    rusqlite::params![category_id.to_string(), user_id.to_string()],
                    |row| Ok(row_to_category(row)),
                )
                .optional()
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            match row {
                Some(category) => Ok(Some(category?)),
                None => Ok(None),
            }
        })
    }

    /// List categories for a user, ordered by name, with the total count.
    pub fn list_for_user(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Category>, u64), TaskdeckError> {
        self.db.with_conn(|conn| {
            let total: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM categories WHERE user_id = ?1",
                    rusqlite::params![user_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, name, description, created_at, updated_at
                     FROM categories
                     WHERE user_id = ?1
                     ORDER BY name ASC
                     LIMIT ?2 OFFSET ?3",
                )
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![user_id.to_string(), limit as i64, offset as i64],
                    |row| Ok(row_to_category(row)),
                )
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            let mut categories = Vec::new();
            for row in rows {
                let category = row.map_err(|e| TaskdeckError::Storage(e.to_string()))??;
                categories.push(category);
            }

            Ok((categories, total as u64))
        })
    }

    /// Partially update a category with ownership check.
    pub fn update(
        &self,
        category_id: Uuid,
        user_id: Uuid,
        patch: CategoryPatch,
    ) -> Result<Option<Category>, TaskdeckError> {
        let Some(mut category) = self.find_for_user(category_id, user_id)? else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(TaskdeckError::Validation(
                    "name must not be empty".to_string(),
                ));
            }
            if name.chars().count() > MAX_NAME_LEN {
                return Err(TaskdeckError::Validation(format!(
                    "name must be at most {} characters",
                    MAX_NAME_LEN
                )));
            }
            category.name = name;
        }
        if let Some(description) = patch.description {
            category.description = Some(description);
        }

        let now = Utc::now().timestamp();
        category.updated_at = epoch_to_datetime(now);

        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE categories SET name = ?1, description = ?2, updated_at = ?3
                 WHERE id = ?4 AND user_id = ?5",
                rusqlite::params![
                    category.name,
                    category.description,
                    now,
                    category_id.to_string(),
                    user_id.to_string(),
                ],
            )
            .map_err(|e| TaskdeckError::Storage(format!("Failed to update category: {}", e)))?;

            Ok(Some(category))
        })
    }

    /// Delete a category with ownership check. Tasks referencing it are
    /// detached, not deleted.
    pub fn delete(&self, category_id: Uuid, user_id: Uuid) -> Result<bool, TaskdeckError> {
        self.db.with_conn(|conn| {
            let affected = conn
                .execute(
                    "DELETE FROM categories WHERE id = ?1 AND user_id = ?2",
                    rusqlite::params![category_id.to_string(), user_id.to_string()],
                )
                .map_err(|e| {
                    TaskdeckError::Storage(format!("Failed to delete category: {}", e))
                })?;
            Ok(affected > 0)
        })
    }
}

// ============================================================================
// Row mappers
// ============================================================================

const SELECT_TASK: &str = "SELECT id, user_id, category_id, title, description, status, \
     priority, due_date, completed_at, created_at, updated_at FROM tasks";

fn row_to_task(row: &rusqlite::Row<'_>) -> Result<Task, TaskdeckError> {
    let id_str: String = row.get(0).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let user_id_str: String = row.get(1).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let category_id_str: Option<String> =
        row.get(2).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let title: String = row.get(3).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let description: Option<String> =
        row.get(4).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let status_str: String = row.get(5).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let priority_str: String = row.get(6).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let due_date_str: Option<String> =
        row.get(7).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let completed_at: Option<i64> =
        row.get(8).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(9).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let updated_at: i64 = row.get(10).map_err(|e| TaskdeckError::Storage(e.to_string()))?;

    let status = TaskStatus::parse(&status_str)
        .ok_or_else(|| TaskdeckError::Storage(format!("Invalid task status: {}", status_str)))?;
    let priority = TaskPriority::parse(&priority_str).ok_or_else(|| {
        TaskdeckError::Storage(format!("Invalid task priority: {}", priority_str))
    })?;
    let due_date = match due_date_str {
        Some(s) => Some(
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| TaskdeckError::Storage(format!("Invalid due date: {}", e)))?,
        ),
        None => None,
    };

    let category_id = match category_id_str {
        Some(s) => Some(parse_uuid(&s)?),
        None => None,
    };

    Ok(Task {
        id: parse_uuid(&id_str)?,
        user_id: parse_uuid(&user_id_str)?,
        category_id,
        title,
        description,
        status,
        priority,
        due_date,
        completed_at: completed_at.map(epoch_to_datetime),
        created_at: epoch_to_datetime(created_at),
        updated_at: epoch_to_datetime(updated_at),
    })
}

fn row_to_category(row: &rusqlite::Row<'_>) -> Result<Category, TaskdeckError> {
    let id_str: String = row.get(0).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let user_id_str: String = row.get(1).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let name: String = row.get(2).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let description: Option<String> =
        row.get(3).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(4).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let updated_at: i64 = row.get(5).map_err(|e| TaskdeckError::Storage(e.to_string()))?;

    Ok(Category {
        id: parse_uuid(&id_str)?,
        user_id: parse_uuid(&user_id_str)?,
        name,
        description,
        created_at: epoch_to_datetime(created_at),
        updated_at: epoch_to_datetime(updated_at),
    })
}
