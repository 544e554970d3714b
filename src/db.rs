use std::str::FromStr;

use sqlx::{
    query, query_as,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use uuid::Uuid;

use crate::{
    config::Config,
    model::{Todo, User},
    schema::UpdateTodoSchema,
};

const CREATE_USERS_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE
);"#;

const CREATE_TODOS_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS todos (
    id TEXT PRIMARY KEY NOT NULL,
    description TEXT NOT NULL,
    done BOOLEAN NOT NULL DEFAULT 0,
    user TEXT NOT NULL
);"#;

// Persistence adapter over the users and todos tables, shared through AppState
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub async fn connect(config: &Config) -> Result<Self, sqlx::Error> {
        let options =
            SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    // Every connection to sqlite::memory: is a separate database, so keep just one
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.bootstrap().await?;
        Ok(db)
    }

    pub async fn bootstrap(&self) -> Result<(), sqlx::Error> {
        query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        query(CREATE_TODOS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT id, username FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    // The flag is true when this call inserted the row. A racing insert of the
    // same name hits the unique constraint and reads back the surviving row.
    pub async fn find_or_create_user(
        &self,
        username: &str,
    ) -> Result<(User, bool), sqlx::Error> {
        if let Some(user) = self.find_user_by_username(username).await? {
            return Ok((user, false));
        }

        let inserted = query(
            "INSERT INTO users (id, username) VALUES (?, ?) ON CONFLICT(username) DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(username)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let user = query_as::<_, User>("SELECT id, username FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok((user, inserted == 1))
    }

    pub async fn create_todo(
        &self,
        user_id: &str,
        description: &str,
        done: bool,
    ) -> Result<Todo, sqlx::Error> {
        query_as::<_, Todo>(
            r#"INSERT INTO todos (id, description, done, user) VALUES (?, ?, ?, ?)
            RETURNING id, description, done, user"#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(description)
        .bind(done)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_todos(&self, user_id: &str) -> Result<Vec<Todo>, sqlx::Error> {
        query_as::<_, Todo>("SELECT id, description, done, user FROM todos WHERE user = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    // Only matches when user_id owns this exact todo
    pub async fn find_owned_todo(
        &self,
        user_id: &str,
        todo_id: &str,
    ) -> Result<Option<Todo>, sqlx::Error> {
        query_as::<_, Todo>(
            "SELECT id, description, done, user FROM todos WHERE id = ? AND user = ?",
        )
        .bind(todo_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    // Absent fields keep their stored value
    pub async fn update_todo(
        &self,
        todo_id: &str,
        changes: &UpdateTodoSchema,
    ) -> Result<Option<Todo>, sqlx::Error> {
        query_as::<_, Todo>(
            r#"UPDATE todos
            SET description = COALESCE(?, description),
                done = COALESCE(?, done),
                user = COALESCE(?, user)
            WHERE id = ?
            RETURNING id, description, done, user"#,
        )
        .bind(changes.description.as_deref())
        .bind(changes.done)
        .bind(changes.user.as_deref())
        .bind(todo_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_todo(&self, todo_id: &str) -> Result<Option<Todo>, sqlx::Error> {
        query_as::<_, Todo>("DELETE FROM todos WHERE id = ? RETURNING id, description, done, user")
            .bind(todo_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_or_create_user_is_idempotent() {
        let db = Database::in_memory().await.unwrap();

        let (first, created) = db.find_or_create_user("alice").await.unwrap();
        assert!(created);
        assert_eq!(first.username, "alice");

        let (second, created) = db.find_or_create_user("alice").await.unwrap();
        assert!(!created);
        assert_eq!(first, second);

        let (bob, _) = db.find_or_create_user("bob").await.unwrap();
        assert_ne!(bob.id, first.id);
    }

    #[tokio::test]
    async fn concurrent_session_requests_yield_one_user() {
        let db = Database::in_memory().await.unwrap();

        let (a, b) = tokio::join!(
            db.find_or_create_user("carol"),
            db.find_or_create_user("carol")
        );
        assert_eq!(a.unwrap().0, b.unwrap().0);
    }

    #[tokio::test]
    async fn list_is_scoped_to_user() {
        let db = Database::in_memory().await.unwrap();

        let milk = db.create_todo("u1", "buy milk", false).await.unwrap();
        let bread = db.create_todo("u1", "buy bread", true).await.unwrap();
        db.create_todo("u2", "walk dog", false).await.unwrap();

        let mut todos = db.list_todos("u1").await.unwrap();
        todos.sort_by(|a, b| a.description.cmp(&b.description));
        assert_eq!(todos, vec![bread, milk]);

        assert!(db.list_todos("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn owned_lookup_requires_matching_user() {
        let db = Database::in_memory().await.unwrap();
        let todo = db.create_todo("u1", "buy milk", false).await.unwrap();
        db.create_todo("u2", "walk dog", false).await.unwrap();

        assert_eq!(db.find_owned_todo("u1", &todo.id).await.unwrap(), Some(todo.clone()));
        assert_eq!(db.find_owned_todo("u2", &todo.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let db = Database::in_memory().await.unwrap();
        let todo = db.create_todo("u1", "buy milk", false).await.unwrap();

        let changes = UpdateTodoSchema {
            done: Some(true),
            ..Default::default()
        };
        let updated = db.update_todo(&todo.id, &changes).await.unwrap().unwrap();
        assert!(updated.done);
        assert_eq!(updated.description, "buy milk");
        assert_eq!(updated.user, "u1");
        assert_eq!(updated.id, todo.id);

        assert!(db.update_todo("missing", &changes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_returns_removed_row() {
        let db = Database::in_memory().await.unwrap();
        let todo = db.create_todo("u1", "buy milk", false).await.unwrap();

        assert_eq!(db.delete_todo(&todo.id).await.unwrap(), Some(todo.clone()));
        assert_eq!(db.delete_todo(&todo.id).await.unwrap(), None);
        assert!(db.list_todos("u1").await.unwrap().is_empty());
    }
}
