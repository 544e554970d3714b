
// Data model representing a user, keyed by a generated id
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

// Data model representing a Todo item owned by a user
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
pub struct Todo {
    pub id: String,
    pub description: String,
    pub done: bool,
    pub user: String,
}
