// Struct representing the request body for opening a session
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SessionSchema {
    pub username: String,
}

// Struct representing the request body for creating a new Todo
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CreateTodoSchema {
    pub description: String,
    pub done: bool,
}

// Struct representing the request body for updating a Todo.
// Absent fields are left untouched.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct UpdateTodoSchema {
    pub description: Option<String>,
    pub done: Option<bool>,
    pub user: Option<String>,
}
