//! JSON REST resources under `/api/v1`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::domain::todo::{TodoFields, TodoView, todo_location};
use crate::domain::user::UserView;

use super::extract::{ApiInput, ApiUser, FieldErrors};
use super::{AppState, error::ApiError, run_blocking};

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

fn todo_fields(input: &ApiInput) -> Result<TodoFields, ApiError> {
    let mut errors = FieldErrors::default();
    let name = input.text("name", "no todo name provided", &mut errors);
    let completed = input.flag("completed", "no completion status provided", &mut errors);

    match (name, completed) {
        (Some(name), Some(completed)) => Ok(TodoFields { name, completed }),
        _ => Err(errors.into()),
    }
}

/// Ids that are not integers name no todo.
fn todo_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::NotFound("todo not found".into()))
}

fn todo_response(status: StatusCode, view: TodoView) -> Response {
    (
        status,
        [(header::LOCATION, todo_location(view.id))],
        Json(view),
    )
        .into_response()
}

pub async fn list_todos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TodoView>>, ApiError> {
    let todos = state.todos.list_todos()?;
    Ok(Json(todos.iter().map(TodoView::from).collect()))
}

pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    ApiUser(user): ApiUser,
    input: ApiInput,
) -> Result<Response, ApiError> {
    let fields = todo_fields(&input)?;
    let todo = state.todos.create_todo(&fields)?;
    tracing::info!(todo_id = todo.id, user_id = user.id, "todo created");
    Ok(todo_response(StatusCode::CREATED, TodoView::from(&todo)))
}

/// A missing id answers 404 before credentials or the body are looked at.
fn require_todo(state: &AppState, id: i64) -> Result<(), ApiError> {
    match state.todos.get_todo(id)? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("todo {id} not found"))),
    }
}

pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
    input: Result<ApiInput, ApiError>,
) -> Result<Response, ApiError> {
    let id = todo_id(path)?;
    require_todo(&state, id)?;
    let ApiUser(user) = ApiUser::from_headers(&headers, &state).await?;

    let fields = todo_fields(&input?)?;
    let todo = state.todos.update_todo(id, &fields)?;
    tracing::info!(todo_id = id, user_id = user.id, "todo updated");
    Ok(todo_response(StatusCode::OK, TodoView::from(&todo)))
}

pub async fn delete_todo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = todo_id(path)?;
    require_todo(&state, id)?;
    let ApiUser(user) = ApiUser::from_headers(&headers, &state).await?;

    state.todos.delete_todo(id)?;
    tracing::info!(todo_id = id, user_id = user.id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiUser(caller): ApiUser,
    input: ApiInput,
) -> Result<Response, ApiError> {
    let mut errors = FieldErrors::default();
    let username = input.text("username", "no username provided", &mut errors);
    let password = input.text("password", "no password provided", &mut errors);
    let verify = input.text(
        "verify_password",
        "no password verification provided",
        &mut errors,
    );

    let (Some(username), Some(password), Some(verify)) = (username, password, verify) else {
        return Err(errors.into());
    };
    if password != verify {
        return Err(ApiError::PasswordMismatch);
    }

    let credentials = Arc::clone(&state.credentials);
    let user = run_blocking(move || credentials.create_user(&username, &password)).await?;
    tracing::info!(user_id = user.id, created_by = caller.id, "user created via api");

    Ok((StatusCode::CREATED, Json(UserView::from(&user))).into_response())
}

pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    ApiUser(user): ApiUser,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.tokens.generate_auth_token(&user)?;
    Ok(Json(TokenResponse { token }))
}
