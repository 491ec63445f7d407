//! Browser routes: todo list page and the signup/login/logout forms.

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::domain::error::TodosError;
use crate::domain::todo::TodoView;

use super::auth::{AuthSession, Credentials, SessionUser};
use super::templates::{IndexTemplate, LoginTemplate, SignupTemplate};
use super::{AppState, WebError, run_blocking};

pub const MIN_USERNAME_LEN: usize = 6;
pub const MIN_PASSWORD_LEN: usize = 8;

const FIELD_REQUIRED: &str = "This field is required.";
const SIGN_IN_FAILED: &str = "Sign in failed.";

fn render<T: Template>(template: &T) -> Result<Response, WebError> {
    Ok(Html(template.render()?).into_response())
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
) -> Result<Response, WebError> {
    let todos: Vec<TodoView> = state.todos.list_todos()?.iter().map(TodoView::from).collect();
    let template = IndexTemplate {
        username: auth_session.user.as_ref().map(|u| u.username.as_str()),
        todos: &todos,
    };
    render(&template)
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password2: String,
}

pub async fn signup_form() -> Result<Response, WebError> {
    render(&SignupTemplate::default())
}

/// Field checks that need no store access.
pub fn validate_signup(form: &SignupForm) -> SignupTemplate {
    let mut template = SignupTemplate {
        username: form.username.clone(),
        ..Default::default()
    };

    if form.username.is_empty() {
        template.username_errors.push(FIELD_REQUIRED.into());
    } else if form.username.chars().count() < MIN_USERNAME_LEN {
        template.username_errors.push(format!(
            "Field must be at least {MIN_USERNAME_LEN} characters long."
        ));
    }

    if form.password.is_empty() {
        template.password_errors.push(FIELD_REQUIRED.into());
    } else {
        if form.password.chars().count() < MIN_PASSWORD_LEN {
            template.password_errors.push(format!(
                "Field must be at least {MIN_PASSWORD_LEN} characters long."
            ));
        }
        if form.password != form.password2 {
            template.password_errors.push("password must match".into());
        }
    }

    if form.password2.is_empty() {
        template.password2_errors.push(FIELD_REQUIRED.into());
    }

    template
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    mut auth_session: AuthSession,
    Form(form): Form<SignupForm>,
) -> Result<Response, WebError> {
    let mut template = validate_signup(&form);

    if !form.username.is_empty()
        && state
            .credentials
            .find_user_by_username(&form.username)?
            .is_some()
    {
        template.username_errors.push("username is taken".into());
    }
    if template.has_errors() {
        return render(&template);
    }

    let credentials = Arc::clone(&state.credentials);
    let SignupForm {
        username, password, ..
    } = form;
    let user = match run_blocking(move || credentials.create_user(&username, &password)).await {
        Ok(user) => user,
        Err(TodosError::AlreadyExists { .. }) => {
            template.username_errors.push("username is taken".into());
            return render(&template);
        }
        Err(e) => return Err(e.into()),
    };

    auth_session
        .login(&SessionUser::from(user))
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Redirect::to("/").into_response())
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_form() -> Result<Response, WebError> {
    render(&LoginTemplate::default())
}

pub async fn login(
    mut auth_session: AuthSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let mut template = LoginTemplate {
        username: form.username.clone(),
        ..Default::default()
    };
    if form.username.is_empty() {
        template.username_errors.push(FIELD_REQUIRED.into());
    }
    if form.password.is_empty() {
        template.password_errors.push(FIELD_REQUIRED.into());
    }
    if !template.username_errors.is_empty() || !template.password_errors.is_empty() {
        return render(&template);
    }

    let creds = Credentials {
        username: form.username,
        password: form.password,
    };
    let user = match auth_session.authenticate(creds).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!(username = %template.username, "browser sign-in rejected");
            template.flash = Some(SIGN_IN_FAILED.into());
            return render(&template);
        }
        Err(e) => return Err(WebError::internal(e.to_string())),
    };

    auth_session
        .login(&user)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Redirect::to("/").into_response())
}

pub async fn logout(mut auth_session: AuthSession) -> Result<Response, WebError> {
    auth_session
        .logout()
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Redirect::to("/").into_response())
}

pub async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}
