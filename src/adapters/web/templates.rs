//! HTML templates using Askama.

use askama::Template;

use crate::domain::todo::TodoView;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub username: Option<&'a str>,
    pub todos: &'a [TodoView],
}

#[derive(Template, Default)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub username: String,
    pub username_errors: Vec<String>,
    pub password_errors: Vec<String>,
    pub password2_errors: Vec<String>,
}

impl SignupTemplate {
    pub fn has_errors(&self) -> bool {
        !(self.username_errors.is_empty()
            && self.password_errors.is_empty()
            && self.password2_errors.is_empty())
    }
}

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub username: String,
    pub flash: Option<String>,
    pub username_errors: Vec<String>,
    pub password_errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}
