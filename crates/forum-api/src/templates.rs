//! Askama page templates. Every page extends `base.html`, which reads the
//! shared fields from [`TemplateData`].

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::Datelike;
use forum_db::{Thread, User};
use tower_sessions::Session;

use crate::account::{CreateUserForm, LoginForm};
use crate::error::AppError;
use crate::messages::CreateMessageForm;
use crate::session::{authenticated_user, pop_flash};
use crate::threads::CreateThreadForm;

/// Fields the base layout needs on every page.
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
}

impl TemplateData {
    /// Pops the pending flash message, so build this only for a page that
    /// is about to be rendered.
    pub async fn new(session: &Session) -> Result<Self, AppError> {
        Ok(Self {
            current_year: chrono::Utc::now().year(),
            flash: pop_flash(session).await?,
            is_authenticated: authenticated_user(session).await?.is_some(),
        })
    }
}

/// Renders fully before writing the status so a template failure still
/// produces a clean 500.
pub fn render<T: Template>(status: StatusCode, template: &T) -> Result<Response, AppError> {
    let html = template.render()?;
    Ok((status, Html(html)).into_response())
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub data: TemplateData,
    pub threads: Vec<Thread>,
}

#[derive(Template)]
#[template(path = "pages/account_create.html")]
pub struct AccountCreateTemplate {
    pub data: TemplateData,
    pub form: CreateUserForm,
}

#[derive(Template)]
#[template(path = "pages/account_login.html")]
pub struct AccountLoginTemplate {
    pub data: TemplateData,
    pub form: LoginForm,
}

#[derive(Template)]
#[template(path = "pages/account_view.html")]
pub struct AccountViewTemplate {
    pub data: TemplateData,
    pub user: User,
}

#[derive(Template)]
#[template(path = "pages/thread_create.html")]
pub struct ThreadCreateTemplate {
    pub data: TemplateData,
    pub form: CreateThreadForm,
}

#[derive(Template)]
#[template(path = "pages/thread_view.html")]
pub struct ThreadViewTemplate {
    pub data: TemplateData,
    pub thread: Thread,
}

#[derive(Template)]
#[template(path = "pages/message_create.html")]
pub struct MessageCreateTemplate {
    pub data: TemplateData,
    pub thread: Thread,
    pub form: CreateMessageForm,
}
