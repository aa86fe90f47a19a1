use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use forum_db::LATEST_THREADS;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::parse_id;
use crate::session::{self, CurrentUser};
use crate::state::{AppState, blocking};
use crate::templates::{HomeTemplate, ThreadCreateTemplate, ThreadViewTemplate, TemplateData, render};
use crate::validator::{Validator, max_chars, not_blank};

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CreateThreadForm {
    pub title: String,
    #[serde(skip)]
    pub validator: Validator,
}

/// GET /
pub async fn home(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let threads = state.threads.clone();
    let threads = blocking(move || threads.latest(LATEST_THREADS)).await?;

    let data = TemplateData::new(&session).await?;
    render(StatusCode::OK, &HomeTemplate { data, threads })
}

/// GET /thread/create
pub async fn create_form(session: Session) -> Result<Response, AppError> {
    let data = TemplateData::new(&session).await?;
    render(
        StatusCode::OK,
        &ThreadCreateTemplate {
            data,
            form: CreateThreadForm::default(),
        },
    )
}

/// POST /thread/create
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(author_id)): Extension<CurrentUser>,
    Form(mut form): Form<CreateThreadForm>,
) -> Result<Response, AppError> {
    form.validator
        .check_field(not_blank(&form.title), "title", "This field cannot be blank.");
    form.validator.check_field(
        max_chars(&form.title, 100),
        "title",
        "This field cannot be more than 100 characters long.",
    );

    if !form.validator.valid() {
        let data = TemplateData::new(&session).await?;
        return render(
            StatusCode::UNPROCESSABLE_ENTITY,
            &ThreadCreateTemplate { data, form },
        );
    }

    let threads = state.threads.clone();
    let title = form.title;
    let id = blocking(move || threads.create(&title, author_id)).await?;

    session::put_flash(&session, "Thread created successfully!").await?;
    Ok(Redirect::to(&format!("/thread/view/{id}")).into_response())
}

/// GET /thread/view/{id}
pub async fn view(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    let threads = state.threads.clone();
    let thread = blocking(move || threads.get(id)).await?;

    let data = TemplateData::new(&session).await?;
    render(StatusCode::OK, &ThreadViewTemplate { data, thread })
}
