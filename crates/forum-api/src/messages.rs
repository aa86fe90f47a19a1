use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::parse_id;
use crate::session::{self, CurrentUser};
use crate::state::{AppState, blocking};
use crate::templates::{MessageCreateTemplate, TemplateData, render};
use crate::validator::{Validator, max_chars, not_blank};

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CreateMessageForm {
    pub message: String,
    #[serde(skip)]
    pub validator: Validator,
}

/// GET /thread/view/{id}/message/create
pub async fn create_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let thread_id = parse_id(&id)?;

    let threads = state.threads.clone();
    let thread = blocking(move || threads.get(thread_id)).await?;

    let data = TemplateData::new(&session).await?;
    render(
        StatusCode::OK,
        &MessageCreateTemplate {
            data,
            thread,
            form: CreateMessageForm::default(),
        },
    )
}

/// POST /thread/view/{id}/message/create
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(author_id)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Form(mut form): Form<CreateMessageForm>,
) -> Result<Response, AppError> {
    let thread_id = parse_id(&id)?;

    // The thread must exist before anything is validated or stored.
    let threads = state.threads.clone();
    let thread = blocking(move || threads.get(thread_id)).await?;

    form.validator
        .check_field(not_blank(&form.message), "message", "This field cannot be blank.");
    form.validator.check_field(
        max_chars(&form.message, 1000),
        "message",
        "This field cannot be more than 1000 characters long.",
    );

    if !form.validator.valid() {
        let data = TemplateData::new(&session).await?;
        return render(
            StatusCode::UNPROCESSABLE_ENTITY,
            &MessageCreateTemplate { data, thread, form },
        );
    }

    let messages = state.messages.clone();
    let body = form.message;
    blocking(move || messages.create(&body, thread_id, author_id)).await?;

    session::put_flash(&session, "Message created successfully!").await?;
    Ok(Redirect::to(&format!("/thread/view/{thread_id}")).into_response())
}
