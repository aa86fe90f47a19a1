use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use forum_db::StoreError;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::error::AppError;
use crate::parse_id;
use crate::session::{self, CurrentUser};
use crate::state::{AppState, blocking};
use crate::templates::{
    AccountCreateTemplate, AccountLoginTemplate, AccountViewTemplate, TemplateData, render,
};
use crate::validator::{
    EMAIL_RX, Validator, contains_digit, contains_uppercase, matches, min_chars, not_blank,
};

const BLANK: &str = "This field cannot be blank.";
const BAD_EMAIL: &str = "This field is not a valid email address.";

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CreateUserForm {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl CreateUserForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.username), "username", BLANK);
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(not_blank(&self.password), "password", BLANK);
        v.check_field(
            min_chars(&self.password, 8),
            "password",
            "This field must be at least 8 characters long.",
        );
        v.check_field(matches(&self.email, &EMAIL_RX), "email", BAD_EMAIL);
        v.check_field(
            contains_uppercase(&self.password),
            "password",
            "This field must contain at least one uppercase letter.",
        );
        v.check_field(
            contains_digit(&self.password),
            "password",
            "This field must contain at least one number.",
        );
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl LoginForm {
    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(matches(&self.email, &EMAIL_RX), "email", BAD_EMAIL);
        v.check_field(not_blank(&self.password), "password", BLANK);
    }
}

/// GET /account/create
pub async fn create_form(session: Session) -> Result<Response, AppError> {
    let data = TemplateData::new(&session).await?;
    render(
        StatusCode::OK,
        &AccountCreateTemplate {
            data,
            form: CreateUserForm::default(),
        },
    )
}

/// POST /account/create
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(mut form): Form<CreateUserForm>,
) -> Result<Response, AppError> {
    form.validate();
    if !form.validator.valid() {
        return rerender_create(&session, form).await;
    }

    let users = state.users.clone();
    let (username, email, password) = (
        form.username.clone(),
        form.email.clone(),
        form.password.clone(),
    );
    let id = match blocking(move || users.create(&username, &email, &password)).await {
        Ok(id) => id,
        Err(AppError::Store(StoreError::DuplicateEmail)) => {
            form.validator
                .add_field_error("email", "Address is already in use");
            return rerender_create(&session, form).await;
        }
        Err(e) => return Err(e),
    };

    info!(user_id = id, "account created");
    session::put_flash(&session, "Account created successfully!").await?;
    Ok(Redirect::to(&format!("/account/view/{id}")).into_response())
}

async fn rerender_create(session: &Session, form: CreateUserForm) -> Result<Response, AppError> {
    let data = TemplateData::new(session).await?;
    render(
        StatusCode::UNPROCESSABLE_ENTITY,
        &AccountCreateTemplate { data, form },
    )
}

/// GET /account/view/{id} — only the owner may look at a profile.
pub async fn view(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    let users = state.users.clone();
    let user = blocking(move || users.get(id)).await?;

    if user.id != current {
        return Ok(Redirect::to("/account/login").into_response());
    }

    let data = TemplateData::new(&session).await?;
    render(StatusCode::OK, &AccountViewTemplate { data, user })
}

/// GET /account/login
pub async fn login_form(session: Session) -> Result<Response, AppError> {
    let data = TemplateData::new(&session).await?;
    render(
        StatusCode::OK,
        &AccountLoginTemplate {
            data,
            form: LoginForm::default(),
        },
    )
}

/// POST /account/login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(mut form): Form<LoginForm>,
) -> Result<Response, AppError> {
    form.validate();
    if !form.validator.valid() {
        return rerender_login(&session, form).await;
    }

    let users = state.users.clone();
    let (email, password) = (form.email.clone(), form.password.clone());
    let id = match blocking(move || users.authenticate(&email, &password)).await {
        Ok(id) => id,
        Err(AppError::Store(StoreError::InvalidCredentials)) => {
            form.validator
                .add_non_field_error("Email or password incorrect");
            return rerender_login(&session, form).await;
        }
        Err(e) => return Err(e),
    };

    session::log_in(&session, id).await?;
    info!(user_id = id, "user logged in");
    Ok(Redirect::to("/thread/create").into_response())
}

async fn rerender_login(session: &Session, mut form: LoginForm) -> Result<Response, AppError> {
    form.password.clear();
    let data = TemplateData::new(session).await?;
    render(
        StatusCode::UNPROCESSABLE_ENTITY,
        &AccountLoginTemplate { data, form },
    )
}

/// POST /account/logout
pub async fn logout(
    session: Session,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Response, AppError> {
    session::log_out(&session).await?;
    session::put_flash(&session, "You've been logged out successfully!").await?;
    info!(user_id, "user logged out");
    Ok(Redirect::to("/").into_response())
}
