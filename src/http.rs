use crate::adapter::{to_display_list, to_mapping};
use crate::auth::LoginCheck;
use crate::errors::{AppError, AppResult};
use crate::models::{
    CommandResponse, FieldPatchPayload, HealthResponse, ListQuery, ListShape, MessageResponse, UpdateOnePayload,
};
use crate::service::CommandService;
use crate::store::{json_kind, CommandMap};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    commands: CommandService,
    login: LoginCheck,
}

impl AppState {
    pub fn new(commands: CommandService, login: LoginCheck) -> Self {
        Self { commands, login }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/command", get(list_commands).post(add_command))
        .route("/command/updateall", put(update_all_commands))
        .route("/command/updateone/:id", put(update_one_command))
        .route(
            "/command/:id",
            get(get_command).patch(patch_command_field).delete(delete_command),
        )
        .route("/login/:password", get(login))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::StoreRead(_) | Self::StoreWrite(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if self.is_client_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        } else {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, Json(MessageResponse::new(self.message()))).into_response()
    }
}

/// Unwraps a JSON body, turning axum's rejection into a 400 `{"message"}`.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(format!("invalid request body: {}", rejection.body_text())))
}

/// Runs a store operation off the async workers; store I/O is blocking.
async fn run_blocking<T, F>(service: &CommandService, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&CommandService) -> AppResult<T> + Send + 'static,
{
    let service = service.clone();
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|error| AppError::Internal(format!("command task failed: {}", error)))?
}

async fn healthz(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let commands = run_blocking(&state.commands, |service| service.list_all()).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        command_count: commands.len(),
    }))
}

async fn list_commands(State(state): State<AppState>, Query(query): Query<ListQuery>) -> AppResult<Response> {
    let commands = run_blocking(&state.commands, |service| service.list_all()).await?;
    Ok(match query.shape {
        ListShape::Map => Json(commands).into_response(),
        ListShape::List => Json(to_display_list(&commands)).into_response(),
    })
}

async fn get_command(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Value>> {
    let command = run_blocking(&state.commands, move |service| service.get_one(&id)).await?;
    Ok(Json(command))
}

async fn add_command(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CommandResponse>)> {
    let body = match body {
        Err(JsonRejection::MissingJsonContentType(_)) => None,
        other => Some(json_body(other)?),
    };
    let entry = match body {
        None | Some(Value::Null) => None,
        Some(Value::Object(object)) if object.is_empty() => None,
        Some(Value::Object(object)) if object.len() == 1 => object.into_iter().next(),
        Some(Value::Object(object)) => {
            return Err(AppError::Validation(format!(
                "new command body must hold exactly one command, got {}",
                object.len()
            )))
        }
        Some(other) => {
            return Err(AppError::Validation(format!(
                "new command body must be an object, got {}",
                json_kind(&other)
            )))
        }
    };

    let (key, command) = match entry {
        Some((key, record)) => {
            let command = run_blocking(&state.commands, {
                let key = key.clone();
                move |service: &CommandService| service.add(&key, record)
            })
            .await?;
            (key, command)
        }
        None => {
            let command = run_blocking(&state.commands, |service| service.add_default()).await?;
            (crate::models::DEFAULT_COMMAND_KEY.to_string(), command)
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CommandResponse {
            message: "Command added".to_string(),
            key,
            command,
        }),
    ))
}

async fn update_one_command(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOnePayload>, JsonRejection>,
) -> AppResult<Json<CommandResponse>> {
    let payload = json_body(payload)?;
    tracing::debug!(id = %id, new_key = %payload.key, "updating command");
    let UpdateOnePayload {
        key,
        object_data,
        replace,
    } = payload;
    let command = run_blocking(&state.commands, {
        let key = key.clone();
        move |service: &CommandService| service.rename_and_patch(&id, &key, object_data, replace.into())
    })
    .await?;
    Ok(Json(CommandResponse {
        message: "Command updated".to_string(),
        key,
        command,
    }))
}

async fn update_all_commands(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let commands = match json_body(body)? {
        Value::Array(rows) => to_mapping(rows)?,
        other => CommandMap::from_json(other)?,
    };
    run_blocking(&state.commands, move |service| service.replace_all(commands)).await?;
    Ok(Json(MessageResponse::new("Commands updated")))
}

async fn patch_command_field(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FieldPatchPayload>, JsonRejection>,
) -> AppResult<Json<CommandResponse>> {
    let payload = json_body(payload)?;
    let command = run_blocking(&state.commands, {
        let id = id.clone();
        move |service: &CommandService| service.patch_field(&id, &payload.path, payload.value)
    })
    .await?;
    Ok(Json(CommandResponse {
        message: "Command updated".to_string(),
        key: id,
        command,
    }))
}

async fn delete_command(State(state): State<AppState>, Path(key): Path<String>) -> AppResult<Json<MessageResponse>> {
    run_blocking(&state.commands, move |service| service.delete_one(&key)).await?;
    Ok(Json(MessageResponse::new("Command deleted")))
}

async fn login(State(state): State<AppState>, Path(password): Path<String>) -> (StatusCode, Json<MessageResponse>) {
    if state.login.accepts(&password) {
        tracing::info!("login accepted");
        (StatusCode::ACCEPTED, Json(MessageResponse::new("Login accepted")))
    } else {
        tracing::warn!("login rejected");
        (StatusCode::UNAUTHORIZED, Json(MessageResponse::new("Invalid password")))
    }
}
