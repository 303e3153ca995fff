use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::{rooms, schemas, serialized};

#[derive(OpenApi)]
#[openapi(
    info(description = "codedeck-server exposes endpoints to interact with this codedeck instance"),
    paths(
        rooms::list_rooms,
        rooms::room,
        rooms::create_room,
        rooms::delete_room,
        rooms::execute_code,
    ),
    components(schemas(
        schemas::NewRoomSchema,
        schemas::DeleteRoomSchema,
        schemas::ExecuteSchema,
        serialized::Room,
        serialized::PresenceUser,
        serialized::ChatMessage,
        serialized::ExecutionResult,
        serialized::ServerEvent,
    ))
)]
pub struct ApiDoc;

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
