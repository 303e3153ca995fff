use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json,
};

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{DeleteRoomSchema, ExecuteSchema, NewRoomSchema, ValidatedJson},
    serialized::{ExecutionResult, Room, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/rooms",
    tag = "rooms",
    responses(
        (status = 200, body = Vec<Room>)
    )
)]
pub(crate) async fn list_rooms(
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Room>>> {
    let rooms = context.collab.rooms.list_rooms().await?;

    Ok(Json(rooms.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    responses(
        (status = 200, body = Room),
        (status = 404, description = "Room does not exist")
    )
)]
pub(crate) async fn room(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Room>> {
    let room = context.collab.rooms.room_by_id(&id).await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms",
    tag = "rooms",
    request_body = NewRoomSchema,
    responses(
        (status = 200, body = Room),
        (status = 409, description = "A room with this id already exists")
    )
)]
pub(crate) async fn create_room(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewRoomSchema>,
) -> ServerResult<Json<Room>> {
    let room = context
        .collab
        .rooms
        .create_room(body.id, body.name, body.creator_email)
        .await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    request_body = DeleteRoomSchema,
    responses(
        (status = 200, description = "Room and all associated data were deleted"),
        (status = 403, description = "Requestor is not the room creator")
    )
)]
pub(crate) async fn delete_room(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<DeleteRoomSchema>,
) -> ServerResult<()> {
    context.collab.rooms.delete_room(&id, &body.requestor).await?;

    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/execute",
    tag = "rooms",
    request_body = ExecuteSchema,
    responses(
        (status = 200, body = ExecutionResult),
        (status = 502, description = "The execution service failed or is unreachable")
    )
)]
pub(crate) async fn execute_code(
    State(context): State<ServerContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<ExecuteSchema>,
) -> ServerResult<Json<ExecutionResult>> {
    // Execution is only offered for rooms that actually exist
    let _ = context.collab.rooms.room_by_id(&id).await?;

    let output = context
        .executor
        .execute(&body.language, &body.code, body.stdin.as_deref())
        .await?;

    Ok(Json(output.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_rooms))
        .route("/", post(create_room))
        .route("/:id", get(room))
        .route("/:id", delete(delete_room))
        .route("/:id/execute", post(execute_code))
}
