#![allow(dead_code)]

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use filtercrate::{
    FieldDescriptor, FieldType, ListParams, ListQuery, PageableResult, QueryCompiler, QueryConfig,
    QueryRoot, RecordShape,
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Schema, Set,
};

pub mod user_entity;

pub static ROLES: [&str; 3] = ["admin", "member", "guest"];

/// Public shape of the `users` table; `username` is stored as `name`
pub static USER_FIELDS: [FieldDescriptor; 6] = [
    FieldDescriptor::new("id", FieldType::Integer).identity(),
    FieldDescriptor::new("username", FieldType::Text).alias("name"),
    FieldDescriptor::new("age", FieldType::Integer),
    FieldDescriptor::new("active", FieldType::Bool),
    FieldDescriptor::new("role", FieldType::Enum(&ROLES)),
    FieldDescriptor::new("deleted_at", FieldType::Timestamp).soft_delete(),
];

pub static USERS: RecordShape = RecordShape::new("users", &USER_FIELDS);

/// Route compiler logs to the test harness; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(user_entity::Entity)))
        .await?;
    Ok(db)
}

/// Five users with ids 1..=5:
///
/// | id | name      | age | active | role   | deleted |
/// |----|-----------|-----|--------|--------|---------|
/// | 1  | alice     | 34  | yes    | admin  | no      |
/// | 2  | bob       | 27  | yes    | member | no      |
/// | 3  | carol     | 45  | no     | member | yes     |
/// | 4  | dave      | 19  | yes    | guest  | no      |
/// | 5  | 100% erin | 52  | yes    | admin  | no      |
pub async fn setup_seeded_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;
    let deleted = DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .ok();

    let users = [
        ("alice", 34, true, "admin", None),
        ("bob", 27, true, "member", None),
        ("carol", 45, false, "member", deleted),
        ("dave", 19, true, "guest", None),
        ("100% erin", 52, true, "admin", None),
    ];
    for (name, age, active, role, deleted_at) in users {
        user_entity::ActiveModel {
            name: Set(name.to_string()),
            age: Set(age),
            active: Set(active),
            role: Set(role.to_string()),
            deleted_at: Set(deleted_at),
            ..Default::default()
        }
        .insert(&db)
        .await?;
    }
    Ok(db)
}

fn internal(err: &DbErr) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}

async fn list_users(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListParams>,
) -> Result<PageableResult<user_entity::Model>, Response> {
    let query =
        ListQuery::from_params(params, &QueryConfig::default()).map_err(IntoResponse::into_response)?;
    let compiler = QueryCompiler::new(&USERS);
    let root = QueryRoot::for_entity(user_entity::Entity);

    let condition = compiler
        .compile_condition(&query.filter, &root)
        .map_err(IntoResponse::into_response)?;
    let count = user_entity::Entity::find()
        .filter(condition)
        .count(&db)
        .await
        .map_err(|err| internal(&err))?;

    let rows = query
        .apply(&compiler, &root, user_entity::Entity::find())
        .map_err(IntoResponse::into_response)?
        .all(&db)
        .await
        .map_err(|err| internal(&err))?;

    Ok(PageableResult::from_pagination(rows, count, &query.pagination))
}

pub fn setup_user_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .route("/users", axum::routing::get(list_users))
        .with_state(db);

    Router::new().nest("/api/v1", api)
}
