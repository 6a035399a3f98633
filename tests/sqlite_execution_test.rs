use filtercrate::{
    Dialect, FilterSpec, ListQuery, PaginationSpec, QueryCompiler, QueryRoot, SortSpec,
};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter, Statement,
};

mod common;
use common::{USERS, setup_seeded_db, user_entity};

/// Run the textual backend against the database and return matching ids
async fn ids_from_text(db: &DatabaseConnection, query: &ListQuery) -> Vec<i32> {
    let compiler = QueryCompiler::for_backend(&USERS, DbBackend::Sqlite);
    let (clause, values) = query.to_sql(&compiler, "").unwrap().into_parts();
    let sql = if query.sort.is_unsorted() {
        format!("SELECT id FROM users {clause} ORDER BY id")
    } else {
        format!("SELECT id FROM users {clause}")
    };

    db.query_all(Statement::from_sql_and_values(DbBackend::Sqlite, sql, values))
        .await
        .unwrap()
        .iter()
        .map(|row| row.try_get::<i32>("", "id").unwrap())
        .collect()
}

/// Run the condition tree through a Sea-ORM select and return matching ids
async fn ids_from_condition(db: &DatabaseConnection, query: &ListQuery) -> Vec<i32> {
    let compiler = QueryCompiler::new(&USERS);
    let root = QueryRoot::for_entity(user_entity::Entity);
    let mut rows = query
        .apply(&compiler, &root, user_entity::Entity::find())
        .unwrap()
        .all(db)
        .await
        .unwrap();
    if query.sort.is_unsorted() {
        rows.sort_by_key(|row| row.id);
    }
    rows.into_iter().map(|row| row.id).collect()
}

fn filter_only(tokens: &[&str]) -> ListQuery {
    ListQuery::new(
        FilterSpec::parse(tokens).unwrap(),
        SortSpec::unsorted(),
        PaginationSpec::unpaged(),
    )
}

async fn assert_both_backends(db: &DatabaseConnection, query: &ListQuery, expected: &[i32]) {
    assert_eq!(ids_from_text(db, query).await, expected, "textual backend");
    assert_eq!(ids_from_condition(db, query).await, expected, "condition backend");
}

#[tokio::test]
async fn test_comparisons() {
    let db = setup_seeded_db().await.unwrap();
    assert_both_backends(&db, &filter_only(&["age:>=:30"]), &[1, 3, 5]).await;
    assert_both_backends(&db, &filter_only(&["age:<:30", "active:is:true"]), &[2, 4]).await;
    assert_both_backends(&db, &filter_only(&["role:<>:admin"]), &[2, 3, 4]).await;
    assert_both_backends(&db, &filter_only(&["role:!=:admin", "age:>:20"]), &[2, 3]).await;
}

#[tokio::test]
async fn test_in_and_is() {
    let db = setup_seeded_db().await.unwrap();
    assert_both_backends(&db, &filter_only(&["id:in:1;3;5"]), &[1, 3, 5]).await;
    assert_both_backends(&db, &filter_only(&["active:is:false"]), &[3]).await;
    assert_both_backends(&db, &filter_only(&["deleted_at:is:not_null"]), &[3]).await;
}

#[tokio::test]
async fn test_alias_reaches_storage_column() {
    let db = setup_seeded_db().await.unwrap();
    assert_both_backends(&db, &filter_only(&["username:=:bob"]), &[2]).await;
    assert_both_backends(&db, &filter_only(&["name:=:dave"]), &[4]).await;
}

#[tokio::test]
async fn test_like_wildcards_are_literal_in_text_backend() {
    let db = setup_seeded_db().await.unwrap();
    let query = filter_only(&["username:like:0%"]);
    assert_eq!(ids_from_text(&db, &query).await, [5]);

    let query = filter_only(&["username:like:ar"]);
    assert_both_backends(&db, &query, &[3]).await;
}

#[tokio::test]
async fn test_soft_delete_excludes_deleted_rows() {
    let db = setup_seeded_db().await.unwrap();
    let filter = FilterSpec::new().with_soft_delete(&USERS, false).unwrap();
    let query = ListQuery::new(filter, SortSpec::unsorted(), PaginationSpec::unpaged());
    assert_both_backends(&db, &query, &[1, 2, 4, 5]).await;
}

#[tokio::test]
async fn test_sorted_pages() {
    let db = setup_seeded_db().await.unwrap();
    let query = ListQuery::new(
        FilterSpec::new(),
        SortSpec::parse(["age:desc"]).unwrap(),
        PaginationSpec::new(1, 2).unwrap(),
    );
    // ages: 52, 45 | 34, 27 | 19
    assert_both_backends(&db, &query, &[1, 2]).await;

    let query = ListQuery::new(
        FilterSpec::parse(["active:is:true"]).unwrap(),
        SortSpec::parse(["role:asc", "age:desc"]).unwrap(),
        PaginationSpec::new(0, 3).unwrap(),
    );
    // admin: 5 (52), 1 (34) | guest: 4
    assert_both_backends(&db, &query, &[5, 1, 4]).await;
}

#[test]
fn test_text_query_shape() {
    let compiler = QueryCompiler::for_backend(&USERS, DbBackend::Sqlite);
    assert_eq!(compiler.dialect(), Some(Dialect::Sqlite));

    let query = ListQuery::new(
        FilterSpec::parse(["age:>:20"]).unwrap(),
        SortSpec::parse(["username:asc"]).unwrap(),
        PaginationSpec::new(2, 5).unwrap(),
    );
    let sql = query.to_sql(&compiler, "u.").unwrap();
    assert_eq!(
        sql.clause(),
        "WHERE u.age > ? ORDER BY u.name ASC LIMIT 5 OFFSET 10"
    );
    assert_eq!(sql.values().len(), 1);
}

#[test]
fn test_paged_text_query_without_dialect_fails() {
    let query = ListQuery::default();
    let err = query.to_sql(&QueryCompiler::new(&USERS), "").unwrap_err();
    assert!(err.is_configuration_error());
}

#[tokio::test]
async fn test_empty_condition_returns_everything() {
    let db = setup_seeded_db().await.unwrap();
    let condition = QueryCompiler::new(&USERS)
        .compile_condition(&FilterSpec::new(), &QueryRoot::for_entity(user_entity::Entity))
        .unwrap();
    let rows = user_entity::Entity::find()
        .filter(condition)
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);
}
