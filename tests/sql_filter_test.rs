use filtercrate::{
    FieldDescriptor, FieldType, FilterSpec, ParamKind, QueryCompiler, QueryConfig, QueryError,
    RecordShape,
};
use sea_orm::Value;

static ORDER_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new("total", FieldType::Double),
    FieldDescriptor::new("code", FieldType::Text).alias("order_code"),
];

static ORDER: FieldType = FieldType::Relation(&ORDER_FIELDS);

static FIELDS: [FieldDescriptor; 7] = [
    FieldDescriptor::new("id", FieldType::BigInteger).identity(),
    FieldDescriptor::new("name", FieldType::Text).alias("_name"),
    FieldDescriptor::new("age", FieldType::Integer),
    FieldDescriptor::new("active", FieldType::Bool),
    FieldDescriptor::new("nums", FieldType::List(&FieldType::Integer)),
    FieldDescriptor::new("orders", FieldType::List(&ORDER)),
    FieldDescriptor::new("deleted_at", FieldType::Timestamp).soft_delete(),
];

static CUSTOMERS: RecordShape = RecordShape::new("customers", &FIELDS);

fn compile(tokens: &[&str]) -> Result<(String, Vec<Value>), QueryError> {
    let spec = FilterSpec::parse(tokens)?;
    QueryCompiler::new(&CUSTOMERS)
        .compile_text(&spec, "")
        .map(filtercrate::SqlClause::into_parts)
}

fn text(value: &str) -> Value {
    Value::from(value.to_string())
}

#[test]
fn test_placeholders_match_values_in_token_order() {
    let (clause, values) = compile(&[
        "age:>:18",
        "name:like:jo",
        "id:in:1;2;3",
        "active:is:true",
        "nums:<=:9",
    ])
    .unwrap();

    assert_eq!(
        clause,
        "WHERE age > ? AND _name LIKE ? ESCAPE '!' AND id IN (?,?,?) AND active = true AND nums <= ?"
    );
    assert_eq!(clause.matches('?').count(), values.len());
    assert_eq!(
        values,
        vec![
            Value::from(18_i32),
            text("%jo%"),
            Value::from(1_i64),
            Value::from(2_i64),
            Value::from(3_i64),
            Value::from(9_i32),
        ]
    );
}

#[test]
fn test_empty_spec_renders_nothing() {
    let (clause, values) = compile(&[]).unwrap();
    assert_eq!(clause, "");
    assert!(values.is_empty());
}

#[test]
fn test_in_on_allow_listed_field_keeps_raw_strings() {
    let spec = FilterSpec::parse(["tenant:in:10;15;23"]).unwrap().allow("tenant");
    let (clause, values) = QueryCompiler::new(&CUSTOMERS)
        .compile_text(&spec, "")
        .unwrap()
        .into_parts();
    assert_eq!(clause, "WHERE tenant IN (?,?,?)");
    assert_eq!(values, vec![text("10"), text("15"), text("23")]);
}

#[test]
fn test_like_value_is_escaped() {
    let (clause, values) = compile(&["name:like:%some name!%"]).unwrap();
    assert_eq!(clause, "WHERE _name LIKE ? ESCAPE '!'");
    assert_eq!(values, vec![text("%!%some name!!!%%")]);
}

#[test]
fn test_alias_is_used_in_clause() {
    let (clause, _) = compile(&["name:like:x"]).unwrap();
    assert!(clause.contains("_name"));
    assert!(!clause.contains(" name "));
}

#[test]
fn test_nested_alias_and_functions() {
    let (clause, values) =
        compile(&["orders.code:=:A-1", "nums.size():>:2", "name.length():<=:5"]).unwrap();
    assert_eq!(
        clause,
        "WHERE orders.order_code = ? AND CARDINALITY(nums) > ? AND LENGTH(_name) <= ?"
    );
    assert_eq!(
        values,
        vec![text("A-1"), Value::from(2_i64), Value::from(5_i64)]
    );
}

#[test]
fn test_disallowed_field_is_reported_alone() {
    let err = compile(&["age:>:18", "password:=:hunter2", "name:=:x"]).unwrap_err();
    assert_eq!(
        err,
        QueryError::DisallowedFields {
            kind: ParamKind::Filter,
            fields: ["password".to_string()].into(),
        }
    );
    assert!(err.to_string().contains("password"));
}

#[test]
fn test_no_partial_success() {
    assert!(matches!(
        compile(&["age:>:18", "age:>:eighteen"]).unwrap_err(),
        QueryError::Coercion { token, .. } if token == "age:>:eighteen"
    ));
    assert!(matches!(
        compile(&["active:is:yes"]).unwrap_err(),
        QueryError::InvalidIsLiteral { .. }
    ));
    assert!(matches!(
        compile(&["active:=:maybe"]).unwrap_err(),
        QueryError::Coercion { source, .. } if source.target == "bool"
    ));
    assert!(matches!(
        compile(&["age.length():>:1"]).unwrap_err(),
        QueryError::UnsupportedFunction { .. }
    ));
}

#[test]
fn test_timestamps_keep_their_colons() {
    let (clause, values) = compile(&["deleted_at:<:2024-01-01T00:00:00Z"]).unwrap();
    assert_eq!(clause, "WHERE deleted_at < ?");
    assert_eq!(values.len(), 1);
}

#[test]
fn test_soft_delete_filter() {
    let spec = FilterSpec::parse(["age:>:18"])
        .unwrap()
        .with_soft_delete(&CUSTOMERS, false)
        .unwrap();
    let (clause, values) = QueryCompiler::new(&CUSTOMERS)
        .compile_text(&spec, "c.")
        .unwrap()
        .into_parts();
    assert_eq!(clause, "WHERE c.age > ? AND c.deleted_at IS NULL");
    assert_eq!(values.len(), 1);
}

#[test]
fn test_concatenated_filters_permit_foreign_fields() {
    let tenant = FilterSpec::parse(["tenant_id:=:7"]).unwrap();
    let spec = FilterSpec::parse(["age:>:18"]).unwrap().concat(tenant);
    let (clause, values) = QueryCompiler::new(&CUSTOMERS)
        .compile_text(&spec, "")
        .unwrap()
        .into_parts();
    assert_eq!(clause, "WHERE age > ? AND tenant_id = ?");
    assert_eq!(values[1], text("7"));
}

#[test]
fn test_output_is_deterministic() {
    let spec = FilterSpec::parse(["age:>=:21", "name:like:a_b", "nums:in:1;2"]).unwrap();
    let compiler = QueryCompiler::new(&CUSTOMERS);
    let first = compiler.compile_text(&spec, "").unwrap();
    let second = compiler.compile_text(&spec, "").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parameter_limits_from_config() {
    let config: QueryConfig = serde_json::from_str(r#"{"max_filter_params": 1}"#).unwrap();
    let spec = FilterSpec::parse(["age:>:1", "age:<:9"]).unwrap();
    let err = QueryCompiler::new(&CUSTOMERS)
        .with_config(config)
        .compile_text(&spec, "")
        .unwrap_err();
    assert_eq!(
        err,
        QueryError::TooManyParams {
            kind: ParamKind::Filter,
            count: 2,
            limit: 1,
        }
    );
}
