use lintel::{convert::EnumRepr, err, stmt::EnumId, Result};
use pretty_assertions::assert_eq;
use tests::prelude::*;

struct Paint {
    model: ModelId,
    color: EnumId,
}

/// A paint whose color is stored with an `S:` prefix but filtered with a
/// `P:` prefix.
fn schema() -> (Schema, Paint) {
    let mut converters = Converters::default();
    let color = converters.register_enum("Color", ["Red", "Green"]);

    let ty = converters.enum_ty(color).clone();
    let to_stored = move |value: &Value| -> Result<Value> {
        ty.name_of(value)
            .map(|name| Value::from(format!("S:{name}")))
            .ok_or_else(|| err!("{value} is not a color"))
    };

    let ty = converters.enum_ty(color).clone();
    let from_stored = move |value: &Value| -> Result<Value> {
        value
            .as_str()
            .and_then(|stored| stored.strip_prefix("S:"))
            .and_then(|name| ty.value(name))
            .ok_or_else(|| err!("{value} is not a stored color"))
    };

    let ty = converters.enum_ty(color).clone();
    let to_param = move |value: &Value| -> Result<Value> {
        ty.name_of(value)
            .map(|name| Value::from(format!("P:{name}")))
            .ok_or_else(|| err!("{value} is not a color"))
    };

    converters
        .register(Type::Enum(color), Type::String, to_stored)
        .register(Type::String, Type::Enum(color), from_stored)
        .register(Type::Enum(color), Type::Param, to_param);

    let mut builder = Schema::builder(converters);
    builder
        .model("Paint")
        .table_name("Paints")
        .column_with("Id", Type::I32, |c| c.primary_key())
        .column_with("Color", Type::Enum(color), |c| c.storage(db::Type::Text))
        .column("Glossy", Type::Bool);

    let schema = builder.build().unwrap();
    let model = schema.model_id("Paint").unwrap();

    (schema, Paint { model, color })
}

fn red(paint: &Paint) -> Value {
    lintel::stmt::ValueEnum::new(paint.color, 0).into()
}

async fn setup() -> (DbTest, Paint) {
    let (schema, paint) = schema();
    let test = DbTest::setup(schema).await;

    let object = Object::new(paint.model)
        .with("Id", 1)
        .with("Color", red(&paint))
        .with("Glossy", true);
    test.db().insert(&object).await.unwrap();

    (test, paint)
}

#[tokio::test]
async fn storage_converter_is_used_for_rows() {
    let (test, paint) = setup().await;

    let rows = test.driver().rows("Paints");
    assert_eq!(rows[0].get("Color"), &Value::from("S:Red"));

    let paints = test.db().all(&Query::new(paint.model)).await.unwrap();
    assert_eq!(paints[0].get("Color"), Some(&red(&paint)));
}

#[tokio::test]
async fn param_converter_is_used_for_filters() {
    let (test, paint) = setup().await;

    let filter = test
        .db()
        .translate(paint.model, &Expr::eq(Path::from("Color"), red(&paint)))
        .unwrap();

    assert_eq!(filter, Filter::eq("Color", "P:Red"));
}

#[tokio::test]
async fn boolean_member_is_a_predicate() {
    let (mut test, paint) = setup().await;
    test.log().clear();

    let paints = test
        .db()
        .all(&Query::new(paint.model).filter(Expr::member("Glossy")))
        .await
        .unwrap();

    assert_eq!(paints.len(), 1);
    assert_eq!(paints[0].get("Glossy"), Some(&Value::Bool(true)));
    assert_eq!(
        test.log().fetch_filters(),
        vec![("Paints".to_string(), Filter::eq("Glossy", true))]
    );
}

#[tokio::test]
async fn failed_conversion_names_the_column() {
    let (test, paint) = setup().await;
    test.driver().push_row(
        "Paints",
        Row::new()
            .with("Id", 2)
            .with("Color", "Blue")
            .with("Glossy", false),
    );

    let err = test.db().all(&Query::new(paint.model)).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "reading column `Color` of `Paint`: \"Blue\" is not a stored color"
    );
}

#[tokio::test]
async fn ordinal_policy_stores_enum_as_integer() {
    let mut converters = Converters::default();
    let size = converters.register_enum("Size", ["Small", "Medium", "Large"]);
    converters.set_default_policy(size, EnumRepr::Ordinal);

    let mut builder = Schema::builder(converters);
    builder
        .model("Box")
        .column_with("Id", Type::I32, |c| c.primary_key())
        .column("Size", Type::Enum(size));

    let schema = builder.build().unwrap();
    let model = schema.model_id("Box").unwrap();
    assert_eq!(schema.table_for(model).columns[1].ty, db::Type::BigInt);

    let test = DbTest::setup(schema).await;
    let large: Value = lintel::stmt::ValueEnum::new(size, 2).into();

    test.db()
        .insert(&Object::new(model).with("Id", 1).with("Size", large.clone()))
        .await
        .unwrap();
    assert_eq!(test.driver().rows("Box")[0].get("Size"), &Value::I64(2));

    let filter = test
        .db()
        .translate(model, &Expr::eq(Path::from("Size"), large.clone()))
        .unwrap();
    assert_eq!(filter, Filter::eq("Size", 2i64));

    let boxes = test.db().all(&Query::new(model)).await.unwrap();
    assert_eq!(boxes[0].get("Size"), Some(&large));
}

#[tokio::test]
async fn conversion_failures_keep_their_kind() {
    let (test, zoo) = zoo::setup().await;
    test.driver().push_row(
        "Animals",
        Row::new()
            .with("Name", "Rex")
            .with("AnimalType", "Big")
            .with("AnimalType2", "Huge")
            .with("Discriminator", "WildAnimal")
            .with("Id", 5),
    );

    let err = test.db().all(&Query::new(zoo.animal)).await.unwrap_err();
    assert!(err.is_conversion(), "unexpected error: {err}");
    assert!(err
        .to_string()
        .starts_with("reading column `AnimalType2` of `WildAnimal`: "));

    let err = test
        .db()
        .translate(zoo.animal, &Expr::eq(Path::from("AnimalType2"), 5))
        .unwrap_err();
    assert!(err.is_conversion(), "unexpected error: {err}");
    assert_eq!(
        err.to_string(),
        "filtering on `AnimalType2`: cannot convert I32 to String"
    );
}
