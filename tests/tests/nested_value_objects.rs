use pretty_assertions::assert_eq;
use tests::prelude::*;

#[tokio::test]
async fn nested_name_is_reassembled_from_flat_columns() {
    let (test, zoo) = zoo::setup().await;

    let dog = test
        .db()
        .first(&Query::new(zoo.dog))
        .await
        .unwrap()
        .unwrap();

    let name = dog.get("DogName").unwrap().expect_object();
    assert_eq!(name.model(), None);
    assert_eq!(name.get("First"), Some(&Value::from("a")));
    assert_eq!(name.get("Second"), Some(&Value::from("b")));
}

#[tokio::test]
async fn nested_leaves_are_stored_under_their_column_names() {
    let (test, _zoo) = zoo::setup().await;

    let rows = test.driver().rows("Animals");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("First"), &Value::from("a"));
    assert_eq!(rows[0].get("Second"), &Value::from("b"));
    assert!(!rows[0].contains("DogName_First"));
}

#[tokio::test]
async fn missing_nested_object_still_materializes() {
    let (schema, zoo) = zoo::schema();
    let test = DbTest::setup(schema).await;

    let mut dog = zoo.dog(4, None);
    dog.unset("DogName");
    test.db().insert(&dog).await.unwrap();

    let row = &test.driver().rows("Animals")[0];
    assert_eq!(row.get("First"), &Value::Null);
    assert_eq!(row.get("Second"), &Value::Null);

    let dog = test
        .db()
        .first(&Query::new(zoo.dog))
        .await
        .unwrap()
        .unwrap();

    // The value object is allocated even when every leaf is null
    let name = dog.get("DogName").unwrap().expect_object();
    assert_eq!(name.get("First"), Some(&Value::Null));
    assert_eq!(name.get("Second"), Some(&Value::Null));
}

#[tokio::test]
async fn partially_filled_nested_object() {
    let (schema, zoo) = zoo::schema();
    let test = DbTest::setup(schema).await;

    let dog = zoo
        .dog(5, None)
        .with("DogName", Object::embedded().with("First", "Rex"));
    test.db().insert(&dog).await.unwrap();

    let dogs = test.db().all(&Query::new(zoo.dog)).await.unwrap();
    let name = dogs[0].get("DogName").unwrap().expect_object();

    assert_eq!(name.get("First"), Some(&Value::from("Rex")));
    assert_eq!(name.get("Second"), Some(&Value::Null));
}

#[tokio::test]
async fn raw_row_materializes_nested_object() {
    let (test, zoo) = zoo::setup().await;

    let row = Row::new()
        .with("Name", "Second")
        .with("AnimalType", "big")
        .with("AnimalType2", "Small")
        .with("Discriminator", "Dog")
        .with("Id", 2)
        .with("EyeId", Value::Null)
        .with("Second", "y")
        .with("First", "x");

    let dog = test.db().materialize(zoo.animal, &row).unwrap();

    assert_eq!(dog.model(), Some(zoo.dog));
    // Explicit text converters parse without regard to case
    assert_eq!(dog.get("AnimalType"), Some(&zoo.big()));
    assert_eq!(dog.get("AnimalType2"), Some(&zoo.small2()));

    let name = dog.get("DogName").unwrap().expect_object();
    assert_eq!(name.get("First"), Some(&Value::from("x")));
    assert_eq!(name.get("Second"), Some(&Value::from("y")));
}

#[tokio::test]
async fn filter_on_nested_leaf_uses_its_column() {
    let (mut test, zoo) = zoo::setup().await;
    test.log().clear();

    let expr = Expr::eq(Path::from("DogName.First"), Expr::value("a"));
    let dogs = test
        .db()
        .all(&Query::new(zoo.dog).filter(expr))
        .await
        .unwrap();

    assert_eq!(dogs.len(), 1);
    assert_eq!(
        test.log().fetch_filters(),
        vec![(
            "Animals".to_string(),
            Filter::And(vec![
                Filter::eq("Discriminator", "Dog"),
                Filter::eq("First", "a"),
            ]),
        )]
    );
}

#[tokio::test]
async fn nested_object_is_null_checks_every_leaf() {
    let (test, zoo) = zoo::setup().await;

    let filter = test
        .db()
        .translate(zoo.dog, &Expr::is_null("DogName"))
        .unwrap();

    assert_eq!(
        filter,
        Filter::And(vec![Filter::is_null("Second"), Filter::is_null("First")])
    );
}

#[tokio::test]
async fn nested_object_cannot_be_compared_whole() {
    let (test, zoo) = zoo::setup().await;

    let err = test
        .db()
        .translate(zoo.dog, &Expr::eq(Path::from("DogName"), Expr::value("a")))
        .unwrap_err();

    assert!(err.is_invalid_expression());
}
