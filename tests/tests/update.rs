use pretty_assertions::assert_eq;
use tests::prelude::*;

#[tokio::test]
async fn update_through_supertype_writes_concrete_columns() {
    let (mut test, zoo) = zoo::setup().await;
    let db = test.db().clone();

    let mut dog = db
        .first(&Query::new(zoo.animal).filter(Expr::eq(Path::from("Id"), 1)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dog.model(), Some(zoo.dog));

    dog.set("EyeId", Value::Null);
    dog.set(
        "DogName",
        Object::embedded().with("First", "x").with("Second", "y"),
    );
    test.log().clear();

    db.update(&dog).await.unwrap();

    let updates = test.log().updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].table, "Animals");
    assert_eq!(updates[0].key, Row::new().with("Id", 1));
    assert_eq!(updates[0].row.get("Discriminator"), &Value::from("Dog"));

    let dog = db
        .first(&Query::new(zoo.dog))
        .await
        .unwrap()
        .unwrap();
    let name = dog.get("DogName").unwrap().expect_object();

    assert_eq!(dog.get("EyeId"), Some(&Value::Null));
    assert_eq!(name.get("First"), Some(&Value::from("x")));
    assert_eq!(name.get("Second"), Some(&Value::from("y")));
    assert_eq!(test.driver().rows("Animals").len(), 1);
}

#[tokio::test]
async fn update_keeps_other_rows() {
    let (test, zoo) = zoo::setup().await;
    let db = test.db();

    let mut eye = zoo.eye(2, "Tschüss");
    db.insert(&eye).await.unwrap();

    eye.set("Xy", "Servus");
    db.update(&eye).await.unwrap();

    assert_eq!(
        test.driver().rows("Eyes"),
        vec![
            Row::new().with("Id", 1).with("Xy", "Hallo"),
            Row::new().with("Id", 2).with("Xy", "Servus"),
        ]
    );
}

#[tokio::test]
async fn update_of_missing_row_fails() {
    let (test, zoo) = zoo::setup().await;

    let err = test.db().update(&zoo.eye(5, "Nope")).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "no stored `Eye` matches the key of the updated object"
    );
}

#[tokio::test]
async fn update_of_nested_value_object_is_rejected() {
    let (test, _) = zoo::setup().await;

    let err = test
        .db()
        .update(&Object::embedded().with("First", "x"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "a nested value object cannot be stored on its own"
    );
}
