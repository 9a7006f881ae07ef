use pretty_assertions::assert_eq;
use tests::prelude::*;

fn subquery(filter: Filter) -> Filter {
    Filter::InSubquery(FilterSubquery {
        columns: vec!["TestAnimalId".to_string()],
        table: "Animals".to_string(),
        target_columns: vec!["Id".to_string()],
        filter: Box::new(filter),
    })
}

/// `((Dog)x.TestAnimal).EyeId`
fn test_animal_eye_id(zoo: &Zoo) -> Path {
    Path::root().field("TestAnimal").field_as(zoo.dog, "EyeId")
}

#[tokio::test]
async fn enum_with_explicit_param_converter() {
    let (mut test, zoo) = zoo::setup().await;
    test.log().clear();

    let expr = Expr::eq(Path::from("AnimalType"), zoo.big());
    let animals = test
        .db()
        .all(&Query::new(zoo.animal).filter(expr))
        .await
        .unwrap();

    assert_eq!(animals.len(), 1);
    assert_eq!(animals[0].model(), Some(zoo.dog));
    assert_eq!(
        test.log().fetch_filters(),
        vec![("Animals".to_string(), Filter::eq("AnimalType", "Big"))]
    );
}

#[tokio::test]
async fn enum_with_name_policy() {
    let (mut test, zoo) = zoo::setup().await;
    test.log().clear();

    let expr = Expr::eq(Path::from("AnimalType2"), zoo.big2());
    let animals = test
        .db()
        .all(&Query::new(zoo.animal).filter(expr))
        .await
        .unwrap();

    assert_eq!(animals.len(), 1);
    assert_eq!(
        test.log().fetch_filters(),
        vec![("Animals".to_string(), Filter::eq("AnimalType2", "Big"))]
    );

    let small = Expr::eq(Path::from("AnimalType2"), zoo.small2());
    let animals = test
        .db()
        .all(&Query::new(zoo.animal).filter(small))
        .await
        .unwrap();
    assert!(animals.is_empty());
}

#[tokio::test]
async fn type_check_on_queried_object() {
    let (test, zoo) = zoo::setup().await;

    let filter = test
        .db()
        .translate(zoo.animal, &Expr::is_type(Path::root(), zoo.super_wild_animal))
        .unwrap();

    assert_eq!(
        filter,
        Filter::InList {
            column: "Discriminator".to_string(),
            values: vec![Value::from("SuperWildAnimal"), Value::from("Dog")],
        }
    );

    // Every dog is an animal
    let filter = test
        .db()
        .translate(zoo.dog, &Expr::is_type(Path::root(), zoo.animal))
        .unwrap();
    assert_eq!(filter, Filter::True);
}

#[tokio::test]
async fn type_check_against_unrelated_model_is_rejected() {
    let (test, zoo) = zoo::setup().await;

    let err = test
        .db()
        .translate(zoo.animal, &Expr::is_type(Path::root(), zoo.eye))
        .unwrap_err();

    assert!(err.is_invalid_expression());
    assert_eq!(
        err.to_string(),
        "invalid expression: `Animal` can never be a `Eye`"
    );
}

#[tokio::test]
async fn guarded_cast_through_association() {
    let (mut test, zoo) = zoo::setup().await;
    test.log().clear();

    let expr = Expr::and(
        Expr::is_type("TestAnimal", zoo.dog),
        Expr::eq(test_animal_eye_id(&zoo), 1),
    );

    let tests = test
        .db()
        .all(&Query::new(zoo.test).filter(expr))
        .await
        .unwrap();

    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0].get("Id"), Some(&Value::I32(2)));

    assert_eq!(
        test.log().fetch_filters(),
        vec![(
            "Test".to_string(),
            Filter::And(vec![
                subquery(Filter::eq("Discriminator", "Dog")),
                subquery(Filter::eq("EyeId", 1)),
            ]),
        )]
    );
}

#[tokio::test]
async fn unguarded_downcast_is_scoped_by_default() {
    let (test, zoo) = zoo::setup().await;

    let filter = test
        .db()
        .translate(zoo.test, &Expr::eq(test_animal_eye_id(&zoo), 1))
        .unwrap();

    assert_eq!(
        filter,
        subquery(Filter::And(vec![
            Filter::eq("Discriminator", "Dog"),
            Filter::eq("EyeId", 1),
        ]))
    );
}

#[tokio::test]
async fn unguarded_downcast_left_to_caller() {
    let mut builder = Db::builder();
    builder.cast_scope(CastScope::Caller);
    let (test, zoo) = zoo::setup_with(&builder).await;

    let filter = test
        .db()
        .translate(zoo.test, &Expr::eq(test_animal_eye_id(&zoo), 1))
        .unwrap();

    assert_eq!(filter, subquery(Filter::eq("EyeId", 1)));

    let filter = test
        .db()
        .translate(
            zoo.animal,
            &Expr::eq(Path::root().field_as(zoo.dog, "EyeId"), 1),
        )
        .unwrap();
    assert_eq!(filter, Filter::eq("EyeId", 1));
}

#[tokio::test]
async fn downcast_on_queried_object() {
    let (test, zoo) = zoo::setup().await;
    let eye_id = Path::root().field_as(zoo.dog, "EyeId");

    let unguarded = test
        .db()
        .translate(zoo.animal, &Expr::eq(eye_id.clone(), 1))
        .unwrap();
    assert_eq!(
        unguarded,
        Filter::And(vec![
            Filter::eq("Discriminator", "Dog"),
            Filter::eq("EyeId", 1),
        ])
    );

    // A type check in the same conjunction stands in for the scope
    let guarded = test
        .db()
        .translate(
            zoo.animal,
            &Expr::and(Expr::is_type(Path::root(), zoo.dog), Expr::eq(eye_id, 1)),
        )
        .unwrap();
    assert_eq!(guarded, unguarded);
}

#[tokio::test]
async fn upcast_is_a_no_op() {
    let (test, zoo) = zoo::setup().await;

    let filter = test
        .db()
        .translate(
            zoo.dog,
            &Expr::eq(Path::root().field_as(zoo.animal, "Name"), Expr::value("FirstDog")),
        )
        .unwrap();

    assert_eq!(filter, Filter::eq("Name", "FirstDog"));
}

#[tokio::test]
async fn cast_to_unrelated_model_is_rejected() {
    let (test, zoo) = zoo::setup().await;

    let err = test
        .db()
        .translate(zoo.animal, &Expr::is_null(Path::root().field_as(zoo.eye, "Xy")))
        .unwrap_err();

    assert!(err.is_invalid_expression());
}

#[tokio::test]
async fn member_of_subtype_requires_cast() {
    let (test, zoo) = zoo::setup().await;

    let err = test
        .db()
        .translate(zoo.animal, &Expr::eq(Path::from("EyeId"), 1))
        .unwrap_err();

    assert!(err.is_invalid_expression());
    assert_eq!(
        err.to_string(),
        "invalid expression: `Animal` has no mapped member `EyeId`"
    );
}

#[tokio::test]
async fn comparisons_with_null_literals() {
    let (test, zoo) = zoo::setup().await;
    let db = test.db();

    assert_eq!(
        db.translate(zoo.animal, &Expr::eq(Path::from("Name"), Value::Null))
            .unwrap(),
        Filter::is_null("Name")
    );
    assert_eq!(
        db.translate(zoo.animal, &Expr::ne(Value::Null, Path::from("Name")))
            .unwrap(),
        Filter::not(Filter::is_null("Name"))
    );
    assert_eq!(
        db.translate(zoo.animal, &Expr::gt(Path::from("Id"), Value::Null))
            .unwrap(),
        Filter::False
    );
}

#[tokio::test]
async fn value_on_the_left_is_commuted() {
    let (test, zoo) = zoo::setup().await;

    let filter = test
        .db()
        .translate(zoo.eye, &Expr::lt(1, Path::from("Id")))
        .unwrap();

    assert_eq!(filter, Filter::compare("Id", BinaryOp::Gt, 1));
}

#[tokio::test]
async fn constant_comparisons_fold() {
    let (test, zoo) = zoo::setup().await;
    let db = test.db();

    assert_eq!(db.translate(zoo.eye, &Expr::eq(1, 1)).unwrap(), Filter::True);
    assert_eq!(
        db.translate(zoo.eye, &Expr::and(Expr::eq(1, 2), Expr::is_null("Xy")))
            .unwrap(),
        Filter::False
    );
}

#[tokio::test]
async fn comparing_two_members_is_rejected() {
    let (test, zoo) = zoo::setup().await;

    let err = test
        .db()
        .translate(zoo.eye, &Expr::eq(Path::from("Id"), Path::from("Id")))
        .unwrap_err();

    assert!(err.is_invalid_expression());
}

#[tokio::test]
async fn association_null_checks_use_owner_keys() {
    let (test, zoo) = zoo::setup().await;

    let tests = test
        .db()
        .all(&Query::new(zoo.test).filter(Expr::is_null("TestAnimal")))
        .await
        .unwrap();

    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0].get("Id"), Some(&Value::I32(1)));

    let filter = test
        .db()
        .translate(zoo.test, &Expr::ne(Path::from("TestAnimal"), Value::Null))
        .unwrap();
    assert_eq!(filter, Filter::not(Filter::is_null("TestAnimalId")));
}

#[tokio::test]
async fn in_list_converts_each_value() {
    let (test, zoo) = zoo::setup().await;

    let filter = test
        .db()
        .translate(
            zoo.animal,
            &Expr::in_list("AnimalType", [zoo.small(), zoo.big()]),
        )
        .unwrap();

    assert_eq!(
        filter,
        Filter::InList {
            column: "AnimalType".to_string(),
            values: vec![Value::from("Small"), Value::from("Big")],
        }
    );
}

#[tokio::test]
async fn or_and_not_stay_structural() {
    let (test, zoo) = zoo::setup().await;

    let expr = Expr::or(
        Expr::eq(Path::from("Id"), 1),
        Expr::not(Expr::is_null("Xy")),
    );
    let filter = test.db().translate(zoo.eye, &expr).unwrap();

    assert_eq!(
        filter,
        Filter::Or(vec![
            Filter::eq("Id", 1),
            Filter::not(Filter::is_null("Xy")),
        ])
    );
}

#[tokio::test]
async fn scalar_member_is_not_a_predicate() {
    let (test, zoo) = zoo::setup().await;

    let err = test
        .db()
        .translate(zoo.eye, &Expr::member("Xy"))
        .unwrap_err();

    assert!(err.is_invalid_expression());
}

#[tokio::test]
async fn not_equal_matches_missing_values() {
    let (test, zoo) = zoo::setup().await;
    let db = test.db();
    db.insert(&zoo.dog(2, None)).await.unwrap();

    assert_eq!(
        db.translate(zoo.dog, &Expr::ne(Path::from("EyeId"), 1))
            .unwrap(),
        Filter::Or(vec![
            Filter::compare("EyeId", BinaryOp::Ne, 1),
            Filter::is_null("EyeId"),
        ])
    );

    // Non-nullable columns need no null branch
    assert_eq!(
        db.translate(zoo.dog, &Expr::ne(Path::from("Id"), 1))
            .unwrap(),
        Filter::compare("Id", BinaryOp::Ne, 1)
    );

    let ne = db
        .all(&Query::new(zoo.dog).filter(Expr::ne(Path::from("EyeId"), 1)))
        .await
        .unwrap();
    let not_eq = db
        .all(&Query::new(zoo.dog).filter(Expr::not(Expr::eq(Path::from("EyeId"), 1))))
        .await
        .unwrap();

    assert_eq!(ne.len(), 1);
    assert_eq!(ne[0].get("Id"), Some(&Value::I32(2)));
    assert_eq!(ne, not_eq);
}
