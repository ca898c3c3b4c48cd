//! Integration tests for the admin-configurable review schema

mod common;

use common::{database::*, fixtures::*};
use homerate::error::ServiceError;
use homerate::orm::review_fields::FieldKind;
use homerate::review_schema::{
    create_field, delete_field, list_fields, reorder, seed_default_fields, update_field,
    NewReviewField, ReviewFieldChanges,
};
use homerate::reviews::{create_review, get_review};
use homerate::validation::FieldValue;

fn rating_field(name: &str) -> NewReviewField {
    NewReviewField {
        name: name.to_string(),
        label: name.to_uppercase(),
        kind: FieldKind::Rating,
        required: true,
        min_value: Some(1),
        max_value: Some(5),
        display_order: None,
    }
}

fn orders_and_names(fields: &[homerate::review_schema::ReviewFieldDefinition]) -> Vec<(i32, String)> {
    fields
        .iter()
        .map(|f| (f.display_order, f.name.clone()))
        .collect()
}

#[actix_rt::test]
async fn test_default_schema_is_seeded() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let fields = list_fields(&db).await.expect("Failed to list fields");
    assert_eq!(fields.len(), 10);

    for (i, name) in DEFAULT_RATING_FIELDS.iter().enumerate() {
        assert_eq!(fields[i].name, *name);
        assert_eq!(fields[i].display_order, i as i32 + 1);
        assert_eq!(fields[i].kind, FieldKind::Rating);
        assert!(fields[i].required);
        assert_eq!(fields[i].min_value, Some(1));
        assert_eq!(fields[i].max_value, Some(5));
    }

    assert_eq!(fields[9].name, "overall_comment");
    assert_eq!(fields[9].kind, FieldKind::LongText);
    assert_eq!(fields[9].display_order, 10);
    assert_eq!(fields[6].label, "Windows & Doors");
}

#[actix_rt::test]
async fn test_seeding_only_fills_an_empty_schema() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let seeded = seed_default_fields(&db).await.expect("Seeding failed");
    assert_eq!(seeded, 0);
    assert_eq!(list_fields(&db).await.unwrap().len(), 10);
}

#[actix_rt::test]
async fn test_create_field_appends_after_last() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let field = create_field(&db, rating_field("landscaping"))
        .await
        .expect("Failed to create field");
    assert_eq!(field.display_order, 11);

    let fields = list_fields(&db).await.unwrap();
    assert_eq!(fields.last().unwrap().name, "landscaping");
}

#[actix_rt::test]
async fn test_create_field_on_empty_schema_starts_at_one() {
    let db = setup_empty_database()
        .await
        .expect("Failed to set up test database");

    let field = create_field(&db, rating_field("kitchen"))
        .await
        .expect("Failed to create field");
    assert_eq!(field.display_order, 1);
}

#[actix_rt::test]
async fn test_create_field_keeps_given_order_and_ties_break_by_id() {
    let db = setup_empty_database()
        .await
        .expect("Failed to set up test database");

    let mut first = rating_field("first");
    first.display_order = Some(3);
    let mut second = rating_field("second");
    second.display_order = Some(3);
    let mut third = rating_field("third");
    third.display_order = Some(1);

    create_field(&db, first).await.unwrap();
    create_field(&db, second).await.unwrap();
    create_field(&db, third).await.unwrap();

    let fields = list_fields(&db).await.unwrap();
    assert_eq!(
        orders_and_names(&fields),
        vec![
            (1, "third".to_string()),
            (3, "first".to_string()),
            (3, "second".to_string()),
        ]
    );
}

#[actix_rt::test]
async fn test_create_field_rejects_invalid_definitions() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    // Name collision
    let result = create_field(&db, rating_field("kitchen")).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    // Inverted bounds
    let mut inverted = rating_field("garage");
    inverted.min_value = Some(5);
    inverted.max_value = Some(1);
    assert!(matches!(
        create_field(&db, inverted).await,
        Err(ServiceError::Validation(_))
    ));

    // Missing bound
    let mut unbounded = rating_field("garage");
    unbounded.max_value = None;
    match create_field(&db, unbounded).await {
        Err(ServiceError::Validation(e)) => assert_eq!(e.missing, vec!["max".to_string()]),
        other => panic!("Expected validation error, got {:?}", other),
    }

    // Bad machine name
    assert!(matches!(
        create_field(&db, rating_field("Garage Door")).await,
        Err(ServiceError::Validation(_))
    ));

    assert_eq!(list_fields(&db).await.unwrap().len(), 10);
}

#[actix_rt::test]
async fn test_text_fields_need_no_bounds() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let field = create_field(
        &db,
        NewReviewField {
            name: "headline".to_string(),
            label: "Headline".to_string(),
            kind: FieldKind::ShortText,
            required: false,
            min_value: None,
            max_value: None,
            display_order: None,
        },
    )
    .await
    .expect("Failed to create text field");

    assert_eq!(field.kind, FieldKind::ShortText);
    assert_eq!(field.min_value, None);
}

#[actix_rt::test]
async fn test_update_field_changes_only_supplied_attributes() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let kitchen = list_fields(&db).await.unwrap()[4].clone();
    let updated = update_field(
        &db,
        kitchen.id,
        ReviewFieldChanges {
            label: Some("Kitchen & Pantry".to_string()),
            required: Some(false),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to update field");

    assert_eq!(updated.label, "Kitchen & Pantry");
    assert!(!updated.required);
    assert_eq!(updated.name, "kitchen");
    assert_eq!(updated.display_order, kitchen.display_order);
    assert_eq!(updated.min_value, Some(1));
    assert_eq!(updated.max_value, Some(5));
}

#[actix_rt::test]
async fn test_update_field_enforces_invariants_on_merged_definition() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let fields = list_fields(&db).await.unwrap();
    let kitchen = &fields[4];

    // min 9 against the stored max of 5
    let result = update_field(
        &db,
        kitchen.id,
        ReviewFieldChanges {
            min_value: Some(9),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    // rename onto another field's name
    let result = update_field(
        &db,
        kitchen.id,
        ReviewFieldChanges {
            name: Some("plumbing".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    // renaming to its own name is allowed
    update_field(
        &db,
        kitchen.id,
        ReviewFieldChanges {
            name: Some("kitchen".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("Renaming a field to its own name should succeed");

    let unchanged = list_fields(&db).await.unwrap();
    assert_eq!(unchanged[4].min_value, Some(1));
    assert_eq!(unchanged[4].name, "kitchen");
}

#[actix_rt::test]
async fn test_update_and_delete_unknown_field() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let result = update_field(&db, 9999, ReviewFieldChanges::default()).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let result = delete_field(&db, 9999).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[actix_rt::test]
async fn test_delete_field_leaves_reviews_untouched() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let author = create_test_homeowner(&db, "Alice").await.unwrap();
    let builder = create_test_builder(&db, "Acme Homes").await.unwrap();
    let review_id = create_review(&db, author.id, builder.id, rating_submission(4.0))
        .await
        .expect("Failed to create review");

    let kitchen = list_fields(&db).await.unwrap()[4].clone();
    delete_field(&db, kitchen.id)
        .await
        .expect("Failed to delete field");

    let fields = list_fields(&db).await.unwrap();
    assert_eq!(fields.len(), 9);
    assert!(fields.iter().all(|f| f.name != "kitchen"));

    let review = get_review(&db, review_id).await.unwrap();
    assert_eq!(review.values.get("kitchen"), Some(&FieldValue::Number(4.0)));
    assert_eq!(review.values.len(), 9);
}

#[actix_rt::test]
async fn test_reorder_assigns_positions() {
    let db = setup_empty_database()
        .await
        .expect("Failed to set up test database");

    let f1 = create_field(&db, rating_field("f1")).await.unwrap();
    let f2 = create_field(&db, rating_field("f2")).await.unwrap();
    let f3 = create_field(&db, rating_field("f3")).await.unwrap();

    reorder(&db, &[f3.id, f1.id, f2.id])
        .await
        .expect("Failed to reorder");

    let fields = list_fields(&db).await.unwrap();
    assert_eq!(
        orders_and_names(&fields),
        vec![
            (1, "f3".to_string()),
            (2, "f1".to_string()),
            (3, "f2".to_string()),
        ]
    );

    // Applying the same order again changes nothing.
    reorder(&db, &[f3.id, f1.id, f2.id]).await.unwrap();
    assert_eq!(orders_and_names(&list_fields(&db).await.unwrap()), orders_and_names(&fields));
}

#[actix_rt::test]
async fn test_reorder_leaves_unlisted_fields_alone() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");

    let fields = list_fields(&db).await.unwrap();
    let plumbing = &fields[8];
    let comment = &fields[9];

    reorder(&db, &[plumbing.id]).await.unwrap();

    let after = list_fields(&db).await.unwrap();
    // build_quality kept order 1 and wins the tie on id
    assert_eq!(after[0].name, "build_quality");
    assert_eq!(after[0].display_order, 1);
    assert_eq!(after[1].name, "plumbing");
    assert_eq!(after[1].display_order, 1);
    assert_eq!(after[2].name, "material_quality");
    assert_eq!(after.last().unwrap().id, comment.id);
    assert_eq!(after.last().unwrap().display_order, 10);
}

#[actix_rt::test]
async fn test_reorder_rejects_unknown_and_duplicate_ids() {
    let db = setup_empty_database()
        .await
        .expect("Failed to set up test database");

    let f1 = create_field(&db, rating_field("f1")).await.unwrap();
    let f2 = create_field(&db, rating_field("f2")).await.unwrap();
    let before = orders_and_names(&list_fields(&db).await.unwrap());

    let result = reorder(&db, &[f2.id, 4242, f1.id]).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    assert_eq!(orders_and_names(&list_fields(&db).await.unwrap()), before);

    let result = reorder(&db, &[f2.id, f1.id, f2.id]).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
    assert_eq!(orders_and_names(&list_fields(&db).await.unwrap()), before);
}
