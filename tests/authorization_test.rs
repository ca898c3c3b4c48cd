//! Integration tests for who may change a review

mod common;

use common::{database::*, fixtures::*};
use homerate::error::ServiceError;
use homerate::orm::users::Role;
use homerate::reviews::{create_review, delete_review, get_review, update_review};
use homerate::validation::FieldValue;

#[actix_rt::test]
async fn test_other_homeowner_cannot_edit_or_delete() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");
    let alice = create_test_homeowner(&db, "Alice").await.unwrap();
    let mallory = create_test_homeowner(&db, "Mallory").await.unwrap();
    let builder = create_test_builder(&db, "Acme Homes").await.unwrap();

    let mut submission = rating_submission(4.0);
    submission.photos = photo_urls(2);
    let review_id = create_review(&db, alice.id, builder.id, submission)
        .await
        .unwrap();
    let before = get_review(&db, review_id).await.unwrap();

    let result = update_review(
        &db,
        review_id,
        mallory.id,
        Role::Homeowner,
        rating_submission(1.0),
    )
    .await;
    assert!(matches!(result, Err(ServiceError::Authorization(_))));

    let result = delete_review(&db, review_id, mallory.id, Role::Homeowner).await;
    assert!(matches!(result, Err(ServiceError::Authorization(_))));

    assert_eq!(get_review(&db, review_id).await.unwrap(), before);
}

#[actix_rt::test]
async fn test_builder_role_is_not_an_admin() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");
    let alice = create_test_homeowner(&db, "Alice").await.unwrap();
    let owner = create_test_user(&db, "Builder Owner", Role::Builder)
        .await
        .unwrap();
    let builder = create_test_builder(&db, "Acme Homes").await.unwrap();

    let review_id = create_review(&db, alice.id, builder.id, rating_submission(1.0))
        .await
        .unwrap();

    let result = delete_review(&db, review_id, owner.id, Role::Builder).await;
    assert!(matches!(result, Err(ServiceError::Authorization(_))));
    assert!(get_review(&db, review_id).await.is_ok());
}

#[actix_rt::test]
async fn test_author_and_admin_may_edit() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");
    let alice = create_test_homeowner(&db, "Alice").await.unwrap();
    let admin = create_test_admin(&db, "Admin").await.unwrap();
    let builder = create_test_builder(&db, "Acme Homes").await.unwrap();

    let review_id = create_review(&db, alice.id, builder.id, rating_submission(4.0))
        .await
        .unwrap();

    update_review(&db, review_id, alice.id, Role::Homeowner, rating_submission(3.0))
        .await
        .expect("Author should be able to edit");
    assert_eq!(
        get_review(&db, review_id).await.unwrap().values.get("kitchen"),
        Some(&FieldValue::Number(3.0))
    );

    update_review(&db, review_id, admin.id, Role::Admin, rating_submission(2.0))
        .await
        .expect("Admin should be able to edit");
    let review = get_review(&db, review_id).await.unwrap();
    assert_eq!(review.values.get("kitchen"), Some(&FieldValue::Number(2.0)));
    // Editing never transfers authorship.
    assert_eq!(review.author_id, alice.id);

    delete_review(&db, review_id, admin.id, Role::Admin)
        .await
        .expect("Admin should be able to delete");
    assert!(matches!(
        get_review(&db, review_id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[actix_rt::test]
async fn test_unknown_review_is_not_found_before_authorization() {
    let db = setup_test_database()
        .await
        .expect("Failed to set up test database");
    let alice = create_test_homeowner(&db, "Alice").await.unwrap();

    let result = update_review(&db, 4242, alice.id, Role::Homeowner, rating_submission(3.0)).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let result = delete_review(&db, 4242, alice.id, Role::Homeowner).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
