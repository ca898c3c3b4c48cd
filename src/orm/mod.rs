pub mod builders;
pub mod review_fields;
pub mod review_images;
pub mod review_values;
pub mod reviews;
pub mod users;
