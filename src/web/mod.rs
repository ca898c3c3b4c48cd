pub mod admin;
pub mod builders;
pub mod error;
pub mod review_schema;
pub mod reviews;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    builders::configure(conf);
    reviews::configure(conf);
    review_schema::configure(conf);
    admin::configure(conf);
}
