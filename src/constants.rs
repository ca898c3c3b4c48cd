//! Application-wide constants
//!
//! This module contains constants used throughout the application.

/// Maximum number of photos attached to a single review
pub const MAX_REVIEW_PHOTOS: usize = 5;

/// Schema key of the long-text field backed by the review's overall comment.
/// The comment is stored on the review row itself, not as a captured value.
pub const OVERALL_COMMENT_FIELD: &str = "overall_comment";

/// Header carrying the caller's user id, set by the identity collaborator
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the caller's role, set by the identity collaborator
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Maximum length of a review field machine name
pub const MAX_FIELD_NAME_LENGTH: usize = 64;
