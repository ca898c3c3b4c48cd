//! Builder rating aggregate.
//!
//! `builders.average_rating` and `builders.total_reviews` are a materialized
//! view of the builder's reviews. They are only ever written by [`recompute`],
//! which re-derives both from the full review set inside the caller's
//! transaction.

use crate::error::{ServiceError, ServiceResult};
use crate::orm::{builders, review_values, reviews};
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, ConnectionTrait, DbErr};
use serde::Serialize;
use std::collections::BTreeMap;

/// Derived rating state of one builder.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Aggregate {
    /// Null when `total_reviews` is zero, and also when no review captured a
    /// rating (see "Reviews with no numeric values" in DESIGN.md)
    pub average_rating: Option<f64>,
    pub total_reviews: i32,
}

/// Mean of one review's numeric values. `None` if the review has none.
pub fn sub_average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unweighted mean over the sub-averages of every review.
///
/// Every review counts toward `total_reviews`. Reviews without numeric values
/// have no sub-average and are left out of the mean.
pub fn aggregate(sub_averages: &[Option<f64>]) -> Aggregate {
    let rated: Vec<f64> = sub_averages.iter().flatten().copied().collect();
    let average_rating = if rated.is_empty() {
        None
    } else {
        Some(rated.iter().sum::<f64>() / rated.len() as f64)
    };

    Aggregate {
        average_rating,
        total_reviews: sub_averages.len() as i32,
    }
}

/// Takes the builder's row lock for the rest of the transaction.
///
/// Every review mutation calls this before reading anything, so mutations on
/// one builder run one after another while other builders are unaffected.
pub async fn lock_builder<C: ConnectionTrait>(conn: &C, builder_id: i32) -> ServiceResult<()> {
    let res = builders::Entity::update_many()
        .col_expr(
            builders::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .filter(builders::Column::Id.eq(builder_id))
        .exec(conn)
        .await?;

    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("Builder", builder_id));
    }
    Ok(())
}

/// Reads the builder's reviews and computes the aggregate without writing.
pub async fn derive<C: ConnectionTrait>(conn: &C, builder_id: i32) -> Result<Aggregate, DbErr> {
    let review_ids: Vec<i32> = reviews::Entity::find()
        .filter(reviews::Column::BuilderId.eq(builder_id))
        .order_by_asc(reviews::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    if review_ids.is_empty() {
        return Ok(aggregate(&[]));
    }

    let mut numeric: BTreeMap<i32, Vec<f64>> =
        review_ids.iter().map(|id| (*id, Vec::new())).collect();

    let values = review_values::Entity::find()
        .filter(review_values::Column::ReviewId.is_in(review_ids))
        .filter(review_values::Column::NumericValue.is_not_null())
        .all(conn)
        .await?;

    for value in values {
        if let (Some(n), Some(bucket)) = (value.numeric_value, numeric.get_mut(&value.review_id)) {
            bucket.push(n);
        }
    }

    let sub_averages: Vec<Option<f64>> = numeric.values().map(|v| sub_average(v)).collect();
    Ok(aggregate(&sub_averages))
}

/// Re-derives and persists the builder's aggregate.
///
/// Any failure is reported as [`ServiceError::Consistency`]; the caller must
/// roll back its transaction.
pub async fn recompute<C: ConnectionTrait>(conn: &C, builder_id: i32) -> ServiceResult<Aggregate> {
    let result = async {
        let agg = derive(conn, builder_id).await?;

        let res = builders::Entity::update_many()
            .col_expr(builders::Column::AverageRating, Expr::value(agg.average_rating))
            .col_expr(builders::Column::TotalReviews, Expr::value(agg.total_reviews))
            .filter(builders::Column::Id.eq(builder_id))
            .exec(conn)
            .await?;

        if res.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("builder {}", builder_id)));
        }
        Ok::<_, DbErr>(agg)
    }
    .await;

    match result {
        Ok(agg) => {
            log::debug!(
                "Builder {} aggregate: {:?} over {} reviews",
                builder_id,
                agg.average_rating,
                agg.total_reviews
            );
            Ok(agg)
        }
        Err(e) => {
            log::warn!("Aggregate recomputation failed for builder {}: {}", builder_id, e);
            Err(ServiceError::Consistency(e))
        }
    }
}
