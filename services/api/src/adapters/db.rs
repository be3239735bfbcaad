//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `GraphStore` and `CatalogStore` ports from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.
//!
//! Each port method runs as a single statement or inside a single transaction, so
//! it is atomic on its own. Ratings are never stored; listing queries compute them
//! from the `reviews` table in the same snapshot they filter and sort on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recipe_feed_core::domain::{
    FollowCounts, Gender, NewRecipe, NewReview, NewUser, ProfileUpdate, Recipe,
    RecipeComplexity, RecipeFilter, RecipeId, RecipeSort, Review, ReviewId, ReviewPolicy, User,
    UserId,
};
use recipe_feed_core::times::{CookingTime, RecipeTimes};
use recipe_feed_core::ports::{CatalogStore, GraphStore, PortError, PortResult};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::BTreeSet;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements both store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Maps a driver error to a port error. `missing` describes what a
/// `RowNotFound` or a dangling foreign key refers to.
fn port_error(e: sqlx::Error, missing: impl FnOnce() -> String) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(missing()),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => PortError::NotFound(missing()),
            _ => PortError::Unexpected(e.to_string()),
        },
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "id, name, gender, age, deleted";

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    gender: String,
    age: i32,
    deleted: bool,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: UserId(self.id),
            name: self.name,
            gender: self.gender.parse().unwrap_or(Gender::Unknown),
            age: u32::try_from(self.age).unwrap_or(0),
            deleted: self.deleted,
        }
    }
}

const RECIPE_COLUMNS: &str = "id, author_id, name, category, description, ingredients, calories,
     cook_time_ms, prep_time_ms, published_at";

#[derive(FromRow)]
struct RecipeRecord {
    id: i64,
    author_id: i64,
    name: String,
    category: String,
    description: String,
    ingredients: Vec<String>,
    calories: Option<f64>,
    cook_time_ms: Option<i64>,
    prep_time_ms: Option<i64>,
    published_at: DateTime<Utc>,
}
impl RecipeRecord {
    fn to_domain(self) -> Recipe {
        Recipe {
            id: RecipeId(self.id),
            author_id: UserId(self.author_id),
            name: self.name,
            category: self.category,
            description: self.description,
            ingredients: self.ingredients,
            calories: self.calories,
            times: RecipeTimes {
                cook: self.cook_time_ms.and_then(CookingTime::from_millis),
                prep: self.prep_time_ms.and_then(CookingTime::from_millis),
            },
            published_at: self.published_at,
        }
    }
}

#[derive(FromRow)]
struct ComplexityRecord {
    recipe_id: i64,
    name: String,
    ingredient_count: i64,
    published_at: DateTime<Utc>,
}
impl ComplexityRecord {
    fn to_domain(self) -> RecipeComplexity {
        RecipeComplexity {
            recipe_id: RecipeId(self.recipe_id),
            name: self.name,
            ingredient_count: count(self.ingredient_count),
            published_at: self.published_at,
        }
    }
}

/// Reviews are always read together with their liker set.
const REVIEW_SELECT: &str = "
    SELECT v.id, v.recipe_id, v.author_id, v.rating, v.content, v.submitted_at,
           COALESCE(array_agg(l.user_id ORDER BY l.user_id)
                    FILTER (WHERE l.user_id IS NOT NULL), '{}'::BIGINT[]) AS likers
    FROM reviews v
    LEFT JOIN review_likes l ON l.review_id = v.id";

#[derive(FromRow)]
struct ReviewRecord {
    id: i64,
    recipe_id: i64,
    author_id: i64,
    rating: i16,
    content: String,
    submitted_at: DateTime<Utc>,
    likers: Vec<i64>,
}
impl ReviewRecord {
    fn to_domain(self) -> Review {
        Review {
            id: ReviewId(self.id),
            recipe_id: RecipeId(self.recipe_id),
            author_id: UserId(self.author_id),
            rating: u8::try_from(self.rating).unwrap_or(0),
            content: self.content,
            submitted_at: self.submitted_at,
            likers: self.likers.into_iter().map(UserId).collect(),
        }
    }
}

#[derive(FromRow)]
struct FollowCountsRecord {
    user_id: i64,
    followers: i64,
    following: i64,
}
impl FollowCountsRecord {
    fn to_domain(self) -> FollowCounts {
        FollowCounts {
            user_id: UserId(self.user_id),
            followers: count(self.followers),
            following: count(self.following),
        }
    }
}

//=========================================================================================
// Recipe Listing Query
//=========================================================================================

/// Recipes joined with their current average rating.
const RATED_RECIPES: &str = "
    WITH rated AS (
        SELECT r.*,
               (SELECT AVG(v.rating)::DOUBLE PRECISION
                FROM reviews v WHERE v.recipe_id = r.id) AS avg_rating
        FROM recipes r
    )";

/// Escapes `%`, `_` and `\` so a keyword is matched literally by `LIKE`.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &RecipeFilter) {
    qb.push(" WHERE TRUE");
    if let Some(authors) = &filter.authors {
        let ids: Vec<i64> = authors.iter().map(|a| a.0).collect();
        qb.push(" AND r.author_id = ANY(").push_bind(ids).push(")");
    }
    if let Some(keyword) = &filter.keyword {
        let pattern = like_pattern(keyword);
        qb.push(" AND (LOWER(r.name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(r.description) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = &filter.category {
        qb.push(" AND r.category = ").push_bind(category.clone());
    }
    if let Some(min_rating) = filter.min_rating {
        qb.push(" AND r.avg_rating >= ").push_bind(min_rating);
    }
}

fn order_by(sort: RecipeSort) -> &'static str {
    match sort {
        RecipeSort::Newest => " ORDER BY r.published_at DESC, r.id ASC",
        RecipeSort::TopRated => {
            " ORDER BY r.avg_rating DESC NULLS LAST, r.published_at DESC, r.id ASC"
        }
        RecipeSort::LeastCalories => " ORDER BY r.calories ASC NULLS LAST, r.id ASC",
    }
}

//=========================================================================================
// `GraphStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl GraphStore for DbAdapter {
    async fn edge_exists(&self, follower: UserId, followee: UserId) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower.0)
        .bind(followee.0)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn add_edge(&self, follower: UserId, followee: UserId) -> PortResult<bool> {
        let result = sqlx::query(
            "INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(follower.0)
        .bind(followee.0)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            port_error(e, || {
                format!("User {} or {} not found", follower, followee)
            })
        })?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_edge(&self, follower: UserId, followee: UserId) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower.0)
            .bind(followee.0)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() == 1)
    }

    async fn follower_count(&self, user_id: UserId) -> PortResult<u64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count(n))
    }

    async fn following_count(&self, user_id: UserId) -> PortResult<u64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count(n))
    }

    async fn followees_of(&self, user_id: UserId) -> PortResult<BTreeSet<UserId>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT followee_id FROM follows WHERE follower_id = $1")
            .bind(user_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(ids.into_iter().map(UserId).collect())
    }

    async fn followers_of(&self, user_id: UserId) -> PortResult<BTreeSet<UserId>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT follower_id FROM follows WHERE followee_id = $1")
            .bind(user_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(ids.into_iter().map(UserId).collect())
    }

    async fn follow_counts(&self) -> PortResult<Vec<FollowCounts>> {
        let records = sqlx::query_as::<_, FollowCountsRecord>(
            "SELECT u.id AS user_id,
                    (SELECT COUNT(*) FROM follows f WHERE f.followee_id = u.id) AS followers,
                    (SELECT COUNT(*) FROM follows f WHERE f.follower_id = u.id) AS following
             FROM users u
             WHERE NOT u.deleted
             ORDER BY u.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn remove_all_edges(&self, user_id: UserId) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 OR followee_id = $1")
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let age = i32::try_from(new_user.age)
            .map_err(|_| PortError::Unexpected(format!("age {} out of range", new_user.age)))?;
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (name, gender, age, credential) VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.name)
        .bind(new_user.gender.as_str())
        .bind(age)
        .bind(&new_user.credential)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: UserId) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn update_user(&self, user_id: UserId, update: &ProfileUpdate) -> PortResult<User> {
        let age = update.age.and_then(|age| i32::try_from(age).ok());
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET gender = COALESCE($2, gender), age = COALESCE($3, age)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id.0)
        .bind(update.gender.map(Gender::as_str))
        .bind(age)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn deactivate_user(&self, user_id: UserId) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET deleted = TRUE WHERE id = $1")
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| port_error(e, || format!("User {} not found", user_id)))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn create_recipe(&self, author_id: UserId, recipe: NewRecipe) -> PortResult<Recipe> {
        let record = sqlx::query_as::<_, RecipeRecord>(&format!(
            "INSERT INTO recipes (author_id, name, category, description, ingredients, calories,
                                  cook_time_ms, prep_time_ms, published_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(author_id.0)
        .bind(&recipe.name)
        .bind(&recipe.category)
        .bind(&recipe.description)
        .bind(&recipe.ingredients)
        .bind(recipe.calories)
        .bind(recipe.times.cook.map(|t| t.as_millis()))
        .bind(recipe.times.prep.map(|t| t.as_millis()))
        .bind(recipe.published_at.unwrap_or_else(Utc::now))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("User {} not found", author_id)))?;
        Ok(record.to_domain())
    }

    async fn get_recipe(&self, recipe_id: RecipeId) -> PortResult<Recipe> {
        let record = sqlx::query_as::<_, RecipeRecord>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
        ))
        .bind(recipe_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Recipe {} not found", recipe_id)))?;
        Ok(record.to_domain())
    }

    async fn update_recipe_times(
        &self,
        recipe_id: RecipeId,
        update: RecipeTimes,
    ) -> PortResult<Recipe> {
        let record = sqlx::query_as::<_, RecipeRecord>(&format!(
            "UPDATE recipes
             SET cook_time_ms = COALESCE($2, cook_time_ms),
                 prep_time_ms = COALESCE($3, prep_time_ms)
             WHERE id = $1
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(recipe_id.0)
        .bind(update.cook.map(|t| t.as_millis()))
        .bind(update.prep.map(|t| t.as_millis()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Recipe {} not found", recipe_id)))?;
        Ok(record.to_domain())
    }

    async fn delete_recipe(&self, recipe_id: RecipeId) -> PortResult<()> {
        // Reviews and their likes go with the recipe through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id.0)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Recipe {} not found", recipe_id)));
        }
        Ok(())
    }

    async fn query_recipes(
        &self,
        filter: &RecipeFilter,
        sort: RecipeSort,
        offset: u64,
        limit: u64,
    ) -> PortResult<(Vec<Recipe>, u64)> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        // Window and total must come from the same snapshot.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let mut window_query = QueryBuilder::<Postgres>::new(RATED_RECIPES);
        window_query.push(
            " SELECT r.id, r.author_id, r.name, r.category, r.description,
                     r.ingredients, r.calories, r.cook_time_ms, r.prep_time_ms, r.published_at
              FROM rated r",
        );
        push_filter(&mut window_query, filter);
        window_query.push(order_by(sort));
        window_query.push(" LIMIT ").push_bind(limit);
        window_query.push(" OFFSET ").push_bind(offset);
        let records = window_query
            .build_query_as::<RecipeRecord>()
            .fetch_all(&mut *tx)
            .await
            .map_err(unexpected)?;

        let mut count_query = QueryBuilder::<Postgres>::new(RATED_RECIPES);
        count_query.push(" SELECT COUNT(*) FROM rated r");
        push_filter(&mut count_query, filter);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok((
            records.into_iter().map(|r| r.to_domain()).collect(),
            count(total),
        ))
    }

    async fn recipe_complexities(&self) -> PortResult<Vec<RecipeComplexity>> {
        let records = sqlx::query_as::<_, ComplexityRecord>(
            "SELECT id AS recipe_id, name,
                    cardinality(ingredients)::BIGINT AS ingredient_count,
                    published_at
             FROM recipes",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn reviews_for_recipe(&self, recipe_id: RecipeId) -> PortResult<Vec<Review>> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "{REVIEW_SELECT} WHERE v.recipe_id = $1 GROUP BY v.id ORDER BY v.id"
        ))
        .bind(recipe_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_review(&self, review_id: ReviewId) -> PortResult<Review> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "{REVIEW_SELECT} WHERE v.id = $1 GROUP BY v.id"
        ))
        .bind(review_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Review {} not found", review_id)))?;
        Ok(record.to_domain())
    }

    async fn add_review(&self, review: NewReview, policy: ReviewPolicy) -> PortResult<Review> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Reviews of one recipe are serialized on its row lock.
        sqlx::query_scalar::<_, i64>("SELECT id FROM recipes WHERE id = $1 FOR UPDATE")
            .bind(review.recipe_id.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| port_error(e, || format!("Recipe {} not found", review.recipe_id)))?;

        if policy == ReviewPolicy::OnePerRecipe {
            let already = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM reviews WHERE recipe_id = $1 AND author_id = $2)",
            )
            .bind(review.recipe_id.0)
            .bind(review.author_id.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
            if already {
                return Err(PortError::Conflict(format!(
                    "user {} has already reviewed recipe {}",
                    review.author_id, review.recipe_id
                )));
            }
        }

        let record = sqlx::query_as::<_, ReviewRecord>(
            "INSERT INTO reviews (recipe_id, author_id, rating, content, submitted_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, recipe_id, author_id, rating, content, submitted_at,
                       '{}'::BIGINT[] AS likers",
        )
        .bind(review.recipe_id.0)
        .bind(review.author_id.0)
        .bind(i16::from(review.rating))
        .bind(&review.content)
        .bind(review.submitted_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| port_error(e, || format!("User {} not found", review.author_id)))?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn delete_review(&self, review_id: ReviewId) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id.0)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Review {} not found", review_id)));
        }
        Ok(())
    }

    async fn toggle_like(&self, review_id: ReviewId, user_id: UserId) -> PortResult<bool> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let removed = sqlx::query("DELETE FROM review_likes WHERE review_id = $1 AND user_id = $2")
            .bind(review_id.0)
            .bind(user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?
            .rows_affected();

        let liked = if removed == 0 {
            sqlx::query(
                "INSERT INTO review_likes (review_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(review_id.0)
            .bind(user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| port_error(e, || format!("Review {} not found", review_id)))?;
            true
        } else {
            false
        };

        tx.commit().await.map_err(unexpected)?;
        Ok(liked)
    }

    async fn purge_user_content(&self, user_id: UserId) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        for statement in [
            "DELETE FROM review_likes WHERE user_id = $1",
            "DELETE FROM reviews WHERE author_id = $1",
            "DELETE FROM recipes WHERE author_id = $1",
        ] {
            sqlx::query(statement)
                .bind(user_id.0)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("soup", "%soup%")]
    #[case("50%", "%50\\%%")]
    #[case("a_b", "%a\\_b%")]
    #[case("back\\slash", "%back\\\\slash%")]
    fn keywords_are_matched_literally(#[case] keyword: &str, #[case] pattern: &str) {
        assert_eq!(like_pattern(keyword), pattern);
    }

    #[test]
    fn every_sort_breaks_ties_by_id() {
        for sort in [RecipeSort::Newest, RecipeSort::TopRated, RecipeSort::LeastCalories] {
            assert!(order_by(sort).ends_with("r.id ASC"), "{:?}", sort);
        }
    }

    #[test]
    fn filters_compose_with_and() {
        let filter = RecipeFilter {
            authors: Some(BTreeSet::from([UserId(1), UserId(2)])),
            keyword: Some("soup".to_string()),
            category: Some("Main".to_string()),
            min_rating: Some(3.5),
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM rated r");
        push_filter(&mut qb, &filter);
        let sql = qb.sql();

        assert!(sql.contains("r.author_id = ANY($1)"));
        assert!(sql.contains("LOWER(r.name) LIKE $2 OR LOWER(r.description) LIKE $3"));
        assert!(sql.contains("r.category = $4"));
        assert!(sql.contains("r.avg_rating >= $5"));
    }
}
