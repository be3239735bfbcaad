//! crates/recipe_feed_core/src/ranking.rs
//!
//! The two global leaderboards. Both are recomputed from a full scan on every
//! call; nothing is maintained incrementally.

use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{FollowCounts, RecipeComplexity, UserId};
use crate::error::CoreResult;
use crate::ports::{CatalogStore, GraphStore};

/// How many recipes the complexity leaderboard returns.
pub const MOST_COMPLEX_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct FollowerRatio {
    pub user_id: UserId,
    pub name: String,
    pub followers: u64,
    pub following: u64,
    pub ratio: f64,
}

#[derive(Clone)]
pub struct RankingEngine {
    graph: Arc<dyn GraphStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl RankingEngine {
    pub fn new(graph: Arc<dyn GraphStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { graph, catalog }
    }

    /// The user with the largest `followers / following`, ties going to the
    /// lowest id. Users following nobody have no ratio and are skipped.
    pub async fn highest_follower_ratio(&self) -> CoreResult<Option<FollowerRatio>> {
        let counts = self.graph.follow_counts().await?;
        let Some(best) = best_ratio(&counts) else {
            return Ok(None);
        };

        let user = self.catalog.get_user(best.user_id).await?;
        debug!(
            user_id = %best.user_id,
            followers = best.followers,
            following = best.following,
            "highest follower ratio"
        );
        Ok(Some(FollowerRatio {
            user_id: best.user_id,
            name: user.name,
            followers: best.followers,
            following: best.following,
            ratio: best.followers as f64 / best.following as f64,
        }))
    }

    /// The three recipes with the longest ingredient lists. Ties go to the
    /// earlier published recipe, then to the lower id.
    pub async fn most_complex_recipes(&self) -> CoreResult<Vec<RecipeComplexity>> {
        let mut recipes = self.catalog.recipe_complexities().await?;
        recipes.sort_by(|a, b| {
            b.ingredient_count
                .cmp(&a.ingredient_count)
                .then_with(|| a.published_at.cmp(&b.published_at))
                .then_with(|| a.recipe_id.cmp(&b.recipe_id))
        });
        recipes.truncate(MOST_COMPLEX_LIMIT);
        Ok(recipes)
    }
}

/// Compares `a.followers / a.following` with `b.followers / b.following`
/// exactly, by cross-multiplication. Both `following` values must be non-zero.
fn compare_ratio(a: &FollowCounts, b: &FollowCounts) -> Ordering {
    let lhs = u128::from(a.followers) * u128::from(b.following);
    let rhs = u128::from(b.followers) * u128::from(a.following);
    lhs.cmp(&rhs)
}

fn best_ratio(counts: &[FollowCounts]) -> Option<FollowCounts> {
    counts
        .iter()
        .filter(|c| c.following > 0)
        .min_by(|a, b| {
            compare_ratio(b, a).then_with(|| a.user_id.cmp(&b.user_id))
        })
        .copied()
}
