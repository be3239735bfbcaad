//! crates/recipe_feed_core/src/domain.rs
//!
//! Defines the pure, core data structures for the recipe service.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::times::RecipeTimes;

/// Lowest rating a review may carry.
pub const MIN_RATING: u8 = 1;
/// Highest rating a review may carry.
pub const MAX_RATING: u8 = 5;

//=========================================================================================
// Identifiers
//=========================================================================================

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

store_id!(
    /// Identifier assigned to a user by the store at registration.
    UserId
);
store_id!(
    /// Identifier assigned to a recipe when it is published.
    RecipeId
);
store_id!(
    /// Identifier assigned to a review when it is submitted.
    ReviewId
);

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

impl FromStr for Gender {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "unknown" | "" => Ok(Gender::Unknown),
            other => Err(CoreError::InvalidInput(format!("unknown gender '{other}'"))),
        }
    }
}

/// A registered account. The credential never leaves the store, so it is not
/// part of this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub gender: Gender,
    pub age: u32,
    /// Set once the account has been deleted under the anonymizing policy.
    pub deleted: bool,
}

// Only used for registration - carries the already hashed credential.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub gender: Gender,
    pub age: u32,
    pub credential: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub gender: Option<Gender>,
    pub age: Option<u32>,
}

/// Follower and following counts for a single user, derived from the edge set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowCounts {
    pub user_id: UserId,
    pub followers: u64,
    pub following: u64,
}

//=========================================================================================
// Recipes and Reviews
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub calories: Option<f64>,
    pub times: RecipeTimes,
    pub published_at: DateTime<Utc>,
}

impl Recipe {
    /// The number of entries in the ingredient list.
    pub fn complexity(&self) -> usize {
        self.ingredients.len()
    }
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub category: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub calories: Option<f64>,
    pub times: RecipeTimes,
    pub published_at: Option<DateTime<Utc>>,
}

/// The projection of a recipe used by the complexity leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeComplexity {
    pub recipe_id: RecipeId,
    pub name: String,
    pub ingredient_count: u64,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: ReviewId,
    pub recipe_id: RecipeId,
    pub author_id: UserId,
    pub rating: u8,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
    pub likers: BTreeSet<UserId>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub recipe_id: RecipeId,
    pub author_id: UserId,
    pub rating: u8,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
}

//=========================================================================================
// Queries
//=========================================================================================

/// Filters applied by the catalog when listing recipes. All present filters
/// must hold for a recipe to be included.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Restrict to recipes written by one of these authors.
    pub authors: Option<BTreeSet<UserId>>,
    /// Lower-cased keyword matched against name and description.
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
}

impl RecipeFilter {
    /// Evaluates the filter against a recipe and its current average rating.
    pub fn matches(&self, recipe: &Recipe, average_rating: Option<f64>) -> bool {
        if let Some(authors) = &self.authors {
            if !authors.contains(&recipe.author_id) {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            let in_name = recipe.name.to_lowercase().contains(keyword.as_str());
            if !in_name && !recipe.description.to_lowercase().contains(keyword.as_str()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &recipe.category != category {
                return false;
            }
        }
        match (self.min_rating, average_rating) {
            (Some(min), Some(avg)) => avg >= min,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

/// The fixed set of orderings a recipe listing accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecipeSort {
    /// Most recently published first, ties by id ascending.
    #[default]
    Newest,
    /// Highest average rating first, unrated last.
    TopRated,
    /// Fewest calories first, unknown calories last.
    LeastCalories,
}

impl RecipeSort {
    pub fn as_str(self) -> &'static str {
        match self {
            RecipeSort::Newest => "date_desc",
            RecipeSort::TopRated => "rating_desc",
            RecipeSort::LeastCalories => "calories_asc",
        }
    }

    /// Total order between two recipes given their average ratings.
    pub fn compare(
        self,
        a: &Recipe,
        a_rating: Option<f64>,
        b: &Recipe,
        b_rating: Option<f64>,
    ) -> Ordering {
        let newest = || {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.id.cmp(&b.id))
        };
        match self {
            RecipeSort::Newest => newest(),
            RecipeSort::TopRated => descending_nulls_last(a_rating, b_rating).then_with(newest),
            RecipeSort::LeastCalories => match (a.calories, b.calories) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.id.cmp(&b.id)),
        }
    }
}

fn descending_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl FromStr for RecipeSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_desc" => Ok(RecipeSort::Newest),
            "rating_desc" => Ok(RecipeSort::TopRated),
            "calories_asc" => Ok(RecipeSort::LeastCalories),
            other => Err(CoreError::InvalidInput(format!("unknown recipe sort '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    #[default]
    Newest,
    MostLiked,
}

impl FromStr for ReviewSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_desc" => Ok(ReviewSort::Newest),
            "likes_desc" => Ok(ReviewSort::MostLiked),
            other => Err(CoreError::InvalidInput(format!("unknown review sort '{other}'"))),
        }
    }
}

//=========================================================================================
// Pagination
//=========================================================================================

/// A validated, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Validates raw page parameters as received from a caller. Sizes above
    /// `max_size` are clamped to it.
    pub fn new(page: i64, size: i64, max_size: u32) -> Result<Self, CoreError> {
        if page < 1 {
            return Err(CoreError::InvalidInput(format!("page must be >= 1, got {page}")));
        }
        if size < 1 {
            return Err(CoreError::InvalidInput(format!(
                "page size must be positive, got {size}"
            )));
        }
        let page = u32::try_from(page)
            .map_err(|_| CoreError::InvalidInput(format!("page {page} is out of range")))?;
        let size = u32::try_from(size).map_or(max_size, |size| size.min(max_size));
        Ok(Self { page, size })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// One page of an ordered listing. `total` counts the whole candidate set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: request.page,
            size: request.size,
        }
    }

    /// Slices an already ordered, complete candidate list.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.size as usize)
            .collect();
        Self {
            items,
            total,
            page: request.page,
            size: request.size,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

//=========================================================================================
// Policies
//=========================================================================================

/// Whether a user may review the same recipe more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewPolicy {
    #[default]
    AllowMultiple,
    OnePerRecipe,
}

impl FromStr for ReviewPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow_multiple" => Ok(ReviewPolicy::AllowMultiple),
            "one_per_recipe" => Ok(ReviewPolicy::OnePerRecipe),
            other => Err(CoreError::InvalidInput(format!("unknown review policy '{other}'"))),
        }
    }
}

/// What happens to authored content when an account is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionPolicy {
    /// Deactivate the account; recipes and reviews stay without an author name.
    #[default]
    Anonymize,
    /// Remove the account together with its recipes, reviews and likes.
    HardDelete,
}

impl FromStr for DeletionPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anonymize" => Ok(DeletionPolicy::Anonymize),
            "hard_delete" => Ok(DeletionPolicy::HardDelete),
            other => Err(CoreError::InvalidInput(format!("unknown deletion policy '{other}'"))),
        }
    }
}
