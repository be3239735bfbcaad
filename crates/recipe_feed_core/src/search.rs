//! crates/recipe_feed_core/src/search.rs
//!
//! Keyword / category search over the whole catalog.

use std::sync::Arc;
use tracing::debug;

use crate::aggregation::{Aggregator, RecipeCard};
use crate::domain::{Page, PageRequest, RecipeFilter, RecipeSort, MAX_RATING, MIN_RATING};
use crate::error::{CoreError, CoreResult};
use crate::ports::CatalogStore;

/// Raw search parameters as received from a caller. Blank strings count as
/// absent.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
    /// One of `date_desc`, `rating_desc`, `calories_asc`. Defaults to `date_desc`.
    pub sort: Option<String>,
}

impl SearchQuery {
    fn into_filter(self) -> CoreResult<(RecipeFilter, RecipeSort)> {
        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => RecipeSort::default(),
            Some(key) => key.parse()?,
        };
        if let Some(min) = self.min_rating {
            if !(f64::from(MIN_RATING)..=f64::from(MAX_RATING)).contains(&min) {
                return Err(CoreError::InvalidInput(format!(
                    "min_rating must be between {MIN_RATING} and {MAX_RATING}"
                )));
            }
        }
        let filter = RecipeFilter {
            authors: None,
            keyword: non_blank(self.keyword).map(|k| k.to_lowercase()),
            category: non_blank(self.category),
            min_rating: self.min_rating,
        };
        Ok((filter, sort))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct SearchEngine {
    catalog: Arc<dyn CatalogStore>,
    aggregator: Aggregator,
    max_page_size: u32,
}

impl SearchEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>, max_page_size: u32) -> Self {
        let aggregator = Aggregator::new(catalog.clone());
        Self {
            catalog,
            aggregator,
            max_page_size,
        }
    }

    pub async fn search(
        &self,
        query: SearchQuery,
        page: i64,
        size: i64,
    ) -> CoreResult<Page<RecipeCard>> {
        let request = PageRequest::new(page, size, self.max_page_size)?;
        let (filter, sort) = query.into_filter()?;

        let (recipes, total) = self
            .catalog
            .query_recipes(&filter, sort, request.offset(), request.limit())
            .await?;
        let items = self.aggregator.cards(recipes).await?;

        debug!(
            keyword = filter.keyword.as_deref(),
            category = filter.category.as_deref(),
            sort = sort.as_str(),
            total,
            "search executed"
        );
        Ok(Page {
            items,
            total,
            page: request.page,
            size: request.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewRecipe;
    use crate::times::RecipeTimes;
    use crate::test_support::{day, publish, publish_in, register, TestApp};
    use rstest::rstest;

    fn query(keyword: Option<&str>, category: Option<&str>) -> SearchQuery {
        SearchQuery {
            keyword: keyword.map(str::to_string),
            category: category.map(str::to_string),
            ..SearchQuery::default()
        }
    }

    fn names(page: &Page<RecipeCard>) -> Vec<&str> {
        page.items.iter().map(|c| c.recipe.name.as_str()).collect()
    }

    async fn seeded() -> TestApp {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        publish_in(&app, chef, "Tomato Soup", "Soup", &["tomato"], day(0)).await;
        publish_in(&app, chef, "Chicken Stew", "Stew", &["chicken"], day(1)).await;
        publish_in(&app, chef, "Green Soup", "Soup", &["kale"], day(2)).await;
        app
    }

    #[rstest]
    #[case::no_filters(None, None, vec!["Green Soup", "Chicken Stew", "Tomato Soup"])]
    #[case::keyword_is_case_insensitive(Some("SOUP"), None, vec!["Green Soup", "Tomato Soup"])]
    #[case::category_only(None, Some("Stew"), vec!["Chicken Stew"])]
    #[case::filters_combine(Some("tomato"), Some("Soup"), vec!["Tomato Soup"])]
    #[case::filters_exclude(Some("tomato"), Some("Stew"), vec![])]
    #[case::blank_keyword_matches_all(Some("   "), None, vec!["Green Soup", "Chicken Stew", "Tomato Soup"])]
    #[tokio::test]
    async fn filters_select_matching_recipes(
        #[case] keyword: Option<&str>,
        #[case] category: Option<&str>,
        #[case] expected: Vec<&str>,
    ) {
        let app = seeded().await;

        let page = app
            .core
            .search
            .search(query(keyword, category), 1, 10)
            .await
            .unwrap();

        assert_eq!(names(&page), expected);
        assert_eq!(page.total, expected.len() as u64);
    }

    #[tokio::test]
    async fn keyword_also_matches_the_description() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        app.core
            .actions
            .publish_recipe(
                chef,
                NewRecipe {
                    name: "Nonna's Sunday Pot".to_string(),
                    category: "Stew".to_string(),
                    description: "A slow RAGU for cold days".to_string(),
                    ingredients: vec!["beef".to_string()],
                    calories: None,
                    times: RecipeTimes::default(),
                    published_at: Some(day(0)),
                },
            )
            .await
            .unwrap();

        let page = app.core.search.search(query(Some("ragu"), None), 1, 10).await.unwrap();

        assert_eq!(names(&page), vec!["Nonna's Sunday Pot"]);
    }

    #[tokio::test]
    async fn category_match_is_exact() {
        let app = seeded().await;
        let page = app.core.search.search(query(None, Some("soup")), 1, 10).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn unknown_sort_key_fails_the_request() {
        let app = seeded().await;
        let request = SearchQuery {
            sort: Some("popularity".to_string()),
            ..SearchQuery::default()
        };

        let err = app.core.search.search(request, 1, 10).await.unwrap_err();

        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rating_sort_puts_unrated_recipes_last() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let critic = register(&app, "critic").await;
        let plain = publish(&app, chef, "Plain", &["a"], day(0)).await;
        let great = publish(&app, chef, "Great", &["a"], day(1)).await;
        publish(&app, chef, "Unrated", &["a"], day(2)).await;
        app.core.actions.submit_review(critic, plain, 2, "meh").await.unwrap();
        app.core.actions.submit_review(critic, great, 5, "wow").await.unwrap();

        let request = SearchQuery {
            sort: Some("rating_desc".to_string()),
            ..SearchQuery::default()
        };
        let page = app.core.search.search(request, 1, 10).await.unwrap();

        assert_eq!(names(&page), vec!["Great", "Plain", "Unrated"]);
        assert_eq!(page.items[0].average_rating, Some(5.0));
        assert_eq!(page.items[2].average_rating, None);
    }

    #[tokio::test]
    async fn min_rating_drops_low_and_unrated_recipes() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let critic = register(&app, "critic").await;
        let plain = publish(&app, chef, "Plain", &["a"], day(0)).await;
        let great = publish(&app, chef, "Great", &["a"], day(1)).await;
        publish(&app, chef, "Unrated", &["a"], day(2)).await;
        app.core.actions.submit_review(critic, plain, 2, "meh").await.unwrap();
        app.core.actions.submit_review(critic, great, 4, "nice").await.unwrap();

        let request = SearchQuery {
            min_rating: Some(3.5),
            ..SearchQuery::default()
        };
        let page = app.core.search.search(request, 1, 10).await.unwrap();

        assert_eq!(names(&page), vec!["Great"]);
    }

    #[tokio::test]
    async fn min_rating_outside_the_scale_is_rejected() {
        let app = seeded().await;
        let request = SearchQuery {
            min_rating: Some(7.0),
            ..SearchQuery::default()
        };
        let err = app.core.search.search(request, 1, 10).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn calorie_sort_puts_unknown_calories_last() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        for (name, calories) in [("Rich", Some(900.0)), ("Unknown", None), ("Light", Some(120.0))] {
            app.core
                .actions
                .publish_recipe(
                    chef,
                    NewRecipe {
                        name: name.to_string(),
                        category: "Main".to_string(),
                        description: String::new(),
                        ingredients: vec!["x".to_string()],
                        calories,
                        times: RecipeTimes::default(),
                        published_at: Some(day(0)),
                    },
                )
                .await
                .unwrap();
        }

        let request = SearchQuery {
            sort: Some("calories_asc".to_string()),
            ..SearchQuery::default()
        };
        let page = app.core.search.search(request, 1, 10).await.unwrap();

        assert_eq!(names(&page), vec!["Light", "Rich", "Unknown"]);
    }

    #[tokio::test]
    async fn second_page_continues_the_first() {
        let app = seeded().await;

        let first = app.core.search.search(SearchQuery::default(), 1, 2).await.unwrap();
        let second = app.core.search.search(SearchQuery::default(), 2, 2).await.unwrap();

        assert_eq!(names(&first), vec!["Green Soup", "Chicken Stew"]);
        assert_eq!(names(&second), vec!["Tomato Soup"]);
        assert_eq!(second.total, 3);
    }
}
