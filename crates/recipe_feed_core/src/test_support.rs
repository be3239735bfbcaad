//! Shared fixtures for the engine tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use crate::domain::{Gender, NewRecipe, NewUser, RecipeId, UserId};
use crate::memory::InMemoryStore;
use crate::times::RecipeTimes;
use crate::{CoreSettings, RecipeCore};

pub(crate) struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub core: RecipeCore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(CoreSettings::default())
    }

    pub fn with_settings(settings: CoreSettings) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let core = RecipeCore::new(store.clone(), store.clone(), settings);
        Self { store, core }
    }
}

/// Noon on 2024-03-01 shifted by `offset` days.
pub(crate) fn day(offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::days(offset)
}

pub(crate) async fn register(app: &TestApp, name: &str) -> UserId {
    app.core
        .actions
        .register(NewUser {
            name: name.to_string(),
            gender: Gender::Unknown,
            age: 30,
            credential: "hashed".to_string(),
        })
        .await
        .unwrap()
        .id
}

pub(crate) async fn publish(
    app: &TestApp,
    author: UserId,
    name: &str,
    ingredients: &[&str],
    published_at: DateTime<Utc>,
) -> RecipeId {
    publish_in(app, author, name, "Main", ingredients, published_at).await
}

pub(crate) async fn publish_in(
    app: &TestApp,
    author: UserId,
    name: &str,
    category: &str,
    ingredients: &[&str],
    published_at: DateTime<Utc>,
) -> RecipeId {
    app.core
        .actions
        .publish_recipe(
            author,
            NewRecipe {
                name: name.to_string(),
                category: category.to_string(),
                description: String::new(),
                ingredients: ingredients.iter().map(|i| i.to_string()).collect(),
                calories: None,
                times: RecipeTimes::default(),
                published_at: Some(published_at),
            },
        )
        .await
        .unwrap()
        .id
}
