//! User directory slice: async fetch with loading and error tracking.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use uniflow_core::{AsyncLifecycle, EffectAction, Slice, SliceBuilder};

/// One entry in the remote user directory.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Directory identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// Fetch progress and result for the user directory.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserState {
    /// True between the request going out and its resolution.
    pub loading: bool,
    /// The last successfully fetched directory. Cleared on failure.
    pub users: Vec<User>,
    /// The last failure message. Cleared on request and on success.
    pub error: Option<String>,
}

/// Directory lookup failure.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DirectoryError(pub String);

/// Source of user records, abstracted so tests can swap in fixtures.
pub trait UserDirectory: Send + Sync {
    /// Fetch every user in the directory.
    fn fetch_users(&self) -> BoxFuture<'static, Result<Vec<User>, DirectoryError>>;
}

/// Directory backed by an HTTP API serving `GET {base}/users` as JSON.
#[derive(Debug, Clone)]
pub struct HttpUserDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUserDirectory {
    /// Point the directory at an API base URL (no trailing slash).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl UserDirectory for HttpUserDirectory {
    fn fetch_users(&self) -> BoxFuture<'static, Result<Vec<User>, DirectoryError>> {
        let client = self.client.clone();
        let url = format!("{}/users", self.base_url);
        Box::pin(async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| DirectoryError(e.to_string()))?;
            let response = response
                .error_for_status()
                .map_err(|e| DirectoryError(e.to_string()))?;
            response
                .json::<Vec<User>>()
                .await
                .map_err(|e| DirectoryError(e.to_string()))
        })
    }
}

/// The lifecycle shared by the slice handlers and the fetch effect.
#[must_use]
pub fn fetch_users_lifecycle() -> AsyncLifecycle {
    AsyncLifecycle::new("user/fetchUsers")
}

/// The user slice with all three fetch legs.
#[must_use]
pub fn user_slice() -> Slice {
    let lifecycle = fetch_users_lifecycle();
    SliceBuilder::new("user", UserState::default())
        // A new request clears the error but keeps the last good
        // directory on screen until the resolution lands.
        .on_pending(&lifecycle, |state: &UserState| UserState {
            loading: true,
            users: state.users.clone(),
            error: None,
        })
        .on_fulfilled(&lifecycle, |_state: &UserState, users: Vec<User>| {
            UserState {
                loading: false,
                users,
                error: None,
            }
        })
        .on_rejected(&lifecycle, |_state: &UserState, message| UserState {
            loading: false,
            users: Vec::new(),
            error: Some(message.to_owned()),
        })
        .build()
}

/// The effect action that drives one fetch through the lifecycle.
#[must_use]
pub fn fetch_users(directory: Arc<dyn UserDirectory>) -> EffectAction {
    fetch_users_lifecycle().run(directory.fetch_users())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use serde_json::json;
    use uniflow_core::{Action, ActionKind};
    use uniflow_testing::StoreTest;

    #[test]
    fn slice_owns_the_lifecycle_kinds() {
        let slice = user_slice();
        let kinds: Vec<_> = slice.operation_kinds().map(ActionKind::as_str).collect();
        assert_eq!(
            kinds,
            vec![
                "user/fetchUsers/pending",
                "user/fetchUsers/fulfilled",
                "user/fetchUsers/rejected"
            ]
        );
    }

    #[test]
    fn initial_state_is_idle_and_empty() {
        let state = UserState::default();
        assert!(!state.loading);
        assert!(state.users.is_empty());
        assert_eq!(state.error, None);
    }

    #[test]
    fn a_new_request_keeps_the_previous_directory() {
        let lifecycle = fetch_users_lifecycle();
        StoreTest::new()
            .given_slice(user_slice())
            .when(
                Action::new(lifecycle.fulfilled())
                    .with_payload(json!([{ "id": 1, "name": "Leanne Graham" }])),
            )
            .when(Action::new(lifecycle.pending()))
            .then(|snapshot| {
                let state = snapshot.slice::<UserState>("user").expect("user slice");
                assert!(state.loading);
                assert_eq!(state.users.len(), 1);
                assert_eq!(state.error, None);
            })
            .run();
    }

    #[test]
    fn a_new_request_clears_a_previous_error() {
        let lifecycle = fetch_users_lifecycle();
        StoreTest::new()
            .given_slice(user_slice())
            .when(Action::new(lifecycle.rejected()).with_error("Network Error"))
            .when(Action::new(lifecycle.pending()))
            .then(|snapshot| {
                let state = snapshot.slice::<UserState>("user").expect("user slice");
                assert!(state.loading);
                assert_eq!(state.error, None);
            })
            .run();
    }
}
