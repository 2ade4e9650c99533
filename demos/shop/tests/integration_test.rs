//! End-to-end tests for the shop: cross-slice reactions and the full
//! async fetch lifecycle against mock directories.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use shop::user::{fetch_users, DirectoryError, User, UserDirectory, UserState};
use shop::{
    order_cake, order_ice_cream, restock_cake, shop_store, update_street, CakeState,
    IceCreamState, ProfileState,
};
use uniflow_runtime::Store;

struct StaticDirectory {
    users: Vec<User>,
}

impl UserDirectory for StaticDirectory {
    fn fetch_users(&self) -> BoxFuture<'static, Result<Vec<User>, DirectoryError>> {
        let users = self.users.clone();
        Box::pin(async move { Ok(users) })
    }
}

struct FailingDirectory;

impl UserDirectory for FailingDirectory {
    fn fetch_users(&self) -> BoxFuture<'static, Result<Vec<User>, DirectoryError>> {
        Box::pin(async { Err(DirectoryError("Network Error".to_owned())) })
    }
}

fn store() -> Store {
    shop_store().expect("shop composition is valid")
}

fn user_state(store: &Store) -> UserState {
    store
        .snapshot()
        .slice::<UserState>("user")
        .expect("user slice")
        .clone()
}

async fn wait_until(store: &Store, done: impl Fn(&UserState) -> bool) -> UserState {
    for _ in 0..200 {
        let state = user_state(store);
        if done(&state) {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    user_state(store)
}

#[test]
fn a_cake_order_also_melts_an_ice_cream() {
    let store = store();

    store.dispatch(order_cake(None)).expect("dispatch");

    let snapshot = store.snapshot();
    let cakes = snapshot.slice::<CakeState>("cake").expect("cake slice");
    assert_eq!(cakes.num_of_cakes, 9);
    let ice = snapshot
        .slice::<IceCreamState>("iceCream")
        .expect("iceCream slice");
    assert_eq!(ice.num_of_ice_creams, 19);
}

#[test]
fn a_busy_day_balances_the_books() {
    let store = store();

    store.dispatch(order_cake(Some(3))).expect("dispatch");
    store.dispatch(order_cake(None)).expect("dispatch");
    store.dispatch(order_ice_cream(Some(2))).expect("dispatch");
    store.dispatch(restock_cake(Some(5))).expect("dispatch");
    store.dispatch(update_street("456 Elm St")).expect("dispatch");

    let snapshot = store.snapshot();
    let cakes = snapshot.slice::<CakeState>("cake").expect("cake slice");
    assert_eq!(cakes.num_of_cakes, 11);
    let ice = snapshot
        .slice::<IceCreamState>("iceCream")
        .expect("iceCream slice");
    // Two cake orders melt two, plus the explicit order of two.
    assert_eq!(ice.num_of_ice_creams, 16);
    let profile = snapshot
        .slice::<ProfileState>("profile")
        .expect("profile slice");
    assert_eq!(profile.address.street, "456 Elm St");
    assert_eq!(profile.address.city, "Boston");
}

#[test]
fn overselling_tracks_the_backlog_below_zero() {
    let store = store();

    store.dispatch(order_cake(Some(12))).expect("dispatch");

    let cakes = store
        .snapshot()
        .slice::<CakeState>("cake")
        .expect("cake slice")
        .clone();
    assert_eq!(cakes.num_of_cakes, -2);
}

#[tokio::test]
async fn fetch_goes_pending_before_it_resolves() {
    let store = store();
    let directory = Arc::new(StaticDirectory {
        users: vec![User {
            id: 1,
            name: "Leanne Graham".to_owned(),
        }],
    });

    store.dispatch(fetch_users(directory)).expect("dispatch");

    // The pending leg lands synchronously; the resolution needs the
    // spawned task, which has not run yet on this runtime.
    let state = user_state(&store);
    assert!(state.loading);
    assert!(state.users.is_empty());
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn successful_fetch_fills_the_directory() {
    let store = store();
    let directory = Arc::new(StaticDirectory {
        users: vec![
            User {
                id: 1,
                name: "Leanne Graham".to_owned(),
            },
            User {
                id: 2,
                name: "Ervin Howell".to_owned(),
            },
        ],
    });

    store.dispatch(fetch_users(directory)).expect("dispatch");

    let state = wait_until(&store, |state| !state.loading).await;
    assert_eq!(state.users.len(), 2);
    assert_eq!(state.users[0].name, "Leanne Graham");
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn failed_fetch_records_the_error_and_clears_users() {
    let store = store();

    // Seed a prior success so the failure visibly clears it.
    let seeded = Arc::new(StaticDirectory {
        users: vec![User {
            id: 1,
            name: "Leanne Graham".to_owned(),
        }],
    });
    store.dispatch(fetch_users(seeded)).expect("dispatch");
    let state = wait_until(&store, |state| !state.loading).await;
    assert_eq!(state.users.len(), 1);

    store
        .dispatch(fetch_users(Arc::new(FailingDirectory)))
        .expect("dispatch");

    let state = wait_until(&store, |state| !state.loading && state.error.is_some()).await;
    assert!(state.users.is_empty());
    assert_eq!(state.error.as_deref(), Some("Network Error"));
}

#[tokio::test]
async fn fetch_leaves_the_inventory_slices_alone() {
    let store = store();
    let directory = Arc::new(StaticDirectory { users: Vec::new() });

    store.dispatch(fetch_users(directory)).expect("dispatch");
    wait_until(&store, |state| !state.loading).await;

    let snapshot = store.snapshot();
    let cakes = snapshot.slice::<CakeState>("cake").expect("cake slice");
    assert_eq!(cakes.num_of_cakes, 10);
    let ice = snapshot
        .slice::<IceCreamState>("iceCream")
        .expect("iceCream slice");
    assert_eq!(ice.num_of_ice_creams, 20);
}
