//! # Shop
//!
//! Demo application composing four slices on one store:
//!
//! - [`cake`]: cake inventory with order/restock operations
//! - [`icecream`]: ice cream inventory, reacting to cake orders
//! - [`user`]: async user-directory fetch through the request lifecycle
//! - [`profile`]: nested owner profile updated immutably
//!
//! The binary wires these together with logging and effect middleware and
//! replays a day at the shop; the library exposes the slices and action
//! creators so tests can build their own stores.

pub mod cake;
pub mod icecream;
pub mod profile;
pub mod user;

use uniflow_runtime::{EffectMiddleware, LoggingMiddleware, Store};

pub use cake::{cake_slice, order_cake, restock_cake, CakeState};
pub use icecream::{ice_cream_slice, order_ice_cream, restock_ice_cream, IceCreamState};
pub use profile::{profile_slice, update_street, ProfileState};
pub use user::{fetch_users, user_slice, HttpUserDirectory, User, UserDirectory, UserState};

/// The full shop store: all four slices, logging outermost, effects
/// innermost.
///
/// # Errors
///
/// Returns the composition error if the slices fail validation; with the
/// slices defined in this crate that cannot happen.
pub fn shop_store() -> Result<Store, uniflow_core::CompositionError> {
    Store::builder()
        .slice(cake_slice())
        .slice(ice_cream_slice())
        .slice(user_slice())
        .slice(profile_slice())
        .middleware(LoggingMiddleware)
        .middleware(EffectMiddleware)
        .build()
}
