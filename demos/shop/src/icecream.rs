//! Ice cream inventory slice.
//!
//! Besides its own operations, this slice reacts to cake orders: every
//! cake order melts one ice cream off the shelf (a promotion, not a bug).
//! The reaction depends on the cake slice one-way; the cake slice knows
//! nothing about ice cream.

use serde::{Deserialize, Serialize};
use uniflow_core::{Action, Slice, SliceBuilder, Value};

use crate::cake::ORDER_CAKE;

/// Kind dispatched when a customer orders ice creams.
pub const ORDER_ICE_CREAM: &str = "iceCream/orderIceCream";

/// Kind dispatched when the shop restocks ice creams.
pub const RESTOCK_ICE_CREAM: &str = "iceCream/restockIceCream";

/// Ice creams in the freezer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceCreamState {
    /// Current freezer count.
    pub num_of_ice_creams: i64,
}

impl Default for IceCreamState {
    fn default() -> Self {
        Self {
            num_of_ice_creams: 20,
        }
    }
}

/// The ice cream slice, including the reaction to cake orders.
#[must_use]
pub fn ice_cream_slice() -> Slice {
    SliceBuilder::new("iceCream", IceCreamState::default())
        .operation("orderIceCream", |state: &IceCreamState, qty: Option<i64>| {
            IceCreamState {
                num_of_ice_creams: state.num_of_ice_creams - qty.unwrap_or(1),
            }
        })
        .operation(
            "restockIceCream",
            |state: &IceCreamState, qty: Option<i64>| IceCreamState {
                num_of_ice_creams: state.num_of_ice_creams + qty.unwrap_or(1),
            },
        )
        // One free ice cream melts per cake order, regardless of how many
        // cakes the order was for.
        .reaction(ORDER_CAKE, |state: &IceCreamState, _action| IceCreamState {
            num_of_ice_creams: state.num_of_ice_creams - 1,
        })
        .build()
}

/// Order `qty` ice creams, or one when `None`.
#[must_use]
pub fn order_ice_cream(qty: Option<i64>) -> Action {
    match qty {
        Some(qty) => Action::new(ORDER_ICE_CREAM).with_payload(Value::from(qty)),
        None => Action::new(ORDER_ICE_CREAM),
    }
}

/// Restock `qty` ice creams, or one when `None`.
#[must_use]
pub fn restock_ice_cream(qty: Option<i64>) -> Action {
    match qty {
        Some(qty) => Action::new(RESTOCK_ICE_CREAM).with_payload(Value::from(qty)),
        None => Action::new(RESTOCK_ICE_CREAM),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use crate::cake::{cake_slice, order_cake, CakeState};
    use uniflow_testing::StoreTest;

    #[test]
    fn its_own_operations_work() {
        // The reaction names the cake slice, so composition needs it too.
        StoreTest::new()
            .given_slice(cake_slice())
            .given_slice(ice_cream_slice())
            .when(order_ice_cream(Some(3)))
            .when(restock_ice_cream(None))
            .then(|snapshot| {
                let state = snapshot
                    .slice::<IceCreamState>("iceCream")
                    .expect("iceCream slice");
                assert_eq!(state.num_of_ice_creams, 18);
            })
            .run();
    }

    #[test]
    fn cake_orders_melt_one_ice_cream() {
        StoreTest::new()
            .given_slice(cake_slice())
            .given_slice(ice_cream_slice())
            .when(order_cake(Some(5)))
            .then(|snapshot| {
                let cakes = snapshot.slice::<CakeState>("cake").expect("cake slice");
                assert_eq!(cakes.num_of_cakes, 5);
                let ice = snapshot
                    .slice::<IceCreamState>("iceCream")
                    .expect("iceCream slice");
                // One per order, not one per cake.
                assert_eq!(ice.num_of_ice_creams, 19);
            })
            .run();
    }

    #[test]
    fn ice_cream_orders_leave_cakes_alone() {
        StoreTest::new()
            .given_slice(cake_slice())
            .given_slice(ice_cream_slice())
            .when(order_ice_cream(None))
            .then(|snapshot| {
                let cakes = snapshot.slice::<CakeState>("cake").expect("cake slice");
                assert_eq!(cakes.num_of_cakes, 10);
            })
            .run();
    }
}
