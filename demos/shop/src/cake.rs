//! Cake inventory slice.

use serde::{Deserialize, Serialize};
use uniflow_core::{Action, Slice, SliceBuilder, Value};

/// Kind dispatched when a customer orders cakes.
pub const ORDER_CAKE: &str = "cake/orderCake";

/// Kind dispatched when the shop restocks cakes.
pub const RESTOCK_CAKE: &str = "cake/restockCake";

/// Cakes on the shelf.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CakeState {
    /// Current shelf count. Orders beyond stock go negative; the shop
    /// tracks its backlog rather than refusing the sale.
    pub num_of_cakes: i64,
}

impl Default for CakeState {
    fn default() -> Self {
        Self { num_of_cakes: 10 }
    }
}

/// The cake slice: ordering decrements, restocking increments, both with
/// an optional quantity defaulting to one.
#[must_use]
pub fn cake_slice() -> Slice {
    SliceBuilder::new("cake", CakeState::default())
        .operation("orderCake", |state: &CakeState, qty: Option<i64>| {
            CakeState {
                num_of_cakes: state.num_of_cakes - qty.unwrap_or(1),
            }
        })
        .operation("restockCake", |state: &CakeState, qty: Option<i64>| {
            CakeState {
                num_of_cakes: state.num_of_cakes + qty.unwrap_or(1),
            }
        })
        .build()
}

/// Order `qty` cakes, or one when `None`.
#[must_use]
pub fn order_cake(qty: Option<i64>) -> Action {
    match qty {
        Some(qty) => Action::new(ORDER_CAKE).with_payload(Value::from(qty)),
        None => Action::new(ORDER_CAKE),
    }
}

/// Restock `qty` cakes, or one when `None`.
#[must_use]
pub fn restock_cake(qty: Option<i64>) -> Action {
    match qty {
        Some(qty) => Action::new(RESTOCK_CAKE).with_payload(Value::from(qty)),
        None => Action::new(RESTOCK_CAKE),
    }
}
