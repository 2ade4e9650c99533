//! Shop owner profile slice: nested state updated immutably.

use serde::{Deserialize, Serialize};
use uniflow_core::{Action, Slice, SliceBuilder, Value};

/// Kind dispatched to change the street line of the address.
pub const UPDATE_STREET: &str = "profile/updateStreet";

/// Postal address nested inside the profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
}

/// The shop owner's profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileState {
    /// Owner's display name.
    pub name: String,
    /// Owner's address; only the street is updatable for now.
    pub address: Address,
}

impl Default for ProfileState {
    fn default() -> Self {
        Self {
            name: "Vishwas".to_owned(),
            address: Address {
                street: "123 Main St".to_owned(),
                city: "Boston".to_owned(),
                state: "Massachusetts".to_owned(),
            },
        }
    }
}

/// The profile slice. The street update rebuilds the nested address while
/// leaving every sibling field untouched.
#[must_use]
pub fn profile_slice() -> Slice {
    SliceBuilder::new("profile", ProfileState::default())
        .operation("updateStreet", |state: &ProfileState, street: Option<String>| {
            match street {
                Some(street) => ProfileState {
                    address: Address {
                        street,
                        ..state.address.clone()
                    },
                    ..state.clone()
                },
                None => state.clone(),
            }
        })
        .build()
}

/// Change the street line of the owner's address.
#[must_use]
pub fn update_street(street: impl Into<String>) -> Action {
    Action::new(UPDATE_STREET).with_payload(Value::from(street.into()))
}
