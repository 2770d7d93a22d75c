//! Ready-made attributes and predicates

use crate::element::State;
use crate::units::Quantity;

use super::{Attribute, ElementAttr, Literal, Predicate};

pub fn is_state(state: State) -> Predicate {
    ElementAttr::state().is_eq(state)
}

pub fn is_solid() -> Predicate {
    is_state(State::Solid)
}

pub fn is_liquid() -> Predicate {
    is_state(State::Liquid)
}

pub fn is_gas() -> Predicate {
    is_state(State::Gas)
}

/// `attr` with every hop appended after it optional.
pub fn optional(attr: &Attribute) -> Attribute {
    attr.optional()
}

/// Temperature of the low transition, or `None` if there is none.
pub fn low_temp() -> Attribute {
    optional(&ElementAttr::low_transition()).field("temperature")
}

/// Temperature of the high transition, or `None` if there is none.
pub fn high_temp() -> Attribute {
    optional(&ElementAttr::high_transition()).field("temperature")
}

/// True when an element at `temp` crosses neither of its transitions.
pub fn stable_at(temp: &Quantity) -> Predicate {
    let above_low = ElementAttr::low_transition().is(Literal::None) | low_temp().is_lt(temp);
    let below_high = ElementAttr::high_transition().is(Literal::None) | high_temp().is_gt(temp);
    above_low & below_high
}

pub fn stable_over(low: &Quantity, high: &Quantity) -> Predicate {
    stable_at(low) & stable_at(high)
}
