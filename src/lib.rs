//! Oxygen Not Included element reference
//!
//! Loads the game's element definitions into an [`Elements`] collection and
//! queries it with unit-aware predicates:
//!
//! ```
//! use oniref::query::{is_liquid, stable_over};
//! use oniref::units::Quantity;
//!
//! let elements = oniref::loader::load_sample().unwrap();
//! let lo = Quantity::new(30.0, "°C").unwrap();
//! let hi = Quantity::new(90.0, "°C").unwrap();
//! let found = elements.find(&(is_liquid() & stable_over(&lo, &hi))).unwrap();
//! assert_eq!(found[0].name, "Water");
//! ```

pub mod element;
pub mod elements;
pub mod error;
pub mod loader;
pub mod query;
pub mod report;
pub mod strings;
pub mod units;

pub use element::{Element, ElementDef, ElementId, RawFields, State, Transition, Unresolved};
pub use elements::{Elements, Key, Needle};
pub use error::{FieldError, LoadError, LookupError, QuantityError, QueryError, ResolveError};
pub use query::{Attribute, ElementAttr, Literal, Predicate, Value};
pub use strings::StringTable;
pub use units::{Dimension, Quantity, Unit};
