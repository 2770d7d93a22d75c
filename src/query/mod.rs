//! Attribute paths and predicates over elements
//!
//! An [`Attribute`] is a path from an element to some value: a base (the
//! element itself, or a labelled closure) followed by field lookups and
//! method calls. Comparing an attribute with a [`Literal`] builds a
//! [`Predicate`], and predicates combine with `&`, `|` and `!`.
//!
//! ```text
//! ElementAttr::state().is_eq(State::Liquid)            state == State.Liquid
//! ElementAttr::molar_mass().to("ounce/mol").m()        molar_mass.to(ounce/mol).m
//! optional(&ElementAttr::low_transition())
//!     .field("temperature")                            low_transition.?temperature
//! ```
//!
//! Nothing is evaluated until [`Attribute::evaluate`] or
//! [`Predicate::evaluate`] is called with a collection and one of its
//! elements.
//!
//! A hop marked optional turns an absent value (`None`) into `None` for the
//! rest of the path; a required hop on an absent value fails with
//! [`QueryError::MissingValue`]. Unknown field names fail either way.

pub mod predicates;
mod value;

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

pub use predicates::{high_temp, is_gas, is_liquid, is_solid, low_temp, optional, stable_at, stable_over};
pub use value::{Literal, Value};

use crate::element::Element;
use crate::elements::Elements;
use crate::error::QueryError;

/// Signature of a custom attribute base.
pub type AttributeFn = dyn for<'a> Fn(&'a Elements, &'a Element) -> Result<Value<'a>, QueryError> + Send + Sync;

/// Signature of a custom predicate.
pub type PredicateFn = dyn Fn(&Elements, &Element) -> Result<bool, QueryError> + Send + Sync;

#[derive(Clone)]
enum Base {
    Root,
    Custom { label: String, func: Arc<AttributeFn> },
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Field(String),
    Call {
        args: Vec<Literal>,
        kwargs: Vec<(String, Literal)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Hop {
    step: Step,
    optional: bool,
}

/// A lazily evaluated path from an element to a value.
#[derive(Clone)]
pub struct Attribute {
    base: Base,
    hops: Vec<Hop>,
    /// Whether hops appended from now on are optional.
    optional: bool,
}

impl Attribute {
    /// The element itself.
    pub fn root() -> Self {
        Self {
            base: Base::Root,
            hops: Vec::new(),
            optional: false,
        }
    }

    /// An attribute computed by `func`, described as `label`.
    pub fn new<F>(label: impl Into<String>, func: F) -> Self
    where
        F: for<'a> Fn(&'a Elements, &'a Element) -> Result<Value<'a>, QueryError> + Send + Sync + 'static,
    {
        Self {
            base: Base::Custom {
                label: label.into(),
                func: Arc::new(func),
            },
            hops: Vec::new(),
            optional: false,
        }
    }

    fn push(&self, step: Step) -> Self {
        let mut next = self.clone();
        next.hops.push(Hop {
            step,
            optional: self.optional,
        });
        next
    }

    /// The same path, with every later hop optional.
    pub fn optional(&self) -> Self {
        Self {
            optional: true,
            ..self.clone()
        }
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn field(&self, name: impl Into<String>) -> Self {
        self.push(Step::Field(name.into()))
    }

    /// Call whatever the path resolves to with these arguments.
    pub fn bind(&self, args: Vec<Literal>, kwargs: Vec<(String, Literal)>) -> Self {
        self.push(Step::Call { args, kwargs })
    }

    /// `self.field(name).bind(args, [])`
    pub fn method<L: Into<Literal>>(&self, name: &str, args: impl IntoIterator<Item = L>) -> Self {
        self.field(name)
            .bind(args.into_iter().map(Into::into).collect(), Vec::new())
    }

    /// Quantity conversion, `.to(unit)`.
    pub fn to(&self, unit: &str) -> Self {
        self.method("to", [unit])
    }

    /// Magnitude of a quantity, `.m`.
    pub fn m(&self) -> Self {
        self.field("m")
    }

    pub fn evaluate<'a>(&self, elements: &'a Elements, element: &'a Element) -> Result<Value<'a>, QueryError> {
        let mut value = match &self.base {
            Base::Root => Value::Element(element),
            Base::Custom { func, .. } => func(elements, element)?,
        };

        for (i, hop) in self.hops.iter().enumerate() {
            if value.is_none() {
                if hop.optional {
                    return Ok(Value::None);
                }
                return Err(QueryError::MissingValue {
                    path: self.describe(i + 1),
                });
            }
            value = match &hop.step {
                Step::Field(name) => value.field(name, elements)?,
                Step::Call { args, kwargs } => value.call(args, kwargs)?,
            };
        }
        Ok(value)
    }

    fn describe(&self, hops: usize) -> String {
        let mut out = match &self.base {
            Base::Root => String::new(),
            Base::Custom { label, .. } => label.clone(),
        };
        for hop in &self.hops[..hops] {
            match &hop.step {
                Step::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    if hop.optional {
                        out.push('?');
                    }
                    out.push_str(name);
                }
                Step::Call { args, kwargs } => {
                    let args = args
                        .iter()
                        .map(ToString::to_string)
                        .chain(kwargs.iter().map(|(k, v)| format!("{k}={v}")))
                        .collect::<Vec<_>>();
                    out.push('(');
                    out.push_str(&args.join(","));
                    out.push(')');
                }
            }
        }
        if out.is_empty() {
            out.push_str("element");
        }
        out
    }

    pub fn is_lt(&self, rhs: impl Into<Literal>) -> Predicate {
        self.compare(CompareOp::Lt, rhs)
    }

    pub fn is_le(&self, rhs: impl Into<Literal>) -> Predicate {
        self.compare(CompareOp::Le, rhs)
    }

    pub fn is_eq(&self, rhs: impl Into<Literal>) -> Predicate {
        self.compare(CompareOp::Eq, rhs)
    }

    pub fn is_ne(&self, rhs: impl Into<Literal>) -> Predicate {
        self.compare(CompareOp::Ne, rhs)
    }

    pub fn is_gt(&self, rhs: impl Into<Literal>) -> Predicate {
        self.compare(CompareOp::Gt, rhs)
    }

    pub fn is_ge(&self, rhs: impl Into<Literal>) -> Predicate {
        self.compare(CompareOp::Ge, rhs)
    }

    fn compare(&self, op: CompareOp, rhs: impl Into<Literal>) -> Predicate {
        Predicate::Compare {
            lhs: self.clone(),
            op,
            rhs: rhs.into(),
        }
    }

    /// Identity: the very same element of the collection (or, for plain
    /// values, an equal one).
    pub fn is(&self, rhs: impl Into<Literal>) -> Predicate {
        Predicate::Is {
            lhs: self.clone(),
            rhs: rhs.into(),
        }
    }

    /// Membership.
    ///
    /// With a single list argument, tests membership in that list; with a
    /// single text argument, tests for a substring of it; otherwise tests
    /// membership among the arguments themselves.
    pub fn is_in<L: Into<Literal>>(&self, candidates: impl IntoIterator<Item = L>) -> Predicate {
        Predicate::In {
            lhs: self.clone(),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(self.hops.len()))
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Attribute").field(&self.to_string()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A boolean expression over an element.
#[derive(Clone)]
pub enum Predicate {
    Compare {
        lhs: Attribute,
        op: CompareOp,
        rhs: Literal,
    },
    Is {
        lhs: Attribute,
        rhs: Literal,
    },
    In {
        lhs: Attribute,
        candidates: Vec<Literal>,
    },
    /// An attribute coerced to a boolean.
    Truthy(Attribute),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    Const(bool),
    Custom {
        label: String,
        func: Arc<PredicateFn>,
    },
}

impl Predicate {
    /// A predicate backed by a plain function.
    pub fn new(label: impl Into<String>, func: impl Fn(&Element) -> bool + Send + Sync + 'static) -> Self {
        Predicate::Custom {
            label: label.into(),
            func: Arc::new(move |_: &Elements, element: &Element| -> Result<bool, QueryError> { Ok(func(element)) }),
        }
    }

    pub fn evaluate(&self, elements: &Elements, element: &Element) -> Result<bool, QueryError> {
        Ok(match self {
            Predicate::Compare { lhs, op, rhs } => {
                let lhs = lhs.evaluate(elements, element)?;
                let rhs = rhs.to_value(elements)?;
                match op {
                    CompareOp::Eq => lhs.try_eq(&rhs)?,
                    CompareOp::Ne => !lhs.try_eq(&rhs)?,
                    CompareOp::Lt => lhs.try_cmp(&rhs)?.is_lt(),
                    CompareOp::Le => lhs.try_cmp(&rhs)?.is_le(),
                    CompareOp::Gt => lhs.try_cmp(&rhs)?.is_gt(),
                    CompareOp::Ge => lhs.try_cmp(&rhs)?.is_ge(),
                }
            }
            Predicate::Is { lhs, rhs } => lhs.evaluate(elements, element)?.identical(&rhs.to_value(elements)?),
            Predicate::In { lhs, candidates } => {
                let lhs = lhs.evaluate(elements, element)?;
                match candidates.as_slice() {
                    [Literal::List(items)] => contains(&lhs, items, elements)?,
                    [Literal::Text(text)] => match &lhs {
                        Value::Text(needle) => text.contains(&**needle),
                        other => {
                            return Err(QueryError::Incomparable {
                                lhs: other.type_name(),
                                rhs: "text",
                            });
                        }
                    },
                    items => contains(&lhs, items, elements)?,
                }
            }
            Predicate::Truthy(attr) => attr.evaluate(elements, element)?.truthy(),
            Predicate::And(l, r) => l.evaluate(elements, element)? && r.evaluate(elements, element)?,
            Predicate::Or(l, r) => l.evaluate(elements, element)? || r.evaluate(elements, element)?,
            Predicate::Not(p) => !p.evaluate(elements, element)?,
            Predicate::Const(b) => *b,
            Predicate::Custom { func, .. } => func(elements, element)?,
        })
    }
}

fn contains(needle: &Value<'_>, items: &[Literal], elements: &Elements) -> Result<bool, QueryError> {
    for item in items {
        if needle.try_eq(&item.to_value(elements)?).unwrap_or(false) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Operand of a binary predicate, parenthesized when it would otherwise read ambiguously.
struct Operand<'p>(&'p Predicate, bool);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Operand(p, strict) = *self;
        let group = match p {
            Predicate::Or(..) => true,
            Predicate::And(..) => strict,
            _ => false,
        };
        if group { write!(f, "({p})") } else { write!(f, "{p}") }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { lhs, op, rhs } => write!(f, "{lhs} {} {rhs}", op.symbol()),
            Predicate::Is { lhs, rhs } => write!(f, "{lhs} is {rhs}"),
            Predicate::In { lhs, candidates } => match candidates.as_slice() {
                [single @ (Literal::List(_) | Literal::Text(_))] => write!(f, "{lhs} in {single}"),
                items => write!(f, "{lhs} in {}", Literal::List(items.to_vec())),
            },
            Predicate::Truthy(attr) => write!(f, "{attr}"),
            Predicate::And(l, r) => write!(f, "{} and {}", Operand(l, false), Operand(r, false)),
            Predicate::Or(l, r) => write!(f, "{l} or {r}"),
            Predicate::Not(p) => write!(f, "not {}", Operand(p, true)),
            Predicate::Const(b) => write!(f, "{b}"),
            Predicate::Custom { label, .. } => f.write_str(label),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.to_string()).finish()
    }
}

impl From<Attribute> for Predicate {
    fn from(attr: Attribute) -> Self {
        Predicate::Truthy(attr)
    }
}

impl From<bool> for Predicate {
    fn from(b: bool) -> Self {
        Predicate::Const(b)
    }
}

impl<R: Into<Predicate>> BitAnd<R> for Predicate {
    type Output = Predicate;
    fn bitand(self, rhs: R) -> Predicate {
        Predicate::And(Box::new(self), Box::new(rhs.into()))
    }
}

impl<R: Into<Predicate>> BitOr<R> for Predicate {
    type Output = Predicate;
    fn bitor(self, rhs: R) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(rhs.into()))
    }
}

impl Not for Predicate {
    type Output = Predicate;
    fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

impl<R: Into<Predicate>> BitAnd<R> for Attribute {
    type Output = Predicate;
    fn bitand(self, rhs: R) -> Predicate {
        Predicate::from(self) & rhs
    }
}

impl<R: Into<Predicate>> BitOr<R> for Attribute {
    type Output = Predicate;
    fn bitor(self, rhs: R) -> Predicate {
        Predicate::from(self) | rhs
    }
}

impl Not for Attribute {
    type Output = Predicate;
    fn not(self) -> Predicate {
        !Predicate::from(self)
    }
}

pub fn and(lhs: impl Into<Predicate>, rhs: impl Into<Predicate>) -> Predicate {
    Predicate::And(Box::new(lhs.into()), Box::new(rhs.into()))
}

pub fn or(lhs: impl Into<Predicate>, rhs: impl Into<Predicate>) -> Predicate {
    Predicate::Or(Box::new(lhs.into()), Box::new(rhs.into()))
}

pub fn not(p: impl Into<Predicate>) -> Predicate {
    Predicate::Not(Box::new(p.into()))
}

macro_rules! element_attributes {
    ($($field:ident),* $(,)?) => {
        /// Attribute paths rooted at an element's fields.
        pub struct ElementAttr;

        impl ElementAttr {
            /// Every field name with an accessor below.
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];

            $(
                pub fn $field() -> Attribute {
                    Attribute::root().field(stringify!($field))
                }
            )*
        }
    };
}

element_attributes!(
    name,
    pretty_name,
    state,
    specific_heat_capacity,
    thermal_conductivity,
    molar_mass,
    radiation_absorption,
    radioactivity,
    mass_per_tile,
    low_transition,
    high_transition,
    density,
    thermal_diffusivity,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementDef, RawFields, State};
    use crate::strings::StringTable;
    use crate::units::Quantity;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn fixture() -> Elements {
        let defs = [
            json!({
                "elementId": "Water", "localizationID": "WATER", "state": "Liquid",
                "specificHeatCapacity": 4.179, "thermalConductivity": 0.609, "molarMass": 18.01528,
                "radiationAbsorptionFactor": 0.8, "radiationPer1000Mass": 0, "maxMass": 1000,
                "lowTemp": 272.5, "lowTempTransitionTarget": "Ice"
            }),
            json!({
                "elementId": "Ice", "localizationID": "ICE", "state": "Solid",
                "specificHeatCapacity": 2.05, "thermalConductivity": 2.18, "molarMass": 18.01528,
                "radiationAbsorptionFactor": 0.8, "radiationPer1000Mass": 0, "maxMass": 1000,
                "highTemp": 272.5, "highTempTransitionTarget": "Water"
            }),
        ]
        .map(|v| {
            let fields: RawFields = v.as_object().cloned().unwrap();
            ElementDef::from_raw_fields(&fields).unwrap()
        });
        Elements::new(defs, &StringTable::from_iter([("WATER", "Water"), ("ICE", "Ice")])).unwrap()
    }

    #[test]
    fn test_root_fields() {
        let elements = fixture();
        let water = &elements["Water"];
        for field in ElementAttr::FIELDS {
            assert!(Attribute::root().field(*field).evaluate(&elements, water).is_ok(), "{field}");
        }
        let name = ElementAttr::name().evaluate(&elements, water).unwrap();
        assert_eq!(name.as_text(), Some("Water"));
    }

    #[test]
    fn test_chain_through_transition() {
        let elements = fixture();
        let target = ElementAttr::low_transition().field("target");
        let ice = target.evaluate(&elements, &elements["Water"]).unwrap();
        assert!(std::ptr::eq(ice.as_element().unwrap(), &elements["Ice"]));

        let name = target.field("name");
        assert_eq!(name.to_string(), "low_transition.target.name");
        assert_eq!(name.evaluate(&elements, &elements["Water"]).unwrap().as_text(), Some("Ice"));
    }

    #[test]
    fn test_is_identity() {
        let elements = fixture();
        let ice = elements.id("Ice").unwrap();
        let pred = ElementAttr::low_transition().field("target").is(ice);
        assert!(pred.evaluate(&elements, &elements["Water"]).unwrap());

        let pred = ElementAttr::high_transition().field("target").is(ice);
        assert!(!pred.evaluate(&elements, &elements["Ice"]).unwrap());
    }

    #[test]
    fn test_required_chain_fails_on_missing_link() {
        let elements = fixture();
        let attr = ElementAttr::high_transition().field("temperature").m();
        let err = attr.evaluate(&elements, &elements["Water"]).unwrap_err();
        assert_eq!(
            err,
            QueryError::MissingValue {
                path: "high_transition.temperature".into()
            }
        );
    }

    #[test]
    fn test_optional_chain() {
        let elements = fixture();
        let attr = optional(&ElementAttr::high_transition()).field("temperature").to("degF").m();
        assert_eq!(attr.to_string(), "high_transition.?temperature.?to(degF).?m");
        assert!(attr.evaluate(&elements, &elements["Water"]).unwrap().is_none());

        let ice_high = attr.evaluate(&elements, &elements["Ice"]).unwrap();
        assert_relative_eq!(ice_high.as_number().unwrap(), 30.83, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_field_fails_even_when_optional() {
        let elements = fixture();
        let attr = ElementAttr::low_transition().optional().field("colour");
        assert!(matches!(
            attr.evaluate(&elements, &elements["Water"]),
            Err(QueryError::NoSuchField { type_name: "transition", .. })
        ));
    }

    #[test]
    fn test_bind_forwards_arguments() {
        let elements = fixture();
        let attr = ElementAttr::molar_mass().to("ounce/mol").m();
        assert_eq!(attr.to_string(), "molar_mass.to(ounce/mol).m");
        let value = attr.evaluate(&elements, &elements["Water"]).unwrap();
        assert_relative_eq!(value.as_number().unwrap(), 18.01528 / 28.349_523_125, max_relative = 1e-12);

        let kw = ElementAttr::molar_mass()
            .field("to")
            .bind(vec![], vec![("unit".into(), Literal::from("kg/mol"))]);
        assert_eq!(kw.to_string(), "molar_mass.to(unit=kg/mol)");
        let value = kw.evaluate(&elements, &elements["Water"]).unwrap();
        assert_relative_eq!(value.as_quantity().unwrap().m(), 0.01801528, max_relative = 1e-12);
    }

    #[test]
    fn test_method_calls_on_elements() {
        let elements = fixture();
        let energy = Attribute::root().method(
            "heat_energy",
            [Quantity::new(1.0, "delta_degC").unwrap(), Quantity::new(1.0, "kg").unwrap()],
        );
        let value = energy.evaluate(&elements, &elements["Water"]).unwrap();
        assert_relative_eq!(value.as_quantity().unwrap().to("DTU").unwrap().m(), 4179.0, max_relative = 1e-12);

        let not_callable = ElementAttr::name().bind(vec![], vec![]);
        assert!(matches!(
            not_callable.evaluate(&elements, &elements["Water"]),
            Err(QueryError::NotCallable { type_name: "text" })
        ));
    }

    #[test]
    fn test_comparisons() {
        let elements = fixture();
        let water = &elements["Water"];
        let heavy = Quantity::new(100.0, "kg").unwrap();
        let ton = Quantity::new(1.0, "t").unwrap();

        assert!(ElementAttr::mass_per_tile().is_gt(&heavy).evaluate(&elements, water).unwrap());
        assert!(ElementAttr::mass_per_tile().is_ge(&ton).evaluate(&elements, water).unwrap());
        assert!(ElementAttr::mass_per_tile().is_le(&ton).evaluate(&elements, water).unwrap());
        assert!(!ElementAttr::mass_per_tile().is_lt(&ton).evaluate(&elements, water).unwrap());
        assert!(ElementAttr::mass_per_tile().is_eq(&ton).evaluate(&elements, water).unwrap());
        assert!(ElementAttr::state().is_ne(State::Gas).evaluate(&elements, water).unwrap());

        let metres = Quantity::new(1.0, "m").unwrap();
        assert!(matches!(
            ElementAttr::mass_per_tile().is_gt(&metres).evaluate(&elements, water),
            Err(QueryError::Quantity(_))
        ));
    }

    #[test]
    fn test_membership() {
        let elements = fixture();
        let water = &elements["Water"];
        let name = ElementAttr::name();

        assert!(name.is_in(["Ice", "Water"]).evaluate(&elements, water).unwrap());
        assert!(name.is_in([vec!["Water", "Steam"]]).evaluate(&elements, water).unwrap());
        assert!(name.is_in(["SaltWater"]).evaluate(&elements, water).unwrap());
        assert!(!name.is_in(["Ice"]).evaluate(&elements, water).unwrap());
        assert!(ElementAttr::state().is_in([State::Liquid, State::Gas]).evaluate(&elements, water).unwrap());
        assert_eq!(name.is_in(["Ice", "Water"]).to_string(), "name in [Ice, Water]");
    }

    #[test]
    fn test_boolean_algebra() {
        let elements = fixture();
        let water = &elements["Water"];
        let t = Predicate::new("yes", |_| true);
        let f = Predicate::new("no", |_| false);

        for (p, expected) in [
            (t.clone() & f.clone(), false),
            (t.clone() & t.clone(), true),
            (f.clone() | t.clone(), true),
            (f.clone() | f.clone(), false),
            (!f.clone(), true),
            (and(t.clone(), not(f.clone())), true),
            (or(f.clone(), false), false),
        ] {
            assert_eq!(p.evaluate(&elements, water).unwrap(), expected, "{p}");
        }
    }

    #[test]
    fn test_attribute_coerced_by_truthiness() {
        let elements = fixture();
        let p = is_liquid() & ElementAttr::low_transition();
        assert!(p.evaluate(&elements, &elements["Water"]).unwrap());
        let p = is_solid() & ElementAttr::low_transition();
        assert!(!p.evaluate(&elements, &elements["Ice"]).unwrap());
        assert_eq!(p.to_string(), "state == State.Solid and low_transition");
    }

    #[test]
    fn test_descriptions() {
        let p = is_liquid() | is_gas();
        assert_eq!(p.to_string(), "state == State.Liquid or state == State.Gas");
        assert_eq!((!p.clone()).to_string(), "not (state == State.Liquid or state == State.Gas)");
        assert_eq!(
            (p & is_solid()).to_string(),
            "(state == State.Liquid or state == State.Gas) and state == State.Solid"
        );
        assert_eq!(Attribute::root().to_string(), "element");
    }

    #[test]
    fn test_custom_attribute() {
        let elements = fixture();
        let shouting = Attribute::new("shouting", |_, e| Ok(Value::Text(e.name.to_uppercase().into())));
        let p = shouting.field("len").is_eq(5);
        assert_eq!(p.to_string(), "shouting.len == 5");
        assert!(p.evaluate(&elements, &elements["Water"]).unwrap());
        assert!(!p.evaluate(&elements, &elements["Ice"]).unwrap());
    }
}
