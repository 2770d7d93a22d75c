//! Dynamic values produced while walking an attribute path

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use crate::element::{Element, ElementId, State, Transition};
use crate::elements::Elements;
use crate::error::QueryError;
use crate::units::Quantity;

/// The result of evaluating an attribute against an element.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    None,
    Bool(bool),
    Number(f64),
    Text(Cow<'a, str>),
    State(State),
    Quantity(Quantity),
    Element(&'a Element),
    Transition(&'a Transition),
    List(Vec<Value<'a>>),
    /// A method looked up on `receiver` and waiting to be called.
    Method { receiver: Box<Value<'a>>, name: String },
}

impl<'a> Value<'a> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::State(_) => "state",
            Value::Quantity(_) => "quantity",
            Value::Element(_) => "element",
            Value::Transition(_) => "transition",
            Value::List(_) => "list",
            Value::Method { .. } => "method",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            Value::Quantity(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&'a Element> {
        match self {
            Value::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Text(t) => !t.is_empty(),
            Value::Quantity(q) => q.magnitude() != 0.0,
            Value::List(items) => !items.is_empty(),
            Value::State(_) | Value::Element(_) | Value::Transition(_) | Value::Method { .. } => true,
        }
    }

    /// Look up a named field or method.
    pub fn field(self, name: &str, elements: &'a Elements) -> Result<Value<'a>, QueryError> {
        let value = match &self {
            Value::Element(element) => element_field(*element, name)?,
            Value::Transition(transition) => transition_field(*transition, name, elements)?,
            Value::Quantity(q) => match name {
                "m" | "magnitude" => Some(Value::Number(q.magnitude())),
                "units" => Some(Value::Text(Cow::Owned(q.unit().symbol().to_string()))),
                "dimensionality" => Some(Value::Text(Cow::Owned(q.dimension().to_string()))),
                "to" | "to_base_units" | "to_delta" => None,
                _ => return Err(no_such_field(&self, name)),
            },
            Value::State(state) => match name {
                "name" => Some(Value::Text(Cow::Borrowed(state.name()))),
                _ => return Err(no_such_field(&self, name)),
            },
            Value::Text(text) => match name {
                "len" => Some(Value::Number(text.chars().count() as f64)),
                "contains" | "starts_with" | "ends_with" => None,
                _ => return Err(no_such_field(&self, name)),
            },
            Value::List(items) => match name {
                "len" => Some(Value::Number(items.len() as f64)),
                _ => return Err(no_such_field(&self, name)),
            },
            _ => return Err(no_such_field(&self, name)),
        };

        Ok(value.unwrap_or_else(|| Value::Method {
            receiver: Box::new(self),
            name: name.to_string(),
        }))
    }

    /// Call a method value with literal arguments.
    pub fn call(self, args: &[Literal], kwargs: &[(String, Literal)]) -> Result<Value<'a>, QueryError> {
        let (receiver, name) = match self {
            Value::Method { receiver, name } => (receiver, name),
            other => {
                return Err(QueryError::NotCallable {
                    type_name: other.type_name(),
                });
            }
        };

        match (*receiver, name.as_str()) {
            (Value::Quantity(q), "to") => {
                let [unit] = bind_args::<1>(&name, args, kwargs, &["unit"])?;
                let unit = text_arg(&name, unit)?;
                Ok(Value::Quantity(q.to(unit)?))
            }
            (Value::Quantity(q), "to_base_units") => {
                bind_args::<0>(&name, args, kwargs, &[])?;
                Ok(Value::Quantity(q.to_base_units()))
            }
            (Value::Quantity(q), "to_delta") => {
                bind_args::<0>(&name, args, kwargs, &[])?;
                Ok(Value::Quantity(q.to_delta()))
            }
            (Value::Element(element), "heat_energy") => {
                let [delta_t, mass] = bind_args::<2>(&name, args, kwargs, &["delta_t", "mass"])?;
                let (delta_t, mass) = (quantity_arg(&name, delta_t)?, quantity_arg(&name, mass)?);
                Ok(Value::Quantity(element.heat_energy(delta_t, mass)?))
            }
            (Value::Element(element), "temperature_change") => {
                let [energy, mass] = bind_args::<2>(&name, args, kwargs, &["energy", "mass"])?;
                let (energy, mass) = (quantity_arg(&name, energy)?, quantity_arg(&name, mass)?);
                Ok(Value::Quantity(element.temperature_change(energy, mass)?))
            }
            (Value::Text(text), "contains" | "starts_with" | "ends_with") => {
                let [needle] = bind_args::<1>(&name, args, kwargs, &["pattern"])?;
                let needle = text_arg(&name, needle)?;
                Ok(Value::Bool(match name.as_str() {
                    "contains" => text.contains(needle),
                    "starts_with" => text.starts_with(needle),
                    _ => text.ends_with(needle),
                }))
            }
            (receiver, _) => Err(QueryError::NotCallable {
                type_name: receiver.type_name(),
            }),
        }
    }

    /// Order two values; only like-typed values (and dimensionless quantities against numbers) compare.
    pub fn try_cmp(&self, other: &Value<'_>) -> Result<Ordering, QueryError> {
        let ordering = match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Quantity(a), Value::Quantity(b)) => Some(a.try_cmp(b)?),
            (Value::Quantity(q), Value::Number(n)) if plain_ratio(q) => q.to_base_units().magnitude().partial_cmp(n),
            (Value::Number(n), Value::Quantity(q)) if plain_ratio(q) => n.partial_cmp(&q.to_base_units().magnitude()),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::State(a), Value::State(b)) => Some(a.cmp(b)),
            _ => None,
        };
        ordering.ok_or(QueryError::Incomparable {
            lhs: self.type_name(),
            rhs: other.type_name(),
        })
    }

    /// Value equality. Values of different types are unequal; quantities of
    /// different dimensions are an error.
    pub fn try_eq(&self, other: &Value<'_>) -> Result<bool, QueryError> {
        Ok(match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Quantity(a), Value::Quantity(b)) => a.try_eq(b)?,
            (Value::Quantity(_), Value::Number(_)) | (Value::Number(_), Value::Quantity(_)) => {
                matches!(self.try_cmp(other), Ok(Ordering::Equal))
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::State(a), Value::State(b)) => a == b,
            (Value::Element(a), Value::Element(b)) => a == b,
            (Value::Transition(a), Value::Transition(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.try_eq(y)? {
                        return Ok(false);
                    }
                }
                true
            }
            _ => false,
        })
    }

    /// Identity: the same element or transition in the collection.
    pub fn identical(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (Value::Element(a), Value::Element(b)) => std::ptr::eq(*a, *b),
            (Value::Transition(a), Value::Transition(b)) => std::ptr::eq(*a, *b),
            (Value::Element(_) | Value::Transition(_), _) | (_, Value::Element(_) | Value::Transition(_)) => false,
            _ => self.try_eq(other).unwrap_or(false),
        }
    }
}

fn plain_ratio(q: &Quantity) -> bool {
    q.unit().is_dimensionless() && !q.is_absolute()
}

fn no_such_field(value: &Value<'_>, name: &str) -> QueryError {
    QueryError::NoSuchField {
        type_name: value.type_name(),
        field: name.to_string(),
    }
}

fn optional_quantity<'a>(q: Option<Quantity>) -> Value<'a> {
    q.map_or(Value::None, Value::Quantity)
}

fn resolved<'a>(elements: &'a Elements, id: Option<ElementId>) -> Result<Value<'a>, QueryError> {
    match id {
        None => Ok(Value::None),
        Some(id) => elements
            .get(id)
            .map(Value::Element)
            .ok_or(QueryError::DanglingElement(id.index())),
    }
}

fn element_field<'a>(element: &'a Element, name: &str) -> Result<Option<Value<'a>>, QueryError> {
    let value = match name {
        "name" => Value::Text(Cow::Borrowed(&element.name)),
        "pretty_name" => Value::Text(Cow::Borrowed(&element.pretty_name)),
        "state" => Value::State(element.state),
        "specific_heat_capacity" => Value::Quantity(element.specific_heat_capacity.clone()),
        "thermal_conductivity" => Value::Quantity(element.thermal_conductivity.clone()),
        "molar_mass" => Value::Quantity(element.molar_mass.clone()),
        "radiation_absorption" => Value::Quantity(element.radiation_absorption.clone()),
        "radioactivity" => Value::Quantity(element.radioactivity.clone()),
        "mass_per_tile" => optional_quantity(element.mass_per_tile.clone()),
        "low_transition" => element.low_transition.as_ref().map_or(Value::None, Value::Transition),
        "high_transition" => element.high_transition.as_ref().map_or(Value::None, Value::Transition),
        "density" => optional_quantity(element.density()),
        "thermal_diffusivity" => optional_quantity(element.thermal_diffusivity()?),
        "heat_energy" | "temperature_change" => return Ok(None),
        _ => {
            return Err(QueryError::NoSuchField {
                type_name: "element",
                field: name.to_string(),
            });
        }
    };
    Ok(Some(value))
}

fn transition_field<'a>(
    transition: &'a Transition,
    name: &str,
    elements: &'a Elements,
) -> Result<Option<Value<'a>>, QueryError> {
    let value = match name {
        "temperature" => Value::Quantity(transition.temperature.clone()),
        "target" => resolved(elements, Some(transition.target))?,
        "target_name" => Value::Text(Cow::Borrowed(&transition.target_name)),
        "byproduct" => resolved(elements, transition.byproduct)?,
        "byproduct_name" => transition
            .byproduct_name
            .as_deref()
            .map_or(Value::None, |n| Value::Text(Cow::Borrowed(n))),
        "byproduct_ratio" => transition.byproduct_ratio.map_or(Value::None, Value::Number),
        _ => {
            return Err(QueryError::NoSuchField {
                type_name: "transition",
                field: name.to_string(),
            });
        }
    };
    Ok(Some(value))
}

/// Match positional and keyword arguments against parameter names.
fn bind_args<'l, const N: usize>(
    method: &str,
    args: &'l [Literal],
    kwargs: &'l [(String, Literal)],
    params: &[&str],
) -> Result<[&'l Literal; N], QueryError> {
    let bad = |reason: String| QueryError::BadArguments {
        method: method.to_string(),
        reason,
    };

    if args.len() > N {
        return Err(bad(format!("expected at most {N} arguments, got {}", args.len())));
    }
    let mut bound: [Option<&Literal>; N] = [None; N];
    for (slot, arg) in bound.iter_mut().zip(args) {
        *slot = Some(arg);
    }
    for (key, arg) in kwargs {
        let i = params
            .iter()
            .position(|p| *p == key.as_str())
            .ok_or_else(|| bad(format!("unexpected keyword '{key}'")))?;
        if bound[i].replace(arg).is_some() {
            return Err(bad(format!("'{key}' given more than once")));
        }
    }

    let mut out = [&Literal::None; N];
    for (i, slot) in bound.into_iter().enumerate() {
        out[i] = slot.ok_or_else(|| bad(format!("missing argument '{}'", params[i])))?;
    }
    Ok(out)
}

fn text_arg<'l>(method: &str, arg: &'l Literal) -> Result<&'l str, QueryError> {
    match arg {
        Literal::Text(t) => Ok(t),
        other => Err(QueryError::BadArguments {
            method: method.to_string(),
            reason: format!("expected text, got {other}"),
        }),
    }
}

fn quantity_arg<'l>(method: &str, arg: &'l Literal) -> Result<&'l Quantity, QueryError> {
    match arg {
        Literal::Quantity(q) => Ok(q),
        other => Err(QueryError::BadArguments {
            method: method.to_string(),
            reason: format!("expected a quantity, got {other}"),
        }),
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => match f.precision() {
                Some(p) => write!(f, "{n:.p$}"),
                None => write!(f, "{n}"),
            },
            Value::Text(t) => f.write_str(t),
            Value::State(s) => write!(f, "{s}"),
            Value::Quantity(q) => match f.precision() {
                Some(p) => write!(f, "{q:.p$}"),
                None => write!(f, "{q}"),
            },
            Value::Element(e) => write!(f, "{e}"),
            Value::Transition(t) => write!(f, "{t}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Method { name, .. } => write!(f, "<method {name}>"),
        }
    }
}

/// A constant operand in a query: comparison right-hand sides and call arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Number(f64),
    Text(String),
    State(State),
    Quantity(Quantity),
    /// An element of the collection the query runs against.
    Element(ElementId),
    List(Vec<Literal>),
}

impl Literal {
    pub fn to_value<'a>(&'a self, elements: &'a Elements) -> Result<Value<'a>, QueryError> {
        Ok(match self {
            Literal::None => Value::None,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::Text(t) => Value::Text(Cow::Borrowed(t)),
            Literal::State(s) => Value::State(*s),
            Literal::Quantity(q) => Value::Quantity(q.clone()),
            Literal::Element(id) => resolved(elements, Some(*id))?,
            Literal::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| item.to_value(elements))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Number(f64::from(n))
    }
}

impl From<&str> for Literal {
    fn from(t: &str) -> Self {
        Literal::Text(t.to_string())
    }
}

impl From<String> for Literal {
    fn from(t: String) -> Self {
        Literal::Text(t)
    }
}

impl From<State> for Literal {
    fn from(s: State) -> Self {
        Literal::State(s)
    }
}

impl From<Quantity> for Literal {
    fn from(q: Quantity) -> Self {
        Literal::Quantity(q)
    }
}

impl From<&Quantity> for Literal {
    fn from(q: &Quantity) -> Self {
        Literal::Quantity(q.clone())
    }
}

impl From<ElementId> for Literal {
    fn from(id: ElementId) -> Self {
        Literal::Element(id)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Literal::None, Into::into)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(items: Vec<T>) -> Self {
        Literal::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => f.write_str("None"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Text(t) => f.write_str(t),
            Literal::State(s) => write!(f, "State.{s}"),
            Literal::Quantity(q) => write!(f, "{q}"),
            Literal::Element(id) => write!(f, "{id}"),
            Literal::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}
