//! Physical quantities with runtime dimensional analysis
//!
//! A [`Quantity`] pairs a magnitude with a [`Unit`]. Units are parsed from
//! small expressions such as `"DTU/(m s)/°C"` against a fixed registry and
//! reduce to a scale factor over SI base units plus a [`Dimension`] vector.
//! Mixing quantities whose dimensions differ fails with
//! [`QuantityError::Dimensionality`].
//!
//! Temperatures come in two flavours. `K`, `°C` and `°F` written on their
//! own are *absolute* points on a scale; `delta_degC`/`delta_degF` (and any
//! temperature unit used inside a compound expression, such as the `°C` in
//! `DTU/g/°C`) are *intervals*. Subtracting two absolute temperatures yields
//! an interval, adding an interval to an absolute temperature yields an
//! absolute temperature, and everything else has to go through
//! [`Quantity::to_delta`] explicitly.
//!
//! ```
//! use oniref::units::Quantity;
//!
//! let boiling = Quantity::new(373.15, "K").unwrap().to("degC").unwrap();
//! assert!((boiling.magnitude() - 100.0).abs() < 1e-9);
//!
//! let length = Quantity::new(1.0, "m").unwrap();
//! assert!(length.try_cmp(&boiling).is_err());
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use crate::error::QuantityError;

const DIMENSION_NAMES: [&str; 6] = ["mass", "length", "time", "temperature", "substance", "radiation"];
const BASE_SYMBOLS: [&str; 6] = ["kg", "m", "s", "K", "mol", "rad"];

/// Relative tolerance used when deciding that two converted magnitudes are equal.
const EQUALITY_TOLERANCE: f64 = 1e-9;

/// Exponents of the base dimensions a unit is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension([i8; 6]);

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension::new(0, 0, 0, 0, 0, 0);
    pub const MASS: Dimension = Dimension::new(1, 0, 0, 0, 0, 0);
    pub const LENGTH: Dimension = Dimension::new(0, 1, 0, 0, 0, 0);
    pub const TIME: Dimension = Dimension::new(0, 0, 1, 0, 0, 0);
    pub const TEMPERATURE: Dimension = Dimension::new(0, 0, 0, 1, 0, 0);
    pub const SUBSTANCE: Dimension = Dimension::new(0, 0, 0, 0, 1, 0);
    pub const RADIATION: Dimension = Dimension::new(0, 0, 0, 0, 0, 1);
    pub const VOLUME: Dimension = Dimension::new(0, 3, 0, 0, 0, 0);
    pub const DENSITY: Dimension = Dimension::new(1, -3, 0, 0, 0, 0);
    pub const ENERGY: Dimension = Dimension::new(1, 2, -2, 0, 0, 0);
    pub const POWER: Dimension = Dimension::new(1, 2, -3, 0, 0, 0);

    pub const fn new(
        mass: i8,
        length: i8,
        time: i8,
        temperature: i8,
        substance: i8,
        radiation: i8,
    ) -> Self {
        Dimension([mass, length, time, temperature, substance, radiation])
    }

    pub fn is_dimensionless(self) -> bool {
        self == Self::DIMENSIONLESS
    }

    /// Every exponent multiplied by `n`, or `None` if one leaves the `i8` range.
    pub fn checked_powi(self, n: i8) -> Option<Self> {
        let mut out = self.0;
        for e in &mut out {
            *e = e.checked_mul(n)?;
        }
        Some(Dimension(out))
    }

    /// Dimension of a product.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let mut out = self.0;
        for (e, r) in out.iter_mut().zip(rhs.0) {
            *e = e.checked_add(r)?;
        }
        Some(Dimension(out))
    }

    /// Dimension of a quotient.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        let mut out = self.0;
        for (e, r) in out.iter_mut().zip(rhs.0) {
            *e = e.checked_sub(r)?;
        }
        Some(Dimension(out))
    }

    /// Symbol of the SI base unit with this dimension, e.g. `m^2/s`.
    pub fn base_symbol(self) -> String {
        format_exponents(self.0, &BASE_SYMBOLS, |s, p| format!("{s}^{p}"), "*", "/")
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let names = DIMENSION_NAMES.map(|n| format!("[{n}]"));
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        write!(
            f,
            "{}",
            format_exponents(self.0, &names, |s, p| format!("{s} ** {p}"), " * ", " / ")
        )
    }
}

fn format_exponents(
    exponents: [i8; 6],
    symbols: &[&str],
    power: impl Fn(&str, i8) -> String,
    times: &str,
    per: &str,
) -> String {
    let term = |symbol: &str, p: i8| if p == 1 { symbol.to_string() } else { power(symbol, p) };
    let numerator: Vec<String> = exponents
        .iter()
        .zip(symbols)
        .filter(|(p, _)| **p > 0)
        .map(|(p, s)| term(*s, *p))
        .collect();
    let denominator: Vec<String> = exponents
        .iter()
        .zip(symbols)
        .filter(|(p, _)| **p < 0)
        .map(|(p, s)| term(*s, -*p))
        .collect();

    let mut out = if numerator.is_empty() {
        "1".to_string()
    } else {
        numerator.join(times)
    };
    for d in denominator {
        out.push_str(per);
        out.push_str(&d);
    }
    out
}

/// Whether magnitudes in a unit measure from a true zero.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Origin {
    Linear,
    /// A point on a temperature scale: `kelvin = magnitude * scale + offset`.
    Absolute { offset: f64, delta: &'static str },
}

struct UnitDef {
    names: &'static [&'static str],
    scale: f64,
    dimension: Dimension,
    origin: Origin,
}

const fn def(names: &'static [&'static str], scale: f64, dimension: Dimension) -> UnitDef {
    UnitDef {
        names,
        scale,
        dimension,
        origin: Origin::Linear,
    }
}

const fn absolute(
    names: &'static [&'static str],
    scale: f64,
    offset: f64,
    delta: &'static str,
) -> UnitDef {
    UnitDef {
        names,
        scale,
        dimension: Dimension::TEMPERATURE,
        origin: Origin::Absolute { offset, delta },
    }
}

const FAHRENHEIT: f64 = 5.0 / 9.0;

static REGISTRY: &[UnitDef] = &[
    // mass
    def(&["kg", "kilogram", "kilograms"], 1.0, Dimension::MASS),
    def(&["g", "gram", "grams"], 1e-3, Dimension::MASS),
    def(&["mg", "milligram", "milligrams"], 1e-6, Dimension::MASS),
    def(&["t", "tonne", "tonnes"], 1e3, Dimension::MASS),
    def(&["lb", "pound", "pounds"], 0.453_592_37, Dimension::MASS),
    def(&["oz", "ounce", "ounces"], 0.028_349_523_125, Dimension::MASS),
    // length
    def(&["m", "meter", "metre", "meters", "metres"], 1.0, Dimension::LENGTH),
    def(&["mm", "millimeter", "millimetre"], 1e-3, Dimension::LENGTH),
    def(&["cm", "centimeter", "centimetre"], 1e-2, Dimension::LENGTH),
    def(&["km", "kilometer", "kilometre"], 1e3, Dimension::LENGTH),
    // time
    def(&["s", "sec", "second", "seconds"], 1.0, Dimension::TIME),
    def(&["ms", "millisecond", "milliseconds"], 1e-3, Dimension::TIME),
    def(&["min", "minute", "minutes"], 60.0, Dimension::TIME),
    def(&["h", "hr", "hour", "hours"], 3600.0, Dimension::TIME),
    def(&["cycle", "cycles"], 600.0, Dimension::TIME),
    // temperature
    absolute(&["K", "kelvin", "°K", "degK"], 1.0, 0.0, "K"),
    absolute(&["degC", "°C", "celsius", "degree_Celsius"], 1.0, 273.15, "delta_degC"),
    absolute(&["degF", "°F", "fahrenheit", "degree_Fahrenheit"], FAHRENHEIT, 459.67 * FAHRENHEIT, "delta_degF"),
    def(&["delta_degC", "Δ°C"], 1.0, Dimension::TEMPERATURE),
    def(&["delta_degF", "Δ°F"], FAHRENHEIT, Dimension::TEMPERATURE),
    // amount of substance
    def(&["mol", "mole", "moles"], 1.0, Dimension::SUBSTANCE),
    def(&["mmol", "millimole"], 1e-3, Dimension::SUBSTANCE),
    def(&["kmol", "kilomole"], 1e3, Dimension::SUBSTANCE),
    // energy and power
    def(&["J", "joule", "joules"], 1.0, Dimension::ENERGY),
    def(&["kJ", "kilojoule", "kilojoules"], 1e3, Dimension::ENERGY),
    def(&["DTU", "dtu"], 1.0, Dimension::ENERGY),
    def(&["kDTU"], 1e3, Dimension::ENERGY),
    def(&["cal", "calorie", "calories"], 4.184, Dimension::ENERGY),
    def(&["kcal", "kilocalorie", "kilocalories"], 4184.0, Dimension::ENERGY),
    def(&["W", "watt", "watts"], 1.0, Dimension::POWER),
    def(&["kW", "kilowatt", "kilowatts"], 1e3, Dimension::POWER),
    // volume
    def(&["L", "l", "liter", "litre", "liters", "litres"], 1e-3, Dimension::VOLUME),
    def(&["mL", "ml", "milliliter", "millilitre"], 1e-6, Dimension::VOLUME),
    def(&["tile", "tiles"], 1.0, Dimension::VOLUME),
    // radiation
    def(&["rad", "rads"], 1.0, Dimension::RADIATION),
    // dimensionless
    def(&["dimensionless"], 1.0, Dimension::DIMENSIONLESS),
    def(&["%", "percent"], 1e-2, Dimension::DIMENSIONLESS),
];

fn lookup(name: &str) -> Option<&'static UnitDef> {
    REGISTRY.iter().find(|d| d.names.contains(&name))
}

/// A unit of measure: a scale over SI base units plus a dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    symbol: String,
    scale: f64,
    dimension: Dimension,
    origin: Origin,
}

impl Unit {
    /// Parse a unit expression such as `"kg/m^3"` or `"DTU/(m*s)/°C"`.
    pub fn parse(expr: &str) -> Result<Unit, QuantityError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Ok(Unit::dimensionless());
        }

        // A temperature unit on its own is a point on its scale
        if let Some(def) = lookup(trimmed) {
            return Ok(Unit {
                symbol: trimmed.to_string(),
                scale: def.scale,
                dimension: def.dimension,
                origin: def.origin,
            });
        }

        let mut parser = Parser { expr: trimmed, pos: 0 };
        let term = parser.product()?;
        if parser.pos < trimmed.len() {
            return Err(parser.error("unbalanced ')'"));
        }

        Ok(Unit::linear(trimmed, term.scale, term.dimension))
    }

    pub(crate) fn linear(symbol: impl Into<String>, scale: f64, dimension: Dimension) -> Unit {
        Unit {
            symbol: symbol.into(),
            scale,
            dimension,
            origin: Origin::Linear,
        }
    }

    pub fn dimensionless() -> Unit {
        Unit::linear("", 1.0, Dimension::DIMENSIONLESS)
    }

    /// The SI base unit for `dimension`.
    pub fn base(dimension: Dimension) -> Unit {
        let symbol = if dimension.is_dimensionless() {
            String::new()
        } else {
            dimension.base_symbol()
        };
        Unit::linear(symbol, 1.0, dimension)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    /// True for units that denote a point on a temperature scale.
    pub fn is_absolute(&self) -> bool {
        matches!(self.origin, Origin::Absolute { .. })
    }

    fn has_offset(&self) -> bool {
        matches!(self.origin, Origin::Absolute { offset, .. } if offset != 0.0)
    }

    /// The interval unit matching this unit's scale.
    pub fn delta(&self) -> Unit {
        match self.origin {
            Origin::Absolute { delta, .. } => Unit::linear(delta, self.scale, self.dimension),
            Origin::Linear => self.clone(),
        }
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension && self.is_absolute() == other.is_absolute()
    }

    fn check_compatible(&self, target: &Unit) -> Result<(), QuantityError> {
        if self.is_compatible(target) {
            Ok(())
        } else {
            Err(QuantityError::Dimensionality {
                from: self.symbol.clone(),
                from_dim: self.describe_dimension(),
                to: target.symbol.clone(),
                to_dim: target.describe_dimension(),
            })
        }
    }

    fn describe_dimension(&self) -> String {
        if self.is_absolute() {
            format!("absolute {}", self.dimension)
        } else {
            self.dimension.to_string()
        }
    }

    fn to_base(&self, magnitude: f64) -> f64 {
        match self.origin {
            Origin::Linear => magnitude * self.scale,
            Origin::Absolute { offset, .. } => magnitude * self.scale + offset,
        }
    }

    fn from_base(&self, value: f64) -> f64 {
        match self.origin {
            Origin::Linear => value / self.scale,
            Origin::Absolute { offset, .. } => (value - offset) / self.scale,
        }
    }

    pub fn powi(&self, n: i8) -> Result<Unit, QuantityError> {
        let symbol = format!("{}^{n}", group(&self.symbol));
        match self.dimension.checked_powi(n) {
            Some(dimension) => Ok(Unit::linear(symbol, self.scale.powi(i32::from(n)), dimension)),
            None => Err(exponent_overflow(symbol)),
        }
    }
}

fn exponent_overflow(expr: impl Into<String>) -> QuantityError {
    QuantityError::BadUnitExpr {
        expr: expr.into(),
        reason: "dimension exponent out of range".to_string(),
    }
}

fn group(symbol: &str) -> Cow<'_, str> {
    if symbol.contains(['/', '*', ' ', '^']) {
        Cow::Owned(format!("({symbol})"))
    } else {
        Cow::Borrowed(symbol)
    }
}

impl Mul for &Unit {
    type Output = Result<Unit, QuantityError>;
    fn mul(self, rhs: &Unit) -> Self::Output {
        let symbol = match (self.symbol.is_empty(), rhs.symbol.is_empty()) {
            (true, _) => rhs.symbol.clone(),
            (_, true) => self.symbol.clone(),
            _ => format!("{}*{}", group(&self.symbol), group(&rhs.symbol)),
        };
        match self.dimension.checked_mul(rhs.dimension) {
            Some(dimension) => Ok(Unit::linear(symbol, self.scale * rhs.scale, dimension)),
            None => Err(exponent_overflow(symbol)),
        }
    }
}

impl Div for &Unit {
    type Output = Result<Unit, QuantityError>;
    fn div(self, rhs: &Unit) -> Self::Output {
        let symbol = match (self.symbol.is_empty(), rhs.symbol.is_empty()) {
            (_, true) => self.symbol.clone(),
            (true, _) => format!("1/{}", group(&rhs.symbol)),
            _ => format!("{}/{}", group(&self.symbol), group(&rhs.symbol)),
        };
        match self.dimension.checked_div(rhs.dimension) {
            Some(dimension) => Ok(Unit::linear(symbol, self.scale / rhs.scale, dimension)),
            None => Err(exponent_overflow(symbol)),
        }
    }
}

impl FromStr for Unit {
    type Err = QuantityError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Intermediate result while parsing a compound unit expression.
#[derive(Debug, Clone, Copy)]
struct Term {
    scale: f64,
    dimension: Dimension,
}

impl Term {
    fn checked_powi(self, n: i8) -> Option<Term> {
        Some(Term {
            scale: self.scale.powi(i32::from(n)),
            dimension: self.dimension.checked_powi(n)?,
        })
    }

    fn checked_mul(self, rhs: Term) -> Option<Term> {
        Some(Term {
            scale: self.scale * rhs.scale,
            dimension: self.dimension.checked_mul(rhs.dimension)?,
        })
    }

    fn checked_div(self, rhs: Term) -> Option<Term> {
        Some(Term {
            scale: self.scale / rhs.scale,
            dimension: self.dimension.checked_div(rhs.dimension)?,
        })
    }
}

/// Recursive-descent parser for unit expressions.
///
/// Grammar (whitespace between two operands multiplies them):
///
/// ```text
/// product := power (('*' | '·' | '/' | <space>) power)*
/// power   := atom (('^' | '**') integer | '²' | '³')?
/// atom    := unit-name | number | '(' product ')'
/// ```
struct Parser<'a> {
    expr: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.expr[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn error(&self, reason: impl Into<String>) -> QuantityError {
        QuantityError::BadUnitExpr {
            expr: self.expr.to_string(),
            reason: reason.into(),
        }
    }

    fn overflow(&self) -> QuantityError {
        self.error("dimension exponent out of range")
    }

    fn product(&mut self) -> Result<Term, QuantityError> {
        let mut acc = self.power()?;
        loop {
            let spaced = self.skip_ws();
            match self.peek() {
                None | Some(')') => return Ok(acc),
                Some('*' | '·') => {
                    self.bump();
                    let rhs = self.power()?;
                    acc = acc.checked_mul(rhs).ok_or_else(|| self.overflow())?;
                }
                Some('/') => {
                    self.bump();
                    let rhs = self.power()?;
                    acc = acc.checked_div(rhs).ok_or_else(|| self.overflow())?;
                }
                Some(_) if spaced => {
                    let rhs = self.power()?;
                    acc = acc.checked_mul(rhs).ok_or_else(|| self.overflow())?;
                }
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            }
        }
    }

    fn power(&mut self) -> Result<Term, QuantityError> {
        let base = self.atom()?;
        let checkpoint = self.pos;
        self.skip_ws();

        let exponent = if self.rest().starts_with("**") {
            self.pos += 2;
            self.integer()?
        } else if self.peek() == Some('^') {
            self.bump();
            self.integer()?
        } else if self.peek() == Some('²') {
            self.bump();
            2
        } else if self.peek() == Some('³') {
            self.bump();
            3
        } else {
            self.pos = checkpoint;
            1
        };

        base.checked_powi(exponent).ok_or_else(|| self.overflow())
    }

    fn integer(&mut self) -> Result<i8, QuantityError> {
        self.skip_ws();
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        self.expr[start..self.pos]
            .parse()
            .map_err(|_| self.error("expected an integer exponent"))
    }

    fn atom(&mut self) -> Result<Term, QuantityError> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.bump();
                let inner = self.product()?;
                self.skip_ws();
                match self.bump() {
                    Some(')') => Ok(inner),
                    _ => Err(self.error("missing ')'")),
                }
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
                    self.bump();
                }
                let scale = self.expr[start..self.pos]
                    .parse()
                    .map_err(|_| self.error("malformed number"))?;
                Ok(Term {
                    scale,
                    dimension: Dimension::DIMENSIONLESS,
                })
            }
            Some(c) if starts_ident(c) => {
                let start = self.pos;
                self.bump();
                while self.peek().is_some_and(continues_ident) {
                    self.bump();
                }
                let name = &self.expr[start..self.pos];
                let def = lookup(name).ok_or_else(|| QuantityError::UnknownUnit(name.to_string()))?;
                Ok(Term {
                    scale: def.scale,
                    dimension: def.dimension,
                })
            }
            Some(c) => Err(self.error(format!("unexpected '{c}'"))),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

fn starts_ident(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '_' | '°' | '%')
}

fn continues_ident(c: char) -> bool {
    starts_ident(c) || c.is_ascii_digit()
}

/// A magnitude in a unit.
#[derive(Debug, Clone)]
pub struct Quantity {
    magnitude: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: &str) -> Result<Self, QuantityError> {
        Ok(Self::with_unit(magnitude, Unit::parse(unit)?))
    }

    pub fn with_unit(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Like [`Quantity::new`], but an absent magnitude stays absent rather than becoming zero.
    pub fn maybe(magnitude: Option<f64>, unit: &str) -> Result<Option<Self>, QuantityError> {
        magnitude.map(|m| Self::new(m, unit)).transpose()
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Short alias for [`Quantity::magnitude`].
    pub fn m(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn dimension(&self) -> Dimension {
        self.unit.dimension
    }

    pub fn is_absolute(&self) -> bool {
        self.unit.is_absolute()
    }

    /// Convert to the unit described by `unit`.
    pub fn to(&self, unit: &str) -> Result<Self, QuantityError> {
        self.to_unit(&Unit::parse(unit)?)
    }

    pub fn to_unit(&self, target: &Unit) -> Result<Self, QuantityError> {
        self.unit.check_compatible(target)?;
        let magnitude = target.from_base(self.unit.to_base(self.magnitude));
        Ok(Self::with_unit(magnitude, target.clone()))
    }

    /// Express in SI base units; absolute temperatures become kelvin.
    pub fn to_base_units(&self) -> Self {
        if self.unit.is_absolute() {
            let kelvin = Unit {
                symbol: "K".to_string(),
                scale: 1.0,
                dimension: Dimension::TEMPERATURE,
                origin: Origin::Absolute {
                    offset: 0.0,
                    delta: "K",
                },
            };
            Self::with_unit(self.unit.to_base(self.magnitude), kelvin)
        } else {
            Self::with_unit(self.unit.to_base(self.magnitude), Unit::base(self.unit.dimension))
        }
    }

    /// Reinterpret an absolute temperature as an interval above its scale's zero.
    pub fn to_delta(&self) -> Self {
        Self::with_unit(self.magnitude, self.unit.delta())
    }

    /// Compare against a quantity in a compatible unit.
    pub fn try_cmp(&self, other: &Quantity) -> Result<Ordering, QuantityError> {
        let other = other.to_unit(&self.unit)?;
        if approx_eq(self.magnitude, other.magnitude) {
            Ok(Ordering::Equal)
        } else {
            Ok(self.magnitude.total_cmp(&other.magnitude))
        }
    }

    pub fn try_eq(&self, other: &Quantity) -> Result<bool, QuantityError> {
        Ok(self.try_cmp(other)? == Ordering::Equal)
    }

    fn combine(&self, rhs: &Quantity, sign: f64, operation: &'static str) -> Result<Quantity, QuantityError> {
        match (self.is_absolute(), rhs.is_absolute()) {
            (false, false) => {
                let rhs = rhs.to_unit(&self.unit)?;
                Ok(Self::with_unit(self.magnitude + sign * rhs.magnitude, self.unit.clone()))
            }
            (true, false) => {
                let rhs = rhs.to_unit(&self.unit.delta())?;
                Ok(Self::with_unit(self.magnitude + sign * rhs.magnitude, self.unit.clone()))
            }
            (true, true) if sign < 0.0 => {
                let rhs = rhs.to_unit(&self.unit)?;
                Ok(Self::with_unit(self.magnitude - rhs.magnitude, self.unit.delta()))
            }
            (false, true) if sign > 0.0 => {
                let lhs = self.to_unit(&rhs.unit.delta())?;
                Ok(Self::with_unit(lhs.magnitude + rhs.magnitude, rhs.unit.clone()))
            }
            _ => Err(QuantityError::OffsetUnit {
                unit: rhs.unit.symbol.clone(),
                operation,
            }),
        }
    }

    fn check_multiplicative(&self, rhs: &Quantity, operation: &'static str) -> Result<(), QuantityError> {
        for unit in [&self.unit, &rhs.unit] {
            if unit.has_offset() {
                return Err(QuantityError::OffsetUnit {
                    unit: unit.symbol.clone(),
                    operation,
                });
            }
        }
        Ok(())
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= EQUALITY_TOLERANCE * a.abs().max(b.abs())
}

impl PartialEq for Quantity {
    /// Quantities in incompatible units are never equal.
    fn eq(&self, other: &Self) -> bool {
        self.try_eq(other).unwrap_or(false)
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}

impl Add for &Quantity {
    type Output = Result<Quantity, QuantityError>;
    fn add(self, rhs: &Quantity) -> Self::Output {
        self.combine(rhs, 1.0, "addition")
    }
}

impl Sub for &Quantity {
    type Output = Result<Quantity, QuantityError>;
    fn sub(self, rhs: &Quantity) -> Self::Output {
        self.combine(rhs, -1.0, "subtraction")
    }
}

impl Mul for &Quantity {
    type Output = Result<Quantity, QuantityError>;
    fn mul(self, rhs: &Quantity) -> Self::Output {
        self.check_multiplicative(rhs, "multiplication")?;
        Ok(Quantity::with_unit(self.magnitude * rhs.magnitude, (&self.unit * &rhs.unit)?))
    }
}

impl Div for &Quantity {
    type Output = Result<Quantity, QuantityError>;
    /// Division by a zero magnitude follows IEEE semantics.
    fn div(self, rhs: &Quantity) -> Self::Output {
        self.check_multiplicative(rhs, "division")?;
        Ok(Quantity::with_unit(self.magnitude / rhs.magnitude, (&self.unit / &rhs.unit)?))
    }
}

macro_rules! forward_owned_ops {
    ($($trait:ident :: $method:ident),*) => {$(
        impl $trait for Quantity {
            type Output = Result<Quantity, QuantityError>;
            fn $method(self, rhs: Quantity) -> Self::Output {
                (&self).$method(&rhs)
            }
        }
    )*};
}

forward_owned_ops!(Add::add, Sub::sub, Mul::mul, Div::div);

impl Mul<f64> for &Quantity {
    type Output = Quantity;
    fn mul(self, rhs: f64) -> Quantity {
        Quantity::with_unit(self.magnitude * rhs, self.unit.clone())
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;
    fn mul(self, rhs: f64) -> Quantity {
        Quantity::with_unit(self.magnitude * rhs, self.unit)
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;
    fn div(self, rhs: f64) -> Quantity {
        Quantity::with_unit(self.magnitude / rhs, self.unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*}", p, self.magnitude)?,
            None => write!(f, "{}", self.magnitude)?,
        }
        if !self.unit.symbol.is_empty() {
            write!(f, " {}", self.unit)?;
        }
        Ok(())
    }
}
