//! Element definitions and phase transitions
//!
//! Elements are built in two phases. [`Element::from_raw_fields`] produces an
//! [`ElementDef`] whose transitions name their targets but do not point at
//! them yet; [`crate::Elements::new`] then resolves every definition into an
//! [`Element`] whose transitions hold the [`ElementId`] of their target
//! inside the owning collection.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{FieldError, LoadError, QuantityError, ResolveError};
use crate::strings::StringTable;
use crate::units::{Dimension, Quantity, Unit};

/// One raw element record: field name to value.
pub type RawFields = Map<String, Value>;

/// An element whose transition targets are still names.
pub type ElementDef = Element<Unresolved>;

/// Identifier used in place of a name placeholder when a record has no `elementId`.
pub const UNKNOWN_ELEMENT: &str = "<unknown>";

const SHC_UNITS: &str = "DTU/g/°C";
const TC_UNITS: &str = "DTU/(m s)/°C";
const MOLAR_MASS_UNITS: &str = "g/mol";
const RADIOACTIVITY_UNITS: &str = "rad/kg";
const MASS_UNITS: &str = "kg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    Vacuum,
    Solid,
    Liquid,
    Gas,
}

impl State {
    pub const ALL: [State; 4] = [State::Vacuum, State::Solid, State::Liquid, State::Gas];

    pub fn name(self) -> &'static str {
        match self {
            State::Vacuum => "Vacuum",
            State::Solid => "Solid",
            State::Liquid => "Liquid",
            State::Gas => "Gas",
        }
    }
}

impl FromStr for State {
    type Err = FieldError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        State::ALL
            .into_iter()
            .find(|state| state.name() == s)
            .ok_or_else(|| FieldError::UnknownState(s.to_string()))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position of an element inside its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Marker for references that have not been resolved against a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Unresolved;

/// A phase change: crossing `temperature` turns the element into `target`.
#[derive(Debug, Clone)]
pub struct Transition<T = ElementId> {
    /// Threshold, as an absolute temperature in °C.
    pub temperature: Quantity,
    pub target: T,
    pub target_name: String,
    /// Secondary product ("ore") released by the transition.
    pub byproduct: Option<T>,
    pub byproduct_name: Option<String>,
    /// Fraction of mass converted into the byproduct.
    pub byproduct_ratio: Option<f64>,
}

impl Transition<Unresolved> {
    pub fn new(temperature: Quantity, target: impl Into<String>) -> Self {
        Self {
            temperature,
            target: Unresolved,
            target_name: target.into(),
            byproduct: None,
            byproduct_name: None,
            byproduct_ratio: None,
        }
    }

    pub fn with_byproduct(mut self, name: impl Into<String>, ratio: Option<f64>) -> Self {
        self.byproduct = Some(Unresolved);
        self.byproduct_name = Some(name.into());
        self.byproduct_ratio = ratio;
        self
    }

    /// Read the `low` or `high` transition from a raw record.
    ///
    /// Temperatures are stored in kelvin in the game data.
    pub fn read(fields: &RawFields, side: &str) -> Result<Option<Self>, FieldError> {
        let temp = optional_number(fields, &format!("{side}Temp"))?;
        let target = optional_text(fields, &format!("{side}TempTransitionTarget"))?;
        let (Some(temp), Some(target)) = (temp, target) else {
            return Ok(None);
        };

        let mut transition = Self::new(Quantity::new(temp, "K")?.to("degC")?, target);
        let ratio = optional_number(fields, &format!("{side}TempTransitionOreMassConversion"))?;
        match optional_text(fields, &format!("{side}TempTransitionOreId"))? {
            Some(ore) => transition = transition.with_byproduct(ore, ratio),
            None => transition.byproduct_ratio = ratio,
        }
        Ok(Some(transition))
    }

    fn write(&self, fields: &mut RawFields, side: &str) -> Result<(), QuantityError> {
        fields.insert(format!("{side}Temp"), Value::from(self.temperature.to("K")?.magnitude()));
        fields.insert(format!("{side}TempTransitionTarget"), Value::from(self.target_name.as_str()));
        if let Some(ore) = &self.byproduct_name {
            fields.insert(format!("{side}TempTransitionOreId"), Value::from(ore.as_str()));
        }
        if let Some(ratio) = self.byproduct_ratio {
            fields.insert(format!("{side}TempTransitionOreMassConversion"), Value::from(ratio));
        }
        Ok(())
    }

    fn resolve(self, owner: &str, index: &HashMap<String, ElementId>) -> Result<Transition, ResolveError> {
        let target = *index
            .get(&self.target_name)
            .ok_or_else(|| ResolveError::UnresolvedReference {
                element: owner.to_string(),
                target: self.target_name.clone(),
            })?;

        let byproduct = self.byproduct_name.as_ref().and_then(|name| {
            let id = index.get(name).copied();
            if id.is_none() {
                warn!(element = owner, byproduct = %name, "transition byproduct is not a known element");
            }
            id
        });

        Ok(Transition {
            temperature: self.temperature,
            target,
            target_name: self.target_name,
            byproduct,
            byproduct_name: self.byproduct_name,
            byproduct_ratio: self.byproduct_ratio,
        })
    }
}

/// Transitions compare by threshold and target name, whether resolved or not.
impl<A, B> PartialEq<Transition<B>> for Transition<A> {
    fn eq(&self, other: &Transition<B>) -> bool {
        self.target_name == other.target_name && self.temperature == other.temperature
    }
}

impl<T> fmt::Display for Transition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:.1}", self.target_name, self.temperature)
    }
}

/// A substance and its physical properties.
#[derive(Debug, Clone)]
pub struct Element<T = ElementId> {
    pub name: String,
    /// String-table key before resolution, display text after.
    pub pretty_name: String,
    pub state: State,
    pub specific_heat_capacity: Quantity,
    pub thermal_conductivity: Quantity,
    pub molar_mass: Quantity,
    pub radiation_absorption: Quantity,
    pub radioactivity: Quantity,
    /// Mass of one full tile (1 m³).
    pub mass_per_tile: Option<Quantity>,
    pub low_transition: Option<Transition<T>>,
    pub high_transition: Option<Transition<T>>,
}

impl Element<Unresolved> {
    /// Build a definition from a raw record.
    ///
    /// Any missing or ill-typed required field fails the whole record; the
    /// error names the element, or [`UNKNOWN_ELEMENT`] when the name itself
    /// is what's missing.
    pub fn from_raw_fields(fields: &RawFields) -> Result<Self, LoadError> {
        Self::read_fields(fields).map_err(|source| LoadError::BadDefinition {
            element: fields
                .get("elementId")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_ELEMENT)
                .to_string(),
            source,
        })
    }

    fn read_fields(fields: &RawFields) -> Result<Self, FieldError> {
        Ok(Element {
            name: text(fields, "elementId")?,
            pretty_name: text(fields, "localizationID")?,
            state: text(fields, "state")?.parse()?,
            specific_heat_capacity: Quantity::new(number(fields, "specificHeatCapacity")?, SHC_UNITS)?,
            thermal_conductivity: Quantity::new(number(fields, "thermalConductivity")?, TC_UNITS)?,
            molar_mass: Quantity::new(number(fields, "molarMass")?, MOLAR_MASS_UNITS)?,
            radiation_absorption: Quantity::new(number(fields, "radiationAbsorptionFactor")?, "dimensionless")?,
            radioactivity: Quantity::new(number(fields, "radiationPer1000Mass")?, RADIOACTIVITY_UNITS)?,
            mass_per_tile: Quantity::maybe(optional_number(fields, "maxMass")?, MASS_UNITS)?,
            low_transition: Transition::<Unresolved>::read(fields, "low")?,
            high_transition: Transition::<Unresolved>::read(fields, "high")?,
        })
    }

    /// Inverse of [`Element::from_raw_fields`].
    pub fn to_raw_fields(&self) -> Result<RawFields, QuantityError> {
        let mut fields = RawFields::new();
        fields.insert("elementId".into(), Value::from(self.name.as_str()));
        fields.insert("localizationID".into(), Value::from(self.pretty_name.as_str()));
        fields.insert("state".into(), Value::from(self.state.name()));
        fields.insert(
            "specificHeatCapacity".into(),
            Value::from(self.specific_heat_capacity.to(SHC_UNITS)?.magnitude()),
        );
        fields.insert(
            "thermalConductivity".into(),
            Value::from(self.thermal_conductivity.to(TC_UNITS)?.magnitude()),
        );
        fields.insert("molarMass".into(), Value::from(self.molar_mass.to(MOLAR_MASS_UNITS)?.magnitude()));
        fields.insert(
            "radiationAbsorptionFactor".into(),
            Value::from(self.radiation_absorption.to("dimensionless")?.magnitude()),
        );
        fields.insert(
            "radiationPer1000Mass".into(),
            Value::from(self.radioactivity.to(RADIOACTIVITY_UNITS)?.magnitude()),
        );
        if let Some(mass) = &self.mass_per_tile {
            fields.insert("maxMass".into(), Value::from(mass.to(MASS_UNITS)?.magnitude()));
        }
        if let Some(low) = &self.low_transition {
            low.write(&mut fields, "low")?;
        }
        if let Some(high) = &self.high_transition {
            high.write(&mut fields, "high")?;
        }
        Ok(fields)
    }

    /// Swap names for collection ids and the string-table key for display text.
    pub(crate) fn resolve(
        self,
        index: &HashMap<String, ElementId>,
        strings: &StringTable,
    ) -> Result<Element, ResolveError> {
        let low_transition = self.low_transition.map(|t| t.resolve(&self.name, index)).transpose()?;
        let high_transition = self.high_transition.map(|t| t.resolve(&self.name, index)).transpose()?;

        let pretty_name = match strings.get(&self.pretty_name) {
            Some(text) => text.into_owned(),
            None => {
                warn!(element = %self.name, key = %self.pretty_name, "no display name in string table");
                self.pretty_name
            }
        };

        Ok(Element {
            name: self.name,
            pretty_name,
            state: self.state,
            specific_heat_capacity: self.specific_heat_capacity,
            thermal_conductivity: self.thermal_conductivity,
            molar_mass: self.molar_mass,
            radiation_absorption: self.radiation_absorption,
            radioactivity: self.radioactivity,
            mass_per_tile: self.mass_per_tile,
            low_transition,
            high_transition,
        })
    }
}

impl<T> Element<T> {
    /// Mass per unit volume, if the element has a tile mass.
    pub fn density(&self) -> Option<Quantity> {
        let tile = Unit::linear("m^3", 1.0, Dimension::VOLUME);
        self.mass_per_tile
            .as_ref()
            .map(|mass| Quantity::with_unit(mass.magnitude(), (mass.unit() / &tile).expect("mass / volume stays within exponent range")))
    }

    /// `k / (c · ρ)` in m²/s, with ρ = 1 kg/m³ for elements without a tile mass.
    ///
    /// `None` when the specific heat capacity is zero (vacuum).
    pub fn thermal_diffusivity(&self) -> Result<Option<Quantity>, QuantityError> {
        if self.specific_heat_capacity.magnitude() == 0.0 {
            return Ok(None);
        }
        let density = self
            .density()
            .unwrap_or_else(|| Quantity::with_unit(1.0, Unit::linear("kg/m^3", 1.0, Dimension::DENSITY)));
        let capacity = (&self.specific_heat_capacity * &density)?;
        Ok(Some((&self.thermal_conductivity / &capacity)?.to_base_units()))
    }

    /// Heat gained or lost when `mass` of this element changes temperature by `delta_t`.
    ///
    /// `delta_t` must be a temperature interval; absolute temperatures have
    /// to be converted with [`Quantity::to_delta`] first.
    pub fn heat_energy(&self, delta_t: &Quantity, mass: &Quantity) -> Result<Quantity, QuantityError> {
        let per_degree = (&self.specific_heat_capacity * &mass.to("g")?)?;
        (&per_degree * &delta_t.to("delta_degC")?)?.to("DTU")
    }

    /// Temperature change when `mass` of this element absorbs `energy`.
    pub fn temperature_change(&self, energy: &Quantity, mass: &Quantity) -> Result<Quantity, QuantityError> {
        let per_degree = (&self.specific_heat_capacity * &mass.to("g")?)?;
        (&energy.to("DTU")? / &per_degree)?.to("delta_degC")
    }
}

/// Elements are identified by name alone.
impl<A, B> PartialEq<Element<B>> for Element<A> {
    fn eq(&self, other: &Element<B>) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for Element<T> {}

impl<T> fmt::Display for Element<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_name)
    }
}

fn number(fields: &RawFields, key: &str) -> Result<f64, FieldError> {
    optional_number(fields, key)?.ok_or_else(|| FieldError::Missing(key.to_string()))
}

fn optional_number(fields: &RawFields, key: &str) -> Result<Option<f64>, FieldError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| FieldError::WrongType {
            field: key.to_string(),
            expected: "a number",
        }),
    }
}

fn text(fields: &RawFields, key: &str) -> Result<String, FieldError> {
    optional_text(fields, key)?.ok_or_else(|| FieldError::Missing(key.to_string()))
}

fn optional_text(fields: &RawFields, key: &str) -> Result<Option<String>, FieldError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(FieldError::WrongType {
            field: key.to_string(),
            expected: "a string",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn raw(value: Value) -> RawFields {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture is not an object: {other}"),
        }
    }

    fn water_fields() -> RawFields {
        raw(json!({
            "elementId": "Water",
            "maxMass": 1000,
            "liquidCompression": 1.01,
            "speed": 125,
            "specificHeatCapacity": 4.179,
            "thermalConductivity": 0.609,
            "molarMass": 18.01528,
            "lightAbsorptionFactor": 0.25,
            "radiationAbsorptionFactor": 0.8,
            "radiationPer1000Mass": 0,
            "lowTemp": 272.5,
            "lowTempTransitionTarget": "Ice",
            "highTemp": 372.5,
            "highTempTransitionTarget": "Steam",
            "tags": ["AnyWater"],
            "isDisabled": false,
            "state": "Liquid",
            "localizationID": "STRINGS.ELEMENTS.WATER.NAME",
            "dlcId": ""
        }))
    }

    #[test]
    fn test_from_raw_fields() {
        let water = ElementDef::from_raw_fields(&water_fields()).unwrap();
        assert_eq!(water.name, "Water");
        assert_eq!(water.pretty_name, "STRINGS.ELEMENTS.WATER.NAME");
        assert_eq!(water.state, State::Liquid);
        assert_relative_eq!(water.specific_heat_capacity.to("J/kg/K").unwrap().m(), 4179.0, max_relative = 1e-12);
        assert_relative_eq!(water.molar_mass.to("g/mol").unwrap().m(), 18.01528);
        assert_eq!(water.mass_per_tile, Some(Quantity::new(1000.0, "kg").unwrap()));

        let low = water.low_transition.as_ref().unwrap();
        assert_eq!(low.target_name, "Ice");
        assert!(low.temperature.is_absolute());
        assert_relative_eq!(low.temperature.to("degC").unwrap().m(), -0.65, epsilon = 1e-9);
        assert_eq!(water.high_transition.as_ref().unwrap().target_name, "Steam");
    }

    #[test]
    fn test_transition_requires_both_fields() {
        let mut fields = water_fields();
        fields.remove("highTempTransitionTarget");
        let water = ElementDef::from_raw_fields(&fields).unwrap();
        assert!(water.high_transition.is_none());
        assert!(water.low_transition.is_some());
    }

    #[test]
    fn test_transition_byproduct() {
        let mut fields = water_fields();
        fields.insert("highTempTransitionOreId".into(), json!("Salt"));
        fields.insert("highTempTransitionOreMassConversion".into(), json!(0.07));
        let high = ElementDef::from_raw_fields(&fields).unwrap().high_transition.unwrap();
        assert_eq!(high.byproduct_name.as_deref(), Some("Salt"));
        assert_eq!(high.byproduct, Some(Unresolved));
        assert_eq!(high.byproduct_ratio, Some(0.07));
    }

    #[test]
    fn test_missing_name_reports_unknown() {
        let err = ElementDef::from_raw_fields(&raw(json!({"placeholder": 1}))).unwrap_err();
        assert!(matches!(&err, LoadError::BadDefinition { element, .. } if element == UNKNOWN_ELEMENT));
        assert!(err.to_string().contains("<unknown>"));
    }

    #[test]
    fn test_missing_key_reports_element() {
        let err = ElementDef::from_raw_fields(&raw(json!({"elementId": "foo"}))).unwrap_err();
        match err {
            LoadError::BadDefinition { element, source } => {
                assert_eq!(element, "foo");
                assert_eq!(source, FieldError::Missing("localizationID".into()));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bad_state_and_types() {
        let mut fields = water_fields();
        fields.insert("state".into(), json!("Plasma"));
        let err = ElementDef::from_raw_fields(&fields).unwrap_err();
        assert!(matches!(err, LoadError::BadDefinition { source: FieldError::UnknownState(s), .. } if s == "Plasma"));

        let mut fields = water_fields();
        fields.insert("molarMass".into(), json!("heavy"));
        let err = ElementDef::from_raw_fields(&fields).unwrap_err();
        assert!(matches!(err, LoadError::BadDefinition { source: FieldError::WrongType { .. }, .. }));
    }

    #[test]
    fn test_raw_fields_round_trip() {
        let mut fields = water_fields();
        fields.insert("lowTempTransitionOreId".into(), json!("Salt"));
        fields.insert("lowTempTransitionOreMassConversion".into(), json!(0.5));
        let water = ElementDef::from_raw_fields(&fields).unwrap();
        let back = water.to_raw_fields().unwrap();

        for (key, value) in &back {
            let original = &fields[key];
            match (value.as_f64(), original.as_f64()) {
                (Some(a), Some(b)) => assert_relative_eq!(a, b, max_relative = 1e-9, epsilon = 1e-9),
                _ => assert_eq!(value, original, "field {key}"),
            }
        }
        assert!(back.contains_key("maxMass"));
        assert!(!back.contains_key("speed"));
        assert_eq!(ElementDef::from_raw_fields(&back).unwrap().low_transition, water.low_transition);
    }

    #[test]
    fn test_equality_is_by_name() {
        let water = ElementDef::from_raw_fields(&water_fields()).unwrap();
        let mut other = water.clone();
        other.state = State::Gas;
        other.mass_per_tile = None;
        assert_eq!(water, other);

        other.name = "DirtyWater".into();
        assert_ne!(water, other);
    }

    #[test]
    fn test_transition_equality_ignores_resolution() {
        let raw = Transition::<Unresolved>::new(Quantity::new(0.0, "degC").unwrap(), "Ice");
        let resolved = Transition {
            temperature: Quantity::new(273.15, "K").unwrap(),
            target: ElementId(3),
            target_name: "Ice".to_string(),
            byproduct: None,
            byproduct_name: None,
            byproduct_ratio: None,
        };
        assert_eq!(raw, resolved);
        assert_ne!(raw, Transition::<Unresolved>::new(Quantity::new(1.0, "degC").unwrap(), "Ice"));
    }

    #[test]
    fn test_density_and_diffusivity() {
        let water = ElementDef::from_raw_fields(&water_fields()).unwrap();
        let density = water.density().unwrap();
        assert_eq!(density.dimension(), Dimension::DENSITY);
        assert_relative_eq!(density.to("kg/m^3").unwrap().m(), 1000.0);

        // 0.609 W/(m K) / (4179 J/(kg K) * 1000 kg/m^3)
        let diffusivity = water.thermal_diffusivity().unwrap().unwrap();
        assert_eq!(diffusivity.unit().symbol(), "m^2/s");
        assert_relative_eq!(diffusivity.m(), 0.609 / (4179.0 * 1000.0), max_relative = 1e-12);
    }

    #[test]
    fn test_diffusivity_without_tile_mass() {
        let mut fields = water_fields();
        fields.remove("maxMass");
        let water = ElementDef::from_raw_fields(&fields).unwrap();
        assert!(water.density().is_none());
        let diffusivity = water.thermal_diffusivity().unwrap().unwrap();
        assert_relative_eq!(diffusivity.m(), 0.609 / 4179.0, max_relative = 1e-12);
    }

    #[test]
    fn test_diffusivity_undefined_for_zero_capacity() {
        let mut fields = water_fields();
        fields.insert("specificHeatCapacity".into(), json!(0));
        let vacuum = ElementDef::from_raw_fields(&fields).unwrap();
        assert_eq!(vacuum.thermal_diffusivity().unwrap(), None);
    }

    #[test]
    fn test_heat_energy() {
        let water = ElementDef::from_raw_fields(&water_fields()).unwrap();
        let delta = Quantity::new(10.0, "delta_degC").unwrap();
        let mass = Quantity::new(1.0, "kg").unwrap();

        let energy = water.heat_energy(&delta, &mass).unwrap();
        assert_relative_eq!(energy.to("kDTU").unwrap().m(), 41.79, max_relative = 1e-12);

        let back = water.temperature_change(&energy, &mass).unwrap();
        assert_relative_eq!(back.m(), 10.0, max_relative = 1e-12);

        let absolute = Quantity::new(10.0, "degC").unwrap();
        assert!(matches!(
            water.heat_energy(&absolute, &mass),
            Err(QuantityError::Dimensionality { .. })
        ));
        assert!(water.heat_energy(&absolute.to_delta(), &mass).is_ok());
    }
}
