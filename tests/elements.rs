use approx::assert_relative_eq;
use regex::Regex;
use serde_json::json;

use oniref::loader::load_definitions;
use oniref::query::{optional, stable_over, ElementAttr, Predicate};
use oniref::{Attribute, ElementDef, Elements, LookupError, Quantity, QueryError, StringTable};

fn phase_cycle() -> Elements {
    let document = json!({
        "elements": [
            {
                "elementId": "Ice",
                "localizationID": "STRINGS.ELEMENTS.ICE.NAME",
                "state": "Solid",
                "specificHeatCapacity": 2.05,
                "thermalConductivity": 2.18,
                "molarMass": 18.01528,
                "radiationAbsorptionFactor": 0.8,
                "radiationPer1000Mass": 0,
                "maxMass": 1100,
                "highTemp": 273.15,
                "highTempTransitionTarget": "Water"
            },
            {
                "elementId": "Water",
                "localizationID": "STRINGS.ELEMENTS.WATER.NAME",
                "state": "Liquid",
                "specificHeatCapacity": 4.179,
                "thermalConductivity": 0.609,
                "molarMass": 18.01528,
                "radiationAbsorptionFactor": 0.8,
                "radiationPer1000Mass": 0,
                "maxMass": 1000,
                "lowTemp": 273.15,
                "lowTempTransitionTarget": "Ice",
                "highTemp": 373.15,
                "highTempTransitionTarget": "Steam"
            },
            {
                "elementId": "Steam",
                "localizationID": "STRINGS.ELEMENTS.STEAM.NAME",
                "state": "Gas",
                "specificHeatCapacity": 4.179,
                "thermalConductivity": 0.184,
                "molarMass": 18.01528,
                "radiationAbsorptionFactor": 0.1,
                "radiationPer1000Mass": 0,
                "lowTemp": 373.15,
                "lowTempTransitionTarget": "Water"
            }
        ]
    });
    let strings = StringTable::from_iter([
        ("STRINGS.ELEMENTS.ICE.NAME", "<link=\"ICE\">Ice</link>"),
        ("STRINGS.ELEMENTS.WATER.NAME", "<link=\"WATER\">Water</link>"),
        ("STRINGS.ELEMENTS.STEAM.NAME", "<link=\"STEAM\">Steam</link>"),
    ]);
    Elements::new(load_definitions(&document).unwrap(), &strings).unwrap()
}

fn names<'a>(found: impl IntoIterator<Item = &'a oniref::Element>) -> Vec<&'a str> {
    found.into_iter().map(|e| e.name.as_str()).collect()
}

fn celsius(t: f64) -> Quantity {
    Quantity::new(t, "degC").unwrap()
}

#[test]
fn test_find_substring_and_pattern() {
    let elements = phase_cycle();
    assert_eq!(names(elements.find("Wat").unwrap()), ["Water"]);

    let pattern = Regex::new("^Steam|Water|Ice$").unwrap();
    assert_eq!(names(elements.find(&pattern).unwrap()), ["Ice", "Water", "Steam"]);
}

#[test]
fn test_find_heavy_tiles() {
    let elements = phase_cycle();
    let mass = ElementAttr::mass_per_tile();
    let heavy = Predicate::from(mass.clone()) & mass.is_gt(Quantity::new(100.0, "kg").unwrap());
    assert_eq!(names(elements.find(&heavy).unwrap()), ["Ice", "Water"]);
}

#[test]
fn test_stable_liquid_range() {
    let elements = phase_cycle();
    let found = elements.find(&stable_over(&celsius(10.0), &celsius(90.0))).unwrap();
    assert_eq!(names(found), ["Water"]);
}

#[test]
fn test_required_chain_fails_where_optional_yields_none() {
    let elements = phase_cycle();
    let steam = elements.lookup("Steam").unwrap();

    let required = ElementAttr::high_transition().field("temperature");
    assert!(matches!(
        required.evaluate(&elements, steam),
        Err(QueryError::MissingValue { path }) if path == "high_transition.temperature"
    ));

    let lenient = optional(&ElementAttr::high_transition()).field("temperature");
    assert!(lenient.evaluate(&elements, steam).unwrap().is_none());
}

#[test]
fn test_unit_conversion_in_chain() {
    let elements = phase_cycle();
    let water = elements.lookup("Water").unwrap();
    let ounces = ElementAttr::molar_mass().to("ounce/mol").m();
    let value = ounces.evaluate(&elements, water).unwrap();
    assert_relative_eq!(value.as_number().unwrap(), 18.01528 / 28.349523125, max_relative = 1e-9);
}

#[test]
fn test_transition_target_chain() {
    let elements = phase_cycle();
    let ice = elements.lookup("Ice").unwrap();
    let melts_into = ElementAttr::high_transition().field("target").field("pretty_name");
    let value = melts_into.evaluate(&elements, ice).unwrap();
    assert_eq!(value.as_text(), Some("Water"));
}

#[test]
fn test_custom_predicate_and_attribute() {
    let elements = phase_cycle();
    let short_name = Predicate::new("short name", |e| e.name.len() <= 5);
    assert_eq!(names(elements.find(&short_name).unwrap()), ["Ice", "Water", "Steam"]);

    let name_len = Attribute::new("name_len", |_, e| Ok(oniref::Value::Number(e.name.len() as f64)));
    let sorted = elements.sorted_by(&elements, &name_len).unwrap();
    assert_eq!(sorted[0].name, "Ice");
}

#[test]
fn test_lookup_errors() {
    let elements = phase_cycle();
    assert!(matches!(elements.lookup("Magma"), Err(LookupError::UnknownElement(_))));
    assert!(matches!(
        elements.lookup(3usize),
        Err(LookupError::IndexOutOfRange { index: 3, len: 3 })
    ));
}

#[test]
fn test_raw_fields_round_trip() {
    let elements = phase_cycle();
    let document = json!({"elements": [{
        "elementId": "Water",
        "localizationID": "STRINGS.ELEMENTS.WATER.NAME",
        "state": "Liquid",
        "specificHeatCapacity": 4.179,
        "thermalConductivity": 0.609,
        "molarMass": 18.01528,
        "radiationAbsorptionFactor": 0.8,
        "radiationPer1000Mass": 0,
        "maxMass": 1000,
        "lowTemp": 273.15,
        "lowTempTransitionTarget": "Ice",
        "highTemp": 373.15,
        "highTempTransitionTarget": "Steam"
    }]});
    let def = load_definitions(&document).unwrap().remove(0);
    let again = ElementDef::from_raw_fields(&def.to_raw_fields().unwrap()).unwrap();

    assert_eq!(again, def);
    assert_eq!(again.low_transition, def.low_transition);
    assert_relative_eq!(
        again.high_transition.as_ref().unwrap().temperature.to("K").unwrap().m(),
        373.15,
        max_relative = 1e-12
    );
    // definitions compare equal to their resolved counterpart by name
    assert!(def == elements["Water"]);
}
