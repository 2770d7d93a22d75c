//! Tabular element reports

use std::fmt;

use crate::element::Element;
use crate::elements::Elements;
use crate::error::QueryError;
use crate::query::{optional, predicates, Attribute, ElementAttr, Value};

/// One report column: a header and the attribute it shows.
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub attribute: Attribute,
    /// Decimal places for numeric cells.
    pub precision: Option<usize>,
}

impl Column {
    pub fn new(header: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            header: header.into(),
            attribute,
            precision: None,
        }
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }
}

/// Name, heat capacity, conductivity, diffusivity, molar mass and transition temperatures.
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::new("Name", ElementAttr::pretty_name()),
        Column::new("SHC (DTU/g/°C)", ElementAttr::specific_heat_capacity().to("DTU/g/°C").m()).with_precision(3),
        Column::new("TC (DTU/(m*s)/°C)", ElementAttr::thermal_conductivity().to("DTU/(m*s)/°C").m()).with_precision(3),
        Column::new("TD (mm^2/s)", optional(&ElementAttr::thermal_diffusivity()).to("mm^2/s").m()).with_precision(3),
        Column::new("MM (g/mol)", ElementAttr::molar_mass().to("g/mol").m()).with_precision(3),
        Column::new("TLow (°C)", predicates::low_temp().to("°C").m()).with_precision(1),
        Column::new("THigh (°C)", predicates::high_temp().to("°C").m()).with_precision(1),
    ]
}

/// Evaluated cells, ready for printing.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain([h.chars().count()])
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

/// Evaluate `columns` for each element of `selection`.
pub fn build_report<'a>(
    elements: &'a Elements,
    selection: impl IntoIterator<Item = &'a Element>,
    columns: &[Column],
) -> Result<Report, QueryError> {
    let mut rows = Vec::new();
    for element in selection {
        let mut row = Vec::with_capacity(columns.len());
        for column in columns {
            let value = column.attribute.evaluate(elements, element)?;
            row.push(cell(&value, column.precision));
        }
        rows.push(row);
    }
    Ok(Report {
        headers: columns.iter().map(|c| c.header.clone()).collect(),
        rows,
    })
}

fn cell(value: &Value<'_>, precision: Option<usize>) -> String {
    match (value, precision) {
        (Value::None, _) => String::new(),
        (_, Some(p)) => format!("{value:.p$}"),
        (_, None) => value.to_string(),
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();

        // first column left-aligned, the rest right-aligned
        let line = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            for (i, (text, &width)) in cells.iter().zip(&widths).enumerate() {
                if i == 0 {
                    write!(f, "{text:<width$}")?;
                } else {
                    write!(f, "  {text:>width$}")?;
                }
            }
            writeln!(f)
        };

        line(f, &self.headers)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        line(f, &rule)?;
        for row in &self.rows {
            line(f, row)?;
        }
        Ok(())
    }
}
