//! Typed tables handed to the loader

use crate::model::value::text;
use crate::model::{DimCustomer, DimDate, DimProduct, Dimension, FactSales, StarSchema};
use chrono::NaiveDate;
use serde_json::Value;

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Date,
    Text,
}

impl ColumnKind {
    /// Narrowest kind holding every non-null value
    ///
    /// Integers widen to floats; any other mix falls back to text, as does
    /// a column with no values at all.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        values
            .into_iter()
            .filter_map(Self::of)
            .reduce(|acc, kind| match (acc, kind) {
                (a, b) if a == b => a,
                (Self::Integer, Self::Float) | (Self::Float, Self::Integer) => Self::Float,
                _ => Self::Text,
            })
            .unwrap_or(Self::Text)
    }

    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(n) if n.is_i64() => Some(Self::Integer),
            Value::Number(_) => Some(Self::Float),
            _ => Some(Self::Text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    Text(String),
}

impl CellValue {
    /// Convert a master-data value into a cell of the given kind
    pub fn from_json(value: &Value, kind: ColumnKind) -> Self {
        let cell = match kind {
            ColumnKind::Integer => value.as_i64().map(Self::Integer),
            ColumnKind::Float => value.as_f64().map(Self::Float),
            ColumnKind::Boolean => value.as_bool().map(Self::Boolean),
            ColumnKind::Date | ColumnKind::Text => text(value).map(Self::Text),
        };
        cell.unwrap_or(Self::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map(Self::Text).unwrap_or(Self::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Named, typed columns plus rows of cells in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; it must have one cell per column
    pub fn push(&mut self, row: Vec<CellValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// All cells of one column, top to bottom
    pub fn column_values(&self, name: &str) -> Option<Vec<&CellValue>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[index]).collect())
    }
}

/// Conversion of a transform output into a loadable table
pub trait IntoTable {
    fn into_table(self) -> Table;
}

impl IntoTable for Vec<DimDate> {
    fn into_table(self) -> Table {
        let mut table = Table::new(vec![
            Column::new("date_key", ColumnKind::Integer),
            Column::new("full_date", ColumnKind::Date),
            Column::new("year", ColumnKind::Integer),
            Column::new("month", ColumnKind::Integer),
            Column::new("day", ColumnKind::Integer),
            Column::new("quarter", ColumnKind::Integer),
            Column::new("weekday", ColumnKind::Text),
        ]);
        for row in self {
            table.push(vec![
                CellValue::Integer(row.date_key),
                CellValue::Date(row.full_date),
                CellValue::Integer(row.year.into()),
                CellValue::Integer(row.month.into()),
                CellValue::Integer(row.day.into()),
                CellValue::Integer(row.quarter.into()),
                CellValue::Text(row.weekday),
            ]);
        }
        table
    }
}

impl IntoTable for Dimension<DimCustomer> {
    fn into_table(self) -> Table {
        let kinds = attribute_kinds(
            &self.attribute_columns,
            self.rows.iter().map(|r| &r.attributes),
        );
        let mut columns = vec![
            Column::new("customer_key", ColumnKind::Integer),
            Column::new("Country", ColumnKind::Text),
        ];
        columns.extend(attribute_columns(&self.attribute_columns, &kinds));

        let mut table = Table::new(columns);
        for row in self.rows {
            let mut cells = vec![CellValue::Integer(row.customer_key), row.country.into()];
            cells.extend(attribute_cells(&row.attributes, &kinds));
            table.push(cells);
        }
        table
    }
}

impl IntoTable for Dimension<DimProduct> {
    fn into_table(self) -> Table {
        let kinds = attribute_kinds(
            &self.attribute_columns,
            self.rows.iter().map(|r| &r.attributes),
        );
        let mut columns = vec![
            Column::new("product_key", ColumnKind::Text),
            Column::new("Description", ColumnKind::Text),
            Column::new("Category", ColumnKind::Text),
            Column::new("Brand", ColumnKind::Text),
        ];
        columns.extend(attribute_columns(&self.attribute_columns, &kinds));

        let mut table = Table::new(columns);
        for row in self.rows {
            let mut cells = vec![
                CellValue::Text(row.product_key),
                CellValue::Text(row.description),
                CellValue::Text(row.category),
                CellValue::Text(row.brand),
            ];
            cells.extend(attribute_cells(&row.attributes, &kinds));
            table.push(cells);
        }
        table
    }
}

impl IntoTable for Vec<FactSales> {
    fn into_table(self) -> Table {
        let mut table = Table::new(vec![
            Column::new("InvoiceNo", ColumnKind::Text),
            Column::new("date_key", ColumnKind::Integer),
            Column::new("customer_key", ColumnKind::Integer),
            Column::new("product_key", ColumnKind::Text),
            Column::new("Quantity", ColumnKind::Integer),
            Column::new("UnitPrice", ColumnKind::Float),
            Column::new("Revenue", ColumnKind::Float),
        ]);
        for row in self {
            table.push(vec![
                row.invoice_no.into(),
                CellValue::Integer(row.date_key),
                CellValue::Integer(row.customer_key),
                CellValue::Text(row.product_key),
                CellValue::Integer(row.quantity),
                CellValue::Float(row.unit_price),
                CellValue::Float(row.revenue),
            ]);
        }
        table
    }
}

impl StarSchema {
    /// The four tables in load order: DimDate, DimCustomer, DimProduct, FactSales
    pub fn into_tables(self) -> [Table; 4] {
        [
            self.dim_date.into_table(),
            self.dim_customer.into_table(),
            self.dim_product.into_table(),
            self.fact_sales.into_table(),
        ]
    }
}

fn attribute_kinds<'a>(
    names: &[String],
    rows: impl Iterator<Item = &'a Vec<Value>> + Clone,
) -> Vec<ColumnKind> {
    (0..names.len())
        .map(|i| ColumnKind::infer(rows.clone().filter_map(|r| r.get(i))))
        .collect()
}

fn attribute_columns(names: &[String], kinds: &[ColumnKind]) -> Vec<Column> {
    names
        .iter()
        .zip(kinds)
        .map(|(name, kind)| Column::new(name.clone(), *kind))
        .collect()
}

fn attribute_cells(values: &[Value], kinds: &[ColumnKind]) -> Vec<CellValue> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            values
                .get(i)
                .map(|v| CellValue::from_json(v, *kind))
                .unwrap_or(CellValue::Null)
        })
        .collect()
}
