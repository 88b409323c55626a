//! In-memory tabular dataset read from CSV

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csvql_core::Value;

use crate::LoadError;

/// Storage type inferred for a dataset column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    /// `true`/`false` text, stored as 0/1 integers
    Boolean,
    Text,
}

impl ColumnType {
    /// SQL type used in the generated `CREATE TABLE`
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// Pick the narrowest type every non-empty field fits.
    ///
    /// A column with no non-empty fields is `Text`.
    fn infer<'a>(fields: impl Iterator<Item = &'a str> + Clone) -> Self {
        let mut present = fields.filter(|f| !f.is_empty()).peekable();
        if present.peek().is_none() {
            return ColumnType::Text;
        }

        if present.clone().all(|f| f.parse::<i64>().is_ok()) {
            ColumnType::Integer
        } else if present.clone().all(|f| f.parse::<f64>().is_ok()) {
            ColumnType::Real
        } else if present.all(|f| parse_bool(f).is_some()) {
            ColumnType::Boolean
        } else {
            ColumnType::Text
        }
    }

    /// Convert one field. Empty fields are NULL.
    fn convert(&self, raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }

        let value = match self {
            ColumnType::Integer => trimmed.parse::<i64>().ok().map(Value::Int64),
            ColumnType::Real => trimmed.parse::<f64>().ok().map(Value::Float64),
            ColumnType::Boolean => parse_bool(trimmed).map(|b| Value::Int64(b as i64)),
            ColumnType::Text => None,
        };
        value.unwrap_or_else(|| Value::String(raw.to_string()))
    }
}

fn parse_bool(field: &str) -> Option<bool> {
    if field.eq_ignore_ascii_case("true") {
        Some(true)
    } else if field.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// One named column of uniform type
#[derive(Debug, Clone)]
pub struct DatasetColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub values: Vec<Value>,
}

/// Ordered, equal-length columns
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<DatasetColumn>,
    row_count: usize,
}

impl Dataset {
    /// Read a CSV file with a header row
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_reader(file)?;
        tracing::debug!(
            columns = dataset.column_count(),
            rows = dataset.row_count(),
            "dataset read"
        );
        Ok(dataset)
    }

    /// Read CSV text with a header row from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        validate_headers(&headers)?;

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            if record.len() != headers.len() {
                return Err(LoadError::RowLength {
                    line: record.position().map(|p| p.line()).unwrap_or_default(),
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            for (column, field) in raw.iter_mut().zip(record.iter()) {
                column.push(field.to_string());
            }
        }

        let row_count = raw.first().map(Vec::len).unwrap_or(0);
        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, fields)| {
                let column_type = ColumnType::infer(fields.iter().map(|f| f.trim()));
                let values = fields.iter().map(|f| column_type.convert(f)).collect();
                DatasetColumn {
                    name,
                    column_type,
                    values,
                }
            })
            .collect();

        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[DatasetColumn] {
        &self.columns
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&DatasetColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Values of one row in column order
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index].clone()).collect())
    }
}

fn validate_headers(headers: &[String]) -> Result<(), LoadError> {
    if headers.is_empty() {
        return Err(LoadError::MissingHeader);
    }

    for (idx, name) in headers.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(LoadError::InvalidHeader(format!(
                "column {} has an empty name",
                idx + 1
            )));
        }
        if headers[..idx].iter().any(|prev| prev.eq_ignore_ascii_case(name)) {
            // SQLite column names are case-insensitive
            return Err(LoadError::InvalidHeader(format!(
                "duplicate column name '{}'",
                name
            )));
        }
    }

    Ok(())
}
