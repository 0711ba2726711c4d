// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Type mapping from Hive column types to Arrow data types.

use std::sync::Arc;

use arrow_schema::{DataType, Field, IntervalUnit, Schema, SchemaRef, TimeUnit};

use crate::catalog_client::{CatalogError, CatalogResult, ColumnInfo};

/// Hive's precision and scale for a bare `decimal`.
const DEFAULT_DECIMAL: (u8, i8) = (10, 0);

/// Map a Hive type string to an Arrow `DataType`.
///
/// Case-insensitive. Parameterized types (`decimal(10,2)`, `varchar(64)`) are
/// accepted; complex types are represented as Utf8 for now.
pub fn hive_type_to_arrow(type_text: &str) -> CatalogResult<DataType> {
    let normalized = type_text.trim().to_lowercase();
    let (base, params) = split_type(&normalized);

    match base {
        "boolean" => Ok(DataType::Boolean),

        // Integer types
        "tinyint" => Ok(DataType::Int8),
        "smallint" => Ok(DataType::Int16),
        "int" | "integer" => Ok(DataType::Int32),
        "bigint" => Ok(DataType::Int64),

        // Floating-point types
        "float" => Ok(DataType::Float32),
        "double" | "double precision" => Ok(DataType::Float64),

        "decimal" | "numeric" => {
            let (precision, scale) = match params {
                Some(p) => parse_decimal_params(p, type_text)?,
                None => DEFAULT_DECIMAL,
            };
            Ok(DataType::Decimal128(precision, scale))
        }

        // String types
        "string" | "varchar" | "char" => Ok(DataType::Utf8),

        "binary" => Ok(DataType::Binary),

        // Date and time
        "date" => Ok(DataType::Date32),
        "timestamp" => Ok(DataType::Timestamp(TimeUnit::Nanosecond, None)),
        "timestamp with local time zone" | "timestamplocaltz" => {
            Ok(DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())))
        }
        "interval_year_month" | "interval year to month" => {
            Ok(DataType::Interval(IntervalUnit::YearMonth))
        }
        "interval_day_time" | "interval day to second" => {
            Ok(DataType::Interval(IntervalUnit::DayTime))
        }

        "void" => Ok(DataType::Null),

        // Complex types, represented as Utf8 (JSON string) for now.
        "array" | "map" | "struct" | "uniontype" => Ok(DataType::Utf8),

        _ => Err(CatalogError::TypeMappingError(format!(
            "Unsupported Hive type: '{}'",
            type_text
        ))),
    }
}

/// Split `decimal(10,2)` into `("decimal", Some("10,2"))` and `array<int>`
/// into `("array", Some("int"))`.
fn split_type(normalized: &str) -> (&str, Option<&str>) {
    match normalized.find(['(', '<']) {
        Some(idx) => {
            let base = normalized[..idx].trim();
            let rest = &normalized[idx + 1..];
            let params = rest.strip_suffix([')', '>']).unwrap_or(rest);
            (base, Some(params.trim()))
        }
        None => (normalized, None),
    }
}

fn parse_decimal_params(params: &str, type_text: &str) -> CatalogResult<(u8, i8)> {
    let invalid = || {
        CatalogError::TypeMappingError(format!("Invalid decimal type: '{}'", type_text))
    };
    let mut parts = params.split(',').map(str::trim);
    let precision = parts
        .next()
        .and_then(|p| p.parse::<u8>().ok())
        .ok_or_else(invalid)?;
    let scale = match parts.next() {
        Some(s) => s.parse::<i8>().map_err(|_| invalid())?,
        None => 0,
    };
    if parts.next().is_some() || precision == 0 || precision > 38 || scale < 0 || scale as u8 > precision {
        return Err(invalid());
    }
    Ok((precision, scale))
}

/// Build the Arrow schema of a Hive table.
///
/// Data columns are sorted by `position`; partition keys follow them in
/// declaration order, matching how Hive exposes partitioned tables. A column
/// whose type has no Arrow mapping is kept as Utf8 and logged.
pub fn table_to_arrow_schema(columns: &[ColumnInfo], partition_keys: &[ColumnInfo]) -> SchemaRef {
    let mut sorted: Vec<&ColumnInfo> = columns.iter().collect();
    sorted.sort_by_key(|c| c.position);

    let fields: Vec<Field> = sorted
        .into_iter()
        .chain(partition_keys.iter())
        .map(|col| {
            let data_type = hive_type_to_arrow(&col.type_text).unwrap_or_else(|err| {
                tracing::warn!(
                    column = %col.name,
                    type_text = %col.type_text,
                    error = %err,
                    "no Arrow mapping for column type, using Utf8"
                );
                DataType::Utf8
            });
            Field::new(&col.name, data_type, col.nullable)
        })
        .collect();

    Arc::new(Schema::new(fields))
}
