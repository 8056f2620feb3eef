//! Storage type tags and the semantic → storage type mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of storage representations for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Integer,
    /// Double-precision float
    Double,
    /// Single-precision float
    Real,
    Text,
    Boolean,
    Date,
    Time,
    Timestamp,
    Interval,
}

impl StorageType {
    pub const ALL: [StorageType; 9] = [
        StorageType::Integer,
        StorageType::Double,
        StorageType::Real,
        StorageType::Text,
        StorageType::Boolean,
        StorageType::Date,
        StorageType::Time,
        StorageType::Timestamp,
        StorageType::Interval,
    ];

    /// Stable name persisted in the column catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Integer => "integer",
            StorageType::Double => "double precision",
            StorageType::Real => "real",
            StorageType::Text => "text",
            StorageType::Boolean => "boolean",
            StorageType::Date => "date",
            StorageType::Time => "time",
            StorageType::Timestamp => "timestamp",
            StorageType::Interval => "interval",
        }
    }

    /// Inverse of [`StorageType::as_str`]
    pub fn parse(name: &str) -> Option<StorageType> {
        StorageType::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a snapshot column as reported by the producing program
///
/// Names follow the dtype vocabulary of dataframe libraries; anything not
/// recognised is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Float32,
    Float64,
    Str,
    Object,
    Categorical,
    Bool,
    Date,
    Time,
    DateTime,
    DateTime64,
    Timedelta64,
    Other(String),
}

impl SemanticType {
    /// Resolve to the canonical storage type
    ///
    /// Total: every type without a dedicated mapping is stored as text.
    pub fn storage_type(&self) -> StorageType {
        match self {
            SemanticType::Int
            | SemanticType::Int8
            | SemanticType::Int16
            | SemanticType::Int32
            | SemanticType::Int64
            | SemanticType::UInt8
            | SemanticType::UInt16
            | SemanticType::UInt32 => StorageType::Integer,
            SemanticType::Float | SemanticType::Float64 => StorageType::Double,
            SemanticType::Float32 => StorageType::Real,
            SemanticType::Bool => StorageType::Boolean,
            SemanticType::Date => StorageType::Date,
            SemanticType::Time => StorageType::Time,
            SemanticType::DateTime | SemanticType::DateTime64 => StorageType::Timestamp,
            SemanticType::Timedelta64 => StorageType::Interval,
            SemanticType::UInt64
            | SemanticType::Str
            | SemanticType::Object
            | SemanticType::Categorical
            | SemanticType::Other(_) => StorageType::Text,
        }
    }
}

impl From<&str> for SemanticType {
    /// Parse a dtype name such as `"int64"`, `"float32"` or `"datetime64[ns]"`
    fn from(name: &str) -> Self {
        let lowered = name.trim().to_ascii_lowercase();
        // datetime64[ns], datetime64[ns, UTC], timedelta64[ns]
        let base = lowered.split('[').next().unwrap_or_default();
        match base {
            "int" => SemanticType::Int,
            "int8" => SemanticType::Int8,
            "int16" => SemanticType::Int16,
            "int32" => SemanticType::Int32,
            "int64" => SemanticType::Int64,
            "uint8" => SemanticType::UInt8,
            "uint16" => SemanticType::UInt16,
            "uint32" => SemanticType::UInt32,
            "uint64" => SemanticType::UInt64,
            "float" => SemanticType::Float,
            "float32" => SemanticType::Float32,
            "float64" => SemanticType::Float64,
            "str" | "string" => SemanticType::Str,
            "object" => SemanticType::Object,
            "category" | "categorical" => SemanticType::Categorical,
            "bool" | "boolean" => SemanticType::Bool,
            "date" => SemanticType::Date,
            "time" => SemanticType::Time,
            "datetime" => SemanticType::DateTime,
            "datetime64" => SemanticType::DateTime64,
            "timedelta64" | "timedelta" => SemanticType::Timedelta64,
            _ => SemanticType::Other(name.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_family_maps_to_integer() {
        for t in [
            SemanticType::Int,
            SemanticType::Int8,
            SemanticType::Int64,
            SemanticType::UInt32,
        ] {
            assert_eq!(t.storage_type(), StorageType::Integer);
        }
    }

    #[test]
    fn test_float_widths_stay_distinct() {
        assert_eq!(SemanticType::Float64.storage_type(), StorageType::Double);
        assert_eq!(SemanticType::Float.storage_type(), StorageType::Double);
        assert_eq!(SemanticType::Float32.storage_type(), StorageType::Real);
    }

    #[test]
    fn test_unmapped_types_fall_back_to_text() {
        assert_eq!(SemanticType::UInt64.storage_type(), StorageType::Text);
        assert_eq!(
            SemanticType::Other("complex128".into()).storage_type(),
            StorageType::Text
        );
        assert_eq!(SemanticType::Categorical.storage_type(), StorageType::Text);
    }

    #[test]
    fn test_dtype_names_parse() {
        assert_eq!(SemanticType::from("int64"), SemanticType::Int64);
        assert_eq!(SemanticType::from("Float32"), SemanticType::Float32);
        assert_eq!(
            SemanticType::from("datetime64[ns]"),
            SemanticType::DateTime64
        );
        assert_eq!(
            SemanticType::from("timedelta64[ns]"),
            SemanticType::Timedelta64
        );
        assert_eq!(
            SemanticType::from("complex64"),
            SemanticType::Other("complex64".into())
        );
    }

    #[test]
    fn test_storage_names_round_trip() {
        for t in StorageType::ALL {
            assert_eq!(StorageType::parse(t.as_str()), Some(t));
        }
        assert_eq!(StorageType::parse("varchar"), None);
    }
}
