#![forbid(unsafe_code)]
//! Edge-type schemas and the catalog that serves them.
//!
//! Seg files are not self-describing: column count, column types, and
//! therefore value widths come from here.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{OccamyError, Result, TypeId};

/// Storage type of one column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// One byte, zero is false.
    Bool,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Vertex id (u64).
    Vertex,
    /// UTF-8 string, variable width.
    Str,
    /// Opaque bytes, variable width.
    Bytes,
}

/// How values of a column are laid out in the value array.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnWidth {
    /// Every row occupies exactly this many bytes.
    Fixed(usize),
    /// Rows are addressed through an external offset table.
    Variable,
}

impl ColumnType {
    /// Value-array layout for this type.
    pub const fn width(self) -> ColumnWidth {
        match self {
            ColumnType::Bool => ColumnWidth::Fixed(1),
            ColumnType::I32 | ColumnType::U32 | ColumnType::F32 => ColumnWidth::Fixed(4),
            ColumnType::I64 | ColumnType::U64 | ColumnType::F64 | ColumnType::Vertex => {
                ColumnWidth::Fixed(8)
            }
            ColumnType::Str | ColumnType::Bytes => ColumnWidth::Variable,
        }
    }

    /// Short lowercase name, matching the catalog file spelling.
    pub const fn name(self) -> &'static str {
        match self {
            ColumnType::Bool => "bool",
            ColumnType::I32 => "i32",
            ColumnType::I64 => "i64",
            ColumnType::U32 => "u32",
            ColumnType::U64 => "u64",
            ColumnType::F32 => "f32",
            ColumnType::F64 => "f64",
            ColumnType::Vertex => "vertex",
            ColumnType::Str => "str",
            ColumnType::Bytes => "bytes",
        }
    }
}

/// One column of an edge schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name, unique within its schema.
    pub name: String,
    /// Storage type.
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

impl ColumnDef {
    /// Creates a column definition.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Column layout of one edge type. Column ordinals are positions in `columns`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSchema {
    /// Edge type this schema describes.
    #[serde(rename = "id")]
    pub edge_type: TypeId,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<ColumnDef>,
}

impl EdgeSchema {
    /// Builds and validates a schema.
    pub fn new(edge_type: TypeId, name: impl Into<String>, columns: Vec<ColumnDef>) -> Result<Self> {
        let schema = Self {
            edge_type,
            name: name.into(),
            columns,
        };
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(OccamyError::Invalid("edge schema has no columns"));
        }
        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(OccamyError::Config(format!(
                    "edge type {} declares column '{}' twice",
                    self.edge_type, column.name
                )));
            }
        }
        Ok(())
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column definition at `ordinal`.
    pub fn column(&self, ordinal: usize) -> Result<&ColumnDef> {
        self.columns
            .get(ordinal)
            .ok_or_else(|| OccamyError::out_of_range(ordinal, self.columns.len()))
    }

    /// Ordinal of the column called `name`.
    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Source of edge schemas, keyed by edge type.
pub trait SchemaCatalog: Send + Sync {
    /// Returns the schema for `edge_type`.
    fn edge_schema(&self, edge_type: TypeId) -> Result<Arc<EdgeSchema>>;
}

/// In-memory catalog, optionally loaded from a TOML file.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    schemas: HashMap<TypeId, Arc<EdgeSchema>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CatalogFile {
    #[serde(default, rename = "edge_type")]
    edge_types: Vec<EdgeSchema>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema; each edge type may be registered once.
    pub fn register(&mut self, schema: EdgeSchema) -> Result<Arc<EdgeSchema>> {
        schema.validate()?;
        if self.schemas.contains_key(&schema.edge_type) {
            return Err(OccamyError::Config(format!(
                "edge type {} registered twice",
                schema.edge_type
            )));
        }
        debug!(
            edge_type = schema.edge_type.0,
            columns = schema.columns.len(),
            "catalog.register"
        );
        let schema = Arc::new(schema);
        self.schemas.insert(schema.edge_type, Arc::clone(&schema));
        Ok(schema)
    }

    /// Parses the TOML catalog form.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(text).map_err(|err| OccamyError::Config(err.to_string()))?;
        let mut catalog = Self::new();
        for schema in file.edge_types {
            catalog.register(schema)?;
        }
        Ok(catalog)
    }

    /// Reads and parses a TOML catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serializes the catalog back to TOML, ordered by edge type.
    pub fn to_toml_string(&self) -> Result<String> {
        let mut edge_types: Vec<EdgeSchema> =
            self.schemas.values().map(|s| EdgeSchema::clone(s)).collect();
        edge_types.sort_by_key(|s| s.edge_type);
        toml::to_string_pretty(&CatalogFile { edge_types })
            .map_err(|err| OccamyError::Config(err.to_string()))
    }

    /// Number of registered edge types.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaCatalog for MemoryCatalog {
    fn edge_schema(&self, edge_type: TypeId) -> Result<Arc<EdgeSchema>> {
        self.schemas
            .get(&edge_type)
            .cloned()
            .ok_or(OccamyError::NotFound("edge schema"))
    }
}
