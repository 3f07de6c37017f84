//! Entity mapping: which table or view backs each record type.
//!
//! A [`Model`] is built once with [`ModelBuilder`] and consulted by the
//! session layer before every write. Tables carry their column definitions so
//! the schema can be created from the model; views carry only their name and
//! are created separately from literal SQL.

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Associates a record type with its entity name in a [`Model`]
pub trait Mapped {
    const ENTITY: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub references: Option<&'static str>,
}

impl ColumnDef {
    fn definition(&self) -> String {
        let mut sql = format!("\"{}\" {}", self.name, self.column_type.sql());
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.primary_key {
            sql.push_str(" PRIMARY KEY AUTOINCREMENT");
        }
        if let Some(table) = self.references {
            sql.push_str(&format!(" REFERENCES \"{}\"", table));
        }
        sql
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// `CREATE TABLE` statement for this table
    pub fn create_statement(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.definition()))
            .collect();

        format!("CREATE TABLE \"{}\" (\n{}\n)", self.name, columns.join(",\n"))
    }

    pub fn key_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDef {
    pub name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backing {
    Table(TableDef),
    View(ViewDef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapping {
    pub entity: &'static str,
    pub backing: Backing,
}

impl EntityMapping {
    /// Name of the backing table or view
    pub fn object_name(&self) -> &'static str {
        match &self.backing {
            Backing::Table(table) => table.name,
            Backing::View(view) => view.name,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.backing, Backing::View(_))
    }

    pub fn as_table(&self) -> Option<&TableDef> {
        match &self.backing {
            Backing::Table(table) => Some(table),
            Backing::View(_) => None,
        }
    }
}

/// Collects the columns of one table mapping
#[derive(Debug, Default)]
pub struct TableBuilder {
    columns: Vec<ColumnDef>,
}

impl TableBuilder {
    /// Generated integer primary key
    pub fn key(self, name: &'static str) -> Self {
        self.push(name, ColumnType::Integer, false, true, None)
    }

    pub fn column(self, name: &'static str, column_type: ColumnType) -> Self {
        self.push(name, column_type, false, false, None)
    }

    pub fn optional(self, name: &'static str, column_type: ColumnType) -> Self {
        self.push(name, column_type, true, false, None)
    }

    /// Required integer foreign key to `table`'s primary key
    pub fn references(self, name: &'static str, table: &'static str) -> Self {
        self.push(name, ColumnType::Integer, false, false, Some(table))
    }

    fn push(
        mut self,
        name: &'static str,
        column_type: ColumnType,
        nullable: bool,
        primary_key: bool,
        references: Option<&'static str>,
    ) -> Self {
        self.columns.push(ColumnDef {
            name,
            column_type,
            nullable,
            primary_key,
            references,
        });
        self
    }
}

/// Declarative builder for a [`Model`]
///
/// # Example
/// ```ignore
/// let model = Model::builder()
///     .table::<Customer>("Customer", |t| t.key("Id").column("Name", ColumnType::Text))
///     .view::<OrderView>("OrderSummary")
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct ModelBuilder {
    mappings: Vec<EntityMapping>,
}

impl ModelBuilder {
    pub fn table<T: Mapped>(
        mut self,
        name: &'static str,
        columns: impl FnOnce(TableBuilder) -> TableBuilder,
    ) -> Self {
        let table = TableDef {
            name,
            columns: columns(TableBuilder::default()).columns,
        };
        self.mappings.push(EntityMapping {
            entity: T::ENTITY,
            backing: Backing::Table(table),
        });
        self
    }

    pub fn view<T: Mapped>(mut self, name: &'static str) -> Self {
        self.mappings.push(EntityMapping {
            entity: T::ENTITY,
            backing: Backing::View(ViewDef { name }),
        });
        self
    }

    /// Build the model, rejecting duplicate entities and duplicate object names
    pub fn build(self) -> Result<Model> {
        let mut mappings = IndexMap::with_capacity(self.mappings.len());

        for mapping in self.mappings {
            let object = mapping.object_name();
            let clash = mappings
                .values()
                .any(|m: &EntityMapping| m.object_name().eq_ignore_ascii_case(object));
            if clash {
                return Err(Error::DuplicateMapping(object));
            }
            if mappings.contains_key(mapping.entity) {
                return Err(Error::DuplicateMapping(mapping.entity));
            }
            mappings.insert(mapping.entity, mapping);
        }

        Ok(Model { mappings })
    }
}

/// The mapping table, in declaration order
#[derive(Debug, Clone)]
pub struct Model {
    mappings: IndexMap<&'static str, EntityMapping>,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    pub fn mapping(&self, entity: &str) -> Option<&EntityMapping> {
        self.mappings.get(entity)
    }

    pub fn mapping_for<T: Mapped>(&self) -> Result<&EntityMapping> {
        self.mapping(T::ENTITY)
            .ok_or_else(|| Error::UnmappedEntity(T::ENTITY.to_string()))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.mappings.values().filter_map(EntityMapping::as_table)
    }

    pub fn views(&self) -> impl Iterator<Item = &ViewDef> {
        self.mappings.values().filter_map(|m| match &m.backing {
            Backing::View(view) => Some(view),
            Backing::Table(_) => None,
        })
    }

    /// Table backing `entity`, or an error if it is unmapped or view-backed
    pub fn ensure_writable(&self, entity: &str) -> Result<&TableDef> {
        let mapping = self
            .mapping(entity)
            .ok_or_else(|| Error::UnmappedEntity(entity.to_string()))?;

        match &mapping.backing {
            Backing::Table(table) => Ok(table),
            Backing::View(view) => Err(Error::ReadOnlyEntity {
                entity: mapping.entity,
                view: view.name,
            }),
        }
    }

    /// `CREATE TABLE` statements for every table mapping, in declaration order
    pub fn create_table_statements(&self) -> Vec<String> {
        self.tables().map(TableDef::create_statement).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tag;
    impl Mapped for Tag {
        const ENTITY: &'static str = "Tag";
    }

    struct TagView;
    impl Mapped for TagView {
        const ENTITY: &'static str = "TagView";
    }

    fn tag_model() -> Model {
        Model::builder()
            .table::<Tag>("Tags", |t| {
                t.key("Id")
                    .column("Label", ColumnType::Text)
                    .optional("Note", ColumnType::Text)
            })
            .view::<TagView>("TagSummary")
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_statement() {
        let model = tag_model();

        assert_eq!(
            model.create_table_statements(),
            vec![
                "CREATE TABLE \"Tags\" (\n    \"Id\" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,\n    \"Label\" TEXT NOT NULL,\n    \"Note\" TEXT\n)"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_views_are_read_only() {
        let model = tag_model();

        let mapping = model.mapping_for::<TagView>().unwrap();
        assert!(mapping.is_read_only());
        assert_eq!(mapping.object_name(), "TagSummary");

        let result = model.ensure_writable("TagView");
        assert!(matches!(
            result,
            Err(Error::ReadOnlyEntity { entity: "TagView", view: "TagSummary" })
        ));
    }

    #[test]
    fn test_tables_are_writable() {
        let model = tag_model();

        let table = model.ensure_writable("Tag").unwrap();
        assert_eq!(table.name, "Tags");
        assert_eq!(table.key_column().map(|c| c.name), Some("Id"));
    }

    #[test]
    fn test_unmapped_entity() {
        let model = tag_model();

        assert!(model.mapping("Nope").is_none());
        assert!(matches!(
            model.ensure_writable("Nope"),
            Err(Error::UnmappedEntity(name)) if name == "Nope"
        ));
    }

    #[test]
    fn test_duplicate_object_name_rejected() {
        let result = Model::builder()
            .table::<Tag>("Tags", |t| t.key("Id"))
            .view::<TagView>("tags")
            .build();

        assert!(matches!(result, Err(Error::DuplicateMapping("tags"))));
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let result = Model::builder()
            .table::<Tag>("Tags", |t| t.key("Id"))
            .view::<Tag>("TagSummary")
            .build();

        assert!(matches!(result, Err(Error::DuplicateMapping("Tag"))));
    }

    #[test]
    fn test_foreign_key_column() {
        let model = Model::builder()
            .table::<Tag>("Tags", |t| t.key("Id").references("OwnerId", "Owner"))
            .build()
            .unwrap();

        let statement = &model.create_table_statements()[0];
        assert!(statement.contains("\"OwnerId\" INTEGER NOT NULL REFERENCES \"Owner\""));
    }
}
