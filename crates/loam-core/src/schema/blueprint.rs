//! Ordered description of a table change, fed to a schema grammar.

use super::column::{ColumnDefinition, ColumnType, IndexKind};

/// An index command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCommand {
    /// Index kind.
    pub kind: IndexKind,
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Index algorithm (`btree`, `hash`, `gin`, …).
    pub algorithm: Option<String>,
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Constraint name; generated when left empty.
    pub name: Option<String>,
    /// Local columns.
    pub columns: Vec<String>,
    /// Referenced columns.
    pub references: Vec<String>,
    /// Referenced table.
    pub on: String,
    /// `on delete` action.
    pub on_delete: Option<String>,
    /// `on update` action.
    pub on_update: Option<String>,
}

impl ForeignKey {
    /// Starts a foreign key on local `columns`.
    #[must_use]
    pub fn new<C, I>(columns: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            references: vec![String::from("id")],
            on: String::new(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Referenced columns.
    #[must_use]
    pub fn references<C, I>(mut self, columns: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        self.references = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Referenced table.
    #[must_use]
    pub fn on(mut self, table: &str) -> Self {
        self.on = table.to_string();
        self
    }

    /// `on delete` action.
    #[must_use]
    pub fn on_delete(mut self, action: &str) -> Self {
        self.on_delete = Some(action.to_string());
        self
    }

    /// `on update` action.
    #[must_use]
    pub fn on_update(mut self, action: &str) -> Self {
        self.on_update = Some(action.to_string());
        self
    }

    /// `on delete cascade`.
    #[must_use]
    pub fn cascade_on_delete(self) -> Self {
        self.on_delete("cascade")
    }

    /// Explicit constraint name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// One schema command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the table.
    Create,
    /// Add the blueprint's columns to an existing table.
    Add,
    /// Drop the table.
    Drop,
    /// Drop the table if it exists.
    DropIfExists,
    /// Rename the table.
    Rename(String),
    /// Drop columns.
    DropColumn(Vec<String>),
    /// Rename a column.
    RenameColumn {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// Create an index.
    Index(IndexCommand),
    /// Add a foreign key.
    Foreign(ForeignKey),
    /// Drop the primary key.
    DropPrimary(String),
    /// Drop a unique index.
    DropUnique(String),
    /// Drop a plain index.
    DropIndex(String),
    /// Drop a full text index.
    DropFulltext(String),
    /// Drop a spatial index.
    DropSpatialIndex(String),
    /// Drop a foreign key.
    DropForeign(String),
    /// Rename an index.
    RenameIndex {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
}

/// Columns and commands describing one table change.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    /// Table name, without prefix.
    pub table: String,
    /// Table prefix, also used in generated index names.
    pub prefix: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDefinition>,
    /// Commands in declaration order.
    pub commands: Vec<Command>,
    /// `create temporary table`.
    pub temporary: bool,
    /// Storage engine (MySQL).
    pub engine: Option<String>,
    /// Default character set (MySQL).
    pub charset: Option<String>,
    /// Default collation (MySQL).
    pub collation: Option<String>,
}

impl Blueprint {
    /// Creates an empty blueprint for `table`.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self::with_prefix(table, "")
    }

    /// Creates an empty blueprint for a prefixed table.
    #[must_use]
    pub fn with_prefix(table: &str, prefix: &str) -> Self {
        Self {
            table: table.to_string(),
            prefix: prefix.to_string(),
            columns: Vec::new(),
            commands: Vec::new(),
            temporary: false,
            engine: None,
            charset: None,
            collation: None,
        }
    }

    /// True when the blueprint creates its table.
    #[must_use]
    pub fn creating(&self) -> bool {
        self.commands.contains(&Command::Create)
    }

    /// Commands to compile: an implied `Add` first when columns are added
    /// to an existing table, then declared commands, then indexes
    /// requested through column modifiers.
    #[must_use]
    pub fn to_commands(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.commands.len() + 1);
        if !self.columns.is_empty() && !self.creating() {
            commands.push(Command::Add);
        }
        commands.extend(self.commands.iter().cloned());
        for column in &self.columns {
            for (kind, name) in &column.indexes {
                let columns = vec![column.name.clone()];
                commands.push(Command::Index(IndexCommand {
                    kind: *kind,
                    name: name
                        .clone()
                        .unwrap_or_else(|| self.index_name(*kind, &columns)),
                    columns,
                    algorithm: None,
                }));
            }
        }
        commands
    }

    /// Generated index name: `prefix_table_col1_col2_kind`, lowercased.
    #[must_use]
    pub fn index_name(&self, kind: IndexKind, columns: &[String]) -> String {
        self.generated_name(columns, kind.name_suffix())
    }

    fn generated_name(&self, columns: &[String], suffix: &str) -> String {
        format!(
            "{}{}_{}_{suffix}",
            self.prefix,
            self.table,
            columns.join("_")
        )
        .replace(['-', '.'], "_")
        .to_lowercase()
    }

    /// Name of the foreign key constraint, generated when not given.
    #[must_use]
    pub fn foreign_key_name(&self, foreign: &ForeignKey) -> String {
        foreign
            .name
            .clone()
            .unwrap_or_else(|| self.generated_name(&foreign.columns, "foreign"))
    }

    /// Creates the table.
    pub fn create(&mut self) -> &mut Self {
        self.commands.push(Command::Create);
        self
    }

    /// Makes a created table temporary.
    pub fn temporary(&mut self) -> &mut Self {
        self.temporary = true;
        self
    }

    /// Drops the table.
    pub fn drop(&mut self) -> &mut Self {
        self.commands.push(Command::Drop);
        self
    }

    /// Drops the table if it exists.
    pub fn drop_if_exists(&mut self) -> &mut Self {
        self.commands.push(Command::DropIfExists);
        self
    }

    /// Renames the table.
    pub fn rename(&mut self, to: &str) -> &mut Self {
        self.commands.push(Command::Rename(to.to_string()));
        self
    }

    /// Drops columns.
    pub fn drop_column<C, I>(&mut self, columns: I) -> &mut Self
    where
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        self.commands
            .push(Command::DropColumn(columns.into_iter().map(Into::into).collect()));
        self
    }

    /// Renames a column.
    pub fn rename_column(&mut self, from: &str, to: &str) -> &mut Self {
        self.commands.push(Command::RenameColumn {
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }

    /// Adds an index of `kind`; the name is generated when `name` is `None`.
    pub fn add_index<C, I>(&mut self, kind: IndexKind, columns: I, name: Option<&str>) -> &mut Self
    where
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let name = name.map_or_else(|| self.index_name(kind, &columns), str::to_string);
        self.commands.push(Command::Index(IndexCommand {
            kind,
            name,
            columns,
            algorithm: None,
        }));
        self
    }

    /// Adds a primary key.
    pub fn primary<C, I>(&mut self, columns: I) -> &mut Self
    where
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        self.add_index(IndexKind::Primary, columns, None)
    }

    /// Adds a unique index.
    pub fn unique<C, I>(&mut self, columns: I) -> &mut Self
    where
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        self.add_index(IndexKind::Unique, columns, None)
    }

    /// Adds a plain index.
    pub fn index<C, I>(&mut self, columns: I) -> &mut Self
    where
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        self.add_index(IndexKind::Index, columns, None)
    }

    /// Adds a full text index.
    pub fn fulltext<C, I>(&mut self, columns: I) -> &mut Self
    where
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        self.add_index(IndexKind::Fulltext, columns, None)
    }

    /// Adds a foreign key.
    pub fn foreign(&mut self, foreign: ForeignKey) -> &mut Self {
        self.commands.push(Command::Foreign(foreign));
        self
    }

    /// Drops the primary key.
    pub fn drop_primary(&mut self, name: Option<&str>) -> &mut Self {
        let name = name.map_or_else(|| format!("{}{}_pkey", self.prefix, self.table), str::to_string);
        self.commands.push(Command::DropPrimary(name));
        self
    }

    /// Drops a unique index.
    pub fn drop_unique(&mut self, name: &str) -> &mut Self {
        self.commands.push(Command::DropUnique(name.to_string()));
        self
    }

    /// Drops a plain index.
    pub fn drop_index(&mut self, name: &str) -> &mut Self {
        self.commands.push(Command::DropIndex(name.to_string()));
        self
    }

    /// Drops a full text index.
    pub fn drop_fulltext(&mut self, name: &str) -> &mut Self {
        self.commands.push(Command::DropFulltext(name.to_string()));
        self
    }

    /// Drops a spatial index.
    pub fn drop_spatial_index(&mut self, name: &str) -> &mut Self {
        self.commands.push(Command::DropSpatialIndex(name.to_string()));
        self
    }

    /// Drops a foreign key.
    pub fn drop_foreign(&mut self, name: &str) -> &mut Self {
        self.commands.push(Command::DropForeign(name.to_string()));
        self
    }

    /// Renames an index.
    pub fn rename_index(&mut self, from: &str, to: &str) -> &mut Self {
        self.commands.push(Command::RenameIndex {
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }

    /// Adds a column and returns it for modifiers.
    pub fn add_column(&mut self, name: &str, kind: ColumnType) -> &mut ColumnDefinition {
        let index = self.columns.len();
        self.columns.push(ColumnDefinition::new(name, kind));
        &mut self.columns[index]
    }

    /// Auto-incrementing unsigned big integer `id` primary key.
    pub fn id(&mut self) -> &mut ColumnDefinition {
        self.big_increments("id")
    }

    /// Auto-incrementing unsigned integer primary key.
    pub fn increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Integer)
            .unsigned()
            .auto_increment()
    }

    /// Auto-incrementing unsigned big integer primary key.
    pub fn big_increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::BigInteger)
            .unsigned()
            .auto_increment()
    }

    /// Fixed-length string.
    pub fn char(&mut self, name: &str, length: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Char(length))
    }

    /// Variable-length string.
    pub fn string(&mut self, name: &str, length: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::String(length))
    }

    /// Text.
    pub fn text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Text)
    }

    /// Medium text.
    pub fn medium_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MediumText)
    }

    /// Long text.
    pub fn long_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::LongText)
    }

    /// 4-byte integer.
    pub fn integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Integer)
    }

    /// 8-byte integer.
    pub fn big_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::BigInteger)
    }

    /// 2-byte integer.
    pub fn small_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::SmallInteger)
    }

    /// 1-byte integer.
    pub fn tiny_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TinyInteger)
    }

    /// Unsigned big integer for a foreign key column.
    pub fn foreign_id(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::BigInteger).unsigned()
    }

    /// Single precision float.
    pub fn float(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(
            name,
            ColumnType::Float {
                total: None,
                places: None,
            },
        )
    }

    /// Double precision float.
    pub fn double(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Double)
    }

    /// Exact decimal.
    pub fn decimal(&mut self, name: &str, total: u32, places: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Decimal { total, places })
    }

    /// Boolean.
    pub fn boolean(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Boolean)
    }

    /// Enumeration of allowed strings.
    pub fn enumeration<C, I>(&mut self, name: &str, allowed: I) -> &mut ColumnDefinition
    where
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        self.add_column(
            name,
            ColumnType::Enum(allowed.into_iter().map(Into::into).collect()),
        )
    }

    /// JSON document.
    pub fn json(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Json)
    }

    /// Binary JSON document.
    pub fn jsonb(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Jsonb)
    }

    /// Date.
    pub fn date(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Date)
    }

    /// Date and time.
    pub fn date_time(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::DateTime(None))
    }

    /// Time of day.
    pub fn time(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Time(None))
    }

    /// Timestamp.
    pub fn timestamp(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Timestamp(None))
    }

    /// Timestamp with timezone.
    pub fn timestamp_tz(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TimestampTz(None))
    }

    /// Nullable `created_at` and `updated_at` timestamps.
    pub fn timestamps(&mut self) -> &mut Self {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
        self
    }

    /// Year.
    pub fn year(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Year)
    }

    /// Binary data.
    pub fn binary(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Binary)
    }

    /// UUID.
    pub fn uuid(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Uuid)
    }

    /// IP address.
    pub fn ip_address(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::IpAddress)
    }

    /// MAC address.
    pub fn mac_address(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MacAddress)
    }
}
