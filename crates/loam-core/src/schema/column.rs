//! Column definitions collected by a [`Blueprint`](super::Blueprint).

use crate::value::{Expression, Param};

/// Abstract column type, mapped to a concrete type by each schema grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// Fixed-length string.
    Char(u32),
    /// Variable-length string.
    String(u32),
    /// Tiny text.
    TinyText,
    /// Text.
    Text,
    /// Medium text.
    MediumText,
    /// Long text.
    LongText,
    /// 8-byte integer.
    BigInteger,
    /// 4-byte integer.
    Integer,
    /// 3-byte integer.
    MediumInteger,
    /// 2-byte integer.
    SmallInteger,
    /// 1-byte integer.
    TinyInteger,
    /// Single precision float.
    Float {
        /// Total digits.
        total: Option<u32>,
        /// Digits after the decimal point.
        places: Option<u32>,
    },
    /// Double precision float.
    Double,
    /// Exact decimal.
    Decimal {
        /// Total digits.
        total: u32,
        /// Digits after the decimal point.
        places: u32,
    },
    /// Boolean.
    Boolean,
    /// One of a fixed set of strings.
    Enum(Vec<String>),
    /// JSON document.
    Json,
    /// Binary JSON document.
    Jsonb,
    /// Calendar date.
    Date,
    /// Date and time with optional fractional precision.
    DateTime(Option<u32>),
    /// Date and time with timezone.
    DateTimeTz(Option<u32>),
    /// Time of day.
    Time(Option<u32>),
    /// Time of day with timezone.
    TimeTz(Option<u32>),
    /// Timestamp.
    Timestamp(Option<u32>),
    /// Timestamp with timezone.
    TimestampTz(Option<u32>),
    /// Year.
    Year,
    /// Binary data.
    Binary,
    /// UUID.
    Uuid,
    /// IPv4 or IPv6 address.
    IpAddress,
    /// MAC address.
    MacAddress,
}

impl ColumnType {
    /// True for the integer family.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::BigInteger
                | Self::Integer
                | Self::MediumInteger
                | Self::SmallInteger
                | Self::TinyInteger
        )
    }
}

/// Kind of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Primary key.
    Primary,
    /// Unique index.
    Unique,
    /// Plain index.
    Index,
    /// Full text index.
    Fulltext,
    /// Spatial index.
    Spatial,
}

impl IndexKind {
    /// Suffix used in generated index names.
    #[must_use]
    pub const fn name_suffix(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Unique => "unique",
            Self::Index => "index",
            Self::Fulltext => "fulltext",
            Self::Spatial => "spatialindex",
        }
    }
}

/// One column of a blueprint with its modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Abstract type.
    pub kind: ColumnType,
    /// `null` allowed.
    pub nullable: bool,
    /// Default value; raw expressions are emitted verbatim.
    pub default: Option<Param>,
    /// Auto increment (serial on PostgreSQL).
    pub auto_increment: bool,
    /// Unsigned integer (MySQL only).
    pub unsigned: bool,
    /// Character set (MySQL only).
    pub charset: Option<String>,
    /// Collation.
    pub collation: Option<String>,
    /// Column comment.
    pub comment: Option<String>,
    /// Place after this column (MySQL only).
    pub after: Option<String>,
    /// Place first (MySQL only).
    pub first: bool,
    /// Default to the current timestamp.
    pub use_current: bool,
    /// Update to the current timestamp on change (MySQL only).
    pub use_current_on_update: bool,
    /// Virtual generated column expression.
    pub virtual_as: Option<String>,
    /// Stored generated column expression.
    pub stored_as: Option<String>,
    /// Indexes requested through column modifiers.
    pub indexes: Vec<(IndexKind, Option<String>)>,
}

impl ColumnDefinition {
    /// Creates a non-null column without modifiers.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            default: None,
            auto_increment: false,
            unsigned: false,
            charset: None,
            collation: None,
            comment: None,
            after: None,
            first: false,
            use_current: false,
            use_current_on_update: false,
            virtual_as: None,
            stored_as: None,
            indexes: Vec::new(),
        }
    }

    /// Allows `null`.
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    /// Sets a default value.
    pub fn default(&mut self, value: impl Into<Param>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    /// Sets a raw default expression.
    pub fn default_raw(&mut self, sql: &str) -> &mut Self {
        self.default = Some(Param::Raw(Expression::new(sql)));
        self
    }

    /// Marks the column auto-incrementing.
    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    /// Marks an integer column unsigned.
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    /// Sets the character set.
    pub fn charset(&mut self, charset: &str) -> &mut Self {
        self.charset = Some(charset.to_string());
        self
    }

    /// Sets the collation.
    pub fn collation(&mut self, collation: &str) -> &mut Self {
        self.collation = Some(collation.to_string());
        self
    }

    /// Sets a comment.
    pub fn comment(&mut self, comment: &str) -> &mut Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// Places the column after another one.
    pub fn after(&mut self, column: &str) -> &mut Self {
        self.after = Some(column.to_string());
        self
    }

    /// Places the column first.
    pub fn first(&mut self) -> &mut Self {
        self.first = true;
        self
    }

    /// Defaults a timestamp to the current time.
    pub fn use_current(&mut self) -> &mut Self {
        self.use_current = true;
        self
    }

    /// Refreshes a timestamp on every update.
    pub fn use_current_on_update(&mut self) -> &mut Self {
        self.use_current_on_update = true;
        self
    }

    /// Makes this a virtual generated column.
    pub fn virtual_as(&mut self, expression: &str) -> &mut Self {
        self.virtual_as = Some(expression.to_string());
        self
    }

    /// Makes this a stored generated column.
    pub fn stored_as(&mut self, expression: &str) -> &mut Self {
        self.stored_as = Some(expression.to_string());
        self
    }

    /// Adds a primary key on this column.
    pub fn primary(&mut self) -> &mut Self {
        self.indexes.push((IndexKind::Primary, None));
        self
    }

    /// Adds a unique index on this column.
    pub fn unique(&mut self) -> &mut Self {
        self.indexes.push((IndexKind::Unique, None));
        self
    }

    /// Adds a plain index on this column.
    pub fn index(&mut self) -> &mut Self {
        self.indexes.push((IndexKind::Index, None));
        self
    }

    /// Adds an index of `kind` with an explicit name.
    pub fn index_named(&mut self, kind: IndexKind, name: &str) -> &mut Self {
        self.indexes.push((kind, Some(name.to_string())));
        self
    }
}
