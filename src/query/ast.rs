use std::fmt;

/// A field reference, possibly dotted (`assigned_to.department.name`),
/// traversing foreign-key links between tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_dotted(&self) -> bool {
        self.segments.len() > 1
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// A parsed `sysparm_query` filter: AND across the or-groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExpr {
    pub terms: Vec<OrGroup>,
}

/// One AND segment: OR across its matchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrGroup {
    pub matchers: Vec<Matcher>,
}

/// A single filter condition against one (possibly dotted) field.
///
/// `Contains`/`NotContains` are grammatically valid but have no defined
/// evaluation semantics; the evaluator rejects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// `field ISEMPTY`
    Empty(FieldPath),
    /// `field ISNOTEMPTY`
    NotEmpty(FieldPath),
    /// `field LIKE value`
    Contains(FieldPath, String),
    /// `field NOTLIKE value`
    NotContains(FieldPath, String),
    /// `field = value` (a missing value means the empty string)
    Is(FieldPath, Option<String>),
    /// `field != value`
    IsNot(FieldPath, String),
    /// `field BETWEEN from @ to`
    DateBetween(FieldPath, String, String),
    /// `field IN v1,v2,...`
    In(FieldPath, Vec<String>),
}
