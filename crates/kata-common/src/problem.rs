//! Problem model: typed content sections and problem metadata.
//!
//! A problem is an ordered list of [`Section`]s plus a [`ProblemMeta`]. Each
//! section body is one variant of the closed [`SectionBody`] sum type. Every
//! list-carrying variant must hold at least one item.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

/// HTML a freshly created statement section starts with.
pub const DEFAULT_STATEMENT_HTML: &str = "<p>Describe the problem here.</p>";

/// Problem difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown difficulty `{0}`, expected easy, medium or hard")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// Opaque section identifier, stable for the lifetime of a section.
///
/// Stores allocate these from a monotonic counter (format: `sec-{n}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(SmolStr);

impl SectionId {
    /// Generate a section ID from a counter value.
    pub fn from_index(index: u64) -> Self {
        Self(format_smolstr!("sec-{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Counter value for IDs in the `sec-{n}` format, `None` for foreign IDs.
    pub fn index(&self) -> Option<u64> {
        self.0.strip_prefix("sec-")?.parse().ok()
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminant of [`SectionBody`], used to request new sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Statement,
    Images,
    Videos,
    Examples,
    Constraints,
    Hints,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Statement,
        SectionKind::Images,
        SectionKind::Videos,
        SectionKind::Examples,
        SectionKind::Constraints,
        SectionKind::Hints,
    ];

    /// Human readable label, as shown on section headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Statement => "Statement",
            Self::Images => "Images",
            Self::Videos => "Videos",
            Self::Examples => "Examples",
            Self::Constraints => "Constraints",
            Self::Hints => "Hints",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which surface a statement is edited through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Rich,
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub edit_mode: EditMode,
    pub content_html: String,
}

/// An image or video reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    pub caption: String,
}

/// A worked input/output example.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
    pub explanation: String,
}

/// Payload of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionBody {
    Statement(Statement),
    Images { items: Vec<MediaItem> },
    Videos { items: Vec<MediaItem> },
    Examples { items: Vec<Example> },
    Constraints { items: Vec<String> },
    Hints { items: Vec<String> },
}

impl SectionBody {
    /// Create a default-populated body: one empty item for list kinds,
    /// `statement_html` in rich mode for statements.
    pub fn new(kind: SectionKind, statement_html: &str) -> Self {
        match kind {
            SectionKind::Statement => Self::statement(statement_html),
            SectionKind::Images => Self::Images {
                items: vec![MediaItem::default()],
            },
            SectionKind::Videos => Self::Videos {
                items: vec![MediaItem::default()],
            },
            SectionKind::Examples => Self::Examples {
                items: vec![Example::default()],
            },
            SectionKind::Constraints => Self::Constraints {
                items: vec![String::new()],
            },
            SectionKind::Hints => Self::Hints {
                items: vec![String::new()],
            },
        }
    }

    pub fn statement(html: impl Into<String>) -> Self {
        Self::Statement(Statement {
            edit_mode: EditMode::Rich,
            content_html: html.into(),
        })
    }

    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Statement(_) => SectionKind::Statement,
            Self::Images { .. } => SectionKind::Images,
            Self::Videos { .. } => SectionKind::Videos,
            Self::Examples { .. } => SectionKind::Examples,
            Self::Constraints { .. } => SectionKind::Constraints,
            Self::Hints { .. } => SectionKind::Hints,
        }
    }

    /// Number of list items, `None` for statements.
    pub fn item_count(&self) -> Option<usize> {
        match self {
            Self::Statement(_) => None,
            Self::Images { items } | Self::Videos { items } => Some(items.len()),
            Self::Examples { items } => Some(items.len()),
            Self::Constraints { items } | Self::Hints { items } => Some(items.len()),
        }
    }

    /// Append one default item. Returns false for statements.
    pub fn push_default_item(&mut self) -> bool {
        match self {
            Self::Statement(_) => return false,
            Self::Images { items } | Self::Videos { items } => items.push(MediaItem::default()),
            Self::Examples { items } => items.push(Example::default()),
            Self::Constraints { items } | Self::Hints { items } => items.push(String::new()),
        }
        true
    }

    /// Remove the item at `index`.
    ///
    /// Refuses (returns false) when it would leave the list empty or the
    /// index is out of range.
    pub fn remove_item(&mut self, index: usize) -> bool {
        let Some(count) = self.item_count() else {
            return false;
        };
        if count <= 1 || index >= count {
            return false;
        }
        match self {
            Self::Statement(_) => return false,
            Self::Images { items } | Self::Videos { items } => {
                items.remove(index);
            }
            Self::Examples { items } => {
                items.remove(index);
            }
            Self::Constraints { items } | Self::Hints { items } => {
                items.remove(index);
            }
        }
        true
    }

    pub fn as_statement(&self) -> Option<&Statement> {
        match self {
            Self::Statement(statement) => Some(statement),
            _ => None,
        }
    }

    pub fn as_statement_mut(&mut self) -> Option<&mut Statement> {
        match self {
            Self::Statement(statement) => Some(statement),
            _ => None,
        }
    }
}

/// A section together with its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    #[serde(flatten)]
    pub body: SectionBody,
}

impl Section {
    pub fn new(id: SectionId, body: SectionBody) -> Self {
        Self { id, body }
    }

    pub fn kind(&self) -> SectionKind {
        self.body.kind()
    }

    pub fn is_hints(&self) -> bool {
        self.kind() == SectionKind::Hints
    }

    pub fn is_statement(&self) -> bool {
        self.kind() == SectionKind::Statement
    }
}

/// Trim and lowercase a tag. Returns `None` for blank input.
pub fn normalize_tag(tag: &str) -> Option<SmolStr> {
    let tag = tag.trim();
    if tag.is_empty() {
        return None;
    }
    Some(SmolStr::new(tag.to_lowercase()))
}

/// Lowercase, deduplicated tag set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(BTreeSet<SmolStr>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag after normalizing it. Returns true if the set changed.
    pub fn insert(&mut self, tag: &str) -> bool {
        match normalize_tag(tag) {
            Some(tag) => self.0.insert(tag),
            None => false,
        }
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        match normalize_tag(tag) {
            Some(tag) => self.0.remove(&tag),
            None => false,
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        normalize_tag(tag).is_some_and(|tag| self.0.contains(&tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|tag| tag.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        let mut set = TagSet::new();
        for tag in &tags {
            set.insert(tag);
        }
        set
    }
}

impl From<TagSet> for Vec<String> {
    fn from(tags: TagSet) -> Self {
        tags.0.into_iter().map(|tag| tag.to_string()).collect()
    }
}

impl<'a> FromIterator<&'a str> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

/// Title, difficulty and tags of a problem.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProblemMeta {
    pub title: String,
    pub difficulty: Difficulty,
    pub tags: TagSet,
}
