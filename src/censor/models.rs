// Core data types shared by the detectors, the redactor, and the stats report.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use anyhow::Result;

/// The kinds of sensitive content the tool knows how to censor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Person,
    Date,
    Phone,
    Address,
    Concept,
}

impl Category {
    pub const COUNT: usize = 5;

    /// Report order for the stats "Censored Terms" section.
    pub const ALL: [Category; Category::COUNT] = [
        Category::Person,
        Category::Date,
        Category::Phone,
        Category::Address,
        Category::Concept,
    ];

    /// Order in which spans are applied to a document. Whole-sentence concept
    /// blocks go first so the smaller spans land on what's left.
    pub const REDACTION_ORDER: [Category; Category::COUNT] = [
        Category::Concept,
        Category::Person,
        Category::Address,
        Category::Date,
        Category::Phone,
    ];

    /// Name used in the stats report.
    pub fn report_name(self) -> &'static str {
        match self {
            Category::Person => "Names",
            Category::Date => "Dates",
            Category::Phone => "Phones",
            Category::Address => "Addresses",
            Category::Concept => "Concept",
        }
    }

    /// Index into fixed-size per-category tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Category::Person => 0,
            Category::Date => 1,
            Category::Phone => 2,
            Category::Address => 3,
            Category::Concept => 4,
        }
    }

    /// Whether this category needs the NER model.
    pub fn uses_entity_model(self) -> bool {
        matches!(self, Category::Person | Category::Date | Category::Address)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Person => "PERSON",
            Category::Date => "DATE",
            Category::Phone => "PHONE",
            Category::Address => "ADDRESS",
            Category::Concept => "CONCEPT",
        };
        f.write_str(label)
    }
}

/// The set of categories enabled for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategorySet {
    enabled: [bool; Category::COUNT],
}

impl CategorySet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category) -> Self {
        self.insert(category);
        self
    }

    pub fn insert(&mut self, category: Category) {
        self.enabled[category.index()] = true;
    }

    pub fn contains(&self, category: Category) -> bool {
        self.enabled[category.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.enabled.iter().any(|&e| e)
    }

    /// True if any enabled category is served by the NER model.
    pub fn needs_entity_model(&self) -> bool {
        self.iter().any(Category::uses_entity_model)
    }

    /// Enabled categories, in report order.
    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = Self::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

/// A detected piece of sensitive text.
///
/// Two spans are equal when their text is equal, whatever the category:
/// redaction works on literal values, so every occurrence of the text in
/// the document gets blocked out.
#[derive(Debug, Clone)]
pub struct EntitySpan {
    pub category: Category,
    pub text: String,
}

impl EntitySpan {
    pub fn new(category: Category, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
        }
    }
}

impl PartialEq for EntitySpan {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for EntitySpan {}

impl Hash for EntitySpan {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

/// Everything needed to censor one input file.
#[derive(Debug, Clone)]
pub struct CensorRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub categories: CategorySet,
    /// Concept phrases, only consulted when CONCEPT is enabled.
    pub concepts: Vec<String>,
}

impl CensorRequest {
    /// `<output_dir>/<file name>.censored`
    pub fn output_path(&self) -> Result<PathBuf> {
        censored_path(&self.input, &self.output_dir)
    }
}

/// Build the output path for an input file.
pub fn censored_path(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let Some(name) = input.file_name() else {
        anyhow::bail!("Input path has no file name: {}", input.display());
    };
    let mut file_name = name.to_os_string();
    file_name.push(".censored");
    Ok(output_dir.join(file_name))
}
