//! Naming rules that decide which folders and files of a marketing bundle are read, and what they contain.
use crate::marketing::Category;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Operation {
    Equals,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Pattern {
    pub operation: Operation,
    pub value: String,
    #[serde(default)]
    pub ignore_case: bool,
}

impl Pattern {
    pub fn starts_with(value: &str) -> Self {
        Pattern {
            operation: Operation::StartsWith,
            value: value.into(),
            ignore_case: false,
        }
    }

    pub fn ends_with(value: &str) -> Self {
        Pattern {
            operation: Operation::EndsWith,
            value: value.into(),
            ignore_case: false,
        }
    }

    pub fn ignoring_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn matches(&self, name: &str) -> bool {
        self.remainder(name).is_some()
    }

    /// Return what's left of `name` once the matched part is removed, or `None` if it doesn't match.
    pub fn remainder<'a>(&self, name: &'a str) -> Option<&'a str> {
        let value = self.value.as_str();
        let eq = |a: &str, b: &str| {
            if self.ignore_case {
                a.eq_ignore_ascii_case(b)
            } else {
                a == b
            }
        };
        match self.operation {
            Operation::Equals => eq(name, value).then_some(""),
            Operation::StartsWith => name
                .get(..value.len())
                .filter(|head| eq(head, value))
                .map(|_| &name[value.len()..]),
            Operation::EndsWith => name
                .len()
                .checked_sub(value.len())
                .and_then(|split| name.get(split..).map(|tail| (split, tail)))
                .filter(|(_, tail)| eq(tail, value))
                .map(|(split, _)| &name[..split]),
        }
    }
}

/// A rule to classify a file: all patterns have to match.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileRule {
    pub patterns: Vec<Pattern>,
    pub category: Category,
}

impl FileRule {
    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns.iter().all(|pattern| pattern.matches(file_name))
    }
}

/// All naming rules of a marketing bundle.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Matchers {
    /// Folders matching this pattern belong to a store, whose id is the remainder of the folder name.
    pub folder: Pattern,
    /// The first matching rule determines the category of a file.
    pub files: Vec<FileRule>,
}

impl Default for Matchers {
    fn default() -> Self {
        let csv_file = |prefix: &str, category| FileRule {
            patterns: vec![
                Pattern::starts_with(prefix),
                Pattern::ends_with(".csv").ignoring_case(),
            ],
            category,
        };
        Matchers {
            folder: Pattern::starts_with("marketing_"),
            files: vec![
                csv_file("MARKETING_PROMOTION", Category::Promotion),
                csv_file("MARKETING_SPONSORED_LISTING", Category::SponsoredListing),
            ],
        }
    }
}

impl Matchers {
    /// Return the raw store id if `folder_name` names a store folder.
    pub fn store<'a>(&self, folder_name: &'a str) -> Option<&'a str> {
        self.folder
            .remainder(folder_name)
            .filter(|store| !store.is_empty())
    }

    pub fn category(&self, file_name: &str) -> Option<Category> {
        self.files
            .iter()
            .find_map(|rule| rule.matches(file_name).then_some(rule.category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_yield_their_store() {
        let matchers = Matchers::default();
        assert_eq!(matchers.store("marketing_001"), Some("001"));
        assert_eq!(matchers.store("marketing_Main St"), Some("Main St"));
        assert_eq!(matchers.store("marketing_"), None);
        assert_eq!(matchers.store("Marketing_001"), None);
        assert_eq!(matchers.store("other"), None);
    }

    #[test]
    fn files_yield_their_category() {
        let matchers = Matchers::default();
        assert_eq!(
            matchers.category("MARKETING_PROMOTION_corp.csv"),
            Some(Category::Promotion)
        );
        assert_eq!(
            matchers.category("MARKETING_SPONSORED_LISTING_2024.CSV"),
            Some(Category::SponsoredListing)
        );
        assert_eq!(matchers.category("MARKETING_PROMOTION.xlsx"), None);
        assert_eq!(matchers.category("notes.csv"), None);
    }

    #[test]
    fn pattern_remainders() {
        assert_eq!(Pattern::ends_with(".csv").remainder("a.csv"), Some("a"));
        assert_eq!(Pattern::ends_with(".csv").remainder("csv"), None);
        assert_eq!(
            Pattern::starts_with("ab").ignoring_case().remainder("ABc"),
            Some("c")
        );
        let equals = Pattern {
            operation: Operation::Equals,
            value: "x".into(),
            ignore_case: false,
        };
        assert!(equals.matches("x"));
        assert!(!equals.matches("xy"));
    }

    #[test]
    fn serde() {
        let matchers = Matchers::default();
        let data =
            ron::ser::to_string_pretty(&matchers, ron::ser::PrettyConfig::new().struct_names(true))
                .unwrap();
        assert_eq!(
            ron::from_str::<Matchers>(&data).unwrap(),
            matchers,
            "round-trip works"
        );
    }
}
