use std::path::Path;

use irs_chat::{FieldExtractor, Vocabulary};

use crate::error::{LoaderError, read_file};

/// Reads [`Vocabulary`] overrides from TOML.
///
/// Lists absent from the file keep their built-in values, so an override
/// file only names what it changes.
pub struct VocabularyLoader;

impl VocabularyLoader {
    pub fn from_toml_str(source: &str) -> Result<Vocabulary, LoaderError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: &Path) -> Result<Vocabulary, LoaderError> {
        Self::from_toml_str(&read_file(path)?)
    }

    /// Loads the vocabulary at `path` and compiles an extractor from it.
    pub fn extractor_from_path(path: &Path) -> Result<FieldExtractor, LoaderError> {
        Ok(FieldExtractor::new(Self::from_path(path)?)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_file_is_default_vocabulary() {
        assert_eq!(VocabularyLoader::from_toml_str("").unwrap(), Vocabulary::default());
    }

    #[test]
    fn test_override_keeps_other_lists() {
        let vocabulary = VocabularyLoader::from_toml_str(
            r#"
monthly = ["mes", "mensal"]

[number_words]
sete = 7
"#,
        )
        .unwrap();

        assert_eq!(vocabulary.monthly, vec!["mes", "mensal"]);
        assert_eq!(vocabulary.number_word("sete"), Some(7));
        assert_eq!(vocabulary.number_word("dois"), None);
        assert_eq!(vocabulary.annual, Vocabulary::default().annual);
    }
}
