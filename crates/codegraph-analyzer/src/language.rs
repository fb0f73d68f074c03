// ABOUTME: Maps supported languages to Tree-sitter grammars and file extensions.
// ABOUTME: Builds a parser configured for a given language on demand.
use codegraph_core::Language;
use std::collections::HashMap;
use tree_sitter::Parser;

pub struct LanguageConfig {
    pub language: tree_sitter::Language,
    pub file_extensions: Vec<&'static str>,
}

/// Registry of the grammars the symbol analyzer actually walks. Limited to
/// `supportedLanguages = {typescript, tsx, javascript, jsx, python}`; other
/// `Language` values are valid for identifiers and node tagging but have no
/// entry here, matching the analyzer's language-gating rule.
pub struct LanguageRegistry {
    configs: HashMap<Language, LanguageConfig>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut configs = HashMap::new();

        configs.insert(
            Language::TypeScript,
            LanguageConfig {
                language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                file_extensions: vec!["ts"],
            },
        );

        configs.insert(
            Language::Tsx,
            LanguageConfig {
                language: tree_sitter_typescript::LANGUAGE_TSX.into(),
                file_extensions: vec!["tsx"],
            },
        );

        configs.insert(
            Language::JavaScript,
            LanguageConfig {
                language: tree_sitter_javascript::LANGUAGE.into(),
                file_extensions: vec!["js", "mjs", "cjs"],
            },
        );

        configs.insert(
            Language::Jsx,
            LanguageConfig {
                language: tree_sitter_javascript::LANGUAGE.into(),
                file_extensions: vec!["jsx"],
            },
        );

        configs.insert(
            Language::Python,
            LanguageConfig {
                language: tree_sitter_python::LANGUAGE.into(),
                file_extensions: vec!["py", "pyi"],
            },
        );

        Self { configs }
    }

    pub fn detect_language(&self, file_path: &str) -> Option<Language> {
        let extension = std::path::Path::new(file_path).extension()?.to_str()?;
        self.configs
            .iter()
            .find(|(_, config)| config.file_extensions.contains(&extension))
            .map(|(lang, _)| *lang)
    }

    pub fn get_config(&self, language: &Language) -> Option<&LanguageConfig> {
        self.configs.get(language)
    }

    pub fn create_parser(&self, language: &Language) -> Option<Parser> {
        let config = self.get_config(language)?;
        let mut parser = Parser::new();
        parser.set_language(&config.language).ok()?;
        Some(parser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::{LANGUAGE_VERSION, MIN_COMPATIBLE_LANGUAGE_VERSION};

    #[test]
    fn registered_languages_use_supported_versions() {
        let registry = LanguageRegistry::new();
        for (language, config) in &registry.configs {
            let version = config.language.version();
            assert!(
                (MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&version),
                "language {:?} uses incompatible tree-sitter version {} (supported {}..={})",
                language,
                version,
                MIN_COMPATIBLE_LANGUAGE_VERSION,
                LANGUAGE_VERSION
            );
        }
    }

    #[test]
    fn detects_language_by_extension() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.detect_language("src/app.tsx"), Some(Language::Tsx));
        assert_eq!(registry.detect_language("src/app.py"), Some(Language::Python));
        assert_eq!(registry.detect_language("src/app.rs"), None);
    }
}
