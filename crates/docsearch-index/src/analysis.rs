//! Language analyzers for text fields.
//!
//! Each language gets an analyzer named `lang_<code>`:
//! SimpleTokenizer → RemoveLongFilter(40) → LowerCaser → Stemmer(language).
//! Languages without a Tantivy stemmer keep the chain minus the stemmer.
//! Tantivy does not persist tokenizers, so they are registered again every
//! time an index is created or opened.

use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer,
};
use tantivy::Index;
use tracing::{debug, warn};

use crate::schema::IndexSchema;

/// Prefix of analyzer names.
pub const ANALYZER_PREFIX: &str = "lang_";

/// Tokens longer than this are dropped.
const MAX_TOKEN_LENGTH: usize = 40;

/// Analyzer name for a language code.
pub fn analyzer_name(language: &str) -> String {
    format!("{}{}", ANALYZER_PREFIX, language)
}

/// Language code of an analyzer name, None for foreign tokenizers.
pub fn language_of(analyzer: &str) -> Option<&str> {
    analyzer.strip_prefix(ANALYZER_PREFIX)
}

/// Stemmer language for an ISO 639-1 code.
pub fn stemmer_language(code: &str) -> Option<Language> {
    let language = match code.to_ascii_lowercase().as_str() {
        "ar" => Language::Arabic,
        "da" => Language::Danish,
        "de" => Language::German,
        "el" => Language::Greek,
        "en" => Language::English,
        "es" => Language::Spanish,
        "fi" => Language::Finnish,
        "fr" => Language::French,
        "hu" => Language::Hungarian,
        "it" => Language::Italian,
        "nl" => Language::Dutch,
        "no" => Language::Norwegian,
        "pt" => Language::Portuguese,
        "ro" => Language::Romanian,
        "ru" => Language::Russian,
        "sv" => Language::Swedish,
        "ta" => Language::Tamil,
        "tr" => Language::Turkish,
        _ => return None,
    };
    Some(language)
}

/// Build the analyzer for a language code.
pub fn build_analyzer(language: &str) -> TextAnalyzer {
    let builder = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
        .filter(LowerCaser);

    match stemmer_language(language) {
        Some(stemmer) => builder.filter(Stemmer::new(stemmer)).build(),
        None => {
            warn!(language, "No stemmer for language, text is analyzed without stemming");
            builder.build()
        }
    }
}

/// Register the analyzers of every language used by the schema.
pub fn register_analyzers(index: &Index, schema: &IndexSchema) {
    for language in schema.languages() {
        let name = analyzer_name(&language);
        index.tokenizers().register(&name, build_analyzer(&language));
        debug!(analyzer = %name, "Registered analyzer");
    }
}
