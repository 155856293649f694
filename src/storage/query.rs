/// Approximate name search: literal or wildcard phrase OR a fuzzy variant
use crate::error::{DicoError, Result};
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, PhraseQuery, Query, RegexQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term as IndexTerm;

/// Default Lucene-style similarity for fuzzy matching
pub const DEFAULT_FUZZINESS: f32 = 0.5;

/// Largest edit distance the fuzzy automaton supports
const MAX_EDITS: u8 = 2;

/// Characters with special meaning in classic query syntax
const METACHARACTERS: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\',
    '/',
];

#[derive(Debug, Clone, PartialEq)]
pub struct ApproximateQuery {
    tokens: Vec<String>,
    leading_wildcard: bool,
    trailing_wildcard: bool,
    similarity: f32,
    id_prefix: String,
    excluded_value_prefix: String,
}

impl ApproximateQuery {
    pub fn new(text: &str, similarity: f32, id_prefix: &str) -> Self {
        let trimmed = text.trim();
        let leading_wildcard = trimmed.starts_with('*');
        let trailing_wildcard = trimmed.len() > 1 && trimmed.ends_with('*');

        Self {
            tokens: tokenize(&strip_metacharacters(trimmed)),
            leading_wildcard,
            trailing_wildcard,
            similarity,
            id_prefix: id_prefix.to_string(),
            excluded_value_prefix: String::new(),
        }
    }

    /// Leave out entries whose verbatim text starts with `prefix`
    pub fn excluding_values(mut self, prefix: &str) -> Self {
        self.excluded_value_prefix = prefix.to_string();
        self
    }

    /// Parse a fuzziness string such as `"0.5"`; `None` selects the default
    pub fn parse_fuzziness(fuzziness: Option<&str>) -> Result<f32> {
        match fuzziness {
            None => Ok(DEFAULT_FUZZINESS),
            Some(value) => {
                let similarity: f32 = value
                    .trim()
                    .parse()
                    .map_err(|_| DicoError::Parse(format!("invalid fuzziness '{}'", value)))?;
                if !(0.0..=1.0).contains(&similarity) {
                    return Err(DicoError::Parse(format!(
                        "fuzziness must be within [0, 1], got {}",
                        similarity
                    )));
                }
                Ok(similarity)
            }
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Edit distance allowed for a token of `len` characters
    pub fn max_edits(similarity: f32, len: usize) -> u8 {
        let edits = ((1.0 - similarity) * len as f32).floor();
        (edits.max(0.0) as u8).min(MAX_EDITS)
    }

    /// Build the search query; `None` when nothing searchable remains
    pub fn build(
        &self,
        text_field: Field,
        id_field: Field,
        exact_field: Field,
    ) -> Result<Option<Box<dyn Query>>> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let literal = self.literal_query(text_field)?;
        let fuzzy = self.fuzzy_query(text_field);
        let matching: Box<dyn Query> = Box::new(BooleanQuery::new(vec![
            (Occur::Should, literal),
            (Occur::Should, fuzzy),
        ]));

        if self.id_prefix.is_empty() && self.excluded_value_prefix.is_empty() {
            return Ok(Some(matching));
        }

        let mut clauses = vec![(Occur::Must, matching)];
        if !self.id_prefix.is_empty() {
            clauses.push((Occur::Must, prefix_query(&self.id_prefix, id_field)?));
        }
        if !self.excluded_value_prefix.is_empty() {
            clauses.push((
                Occur::MustNot,
                prefix_query(&self.excluded_value_prefix, exact_field)?,
            ));
        }
        Ok(Some(Box::new(BooleanQuery::new(clauses))))
    }

    fn literal_query(&self, field: Field) -> Result<Box<dyn Query>> {
        let last = self.tokens.len() - 1;

        if !self.leading_wildcard && !self.trailing_wildcard {
            if self.tokens.len() == 1 {
                return Ok(Box::new(term_query(field, &self.tokens[0])));
            }
            let terms = self
                .tokens
                .iter()
                .map(|token| IndexTerm::from_field_text(field, token))
                .collect();
            return Ok(Box::new(PhraseQuery::new(terms)));
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(self.tokens.len());
        for (i, token) in self.tokens.iter().enumerate() {
            let leading = self.leading_wildcard && i == 0;
            let trailing = self.trailing_wildcard && i == last;
            let clause: Box<dyn Query> = if leading || trailing {
                let pattern = format!(
                    "{}{}{}",
                    if leading { ".*" } else { "" },
                    regex::escape(token),
                    if trailing { ".*" } else { "" }
                );
                Box::new(RegexQuery::from_pattern(&pattern, field)?)
            } else {
                Box::new(term_query(field, token))
            };
            clauses.push((Occur::Must, clause));
        }
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    fn fuzzy_query(&self, field: Field) -> Box<dyn Query> {
        let clauses = self
            .tokens
            .iter()
            .map(|token| {
                let distance = Self::max_edits(self.similarity, token.chars().count());
                let term = IndexTerm::from_field_text(field, token);
                let query: Box<dyn Query> = Box::new(FuzzyTermQuery::new_prefix(term, distance, true));
                (Occur::Must, query)
            })
            .collect();
        Box::new(BooleanQuery::new(clauses))
    }
}

fn prefix_query(prefix: &str, field: Field) -> Result<Box<dyn Query>> {
    let pattern = format!("{}.*", regex::escape(prefix));
    Ok(Box::new(RegexQuery::from_pattern(&pattern, field)?))
}

fn term_query(field: Field, token: &str) -> TermQuery {
    TermQuery::new(
        IndexTerm::from_field_text(field, token),
        IndexRecordOption::WithFreqs,
    )
}

/// Remove query metacharacters, keeping the text between them
pub fn strip_metacharacters(text: &str) -> String {
    text.chars()
        .map(|c| if METACHARACTERS.contains(&c) { ' ' } else { c })
        .collect()
}

/// Split into lowercase alphanumeric tokens, matching the default index tokenizer
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}
