/// Enzyme Commission numbers and class hierarchy paths
use crate::error::{DicoError, Result};

/// Number of components in a complete EC number
pub const EC_LEVELS: usize = 4;
/// Placeholder for an unspecified EC component
pub const EC_WILDCARD: &str = "-";

/// Joins an EC id and its label inside one path segment
pub const ID_LABEL_SEPARATOR: &str = " ";
/// Joins path segments
pub const SEGMENT_SEPARATOR: &str = ";";

/// Parsed EC number such as `1.1.1.1` or `3.4.-.-`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnzymeId {
    components: Vec<String>,
}

impl EnzymeId {
    pub fn parse(id: &str) -> Result<Self> {
        let id = id.trim();
        let id = id.strip_prefix("EC:").or_else(|| id.strip_prefix("EC ")).unwrap_or(id);
        let components: Vec<String> = id.split('.').map(|c| c.trim().to_string()).collect();

        if components.is_empty() || components.len() > EC_LEVELS {
            return Err(DicoError::Parse(format!("invalid EC number '{}'", id)));
        }
        let valid = components
            .iter()
            .all(|c| c == EC_WILDCARD || (!c.is_empty() && c.chars().all(|ch| ch.is_ascii_alphanumeric())));
        if !valid {
            return Err(DicoError::Parse(format!("invalid EC number '{}'", id)));
        }

        Ok(Self { components })
    }

    /// Number of leading components that are not wildcards
    pub fn depth(&self) -> usize {
        self.components
            .iter()
            .take_while(|c| c.as_str() != EC_WILDCARD)
            .count()
    }

    /// Ids under which level `depth` may be stored: the wildcard-padded form
    /// first, then the truncated form
    pub fn level_candidates(&self, depth: usize) -> Vec<String> {
        let specified = &self.components[..depth.min(self.depth())];
        let truncated = specified.join(".");
        let mut padded = specified.to_vec();
        padded.resize(EC_LEVELS, EC_WILDCARD.to_string());
        let padded = padded.join(".");

        if padded == truncated {
            vec![padded]
        } else {
            vec![padded, truncated]
        }
    }
}

/// One found level of an enzyme path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnzymeLevel {
    pub id: String,
    pub label: String,
}

/// Enzyme class hierarchy, most general level first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnzymePath {
    pub levels: Vec<EnzymeLevel>,
}

impl EnzymePath {
    /// Look every level of `id` up through `lookup`, most specific first,
    /// skipping levels that have no entry
    pub fn resolve<F>(id: &str, mut lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Option<String>>,
    {
        let enzyme = EnzymeId::parse(id)?;
        let mut levels = Vec::with_capacity(EC_LEVELS);

        for depth in (1..=enzyme.depth()).rev() {
            for candidate in enzyme.level_candidates(depth) {
                if let Some(label) = lookup(&candidate)? {
                    levels.push(EnzymeLevel {
                        id: candidate,
                        label,
                    });
                    break;
                }
            }
        }

        levels.reverse();
        Ok(Self { levels })
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn render(&self) -> String {
        self.levels
            .iter()
            .map(|level| format!("{}{}{}", level.id, ID_LABEL_SEPARATOR, level.label))
            .collect::<Vec<_>>()
            .join(SEGMENT_SEPARATOR)
    }
}
