/// NCBI taxonomy encoding and lineage simplification
///
/// Two sub-indexes share one term store: name nodes (`n<taxid>` → scientific
/// name, or `SYN:<taxid>` for merged ids) and tree nodes
/// (`o<taxid>` → `o<parent>|<rank>`). Node `o1` is the self-parented root.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Prefix of name-node ids
pub const NAME_PREFIX: &str = "n";
/// Prefix of tree-node ids
pub const TREE_PREFIX: &str = "o";
/// Prefix of a name value redirecting a merged taxon to its current id
pub const SYNONYM_PREFIX: &str = "SYN:";
/// Taxon id of the root node
pub const ROOT_TAXON: &str = "1";
/// Placeholder emitted for ranks a lineage skips
pub const UNKNOWN_RANK_LABEL: &str = "unknown";

pub fn name_id(taxid: &str) -> String {
    format!("{}{}", NAME_PREFIX, taxid)
}

pub fn tree_id(taxid: &str) -> String {
    format!("{}{}", TREE_PREFIX, taxid)
}

/// Tree-node value pointing at `parent_taxid`
pub fn tree_value(parent_taxid: &str, rank: &str) -> String {
    format!("{}{}|{}", TREE_PREFIX, parent_taxid, rank)
}

pub fn synonym_value(current_taxid: &str) -> String {
    format!("{}{}", SYNONYM_PREFIX, current_taxid)
}

/// Current taxon id when a name value is a merged-id redirect
pub fn synonym_target(name_value: &str) -> Option<&str> {
    name_value
        .strip_prefix(SYNONYM_PREFIX)
        .map(str::trim)
        .filter(|target| !target.is_empty())
}

/// Raw taxon id of a tree-node id
pub fn taxid_of_tree_id(id: &str) -> &str {
    id.strip_prefix(TREE_PREFIX).unwrap_or(id)
}

/// Rank name stored after the `|` of a tree-node value
pub fn rank_name(tree_value: &str) -> &str {
    tree_value
        .split_once('|')
        .map(|(_, rank)| rank.trim())
        .unwrap_or("")
}

/// Canonical taxonomic ranks used to normalize lineages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaxonomyRank {
    Life = 1,
    Domain = 2,
    Kingdom = 3,
    Phylum = 4,
    Class = 5,
    Order = 6,
    Family = 7,
    Genus = 8,
    Species = 9,
}

impl TaxonomyRank {
    pub const ALL: [TaxonomyRank; 9] = [
        Self::Life,
        Self::Domain,
        Self::Kingdom,
        Self::Phylum,
        Self::Class,
        Self::Order,
        Self::Family,
        Self::Genus,
        Self::Species,
    ];

    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Short code prefixed to names in simplified lineages
    pub fn code(&self) -> &'static str {
        match self {
            Self::Life => "l__",
            Self::Domain => "d__",
            Self::Kingdom => "k__",
            Self::Phylum => "p__",
            Self::Class => "c__",
            Self::Order => "o__",
            Self::Family => "f__",
            Self::Genus => "g__",
            Self::Species => "s__",
        }
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Life => "life",
            Self::Domain => "domain",
            Self::Kingdom => "kingdom",
            Self::Phylum => "phylum",
            Self::Class => "class",
            Self::Order => "order",
            Self::Family => "family",
            Self::Genus => "genus",
            Self::Species => "species",
        }
    }

    /// Rank names folded onto this rank when simplifying a lineage
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Self::Life => &["cellular root", "acellular root"],
            Self::Domain => &["superkingdom", "realm", "empire"],
            Self::Kingdom => &["subkingdom", "infrakingdom"],
            Self::Phylum => &["superphylum", "subphylum", "infraphylum", "division"],
            Self::Class => &["superclass", "subclass", "infraclass", "cohort"],
            Self::Order => &["superorder", "suborder", "infraorder", "parvorder"],
            Self::Family => &["superfamily", "subfamily", "tribe", "subtribe"],
            Self::Genus => &["subgenus", "section", "subsection", "series"],
            Self::Species => &[
                "subspecies",
                "species group",
                "species subgroup",
                "varietas",
                "forma",
                "strain",
                "serotype",
                "serogroup",
                "isolate",
            ],
        }
    }

    /// Rank whose canonical name matches `name` (case-insensitive)
    pub fn from_canonical(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|rank| rank.canonical_name().eq_ignore_ascii_case(name))
    }

    /// Rank listing `name` among its synonyms (case-insensitive)
    pub fn from_synonym(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|rank| {
            rank.synonyms()
                .iter()
                .any(|synonym| synonym.eq_ignore_ascii_case(name))
        })
    }
}

impl fmt::Display for TaxonomyRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// One node of a resolved lineage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonNode {
    pub taxon_id: String,
    pub name: String,
    pub rank_name: String,
}

impl TaxonNode {
    pub fn new(
        taxon_id: impl Into<String>,
        name: impl Into<String>,
        rank_name: impl Into<String>,
    ) -> Self {
        Self {
            taxon_id: taxon_id.into(),
            name: name.into(),
            rank_name: rank_name.into(),
        }
    }

    fn is_root(&self) -> bool {
        self.taxon_id == ROOT_TAXON
    }
}

/// A rank slot of a normalized lineage; `node` is `None` for a skipped rank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTaxon {
    pub rank: TaxonomyRank,
    pub node: Option<TaxonNode>,
}

impl RankedTaxon {
    pub fn label(&self) -> &str {
        self.node
            .as_ref()
            .map(|node| node.name.as_str())
            .unwrap_or(UNKNOWN_RANK_LABEL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxPathOptions {
    /// Fold rank synonyms onto canonical ranks, one node per rank
    pub simplified: bool,
    /// Keep the queried organism itself as the last node
    pub include_organism: bool,
    /// Emit all nine ranks, with a placeholder for missing ones
    pub tag_missing_rank: bool,
}

impl Default for TaxPathOptions {
    fn default() -> Self {
        Self {
            simplified: false,
            include_organism: true,
            tag_missing_rank: false,
        }
    }
}

/// A lineage with canonical ranks assigned
#[derive(Debug, Clone, PartialEq)]
pub struct TaxPath {
    /// Nodes root to leaf
    pub lineage: Vec<TaxonNode>,
    /// Rank-assigned nodes in rank order
    pub ranked: Vec<RankedTaxon>,
    /// Nodes left without a rank in simplified mode
    pub dropped: Vec<TaxonNode>,
    pub options: TaxPathOptions,
}

impl TaxPath {
    /// Assign canonical ranks to a root-to-leaf lineage
    pub fn resolve(mut lineage: Vec<TaxonNode>, options: TaxPathOptions) -> Self {
        if !options.include_organism {
            lineage.pop();
        }

        let mut assigned: BTreeMap<TaxonomyRank, usize> = BTreeMap::new();
        for (i, node) in lineage.iter().enumerate() {
            let rank = if node.is_root() {
                Some(TaxonomyRank::Life)
            } else {
                TaxonomyRank::from_canonical(&node.rank_name)
            };
            if let Some(rank) = rank {
                assigned.entry(rank).or_insert(i);
            }
        }

        let mut dropped = Vec::new();
        if options.simplified {
            for (i, node) in lineage.iter().enumerate() {
                if assigned.values().any(|&index| index == i) {
                    continue;
                }
                match TaxonomyRank::from_synonym(&node.rank_name) {
                    Some(rank) if !assigned.contains_key(&rank) => {
                        assigned.insert(rank, i);
                    }
                    _ => {
                        debug!(
                            "Dropping taxon {} ({}) from simplified lineage: rank '{}' not assignable",
                            node.taxon_id, node.name, node.rank_name
                        );
                        dropped.push(node.clone());
                    }
                }
            }
        }

        let ranked = if options.tag_missing_rank {
            TaxonomyRank::ALL
                .into_iter()
                .map(|rank| RankedTaxon {
                    rank,
                    node: assigned.get(&rank).map(|&i| lineage[i].clone()),
                })
                .collect()
        } else {
            assigned
                .iter()
                .map(|(&rank, &i)| RankedTaxon {
                    rank,
                    node: Some(lineage[i].clone()),
                })
                .collect()
        };

        Self {
            lineage,
            ranked,
            dropped,
            options,
        }
    }

    /// Full lineage names, or rank-coded entries in simplified / tagged mode
    pub fn render(&self) -> String {
        if self.options.simplified || self.options.tag_missing_rank {
            self.ranked
                .iter()
                .map(|entry| format!("{}{}", entry.rank.code(), entry.label()))
                .collect::<Vec<_>>()
                .join(";")
        } else {
            self.lineage
                .iter()
                .map(|node| node.name.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        }
    }

    pub fn rank_labels(&self) -> Vec<&str> {
        self.ranked.iter().map(RankedTaxon::label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_id_encoding() {
        assert_eq!(name_id("9606"), "n9606");
        assert_eq!(tree_id("9606"), "o9606");
        assert_eq!(tree_value("9605", "species"), "o9605|species");
        assert_eq!(rank_name("o9605|species"), "species");
        assert_eq!(rank_name("o1"), "");
        assert_eq!(taxid_of_tree_id("o9606"), "9606");
        assert_eq!(synonym_value("562"), "SYN:562");
        assert_eq!(synonym_target("SYN:562"), Some("562"));
        assert_eq!(synonym_target("Escherichia coli"), None);
        assert_eq!(synonym_target("SYN:"), None);
    }

    #[test]
    fn test_rank_lookup_is_case_insensitive() {
        assert_eq!(TaxonomyRank::from_canonical("Phylum"), Some(TaxonomyRank::Phylum));
        assert_eq!(TaxonomyRank::from_canonical("subphylum"), None);
        assert_eq!(TaxonomyRank::from_synonym("SubPhylum"), Some(TaxonomyRank::Phylum));
        assert_eq!(TaxonomyRank::from_synonym("superphylum"), Some(TaxonomyRank::Phylum));
        assert_eq!(TaxonomyRank::from_synonym("clade"), None);
    }

    #[test]
    fn test_rank_order_and_codes() {
        let levels: Vec<u8> = TaxonomyRank::ALL.iter().map(|r| r.level()).collect();
        assert_eq!(levels, (1..=9).collect::<Vec<u8>>());
        assert!(TaxonomyRank::Kingdom < TaxonomyRank::Species);
        assert_eq!(TaxonomyRank::Kingdom.code(), "k__");
    }

    #[test]
    fn test_non_simplified_keeps_full_lineage() {
        let lineage = vec![
            TaxonNode::new("1", "root", "no rank"),
            TaxonNode::new("2759", "Eukaryota", "superkingdom"),
            TaxonNode::new("9606", "Homo sapiens", "species"),
        ];
        let path = TaxPath::resolve(lineage, TaxPathOptions::default());
        assert_eq!(path.render(), "root; Eukaryota; Homo sapiens");
        assert!(path.dropped.is_empty());
    }
}
