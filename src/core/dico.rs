/// Dictionary kinds and the backends each one is stored in
use crate::bio::taxonomy;
use crate::error::DicoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum DicoKind {
    #[value(name = "go")]
    GeneOntology,
    #[value(name = "interpro")]
    InterPro,
    #[value(name = "taxonomy")]
    NcbiTaxonomy,
    #[value(name = "pfam")]
    Pfam,
    #[value(name = "enzyme")]
    Enzyme,
    #[value(name = "cdd")]
    Cdd,
    #[value(name = "eggnog")]
    EggNog,
}

/// How a backend lays its entries out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLayout {
    Single,
    Sharded,
}

/// What a backend answers for its dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendRole {
    /// id → label (and binary payloads)
    Terms,
    /// id → many cross-referenced records
    CrossReferences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendSpec {
    /// Reader identifier used by producers and in logs
    pub reader: &'static str,
    pub role: BackendRole,
    pub layout: StoreLayout,
    /// Sub-directory of the dictionary directory; `None` uses it directly
    pub subdir: Option<&'static str>,
}

const fn single(reader: &'static str) -> BackendSpec {
    BackendSpec {
        reader,
        role: BackendRole::Terms,
        layout: StoreLayout::Single,
        subdir: None,
    }
}

const GO_BACKENDS: [BackendSpec; 1] = [single("go")];
const INTERPRO_BACKENDS: [BackendSpec; 1] = [single("interpro")];
const TAXONOMY_BACKENDS: [BackendSpec; 1] = [single("ncbi_taxonomy")];
const PFAM_BACKENDS: [BackendSpec; 1] = [single("pfam")];
const ENZYME_BACKENDS: [BackendSpec; 1] = [single("enzyme")];
const CDD_BACKENDS: [BackendSpec; 1] = [single("cdd")];
const EGGNOG_BACKENDS: [BackendSpec; 2] = [
    BackendSpec {
        reader: "eggnog_desc",
        role: BackendRole::Terms,
        layout: StoreLayout::Single,
        subdir: Some("desc"),
    },
    BackendSpec {
        reader: "eggnog_xref",
        role: BackendRole::CrossReferences,
        layout: StoreLayout::Sharded,
        subdir: Some("xref"),
    },
];

impl DicoKind {
    pub const ALL: [DicoKind; 7] = [
        Self::GeneOntology,
        Self::InterPro,
        Self::NcbiTaxonomy,
        Self::Pfam,
        Self::Enzyme,
        Self::Cdd,
        Self::EggNog,
    ];

    /// Name used for directories and configuration keys
    pub fn name(&self) -> &'static str {
        match self {
            Self::GeneOntology => "go",
            Self::InterPro => "interpro",
            Self::NcbiTaxonomy => "taxonomy",
            Self::Pfam => "pfam",
            Self::Enzyme => "enzyme",
            Self::Cdd => "cdd",
            Self::EggNog => "eggnog",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GeneOntology => "Gene Ontology",
            Self::InterPro => "InterPro",
            Self::NcbiTaxonomy => "NCBI Taxonomy",
            Self::Pfam => "Pfam",
            Self::Enzyme => "Enzyme",
            Self::Cdd => "CDD",
            Self::EggNog => "EggNog",
        }
    }

    pub fn backends(&self) -> &'static [BackendSpec] {
        match self {
            Self::GeneOntology => &GO_BACKENDS,
            Self::InterPro => &INTERPRO_BACKENDS,
            Self::NcbiTaxonomy => &TAXONOMY_BACKENDS,
            Self::Pfam => &PFAM_BACKENDS,
            Self::Enzyme => &ENZYME_BACKENDS,
            Self::Cdd => &CDD_BACKENDS,
            Self::EggNog => &EGGNOG_BACKENDS,
        }
    }

    pub fn backend(&self, role: BackendRole) -> Option<&'static BackendSpec> {
        self.backends().iter().find(|spec| spec.role == role)
    }

    /// Id prefix that marks searchable name entries
    pub fn name_prefix(&self) -> &'static str {
        match self {
            Self::NcbiTaxonomy => taxonomy::NAME_PREFIX,
            _ => "",
        }
    }

    /// Data-field prefix of redirect entries that are not real names
    pub fn redirect_prefix(&self) -> &'static str {
        match self {
            Self::NcbiTaxonomy => taxonomy::SYNONYM_PREFIX,
            _ => "",
        }
    }

    /// Store id for a caller-facing id
    pub fn encode_id(&self, id: &str) -> String {
        match self {
            Self::NcbiTaxonomy if !id.starts_with(taxonomy::NAME_PREFIX) => taxonomy::name_id(id),
            _ => id.to_string(),
        }
    }

    /// Caller-facing id for a store id
    pub fn decode_id<'a>(&self, id: &'a str) -> &'a str {
        match self {
            Self::NcbiTaxonomy => id.strip_prefix(taxonomy::NAME_PREFIX).unwrap_or(id),
            _ => id,
        }
    }
}

impl fmt::Display for DicoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for DicoKind {
    type Err = DicoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| DicoError::Parse(format!("unknown dictionary '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_ids_are_name_encoded() {
        assert_eq!(DicoKind::NcbiTaxonomy.encode_id("9606"), "n9606");
        assert_eq!(DicoKind::NcbiTaxonomy.encode_id("n9606"), "n9606");
        assert_eq!(DicoKind::NcbiTaxonomy.decode_id("n9606"), "9606");
        assert_eq!(DicoKind::Enzyme.encode_id("1.1.1.1"), "1.1.1.1");
        assert_eq!(DicoKind::GeneOntology.encode_id("GO:0008150"), "GO:0008150");
    }

    #[test]
    fn test_eggnog_has_two_backends() {
        let backends = DicoKind::EggNog.backends();
        assert_eq!(backends.len(), 2);
        assert_eq!(
            DicoKind::EggNog.backend(BackendRole::CrossReferences).unwrap().layout,
            StoreLayout::Sharded
        );
        for kind in DicoKind::ALL {
            assert!(kind.backend(BackendRole::Terms).is_some(), "{}", kind);
        }
    }

    #[test]
    fn test_from_str_round_trips_names() {
        for kind in DicoKind::ALL {
            assert_eq!(kind.name().parse::<DicoKind>().unwrap(), kind);
        }
        assert!("uniprot".parse::<DicoKind>().is_err());
    }
}
