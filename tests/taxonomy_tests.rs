/// Taxonomy lineage resolution, from taxdump files through the query system
mod common;

use common::TestEnvironment;
use dicoterm::bio::taxonomy::{TaxPath, TaxPathOptions, TaxonNode, TaxonomyRank};
use dicoterm::{DicoError, DicoKind, DicoQuerySystem};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// (taxid, parent, rank, name)
const HUMAN_LINEAGE: &[(&str, &str, &str, &str)] = &[
    ("1", "1", "no rank", "root"),
    ("131567", "1", "cellular root", "cellular organisms"),
    ("2759", "131567", "domain", "Eukaryota"),
    ("33208", "2759", "kingdom", "Metazoa"),
    ("7711", "33208", "phylum", "Chordata"),
    ("40674", "7711", "class", "Mammalia"),
    ("9443", "40674", "order", "Primates"),
    ("9604", "9443", "family", "Hominidae"),
    ("9605", "9604", "genus", "Homo"),
    ("9606", "9605", "species", "Homo sapiens"),
    ("63221", "9606", "subspecies", "Homo sapiens neanderthalensis"),
    ("50", "49", "species", "Orphanus brokenus"),
];

fn human_env() -> (TestEnvironment, DicoQuerySystem) {
    let env = TestEnvironment::new();
    env.build_taxonomy(HUMAN_LINEAGE, &[("63221000", "63221")]);
    let system = DicoQuerySystem::new(env.config.clone()).unwrap();
    (env, system)
}

fn simplified() -> TaxPathOptions {
    TaxPathOptions {
        simplified: true,
        ..TaxPathOptions::default()
    }
}

#[test]
fn test_full_lineage_is_root_first() {
    let (_env, system) = human_env();
    let path = system.get_tax_path("9606", TaxPathOptions::default()).unwrap().unwrap();

    let ids: Vec<&str> = path.lineage.iter().map(|n| n.taxon_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["1", "131567", "2759", "33208", "7711", "40674", "9443", "9604", "9605", "9606"]
    );
    assert!(path.render().starts_with("root; cellular organisms; Eukaryota"));
    assert!(path.render().ends_with("Homo; Homo sapiens"));
}

#[test]
fn test_simplified_prefers_canonical_ranks() {
    let (_env, system) = human_env();
    let path = system.get_tax_path("63221", simplified()).unwrap().unwrap();

    let ranks: Vec<TaxonomyRank> = path.ranked.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, TaxonomyRank::ALL.to_vec());
    assert_eq!(path.ranked[0].label(), "root");
    assert_eq!(path.ranked[8].label(), "Homo sapiens");

    let dropped: Vec<&str> = path.dropped.iter().map(|n| n.taxon_id.as_str()).collect();
    assert_eq!(dropped, vec!["131567", "63221"]);
    assert_eq!(
        path.render(),
        "l__root;d__Eukaryota;k__Metazoa;p__Chordata;c__Mammalia;o__Primates;f__Hominidae;g__Homo;s__Homo sapiens"
    );
}

#[test]
fn test_without_organism_drops_the_leaf() {
    let (_env, system) = human_env();
    let options = TaxPathOptions {
        include_organism: false,
        ..TaxPathOptions::default()
    };
    let path = system.get_tax_path("9606", options).unwrap().unwrap();
    assert_eq!(path.lineage.last().unwrap().taxon_id, "9605");
}

#[test]
fn test_merged_id_follows_synonym() {
    let (_env, system) = human_env();
    assert_eq!(system.resolve_taxon_id("63221000").unwrap(), Some("63221".to_string()));

    let merged = system.get_tax_path("63221000", TaxPathOptions::default()).unwrap();
    let current = system.get_tax_path("63221", TaxPathOptions::default()).unwrap();
    assert_eq!(merged, current);
}

#[test]
fn test_unknown_and_broken_taxa() {
    let (_env, system) = human_env();
    assert_eq!(system.get_tax_path("424242", TaxPathOptions::default()).unwrap(), None);

    match system.get_tax_path("50", TaxPathOptions::default()) {
        Err(DicoError::BrokenChain { from, at }) => {
            assert_eq!(from, "o50");
            assert_eq!(at, "o49");
        }
        other => panic!("Expected BrokenChain, got {:?}", other),
    }
}

#[test]
fn test_name_lookups() {
    let (_env, system) = human_env();
    let term = system.get_term(DicoKind::NcbiTaxonomy, "9606").unwrap().unwrap();
    assert_eq!(term.data_field, "Homo sapiens");
    assert_eq!(
        system.get_id(DicoKind::NcbiTaxonomy, "Homo sapiens").unwrap(),
        Some("9606".to_string())
    );

    let hits = system
        .get_approximate_terms(DicoKind::NcbiTaxonomy, "Homo sapins", None, 5)
        .unwrap();
    assert!(hits.iter().any(|(t, _)| t.id == "n9606"));
    assert!(hits.iter().all(|(t, _)| t.id.starts_with('n')));

    let redirects = system
        .get_approximate_terms(DicoKind::NcbiTaxonomy, "SYN 63221", None, 5)
        .unwrap();
    assert!(redirects.iter().all(|(t, _)| t.id != "n63221000"));
}

#[test]
fn test_tag_missing_rank_fills_gaps() {
    let env = TestEnvironment::new();
    env.build_taxonomy(
        &[
            ("1", "1", "no rank", "root"),
            ("2", "1", "domain", "Bacteria"),
            ("3", "2", "kingdom", "Bacillati"),
            ("4", "3", "phylum", "Actinomycetota"),
            ("7", "4", "family", "Mycobacteriaceae"),
            ("8", "7", "genus", "Mycobacterium"),
            ("9", "8", "species", "Mycobacterium tuberculosis"),
        ],
        &[],
    );
    let system = DicoQuerySystem::new(env.config.clone()).unwrap();

    let options = TaxPathOptions {
        tag_missing_rank: true,
        ..TaxPathOptions::default()
    };
    let path = system.get_tax_path("9", options).unwrap().unwrap();

    assert_eq!(path.ranked.len(), 9);
    assert_eq!(
        path.rank_labels(),
        vec![
            "root",
            "Bacteria",
            "Bacillati",
            "Actinomycetota",
            "unknown",
            "unknown",
            "Mycobacteriaceae",
            "Mycobacterium",
            "Mycobacterium tuberculosis",
        ]
    );
    assert!(path.render().contains("c__unknown;o__unknown"));
}

const RANK_NAMES: &[&str] = &[
    "domain", "superkingdom", "kingdom", "subkingdom", "phylum", "subphylum", "class",
    "subclass", "order", "suborder", "family", "subfamily", "tribe", "genus", "subgenus",
    "species", "subspecies", "strain", "no rank", "clade",
];

fn lineage_of(ranks: &[usize]) -> Vec<TaxonNode> {
    let mut lineage = vec![TaxonNode::new("1", "root", "no rank")];
    lineage.extend(ranks.iter().enumerate().map(|(i, &r)| {
        TaxonNode::new((i + 2).to_string(), format!("taxon {}", i), RANK_NAMES[r])
    }));
    lineage
}

proptest! {
    #[test]
    fn prop_simplified_ranks_are_unique_and_ordered(ranks in prop::collection::vec(0..RANK_NAMES.len(), 0..20)) {
        let path = TaxPath::resolve(lineage_of(&ranks), simplified());
        let levels: Vec<u8> = path.ranked.iter().map(|r| r.rank.level()).collect();

        prop_assert!(levels.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(path.ranked.len() + path.dropped.len(), path.lineage.len());

        for entry in &path.ranked {
            let node = entry.node.as_ref().unwrap();
            let canonical_present = path.lineage.iter().any(|n| {
                TaxonomyRank::from_canonical(&n.rank_name) == Some(entry.rank)
            });
            if canonical_present && entry.rank != TaxonomyRank::Life {
                prop_assert_eq!(TaxonomyRank::from_canonical(&node.rank_name), Some(entry.rank));
            }
        }
    }

    #[test]
    fn prop_tagged_lineage_has_every_rank(ranks in prop::collection::vec(0..RANK_NAMES.len(), 0..20)) {
        let options = TaxPathOptions { tag_missing_rank: true, ..simplified() };
        let path = TaxPath::resolve(lineage_of(&ranks), options);
        prop_assert_eq!(path.ranked.len(), TaxonomyRank::ALL.len());
        prop_assert_eq!(path.ranked[0].label(), "root");
    }
}
