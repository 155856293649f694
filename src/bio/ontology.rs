/// Gene Ontology graph
///
/// Terms live in an arena (`Vec<GoTerm>`) addressed through an id → index map
/// that also carries alternate ids. Parent and child links are ids resolved
/// through that map, so forward references only need a stub node.
use crate::error::{DicoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Grand root every namespace root hangs from
pub const GRAND_ROOT_ID: &str = "GO:0000000";
pub const GRAND_ROOT_NAME: &str = "gene_ontology";

/// Relation between a GO term and one of its parents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    IsA,
    PartOf,
    Regulates,
    PositivelyRegulates,
    NegativelyRegulates,
    Obsolete,
    Unknown,
}

impl EdgeType {
    /// Edge type named by an OBO `relationship:` keyword
    pub fn from_relationship(name: &str) -> Self {
        match name.trim() {
            "is_a" => Self::IsA,
            "part_of" => Self::PartOf,
            "regulates" => Self::Regulates,
            "positively_regulates" => Self::PositivelyRegulates,
            "negatively_regulates" => Self::NegativelyRegulates,
            "obsolete" => Self::Obsolete,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsA => "is_a",
            Self::PartOf => "part_of",
            Self::Regulates => "regulates",
            Self::PositivelyRegulates => "positively_regulates",
            Self::NegativelyRegulates => "negatively_regulates",
            Self::Obsolete => "obsolete",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three top-level GO namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OntologyClass {
    BiologicalProcess,
    MolecularFunction,
    CellularComponent,
}

impl OntologyClass {
    pub const ALL: [OntologyClass; 3] = [
        Self::BiologicalProcess,
        Self::MolecularFunction,
        Self::CellularComponent,
    ];

    pub fn from_namespace(namespace: &str) -> Option<Self> {
        match namespace.trim() {
            "biological_process" => Some(Self::BiologicalProcess),
            "molecular_function" => Some(Self::MolecularFunction),
            "cellular_component" => Some(Self::CellularComponent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BiologicalProcess => "biological_process",
            Self::MolecularFunction => "molecular_function",
            Self::CellularComponent => "cellular_component",
        }
    }

    /// Id of the namespace root term
    pub fn root_id(&self) -> &'static str {
        match self {
            Self::BiologicalProcess => "GO:0008150",
            Self::MolecularFunction => "GO:0003674",
            Self::CellularComponent => "GO:0005575",
        }
    }

    /// Id of the synthetic root collecting obsolete terms of this namespace
    pub fn obsolete_root_id(&self) -> &'static str {
        match self {
            Self::BiologicalProcess => "GO:OBSOLETE_BP",
            Self::MolecularFunction => "GO:OBSOLETE_MF",
            Self::CellularComponent => "GO:OBSOLETE_CC",
        }
    }
}

impl fmt::Display for OntologyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoEdge {
    pub id: String,
    pub edge_type: EdgeType,
}

impl GoEdge {
    pub fn new(id: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            id: id.into(),
            edge_type,
        }
    }
}

/// A GO term as stored in the binary slot of the GO dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoTerm {
    pub id: String,
    /// Empty while the term is a forward-reference stub
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ontology_class: Option<OntologyClass>,
    #[serde(default)]
    pub parents: Vec<GoEdge>,
    #[serde(default)]
    pub children: Vec<GoEdge>,
    #[serde(default)]
    pub alt_ids: Vec<String>,
    #[serde(default)]
    pub obsolete: bool,
}

impl GoTerm {
    pub fn stub(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            ontology_class: None,
            parents: Vec::new(),
            children: Vec::new(),
            alt_ids: Vec::new(),
            obsolete: false,
        }
    }

    pub fn is_stub(&self) -> bool {
        self.name.is_empty()
    }
}

/// One `[Term]` record as read from an ontology file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermRecord {
    pub id: String,
    pub name: String,
    pub namespace: Option<OntologyClass>,
    pub parents: Vec<GoEdge>,
    pub alt_ids: Vec<String>,
    pub obsolete: bool,
}

/// One step of a GO path; `edge_type` links this term to the step before it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoPathStep {
    pub id: String,
    pub name: String,
    pub edge_type: Option<EdgeType>,
}

/// A root-to-term walk through the GO graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoPath {
    pub steps: Vec<GoPathStep>,
}

impl GoPath {
    /// `[edgeType] id name;...`, the root step without an edge tag
    pub fn render(&self) -> String {
        self.steps
            .iter()
            .map(|step| match step.edge_type {
                Some(edge) => format!("[{}] {} {}", edge, step.id, step.name),
                None => format!("{} {}", step.id, step.name),
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// `id;id;...`
    pub fn render_ids(&self) -> String {
        self.steps
            .iter()
            .map(|step| step.id.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Arena-backed multi-parent GO graph
#[derive(Debug, Clone, Default)]
pub struct GoGraph {
    nodes: Vec<GoTerm>,
    index: HashMap<String, usize>,
}

impl GoGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph pre-seeded with the grand root, the three namespace roots and
    /// one obsolete root per namespace
    pub fn seeded() -> Self {
        let mut graph = Self::new();
        let grand_root = graph.intern(GRAND_ROOT_ID);
        graph.nodes[grand_root].name = GRAND_ROOT_NAME.to_string();

        for class in OntologyClass::ALL {
            let root = graph.intern(class.root_id());
            graph.nodes[root].name = class.as_str().to_string();
            graph.nodes[root].ontology_class = Some(class);
            graph.link(root, grand_root, EdgeType::IsA);

            let obsolete = graph.intern(class.obsolete_root_id());
            graph.nodes[obsolete].name = format!("obsolete {}", class.as_str());
            graph.nodes[obsolete].ontology_class = Some(class);
            graph.nodes[obsolete].obsolete = true;
            graph.link(obsolete, root, EdgeType::IsA);
        }
        graph
    }

    /// Index of `id`, creating a stub node when it is not known yet
    fn intern(&mut self, id: &str) -> usize {
        if let Some(&index) = self.index.get(id) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(GoTerm::stub(id));
        self.index.insert(id.to_string(), index);
        index
    }

    fn link(&mut self, child: usize, parent: usize, edge_type: EdgeType) {
        let parent_id = self.nodes[parent].id.clone();
        let child_id = self.nodes[child].id.clone();

        let parents = &mut self.nodes[child].parents;
        if !parents.iter().any(|e| e.id == parent_id && e.edge_type == edge_type) {
            parents.push(GoEdge::new(parent_id, edge_type));
        }
        let children = &mut self.nodes[parent].children;
        if !children.iter().any(|e| e.id == child_id && e.edge_type == edge_type) {
            children.push(GoEdge::new(child_id, edge_type));
        }
    }

    /// Add an ontology record, back-filling a stub created by an earlier forward reference
    pub fn add_record(&mut self, record: TermRecord) {
        let node = self.intern(&record.id);
        {
            let term = &mut self.nodes[node];
            if !term.is_stub() {
                debug!("GO term {} declared twice, merging records", record.id);
            }
            term.name = record.name;
            if record.namespace.is_some() {
                term.ontology_class = record.namespace;
            }
            term.obsolete |= record.obsolete;
        }

        for edge in &record.parents {
            let parent = self.intern(&edge.id);
            self.link(node, parent, edge.edge_type);
        }

        if record.obsolete {
            let obsolete_root = match self.nodes[node].ontology_class {
                Some(class) => class.obsolete_root_id(),
                None => GRAND_ROOT_ID,
            };
            let parent = self.intern(obsolete_root);
            self.link(node, parent, EdgeType::Obsolete);
        }

        for alt_id in record.alt_ids {
            self.add_alias(&alt_id, node);
        }
    }

    fn add_alias(&mut self, alias: &str, node: usize) {
        match self.index.get(alias) {
            Some(&existing) if existing != node => {
                debug!(
                    "Alternate id {} already names {}, keeping it",
                    alias, self.nodes[existing].id
                );
            }
            Some(_) => {}
            None => {
                self.index.insert(alias.to_string(), node);
                if !self.nodes[node].alt_ids.iter().any(|a| a == alias) {
                    self.nodes[node].alt_ids.push(alias.to_string());
                }
            }
        }
    }

    /// Insert a term loaded from a store, keeping its stored edges as-is
    pub fn insert(&mut self, term: GoTerm) {
        let id = term.id.clone();
        let aliases = term.alt_ids.clone();
        let node = match self.index.get(&id) {
            Some(&existing) => {
                self.nodes[existing] = term;
                existing
            }
            None => {
                self.nodes.push(term);
                let node = self.nodes.len() - 1;
                self.index.insert(id, node);
                node
            }
        };
        for alias in aliases {
            self.index.entry(alias).or_insert(node);
        }
    }

    pub fn get(&self, id: &str) -> Option<&GoTerm> {
        self.index.get(id).map(|&index| &self.nodes[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &GoTerm> {
        self.nodes.iter()
    }

    /// `(alternate id, canonical id)` pairs
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.index.iter().filter_map(|(key, &index)| {
            let canonical = self.nodes[index].id.as_str();
            (key != canonical).then_some((key.as_str(), canonical))
        })
    }

    /// Terms still waiting for their own record
    pub fn stubs(&self) -> impl Iterator<Item = &GoTerm> {
        self.nodes.iter().filter(|term| term.is_stub())
    }

    /// Every root-to-`id` path over parent edges. A term without parents ends
    /// a path. Fails with `CycleDetected` when a walk revisits a term.
    pub fn create_tree(&self, id: &str) -> Result<Vec<GoPath>> {
        let start = *self
            .index
            .get(id)
            .ok_or_else(|| DicoError::NotFound(format!("GO term {}", id)))?;

        let mut paths = Vec::new();
        let mut on_path = vec![false; self.nodes.len()];
        let mut walk = Vec::new();
        self.collect_paths(start, None, &mut on_path, &mut walk, &mut paths)?;
        Ok(paths)
    }

    fn collect_paths(
        &self,
        node: usize,
        edge_type: Option<EdgeType>,
        on_path: &mut [bool],
        walk: &mut Vec<GoPathStep>,
        paths: &mut Vec<GoPath>,
    ) -> Result<()> {
        if on_path[node] {
            return Err(DicoError::CycleDetected(self.nodes[node].id.clone()));
        }
        on_path[node] = true;

        let term = &self.nodes[node];
        walk.push(GoPathStep {
            id: term.id.clone(),
            name: term.name.clone(),
            edge_type,
        });

        if term.parents.is_empty() {
            paths.push(self.finish_path(walk));
        } else {
            for edge in &term.parents {
                let parent = *self.index.get(&edge.id).ok_or_else(|| DicoError::BrokenChain {
                    from: walk[0].id.clone(),
                    at: edge.id.clone(),
                })?;
                self.collect_paths(parent, Some(edge.edge_type), on_path, walk, paths)?;
            }
        }

        walk.pop();
        on_path[node] = false;
        Ok(())
    }

    /// Turn a leaf-to-root walk into a root-to-leaf path, moving each edge
    /// onto the more specific term it leads to
    fn finish_path(&self, walk: &[GoPathStep]) -> GoPath {
        let mut steps: Vec<GoPathStep> = walk.iter().rev().cloned().collect();
        let edges: Vec<Option<EdgeType>> = walk.iter().rev().map(|step| step.edge_type).collect();
        for (i, step) in steps.iter_mut().enumerate() {
            step.edge_type = if i == 0 { None } else { edges[i - 1] };
        }
        GoPath { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, name: &str, parents: &[(&str, EdgeType)]) -> TermRecord {
        TermRecord {
            id: id.to_string(),
            name: name.to_string(),
            namespace: Some(OntologyClass::BiologicalProcess),
            parents: parents.iter().map(|(p, e)| GoEdge::new(*p, *e)).collect(),
            alt_ids: Vec::new(),
            obsolete: false,
        }
    }

    #[test]
    fn test_edge_type_keywords() {
        assert_eq!(EdgeType::from_relationship("part_of"), EdgeType::PartOf);
        assert_eq!(
            EdgeType::from_relationship("negatively_regulates"),
            EdgeType::NegativelyRegulates
        );
        assert_eq!(EdgeType::from_relationship("occurs_in"), EdgeType::Unknown);
    }

    #[test]
    fn test_seeded_roots_reach_grand_root() {
        let graph = GoGraph::seeded();
        let paths = graph.create_tree("GO:OBSOLETE_MF").unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(
            paths[0].render_ids(),
            "GO:0000000;GO:0003674;GO:OBSOLETE_MF"
        );
    }

    #[test]
    fn test_forward_reference_is_back_filled() {
        let mut graph = GoGraph::seeded();
        graph.add_record(record("GO:2", "child", &[("GO:1", EdgeType::IsA)]));
        assert!(graph.get("GO:1").unwrap().is_stub());

        graph.add_record(record("GO:1", "parent", &[("GO:0008150", EdgeType::IsA)]));
        let parent = graph.get("GO:1").unwrap();
        assert_eq!(parent.name, "parent");
        assert_eq!(parent.children, vec![GoEdge::new("GO:2", EdgeType::IsA)]);
        assert_eq!(graph.stubs().count(), 0);
    }

    #[test]
    fn test_render_moves_edges_onto_child() {
        let mut graph = GoGraph::seeded();
        graph.add_record(record("GO:1", "parent", &[("GO:0008150", EdgeType::IsA)]));
        graph.add_record(record("GO:2", "child", &[("GO:1", EdgeType::PartOf)]));

        let paths = graph.create_tree("GO:2").unwrap();
        assert_eq!(
            paths[0].render(),
            "GO:0000000 gene_ontology;[is_a] GO:0008150 biological_process;[is_a] GO:1 parent;[part_of] GO:2 child"
        );
    }

    #[test]
    fn test_obsolete_term_hangs_from_obsolete_root() {
        let mut graph = GoGraph::seeded();
        let mut obsolete = record("GO:9", "obsolete thing", &[]);
        obsolete.obsolete = true;
        graph.add_record(obsolete);

        let paths = graph.create_tree("GO:9").unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].steps.last().unwrap().edge_type, Some(EdgeType::Obsolete));
        assert_eq!(paths[0].steps[2].id, "GO:OBSOLETE_BP");
    }

    #[test]
    fn test_alternate_ids_resolve_to_same_node() {
        let mut graph = GoGraph::seeded();
        let mut term = record("GO:5", "term", &[("GO:0008150", EdgeType::IsA)]);
        term.alt_ids = vec!["GO:6".to_string()];
        graph.add_record(term);

        assert_eq!(graph.get("GO:6").unwrap().id, "GO:5");
        assert_eq!(graph.aliases().collect::<Vec<_>>(), vec![("GO:6", "GO:5")]);
        assert_eq!(graph.create_tree("GO:6").unwrap()[0].steps.last().unwrap().id, "GO:5");
    }

    #[test]
    fn test_unknown_start_is_not_found() {
        let graph = GoGraph::seeded();
        assert!(matches!(graph.create_tree("GO:404"), Err(DicoError::NotFound(_))));
    }
}
