pub mod enzyme;
pub mod ontology;
pub mod taxonomy;

pub use enzyme::{EnzymeId, EnzymePath};
pub use ontology::{EdgeType, GoGraph, GoPath, GoTerm, OntologyClass};
pub use taxonomy::{TaxPath, TaxPathOptions, TaxonNode, TaxonomyRank};
