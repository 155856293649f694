/// OBO loader feeding the GO graph builder
use crate::bio::ontology::{EdgeType, GoEdge, GoGraph, OntologyClass, TermRecord};
use crate::error::Result;
use crate::processing::traits::{LoadStats, TermSink};
use crate::storage::EMPTY_FIELD;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

const TERM_STANZA: &str = "[Term]";

/// Build the GO graph from an OBO file. Non-`[Term]` stanzas are ignored and
/// a stanza without an id is logged and skipped.
pub fn parse_obo<R: BufRead>(reader: R) -> Result<(GoGraph, LoadStats)> {
    let mut graph = GoGraph::seeded();
    let mut stats = LoadStats::default();
    let mut current: Option<TermRecord> = None;
    let mut in_term = false;

    let finish = |record: Option<TermRecord>, graph: &mut GoGraph, stats: &mut LoadStats| {
        let Some(record) = record else {
            return;
        };
        if record.id.is_empty() {
            warn!("Skipping [Term] stanza without an id");
            stats.skipped += 1;
            return;
        }
        graph.add_record(record);
        stats.emitted += 1;
    };

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.starts_with('[') {
            finish(current.take(), &mut graph, &mut stats);
            in_term = line == TERM_STANZA;
            if in_term {
                current = Some(TermRecord::default());
            }
            continue;
        }
        if !in_term || line.is_empty() || line.starts_with('!') {
            continue;
        }
        let Some(record) = current.as_mut() else {
            continue;
        };
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "id" => record.id = value.to_string(),
            "name" => record.name = value.to_string(),
            "namespace" => {
                record.namespace = OntologyClass::from_namespace(value);
                if record.namespace.is_none() {
                    debug!("Unknown namespace '{}' for {}", value, record.id);
                }
            }
            "is_a" => {
                if let Some(parent) = value.split_whitespace().next() {
                    record.parents.push(GoEdge::new(parent, EdgeType::IsA));
                }
            }
            "relationship" => {
                let mut parts = value.split_whitespace();
                if let (Some(relation), Some(parent)) = (parts.next(), parts.next()) {
                    let edge_type = EdgeType::from_relationship(relation);
                    if edge_type == EdgeType::Unknown {
                        debug!("Keeping unknown relationship '{}' on {}", relation, record.id);
                    }
                    record.parents.push(GoEdge::new(parent, edge_type));
                }
            }
            "alt_id" => record.alt_ids.push(value.to_string()),
            "is_obsolete" => record.obsolete = value == "true",
            _ => {}
        }
    }
    finish(current.take(), &mut graph, &mut stats);

    let stubs = graph.stubs().count();
    if stubs > 0 {
        warn!("{} GO terms are referenced but never declared", stubs);
    }
    info!(
        "Parsed {} GO terms ({} graph nodes, {} skipped)",
        stats.emitted,
        graph.len(),
        stats.skipped
    );
    Ok((graph, stats))
}

/// Write every graph node, and every alternate id, as a name entry plus a
/// binary GO term entry
pub fn store_graph(graph: &GoGraph, sink: &mut dyn TermSink) -> Result<LoadStats> {
    let mut stats = LoadStats::default();

    for term in graph.terms() {
        let name = if term.name.is_empty() { EMPTY_FIELD } else { term.name.as_str() };
        sink.emit(&term.id, name)?;
        sink.emit_binary(&term.id, term)?;
        stats.emitted += 1;
    }
    for (alias, canonical) in graph.aliases() {
        if let Some(term) = graph.get(canonical) {
            sink.emit(alias, &term.name)?;
            sink.emit_binary(alias, term)?;
            stats.emitted += 1;
        }
    }
    Ok(stats)
}

pub fn load_obo<R: BufRead>(reader: R, sink: &mut dyn TermSink) -> Result<LoadStats> {
    let (graph, parsed) = parse_obo(reader)?;
    let mut stats = store_graph(&graph, sink)?;
    stats.skipped += parsed.skipped;
    Ok(stats)
}

pub fn load_obo_file<P: AsRef<Path>>(path: P, sink: &mut dyn TermSink) -> Result<LoadStats> {
    let path = path.as_ref();
    let stats = load_obo(BufReader::new(File::open(path)?), sink)?;
    info!("Stored {} GO entries from {}", stats.emitted, path.display());
    Ok(stats)
}
