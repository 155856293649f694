/// NCBI taxdump loader (`names.dmp`, `nodes.dmp`, `merged.dmp`)
///
/// Rows are `\t|\t`-separated and end with `\t|`.
use crate::bio::taxonomy;
use crate::error::{DicoError, Result};
use crate::processing::traits::{LoadStats, TermSink};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

pub const NAMES_FILE: &str = "names.dmp";
pub const NODES_FILE: &str = "nodes.dmp";
pub const MERGED_FILE: &str = "merged.dmp";

const SCIENTIFIC_NAME: &str = "scientific name";

fn split_row(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\r', '\n'])
        .trim_end_matches("\t|")
        .split("\t|\t")
        .map(str::trim)
        .collect()
}

fn is_taxid(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

/// Run `row` over every non-empty line, counting rows it rejects
fn for_each_row<R, F>(reader: R, file: &str, mut row: F) -> Result<LoadStats>
where
    R: BufRead,
    F: FnMut(&[&str]) -> Result<Option<bool>>,
{
    let mut stats = LoadStats::default();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match row(&split_row(&line))? {
            Some(true) => stats.emitted += 1,
            Some(false) => {}
            None => {
                debug!("Skipping malformed {} line {}: {:?}", file, line_no + 1, line);
                stats.skipped += 1;
            }
        }
    }
    if stats.skipped > 0 {
        warn!("Skipped {} malformed lines in {}", stats.skipped, file);
    }
    Ok(stats)
}

/// Scientific names → `n<taxid>`
pub fn load_names<R: BufRead>(reader: R, sink: &mut dyn TermSink) -> Result<LoadStats> {
    for_each_row(reader, NAMES_FILE, |fields| {
        if fields.len() < 4 || !is_taxid(fields[0]) || fields[1].is_empty() {
            return Ok(None);
        }
        if fields[3] != SCIENTIFIC_NAME {
            return Ok(Some(false));
        }
        sink.emit(&taxonomy::name_id(fields[0]), fields[1])?;
        Ok(Some(true))
    })
}

/// Tree nodes → `o<taxid>` = `o<parent>|<rank>`
pub fn load_nodes<R: BufRead>(reader: R, sink: &mut dyn TermSink) -> Result<LoadStats> {
    for_each_row(reader, NODES_FILE, |fields| {
        if fields.len() < 3 || !is_taxid(fields[0]) || !is_taxid(fields[1]) {
            return Ok(None);
        }
        sink.emit(
            &taxonomy::tree_id(fields[0]),
            &taxonomy::tree_value(fields[1], fields[2]),
        )?;
        Ok(Some(true))
    })
}

/// Merged ids → `n<old>` = `SYN:<new>`
pub fn load_merged<R: BufRead>(reader: R, sink: &mut dyn TermSink) -> Result<LoadStats> {
    for_each_row(reader, MERGED_FILE, |fields| {
        if fields.len() < 2 || !is_taxid(fields[0]) || !is_taxid(fields[1]) {
            return Ok(None);
        }
        sink.emit(
            &taxonomy::name_id(fields[0]),
            &taxonomy::synonym_value(fields[1]),
        )?;
        Ok(Some(true))
    })
}

/// Load a taxdump directory; `merged.dmp` is optional
pub fn load_taxdump<P: AsRef<Path>>(dir: P, sink: &mut dyn TermSink) -> Result<LoadStats> {
    let dir = dir.as_ref();
    let open = |name: &str| -> Result<BufReader<File>> {
        let path = dir.join(name);
        if !path.is_file() {
            return Err(DicoError::NotFound(format!("{}", path.display())));
        }
        Ok(BufReader::new(File::open(path)?))
    };

    let mut stats = load_names(open(NAMES_FILE)?, sink)?;
    stats.merge(load_nodes(open(NODES_FILE)?, sink)?);
    if dir.join(MERGED_FILE).is_file() {
        stats.merge(load_merged(open(MERGED_FILE)?, sink)?);
    } else {
        debug!("No {} in {}", MERGED_FILE, dir.display());
    }

    info!(
        "Loaded {} taxonomy entries from {} ({} skipped)",
        stats.emitted,
        dir.display(),
        stats.skipped
    );
    Ok(stats)
}
