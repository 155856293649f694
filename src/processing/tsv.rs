/// `id<TAB>text` loader shared by the flat dictionaries (Pfam, InterPro, CDD, Enzyme, EggNog)
use crate::error::Result;
use crate::processing::traits::{LoadStats, TermSink};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

pub fn load_tsv<R: BufRead>(reader: R, sink: &mut dyn TermSink) -> Result<LoadStats> {
    let mut stats = LoadStats::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once('\t') {
            Some((id, text)) if !id.trim().is_empty() => {
                sink.emit(id.trim(), text.trim())?;
                stats.emitted += 1;
            }
            _ => {
                debug!("Skipping malformed line {}: {:?}", line_no + 1, line);
                stats.skipped += 1;
            }
        }
    }

    if stats.skipped > 0 {
        warn!("Skipped {} malformed lines", stats.skipped);
    }
    Ok(stats)
}

pub fn load_tsv_file<P: AsRef<Path>>(path: P, sink: &mut dyn TermSink) -> Result<LoadStats> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let stats = load_tsv(BufReader::new(file), sink)?;
    info!("Loaded {} entries from {}", stats.emitted, path.display());
    Ok(stats)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bio::ontology::GoTerm;
    use pretty_assertions::assert_eq;

    /// Sink that keeps emitted entries in memory
    #[derive(Debug, Default)]
    pub(crate) struct MemorySink {
        pub(crate) entries: Vec<(String, String)>,
        pub(crate) binary: Vec<(String, GoTerm)>,
    }

    impl TermSink for MemorySink {
        fn emit(&mut self, id: &str, text: &str) -> Result<()> {
            self.entries.push((id.to_string(), text.to_string()));
            Ok(())
        }

        fn emit_binary(&mut self, id: &str, term: &GoTerm) -> Result<()> {
            self.binary.push((id.to_string(), term.clone()));
            Ok(())
        }
    }

    #[test]
    fn test_load_tsv_skips_malformed_lines() {
        let input = "PF00001\t7tm_1\n# comment\nno-tab-here\n\t orphan text\nPF00002\t7tm_2\r\n\n";
        let mut sink = MemorySink::default();
        let stats = load_tsv(input.as_bytes(), &mut sink).unwrap();

        assert_eq!(stats, LoadStats { emitted: 2, skipped: 2 });
        assert_eq!(
            sink.entries,
            vec![
                ("PF00001".to_string(), "7tm_1".to_string()),
                ("PF00002".to_string(), "7tm_2".to_string()),
            ]
        );
    }
}
