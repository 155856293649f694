/// Term store: one logical dictionary kept in a single index directory
///
/// Every text entry is written three ways: the id as an exact key, the text
/// as a tokenized searchable field and the text again verbatim for exact
/// reverse lookups. Binary entries live under a separate id slot so text and
/// binary documents never share a key.
use crate::error::{DicoError, Result};
use crate::storage::codec;
use crate::storage::query::ApproximateQuery;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tantivy::collector::{Count, DocSetCollector, TopDocs};
use tantivy::directory::{Directory, RamDirectory};
use tantivy::indexer::NoMergePolicy;
use tantivy::query::TermQuery;
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, FAST, STORED, STRING, TEXT};
use tantivy::{
    doc, DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument,
    Term as IndexTerm,
};
use tracing::{debug, info, warn};

/// Sentinel stored when an entry has no text
pub const EMPTY_FIELD: &str = "-";

const FIELD_ID: &str = "id";
const FIELD_TEXT: &str = "text";
const FIELD_EXACT: &str = "exact";
const FIELD_BINARY_ID: &str = "bid";
const FIELD_PAYLOAD: &str = "payload";
const FIELD_SEQUENCE: &str = "seq";

/// Smallest per-thread heap the index writer accepts
pub const MIN_WRITER_HEAP: usize = 15_000_000;

/// A single dictionary entry
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub id: String,
    pub data_field: String,
    pub binary_payload: Option<Vec<u8>>,
}

impl Term {
    pub fn new(id: impl Into<String>, data_field: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data_field: data_field.into(),
            binary_payload: None,
        }
    }

    /// Decode the binary payload into a dictionary-specific record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.binary_payload
            .as_deref()
            .map(codec::decode)
            .transpose()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Read,
    Write,
}

/// Tuning knobs for a term store
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Copy the index into RAM when opening in read mode
    pub load_in_memory: bool,
    /// Number of added entries between two commits
    pub commit_threshold: usize,
    /// Heap handed to the single indexing thread
    pub writer_heap_bytes: usize,
    /// Ceiling on parent-chain walks
    pub max_hops: usize,
    /// Id prefix required for approximate name search results (empty = no filter)
    pub name_prefix: String,
    /// Data-field prefix of entries left out of approximate search (empty = keep all)
    pub redirect_prefix: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            load_in_memory: false,
            commit_threshold: 500_000,
            writer_heap_bytes: 50_000_000,
            max_hops: 64,
            name_prefix: crate::bio::taxonomy::NAME_PREFIX.to_string(),
            redirect_prefix: crate::bio::taxonomy::SYNONYM_PREFIX.to_string(),
        }
    }
}

/// Outcome of walking a parent chain encoded in data fields
#[derive(Debug, Clone, PartialEq)]
pub enum ChainWalk {
    /// Terms ordered root to leaf
    Complete(Vec<Term>),
    /// The walk reached an id with no entry
    Broken { at: String },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Fields {
    pub(crate) id: Field,
    pub(crate) text: Field,
    pub(crate) exact: Field,
    pub(crate) binary_id: Field,
    pub(crate) payload: Field,
    pub(crate) sequence: Field,
}

impl Fields {
    fn build_schema() -> (Schema, Fields) {
        let mut builder = Schema::builder();
        let fields = Fields {
            id: builder.add_text_field(FIELD_ID, STRING | STORED),
            text: builder.add_text_field(FIELD_TEXT, TEXT),
            exact: builder.add_text_field(FIELD_EXACT, STRING | STORED),
            binary_id: builder.add_text_field(FIELD_BINARY_ID, STRING | STORED),
            payload: builder.add_bytes_field(FIELD_PAYLOAD, STORED),
            sequence: builder.add_u64_field(FIELD_SEQUENCE, FAST),
        };
        (builder.build(), fields)
    }

    fn from_schema(schema: &Schema) -> Result<Fields> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| DicoError::Corrupt(format!("missing field '{}' in store schema", name)))
        };
        Ok(Fields {
            id: field(FIELD_ID)?,
            text: field(FIELD_TEXT)?,
            exact: field(FIELD_EXACT)?,
            binary_id: field(FIELD_BINARY_ID)?,
            payload: field(FIELD_PAYLOAD)?,
            sequence: field(FIELD_SEQUENCE)?,
        })
    }
}

enum Backend {
    Closed,
    Writer {
        index: Index,
        writer: IndexWriter,
        pending: usize,
    },
    Reader {
        index: Index,
        reader: OnceCell<IndexReader>,
    },
}

pub struct TermStore {
    path: PathBuf,
    mode: StoreMode,
    options: StoreOptions,
    fields: Fields,
    backend: Backend,
    added: u64,
}

impl std::fmt::Debug for TermStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermStore")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("open", &self.is_open())
            .finish()
    }
}

impl TermStore {
    /// Open a store. Write mode truncates any existing store at `path`;
    /// read mode fails when the directory is missing or not a valid index.
    pub fn open(path: impl AsRef<Path>, mode: StoreMode, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let (fields, backend) = match mode {
            StoreMode::Write => {
                if path.exists() {
                    fs::remove_dir_all(&path)?;
                }
                fs::create_dir_all(&path)?;

                let (schema, fields) = Fields::build_schema();
                let index = Index::create_in_dir(&path, schema)?;
                let writer: IndexWriter = index
                    .writer_with_num_threads(1, options.writer_heap_bytes.max(MIN_WRITER_HEAP))?;
                writer.set_merge_policy(Box::new(NoMergePolicy));

                debug!("Opened term store for writing at {}", path.display());
                (
                    fields,
                    Backend::Writer {
                        index,
                        writer,
                        pending: 0,
                    },
                )
            }
            StoreMode::Read => {
                if !path.is_dir() {
                    return Err(DicoError::NotFound(format!(
                        "term store {}",
                        path.display()
                    )));
                }

                let index = if options.load_in_memory {
                    load_into_ram(&path)?
                } else {
                    Index::open_in_dir(&path).map_err(|e| {
                        DicoError::Corrupt(format!("{}: {}", path.display(), e))
                    })?
                };
                let fields = Fields::from_schema(&index.schema())?;

                debug!(
                    "Opened term store for reading at {} (in memory: {})",
                    path.display(),
                    options.load_in_memory
                );
                (
                    fields,
                    Backend::Reader {
                        index,
                        reader: OnceCell::new(),
                    },
                )
            }
        };

        Ok(Self {
            path,
            mode,
            options,
            fields,
            backend,
            added: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.backend, Backend::Closed)
    }

    /// Number of entries added since the store was opened for writing
    pub fn added(&self) -> u64 {
        self.added
    }

    /// Add a text entry under `id`
    pub fn add_entry(&mut self, id: &str, text: &str) -> Result<()> {
        let text = if text.trim().is_empty() { EMPTY_FIELD } else { text };
        let document = doc!(
            self.fields.id => id.to_string(),
            self.fields.text => text.to_string(),
            self.fields.exact => text.to_string(),
        );
        self.add_document(document)
    }

    /// Serialize `payload` and add it under `id` in the binary slot
    pub fn add_binary_entry<T: Serialize>(&mut self, id: &str, payload: &T) -> Result<()> {
        let bytes = codec::encode(payload)?;
        let document = doc!(
            self.fields.binary_id => id.to_string(),
            self.fields.payload => bytes,
        );
        self.add_document(document)
    }

    fn add_document(&mut self, mut document: TantivyDocument) -> Result<()> {
        let Backend::Writer {
            writer, pending, ..
        } = &mut self.backend
        else {
            return Err(DicoError::NotInitialized);
        };

        document.add_u64(self.fields.sequence, self.added);
        writer.add_document(document)?;
        *pending += 1;
        self.added += 1;

        if *pending >= self.options.commit_threshold {
            writer.commit()?;
            debug!(
                "Committed {} entries to {} ({} total)",
                pending,
                self.path.display(),
                self.added
            );
            *pending = 0;
        }
        Ok(())
    }

    fn searcher(&self) -> Result<Searcher> {
        match &self.backend {
            Backend::Reader { index, reader } => {
                let reader = reader.get_or_try_init(|| {
                    index
                        .reader_builder()
                        .reload_policy(ReloadPolicy::Manual)
                        .try_into()
                })?;
                Ok(reader.searcher())
            }
            _ => Err(DicoError::NotInitialized),
        }
    }

    fn exact_query(field: Field, value: &str) -> TermQuery {
        TermQuery::new(
            IndexTerm::from_field_text(field, value),
            IndexRecordOption::Basic,
        )
    }

    /// Sort hits by write sequence; segment order does not survive merges
    fn in_write_order(
        &self,
        searcher: &Searcher,
        addresses: impl IntoIterator<Item = DocAddress>,
    ) -> Result<Vec<DocAddress>> {
        let mut columns = HashMap::new();
        let mut keyed = Vec::new();
        for address in addresses {
            let column = match columns.entry(address.segment_ord) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(
                    searcher
                        .segment_reader(address.segment_ord)
                        .fast_fields()
                        .u64(FIELD_SEQUENCE)?,
                ),
            };
            let sequence = column.first(address.doc_id).unwrap_or(u64::MAX);
            keyed.push((sequence, address));
        }
        keyed.sort_by_key(|(sequence, address)| (*sequence, address.segment_ord, address.doc_id));
        Ok(keyed.into_iter().map(|(_, address)| address).collect())
    }

    /// Earliest written document whose `field` equals `value`
    fn first_match(&self, searcher: &Searcher, field: Field, value: &str) -> Result<Option<TantivyDocument>> {
        let hits = searcher.search(&Self::exact_query(field, value), &DocSetCollector)?;
        let first = self.in_write_order(searcher, hits)?.into_iter().next();

        match first {
            Some(address) => Ok(Some(searcher.doc(address)?)),
            None => Ok(None),
        }
    }

    fn text_term(&self, document: &TantivyDocument) -> Option<Term> {
        let id = document.get_first(self.fields.id).and_then(|v| v.as_str())?;
        let data_field = document
            .get_first(self.fields.exact)
            .and_then(|v| v.as_str())
            .unwrap_or(EMPTY_FIELD);
        Some(Term::new(id, data_field))
    }

    fn binary_term(&self, document: &TantivyDocument) -> Option<Term> {
        let id = document
            .get_first(self.fields.binary_id)
            .and_then(|v| v.as_str())?;
        let payload = document
            .get_first(self.fields.payload)
            .and_then(|v| v.as_bytes())
            .map(|bytes| bytes.to_vec());
        Some(Term {
            id: id.to_string(),
            data_field: EMPTY_FIELD.to_string(),
            binary_payload: payload,
        })
    }

    fn document_term(&self, document: &TantivyDocument) -> Option<Term> {
        self.text_term(document)
            .or_else(|| self.binary_term(document))
    }

    fn lookup(&self, searcher: &Searcher, id: &str) -> Result<Option<Term>> {
        if let Some(document) = self.first_match(searcher, self.fields.id, id)? {
            return Ok(self.text_term(&document));
        }
        match self.first_match(searcher, self.fields.binary_id, id)? {
            Some(document) => Ok(self.binary_term(&document)),
            None => Ok(None),
        }
    }

    /// Exact id lookup; the first match wins when an id was written twice
    pub fn get_term(&self, id: &str) -> Result<Option<Term>> {
        let searcher = self.searcher()?;
        self.lookup(&searcher, id)
    }

    /// Exact id lookup restricted to binary entries
    pub fn get_binary_term(&self, id: &str) -> Result<Option<Term>> {
        let searcher = self.searcher()?;
        Ok(self
            .first_match(&searcher, self.fields.binary_id, id)?
            .and_then(|document| self.binary_term(&document)))
    }

    /// Positional batch lookup; missing ids yield `None` in place
    pub fn get_terms(&self, ids: &[String]) -> Result<Vec<Option<Term>>> {
        let searcher = self.searcher()?;
        ids.iter().map(|id| self.lookup(&searcher, id)).collect()
    }

    /// Walk the parent chain from `id_from` to `id_to`, reading each parent id
    /// from the text before the first `|` of the data field.
    pub fn walk_chain(&self, id_from: &str, id_to: &str) -> Result<ChainWalk> {
        let searcher = self.searcher()?;
        let mut chain = Vec::new();
        let mut current = id_from.to_string();

        loop {
            if chain.len() >= self.options.max_hops {
                return Err(DicoError::HopLimitExceeded {
                    from: id_from.to_string(),
                    to: id_to.to_string(),
                    limit: self.options.max_hops,
                });
            }

            let Some(term) = self.lookup(&searcher, &current)? else {
                return Ok(ChainWalk::Broken { at: current });
            };

            let reached = current == id_to;
            let parent = parent_id(&term.data_field).to_string();
            chain.push(term);

            if reached {
                break;
            }
            current = parent;
        }

        chain.reverse();
        Ok(ChainWalk::Complete(chain))
    }

    /// Parent chain from `id_from` up to `id_to`, root first; `None` when a link is missing
    pub fn get_term_chain(&self, id_from: &str, id_to: &str) -> Result<Option<Vec<Term>>> {
        match self.walk_chain(id_from, id_to)? {
            ChainWalk::Complete(terms) => Ok(Some(terms)),
            ChainWalk::Broken { .. } => Ok(None),
        }
    }

    /// Exact reverse lookup on the verbatim text
    pub fn get_id(&self, name: &str) -> Result<Option<String>> {
        let searcher = self.searcher()?;
        Ok(self
            .first_match(&searcher, self.fields.exact, name)?
            .and_then(|document| self.text_term(&document))
            .map(|term| term.id))
    }

    /// Fuzzy / wildcard name search, best score first
    pub fn get_approximate_terms(
        &self,
        text: &str,
        fuzziness: Option<&str>,
        max_terms: usize,
    ) -> Result<Vec<(Term, f32)>> {
        if max_terms == 0 {
            return Ok(Vec::new());
        }

        let similarity = ApproximateQuery::parse_fuzziness(fuzziness)?;
        let Some(query) = ApproximateQuery::new(text, similarity, &self.options.name_prefix)
            .excluding_values(&self.options.redirect_prefix)
            .build(self.fields.text, self.fields.id, self.fields.exact)?
        else {
            return Ok(Vec::new());
        };

        let searcher = self.searcher()?;
        let hits = searcher.search(&query, &TopDocs::with_limit(max_terms))?;

        let mut results = Vec::with_capacity(hits.len());
        for (score, address) in hits {
            let document: TantivyDocument = searcher.doc(address)?;
            if let Some(term) = self.text_term(&document) {
                results.push((term, score));
            }
        }
        Ok(results)
    }

    /// All entries stored under `id`, fetched with a result window that
    /// doubles until it is no longer saturated.
    pub fn get_by_id(&self, id: &str, expected_approx_count: usize) -> Result<Vec<Term>> {
        let searcher = self.searcher()?;
        let query = Self::exact_query(self.fields.id, id);
        let mut window = expected_approx_count.max(1);

        let addresses: Vec<DocAddress> = loop {
            let hits = searcher.search(&query, &TopDocs::with_limit(window))?;
            if hits.len() < window {
                break hits.into_iter().map(|(_, address)| address).collect();
            }
            debug!("Result window {} saturated for {}, doubling", window, id);
            window *= 2;
        };

        let addresses = self.in_write_order(&searcher, addresses)?;

        let mut terms = Vec::with_capacity(addresses.len());
        for address in addresses {
            let document: TantivyDocument = searcher.doc(address)?;
            if let Some(term) = self.document_term(&document) {
                terms.push(term);
            }
        }
        Ok(terms)
    }

    /// Number of documents stored under `id`
    pub fn count(&self, id: &str) -> Result<usize> {
        let searcher = self.searcher()?;
        Ok(searcher.search(&Self::exact_query(self.fields.id, id), &Count)?)
    }

    /// Total number of documents in the store
    pub fn size(&self) -> Result<u64> {
        Ok(self.searcher()?.num_docs())
    }

    /// Flush, compact and release a writer, or release readers. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.backend, Backend::Closed) {
            Backend::Writer {
                index, mut writer, ..
            } => {
                writer.commit()?;
                let segments = index.searchable_segment_ids()?;
                if segments.len() > 1 {
                    debug!(
                        "Compacting {} segments in {}",
                        segments.len(),
                        self.path.display()
                    );
                    writer.merge(&segments).wait()?;
                }
                writer.wait_merging_threads()?;
                info!(
                    "Closed term store {} ({} entries written)",
                    self.path.display(),
                    self.added
                );
            }
            Backend::Reader { .. } => {
                debug!("Released readers for {}", self.path.display());
            }
            Backend::Closed => {}
        }
        Ok(())
    }
}

impl Drop for TermStore {
    fn drop(&mut self) {
        if matches!(self.backend, Backend::Writer { .. }) {
            if let Err(e) = self.close() {
                warn!("Failed to close term store {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Parent id encoded in a chained data field: text before the first `|`,
/// or the whole trimmed field
pub fn parent_id(data_field: &str) -> &str {
    match data_field.split_once('|') {
        Some((parent, _)) => parent.trim(),
        None => data_field.trim(),
    }
}

fn load_into_ram(path: &Path) -> Result<Index> {
    let directory = RamDirectory::create();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(".lock") {
            continue;
        }
        let data = fs::read(entry.path())?;
        directory.atomic_write(Path::new(&name), &data)?;
    }

    Index::open(directory).map_err(|e| DicoError::Corrupt(format!("{}: {}", path.display(), e)))
}
