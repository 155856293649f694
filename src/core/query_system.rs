/// Dictionary query façade
///
/// `DicoQuerySystem` holds one read-mode backend per configured dictionary.
/// Dictionaries without a store on disk are absent, and lookups against them
/// return `None` or an empty result. A process-wide instance is available
/// through [`open`] / [`close`].
use crate::bio::enzyme::EnzymePath;
use crate::bio::ontology::{GoGraph, GoPath, GoTerm};
use crate::bio::taxonomy::{self, TaxPath, TaxPathOptions, TaxonNode};
use crate::core::config::DicoConfig;
use crate::core::dico::{BackendRole, DicoKind, StoreLayout};
use crate::error::{DicoError, Result};
use crate::storage::{
    ChainWalk, NoopMonitor, ShardedStore, StoreMode, TaxonPrefixShardKey, Term, TermStore,
};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Window used for cross-reference lookups when the caller has no estimate
pub const DEFAULT_XREF_WINDOW: usize = 10;

static INSTANCE: Lazy<Mutex<Option<Arc<DicoQuerySystem>>>> = Lazy::new(|| Mutex::new(None));

/// Process-wide instance for `config`. A live instance with the same
/// configuration is reused; a different configuration replaces it.
pub fn open(config: DicoConfig) -> Result<Arc<DicoQuerySystem>> {
    let mut slot = INSTANCE.lock();

    if let Some(existing) = slot.as_ref() {
        if existing.is_open() && existing.config() == &config {
            return Ok(Arc::clone(existing));
        }
    }
    if let Some(previous) = slot.take() {
        info!("Replacing dictionary query system with a new configuration");
        previous.close()?;
    }

    let system = Arc::new(DicoQuerySystem::new(config)?);
    *slot = Some(Arc::clone(&system));
    Ok(system)
}

/// The live process-wide instance, if any
pub fn instance() -> Option<Arc<DicoQuerySystem>> {
    INSTANCE.lock().clone()
}

/// Close and forget the process-wide instance. The next [`open`] builds a fresh one.
pub fn close() -> Result<()> {
    let previous = INSTANCE.lock().take();
    match previous {
        Some(system) => system.close(),
        None => Ok(()),
    }
}

/// Backends opened for one dictionary
#[derive(Debug, Default)]
struct OpenDico {
    terms: Option<TermStore>,
    xrefs: Option<ShardedStore>,
}

impl OpenDico {
    fn close(&mut self) -> Result<()> {
        if let Some(mut store) = self.terms.take() {
            store.close()?;
        }
        if let Some(mut store) = self.xrefs.take() {
            store.close(&NoopMonitor)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct DicoQuerySystem {
    config: DicoConfig,
    dicos: RwLock<HashMap<DicoKind, OpenDico>>,
    open: AtomicBool,
}

impl DicoQuerySystem {
    /// Open every dictionary that has a store under the configured root
    pub fn new(config: DicoConfig) -> Result<Self> {
        config.validate()?;
        let mut dicos = HashMap::new();

        for kind in DicoKind::ALL {
            let mut dico = OpenDico::default();
            for spec in kind.backends() {
                let dir = config.backend_dir(kind, spec);
                if !dir.is_dir() {
                    debug!("No {} store at {}", spec.reader, dir.display());
                    continue;
                }

                let options = config.store_options(kind);
                match (spec.role, spec.layout) {
                    (BackendRole::Terms, StoreLayout::Single) => {
                        dico.terms = Some(TermStore::open(&dir, StoreMode::Read, options)?);
                    }
                    (BackendRole::CrossReferences, StoreLayout::Sharded) => {
                        dico.xrefs = Some(ShardedStore::open(
                            &dir,
                            StoreMode::Read,
                            options,
                            TaxonPrefixShardKey::new(config.shards.shard_count),
                            config.shards.parallel,
                        )?);
                    }
                    (role, layout) => {
                        warn!(
                            "Unsupported backend {} ({:?}, {:?}), skipping",
                            spec.reader, role, layout
                        );
                    }
                }
            }

            if dico.terms.is_some() || dico.xrefs.is_some() {
                info!("Opened {} dictionary", kind);
                dicos.insert(kind, dico);
            }
        }

        Ok(Self {
            config,
            dicos: RwLock::new(dicos),
            open: AtomicBool::new(true),
        })
    }

    pub fn config(&self) -> &DicoConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn has_dico_available(&self, kind: DicoKind) -> bool {
        self.dicos.read().contains_key(&kind)
    }

    pub fn available_dicos(&self) -> Vec<DicoKind> {
        let dicos = self.dicos.read();
        DicoKind::ALL
            .into_iter()
            .filter(|kind| dicos.contains_key(kind))
            .collect()
    }

    /// Run `f` against the term store of `kind`; `None` when it is not configured
    fn with_terms<T>(
        &self,
        kind: DicoKind,
        f: impl FnOnce(&TermStore) -> Result<T>,
    ) -> Result<Option<T>> {
        let dicos = self.dicos.read();
        match dicos.get(&kind).and_then(|dico| dico.terms.as_ref()) {
            Some(store) => f(store).map(Some),
            None => Ok(None),
        }
    }

    /// Exact lookup; taxonomy ids are name-encoded first
    pub fn get_term(&self, kind: DicoKind, id: &str) -> Result<Option<Term>> {
        let id = kind.encode_id(id);
        Ok(self.with_terms(kind, |store| store.get_term(&id))?.flatten())
    }

    /// Positional batch lookup
    pub fn get_terms(&self, kind: DicoKind, ids: &[String]) -> Result<Vec<Option<Term>>> {
        let encoded: Vec<String> = ids.iter().map(|id| kind.encode_id(id)).collect();
        Ok(self
            .with_terms(kind, |store| store.get_terms(&encoded))?
            .unwrap_or_else(|| vec![None; ids.len()]))
    }

    /// Exact reverse lookup of a label
    pub fn get_id(&self, kind: DicoKind, name: &str) -> Result<Option<String>> {
        Ok(self
            .with_terms(kind, |store| store.get_id(name))?
            .flatten()
            .map(|id| kind.decode_id(&id).to_string()))
    }

    /// Fuzzy name search; `fuzziness` defaults to the configured similarity
    pub fn get_approximate_terms(
        &self,
        kind: DicoKind,
        text: &str,
        fuzziness: Option<&str>,
        max_terms: usize,
    ) -> Result<Vec<(Term, f32)>> {
        let default_fuzziness = self.config.search.approximate_fuzziness.to_string();
        let fuzziness = fuzziness.unwrap_or(&default_fuzziness);
        Ok(self
            .with_terms(kind, |store| {
                store.get_approximate_terms(text, Some(fuzziness), max_terms)
            })?
            .unwrap_or_default())
    }

    /// Current taxon id, following one merged-id redirect; `None` for an unknown taxon
    pub fn resolve_taxon_id(&self, id: &str) -> Result<Option<String>> {
        let id = taxonomy::taxid_of_tree_id(DicoKind::NcbiTaxonomy.decode_id(id.trim()));
        let Some(term) = self.get_term(DicoKind::NcbiTaxonomy, id)? else {
            return Ok(None);
        };
        match taxonomy::synonym_target(&term.data_field) {
            Some(target) => {
                debug!("Taxon {} was merged into {}", id, target);
                Ok(Some(target.to_string()))
            }
            None => Ok(Some(id.to_string())),
        }
    }

    /// Lineage of a taxon with canonical ranks assigned. A lineage that
    /// stops before the root is a `BrokenChain` error.
    pub fn get_tax_path(&self, id: &str, options: TaxPathOptions) -> Result<Option<TaxPath>> {
        if !self.has_dico_available(DicoKind::NcbiTaxonomy) {
            return Ok(None);
        }
        let Some(taxid) = self.resolve_taxon_id(id)? else {
            return Ok(None);
        };

        let from = taxonomy::tree_id(&taxid);
        let root = taxonomy::tree_id(taxonomy::ROOT_TAXON);
        let walk = self.with_terms(DicoKind::NcbiTaxonomy, |store| store.walk_chain(&from, &root))?;

        let chain = match walk {
            Some(ChainWalk::Complete(chain)) => chain,
            Some(ChainWalk::Broken { at }) => return Err(DicoError::BrokenChain { from, at }),
            None => return Ok(None),
        };

        let name_ids: Vec<String> = chain
            .iter()
            .map(|term| taxonomy::name_id(taxonomy::taxid_of_tree_id(&term.id)))
            .collect();
        let names = self.get_terms(DicoKind::NcbiTaxonomy, &name_ids)?;

        let lineage = chain
            .iter()
            .zip(names)
            .map(|(node, name)| {
                let taxon_id = taxonomy::taxid_of_tree_id(&node.id);
                let name = match name {
                    Some(term) => term.data_field,
                    None => {
                        warn!("Taxon {} has no scientific name", taxon_id);
                        taxon_id.to_string()
                    }
                };
                TaxonNode::new(taxon_id, name, taxonomy::rank_name(&node.data_field))
            })
            .collect();

        Ok(Some(TaxPath::resolve(lineage, options)))
    }

    /// Ancestor subgraph of `id` rebuilt from the binary GO entries
    fn load_go_subgraph(&self, id: &str) -> Result<Option<(GoGraph, String)>> {
        let loaded = self.with_terms(DicoKind::GeneOntology, |store| {
            let Some(start) = load_go_term(store, id)? else {
                return Ok(None);
            };

            let start_id = start.id.clone();
            let mut graph = GoGraph::new();
            let mut seen: HashSet<String> = HashSet::from([start_id.clone()]);
            let mut queue: VecDeque<GoTerm> = VecDeque::from([start]);

            while let Some(term) = queue.pop_front() {
                for edge in &term.parents {
                    if !seen.insert(edge.id.clone()) {
                        continue;
                    }
                    let parent = load_go_term(store, &edge.id)?.ok_or_else(|| {
                        DicoError::BrokenChain {
                            from: start_id.clone(),
                            at: edge.id.clone(),
                        }
                    })?;
                    queue.push_back(parent);
                }
                graph.insert(term);
            }
            Ok(Some((graph, start_id)))
        })?;
        Ok(loaded.flatten())
    }

    /// Every root-to-term path of a GO term
    pub fn get_go_paths(&self, id: &str) -> Result<Option<Vec<GoPath>>> {
        match self.load_go_subgraph(id)? {
            Some((graph, start)) => graph.create_tree(&start).map(Some),
            None => Ok(None),
        }
    }

    /// GO paths rendered as `[edgeType] id name;...`
    pub fn get_go_path(&self, id: &str) -> Result<Option<Vec<String>>> {
        Ok(self
            .get_go_paths(id)?
            .map(|paths| paths.iter().map(GoPath::render).collect()))
    }

    /// GO paths rendered as `id;id;...`
    pub fn get_go_path_id(&self, id: &str) -> Result<Option<Vec<String>>> {
        Ok(self
            .get_go_paths(id)?
            .map(|paths| paths.iter().map(GoPath::render_ids).collect()))
    }

    /// Enzyme class hierarchy of an EC number; missing levels are skipped
    pub fn get_enzyme_path(&self, id: &str) -> Result<Option<EnzymePath>> {
        if !self.has_dico_available(DicoKind::Enzyme) {
            return Ok(None);
        }
        let path = EnzymePath::resolve(id, |candidate| {
            Ok(self
                .get_term(DicoKind::Enzyme, candidate)?
                .map(|term| term.data_field))
        })?;
        Ok((!path.is_empty()).then_some(path))
    }

    /// Cross-referenced EggNog records of a protein id
    pub fn get_eggnog_xrefs(&self, protein_id: &str, expected_approx_count: usize) -> Result<Vec<Term>> {
        let dicos = self.dicos.read();
        match dicos.get(&DicoKind::EggNog).and_then(|dico| dico.xrefs.as_ref()) {
            Some(store) => store.get_by_id(protein_id, expected_approx_count),
            None => Ok(Vec::new()),
        }
    }

    /// Document counts per backend, for reporting
    pub fn sizes(&self) -> Result<Vec<(DicoKind, &'static str, u64)>> {
        let dicos = self.dicos.read();
        let mut sizes = Vec::new();
        for kind in DicoKind::ALL {
            let Some(dico) = dicos.get(&kind) else {
                continue;
            };
            for spec in kind.backends() {
                let size = match spec.role {
                    BackendRole::Terms => dico.terms.as_ref().map(TermStore::size),
                    BackendRole::CrossReferences => dico.xrefs.as_ref().map(ShardedStore::size),
                };
                if let Some(size) = size {
                    sizes.push((kind, spec.reader, size?));
                }
            }
        }
        Ok(sizes)
    }

    /// Release every backend and clear the registry. Idempotent.
    pub fn close(&self) -> Result<()> {
        let mut dicos = self.dicos.write();
        self.open.store(false, Ordering::SeqCst);
        for (kind, mut dico) in dicos.drain() {
            dico.close()?;
            debug!("Closed {} dictionary", kind);
        }
        Ok(())
    }
}

fn load_go_term(store: &TermStore, id: &str) -> Result<Option<GoTerm>> {
    match store.get_binary_term(id)? {
        Some(term) => term.decode::<GoTerm>(),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_root_has_no_dicos() {
        let temp = TempDir::new().unwrap();
        let system = DicoQuerySystem::new(DicoConfig::with_root(temp.path())).unwrap();

        assert!(system.available_dicos().is_empty());
        assert!(!system.has_dico_available(DicoKind::Pfam));
        assert_eq!(system.get_term(DicoKind::Pfam, "PF00001").unwrap(), None);
        assert_eq!(
            system.get_terms(DicoKind::Pfam, &["a".to_string(), "b".to_string()]).unwrap(),
            vec![None, None]
        );
        assert_eq!(system.get_tax_path("9606", TaxPathOptions::default()).unwrap(), None);
        assert_eq!(system.get_go_path("GO:0008150").unwrap(), None);
        assert_eq!(system.get_enzyme_path("1.1.1.1").unwrap(), None);
        assert!(system.get_eggnog_xrefs("9606.P1", 10).unwrap().is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let system = DicoQuerySystem::new(DicoConfig::with_root(temp.path())).unwrap();
        system.close().unwrap();
        system.close().unwrap();
        assert!(!system.is_open());
    }
}
