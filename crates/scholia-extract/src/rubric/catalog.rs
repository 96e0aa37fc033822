//! Cached rubric lookup and paper-type routing.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use scholia_core::{PaperType, Result};

use super::defaults;
use super::store::{RubricStore, YamlRubricStore};
use super::Rubric;

/// Rubric used when nothing else can be loaded.
pub const FALLBACK_RUBRIC_ID: &str = "empirical_default";

/// Default rubric id for a paper type when no stored rubric claims it.
pub fn fallback_id(paper_type: Option<PaperType>) -> &'static str {
    match paper_type {
        Some(PaperType::SurveyReview) | Some(PaperType::PositionPaper) => "survey_default",
        Some(PaperType::ConceptualFramework) => "framework_default",
        Some(PaperType::CaseStudy) => "case_study_default",
        Some(PaperType::BenchmarkComparison) => "benchmark_default",
        Some(PaperType::TutorialMethodology) => "tutorial_default",
        Some(PaperType::EmpiricalStudy) | None => FALLBACK_RUBRIC_ID,
    }
}

/// Rubric catalog over an injected store, with a per-instance cache.
pub struct RuleCatalog {
    store: Arc<dyn RubricStore>,
    cache: RwLock<HashMap<String, Arc<Rubric>>>,
}

impl RuleCatalog {
    pub fn new(store: Arc<dyn RubricStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Catalog over `<dir>/<id>.yaml` files.
    pub fn yaml(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(YamlRubricStore::new(dir)))
    }

    /// Load a rubric, serving repeats from the cache.
    pub fn load(&self, id: &str) -> Result<Arc<Rubric>> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(rubric) = cache.get(id) {
                return Ok(Arc::clone(rubric));
            }
        }

        let rubric = Arc::new(self.store.load(id)?);
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(id.to_string(), Arc::clone(&rubric));
        Ok(rubric)
    }

    /// Persist a rubric and refresh its cache entry.
    pub fn save(&self, rubric: &Rubric) -> Result<()> {
        self.store.save(rubric)?;
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(rubric.id.clone(), Arc::new(rubric.clone()));
        Ok(())
    }

    /// Stored rubric ids, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        self.store.list_ids()
    }

    pub fn clear_cache(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.clear();
    }

    /// Write any missing built-in rubric. Existing files are left untouched.
    ///
    /// Returns how many rubrics were written.
    pub fn bootstrap(&self) -> Result<usize> {
        let mut written = 0;
        for rubric in defaults::all() {
            if self.store.exists(&rubric.id) {
                continue;
            }
            self.store.save(&rubric)?;
            written += 1;
        }
        tracing::info!(
            subsystem = "catalog",
            op = "bootstrap",
            result_count = written,
            "Default rubrics bootstrapped"
        );
        Ok(written)
    }

    /// Pick the rubric for a paper classification.
    ///
    /// Stored rubrics claiming the type win (lowest id first), then the
    /// per-type default, then the built-in empirical rubric. Never fails.
    pub fn select_for(&self, paper_type: Option<PaperType>) -> Arc<Rubric> {
        if let Some(paper_type) = paper_type {
            if let Some(rubric) = self.exact_match(paper_type) {
                tracing::debug!(
                    subsystem = "catalog",
                    op = "select_for",
                    rubric_id = %rubric.id,
                    paper_type = %paper_type,
                    "Selected rubric by paper type"
                );
                return rubric;
            }
        }

        let id = fallback_id(paper_type);
        match self.load(id) {
            Ok(rubric) => {
                tracing::debug!(
                    subsystem = "catalog",
                    op = "select_for",
                    rubric_id = %id,
                    "Selected fallback rubric"
                );
                rubric
            }
            Err(e) => {
                tracing::warn!(
                    subsystem = "catalog",
                    op = "select_for",
                    rubric_id = %id,
                    error = %e,
                    "Fallback rubric unavailable, using built-in default"
                );
                Arc::new(builtin(id))
            }
        }
    }

    fn exact_match(&self, paper_type: PaperType) -> Option<Arc<Rubric>> {
        let ids = match self.store.list_ids() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(
                    subsystem = "catalog",
                    op = "select_for",
                    error = %e,
                    "Could not list rubrics"
                );
                return None;
            }
        };

        for id in ids {
            match self.load(&id) {
                Ok(rubric) if rubric.applies_to(paper_type) => return Some(rubric),
                Ok(_) => {}
                Err(e) => tracing::warn!(
                    subsystem = "catalog",
                    op = "select_for",
                    rubric_id = %id,
                    error = %e,
                    "Skipping unloadable rubric"
                ),
            }
        }
        None
    }
}

/// Built-in rubric for `id`, or the empirical default.
fn builtin(id: &str) -> Rubric {
    defaults::by_id(id).unwrap_or_else(defaults::empirical_default)
}

impl std::fmt::Debug for RuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.cache.read().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("RuleCatalog")
            .field("cached", &cached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::store::InMemoryRubricStore;
    use scholia_core::Error;

    fn empty_catalog() -> RuleCatalog {
        RuleCatalog::new(Arc::new(InMemoryRubricStore::new()))
    }

    #[test]
    fn test_fallback_chain() {
        assert_eq!(fallback_id(Some(PaperType::PositionPaper)), "survey_default");
        assert_eq!(fallback_id(Some(PaperType::SurveyReview)), "survey_default");
        assert_eq!(
            fallback_id(Some(PaperType::ConceptualFramework)),
            "framework_default"
        );
        assert_eq!(fallback_id(Some(PaperType::CaseStudy)), "case_study_default");
        assert_eq!(
            fallback_id(Some(PaperType::BenchmarkComparison)),
            "benchmark_default"
        );
        assert_eq!(
            fallback_id(Some(PaperType::TutorialMethodology)),
            "tutorial_default"
        );
        assert_eq!(fallback_id(Some(PaperType::EmpiricalStudy)), "empirical_default");
        assert_eq!(fallback_id(None), "empirical_default");
    }

    #[test]
    fn test_empty_store_uses_builtin() {
        let catalog = empty_catalog();
        assert_eq!(
            catalog.select_for(Some(PaperType::SurveyReview)).id,
            "survey_default"
        );
        assert_eq!(catalog.select_for(None).id, "empirical_default");
    }

    #[test]
    fn test_exact_match_beats_fallback() {
        let catalog = empty_catalog();
        let mut custom = defaults::empirical_default();
        custom.id = "a_custom_empirical".to_string();
        custom.paper_types = vec![PaperType::EmpiricalStudy];
        catalog.save(&custom).unwrap();
        catalog.bootstrap().unwrap();

        assert_eq!(
            catalog.select_for(Some(PaperType::EmpiricalStudy)).id,
            "a_custom_empirical"
        );
    }

    #[test]
    fn test_sorted_scan_prefers_lowest_id() {
        let catalog = empty_catalog();
        catalog.bootstrap().unwrap();
        // benchmark_default and empirical_default both claim benchmark papers.
        assert_eq!(
            catalog.select_for(Some(PaperType::BenchmarkComparison)).id,
            "benchmark_default"
        );
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let catalog = empty_catalog();
        assert_eq!(catalog.bootstrap().unwrap(), 6);
        assert_eq!(catalog.bootstrap().unwrap(), 0);
        assert_eq!(catalog.list().unwrap().len(), 6);
    }

    #[test]
    fn test_bootstrap_never_overwrites() {
        let catalog = empty_catalog();
        let mut edited = defaults::survey_default();
        edited.name = "Edited Survey".to_string();
        catalog.save(&edited).unwrap();
        catalog.bootstrap().unwrap();
        catalog.clear_cache();

        assert_eq!(catalog.load("survey_default").unwrap().name, "Edited Survey");
    }

    #[test]
    fn test_load_is_cached() {
        let catalog = empty_catalog();
        catalog.bootstrap().unwrap();
        let a = catalog.load("tutorial_default").unwrap();
        let b = catalog.load("tutorial_default").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        catalog.clear_cache();
        let c = catalog.load("tutorial_default").unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_missing_rubric_error() {
        let err = empty_catalog().load("nope").unwrap_err();
        assert!(matches!(err, Error::RubricNotFound(_)));
    }
}
