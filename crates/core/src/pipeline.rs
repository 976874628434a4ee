use std::{fmt, str::FromStr, sync::Arc};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    catalog::serialize_catalog,
    enrich::Enricher,
    error::{ClipdexError, Result},
    extract::{extract_transcript, media_uri},
    storage::ObjectStore,
    types::{CatalogEntry, SourceDocument},
};

pub const SOURCE_EXTENSION: &str = ".json";
pub const CATALOG_CONTENT_TYPE: &str = "application/json";

/// What happens when a single source document cannot be processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Skip the document and continue, whatever failed.
    #[default]
    SkipAll,
    /// Abort the run when a document cannot be downloaded or parsed;
    /// enrichment failures are still skipped.
    FailOnStorageError,
}

impl FromStr for FailurePolicy {
    type Err = ClipdexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip-all" => Ok(FailurePolicy::SkipAll),
            "fail-on-storage-error" => Ok(FailurePolicy::FailOnStorageError),
            other => Err(ClipdexError::Config {
                reason: format!(
                    "unknown failure policy {other:?} (expected skip-all or fail-on-storage-error)"
                ),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Only objects whose names start with this are considered.
    pub prefix: String,
    /// Object the catalog is written to.
    pub output_object: String,
    pub failure_policy: FailurePolicy,
}

/// Step of per-document processing that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipStage {
    Download,
    Parse,
    Enrich,
}

impl fmt::Display for SkipStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SkipStage::Download => "download",
            SkipStage::Parse => "parse",
            SkipStage::Enrich => "enrich",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Cataloged {
        object: String,
        char_count: u64,
        tag_count: usize,
    },
    Skipped {
        object: String,
        stage: SkipStage,
        reason: String,
    },
}

impl ItemOutcome {
    pub fn object(&self) -> &str {
        match self {
            ItemOutcome::Cataloged { object, .. } | ItemOutcome::Skipped { object, .. } => object,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ItemOutcome::Skipped { .. })
    }
}

/// Result of one builder run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub run_id: Uuid,
    pub container: String,
    pub output_object: String,
    /// Objects returned by the prefix scan, before filtering.
    pub listed: usize,
    /// One outcome per considered source document, in processing order.
    pub outcomes: Vec<ItemOutcome>,
    pub entries: Vec<CatalogEntry>,
}

impl BuildReport {
    pub fn skipped(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }
}

/// Observer for per-document progress. All hooks default to no-ops.
pub trait BuildProgress {
    fn scan_finished(&mut self, _listed: usize) {}
    fn item_started(&mut self, _index: usize, _object: &str) {}
    fn item_finished(&mut self, _outcome: &ItemOutcome) {}
    fn catalog_written(&mut self, _object: &str, _entries: usize) {}
}

/// Progress observer that ignores everything.
pub struct NoProgress;

impl BuildProgress for NoProgress {}

/// Base name of an object path.
fn base_name(object: &str) -> &str {
    object.rsplit('/').next().unwrap_or(object)
}

/// Whether `name` is a source document for a catalog written to `output_object`.
pub fn is_source_document(name: &str, output_object: &str) -> bool {
    name.to_lowercase().ends_with(SOURCE_EXTENSION) && !name.ends_with(base_name(output_object))
}

/// Scans a container for transcription documents and writes the enriched catalog.
pub struct CatalogBuilder {
    store: Arc<dyn ObjectStore>,
    enricher: Enricher,
    config: BuildConfig,
}

enum ItemError {
    Skip(SkipStage, String),
    Abort(ClipdexError),
}

impl CatalogBuilder {
    pub fn new(store: Arc<dyn ObjectStore>, enricher: Enricher, config: BuildConfig) -> Self {
        Self {
            store,
            enricher,
            config,
        }
    }

    /// Documents are processed one at a time in the order the store lists them.
    /// Listing and uploading failures end the run; per-document failures are
    /// handled according to the [`FailurePolicy`].
    pub async fn run(&self, progress: &mut dyn BuildProgress) -> Result<BuildReport> {
        let run_id = Uuid::new_v4();
        let container = self.store.container().to_string();
        info!(
            %run_id,
            "Listing JSON files in {}/{}",
            container,
            self.config.prefix
        );

        let names = self.store.list(&self.config.prefix).await?;
        progress.scan_finished(names.len());

        let mut outcomes = Vec::new();
        let mut entries = Vec::new();

        let sources = names
            .iter()
            .filter(|name| is_source_document(name, &self.config.output_object));
        for (i, name) in sources.enumerate() {
            progress.item_started(i + 1, name);
            info!(%run_id, "[{}] Processing: {}", i + 1, name);

            let outcome = match self.process(name).await {
                Ok(entry) => {
                    let outcome = ItemOutcome::Cataloged {
                        object: name.clone(),
                        char_count: entry.char_count,
                        tag_count: entry.tags.len(),
                    };
                    entries.push(entry);
                    outcome
                }
                Err(ItemError::Skip(stage, reason)) => {
                    warn!(%run_id, "Skipping {} due to {} error: {}", name, stage, reason);
                    ItemOutcome::Skipped {
                        object: name.clone(),
                        stage,
                        reason,
                    }
                }
                Err(ItemError::Abort(e)) => return Err(e),
            };

            progress.item_finished(&outcome);
            outcomes.push(outcome);
        }

        let body = serialize_catalog(&entries)?;
        self.store
            .upload(&self.config.output_object, body, CATALOG_CONTENT_TYPE)
            .await?;
        progress.catalog_written(&self.config.output_object, entries.len());
        info!(
            %run_id,
            "Wrote {} items to {}/{}",
            entries.len(),
            container,
            self.config.output_object
        );

        Ok(BuildReport {
            run_id,
            container,
            output_object: self.config.output_object.clone(),
            listed: names.len(),
            outcomes,
            entries,
        })
    }

    async fn process(&self, name: &str) -> std::result::Result<CatalogEntry, ItemError> {
        let text = self
            .store
            .download_text(name)
            .await
            .map_err(|e| self.storage_failure(name, SkipStage::Download, e.to_string()))?;
        let doc: SourceDocument = serde_json::from_str(&text)
            .map_err(|e| self.storage_failure(name, SkipStage::Parse, e.to_string()))?;

        let transcript = extract_transcript(&doc);
        let video_uri = media_uri(&doc, name);
        let enrichment = self
            .enricher
            .enrich(&transcript)
            .await
            .map_err(|e| ItemError::Skip(SkipStage::Enrich, e.to_string()))?;

        Ok(CatalogEntry {
            source_json_path: name.to_string(),
            video_uri,
            summary: enrichment.summary,
            tags: enrichment.tags,
            char_count: transcript.chars().count() as u64,
        })
    }

    fn storage_failure(&self, name: &str, stage: SkipStage, reason: String) -> ItemError {
        match self.config.failure_policy {
            FailurePolicy::SkipAll => ItemError::Skip(stage, reason),
            FailurePolicy::FailOnStorageError => ItemError::Abort(ClipdexError::ItemFailed {
                object: name.to_string(),
                reason: format!("{stage} failed: {reason}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        catalog::parse_catalog,
        enrich::{EnrichError, TextGenerator},
        storage::MemoryStore,
    };

    /// Replies with a fixed tag set, or fails for prompts mentioning "explode".
    struct ScriptedGenerator;

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(&self, prompt: &str) -> std::result::Result<String, EnrichError> {
            if prompt.contains("explode") {
                return Err(EnrichError::InvalidApiResponse {
                    reason: "model unavailable".to_string(),
                });
            }
            Ok(r#"{"summary": "Summarized.", "tags": ["Pets", "Cats"]}"#.to_string())
        }
    }

    fn transcript_doc(text: &str, uri: &str) -> String {
        serde_json::json!({
            "annotation_results": [{
                "input_uri": uri,
                "speech_transcriptions": [{"alternatives": [{"transcript": text}]}]
            }]
        })
        .to_string()
    }

    fn builder(store: Arc<MemoryStore>, policy: FailurePolicy) -> CatalogBuilder {
        CatalogBuilder::new(
            store,
            Enricher::new(Box::new(ScriptedGenerator)),
            BuildConfig {
                prefix: String::new(),
                output_object: "categorized_videos.json".to_string(),
                failure_policy: policy,
            },
        )
    }

    #[test]
    fn source_filter_skips_non_json_and_own_output() {
        let output = "out/categorized_videos.json";
        assert!(is_source_document("t/a.json", output));
        assert!(is_source_document("t/A.JSON", output));
        assert!(!is_source_document("t/a.mp4", output));
        assert!(!is_source_document("categorized_videos.json", output));
        assert!(!is_source_document("old/categorized_videos.json", output));
    }

    #[test]
    fn failure_policy_parses_from_flags() {
        assert_eq!("skip-all".parse::<FailurePolicy>().unwrap(), FailurePolicy::SkipAll);
        assert_eq!(
            "fail-on-storage-error".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::FailOnStorageError
        );
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[tokio::test]
    async fn download_failure_is_skipped_and_run_continues() {
        let store = Arc::new(
            MemoryStore::new("toktiks")
                .with_object("t/broken.json", transcript_doc("x", "/toktiks/b.mp4"))
                .with_object("t/good.json", transcript_doc("a cat", "/toktiks/g.mp4")),
        );
        store.fail_download("t/broken.json");

        let report = builder(store.clone(), FailurePolicy::SkipAll)
            .run(&mut NoProgress)
            .await
            .unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].source_json_path, "t/good.json");
        assert_eq!(report.entries[0].video_uri, "/toktiks/g.mp4");
        assert_eq!(report.entries[0].tags, vec!["pets", "cats"]);
        assert_eq!(report.entries[0].char_count, 5);
        assert_eq!(report.skipped().count(), 1);
        assert!(matches!(
            &report.outcomes[0],
            ItemOutcome::Skipped { stage: SkipStage::Download, .. }
        ));

        let written = store.get("categorized_videos.json").unwrap();
        assert_eq!(parse_catalog(&written).unwrap(), report.entries);
    }

    #[tokio::test]
    async fn filters_names_and_tolerates_bad_documents() {
        let store = Arc::new(
            MemoryStore::new("toktiks")
                .with_object("categorized_videos.json", "[]")
                .with_object("t/video.mp4", "binary")
                .with_object("t/not-json.json", "{oops")
                .with_object("t/empty.json", "{}")
                .with_object("t/fails.json", transcript_doc("explode", "/toktiks/f.mp4")),
        );

        let report = builder(store, FailurePolicy::SkipAll)
            .run(&mut NoProgress)
            .await
            .unwrap();

        assert_eq!(report.listed, 5);
        let stages: Vec<Option<SkipStage>> = report
            .outcomes
            .iter()
            .map(|o| match o {
                ItemOutcome::Skipped { stage, .. } => Some(*stage),
                ItemOutcome::Cataloged { .. } => None,
            })
            .collect();
        assert_eq!(stages, vec![Some(SkipStage::Parse), None, Some(SkipStage::Enrich)]);

        let empty = &report.entries[0];
        assert_eq!(empty.source_json_path, "t/empty.json");
        assert_eq!(empty.video_uri, "t/empty.json");
        assert_eq!(empty.summary, "No transcript text found.");
        assert_eq!(empty.char_count, 0);
    }

    #[tokio::test]
    async fn strict_policy_aborts_on_download_but_not_on_enrichment() {
        let store = Arc::new(
            MemoryStore::new("toktiks")
                .with_object("a.json", transcript_doc("explode", "/toktiks/a.mp4"))
                .with_object("b.json", transcript_doc("fine", "/toktiks/b.mp4")),
        );
        let report = builder(store.clone(), FailurePolicy::FailOnStorageError)
            .run(&mut NoProgress)
            .await
            .unwrap();
        assert_eq!(report.entries.len(), 1);

        store.fail_download("b.json");
        let err = builder(store, FailurePolicy::FailOnStorageError)
            .run(&mut NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClipdexError::ItemFailed { ref object, .. } if object == "b.json"
        ));
    }

    #[tokio::test]
    async fn progress_sees_every_item() {
        #[derive(Default)]
        struct Recorder {
            started: Vec<(usize, String)>,
            finished: usize,
            written: Option<(String, usize)>,
        }

        impl BuildProgress for Recorder {
            fn item_started(&mut self, index: usize, object: &str) {
                self.started.push((index, object.to_string()));
            }
            fn item_finished(&mut self, _outcome: &ItemOutcome) {
                self.finished += 1;
            }
            fn catalog_written(&mut self, object: &str, entries: usize) {
                self.written = Some((object.to_string(), entries));
            }
        }

        let store = Arc::new(
            MemoryStore::new("toktiks")
                .with_object("a.json", transcript_doc("one", "/toktiks/a.mp4"))
                .with_object("b.json", transcript_doc("two", "/toktiks/b.mp4")),
        );
        let mut recorder = Recorder::default();
        builder(store, FailurePolicy::SkipAll)
            .run(&mut recorder)
            .await
            .unwrap();

        assert_eq!(
            recorder.started,
            vec![(1, "a.json".to_string()), (2, "b.json".to_string())]
        );
        assert_eq!(recorder.finished, 2);
        assert_eq!(
            recorder.written,
            Some(("categorized_videos.json".to_string(), 2))
        );
    }
}
