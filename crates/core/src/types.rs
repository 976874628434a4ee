use serde::{Deserialize, Serialize};

/// One speech-transcription result document as written by the transcription job.
///
/// Every field is optional on the wire and defaulted here, so a document with
/// missing sections parses into empty collections instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub annotation_results: Vec<AnnotationResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationResult {
    /// Location of the media the transcript was produced from, usually `/{bucket}/{object}`.
    #[serde(default)]
    pub input_uri: Option<String>,
    #[serde(default)]
    pub speech_transcriptions: Vec<SpeechTranscription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechTranscription {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Summary and tags produced for one transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub summary: String,
    pub tags: Vec<String>,
}

/// One record of the persisted catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub source_json_path: String,
    pub video_uri: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub char_count: u64,
}
