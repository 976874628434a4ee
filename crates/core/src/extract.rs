use crate::types::SourceDocument;

/// Flatten every transcript alternative of a document into one space-separated string.
///
/// Alternatives are visited in document order; blank ones are dropped.
pub fn extract_transcript(doc: &SourceDocument) -> String {
    doc.annotation_results
        .iter()
        .flat_map(|result| &result.speech_transcriptions)
        .flat_map(|transcription| &transcription.alternatives)
        .filter_map(|alt| alt.transcript.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Media location recorded by the first annotation result, or `fallback`.
pub fn media_uri(doc: &SourceDocument, fallback: &str) -> String {
    doc.annotation_results
        .first()
        .and_then(|result| result.input_uri.clone())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> SourceDocument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_document_yields_empty_text() {
        assert_eq!(extract_transcript(&doc("{}")), "");
        assert_eq!(extract_transcript(&doc(r#"{"annotation_results": []}"#)), "");
        assert_eq!(
            extract_transcript(&doc(
                r#"{"annotation_results": [{"speech_transcriptions": [{"alternatives": []}]}]}"#
            )),
            ""
        );
    }

    #[test]
    fn blank_and_null_alternatives_are_skipped() {
        let d = doc(
            r#"{"annotation_results": [{"speech_transcriptions": [
                {"alternatives": [{"transcript": "   "}, {"transcript": null}, {}]}
            ]}]}"#,
        );
        assert_eq!(extract_transcript(&d), "");
    }

    #[test]
    fn preserves_nesting_order_and_trims() {
        let d = doc(
            r#"{"annotation_results": [
                {"speech_transcriptions": [
                    {"alternatives": [{"transcript": "  hello ", "confidence": 0.9}]},
                    {"alternatives": [{"transcript": "world"}, {"transcript": "again"}]}
                ]},
                {"speech_transcriptions": [{"alternatives": [{"transcript": "second group "}]}]}
            ]}"#,
        );
        assert_eq!(extract_transcript(&d), "hello world again second group");
    }

    #[test]
    fn media_uri_falls_back_to_document_name() {
        let with_uri = doc(r#"{"annotation_results": [{"input_uri": "/toktiks/a.mp4"}]}"#);
        assert_eq!(media_uri(&with_uri, "t/a.json"), "/toktiks/a.mp4");

        let null_uri = doc(r#"{"annotation_results": [{"input_uri": null}]}"#);
        assert_eq!(media_uri(&null_uri, "t/a.json"), "t/a.json");

        assert_eq!(media_uri(&doc("{}"), "t/b.json"), "t/b.json");
    }
}
