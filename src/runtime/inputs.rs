/// Input collection for a node about to execute

use crate::workflow::types::{Edge, OutputBag};
use std::collections::HashMap;

/// Merge the output bags of every completed upstream producer of `target_id`
///
/// Edges are visited in edge-list order and each producer's bag is overlaid on the
/// result, so when two producers set the same slot the later edge wins. Producers
/// that have not completed (failed, or not yet run) contribute nothing, and a slot a
/// producer leaves unset never clears a value from an earlier edge.
pub fn collect_inputs(
    target_id: &str,
    edges: &[Edge],
    outputs: &HashMap<String, OutputBag>,
) -> OutputBag {
    let mut merged = OutputBag::default();
    for edge in edges.iter().filter(|edge| edge.target == target_id) {
        if let Some(upstream) = outputs.get(&edge.source) {
            tracing::debug!("🔌 '{}' receives output of '{}'", target_id, edge.source);
            merged.merge_from(upstream);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> OutputBag {
        OutputBag {
            text: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn node_without_edges_gets_empty_bag() {
        let outputs = HashMap::from([("a".to_string(), text("hello"))]);
        assert!(collect_inputs("b", &[], &outputs).is_empty());
    }

    #[test]
    fn incomplete_producers_are_skipped() {
        let edges = vec![Edge::new("failed", "c"), Edge::new("ok", "c")];
        let outputs = HashMap::from([("ok".to_string(), text("from ok"))]);
        assert_eq!(collect_inputs("c", &edges, &outputs), text("from ok"));
    }

    #[test]
    fn later_edge_wins_on_shared_slot() {
        let edges = vec![Edge::new("a", "c"), Edge::new("b", "c")];
        let outputs = HashMap::from([
            ("a".to_string(), text("from a")),
            ("b".to_string(), text("from b")),
        ]);
        assert_eq!(collect_inputs("c", &edges, &outputs).text.as_deref(), Some("from b"));

        let reversed = vec![Edge::new("b", "c"), Edge::new("a", "c")];
        assert_eq!(
            collect_inputs("c", &reversed, &outputs).text.as_deref(),
            Some("from a")
        );
    }

    #[test]
    fn distinct_slots_from_several_producers_combine() {
        let edges = vec![Edge::new("prompt", "video"), Edge::new("clip", "video")];
        let outputs = HashMap::from([
            ("prompt".to_string(), text("dance")),
            (
                "clip".to_string(),
                OutputBag {
                    file_url: Some("https://cdn/clip.mp4".into()),
                    file_type: Some("video".into()),
                    video_url: Some("https://cdn/clip.mp4".into()),
                    ..Default::default()
                },
            ),
        ]);
        let merged = collect_inputs("video", &edges, &outputs);
        assert_eq!(merged.text.as_deref(), Some("dance"));
        assert_eq!(merged.video_url.as_deref(), Some("https://cdn/clip.mp4"));
        assert_eq!(merged.image_url, None);
    }

    #[test]
    fn edges_into_other_nodes_are_ignored() {
        let edges = vec![Edge::new("a", "other")];
        let outputs = HashMap::from([("a".to_string(), text("x"))]);
        assert!(collect_inputs("c", &edges, &outputs).is_empty());
    }
}
