//! Depth-first traversal of document trees: collecting references and
//! rebuilding a tree with references replaced or dropped.
//!
//! Traversal never descends into a reference node itself. Arrays keep their
//! order, objects keep their key order.

use std::collections::HashSet;
use std::future::Future;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};

use super::{classify, Node, Reference};
use crate::document::id::DocumentRef;

/// What to put in place of a visited reference node.
#[derive(Debug, Clone, PartialEq)]
pub enum Visit {
    /// Keep the node as it is.
    Keep,
    Replace(Value),
    /// Filter it out of its array or unset it from its object.
    Omit,
}

/// Every reference reachable from `value`, depth first.
pub fn collect_references(value: &Value) -> Vec<Reference<'_>> {
    let mut found = Vec::new();
    collect_into(value, &mut found);
    found
}

fn collect_into<'a>(value: &'a Value, found: &mut Vec<Reference<'a>>) {
    match classify(value) {
        Node::Reference(reference) => found.push(reference),
        Node::Array(items) => items.iter().for_each(|item| collect_into(item, found)),
        Node::Object(map) => map.values().for_each(|v| collect_into(v, found)),
        Node::Leaf(_) => {}
    }
}

/// Synchronous structural clone with every reference passed through `visit`.
///
/// Returns `None` only when `value` is itself a reference that was omitted.
pub fn map_references<F>(value: &Value, visit: &mut F) -> Option<Value>
where
    F: FnMut(Reference<'_>) -> Visit,
{
    match classify(value) {
        Node::Reference(reference) => match visit(reference) {
            Visit::Keep => Some(value.clone()),
            Visit::Replace(replacement) => Some(replacement),
            Visit::Omit => None,
        },
        Node::Array(items) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| map_references(item, visit))
                .collect(),
        )),
        Node::Object(map) => {
            let mut out = Map::new();
            for (key, v) in map {
                if let Some(mapped) = map_references(v, visit) {
                    out.insert(key.clone(), mapped);
                }
            }
            Some(Value::Object(out))
        }
        Node::Leaf(leaf) => Some(leaf.clone()),
    }
}

/// Remove every reference whose target, with any draft prefix stripped,
/// is one of `excluded_ids` (also compared without draft prefix).
///
/// Only the reference node goes; a container left empty stays in place.
/// A root that is itself an excluded reference becomes `null`.
pub fn prune<S: AsRef<str>>(value: &Value, excluded_ids: &[S]) -> Value {
    let excluded: HashSet<&str> = excluded_ids
        .iter()
        .map(|id| DocumentRef::normalize(id.as_ref()))
        .collect();

    map_references(value, &mut |reference| match reference.target() {
        Some(target) if excluded.contains(DocumentRef::normalize(target)) => Visit::Omit,
        _ => Visit::Keep,
    })
    .unwrap_or(Value::Null)
}

/// Asynchronous structural clone with every reference replaced by the
/// result of `visit`.
///
/// Sibling array elements and object values are visited concurrently; the
/// result keeps input order regardless of completion order. The first
/// visitor error aborts the whole rewrite.
pub async fn transform<F, Fut, E>(value: &Value, visit: F) -> Result<Value, E>
where
    F: Fn(Map<String, Value>) -> Fut + Sync,
    Fut: Future<Output = Result<Visit, E>> + Send,
    E: Send,
{
    Ok(transform_node(value, &visit).await?.unwrap_or(Value::Null))
}

fn transform_node<'a, F, Fut, E>(value: &'a Value, visit: &'a F) -> BoxFuture<'a, Result<Option<Value>, E>>
where
    F: Fn(Map<String, Value>) -> Fut + Sync,
    Fut: Future<Output = Result<Visit, E>> + Send + 'a,
    E: Send + 'a,
{
    async move {
        match classify(value) {
            Node::Reference(reference) => Ok(match visit(reference.as_map().clone()).await? {
                Visit::Keep => Some(value.clone()),
                Visit::Replace(replacement) => Some(replacement),
                Visit::Omit => None,
            }),
            Node::Array(items) => {
                let visited = try_join_all(items.iter().map(|item| transform_node(item, visit))).await?;
                Ok(Some(Value::Array(visited.into_iter().flatten().collect())))
            }
            Node::Object(map) => {
                let visited = try_join_all(map.values().map(|v| transform_node(v, visit))).await?;
                let out: Map<String, Value> = map
                    .keys()
                    .cloned()
                    .zip(visited)
                    .filter_map(|(key, v)| v.map(|v| (key, v)))
                    .collect();
                Ok(Some(Value::Object(out)))
            }
            Node::Leaf(leaf) => Ok(Some(leaf.clone())),
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;

    fn targets(value: &Value) -> Vec<&str> {
        collect_references(value)
            .iter()
            .filter_map(|r| r.target())
            .collect()
    }

    fn nested() -> Value {
        json!({
            "_id": "a",
            "hero": {"_type": "reference", "_ref": "r1"},
            "sections": [
                {
                    "_key": "s1",
                    "items": [
                        {"_key": "i1", "link": {"_ref": "r2"}},
                        {"_key": "i2", "links": [{"_ref": "r3"}, {"_ref": "drafts.r4"}]},
                        {"_key": "i3", "notALink": {"_ref": ""}},
                    ],
                },
                {"_key": "s2", "image": {"asset": {"_ref": "image-abc"}}},
            ],
            "count": 3,
            "flag": null,
        })
    }

    #[test]
    fn collects_every_reference_depth_first() {
        assert_eq!(targets(&nested()), vec!["r1", "r2", "r3", "drafts.r4", "image-abc"]);
    }

    #[test]
    fn collects_nothing_from_leaves() {
        assert!(collect_references(&json!(null)).is_empty());
        assert!(collect_references(&json!("drafts.x")).is_empty());
        assert!(collect_references(&json!([1, true, {"_ref": false}])).is_empty());
    }

    #[test]
    fn reference_at_root_is_collected_once() {
        let value = json!({"_ref": "a", "inner": {"_ref": "b"}});
        assert_eq!(targets(&value), vec!["a"]);
    }

    #[test]
    fn prune_filters_array_entries_and_unsets_keys() {
        let pruned = prune(&nested(), &["r1", "r3"]);
        assert_eq!(
            pruned,
            json!({
                "_id": "a",
                "sections": [
                    {
                        "_key": "s1",
                        "items": [
                            {"_key": "i1", "link": {"_ref": "r2"}},
                            {"_key": "i2", "links": [{"_ref": "drafts.r4"}]},
                            {"_key": "i3", "notALink": {"_ref": ""}},
                        ],
                    },
                    {"_key": "s2", "image": {"asset": {"_ref": "image-abc"}}},
                ],
                "count": 3,
                "flag": null,
            })
        );
    }

    #[test]
    fn prune_matches_across_draft_prefixes() {
        let value = json!({"a": {"_ref": "drafts.x"}, "b": [{"_ref": "x"}, {"_ref": "y"}]});
        assert_eq!(prune(&value, &["x"]), json!({"b": [{"_ref": "y"}]}));
        assert_eq!(prune(&value, &["drafts.x"]), json!({"b": [{"_ref": "y"}]}));
    }

    #[test]
    fn prune_leaves_emptied_containers() {
        let value = json!({"wrapper": {"only": {"_ref": "x"}}, "list": [{"_ref": "x"}]});
        assert_eq!(prune(&value, &["x"]), json!({"wrapper": {}, "list": []}));
    }

    #[test]
    fn prune_keeps_key_order() {
        let value = json!({"z": 1, "a": {"_ref": "x"}, "m": 2});
        let pruned = prune(&value, &["x"]);
        let keys: Vec<_> = pruned.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "m"]);
    }

    #[test]
    fn prune_with_nothing_excluded_is_identity() {
        let empty: [&str; 0] = [];
        assert_eq!(prune(&nested(), &empty), nested());
    }

    #[tokio::test]
    async fn identity_transform_round_trips() {
        let value = nested();
        let cloned = transform(&value, |node| async move {
            Ok::<_, Infallible>(Visit::Replace(Value::Object(node)))
        })
        .await
        .unwrap();
        assert_eq!(cloned, value);
    }

    #[tokio::test]
    async fn transform_rewrites_and_omits() {
        let value = json!({"keep": {"_ref": "a"}, "drop": {"_ref": "b"}, "list": [{"_ref": "b"}, 1]});
        let rewritten = transform(&value, |node| async move {
            Ok::<_, Infallible>(match node["_ref"].as_str() {
                Some("a") => Visit::Replace(json!({"_ref": "a-fr"})),
                _ => Visit::Omit,
            })
        })
        .await
        .unwrap();
        assert_eq!(rewritten, json!({"keep": {"_ref": "a-fr"}, "list": [1]}));
    }

    #[tokio::test]
    async fn transform_propagates_visitor_errors() {
        let value = json!([{"_ref": "ok"}, {"_ref": "bad"}]);
        let result = transform(&value, |node| async move {
            match node["_ref"].as_str() {
                Some("bad") => Err("unresolvable"),
                _ => Ok(Visit::Keep),
            }
        })
        .await;
        assert_eq!(result, Err("unresolvable"));
    }

    #[tokio::test]
    async fn transform_passes_primitives_through() {
        for value in [json!(null), json!(1), json!("s"), json!(true)] {
            let out = transform(&value, |_| async { Ok::<_, Infallible>(Visit::Omit) })
                .await
                .unwrap();
            assert_eq!(out, value);
        }
    }
}
