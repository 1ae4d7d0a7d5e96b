//! Co-purchase graph and bundle detection (spec §4.4).
//!
//! `lift(A,B) = P(A,B) / (P(A)*P(B))`, computed per order (a purchase
//! record's `order_id` groups the basket it belongs to). Bundles are
//! maximal cliques over the edges that clear both thresholds.

use crate::models::{CoPurchaseEdge, PurchaseRecord};
use std::collections::{HashMap, HashSet};

pub struct CoPurchaseConfig {
    pub min_lift: f64,
    pub min_co_occurrence: u32,
    pub top_k: usize,
}

impl Default for CoPurchaseConfig {
    fn default() -> Self {
        Self {
            min_lift: 1.2,
            min_co_occurrence: 2,
            top_k: 5,
        }
    }
}

fn baskets_by_identity(records: &[PurchaseRecord]) -> HashMap<String, HashSet<String>> {
    let mut baskets: HashMap<String, HashSet<String>> = HashMap::new();
    for record in records {
        baskets
            .entry(record.order_id.clone())
            .or_default()
            .insert(record.identity());
    }
    baskets
}

/// For each product identity, the list of qualifying co-purchase edges,
/// sorted by descending lift and truncated to `config.top_k`.
pub fn compute_co_purchase_graph(
    records: &[PurchaseRecord],
    config: &CoPurchaseConfig,
) -> HashMap<String, Vec<CoPurchaseEdge>> {
    let baskets = baskets_by_identity(records);
    let total_orders = baskets.len();
    if total_orders == 0 {
        return HashMap::new();
    }

    let mut occurrence: HashMap<String, u32> = HashMap::new();
    let mut co_occurrence: HashMap<(String, String), u32> = HashMap::new();

    for basket in baskets.values() {
        for identity in basket {
            *occurrence.entry(identity.clone()).or_insert(0) += 1;
        }
        let items: Vec<&String> = basket.iter().collect();
        for i in 0..items.len() {
            for j in 0..items.len() {
                if i == j {
                    continue;
                }
                let key = (items[i].clone(), items[j].clone());
                *co_occurrence.entry(key).or_insert(0) += 1;
            }
        }
    }

    let n = total_orders as f64;
    let mut graph: HashMap<String, Vec<CoPurchaseEdge>> = HashMap::new();

    for ((a, b), &count) in &co_occurrence {
        if count < config.min_co_occurrence {
            continue;
        }
        let p_a = occurrence[a] as f64 / n;
        let p_b = occurrence[b] as f64 / n;
        let p_ab = count as f64 / n;
        if p_a == 0.0 || p_b == 0.0 {
            continue;
        }
        let lift = p_ab / (p_a * p_b);
        if lift < config.min_lift {
            continue;
        }
        graph.entry(a.clone()).or_default().push(CoPurchaseEdge {
            product_identity: b.clone(),
            co_occurrence_count: count,
            lift,
        });
    }

    for edges in graph.values_mut() {
        edges.sort_by(|a, b| b.lift.partial_cmp(&a.lift).unwrap_or(std::cmp::Ordering::Equal));
        edges.truncate(config.top_k);
    }

    graph
}

/// Maximal cliques over the qualifying-edge graph: sets of 2+ products
/// where every pair meets both thresholds.
pub fn detect_bundles(graph: &HashMap<String, Vec<CoPurchaseEdge>>) -> Vec<Vec<String>> {
    let adjacency: HashMap<&str, HashSet<&str>> = graph
        .iter()
        .map(|(k, edges)| {
            (
                k.as_str(),
                edges.iter().map(|e| e.product_identity.as_str()).collect(),
            )
        })
        .collect();

    let mut bundles: Vec<Vec<String>> = Vec::new();
    let mut seen: HashSet<Vec<String>> = HashSet::new();

    for start in adjacency.keys() {
        let mut clique: Vec<&str> = vec![start];
        for candidate in adjacency.keys() {
            if clique.contains(candidate) {
                continue;
            }
            let connects_to_all = clique.iter().all(|member| {
                adjacency.get(member).is_some_and(|n| n.contains(candidate))
                    && adjacency.get(candidate).is_some_and(|n| n.contains(*member))
            });
            if connects_to_all {
                clique.push(candidate);
            }
        }
        if clique.len() >= 2 {
            let mut sorted: Vec<String> = clique.iter().map(|s| s.to_string()).collect();
            sorted.sort();
            if seen.insert(sorted.clone()) {
                bundles.push(sorted);
            }
        }
    }

    bundles
}
