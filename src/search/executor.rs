use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;
use crate::core::types::DocId;
use crate::index::inverted::{InvertedIndex, Term};
use crate::query::ast::Query;
use crate::scoring::scorer::Scorer;
use crate::search::results::{ScoredDoc, SearchResults, TopKCollector};

/// Candidates of one query node, sorted by doc id, with partial scores
type Candidates = Vec<(DocId, f32)>;

/// Boolean evaluator over one immutable index
pub struct QueryEvaluator<'a> {
    index: &'a InvertedIndex,
    scorer: &'a dyn Scorer,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(index: &'a InvertedIndex, scorer: &'a dyn Scorer) -> Self {
        QueryEvaluator { index, scorer }
    }

    /// At most `k` documents by descending score, ties by ascending id.
    /// `total_hits` counts every match.
    pub fn evaluate(&self, query: &Query, k: usize) -> SearchResults {
        let start = Instant::now();
        let mut collector = TopKCollector::new(k);

        for (doc_id, score) in self.candidates(query) {
            collector.collect(ScoredDoc::new(doc_id, score));
        }

        collector.into_results(start.elapsed())
    }

    /// Matching documents in id order, unranked
    pub fn matching_docs(&self, query: &Query) -> Vec<DocId> {
        self.candidates(query).into_iter().map(|(id, _)| id).collect()
    }

    /// Walks the tree with an explicit stack, so nesting depth is bounded
    /// by memory rather than by the thread's stack.
    fn candidates<'q>(&self, query: &'q Query) -> Candidates {
        let mut stack: Vec<Frame<'q>> = Vec::new();
        let mut query = query;
        loop {
            let mut list = loop {
                match query {
                    Query::Term(term) => break self.term_candidates(term),
                    Query::And(children) | Query::Or(children) => {
                        let Some(first) = children.first() else {
                            break Vec::new();
                        };
                        stack.push(Frame {
                            children,
                            conjunction: matches!(query, Query::And(_)),
                            next: 1,
                            lists: Vec::with_capacity(children.len()),
                        });
                        query = first;
                    }
                }
            };

            loop {
                let Some(mut frame) = stack.pop() else {
                    return list;
                };
                // An empty child empties the whole conjunction; skip its other children.
                if frame.conjunction && list.is_empty() {
                    continue;
                }
                frame.lists.push(list);
                if let Some(child) = frame.children.get(frame.next) {
                    frame.next += 1;
                    query = child;
                    stack.push(frame);
                    break;
                }
                list = if frame.conjunction {
                    intersect(frame.lists)
                } else {
                    union(frame.lists)
                };
            }
        }
    }

    fn term_candidates(&self, term: &Term) -> Candidates {
        let Some(postings) = self.index.postings(&term.field, &term.text) else {
            return Vec::new();
        };
        let stats = self.index.stats(&term.field);
        let doc_freq = postings.doc_freq();
        postings
            .iter()
            .map(|posting| (posting.doc_id, self.scorer.score(posting, doc_freq, &stats)))
            .collect()
    }
}

/// A boolean node whose children are partly evaluated
struct Frame<'q> {
    children: &'q [Query],
    conjunction: bool,
    next: usize,
    lists: Vec<Candidates>,
}

/// Sorted-merge intersection. The shortest list drives; the others are
/// walked forward once each.
fn intersect(mut lists: Vec<Candidates>) -> Candidates {
    if lists.is_empty() {
        return Vec::new();
    }
    lists.sort_by_key(|list| list.len());
    let (driver, rest) = lists.split_at(1);
    let mut cursors = vec![0usize; rest.len()];
    let mut out = Vec::with_capacity(driver[0].len());

    'docs: for &(doc_id, score) in &driver[0] {
        let mut total = score;
        for (list, cursor) in rest.iter().zip(cursors.iter_mut()) {
            while *cursor < list.len() && list[*cursor].0 < doc_id {
                *cursor += 1;
            }
            match list.get(*cursor) {
                Some(&(id, s)) if id == doc_id => total += s,
                Some(_) => continue 'docs,
                None => break 'docs,
            }
        }
        out.push((doc_id, total));
    }
    out
}

/// n-way sorted-merge union; scores of the same document are summed.
fn union(lists: Vec<Candidates>) -> Candidates {
    let mut lists: Vec<Candidates> = lists.into_iter().filter(|l| !l.is_empty()).collect();
    match lists.len() {
        0 => return Vec::new(),
        1 => return lists.pop().unwrap_or_default(),
        _ => {}
    }

    let mut heap: BinaryHeap<Reverse<(DocId, usize, usize)>> = lists
        .iter()
        .enumerate()
        .map(|(list, entries)| Reverse((entries[0].0, list, 0)))
        .collect();
    let mut out: Candidates = Vec::with_capacity(lists.iter().map(Vec::len).max().unwrap_or(0));

    while let Some(Reverse((doc_id, list, idx))) = heap.pop() {
        let score = lists[list][idx].1;
        match out.last_mut() {
            Some(last) if last.0 == doc_id => last.1 += score,
            _ => out.push((doc_id, score)),
        }
        if let Some(&(next, _)) = lists[list].get(idx + 1) {
            heap.push(Reverse((next, list, idx + 1)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;
    use crate::scoring::scorer::TfIdfScorer;

    fn index(docs: &[(u64, &str)]) -> InvertedIndex {
        let mut index = InvertedIndex::new();
        for (id, text) in docs {
            let tokens: Vec<Token> = text
                .split_whitespace()
                .enumerate()
                .map(|(i, w)| Token::new(w.to_string(), i as u32, 0))
                .collect();
            index.add_document(DocId(*id), "body", tokens).unwrap();
        }
        index
    }

    fn ids(results: &SearchResults) -> Vec<u64> {
        results.hits.iter().map(|h| h.doc_id.0).collect()
    }

    #[test]
    fn test_term_frequency_ranks_higher() {
        let index = index(&[(1, "the quick fox"), (2, "the lazy fox fox")]);
        let scorer = TfIdfScorer::new();
        let results = QueryEvaluator::new(&index, &scorer).evaluate(&Query::term("body", "fox"), 10);
        assert_eq!(ids(&results), vec![2, 1]);
        assert_eq!(results.total_hits, 2);
        assert!(results.hits[0].score > results.hits[1].score);
    }

    #[test]
    fn test_and_intersects_and_sums() {
        let index = index(&[(1, "a b"), (2, "a"), (3, "a b c"), (4, "b")]);
        let scorer = TfIdfScorer::new();
        let evaluator = QueryEvaluator::new(&index, &scorer);
        let query = Query::And(vec![Query::term("body", "a"), Query::term("body", "b")]);
        let results = evaluator.evaluate(&query, 10);
        assert_eq!(ids(&results), vec![1, 3]);

        let a = evaluator.evaluate(&Query::term("body", "a"), 10);
        let b = evaluator.evaluate(&Query::term("body", "b"), 10);
        let expected = a.hits.iter().find(|h| h.doc_id == DocId(1)).unwrap().score
            + b.hits.iter().find(|h| h.doc_id == DocId(1)).unwrap().score;
        assert!((results.hits[0].score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_or_unions() {
        let index = index(&[(1, "a"), (2, "b"), (3, "c"), (4, "a b")]);
        let scorer = TfIdfScorer::new();
        let evaluator = QueryEvaluator::new(&index, &scorer);
        let query = Query::Or(vec![Query::term("body", "a"), Query::term("body", "b")]);
        assert_eq!(evaluator.matching_docs(&query), vec![DocId(1), DocId(2), DocId(4)]);
        // Document 4 matches both children
        assert_eq!(ids(&evaluator.evaluate(&query, 1)), vec![4]);
    }

    #[test]
    fn test_missing_term_and_empty_nodes() {
        let index = index(&[(1, "a")]);
        let scorer = TfIdfScorer::new();
        let evaluator = QueryEvaluator::new(&index, &scorer);
        assert_eq!(evaluator.evaluate(&Query::term("body", "zzz"), 5).total_hits, 0);
        assert_eq!(evaluator.evaluate(&Query::term("other", "a"), 5).total_hits, 0);
        assert_eq!(evaluator.evaluate(&Query::And(vec![]), 5).total_hits, 0);
        assert_eq!(evaluator.evaluate(&Query::match_none(), 5).total_hits, 0);
        let with_empty = Query::And(vec![Query::term("body", "a"), Query::match_none()]);
        assert_eq!(evaluator.evaluate(&with_empty, 5).total_hits, 0);
    }

    #[test]
    fn test_top_k_truncates_but_counts_all() {
        let docs: Vec<(u64, String)> = (1..=20).map(|i| (i, "word ".repeat(i as usize))).collect();
        let refs: Vec<(u64, &str)> = docs.iter().map(|(i, t)| (*i, t.as_str())).collect();
        let index = index(&refs);
        let scorer = TfIdfScorer::new();
        let results = QueryEvaluator::new(&index, &scorer).evaluate(&Query::term("body", "word"), 5);
        assert_eq!(results.hits.len(), 5);
        assert_eq!(results.total_hits, 20);
        assert_eq!(ids(&results), vec![20, 19, 18, 17, 16]);
    }

    #[test]
    fn test_merge_helpers() {
        let a = vec![(DocId(1), 1.0), (DocId(3), 1.0), (DocId(5), 1.0)];
        let b = vec![(DocId(3), 2.0), (DocId(4), 2.0), (DocId(5), 2.0)];
        let c = vec![(DocId(5), 4.0)];
        assert_eq!(intersect(vec![a.clone(), b.clone(), c]), vec![(DocId(5), 7.0)]);
        let merged = union(vec![a, b]);
        let merged_ids: Vec<u64> = merged.iter().map(|(id, _)| id.0).collect();
        assert_eq!(merged_ids, vec![1, 3, 4, 5]);
        assert_eq!(merged[1].1, 3.0);
    }

    #[test]
    fn test_deeply_nested_tree_on_small_stack() {
        let worker = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let index = index(&[(1, "volpe rossa"), (2, "lupo grigio"), (3, "volpe grigia")]);
                let scorer = TfIdfScorer::new();
                let mut query = Query::term("body", "volpe");
                for level in 0..20_000 {
                    query = if level % 2 == 0 {
                        Query::And(vec![query, Query::term("body", "volpe")])
                    } else {
                        Query::Or(vec![query, Query::term("body", "assente")])
                    };
                }
                let hits = QueryEvaluator::new(&index, &scorer).matching_docs(&query);

                // Dropping the tree directly would recurse once per level.
                let mut pending = vec![query];
                while let Some(node) = pending.pop() {
                    if let Query::And(children) | Query::Or(children) = node {
                        pending.extend(children);
                    }
                }
                hits
            })
            .unwrap();
        let hits = worker.join().unwrap();
        assert_eq!(hits, vec![DocId(1), DocId(3)]);
    }
}
