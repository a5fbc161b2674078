// Copyright 2025 Cameron Swords
// SPDX-License-Identifier: Apache-2.0

//! A decision-tree view of a document, used for semantic queries.
//!
//! Rendering resolves each union against one concrete width. The tree form
//! instead indexes the choice by width: every union becomes a branch whose
//! fit side covers the widths where the flat layout would be chosen and
//! whose expanded side covers the rest. Two documents render alike at every
//! width exactly when their trees describe the same set of chunk sequences,
//! which is what the subset test, set difference, and total order below
//! compute.

use std::cmp::Ordering;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::render::{cons, nil, Chunk, Frames};
use crate::{Doc, DocInner};

// -------------------------------------------------------------------------------------------------
// Lazy tree cells
// -------------------------------------------------------------------------------------------------

/// A lazily grown stream of chunks and branches.
#[derive(Clone)]
pub(crate) struct DocTree(Arc<TreeCell>);

struct TreeCell {
    node: OnceCell<TreeNode>,
    grow: Box<dyn Fn() -> TreeNode + Send + Sync>,
}

#[derive(Clone)]
pub(crate) enum TreeNode {
    Done,
    Next(Chunk, DocTree),
    /// A width-indexed choice; the first side is the one wide layouts take.
    Branch(DocTree, DocTree),
}

impl DocTree {
    fn lazy<F>(grow: F) -> DocTree
    where
        F: Fn() -> TreeNode + Send + Sync + 'static,
    {
        DocTree(Arc::new(TreeCell {
            node: OnceCell::new(),
            grow: Box::new(grow),
        }))
    }

    fn now(node: TreeNode) -> DocTree {
        let cell = OnceCell::new();
        let _ = cell.set(node);
        DocTree(Arc::new(TreeCell {
            node: cell,
            grow: Box::new(|| TreeNode::Done),
        }))
    }

    fn emit(chunk: Chunk, rest: DocTree) -> DocTree {
        DocTree::now(TreeNode::Next(chunk, rest))
    }

    fn node(&self) -> &TreeNode {
        self.0.node.get_or_init(|| (self.0.grow)())
    }
}

// -------------------------------------------------------------------------------------------------
// Lowering
// -------------------------------------------------------------------------------------------------

/// Half-open interval of rendering widths a subtree is built for.
#[derive(Clone, Copy)]
struct Bounds {
    min: i32,
    max: i32,
}

pub(crate) fn doc_tree(doc: &Doc) -> DocTree {
    tree_of(
        0,
        cons(0, doc.clone(), nil()),
        Bounds {
            min: 0,
            max: i32::MAX,
        },
    )
}

fn tree_of(pos: i32, frames: Arc<Frames>, bounds: Bounds) -> DocTree {
    DocTree::lazy(move || grow(pos, Arc::clone(&frames), bounds))
}

/// One step of the replayed layout walk.
///
/// At a union, `needed` is the least width at which the flat side would fit.
/// Widths below `bounds.min` always expand, widths at or above `bounds.max`
/// never occur in this subtree, and an interval straddling `needed` splits
/// into a branch.
fn grow(mut pos: i32, mut frames: Arc<Frames>, bounds: Bounds) -> TreeNode {
    loop {
        let (indent, doc, rest) = match &*frames {
            Frames::Nil => return TreeNode::Done,
            Frames::Cons { indent, doc, rest } => (*indent, doc.clone(), Arc::clone(rest)),
        };
        match doc.inner() {
            DocInner::Empty => frames = rest,
            DocInner::Text(s) => {
                let next_pos = pos.saturating_add(s.len() as i32);
                return TreeNode::Next(Chunk::Str(s.clone()), tree_of(next_pos, rest, bounds));
            }
            DocInner::Line => {
                return TreeNode::Next(Chunk::Break(indent), tree_of(indent, rest, bounds));
            }
            DocInner::Concat(a, b) => {
                frames = cons(indent, a.clone(), cons(indent, b.clone(), rest));
            }
            DocInner::Nest(depth, inner) => {
                frames = cons(indent.saturating_add(*depth), inner.clone(), rest);
            }
            DocInner::Union(flat, expanded) => {
                let flat_frames = cons(indent, flat.clone(), Arc::clone(&rest));
                let probe = tree_of(pos, Arc::clone(&flat_frames), bounds);
                let needed = min_fit_width(pos, probe, i32::MAX);
                if bounds.min >= needed {
                    frames = flat_frames;
                } else if needed >= bounds.max {
                    frames = cons(indent, expanded.force().clone(), rest);
                } else {
                    let fit = tree_of(
                        pos,
                        flat_frames,
                        Bounds {
                            min: needed,
                            max: bounds.max,
                        },
                    );
                    let union = doc.clone();
                    let lo = bounds.min;
                    let expanded_tree = DocTree::lazy(move || {
                        let expanded_doc = match union.inner() {
                            DocInner::Union(_, expanded) => expanded.force().clone(),
                            _ => unreachable!("branch cell holds a union"),
                        };
                        grow(
                            pos,
                            cons(indent, expanded_doc, Arc::clone(&rest)),
                            Bounds {
                                min: lo,
                                max: needed,
                            },
                        )
                    });
                    return TreeNode::Branch(fit, expanded_tree);
                }
            }
        }
    }
}

/// The least width at which some layout in `tree` keeps its first line
/// within bounds: the minimum over paths of the column at the first break.
/// `best` carries the minimum found so far to stop long lines early.
fn min_fit_width(mut pos: i32, mut tree: DocTree, mut best: i32) -> i32 {
    loop {
        if pos >= best {
            return best;
        }
        let next = match tree.node() {
            TreeNode::Done => return best.min(pos),
            TreeNode::Next(Chunk::Break(_), _) => return best.min(pos),
            TreeNode::Next(Chunk::Str(s), rest) => {
                pos = pos.saturating_add(s.len() as i32);
                rest.clone()
            }
            TreeNode::Branch(fit, expanded) => {
                best = min_fit_width(pos, fit.clone(), best);
                expanded.clone()
            }
        };
        tree = next;
    }
}

// -------------------------------------------------------------------------------------------------
// Chunk alignment
// -------------------------------------------------------------------------------------------------

/// Outcome of matching the heads of two chunk streams.
///
/// Text splits on the shared prefix; breaks with different indentation share
/// the shallower break and the difference reappears as leading spaces on the
/// deeper side. A break never aligns with text because only breaks render a
/// newline.
enum Alignment {
    Mismatch,
    Matched {
        shared: Chunk,
        left: DocTree,
        right: DocTree,
    },
}

fn align(ca: &Chunk, ta: &DocTree, cb: &Chunk, tb: &DocTree) -> Alignment {
    match (ca, cb) {
        (Chunk::Str(x), Chunk::Str(y)) => {
            if x == y {
                Alignment::Matched {
                    shared: Chunk::Str(x.clone()),
                    left: ta.clone(),
                    right: tb.clone(),
                }
            } else if let Some(remainder) = x.strip_prefix(y.as_str()) {
                Alignment::Matched {
                    shared: Chunk::Str(y.clone()),
                    left: DocTree::emit(Chunk::Str(remainder.to_string()), ta.clone()),
                    right: tb.clone(),
                }
            } else if let Some(remainder) = y.strip_prefix(x.as_str()) {
                Alignment::Matched {
                    shared: Chunk::Str(x.clone()),
                    left: ta.clone(),
                    right: DocTree::emit(Chunk::Str(remainder.to_string()), tb.clone()),
                }
            } else {
                Alignment::Mismatch
            }
        }
        (Chunk::Break(i), Chunk::Break(j)) => {
            if i == j {
                Alignment::Matched {
                    shared: Chunk::Break(*i),
                    left: ta.clone(),
                    right: tb.clone(),
                }
            } else if i < j {
                Alignment::Matched {
                    shared: Chunk::Break(*i),
                    left: ta.clone(),
                    right: DocTree::emit(Chunk::Str(" ".repeat((j - i) as usize)), tb.clone()),
                }
            } else {
                Alignment::Matched {
                    shared: Chunk::Break(*j),
                    left: DocTree::emit(Chunk::Str(" ".repeat((i - j) as usize)), ta.clone()),
                    right: tb.clone(),
                }
            }
        }
        _ => Alignment::Mismatch,
    }
}

// -------------------------------------------------------------------------------------------------
// Set-style operations
// -------------------------------------------------------------------------------------------------

/// Is every rendering of `a` also a rendering of `b`?
///
/// A branch on the left must hold for both of its sides; a branch on the
/// right may be satisfied by either. The chunk path advances iteratively and
/// only branches recurse.
fn is_sub_doc(a: &DocTree, b: &DocTree) -> bool {
    let mut x = a.clone();
    let mut y = b.clone();
    loop {
        match (x.node().clone(), y.node().clone()) {
            (TreeNode::Branch(xa, xb), _) => return is_sub_doc(&xa, &y) && is_sub_doc(&xb, &y),
            (_, TreeNode::Branch(ya, yb)) => return is_sub_doc(&x, &ya) || is_sub_doc(&x, &yb),
            (TreeNode::Done, TreeNode::Done) => return true,
            (TreeNode::Done, TreeNode::Next(..)) | (TreeNode::Next(..), TreeNode::Done) => {
                return false
            }
            (TreeNode::Next(ca, ta), TreeNode::Next(cb, tb)) => {
                match align(&ca, &ta, &cb, &tb) {
                    Alignment::Mismatch => return false,
                    Alignment::Matched { left, right, .. } => {
                        x = left;
                        y = right;
                    }
                }
            }
        }
    }
}

/// The renderings of `a` that are not renderings of `b`, or `None` when
/// every one of them is. Branches in the result are plain set unions.
fn set_diff(a: &DocTree, b: &DocTree) -> Option<DocTree> {
    let mut shared_prefix: Vec<Chunk> = Vec::new();
    let mut x = a.clone();
    let mut y = b.clone();
    let difference = loop {
        match (x.node().clone(), y.node().clone()) {
            (TreeNode::Branch(xa, xb), _) => {
                break match (set_diff(&xa, &y), set_diff(&xb, &y)) {
                    (None, None) => None,
                    (Some(left), None) => Some(left),
                    (None, Some(right)) => Some(right),
                    (Some(left), Some(right)) => {
                        Some(DocTree::now(TreeNode::Branch(left, right)))
                    }
                };
            }
            (_, TreeNode::Branch(ya, yb)) => {
                break set_diff(&x, &ya).and_then(|rest| set_diff(&rest, &yb));
            }
            (TreeNode::Done, TreeNode::Done) => break None,
            (TreeNode::Done, TreeNode::Next(..)) | (TreeNode::Next(..), TreeNode::Done) => {
                break Some(x.clone());
            }
            (TreeNode::Next(ca, ta), TreeNode::Next(cb, tb)) => {
                match align(&ca, &ta, &cb, &tb) {
                    Alignment::Mismatch => break Some(x.clone()),
                    Alignment::Matched {
                        shared,
                        left,
                        right,
                    } => {
                        shared_prefix.push(shared);
                        x = left;
                        y = right;
                    }
                }
            }
        }
    };
    difference.map(|tree| {
        shared_prefix
            .into_iter()
            .rev()
            .fold(tree, |rest, chunk| DocTree::emit(chunk, rest))
    })
}

/// Total order on the sets of renderings.
///
/// The first point of difference decides: breaks sort after text (a
/// deliberate departure from byte order, so grouping does not reorder
/// documents), text compares lexicographically after the shared prefix is
/// split away, and a stream that ends sorts before one that continues.
/// Branches compare fit sides first, then whatever each expanded side adds
/// beyond its fit side; a branch against a plain stream treats the stream as
/// a branch over itself.
fn compare_trees(a: &DocTree, b: &DocTree) -> Ordering {
    let mut x = a.clone();
    let mut y = b.clone();
    loop {
        match (x.node().clone(), y.node().clone()) {
            (TreeNode::Branch(xa, xb), TreeNode::Branch(ya, yb)) => {
                return compare_trees(&xa, &ya)
                    .then_with(|| compare_diffs(set_diff(&xb, &xa), set_diff(&yb, &ya)));
            }
            (TreeNode::Branch(xa, xb), _) => {
                return compare_trees(&xa, &y)
                    .then_with(|| compare_diffs(set_diff(&xb, &xa), None));
            }
            (_, TreeNode::Branch(ya, yb)) => {
                return compare_trees(&x, &ya)
                    .then_with(|| compare_diffs(None, set_diff(&yb, &ya)));
            }
            (TreeNode::Done, TreeNode::Done) => return Ordering::Equal,
            (TreeNode::Done, TreeNode::Next(..)) => return Ordering::Less,
            (TreeNode::Next(..), TreeNode::Done) => return Ordering::Greater,
            (TreeNode::Next(ca, ta), TreeNode::Next(cb, tb)) => {
                match align(&ca, &ta, &cb, &tb) {
                    Alignment::Mismatch => return chunk_order(&ca, &cb),
                    Alignment::Matched { left, right, .. } => {
                        x = left;
                        y = right;
                    }
                }
            }
        }
    }
}

/// Order on the extra renderings of two branches; an empty difference sorts
/// first.
fn compare_diffs(x: Option<DocTree>, y: Option<DocTree>) -> Ordering {
    match (x, y) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_trees(&x, &y),
    }
}

fn chunk_order(a: &Chunk, b: &Chunk) -> Ordering {
    match (a, b) {
        // breaks sort after text
        (Chunk::Break(_), Chunk::Str(_)) => Ordering::Greater,
        (Chunk::Str(_), Chunk::Break(_)) => Ordering::Less,
        (Chunk::Str(x), Chunk::Str(y)) => x.cmp(y),
        (Chunk::Break(i), Chunk::Break(j)) => i.cmp(j),
    }
}

pub(crate) fn compare_docs(a: &Doc, b: &Doc) -> Ordering {
    compare_trees(&doc_tree(a), &doc_tree(b))
}

// -------------------------------------------------------------------------------------------------
// Deunioning
// -------------------------------------------------------------------------------------------------

/// Lazy iterator over the choice-free documents of one source document; see
/// [`Doc::deunioned`].
pub struct Deunioned {
    pending: Vec<(Vec<Chunk>, DocTree)>,
}

impl Iterator for Deunioned {
    type Item = Doc;

    fn next(&mut self) -> Option<Doc> {
        if let Some((mut prefix, mut tree)) = self.pending.pop() {
            loop {
                let next = match tree.node() {
                    TreeNode::Done => break,
                    TreeNode::Next(chunk, rest) => {
                        prefix.push(chunk.clone());
                        rest.clone()
                    }
                    TreeNode::Branch(fit, expanded) => {
                        self.pending.push((prefix.clone(), expanded.clone()));
                        fit.clone()
                    }
                };
                tree = next;
            }
            return Some(doc_of_chunks(&prefix));
        }
        None
    }
}

/// Rebuild a chunk path as a document; a break becomes a hard line followed
/// by its indentation as literal spaces.
fn doc_of_chunks(chunks: &[Chunk]) -> Doc {
    let mut doc = Doc::empty();
    for chunk in chunks.iter().rev() {
        doc = match chunk {
            Chunk::Str(s) => Doc::text(s.clone()).concat(doc),
            Chunk::Break(indent) => Doc::line().concat(Doc::spaces(*indent)).concat(doc),
        };
    }
    doc
}

// -------------------------------------------------------------------------------------------------
// Public query surface
// -------------------------------------------------------------------------------------------------

impl Doc {
    /// Is every rendering of `self` also a rendering of `other`?
    ///
    /// Reflexive and transitive, and two documents are subsets of each other
    /// exactly when they compare [`Ordering::Equal`]. The test commits to one
    /// side of a choice in `other` as soon as it reaches it, so documents
    /// that interleave their choices differently can test as unrelated even
    /// when their rendering sets overlap; documents built with [`Doc::fill`]
    /// compare less precisely still, see there.
    pub fn is_sub_doc_of(&self, other: &Doc) -> bool {
        is_sub_doc(&doc_tree(self), &doc_tree(other))
    }

    /// All the choice-free documents `self` may render as, flattest first.
    ///
    /// Each yielded document contains no layout alternatives and renders the
    /// same at every width; together they cover exactly the renderings of
    /// `self`.
    pub fn deunioned(&self) -> Deunioned {
        Deunioned {
            pending: vec![(Vec::new(), doc_tree(self))],
        }
    }
}
