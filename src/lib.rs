// Copyright 2025 Cameron Swords
// SPDX-License-Identifier: Apache-2.0

//! A pretty-printing library in the Wadler/Leijen lineage: documents are
//! immutable values describing a set of possible layouts, and rendering picks
//! the best layout for a target width with a one-line lookahead.
//!
//! Alternatives are expressed as unions whose expanded side sits behind a
//! memoizing thunk, so combinators like [`Doc::fill`] stay cheap to build and
//! rendering only pays for the branches it explores. Beyond rendering, the
//! library can compare documents by the set of strings they can render to:
//! see [`Doc::is_sub_doc_of`], the [`Ord`] impl, and [`Doc::deunioned`].

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};

mod render;
#[cfg(test)]
mod tests;
mod tree;

pub use render::{Chunk, Chunks};
pub use tree::Deunioned;

// -------------------------------------------------------------------------------------------------
// Main Trait
// -------------------------------------------------------------------------------------------------

pub trait ToDoc {
    fn to_doc(&self) -> Doc;
    fn render(&self, width: i32) -> String {
        self.to_doc().render(width)
    }
}

// -------------------------------------------------------------------------------------------------
// Helpers
// -------------------------------------------------------------------------------------------------

/// Convert an iterator of items to a `Doc` by rendering each item with `ToDoc` and
/// interspersing `separator` between them.
///
/// Returns [`Doc::empty()`] if the iterator is empty.
///
/// # Example
/// ```rust
/// use pretty_lazy::*;
///
/// #[derive(Debug)]
/// struct Item(&'static str);
///
/// impl ToDoc for Item {
///     fn to_doc(&self) -> Doc { Doc::text(self.0) }
/// }
///
/// let xs = [Item("a"), Item("b"), Item("c")];
///
/// let doc = to_list(xs.iter(), Doc::comma());
///
/// assert_eq!(doc.render(80), "a,b,c");
/// ```
pub fn to_list<'a, T>(docs: impl IntoIterator<Item = &'a T>, separator: Doc) -> Doc
where
    T: ToDoc + 'a,
{
    Doc::intersperse(docs.into_iter().map(ToDoc::to_doc), separator)
}

// -------------------------------------------------------------------------------------------------
// Documents
// -------------------------------------------------------------------------------------------------

/// An immutable document: a value describing every layout the renderer may
/// choose from. Cloning is a reference-count bump and sharing across threads
/// is free.
pub struct Doc(Arc<DocInner>);

pub(crate) enum DocInner {
    Empty,
    Text(String), // nonempty, no newline
    Line,         // hard line break
    Concat(Doc, Doc),
    Nest(i32, Doc),
    Union(Doc, Thunk),
}

impl DocInner {
    fn to_doc(self) -> Doc {
        Doc(Arc::new(self))
    }
}

impl Clone for Doc {
    fn clone(&self) -> Self {
        Doc(Arc::clone(&self.0))
    }
}

/// The expanded side of a `Union`, evaluated at most once.
///
/// Concurrent first observers race on the cell; whichever closure run wins is
/// the value every observer sees afterwards.
pub(crate) struct Thunk {
    cell: OnceCell<Doc>,
    make: Box<dyn Fn() -> Doc + Send + Sync>,
}

impl Thunk {
    fn new<F>(make: F) -> Thunk
    where
        F: Fn() -> Doc + Send + Sync + 'static,
    {
        Thunk {
            cell: OnceCell::new(),
            make: Box::new(make),
        }
    }

    fn evaluated(doc: Doc) -> Thunk {
        let cell = OnceCell::new();
        let _ = cell.set(doc);
        Thunk {
            cell,
            make: Box::new(Doc::empty),
        }
    }

    pub(crate) fn force(&self) -> &Doc {
        self.cell.get_or_init(|| (self.make)())
    }
}

// -----------------------------------------------
// Interned Constants
// -----------------------------------------------

const SPACE_TABLE_SIZE: usize = 20;

static EMPTY: Lazy<Doc> = Lazy::new(|| DocInner::Empty.to_doc());
static SPACE: Lazy<Doc> = Lazy::new(|| DocInner::Text(" ".to_string()).to_doc());
static COMMA: Lazy<Doc> = Lazy::new(|| DocInner::Text(",".to_string()).to_doc());
static LINE: Lazy<Doc> = Lazy::new(|| DocInner::Line.to_doc());
static SOFT_LINE: Lazy<Doc> =
    Lazy::new(|| DocInner::Union(Doc::space(), Thunk::evaluated(Doc::line())).to_doc());
static LPAREN: Lazy<Doc> = Lazy::new(|| DocInner::Text("(".to_string()).to_doc());
static RPAREN: Lazy<Doc> = Lazy::new(|| DocInner::Text(")".to_string()).to_doc());
static LANGLE: Lazy<Doc> = Lazy::new(|| DocInner::Text("<".to_string()).to_doc());
static RANGLE: Lazy<Doc> = Lazy::new(|| DocInner::Text(">".to_string()).to_doc());
static LBRACKET: Lazy<Doc> = Lazy::new(|| DocInner::Text("[".to_string()).to_doc());
static RBRACKET: Lazy<Doc> = Lazy::new(|| DocInner::Text("]".to_string()).to_doc());
static LBRACE: Lazy<Doc> = Lazy::new(|| DocInner::Text("{".to_string()).to_doc());
static RBRACE: Lazy<Doc> = Lazy::new(|| DocInner::Text("}".to_string()).to_doc());
static SPACES: Lazy<Vec<Doc>> = Lazy::new(|| {
    (1..=SPACE_TABLE_SIZE)
        .map(|n| DocInner::Text(" ".repeat(n)).to_doc())
        .collect()
});

impl Doc {
    // -------------------------------------------
    // Core Constructors
    // -------------------------------------------

    /// The empty document.
    ///
    /// Renders to nothing and acts as the identity element for [`Doc::concat`].
    pub fn empty() -> Doc {
        EMPTY.clone()
    }

    /// A single ASCII space as a document (`" "`).
    pub fn space() -> Doc {
        SPACE.clone()
    }

    /// A single ASCII comma as a document (`","`).
    pub fn comma() -> Doc {
        COMMA.clone()
    }

    /// A hard line break.
    ///
    /// Always breaks the line when rendered, and sets the cursor to the
    /// current indentation level tracked by [`Doc::nest`].
    pub fn line() -> Doc {
        LINE.clone()
    }

    /// A space that may become a newline when the layout does not fit.
    ///
    /// This is the union of `" "` and a line break, preferring the space.
    pub fn soft_line() -> Doc {
        SOFT_LINE.clone()
    }

    /// Construct a document from raw text.
    ///
    /// Embedded newlines are turned into hard line breaks, so
    /// `Doc::text("a\nb")` behaves like `Doc::text("a") / Doc::text("b")`.
    /// Everything else is inserted verbatim.
    pub fn text<S: Into<String>>(str: S) -> Doc {
        let s: String = str.into();
        if s.is_empty() {
            return Doc::empty();
        }
        // Split at newlines back to front so the result comes out
        // right-associated without any rotation.
        let mut segments = s.split('\n').rev();
        let mut doc = match segments.next() {
            Some(segment) => Doc::fragment(segment),
            None => return Doc::empty(),
        };
        for segment in segments {
            doc = Doc::line().concat(doc);
            if !segment.is_empty() {
                doc = Doc::fragment(segment).concat(doc);
            }
        }
        doc
    }

    fn fragment(s: &str) -> Doc {
        if s.is_empty() {
            Doc::empty()
        } else if s == " " {
            Doc::space()
        } else {
            DocInner::Text(s.to_string()).to_doc()
        }
    }

    /// Produce `n` spaces as a document, with the first few served from an
    /// interned table. Nonpositive counts yield [`Doc::empty()`].
    pub fn spaces(n: i32) -> Doc {
        if n <= 0 {
            Doc::empty()
        } else if n as usize <= SPACE_TABLE_SIZE {
            SPACES[(n - 1) as usize].clone()
        } else {
            DocInner::Text(" ".repeat(n as usize)).to_doc()
        }
    }

    /// Concatenate two documents without inserting any separator.
    ///
    /// `empty` is dropped on either side and the chain is kept
    /// right-associated, rotating at construction time, so linear traversals
    /// can walk the right spine iteratively.
    pub fn concat(self, other: Doc) -> Doc {
        if matches!(&*self.0, DocInner::Empty) {
            return other;
        }
        if matches!(&*other.0, DocInner::Empty) {
            return self;
        }
        let mut spine = Vec::new();
        let mut last = self;
        loop {
            let next = match &*last.0 {
                DocInner::Concat(a, b) => {
                    spine.push(a.clone());
                    b.clone()
                }
                _ => break,
            };
            last = next;
        }
        let mut acc = DocInner::Concat(last, other).to_doc();
        for doc in spine.into_iter().rev() {
            acc = DocInner::Concat(doc, acc).to_doc();
        }
        acc
    }

    // `<+>` from Haskell
    //
    // Concatenates the two documents with a space between them.
    pub fn concat_space(self, other: Doc) -> Doc {
        self.concat(Doc::space()).concat(other)
    }

    /// Concatenates the two documents with a space that may become a newline.
    pub fn concat_soft_line(self, other: Doc) -> Doc {
        self.concat(Doc::soft_line()).concat(other)
    }

    /// Increase the nesting (indentation) level for all lines that follow a
    /// newline within the given document by `depth` columns.
    ///
    /// Nonpositive depths leave the document unchanged, and directly nested
    /// wrappers collapse into one.
    pub fn nest(self, depth: i32) -> Doc {
        if depth <= 0 {
            return self;
        }
        if let DocInner::Nest(inner_depth, inner) = &*self.0 {
            let total = inner_depth.saturating_add(depth);
            let inner = inner.clone();
            return DocInner::Nest(total, inner).to_doc();
        }
        DocInner::Nest(depth, self).to_doc()
    }

    /// Try to render `self` on a single line, falling back to the original
    /// layout when the line does not fit within the rendering width.
    ///
    /// This is the standard `group` combinator from pretty-printing
    /// literature. A document that is already a single line comes back
    /// unchanged.
    pub fn group(self) -> Doc {
        match self.flatten_option() {
            Some(flat) => DocInner::Union(flat, Thunk::evaluated(self)).to_doc(),
            None => self,
        }
    }

    /// Compose `count` copies of `self`, doubling as it goes.
    ///
    /// Nonpositive counts yield [`Doc::empty()`].
    pub fn repeat(&self, count: i32) -> Doc {
        if count <= 0 {
            return Doc::empty();
        }
        let mut acc = Doc::empty();
        let mut doubling = self.clone();
        let mut n = count;
        loop {
            if n & 1 == 1 {
                acc = doubling.clone().concat(acc);
            }
            n >>= 1;
            if n == 0 {
                break;
            }
            doubling = doubling.clone().concat(doubling);
        }
        acc
    }

    /// Enclose `self` in `left` and `right`, breaking and indenting the body
    /// by `indent` when it does not fit on one line.
    ///
    /// ```rust
    /// use pretty_lazy::Doc;
    ///
    /// let body = Doc::text("x") / Doc::text("y");
    /// let doc = body.bracket(Doc::text("{"), Doc::text("}"), 2);
    /// assert_eq!(doc.render(80), "{ x y }");
    /// assert_eq!(doc.render(3), "{\n  x\n  y\n}");
    /// ```
    pub fn bracket(self, left: Doc, right: Doc, indent: i32) -> Doc {
        left.concat(Doc::line().concat(self).nest(indent))
            .concat(Doc::line().concat(right))
            .group()
    }

    // -------------------------------------------
    // Flattening
    // -------------------------------------------

    /// The single-line form of `self`: line breaks become spaces, indentation
    /// is stripped, and every union resolves to its flat side.
    pub fn flatten(&self) -> Doc {
        self.flatten_option().unwrap_or_else(|| self.clone())
    }

    /// Like [`Doc::flatten`], but reports `None` when the document was
    /// already flat and flattening would change nothing.
    ///
    /// Collapsing a union counts as a change even when its flat side was
    /// taken as-is, and so does stripping a nesting wrapper.
    pub fn flatten_option(&self) -> Option<Doc> {
        enum Walk {
            Eval(Doc),
            // replace the child with `orig` when it reports no change
            Unwrap(Doc),
            Join(Doc, Doc),
        }
        let mut work = vec![Walk::Eval(self.clone())];
        let mut done: Vec<Option<Doc>> = Vec::new();
        while let Some(step) = work.pop() {
            match step {
                Walk::Eval(doc) => match &*doc.0 {
                    DocInner::Empty | DocInner::Text(_) => done.push(None),
                    DocInner::Line => done.push(Some(Doc::space())),
                    DocInner::Nest(_, inner) => {
                        work.push(Walk::Unwrap(inner.clone()));
                        work.push(Walk::Eval(inner.clone()));
                    }
                    DocInner::Union(flat, _) => {
                        work.push(Walk::Unwrap(flat.clone()));
                        work.push(Walk::Eval(flat.clone()));
                    }
                    DocInner::Concat(a, b) => {
                        work.push(Walk::Join(a.clone(), b.clone()));
                        work.push(Walk::Eval(b.clone()));
                        work.push(Walk::Eval(a.clone()));
                    }
                },
                Walk::Unwrap(orig) => {
                    let child = done.pop().expect("flatten walk is balanced");
                    done.push(Some(child.unwrap_or(orig)));
                }
                Walk::Join(a, b) => {
                    let flat_b = done.pop().expect("flatten walk is balanced");
                    let flat_a = done.pop().expect("flatten walk is balanced");
                    match (flat_a, flat_b) {
                        (None, None) => done.push(None),
                        (flat_a, flat_b) => {
                            let left = flat_a.unwrap_or(a);
                            let right = flat_b.unwrap_or(b);
                            done.push(Some(left.concat(right)));
                        }
                    }
                }
            }
        }
        done.pop().unwrap_or(None)
    }

    /// True when every rendering of `self` is the empty string.
    ///
    /// Short-circuits on the first line break or text fragment found; unions
    /// only need their flat side inspected because flattening preserves
    /// emptiness.
    pub fn is_empty(&self) -> bool {
        let mut work = vec![self.clone()];
        while let Some(doc) = work.pop() {
            match &*doc.0 {
                DocInner::Empty => {}
                DocInner::Text(_) | DocInner::Line => return false,
                DocInner::Nest(_, inner) => work.push(inner.clone()),
                DocInner::Concat(a, b) => {
                    work.push(b.clone());
                    work.push(a.clone());
                }
                DocInner::Union(flat, _) => work.push(flat.clone()),
            }
        }
        true
    }

    // -------------------------------------------
    // Helpers
    // -------------------------------------------

    /// Fold an iterator of documents from the right with `concat_f`.
    ///
    /// This is a generalized form of [`spread`](Self::spread) and
    /// [`stack`](Self::stack). Returns [`Doc::empty()`] for an empty
    /// iterator.
    pub fn concat_with<F>(docs: impl IntoIterator<Item = Doc>, concat_f: F) -> Doc
    where
        F: Fn(Doc, Doc) -> Doc,
    {
        let docs: Vec<Doc> = docs.into_iter().collect();
        let mut iter = docs.into_iter().rev();
        let mut output = match iter.next() {
            Some(last) => last,
            None => return Doc::empty(),
        };
        for doc in iter {
            output = concat_f(doc, output);
        }
        output
    }

    /// Concatenate `docs`, inserting `separator` between each adjacent pair.
    ///
    /// Returns [`Doc::empty()`] if `docs` is empty.
    pub fn intersperse(docs: impl IntoIterator<Item = Doc>, separator: Doc) -> Doc {
        Doc::concat_with(docs, |x, y| x.concat(separator.clone()).concat(y))
    }

    /// Separate an iterator of documents with single spaces.
    pub fn spread(docs: impl IntoIterator<Item = Doc>) -> Doc {
        Doc::intersperse(docs, Doc::space())
    }

    /// Separate an iterator of documents with hard newlines.
    pub fn stack(docs: impl IntoIterator<Item = Doc>) -> Doc {
        Doc::intersperse(docs, Doc::line())
    }

    // Tries laying the elements out with spaces, or vertically if they do not fit.
    pub fn sep(docs: impl IntoIterator<Item = Doc>) -> Doc {
        Doc::stack(docs).group()
    }

    /// Join documents with `separator` and a space or a newline, deciding the
    /// two independently at every gap: a gap rendered as a space keeps the
    /// following item eligible for flat placement, while a newline commits to
    /// a break right there.
    ///
    /// This is `fill` from Wadler's paper. The unions it builds pair two
    /// layouts that only agree after flattening, so documents built with
    /// `fill` may compare less precisely under [`Doc::is_sub_doc_of`] and the
    /// [`Ord`] impl than documents built with [`Doc::group`]. Rendering is
    /// unaffected.
    pub fn fill(separator: Doc, docs: impl IntoIterator<Item = Doc>) -> Doc {
        let items: Arc<Vec<Doc>> = Arc::new(docs.into_iter().collect());
        fill_from(&separator, &items, 0, false)
    }

    /// Surround `self` with `(` and `)` (parentheses).
    pub fn parens(self) -> Doc {
        Doc::lparen().concat(self).concat(Doc::rparen())
    }

    /// Surround `self` with `<` and `>` (angle brackets).
    pub fn angles(self) -> Doc {
        Doc::langle().concat(self).concat(Doc::rangle())
    }

    /// Surround `self` with `[` and `]` (square brackets).
    pub fn brackets(self) -> Doc {
        Doc::lbracket().concat(self).concat(Doc::rbracket())
    }

    /// Surround `self` with `{` and `}` (curly braces).
    pub fn braces(self) -> Doc {
        Doc::lbrace().concat(self).concat(Doc::rbrace())
    }

    // -------------------------------------------
    // Constant Constructors
    // -------------------------------------------

    /// The `(` document.
    pub fn lparen() -> Doc {
        LPAREN.clone()
    }

    /// The `)` document.
    pub fn rparen() -> Doc {
        RPAREN.clone()
    }

    /// The `<` document.
    pub fn langle() -> Doc {
        LANGLE.clone()
    }

    /// The `>` document.
    pub fn rangle() -> Doc {
        RANGLE.clone()
    }

    /// The `[` document.
    pub fn lbracket() -> Doc {
        LBRACKET.clone()
    }

    /// The `]` document.
    pub fn rbracket() -> Doc {
        RBRACKET.clone()
    }

    /// The `{` document.
    pub fn lbrace() -> Doc {
        LBRACE.clone()
    }

    /// The `}` document.
    pub fn rbrace() -> Doc {
        RBRACE.clone()
    }

    // -------------------------------------------
    // Internals
    // -------------------------------------------

    pub(crate) fn inner(&self) -> &DocInner {
        &self.0
    }
}

/// Suffix of a [`Doc::fill`]: items `start..`, where `head_flat` says the
/// head was already flattened by the space alternative one level up.
///
/// The preferred every-gap-a-space spine is built back to front so long
/// inputs stay off the call stack; each newline alternative re-enters here
/// through its thunk when the renderer actually explores it.
fn fill_from(separator: &Doc, items: &Arc<Vec<Doc>>, start: usize, head_flat: bool) -> Doc {
    let len = items.len();
    if start >= len {
        return Doc::empty();
    }
    if start == len - 1 {
        return if head_flat {
            items[start].flatten()
        } else {
            items[start].clone()
        };
    }
    let flat_separator = separator.flatten();
    let mut acc = items[len - 1].flatten();
    let mut i = len - 1;
    while i > start {
        i -= 1;
        let flat_here = if i == start { head_flat } else { true };
        let space_side = items[i]
            .flatten()
            .concat(flat_separator.clone())
            .concat_space(acc.clone());
        let newline_side = {
            let head = if flat_here {
                items[i].flatten()
            } else {
                items[i].clone()
            };
            let separator = separator.clone();
            let items = Arc::clone(items);
            let next = i + 1;
            Thunk::new(move || {
                head.clone()
                    .concat(separator.clone())
                    .concat(Doc::line())
                    .concat(fill_from(&separator, &items, next, false))
            })
        };
        acc = DocInner::Union(space_side, newline_side).to_doc();
    }
    acc
}

// -------------------------------------------------------------------------------------------------
// Operators and standard traits
// -------------------------------------------------------------------------------------------------

impl std::ops::Add for Doc {
    type Output = Doc;

    fn add(self, rhs: Doc) -> Doc {
        self.concat(rhs)
    }
}

/// `a / b` puts a hard line break between `a` and `b`.
impl std::ops::Div for Doc {
    type Output = Doc;

    fn div(self, rhs: Doc) -> Doc {
        self.concat(Doc::line()).concat(rhs)
    }
}

/// Total order on the set of renderings: `Equal` exactly when the two
/// documents render identically at every width. Line breaks sort after text,
/// which keeps the order stable under grouping.
impl Ord for Doc {
    fn cmp(&self, other: &Doc) -> Ordering {
        tree::compare_docs(self, other)
    }
}

impl PartialOrd for Doc {
    fn partial_cmp(&self, other: &Doc) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Doc {
    fn eq(&self, other: &Doc) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Doc {}

/// Hashes the rendering, not the tree: structurally different documents that
/// render alike hash alike. See [`Doc::render_hash`].
impl Hash for Doc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.render_hash());
    }
}

impl fmt::Debug for Doc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            DocInner::Empty => write!(f, "Empty"),
            DocInner::Text(s) => write!(f, "Text({s:?})"),
            DocInner::Line => write!(f, "Line"),
            DocInner::Concat(a, b) => write!(f, "Concat({a:?}, {b:?})"),
            DocInner::Nest(depth, inner) => write!(f, "Nest({depth}, {inner:?})"),
            // forces the memoized branch
            DocInner::Union(flat, expanded) => write!(f, "Union({flat:?}, {:?})", expanded.force()),
        }
    }
}
