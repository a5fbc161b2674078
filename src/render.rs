// Copyright 2025 Cameron Swords
// SPDX-License-Identifier: Apache-2.0

//! The best-layout engine: a demand-driven walk over `(indent, doc)` frames
//! that emits text and break chunks, deciding every union with a lookahead
//! bounded by the next line break.

use std::fmt;
use std::fmt::Write;
use std::sync::Arc;

use crate::{Doc, DocInner};

// -------------------------------------------------------------------------------------------------
// Chunks
// -------------------------------------------------------------------------------------------------

/// An atomic piece of rendered output.
///
/// `Str` contributes its text; `Break(k)` contributes a newline followed by
/// `k` spaces. Concatenating the chunks of [`Doc::chunks`] in order gives
/// exactly [`Doc::render`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Chunk {
    Str(String),
    Break(i32),
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::Str(s) => f.write_str(s),
            Chunk::Break(indent) => {
                f.write_char('\n')?;
                for _ in 0..*indent {
                    f.write_char(' ')?;
                }
                Ok(())
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Work frames
// -------------------------------------------------------------------------------------------------

/// Persistent list of pending `(indent, doc)` pairs.
///
/// Sharing the tail makes the union lookahead a constant-time snapshot of the
/// renderer's whole continuation.
pub(crate) enum Frames {
    Nil,
    Cons {
        indent: i32,
        doc: Doc,
        rest: Arc<Frames>,
    },
}

pub(crate) fn nil() -> Arc<Frames> {
    Arc::new(Frames::Nil)
}

pub(crate) fn cons(indent: i32, doc: Doc, rest: Arc<Frames>) -> Arc<Frames> {
    Arc::new(Frames::Cons { indent, doc, rest })
}

// -------------------------------------------------------------------------------------------------
// Fitting
// -------------------------------------------------------------------------------------------------

/// Does the continuation fit on the current line?
///
/// Walks the frames as the renderer would, accumulating text widths, and
/// answers yes at the first break (or the end) reached without the position
/// ever passing `width`. Unions push a checkpoint and continue with the flat
/// side; overflowing resumes from the innermost checkpoint's expanded side,
/// which is exactly the renderer's own left-first fallback order.
pub(crate) fn fits(width: i32, mut pos: i32, mut frames: Arc<Frames>) -> bool {
    let width = width.max(0);
    if pos > width {
        return false;
    }
    let mut checkpoints: Vec<(i32, i32, Doc, Arc<Frames>)> = Vec::new();
    loop {
        let (indent, doc, rest) = match &*frames {
            Frames::Nil => return true,
            Frames::Cons { indent, doc, rest } => (*indent, doc.clone(), Arc::clone(rest)),
        };
        match doc.inner() {
            DocInner::Empty => frames = rest,
            DocInner::Line => return true,
            DocInner::Text(s) => {
                pos = pos.saturating_add(s.len() as i32);
                if pos <= width {
                    frames = rest;
                    continue;
                }
                match checkpoints.pop() {
                    Some((saved_pos, saved_indent, union, saved_rest)) => {
                        pos = saved_pos;
                        frames = match union.inner() {
                            DocInner::Union(_, expanded) => {
                                cons(saved_indent, expanded.force().clone(), saved_rest)
                            }
                            _ => unreachable!("checkpoint holds a union"),
                        };
                    }
                    None => return false,
                }
            }
            DocInner::Concat(a, b) => {
                frames = cons(indent, a.clone(), cons(indent, b.clone(), rest));
            }
            DocInner::Nest(depth, inner) => {
                frames = cons(indent.saturating_add(*depth), inner.clone(), rest);
            }
            DocInner::Union(flat, _) => {
                checkpoints.push((pos, indent, doc.clone(), Arc::clone(&rest)));
                frames = cons(indent, flat.clone(), rest);
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Rendering
// -------------------------------------------------------------------------------------------------

/// Lazy chunk stream for one rendering; see [`Doc::chunks`].
///
/// Nothing past the chunk most recently returned has been decided, so
/// consumers may stop pulling at any point without paying for the rest.
pub struct Chunks {
    width: i32,
    pos: i32,
    frames: Arc<Frames>,
}

impl Chunks {
    pub(crate) fn new(doc: Doc, width: i32) -> Chunks {
        Chunks {
            width,
            pos: 0,
            frames: cons(0, doc, nil()),
        }
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        loop {
            let (indent, doc, rest) = match &*self.frames {
                Frames::Nil => return None,
                Frames::Cons { indent, doc, rest } => (*indent, doc.clone(), Arc::clone(rest)),
            };
            match doc.inner() {
                DocInner::Empty => self.frames = rest,
                DocInner::Text(s) => {
                    self.pos = self.pos.saturating_add(s.len() as i32);
                    self.frames = rest;
                    return Some(Chunk::Str(s.clone()));
                }
                DocInner::Line => {
                    self.pos = indent;
                    self.frames = rest;
                    return Some(Chunk::Break(indent));
                }
                DocInner::Concat(a, b) => {
                    self.frames = cons(indent, a.clone(), cons(indent, b.clone(), rest));
                }
                DocInner::Nest(depth, inner) => {
                    self.frames = cons(indent.saturating_add(*depth), inner.clone(), rest);
                }
                DocInner::Union(flat, expanded) => {
                    let flat_frames = cons(indent, flat.clone(), Arc::clone(&rest));
                    if fits(self.width, self.pos, Arc::clone(&flat_frames)) {
                        self.frames = flat_frames;
                    } else {
                        self.frames = cons(indent, expanded.force().clone(), rest);
                    }
                }
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Derived measurements
// -------------------------------------------------------------------------------------------------

/// See [`Doc::max_width`]. Walks the all-flat layout; a union decided on some
/// line needs that whole line to fit, so the result folds the end column of
/// every line that carried a union decision.
pub(crate) fn max_width(doc: &Doc) -> i32 {
    let mut frames = cons(0, doc.clone(), nil());
    let mut pos: i32 = 0;
    let mut widest: i32 = 0;
    let mut union_on_line = false;
    loop {
        let (indent, doc, rest) = match &*frames {
            Frames::Nil => break,
            Frames::Cons { indent, doc, rest } => (*indent, doc.clone(), Arc::clone(rest)),
        };
        match doc.inner() {
            DocInner::Empty => frames = rest,
            DocInner::Text(s) => {
                pos = pos.saturating_add(s.len() as i32);
                frames = rest;
            }
            DocInner::Line => {
                if union_on_line {
                    widest = widest.max(pos);
                    union_on_line = false;
                }
                pos = indent;
                frames = rest;
            }
            DocInner::Concat(a, b) => {
                frames = cons(indent, a.clone(), cons(indent, b.clone(), rest));
            }
            DocInner::Nest(depth, inner) => {
                frames = cons(indent.saturating_add(*depth), inner.clone(), rest);
            }
            DocInner::Union(flat, _) => {
                union_on_line = true;
                frames = cons(indent, flat.clone(), rest);
            }
        }
    }
    if union_on_line {
        widest = widest.max(pos);
    }
    widest
}

const HASH_SEED: u32 = 0xdead_60d5;
const HASH_MULTIPLIER: u32 = 1_500_450_271;

/// See [`Doc::render_hash`]. Folds over the widest rendering's characters so
/// the hash depends only on output, never on document shape.
pub(crate) fn render_hash(doc: &Doc) -> u32 {
    let mut hash = HASH_SEED;
    let mut mix = |ch: char| {
        hash = hash.wrapping_mul(HASH_MULTIPLIER).wrapping_add(ch as u32);
    };
    for chunk in Chunks::new(doc.clone(), i32::MAX) {
        match chunk {
            Chunk::Str(s) => s.chars().for_each(&mut mix),
            Chunk::Break(indent) => {
                mix('\n');
                for _ in 0..indent {
                    mix(' ');
                }
            }
        }
    }
    hash
}

// -------------------------------------------------------------------------------------------------
// Public rendering surface
// -------------------------------------------------------------------------------------------------

impl Doc {
    /// Render the document to a `String` using the given maximum line `width`.
    ///
    /// Soft breaks choose between space and newline based on whether the rest
    /// of the line fits; hard breaks always break. Negative widths behave
    /// like zero, and a single text fragment wider than `width` is emitted in
    /// full rather than split.
    pub fn render(&self, width: i32) -> String {
        let mut output = String::new();
        for chunk in self.chunks(width) {
            match chunk {
                Chunk::Str(s) => output.push_str(&s),
                Chunk::Break(indent) => {
                    output.push('\n');
                    for _ in 0..indent {
                        output.push(' ');
                    }
                }
            }
        }
        output
    }

    /// Stream the rendering into `out` instead of building a `String`.
    ///
    /// Produces exactly the output of [`Doc::render`] at the same width.
    pub fn write_to<W: Write>(&self, width: i32, out: &mut W) -> fmt::Result {
        for chunk in self.chunks(width) {
            match chunk {
                Chunk::Str(s) => out.write_str(&s)?,
                Chunk::Break(indent) => {
                    out.write_char('\n')?;
                    for _ in 0..indent {
                        out.write_char(' ')?;
                    }
                }
            }
        }
        Ok(())
    }

    /// The rendering as a lazy sequence of string fragments whose
    /// concatenation equals [`Doc::render`] at the same width.
    pub fn render_stream(&self, width: i32) -> impl Iterator<Item = String> {
        self.chunks(width).map(|chunk| chunk.to_string())
    }

    /// The rendering as a lazy sequence of [`Chunk`]s.
    pub fn chunks(&self, width: i32) -> Chunks {
        Chunks::new(self.clone(), width)
    }

    /// The smallest width beyond which rendering no longer changes: for every
    /// `w >= self.max_width()`, `self.render(w)` equals
    /// `self.render(self.max_width())`. A document with no layout choices
    /// reports 0.
    pub fn max_width(&self) -> i32 {
        max_width(self)
    }

    /// A stable 32-bit hash of the widest rendering.
    ///
    /// Documents that compare [`Ordering::Equal`](std::cmp::Ordering::Equal)
    /// render identically at every width and therefore hash identically.
    pub fn render_hash(&self) -> u32 {
        render_hash(self)
    }
}
