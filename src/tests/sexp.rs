// Copyright 2025 Cameron Swords
// SPDX-License-Identifier: Apache-2.0

use crate::*;

// -------------------------------------------------------------------------------------------------
// S-expressions a la Wadler
// -------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

impl Sexp {
    pub fn atom<S: Into<String>>(s: S) -> Self {
        Sexp::Atom(s.into())
    }

    pub fn list(items: Vec<Sexp>) -> Self {
        Sexp::List(items)
    }
}

impl ToDoc for Sexp {
    fn to_doc(&self) -> Doc {
        match self {
            Sexp::Atom(s) => Doc::text(s.clone()),
            Sexp::List(items) => {
                let body = Doc::intersperse(items.iter().map(ToDoc::to_doc), Doc::soft_line());
                body.nest(1).parens().group()
            }
        }
    }
}

/// Compact, single-line form (just flattens the pretty form).
pub fn sexp_compact(sexp: &Sexp) -> Doc {
    sexp.to_doc().flatten()
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn square() -> Sexp {
        Sexp::list(vec![
            Sexp::atom("define"),
            Sexp::list(vec![Sexp::atom("square"), Sexp::atom("x")]),
            Sexp::list(vec![Sexp::atom("*"), Sexp::atom("x"), Sexp::atom("x")]),
        ])
    }

    #[test]
    fn flat_when_it_fits() {
        assert_snapshot!(square().render(80), @"(define (square x) (* x x))");
    }

    #[test]
    fn wraps_at_the_widest_gap_that_fits() {
        assert_snapshot!(square().render(20), @"(define (square x)\n (* x x))");
    }

    #[test]
    fn narrow_layouts_break_inside_sublists() {
        assert_snapshot!(square().render(8), @"(define\n (square\n  x) (*\n  x x))");
    }

    #[test]
    fn compact_ignores_width() {
        let compact = sexp_compact(&square());
        assert_snapshot!(compact.render(0), @"(define (square x) (* x x))");
    }

    #[test]
    fn atoms_render_bare() {
        assert_snapshot!(Sexp::atom("lambda").render(5), @"lambda");
    }

    #[test]
    fn pretty_and_compact_agree_when_wide() {
        let pretty = square().render(200);
        let compact = sexp_compact(&square()).render(200);
        assert_eq!(pretty, compact);
    }
}
