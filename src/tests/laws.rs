// Copyright 2025 Cameron Swords
// SPDX-License-Identifier: Apache-2.0

use std::cmp::Ordering;

use proptest::prelude::*;

use crate::Doc;

fn leaf_doc() -> impl Strategy<Value = Doc> {
    prop_oneof![
        Just(Doc::empty()),
        Just(Doc::line()),
        Just(Doc::space()),
        Just(Doc::comma()),
        "[a-z]{1,6}".prop_map(|s: String| Doc::text(s)),
        (0i32..4).prop_map(Doc::spaces),
    ]
}

/// Documents whose unions all come from `group`, so the flat side of every
/// union is the flattening of its expanded side.
fn grouped_doc() -> impl Strategy<Value = Doc> {
    leaf_doc().prop_recursive(5, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a + b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a / b),
            (inner.clone(), 0i32..5).prop_map(|(d, k)| d.nest(k)),
            inner.prop_map(|d| d.group()),
        ]
    })
}

/// Every combinator, including the weaker unions built by `fill`.
fn any_doc() -> impl Strategy<Value = Doc> {
    leaf_doc().prop_recursive(4, 16, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a + b),
            (inner.clone(), 0i32..5).prop_map(|(d, k)| d.nest(k)),
            inner.clone().prop_map(|d| d.group()),
            proptest::collection::vec(inner, 1..4)
                .prop_map(|items| Doc::fill(Doc::comma(), items)),
        ]
    })
}

/// Small documents for the laws that enumerate whole choice spaces.
fn shallow_grouped_doc() -> impl Strategy<Value = Doc> {
    leaf_doc().prop_recursive(3, 8, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a + b),
            inner.prop_map(|d| d.group()),
        ]
    })
}

fn breaks(rendered: &str) -> usize {
    rendered.matches('\n').count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn concat_is_associative_by_construction(
        a in any_doc(),
        b in any_doc(),
        c in any_doc(),
    ) {
        let left = (a.clone() + b.clone()) + c.clone();
        let right = a + (b + c);
        prop_assert_eq!(format!("{left:?}"), format!("{right:?}"));
    }

    #[test]
    fn empty_is_the_concat_identity(d in any_doc()) {
        let before = format!("{d:?}");
        prop_assert_eq!(format!("{:?}", Doc::empty() + d.clone()), before.clone());
        prop_assert_eq!(format!("{:?}", d + Doc::empty()), before);
    }

    #[test]
    fn streaming_concatenates_to_render(d in any_doc(), w in 0i32..=60) {
        let collected: String = d.render_stream(w).collect();
        prop_assert_eq!(collected, d.render(w));
        let mut written = String::new();
        prop_assert!(d.write_to(w, &mut written).is_ok());
        prop_assert_eq!(written, d.render(w));
    }

    // Width buys flatness: no rendering can have fewer breaks than the one
    // wide enough to take every flat side.
    #[test]
    fn wide_renderings_are_flattest(d in grouped_doc(), w in 0i32..=60) {
        let widest = d.render(i32::MAX);
        prop_assert!(breaks(&d.render(w)) >= breaks(&widest));
    }

    #[test]
    fn flatten_is_a_fixpoint(d in any_doc()) {
        let flat = d.flatten();
        prop_assert_eq!(format!("{:?}", flat.flatten()), format!("{flat:?}"));
        let shape = format!("{flat:?}");
        prop_assert!(!shape.contains("Line"));
        prop_assert!(!shape.contains("Nest"));
        prop_assert!(!shape.contains("Union"));
    }

    #[test]
    fn flatten_ignores_width(d in any_doc(), w1 in 0i32..=60, w2 in 0i32..=60) {
        let flat = d.flatten();
        prop_assert_eq!(flat.render(w1), flat.render(w2));
    }

    #[test]
    fn max_width_pins_the_rendering(d in any_doc(), delta in 0i32..=40) {
        let pinned = d.max_width();
        prop_assert_eq!(d.render(pinned.saturating_add(delta)), d.render(pinned));
    }

    #[test]
    fn wide_groups_render_like_their_flattening(d in grouped_doc(), delta in 0i32..=20) {
        let grouped = d.clone().group();
        let w = grouped.max_width().saturating_add(delta);
        prop_assert_eq!(grouped.render(w), d.flatten().render(w));
    }

    #[test]
    fn nest_is_additive(d in any_doc(), i in 0i32..6, j in 0i32..6, w in 0i32..=60) {
        let stacked = d.clone().nest(i).nest(j);
        let direct = d.nest(i + j);
        prop_assert_eq!(format!("{stacked:?}"), format!("{direct:?}"));
        prop_assert_eq!(stacked.render(w), direct.render(w));
    }

    #[test]
    fn is_empty_means_renders_empty(d in any_doc(), w in 0i32..=60) {
        prop_assert_eq!(d.is_empty(), d.render(w).is_empty());
    }

    #[test]
    fn sub_doc_is_reflexive(d in any_doc()) {
        prop_assert!(d.is_sub_doc_of(&d));
    }

    // Transitivity along a concrete chain: the flattening is one rendering
    // of the group, and regrouping only restates the same choice.
    #[test]
    fn sub_doc_chains_through_grouping(d in grouped_doc()) {
        let flat = d.flatten();
        let grouped = d.group();
        let regrouped = grouped.clone().group();
        prop_assert!(flat.is_sub_doc_of(&grouped));
        prop_assert!(grouped.is_sub_doc_of(&regrouped));
        prop_assert!(flat.is_sub_doc_of(&regrouped));
    }

    #[test]
    fn equal_means_mutual_subset(a in grouped_doc(), b in grouped_doc()) {
        let equal = a.cmp(&b) == Ordering::Equal;
        let mutual = a.is_sub_doc_of(&b) && b.is_sub_doc_of(&a);
        prop_assert_eq!(equal, mutual);
    }

    #[test]
    fn comparison_is_antisymmetric(a in grouped_doc(), b in grouped_doc()) {
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    }

    #[test]
    fn grouping_is_idempotent(d in grouped_doc()) {
        let once = d.clone().group();
        let twice = d.group().group();
        prop_assert_eq!(once.cmp(&twice), Ordering::Equal);
        prop_assert_eq!(once.render_hash(), twice.render_hash());
    }

    #[test]
    fn equal_documents_hash_alike(a in grouped_doc(), b in grouped_doc()) {
        if a.cmp(&b) == Ordering::Equal {
            prop_assert_eq!(a.render_hash(), b.render_hash());
        }
    }

    #[test]
    fn deunioned_contains_every_rendering(d in shallow_grouped_doc(), w in 0i32..=60) {
        let rendered = d.render(w);
        let mut found = false;
        for choice in d.deunioned().take(1024) {
            if choice.render(w) == rendered {
                found = true;
                break;
            }
        }
        prop_assert!(found);
    }

    #[test]
    fn deunioned_documents_are_width_invariant(d in shallow_grouped_doc()) {
        for choice in d.deunioned().take(64) {
            prop_assert_eq!(choice.render(0), choice.render(i32::MAX));
            prop_assert!(choice.is_sub_doc_of(&d));
        }
    }
}
