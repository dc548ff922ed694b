//! End-to-end parses: text in, forest of labelled trees out.

mod common;

use common::{child, first_clause, parse};

#[test]
fn contraction_without_main_verb_is_a_phrase() {
    // "I wouldn't": the contraction expands to I | would | not; with no
    // main verb the clause is incomplete, so the root is a bare phrase
    // whose verb is the negated adjunct.
    let nds = parse("I wouldn't");
    assert_eq!(nds.len(), 1, "one root expected:\n{}", nds[0].summary());
    let root = &nds[0];
    assert_eq!(root.kind, "phr");
    assert_eq!(root.vroots, "would");
    assert!(
        root.vprops.contains("not"),
        "negation should survive: {:?}",
        root.vprops
    );
    assert_eq!(child(root, "agent").text, "I");
}

#[test]
fn simple_assertion_with_prep_clause() {
    // "The cat sat on the mat."
    let nds = parse("The cat sat on the mat.");
    let root = first_clause(&nds);
    assert_eq!(root.kind, "assert");
    assert_eq!(root.form, "verbclause");
    assert_eq!(root.vroots, "sit");
    assert!(root.vprops.contains("past"), "vprops: {:?}", root.vprops);
    assert_eq!(child(root, "agent").text, "The cat");
    let theme = child(root, "theme");
    assert_eq!(theme.head, "on");
    assert_eq!(theme.text, "the mat");
    assert_eq!(nds.last().map(|n| n.kind.as_str()), Some("punct"));
}

#[test]
fn query_word_subject_inverts() {
    // "Who ate the cake?": the query word ends up on top, the verb
    // clause qualifying it.
    let nds = parse("Who ate the cake?");
    let root = first_clause(&nds);
    assert_eq!(root.kind, "query", "tree:\n{}", root.summary());
    assert_eq!(root.text, "Who");
    let vp = child(root, "modifies");
    assert_eq!(vp.vroots, "eat");
    assert_eq!(child(vp, "theme").text, "the cake");
    assert_eq!(nds.last().map(|n| n.kind.as_str()), Some("punct"));
}

#[test]
fn predicate_query() {
    // "Is she angry?": verb-subject-object order.
    let nds = parse("Is she angry?");
    let root = first_clause(&nds);
    assert_eq!(root.kind, "query", "tree:\n{}", root.summary());
    assert_eq!(root.form, "queryclause");
    assert_eq!(root.vroots, "be");
    assert_eq!(child(root, "agent").text, "she");
    assert_eq!(child(root, "theme").text, "angry");
    assert_eq!(nds.last().map(|n| n.kind.as_str()), Some("punct"));
}

#[test]
fn proper_name_merges_before_parsing() {
    // "John F. Kennedy died in 1963.": the name is one token.
    let nds = parse("John F. Kennedy died in 1963.");
    let root = first_clause(&nds);
    assert_eq!(root.kind, "assert");
    assert_eq!(root.vroots, "die");
    assert_eq!(child(root, "agent").text, "John F. Kennedy");
    let theme = child(root, "theme");
    assert_eq!(theme.head, "in");
    assert_eq!(theme.text, "1963");
    assert_eq!(nds.last().map(|n| n.kind.as_str()), Some("punct"));
}

#[test]
fn qualified_noun_inverts() {
    // "The girl you saw is pretty.": after Q-inversion the noun holds
    // the qualifying verb clause as a modifier.
    let nds = parse("The girl you saw is pretty.");
    let root = first_clause(&nds);
    assert_eq!(root.kind, "assert", "tree:\n{}", root.summary());
    assert_eq!(root.vroots, "be");
    let topic = child(root, "topic");
    assert_eq!(topic.text, "The girl");
    let qual = child(topic, "modifies");
    assert_eq!(qual.vroots, "see");
    assert_eq!(qual.text, "you saw");
    assert_eq!(child(qual, "agent").text, "you");
    assert_eq!(child(root, "theme").text, "pretty");
}

#[test]
fn plain_transitive() {
    let nds = parse("She ate the cake.");
    let root = first_clause(&nds);
    assert_eq!(root.kind, "assert");
    assert_eq!(root.vroots, "eat");
    assert_eq!(child(root, "agent").text, "She");
    assert_eq!(child(root, "theme").text, "the cake");
}

#[test]
fn adjunct_query_gets_query_clause() {
    // "Did she leave?": the adjunct attaches to the main verb and the
    // clause reads as a query.
    let nds = parse("Did she leave?");
    let root = first_clause(&nds);
    assert_eq!(root.kind, "query", "tree:\n{}", root.summary());
    assert_eq!(root.form, "queryclause");
    assert_eq!(root.vroots, "leave");
    assert_eq!(child(root, "agent").text, "she");
}

#[test]
fn be_assertion_has_topic() {
    // subject of "be" lands in the topic role
    let nds = parse("She is angry.");
    let root = first_clause(&nds);
    assert_eq!(root.kind, "assert");
    assert_eq!(root.vroots, "be");
    assert_eq!(child(root, "topic").text, "She");
    assert_eq!(child(root, "theme").text, "angry");
}

#[test]
fn ditransitive_splits_goal_and_theme() {
    // "give" carries the agent-verb-goal-theme form
    let nds = parse("John gave the girl an apple.");
    let root = first_clause(&nds);
    assert_eq!(root.vroots, "give");
    assert_eq!(child(root, "agent").text, "John");
    assert_eq!(child(root, "auxTheme").text, "the girl");
    assert_eq!(child(root, "theme").text, "an apple");
}

#[test]
fn negated_verb_group() {
    let nds = parse("She did not leave.");
    let root = first_clause(&nds);
    assert_eq!(root.kind, "assert");
    assert_eq!(root.vroots, "leave");
    assert!(root.vprops.contains("not"), "vprops: {:?}", root.vprops);
    assert_eq!(child(root, "agent").text, "She");
}

#[test]
fn quoted_text_nests_under_quote_node() {
    let nds = parse("\"The cat sat.\"");
    assert_eq!(nds.len(), 1);
    assert_eq!(nds[0].kind, "quote");
    let inner = first_clause(&nds[0].subnodes);
    assert_eq!(inner.vroots, "sit");
}

#[test]
fn parenthesized_text_nests_under_paren_node() {
    let nds = parse("yes (the cat sat) no");
    let paren = nds
        .iter()
        .find(|n| n.kind == "paren")
        .expect("paren container expected");
    let inner = first_clause(&paren.subnodes);
    assert_eq!(inner.vroots, "sit");
}

#[test]
fn possessive_binds_into_one_noun() {
    let nds = parse("John's cat died.");
    let root = first_clause(&nds);
    assert_eq!(root.vroots, "die");
    let agent = child(root, "agent");
    assert_eq!(agent.text, "John's cat");
    assert_eq!(agent.form, "N");
}

#[test]
fn gerund_clause_qualifies_noun() {
    // "the girl sitting there" puts the gerund clause under the noun
    let nds = parse("The girl sitting there is pretty.");
    let root = first_clause(&nds);
    assert_eq!(root.vroots, "be", "tree:\n{}", root.summary());
    let topic = child(root, "topic");
    assert_eq!(topic.text, "The girl");
    let qual = child(topic, "modifies");
    assert_eq!(qual.vroots, "sit");
}

#[test]
fn imperative_root_verb() {
    let nds = parse("Go home.");
    let root = first_clause(&nds);
    assert_eq!(root.kind, "imperative", "tree:\n{}", root.summary());
    assert_eq!(root.vroots, "go");
}

#[test]
fn empty_input_yields_empty_forest() {
    assert!(parse("").is_empty());
    assert!(parse("   \n  ").is_empty());
}

#[test]
fn stray_opener_does_not_stop_the_parse() {
    let nds = parse("the cat ( sat");
    assert!(!nds.is_empty());
}

#[test]
fn unknown_words_still_parse() {
    // "zyglot" is not in the lexicon; it joins as a plain term
    let nds = parse("The zyglot sat.");
    let root = first_clause(&nds);
    assert_eq!(root.vroots, "sit");
    assert_eq!(child(root, "agent").text, "The zyglot");
}

#[test]
fn locations_point_into_the_source() {
    let nds = parse("The cat sat.");
    let root = first_clause(&nds);
    let loc = root.loc.expect("location expected");
    assert_eq!(loc.line_s, 1);
    assert_eq!(loc.col_s, 1);
}

#[test]
fn line_numbers_honor_the_starting_line() {
    let mut p = common::parser();
    let nds = p.parse_text("cats\nsleep.", 10);
    let root = first_clause(&nds);
    let loc = root.loc.expect("location expected");
    assert_eq!(loc.line_s, 10);
    assert_eq!(loc.line_e, 11);
}
