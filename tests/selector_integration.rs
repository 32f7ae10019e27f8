//! Integration tests for selector generation and action recording.
//!
//! Every test loads `tests/fixtures/recorder_page.html` (or a small inline
//! page) into the in-memory DOM and checks the generated locators against
//! the same document.

use action_recorder::recording::SelectorDescriptor;
use action_recorder::selectors::reducer::reduce;
use action_recorder::selectors::DocumentOracle;
use action_recorder::{
    create_action, generate_selectors, ActionFields, ActionType, Document, DomView, ElementState,
    GenerationOutcome, NodeId, SelectorGenerator, SelectorSettings,
};

fn fixture_page() -> Document {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/recorder_page.html");
    let source = std::fs::read_to_string(path).unwrap();
    Document::parse_html(&source)
}

/// Every element inside `<body>`
fn body_elements(doc: &Document) -> Vec<NodeId> {
    let body = doc.body().unwrap();
    doc.descendants(body).into_iter().filter(|&n| doc.is_element(n)).collect()
}

fn first(doc: &Document, xpath: &str) -> NodeId {
    doc.evaluate_xpath(doc.root(), xpath).unwrap()[0]
}

// ============================================================================
// Result invariants
// ============================================================================

#[test]
fn test_every_alternative_identifies_its_element() {
    let doc = fixture_page();
    let settings = SelectorSettings::default();

    for element in body_elements(&doc) {
        let result = generate_selectors(&doc, element, &settings);
        for locator in &result.alternatives {
            let matches = doc.evaluate_xpath(doc.root(), locator).unwrap();
            assert_eq!(
                matches,
                vec![element],
                "{} does not identify <{}>",
                locator,
                doc.tag_name(element)
            );
        }
    }
}

#[test]
fn test_result_shape() {
    let doc = fixture_page();
    for max in [5, 8, 20] {
        let settings = SelectorSettings { max_alternatives: max, ..Default::default() };
        for element in body_elements(&doc) {
            let result = generate_selectors(&doc, element, &settings);
            assert!(!result.alternatives.is_empty());
            assert!(result.alternatives.len() <= max);
            assert_eq!(result.best, result.alternatives[0]);

            let mut unique = result.alternatives.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), result.alternatives.len(), "duplicates in {:?}", result.alternatives);

            assert!(result.alternatives.iter().all(|l| l.chars().count() <= settings.max_selector_length));
        }
    }
}

#[test]
fn test_generation_is_idempotent() {
    let doc = fixture_page();
    let settings = SelectorSettings::default();
    for element in body_elements(&doc) {
        let once = generate_selectors(&doc, element, &settings);
        let twice = generate_selectors(&doc, element, &settings);
        assert_eq!(once.best, twice.best);
    }
}

#[test]
fn test_reduction_of_best_is_a_fixed_point() {
    let doc = fixture_page();
    let settings = SelectorSettings::default();
    for element in body_elements(&doc) {
        let best = generate_selectors(&doc, element, &settings).best;
        let oracle = DocumentOracle::new(&doc, element, false);
        let reduced = reduce(&best, &oracle);
        assert_eq!(reduce(&reduced, &oracle), reduced);
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_stable_id_is_best() {
    let doc = fixture_page();
    let settings = SelectorSettings::default();
    let button = doc.find_by_id("submit-btn").unwrap();
    assert_eq!(generate_selectors(&doc, button, &settings).best, "//button[@id='submit-btn']");

    // every element with a stable unique id gets its id locator
    for id in ["email", "password", "login", "orders", "parentA"] {
        let element = doc.find_by_id(id).unwrap();
        let best = generate_selectors(&doc, element, &settings).best;
        assert_eq!(best, format!("//{}[@id='{}']", doc.tag_name(element), id));
    }
}

#[test]
fn test_test_attribute_beats_text() {
    let doc = fixture_page();
    let button = first(&doc, "//button[@data-testid='login-submit']");
    let result = generate_selectors(&doc, button, &SelectorSettings::default());
    assert_eq!(result.best, "//button[@data-testid='login-submit']");
}

#[test]
fn test_hashed_class_is_never_used() {
    let doc = fixture_page();
    let span = first(&doc, "//span[contains(@class, 'css-a8f3k2')]");
    let result = generate_selectors(&doc, span, &SelectorSettings::default());
    assert!(result.alternatives.iter().all(|l| !l.contains("css-a8f3k2")), "{:?}", result.alternatives);
    assert!(result.alternatives.contains(&"//span[normalize-space()='Hi']".to_string()));
}

#[test]
fn test_identical_items_are_parent_anchored() {
    let doc = fixture_page();
    let settings = SelectorSettings::default();
    let a = first(&doc, "//*[@id='parentA']//li");
    let b = first(&doc, "//*[@id='parentB']//li");

    let best_a = generate_selectors(&doc, a, &settings).best;
    let best_b = generate_selectors(&doc, b, &settings).best;
    assert_ne!(best_a, best_b);
    assert!(best_a.starts_with("//*[@id='parentA']//li"), "{}", best_a);
    assert!(best_b.starts_with("//*[@id='parentB']//li"), "{}", best_b);
}

#[test]
fn test_disabled_enhanced_mode_always_falls_back() {
    let doc = fixture_page();
    let settings = SelectorSettings { enable_enhanced_selectors: false, ..Default::default() };
    for element in body_elements(&doc) {
        let outcome = SelectorGenerator::new(&doc, &settings).generate(element);
        assert!(matches!(outcome, GenerationOutcome::Fallback { .. }), "{:?}", outcome);
    }
}

#[test]
fn test_hidden_select_is_recorded_as_attached() {
    let doc = fixture_page();
    let select = doc.find_by_id("hidden-select").unwrap();
    let action = create_action(
        &doc,
        select,
        ActionType::Select,
        &SelectorSettings::default(),
        ActionFields::values(vec!["a".to_string()]),
    );
    assert_eq!(action.selector.as_ref().and_then(|s| s.state()), Some(ElementState::Attached));

    let click = create_action(&doc, select, ActionType::Click, &SelectorSettings::default(), ActionFields::default());
    assert_eq!(click.selector.as_ref().and_then(|s| s.state()), Some(ElementState::Hidden));
}

#[test]
fn test_table_cell_and_list_item() {
    let doc = fixture_page();
    // text candidates alone would trigger the early exit before the table strategy
    let settings = SelectorSettings { early_exit_threshold: 20, ..Default::default() };

    let cell = first(&doc, "//td[normalize-space()='Pending']");
    let result = generate_selectors(&doc, cell, &settings);
    assert!(result.alternatives.iter().any(|l| l.contains("//table[@id='orders']")), "{:?}", result.alternatives);

    // duplicate-prefix text still resolves to the right item
    let item = first(&doc, "//li[normalize-space()='Write tests']");
    let best = generate_selectors(&doc, item, &settings).best;
    assert_eq!(doc.evaluate_xpath(doc.root(), &best).unwrap(), vec![item]);
}

// ============================================================================
// Shadow DOM and iframes
// ============================================================================

#[test]
fn test_shadow_and_iframe_elements() {
    let doc = Document::parse_html(
        r#"<body>
            <app-shell id="shell">
                <template shadowrootmode="open">
                    <div role="toolbar"><button>Save</button><button>Discard</button></div>
                </template>
            </app-shell>
            <iframe id="embed" srcdoc="<form><button id='pay'>Pay</button></form>"></iframe>
        </body>"#,
    );
    let settings = SelectorSettings::default();

    let shell = doc.find_by_id("shell").unwrap();
    let shadow = doc.shadow_root(shell).unwrap();
    let discard = doc.query_css(shadow, "button").unwrap()[1];
    let action = create_action(&doc, discard, ActionType::Click, &settings, ActionFields::default());
    match action.selector.unwrap() {
        SelectorDescriptor::Shadow { host, inner } => {
            assert_eq!(host.current(), "//app-shell[@id='shell']");
            assert_eq!(doc.query_css(shadow, &inner).unwrap(), vec![discard]);
        }
        other => panic!("expected a shadow selector, got {:?}", other),
    }

    let frame = doc.find_by_id("embed").unwrap();
    let frame_doc = doc.content_document(frame).unwrap();
    let pay = doc.query_css(frame_doc, "#pay").unwrap()[0];
    let result = generate_selectors(&doc, pay, &settings);
    assert_eq!(result.best, "//button[@id='pay']");
    // resolves inside the frame document, not the top-level one
    assert!(doc.evaluate_xpath(doc.root(), &result.best).unwrap().is_empty());
    assert_eq!(doc.evaluate_xpath(frame_doc, &result.best).unwrap(), vec![pay]);
}
