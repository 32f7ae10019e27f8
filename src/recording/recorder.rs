use crate::config::SelectorSettings;
use crate::dom::DomView;
use crate::selectors::generate_selectors;
use crate::state::{is_element_hidden, ElementState};

use super::action::{create_action, selector_descriptor, ActionDescriptor, ActionFields, ActionType};

/// Keys that are recorded as a `keyPress` on their own
const NON_CHARACTER_KEYS: &[&str] =
    &["Enter", "Tab", "Escape", "ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight"];

/// Tags/roles that count as the intended target of a click inside a shadow root
const SHADOW_CLICK_TARGETS: &[&str] = &["button", "a"];

/// A user interaction already captured by the host (content script, CDP
/// binding, test harness). `N` is the DOM's node handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent<N> {
    Click { target: N },
    DoubleClick { target: N },
    /// Focus left a field; `value` is its current value
    Blur { target: N, value: String },
    /// `selected` holds the selected option values for `<select>` targets
    Change { target: N, value: String, selected: Vec<String> },
    KeyDown { target: N, key: String, value: Option<String> },
    MouseDown { target: N, button: i16 },
    /// The page has been scrolled to the bottom and stayed there; the host
    /// is responsible for debouncing
    ReachedBottom,
    Navigation { url: String },
}

/// Translates captured events into action descriptors.
///
/// Events are ignored while the recorder is stopped. The DOM is passed per
/// event because a live page changes between interactions.
pub struct ActionRecorder<N> {
    settings: SelectorSettings,
    recording: bool,
    actions: Vec<ActionDescriptor>,
    last_typed: Option<N>,
    last_right_clicked: Option<N>,
    picker: Option<ActionType>,
    iframe_interaction: bool,
}

impl<N: Copy + Eq + std::fmt::Debug> ActionRecorder<N> {
    pub fn new(settings: SelectorSettings) -> Self {
        Self {
            settings,
            recording: false,
            actions: Vec::new(),
            last_typed: None,
            last_right_clicked: None,
            picker: None,
            iframe_interaction: false,
        }
    }

    pub fn settings(&self) -> &SelectorSettings {
        &self.settings
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn start(&mut self) {
        if self.recording {
            return;
        }
        self.recording = true;
        tracing::info!("Recording started");
    }

    /// Stop recording, clear transient state and hand back the actions
    pub fn stop(&mut self) -> Vec<ActionDescriptor> {
        if self.recording {
            tracing::info!("Recording stopped ({} actions)", self.actions.len());
        }
        self.recording = false;
        self.last_typed = None;
        self.last_right_clicked = None;
        self.picker = None;
        self.iframe_interaction = false;
        std::mem::take(&mut self.actions)
    }

    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    /// The next click records an `action` for the clicked element instead
    /// of a click. Escape cancels.
    pub fn start_picker(&mut self, action: ActionType) {
        tracing::debug!("Element picker armed for {}", action);
        self.picker = Some(action);
    }

    pub fn picker_active(&self) -> bool {
        self.picker.is_some()
    }

    pub fn iframe_interaction_detected(&self) -> bool {
        self.iframe_interaction
    }

    /// Best locator of the element last right-clicked while recording
    pub fn last_right_clicked_xpath<D: DomView<Node = N>>(&self, dom: &D) -> Option<String> {
        self.last_right_clicked.map(|node| generate_selectors(dom, node, &self.settings).best)
    }

    /// Process one event; returns the actions it produced, which are also
    /// appended to the recording
    pub fn handle<D: DomView<Node = N>>(&mut self, dom: &D, event: RecordedEvent<N>) -> Vec<ActionDescriptor> {
        if !self.recording {
            return Vec::new();
        }
        let produced = self.translate(dom, event);
        for action in &produced {
            tracing::debug!("Recorded {}", action.action);
        }
        self.actions.extend(produced.iter().cloned());
        produced
    }

    fn translate<D: DomView<Node = N>>(&mut self, dom: &D, event: RecordedEvent<N>) -> Vec<ActionDescriptor> {
        match event {
            RecordedEvent::Click { target } => self.on_click(dom, target).into_iter().collect(),
            RecordedEvent::DoubleClick { target } => {
                vec![self.action(dom, target, ActionType::DoubleClick, ActionFields::default())]
            }
            RecordedEvent::Blur { target, value } => self.on_blur(dom, target, value).into_iter().collect(),
            RecordedEvent::Change { target, value, selected } => {
                self.on_change(dom, target, value, selected).into_iter().collect()
            }
            RecordedEvent::KeyDown { target, key, value } => self.on_key_down(dom, target, &key, value),
            RecordedEvent::MouseDown { target, button } => {
                if button == 2 {
                    self.last_right_clicked = Some(target);
                }
                Vec::new()
            }
            RecordedEvent::ReachedBottom => vec![ActionDescriptor::scroll_bottom()],
            RecordedEvent::Navigation { url } => {
                tracing::debug!("Navigation to {}", url);
                self.last_typed = None;
                vec![ActionDescriptor::navigate(&url)]
            }
        }
    }

    fn on_click<D: DomView<Node = N>>(&mut self, dom: &D, target: N) -> Option<ActionDescriptor> {
        let in_shadow = dom.shadow_host(target).is_some();

        // the change event records the selection
        let on_select = dom.tag_name(target) == "select"
            || dom.closest(target, &|n| dom.tag_name(n) == "option").is_some();
        if on_select && !in_shadow {
            if self.settings.debug_mode {
                tracing::debug!("Ignoring click on select/option; handled by change");
            }
            return None;
        }

        if let Some(picked) = self.picker.take() {
            tracing::info!("Element picked for {}", picked);
            return Some(self.action(dom, target, picked, ActionFields::default()));
        }

        let target = if in_shadow { shadow_click_target(dom, target) } else { target };
        Some(self.action(dom, target, ActionType::Click, ActionFields::default()))
    }

    /// Text fields inside shadow roots are recorded on blur; their change
    /// events do not cross the shadow boundary reliably
    fn on_blur<D: DomView<Node = N>>(&mut self, dom: &D, target: N, value: String) -> Option<ActionDescriptor> {
        if dom.attribute(target, "role") == Some("combobox") {
            return None;
        }
        if !is_text_field(dom, target) || dom.shadow_host(target).is_none() {
            return None;
        }
        Some(self.action(dom, target, ActionType::Type, ActionFields::text(value)))
    }

    fn on_change<D: DomView<Node = N>>(
        &mut self,
        dom: &D,
        target: N,
        value: String,
        selected: Vec<String>,
    ) -> Option<ActionDescriptor> {
        let in_shadow = dom.shadow_host(target).is_some();

        if dom.tag_name(target) == "select" {
            if in_shadow || selected.is_empty() {
                return None;
            }
            // one action per selection, whatever the number of options
            let state = if is_element_hidden(dom, target) { ElementState::Attached } else { ElementState::Visible };
            return Some(ActionDescriptor {
                action: ActionType::Select,
                selector: Some(selector_descriptor(dom, target, &self.settings, Some(state))),
                fields: ActionFields::values(selected),
                on_error: super::action::DEFAULT_ON_ERROR.to_string(),
            });
        }

        if in_shadow || is_element_hidden(dom, target) {
            return None;
        }
        if self.last_typed == Some(target) {
            // already recorded by Enter
            self.last_typed = None;
            return None;
        }
        if !is_text_field(dom, target) {
            return None;
        }
        Some(self.action(dom, target, ActionType::Type, ActionFields::text(value)))
    }

    fn on_key_down<D: DomView<Node = N>>(
        &mut self,
        dom: &D,
        target: N,
        key: &str,
        value: Option<String>,
    ) -> Vec<ActionDescriptor> {
        if key == "Escape" && self.picker.take().is_some() {
            tracing::debug!("Element picker cancelled");
        }

        let value = value.filter(|v| !v.is_empty());
        if key == "Enter" && is_text_field(dom, target) {
            if let Some(value) = value {
                self.last_typed = Some(target);
                return vec![
                    self.action(dom, target, ActionType::Type, ActionFields::text(value)),
                    ActionDescriptor::key_press(key),
                ];
            }
        }

        if NON_CHARACTER_KEYS.contains(&key) {
            return vec![ActionDescriptor::key_press(key)];
        }
        Vec::new()
    }

    fn action<D: DomView<Node = N>>(
        &mut self,
        dom: &D,
        target: N,
        action: ActionType,
        fields: ActionFields,
    ) -> ActionDescriptor {
        if dom.in_iframe(target) && !self.iframe_interaction {
            tracing::info!("Iframe interaction detected");
            self.iframe_interaction = true;
        }
        create_action(dom, target, action, &self.settings, fields)
    }
}

fn is_text_field<D: DomView>(dom: &D, node: D::Node) -> bool {
    matches!(dom.tag_name(node), "input" | "textarea")
}

/// The nearest clickable ancestor within the same shadow root, or the
/// element itself
fn shadow_click_target<D: DomView>(dom: &D, target: D::Node) -> D::Node {
    let root = dom.tree_root(target);
    dom.closest(target, &|n| {
        let tag = dom.tag_name(n);
        SHADOW_CLICK_TARGETS.contains(&tag)
            || dom.attribute(n, "role") == Some("button")
            || (tag == "input" && matches!(dom.attribute(n, "type"), Some("button") | Some("submit")))
    })
    .filter(|&n| dom.tree_root(n) == root)
    .unwrap_or(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, NodeId};
    use crate::recording::SelectorDescriptor;

    fn recorder() -> ActionRecorder<NodeId> {
        let mut recorder = ActionRecorder::new(SelectorSettings::default());
        recorder.start();
        recorder
    }

    fn page() -> Document {
        Document::parse_html(
            r#"<body>
                <form id="login">
                    <input id="user" name="user">
                    <select id="country" name="country"><option id="opt" value="de">Germany</option></select>
                    <button id="go">Sign in</button>
                </form>
            </body>"#,
        )
    }

    #[test]
    fn test_events_ignored_until_started() {
        let doc = page();
        let go = doc.find_by_id("go").unwrap();
        let mut recorder = ActionRecorder::new(SelectorSettings::default());
        assert!(recorder.handle(&doc, RecordedEvent::Click { target: go }).is_empty());
        recorder.start();
        assert_eq!(recorder.handle(&doc, RecordedEvent::Click { target: go }).len(), 1);
        assert_eq!(recorder.stop().len(), 1);
        assert!(recorder.actions().is_empty());
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_click_records_click() {
        let doc = page();
        let go = doc.find_by_id("go").unwrap();
        let mut recorder = recorder();
        let actions = recorder.handle(&doc, RecordedEvent::Click { target: go });
        assert_eq!(actions[0].action, ActionType::Click);
        assert_eq!(actions[0].selector.as_ref().unwrap().current(), "//button[@id='go']");
    }

    #[test]
    fn test_select_consolidation() {
        let doc = page();
        let select = doc.find_by_id("country").unwrap();
        let option = doc.find_by_id("opt").unwrap();
        let mut recorder = recorder();
        assert!(recorder.handle(&doc, RecordedEvent::Click { target: select }).is_empty());
        assert!(recorder.handle(&doc, RecordedEvent::Click { target: option }).is_empty());

        let actions = recorder.handle(
            &doc,
            RecordedEvent::Change { target: select, value: "de".into(), selected: vec!["de".into()] },
        );
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, ActionType::Select);
        assert_eq!(actions[0].fields.values, Some(vec!["de".to_string()]));
        assert_eq!(actions[0].selector.as_ref().unwrap().state(), Some(ElementState::Visible));
        assert_eq!(recorder.actions().len(), 1);
    }

    #[test]
    fn test_hidden_select_change_is_attached() {
        let doc = Document::parse_html(
            r#"<body><select id="s" style="display:none"><option value="a">A</option></select></body>"#,
        );
        let select = doc.find_by_id("s").unwrap();
        let mut recorder = recorder();
        let actions = recorder.handle(
            &doc,
            RecordedEvent::Change { target: select, value: "a".into(), selected: vec!["a".into()] },
        );
        assert_eq!(actions[0].selector.as_ref().unwrap().state(), Some(ElementState::Attached));
    }

    #[test]
    fn test_enter_records_type_and_key_once() {
        let doc = page();
        let user = doc.find_by_id("user").unwrap();
        let mut recorder = recorder();
        let actions = recorder.handle(
            &doc,
            RecordedEvent::KeyDown { target: user, key: "Enter".into(), value: Some("alice".into()) },
        );
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].action, ActionType::Type);
        assert_eq!(actions[0].fields.text.as_deref(), Some("alice"));
        assert_eq!(actions[1], ActionDescriptor::key_press("Enter"));

        // the change that follows Enter is not recorded twice
        let change = RecordedEvent::Change { target: user, value: "alice".into(), selected: vec![] };
        assert!(recorder.handle(&doc, change.clone()).is_empty());
        assert_eq!(recorder.handle(&doc, change).len(), 1);
    }

    #[test]
    fn test_character_keys_are_not_recorded() {
        let doc = page();
        let user = doc.find_by_id("user").unwrap();
        let mut recorder = recorder();
        assert!(recorder
            .handle(&doc, RecordedEvent::KeyDown { target: user, key: "a".into(), value: Some("a".into()) })
            .is_empty());
        let tab = recorder.handle(&doc, RecordedEvent::KeyDown { target: user, key: "Tab".into(), value: None });
        assert_eq!(tab, vec![ActionDescriptor::key_press("Tab")]);
    }

    #[test]
    fn test_picker_records_picked_action() {
        let doc = page();
        let go = doc.find_by_id("go").unwrap();
        let mut recorder = recorder();
        recorder.start_picker(ActionType::WaitForSelector);
        let actions = recorder.handle(&doc, RecordedEvent::Click { target: go });
        assert_eq!(actions[0].action, ActionType::WaitForSelector);
        assert_eq!(actions[0].selector.as_ref().unwrap().state(), Some(ElementState::Attached));
        assert!(!recorder.picker_active());
    }

    #[test]
    fn test_escape_cancels_picker() {
        let doc = page();
        let go = doc.find_by_id("go").unwrap();
        let mut recorder = recorder();
        recorder.start_picker(ActionType::Hover);
        recorder.handle(&doc, RecordedEvent::KeyDown { target: go, key: "Escape".into(), value: None });
        assert!(!recorder.picker_active());
        let actions = recorder.handle(&doc, RecordedEvent::Click { target: go });
        assert_eq!(actions[0].action, ActionType::Click);
    }

    #[test]
    fn test_right_click_memory() {
        let doc = page();
        let go = doc.find_by_id("go").unwrap();
        let mut recorder = recorder();
        assert_eq!(recorder.last_right_clicked_xpath(&doc), None);
        recorder.handle(&doc, RecordedEvent::MouseDown { target: go, button: 0 });
        assert_eq!(recorder.last_right_clicked_xpath(&doc), None);
        recorder.handle(&doc, RecordedEvent::MouseDown { target: go, button: 2 });
        assert_eq!(recorder.last_right_clicked_xpath(&doc).as_deref(), Some("//button[@id='go']"));
    }

    #[test]
    fn test_scroll_and_navigation() {
        let doc = page();
        let mut recorder = recorder();
        let scrolled = recorder.handle(&doc, RecordedEvent::ReachedBottom);
        assert_eq!(scrolled, vec![ActionDescriptor::scroll_bottom()]);
        let navigated = recorder.handle(&doc, RecordedEvent::Navigation { url: "https://example.com/next".into() });
        assert_eq!(navigated[0].fields.url.as_deref(), Some("https://example.com/next"));
    }

    #[test]
    fn test_shadow_click_targets_button() {
        let doc = Document::parse_html(
            r#"<body><x-toolbar id="bar"><template shadowrootmode="open"><button data-testid="save"><span>Save</span></button></template></x-toolbar></body>"#,
        );
        let bar = doc.find_by_id("bar").unwrap();
        let shadow = doc.shadow_root(bar).unwrap();
        let span = doc.query_css(shadow, "span").unwrap()[0];

        let mut recorder = recorder();
        let actions = recorder.handle(&doc, RecordedEvent::Click { target: span });
        match actions[0].selector.as_ref().unwrap() {
            SelectorDescriptor::Shadow { host, inner } => {
                assert_eq!(inner, "button[data-testid='save']");
                assert_eq!(host.current(), "//x-toolbar[@id='bar']");
            }
            other => panic!("expected shadow selector, got {:?}", other),
        }
    }

    #[test]
    fn test_shadow_input_recorded_on_blur() {
        let doc = Document::parse_html(
            r#"<body><x-search id="s"><template shadowrootmode="open"><input name="q"><input role="combobox" name="c"></template></x-search></body>"#,
        );
        let host = doc.find_by_id("s").unwrap();
        let shadow = doc.shadow_root(host).unwrap();
        let inputs = doc.query_css(shadow, "input").unwrap();

        let mut recorder = recorder();
        let change = RecordedEvent::Change { target: inputs[0], value: "rust".into(), selected: vec![] };
        assert!(recorder.handle(&doc, change).is_empty());
        assert!(recorder
            .handle(&doc, RecordedEvent::Blur { target: inputs[1], value: "x".into() })
            .is_empty());

        let actions = recorder.handle(&doc, RecordedEvent::Blur { target: inputs[0], value: "rust".into() });
        assert_eq!(actions[0].action, ActionType::Type);
        assert_eq!(actions[0].fields.text.as_deref(), Some("rust"));
        assert_eq!(actions[0].selector.as_ref().unwrap().current(), "input[name='q']");
    }

    #[test]
    fn test_iframe_interaction_flag() {
        let doc = Document::parse_html(
            r#"<body><iframe id="f" srcdoc="<button id='inside'>In</button>"></iframe></body>"#,
        );
        let frame = doc.find_by_id("f").unwrap();
        let frame_doc = doc.content_document(frame).unwrap();
        let button = doc.query_css(frame_doc, "#inside").unwrap()[0];

        let mut recorder = recorder();
        recorder.handle(&doc, RecordedEvent::Click { target: button });
        assert!(recorder.iframe_interaction_detected());
        recorder.stop();
        assert!(!recorder.iframe_interaction_detected());
    }
}
