//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use eqwatch_types::{tag_of, TagComponentMap};

use crate::data::{report, DiagnosticsData, DiagnosticsOptions, EventData, UnresolvedPolicy};
use crate::plot::UNMAPPED_LABEL;
use crate::source::{ModelEvaluation, ModelSource};
use crate::ui::ranges::{sort_events_by, SortColumn};
use crate::ui::Theme;

/// The current view/tab in the TUI.
///
/// Event detail is shown as an overlay (controlled by `App::show_detail_overlay`)
/// rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Predicted ranges with their top sensor and component.
    Events,
    /// Importance rolled up to components over the whole window.
    Components,
    /// Duration-weighted importance per sensor.
    Sensors,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Events => View::Components,
            View::Components => View::Sensors,
            View::Sensors => View::Events,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            View::Events => View::Sensors,
            View::Components => View::Events,
            View::Sensors => View::Components,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Events => "Events",
            View::Components => "Components",
            View::Sensors => "Sensors",
        }
    }
}

/// Saved state for returning to a previous view.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub view: View,
    pub selected_index: usize,
    pub filter_text: String,
}

/// A row of the Components view. The unmapped row collects every
/// unresolved sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRow<'a> {
    pub label: &'a str,
    pub value: f64,
    pub share: f64,
    pub unmapped: bool,
}

/// A row of the Sensors view.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRow<'a> {
    pub sensor: &'a str,
    pub component: Option<&'a str>,
    pub value: f64,
    pub share: f64,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Data source
    source: Box<dyn ModelSource>,
    map: TagComponentMap,
    options: DiagnosticsOptions,
    evaluation: Option<ModelEvaluation>,
    pub data: Option<DiagnosticsData>,
    pub load_error: Option<String>,
    /// Sensors kept per list in exports.
    pub top: usize,

    // Navigation state
    pub selected_index: usize,
    pub view_stack: Vec<ViewState>,

    // Sorting (Events view)
    pub sort_column: SortColumn,
    pub sort_ascending: bool,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(source: Box<dyn ModelSource>, map: TagComponentMap, options: DiagnosticsOptions) -> Self {
        Self {
            running: true,
            current_view: View::Events,
            show_help: false,
            show_detail_overlay: false,
            source,
            map,
            options,
            evaluation: None,
            data: None,
            load_error: None,
            top: 5,
            selected_index: 0,
            view_stack: Vec::new(),
            sort_column: SortColumn::default(),
            sort_ascending: true,
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn map(&self) -> &TagComponentMap {
        &self.map
    }

    pub fn options(&self) -> &DiagnosticsOptions {
        &self.options
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < Duration::from_secs(3) => Some(msg),
            _ => None,
        }
    }

    /// Push current state to stack and navigate to a new view.
    pub fn push_view(&mut self, view: View) {
        self.view_stack.push(ViewState {
            view: self.current_view,
            selected_index: self.selected_index,
            filter_text: self.filter_text.clone(),
        });
        self.current_view = view;
        self.selected_index = 0;
    }

    /// Pop the view stack and restore previous state.
    pub fn pop_view(&mut self) -> bool {
        if let Some(state) = self.view_stack.pop() {
            self.current_view = state.view;
            self.selected_index = state.selected_index;
            self.filter_text = state.filter_text;
            true
        } else {
            false
        }
    }

    /// Get breadcrumb trail for current navigation.
    pub fn breadcrumb(&self) -> String {
        let mut parts: Vec<&str> = self.view_stack.iter().map(|s| s.view.label()).collect();
        parts.push(self.current_view.label());
        parts.join(" > ")
    }

    /// Poll the source for a new evaluation.
    ///
    /// Returns Ok(true) if new data was received, Ok(false) if no new data.
    /// Aggregation failures are kept in `load_error` rather than returned.
    pub fn reload_data(&mut self) -> Result<bool> {
        let Some(evaluation) = self.source.poll() else {
            if let Some(err) = self.source.error() {
                self.load_error = Some(err.to_string());
            }
            return Ok(false);
        };
        self.evaluation = Some(evaluation);
        Ok(self.recompute())
    }

    /// Rebuild diagnostics from the last evaluation with the current options.
    fn recompute(&mut self) -> bool {
        let Some(evaluation) = self.evaluation.clone() else {
            return false;
        };
        match DiagnosticsData::from_evaluation(evaluation, &self.map, &self.options) {
            Ok(data) => {
                self.data = Some(data);
                self.load_error = None;
                self.clamp_selection();
                true
            }
            Err(e) => {
                self.load_error = Some(e.to_string());
                false
            }
        }
    }

    /// Switch to the next unresolved-sensor policy and re-aggregate.
    ///
    /// A policy that fails (e.g. `strict` with unknown sensors) is skipped
    /// and the one after it is tried. If none works, the previous policy and
    /// data are kept.
    pub fn cycle_policy(&mut self) {
        let previous = self.options.policy;
        if self.evaluation.is_none() {
            self.options.policy = previous.next();
            return;
        }

        let error_before = self.load_error.clone();
        let mut skipped: Option<(UnresolvedPolicy, String)> = None;
        let mut candidate = previous.next();
        while candidate != previous {
            self.options.policy = candidate;
            if self.recompute() {
                let message = match skipped {
                    Some((failed, err)) => {
                        format!("Policy {} failed: {}; using {}", failed.name(), err, candidate.name())
                    }
                    None => format!("Unresolved sensors: {}", candidate.name()),
                };
                self.set_status_message(message);
                return;
            }
            let err = self.load_error.take().unwrap_or_default();
            if skipped.is_none() {
                skipped = Some((candidate, err));
            }
            candidate = candidate.next();
        }

        self.options.policy = previous;
        self.load_error = error_before;
        if let Some((failed, err)) = skipped {
            self.set_status_message(format!("Policy {} failed: {}", failed.name(), err));
        }
    }

    fn clamp_selection(&mut self) {
        let max = self.row_count().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
    }

    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.selected_index = 0;
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_next_n(&mut self, n: usize) {
        let max = self.row_count().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.row_count().saturating_sub(1);
    }

    /// Rows in the current view after filtering.
    pub fn row_count(&self) -> usize {
        match self.current_view {
            View::Events => self.visible_events().len(),
            View::Components => self.component_rows().len(),
            View::Sensors => self.sensor_rows().len(),
        }
    }

    /// Events matching the filter, in display order.
    ///
    /// An event matches when its start time, any of its sensors, or any of
    /// its components contains the filter text.
    pub fn visible_events(&self) -> Vec<&EventData> {
        let Some(ref data) = self.data else {
            return Vec::new();
        };
        let mut events: Vec<&EventData> = data.events.iter().filter(|e| self.event_matches(e)).collect();
        sort_events_by(&mut events, self.sort_column, self.sort_ascending);
        events
    }

    fn event_matches(&self, event: &EventData) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        self.matches_filter(&event.range.start.to_string())
            || event.sensors.iter().any(|s| self.matches_filter(&s.sensor))
            || event.components.components.iter().any(|c| self.matches_filter(&c.component))
    }

    /// Components ranked by importance, plus the unmapped row.
    pub fn component_rows(&self) -> Vec<ComponentRow<'_>> {
        let Some(ref data) = self.data else {
            return Vec::new();
        };
        let total = data.components.total();
        let share = |v: f64| if total > 0.0 { v / total } else { 0.0 };

        let mut rows: Vec<ComponentRow<'_>> = data
            .components
            .components
            .iter()
            .map(|c| ComponentRow {
                label: c.component.as_str(),
                value: c.value,
                share: share(c.value),
                unmapped: false,
            })
            .collect();
        if !data.components.unresolved.is_empty() {
            let value = data.components.unresolved_total();
            rows.push(ComponentRow {
                label: UNMAPPED_LABEL,
                value,
                share: share(value),
                unmapped: true,
            });
            rows.sort_by(|a, b| b.value.total_cmp(&a.value));
        }
        rows.retain(|r| self.matches_filter(r.label));
        rows
    }

    /// Sensors ranked by window importance.
    pub fn sensor_rows(&self) -> Vec<SensorRow<'_>> {
        let Some(ref data) = self.data else {
            return Vec::new();
        };
        let total: f64 = data.sensors.iter().map(|s| s.value).sum();
        data.sensors
            .iter()
            .filter(|s| self.matches_filter(&s.sensor))
            .map(|s| SensorRow {
                sensor: s.sensor.as_str(),
                component: self.map.resolve(&s.sensor),
                value: s.value,
                share: if total > 0.0 { s.value / total } else { 0.0 },
            })
            .collect()
    }

    /// The event under the cursor in the Events view.
    pub fn selected_event(&self) -> Option<&EventData> {
        if self.current_view != View::Events {
            return None;
        }
        self.visible_events().get(self.selected_index).copied()
    }

    /// Enter on a row: open the event detail, or list the events a
    /// component or sensor contributed to.
    pub fn enter_detail(&mut self) {
        let drill = match self.current_view {
            View::Events => {
                if self.selected_event().is_some() {
                    self.show_detail_overlay = true;
                }
                return;
            }
            View::Components => self
                .component_rows()
                .get(self.selected_index)
                .filter(|r| !r.unmapped)
                .map(|r| r.label.to_string()),
            View::Sensors => self
                .sensor_rows()
                .get(self.selected_index)
                .map(|r| tag_of(r.sensor).to_string()),
        };
        if let Some(filter) = drill {
            self.push_view(View::Events);
            self.filter_text = filter;
        }
    }

    /// Navigate back: close overlay first, then pop view stack, then go to Events.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
            return;
        }
        if !self.pop_view() && self.current_view != View::Events {
            self.set_view(View::Events);
        }
    }

    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn cycle_sort(&mut self) {
        if self.current_view == View::Events {
            self.sort_column = self.sort_column.next();
        }
    }

    pub fn toggle_sort_direction(&mut self) {
        if self.current_view == View::Events {
            self.sort_ascending = !self.sort_ascending;
        }
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.selected_index = 0;
    }

    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Case-insensitive substring match against the filter.
    pub fn matches_filter(&self, name: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        name.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current diagnostics to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let Some(ref data) = self.data else {
            anyhow::bail!("No data to export");
        };
        let json = serde_json::to_string_pretty(&report::to_json(data, self.top))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FileSource, StaticSource};

    const DOC: &str = r#"{
        "ModelName": "pump-model",
        "Status": "SUCCESS",
        "ModelMetrics": "{\"labeled_ranges\": [{\"start\": \"2019-08-08\", \"end\": \"2019-08-09\"}], \"predicted_ranges\": [{\"start\": \"2019-08-08T00:42\", \"end\": \"2019-08-08T01:48\", \"diagnostics\": [{\"name\": \"pump\\\\Sensor0\", \"value\": 0.6}, {\"name\": \"pump\\\\Sensor2\", \"value\": 0.4}]}, {\"start\": \"2019-09-01T00:00\", \"end\": \"2019-09-01T00:04\", \"diagnostics\": [{\"name\": \"pump\\\\Sensor9\", \"value\": 1.0}]}]}"
    }"#;

    fn app() -> App {
        let evaluation = ModelEvaluation::parse(DOC).unwrap();
        let map = TagComponentMap::builder()
            .component("impeller", ["Sensor0"])
            .component("volute", ["Sensor2"])
            .build()
            .unwrap();
        let mut app = App::new(Box::new(StaticSource::new(evaluation)), map, DiagnosticsOptions::default());
        app.theme = Theme::dark();
        assert!(app.reload_data().unwrap());
        app
    }

    #[test]
    fn test_reload_then_no_new_data() {
        let mut app = app();
        assert_eq!(app.source_description(), "memory: pump-model");
        assert!(!app.reload_data().unwrap());
        assert_eq!(app.data.as_ref().unwrap().events.len(), 2);
    }

    #[test]
    fn test_view_cycle() {
        let mut app = app();
        app.next_view();
        assert_eq!(app.current_view, View::Components);
        app.next_view();
        app.next_view();
        assert_eq!(app.current_view, View::Events);
        app.prev_view();
        assert_eq!(app.current_view, View::Sensors);
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut app = app();
        app.select_next_n(10);
        assert_eq!(app.selected_index, 1);
        app.select_prev_n(10);
        assert_eq!(app.selected_index, 0);
        app.select_last();
        assert_eq!(app.selected_index, 1);
    }

    #[test]
    fn test_component_rows_include_unmapped() {
        let app = app();
        let rows = app.component_rows();
        let labels: Vec<&str> = rows.iter().map(|r| r.label).collect();
        assert!(labels.contains(&UNMAPPED_LABEL));
        let share: f64 = rows.iter().map(|r| r.share).sum();
        assert!((share - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_drill_into_component_and_back() {
        let mut app = app();
        app.set_view(View::Components);
        let row = app
            .component_rows()
            .iter()
            .position(|r| r.label == "impeller")
            .unwrap();
        app.selected_index = row;
        app.enter_detail();

        assert_eq!(app.current_view, View::Events);
        assert_eq!(app.filter_text, "impeller");
        assert_eq!(app.visible_events().len(), 1);
        assert_eq!(app.breadcrumb(), "Components > Events");

        app.go_back();
        assert_eq!(app.current_view, View::Components);
        assert!(app.filter_text.is_empty());
        assert_eq!(app.selected_index, row);
    }

    #[test]
    fn test_detail_overlay_opens_and_closes() {
        let mut app = app();
        app.enter_detail();
        assert!(app.show_detail_overlay);
        assert!(app.selected_event().is_some());
        app.go_back();
        assert!(!app.show_detail_overlay);
        assert_eq!(app.current_view, View::Events);
    }

    #[test]
    fn test_filter_matches_sensor_names() {
        let mut app = app();
        for c in "SENSOR9".chars() {
            app.filter_push(c);
        }
        assert_eq!(app.visible_events().len(), 1);
        app.clear_filter();
        assert_eq!(app.visible_events().len(), 2);
    }

    #[test]
    fn test_policy_cycle_skips_failing_strict() {
        let mut app = app();
        assert_eq!(app.options().policy, UnresolvedPolicy::Report);

        app.cycle_policy();
        assert_eq!(app.options().policy, UnresolvedPolicy::NamePrefix);
        // Sensor9 resolves to "pump" under the prefix policy
        assert!(app.component_rows().iter().any(|r| r.label == "pump"));

        // Strict fails on Sensor9, so the cycle lands back on Report
        app.cycle_policy();
        assert_eq!(app.options().policy, UnresolvedPolicy::Report);
        assert!(app.load_error.is_none());
        assert!(app.get_status_message().unwrap().contains("strict"));
        assert!(app.component_rows().iter().any(|r| r.unmapped));

        let mut seen = Vec::new();
        for _ in 0..4 {
            app.cycle_policy();
            seen.push(app.options().policy.name());
        }
        assert_eq!(seen, vec!["prefix", "report", "prefix", "report"]);
    }

    #[test]
    fn test_policy_cycle_visits_strict_when_everything_maps() {
        let evaluation = ModelEvaluation::parse(DOC).unwrap();
        let map = TagComponentMap::builder()
            .component("impeller", ["Sensor0", "Sensor9"])
            .component("volute", ["Sensor2"])
            .build()
            .unwrap();
        let mut app = App::new(Box::new(StaticSource::new(evaluation)), map, DiagnosticsOptions::default());
        assert!(app.reload_data().unwrap());

        let mut seen = Vec::new();
        for _ in 0..3 {
            app.cycle_policy();
            seen.push(app.options().policy.name());
        }
        assert_eq!(seen, vec!["prefix", "strict", "report"]);
        assert!(app.load_error.is_none());
    }

    #[test]
    fn test_reload_recovers_after_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut app = App::new(
            Box::new(FileSource::new(&path)),
            TagComponentMap::new(),
            DiagnosticsOptions::default(),
        );
        assert!(!app.reload_data().unwrap());
        assert!(app.load_error.is_some());
        assert!(app.data.is_none());

        std::fs::write(&path, DOC).unwrap();
        assert!(app.reload_data().unwrap());
        assert!(app.load_error.is_none());
        assert_eq!(app.data.as_ref().unwrap().events.len(), 2);
    }

    #[test]
    fn test_export_state() {
        let app = app();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        app.export_state(&path).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["model"], "pump-model");
        assert_eq!(json["summary"]["unknown_events"], 1);
    }
}
