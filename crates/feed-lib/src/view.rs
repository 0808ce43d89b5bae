//! Render dispatch for sink consumers
//!
//! Renderers receive an immutable [`ViewState`] and the current
//! [`SinkTable`] on every call; nothing is shared between calls. Each
//! renderer declares which inputs it depends on when it is registered, and
//! [`Dispatcher::notify`] re-runs only the renderers that depend on the input
//! that changed.

use crate::sink::SinkTable;
use std::fmt;

/// Per-render context: which domain is shown and which entities are selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub domain: String,
    /// Selected entity names; empty means every entity
    pub selected: Vec<String>,
}

impl ViewState {
    pub fn new(domain: impl Into<String>, selected: Vec<String>) -> Self {
        Self {
            domain: domain.into(),
            selected,
        }
    }

    /// A new state with a different selection
    pub fn with_selection(&self, selected: Vec<String>) -> Self {
        Self {
            domain: self.domain.clone(),
            selected,
        }
    }

    /// Rows of `table` visible under this selection, in sink order
    pub fn rows(&self, table: &SinkTable) -> SinkTable {
        if self.selected.is_empty() {
            table.clone()
        } else {
            table.select(&self.selected)
        }
    }
}

/// An input a renderer can depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// The user's entity selection
    Selection,
    /// The sink contents
    Sink,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Selection => write!(f, "selection"),
            Dependency::Sink => write!(f, "sink"),
        }
    }
}

type RenderFn = Box<dyn Fn(&ViewState, &SinkTable) -> String + Send + Sync>;

struct Renderer {
    name: String,
    dependencies: Vec<Dependency>,
    render: RenderFn,
}

/// Output of one renderer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub name: String,
    pub output: String,
}

/// Registry of renderers keyed by declared dependencies
#[derive(Default)]
pub struct Dispatcher {
    renderers: Vec<Renderer>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer; registering an existing name replaces it
    pub fn register<F>(&mut self, name: &str, dependencies: &[Dependency], render: F)
    where
        F: Fn(&ViewState, &SinkTable) -> String + Send + Sync + 'static,
    {
        let renderer = Renderer {
            name: name.to_string(),
            dependencies: dependencies.to_vec(),
            render: Box::new(render),
        };

        match self.renderers.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = renderer,
            None => self.renderers.push(renderer),
        }
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Names of renderers depending on `change`, in registration order
    pub fn dependents(&self, change: Dependency) -> Vec<&str> {
        self.renderers
            .iter()
            .filter(|r| r.dependencies.contains(&change))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Re-run the renderers that depend on `change`
    pub fn notify(&self, change: Dependency, view: &ViewState, table: &SinkTable) -> Vec<Rendered> {
        self.renderers
            .iter()
            .filter(|r| r.dependencies.contains(&change))
            .map(|r| Rendered {
                name: r.name.clone(),
                output: (r.render)(view, table),
            })
            .collect()
    }

    /// Run every renderer, e.g. for the first frame
    pub fn render_all(&self, view: &ViewState, table: &SinkTable) -> Vec<Rendered> {
        self.renderers
            .iter()
            .map(|r| Rendered {
                name: r.name.clone(),
                output: (r.render)(view, table),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn table() -> SinkTable {
        SinkTable {
            headers: vec!["Company".into(), "Ticker".into(), "Time".into(), "Price".into()],
            rows: vec![
                vec!["NIKE Inc".into(), "NKE".into(), "2024-01-01 10:00:00".into(), "140".into()],
                vec![
                    "Amazon.com Inc".into(),
                    "AMZN".into(),
                    "2024-01-01 10:00:00".into(),
                    "135".into(),
                ],
                vec!["NIKE Inc".into(), "NKE".into(), "2024-01-01 10:01:00".into(), "141".into()],
            ],
        }
    }

    #[test]
    fn test_view_rows_follow_selection() {
        let view = ViewState::new("stocks", vec![]);
        assert_eq!(view.rows(&table()).len(), 3);

        let view = view.with_selection(vec!["NIKE Inc".into()]);
        let rows = view.rows(&table());
        assert_eq!(rows.len(), 2);
        assert!(rows.rows.iter().all(|r| r[0] == "NIKE Inc"));
        assert_eq!(view.domain, "stocks");
    }

    #[test]
    fn test_notify_runs_only_dependents() {
        let sink_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&sink_calls);

        let mut dispatcher = Dispatcher::new();
        dispatcher.register("table", &[Dependency::Selection, Dependency::Sink], |view, table| {
            format!("{} rows", view.rows(table).len())
        });
        dispatcher.register("entities", &[Dependency::Sink], move |_, table| {
            counter.fetch_add(1, Ordering::SeqCst);
            table.entities().join(",")
        });
        dispatcher.register("title", &[Dependency::Selection], |view, _| {
            format!("{}: {}", view.domain, view.selected.join(","))
        });

        let view = ViewState::new("stocks", vec!["Amazon.com Inc".into()]);
        let rendered = dispatcher.notify(Dependency::Selection, &view, &table());

        let names: Vec<_> = rendered.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["table", "title"]);
        assert_eq!(rendered[0].output, "1 rows");
        assert_eq!(rendered[1].output, "stocks: Amazon.com Inc");
        assert_eq!(sink_calls.load(Ordering::SeqCst), 0);

        let rendered = dispatcher.notify(Dependency::Sink, &view, &table());
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[1].output, "NIKE Inc,Amazon.com Inc");
        assert_eq!(sink_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("table", &[Dependency::Sink], |_, _| "old".to_string());
        dispatcher.register("table", &[Dependency::Selection], |_, _| "new".to_string());

        assert_eq!(dispatcher.len(), 1);
        assert!(dispatcher.dependents(Dependency::Sink).is_empty());
        assert_eq!(dispatcher.dependents(Dependency::Selection), vec!["table"]);

        let view = ViewState::new("stocks", vec![]);
        assert_eq!(dispatcher.render_all(&view, &table())[0].output, "new");
    }
}
