use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};

use cap_std::fs::Dir;
use egui::Ui;
use egui_extras::{Column, TableRow};
use miette::{Context, IntoDiagnostic, Result};
use ringbuffer::{AllocRingBuffer, RingBuffer};
use tracing::{field::Visit, Event, Level, Subscriber};
use tracing_subscriber::Layer;

pub const LOG_ENV: &str = "MOBHUNT_LOG";
pub const LOG_FILE_NAME: &str = "mobhunt.log";
const RECENT_EVENTS_CAPACITY: usize = 128;

/// Keeps the most recent events in memory so that the debug panel can show them.
pub struct MobHuntTracingLayer;
static RECENT_EVENTS: OnceLock<Mutex<AllocRingBuffer<TracingEvent>>> = OnceLock::new();

fn recent_events() -> &'static Mutex<AllocRingBuffer<TracingEvent>> {
    RECENT_EVENTS.get_or_init(|| Mutex::new(AllocRingBuffer::new(RECENT_EVENTS_CAPACITY)))
}

impl MobHuntTracingLayer {
    /// Installs the global subscriber. The returned guard flushes the log file when dropped,
    /// so the plugin must hold onto it until shutdown.
    pub fn install_tracing(mobhunt_dir: &Dir) -> Result<tracing_appender::non_blocking::WorkerGuard> {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{fmt, EnvFilter};
        let filter_layer = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new("info"))
            .into_diagnostic()
            .wrap_err("failed to create log filter")?;
        // create log file in the data dir. This will also serve as a check that the directory is "writeable" by us
        let writer = std::io::BufWriter::new(
            mobhunt_dir
                .create(LOG_FILE_NAME)
                .into_diagnostic()
                .wrap_err("failed to create mobhunt.log file")?,
        );
        let (nb, guard) = tracing_appender::non_blocking(writer);
        let fmt_layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(nb);
        // the host may reload the addon within the same process. the old subscriber stays in that case.
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .with(MobHuntTracingLayer)
            .try_init()
            .into_diagnostic()
            .wrap_err("failed to set global tracing subscriber")?;
        Ok(guard)
    }

    /// Level and formatted message of the buffered events, oldest first.
    pub fn recent_messages() -> Vec<(Level, String)> {
        recent_events()
            .lock()
            .map(|events| {
                events
                    .iter()
                    .map(|ev| (ev.level, ev.display_message()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn show_recent_events(ui: &mut Ui) {
        let Ok(events) = recent_events().lock() else {
            ui.label("log buffer is poisoned");
            return;
        };
        egui_extras::TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::exact(50.0))
            .column(Column::initial(120.0).range(40.0..=300.0).clip(true))
            .column(Column::remainder().clip(true))
            .min_scrolled_height(0.0)
            .max_scroll_height(200.0)
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("level");
                });
                header.col(|ui| {
                    ui.strong("target");
                });
                header.col(|ui| {
                    ui.strong("message");
                });
            })
            .body(|body| {
                // newest first
                let len = events.len();
                body.rows(18.0, len, |index, mut row| {
                    if let Some(ev) = events.get(len - 1 - index) {
                        ev.ui_row(&mut row);
                    }
                });
            });
    }
}

/// A tracing event as we keep it in memory.
#[derive(Debug, Clone)]
struct TracingEvent {
    level: Level,
    /// usually the module path where the event was triggered
    target: String,
    /// formatted message followed by the recorded fields
    message: String,
    fields: BTreeMap<String, String>,
}

struct EventVisitor<'a>(&'a mut TracingEvent);
impl Visit for EventVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => {
                self.0.message = format!("{value:?}");
            }
            name if name.starts_with("log.") => {}
            name => {
                self.0.fields.insert(name.to_string(), format!("{value:?}"));
            }
        }
    }

    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.record_debug(field, &value)
    }
}

impl TracingEvent {
    fn from_event(event: &Event<'_>) -> Self {
        let mut te = Self {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: String::new(),
            fields: BTreeMap::new(),
        };
        event.record(&mut EventVisitor(&mut te));
        te
    }

    fn display_message(&self) -> String {
        let mut message = self.message.clone();
        for (name, value) in &self.fields {
            message.push_str(&format!(" {name}={value}"));
        }
        message
    }

    fn ui_row(&self, row: &mut TableRow) {
        let color = match self.level {
            Level::ERROR => egui::Color32::RED,
            Level::WARN => egui::Color32::YELLOW,
            _ => egui::Color32::GRAY,
        };
        row.col(|ui| {
            ui.colored_label(color, self.level.as_str());
        });
        row.col(|ui| {
            ui.label(&self.target);
        });
        row.col(|ui| {
            ui.label(self.display_message());
        });
    }
}

impl<S: Subscriber> Layer<S> for MobHuntTracingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let te = TracingEvent::from_event(event);
        if let Ok(mut events) = recent_events().lock() {
            events.push(te);
        }
    }
}
