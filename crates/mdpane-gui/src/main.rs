#![forbid(unsafe_code)]
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]

#[cfg(target_arch = "wasm32")]
compile_error!("mdpane is a native desktop app; web/wasm builds are not supported.");

use std::{ffi::OsString, path::PathBuf, time::Instant};

use eframe::egui;
use mdpane_core::{APP_NAME, Controller, FileError, Flow, GateChoice, PreviewSync, Settings};
use tracing::info;

mod dialogs;
mod preview;

use dialogs::NativeDialogs;
use preview::PreviewPane;

const NEW: egui::KeyboardShortcut =
    egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::N);
const OPEN: egui::KeyboardShortcut =
    egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::O);
const SAVE: egui::KeyboardShortcut =
    egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S);
const SAVE_AS: egui::KeyboardShortcut = egui::KeyboardShortcut::new(
    egui::Modifiers::COMMAND.plus(egui::Modifiers::SHIFT),
    egui::Key::S,
);
const EXIT: egui::KeyboardShortcut =
    egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Q);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct LaunchOptions {
    path: Option<PathBuf>,
}

fn parse_launch_options<I, S>(args: I) -> LaunchOptions
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let path = args
        .into_iter()
        .map(Into::into)
        .find(|arg| !arg.to_string_lossy().starts_with('-'))
        .map(PathBuf::from);

    LaunchOptions { path }
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let settings = Settings::load_or_default();
    let launch_options = parse_launch_options(std::env::args_os().skip(1));
    let app = MdpaneApp::new(settings, launch_options);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_NAME)
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };
    eframe::run_native("mdpane", options, Box::new(move |_cc| Ok(Box::new(app))))
}

/// Menu and toolbar commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    New,
    Open,
    Save,
    SaveAs,
    Exit,
}

struct MdpaneApp {
    controller: Controller,
    sync: PreviewSync,
    preview: PreviewPane,
    dialogs: NativeDialogs,
    font_size: f32,
    word_wrap: bool,
    last_cursor: Option<(usize, usize)>,
    error: Option<FileError>,
    allow_close: bool,
    title: String,
}

impl MdpaneApp {
    fn new(settings: Settings, launch: LaunchOptions) -> Self {
        let mut app = Self {
            controller: Controller::new(),
            sync: PreviewSync::new(mdpane_core::PreviewRenderer::new(settings.markdown)),
            preview: PreviewPane::new(settings.markdown),
            dialogs: NativeDialogs,
            font_size: settings.font_size,
            word_wrap: settings.word_wrap,
            last_cursor: None,
            error: None,
            allow_close: false,
            title: String::new(),
        };

        if let Some(path) = launch.path {
            let opened = app.controller.open_path(path);
            app.report(opened);
        }
        app
    }

    fn modal_open(&self) -> bool {
        self.controller.pending().is_some() || self.error.is_some()
    }

    fn report<T>(&mut self, result: Result<T, FileError>) {
        if let Err(err) = result {
            self.error = Some(err);
        }
    }

    fn handle_flow(&mut self, ctx: &egui::Context, result: Result<Flow, FileError>) {
        match result {
            Ok(Flow::Exit) => {
                info!("exiting");
                self.allow_close = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Ok(Flow::Completed | Flow::AwaitingConfirmation | Flow::Aborted) => {}
            Err(err) => self.error = Some(err),
        }
    }

    fn run(&mut self, ctx: &egui::Context, command: Command) {
        match command {
            Command::New => {
                let flow = self.controller.new_document(&mut self.dialogs);
                self.handle_flow(ctx, flow);
            }
            Command::Open => {
                let flow = self.controller.open(None, &mut self.dialogs);
                self.handle_flow(ctx, flow);
            }
            Command::Save => {
                let saved = self.controller.save(&mut self.dialogs);
                self.report(saved);
            }
            Command::SaveAs => {
                let saved = self.controller.save_as(&mut self.dialogs);
                self.report(saved);
            }
            Command::Exit => {
                let flow = self.controller.close(&mut self.dialogs);
                self.handle_flow(ctx, flow);
            }
        }
    }

    fn shortcut_command(ctx: &egui::Context) -> Option<Command> {
        ctx.input_mut(|i| {
            // Save As first: Ctrl+S would also match Ctrl+Shift+S.
            [
                (SAVE_AS, Command::SaveAs),
                (SAVE, Command::Save),
                (NEW, Command::New),
                (OPEN, Command::Open),
                (EXIT, Command::Exit),
            ]
            .into_iter()
            .find_map(|(shortcut, command)| i.consume_shortcut(&shortcut).then_some(command))
        })
    }

    fn show_menu(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) -> Option<Command> {
        let mut picked = None;
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                let entries = [
                    ("New", NEW, Command::New),
                    ("Open...", OPEN, Command::Open),
                    ("Save", SAVE, Command::Save),
                    ("Save As...", SAVE_AS, Command::SaveAs),
                    ("Exit", EXIT, Command::Exit),
                ];
                for (label, shortcut, command) in entries {
                    if matches!(command, Command::Save | Command::Exit) {
                        ui.separator();
                    }
                    let button =
                        egui::Button::new(label).shortcut_text(ctx.format_shortcut(&shortcut));
                    if ui.add(button).clicked() {
                        picked = Some(command);
                        ui.close();
                    }
                }
            });
        });

        ui.horizontal(|ui| {
            ui.toggle_value(&mut self.word_wrap, "Word Wrap");
            if ui.button("Copy HTML").clicked() {
                ctx.copy_text(self.preview.html().to_owned());
            }
        });

        picked
    }

    fn show_editor(&mut self, ui: &mut egui::Ui) {
        let word_wrap = self.word_wrap;
        let font = egui::FontId::monospace(self.font_size);

        let mut layouter = |ui: &egui::Ui, buf: &dyn egui::TextBuffer, wrap_width: f32| {
            let wrap_width = if word_wrap { wrap_width } else { f32::INFINITY };
            let job = egui::text::LayoutJob::simple(
                buf.as_str().to_owned(),
                font.clone(),
                ui.visuals().text_color(),
                wrap_width,
            );
            ui.painter().layout_job(job)
        };

        let scroll = if word_wrap {
            egui::ScrollArea::vertical()
        } else {
            egui::ScrollArea::both()
        };
        let visible = ui.available_size();
        let text = self.controller.document_mut().text_mut();
        let output = scroll
            .id_salt("editor")
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                egui::TextEdit::multiline(text)
                    .id(egui::Id::new("editor"))
                    .code_editor()
                    .frame(false)
                    .desired_width(visible.x)
                    .min_size(visible)
                    .layouter(&mut layouter)
                    .show(ui)
            });

        if output.inner.response.changed() {
            self.controller.document_mut().mark_edited();
        }

        let position = output.state.offset.y;
        let maximum = (output.content_size.y - output.inner_rect.height()).max(0.0);
        let cursor = output
            .inner
            .cursor_range
            .map(|range| (range.primary.index, range.secondary.index));

        if cursor == self.last_cursor {
            self.sync.observe_editor(position, maximum);
        } else {
            self.last_cursor = cursor;
            self.sync.cursor_moved(position, maximum, &mut self.preview);
        }
    }

    fn show_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(err) = &self.error {
            let mut dismissed = ctx.input(|i| {
                i.key_pressed(egui::Key::Escape) || i.key_pressed(egui::Key::Enter)
            });
            egui::Window::new(err.heading())
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(err.to_string());
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            if dismissed {
                self.error = None;
            }
            return;
        }

        if self.controller.pending().is_none() {
            return;
        }

        let mut choice = ctx
            .input(|i| i.key_pressed(egui::Key::Escape))
            .then_some(GateChoice::Cancel);

        egui::Window::new("Save Changes")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "\"{}\" has been modified.\nDo you want to save your changes?",
                    self.controller.document().display_name()
                ));
                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    for (label, option) in [
                        ("Save", GateChoice::Save),
                        ("Discard", GateChoice::Discard),
                        ("Cancel", GateChoice::Cancel),
                    ] {
                        if ui.button(label).clicked() {
                            choice = Some(option);
                        }
                    }
                });
            });

        if let Some(choice) = choice {
            let flow = self.controller.resolve(choice, &mut self.dialogs);
            self.handle_flow(ctx, flow);
        }
    }

    fn update_viewport_title(&mut self, ctx: &egui::Context) {
        let title = self.controller.document().window_title();
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }
}

impl eframe::App for MdpaneApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) && !self.allow_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            if !self.modal_open() {
                self.run(ctx, Command::Exit);
            }
        }

        let modal = self.modal_open();
        let mut command = if modal {
            None
        } else {
            Self::shortcut_command(ctx)
        };

        egui::TopBottomPanel::top("chrome").show(ctx, |ui| {
            ui.add_enabled_ui(!modal, |ui| {
                if let Some(picked) = self.show_menu(ctx, ui) {
                    command = Some(picked);
                }
            });
        });

        egui::SidePanel::left("editor_panel")
            .resizable(true)
            .default_width(600.0)
            .min_width(200.0)
            .show(ctx, |ui| {
                if modal {
                    ui.disable();
                }
                self.show_editor(ui);
            });

        // Every edit re-renders before the preview is drawn in the same frame.
        let now = Instant::now();
        self.sync
            .refresh(self.controller.document(), &mut self.preview, now);
        if let Some(wait) = self.sync.tick(now, &mut self.preview) {
            ctx.request_repaint_after(wait);
        }

        egui::CentralPanel::default().show(ctx, |ui| self.preview.show(ui));

        if let Some(command) = command {
            self.run(ctx, command);
        }

        self.show_dialogs(ctx);
        self.update_viewport_title(ctx);
    }
}
