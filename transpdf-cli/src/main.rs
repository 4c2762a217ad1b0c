use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossterm::cursor;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{self, Clear, ClearType};
use directories::ProjectDirs;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};
use transpdf_client::HttpBackend;
use transpdf_core::{
    Command, Completion, Config, DocumentBackend, DocumentId, Effect, EffectRunner,
    SelectionSource, Services, UploadFile, Viewer,
};
use transpdf_render::PdfiumProvider;
use transpdf_tty::{
    overlay_lines, overlay_rect, status_line, EditField, EventMapper, InputMode, PageSurface, Rect,
    TextRenderer, UiEvent,
};

const HINT: &str = "j/k page  p go to  o open  c close  q quit  drag to translate";

#[derive(Debug, Parser)]
#[command(
    name = "transpdf",
    version,
    about = "Terminal PDF reader that translates selected text"
)]
struct Args {
    /// PDF file to upload on start-up
    file: Option<PathBuf>,

    /// Base URL of the upload/translate server
    #[arg(long = "server")]
    server: Option<String>,

    /// Language to translate into (server default when omitted)
    #[arg(long = "target-language")]
    target_language: Option<String>,

    /// Config file to use instead of the platform default
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long = "dump-config")]
    dump_config: bool,
}

struct RawModeGuard;

impl RawModeGuard {
    fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, EnableMouseCapture, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = crossterm::execute!(stdout, DisableMouseCapture, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let project_dirs = project_dirs()?;
    let _log_guard = init_logging(&project_dirs)?;
    info!(server = %config.server.base_url, "starting");

    let initial = args.file.as_deref().map(read_upload).transpose()?;

    let http = Arc::new(HttpBackend::new(&config)?);
    let provider = Arc::new(PdfiumProvider::new(http.clone())?);
    let services = Services {
        uploader: http.clone(),
        translator: http,
        provider,
    };
    let (runner, mut completions) = EffectRunner::new(services);

    let (columns, rows) = terminal::size()?;
    let mut app = App::new(runner, columns, rows);
    if let Some(file) = initial {
        app.dispatch(Command::Load(file));
    }

    let _raw = RawModeGuard::new()?;
    let mut renderer = TextRenderer::new(io::stdout());
    let mut dirty = true;

    loop {
        while let Ok(completion) = completions.try_recv() {
            app.on_completion(completion);
            dirty = true;
        }

        if dirty {
            redraw(&app, &mut renderer)?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(100))? {
            let ui_event = app.mapper.map_event(event::read()?);
            match app.handle_event(ui_event)? {
                LoopAction::Redraw => dirty = true,
                LoopAction::Continue => {}
                LoopAction::Quit => break,
            }
        }
    }

    {
        let mut writer = renderer.writer();
        crossterm::execute!(&mut writer, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    }
    info!("exiting");
    Ok(())
}

enum LoopAction {
    Continue,
    Redraw,
    Quit,
}

/// Everything the event loop mutates: the viewer state machine plus the
/// terminal-side pieces that present it.
struct App {
    viewer: Viewer,
    runner: EffectRunner,
    mapper: EventMapper,
    field: EditField,
    surface: PageSurface,
    backend: Option<(DocumentId, Arc<dyn DocumentBackend>)>,
    /// Document and page currently laid out on the surface.
    shown: Option<(DocumentId, usize)>,
    notice: Option<String>,
    columns: u16,
    rows: u16,
}

impl App {
    fn new(runner: EffectRunner, columns: u16, rows: u16) -> Self {
        let mut surface = PageSurface::new();
        surface.set_area(content_area(columns, rows));
        Self {
            viewer: Viewer::new(),
            runner,
            mapper: EventMapper::new(),
            field: EditField::new(),
            surface,
            backend: None,
            shown: None,
            notice: None,
            columns,
            rows,
        }
    }

    fn dispatch(&mut self, command: Command) {
        for effect in self.viewer.apply(command) {
            match self.runner.run(effect) {
                Some(Effect::ScrollToTop) => self.surface.scroll_to_top(),
                Some(Effect::SelectPageInput) => self.field.select_all(),
                Some(other) => warn!(?other, "effect not handled by the terminal"),
                None => {}
            }
        }
        self.sync_page();
        self.sync_mode();
    }

    fn on_completion(&mut self, completion: Completion) {
        let (command, opened) = completion.into_parts();
        self.dispatch(command);
        if let Some((document, backend)) = opened {
            let current = self
                .viewer
                .document()
                .filter(|doc| doc.page_count.is_some())
                .map(|doc| doc.id);
            if current == Some(document) {
                self.backend = Some((document, backend));
                self.sync_page();
            } else {
                debug!(%document, "dropping engine handle for a replaced document");
            }
        }
    }

    fn handle_event(&mut self, event: UiEvent) -> Result<LoopAction> {
        match event {
            UiEvent::Command(command) => self.dispatch(command),
            UiEvent::Edit(key) => {
                let Some(current) = self.viewer.editor().pending_input() else {
                    return Ok(LoopAction::Continue);
                };
                let value = self.field.apply(current, key);
                self.dispatch(Command::PageInputChanged { value });
            }
            UiEvent::PointerDown { column, row } => {
                if self.on_page_indicator(column, row) {
                    self.dispatch(Command::EditPage);
                } else {
                    self.surface.begin_selection(column, row);
                }
            }
            UiEvent::PointerDrag { column, row } => self.surface.extend_selection(column, row),
            UiEvent::PointerUp { column, row } => {
                self.surface.extend_selection(column, row);
                let within_content_area = self.surface.contains(column, row);
                let text = self.surface.selected_text();
                self.dispatch(Command::PointerReleased {
                    within_content_area,
                    text,
                });
            }
            UiEvent::Scroll { lines } => self.surface.scroll_by(lines),
            UiEvent::BeginOpen | UiEvent::OpenInputChanged { .. } | UiEvent::OpenCancel => {
                self.sync_mode()
            }
            UiEvent::OpenSubmit { path } => {
                self.sync_mode();
                match read_upload(Path::new(path.trim())) {
                    Ok(file) => {
                        self.notice = None;
                        self.dispatch(Command::Load(file));
                    }
                    Err(err) => {
                        warn!("failed to read upload: {err:#}");
                        self.notice = Some(format!("{err:#}"));
                    }
                }
            }
            UiEvent::Resize => {
                let (columns, rows) = terminal::size()?;
                self.resize(columns, rows);
            }
            UiEvent::Quit => return Ok(LoopAction::Quit),
            UiEvent::None => return Ok(LoopAction::Continue),
        }
        Ok(LoopAction::Redraw)
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        self.columns = columns;
        self.rows = rows;
        self.surface.set_area(content_area(columns, rows));
    }

    /// The indicator sits at the right end of the status row.
    fn on_page_indicator(&self, column: u16, row: u16) -> bool {
        if row != 0 || self.viewer.document().is_none() {
            return false;
        }
        let width = status_line(&self.viewer).right.chars().count();
        usize::from(column) >= usize::from(self.columns).saturating_sub(width)
    }

    /// Keeps the surface showing the viewer's current page of the opened
    /// document, and forgets engine handles for documents no longer current.
    fn sync_page(&mut self) {
        let current = self.viewer.document().map(|doc| doc.id);
        if self.backend.as_ref().map(|(id, _)| *id) != current {
            self.backend = None;
        }

        let page = self.viewer.current_page();
        let wanted = self.backend.as_ref().map(|(id, _)| (*id, page));
        if wanted == self.shown {
            return;
        }
        self.shown = wanted;

        let text = match &self.backend {
            Some((_, backend)) => backend
                .page_text(page.saturating_sub(1))
                .unwrap_or_else(|err| {
                    warn!(page, "failed to read page text: {err:#}");
                    format!("Could not read page {page}: {err:#}")
                }),
            None => String::new(),
        };
        self.surface.set_text(text);
    }

    fn sync_mode(&mut self) {
        if self.mapper.mode() == InputMode::Open {
            return;
        }
        let mode = if self.viewer.editor().is_editing() {
            InputMode::PageInput
        } else if self.viewer.overlay().is_some() {
            InputMode::Overlay
        } else {
            InputMode::Normal
        };
        self.mapper.set_mode(mode);
    }
}

fn redraw<W: Write>(app: &App, renderer: &mut TextRenderer<W>) -> Result<()> {
    renderer.begin_sync_update()?;
    renderer.clear_all()?;
    renderer.draw_status(0, app.columns, &status_line(&app.viewer))?;
    renderer.draw_page(&app.surface)?;
    if let Some(view) = app.viewer.overlay() {
        let area = overlay_rect(app.columns, app.rows);
        let lines = overlay_lines(&view, usize::from(area.width.saturating_sub(2)));
        renderer.draw_overlay(area, "Translation", &lines)?;
    }
    let footer = app
        .mapper
        .pending_input()
        .or_else(|| app.notice.clone())
        .unwrap_or_else(|| HINT.to_owned());
    renderer.draw_prompt(app.rows.saturating_sub(1), &footer)?;
    renderer.end_sync_update()
}

/// Rows between the status line and the footer.
fn content_area(columns: u16, rows: u16) -> Rect {
    Rect::new(0, 1, columns, rows.saturating_sub(2))
}

fn read_upload(path: &Path) -> Result<UploadFile> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("{:?} does not name a file", path))?;
    let bytes = fs::read(path).with_context(|| format!("failed to read {:?}", path))?;
    Ok(UploadFile::new(name, bytes))
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("org", "transpdf", "transpdf")
        .ok_or_else(|| anyhow!("unable to resolve platform directories"))
}

/// Config file, then command-line overrides.
fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => project_dirs()?.config_dir().join("config.toml"),
    };
    let mut config = Config::load(&path)?;
    if let Some(server) = &args.server {
        config.server.base_url = server.clone();
    }
    if let Some(language) = &args.target_language {
        config.translation.target_language = Some(language.clone());
    }
    Ok(config)
}

/// Logs go to a file only; the terminal is owned by the viewer.
fn init_logging(project_dirs: &ProjectDirs) -> Result<WorkerGuard> {
    let log_dir = project_dirs.data_local_dir().join("logs");
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, "transpdf.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}
