//! Interactive terminal front end.
//!
//! Reads commands from stdin, drives the viewport and selection, and feeds
//! zoom notifications and finished reads into the preview controller.

use crate::catalog::{RasterCatalog, RasterReference};
use crate::config::ViewerConfig;
use crate::controller::PreviewController;
use crate::error::PreviewResult;
use crate::source::CogSource;
use crate::viewport::MapViewport;
use std::fmt::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::*;

const ZOOM_STEP: f64 = 1.0;

const HELP: &str = "\
Commands:
  list                 show the raster catalog
  select <n|none>      select raster n from the list, 0 or none to deselect
  zoom <z>             set the zoom level
  in | out             zoom in or out by one level
  pan <dlon> <dlat>    move the map center by degrees
  status               show zoom, selection and preview state
  save <path>          write the current preview as an image
  help                 show this message
  quit                 exit";

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    List,
    /// One based catalog index, None deselects
    Select(Option<usize>),
    Zoom(f64),
    ZoomIn,
    ZoomOut,
    Pan(f64, f64),
    Status,
    Save(PathBuf),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err("empty command, try `help`".into());
        };
        let args: Vec<&str> = words.collect();

        let number = |word: &str| {
            word.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or(format!("`{word}` is not a number"))
        };

        match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("list" | "ls", []) => Ok(Command::List),
            ("select", ["none"]) => Ok(Command::Select(None)),
            ("select", [index]) => match index.parse::<usize>() {
                Ok(0) => Ok(Command::Select(None)),
                Ok(n) => Ok(Command::Select(Some(n))),
                Err(_) => Err(format!("`{index}` is not a catalog entry")),
            },
            ("zoom", [zoom]) => Ok(Command::Zoom(number(zoom)?)),
            ("in" | "+", []) => Ok(Command::ZoomIn),
            ("out" | "-", []) => Ok(Command::ZoomOut),
            ("pan", [dlon, dlat]) => Ok(Command::Pan(number(dlon)?, number(dlat)?)),
            ("status", []) => Ok(Command::Status),
            ("save", [path]) => Ok(Command::Save(PathBuf::from(path))),
            ("help" | "?", []) => Ok(Command::Help),
            ("quit" | "exit" | "q", []) => Ok(Command::Quit),
            (name, _) => Err(format!("cannot parse `{name}` command, try `help`")),
        }
    }
}

pub fn format_zoom(zoom: f64) -> String {
    format!("Current zoom: {zoom:.1}")
}

/// Numbered catalog with `0` as the "none selected" entry, `*` marks the selection
pub fn format_catalog(rasters: &[RasterReference], selected: Option<&RasterReference>) -> String {
    let marker = |is_selected: bool| if is_selected { '*' } else { ' ' };
    let mut text = format!("{} 0) none selected", marker(selected.is_none()));
    for (i, reference) in rasters.iter().enumerate() {
        let _ = write!(
            text,
            "\n{} {}) {}",
            marker(selected == Some(reference)),
            i + 1,
            reference.label()
        );
    }
    text
}

pub fn format_status(controller: &PreviewController, viewport: &MapViewport) -> String {
    let state = controller.state();
    let selected = state.selected().map_or("none", |r| r.label());
    format!(
        "{}\nView: {viewport}\nSelected: {selected}\nUsed overview: {}\nStatus: {} ({} in flight)\nPreview: {}",
        format_zoom(viewport.zoom()),
        state.used_overview(),
        controller.status(),
        controller.in_flight(),
        state.preview()
    )
}

pub struct Shell {
    rasters: Vec<RasterReference>,
    viewport: MapViewport,
    controller: PreviewController,
}

impl Shell {
    pub fn new(
        rasters: Vec<RasterReference>,
        viewport: MapViewport,
        controller: PreviewController,
    ) -> Self {
        let mut shell = Self {
            rasters,
            viewport,
            controller,
        };
        shell.controller.set_zoom_level(shell.viewport.zoom());
        shell
    }

    pub fn viewport(&self) -> &MapViewport {
        &self.viewport
    }

    pub fn controller(&self) -> &PreviewController {
        &self.controller
    }

    /// Run one command, returns false when the shell should exit.
    pub fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::List => println!(
                "{}",
                format_catalog(&self.rasters, self.controller.state().selected())
            ),
            Command::Select(None) => {
                self.controller.select_raster(None);
                self.controller.evaluate_refresh();
                println!("No raster selected");
            }
            Command::Select(Some(n)) => {
                let entry = n.checked_sub(1).and_then(|i| self.rasters.get(i)).cloned();
                match entry {
                    Some(reference) => {
                        println!("Selected {}", reference.label());
                        self.controller.select_raster(Some(reference));
                        self.controller.evaluate_refresh();
                    }
                    None => println!("No catalog entry {n}, try `list`"),
                }
            }
            Command::Zoom(zoom) => {
                self.viewport.zoom_to(zoom);
            }
            Command::ZoomIn => {
                self.viewport.zoom_by(ZOOM_STEP);
            }
            Command::ZoomOut => {
                self.viewport.zoom_by(-ZOOM_STEP);
            }
            Command::Pan(dlon, dlat) => {
                self.viewport.pan_by(dlon, dlat);
                println!("View: {}", self.viewport);
            }
            Command::Status => println!("{}", format_status(&self.controller, &self.viewport)),
            Command::Save(path) => match self.controller.state().preview().save(&path) {
                Ok(()) => println!("Saved preview to {}", path.display()),
                Err(e) => println!("Failed to save preview: {e}"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
        }
        true
    }

    /// Forward a zoom notification from the viewport.
    pub fn on_zoom(&mut self, zoom: f64) {
        self.controller.set_zoom_level(zoom);
        println!("{}", format_zoom(zoom));
        self.controller.evaluate_refresh();
    }
}

/// Run the viewer until stdin closes or `quit`.
pub async fn run(config: ViewerConfig) -> PreviewResult<()> {
    let ViewerConfig {
        catalog,
        view,
        style,
        policy,
        source,
    } = config;

    let viewport = MapViewport::new(view, style);
    let mut zoom_rx = viewport.subscribe_zoom();
    let controller = PreviewController::new(Arc::new(CogSource::new(source)), policy);
    let mut shell = Shell::new(catalog.list_rasters(), viewport, controller);
    info!("Viewer ready, {:?} refresh policy", policy);

    println!("{}", format_catalog(&shell.rasters, None));
    println!("{}", format_zoom(shell.viewport.zoom()));
    println!("Type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if !shell.execute(command) {
                            break;
                        }
                    }
                    Err(message) => println!("{message}"),
                }
            }
            changed = zoom_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let zoom = *zoom_rx.borrow_and_update();
                shell.on_zoom(zoom);
            }
            Some(completion) = shell.controller.next_completion() => {
                let request = completion.request;
                if shell.controller.apply_completion(completion) {
                    println!(
                        "Preview updated by request {request}: {}",
                        shell.controller.state().preview()
                    );
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::controller::{RefreshPolicy, RefreshStatus};

    #[test]
    fn parses_commands() {
        assert_eq!("list".parse::<Command>(), Ok(Command::List));
        assert_eq!("select 2".parse::<Command>(), Ok(Command::Select(Some(2))));
        assert_eq!("select 0".parse::<Command>(), Ok(Command::Select(None)));
        assert_eq!("select none".parse::<Command>(), Ok(Command::Select(None)));
        assert_eq!("zoom 12.5".parse::<Command>(), Ok(Command::Zoom(12.5)));
        assert_eq!(" IN ".parse::<Command>(), Ok(Command::ZoomIn));
        assert_eq!("out".parse::<Command>(), Ok(Command::ZoomOut));
        assert_eq!("pan -1.5 0.25".parse::<Command>(), Ok(Command::Pan(-1.5, 0.25)));
        assert_eq!("status".parse::<Command>(), Ok(Command::Status));
        assert_eq!(
            "save preview.png".parse::<Command>(),
            Ok(Command::Save(PathBuf::from("preview.png")))
        );
        assert_eq!("quit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_commands() {
        assert!("".parse::<Command>().is_err());
        assert!("select two".parse::<Command>().is_err());
        assert!("zoom".parse::<Command>().is_err());
        assert!("zoom NaN".parse::<Command>().is_err());
        assert!("pan 1".parse::<Command>().is_err());
        assert!("fly 3".parse::<Command>().is_err());
    }

    #[test]
    fn formats_zoom_to_one_decimal() {
        assert_eq!(format_zoom(6.0), "Current zoom: 6.0");
        assert_eq!(format_zoom(11.96), "Current zoom: 12.0");
        assert_eq!(format_zoom(14.23), "Current zoom: 14.2");
    }

    #[test]
    fn formats_catalog() {
        let rasters = StaticCatalog::default().list_rasters();
        assert_eq!(
            format_catalog(&rasters, Some(&rasters[1])),
            "  0) none selected\n  1) cog_1_4cm_50.tif\n* 2) cog_1_4cm_60.tif\n  3) cog_1_4cm_75.tif"
        );
        assert!(format_catalog(&rasters, None).starts_with("* 0) none selected"));
    }

    #[tokio::test]
    async fn select_and_zoom_drive_the_controller() {
        let path = std::env::temp_dir().join(format!("cogview-shell-{}.tif", std::process::id()));
        let reference = RasterReference::new(path.to_string_lossy());
        let controller = PreviewController::new(
            Arc::new(CogSource::default()),
            RefreshPolicy::Corrected,
        );
        let mut shell = Shell::new(vec![reference.clone()], MapViewport::default(), controller);
        let mut zoom_rx = shell.viewport().subscribe_zoom();

        assert!(shell.execute(Command::Select(Some(5))));
        assert_eq!(shell.controller().state().selected(), None);

        // The file does not exist, so the read fails and is reported
        assert!(shell.execute(Command::Select(Some(1))));
        assert_eq!(shell.controller().state().selected(), Some(&reference));
        assert_eq!(shell.controller().in_flight(), 1);
        shell.controller.process_next().await;
        assert!(matches!(
            shell.controller().status(),
            RefreshStatus::Failed(_)
        ));

        assert!(shell.execute(Command::ZoomIn));
        assert!(zoom_rx.has_changed().unwrap());
        let zoom = *zoom_rx.borrow_and_update();
        assert_eq!(zoom, 7.0);
        shell.on_zoom(zoom);
        assert_eq!(shell.controller().state().zoom(), 7.0);

        assert!(shell.execute(Command::Select(None)));
        assert_eq!(shell.controller().state().selected(), None);
        assert!(!shell.execute(Command::Quit));
    }
}
