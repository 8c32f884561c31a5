use std::io::IsTerminal;
use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use distwrap_installer::DownloadProgress;
use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use url::Url;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Quiet,
    Plain,
    Rich,
}

pub(crate) fn resolve_output_style(quiet: bool, is_terminal: bool) -> OutputStyle {
    match (quiet, is_terminal) {
        (true, _) => OutputStyle::Quiet,
        (false, true) => OutputStyle::Rich,
        (false, false) => OutputStyle::Plain,
    }
}

pub(crate) fn current_output_style(quiet: bool) -> OutputStyle {
    resolve_output_style(quiet, std::io::stdout().is_terminal())
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

impl TerminalRenderer {
    pub(crate) fn new(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn style(self) -> OutputStyle {
        self.style
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        if let Some(line) = render_status_line(self.style, status, message) {
            println!("{line}");
        }
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }

    /// A progress sink that draws only when the style allows it.
    pub(crate) fn download_progress(self) -> Box<dyn DownloadProgress> {
        Box::new(TerminalProgress::new(self.style == OutputStyle::Rich))
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> Option<String> {
    match style {
        OutputStyle::Quiet => None,
        OutputStyle::Plain => Some(format!("{status}: {message}")),
        OutputStyle::Rich => Some(format!(
            "{} {message}",
            colorize(status_style(status), &format!("{status:>10}"))
        )),
    }
}

struct TerminalProgress {
    progress_bar: ProgressBar,
    started_at: Instant,
}

impl TerminalProgress {
    fn new(visible: bool) -> Self {
        let progress_bar = ProgressBar::no_length();
        if !visible {
            progress_bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self {
            progress_bar,
            started_at: Instant::now(),
        }
    }
}

impl DownloadProgress for TerminalProgress {
    fn started(&self, url: &Url, total_bytes: Option<u64>) {
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("distribution")
            .to_string();
        let template = match total_bytes {
            Some(total) => {
                self.progress_bar.set_length(total);
                "{spinner:.cyan.bold} {msg} [{bar:24.cyan/blue}] {bytes}/{total_bytes} {eta}"
            }
            None => "{spinner:.cyan.bold} {msg} {bytes} {elapsed}",
        };
        if let Ok(style) = ProgressStyle::with_template(template) {
            self.progress_bar.set_style(style.progress_chars("=>-"));
        }
        self.progress_bar.set_message(file_name);
        self.progress_bar
            .enable_steady_tick(Duration::from_millis(80));
    }

    fn advanced(&self, bytes: u64) {
        self.progress_bar.inc(bytes);
    }

    fn finished(&self) {
        let downloaded = self.progress_bar.position();
        self.progress_bar.finish_and_clear();
        if !self.progress_bar.is_hidden() {
            println!(
                "{} [{}] in {}",
                colorize(progress_label_style(), "downloaded"),
                HumanBytes(downloaded),
                format_elapsed(self.started_at.elapsed())
            );
        }
    }
}

pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{secs}.{millis:03}s")
}

fn status_style(status: &str) -> Style {
    let color = match status {
        "error" | "failed" => AnsiColor::BrightRed,
        "warning" => AnsiColor::BrightYellow,
        _ => AnsiColor::BrightGreen,
    };
    Style::new()
        .fg_color(Some(color.into()))
        .effects(Effects::BOLD)
}

fn progress_label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
