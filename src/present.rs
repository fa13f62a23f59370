//! Output sinks for reconciled snapshots

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use hostscope_tui::{DashboardScreen, DashboardView, Tui};
use hostscope_types::{DisplayLimits, ReconciledSnapshot};

/// Receives one snapshot per refresh cycle
pub trait Presenter {
    fn present(&mut self, snapshot: &ReconciledSnapshot) -> Result<()>;

    /// Called once after the last cycle
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn present(&mut self, snapshot: &ReconciledSnapshot) -> Result<()> {
        (**self).present(snapshot)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Static parts of the dashboard view shared by the text presenters
#[derive(Clone, Debug)]
pub struct ViewConfig {
    pub limits: DisplayLimits,
    pub quit_token: String,
    pub interval: Duration,
}

impl ViewConfig {
    fn view_at(&self, updated_at: DateTime<Local>) -> DashboardView {
        DashboardView {
            limits: self.limits.clone(),
            quit_token: self.quit_token.clone(),
            interval: self.interval,
            updated_at,
        }
    }
}

/// Full-screen dashboard redrawn on every cycle
pub struct TuiPresenter {
    tui: Tui,
    config: ViewConfig,
}

impl TuiPresenter {
    pub fn new(config: ViewConfig) -> Result<Self> {
        let tui = Tui::new().context("Failed to initialize terminal")?;
        Ok(Self { tui, config })
    }
}

impl Presenter for TuiPresenter {
    fn present(&mut self, snapshot: &ReconciledSnapshot) -> Result<()> {
        let view = self.config.view_at(Local::now());
        self.tui
            .terminal()
            .draw(|frame| DashboardScreen::render(frame, snapshot, &view))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.tui.restore()?;
        Ok(())
    }
}

/// Prints the dashboard as plain text, one block per cycle
pub struct PlainPresenter<W: Write> {
    out: W,
    config: ViewConfig,
}

impl<W: Write> PlainPresenter<W> {
    pub fn new(out: W, config: ViewConfig) -> Self {
        Self { out, config }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for PlainPresenter<W> {
    fn present(&mut self, snapshot: &ReconciledSnapshot) -> Result<()> {
        let view = self.config.view_at(Local::now());
        let text = DashboardScreen::plain_text(snapshot, &view);
        writeln!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    updated_at: DateTime<Local>,
    #[serde(flatten)]
    snapshot: &'a ReconciledSnapshot,
}

/// Writes one JSON object per cycle, newline delimited
pub struct JsonPresenter<W: Write> {
    out: W,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn present(&mut self, snapshot: &ReconciledSnapshot) -> Result<()> {
        let record = JsonRecord {
            updated_at: Local::now(),
            snapshot,
        };
        serde_json::to_writer(&mut self.out, &record).context("Failed to encode snapshot")?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
