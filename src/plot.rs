//! Interactive terminal plot of the three compartments against time.
//!
//! The chart is drawn on the terminal's alternate screen and redrawn on resize until the user
//! presses `q` or `Esc`. Everything that decides what the chart says (title, labels, bounds,
//! series) is computed by `PlotData`, which does not touch the terminal.

use crate::error::SirError;
use crate::parameters::Parameters;
use crate::trajectory::Trajectory;

pub const SUSCEPTIBLE_LABEL: &str = "S(t) - Susceptible";
pub const INFECTIOUS_LABEL: &str = "I(t) - Infectious";
pub const RECOVERED_LABEL: &str = "R(t) - Recovered";
pub const X_AXIS_TITLE: &str = "Time [days]";
pub const Y_AXIS_TITLE: &str = "Population ratio";

/// `SIR Model - R0: 2.3 (Beta: 0.16, Gamma: 0.07)`. Values are rounded to two decimals, with
/// trailing zeros dropped.
#[must_use]
pub fn title(parameters: &Parameters) -> String {
    format!(
        "SIR Model - R0: {} (Beta: {}, Gamma: {})",
        round2(parameters.r0()),
        round2(parameters.beta),
        round2(parameters.gamma)
    )
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The series and axes of one chart, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub title: String,
    pub susceptible: Vec<(f64, f64)>,
    pub infectious: Vec<(f64, f64)>,
    pub recovered: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl PlotData {
    #[must_use]
    pub fn new(parameters: &Parameters, trajectory: &Trajectory) -> Self {
        let mut susceptible = Vec::with_capacity(trajectory.len());
        let mut infectious = Vec::with_capacity(trajectory.len());
        let mut recovered = Vec::with_capacity(trajectory.len());
        for (t, state) in trajectory.iter() {
            susceptible.push((t, state.s));
            infectious.push((t, state.i));
            recovered.push((t, state.r));
        }
        PlotData {
            title: title(parameters),
            susceptible,
            infectious,
            recovered,
            x_bounds: [0.0, parameters.horizon()],
            y_bounds: [0.0, 1.0],
        }
    }

    /// Tick labels for the time axis: start, middle and end of the horizon.
    #[must_use]
    pub fn x_labels(&self) -> Vec<String> {
        let [start, end] = self.x_bounds;
        [start, (start + end) / 2.0, end]
            .iter()
            .map(|value| format!("{value:.0}"))
            .collect()
    }

    #[must_use]
    pub fn y_labels(&self) -> Vec<String> {
        ["0.0", "0.5", "1.0"].iter().map(ToString::to_string).collect()
    }
}

#[cfg(feature = "plot")]
mod terminal {
    use super::{
        PlotData, SirError, INFECTIOUS_LABEL, RECOVERED_LABEL, SUSCEPTIBLE_LABEL, X_AXIS_TITLE,
        Y_AXIS_TITLE,
    };
    use crate::log::trace;
    use crossterm::event::{self, Event, KeyCode, KeyEventKind};
    use crossterm::{execute, terminal};
    use ratatui::backend::CrosstermBackend;
    use ratatui::layout::Constraint;
    use ratatui::style::{Color, Style};
    use ratatui::symbols::Marker;
    use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, LegendPosition};
    use ratatui::{Frame, Terminal};
    use std::io;
    use std::time::Duration;

    fn restore_terminal() -> io::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(io::stdout(), terminal::LeaveAlternateScreen)?;
        Ok(())
    }

    fn draw(frame: &mut Frame, data: &PlotData) {
        let series = [
            (SUSCEPTIBLE_LABEL, Color::Blue, &data.susceptible),
            (INFECTIOUS_LABEL, Color::Red, &data.infectious),
            (RECOVERED_LABEL, Color::Green, &data.recovered),
        ];
        let datasets = series
            .into_iter()
            .map(|(name, color, points)| {
                Dataset::default()
                    .name(name)
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(color))
                    .data(points)
            })
            .collect::<Vec<_>>();

        let chart = Chart::new(datasets)
            .block(Block::bordered().title(format!(" {} ", data.title)))
            .x_axis(
                Axis::default()
                    .title(X_AXIS_TITLE)
                    .bounds(data.x_bounds)
                    .labels(data.x_labels()),
            )
            .y_axis(
                Axis::default()
                    .title(Y_AXIS_TITLE)
                    .bounds(data.y_bounds)
                    .labels(data.y_labels()),
            )
            .legend_position(Some(LegendPosition::TopRight))
            .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));
        frame.render_widget(chart, frame.area());
    }

    /// Shows the chart and blocks until the user quits with `q` or `Esc`.
    pub fn show(data: &PlotData) -> Result<(), SirError> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;

        // Ensure terminal is restored on panic
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = restore_terminal();
            default_hook(panic_info);
        }));

        let result = event_loop(&mut terminal, data);
        restore_terminal()?;
        let _ = std::panic::take_hook();
        result
    }

    fn event_loop(
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        data: &PlotData,
    ) -> Result<(), SirError> {
        loop {
            terminal.draw(|frame| draw(frame, data))?;
            if !event::poll(Duration::from_millis(250))? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                {
                    trace!("plot closed");
                    return Ok(());
                }
            }
        }
    }
}

/// Shows the trajectory in an interactive terminal chart and blocks until it is closed.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up or drawn to.
#[cfg(feature = "plot")]
pub fn show(parameters: &Parameters, trajectory: &Trajectory) -> Result<(), SirError> {
    terminal::show(&PlotData::new(parameters, trajectory))
}

/// Without the `plot` feature there is no terminal UI; the caller is told so.
///
/// # Errors
///
/// Always returns an error.
#[cfg(not(feature = "plot"))]
pub fn show(_parameters: &Parameters, _trajectory: &Trajectory) -> Result<(), SirError> {
    Err(SirError::SirError(
        "built without the `plot` feature; rerun with --no-plot".to_string(),
    ))
}
