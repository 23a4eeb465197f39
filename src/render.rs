// CoSi-Eval: Validation and Comparison of Gossip-Based Signature Aggregation Simulations
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Rendering of plot outputs to plotly HTML figures, with the raw points stored next to them.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use ordered_float::OrderedFloat;
use plotly::{
    common::{ErrorData, ErrorType, Marker, Mode, Title},
    layout::{Axis, BoxMode, Legend, RangeMode},
    BoxPlot, Layout, Plot, Scatter,
};
use statrs::statistics::Statistics;

use crate::{
    scenarios::{PlotOutput, PlotStyle, Point},
    util::PathBufExt,
};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}

/// Consumer of the plot outputs of all scenarios.
pub trait Renderer {
    fn render(&self, output: &PlotOutput) -> Result<(), RenderError>;

    /// Remove whatever `render` persisted for `output`. Called when a scenario fails while
    /// rendering.
    fn discard(&self, _output: &PlotOutput) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Mean and standard deviation of the y values for each distinct x value, sorted by x.
pub fn mean_by_x(points: &[&Point]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut groups: BTreeMap<OrderedFloat<f64>, Vec<f64>> = BTreeMap::new();
    for p in points {
        groups.entry(OrderedFloat(p.x)).or_default().push(p.y);
    }

    let mut xs = Vec::with_capacity(groups.len());
    let mut means = Vec::with_capacity(groups.len());
    let mut errors = Vec::with_capacity(groups.len());
    for (x, ys) in groups {
        xs.push(x.into_inner());
        means.push(ys.iter().mean());
        errors.push(if ys.len() > 1 { ys.iter().std_dev() } else { 0.0 });
    }
    (xs, means, errors)
}

/// Writes `{root}/{scenario}/{name}.html` and `{root}/{scenario}/{name}.csv`.
#[derive(Debug, Clone)]
pub struct PlotlyRenderer {
    root: PathBuf,
}

impl PlotlyRenderer {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn output_dir(&self, scenario: u8) -> PathBuf {
        self.root.as_path().then(scenario.to_string())
    }

    /// Paths of the data sidecar and the figure of an output.
    fn paths(&self, output: &PlotOutput) -> [PathBuf; 2] {
        let dir = self.output_dir(output.scenario);
        [
            dir.as_path().then(format!("{}.csv", output.name)),
            dir.then(format!("{}.html", output.name)),
        ]
    }

    /// Build the figure for an output.
    pub fn plot(output: &PlotOutput) -> Plot {
        let mut plot = Plot::new();

        for (label, points) in output.series() {
            let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
            let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
            let name = label.unwrap_or(&output.y_label);
            let show_legend = label.is_some();

            match output.style {
                PlotStyle::Line => {
                    let (xs, means, errors) = mean_by_x(&points);
                    plot.add_trace(
                        Scatter::new(xs, means)
                            .name(name)
                            .show_legend(show_legend)
                            .mode(Mode::LinesMarkers)
                            .error_y(ErrorData::new(ErrorType::Data).array(errors)),
                    );
                }
                PlotStyle::Scatter => plot.add_trace(
                    Scatter::new(xs, ys)
                        .name(name)
                        .show_legend(show_legend)
                        .mode(Mode::Markers),
                ),
                PlotStyle::Strip => plot.add_trace(
                    Scatter::new(xs, ys)
                        .name(name)
                        .show_legend(show_legend)
                        .mode(Mode::Markers)
                        .marker(Marker::new().size(5)),
                ),
                PlotStyle::Box => plot.add_trace(
                    BoxPlot::<f64, f64>::new_xy(xs, ys)
                        .name(name)
                        .show_legend(show_legend),
                ),
            }
        }

        let x_axis = Axis::new().title(Title::from(output.x_label.as_str()));
        let x_axis = if output.x_from_zero {
            x_axis.range_mode(RangeMode::ToZero)
        } else {
            x_axis
        };
        let y_axis = Axis::new().title(Title::from(output.y_label.as_str()));
        let y_axis = match output.y_max {
            Some(y_max) => y_axis.range(vec![0.0, y_max]),
            None => y_axis.range_mode(RangeMode::ToZero),
        };

        let title = output.title.replace('\n', "<br>");
        let mut layout = Layout::new()
            .title(Title::from(title.as_str()))
            .x_axis(x_axis)
            .y_axis(y_axis);
        if let Some(legend_title) = &output.legend_title {
            layout = layout.legend(Legend::new().title(Title::from(legend_title.as_str())));
        }
        if output.style == PlotStyle::Box {
            layout = layout.box_mode(BoxMode::Group);
        }
        plot.set_layout(layout);

        plot
    }

    /// Store the points of the output as `x,y,series`.
    fn write_data(path: &Path, output: &PlotOutput) -> Result<(), RenderError> {
        let mut writer = csv::Writer::from_path(path)?;
        for point in output.points.iter() {
            writer.serialize(point)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Renderer for PlotlyRenderer {
    fn render(&self, output: &PlotOutput) -> Result<(), RenderError> {
        let dir = self.output_dir(output.scenario);
        fs::create_dir_all(&dir)?;

        let [data_path, plot_path] = self.paths(output);
        Self::write_data(&data_path, output)?;

        log::debug!("Plotting {plot_path:?}");
        Self::plot(output).write_html(plot_path);
        Ok(())
    }

    fn discard(&self, output: &PlotOutput) -> Result<(), RenderError> {
        for path in self.paths(output) {
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("Removed {path:?}"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::env;

    use super::*;
    use crate::test::check_close;

    fn point(x: f64, y: f64) -> Point {
        Point {
            x,
            y,
            series: Some("0".to_string()),
        }
    }

    fn output(style: PlotStyle, points: Vec<Point>) -> PlotOutput {
        PlotOutput {
            scenario: 2,
            name: "round_wall_sum_by_delay".to_string(),
            title: "Mean protocol duration vs. message delay (n=10)".to_string(),
            x_label: "message delay (sec)".to_string(),
            y_label: "time until signature (sec)".to_string(),
            legend_title: Some("failing nodes".to_string()),
            style,
            x_from_zero: true,
            y_max: None,
            points,
        }
    }

    #[test]
    fn line_aggregates_per_x() {
        let points = [point(0.2, 3.0), point(0.1, 1.0), point(0.1, 3.0), point(0.2, 5.0)];
        let refs: Vec<&Point> = points.iter().collect();
        let (xs, means, errors) = mean_by_x(&refs);
        assert_eq!(xs, vec![0.1, 0.2]);
        check_close(2.0, means[0]);
        check_close(4.0, means[1]);
        check_close(2f64.sqrt(), errors[0]);

        let (_, _, errors) = mean_by_x(&refs[..1]);
        assert_eq!(errors, vec![0.0]);
    }

    #[test]
    fn writes_figure_and_data() {
        let root = env::temp_dir().then(format!("cosi-eval-render-{}", std::process::id()));
        let renderer = PlotlyRenderer::new(&root);

        for style in [PlotStyle::Line, PlotStyle::Box] {
            renderer
                .render(&output(style, vec![point(0.1, 1.0), point(0.2, 2.0)]))
                .unwrap();
        }

        let dir = renderer.output_dir(2);
        assert!(dir.as_path().then("round_wall_sum_by_delay.html").exists());
        let data = fs::read_to_string(dir.then("round_wall_sum_by_delay.csv")).unwrap();
        assert_eq!(data, "x,y,series\n0.1,1.0,0\n0.2,2.0,0\n");

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn discard_removes_figure_and_data() {
        let root = env::temp_dir().then(format!("cosi-eval-discard-{}", std::process::id()));
        let renderer = PlotlyRenderer::new(&root);
        let output = output(PlotStyle::Scatter, vec![point(0.1, 1.0)]);

        renderer.render(&output).unwrap();
        let dir = renderer.output_dir(2);
        assert!(dir.as_path().then("round_wall_sum_by_delay.csv").exists());

        renderer.discard(&output).unwrap();
        assert!(!dir.as_path().then("round_wall_sum_by_delay.csv").exists());
        assert!(!dir.as_path().then("round_wall_sum_by_delay.html").exists());
        // nothing left to remove
        renderer.discard(&output).unwrap();

        fs::remove_dir_all(root).unwrap();
    }
}
