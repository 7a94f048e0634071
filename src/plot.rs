use crate::error::{LineageError, Result};
use crate::model::CommitCountAggregate;
use plotters::prelude::*;
use std::path::Path;
use tracing::debug;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;

fn plot_err(e: impl std::fmt::Display) -> LineageError {
    LineageError::Plot(e.to_string())
}

/// Renders a single vertical boxplot of commits per PR as PNG.
///
/// No text is drawn, so no font backend is needed.
pub fn render_boxplot(path: &Path, counts: &[CommitCountAggregate]) -> Result<()> {
    if counts.is_empty() {
        return Err(LineageError::Plot("no pull requests to plot".to_string()));
    }

    let values: Vec<f32> = counts.iter().map(|c| c.num_commits as f32).collect();
    let quartiles = Quartiles::new(&values);
    let top = values.iter().copied().fold(1.0f32, f32::max) * 1.1;

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(40)
        .build_cartesian_2d(0f32..2f32, 0f32..top)
        .map_err(plot_err)?;

    let grid = RGBColor(210, 210, 210);
    let step = (top / 10.0).ceil().max(1.0);
    let lines = (1..)
        .map(|i| i as f32 * step)
        .take_while(|y| *y < top)
        .map(|y| PathElement::new(vec![(0.0, y), (2.0, y)], grid));
    chart.draw_series(lines).map_err(plot_err)?;

    chart
        .draw_series(std::iter::once(
            Boxplot::new_vertical(1.0f32, &quartiles)
                .width(160)
                .whisker_width(0.5)
                .style(&BLUE),
        ))
        .map_err(plot_err)?;

    let median = quartiles.median() as f32;
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(0.85, median), (1.15, median)],
            RED.stroke_width(2),
        )))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    debug!(path = %path.display(), prs = counts.len(), "boxplot written");
    Ok(())
}
