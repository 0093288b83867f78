use plotters::{
    backend::{PixelFormat, RGBPixel},
    coord::Shift,
    prelude::*,
};

use crate::{density::DensitySeries, fitness::FitnessCurve, stats::Summary};

const GRAPH_WIDTH: u32 = 800;
const GRAPH_HEIGHT: u32 = 600;

const MAX_GENERATION: f64 = 1000.0;
const MARK_EVERY: usize = 3;
const BAR_COLOR: RGBColor = RGBColor(128, 128, 128);

type DrawingArea<'a> = plotters::drawing::DrawingArea<BitMapBackend<'a, RGBPixel>, Shift>;

fn graph_image(configure: impl FnOnce(&DrawingArea) -> eyre::Result<()>) -> eyre::Result<Vec<u8>> {
    let mut buf = vec![0; GRAPH_WIDTH as usize * GRAPH_HEIGHT as usize * RGBPixel::PIXEL_SIZE];
    let root =
        BitMapBackend::<RGBPixel>::with_buffer_and_format(&mut buf, (GRAPH_WIDTH, GRAPH_HEIGHT))?
            .into_drawing_area();
    root.fill(&WHITE)?;

    configure(&root)?;

    root.present()?;
    drop(root);

    use image::codecs::png::*;
    use image::ImageEncoder;
    let mut encoded_buf = Vec::with_capacity(64 * 1024);
    let encoder = PngEncoder::new_with_quality(
        &mut encoded_buf,
        CompressionType::Best,
        FilterType::NoFilter,
    );
    encoder.write_image(&buf, GRAPH_WIDTH, GRAPH_HEIGHT, image::ColorType::Rgb8)?;

    Ok(encoded_buf)
}

fn minmax_iter<T: PartialOrd + Copy>(iter: impl IntoIterator<Item = T>) -> Option<(T, T)> {
    let mut iter = iter.into_iter();
    let mut min = iter.next()?;
    let mut max = min;
    for value in iter {
        if value < min {
            min = value;
        }
        if value > max {
            max = value;
        }
    }
    Some((min, max))
}

/// Maps a matplotlib legend location code onto a plotters position. `best`
/// (0) has no counterpart and falls back to the upper right corner.
pub fn legend_position(code: u8) -> SeriesLabelPosition {
    match code {
        2 => SeriesLabelPosition::UpperLeft,
        3 => SeriesLabelPosition::LowerLeft,
        4 => SeriesLabelPosition::LowerRight,
        5 | 7 => SeriesLabelPosition::MiddleRight,
        6 => SeriesLabelPosition::MiddleLeft,
        8 => SeriesLabelPosition::LowerMiddle,
        9 => SeriesLabelPosition::UpperMiddle,
        10 => SeriesLabelPosition::MiddleMiddle,
        _ => SeriesLabelPosition::UpperRight,
    }
}

/// Mean best fitness per condition against evaluations on a log axis, with
/// the 95% confidence interval as a shaded band.
pub fn fitness_graph(curves: &[FitnessCurve]) -> eyre::Result<Vec<u8>> {
    let evaluations = curves
        .iter()
        .flat_map(|curve| curve.points.iter().map(|point| point.evaluations as f64));
    let (min, mut max) = minmax_iter(evaluations).unwrap_or((1000.0, 10_000_000.0));
    if max <= min {
        max = min * 10.0;
    }

    graph_image(|root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Best fitness", ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((min..max).log_scale(), 0.0..1.0)?;

        chart
            .configure_mesh()
            .x_desc("Evaluations")
            .y_desc("Fitness")
            .draw()?;

        for (idx, curve) in curves.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            let mean: Vec<(f64, f64)> = curve
                .points
                .iter()
                .map(|point| (point.evaluations as f64, point.fitness.mean))
                .collect();

            let band: Vec<(f64, f64)> = curve
                .points
                .iter()
                .map(|point| (point.evaluations as f64, point.fitness.upper().min(1.0)))
                .chain(
                    curve
                        .points
                        .iter()
                        .rev()
                        .map(|point| (point.evaluations as f64, point.fitness.lower().max(0.0))),
                )
                .collect();
            chart.draw_series(std::iter::once(Polygon::new(band, color.mix(0.15).filled())))?;

            chart
                .draw_series(LineSeries::new(mean.iter().copied(), color.stroke_width(2)))?
                .label(&curve.label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

            match idx % 3 {
                0 => chart.draw_series(mean.iter().map(|&p| Circle::new(p, 3, color.filled())))?,
                1 => chart
                    .draw_series(mean.iter().map(|&p| TriangleMarker::new(p, 4, color.filled())))?,
                _ => chart.draw_series(mean.iter().map(|&p| Cross::new(p, 3, color)))?,
            };
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        Ok(())
    })
}

/// Mean convergence evaluations per condition as bars with 95% error bars.
pub fn convergence_graph(labels: &[&str], summaries: &[Summary]) -> eyre::Result<Vec<u8>> {
    let top = summaries
        .iter()
        .map(Summary::upper)
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;

    graph_image(|root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Evaluations to converge", ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d((0..summaries.len() as u32).into_segmented(), 0.0..top)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc("Evaluations")
            .x_label_formatter(&|value| match value {
                SegmentValue::CenterOf(idx) => labels
                    .get(*idx as usize)
                    .map(|label| label.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOR.filled())
                .margin(20)
                .data(
                    summaries
                        .iter()
                        .enumerate()
                        .map(|(idx, summary)| (idx as u32, summary.mean)),
                ),
        )?;

        chart.draw_series(summaries.iter().enumerate().map(|(idx, summary)| {
            ErrorBar::new_vertical(
                SegmentValue::CenterOf(idx as u32),
                summary.lower().max(0.0),
                summary.mean,
                summary.upper(),
                BLACK.stroke_width(2),
                12,
            )
        }))?;

        Ok(())
    })
}

/// Draws the same marker on the plot and in the legend. The marker
/// expression is expanded twice so it is typed once for data coordinates and
/// once for legend pixel coordinates.
macro_rules! marker_series {
    ($chart:expr, $points:expr, $label:expr, |$coord:ident| $marker:expr) => {
        $chart
            .draw_series($points.iter().map(|&$coord| $marker))?
            .label($label)
            .legend(|$coord| $marker)
    };
}

/// Average tag density per level over generations, one marker per level.
pub fn density_graph(
    series: &[DensitySeries],
    legend: SeriesLabelPosition,
) -> eyre::Result<Vec<u8>> {
    graph_image(|root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Tag density", ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..MAX_GENERATION, 0.0..1.0)?;

        chart
            .configure_mesh()
            .x_desc("Generation")
            .y_desc("Density")
            .draw()?;

        for level in series {
            let points: Vec<(f64, f64)> = level
                .points
                .iter()
                .step_by(MARK_EVERY)
                .map(|point| (point.generation as f64, point.density))
                .filter(|&(generation, density)| {
                    generation <= MAX_GENERATION && (0.0..=1.0).contains(&density)
                })
                .collect();
            let label = level.label();

            match level.level {
                0 => marker_series!(chart, points, label, |c| Circle::new(c, 4, BLACK.filled())),
                1 => marker_series!(chart, points, label, |c| EmptyElement::at(c)
                    + Rectangle::new([(-4, -4), (4, 4)], BLACK.filled())),
                2 => marker_series!(chart, points, label, |c| TriangleMarker::new(
                    c,
                    5,
                    BLACK.filled()
                )),
                3 => marker_series!(chart, points, label, |c| Cross::new(c, 4, BLACK.stroke_width(2))),
                _ => marker_series!(chart, points, label, |c| Circle::new(c, 4, BLACK)),
            };
        }

        chart
            .configure_series_labels()
            .position(legend)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        Ok(())
    })
}
