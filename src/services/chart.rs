use charming::{
    Chart,
    component::{Axis, Grid, Title, VisualMap, VisualMapPiece},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, LineStyle, LineStyleType, SplitLine,
        TextStyle, Tooltip, Trigger,
    },
    series::Bar,
};

use crate::models::{
    recommendation::{Recommendation, TIER_CUTS},
    snapshot::Snapshot,
};
use crate::utils::percentile::PercentileMap;

/// Intensity range covered by one tier: `lower <= value < upper`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierBand {
    pub tier: Recommendation,
    pub lower: Option<u32>,
    pub upper: Option<u32>,
}

/// Converts the percentile cut points into intensity cut points for `map`.
pub fn tier_bands(map: &PercentileMap) -> Vec<TierBand> {
    let cuts: Vec<u32> = TIER_CUTS.iter().map(|&c| map.threshold(c)).collect();

    Recommendation::all()
        .iter()
        .enumerate()
        .map(|(i, &tier)| TierBand {
            tier,
            lower: i.checked_sub(1).map(|j| cuts[j]),
            upper: cuts.get(i).copied(),
        })
        .collect()
}

/// Bar chart of the snapshot's history, each bar colored by its tier.
pub fn history_chart(snapshot: &Snapshot, dark_mode: bool) -> Chart {
    let x_data: Vec<String> = snapshot
        .history
        .iter()
        .map(|p| p.timestamp.format("%H:%M").to_string())
        .collect();
    let y_data: Vec<f64> = snapshot
        .history
        .iter()
        .map(|p| f64::from(p.intensity))
        .collect();

    // Theme-aware colors
    let (title_color, axis_color, grid_color) = if dark_mode {
        ("#e4e4e7", "#a1a1aa", "#404040")
    } else {
        ("#1f2937", "#6b7280", "#e5e7eb")
    };

    let pieces: Vec<VisualMapPiece> = tier_bands(&snapshot.percentile_map())
        .into_iter()
        .map(|band| {
            let mut piece = VisualMapPiece::new();
            if let Some(lower) = band.lower {
                piece = piece.gte(f64::from(lower));
            }
            if let Some(upper) = band.upper {
                piece = piece.lt(f64::from(upper));
            }
            piece.color(band.tier.color())
        })
        .collect();

    Chart::new()
        .title(
            Title::new()
                .text(format!("Carbon Intensity, {}", snapshot.zone_id))
                .left("center")
                .text_style(TextStyle::new().font_size(16).color(title_color)),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .visual_map(VisualMap::new().show(false).pieces(pieces))
        .grid(
            Grid::new()
                .left("8%")
                .right("4%")
                .bottom("18%")
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(x_data)
                .axis_label(AxisLabel::new().rotate(45).color(axis_color).interval(3)),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .name("gCO₂/kWh")
                .axis_label(AxisLabel::new().color(axis_color))
                .split_line(
                    SplitLine::new().line_style(
                        LineStyle::new()
                            .color(grid_color)
                            .type_(LineStyleType::Dashed),
                    ),
                ),
        )
        .series(Bar::new().data(y_data).bar_width("70%"))
}
