use crate::actions::Action;
use crate::canvas::{
    Canvas, Color, GradientStop, Point, Rect, Size, TextAlign, TextMeasure, TextStyle,
};
use crate::catalog::{self, metric_kind, palette, Category, MetricKind, Status};
use crate::hits::{HitRegionRegistry, RegionFrame};
use crate::state::{RamStats, VramStats, WidgetState};
use std::f64::consts::TAU;
use std::time::Duration;

pub const PAD: f32 = 14.0;
pub const ELLIPSIS: &str = "…";

const TOOLBAR_GAP_TOP: f32 = 6.0;
const TOOLBAR_GAP_BOTTOM: f32 = 8.0;
const BUTTON_HEIGHT: f32 = 28.0;
const BUTTON_GAP: f32 = 8.0;

const HEADER_HEIGHT: f32 = 24.0;
const HEADER_GAP: f32 = 6.0;

const BADGE_HEIGHT: f32 = 30.0;
const BADGE_GAP: f32 = 8.0;
const BADGE_RADIUS: f32 = 8.0;
const STRIPE_WIDTH: f32 = 36.0;
const BADGE_INNER_PAD: f32 = 10.0;
const LABEL_VALUE_GAP: f32 = 8.0;
const VALUE_MIN_BUDGET: f32 = 80.0;
const VALUE_BUDGET_RATIO: f32 = 0.55;

const METER_HEIGHT: f32 = 12.0;
const METER_BOTTOM_GAP: f32 = 8.0;
const METER_WIDTH_RATIO: f32 = 0.4;

const FALLBACK_LINE_HEIGHT: f32 = 16.0;

const COLLAPSED_CHEVRON: &str = "▶";
const EXPANDED_CHEVRON: &str = "▼";

const BUTTON_TEXT: TextStyle = TextStyle::sans(12.0, Color::WHITE).aligned(TextAlign::Center);
const HEADER_TEXT: TextStyle = TextStyle::sans(12.0, Color::WHITE);
const ICON_TEXT: TextStyle = TextStyle::sans(16.0, Color::WHITE).aligned(TextAlign::Center);
const LABEL_TEXT: TextStyle = TextStyle::sans(12.0, Color::WHITE).bold();
const VALUE_TEXT: TextStyle = TextStyle::mono(12.0, Color::WHITE).aligned(TextAlign::Right);
const FALLBACK_TEXT: TextStyle = TextStyle::mono(12.0, palette::FALLBACK_TEXT);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub size: Size,
    pub content_top: f32,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    Snapshot,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOutput {
    pub mode: LayoutMode,
    pub content_bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meter {
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub label: &'static str,
    pub value: String,
    pub icon: &'static str,
    pub base: Color,
    pub meter: Option<Meter>,
}

// RAM and VRAM always produce a meter badge from the live readings. Every
// other key needs a snapshot value and is skipped when absent.
pub fn badges(category: &Category, state: &WidgetState) -> Vec<Badge> {
    let Some(snapshot) = state.snapshot() else {
        return Vec::new();
    };

    category
        .keys
        .iter()
        .filter_map(|&key| match metric_kind(key) {
            MetricKind::RamMeter => {
                let (value, fraction) = ram_reading(&state.live().ram);
                let base = Status::of(snapshot.get(key).unwrap_or_default()).color();
                Some(Badge {
                    label: key,
                    value,
                    icon: catalog::icon_for(key),
                    base,
                    meter: Some(Meter { fraction }),
                })
            }
            MetricKind::VramMeter => {
                let (value, fraction) = vram_reading(&state.live().vram);
                Some(Badge {
                    label: key,
                    value,
                    icon: catalog::icon_for(key),
                    base: palette::STRIPE,
                    meter: Some(Meter { fraction }),
                })
            }
            MetricKind::Text => snapshot.get(key).map(|value| Badge {
                label: key,
                value: value.to_string(),
                icon: catalog::icon_for(key),
                base: Status::of(value).color(),
                meter: None,
            }),
        })
        .collect()
}

pub fn usage_fraction(used: f64, total: f64) -> f64 {
    let used = used.max(0.0);
    let total = total.max(0.0);
    if total > 0.0 {
        (used / total).min(1.0)
    } else {
        0.0
    }
}

fn percent(fraction: f64) -> i64 {
    (fraction * 100.0).round() as i64
}

// Ties round away from zero.
fn two_decimals(value: f64) -> String {
    format!("{:.2}", (value * 100.0).round() / 100.0)
}

pub fn ram_reading(ram: &RamStats) -> (String, f64) {
    let used = ram.used_mb.max(0.0);
    let total = ram.total_mb.max(0.0);
    let fraction = usage_fraction(used, total);
    if total <= 0.0 {
        return ("0.00 / 0.00 GB".to_string(), fraction);
    }
    let value = format!(
        "{} / {} GB ({}%)",
        two_decimals(used / 1024.0),
        two_decimals(total / 1024.0),
        percent(fraction)
    );
    (value, fraction)
}

// Used VRAM is total minus free.
pub fn vram_reading(vram: &VramStats) -> (String, f64) {
    let total = vram.total_mb.max(0.0);
    let used = (vram.total_mb - vram.free_mb).max(0.0);
    let fraction = usage_fraction(used, total);
    if total <= 0.0 {
        return ("0 / 0 MB".to_string(), fraction);
    }
    (
        format!("{used} / {total} MB ({}%)", percent(fraction)),
        fraction,
    )
}

pub fn truncate_to_width<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    style: &TextStyle,
    max_width: f32,
) -> String {
    if measure.measure_text(text, style) <= max_width {
        return text.to_string();
    }

    let mut kept = text;
    while let Some((last, _)) = kept.char_indices().next_back() {
        if measure.measure_text(&format!("{kept}{ELLIPSIS}"), style) <= max_width {
            break;
        }
        kept = &kept[..last];
    }
    format!("{kept}{ELLIPSIS}")
}

pub fn value_budget(inner_width: f32) -> f32 {
    VALUE_MIN_BUDGET.max((inner_width * VALUE_BUDGET_RATIO).floor())
}

pub fn shimmer_phase(elapsed: Duration, seed: f64, y: f32) -> f64 {
    let base = (elapsed.as_secs_f64() / 2.0 + seed).rem_euclid(1.0);
    (base + f64::from(y).rem_euclid(1000.0) * 0.0003).rem_euclid(1.0)
}

pub fn render<C: Canvas + ?Sized>(
    canvas: &mut C,
    frame: &FrameInput,
    state: &WidgetState,
    registry: &mut HitRegionRegistry,
) -> LayoutOutput {
    let inner_width = frame.size.width - PAD * 2.0;
    let mut regions = RegionFrame::new();

    let toolbar_y = frame.content_top + TOOLBAR_GAP_TOP;
    draw_toolbar(canvas, &mut regions, toolbar_y, inner_width);
    let mut y = toolbar_y + BUTTON_HEIGHT + TOOLBAR_GAP_BOTTOM;

    let mode = if state.snapshot().is_some() {
        for category in state.catalog() {
            let header = Rect::new(PAD, y, inner_width, HEADER_HEIGHT);
            let collapsed = state.is_collapsed(category.title);
            draw_header(canvas, header, category.title, collapsed);
            regions.header(category.title, header);
            y += HEADER_HEIGHT + HEADER_GAP;
            if collapsed {
                continue;
            }

            for badge in badges(category, state) {
                let rect = Rect::new(PAD, y, inner_width, BADGE_HEIGHT);
                let phase = shimmer_phase(frame.elapsed, state.anim_seed(), y);
                draw_badge(canvas, rect, &badge, phase);
                y += BADGE_HEIGHT + BADGE_GAP;
            }
        }
        LayoutMode::Snapshot
    } else {
        let text = match state.report() {
            "" => " ",
            report => report,
        };
        for line in text.split('\n') {
            canvas.draw_text(line, Point::new(PAD, y), &FALLBACK_TEXT);
            y += FALLBACK_LINE_HEIGHT;
        }
        LayoutMode::Fallback
    };

    registry.commit(regions);
    LayoutOutput {
        mode,
        content_bottom: y,
    }
}

fn draw_toolbar<C: Canvas + ?Sized>(
    canvas: &mut C,
    regions: &mut RegionFrame,
    y: f32,
    inner_width: f32,
) {
    let column = ((inner_width - BUTTON_GAP * 2.0) / 3.0).floor().max(0.0);
    let fill = palette::HEADER_BG.lighten(-15);

    for (i, action) in Action::TOOLBAR.iter().enumerate() {
        let x = PAD + (column + BUTTON_GAP) * i as f32;
        let rect = Rect::new(x, y, column, BUTTON_HEIGHT);
        canvas.fill_rounded_rect(rect, 6.0, fill);
        canvas.draw_text(
            action.label(),
            Point::new(x + column / 2.0, y + BUTTON_HEIGHT / 2.0 + 1.0),
            &BUTTON_TEXT,
        );
        regions.button(action.key(), rect);
    }
}

fn draw_header<C: Canvas + ?Sized>(canvas: &mut C, rect: Rect, title: &str, collapsed: bool) {
    canvas.fill_rounded_rect(rect, 6.0, palette::HEADER_BG.lighten(-10));
    let chevron = if collapsed {
        COLLAPSED_CHEVRON
    } else {
        EXPANDED_CHEVRON
    };
    canvas.draw_text(
        &format!("{chevron} {title}"),
        Point::new(rect.x + 8.0, rect.y + 16.0),
        &HEADER_TEXT,
    );
}

fn draw_badge<C: Canvas + ?Sized>(canvas: &mut C, rect: Rect, badge: &Badge, phase: f64) {
    let wave = 0.25 + 0.25 * (phase * TAU).sin();
    canvas.fill_gradient(
        rect,
        BADGE_RADIUS,
        &[
            GradientStop {
                offset: 0.0,
                color: badge.base.lighten(10),
            },
            GradientStop {
                offset: wave as f32,
                color: badge.base,
            },
            GradientStop {
                offset: 1.0,
                color: badge.base.lighten(-10),
            },
        ],
    );

    let stripe = Rect::new(rect.x, rect.y, STRIPE_WIDTH, rect.height);
    canvas.fill_rounded_rect(stripe, BADGE_RADIUS, badge.base.lighten(-15));
    canvas.draw_text(
        badge.icon,
        Point::new(rect.x + STRIPE_WIDTH / 2.0, rect.y + rect.height / 2.0 + 1.0),
        &ICON_TEXT,
    );

    let inner_left = rect.x + STRIPE_WIDTH + BADGE_INNER_PAD;
    let inner_right = rect.right() - BADGE_INNER_PAD;
    let inner_width = inner_right - inner_left;

    // Value first: the label only gets what the value leaves over.
    let value = truncate_to_width(
        &*canvas,
        &badge.value,
        &VALUE_TEXT,
        value_budget(inner_width),
    );
    let value_width = canvas.measure_text(&value, &VALUE_TEXT);
    let label = truncate_to_width(
        &*canvas,
        badge.label,
        &LABEL_TEXT,
        inner_width - value_width - LABEL_VALUE_GAP,
    );

    canvas.draw_text(&label, Point::new(inner_left, rect.y + 18.0), &LABEL_TEXT);
    canvas.draw_text(
        &value,
        Point::new(inner_right, rect.bottom() - 8.0),
        &VALUE_TEXT,
    );

    if let Some(meter) = badge.meter {
        draw_meter(canvas, rect, badge.base, meter);
    }
}

fn draw_meter<C: Canvas + ?Sized>(canvas: &mut C, badge: Rect, base: Color, meter: Meter) {
    let inner_x = badge.x + STRIPE_WIDTH + BADGE_INNER_PAD;
    let inner_width = badge.width - STRIPE_WIDTH - BADGE_INNER_PAD * 2.0;
    let width = (inner_width * METER_WIDTH_RATIO).floor().max(1.0);
    let x = inner_x + ((inner_width - width) / 2.0).floor();
    let y = badge.bottom() - METER_HEIGHT - METER_BOTTOM_GAP;

    canvas.fill_rounded_rect(Rect::new(x, y, width, METER_HEIGHT), 6.0, base.lighten(-25));
    let filled = (f64::from(width) * meter.fraction).floor() as f32;
    canvas.fill_rounded_rect(Rect::new(x, y, filled, METER_HEIGHT), 6.0, palette::OK);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{approximate_text_width, DrawCommand, RecordingCanvas};
    use crate::catalog::CATEGORIES;
    use crate::hits::HitKind;
    use crate::state::{Snapshot, StateUpdate};

    fn frame() -> FrameInput {
        FrameInput {
            size: Size::new(560.0, 360.0),
            content_top: 32.0,
            elapsed: Duration::ZERO,
        }
    }

    fn scenario_state() -> WidgetState {
        let mut state = WidgetState::default().with_anim_seed(0.0);
        state.apply(StateUpdate::Snapshot(Snapshot::from_pairs([
            ("CPU", "x"),
            ("RAM", "16GB"),
            ("PyTorch", "2.1"),
        ])));
        state.apply(StateUpdate::Ram(RamStats {
            used_mb: 8000.0,
            total_mb: 16000.0,
            free_mb: 8000.0,
        }));
        state
    }

    fn ok_fills(canvas: &RecordingCanvas) -> Vec<Rect> {
        canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::RoundedRect { rect, color, .. } if *color == palette::OK => {
                    Some(*rect)
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ram_badge_shows_gigabytes_and_half_full_meter() {
        let state = scenario_state();
        let mut canvas = RecordingCanvas::new();
        let mut registry = HitRegionRegistry::new();
        render(&mut canvas, &frame(), &state, &mut registry);

        assert!(canvas.contains_text("7.81 / 15.63 GB (50%)"));
        assert!(canvas.contains_text("0 / 0 MB"));
        assert!(canvas.contains_text("x"));
        assert!(canvas.contains_text("2.1"));

        // First fill is the RAM meter (System category), second the VRAM one.
        let fills = ok_fills(&canvas);
        assert_eq!(fills.len(), 2);
        let ram_meter = canvas
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::RoundedRect { rect, .. }
                    if rect.height == METER_HEIGHT && rect.y == fills[0].y =>
                {
                    Some(*rect)
                }
                _ => None,
            })
            .expect("meter background");
        assert_eq!(ram_meter.width, 190.0);
        assert_eq!(fills[0].width, 95.0);
        assert_eq!(fills[1].width, 0.0);
    }

    #[test]
    fn meter_fraction_is_clamped() {
        let over = RamStats {
            used_mb: 32000.0,
            total_mb: 16000.0,
            free_mb: 0.0,
        };
        let (value, fraction) = ram_reading(&over);
        assert_eq!(fraction, 1.0);
        assert!(value.ends_with("(100%)"));

        let negative = RamStats {
            used_mb: -5.0,
            total_mb: 100.0,
            free_mb: 0.0,
        };
        assert_eq!(ram_reading(&negative).1, 0.0);

        let vram = VramStats {
            free_mb: 9000.0,
            total_mb: 8000.0,
        };
        assert_eq!(vram_reading(&vram), ("0 / 8000 MB (0%)".to_string(), 0.0));
        assert_eq!(usage_fraction(5.0, 0.0), 0.0);
    }

    #[test]
    fn readings_without_totals_use_placeholders() {
        assert_eq!(ram_reading(&RamStats::default()).0, "0.00 / 0.00 GB");
        assert_eq!(vram_reading(&VramStats::default()).0, "0 / 0 MB");
        let vram = VramStats {
            free_mb: 6000.0,
            total_mb: 8000.0,
        };
        assert_eq!(vram_reading(&vram).0, "2000 / 8000 MB (25%)");
    }

    #[test]
    fn truncation_fits_budget_and_keeps_short_text() {
        let canvas = RecordingCanvas::new();
        let budget = value_budget(476.0);
        assert_eq!(budget, 261.0);

        for len in [1usize, 10, 36, 37, 60, 200] {
            let text = "9".repeat(len);
            let out = truncate_to_width(&canvas, &text, &VALUE_TEXT, budget);
            if approximate_text_width(&text, &VALUE_TEXT) <= budget {
                assert_eq!(out, text);
            } else {
                assert!(out.ends_with(ELLIPSIS));
                assert!(canvas.measure_text(&out, &VALUE_TEXT) <= budget);
                assert!(out.len() < text.len() + ELLIPSIS.len());
            }
        }

        let out = truncate_to_width(&canvas, "héllo wörld", &LABEL_TEXT, 40.0);
        assert!(out.ends_with(ELLIPSIS));
        assert!(canvas.measure_text(&out, &LABEL_TEXT) <= 40.0);
    }

    #[test]
    fn value_budget_has_a_floor() {
        assert_eq!(value_budget(100.0), 80.0);
        assert_eq!(value_budget(1000.0), 550.0);
    }

    #[test]
    fn missing_keys_are_skipped() {
        let state = scenario_state();
        let core = catalog::find_category(CATEGORIES, "== Core libs ==").expect("core");
        let labels: Vec<_> = badges(core, &state).into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["PyTorch"]);

        let system = catalog::find_category(CATEGORIES, "== System ==").expect("system");
        let labels: Vec<_> = badges(system, &state).into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["CPU", "RAM"]);
    }

    #[test]
    fn ram_badge_color_follows_snapshot_fact() {
        let mut state = WidgetState::default();
        state.apply(StateUpdate::Snapshot(Snapshot::from_pairs([(
            "RAM",
            "Unknown",
        )])));
        let system = catalog::find_category(CATEGORIES, "== System ==").expect("system");
        let ram = badges(system, &state)
            .into_iter()
            .find(|b| b.label == "RAM")
            .expect("ram badge");
        assert_eq!(ram.base, palette::WARN);
    }

    #[test]
    fn registers_three_buttons_and_every_header() {
        let state = scenario_state();
        let mut canvas = RecordingCanvas::new();
        let mut registry = HitRegionRegistry::new();
        render(&mut canvas, &frame(), &state, &mut registry);

        let regions = registry.regions();
        assert_eq!(regions.len(), 3 + CATEGORIES.len());
        let buttons: Vec<_> = regions
            .iter()
            .filter(|r| r.kind == HitKind::Button)
            .map(|r| r.key)
            .collect();
        assert_eq!(buttons, vec!["free_vram", "free_ram", "copy"]);
        assert_eq!(regions[0].rect, Rect::new(14.0, 38.0, 172.0, 28.0));
        assert_eq!(regions[3].rect.y, 74.0);
        assert_eq!(regions[3].rect.width, 532.0);

        assert!(canvas.contains_text("▼ == System =="));
        assert!(canvas.contains_text("▶ == Others =="));
    }

    #[test]
    fn expanding_a_category_never_shrinks_the_panel() {
        let mut state = scenario_state();
        let mut canvas = RecordingCanvas::new();
        let mut registry = HitRegionRegistry::new();
        let policy = crate::resize::ResizePolicy::default();

        let expanded = render(&mut canvas, &frame(), &state, &mut registry);
        state.toggle_collapsed("== Core libs ==");
        let collapsed = render(&mut canvas, &frame(), &state, &mut registry);

        assert!(expanded.content_bottom > collapsed.content_bottom);
        assert!(policy.desired_height(&expanded) >= policy.desired_height(&collapsed));
    }

    #[test]
    fn without_snapshot_falls_back_to_text() {
        let state = WidgetState::default();
        let mut canvas = RecordingCanvas::new();
        let mut registry = HitRegionRegistry::new();
        let out = render(&mut canvas, &frame(), &state, &mut registry);

        assert_eq!(out.mode, LayoutMode::Fallback);
        assert_eq!(out.content_bottom, 38.0 + 28.0 + 8.0 + 16.0);
        assert!(canvas.contains_text(" "));
        assert_eq!(registry.regions().len(), 3);
    }

    #[test]
    fn shimmer_phase_stays_in_unit_range() {
        for secs in [0.0, 0.7, 13.2, 1e6] {
            for y in [0.0f32, 74.0, 999.0, 4321.0] {
                let t = shimmer_phase(Duration::from_secs_f64(secs), 0.9, y);
                assert!((0.0..1.0).contains(&t));
            }
        }
        assert_eq!(shimmer_phase(Duration::ZERO, 0.0, 0.0), 0.0);
    }
}
