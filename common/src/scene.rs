//! Retained scene: the fixed layout and everything drawn on it.
//!
//! The scene owns the four [`DisplayField`]s (an arena indexed by
//! [`FieldId`]) and the charge bar widget bound to the battery percentage.
//! Regions are fixed for the process lifetime.
//!
//! # Layout
//!
//! ```text
//! ╭──────────────────────────────────────╮
//! │  Temperature:       23.5 C           │
//! │  Voltage:           4012 mV          │
//! │  Charge:            78%              │
//! │  Uptime:            01:01:01         │
//! │  [██████████████████░░░░░░░]         │
//! ╰──────────────────────────────────────╯
//! ```
//!
//! Labels and the border are static chrome, drawn once per buffer at startup.
//! Only value regions and the charge bar are ever redrawn.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle, RoundedRectangle};
use embedded_graphics::text::Text;

use crate::colors::{BACKGROUND, GREEN, ORANGE, RED};
use crate::config::{BORDER_RADIUS, CHARGE_CRITICAL, CHARGE_LOW, LABEL_X, ROW_Y, charge_bar_region};
use crate::mapper::FieldText;
use crate::styles::{BORDER_STYLE, CLEAR_STYLE, LABEL_STYLE, TOP_LEFT, TRACK_STYLE, VALUE_STYLE};
use crate::tracker::{DirtyCell, DisplayField, FIELD_COUNT, FieldId, FieldState};

// =============================================================================
// Charge Bar Widget
// =============================================================================

/// Bounded progress indicator bound to the charge percentage.
///
/// Tracked by integer equality, so it redraws only when the whole-percent
/// value changes.
#[derive(Debug, Clone)]
pub struct ChargeBar {
    region: Rectangle,
    level: DirtyCell<u8>,
}

impl ChargeBar {
    pub const fn new(region: Rectangle) -> Self {
        Self {
            region,
            level: DirtyCell::new(0),
        }
    }

    /// Values above 100 are clamped.
    pub fn set(
        &mut self,
        percentage: u8,
    ) -> bool {
        self.level.update(percentage.min(100))
    }

    #[inline]
    pub const fn region(&self) -> Rectangle { self.region }

    #[inline]
    pub const fn state(&self) -> FieldState { self.level.state() }

    #[inline]
    pub const fn is_dirty(&self) -> bool { self.level.is_dirty() }

    pub fn begin_redraw(&mut self) -> Option<u8> { self.level.begin_redraw().copied() }

    pub fn commit(&mut self) { self.level.commit() }

    pub fn abort_redraw(&mut self) { self.level.abort_redraw() }

    #[inline]
    pub fn percentage(&self) -> u8 { *self.level.current() }
}

/// Bar fill color for a charge level.
pub const fn charge_color(percentage: u8) -> Rgb565 {
    if percentage <= CHARGE_CRITICAL {
        RED
    } else if percentage <= CHARGE_LOW {
        ORANGE
    } else {
        GREEN
    }
}

// =============================================================================
// Scene
// =============================================================================

/// The static layout plus tracked field values.
#[derive(Debug, Clone)]
pub struct Scene {
    fields: [DisplayField; FIELD_COUNT],
    charge_bar: ChargeBar,
}

impl Scene {
    pub const fn new() -> Self {
        Self {
            fields: [
                DisplayField::new(FieldId::Temperature),
                DisplayField::new(FieldId::Voltage),
                DisplayField::new(FieldId::Charge),
                DisplayField::new(FieldId::Uptime),
            ],
            charge_bar: ChargeBar::new(charge_bar_region()),
        }
    }

    /// Fields in insertion order.
    #[inline]
    pub fn fields(&self) -> &[DisplayField] { &self.fields }

    #[inline]
    pub fn field(
        &self,
        id: FieldId,
    ) -> &DisplayField {
        &self.fields[id.index()]
    }

    #[inline]
    pub fn field_mut(
        &mut self,
        id: FieldId,
    ) -> &mut DisplayField {
        &mut self.fields[id.index()]
    }

    /// Feed a new text to the tracker. Returns `true` if the field became dirty.
    pub fn update(
        &mut self,
        id: FieldId,
        text: FieldText,
    ) -> bool {
        self.field_mut(id).update(text)
    }

    /// Bind the charge bar to a new percentage.
    pub fn set_charge(
        &mut self,
        percentage: u8,
    ) -> bool {
        self.charge_bar.set(percentage)
    }

    #[inline]
    pub fn charge_bar(&self) -> &ChargeBar { &self.charge_bar }

    #[inline]
    pub fn charge_bar_mut(&mut self) -> &mut ChargeBar { &mut self.charge_bar }

    /// Number of regions owed a redraw.
    pub fn dirty_count(&self) -> usize {
        self.fields.iter().filter(|f| f.is_dirty()).count() + usize::from(self.charge_bar.is_dirty())
    }

    #[inline]
    pub fn is_dirty(&self) -> bool { self.dirty_count() > 0 }

    /// Draw background, border and labels over the whole target.
    pub fn draw_chrome<D>(
        &self,
        target: &mut D,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.clear(BACKGROUND)?;

        let screen = Rectangle::new(Point::zero(), crate::config::screen_size());
        RoundedRectangle::with_equal_corners(screen, Size::new(BORDER_RADIUS, BORDER_RADIUS))
            .into_styled(BORDER_STYLE)
            .draw(target)?;

        for field in &self.fields {
            let origin = Point::new(LABEL_X, ROW_Y[field.id().index()]);
            Text::with_text_style(field.id().label(), origin, LABEL_STYLE, TOP_LEFT).draw(target)?;
        }
        Ok(())
    }
}

impl Default for Scene {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Region Drawing
// =============================================================================

/// Clear `region` to the background, then draw `text` left-aligned at its
/// origin. Nothing outside `region` is touched.
pub fn draw_field<D>(
    target: &mut D,
    region: Rectangle,
    text: &str,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let mut clipped = target.clipped(&region);
    region.into_styled(CLEAR_STYLE).draw(&mut clipped)?;
    Text::with_text_style(text, region.top_left, VALUE_STYLE, TOP_LEFT).draw(&mut clipped)?;
    Ok(())
}

/// Draw the charge bar for `percentage` into `region`.
pub fn draw_charge_bar<D>(
    target: &mut D,
    region: Rectangle,
    percentage: u8,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let mut clipped = target.clipped(&region);
    region.into_styled(CLEAR_STYLE).draw(&mut clipped)?;
    region
        .into_styled(PrimitiveStyle::with_stroke(charge_color(percentage), 1))
        .draw(&mut clipped)?;

    // 2px inset inside the outline
    if region.size.width < 4 || region.size.height < 4 {
        return Ok(());
    }
    let track = Rectangle::new(
        region.top_left + Point::new(2, 2),
        Size::new(region.size.width - 4, region.size.height - 4),
    );
    track.into_styled(TRACK_STYLE).draw(&mut clipped)?;

    let filled = track.size.width * u32::from(percentage.min(100)) / 100;
    if filled > 0 {
        Rectangle::new(track.top_left, Size::new(filled, track.size.height))
            .into_styled(PrimitiveStyle::with_fill(charge_color(percentage)))
            .draw(&mut clipped)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::mock_display::MockDisplay;

    use super::*;
    use crate::colors::{FOREGROUND, GRAY};
    use crate::config::value_region;
    use crate::mapper::format_charge;

    #[test]
    fn test_scene_starts_clean_with_fixed_regions() {
        let scene = Scene::new();
        assert_eq!(scene.dirty_count(), 0);
        for (i, field) in scene.fields().iter().enumerate() {
            assert_eq!(field.id(), FieldId::ALL[i]);
            assert_eq!(field.region(), value_region(i));
        }
        assert_eq!(scene.charge_bar().region(), charge_bar_region());
    }

    #[test]
    fn test_update_marks_dirty() {
        let mut scene = Scene::new();
        assert!(scene.update(FieldId::Charge, format_charge(50)));
        assert!(!scene.update(FieldId::Charge, format_charge(50)));
        assert!(scene.set_charge(50));
        assert_eq!(scene.dirty_count(), 2);
        assert!(scene.is_dirty());
    }

    #[test]
    fn test_charge_bar_clamps() {
        let mut bar = ChargeBar::new(charge_bar_region());
        bar.set(150);
        assert_eq!(bar.percentage(), 100);
    }

    #[test]
    fn test_charge_colors() {
        assert_eq!(charge_color(0), RED);
        assert_eq!(charge_color(CHARGE_CRITICAL), RED);
        assert_eq!(charge_color(CHARGE_LOW), ORANGE);
        assert_eq!(charge_color(CHARGE_LOW + 1), GREEN);
        assert_eq!(charge_color(100), GREEN);
    }

    #[test]
    fn test_field_text_stays_inside_region() {
        let mut display: MockDisplay<Rgb565> = MockDisplay::new();
        display.set_allow_overdraw(true);
        let region = Rectangle::new(Point::new(4, 4), Size::new(20, 12));
        draw_field(&mut display, region, "a very long value that overflows").unwrap();

        assert_eq!(display.affected_area(), region);
        assert_eq!(display.get_pixel(Point::new(3, 3)), None);
        assert!(region.points().any(|p| display.get_pixel(p) == Some(FOREGROUND)));
        assert!(region.points().any(|p| display.get_pixel(p) == Some(BACKGROUND)));
    }

    #[test]
    fn test_charge_level_fill_proportional() {
        let mut display: MockDisplay<Rgb565> = MockDisplay::new();
        display.set_allow_overdraw(true);
        let region = Rectangle::new(Point::zero(), Size::new(44, 8));
        draw_charge_bar(&mut display, region, 50).unwrap();

        // Track is 40px wide starting at x=2; half filled
        assert_eq!(display.get_pixel(Point::new(2, 4)), Some(GREEN));
        assert_eq!(display.get_pixel(Point::new(21, 4)), Some(GREEN));
        assert_eq!(display.get_pixel(Point::new(22, 4)), Some(GRAY));
        assert_eq!(display.get_pixel(Point::new(41, 4)), Some(GRAY));
        // Outline, then a 1px gap
        assert_eq!(display.get_pixel(Point::new(0, 0)), Some(GREEN));
        assert_eq!(display.get_pixel(Point::new(1, 1)), Some(BACKGROUND));
    }
}
