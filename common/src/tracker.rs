//! Dirty-state tracking for display fields.
//!
//! Each field remembers what is currently on screen (`last_rendered`) next to
//! what should be there (`current`). A redraw is owed exactly when they differ.
//!
//! # State Machine
//!
//! ```text
//!            update(new != last_rendered)       begin_redraw()
//!   CLEAN ─────────────────────────────────▶ DIRTY ─────────────▶ REDRAWING
//!     ▲                                        ▲                     │
//!     │          commit() (flush confirmed)    │  abort_redraw()     │
//!     └────────────────────────────────────────┼─────────────────────┘
//!                                              └── (flush failed)
//! ```
//!
//! Values are compared by exact equality, not numeric tolerance: the rendered
//! text is the unit of redraw. Repeated identical updates are no-ops, so a
//! field is never marked dirty twice without an intervening commit.

use embedded_graphics::primitives::Rectangle;

use crate::config::value_region;
use crate::mapper::FieldText;

/// Number of text fields in the scene.
pub const FIELD_COUNT: usize = 4;

/// Text fields, in scene (and redraw) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FieldId {
    Temperature = 0,
    Voltage = 1,
    Charge = 2,
    Uptime = 3,
}

impl FieldId {
    /// All fields in insertion order.
    pub const ALL: [FieldId; FIELD_COUNT] = [Self::Temperature, Self::Voltage, Self::Charge, Self::Uptime];

    #[inline]
    pub const fn index(self) -> usize { self as usize }

    /// Static label drawn left of the value.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature:",
            Self::Voltage => "Voltage:",
            Self::Charge => "Charge:",
            Self::Uptime => "Uptime:",
        }
    }

    /// Fields refreshed on the slow tick from a sensor reading.
    pub const fn is_sensor_derived(self) -> bool { !matches!(self, Self::Uptime) }
}

/// Redraw state of a tracked value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldState {
    /// On-screen content matches the current value.
    #[default]
    Clean,
    /// The current value differs from what is on screen.
    Dirty,
    /// A redraw was staged and awaits flush confirmation.
    Redrawing,
}

/// A value with last-rendered tracking.
///
/// Used for field text and for widgets bound to a number.
#[derive(Debug, Clone)]
pub struct DirtyCell<T> {
    current: T,
    /// `None` until the first confirmed redraw.
    last_rendered: Option<T>,
    /// Snapshot being drawn while `Redrawing`.
    in_flight: Option<T>,
    state: FieldState,
}

impl<T: Clone + PartialEq> DirtyCell<T> {
    /// A cell that has never been rendered. The first update always dirties it.
    pub const fn new(initial: T) -> Self {
        Self {
            current: initial,
            last_rendered: None,
            in_flight: None,
            state: FieldState::Clean,
        }
    }

    /// Set a new value.
    ///
    /// Returns `true` only when this call takes the cell from clean to dirty.
    /// A differing value while already dirty replaces the pending value
    /// without a second dirty mark. A value equal to what is on screen
    /// cancels a pending redraw.
    pub fn update(
        &mut self,
        value: T,
    ) -> bool {
        let on_screen = self.last_rendered.as_ref() == Some(&value);
        match self.state {
            FieldState::Clean => {
                if on_screen {
                    return false;
                }
                self.current = value;
                self.state = FieldState::Dirty;
                true
            }
            FieldState::Dirty => {
                self.current = value;
                if on_screen {
                    self.state = FieldState::Clean;
                }
                false
            }
            FieldState::Redrawing => {
                // Settled on commit against the in-flight snapshot
                self.current = value;
                false
            }
        }
    }

    /// `DIRTY → REDRAWING`. Returns the value to draw, or `None` when not dirty.
    pub fn begin_redraw(&mut self) -> Option<&T> {
        if self.state != FieldState::Dirty {
            return None;
        }
        self.state = FieldState::Redrawing;
        self.in_flight = Some(self.current.clone());
        self.in_flight.as_ref()
    }

    /// `REDRAWING → CLEAN` after the flush was confirmed.
    ///
    /// If the value changed while the redraw was in flight the cell goes back
    /// to `DIRTY` instead.
    pub fn commit(&mut self) {
        if self.state != FieldState::Redrawing {
            return;
        }
        self.last_rendered = self.in_flight.take();
        self.state = if self.last_rendered.as_ref() == Some(&self.current) {
            FieldState::Clean
        } else {
            FieldState::Dirty
        };
    }

    /// `REDRAWING → DIRTY` when the flush failed. Screen content is unknown,
    /// so the value stays owed.
    pub fn abort_redraw(&mut self) {
        if self.state != FieldState::Redrawing {
            return;
        }
        self.in_flight = None;
        self.state = FieldState::Dirty;
    }

    #[inline]
    pub const fn state(&self) -> FieldState { self.state }

    #[inline]
    pub const fn is_dirty(&self) -> bool { matches!(self.state, FieldState::Dirty) }

    #[inline]
    pub const fn current(&self) -> &T { &self.current }

    #[inline]
    pub const fn last_rendered(&self) -> Option<&T> { self.last_rendered.as_ref() }
}

/// One renderable text field: a fixed region plus its tracked text.
#[derive(Debug, Clone)]
pub struct DisplayField {
    id: FieldId,
    region: Rectangle,
    text: DirtyCell<FieldText>,
}

impl DisplayField {
    /// Field at its row of the fixed layout.
    pub const fn new(id: FieldId) -> Self { Self::with_region(id, value_region(id.index())) }

    pub const fn with_region(
        id: FieldId,
        region: Rectangle,
    ) -> Self {
        Self {
            id,
            region,
            text: DirtyCell::new(FieldText::new()),
        }
    }

    #[inline]
    pub const fn id(&self) -> FieldId { self.id }

    #[inline]
    pub const fn region(&self) -> Rectangle { self.region }

    /// See [`DirtyCell::update`].
    pub fn update(
        &mut self,
        text: FieldText,
    ) -> bool {
        self.text.update(text)
    }

    pub fn begin_redraw(&mut self) -> Option<&FieldText> { self.text.begin_redraw() }

    pub fn commit(&mut self) { self.text.commit() }

    pub fn abort_redraw(&mut self) { self.text.abort_redraw() }

    #[inline]
    pub const fn state(&self) -> FieldState { self.text.state() }

    #[inline]
    pub const fn is_dirty(&self) -> bool { self.text.is_dirty() }

    #[inline]
    pub fn current_text(&self) -> &str { self.text.current() }

    /// Text confirmed on screen (empty before the first redraw).
    #[inline]
    pub fn last_rendered_text(&self) -> &str { self.text.last_rendered().map_or("", |t| t.as_str()) }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::format_field;

    fn text(s: &str) -> FieldText { format_field(format_args!("{s}")) }

    fn rendered(
        field: &mut DisplayField,
        s: &str,
    ) {
        field.update(text(s));
        field.begin_redraw();
        field.commit();
    }

    #[test]
    fn test_field_ids_in_scene_order() {
        for (i, id) in FieldId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert!(FieldId::Charge.is_sensor_derived());
        assert!(!FieldId::Uptime.is_sensor_derived());
        assert_eq!(FieldId::Uptime.label(), "Uptime:");
    }

    #[test]
    fn test_first_update_is_dirty() {
        let mut field = DisplayField::new(FieldId::Temperature);
        assert_eq!(field.state(), FieldState::Clean);
        assert!(field.update(text("21.0 C")));
        assert_eq!(field.state(), FieldState::Dirty);
        assert_eq!(field.current_text(), "21.0 C");
        assert_eq!(field.last_rendered_text(), "");
    }

    #[test]
    fn test_identical_update_is_noop() {
        let mut field = DisplayField::new(FieldId::Voltage);
        assert!(field.update(text("4000 mV")));
        assert!(!field.update(text("4000 mV")));
        assert_eq!(field.state(), FieldState::Dirty);

        field.begin_redraw();
        field.commit();
        assert!(!field.update(text("4000 mV")));
        assert_eq!(field.state(), FieldState::Clean);
    }

    #[test]
    fn test_redraw_cycle() {
        let mut field = DisplayField::new(FieldId::Charge);
        field.update(text("50%"));
        assert_eq!(field.begin_redraw().map(|t| t.as_str()), Some("50%"));
        assert_eq!(field.state(), FieldState::Redrawing);
        // Not redrawable twice
        assert!(field.begin_redraw().is_none());
        field.commit();
        assert_eq!(field.state(), FieldState::Clean);
        assert_eq!(field.last_rendered_text(), "50%");
    }

    #[test]
    fn test_change_while_dirty_keeps_single_mark() {
        let mut field = DisplayField::new(FieldId::Temperature);
        rendered(&mut field, "20.0 C");
        assert!(field.update(text("20.1 C")));
        assert!(!field.update(text("20.2 C")));
        assert_eq!(field.current_text(), "20.2 C");
        assert_eq!(field.state(), FieldState::Dirty);
    }

    #[test]
    fn test_revert_to_on_screen_value_cancels() {
        let mut field = DisplayField::new(FieldId::Temperature);
        rendered(&mut field, "20.0 C");
        field.update(text("20.1 C"));
        assert!(!field.update(text("20.0 C")));
        assert_eq!(field.state(), FieldState::Clean);
        assert!(field.begin_redraw().is_none());
    }

    #[test]
    fn test_abort_keeps_value_owed() {
        let mut field = DisplayField::new(FieldId::Uptime);
        field.update(text("00:00:01"));
        field.begin_redraw();
        field.abort_redraw();
        assert_eq!(field.state(), FieldState::Dirty);
        assert_eq!(field.last_rendered_text(), "");
        assert!(field.begin_redraw().is_some());
    }

    #[test]
    fn test_update_during_redraw_settles_on_commit() {
        let mut cell = DirtyCell::new(0u8);
        cell.update(10);
        cell.begin_redraw();
        assert!(!cell.update(11));
        cell.commit();
        assert_eq!(cell.last_rendered(), Some(&10));
        assert_eq!(cell.state(), FieldState::Dirty);

        cell.begin_redraw();
        cell.commit();
        assert_eq!(cell.state(), FieldState::Clean);
    }

    #[test]
    fn test_commit_and_abort_ignored_outside_redraw() {
        let mut cell = DirtyCell::new(0u8);
        cell.update(5);
        cell.commit();
        assert_eq!(cell.state(), FieldState::Dirty);
        cell.abort_redraw();
        assert_eq!(cell.state(), FieldState::Dirty);
    }

    #[test]
    fn test_clean_iff_rendered_equals_current() {
        let mut cell = DirtyCell::new(0u8);
        let values = [1u8, 1, 2, 2, 1, 3, 3, 3, 4];
        for (i, v) in values.iter().enumerate() {
            cell.update(*v);
            if i % 2 == 0 {
                cell.begin_redraw();
                cell.commit();
            }
            let matches = cell.last_rendered() == Some(cell.current());
            assert_eq!(cell.state() == FieldState::Clean, matches, "step {i}");
        }
    }
}
