//! Pre-computed static styles.
//!
//! Defined as `const` so no style object is built per redraw; only the text
//! changes between frames.

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_9X15;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::PrimitiveStyle;
use embedded_graphics::text::{Alignment, Baseline, TextStyle, TextStyleBuilder};
use profont::PROFONT_14_POINT;

use crate::colors::{BACKGROUND, FOREGROUND, GRAY};

/// Left-aligned, top baseline: text origin is the region's top-left corner.
pub const TOP_LEFT: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Left)
    .baseline(Baseline::Top)
    .build();

/// Static label text (9x15 ASCII).
pub const LABEL_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&FONT_9X15, FOREGROUND);

/// Field value text (`ProFont` 14pt).
pub const VALUE_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&PROFONT_14_POINT, FOREGROUND);

/// Fill used to clear a region before redrawing it.
pub const CLEAR_STYLE: PrimitiveStyle<Rgb565> = PrimitiveStyle::with_fill(BACKGROUND);

/// Rounded border around the panel.
pub const BORDER_STYLE: PrimitiveStyle<Rgb565> = PrimitiveStyle::with_stroke(FOREGROUND, 1);

/// Empty part of the charge bar.
pub const TRACK_STYLE: PrimitiveStyle<Rgb565> = PrimitiveStyle::with_fill(GRAY);
