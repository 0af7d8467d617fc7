pub mod font_slider;
pub mod resizable_text;

pub use font_slider::{FontSliderControl, FontSliderOptions, Orientation, SCALE_STEP};
pub use resizable_text::{
    DEFAULT_FONT_SIZE, ResizableText, ResolvedTextSize, TextStyle, resizable_text,
};
