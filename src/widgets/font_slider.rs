//! Interaction model for a font size slider bound to a [`ScaleState`].
//!
//! The control does no drawing. A host UI renders the track, labels and
//! reset button from the values here and forwards user input to
//! [`FontSliderControl::on_value_change`] and [`FontSliderControl::on_reset`].

use crate::scale::ScaleState;

/// Distance between slider stops, in scale units.
pub const SCALE_STEP: f32 = 0.1;

/// Layout of the slider and its labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSliderOptions {
    pub orientation: Orientation,
    pub show_percentage: bool,
    pub show_min_max_labels: bool,
    pub show_reset_button: bool,
    pub reset_button_text: String,
}

impl Default for FontSliderOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            show_percentage: true,
            show_min_max_labels: true,
            show_reset_button: true,
            reset_button_text: "Reset Size".to_string(),
        }
    }
}

/// A slider over the range of a [`ScaleState`].
pub struct FontSliderControl<'a> {
    state: &'a ScaleState,
    options: FontSliderOptions,
}

impl<'a> FontSliderControl<'a> {
    pub fn new(state: &'a ScaleState) -> Self {
        Self::with_options(state, FontSliderOptions::default())
    }

    pub fn with_options(state: &'a ScaleState, options: FontSliderOptions) -> Self {
        Self { state, options }
    }

    pub fn options(&self) -> &FontSliderOptions {
        &self.options
    }

    pub fn orientation(&self) -> Orientation {
        self.options.orientation
    }

    /// Number of intermediate stops between min and max.
    pub fn steps(&self) -> u32 {
        // Tolerance keeps exact multiples of the step from truncating down
        let intervals = (self.state.bounds().span() / SCALE_STEP + 1e-3).floor() as i64;
        (intervals - 1).max(0) as u32
    }

    /// Nearest stop to `raw`, counting both ends of the track. A range too
    /// narrow for any intermediate stop is continuous, so `raw` is only
    /// clamped.
    pub fn snap(&self, raw: f32) -> f32 {
        let bounds = self.state.bounds();
        let raw = bounds.clamp(raw);
        if self.steps() == 0 {
            return raw;
        }
        let intervals = (self.steps() + 1) as f32;
        let position = ((raw - bounds.min()) / bounds.span() * intervals).round();
        bounds.clamp(bounds.min() + position * bounds.span() / intervals)
    }

    pub fn on_value_change(&self, raw: f32) {
        self.state.update(self.snap(raw));
    }

    pub fn on_reset(&self) {
        self.state.reset();
    }

    /// Position of the current value along the track, from 0 (min) to 1 (max).
    pub fn fraction(&self) -> f32 {
        let bounds = self.state.bounds();
        ((self.state.current_value() - bounds.min()) / bounds.span()).clamp(0.0, 1.0)
    }

    pub fn percentage_label(&self) -> Option<String> {
        self.options
            .show_percentage
            .then(|| format!("Font Size: {}%", percent(self.state.current_value())))
    }

    /// `(min, max)` labels for the track ends.
    pub fn min_max_labels(&self) -> Option<(String, String)> {
        self.options.show_min_max_labels.then(|| {
            (
                format!("{}%", percent(self.state.min_value())),
                format!("{}%", percent(self.state.max_value())),
            )
        })
    }

    pub fn reset_label(&self) -> Option<&str> {
        self.options
            .show_reset_button
            .then_some(self.options.reset_button_text.as_str())
    }
}

fn percent(scale: f32) -> i32 {
    (scale * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::MemoryStore;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[tokio::test]
    async fn steps_follow_range() {
        let state = ScaleState::new(0.5, 2.0, 1.0, MemoryStore::new()).unwrap();
        assert_eq!(FontSliderControl::new(&state).steps(), 14);

        let state = ScaleState::new(0.7, 1.5, 1.0, MemoryStore::new()).unwrap();
        assert_eq!(FontSliderControl::new(&state).steps(), 7);

        let state = ScaleState::new(1.0, 1.05, 1.0, MemoryStore::new()).unwrap();
        assert_eq!(FontSliderControl::new(&state).steps(), 0);
    }

    #[tokio::test]
    async fn snaps_to_nearest_stop() {
        let state = ScaleState::new(0.5, 2.0, 1.0, MemoryStore::new()).unwrap();
        let slider = FontSliderControl::new(&state);

        assert!(approx(slider.snap(1.23), 1.2));
        assert!(approx(slider.snap(1.27), 1.3));
        assert!(approx(slider.snap(0.0), 0.5));
        assert!(approx(slider.snap(9.0), 2.0));
    }

    #[tokio::test]
    async fn narrow_range_is_continuous() {
        let state = ScaleState::new(0.5, 0.6, 0.5, MemoryStore::new()).unwrap();
        let slider = FontSliderControl::new(&state);
        assert_eq!(slider.steps(), 0);

        slider.on_value_change(0.55);
        assert_eq!(state.current_value(), 0.55);
        slider.on_value_change(0.52);
        assert_eq!(state.current_value(), 0.52);
        slider.on_value_change(0.9);
        assert_eq!(state.current_value(), 0.6);
    }

    #[tokio::test]
    async fn value_change_updates_state() {
        let state = ScaleState::new(0.5, 2.0, 1.0, MemoryStore::new()).unwrap();
        let slider = FontSliderControl::new(&state);

        slider.on_value_change(1.46);
        assert!(approx(state.current_value(), 1.5));
        assert!(approx(slider.fraction(), 2.0 / 3.0));

        slider.on_reset();
        assert_eq!(state.current_value(), 1.0);
    }

    #[tokio::test]
    async fn labels() {
        let state = ScaleState::new(0.7, 1.5, 1.1, MemoryStore::with_value(1.1)).unwrap();
        let slider = FontSliderControl::new(&state);

        assert_eq!(slider.percentage_label().as_deref(), Some("Font Size: 110%"));
        assert_eq!(
            slider.min_max_labels(),
            Some(("70%".to_string(), "150%".to_string()))
        );
        assert_eq!(slider.reset_label(), Some("Reset Size"));
        assert_eq!(slider.orientation(), Orientation::Vertical);
    }

    #[tokio::test]
    async fn hidden_labels() {
        let state = ScaleState::new(0.5, 2.0, 1.0, MemoryStore::new()).unwrap();
        let slider = FontSliderControl::with_options(
            &state,
            FontSliderOptions {
                orientation: Orientation::Horizontal,
                show_percentage: false,
                show_min_max_labels: false,
                show_reset_button: false,
                ..FontSliderOptions::default()
            },
        );

        assert_eq!(slider.percentage_label(), None);
        assert_eq!(slider.min_max_labels(), None);
        assert_eq!(slider.reset_label(), None);
        assert_eq!(slider.orientation(), Orientation::Horizontal);
    }
}
