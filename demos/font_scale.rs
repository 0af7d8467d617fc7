//! Example driving a persisted font scale from the command line.
//!
//! This example shows:
//! - Opening the preferences file in the platform config directory
//! - Moving the scale through the slider model, or resetting it
//! - Resolving text sizes under the ambient font scale
//!
//! Run with `cargo run --example font_scale -- 1.3` or `-- reset`.

use std::env;
use std::error::Error;

use font_resizify::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let store = FileStore::open_default("font-resizify-demo")?;
    println!("Preferences: {}", store.path().display());

    let state = ScaleState::new(0.7, 1.5, 1.0, store)?;
    let mut errors = state.subscribe_errors();

    // Let the stored value arrive before editing it
    state.flush().await;

    let slider = FontSliderControl::new(&state);
    match env::args().nth(1).as_deref() {
        Some("reset") => slider.on_reset(),
        Some(raw) => slider.on_value_change(raw.parse()?),
        None => {}
    }

    if let Some(label) = slider.percentage_label() {
        println!("{label}");
    }
    if let Some((min, max)) = slider.min_max_labels() {
        println!("Range: {min} .. {max} ({} steps)", slider.steps());
    }

    let effect_state = state.signal();
    let _effect = create_effect(move || {
        println!("Scale is now {:.2}", effect_state.get());
    });

    provide_font_scale(&state, || {
        let title = resizable_text("Title").font_size(24.0).font_slider(true);
        let body = resizable_text("Body")
            .style(TextStyle::new().line_height(20.0))
            .font_slider(true);
        let caption = resizable_text("Fixed caption").font_size(11.0);

        for text in [&title, &body, &caption] {
            let size = text.resolve_ambient();
            match size.line_height {
                Some(line_height) => println!(
                    "{:>14}: {:.1}px / {:.1}px",
                    text.content(),
                    size.font_size,
                    line_height
                ),
                None => println!("{:>14}: {:.1}px", text.content(), size.font_size),
            }
        }
    });

    state.flush().await;
    while let Ok(err) = errors.try_recv() {
        eprintln!("Error: {err}");
    }
    state.dispose();

    Ok(())
}
