//! User-adjustable parameters of the colour recognizer.
//!
//! `controller` owns the settings and maps each change onto the pipeline;
//! `registry` is the host-facing list the UI renders and writes through.

pub mod controller;
pub mod registry;

pub use controller::{COLOR_VARIABILITY_RANGE, Settings, TIMEOUT_MS_RANGE, TuningController};
pub use registry::{TuneableValue, Tuneables};

use crate::session::Session;

pub const ALWAYS_PICK_SOMETHING: &str = "Always Pick Something";
pub const COLOR_VARIABILITY: &str = "Color Variability";
pub const SEND_REPEATED_PREDICTIONS: &str = "Send Repeated Predictions";
pub const TIMEOUT: &str = "Timeout";

/// Register the four colour-sensor tuneables, seeded from the session's
/// current settings.
pub fn register_color_sensor_tuneables(tuneables: &mut Tuneables<Session>, settings: &Settings) {
    tuneables.register_bool(
        settings.always_pick_something,
        ALWAYS_PICK_SOMETHING,
        "Whether to always pick (predict) one of the classes of training data, \
         even if it's not a very good match. If selected, 'Color Variability' \
         will not be used.",
        |s: &mut Session, v| s.set_always_pick_something(v),
    );
    tuneables.register_float(
        settings.color_variability,
        COLOR_VARIABILITY_RANGE.0,
        COLOR_VARIABILITY_RANGE.1,
        COLOR_VARIABILITY,
        "How different from the training data a new color reading can be and \
         still be considered the same color. The higher the number, the more \
         different it can be.",
        |s: &mut Session, v| s.set_color_variability(v),
    );
    tuneables.register_bool(
        settings.send_repeated_predictions,
        SEND_REPEATED_PREDICTIONS,
        "Whether to send repeated predictions while a pose is being held. If \
         not selected, predictions will only be sent on transition from one \
         pose to another.",
        |s: &mut Session, v| s.set_send_repeated_predictions(v),
    );
    tuneables.register_int(
        settings.timeout_ms,
        TIMEOUT_MS_RANGE.0,
        TIMEOUT_MS_RANGE.1,
        TIMEOUT,
        "How long (in milliseconds) to wait after recognizing a class before \
         recognizing a different one. Only used if 'Send Repeated Predictions' \
         is selected.",
        |s: &mut Session, v| s.set_timeout(v),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorConfig;

    fn setup() -> (Tuneables<Session>, Session) {
        let session = Session::new(&SensorConfig::default(), Settings::default());
        let mut tuneables = Tuneables::new();
        register_color_sensor_tuneables(&mut tuneables, session.settings());
        (tuneables, session)
    }

    #[test]
    fn registers_four_tuneables_with_bounds() {
        let (t, _) = setup();
        assert_eq!(t.len(), 4);
        let cv = t.get(t.position(COLOR_VARIABILITY).unwrap()).unwrap();
        assert_eq!(
            cv.bounds(),
            Some((TuneableValue::Float(1.0), TuneableValue::Float(25.0)))
        );
        let timeout = t.get(t.position(TIMEOUT).unwrap()).unwrap();
        assert_eq!(timeout.value(), TuneableValue::Int(100));
    }

    #[test]
    fn registry_changes_flow_into_the_pipeline() {
        let (mut t, mut session) = setup();

        let idx = t.position(SEND_REPEATED_PREDICTIONS).unwrap();
        t.set(idx, TuneableValue::Bool(true), &mut session).unwrap();
        assert_eq!(session.pipeline().num_post_processing_modules(), 1);
        assert!(session.settings().send_repeated_predictions);

        // Re-sending the current value is not a change and must not re-install.
        t.set(idx, TuneableValue::Bool(true), &mut session).unwrap();
        assert_eq!(session.pipeline().num_post_processing_modules(), 1);

        let idx = t.position(ALWAYS_PICK_SOMETHING).unwrap();
        t.set(idx, TuneableValue::Bool(true), &mut session).unwrap();
        assert!(!session.pipeline().classifier().null_rejection_enabled());

        let idx = t.position(TIMEOUT).unwrap();
        t.set(idx, TuneableValue::Int(5000), &mut session).unwrap();
        assert_eq!(session.settings().timeout_ms, 3000);
    }
}
