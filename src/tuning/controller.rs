use serde::{Deserialize, Serialize};

use crate::pipeline::timeout::ClassLabelTimeoutFilter;
use crate::pipeline::{Pipeline, PostProcessing};

pub const COLOR_VARIABILITY_RANGE: (f64, f64) = (1.0, 25.0);
pub const TIMEOUT_MS_RANGE: (i64, i64) = (1, 3000);

/// The four user-facing settings of the colour recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Always predict one of the trained classes (disables null rejection).
    pub always_pick_something: bool,
    /// Null-rejection coefficient; higher is looser.
    pub color_variability: f64,
    /// Install the timeout filter so held poses are re-sent.
    pub send_repeated_predictions: bool,
    /// Timeout filter duration in milliseconds.
    pub timeout_ms: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            always_pick_something: false,
            color_variability: 5.0,
            send_repeated_predictions: false,
            timeout_ms: 100,
        }
    }
}

impl Settings {
    /// The same settings with every tunable value inside its allowed range.
    pub fn clamped(self) -> Self {
        Self {
            color_variability: clamp_color_variability(self.color_variability),
            timeout_ms: clamp_timeout(self.timeout_ms),
            ..self
        }
    }
}

/// Owns the settings and turns each change into exactly one pipeline mutation.
///
/// The post-processing slot must always agree with
/// `send_repeated_predictions`; a disagreement is a bug and panics.
#[derive(Debug, Clone)]
pub struct TuningController {
    settings: Settings,
}

impl TuningController {
    /// Out-of-range values (e.g. from a config file) are clamped so the
    /// pipeline always runs with the values the tuneables report.
    pub fn new(settings: Settings) -> Self {
        let clamped = settings.clamped();
        if clamped != settings {
            log::warn!("Settings {settings:?} out of range; using {clamped:?}");
        }
        Self { settings: clamped }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply the initial settings to a freshly built pipeline.
    pub fn configure(&self, pipeline: &mut Pipeline) {
        let classifier = pipeline.classifier_mut();
        classifier.enable_null_rejection(!self.settings.always_pick_something);
        classifier.set_null_rejection_coeff(self.settings.color_variability);
        classifier.recompute_null_rejection_thresholds();

        if self.settings.send_repeated_predictions {
            self.install_timeout_stage(pipeline);
        }
    }

    pub fn set_always_pick_something(&mut self, pipeline: &mut Pipeline, new_val: bool) {
        self.settings.always_pick_something = new_val;
        pipeline.classifier_mut().enable_null_rejection(!new_val);
        log::debug!("Null rejection {}", if new_val { "disabled" } else { "enabled" });
    }

    pub fn set_color_variability(&mut self, pipeline: &mut Pipeline, new_val: f64) {
        let new_val = clamp_color_variability(new_val);
        self.settings.color_variability = new_val;
        let classifier = pipeline.classifier_mut();
        classifier.set_null_rejection_coeff(new_val);
        if !classifier.recompute_null_rejection_thresholds() {
            log::debug!("Null rejection coefficient {new_val} stored; classifier not trained yet");
        }
    }

    pub fn set_send_repeated_predictions(&mut self, pipeline: &mut Pipeline, new_val: bool) {
        if new_val {
            assert_eq!(
                pipeline.num_post_processing_modules(),
                0,
                "enabling repeated predictions with a post-processing stage already installed"
            );
            assert!(
                !self.settings.send_repeated_predictions,
                "repeated predictions already enabled but no post-processing stage is installed"
            );
            self.install_timeout_stage(pipeline);
        } else {
            assert_eq!(
                pipeline.num_post_processing_modules(),
                1,
                "disabling repeated predictions without an installed post-processing stage"
            );
            assert!(
                self.settings.send_repeated_predictions,
                "repeated predictions not enabled but a post-processing stage is installed"
            );
            if let Err(e) = pipeline.remove_post_processing_module(0) {
                panic!("post-processing slot out of sync with settings: {e}");
            }
        }
        self.settings.send_repeated_predictions = new_val;
        log::debug!("Repeated predictions {}", if new_val { "on" } else { "off" });
    }

    /// Stored even when no stage is installed, so the value can be chosen
    /// before repeated predictions are switched on.
    pub fn set_timeout(&mut self, pipeline: &mut Pipeline, new_val: i64) {
        let new_val = clamp_timeout(new_val);
        self.settings.timeout_ms = new_val;
        match pipeline.post_processing_module_mut(0) {
            Some(PostProcessing::Timeout(filter)) => filter.set_timeout_duration(timeout_millis(new_val)),
            None => {}
        }
    }

    fn install_timeout_stage(&self, pipeline: &mut Pipeline) {
        let stage = PostProcessing::Timeout(ClassLabelTimeoutFilter::new(timeout_millis(
            self.settings.timeout_ms,
        )));
        if let Err(e) = pipeline.add_post_processing_module(stage) {
            panic!("post-processing slot out of sync with settings: {e}");
        }
    }
}

fn clamp_color_variability(v: f64) -> f64 {
    v.clamp(COLOR_VARIABILITY_RANGE.0, COLOR_VARIABILITY_RANGE.1)
}

fn clamp_timeout(ms: i64) -> i64 {
    ms.clamp(TIMEOUT_MS_RANGE.0, TIMEOUT_MS_RANGE.1)
}

fn timeout_millis(ms: i64) -> u64 {
    clamp_timeout(ms) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::pipeline::classifier::tests::two_colour_set;
    use crate::pipeline::classifier::NaiveBayes;

    fn pipeline() -> Pipeline {
        Pipeline::new(Box::new(NaiveBayes::default()))
    }

    fn timeout_of(p: &Pipeline) -> Option<Duration> {
        match p.post_processing_module(0) {
            Some(PostProcessing::Timeout(f)) => Some(f.timeout_duration()),
            None => None,
        }
    }

    #[test]
    fn always_pick_something_inverts_null_rejection() {
        let mut p = pipeline();
        let mut c = TuningController::new(Settings::default());
        c.configure(&mut p);
        assert!(p.classifier().null_rejection_enabled());

        c.set_always_pick_something(&mut p, true);
        assert!(!p.classifier().null_rejection_enabled());
        c.set_always_pick_something(&mut p, false);
        assert!(p.classifier().null_rejection_enabled());
    }

    #[test]
    fn color_variability_sets_coeff_and_recomputes_thresholds() {
        let mut p = pipeline();
        p.train(&two_colour_set()).unwrap();
        let mut c = TuningController::new(Settings::default());
        c.configure(&mut p);
        let before = p.classifier().null_rejection_thresholds();

        c.set_color_variability(&mut p, 10.0);

        assert_eq!(p.classifier().null_rejection_coeff(), 10.0);
        let after = p.classifier().null_rejection_thresholds();
        assert_eq!(after.len(), before.len());
        assert!(after.iter().zip(&before).all(|(a, b)| a != b));
    }

    #[test]
    fn color_variability_before_training_is_stored() {
        let mut p = pipeline();
        let mut c = TuningController::new(Settings::default());
        c.set_color_variability(&mut p, 12.5);
        assert_eq!(p.classifier().null_rejection_coeff(), 12.5);
        assert_eq!(c.settings().color_variability, 12.5);
    }

    #[test]
    fn repeated_predictions_installs_and_removes_stage() {
        let mut p = pipeline();
        let mut c = TuningController::new(Settings::default());

        c.set_send_repeated_predictions(&mut p, true);
        assert_eq!(p.num_post_processing_modules(), 1);
        c.set_send_repeated_predictions(&mut p, false);
        assert_eq!(p.num_post_processing_modules(), 0);
    }

    #[test]
    #[should_panic(expected = "already installed")]
    fn enabling_twice_panics() {
        let mut p = pipeline();
        p.add_post_processing_module(PostProcessing::Timeout(ClassLabelTimeoutFilter::new(100)))
            .unwrap();
        let mut c = TuningController::new(Settings::default());
        c.set_send_repeated_predictions(&mut p, true);
    }

    #[test]
    #[should_panic(expected = "without an installed")]
    fn disabling_without_stage_panics() {
        let mut p = pipeline();
        let mut c = TuningController::new(Settings::default());
        c.set_send_repeated_predictions(&mut p, false);
    }

    #[test]
    #[should_panic(expected = "not enabled but a post-processing stage")]
    fn disabling_with_foreign_stage_panics() {
        let mut p = pipeline();
        p.add_post_processing_module(PostProcessing::Timeout(ClassLabelTimeoutFilter::new(100)))
            .unwrap();
        let mut c = TuningController::new(Settings::default());
        c.set_send_repeated_predictions(&mut p, false);
    }

    #[test]
    #[should_panic(expected = "already enabled but no post-processing stage")]
    fn enabling_when_flag_says_enabled_panics() {
        let mut p = pipeline();
        // Never configured, so the slot is empty while the flag is set.
        let mut c = TuningController::new(Settings {
            send_repeated_predictions: true,
            ..Settings::default()
        });
        c.set_send_repeated_predictions(&mut p, true);
    }

    #[test]
    fn out_of_range_startup_settings_are_clamped() {
        let mut p = pipeline();
        let c = TuningController::new(Settings {
            color_variability: 100.0,
            send_repeated_predictions: true,
            timeout_ms: 0,
            ..Settings::default()
        });
        assert_eq!(c.settings().color_variability, 25.0);
        assert_eq!(c.settings().timeout_ms, 1);

        c.configure(&mut p);
        assert_eq!(p.classifier().null_rejection_coeff(), 25.0);
        assert_eq!(timeout_of(&p), Some(Duration::from_millis(1)));
    }

    #[test]
    fn out_of_range_updates_are_clamped() {
        let mut p = pipeline();
        let mut c = TuningController::new(Settings::default());
        c.set_color_variability(&mut p, 0.1);
        c.set_timeout(&mut p, 9000);
        assert_eq!(p.classifier().null_rejection_coeff(), 1.0);
        assert_eq!(c.settings().timeout_ms, 3000);
    }

    #[test]
    fn timeout_without_stage_is_stored_for_later() {
        let mut p = pipeline();
        let mut c = TuningController::new(Settings::default());

        c.set_timeout(&mut p, 750);
        assert_eq!(p.num_post_processing_modules(), 0);
        assert_eq!(c.settings().timeout_ms, 750);

        c.set_send_repeated_predictions(&mut p, true);
        assert_eq!(timeout_of(&p), Some(Duration::from_millis(750)));
    }

    #[test]
    fn timeout_updates_installed_stage_in_place() {
        let mut p = pipeline();
        let mut c = TuningController::new(Settings::default());
        c.set_send_repeated_predictions(&mut p, true);
        assert_eq!(timeout_of(&p), Some(Duration::from_millis(100)));

        c.set_timeout(&mut p, 2500);
        assert_eq!(p.num_post_processing_modules(), 1);
        assert_eq!(timeout_of(&p), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn configure_installs_stage_when_enabled_at_startup() {
        let mut p = pipeline();
        let c = TuningController::new(Settings {
            always_pick_something: true,
            send_repeated_predictions: true,
            timeout_ms: 300,
            ..Settings::default()
        });
        c.configure(&mut p);
        assert!(!p.classifier().null_rejection_enabled());
        assert_eq!(timeout_of(&p), Some(Duration::from_millis(300)));
    }
}
