// Visibility-driven playback.
// Plays the hero video while at least `threshold` of it is in view, pauses otherwise.
// See DESIGN.md: Visibility Playback Controller

/// One intersection observation for the video element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionSample {
    pub is_intersecting: bool,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
}

#[derive(Debug, Clone)]
pub struct VisibilityController {
    threshold: f64,
    in_view: bool,
}

impl VisibilityController {
    pub fn new(threshold: f64) -> Self {
        VisibilityController {
            threshold: threshold.clamp(0.0, 1.0),
            in_view: false,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn in_view(&self) -> bool {
        self.in_view
    }

    /// Entering view plays unless the fallback is latched; leaving view pauses.
    pub fn observe(
        &mut self,
        sample: IntersectionSample,
        fallback_shown: bool,
    ) -> Option<PlaybackCommand> {
        self.in_view = sample.is_intersecting && sample.ratio >= self.threshold;

        if self.in_view {
            if fallback_shown {
                None
            } else {
                Some(PlaybackCommand::Play)
            }
        } else {
            Some(PlaybackCommand::Pause)
        }
    }
}
