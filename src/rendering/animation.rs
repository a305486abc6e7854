//! Animation clips and the per-node playback controller.
//!
//! Only the clock side of playback lives here: which clip is bound, where its
//! cursor is and how it loops. Evaluating joint poses is the renderer's job.

/// Keyframe times for one animated target (usually a joint).
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationChannel {
    pub target: String,
    pub sample_times: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<AnimationChannel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
            channels: Vec::new(),
        }
    }

    /// Build a clip whose duration is the last keyframe across all channels
    pub fn from_channels(name: impl Into<String>, channels: Vec<AnimationChannel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|channel| channel.sample_times.last().copied())
            .fold(0.0_f32, f32::max);

        Self {
            name: name.into(),
            duration,
            channels,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Play to the end and stop there
    Once,
    Repeat,
    /// Play forward, then backward, forever
    PingPong,
}

/// A clip bound to a mixer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationAction {
    clip_index: usize,
    duration: f32,
    pub time_scale: f32,
    pub loop_mode: LoopMode,
    elapsed: f32,
    playing: bool,
}

impl AnimationAction {
    fn new(clip_index: usize, clip: &AnimationClip) -> Self {
        Self {
            clip_index,
            duration: clip.duration,
            time_scale: 1.0,
            loop_mode: LoopMode::Repeat,
            elapsed: 0.0,
            playing: false,
        }
    }

    pub fn clip_index(&self) -> usize {
        self.clip_index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Scaled time since the action was last rewound
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Cursor position inside the clip, after looping is applied
    pub fn clip_time(&self) -> f32 {
        let d = self.duration;
        if d <= 0.0 {
            return 0.0;
        }
        match self.loop_mode {
            LoopMode::Once => self.elapsed.clamp(0.0, d),
            LoopMode::Repeat => self.elapsed.rem_euclid(d),
            LoopMode::PingPong => {
                let t = self.elapsed.rem_euclid(2.0 * d);
                if t <= d { t } else { 2.0 * d - t }
            }
        }
    }

    fn rewind(&mut self) {
        self.elapsed = 0.0;
    }

    fn advance(&mut self, delta: f32) {
        if !self.playing {
            return;
        }
        self.elapsed += delta * self.time_scale;
        if self.loop_mode == LoopMode::Once && self.elapsed >= self.duration {
            self.elapsed = self.duration;
            self.playing = false;
        }
    }
}

/// Per-node playback controller, created the first time a clip is bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationMixer {
    time: f32,
    action: Option<AnimationAction>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global mixer clock
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn action(&self) -> Option<&AnimationAction> {
        self.action.as_ref()
    }

    pub fn action_mut(&mut self) -> Option<&mut AnimationAction> {
        self.action.as_mut()
    }

    /// Bind `clip` as the current action. Rebinding the same clip keeps the
    /// existing action and its settings.
    pub fn clip_action(&mut self, clip_index: usize, clip: &AnimationClip) -> &mut AnimationAction {
        let rebind = self
            .action
            .as_ref()
            .map_or(true, |action| action.clip_index != clip_index);
        if rebind {
            self.action = Some(AnimationAction::new(clip_index, clip));
        }
        self.action.get_or_insert_with(|| AnimationAction::new(clip_index, clip))
    }

    pub fn update(&mut self, delta: f32) {
        self.time += delta;
        if let Some(action) = self.action.as_mut() {
            action.advance(delta);
        }
    }

    /// Rewind every clock to zero, then advance to `time`
    pub fn set_time(&mut self, time: f32) {
        self.time = 0.0;
        if let Some(action) = self.action.as_mut() {
            action.rewind();
        }
        self.update(time);
    }
}
