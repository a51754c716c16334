use std::fmt;
use std::time::Instant;

use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, PlaybackLimits};
use crate::timer::{word_interval, TimerSlot, TimerStats};
use crate::tokenize;

/// Callback receiving the session's text every time it changes
pub type TextListener = Box<dyn FnMut(&str)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// What a call to [`Session::poll`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No tick was due
    Idle,
    /// Moved on to the word at this index
    Advanced(usize),
    /// Was already on the last word at this index; playback stopped
    Finished(usize),
}

/// Starting speed, zoom and their bounds for a new session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub wpm: u32,
    pub font_scale: f64,
    pub limits: PlaybackLimits,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings::from(&Config::default())
    }
}

impl From<&Config> for SessionSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            wpm: cfg.initial_wpm(),
            font_scale: cfg.initial_font_scale(),
            limits: cfg.limits(),
        }
    }
}

/// Read-only view of everything a renderer needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot<'a> {
    pub words: &'a [String],
    pub current_index: usize,
    pub is_playing: bool,
    pub wpm: u32,
    pub font_scale: f64,
}

impl<'a> Snapshot<'a> {
    pub fn current_word(&self) -> Option<&'a str> {
        self.words.get(self.current_index).map(String::as_str)
    }
}

/// Playback engine for one document.
///
/// Owns the text, the words derived from it, the read position and the one
/// timer that advances that position while playing. Every command is
/// synchronous and accepts any input: out-of-range values are clamped and
/// impossible requests (playing nothing) are ignored.
pub struct Session<C: Clock = SystemClock> {
    raw_text: String,
    words: Vec<String>,
    current_index: usize,
    state: PlayState,
    wpm: u32,
    font_scale: f64,
    limits: PlaybackLimits,
    timer: TimerSlot,
    clock: C,
    // Last text reported to the listener (or handed to us at creation)
    last_synced: String,
    listener: Option<TextListener>,
}

impl Session<SystemClock> {
    pub fn new(initial_text: impl Into<String>, settings: SessionSettings) -> Self {
        Self::with_clock(initial_text, settings, SystemClock)
    }
}

impl<C: Clock> Session<C> {
    /// The initial text counts as already known to the host and is not reported.
    pub fn with_clock(
        initial_text: impl Into<String>,
        settings: SessionSettings,
        clock: C,
    ) -> Self {
        let raw_text = initial_text.into();
        let limits = settings.limits;
        Self {
            words: tokenize::words(&raw_text),
            last_synced: raw_text.clone(),
            raw_text,
            current_index: 0,
            state: PlayState::Stopped,
            wpm: limits.clamp_wpm(i64::from(settings.wpm)),
            font_scale: limits
                .clamp_font_scale(settings.font_scale)
                .unwrap_or(limits.min_font_scale),
            limits,
            timer: TimerSlot::new(),
            clock,
            listener: None,
        }
    }

    /// Registers the callback told about every accepted text change.
    pub fn on_text_change<F>(&mut self, listener: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Replaces the text. Always rewinds to the first word and stops playback.
    pub fn set_text(&mut self, raw: impl Into<String>) {
        let raw = raw.into();
        self.stop("text replaced");
        self.words = tokenize::words(&raw);
        self.current_index = 0;
        self.raw_text = raw;
        debug!(words = self.words.len(), "text set");
        self.report_text();
    }

    pub fn toggle_play(&mut self) {
        let playing = self.is_playing();
        self.set_playing(!playing);
    }

    /// Starting is ignored while there are no words.
    pub fn set_playing(&mut self, playing: bool) {
        if playing {
            self.play();
        } else {
            self.stop("paused");
        }
    }

    /// Host-driven pause, e.g. the document went to the background. Keeps the position.
    pub fn suspend(&mut self) {
        self.stop("suspended");
    }

    /// Jumps to `index`, clamped onto the word list. Play state is unchanged.
    pub fn seek(&mut self, index: i64) {
        let last = self.words.len().saturating_sub(1);
        let target = index.clamp(0, last as i64) as usize;
        self.current_index = target;
        trace!(index = target, "seek");
        if self.is_playing() {
            self.schedule_next();
        }
    }

    /// Moves the position by `delta` words from where it is now.
    pub fn seek_by(&mut self, delta: i64) {
        let current = self.current_index as i64;
        self.seek(current.saturating_add(delta));
    }

    /// Sets words per minute, clamped to the profile's range.
    ///
    /// While playing, the pending tick is rescheduled at the new rate.
    pub fn set_speed(&mut self, wpm: i64) {
        let wpm = self.limits.clamp_wpm(wpm);
        if wpm == self.wpm {
            return;
        }
        self.wpm = wpm;
        debug!(wpm, "speed set");
        if self.is_playing() {
            self.schedule_next();
        }
    }

    /// Sets the display scale, clamped to the profile's range. NaN is ignored.
    pub fn set_zoom(&mut self, scale: f64) {
        if let Some(scale) = self.limits.clamp_font_scale(scale) {
            self.font_scale = scale;
        }
    }

    /// Fires the advancement timer if it is due.
    pub fn poll(&mut self) -> Tick {
        let now = self.clock.now();
        if !self.timer.fire(now) {
            return Tick::Idle;
        }
        if !self.is_playing() {
            return Tick::Idle;
        }

        if self.current_index + 1 < self.words.len() {
            self.current_index += 1;
            self.timer.arm(now, word_interval(self.wpm));
            trace!(index = self.current_index, "tick");
            Tick::Advanced(self.current_index)
        } else {
            self.state = PlayState::Stopped;
            debug!(index = self.current_index, "reached end of text");
            Tick::Finished(self.current_index)
        }
    }

    /// When the pending tick is due, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            words: &self.words,
            current_index: self.current_index,
            is_playing: self.is_playing(),
            wpm: self.wpm,
            font_scale: self.font_scale,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.current_index).map(String::as_str)
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn font_scale(&self) -> f64 {
        self.font_scale
    }

    pub fn limits(&self) -> PlaybackLimits {
        self.limits
    }

    pub fn timer_stats(&self) -> TimerStats {
        self.timer.stats()
    }

    fn play(&mut self) {
        if self.words.is_empty() {
            trace!("play ignored, no words");
            return;
        }
        if self.is_playing() {
            return;
        }
        self.state = PlayState::Playing;
        debug!(index = self.current_index, wpm = self.wpm, "playing");
        self.schedule_next();
    }

    fn stop(&mut self, reason: &str) {
        self.timer.cancel();
        if self.is_playing() {
            self.state = PlayState::Stopped;
            debug!(index = self.current_index, reason, "stopped");
        }
    }

    fn schedule_next(&mut self) {
        let now = self.clock.now();
        self.timer.arm(now, word_interval(self.wpm));
    }

    fn report_text(&mut self) {
        if self.raw_text == self.last_synced {
            return;
        }
        self.last_synced.clone_from(&self.raw_text);
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.raw_text);
        }
    }
}

impl<C: Clock> Drop for Session<C> {
    fn drop(&mut self) {
        self.timer.cancel();
    }
}

impl<C: Clock> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("words", &self.words.len())
            .field("current_index", &self.current_index)
            .field("state", &self.state)
            .field("wpm", &self.wpm)
            .field("font_scale", &self.font_scale)
            .field("next_deadline", &self.timer.deadline())
            .finish_non_exhaustive()
    }
}
