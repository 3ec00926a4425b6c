use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SpeechError;
use crate::feedback::{Announcer, Feedback};
use crate::line::{DialogLine, ListenPhase, LineStatus};
use crate::matcher::match_words;
use crate::scheduler::{Clock, Scheduler, SystemClock};
use crate::session::{SessionConfig, SessionSnapshot};
use crate::speech::{SpeechEvent, SpeechStream};
use crate::stats::{SessionStats, SessionSummary};
use crate::transcript::TranscriptBuffer;

/// Work deferred to a later tick. Each task is bound to a cancellation
/// token and re-reads the session state when it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deferred {
    BeginListening,
    RetryStart,
    InactivityPoll,
    AdvanceLine,
    GameOver,
}

/// Drives a dialogue practice session: listens to one line at a time,
/// scores spoken words against it and advances through the script.
///
/// All mutation happens on the caller's thread through the control methods,
/// [`Rehearsal::handle_speech_event`] and [`Rehearsal::on_tick`].
pub struct Rehearsal<S: SpeechStream, A: Announcer, C: Clock = SystemClock> {
    title: String,
    lines: Vec<DialogLine>,
    /// Authoritative line pointer, read at execution time by every deferred task
    current_line: usize,
    stats: SessionStats,
    transcript: TranscriptBuffer,
    phase: ListenPhase,
    feedback: Option<Feedback>,
    celebration_shown: bool,
    finalized: bool,
    start_retried: bool,
    last_stop_at: Option<Instant>,
    speech_supported: bool,
    speech: S,
    announcer: A,
    clock: C,
    config: SessionConfig,
    scheduler: Scheduler<Deferred>,
    /// Cancelled on teardown; parent of the other two tokens
    session_token: CancellationToken,
    /// One listening attempt: start guard, start retry and inactivity polls
    attempt_token: CancellationToken,
    /// The current line position: the pending celebration advance
    line_token: CancellationToken,
}

impl<S: SpeechStream, A: Announcer> Rehearsal<S, A, SystemClock> {
    pub fn new(lines: Vec<DialogLine>, speech: S, announcer: A) -> Self {
        Self::with_clock(lines, speech, announcer, SystemClock, SessionConfig::default())
    }
}

impl<S: SpeechStream, A: Announcer, C: Clock> Rehearsal<S, A, C> {
    pub fn with_clock(
        lines: Vec<DialogLine>,
        speech: S,
        announcer: A,
        clock: C,
        config: SessionConfig,
    ) -> Self {
        let speech_supported = speech.is_available();
        if !speech_supported {
            warn!("speech recognition is unavailable, listening is disabled");
        }

        let session_token = CancellationToken::new();
        let attempt_token = session_token.child_token();
        let line_token = session_token.child_token();
        let stats = SessionStats::new(&lines);
        debug!(
            lines = lines.len(),
            total_words = stats.total_words(),
            "practice session loaded"
        );

        Self {
            title: String::new(),
            lines,
            current_line: 0,
            stats,
            transcript: TranscriptBuffer::new(),
            phase: ListenPhase::Idle,
            feedback: None,
            celebration_shown: false,
            finalized: false,
            start_retried: false,
            last_stop_at: None,
            speech_supported,
            speech,
            announcer,
            clock,
            config,
            scheduler: Scheduler::new(),
            session_token,
            attempt_token,
            line_token,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    // ---- control surface ----

    /// Begins a new listening attempt on the current line. No-op when speech
    /// is unsupported, the session is over or the line is celebrating.
    pub fn start_listening(&mut self) {
        if !self.is_alive() {
            debug!("start_listening after teardown ignored");
            return;
        }
        if !self.speech_supported {
            debug!("start_listening ignored, speech recognition unavailable");
            return;
        }
        if self.stats.is_game_over() || self.phase == ListenPhase::Celebrating {
            return;
        }
        if self.current_line().is_none() {
            return;
        }

        // halting cancels the outgoing attempt, so it must precede the new token
        if self.speech.is_active() {
            self.halt_speech();
        }
        self.attempt_token.cancel();
        self.attempt_token = self.session_token.child_token();

        if let Some(line) = self.lines.get_mut(self.current_line) {
            line.reset_words();
        }
        self.transcript.clear();
        self.celebration_shown = false;
        self.finalized = false;
        self.start_retried = false;
        self.feedback = None;

        self.phase = ListenPhase::Starting;
        let now = self.clock.now();
        match self
            .last_stop_at
            .map(|stopped| stopped + self.config.start_guard)
            .filter(|ready| *ready > now)
        {
            Some(ready) => {
                debug!("waiting out start guard before listening");
                self.scheduler
                    .schedule(ready, Deferred::BeginListening, &self.attempt_token);
            }
            None => self.begin_listening(),
        }
    }

    /// Stops listening and scores the attempt if recognized text is pending.
    /// Safe to call repeatedly.
    pub fn stop_listening(&mut self) {
        if !self.is_alive() {
            debug!("stop_listening after teardown ignored");
            return;
        }

        match self.phase {
            ListenPhase::Listening => {
                self.halt_speech_keeping_text();
                self.finish_attempt();
            }
            ListenPhase::Starting => {
                self.attempt_token.cancel();
                self.phase = ListenPhase::Idle;
            }
            ListenPhase::Idle | ListenPhase::Celebrating => {}
        }

        self.check_game_over_after_stop();
    }

    /// Skips to the next line regardless of how the current one went. On the
    /// last line this schedules game over instead.
    pub fn move_to_next_line(&mut self) {
        if !self.is_alive() || self.lines.is_empty() {
            return;
        }

        self.halt_speech();
        let next = self.current_line + 1;
        if next < self.lines.len() {
            info!(line = next, "skipping to next line");
            self.go_to_line(next);
        } else {
            info!("skipped past the last line");
            self.go_to_line(self.current_line);
            self.request_game_over();
        }
    }

    pub fn set_current_line_index(&mut self, index: usize) {
        if !self.is_alive() {
            return;
        }
        if index >= self.lines.len() {
            warn!(index, lines = self.lines.len(), "line index out of range");
            return;
        }

        self.halt_speech();
        self.go_to_line(index);
    }

    /// Discards all progress and starts again from the first line.
    pub fn replay(&mut self) {
        if !self.is_alive() {
            return;
        }

        self.halt_speech();
        self.scheduler.clear();
        for line in &mut self.lines {
            line.reset_words();
            line.status = LineStatus::Pending;
            line.score = 0.0;
        }
        self.stats = SessionStats::new(&self.lines);
        self.last_stop_at = None;
        self.go_to_line(0);
        info!("session replayed from the start");
    }

    /// Ends the session. Pending timers and late speech events are dropped.
    pub fn teardown(&mut self) {
        if !self.is_alive() {
            return;
        }
        self.halt_speech();
        self.session_token.cancel();
        self.scheduler.clear();
        self.phase = ListenPhase::Idle;
        debug!("practice session torn down");
    }

    /// Applies one event from the recognizer.
    pub fn handle_speech_event(&mut self, event: SpeechEvent) {
        if !self.is_alive() {
            debug!(?event, "speech event after teardown dropped");
            return;
        }

        match event {
            SpeechEvent::Interim(_) | SpeechEvent::Final(_) => {
                if self.phase != ListenPhase::Listening {
                    debug!(phase = %self.phase, "speech outside listening ignored");
                    return;
                }
                let now = self.clock.now();
                self.transcript.ingest(&event, now);
                self.evaluate_realtime();
            }
            SpeechEvent::Ended => {
                if self.phase == ListenPhase::Listening {
                    info!("recognizer ended on its own");
                    self.last_stop_at = Some(self.clock.now());
                    self.finish_attempt();
                    self.check_game_over_after_stop();
                }
            }
            SpeechEvent::Errored(message) => {
                warn!(%message, "speech recognition error");
                if matches!(self.phase, ListenPhase::Listening | ListenPhase::Starting) {
                    self.halt_speech();
                    self.phase = ListenPhase::Idle;
                }
            }
        }
    }

    /// Drains recognizer events and runs every deferred task that is due.
    pub fn on_tick(&mut self) {
        if !self.is_alive() {
            return;
        }

        while let Some(event) = self.speech.poll_event() {
            self.handle_speech_event(event);
        }

        let now = self.clock.now();
        for task in self.scheduler.take_due(now) {
            if !self.is_alive() {
                break;
            }
            self.run_deferred(task);
        }
    }

    // ---- read-only state ----

    pub fn is_alive(&self) -> bool {
        !self.session_token.is_cancelled()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn lines(&self) -> &[DialogLine] {
        &self.lines
    }

    pub fn current_line_index(&self) -> usize {
        self.current_line
    }

    pub fn current_line(&self) -> Option<&DialogLine> {
        self.lines.get(self.current_line)
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn phase(&self) -> ListenPhase {
        self.phase
    }

    pub fn is_listening(&self) -> bool {
        self.phase == ListenPhase::Listening
    }

    /// Busy with something other than listening: waiting to start or
    /// celebrating before the advance.
    pub fn is_processing(&self) -> bool {
        matches!(self.phase, ListenPhase::Starting | ListenPhase::Celebrating)
    }

    pub fn is_game_over(&self) -> bool {
        self.stats.is_game_over()
    }

    pub fn are_all_lines_completed(&self) -> bool {
        self.stats.are_all_lines_completed()
    }

    pub fn speech_supported(&self) -> bool {
        self.speech_supported
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn current_transcript(&self) -> &str {
        self.transcript.current()
    }

    pub fn transcript(&self) -> &TranscriptBuffer {
        &self.transcript
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn speech(&self) -> &S {
        &self.speech
    }

    pub fn speech_mut(&mut self) -> &mut S {
        &mut self.speech
    }

    pub fn announcer(&self) -> &A {
        &self.announcer
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_line_index: self.current_line,
            total_lines: self.lines.len(),
            current_transcript: self.transcript.current().to_string(),
            phase: self.phase,
            is_listening: self.is_listening(),
            is_processing: self.is_processing(),
            speech_supported: self.speech_supported,
            feedback: self.feedback.clone(),
            missed_words_count: self.stats.missed_words().len(),
            correct_words_count: self.stats.correct_words_count(),
            accuracy: self.stats.accuracy(),
            total_words: self.stats.total_words(),
            completed_lines: self.stats.completed_lines().clone(),
            game_over: self.stats.is_game_over(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        self.stats.summary(&self.title, &self.lines)
    }

    // ---- internals ----

    fn run_deferred(&mut self, task: Deferred) {
        match task {
            Deferred::BeginListening | Deferred::RetryStart => self.begin_listening(),
            Deferred::InactivityPoll => self.poll_inactivity(),
            Deferred::AdvanceLine => self.advance_after_celebration(),
            Deferred::GameOver => {
                self.halt_speech();
                self.phase = ListenPhase::Idle;
                self.stats.declare_game_over();
                info!(
                    accuracy = self.stats.accuracy(),
                    missed = self.stats.missed_words().len(),
                    "game over"
                );
            }
        }
    }

    fn begin_listening(&mut self) {
        if self.phase != ListenPhase::Starting {
            return;
        }

        let now = self.clock.now();
        match self.speech.start(&self.config.recognition) {
            Ok(()) => {
                self.phase = ListenPhase::Listening;
                self.transcript.touch(now);
                self.scheduler.schedule(
                    self.config.inactivity.next_poll(now),
                    Deferred::InactivityPoll,
                    &self.attempt_token,
                );
                info!(line = self.current_line, "listening");
            }
            Err(SpeechError::Unsupported) => {
                warn!("speech recognition unsupported, listening disabled");
                self.speech_supported = false;
                self.phase = ListenPhase::Idle;
            }
            Err(err) if !self.start_retried => {
                warn!(%err, "failed to start speech recognition, retrying once");
                self.start_retried = true;
                self.scheduler.schedule(
                    now + self.config.start_guard,
                    Deferred::RetryStart,
                    &self.attempt_token,
                );
            }
            Err(err) => {
                warn!(%err, "failed to start speech recognition");
                self.attempt_token.cancel();
                self.phase = ListenPhase::Idle;
            }
        }
    }

    fn poll_inactivity(&mut self) {
        if self.phase != ListenPhase::Listening || self.finalized || self.celebration_shown {
            return;
        }

        let now = self.clock.now();
        if self
            .config
            .inactivity
            .is_inactive(now, self.transcript.last_activity())
        {
            info!(
                silence = ?self.config.inactivity.silence(now, self.transcript.last_activity()),
                "no speech detected, finalizing"
            );
            self.halt_speech_keeping_text();
            self.finalize();
        } else {
            self.scheduler.schedule(
                self.config.inactivity.next_poll(now),
                Deferred::InactivityPoll,
                &self.attempt_token,
            );
        }
    }

    /// Real-time pass over the current transcript; passes the line the first
    /// time every word is matched.
    fn evaluate_realtime(&mut self) {
        if self.phase != ListenPhase::Listening || self.celebration_shown || self.finalized {
            return;
        }
        let index = self.current_line;
        let Some(line) = self.lines.get_mut(index) else {
            return;
        };

        let result = match_words(&line.words, self.transcript.current());
        line.apply(&result);
        if !result.all_words_correct {
            return;
        }

        self.celebration_shown = true;
        line.mark_completed();
        line.score = 100.0;
        self.stats.record_completed(index);
        info!(line = index, "all words matched");

        self.attempt_token.cancel();
        if self.speech.is_active() {
            if let Err(err) = self.speech.stop() {
                debug!(%err, "stopping recognizer after match");
            }
            self.last_stop_at = Some(self.clock.now());
        }
        self.celebrate();
    }

    /// Ends the listening attempt after the recognizer stopped, scoring it
    /// when there is confirmed text to score.
    fn finish_attempt(&mut self) {
        self.attempt_token.cancel();
        if !self.celebration_shown
            && !self.finalized
            && !self.transcript.final_transcript().is_empty()
        {
            self.finalize();
        } else if self.phase == ListenPhase::Listening {
            self.phase = ListenPhase::Idle;
        }
    }

    /// Authoritative scoring of the attempt against the final transcript.
    /// Runs at most once per attempt.
    fn finalize(&mut self) {
        if self.finalized || self.celebration_shown {
            return;
        }
        self.finalized = true;
        self.attempt_token.cancel();

        let index = self.current_line;
        let Some(line) = self.lines.get_mut(index) else {
            self.phase = ListenPhase::Idle;
            return;
        };

        let result = match_words(&line.words, self.transcript.final_transcript());
        line.apply(&result);
        let percentage = result.match_percentage();
        line.score = percentage;

        if percentage >= self.config.pass_threshold {
            line.mark_completed();
            self.stats.record_completed(index);
            info!(line = index, percentage, "line passed");
            self.celebrate();
        } else {
            let missed = result.incorrect_needles();
            let added = self.stats.record_missed(missed.iter().cloned());
            info!(line = index, percentage, added, "line needs another attempt");
            let feedback = Feedback::retry(&missed);
            self.announcer.speak(feedback.cue());
            self.feedback = Some(feedback);
            self.phase = ListenPhase::Idle;
        }

        if self.stats.are_all_lines_completed() {
            self.request_game_over();
        }
    }

    fn celebrate(&mut self) {
        let feedback = Feedback::success();
        self.announcer.speak(feedback.cue());
        self.feedback = Some(feedback);
        self.phase = ListenPhase::Celebrating;

        let due = self.clock.now() + self.config.celebration_delay;
        self.scheduler
            .schedule(due, Deferred::AdvanceLine, &self.line_token);

        if self.stats.are_all_lines_completed() {
            self.request_game_over();
        }
    }

    fn advance_after_celebration(&mut self) {
        if self.phase != ListenPhase::Celebrating {
            return;
        }

        let next = self.current_line + 1;
        if next < self.lines.len() {
            debug!(line = next, "advancing after celebration");
            self.go_to_line(next);
        } else {
            self.go_to_line(self.current_line);
            self.request_game_over();
        }
    }

    /// After listening stops: game over once every line is done, or when the
    /// last line has just been completed.
    fn check_game_over_after_stop(&mut self) {
        let last_line_done = self
            .lines
            .last()
            .is_some_and(|l| l.is_completed() && self.current_line + 1 == self.lines.len());
        if self.stats.are_all_lines_completed() || last_line_done {
            self.request_game_over();
        }
    }

    fn request_game_over(&mut self) {
        if self.stats.request_game_over() {
            let due = self.clock.now() + self.config.game_over_debounce;
            self.scheduler
                .schedule(due, Deferred::GameOver, &self.session_token);
            debug!("game over scheduled");
        }
    }

    /// Moves the line pointer and resets everything transient. Any pending
    /// advance for the previous position is cancelled.
    fn go_to_line(&mut self, index: usize) {
        self.line_token.cancel();
        self.line_token = self.session_token.child_token();
        self.attempt_token.cancel();
        self.attempt_token = self.session_token.child_token();

        self.current_line = index;
        self.transcript.clear();
        self.celebration_shown = false;
        self.finalized = false;
        self.start_retried = false;
        self.feedback = None;
        self.phase = ListenPhase::Idle;
    }

    /// Stops the recognizer and throws away whatever it still had queued.
    fn halt_speech(&mut self) {
        self.attempt_token.cancel();
        if self.speech.is_active() {
            if let Err(err) = self.speech.stop() {
                debug!(%err, "stopping recognizer");
            }
            self.last_stop_at = Some(self.clock.now());
        }
        while self.speech.poll_event().is_some() {}
    }

    /// Stops the recognizer but keeps the text it flushes while stopping.
    fn halt_speech_keeping_text(&mut self) {
        self.attempt_token.cancel();
        if self.speech.is_active() {
            if let Err(err) = self.speech.stop() {
                debug!(%err, "stopping recognizer");
            }
            self.last_stop_at = Some(self.clock.now());
        }

        let now = self.clock.now();
        while let Some(event) = self.speech.poll_event() {
            match event {
                SpeechEvent::Interim(_) | SpeechEvent::Final(_) => {
                    self.transcript.ingest(&event, now);
                }
                SpeechEvent::Ended => {}
                SpeechEvent::Errored(message) => {
                    warn!(%message, "speech recognition error while stopping");
                }
            }
        }
    }
}
