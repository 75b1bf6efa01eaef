//! Background highlight scheduling.
//!
//! At most one highlight job runs at a time. Triggering a new pass cancels
//! and joins the previous worker, snapshots the text and colors, and spawns
//! a fresh thread. The worker colors its private snapshot and commits the
//! result only if the job was not cancelled, the file identity is unchanged,
//! and the live color table still has the snapshot's length.

use super::lexer::LexerKind;
use super::theme::Theme;
use crate::buffer::{lock_colors, SharedColors};
use crate::error::EngineError;
use crate::identity::ActiveFile;
use ropey::Rope;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Documents larger than this skip tokenization and get a uniform
/// foreground fill instead.
pub const MAX_HIGHLIGHT_BYTES: usize = 100 * 1024;

/// Shared cancellation flag between the scheduler and one worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

struct HighlightJob {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

/// Owns the single in-flight highlight job.
pub struct HighlightScheduler {
    theme: Arc<Theme>,
    job: Option<HighlightJob>,
}

impl HighlightScheduler {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme: Arc::new(theme),
            job: None,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Requests a highlight of `[start, end)` of `content` into `colors`.
    ///
    /// Invalid requests are rejected with a warning and no color is touched.
    /// Oversized documents are filled uniformly on the calling thread.
    /// Otherwise the previous job is cancelled and a worker is spawned over
    /// a snapshot of the text and colors.
    pub fn trigger(
        &mut self,
        content: &Rope,
        colors: &SharedColors,
        start: usize,
        end: usize,
        lexer: LexerKind,
        identity: &ActiveFile,
    ) {
        let len = content.len_chars();
        if len == 0 {
            log::debug!("highlight request dropped: empty document");
            return;
        }
        {
            let table = lock_colors(colors);
            if table.len() != len {
                log::warn!(
                    "highlight request dropped: {}",
                    EngineError::ColorMismatch {
                        colors: table.len(),
                        text: len,
                    }
                );
                return;
            }
        }
        if start > end || end > len {
            log::warn!(
                "highlight request dropped: {}",
                EngineError::InvalidRange { start, end, len }
            );
            return;
        }

        self.cancel_in_flight();

        if content.len_bytes() > MAX_HIGHLIGHT_BYTES {
            // The whole table goes uniform, not just the requested span:
            // token colors from when the document was still under the limit
            // must not linger.
            let fill = self.theme.foreground;
            let mut table = lock_colors(colors);
            if table.len() == len {
                table.fill(fill);
            }
            return;
        }

        let text = content.to_string();
        let snapshot: Vec<_> = lock_colors(colors).clone();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let shared = Arc::clone(colors);
        let theme = Arc::clone(&self.theme);
        let identity = identity.clone();
        let started_stamp = identity.stamp();

        let handle = std::thread::spawn(move || {
            if worker_cancel.is_cancelled() {
                return;
            }
            let mut computed = snapshot;
            if let Err(err) = lexer.apply(&text, &mut computed, start, end, &theme, &worker_cancel)
            {
                log::warn!("highlight pass failed: {err}");
                return;
            }
            commit_highlight(&shared, &computed, &worker_cancel, started_stamp, &identity);
        });

        self.job = Some(HighlightJob { cancel, handle });
    }

    /// Whether a worker thread is still running.
    pub fn is_running(&self) -> bool {
        self.job
            .as_ref()
            .map(|job| !job.handle.is_finished())
            .unwrap_or(false)
    }

    /// Waits for the in-flight job, if any, without cancelling it.
    pub fn flush(&mut self) {
        if let Some(job) = self.job.take() {
            let _ = job.handle.join();
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(job) = self.job.take() {
            job.cancel.cancel();
            let _ = job.handle.join();
        }
    }
}

impl Drop for HighlightScheduler {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

/// Writes a computed color table back to the live one, unless the result
/// went stale while it was being computed. Returns whether it committed.
pub(crate) fn commit_highlight(
    shared: &SharedColors,
    computed: &[super::theme::Color],
    cancel: &CancelToken,
    started_stamp: u64,
    identity: &ActiveFile,
) -> bool {
    let mut live = lock_colors(shared);
    if cancel.is_cancelled() || identity.stamp() != started_stamp || live.len() != computed.len() {
        log::debug!("{}", EngineError::StaleResult);
        return false;
    }
    live.copy_from_slice(computed);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::theme::Color;
    use std::sync::Mutex;

    const BLANK: Color = [0.0, 0.0, 0.0, 0.0];

    fn shared(len: usize) -> SharedColors {
        Arc::new(Mutex::new(vec![BLANK; len]))
    }

    #[test]
    fn commit_writes_back_when_nothing_changed() {
        let live = shared(3);
        let computed = vec![[1.0, 0.0, 0.0, 1.0]; 3];
        let identity = ActiveFile::new();
        let stamp = identity.open(None);
        assert!(commit_highlight(
            &live,
            &computed,
            &CancelToken::new(),
            stamp,
            &identity
        ));
        assert_eq!(*lock_colors(&live), computed);
    }

    #[test]
    fn commit_is_refused_after_cancel() {
        let live = shared(3);
        let computed = vec![[1.0, 0.0, 0.0, 1.0]; 3];
        let identity = ActiveFile::new();
        let stamp = identity.open(None);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(!commit_highlight(&live, &computed, &cancel, stamp, &identity));
        assert_eq!(lock_colors(&live)[0], BLANK);
    }

    #[test]
    fn commit_is_refused_when_another_file_was_opened() {
        let live = shared(3);
        let computed = vec![[1.0, 0.0, 0.0, 1.0]; 3];
        let identity = ActiveFile::new();
        let stamp = identity.open(None);
        identity.open(None); // file switched mid-pass
        assert!(!commit_highlight(
            &live,
            &computed,
            &CancelToken::new(),
            stamp,
            &identity
        ));
    }

    #[test]
    fn commit_is_refused_on_length_drift() {
        let live = shared(4); // buffer was edited mid-pass
        let computed = vec![[1.0, 0.0, 0.0, 1.0]; 3];
        let identity = ActiveFile::new();
        let stamp = identity.open(None);
        assert!(!commit_highlight(
            &live,
            &computed,
            &CancelToken::new(),
            stamp,
            &identity
        ));
    }

    #[test]
    fn mismatched_request_leaves_colors_untouched() {
        let mut scheduler = HighlightScheduler::new(Theme::dark());
        let content = Rope::from_str("hello");
        let colors = shared(3); // wrong length
        let identity = ActiveFile::new();
        scheduler.trigger(&content, &colors, 0, 5, LexerKind::PlainText, &identity);
        scheduler.flush();
        assert!(lock_colors(&colors).iter().all(|&c| c == BLANK));
    }

    #[test]
    fn invalid_range_is_rejected() {
        let mut scheduler = HighlightScheduler::new(Theme::dark());
        let content = Rope::from_str("hello");
        let colors = shared(5);
        let identity = ActiveFile::new();
        scheduler.trigger(&content, &colors, 3, 99, LexerKind::PlainText, &identity);
        scheduler.flush();
        assert!(lock_colors(&colors).iter().all(|&c| c == BLANK));
    }

    #[test]
    fn oversized_document_gets_a_synchronous_uniform_fill() {
        let mut scheduler = HighlightScheduler::new(Theme::dark());
        let text = "x".repeat(MAX_HIGHLIGHT_BYTES + 1);
        let content = Rope::from_str(&text);
        let colors = shared(content.len_chars());
        let identity = ActiveFile::new();
        let foreground = scheduler.theme().foreground;
        scheduler.trigger(
            &content,
            &colors,
            0,
            content.len_chars(),
            LexerKind::Cpp,
            &identity,
        );
        assert!(!scheduler.is_running());
        assert!(lock_colors(&colors).iter().all(|&c| c == foreground));
    }

    #[test]
    fn oversized_bypass_fills_beyond_the_requested_span() {
        let mut scheduler = HighlightScheduler::new(Theme::dark());
        let text = "x".repeat(MAX_HIGHLIGHT_BYTES + 1);
        let content = Rope::from_str(&text);
        let colors = shared(content.len_chars());
        let identity = ActiveFile::new();
        let foreground = scheduler.theme().foreground;
        // A narrow paste-sized request still resets the whole table.
        scheduler.trigger(&content, &colors, 10, 20, LexerKind::Cpp, &identity);
        assert!(!scheduler.is_running());
        assert!(lock_colors(&colors).iter().all(|&c| c == foreground));
    }

    #[test]
    fn rapid_retrigger_commits_the_later_snapshot() {
        let mut scheduler = HighlightScheduler::new(Theme::dark());
        let content = Rope::from_str("hello world");
        let colors = shared(content.len_chars());
        let identity = ActiveFile::new();
        identity.open(None);
        let len = content.len_chars();
        // The first request covers only a prefix; the immediate retrigger
        // covers everything. Only the later snapshot can color the tail.
        scheduler.trigger(&content, &colors, 0, 3, LexerKind::PlainText, &identity);
        scheduler.trigger(&content, &colors, 0, len, LexerKind::PlainText, &identity);
        scheduler.flush();
        assert!(!scheduler.is_running());
        let foreground = scheduler.theme().foreground;
        assert!(lock_colors(&colors).iter().all(|&c| c == foreground));
    }
}
