use std::{
    sync::mpsc::{self, Receiver},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};
use image::RgbImage;

use crate::{
    dedupe::dedupe, error::OcrResult, extractor::Extractor, recognizer::Recognizer,
    word::WordBox,
};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Work running on a background thread. May or may not be finished.
pub struct Job<T> {
    handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> Job<T> {
    pub fn new<F: FnOnce() -> T + Send + 'static>(f: F) -> Self {
        thread::spawn(f).into()
    }
}

impl<T> Job<T> {
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Get the return value of this `Job` if it was finished.
    ///
    /// - Returns `Err` if the return value was taken previously, or if the job panicked;
    /// - Returns `Ok(None)` if the job has not finished yet;
    /// - Returns `Ok(Some(T))` if the job has finished.
    pub fn try_wait(&mut self) -> Result<Option<T>> {
        match self.handle.take() {
            None => Err(anyhow!("job already finished")),
            Some(handle) if handle.is_finished() => join(handle).map(Some),
            Some(handle) => {
                self.handle = Some(handle);
                Ok(None)
            }
        }
    }

    /// Wait for the job to finish and return its return value.
    pub fn wait(mut self) -> Result<T> {
        match self.handle.take() {
            None => Err(anyhow!("job already finished")),
            Some(handle) => join(handle),
        }
    }

    /// Wait at most `timeout` for the job to finish.
    ///
    /// Returns `Ok(None)` once the deadline passes. The job keeps running in the background, and
    /// its result is discarded if this `Job` is dropped.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<T>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.try_wait()? {
                return Ok(Some(value));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl<T> From<JoinHandle<T>> for Job<T> {
    fn from(handle: JoinHandle<T>) -> Self {
        Job {
            handle: Some(handle),
        }
    }
}

fn join<T>(handle: JoinHandle<T>) -> Result<T> {
    handle.join().map_err(|_| anyhow!("job panicked"))
}

/// Words extracted by an `ExtractionJob`.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Every pass ran.
    Complete(Vec<WordBox>),
    /// The deadline passed first. Holds the deduplicated words of the passes that had finished.
    TimedOut(Vec<WordBox>),
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    pub fn words(&self) -> &[WordBox] {
        match self {
            Self::Complete(words) | Self::TimedOut(words) => words,
        }
    }

    pub fn into_words(self) -> Vec<WordBox> {
        match self {
            Self::Complete(words) | Self::TimedOut(words) => words,
        }
    }
}

/// An extraction running on a background thread.
///
/// Each pass publishes its words as soon as it finishes, so a caller giving up at a deadline
/// still gets everything the completed passes found.
pub struct ExtractionJob {
    job: Job<OcrResult<()>>,
    passes: Receiver<Vec<WordBox>>,
    received: Vec<WordBox>,
}

impl ExtractionJob {
    /// Wait for every pass to finish and return the deduplicated words.
    pub fn wait(self) -> Result<Vec<WordBox>> {
        let Self {
            job,
            passes,
            mut received,
        } = self;

        job.wait()?.context("Extraction failed")?;
        received.extend(passes.try_iter().flatten());
        Ok(dedupe(received))
    }

    /// Wait at most `timeout` for every pass to finish.
    ///
    /// On expiry the still-running pass is abandoned and the words of the completed passes are
    /// returned as `Extraction::TimedOut`. Calling this again keeps waiting on the same job.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<Extraction> {
        match self.job.wait_timeout(timeout)? {
            Some(outcome) => self.finish(outcome).map(Extraction::Complete),
            None => {
                self.drain();
                Ok(Extraction::TimedOut(dedupe(self.received.clone())))
            }
        }
    }

    fn finish(&mut self, outcome: OcrResult<()>) -> Result<Vec<WordBox>> {
        outcome.context("Extraction failed")?;
        self.drain();
        Ok(dedupe(std::mem::take(&mut self.received)))
    }

    fn drain(&mut self) {
        self.received.extend(self.passes.try_iter().flatten());
    }
}

impl<R: Recognizer + Send + 'static> Extractor<R> {
    /// Run the extraction on a background thread, consuming the extractor.
    pub fn spawn(self, image: RgbImage, min_confidence: f32) -> ExtractionJob {
        let (tx, passes) = mpsc::channel();
        let job = Job::new(move || {
            self.run_passes(&image, min_confidence, |_, words| {
                // the receiver is gone once the caller drops the job
                let _ = tx.send(words);
            })
        });

        ExtractionJob {
            job,
            passes,
            received: Vec::new(),
        }
    }
}
