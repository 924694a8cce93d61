use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use image::{Rgb, RgbImage};
use monocle::{
    dedupe, overlap_ratio, Exclusive, Extraction, Extractor, ImageVariant, OcrError, OcrResult,
    RawDetection, RecognitionConfig, Recognizer, Strategy, StrategySet, DEDUP_THRESHOLD,
    WORD_LEVEL,
};

const LINE_LEVEL: i32 = 4;

/// Replies with a scripted result per page segmentation mode and records every call.
#[derive(Default)]
struct ScriptedRecognizer {
    replies: HashMap<Option<i32>, OcrResult<Vec<RawDetection>>>,
    calls: Mutex<Vec<(RecognitionConfig, RgbImage)>>,
}

impl ScriptedRecognizer {
    fn reply(mut self, psm: Option<i32>, reply: OcrResult<Vec<RawDetection>>) -> Self {
        self.replies.insert(psm, reply);
        self
    }

    fn calls(&self) -> Vec<(RecognitionConfig, RgbImage)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Recognizer for ScriptedRecognizer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn recognize(
        &self,
        image: &RgbImage,
        config: &RecognitionConfig,
    ) -> OcrResult<Vec<RawDetection>> {
        self.calls
            .lock()
            .unwrap()
            .push((config.clone(), image.clone()));
        self.replies
            .get(&config.psm)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Delays one page segmentation mode, answering the others immediately.
struct SlowPass {
    slow_psm: i32,
    delay: Duration,
    inner: ScriptedRecognizer,
}

impl Recognizer for SlowPass {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn recognize(
        &self,
        image: &RgbImage,
        config: &RecognitionConfig,
    ) -> OcrResult<Vec<RawDetection>> {
        if config.psm == Some(self.slow_psm) {
            thread::sleep(self.delay);
        }
        self.inner.recognize(image, config)
    }
}

struct Unavailable;

impl Recognizer for Unavailable {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn recognize(&self, _: &RgbImage, _: &RecognitionConfig) -> OcrResult<Vec<RawDetection>> {
        Err(OcrError::EngineUnavailable("tesseract not found".to_owned()))
    }
}

fn word(text: &str, rect: (i32, i32, i32, i32), confidence: f32) -> RawDetection {
    RawDetection {
        level: WORD_LEVEL,
        text: text.to_owned(),
        left: rect.0,
        top: rect.1,
        width: rect.2,
        height: rect.3,
        confidence,
    }
}

fn screenshot() -> RgbImage {
    RgbImage::from_fn(64, 32, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgb([20, 20, 20])
        } else {
            Rgb([230, 230, 230])
        }
    })
}

fn passes(psms: &[i32]) -> StrategySet {
    StrategySet::new(
        psms.iter()
            .map(|&psm| {
                Strategy::new(
                    format!("psm{psm}"),
                    ImageVariant::Original,
                    RecognitionConfig::psm(psm),
                )
            })
            .collect(),
    )
}

#[test]
fn unavailable_engine_yields_no_words() {
    let extractor = Extractor::new(Unavailable, StrategySet::default());
    let words = extractor.extract_words(&screenshot(), 30.0).unwrap();
    assert!(words.is_empty());
}

#[test]
fn empty_strategy_set_yields_no_words() {
    let extractor = Extractor::new(ScriptedRecognizer::default(), StrategySet::new(Vec::new()));
    assert!(extractor.extract_words(&screenshot(), 0.0).unwrap().is_empty());
}

#[test]
fn image_without_pixels_is_rejected() {
    let extractor = Extractor::new(Unavailable, StrategySet::default());
    assert!(matches!(
        extractor.extract_words(&RgbImage::new(0, 10), 30.0),
        Err(OcrError::ImageDecodeFailed(_))
    ));
}

#[test]
fn rgba_screenshots_are_converted() {
    let recognizer = ScriptedRecognizer::default();
    let extractor = Extractor::new(recognizer, passes(&[6]));
    let rgba = image::DynamicImage::ImageRgba8(image::RgbaImage::new(8, 4));

    extractor.extract_words_dynamic(&rgba, 30.0).unwrap();

    let calls = extractor.recognizer().calls();
    assert_eq!(calls[0].1.dimensions(), (8, 4));
}

#[test]
fn undecodable_bytes_are_rejected() {
    let extractor = Extractor::new(Unavailable, StrategySet::default());
    assert!(matches!(
        extractor.extract_words_from_bytes(b"\x89PNG but not really", 30.0),
        Err(OcrError::ImageDecodeFailed(_))
    ));
}

#[test]
fn failing_pass_does_not_abort_the_others() {
    let recognizer = ScriptedRecognizer::default()
        .reply(
            Some(6),
            Err(OcrError::RecognitionFailed("crashed".to_owned())),
        )
        .reply(Some(7), Ok(vec![word("Hello", (0, 0, 40, 10), 80.0)]));

    let extractor = Extractor::new(recognizer, passes(&[6, 7]));
    let words = extractor.extract_words(&screenshot(), 30.0).unwrap();

    assert_eq!(words.len(), 1);
    assert_eq!(words[0].text, "Hello");
    assert_eq!(extractor.recognizer().calls().len(), 2);
}

#[test]
fn same_word_from_two_passes_keeps_the_confident_one() {
    let recognizer = ScriptedRecognizer::default()
        .reply(Some(6), Ok(vec![word("Hello", (10, 10, 40, 12), 42.0)]))
        .reply(Some(7), Ok(vec![word("Hello", (10, 10, 40, 12), 91.0)]));

    let extractor = Extractor::new(recognizer, passes(&[6, 7]));
    let words = extractor.extract_words(&screenshot(), 30.0).unwrap();

    assert_eq!(words.len(), 1);
    assert_eq!(words[0].confidence, 91.0);
}

#[test]
fn contained_detection_collapses_to_the_confident_one() {
    let recognizer = ScriptedRecognizer::default()
        .reply(Some(6), Ok(vec![word("Hello world", (10, 10, 50, 20), 60.0)]))
        .reply(Some(8), Ok(vec![word("Hello", (15, 12, 20, 10), 85.0)]));

    let extractor = Extractor::new(recognizer, passes(&[6, 8]));
    let words = extractor.extract_words(&screenshot(), 30.0).unwrap();

    assert_eq!(words.len(), 1);
    assert_eq!(words[0].text, "Hello");
}

#[test]
fn collect_concatenates_in_pass_order() {
    let recognizer = ScriptedRecognizer::default()
        .reply(
            Some(6),
            Ok(vec![
                word("a", (0, 0, 10, 10), 50.0),
                word("b", (20, 0, 10, 10), 60.0),
            ]),
        )
        .reply(Some(11), Ok(vec![word("a", (0, 0, 10, 10), 99.0)]));

    let extractor = Extractor::new(recognizer, passes(&[11, 6]));
    let texts: Vec<_> = extractor
        .collect_words(&screenshot(), 30.0)
        .unwrap()
        .into_iter()
        .map(|w| (w.text, w.confidence))
        .collect();

    assert_eq!(
        texts,
        vec![
            ("a".to_owned(), 99.0),
            ("a".to_owned(), 50.0),
            ("b".to_owned(), 60.0)
        ]
    );
}

#[test]
fn passes_filter_levels_threshold_and_blanks() {
    let mut line = word("Hello", (0, 0, 40, 10), 95.0);
    line.level = LINE_LEVEL;

    let recognizer = ScriptedRecognizer::default().reply(
        Some(6),
        Ok(vec![
            line,
            word("Hello", (0, 0, 40, 10), 95.0),
            word("at", (50, 0, 10, 10), 40.0),
            word("   ", (70, 0, 10, 10), 99.0),
            word("low", (90, 0, 10, 10), 12.0),
        ]),
    );

    let extractor = Extractor::new(recognizer, passes(&[6]));
    let words = extractor.extract_words(&screenshot(), 40.0).unwrap();

    assert_eq!(words.len(), 1);
    assert_eq!(words[0].text, "Hello");
    assert!(words.iter().all(|w| w.confidence > 40.0));
    assert!(words.iter().all(|w| !w.text.trim().is_empty()));
}

#[test]
fn enhanced_pass_sees_the_preprocessed_image() {
    let image = screenshot();
    let extractor = Extractor::new(ScriptedRecognizer::default(), StrategySet::default());
    extractor.extract_words(&image, 30.0).unwrap();

    let calls = extractor.recognizer().calls();
    assert_eq!(calls.len(), 8);

    let variants: Vec<_> = extractor.strategies().iter().map(|s| s.variant).collect();
    for ((_, seen), variant) in calls.iter().zip(variants) {
        match variant {
            ImageVariant::Original => assert_eq!(seen, &image),
            ImageVariant::Enhanced => assert_ne!(seen, &image),
        }
    }

    assert!(calls[0].0.whitelist.is_some());
    assert!(calls[2..].iter().all(|(config, _)| config.whitelist.is_none()));
}

#[test]
fn output_has_no_remaining_duplicates() {
    let recognizer = ScriptedRecognizer::default()
        .reply(
            Some(6),
            Ok(vec![
                word("The", (0, 0, 30, 12), 70.0),
                word("quick", (35, 0, 50, 12), 88.0),
                word("brown", (90, 0, 50, 12), 65.0),
            ]),
        )
        .reply(
            Some(7),
            Ok(vec![
                word("The", (1, 0, 29, 12), 75.0),
                word("quickbrown", (35, 0, 105, 12), 90.0),
            ]),
        )
        .reply(Some(8), Ok(vec![word("brown", (92, 1, 46, 11), 66.0)]));

    let extractor = Extractor::new(recognizer, passes(&[6, 7, 8]));
    let words = extractor.extract_words(&screenshot(), 30.0).unwrap();

    for (i, a) in words.iter().enumerate() {
        for b in &words[i + 1..] {
            assert!(overlap_ratio(a, b) <= DEDUP_THRESHOLD);
        }
    }
    assert!(words.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    assert_eq!(dedupe(words.clone()), words);

    let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, ["quickbrown", "The"]);
}

#[test]
fn extraction_runs_in_background() {
    let recognizer = ScriptedRecognizer::default()
        .reply(Some(6), Ok(vec![word("Hello", (0, 0, 40, 10), 80.0)]));
    let extractor = Extractor::new(recognizer, passes(&[6]));

    let mut job = extractor.spawn(screenshot(), 30.0);
    let extraction = job.wait_timeout(Duration::from_secs(10)).unwrap();

    assert!(extraction.is_complete());
    assert_eq!(extraction.words().len(), 1);
}

#[test]
fn deadline_keeps_words_of_finished_passes() {
    let recognizer = SlowPass {
        slow_psm: 7,
        delay: Duration::from_millis(800),
        inner: ScriptedRecognizer::default()
            .reply(Some(6), Ok(vec![word("Hello", (0, 0, 40, 10), 80.0)]))
            .reply(Some(7), Ok(vec![word("world", (50, 0, 40, 10), 90.0)])),
    };
    let extractor = Extractor::new(recognizer, passes(&[6, 7]));

    let mut job = extractor.spawn(screenshot(), 30.0);
    let extraction = job.wait_timeout(Duration::from_millis(200)).unwrap();

    assert!(!extraction.is_complete());
    let texts: Vec<_> = extraction.words().iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, ["Hello"]);

    let words = job.wait().unwrap();
    let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, ["world", "Hello"]);
}

#[test]
fn deadline_before_any_pass_yields_nothing() {
    let recognizer = SlowPass {
        slow_psm: 6,
        delay: Duration::from_millis(800),
        inner: ScriptedRecognizer::default()
            .reply(Some(6), Ok(vec![word("Hello", (0, 0, 40, 10), 80.0)])),
    };
    let mut job = Extractor::new(recognizer, passes(&[6])).spawn(screenshot(), 30.0);

    assert_eq!(
        job.wait_timeout(Duration::from_millis(50)).unwrap(),
        Extraction::TimedOut(Vec::new())
    );
}

#[test]
fn enhanced_image_is_shared_between_passes() {
    let enhanced = |psm| {
        Strategy::new(
            format!("enhanced psm{psm}"),
            ImageVariant::Enhanced,
            RecognitionConfig::psm(psm),
        )
    };
    let strategies = StrategySet::new(vec![enhanced(6), enhanced(11)]);
    let extractor = Extractor::new(ScriptedRecognizer::default(), strategies);
    let image = screenshot();

    extractor.extract_words(&image, 30.0).unwrap();

    let calls = extractor.recognizer().calls();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].1, image);
    assert_eq!(calls[0].1, calls[1].1);
}

#[test]
fn original_only_passes_never_see_an_enhanced_image() {
    let extractor = Extractor::new(ScriptedRecognizer::default(), passes(&[6, 7, 11]));
    let image = screenshot();

    extractor.extract_words(&image, 30.0).unwrap();

    assert!(extractor
        .recognizer()
        .calls()
        .iter()
        .all(|(_, seen)| seen == &image));
}

#[test]
fn run_passes_reports_each_pass_in_order() {
    let recognizer = ScriptedRecognizer::default()
        .reply(Some(6), Ok(vec![word("a", (0, 0, 10, 10), 50.0)]))
        .reply(
            Some(7),
            Err(OcrError::RecognitionFailed("crashed".to_owned())),
        )
        .reply(Some(8), Ok(vec![word("b", (20, 0, 10, 10), 60.0)]));
    let extractor = Extractor::new(recognizer, passes(&[6, 7, 8]));

    let mut seen = Vec::new();
    extractor
        .run_passes(&screenshot(), 30.0, |strategy, words| {
            seen.push((strategy.name.clone(), words.len()))
        })
        .unwrap();

    assert_eq!(seen, [("psm6".to_owned(), 1), ("psm8".to_owned(), 1)]);
}

#[test]
fn shared_recognizer_serves_concurrent_extractions() {
    let recognizer = Arc::new(Exclusive::new(
        ScriptedRecognizer::default()
            .reply(Some(6), Ok(vec![word("Hello", (0, 0, 40, 10), 80.0)])),
    ));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let extractor = Extractor::new(Arc::clone(&recognizer), passes(&[6, 7]));
            thread::spawn(move || extractor.extract_words(&screenshot(), 30.0))
        })
        .collect();

    for handle in handles {
        let words = handle.join().unwrap().unwrap();
        assert_eq!(words.len(), 1);
    }
}
